//! Contract with the external CAD host.
//!
//! Everything inside the host (documents, parts, entities, features) is
//! reached through the traits below. Optional behaviour is modelled as
//! explicit capabilities: a [`DocumentCapabilities`] set detected once per
//! session for document methods, and [`HiddenFlag`]/[`VisibleFlag`]
//! resolved once per entity.
//!
//! Handles are plain owned values; dropping one releases the native
//! reference. Callers drop them in reverse acquisition order
//! (entity, collection, part, document, session).

pub mod category;
#[cfg(all(windows, feature = "com"))]
pub mod com;
pub mod memory;

use std::fmt;
use std::path::Path;

use bitflags::bitflags;

use crate::error::HostResult;

pub use category::EntityCategory;

bitflags! {
    /// Document methods the host exposes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DocumentCapabilities: u8 {
        const REBUILD_MODEL = 0x01;
        const REBUILD_DOCUMENT = 0x02;
        const SAVE = 0x04;
        const CLOSE = 0x08;
        const CLOSE_DOCUMENT = 0x10;
    }
}

/// A document-level method the host may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentMethod {
    RebuildModel,
    RebuildDocument,
    Save,
    /// Close without saving.
    Close,
    /// Close without saving, under the name some host versions use.
    CloseDocument,
}

impl DocumentMethod {
    /// Rebuild and save, in call order.
    pub const FINISH: [DocumentMethod; 3] = [
        DocumentMethod::RebuildModel,
        DocumentMethod::RebuildDocument,
        DocumentMethod::Save,
    ];

    /// Close variants, in call order.
    pub const CLOSE: [DocumentMethod; 2] = [DocumentMethod::Close, DocumentMethod::CloseDocument];

    /// Every document method.
    pub const ALL: [DocumentMethod; 5] = [
        DocumentMethod::RebuildModel,
        DocumentMethod::RebuildDocument,
        DocumentMethod::Save,
        DocumentMethod::Close,
        DocumentMethod::CloseDocument,
    ];

    /// Method name as exposed by the host's automation interface.
    pub fn host_name(self) -> &'static str {
        match self {
            DocumentMethod::RebuildModel => "RebuildModel",
            DocumentMethod::RebuildDocument => "RebuildDocument",
            DocumentMethod::Save => "Save",
            DocumentMethod::Close => "Close",
            DocumentMethod::CloseDocument => "CloseDocument",
        }
    }

    /// Capability flag that marks this method as exposed.
    pub fn capability(self) -> DocumentCapabilities {
        match self {
            DocumentMethod::RebuildModel => DocumentCapabilities::REBUILD_MODEL,
            DocumentMethod::RebuildDocument => DocumentCapabilities::REBUILD_DOCUMENT,
            DocumentMethod::Save => DocumentCapabilities::SAVE,
            DocumentMethod::Close => DocumentCapabilities::CLOSE,
            DocumentMethod::CloseDocument => DocumentCapabilities::CLOSE_DOCUMENT,
        }
    }
}

impl fmt::Display for DocumentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.host_name())
    }
}

impl DocumentCapabilities {
    /// Whether `method` is exposed.
    pub fn supports(self, method: DocumentMethod) -> bool {
        self.contains(method.capability())
    }
}

/// One running instance of the CAD application.
pub trait CadSession {
    /// Document methods detected when the session started.
    fn document_capabilities(&self) -> DocumentCapabilities;

    fn set_visible(&mut self, visible: bool) -> HostResult<()>;

    fn open_document(&mut self, path: &Path, read_only: bool) -> HostResult<Box<dyn CadDocument>>;

    /// Ask the application to shut down.
    fn quit(&mut self) -> HostResult<()>;

    /// Release the native application reference. A second call reports
    /// [`HostError::ObjectGone`](crate::error::HostError::ObjectGone).
    fn release(&mut self) -> HostResult<()>;
}

/// A model file open in the session.
pub trait CadDocument {
    /// The top-level part or assembly, if the host provides one.
    fn top_part(&mut self) -> HostResult<Option<Box<dyn Part>>>;

    /// Invoke a document method. Callers only invoke methods listed in the
    /// session's [`DocumentCapabilities`].
    fn invoke(&mut self, method: DocumentMethod) -> HostResult<()>;
}

/// Result of asking a part for one category of entities.
pub enum CollectionLookup {
    Found(Box<dyn EntityCollection>),
    /// The host does not know this category.
    Unsupported,
}

impl fmt::Debug for CollectionLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionLookup::Found(_) => f.write_str("Found(..)"),
            CollectionLookup::Unsupported => f.write_str("Unsupported"),
        }
    }
}

/// Root container of a document's entities.
pub trait Part {
    fn entity_collection(&mut self, category: EntityCategory) -> HostResult<CollectionLookup>;
}

/// First/next cursor over the entities of one category.
pub trait EntityCollection {
    fn first(&mut self) -> HostResult<Option<Box<dyn Entity>>>;
    fn next(&mut self) -> HostResult<Option<Box<dyn Entity>>>;
}

/// A geometric or feature object inside a part.
pub trait Entity {
    /// The edit-history record behind this entity. Entities created
    /// without history have none.
    fn feature(&mut self) -> HostResult<Option<Box<dyn Feature>>>;

    /// The entity's own hidden flag, when it has one.
    fn as_hidden_flag(&mut self) -> Option<&mut dyn HiddenFlag> {
        None
    }

    /// The entity's own visibility flag, when it has one.
    fn as_visible_flag(&mut self) -> Option<&mut dyn VisibleFlag> {
        None
    }

    /// Ask the host to recompute the entity after a change.
    fn update(&mut self) -> HostResult<()>;
}

/// A construction step in the model's edit history.
pub trait Feature {
    fn is_hidden(&self) -> HostResult<bool>;
    fn set_hidden(&mut self, hidden: bool) -> HostResult<()>;
    fn update(&mut self) -> HostResult<()>;
}

/// An entity's own hidden flag.
pub trait HiddenFlag {
    fn is_hidden(&self) -> HostResult<bool>;
    fn set_hidden(&mut self, hidden: bool) -> HostResult<()>;
}

/// An entity's own visibility flag.
pub trait VisibleFlag {
    fn is_visible(&self) -> HostResult<bool>;
    fn set_visible(&mut self, visible: bool) -> HostResult<()>;
}
