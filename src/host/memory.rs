//! In-memory CAD host.
//!
//! Models are described up front with [`MemoryModel`] and [`MemoryEntity`]
//! and registered on a [`MemorySession`] under the path they are opened by.
//! All handles share one store, so state written through the host contract
//! can be inspected afterwards through a [`MemoryProbe`].
//!
//! ```
//! use kompas_unhide::host::memory::{MemoryEntity, MemoryModel, MemorySession};
//! use kompas_unhide::host::EntityCategory;
//!
//! let session = MemorySession::new().with_model(
//!     "bracket.m3d",
//!     MemoryModel::new().with_entities(
//!         EntityCategory::BossExtrusion,
//!         vec![MemoryEntity::feature(true), MemoryEntity::feature(false)],
//!     ),
//! );
//! assert_eq!(session.probe().hidden_count("bracket.m3d"), 1);
//! ```

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use indexmap::IndexMap;

use super::{
    CadDocument, CadSession, CollectionLookup, DocumentCapabilities, DocumentMethod, Entity,
    EntityCategory, EntityCollection, Feature, HiddenFlag, Part, VisibleFlag,
};
use crate::error::{HostError, HostResult};

/// An entity as the in-memory host stores it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryEntity {
    /// Hidden flag of the feature record; `None` when the entity has no history.
    pub feature_hidden: Option<bool>,
    /// Resolving the feature record fails.
    pub feature_fails: bool,
    /// The entity's own hidden flag, if it exposes one.
    pub hidden: Option<bool>,
    /// The entity's own visibility flag, if it exposes one.
    pub visible: Option<bool>,
    /// Writes to the entity's own flags fail.
    pub flag_writes_fail: bool,
    /// Update calls on the entity and its feature fail.
    pub update_fails: bool,
    /// Number of update calls received (entity and feature).
    pub updates: usize,
}

impl MemoryEntity {
    /// Entity backed by a feature record.
    pub fn feature(hidden: bool) -> Self {
        Self {
            feature_hidden: Some(hidden),
            ..Self::default()
        }
    }

    /// Entity without edit history and without flags.
    pub fn without_history() -> Self {
        Self::default()
    }

    /// Expose a hidden flag with the given value.
    pub fn with_hidden_flag(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    /// Expose a visibility flag with the given value.
    pub fn with_visible_flag(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    /// Make resolving the feature record fail.
    pub fn with_failing_feature(mut self) -> Self {
        self.feature_fails = true;
        self
    }

    /// Make writes to the entity's own flags fail.
    pub fn with_failing_flag_writes(mut self) -> Self {
        self.flag_writes_fail = true;
        self
    }

    /// Make `Update` fail while flag writes still succeed.
    pub fn with_failing_update(mut self) -> Self {
        self.update_fails = true;
        self
    }

    fn update(&mut self) -> HostResult<()> {
        if self.update_fails {
            return Err(HostError::failed("Update"));
        }
        self.updates += 1;
        Ok(())
    }

    /// Whether any of the entity's flags still marks it hidden.
    pub fn is_hidden(&self) -> bool {
        self.feature_hidden == Some(true) || self.hidden == Some(true) || self.visible == Some(false)
    }
}

/// A model file as the in-memory host stores it.
#[derive(Debug, Clone)]
pub struct MemoryModel {
    /// Whether the document has a top-level part.
    pub has_top_part: bool,
    /// Entities per category, in insertion order.
    pub collections: IndexMap<EntityCategory, Vec<MemoryEntity>>,
    /// Categories whose lookup fails with a host error.
    pub failing_categories: Vec<EntityCategory>,
    /// Document methods that fail when invoked.
    pub failing_methods: Vec<DocumentMethod>,
    /// Error returned when the document is opened.
    pub open_error: Option<HostError>,
    /// Document methods invoked so far, in order.
    pub invoked: Vec<DocumentMethod>,
    /// Whether a document handle is currently open.
    pub is_open: bool,
    /// Read-only flag of the last open, if any.
    pub opened_read_only: Option<bool>,
}

impl Default for MemoryModel {
    fn default() -> Self {
        Self {
            has_top_part: true,
            collections: IndexMap::new(),
            failing_categories: Vec::new(),
            failing_methods: Vec::new(),
            open_error: None,
            invoked: Vec::new(),
            is_open: false,
            opened_read_only: None,
        }
    }
}

impl MemoryModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append entities to a category.
    pub fn with_entities(mut self, category: EntityCategory, entities: Vec<MemoryEntity>) -> Self {
        self.collections.entry(category).or_default().extend(entities);
        self
    }

    /// Model without a top-level part.
    pub fn without_top_part(mut self) -> Self {
        self.has_top_part = false;
        self
    }

    /// Make the lookup of `category` fail.
    pub fn with_failing_category(mut self, category: EntityCategory) -> Self {
        self.failing_categories.push(category);
        self
    }

    /// Make `method` fail when invoked.
    pub fn with_failing_method(mut self, method: DocumentMethod) -> Self {
        self.failing_methods.push(method);
        self
    }

    /// Make opening the document fail with `error`.
    pub fn with_open_error(mut self, error: HostError) -> Self {
        self.open_error = Some(error);
        self
    }

    /// All entities across categories.
    pub fn entities(&self) -> impl Iterator<Item = &MemoryEntity> {
        self.collections.values().flatten()
    }

    /// Entities still marked hidden.
    pub fn hidden_count(&self) -> usize {
        self.entities().filter(|e| e.is_hidden()).count()
    }

    /// Whether `Save` succeeded at least once.
    pub fn was_saved(&self) -> bool {
        self.invoked.contains(&DocumentMethod::Save)
    }
}

#[derive(Debug, Default)]
struct Store {
    models: IndexMap<PathBuf, MemoryModel>,
    visible: Option<bool>,
    quit_calls: usize,
    quit_error: Option<HostError>,
    released: bool,
    opened: Vec<PathBuf>,
}

type SharedStore = Rc<RefCell<Store>>;

/// Read-only view on the in-memory host's state.
#[derive(Debug, Clone)]
pub struct MemoryProbe {
    store: SharedStore,
}

impl MemoryProbe {
    /// Snapshot of the model stored under `path`.
    pub fn model(&self, path: impl AsRef<Path>) -> Option<MemoryModel> {
        self.store.borrow().models.get(path.as_ref()).cloned()
    }

    /// Hidden entities left in the model, 0 if the path is unknown.
    pub fn hidden_count(&self, path: impl AsRef<Path>) -> usize {
        self.model(path).map_or(0, |m| m.hidden_count())
    }

    /// Last visibility requested for the application window.
    pub fn visible(&self) -> Option<bool> {
        self.store.borrow().visible
    }

    /// Number of successful `Quit` calls.
    pub fn quit_calls(&self) -> usize {
        self.store.borrow().quit_calls
    }

    /// Whether the session handle was released.
    pub fn is_released(&self) -> bool {
        self.store.borrow().released
    }

    /// Paths passed to `open_document`, in call order.
    pub fn opened(&self) -> Vec<PathBuf> {
        self.store.borrow().opened.clone()
    }
}

/// In-memory implementation of [`CadSession`].
#[derive(Debug)]
pub struct MemorySession {
    store: SharedStore,
    capabilities: DocumentCapabilities,
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySession {
    /// Session exposing every document method.
    pub fn new() -> Self {
        Self {
            store: Rc::new(RefCell::new(Store::default())),
            capabilities: DocumentCapabilities::all(),
        }
    }

    /// Restrict the document methods the session exposes.
    pub fn with_capabilities(mut self, capabilities: DocumentCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Register a model under `path`.
    pub fn with_model(self, path: impl Into<PathBuf>, model: MemoryModel) -> Self {
        self.add_model(path, model);
        self
    }

    /// Make `Quit` fail with `error`.
    pub fn with_quit_error(self, error: HostError) -> Self {
        self.store.borrow_mut().quit_error = Some(error);
        self
    }

    /// Register a model under `path`.
    pub fn add_model(&self, path: impl Into<PathBuf>, model: MemoryModel) {
        self.store.borrow_mut().models.insert(path.into(), model);
    }

    /// A view on the session state that outlives the session.
    pub fn probe(&self) -> MemoryProbe {
        MemoryProbe {
            store: Rc::clone(&self.store),
        }
    }

    fn ensure_alive(&self) -> HostResult<()> {
        if self.store.borrow().released {
            return Err(HostError::ObjectGone);
        }
        Ok(())
    }
}

impl CadSession for MemorySession {
    fn document_capabilities(&self) -> DocumentCapabilities {
        self.capabilities
    }

    fn set_visible(&mut self, visible: bool) -> HostResult<()> {
        self.ensure_alive()?;
        self.store.borrow_mut().visible = Some(visible);
        Ok(())
    }

    fn open_document(&mut self, path: &Path, read_only: bool) -> HostResult<Box<dyn CadDocument>> {
        self.ensure_alive()?;
        let mut store = self.store.borrow_mut();
        store.opened.push(path.to_path_buf());
        let model = store
            .models
            .get_mut(path)
            .ok_or_else(|| HostError::failed(format!("cannot open {}", path.display())))?;
        if let Some(err) = &model.open_error {
            return Err(err.clone());
        }
        model.is_open = true;
        model.opened_read_only = Some(read_only);
        Ok(Box::new(MemoryDocument {
            store: Rc::clone(&self.store),
            path: path.to_path_buf(),
        }))
    }

    fn quit(&mut self) -> HostResult<()> {
        self.ensure_alive()?;
        let mut store = self.store.borrow_mut();
        if let Some(err) = &store.quit_error {
            return Err(err.clone());
        }
        store.quit_calls += 1;
        Ok(())
    }

    fn release(&mut self) -> HostResult<()> {
        let mut store = self.store.borrow_mut();
        if store.released {
            return Err(HostError::ObjectGone);
        }
        store.released = true;
        Ok(())
    }
}

/// Location of one stored entity.
#[derive(Debug, Clone)]
struct EntityRef {
    store: SharedStore,
    path: PathBuf,
    category: EntityCategory,
    index: usize,
}

impl EntityRef {
    fn with<R>(&self, f: impl FnOnce(&mut MemoryEntity) -> HostResult<R>) -> HostResult<R> {
        let mut store = self.store.borrow_mut();
        let entity = store
            .models
            .get_mut(&self.path)
            .filter(|m| m.is_open)
            .and_then(|m| m.collections.get_mut(&self.category))
            .and_then(|c| c.get_mut(self.index))
            .ok_or(HostError::ObjectGone)?;
        f(entity)
    }

    fn peek<R>(&self, f: impl FnOnce(&MemoryEntity) -> R) -> Option<R> {
        let store = self.store.borrow();
        store
            .models
            .get(&self.path)
            .and_then(|m| m.collections.get(&self.category))
            .and_then(|c| c.get(self.index))
            .map(f)
    }
}

struct MemoryDocument {
    store: SharedStore,
    path: PathBuf,
}

impl MemoryDocument {
    fn with_model<R>(&self, f: impl FnOnce(&mut MemoryModel) -> HostResult<R>) -> HostResult<R> {
        let mut store = self.store.borrow_mut();
        let model = store
            .models
            .get_mut(&self.path)
            .filter(|m| m.is_open)
            .ok_or(HostError::ObjectGone)?;
        f(model)
    }
}

impl CadDocument for MemoryDocument {
    fn top_part(&mut self) -> HostResult<Option<Box<dyn Part>>> {
        let has_part = self.with_model(|m| Ok(m.has_top_part))?;
        Ok(has_part.then(|| {
            Box::new(MemoryPart {
                store: Rc::clone(&self.store),
                path: self.path.clone(),
            }) as Box<dyn Part>
        }))
    }

    fn invoke(&mut self, method: DocumentMethod) -> HostResult<()> {
        self.with_model(|m| {
            if m.failing_methods.contains(&method) {
                return Err(HostError::failed(format!("{method} failed")));
            }
            m.invoked.push(method);
            if matches!(method, DocumentMethod::Close | DocumentMethod::CloseDocument) {
                m.is_open = false;
            }
            Ok(())
        })
    }
}

struct MemoryPart {
    store: SharedStore,
    path: PathBuf,
}

impl Part for MemoryPart {
    fn entity_collection(&mut self, category: EntityCategory) -> HostResult<CollectionLookup> {
        let store = self.store.borrow();
        let model = store
            .models
            .get(&self.path)
            .filter(|m| m.is_open)
            .ok_or(HostError::ObjectGone)?;
        if model.failing_categories.contains(&category) {
            return Err(HostError::failed(format!("EntityCollection({})", category.id())));
        }
        Ok(match model.collections.get(&category) {
            Some(entities) => CollectionLookup::Found(Box::new(MemoryCollection {
                store: Rc::clone(&self.store),
                path: self.path.clone(),
                category,
                len: entities.len(),
                cursor: 0,
            })),
            None => CollectionLookup::Unsupported,
        })
    }
}

struct MemoryCollection {
    store: SharedStore,
    path: PathBuf,
    category: EntityCategory,
    len: usize,
    cursor: usize,
}

impl MemoryCollection {
    fn current(&self) -> Option<Box<dyn Entity>> {
        (self.cursor < self.len).then(|| {
            Box::new(MemoryEntityHandle(EntityRef {
                store: Rc::clone(&self.store),
                path: self.path.clone(),
                category: self.category,
                index: self.cursor,
            })) as Box<dyn Entity>
        })
    }
}

impl EntityCollection for MemoryCollection {
    fn first(&mut self) -> HostResult<Option<Box<dyn Entity>>> {
        self.cursor = 0;
        Ok(self.current())
    }

    fn next(&mut self) -> HostResult<Option<Box<dyn Entity>>> {
        if self.cursor < self.len {
            self.cursor += 1;
        }
        Ok(self.current())
    }
}

struct MemoryEntityHandle(EntityRef);

impl Entity for MemoryEntityHandle {
    fn feature(&mut self) -> HostResult<Option<Box<dyn Feature>>> {
        let entity = self.0.clone();
        self.0.with(|e| {
            if e.feature_fails {
                return Err(HostError::failed("GetFeature"));
            }
            Ok(e.feature_hidden
                .map(|_| Box::new(MemoryFeature(entity)) as Box<dyn Feature>))
        })
    }

    fn as_hidden_flag(&mut self) -> Option<&mut dyn HiddenFlag> {
        if self.0.peek(|e| e.hidden.is_some()).unwrap_or(false) {
            Some(self)
        } else {
            None
        }
    }

    fn as_visible_flag(&mut self) -> Option<&mut dyn VisibleFlag> {
        if self.0.peek(|e| e.visible.is_some()).unwrap_or(false) {
            Some(self)
        } else {
            None
        }
    }

    fn update(&mut self) -> HostResult<()> {
        self.0.with(MemoryEntity::update)
    }
}

impl HiddenFlag for MemoryEntityHandle {
    fn is_hidden(&self) -> HostResult<bool> {
        self.0.with(|e| e.hidden.ok_or_else(|| HostError::unsupported("hidden")))
    }

    fn set_hidden(&mut self, hidden: bool) -> HostResult<()> {
        self.0.with(|e| {
            if e.flag_writes_fail {
                return Err(HostError::failed("hidden is read-only"));
            }
            e.hidden = Some(hidden);
            Ok(())
        })
    }
}

impl VisibleFlag for MemoryEntityHandle {
    fn is_visible(&self) -> HostResult<bool> {
        self.0.with(|e| e.visible.ok_or_else(|| HostError::unsupported("Visible")))
    }

    fn set_visible(&mut self, visible: bool) -> HostResult<()> {
        self.0.with(|e| {
            if e.flag_writes_fail {
                return Err(HostError::failed("Visible is read-only"));
            }
            e.visible = Some(visible);
            Ok(())
        })
    }
}

struct MemoryFeature(EntityRef);

impl Feature for MemoryFeature {
    fn is_hidden(&self) -> HostResult<bool> {
        self.0
            .with(|e| e.feature_hidden.ok_or_else(|| HostError::unsupported("feature")))
    }

    fn set_hidden(&mut self, hidden: bool) -> HostResult<()> {
        self.0.with(|e| {
            e.feature_hidden = Some(hidden);
            Ok(())
        })
    }

    fn update(&mut self) -> HostResult<()> {
        self.0.with(MemoryEntity::update)
    }
}
