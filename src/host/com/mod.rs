//! KOMPAS-3D automation backend over COM.
//!
//! Talks to `KOMPAS.Application.5` (API 5) through late-bound `IDispatch`
//! calls. Every handle owns its interface pointer and releases it on drop.

mod dispatch;

use std::os::windows::ffi::OsStrExt;
use std::path::Path;

use windows::core::{BSTR, HSTRING, VARIANT};
use windows::Win32::System::Com::{
    CLSIDFromProgID, CoCreateInstance, CoInitializeEx, CoUninitialize, IDispatch,
    CLSCTX_LOCAL_SERVER, COINIT_APARTMENTTHREADED,
};

pub use dispatch::Dispatch;
use dispatch::{host_error, DISP_E_BADPARAMCOUNT, DISP_E_EXCEPTION, E_INVALIDARG};

use super::{
    CadDocument, CadSession, CollectionLookup, DocumentCapabilities, DocumentMethod, Entity,
    EntityCategory, EntityCollection, Feature, HiddenFlag, Part, VisibleFlag,
};
use crate::error::{HostError, HostResult};

/// `Part_Type.pTop_Part`
const TOP_PART: i32 = -1;
/// `DocumentCloseOptions.kdDoNotSaveChanges`
const DO_NOT_SAVE_CHANGES: i32 = 0;

/// COM initialised for the current thread.
struct Apartment {
    initialized: bool,
}

impl Apartment {
    fn enter() -> HostResult<Self> {
        unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) }
            .ok()
            .map_err(|err| host_error(&err, "CoInitializeEx"))?;
        Ok(Self { initialized: true })
    }
}

impl Drop for Apartment {
    fn drop(&mut self) {
        if self.initialized {
            unsafe { CoUninitialize() };
        }
    }
}

/// A running KOMPAS-3D instance.
pub struct ComSession {
    // Declared before the apartment so it is released first.
    app: Option<Dispatch>,
    capabilities: DocumentCapabilities,
    _apartment: Apartment,
}

impl ComSession {
    /// Start the application registered under `prog_id`.
    pub fn start(prog_id: &str) -> HostResult<Self> {
        let apartment = Apartment::enter()?;
        let clsid = unsafe { CLSIDFromProgID(&HSTRING::from(prog_id)) }
            .map_err(|err| host_error(&err, prog_id))?;
        let app: IDispatch = unsafe { CoCreateInstance(&clsid, None, CLSCTX_LOCAL_SERVER) }
            .map_err(|err| host_error(&err, prog_id))?;
        let app = Dispatch::new(app);
        let capabilities = detect_capabilities(&app);
        tracing::info!(?capabilities, "{prog_id} started");

        Ok(Self {
            app: Some(app),
            capabilities,
            _apartment: apartment,
        })
    }

    fn app(&self) -> HostResult<&Dispatch> {
        self.app.as_ref().ok_or(HostError::ObjectGone)
    }
}

/// Probe an unopened document object for the methods this host version
/// exposes.
fn detect_capabilities(app: &Dispatch) -> DocumentCapabilities {
    let probe = match app.call_object("Document3D", &[]) {
        Ok(Some(probe)) => probe,
        Ok(None) => {
            tracing::warn!("Document3D returned nothing; no document methods detected");
            return DocumentCapabilities::empty();
        }
        Err(err) => {
            tracing::warn!("cannot probe document methods: {err}");
            return DocumentCapabilities::empty();
        }
    };
    DocumentMethod::ALL
        .into_iter()
        .filter(|method| probe.has_member(method.host_name()))
        .fold(DocumentCapabilities::empty(), |caps, method| {
            caps | method.capability()
        })
}

fn path_variant(path: &Path) -> HostResult<VARIANT> {
    let wide: Vec<u16> = path.as_os_str().encode_wide().collect();
    let bstr = BSTR::from_wide(&wide).map_err(|err| host_error(&err, "path"))?;
    Ok(VARIANT::from(bstr))
}

impl CadSession for ComSession {
    fn document_capabilities(&self) -> DocumentCapabilities {
        self.capabilities
    }

    fn set_visible(&mut self, visible: bool) -> HostResult<()> {
        self.app()?.put("Visible", VARIANT::from(visible))
    }

    fn open_document(&mut self, path: &Path, read_only: bool) -> HostResult<Box<dyn CadDocument>> {
        let doc = self
            .app()?
            .call_object("Document3D", &[])?
            .ok_or_else(|| HostError::failed("Document3D returned nothing"))?;
        let opened = doc.call("Open", &[path_variant(path)?, VARIANT::from(read_only)])?;
        let opened = i32::try_from(&opened).map_err(|err| host_error(&err, "Open"))?;
        if opened == 0 {
            return Err(HostError::failed(format!("Open refused {}", path.display())));
        }
        Ok(Box::new(ComDocument { doc }))
    }

    fn quit(&mut self) -> HostResult<()> {
        self.app()?.call("Quit", &[]).map(|_| ())
    }

    fn release(&mut self) -> HostResult<()> {
        self.app.take().map(drop).ok_or(HostError::ObjectGone)
    }
}

struct ComDocument {
    doc: Dispatch,
}

impl CadDocument for ComDocument {
    fn top_part(&mut self) -> HostResult<Option<Box<dyn Part>>> {
        let part = self.doc.call_object("GetPart", &[VARIANT::from(TOP_PART)])?;
        Ok(part.map(|part| Box::new(ComPart { part }) as Box<dyn Part>))
    }

    fn invoke(&mut self, method: DocumentMethod) -> HostResult<()> {
        let name = method.host_name();
        match method {
            DocumentMethod::Close | DocumentMethod::CloseDocument => {
                // Some versions take the close option, others take nothing.
                match self.doc.call(name, &[VARIANT::from(DO_NOT_SAVE_CHANGES)]) {
                    Err(HostError::Call { code, .. }) if code == DISP_E_BADPARAMCOUNT => {
                        self.doc.call(name, &[]).map(|_| ())
                    }
                    other => other.map(|_| ()),
                }
            }
            _ => self.doc.call(name, &[]).map(|_| ()),
        }
    }
}

struct ComPart {
    part: Dispatch,
}

impl Part for ComPart {
    fn entity_collection(&mut self, category: EntityCategory) -> HostResult<CollectionLookup> {
        let id = category.id() as i16;
        match self.part.call_object("EntityCollection", &[VARIANT::from(id)]) {
            Ok(Some(collection)) => Ok(CollectionLookup::Found(Box::new(ComCollection {
                collection,
            }))),
            Ok(None) => Ok(CollectionLookup::Unsupported),
            // The host raises for ids it does not know.
            Err(HostError::Call { code, .. }) if code == DISP_E_EXCEPTION || code == E_INVALIDARG => {
                Ok(CollectionLookup::Unsupported)
            }
            Err(err) => Err(err),
        }
    }
}

struct ComCollection {
    collection: Dispatch,
}

impl ComCollection {
    fn step(&self, member: &str) -> HostResult<Option<Box<dyn Entity>>> {
        Ok(self
            .collection
            .call_object(member, &[])?
            .map(|entity| Box::new(ComEntity::new(entity)) as Box<dyn Entity>))
    }
}

impl EntityCollection for ComCollection {
    fn first(&mut self) -> HostResult<Option<Box<dyn Entity>>> {
        self.step("First")
    }

    fn next(&mut self) -> HostResult<Option<Box<dyn Entity>>> {
        self.step("Next")
    }
}

struct ComEntity {
    entity: Dispatch,
    has_hidden: bool,
    has_visible: bool,
}

impl ComEntity {
    fn new(entity: Dispatch) -> Self {
        let has_hidden = entity.has_member("hidden");
        let has_visible = entity.has_member("Visible");
        Self {
            entity,
            has_hidden,
            has_visible,
        }
    }
}

impl Entity for ComEntity {
    fn feature(&mut self) -> HostResult<Option<Box<dyn Feature>>> {
        let feature = self.entity.call_object("GetFeature", &[])?;
        Ok(feature.map(|feature| Box::new(ComFeature { feature }) as Box<dyn Feature>))
    }

    fn as_hidden_flag(&mut self) -> Option<&mut dyn HiddenFlag> {
        if self.has_hidden {
            Some(self)
        } else {
            None
        }
    }

    fn as_visible_flag(&mut self) -> Option<&mut dyn VisibleFlag> {
        if self.has_visible {
            Some(self)
        } else {
            None
        }
    }

    fn update(&mut self) -> HostResult<()> {
        self.entity.call("Update", &[]).map(|_| ())
    }
}

impl HiddenFlag for ComEntity {
    fn is_hidden(&self) -> HostResult<bool> {
        self.entity.get_bool("hidden")
    }

    fn set_hidden(&mut self, hidden: bool) -> HostResult<()> {
        self.entity.put("hidden", VARIANT::from(hidden))
    }
}

impl VisibleFlag for ComEntity {
    fn is_visible(&self) -> HostResult<bool> {
        self.entity.get_bool("Visible")
    }

    fn set_visible(&mut self, visible: bool) -> HostResult<()> {
        self.entity.put("Visible", VARIANT::from(visible))
    }
}

struct ComFeature {
    feature: Dispatch,
}

impl Feature for ComFeature {
    fn is_hidden(&self) -> HostResult<bool> {
        self.feature.get_bool("hidden")
    }

    fn set_hidden(&mut self, hidden: bool) -> HostResult<()> {
        self.feature.put("hidden", VARIANT::from(hidden))
    }

    fn update(&mut self) -> HostResult<()> {
        self.feature.call("Update", &[]).map(|_| ())
    }
}
