//! Per-document processing: open, sweep, rebuild, save, close.

use crate::error::{Result, UnhideError};
use crate::host::{CadDocument, CadSession, DocumentCapabilities, DocumentMethod};
use crate::notification::NotificationCollection;
use crate::report::FileOutcome;
use crate::sweep::{SweepReport, UnhideSweep};
use crate::walker::ModelFile;

/// An open document that is closed without saving when dropped.
struct OpenDocument {
    doc: Box<dyn CadDocument>,
    capabilities: DocumentCapabilities,
}

impl OpenDocument {
    /// Invoke a method if the host exposes it. Returns `false` when skipped.
    fn invoke_if_supported(&mut self, method: DocumentMethod) -> Result<bool> {
        if !self.capabilities.supports(method) {
            tracing::trace!("{method} not exposed by the host, skipped");
            return Ok(false);
        }
        match self.doc.invoke(method) {
            Ok(()) => Ok(true),
            Err(err) if err.is_unsupported() => {
                tracing::debug!("{method} rejected as unsupported, skipped");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Drop for OpenDocument {
    fn drop(&mut self) {
        for method in DocumentMethod::CLOSE {
            match self.invoke_if_supported(method) {
                Ok(true) => return,
                Ok(false) => {}
                Err(UnhideError::Host(err)) if err.is_object_gone() => {
                    tracing::debug!("document already closed by the host");
                    return;
                }
                Err(err) => tracing::warn!("{method} failed: {err}"),
            }
        }
    }
}

/// Runs the unhide sweep over one model file at a time.
#[derive(Debug, Clone, Default)]
pub struct DocumentProcessor {
    sweep: UnhideSweep,
    read_only: bool,
}

impl DocumentProcessor {
    /// Create a processor that opens documents for writing.
    pub fn new(sweep: UnhideSweep) -> Self {
        Self {
            sweep,
            read_only: false,
        }
    }

    /// Open documents read-only. Saving will then usually fail.
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Process one file. Failures are reported in the outcome, never raised.
    pub fn process(&self, session: &mut dyn CadSession, file: ModelFile) -> FileOutcome {
        let mut notifications = NotificationCollection::new();
        let result = self.process_file(session, &file, &mut notifications);
        match &result {
            Ok(report) => tracing::info!(
                path = %file.path.display(),
                changed = report.changed,
                "model processed"
            ),
            Err(err) => tracing::warn!(path = %file.path.display(), "model failed: {err}"),
        }
        FileOutcome {
            file,
            result,
            notifications,
        }
    }

    fn process_file(
        &self,
        session: &mut dyn CadSession,
        file: &ModelFile,
        notes: &mut NotificationCollection,
    ) -> Result<SweepReport> {
        let capabilities = session.document_capabilities();
        let doc = session
            .open_document(&file.path, self.read_only)
            .map_err(UnhideError::DocumentOpen)?;
        let mut doc = OpenDocument { doc, capabilities };

        let mut part = doc.doc.top_part()?.ok_or(UnhideError::PartMissing)?;
        let report = self.sweep.run(part.as_mut(), notes);
        drop(part);

        // Save is attempted even when a rebuild fails; the first failure
        // is what the file reports.
        let mut failure = None;
        for method in DocumentMethod::FINISH {
            if let Err(err) = doc.invoke_if_supported(method) {
                tracing::warn!(path = %file.path.display(), "{method} failed: {err}");
                failure.get_or_insert(err);
            }
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::host::memory::{MemoryEntity, MemoryModel, MemorySession};
    use crate::host::EntityCategory;

    fn file(path: &str) -> ModelFile {
        ModelFile::from_path(path).unwrap()
    }

    fn hidden_model() -> MemoryModel {
        MemoryModel::new().with_entities(
            EntityCategory::BossExtrusion,
            vec![MemoryEntity::feature(true), MemoryEntity::feature(true)],
        )
    }

    #[test]
    fn test_process_rebuilds_saves_and_closes() {
        let mut session = MemorySession::new().with_model("a.m3d", hidden_model());
        let outcome = DocumentProcessor::default().process(&mut session, file("a.m3d"));
        assert_eq!(outcome.changed(), 2);

        let model = session.probe().model("a.m3d").unwrap();
        assert_eq!(
            model.invoked,
            vec![
                DocumentMethod::RebuildModel,
                DocumentMethod::RebuildDocument,
                DocumentMethod::Save,
                DocumentMethod::Close,
            ]
        );
        assert!(!model.is_open);
        assert_eq!(model.opened_read_only, Some(false));
    }

    #[test]
    fn test_failing_rebuild_still_saves() {
        let mut session = MemorySession::new().with_model(
            "a.m3d",
            MemoryModel::new()
                .with_entities(EntityCategory::Sketch, vec![MemoryEntity::feature(true)])
                .with_failing_method(DocumentMethod::RebuildModel),
        );
        let outcome = DocumentProcessor::default().process(&mut session, file("a.m3d"));
        assert!(matches!(outcome.result, Err(UnhideError::Host(HostError::Call { .. }))));

        let model = session.probe().model("a.m3d").unwrap();
        assert_eq!(
            model.invoked,
            vec![
                DocumentMethod::RebuildDocument,
                DocumentMethod::Save,
                DocumentMethod::Close,
            ]
        );
        assert!(model.was_saved());
        assert_eq!(model.hidden_count(), 0);
    }

    #[test]
    fn test_first_finish_failure_is_reported() {
        let mut session = MemorySession::new().with_model(
            "a.m3d",
            hidden_model()
                .with_failing_method(DocumentMethod::RebuildDocument)
                .with_failing_method(DocumentMethod::Save),
        );
        let outcome = DocumentProcessor::default().process(&mut session, file("a.m3d"));
        let err = outcome.result.unwrap_err();
        assert!(err.to_string().contains("RebuildDocument"), "{err}");
    }

    #[test]
    fn test_close_document_skipped_after_close() {
        let mut session = MemorySession::new().with_model("a.m3d", hidden_model());
        DocumentProcessor::default().process(&mut session, file("a.m3d"));
        let model = session.probe().model("a.m3d").unwrap();
        assert_eq!(model.invoked.last(), Some(&DocumentMethod::Close));
        assert!(!model.invoked.contains(&DocumentMethod::CloseDocument));
    }

    #[test]
    fn test_missing_methods_are_skipped() {
        let mut session = MemorySession::new()
            .with_capabilities(DocumentCapabilities::SAVE | DocumentCapabilities::CLOSE_DOCUMENT)
            .with_model("a.m3d", hidden_model());
        let outcome = DocumentProcessor::default().process(&mut session, file("a.m3d"));
        assert!(outcome.is_ok());

        let model = session.probe().model("a.m3d").unwrap();
        assert_eq!(
            model.invoked,
            vec![DocumentMethod::Save, DocumentMethod::CloseDocument]
        );
    }

    #[test]
    fn test_missing_part_still_closes() {
        let mut session =
            MemorySession::new().with_model("a.a3d", MemoryModel::new().without_top_part());
        let outcome = DocumentProcessor::default().process(&mut session, file("a.a3d"));
        assert!(matches!(outcome.result, Err(UnhideError::PartMissing)));

        let model = session.probe().model("a.a3d").unwrap();
        assert_eq!(model.invoked, vec![DocumentMethod::Close]);
        assert!(!model.is_open);
    }

    #[test]
    fn test_failing_save_is_error_and_closes() {
        let mut session = MemorySession::new().with_model(
            "a.m3d",
            hidden_model().with_failing_method(DocumentMethod::Save),
        );
        let outcome = DocumentProcessor::default().process(&mut session, file("a.m3d"));
        assert!(matches!(outcome.result, Err(UnhideError::Host(HostError::Call { .. }))));
        assert!(!session.probe().model("a.m3d").unwrap().is_open);
    }

    #[test]
    fn test_failing_close_falls_through_to_close_document() {
        let mut session = MemorySession::new().with_model(
            "a.m3d",
            hidden_model().with_failing_method(DocumentMethod::Close),
        );
        let outcome = DocumentProcessor::default().process(&mut session, file("a.m3d"));
        assert!(outcome.is_ok());
        let model = session.probe().model("a.m3d").unwrap();
        assert_eq!(model.invoked.last(), Some(&DocumentMethod::CloseDocument));
        assert!(!model.is_open);
    }

    #[test]
    fn test_open_failure_is_reported() {
        let mut session = MemorySession::new().with_model(
            "a.m3d",
            MemoryModel::new().with_open_error(HostError::from_code(0x8002_0009, "locked")),
        );
        let outcome = DocumentProcessor::default().process(&mut session, file("a.m3d"));
        let err = outcome.result.unwrap_err();
        assert!(matches!(err, UnhideError::DocumentOpen(_)));
        assert_eq!(err.host_code(), Some(0x8002_0009));
    }
}
