//! Batch runner: walker -> processor -> summary.

use std::io::{self, Write};
use std::path::PathBuf;

use crate::host::CadSession;
use crate::processor::DocumentProcessor;
use crate::report::{BatchObserver, BatchSummary, ConsoleReporter, FileOutcome};
use crate::session::SessionGuard;
use crate::sweep::{SweepConfiguration, UnhideSweep};
use crate::walker::ModelFile;

/// Registered identifier of the KOMPAS-3D automation server.
pub const DEFAULT_PROG_ID: &str = "KOMPAS.Application.5";

/// Settings of one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfiguration {
    /// Folder searched for models.
    pub root: PathBuf,
    /// Descend into subfolders.
    ///
    /// Default: `true`.
    pub recursive: bool,
    /// Open documents read-only.
    ///
    /// Default: `false` (documents are saved after the sweep).
    pub read_only: bool,
    /// Automation identifier of the CAD application.
    pub prog_id: String,
    /// Categories visited in each model.
    pub sweep: SweepConfiguration,
}

impl Default for BatchConfiguration {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            recursive: true,
            read_only: false,
            prog_id: DEFAULT_PROG_ID.to_string(),
            sweep: SweepConfiguration::default(),
        }
    }
}

/// Processes a sequence of model files against one session.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    processor: DocumentProcessor,
}

impl Batch {
    /// Create a batch from its configuration.
    pub fn new(config: &BatchConfiguration) -> Self {
        Self {
            processor: DocumentProcessor::new(UnhideSweep::new(config.sweep.clone()))
                .with_read_only(config.read_only),
        }
    }

    /// The per-document processor.
    pub fn processor(&self) -> &DocumentProcessor {
        &self.processor
    }

    /// Lazily process `files`, one outcome per file.
    pub fn outcomes<'a, I>(
        &'a self,
        session: &'a mut dyn CadSession,
        files: I,
    ) -> impl Iterator<Item = FileOutcome> + 'a
    where
        I: IntoIterator<Item = ModelFile>,
        I::IntoIter: 'a,
    {
        files
            .into_iter()
            .map(move |file| self.processor.process(&mut *session, file))
    }

    /// Process every file, reporting progress to `observer`, and fold the
    /// outcomes into a summary. A failing file never stops the run.
    pub fn run<I>(
        &self,
        session: &mut dyn CadSession,
        files: I,
        observer: &mut dyn BatchObserver,
    ) -> BatchSummary
    where
        I: IntoIterator<Item = ModelFile>,
    {
        let mut summary = BatchSummary::default();
        for (index, file) in files.into_iter().enumerate().map(|(i, f)| (i + 1, f)) {
            observer.on_start(index, &file);
            let outcome = self.processor.process(session, file);
            observer.on_outcome(index, &outcome);
            summary.record(&outcome);
        }
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            changed = summary.changed,
            errors = summary.errors,
            "batch finished"
        );
        summary
    }

    /// Run the whole batch on `session`, shut it down, then print the
    /// summary to `out`. Shutdown failures are logged and never keep the
    /// summary from being printed.
    pub fn run_session<S, I, W>(
        &self,
        mut session: SessionGuard<S>,
        files: I,
        out: W,
    ) -> io::Result<(BatchSummary, W)>
    where
        S: CadSession + 'static,
        I: IntoIterator<Item = ModelFile>,
        W: Write,
    {
        let mut reporter = ConsoleReporter::new(out);
        let summary = self.run(session.session_mut(), files, &mut reporter);
        if let Err(err) = session.release() {
            tracing::warn!("failed to shut down the CAD application: {err}");
        }
        let out = reporter.finish(&summary)?;
        Ok((summary, out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{MemoryEntity, MemoryModel, MemorySession};
    use crate::host::EntityCategory;

    #[test]
    fn test_default_configuration() {
        let config = BatchConfiguration::default();
        assert!(config.recursive);
        assert!(!config.read_only);
        assert_eq!(config.prog_id, "KOMPAS.Application.5");
    }

    #[test]
    fn test_outcomes_are_lazy() {
        let mut session = MemorySession::new().with_model(
            "a.m3d",
            MemoryModel::new().with_entities(EntityCategory::Sketch, vec![MemoryEntity::feature(true)]),
        );
        let probe = session.probe();
        let batch = Batch::default();
        let files = vec![
            ModelFile::from_path("a.m3d").unwrap(),
            ModelFile::from_path("b.m3d").unwrap(),
        ];

        let mut outcomes = batch.outcomes(&mut session, files);
        assert!(probe.opened().is_empty());
        assert!(outcomes.next().unwrap().is_ok());
        assert_eq!(probe.opened().len(), 1);

        let summary: BatchSummary = outcomes.collect();
        assert_eq!(summary.total, 1);
        assert_eq!(summary.errors, 1);
    }

    #[test]
    fn test_read_only_is_forwarded() {
        let mut session = MemorySession::new().with_model("a.m3d", MemoryModel::new());
        let config = BatchConfiguration {
            read_only: true,
            ..BatchConfiguration::default()
        };
        let files = [ModelFile::from_path("a.m3d").unwrap()];
        Batch::new(&config).run(&mut session, files, &mut ());
        assert_eq!(
            session.probe().model("a.m3d").unwrap().opened_read_only,
            Some(true)
        );
    }
}
