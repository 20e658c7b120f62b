//! Per-file outcomes and the batch summary.

use std::fmt;
use std::io::{self, Write};

use crate::error::UnhideError;
use crate::notification::NotificationCollection;
use crate::sweep::SweepReport;
use crate::walker::ModelFile;

/// What happened to one model file.
#[derive(Debug)]
pub struct FileOutcome {
    /// The processed file.
    pub file: ModelFile,
    /// Sweep counters, or the error that stopped the file.
    pub result: Result<SweepReport, UnhideError>,
    /// Diagnostics collected while sweeping the file.
    pub notifications: NotificationCollection,
}

impl FileOutcome {
    /// Whether the file was processed without error.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Entities unhidden in this file; 0 on failure.
    pub fn changed(&self) -> usize {
        self.result.as_ref().map_or(0, |report| report.changed)
    }

    /// One-line, human readable status.
    pub fn status(&self) -> OutcomeStatus<'_> {
        OutcomeStatus(self)
    }
}

/// Display adapter for [`FileOutcome::status`].
pub struct OutcomeStatus<'a>(&'a FileOutcome);

impl fmt::Display for OutcomeStatus<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.result {
            Ok(report) if report.changed > 0 => {
                write!(f, "Unhidden: {}. Saved.", report.changed)
            }
            Ok(_) => write!(f, "Nothing to change."),
            Err(err) => write!(f, "Error: {err}"),
        }
    }
}

/// Counters over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Model files attempted.
    pub total: usize,
    /// Files processed without error.
    pub succeeded: usize,
    /// Entities unhidden across all files.
    pub changed: usize,
    /// Files that failed.
    pub errors: usize,
}

impl BatchSummary {
    /// Add one file outcome to the counters.
    pub fn record(&mut self, outcome: &FileOutcome) {
        self.total += 1;
        match &outcome.result {
            Ok(report) => {
                self.succeeded += 1;
                self.changed += report.changed;
            }
            Err(_) => self.errors += 1,
        }
    }
}

impl<'a> Extend<&'a FileOutcome> for BatchSummary {
    fn extend<I: IntoIterator<Item = &'a FileOutcome>>(&mut self, iter: I) {
        for outcome in iter {
            self.record(outcome);
        }
    }
}

impl Extend<FileOutcome> for BatchSummary {
    fn extend<I: IntoIterator<Item = FileOutcome>>(&mut self, iter: I) {
        for outcome in iter {
            self.record(&outcome);
        }
    }
}

impl FromIterator<FileOutcome> for BatchSummary {
    fn from_iter<I: IntoIterator<Item = FileOutcome>>(iter: I) -> Self {
        let mut summary = BatchSummary::default();
        summary.extend(iter);
        summary
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Done. Processed: {}, succeeded: {}, unhidden: {}, errors: {}",
            self.total, self.succeeded, self.changed, self.errors
        )
    }
}

/// Receives progress while a batch runs.
pub trait BatchObserver {
    /// Called before file number `index` (1-based) is processed.
    fn on_start(&mut self, _index: usize, _file: &ModelFile) {}

    fn on_outcome(&mut self, _index: usize, _outcome: &FileOutcome) {}
}

impl BatchObserver for () {}

/// Prints one header line and one status line per file.
#[derive(Debug)]
pub struct ConsoleReporter<W: Write> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> ConsoleReporter<W> {
    /// Create a reporter writing to `out`.
    pub fn new(out: W) -> Self {
        Self { out, error: None }
    }

    fn write_line(&mut self, line: fmt::Arguments<'_>) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.out.write_fmt(line).and_then(|_| self.out.write_all(b"\n")) {
            self.error = Some(err);
        }
    }

    /// Print the summary and hand back the writer, or the first write error.
    pub fn finish(mut self, summary: &BatchSummary) -> io::Result<W> {
        self.write_line(format_args!(""));
        self.write_line(format_args!("{summary}"));
        match self.error.take() {
            Some(err) => Err(err),
            None => {
                self.out.flush()?;
                Ok(self.out)
            }
        }
    }
}

impl<W: Write> BatchObserver for ConsoleReporter<W> {
    fn on_start(&mut self, index: usize, file: &ModelFile) {
        self.write_line(format_args!("[{index}] {}", file.path.display()));
    }

    fn on_outcome(&mut self, _index: usize, outcome: &FileOutcome) {
        self.write_line(format_args!("   {}", outcome.status()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;

    fn outcome(result: Result<SweepReport, UnhideError>) -> FileOutcome {
        FileOutcome {
            file: ModelFile::from_path("plate.m3d").unwrap(),
            result,
            notifications: NotificationCollection::new(),
        }
    }

    fn changed(n: usize) -> Result<SweepReport, UnhideError> {
        Ok(SweepReport {
            changed: n,
            ..SweepReport::default()
        })
    }

    #[test]
    fn test_summary_fold() {
        let summary: BatchSummary = vec![
            outcome(changed(3)),
            outcome(Err(UnhideError::PartMissing)),
            outcome(changed(0)),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            summary,
            BatchSummary {
                total: 3,
                succeeded: 2,
                changed: 3,
                errors: 1,
            }
        );
        assert_eq!(
            summary.to_string(),
            "Done. Processed: 3, succeeded: 2, unhidden: 3, errors: 1"
        );
    }

    #[test]
    fn test_status_lines() {
        assert_eq!(outcome(changed(2)).status().to_string(), "Unhidden: 2. Saved.");
        assert_eq!(outcome(changed(0)).status().to_string(), "Nothing to change.");

        let err = UnhideError::DocumentOpen(HostError::from_code(0x8000_4005, "Unspecified error"));
        assert_eq!(
            outcome(Err(err)).status().to_string(),
            "Error: Failed to open document: host error 0x80004005: Unspecified error"
        );
    }

    #[test]
    fn test_console_reporter_output() {
        let mut reporter = ConsoleReporter::new(Vec::new());
        let done = outcome(changed(1));
        reporter.on_start(1, &done.file);
        reporter.on_outcome(1, &done);

        let mut summary = BatchSummary::default();
        summary.record(&done);
        let text = String::from_utf8(reporter.finish(&summary).unwrap()).unwrap();
        assert_eq!(
            text,
            "[1] plate.m3d\n   Unhidden: 1. Saved.\n\nDone. Processed: 1, succeeded: 1, unhidden: 1, errors: 0\n"
        );
    }
}
