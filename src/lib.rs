//! # kompas-unhide
//!
//! Batch tool that opens KOMPAS-3D models through the application's
//! automation interface, unhides every hidden feature and entity, rebuilds
//! and saves each model, then closes it.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kompas_unhide::{walk, Batch, BatchConfiguration, ConsoleReporter, SessionGuard};
//! use kompas_unhide::host::com::ComSession;
//!
//! let config = BatchConfiguration { root: "C:/Models".into(), ..Default::default() };
//! let files = walk(&config.root, config.recursive)?;
//! let mut session = SessionGuard::start(ComSession::start(&config.prog_id)?)?;
//! let mut reporter = ConsoleReporter::new(std::io::stdout());
//! let summary = Batch::new(&config).run(session.session_mut(), files, &mut reporter);
//! reporter.finish(&summary)?;
//! ```
//!
//! ## Architecture
//!
//! - [`walker`] - lazy discovery of `.m3d`/`.a3d` files
//! - [`host`] - traits the CAD application is reached through, with an
//!   in-memory host and (on Windows) a COM backend
//! - [`session`] - scoped start/quit/release of the application
//! - [`sweep`] - the unhide pass over every entity of a part
//! - [`processor`] - open, sweep, rebuild, save and close one document
//! - [`report`] / [`batch`] - per-file outcomes folded into a summary

#![allow(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod batch;
pub mod error;
pub mod host;
pub mod notification;
pub mod processor;
pub mod prompt;
pub mod report;
pub mod session;
pub mod sweep;
pub mod walker;

// Re-export commonly used types
pub use batch::{Batch, BatchConfiguration, DEFAULT_PROG_ID};
pub use error::{HostError, HostResult, Result, UnhideError};
pub use host::{CadSession, DocumentCapabilities, DocumentMethod, EntityCategory};
pub use notification::{Notification, NotificationCollection, NotificationType};
pub use processor::DocumentProcessor;
pub use report::{BatchObserver, BatchSummary, ConsoleReporter, FileOutcome};
pub use session::SessionGuard;
pub use sweep::{SweepConfiguration, SweepReport, UnhideSweep};
pub use walker::{walk, ModelFile, ModelKind, ModelWalker};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
