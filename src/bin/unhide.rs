//! Interactive entrypoint: asks for a folder, unhides every hidden feature
//! in the KOMPAS-3D models below it, and prints a summary.
//!
//! Log verbosity follows `RUST_LOG` (default `warn`); logs go to stderr.

use std::io::{self, Write};

use anyhow::{Context, Result};
use kompas_unhide::prompt::Prompter;
use kompas_unhide::{walk, Batch, BatchConfiguration, CadSession, SessionGuard, UnhideError};

fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

#[cfg(all(windows, feature = "com"))]
fn start_session(
    config: &BatchConfiguration,
) -> kompas_unhide::Result<SessionGuard<kompas_unhide::host::com::ComSession>> {
    use kompas_unhide::host::com::ComSession;

    let to_start_error = |source| UnhideError::SessionStart {
        prog_id: config.prog_id.clone(),
        source,
    };
    let session = ComSession::start(&config.prog_id).map_err(to_start_error)?;
    SessionGuard::start(session).map_err(to_start_error)
}

#[cfg(not(all(windows, feature = "com")))]
fn start_session(
    config: &BatchConfiguration,
) -> kompas_unhide::Result<SessionGuard<kompas_unhide::host::memory::MemorySession>> {
    Err(UnhideError::SessionStart {
        prog_id: config.prog_id.clone(),
        source: kompas_unhide::HostError::unsupported(
            "COM automation (build on Windows with the `com` feature)",
        ),
    })
}

fn run<S: CadSession + 'static>(
    session: SessionGuard<S>,
    config: &BatchConfiguration,
    out: impl Write,
) -> Result<()> {
    let files = walk(&config.root, config.recursive)?;
    Batch::new(config).run_session(session, files, out)?;
    Ok(())
}

fn main() -> Result<()> {
    init_logging();

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());

    let root = prompter.ask_path("Model folder (*.m3d, *.a3d): ")?;
    let Some(root) = root.filter(|root| root.is_dir()) else {
        writeln!(prompter.output(), "Folder not found.")?;
        return Ok(());
    };
    let recursive = prompter.ask_yes_no("Recurse into subfolders? [Y/N]: ", true)?;

    let config = BatchConfiguration {
        root,
        recursive,
        ..BatchConfiguration::default()
    };
    tracing::info!(root = %config.root.display(), recursive, "starting batch");

    let session = start_session(&config).context("cannot start the CAD application")?;
    run(session, &config, prompter.output())?;

    prompter.pause("Press Enter...")?;
    Ok(())
}
