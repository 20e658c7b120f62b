//! Scoped ownership of a CAD session.

use crate::error::{HostError, HostResult};
use crate::host::CadSession;

/// Treat "object already gone" as a successful release.
pub fn tolerate_gone(result: HostResult<()>) -> HostResult<()> {
    match result {
        Err(HostError::ObjectGone) => {
            tracing::debug!("host object already released");
            Ok(())
        }
        other => other,
    }
}

/// Release a session handle; releasing it again is a no-op.
pub fn release_handle(session: &mut dyn CadSession) -> HostResult<()> {
    tolerate_gone(session.release())
}

/// Owns a running session: hides the application on start, and quits and
/// releases it when dropped, whatever path the batch took.
#[derive(Debug)]
pub struct SessionGuard<S: CadSession> {
    session: S,
    released: bool,
}

impl<S: CadSession> SessionGuard<S> {
    /// Take ownership of a freshly started session and hide its window.
    pub fn start(session: S) -> HostResult<Self> {
        let mut guard = Self {
            session,
            released: false,
        };
        guard.session.set_visible(false)?;
        tracing::info!("CAD session started");
        Ok(guard)
    }

    /// The owned session.
    pub fn session(&self) -> &S {
        &self.session
    }

    /// The owned session, mutably.
    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    /// Whether the session was already shut down.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Quit the application and release the handle. Only the first call
    /// reaches the host.
    pub fn release(&mut self) -> HostResult<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let quit = tolerate_gone(self.session.quit());
        if let Err(err) = &quit {
            tracing::warn!("failed to quit CAD application: {err}");
        }
        let release = release_handle(&mut self.session);
        tracing::info!("CAD session released");
        quit.and(release)
    }
}

impl<S: CadSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::warn!("failed to release CAD session: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemorySession;

    #[test]
    fn test_start_hides_application() {
        let session = MemorySession::new();
        let probe = session.probe();
        let guard = SessionGuard::start(session).unwrap();
        assert_eq!(probe.visible(), Some(false));
        drop(guard);
        assert_eq!(probe.quit_calls(), 1);
        assert!(probe.is_released());
    }

    #[test]
    fn test_release_then_drop_quits_once() {
        let session = MemorySession::new();
        let probe = session.probe();
        let mut guard = SessionGuard::start(session).unwrap();
        guard.release().unwrap();
        guard.release().unwrap();
        assert!(guard.is_released());
        drop(guard);
        assert_eq!(probe.quit_calls(), 1);
    }

    #[test]
    fn test_tolerate_gone_keeps_other_errors() {
        assert!(tolerate_gone(Err(HostError::ObjectGone)).is_ok());
        assert!(tolerate_gone(Err(HostError::failed("quit"))).is_err());
    }

    #[test]
    fn test_release_handle_is_idempotent() {
        let mut session = MemorySession::new();
        release_handle(&mut session).unwrap();
        release_handle(&mut session).unwrap();
    }
}
