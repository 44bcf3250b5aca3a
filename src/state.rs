use parking_lot::Mutex;

use crate::session::Session;

// ── Application State ──────────────────────────────────────────────

/// State shared across API handlers: the one editing session behind a mutex.
pub struct AppState {
    pub session: Mutex<Session>,
}

impl AppState {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    /// Read-only access to the session. Locks the mutex for the duration of `f`.
    pub fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Session) -> R,
    {
        let guard = self.session.lock();
        f(&guard)
    }

    /// Mutating access to the session. Locks the mutex for the duration of `f`.
    pub fn with_session_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut guard = self.session.lock();
        f(&mut guard)
    }
}
