//! Process-wide session state.
//!
//! Exactly one `Session` exists per process. It is owned by the
//! `SessionController` (the only writer) and read by the request pipeline
//! and the UI through a cloneable `SessionHandle`. The handle guards the
//! state with a non-async mutex so the pipeline's 401 teardown is a
//! synchronous mutation with no suspension point.

pub mod controller;
pub mod credentials;
pub mod user;

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use user::UserRecord;

pub use controller::SessionController;

/// Lifecycle states of the process-wide session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// No credentials. Initial state until restoration runs.
    #[default]
    Unauthenticated,
    /// A login or registration call is in flight.
    Authenticating,
    /// Holding a usable access token.
    Authenticated,
    /// A token refresh is in flight; the previous token is still installed.
    RefreshPending,
    /// A logout is in flight; teardown completes regardless of its outcome.
    LoggingOut,
}

/// The process-wide authenticated identity plus tokens.
///
/// Invariant: `status == Authenticated` iff `access_token` is present.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Expiry deadline in epoch millis, when the server reported a lifetime.
    /// Restored sessions start without one; staleness is then caught by the
    /// reactive 401 path instead.
    pub expires_at: Option<u64>,
    pub user: Option<UserRecord>,
    pub status: SessionStatus,
}

impl Session {
    /// Returns true if the session holds a usable access token.
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    /// Returns true if the access token is past its known expiry deadline.
    ///
    /// False when no deadline is known.
    pub fn token_expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| now_millis_u64() >= deadline)
    }

    /// Resets every field to the unauthenticated default.
    fn clear(&mut self) {
        *self = Session::default();
    }
}

/// Cloneable, shared access to the process-wide session.
///
/// Reads clone out of the lock; the only mutation paths are
/// `invalidate` (the 401 teardown) and the crate-private `update`
/// used by the controller.
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<Mutex<Session>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current session state.
    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    /// Returns the current access token, if any.
    pub fn access_token(&self) -> Option<String> {
        self.lock().access_token.clone()
    }

    /// Returns the current refresh token, if any.
    pub fn refresh_token(&self) -> Option<String> {
        self.lock().refresh_token.clone()
    }

    /// Returns the current lifecycle status.
    pub fn status(&self) -> SessionStatus {
        self.lock().status
    }

    /// Returns a copy of the current user record, if any.
    pub fn user(&self) -> Option<UserRecord> {
        self.lock().user.clone()
    }

    /// Clears the in-memory session synchronously.
    ///
    /// Called by the request pipeline on 401 before the failed call is
    /// surfaced, so concurrently dispatched requests observe the cleared
    /// session rather than retrying with a stale token. Durable credentials
    /// are removed by the controller, not here.
    pub fn invalidate(&self) {
        self.lock().clear();
    }

    /// Applies a mutation under the lock. Controller-only.
    pub(crate) fn update(&self, apply: impl FnOnce(&mut Session)) {
        apply(&mut self.lock());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Current time in epoch millis.
pub(crate) fn now_millis_u64() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| u64::try_from(d.as_millis()).ok())
        .unwrap_or(u64::MAX)
}

/// Returns a masked version of a token for display (first 8 chars + ...).
///
/// Tokens are never logged or displayed in full.
pub fn mask_token(token: &str) -> String {
    if token.len() <= 12 {
        return "***".to_string();
    }
    format!("{}...", &token[..8])
}
