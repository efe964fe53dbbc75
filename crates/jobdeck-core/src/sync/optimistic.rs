//! Optimistic toggles with server reconciliation.
//!
//! A toggle applies its target state locally before the server confirms it,
//! then reconciles to the authoritative response or rolls back to the last
//! confirmed state. In-flight bookkeeping is keyed per target id, so one
//! slow request never blocks toggles on unrelated targets.
//!
//! No request cancellation: racing toggles on the same target each settle
//! unconditionally, and the last server response to resolve determines the
//! confirmed state.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

use crate::api::ApiResult;

/// Local view of one target: the last server-confirmed state plus the
/// optimistic guess for the most recently issued in-flight request.
#[derive(Debug, Clone)]
struct TargetState<S> {
    confirmed: S,
    pending: Option<(u64, S)>,
    issued: u64,
}

/// Generic coordinator for instant-feedback toggles.
///
/// `K` is the target id (job id, application id); `S` the toggled state
/// (bool membership, an application status).
pub struct ToggleCoordinator<K, S> {
    targets: Mutex<HashMap<K, TargetState<S>>>,
}

impl<K, S> Default for ToggleCoordinator<K, S> {
    fn default() -> Self {
        Self {
            targets: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, S> ToggleCoordinator<K, S>
where
    K: Eq + Hash + Clone,
    S: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// The state the UI should show: the optimistic guess while a request
    /// is in flight, the confirmed state otherwise.
    pub fn observed(&self, key: &K) -> Option<S> {
        let targets = self.lock();
        let target = targets.get(key)?;
        Some(
            target
                .pending
                .as_ref()
                .map_or_else(|| target.confirmed.clone(), |(_, s)| s.clone()),
        )
    }

    /// The last server-confirmed (or seeded) state.
    pub fn confirmed(&self, key: &K) -> Option<S> {
        self.lock().get(key).map(|t| t.confirmed.clone())
    }

    /// Returns true while a request for this target is in flight.
    pub fn is_pending(&self, key: &K) -> bool {
        self.lock().get(key).is_some_and(|t| t.pending.is_some())
    }

    /// Seeds a confirmed state without a server round-trip, e.g. when
    /// hydrating from freshly fetched records. Never clobbers an
    /// optimistic guess already in flight.
    pub fn seed(&self, key: K, value: S) {
        let mut targets = self.lock();
        targets
            .entry(key)
            .and_modify(|t| t.confirmed = value.clone())
            .or_insert(TargetState {
                confirmed: value,
                pending: None,
                issued: 0,
            });
    }

    /// Observed states of every known target.
    pub fn snapshot(&self) -> Vec<(K, S)> {
        self.lock()
            .iter()
            .map(|(k, t)| {
                let state = t
                    .pending
                    .as_ref()
                    .map_or_else(|| t.confirmed.clone(), |(_, s)| s.clone());
                (k.clone(), state)
            })
            .collect()
    }

    /// Runs one optimistic toggle.
    ///
    /// `current` is the pre-toggle state used when the target has never been
    /// seen; `target` the optimistic guess, visible to observers before the
    /// request is issued. On success the server's value wins even when it
    /// differs from the guess; on failure observers fall back to the
    /// confirmed state.
    ///
    /// # Errors
    /// Propagates the request's error after rolling back.
    pub async fn run<F, Fut>(&self, key: K, current: S, target: S, request: F) -> ApiResult<S>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<S>>,
    {
        // Apply the optimistic value before the first suspension point so
        // the UI reflects it with zero latency.
        let ticket = {
            let mut targets = self.lock();
            let entry = targets.entry(key.clone()).or_insert(TargetState {
                confirmed: current,
                pending: None,
                issued: 0,
            });
            entry.issued += 1;
            entry.pending = Some((entry.issued, target));
            entry.issued
        };

        match request().await {
            Ok(server_value) => {
                let mut targets = self.lock();
                if let Some(entry) = targets.get_mut(&key) {
                    // Last resolved response wins.
                    entry.confirmed = server_value.clone();
                    if entry.pending.as_ref().is_some_and(|(t, _)| *t == ticket) {
                        entry.pending = None;
                    }
                }
                Ok(server_value)
            }
            Err(err) => {
                let mut targets = self.lock();
                if let Some(entry) = targets.get_mut(&key) {
                    // Only this toggle's guess is withdrawn; a newer
                    // in-flight toggle keeps its own.
                    if entry.pending.as_ref().is_some_and(|(t, _)| *t == ticket) {
                        entry.pending = None;
                    }
                }
                Err(err)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, TargetState<S>>> {
        self.targets
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
