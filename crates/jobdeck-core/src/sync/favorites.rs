//! The current user's favorite jobs.
//!
//! Membership reflects the last locally confirmed toggle; it may briefly
//! diverge from the server while a request is in flight, and reconciles to
//! the server's answer when it lands.

use super::optimistic::ToggleCoordinator;
use crate::api::types::JobPosting;
use crate::api::{ApiClient, ApiResult};

/// Set of favorited job ids, scoped to the current user.
#[derive(Default)]
pub struct FavoriteSet {
    toggles: ToggleCoordinator<i64, bool>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a job is currently shown as favorited.
    pub fn is_favorite(&self, job_id: i64) -> bool {
        self.toggles.observed(&job_id).unwrap_or(false)
    }

    /// Ids currently shown as favorited.
    pub fn ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .toggles
            .snapshot()
            .into_iter()
            .filter_map(|(id, favorited)| favorited.then_some(id))
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Seeds membership from freshly fetched postings.
    pub fn seed_from_jobs(&self, jobs: &[JobPosting]) {
        for job in jobs {
            self.toggles.seed(job.id, job.is_favorite);
        }
    }

    /// Flips a job's membership optimistically.
    ///
    /// The flipped value is visible immediately; the server's answer is
    /// authoritative once it arrives. Returns the reconciled membership.
    ///
    /// # Errors
    /// Propagates the request's error after rolling back to the pre-toggle
    /// state.
    pub async fn toggle(&self, api: &ApiClient, user_id: i64, job_id: i64) -> ApiResult<bool> {
        let current = self.is_favorite(job_id);
        let target = !current;
        tracing::debug!(job_id, target, "toggling favorite");

        self.toggles
            .run(job_id, current, target, || async move {
                api.toggle_favorite(job_id, user_id)
                    .await
                    .map(|response| response.is_favorite)
            })
            .await
    }
}
