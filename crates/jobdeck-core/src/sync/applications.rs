//! Application status updates.
//!
//! Status changes are small-state toggles with instant feedback: the new
//! status shows immediately, the server's returned record is authoritative,
//! and a failed call reverts to the previous status.

use super::optimistic::ToggleCoordinator;
use crate::api::types::{Application, ApplicationStatus};
use crate::api::{ApiClient, ApiResult};

/// Locally tracked application statuses for the current user.
#[derive(Default)]
pub struct ApplicationStatusStore {
    toggles: ToggleCoordinator<i64, ApplicationStatus>,
}

impl ApplicationStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The status currently shown for an application, if known.
    pub fn status(&self, application_id: i64) -> Option<ApplicationStatus> {
        self.toggles.observed(&application_id)
    }

    /// Seeds statuses from freshly fetched applications.
    pub fn seed_from(&self, applications: &[Application]) {
        for application in applications {
            self.toggles.seed(application.id, application.status);
        }
    }

    /// Changes an application's status optimistically.
    ///
    /// Returns the status the server confirmed.
    ///
    /// # Errors
    /// Propagates the request's error after reverting to the previous
    /// status.
    pub async fn set_status(
        &self,
        api: &ApiClient,
        application_id: i64,
        status: ApplicationStatus,
    ) -> ApiResult<ApplicationStatus> {
        let current = self
            .status(application_id)
            .unwrap_or(ApplicationStatus::Pending);
        tracing::debug!(application_id, status = status.as_str(), "updating application status");

        self.toggles
            .run(application_id, current, status, || async move {
                api.set_application_status(application_id, status)
                    .await
                    .map(|application| application.status)
            })
            .await
    }
}
