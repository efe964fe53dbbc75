//! Typed wrappers over the REST surface.
//!
//! One method per endpoint; paths and envelopes live here and nowhere else.

use super::client::ApiClient;
use super::error::ApiResult;
use super::types::{
    Application, AuthResponse, FavoriteToggleResponse, JobPosting, JobSearch, LoginRequest,
    LogoutRequest, MessageReadRequest, MessageReadResponse, Paginated, ProfileUpdate,
    RefreshRequest, RegisterRequest, StatusUpdateRequest, TokenResponse,
};
use crate::api::types::ApplicationStatus;
use crate::session::user::UserRecord;

impl ApiClient {
    /// `POST auth/login`.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<AuthResponse> {
        self.post(
            "auth/login",
            &LoginRequest {
                email,
                password,
            },
        )
        .await
    }

    /// `POST auth/register`.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthResponse> {
        self.post("auth/register", request).await
    }

    /// `POST auth/refresh`.
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<TokenResponse> {
        self.post(
            "auth/refresh",
            &RefreshRequest {
                refresh: refresh_token,
            },
        )
        .await
    }

    /// `POST auth/logout`. Best-effort; the caller swallows failures.
    pub async fn logout(&self, refresh_token: &str) -> ApiResult<()> {
        self.post_ignore_body(
            "auth/logout",
            &LogoutRequest {
                refresh: refresh_token,
            },
        )
        .await
    }

    /// `GET users/profile`.
    pub async fn profile(&self) -> ApiResult<UserRecord> {
        self.get("users/profile").await
    }

    /// `PUT users/profile`.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<UserRecord> {
        self.put("users/profile", update).await
    }

    /// `GET jobs/`: the main feed.
    pub async fn jobs(&self, page: u32, per_page: u32) -> ApiResult<Paginated<JobPosting>> {
        self.get_query(
            "jobs/",
            &[("page", page.to_string()), ("per_page", per_page.to_string())],
        )
        .await
    }

    /// `GET jobs/search`: filtered feed, including flash jobs.
    pub async fn search_jobs(
        &self,
        search: &JobSearch,
        page: u32,
        per_page: u32,
    ) -> ApiResult<Paginated<JobPosting>> {
        self.get_query("jobs/search", &search.to_query(page, per_page))
            .await
    }

    /// `POST favorites/toggle/{job_id}/{user_id}`.
    pub async fn toggle_favorite(
        &self,
        job_id: i64,
        user_id: i64,
    ) -> ApiResult<FavoriteToggleResponse> {
        self.post_empty(&format!("favorites/toggle/{job_id}/{user_id}"))
            .await
    }

    /// `PUT applications/{id}/status`.
    pub async fn set_application_status(
        &self,
        application_id: i64,
        status: ApplicationStatus,
    ) -> ApiResult<Application> {
        self.put(
            &format!("applications/{application_id}/status"),
            &StatusUpdateRequest {
                status,
            },
        )
        .await
    }

    /// `PUT messages/{id}/read`.
    pub async fn mark_message_read(
        &self,
        message_id: i64,
        read: bool,
    ) -> ApiResult<MessageReadResponse> {
        self.put(
            &format!("messages/{message_id}/read"),
            &MessageReadRequest {
                read,
            },
        )
        .await
    }
}
