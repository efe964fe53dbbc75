//! Wire types for the marketplace REST surface.
//!
//! Server records are immutable value objects once fetched, identified by a
//! stable integer id used for de-duplication. The backend mixes snake_case
//! envelopes with a few camelCase fields; renames are pinned here so the
//! rest of the crate never sees them.

use serde::{Deserialize, Serialize};

use crate::session::user::{Role, UserRecord};

/// Response to `POST auth/login` and `POST auth/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: UserRecord,
    pub token: String,
    #[serde(default)]
    pub refresh: Option<String>,
    /// Access token lifetime in seconds, when the server reports one.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Response to `POST auth/refresh`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    /// Rotated refresh token, when the server rotates.
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Fields for `POST auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct LogoutRequest<'a> {
    pub refresh: &'a str,
}

/// Partial profile update for `PUT users/profile`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// One server-delivered page: `{ data: [...], meta: {...} }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Cursor metadata attached to every paginated envelope.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageMeta {
    pub current_page: u32,
    pub last_page: u32,
    pub per_page: u32,
    pub total: u64,
}

/// A job posting from the feed or search endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct JobPosting {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub salary_min: Option<i64>,
    #[serde(default)]
    pub salary_max: Option<i64>,
    /// Short-lived posting surfaced in the flash-job feed.
    #[serde(default)]
    pub is_flash: bool,
    #[serde(default, rename = "isFavorite")]
    pub is_favorite: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A submitted application.
#[derive(Debug, Clone, Deserialize)]
pub struct Application {
    pub id: i64,
    pub job_id: i64,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Server-defined lifecycle of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Interview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "reviewed" => Ok(ApplicationStatus::Reviewed),
            "interview" => Ok(ApplicationStatus::Interview),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("unknown application status '{other}'")),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StatusUpdateRequest {
    pub status: ApplicationStatus,
}

/// A message in an employer conversation.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: i64,
    pub body: String,
    #[serde(default)]
    pub read: bool,
}

/// Response to `POST favorites/toggle/{job_id}/{user_id}`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FavoriteToggleResponse {
    #[serde(rename = "isFavorite")]
    pub is_favorite: bool,
}

/// Response to `PUT messages/{id}/read`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MessageReadResponse {
    pub read: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct MessageReadRequest {
    pub read: bool,
}

/// Filters for `GET jobs/search`.
#[derive(Debug, Clone, Default)]
pub struct JobSearch {
    pub query: Option<String>,
    pub location: Option<String>,
    /// Restrict to the flash-job feed.
    pub flash_only: bool,
}

impl JobSearch {
    /// Renders the filters plus cursor into query parameters.
    pub(crate) fn to_query(&self, page: u32, per_page: u32) -> Vec<(&'static str, String)> {
        let mut query = vec![("page", page.to_string()), ("per_page", per_page.to_string())];
        if let Some(q) = self.query.as_deref() {
            query.push(("q", q.to_string()));
        }
        if let Some(location) = self.location.as_deref() {
            query.push(("location", location.to_string()));
        }
        if self.flash_only {
            query.push(("flash", "1".to_string()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: paginated envelope deserialization.
    #[test]
    fn test_paginated_envelope() {
        let json = r#"{
            "data": [{"id": 42, "title": "Backend Engineer", "isFavorite": true}],
            "meta": {"current_page": 1, "last_page": 3, "per_page": 20, "total": 55}
        }"#;
        let page: Paginated<JobPosting> = serde_json::from_str(json).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, 42);
        assert!(page.data[0].is_favorite);
        assert!(!page.data[0].is_flash);
        assert_eq!(page.meta.last_page, 3);
    }

    /// Test: auth response tolerates a missing refresh token.
    #[test]
    fn test_auth_response_without_refresh() {
        let json = r#"{
            "user": {"id": 1, "role": "candidate", "name": "Ada", "email": "a@b.com"},
            "token": "tok"
        }"#;
        let auth: AuthResponse = serde_json::from_str(json).unwrap();
        assert!(auth.refresh.is_none());
        assert!(auth.expires_in.is_none());
    }

    /// Test: application status round-trips through its wire form.
    #[test]
    fn test_application_status_strings() {
        for status in [
            ApplicationStatus::Pending,
            ApplicationStatus::Reviewed,
            ApplicationStatus::Interview,
            ApplicationStatus::Accepted,
            ApplicationStatus::Rejected,
        ] {
            let parsed: ApplicationStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("shortlisted".parse::<ApplicationStatus>().is_err());
    }

    /// Test: search filters render only what is set.
    #[test]
    fn test_search_query_rendering() {
        let search = JobSearch {
            query: Some("rust".to_string()),
            location: None,
            flash_only: true,
        };
        let query = search.to_query(2, 20);
        assert!(query.contains(&("page", "2".to_string())));
        assert!(query.contains(&("q", "rust".to_string())));
        assert!(query.contains(&("flash", "1".to_string())));
        assert!(!query.iter().any(|(k, _)| *k == "location"));
    }
}
