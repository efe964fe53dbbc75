//! The request pipeline.
//!
//! Every outgoing call goes through `ApiClient`: the current access token is
//! attached as a bearer credential when one exists, a request id is stamped
//! for log correlation, and failures are classified into the error taxonomy.
//! A 401 on an authenticated request tears the shared session down
//! synchronously before the error is surfaced, so concurrently dispatched
//! requests observe the cleared session rather than retrying with a stale
//! token. Responses with status >= 500 surface unmodified; retries are the
//! caller's responsibility because blind retry is unsafe for non-idempotent
//! writes.

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::{ApiError, ApiResult};
use crate::config::Config;
use crate::session::SessionHandle;

/// HTTP client bound to one API base URL and the process-wide session.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    session: SessionHandle,
}

impl ApiClient {
    /// Creates a client from the loaded configuration.
    ///
    /// The request timeout is fixed here; a timed-out call classifies as a
    /// network failure for every caller.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &Config, session: SessionHandle) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ApiError::network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url().to_string(),
            http,
            session,
        })
    }

    /// The shared session this pipeline reads tokens from.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let (builder, authenticated) = self.request(Method::GET, path);
        self.send(builder, authenticated, path).await
    }

    pub(crate) async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let (builder, authenticated) = self.request(Method::GET, path);
        self.send(builder.query(query), authenticated, path).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> ApiResult<T> {
        let (builder, authenticated) = self.request(Method::POST, path);
        self.send(builder.json(body), authenticated, path).await
    }

    /// POST with an empty body (toggle-style endpoints).
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let (builder, authenticated) = self.request(Method::POST, path);
        self.send(builder, authenticated, path).await
    }

    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> ApiResult<T> {
        let (builder, authenticated) = self.request(Method::PUT, path);
        self.send(builder.json(body), authenticated, path).await
    }

    /// POST where the response body is irrelevant (best-effort calls).
    pub(crate) async fn post_ignore_body(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> ApiResult<()> {
        let (builder, authenticated) = self.request(Method::POST, path);
        let response = builder
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::from_transport(&e))?;
        self.check_status(response, authenticated, path)
            .await
            .map(|_| ())
    }

    /// Outgoing hook: builds the request and attaches the current token.
    ///
    /// Requests issued while no token exists proceed unauthenticated
    /// (login, registration, public reads). The returned flag records
    /// whether a bearer credential was attached, which later distinguishes
    /// session expiry from rejected credentials on a 401.
    fn request(&self, method: Method, path: &str) -> (RequestBuilder, bool) {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let request_id = uuid::Uuid::new_v4().to_string();

        let mut builder = self
            .http
            .request(method.clone(), url.as_str())
            .header("x-request-id", request_id.as_str());

        let token = self.session.access_token();
        let authenticated = token.is_some();
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        tracing::debug!(%method, path, %request_id, authenticated, "dispatching request");
        (builder, authenticated)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        authenticated: bool,
        path: &str,
    ) -> ApiResult<T> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_transport(&e))?;
        let response = self.check_status(response, authenticated, path).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::network(format!("malformed response from {path}: {e}")))
    }

    /// Incoming hook: classifies non-success statuses.
    ///
    /// On a 401 against an authenticated request, the shared session is
    /// cleared under the lock before the error value is returned, with no
    /// suspension point in between, so every request polled after the
    /// teardown sees the invalidated session.
    async fn check_status(
        &self,
        response: reqwest::Response,
        authenticated: bool,
        path: &str,
    ) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let err = ApiError::from_status(status.as_u16(), &body, authenticated);
        if err.is_session_expired() {
            self.session.invalidate();
            tracing::warn!(path, "session invalidated by 401 response");
        } else {
            tracing::debug!(path, status = status.as_u16(), kind = %err.kind, "request failed");
        }
        Err(err)
    }
}
