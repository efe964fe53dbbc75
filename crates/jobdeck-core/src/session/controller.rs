//! Session lifecycle: restore, login, registration, token refresh, logout.
//!
//! The controller is the sole writer of both the in-memory session and the
//! credential store. The three persisted values (access token, refresh
//! token, user snapshot) are written as one logical unit: a partial write is
//! rolled back to the previous complete set, or the store is cleared; it is
//! never left partially populated.
//!
//! Two refresh paths exist on purpose and must stay distinct: the
//! best-effort profile refresh after an optimistic restore keeps the cached
//! user on any transient failure, while an explicit token refresh (reactive
//! after a 401) invalidates on any failure. Startup is optimistic, forced
//! reauthentication is conservative.

use super::credentials::{CredentialStore, KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN, KEY_USER};
use super::user::UserRecord;
use super::{SessionHandle, SessionStatus, mask_token, now_millis_u64};
use crate::api::types::{AuthResponse, ProfileUpdate, RegisterRequest};
use crate::api::{ApiClient, ApiError, ApiErrorKind, ApiResult};

/// Expiry buffer: treat tokens as expired five minutes early so a request
/// started just before the deadline does not race the server's clock.
const EXPIRY_BUFFER_MILLIS: u64 = 5 * 60 * 1000;

/// The session state machine.
pub struct SessionController<S: CredentialStore> {
    api: ApiClient,
    store: S,
}

impl<S: CredentialStore> SessionController<S> {
    pub fn new(api: ApiClient, store: S) -> Self {
        Self {
            api,
            store,
        }
    }

    /// The shared session owned by this controller.
    pub fn session(&self) -> &SessionHandle {
        self.api.session()
    }

    /// The pipeline this controller authenticates.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Restores a persisted session at startup.
    ///
    /// Optimistic: a cached token plus user snapshot transitions straight to
    /// `Authenticated` with no network round-trip; the UI shows the
    /// authenticated shell immediately. Callers may follow up with
    /// [`Self::refresh_profile`]. A partially populated store is never
    /// treated as valid: it is cleared and restore reports unauthenticated.
    ///
    /// Idempotent: restoring twice without intervening mutation yields the
    /// same session state.
    ///
    /// # Errors
    /// Returns an error only if the credential store cannot be read.
    pub async fn restore(&self) -> ApiResult<SessionStatus> {
        let access = self.store.get(KEY_ACCESS_TOKEN).await?;
        let refresh = self.store.get(KEY_REFRESH_TOKEN).await?;
        let user_json = self.store.get(KEY_USER).await?;

        let any_present = access.is_some() || refresh.is_some() || user_json.is_some();
        let (Some(access), Some(user_json)) = (access, user_json) else {
            if any_present {
                tracing::warn!("partial credential set found; discarding");
                self.clear_persisted().await;
            }
            return Ok(SessionStatus::Unauthenticated);
        };

        let Ok(user) = serde_json::from_str::<UserRecord>(&user_json) else {
            tracing::warn!("corrupt cached user record; discarding session");
            self.clear_persisted().await;
            return Ok(SessionStatus::Unauthenticated);
        };

        self.session().update(|s| {
            s.access_token = Some(access.clone());
            s.refresh_token = refresh.clone();
            // No expiry deadline is persisted; staleness is caught reactively.
            s.expires_at = None;
            s.user = Some(user.clone());
            s.status = SessionStatus::Authenticated;
        });
        tracing::info!(user_id = user.id, token = %mask_token(&access), "session restored");
        Ok(SessionStatus::Authenticated)
    }

    /// Logs in with email and password.
    ///
    /// # Errors
    /// `Auth` for rejected credentials, `Network` for transport failures
    /// (distinguishable by kind), `Storage` if the new session cannot be
    /// persisted (the controller falls back to logged out), `Validation`
    /// when a session is already active.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<UserRecord> {
        self.begin_authenticating()?;
        tracing::info!(email, "logging in");

        match self.api.login(email, password).await {
            Ok(auth) => self.install_session(auth).await,
            Err(err) => {
                // Back to the previous stable state.
                self.session().update(|s| s.status = SessionStatus::Unauthenticated);
                Err(err)
            }
        }
    }

    /// Registers a new account, producing a session on success.
    ///
    /// # Errors
    /// Same shape as [`Self::login`].
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<UserRecord> {
        self.begin_authenticating()?;
        tracing::info!(email = %request.email, "registering");

        match self.api.register(request).await {
            Ok(auth) => self.install_session(auth).await,
            Err(err) => {
                self.session().update(|s| s.status = SessionStatus::Unauthenticated);
                Err(err)
            }
        }
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// Invoked proactively (expired deadline) or reactively after a 401.
    /// Conservative on purpose: a missing refresh token invalidates, and so
    /// does any failure of the exchange itself.
    ///
    /// # Errors
    /// `SessionExpired` when no refresh token exists; otherwise the
    /// underlying failure.
    pub async fn refresh_token(&self) -> ApiResult<()> {
        let Some(refresh) = self.session().refresh_token() else {
            tracing::warn!("no refresh token; invalidating session");
            self.invalidate().await;
            return Err(ApiError::new(
                ApiErrorKind::SessionExpired,
                "no refresh token available",
            ));
        };
        let Some(user) = self.session().user() else {
            self.invalidate().await;
            return Err(ApiError::new(
                ApiErrorKind::SessionExpired,
                "no active session to refresh",
            ));
        };

        self.session().update(|s| s.status = SessionStatus::RefreshPending);

        match self.api.refresh(&refresh).await {
            Ok(token) => {
                // Keep the old refresh token unless the server rotated it.
                let rotated = token.refresh.clone().unwrap_or(refresh);
                if let Err(err) = self
                    .persist_triple(&token.token, Some(&rotated), &user)
                    .await
                {
                    self.invalidate().await;
                    return Err(err);
                }

                let expires_at = token.expires_in.map(expiry_deadline);
                self.session().update(|s| {
                    s.access_token = Some(token.token.clone());
                    s.refresh_token = Some(rotated.clone());
                    s.expires_at = expires_at;
                    s.status = SessionStatus::Authenticated;
                });
                tracing::info!(token = %mask_token(&token.token), "access token refreshed");
                Ok(())
            }
            Err(err) => {
                self.invalidate().await;
                Err(err)
            }
        }
    }

    /// Best-effort profile refresh after an optimistic restore.
    ///
    /// The cached user stays authoritative on transient failure; only an
    /// explicit 401 tears the session down.
    ///
    /// # Errors
    /// Returns an error only for session expiry.
    pub async fn refresh_profile(&self) -> ApiResult<()> {
        match self.api.profile().await {
            Ok(user) => {
                self.install_user(user).await;
                Ok(())
            }
            Err(err) if err.is_session_expired() => {
                // The pipeline already cleared the in-memory session.
                self.clear_persisted().await;
                Err(err)
            }
            Err(err) => {
                tracing::debug!(%err, "background profile refresh failed; keeping cached user");
                Ok(())
            }
        }
    }

    /// Pushes a profile edit and installs the server's returned record.
    ///
    /// # Errors
    /// Propagates the request's failure; the cached user is untouched.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<UserRecord> {
        if self.session().status() != SessionStatus::Authenticated {
            return Err(ApiError::new(
                ApiErrorKind::Validation,
                "no active session",
            ));
        }

        let user = self.api.update_profile(update).await?;
        self.install_user(user.clone()).await;
        Ok(user)
    }

    /// Replaces the user record wholesale, in memory and in the durable
    /// snapshot. A failed snapshot write is logged, not propagated; the
    /// store still holds the previous complete triple.
    async fn install_user(&self, user: UserRecord) {
        self.session().update(|s| s.user = Some(user.clone()));
        match serde_json::to_string(&user) {
            Ok(user_json) => {
                if let Err(err) = self.store.set(KEY_USER, &user_json).await {
                    tracing::warn!(%err, "could not persist user snapshot");
                }
            }
            Err(err) => tracing::warn!(%err, "could not serialize user snapshot"),
        }
    }

    /// Logs out.
    ///
    /// Server-side revocation is attempted and its failure swallowed; local
    /// teardown never depends on reaching the server.
    pub async fn logout(&self) {
        self.session().update(|s| s.status = SessionStatus::LoggingOut);

        if let Some(refresh) = self.session().refresh_token() {
            if let Err(err) = self.api.logout(&refresh).await {
                tracing::debug!(%err, "server-side logout failed; continuing local teardown");
            }
        }

        self.invalidate().await;
    }

    /// Clears the in-memory session and removes all persisted keys.
    pub async fn invalidate(&self) {
        self.session().invalidate();
        self.clear_persisted().await;
        tracing::info!("session invalidated");
    }

    /// Rejects login/registration while a session is active; the state
    /// machine enters `Authenticating` only from `Unauthenticated`.
    fn begin_authenticating(&self) -> ApiResult<()> {
        let mut conflict = false;
        self.session().update(|s| {
            if s.status == SessionStatus::Unauthenticated {
                s.status = SessionStatus::Authenticating;
            } else {
                conflict = true;
            }
        });
        if conflict {
            return Err(ApiError::new(
                ApiErrorKind::Validation,
                "a session is already active; log out first",
            ));
        }
        Ok(())
    }

    /// Persists a fresh session and installs it in memory.
    async fn install_session(&self, auth: AuthResponse) -> ApiResult<UserRecord> {
        if let Err(err) = self
            .persist_triple(&auth.token, auth.refresh.as_deref(), &auth.user)
            .await
        {
            // A session that cannot be stored is not kept half-alive in
            // memory either: fall through to logged out.
            self.session().invalidate();
            return Err(err);
        }

        let expires_at = auth.expires_in.map(expiry_deadline);
        self.session().update(|s| {
            s.access_token = Some(auth.token.clone());
            s.refresh_token = auth.refresh.clone();
            s.expires_at = expires_at;
            s.user = Some(auth.user.clone());
            s.status = SessionStatus::Authenticated;
        });
        tracing::info!(
            user_id = auth.user.id,
            token = %mask_token(&auth.token),
            "session established"
        );
        Ok(auth.user)
    }

    /// Writes the three session values as one logical unit.
    ///
    /// On partial failure the previous complete set is restored; if that
    /// also fails (or no complete set existed), the store is cleared. The
    /// store ends complete (new or old) or empty, never partial.
    async fn persist_triple(
        &self,
        access: &str,
        refresh: Option<&str>,
        user: &UserRecord,
    ) -> ApiResult<()> {
        let user_json = serde_json::to_string(user)
            .map_err(|e| ApiError::storage(format!("failed to serialize user record: {e}")))?;

        let previous = self.read_complete_set().await;

        if let Err(err) = self.write_triple(access, refresh, &user_json).await {
            tracing::warn!(%err, "session write failed; rolling back");
            let rolled_back = match previous.as_ref() {
                Some((old_access, old_refresh, old_user)) => self
                    .write_triple(old_access, old_refresh.as_deref(), old_user)
                    .await
                    .is_ok(),
                None => false,
            };
            if !rolled_back {
                self.clear_persisted().await;
            }
            return Err(err);
        }
        Ok(())
    }

    async fn write_triple(
        &self,
        access: &str,
        refresh: Option<&str>,
        user_json: &str,
    ) -> ApiResult<()> {
        self.store.set(KEY_ACCESS_TOKEN, access).await?;
        match refresh {
            Some(refresh) => self.store.set(KEY_REFRESH_TOKEN, refresh).await?,
            None => self.store.remove(KEY_REFRESH_TOKEN).await?,
        }
        self.store.set(KEY_USER, user_json).await?;
        Ok(())
    }

    /// Reads the previous complete set, `None` when absent or partial.
    async fn read_complete_set(&self) -> Option<(String, Option<String>, String)> {
        let access = self.store.get(KEY_ACCESS_TOKEN).await.ok()??;
        let refresh = self.store.get(KEY_REFRESH_TOKEN).await.ok()?;
        let user_json = self.store.get(KEY_USER).await.ok()??;
        Some((access, refresh, user_json))
    }

    /// Removes all persisted keys; removal failures are logged, not
    /// propagated, so teardown always completes locally.
    async fn clear_persisted(&self) {
        for key in [KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN, KEY_USER] {
            if let Err(err) = self.store.remove(key).await {
                tracing::warn!(key, %err, "failed to remove persisted credential");
            }
        }
    }
}

/// Deadline in epoch millis for a token lifetime reported in seconds.
fn expiry_deadline(expires_in_secs: u64) -> u64 {
    now_millis_u64() + (expires_in_secs * 1000).saturating_sub(EXPIRY_BUFFER_MILLIS)
}
