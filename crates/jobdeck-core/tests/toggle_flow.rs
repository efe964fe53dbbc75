//! Integration tests for optimistic toggles against a mock server.

use std::time::Duration;

use jobdeck_core::api::ApiClient;
use jobdeck_core::api::types::ApplicationStatus;
use jobdeck_core::config::Config;
use jobdeck_core::session::SessionHandle;
use jobdeck_core::sync::applications::ApplicationStatusStore;
use jobdeck_core::sync::favorites::FavoriteSet;
use jobdeck_core::sync::messages::MessageReadSet;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_ID: i64 = 7;

fn api_for(server: &MockServer) -> ApiClient {
    let config = Config {
        api_base_url: server.uri(),
        request_timeout_secs: 5,
    };
    ApiClient::new(&config, SessionHandle::new()).unwrap()
}

fn favorite_response(favorited: bool) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({"isFavorite": favorited}))
}

/// A successful toggle keeps the server-confirmed state.
#[tokio::test]
async fn favorite_toggle_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/favorites/toggle/42/{USER_ID}")))
        .respond_with(favorite_response(true))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let favorites = FavoriteSet::new();

    let confirmed = favorites.toggle(&api, USER_ID, 42).await.unwrap();
    assert!(confirmed);
    assert!(favorites.is_favorite(42));
}

/// A failed toggle reverts to the pre-toggle state before the caller sees
/// the error.
#[tokio::test]
async fn favorite_toggle_failure_reverts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let favorites = FavoriteSet::new();

    let err = favorites.toggle(&api, USER_ID, 42).await.unwrap_err();
    assert_eq!(err.kind, jobdeck_core::api::ApiErrorKind::Server);
    assert!(!favorites.is_favorite(42));
}

/// Add then remove on job 42 before either call resolves: the final
/// reconciled state matches the server's last authoritative response, not
/// the UI's last optimistic guess.
#[tokio::test]
async fn favorite_double_toggle_race() {
    let server = MockServer::start().await;
    // First request (the add) answers slowly and lands last.
    Mock::given(method("POST"))
        .and(path(format!("/favorites/toggle/42/{USER_ID}")))
        .respond_with(favorite_response(true).set_delay(Duration::from_millis(250)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    // Second request (the remove) answers immediately.
    Mock::given(method("POST"))
        .and(path(format!("/favorites/toggle/42/{USER_ID}")))
        .respond_with(favorite_response(false))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let favorites = FavoriteSet::new();

    let (add, remove) = tokio::join!(
        favorites.toggle(&api, USER_ID, 42),
        favorites.toggle(&api, USER_ID, 42),
    );
    add.unwrap();
    remove.unwrap();

    // The slow add resolved last; its response wins.
    assert!(favorites.is_favorite(42));
}

/// Toggles on unrelated targets are independent: one failing never
/// disturbs the other's outcome.
#[tokio::test]
async fn unrelated_toggles_do_not_interfere() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/favorites/toggle/1/{USER_ID}")))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(100)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/favorites/toggle/2/{USER_ID}")))
        .respond_with(favorite_response(true))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let favorites = FavoriteSet::new();

    let (failed, succeeded) = tokio::join!(
        favorites.toggle(&api, USER_ID, 1),
        favorites.toggle(&api, USER_ID, 2),
    );
    assert!(failed.is_err());
    assert!(succeeded.is_ok());

    assert!(!favorites.is_favorite(1));
    assert!(favorites.is_favorite(2));
}

/// Application status changes reconcile to the server's returned record.
#[tokio::test]
async fn application_status_reconciles() {
    let server = MockServer::start().await;
    // The optimistic guess is `accepted`; the server says `reviewed`.
    Mock::given(method("PUT"))
        .and(path("/applications/11/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 11,
            "job_id": 42,
            "status": "reviewed",
        })))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let store = ApplicationStatusStore::new();

    let confirmed = store
        .set_status(&api, 11, ApplicationStatus::Accepted)
        .await
        .unwrap();
    assert_eq!(confirmed, ApplicationStatus::Reviewed);
    assert_eq!(store.status(11), Some(ApplicationStatus::Reviewed));
}

/// A failed status change reverts to the previous status.
#[tokio::test]
async fn application_status_failure_reverts() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(422).set_body_json(
            serde_json::json!({"message": "invalid transition"}),
        ))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let store = ApplicationStatusStore::new();
    store.seed_from(&[serde_json::from_value(serde_json::json!({
        "id": 11,
        "job_id": 42,
        "status": "interview",
    }))
    .unwrap()]);

    let err = store
        .set_status(&api, 11, ApplicationStatus::Accepted)
        .await
        .unwrap_err();
    assert_eq!(err.kind, jobdeck_core::api::ApiErrorKind::Validation);
    assert_eq!(store.status(11), Some(ApplicationStatus::Interview));
}

/// Message read-marking goes through the same optimistic protocol.
#[tokio::test]
async fn message_mark_read() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/messages/3/read"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"read": true})))
        .mount(&server)
        .await;

    let api = api_for(&server);
    let reads = MessageReadSet::new();

    assert!(!reads.is_read(3));
    reads.mark_read(&api, 3, true).await.unwrap();
    assert!(reads.is_read(3));
}
