//! Integration tests for the login/logout flow against a mock server.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use assert_cmd::prelude::*;
use predicates::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn auth_body() -> serde_json::Value {
    serde_json::json!({
        "user": {"id": 7, "role": "candidate", "name": "Ada", "email": "a@b.com"},
        "token": "tok-live-1234567890abcdef",
        "refresh": "ref-live-1234567890abcdef",
    })
}

fn write_config(home: &Path, base_url: &str) {
    fs::create_dir_all(home).unwrap();
    fs::write(
        home.join("config.toml"),
        format!("api_base_url = \"{base_url}\"\n"),
    )
    .unwrap();
}

/// Test: login persists credentials; whoami then works offline; logout
/// clears the cache.
#[tokio::test(flavor = "multi_thread")]
async fn test_login_whoami_logout_cycle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let temp = tempfile::tempdir().unwrap();
    write_config(temp.path(), &server.uri());
    let credentials_path = temp.path().join("credentials.json");

    Command::cargo_bin("jobdeck")
        .unwrap()
        .env("JOBDECK_HOME", temp.path())
        .args(["login", "--email", "a@b.com", "--password", "secret"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as Ada"));

    assert!(credentials_path.exists(), "credentials.json should exist");
    let contents = fs::read_to_string(&credentials_path).unwrap();
    assert!(contents.contains("tok-live-1234567890abcdef"));

    // whoami reads the cached session; the mock sees no further requests.
    let requests_before = server.received_requests().await.unwrap().len();
    Command::cargo_bin("jobdeck")
        .unwrap()
        .env("JOBDECK_HOME", temp.path())
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ada <a@b.com>"))
        .stdout(predicate::str::contains("candidate"));
    let requests_after = server.received_requests().await.unwrap().len();
    assert_eq!(requests_before, requests_after);

    Command::cargo_bin("jobdeck")
        .unwrap()
        .env("JOBDECK_HOME", temp.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));

    let contents = fs::read_to_string(&credentials_path).unwrap();
    assert!(!contents.contains("tok-live-1234567890abcdef"));
}

/// Test: a password can be supplied on stdin when --password is omitted.
#[tokio::test(flavor = "multi_thread")]
async fn test_login_prompts_for_password() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body()))
        .mount(&server)
        .await;

    let temp = tempfile::tempdir().unwrap();
    write_config(temp.path(), &server.uri());

    let mut child = Command::cargo_bin("jobdeck")
        .unwrap()
        .env("JOBDECK_HOME", temp.path())
        .args(["login", "--email", "a@b.com"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn command");

    {
        let stdin = child.stdin.as_mut().expect("Failed to open stdin");
        stdin
            .write_all(b"secret\n")
            .expect("Failed to write to stdin");
    }

    let output = child.wait_with_output().expect("Failed to read output");
    assert!(output.status.success(), "Command failed: {output:?}");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Logged in as Ada"), "Should show success message");
}

/// Test: rejected credentials produce an inline failure, not a stack trace.
#[tokio::test(flavor = "multi_thread")]
async fn test_login_invalid_credentials_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(serde_json::json!({"message": "invalid credentials"})),
        )
        .mount(&server)
        .await;

    let temp = tempfile::tempdir().unwrap();
    write_config(temp.path(), &server.uri());

    Command::cargo_bin("jobdeck")
        .unwrap()
        .env("JOBDECK_HOME", temp.path())
        .args(["login", "--email", "a@b.com", "--password", "wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Login failed"))
        .stderr(predicate::str::contains("invalid credentials"));

    assert!(!temp.path().join("credentials.json").exists());
}

/// Test: the jobs feed renders through the pipeline with the cached token.
#[tokio::test(flavor = "multi_thread")]
async fn test_jobs_list_renders_feed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                {"id": 42, "title": "Backend Engineer", "company": "Acme", "isFavorite": true},
                {"id": 43, "title": "Data Engineer", "is_flash": true},
            ],
            "meta": {"current_page": 1, "last_page": 1, "per_page": 20, "total": 2},
        })))
        .mount(&server)
        .await;

    let temp = tempfile::tempdir().unwrap();
    write_config(temp.path(), &server.uri());

    Command::cargo_bin("jobdeck")
        .unwrap()
        .env("JOBDECK_HOME", temp.path())
        .args(["login", "--email", "a@b.com", "--password", "secret"])
        .assert()
        .success();

    Command::cargo_bin("jobdeck")
        .unwrap()
        .env("JOBDECK_HOME", temp.path())
        .args(["jobs", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backend Engineer"))
        .stdout(predicate::str::contains("Acme"))
        .stdout(predicate::str::contains("[flash]"))
        .stdout(predicate::str::contains("★"));

    // The feed request carried the stored bearer token.
    let requests = server.received_requests().await.unwrap();
    let feed_request = requests
        .iter()
        .find(|r| r.url.path() == "/jobs/")
        .expect("feed request");
    let auth_header = feed_request
        .headers
        .get("authorization")
        .expect("authorization header");
    assert!(
        auth_header
            .to_str()
            .unwrap()
            .contains("tok-live-1234567890abcdef")
    );
}
