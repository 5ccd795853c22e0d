use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use http_body_util::BodyExt;
use sha2::{Digest, Sha256};
use tower::ServiceExt;

use authd_auth::{Authenticator, GroupProvider, PasswordBackend, PasswordChangeBackend, PasswordChangeError};
use authd_config::{SettingsStore, StorePaths};
use authd_core::AuthResult;
use authd_server::{routes::router, AppState};

struct FakePasswordBackend;

#[async_trait]
impl PasswordBackend for FakePasswordBackend {
    async fn authenticate(&self, user: &str, password: &str) -> AuthResult {
        AuthResult {
            success: user == "alice" && password == "pw",
            expired: false,
            unauthorized: false,
            user_name: String::new(),
        }
    }
}

struct FakeChangeBackend;

#[async_trait]
impl PasswordChangeBackend for FakeChangeBackend {
    async fn change_password(&self, _user: &str, _old: &str, _new: &str) -> Result<(), PasswordChangeError> {
        Ok(())
    }
}

struct FakeGroups;

#[async_trait]
impl GroupProvider for FakeGroups {
    async fn get_groups(&self, _user: &str) -> Vec<String> {
        vec!["rs_s".to_string()]
    }
}

fn write_fixture(dir: &std::path::Path) {
    std::fs::create_dir_all(dir.join("clients")).unwrap();
    std::fs::create_dir_all(dir.join("resource_servers")).unwrap();
    std::fs::write(
        dir.join("authd.conf"),
        "auth_code_lifetime = 60\naccess_token_lifetime = 300\nrefresh_token_lifetime = 3600\nsilent_mode_enabled = false\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("clients").join("c1.conf"),
        "label = Test Client\nredirect_uri = https://client.example/cb\ngrant_types = authorization_code;password;refresh_token\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("resource_servers").join("rs.conf"),
        "label = RS\nscopes = s\n",
    )
    .unwrap();
}

fn build_state(trust_all_as_localhost: bool) -> (tempfile::TempDir, Arc<AppState>) {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path());
    let settings = Arc::new(SettingsStore::load(StorePaths::new(dir.path())).unwrap());
    let authenticator = Arc::new(Authenticator::new(
        Arc::new(FakePasswordBackend),
        Arc::new(FakeChangeBackend),
        Arc::new(FakeGroups),
    ));
    let state = Arc::new(AppState::new(
        settings,
        authenticator,
        "test-host".to_string(),
        "/auth".to_string(),
        trust_all_as_localhost,
    ));
    (dir, state)
}

fn form_body(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn urlencoding_encode(value: &str) -> String {
    let mut out = String::new();
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[tokio::test]
async fn authorize_without_client_id_is_bad_request() {
    let (_dir, state) = build_state(true);
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/auth/authorize")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn authorize_renders_login_page_for_get() {
    let (_dir, state) = build_state(true);
    let app = router(state);

    let uri = "/auth/authorize?client_id=c1&response_type=code&code_challenge_method=S256&code_challenge=abc&scope=rs:s";
    let response = app
        .oneshot(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("Sign in"));
}

#[tokio::test]
async fn full_authorization_code_grant_with_pkce_mints_tokens() {
    let (_dir, state) = build_state(true);
    let app = router(state);

    let verifier = "test-verifier-0123456789";
    let challenge = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));

    let body = form_body(&[
        ("client_id", "c1"),
        ("response_type", "code"),
        ("code_challenge_method", "S256"),
        ("code_challenge", &challenge),
        ("scope", "rs:s"),
        ("username", "alice"),
        ("password", "pw"),
        ("state", "xyz"),
    ]);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/authorize")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with("https://client.example/cb?code="));
    assert!(location.contains("state=xyz"));

    let code = location
        .split("code=")
        .nth(1)
        .unwrap()
        .split('&')
        .next()
        .unwrap();

    let token_body = form_body(&[
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", "c1"),
        ("code_verifier", verifier),
    ]);

    let token_response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/token")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(token_body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(token_response.status(), StatusCode::OK);
    let body = token_response.into_body().collect().await.unwrap().to_bytes();
    let document: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(document["access_token"].is_string());
    assert!(document["refresh_token"].is_string());
    assert_eq!(document["token_type"], "Bearer");
}

#[tokio::test]
async fn verify_rejects_non_localhost_callers() {
    let (_dir, state) = build_state(false);
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/verify")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("token=anything"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn token_with_unsupported_grant_type_returns_oauth_error_document() {
    let (_dir, state) = build_state(true);
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/token")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("grant_type=client_credentials"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let document: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(document["error"], "unsupported_grant_type");
}

#[tokio::test]
async fn password_change_get_without_username_is_bad_request() {
    let (_dir, state) = build_state(true);
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/auth/password_change")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
