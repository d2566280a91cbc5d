//! Integration tests for login, registration, password reset and logout.

use std::time::Instant;

use tempfile::TempDir;
use tusk_core::api::{ApiClient, ApiErrorKind};
use tusk_core::auth::{AuthFlow, OtpFlow, OtpValidation, RegistrationDraft};
use tusk_core::session::SessionStore;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, home: &TempDir) -> ApiClient {
    ApiClient::with_base_url(
        server.uri(),
        SessionStore::at(home.path().join("session.json")),
    )
}

/// Verifies an OTP against the mock server to obtain a proof.
async fn verified_proof(client: &ApiClient, email: &str) -> tusk_core::auth::OtpProof {
    let flow = OtpFlow::new(client);
    let mut challenge = tusk_core::auth::OtpChallenge::new(email, Instant::now());
    for d in ['1', '2', '3', '4'] {
        challenge.enter_digit(d).unwrap();
    }
    match flow.validate(&mut challenge).await.unwrap() {
        OtpValidation::Verified(proof) => proof,
        other => panic!("expected verification, got {other:?}"),
    }
}

fn mock_otp_validate_ok() -> Mock {
    Mock::given(method("POST"))
        .and(path("/v1/users/otp/validate/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": true
        })))
}

/// Login success persists both tokens.
#[tokio::test]
async fn test_login_persists_tokens() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/users/login/"))
        .and(body_json(serde_json::json!({
            "email_or_username": "ada",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access": "access-token-1",
            "refresh": "refresh-token-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &home);
    AuthFlow::new(&client).login("ada", "hunter2").await.unwrap();

    assert_eq!(client.store().access_token(), "access-token-1");
    assert_eq!(client.store().refresh_token(), "refresh-token-1");
}

/// Wrong password surfaces the server's exact message and writes no tokens.
#[tokio::test]
async fn test_login_failure_surfaces_server_message() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/users/login/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "message": "Invalid credentials"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, &home);
    let err = AuthFlow::new(&client)
        .login("ada", "wrong")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(client.store().access_token(), "");
}

/// Login clears any stale session before the request, even if it fails.
#[tokio::test]
async fn test_login_clears_stale_session() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/users/login/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "message": "Invalid credentials"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, &home);
    client.store().save("stale-access", "stale-refresh");

    let _ = AuthFlow::new(&client).login("ada", "wrong").await;
    assert_eq!(client.store().access_token(), "");
}

/// Registration posts the OTP proof and persists tokens on success.
#[tokio::test]
async fn test_register_success() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    mock_otp_validate_ok().mount(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/users/register/"))
        .and(body_json(serde_json::json!({
            "email": "ada@lovelace.dev",
            "otp": "1234",
            "username": "ada",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "access": "new-access",
            "refresh": "new-refresh"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &home);
    let proof = verified_proof(&client, "ada@lovelace.dev").await;
    let draft = RegistrationDraft::new(proof, "ada", "Ada", "Lovelace", "hunter2");

    AuthFlow::new(&client).register(draft).await.unwrap();
    assert_eq!(client.store().access_token(), "new-access");
}

/// A duplicate email is a distinguished error, not a generic failure.
#[tokio::test]
async fn test_register_duplicate_email() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    mock_otp_validate_ok().mount(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/users/register/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "message": "Email already registered"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, &home);
    let proof = verified_proof(&client, "taken@b.com").await;
    let draft = RegistrationDraft::new(proof, "ada", "Ada", "Lovelace", "hunter2");

    let err = AuthFlow::new(&client).register(draft).await.unwrap_err();
    assert_eq!(err.api_kind(), Some(ApiErrorKind::Duplicate));
    assert_eq!(client.store().access_token(), "");
}

/// Password reset posts new/confirm password plus the OTP proof.
#[tokio::test]
async fn test_reset_password_posts_proof() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    mock_otp_validate_ok().mount(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/users/forgot-password/"))
        .and(body_json(serde_json::json!({
            "new_password": "s3cret!",
            "confirm_password": "s3cret!",
            "otp": "1234",
            "email": "a@b.com"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "Password updated"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, &home);
    let proof = verified_proof(&client, "a@b.com").await;

    AuthFlow::new(&client)
        .reset_password(proof, "s3cret!")
        .await
        .unwrap();

    // No tokens in the response: no session is established.
    assert_eq!(client.store().access_token(), "");
}

/// When the reset response carries tokens, a session is established.
#[tokio::test]
async fn test_reset_password_with_tokens_logs_in() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    mock_otp_validate_ok().mount(&server).await;

    Mock::given(method("POST"))
        .and(path("/v1/users/forgot-password/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access": "reset-access",
            "refresh": "reset-refresh"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, &home);
    let proof = verified_proof(&client, "a@b.com").await;

    AuthFlow::new(&client)
        .reset_password(proof, "s3cret!")
        .await
        .unwrap();

    assert_eq!(client.store().access_token(), "reset-access");
}

/// Logout clears the session and reports whether one existed.
#[tokio::test]
async fn test_logout() {
    let home = TempDir::new().unwrap();
    let server = MockServer::start().await;

    let client = client_for(&server, &home);
    let flow = AuthFlow::new(&client);

    assert!(!flow.logout());

    client.store().save("a", "r");
    assert!(flow.logout());
    assert_eq!(client.store().access_token(), "");
}
