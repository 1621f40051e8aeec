// =========================
// tests/integration/auth_flow_tests.rs
// =========================
//! Register, login and token handling over HTTP
use std::time::Duration;

use axum::http::{header, Method, StatusCode};
use backend_lib::auth::{AuthContext, Rejection, TokenService};
use exoplanet_common::{ErrorBody, TokenResponse, BEARER_TOKEN_TYPE};
use serde_json::{json, Map, Value};
use tower::ServiceExt;

use crate::test_utils::{
    bearer, get_request, json_request, login, login_request, register, send, setup_test_app,
    setup_test_app_with, tamper_signature, test_auth_settings, PREFIX,
};

#[tokio::test]
async fn test_register_login_me() {
    let (app, _state, _dir) = setup_test_app();

    let created = register(&app, "Vera Rubin", "Vera@Example.com", "dark-matter").await;
    assert_eq!(created["email"], "vera@example.com");
    assert_eq!(created["name"], "Vera Rubin");
    assert!(created.get("hashed_password").is_none());
    assert!(created.get("password").is_none());

    let (status, body) = send(&app, login_request("vera@example.com", "dark-matter")).await;
    assert_eq!(status, StatusCode::OK);
    let token: TokenResponse = serde_json::from_value(body).unwrap();
    assert_eq!(token.token_type, BEARER_TOKEN_TYPE);
    assert_eq!(token.expires_in, 30 * 60);

    let (status, me) = send(
        &app,
        get_request(&format!("{PREFIX}/users/me"), Some(&bearer(&token.access_token))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], created["id"]);
    assert_eq!(me["email"], "vera@example.com");
}

#[tokio::test]
async fn test_token_expires_end_to_end() {
    let (app, state, _dir) = setup_test_app();
    register(&app, "Vera Rubin", "vera@example.com", "dark-matter").await;

    // Same secret as the app, shorter lifetime
    let tokens = TokenService::new(&test_auth_settings()).unwrap();
    let token = tokens
        .issue_with_lifetime("vera@example.com", Map::new(), chrono::Duration::seconds(2))
        .unwrap();

    assert_eq!(
        state.auth.validate_token(Some(&token)).subject(),
        Some("vera@example.com")
    );
    let me = format!("{PREFIX}/users/me");
    let (status, _) = send(&app, get_request(&me, Some(&bearer(&token)))).await;
    assert_eq!(status, StatusCode::OK);

    // `iat` is truncated to whole seconds, so wait out the full lifetime plus margin
    tokio::time::sleep(Duration::from_millis(2100)).await;

    assert_eq!(
        state.auth.validate_token(Some(&token)),
        AuthContext::Rejected(Rejection::Expired)
    );
    let (status, _) = send(&app, get_request(&me, Some(&bearer(&token)))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, get_request("/", Some(&bearer(&token)))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let (app, _state, _dir) = setup_test_app();
    register(&app, "Vera Rubin", "vera@example.com", "dark-matter").await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            &format!("{PREFIX}/auth/register"),
            None,
            &json!({ "name": "Impostor", "email": "VERA@example.com", "password": "whatever-pw" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "USER_002");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let (app, _state, _dir) = setup_test_app();
    for payload in [
        json!({ "name": "Vera", "email": "not-an-email", "password": "dark-matter" }),
        json!({ "name": "Vera", "email": "vera@example.com", "password": "short" }),
        json!({ "name": "   ", "email": "vera@example.com", "password": "dark-matter" }),
    ] {
        let (status, body) = send(
            &app,
            json_request(Method::POST, &format!("{PREFIX}/auth/register"), None, &payload),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
        assert_eq!(body["error"]["code"], "VAL_001");
    }
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (app, _state, _dir) = setup_test_app();
    register(&app, "Vera Rubin", "vera@example.com", "dark-matter").await;

    let (wrong_status, wrong_body) =
        send(&app, login_request("vera@example.com", "not-the-password")).await;
    let (unknown_status, unknown_body) =
        send(&app, login_request("nobody@example.com", "dark-matter")).await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    let wrong: ErrorBody = serde_json::from_value(wrong_body).unwrap();
    let unknown: ErrorBody = serde_json::from_value(unknown_body).unwrap();
    assert_eq!(wrong, unknown);
    assert_eq!(wrong, ErrorBody::new("AUTH_001", "Incorrect email or password"));
}

#[tokio::test]
async fn test_login_form_with_reserved_characters() {
    let (app, _state, _dir) = setup_test_app();
    let password = "p&ss w=rd+100%";
    register(&app, "Vera Rubin", "vera+news@example.com", password).await;

    let (status, body) = send(&app, login_request("vera+news@example.com", password)).await;
    assert_eq!(status, StatusCode::OK, "body {body}");
    let (status, _) = send(&app, login_request("vera+news@example.com", "p&ss w=rd 100%")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_lockout() {
    let (app, _state, _dir) = setup_test_app_with(|settings| {
        settings.login_rate_limit.max_attempts = 2;
    });
    register(&app, "Vera Rubin", "vera@example.com", "dark-matter").await;

    for _ in 0..2 {
        let (status, _) = send(&app, login_request("vera@example.com", "wrong-password")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = send(&app, login_request("vera@example.com", "dark-matter")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "AUTH_004");

    // Other identities are unaffected
    register(&app, "Carl Sagan", "carl@example.com", "pale-blue-dot").await;
    login(&app, "carl@example.com", "pale-blue-dot").await;
}

#[tokio::test]
async fn test_root_is_guest_friendly() {
    let (app, _state, _dir) = setup_test_app();

    let (status, body) = send(&app, get_request("/", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
    assert_eq!(body["user"], Value::Null);

    register(&app, "Vera Rubin", "vera@example.com", "dark-matter").await;
    let token = login(&app, "vera@example.com", "dark-matter").await;
    let (status, body) = send(&app, get_request("/", Some(&bearer(&token)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"], "vera@example.com");
}

#[tokio::test]
async fn test_bad_token_is_never_guest_access() {
    let (app, _state, _dir) = setup_test_app();
    register(&app, "Vera Rubin", "vera@example.com", "dark-matter").await;
    let token = login(&app, "vera@example.com", "dark-matter").await;
    let tampered = bearer(&tamper_signature(&token));

    for uri in ["/".to_string(), format!("{PREFIX}/users/me")] {
        let response = app
            .clone()
            .oneshot(get_request(&uri, Some(&tampered)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri {uri}");
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    // Not a bearer credential at all
    let (status, _) = send(&app, get_request("/", Some("Basic dmVyYTpkYXJr"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_token_on_protected_route() {
    let (app, _state, _dir) = setup_test_app();
    let (status, body) = send(&app, get_request(&format!("{PREFIX}/users/me"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_002");
}

#[tokio::test]
async fn test_health() {
    let (app, _state, _dir) = setup_test_app();
    let (status, body) = send(&app, get_request("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy" }));
}
