// =========================
// tests/integration/user_routes_tests.rs
// =========================
//! Profile routes and the ownership rule
use axum::http::{Method, StatusCode};
use backend_lib::storage::{FlatFileUserStore, UserStore};
use serde_json::json;

use crate::test_utils::{
    bare_request, bearer, get_request, json_request, login, register, send, setup_test_app, PREFIX,
};

#[tokio::test]
async fn test_owner_can_read_update_delete() {
    let (app, _state, _dir) = setup_test_app();
    let vera = register(&app, "Vera Rubin", "vera@example.com", "dark-matter").await;
    let token = login(&app, "vera@example.com", "dark-matter").await;
    let uri = format!("{PREFIX}/users/{}", vera["id"]);

    let (status, body) = send(&app, get_request(&uri, Some(&bearer(&token)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Vera Rubin");

    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            &uri,
            Some(&token),
            &json!({ "name": "Vera C. Rubin", "password": "galaxy-rotation" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Vera C. Rubin");
    assert!(body["updated_at"].is_string());

    // New password works
    login(&app, "vera@example.com", "galaxy-rotation").await;

    let (status, body) = send(&app, bare_request(Method::DELETE, &uri, Some(&bearer(&token)))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    // The token outlives its subject and is refused
    let (status, _) = send(
        &app,
        get_request(&format!("{PREFIX}/users/me"), Some(&bearer(&token))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_other_users_are_forbidden() {
    let (app, _state, _dir) = setup_test_app();
    register(&app, "Vera Rubin", "vera@example.com", "dark-matter").await;
    let carl = register(&app, "Carl Sagan", "carl@example.com", "pale-blue-dot").await;
    let token = login(&app, "vera@example.com", "dark-matter").await;
    let uri = format!("{PREFIX}/users/{}", carl["id"]);

    let (status, body) = send(&app, get_request(&uri, Some(&bearer(&token)))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "USER_003");

    let (status, _) = send(
        &app,
        json_request(Method::PUT, &uri, Some(&token), &json!({ "name": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, bare_request(Method::DELETE, &uri, Some(&bearer(&token)))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_rejects_empty_and_taken_email() {
    let (app, _state, _dir) = setup_test_app();
    let vera = register(&app, "Vera Rubin", "vera@example.com", "dark-matter").await;
    register(&app, "Carl Sagan", "carl@example.com", "pale-blue-dot").await;
    let token = login(&app, "vera@example.com", "dark-matter").await;
    let uri = format!("{PREFIX}/users/{}", vera["id"]);

    let (status, _) = send(&app, json_request(Method::PUT, &uri, Some(&token), &json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        json_request(
            Method::PUT,
            &uri,
            Some(&token),
            &json!({ "email": "Carl@Example.com" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_list_users_paginates() {
    let (app, _state, _dir) = setup_test_app();
    register(&app, "Vera Rubin", "vera@example.com", "dark-matter").await;
    register(&app, "Carl Sagan", "carl@example.com", "pale-blue-dot").await;
    register(&app, "Jocelyn Bell", "jocelyn@example.com", "pulsar-cp1919").await;
    let token = login(&app, "vera@example.com", "dark-matter").await;

    let (status, body) = send(
        &app,
        get_request(&format!("{PREFIX}/users"), Some(&bearer(&token))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, body) = send(
        &app,
        get_request(
            &format!("{PREFIX}/users?skip=1&limit=1"),
            Some(&bearer(&token)),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let page = body.as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["email"], "carl@example.com");

    let (status, _) = send(&app, get_request(&format!("{PREFIX}/users"), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_users_persist_across_restart() {
    let (app, state, dir) = setup_test_app();
    register(&app, "Vera Rubin", "vera@example.com", "dark-matter").await;
    drop(app);
    drop(state);

    let reopened = FlatFileUserStore::new(dir.path()).unwrap();
    let user = reopened
        .get_by_email("vera@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(user.name, "Vera Rubin");
    assert!(user.hashed_password.starts_with("$scrypt$"));
}
