mod common;

use axum::http::StatusCode;
use common::{body_json, get, post_json, setup_test_app, token_for};
use sales_auth::{ROLE_ADMIN, ROLE_USER};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn test_user_can_read_self() {
    let app = setup_test_app().await;
    let token = token_for(&app.auth, &app.user.id.to_string(), &[ROLE_USER]);

    let response = app
        .router
        .oneshot(get(&format!("/v1/users/{}", app.user.id), Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], "user@example.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_user_can_read_self_with_uppercase_id() {
    let app = setup_test_app().await;
    let token = token_for(&app.auth, &app.user.id.to_string(), &[ROLE_USER]);
    let upper = app.user.id.to_string().to_uppercase();

    let response = app
        .router
        .oneshot(get(&format!("/v1/users/{upper}"), Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], app.user.id.to_string());
}

#[tokio::test]
async fn test_user_cannot_see_other_users() {
    let app = setup_test_app().await;
    let token = token_for(&app.auth, &app.user.id.to_string(), &[ROLE_USER]);

    let response = app
        .router
        .oneshot(get(&format!("/v1/users/{}", app.admin.id), Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "not found");
}

#[tokio::test]
async fn test_admin_can_read_any_user() {
    let app = setup_test_app().await;
    let token = token_for(&app.auth, &app.admin.id.to_string(), &[ROLE_ADMIN]);

    let response = app
        .router
        .oneshot(get(&format!("/v1/users/{}", app.user.id), Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], app.user.id.to_string());
}

#[tokio::test]
async fn test_missing_user_is_not_found() {
    let app = setup_test_app().await;
    let token = token_for(&app.auth, &app.admin.id.to_string(), &[ROLE_ADMIN]);

    let response = app
        .router
        .oneshot(get(&format!("/v1/users/{}", Uuid::new_v4()), Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_id_is_bad_request() {
    let app = setup_test_app().await;
    let token = token_for(&app.auth, &app.admin.id.to_string(), &[ROLE_ADMIN]);

    let response = app
        .router
        .oneshot(get("/v1/users/not-a-uuid", Some(&token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "ID is not in its proper form");
}

#[tokio::test]
async fn test_admin_creates_user() {
    let app = setup_test_app().await;
    let token = token_for(&app.auth, &app.admin.id.to_string(), &[ROLE_ADMIN]);

    let payload = json!({
        "name": "Jill Gopher",
        "email": "jill@example.com",
        "roles": ["USER"],
        "password": "gophers123",
        "password_confirm": "gophers123"
    });
    let response = app
        .router
        .oneshot(post_json("/v1/users", Some(&token), &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["email"], "jill@example.com");
    assert_eq!(body["roles"], json!(["USER"]));

    let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
    let stored = app.users.query_by_id(id).await.unwrap();
    assert_eq!(stored.name, "Jill Gopher");
}

#[tokio::test]
async fn test_create_reports_every_invalid_field() {
    let app = setup_test_app().await;
    let token = token_for(&app.auth, &app.admin.id.to_string(), &[ROLE_ADMIN]);

    let payload = json!({
        "name": "",
        "email": "not-an-email",
        "roles": ["USER"],
        "password": "gophers123",
        "password_confirm": "gophers123"
    });
    let response = app
        .router
        .oneshot(post_json("/v1/users", Some(&token), &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "data validation error");
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "name"]);
}

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let app = setup_test_app().await;
    let token = token_for(&app.auth, &app.admin.id.to_string(), &[ROLE_ADMIN]);

    let response = app
        .router
        .oneshot(post_json("/v1/users", Some(&token), &json!({ "name": 42 })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = setup_test_app().await;
    let token = token_for(&app.auth, &app.admin.id.to_string(), &[ROLE_ADMIN]);

    let payload = json!({
        "name": "Another Admin",
        "email": "admin@example.com",
        "roles": ["ADMIN"],
        "password": "gophers123",
        "password_confirm": "gophers123"
    });
    let response = app
        .router
        .oneshot(post_json("/v1/users", Some(&token), &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_user_cannot_create_users() {
    let app = setup_test_app().await;
    let token = token_for(&app.auth, &app.user.id.to_string(), &[ROLE_USER]);

    let payload = json!({
        "name": "Jill Gopher",
        "email": "jill@example.com",
        "roles": ["ADMIN"],
        "password": "gophers123",
        "password_confirm": "gophers123"
    });
    let response = app
        .router
        .oneshot(post_json("/v1/users", Some(&token), &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
