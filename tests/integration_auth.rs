mod common;

use axum::http::StatusCode;
use common::{
    app_with_pool, body_json, generate_unique_email, get_request, json_request, offline_app, send,
    token_for,
};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

#[tokio::test]
async fn test_register_rejects_non_admin_role() {
    let request = json_request(
        "POST",
        "/api/v1/auth/register",
        None,
        json!({
            "name": "Hina Raza",
            "email": "hina@learnhub.dev",
            "password": "secret123",
            "role": "teacher"
        }),
    );

    let response = send(offline_app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "This endpoint is only for admin registration");
}

#[tokio::test]
async fn test_register_validation_errors() {
    let request = json_request(
        "POST",
        "/api/v1/auth/register",
        None,
        json!({ "name": "Hina Raza", "email": "not-an-email", "password": "secret123" }),
    );

    let response = send(offline_app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("Please provide a valid email")
    );
}

#[tokio::test]
async fn test_login_requires_email_and_password() {
    let request = json_request(
        "POST",
        "/api/v1/auth/login",
        None,
        json!({ "email": "admin@learnhub.dev" }),
    );

    let response = send(offline_app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Please provide email and password");
}

#[tokio::test]
async fn test_profile_requires_token() {
    let response = send(offline_app(), get_request("/api/v1/auth/profile", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Not authorized to access this route");
}

#[tokio::test]
async fn test_profile_rejects_unknown_role_in_token() {
    let token = token_for("superuser", Uuid::new_v4());
    let response = send(
        offline_app(),
        get_request("/api/v1/auth/profile", Some(&token)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_register_login_and_profile(pool: PgPool) {
    let email = generate_unique_email();

    let register = json_request(
        "POST",
        "/api/v1/auth/register",
        None,
        json!({ "name": "Ada Admin", "email": email, "password": "secret123" }),
    );
    let response = send(app_with_pool(pool.clone()), register).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["token"].as_str().is_some());

    let login = json_request(
        "POST",
        "/api/v1/auth/login",
        None,
        json!({ "email": email.to_uppercase(), "password": "secret123" }),
    );
    let response = send(app_with_pool(pool.clone()), login).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["token"].as_str().unwrap().to_string();

    let response = send(
        app_with_pool(pool.clone()),
        get_request("/api/v1/auth/profile", Some(&token)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["email"], email);
    assert!(body["user"].get("password").is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_register_duplicate_email(pool: PgPool) {
    let email = generate_unique_email();
    let payload = json!({ "name": "Ada Admin", "email": email, "password": "secret123" });

    let first = send(
        app_with_pool(pool.clone()),
        json_request("POST", "/api/v1/auth/register", None, payload.clone()),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = send(
        app_with_pool(pool.clone()),
        json_request("POST", "/api/v1/auth/register", None, payload),
    )
    .await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    let body = body_json(second).await;
    assert_eq!(body["message"], "A user with this email already exists");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_login_invalid_credentials(pool: PgPool) {
    let request = json_request(
        "POST",
        "/api/v1/auth/login",
        None,
        json!({ "email": "nobody@learnhub.dev", "password": "wrongpass" }),
    );

    let response = send(app_with_pool(pool), request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid Credentials");
}
