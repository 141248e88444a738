mod common;

use axum::http::StatusCode;
use common::{
    accounts_for, admin_token, app_with_pool, body_json, create_as, delete_request,
    generate_unique_email, get_request, json_request, send, staff_payload, student_payload,
    teacher_payload, token_for,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_teacher_account_follows_profile(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let email = generate_unique_email();
    let id = create_as(&pool, &admin, "/api/v1/teachers", "teacher", teacher_payload(&email)).await;

    assert_eq!(accounts_for(&pool, id).await, 1);

    let response = send(
        app_with_pool(pool.clone()),
        delete_request(&format!("/api/v1/teachers/{id}"), Some(&admin)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(accounts_for(&pool, id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_staff_account_follows_profile(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let email = generate_unique_email();
    let id = create_as(&pool, &admin, "/api/v1/staff", "staff", staff_payload(&email)).await;

    assert_eq!(accounts_for(&pool, id).await, 1);

    let response = send(
        app_with_pool(pool.clone()),
        delete_request(&format!("/api/v1/staff/{id}"), Some(&admin)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(accounts_for(&pool, id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_deleting_an_instructor_keeps_its_courses(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let email = generate_unique_email();
    let teacher_id =
        create_as(&pool, &admin, "/api/v1/teachers", "teacher", teacher_payload(&email)).await;

    let course_id = create_as(
        &pool,
        &admin,
        "/api/v1/courses",
        "course",
        json!({
            "courseId": "WEB-101",
            "courseName": "Web Development",
            "duration": "3 months",
            "totalLectures": 20,
            "instructorEmail": email,
            "description": "Intro"
        }),
    )
    .await;

    let response = send(
        app_with_pool(pool.clone()),
        delete_request(&format!("/api/v1/teachers/{teacher_id}"), Some(&admin)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        app_with_pool(pool.clone()),
        get_request(&format!("/api/v1/courses/{course_id}"), Some(&admin)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["course"]["instructorId"].is_null());
    assert!(body["course"]["instructor"].is_null());
    assert_eq!(body["course"]["instructorEmail"], email);
}

async fn assert_wrong_password_rejected(pool: &PgPool, email: &str) {
    let response = send(
        app_with_pool(pool.clone()),
        json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({ "email": email, "password": "not-the-password" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid Credentials");

    let response = send(
        app_with_pool(pool.clone()),
        json_request(
            "POST",
            "/api/v1/auth/login",
            None,
            json!({ "email": email, "password": "secret123" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_wrong_password_is_rejected_for_every_profile(pool: PgPool) {
    let admin = admin_token(&pool).await;

    let student = generate_unique_email();
    create_as(&pool, &admin, "/api/v1/students", "student", student_payload(&student)).await;
    assert_wrong_password_rejected(&pool, &student).await;

    let teacher = generate_unique_email();
    create_as(&pool, &admin, "/api/v1/teachers", "teacher", teacher_payload(&teacher)).await;
    assert_wrong_password_rejected(&pool, &teacher).await;

    let staff = generate_unique_email();
    create_as(&pool, &admin, "/api/v1/staff", "staff", staff_payload(&staff)).await;
    assert_wrong_password_rejected(&pool, &staff).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_granting_course_review_applies_on_next_request(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let email = generate_unique_email();
    let staff_id = create_as(&pool, &admin, "/api/v1/staff", "staff", staff_payload(&email)).await;
    let staff = token_for("staff", staff_id);

    let response = send(
        app_with_pool(pool.clone()),
        get_request("/api/v1/courses", Some(&staff)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(
        app_with_pool(pool.clone()),
        json_request(
            "PATCH",
            &format!("/api/v1/staff/{staff_id}"),
            Some(&admin),
            json!({ "authorities": { "courses": { "review": true } } }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        app_with_pool(pool.clone()),
        get_request("/api/v1/courses", Some(&staff)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}
