mod common;

use axum::http::{StatusCode, header};
use common::{
    body_json, get_request, json_request, offline_app, offline_app_with, send, test_config,
    token_for,
};
use learnhub_config::RateLimitConfig;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    for uri in [
        "/api/v1/students",
        "/api/v1/teachers",
        "/api/v1/staff",
        "/api/v1/courses",
        "/api/v1/visitors",
        "/api/v1/assignments",
        "/api/v1/quizzes",
    ] {
        let response = send(offline_app(), get_request(uri, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn test_malformed_token_is_unauthorized() {
    let response = send(
        offline_app(),
        get_request("/api/v1/courses", Some("not-a-jwt")),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_only_routes_reject_teachers() {
    let token = token_for("teacher", Uuid::new_v4());

    let response = send(
        offline_app(),
        get_request("/api/v1/courses/stats", Some(&token)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("User role teacher is not authorized to access this route")
    );
}

#[tokio::test]
async fn test_my_courses_is_teacher_only() {
    let token = token_for("admin", Uuid::new_v4());
    let response = send(
        offline_app(),
        get_request("/api/v1/courses/my-courses", Some(&token)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_permission_gate_rejects_non_staff_roles() {
    let token = token_for("student", Uuid::new_v4());

    let response = send(offline_app(), get_request("/api/v1/visitors", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(offline_app(), get_request("/api/v1/students", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_quiz_writes_reject_students() {
    let token = token_for("student", Uuid::new_v4());
    let mut request = get_request(&format!("/api/v1/quizzes/{}", Uuid::new_v4()), Some(&token));
    *request.method_mut() = axum::http::Method::DELETE;

    let response = send(offline_app(), request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_course_counters_are_checked_before_lookup() {
    let token = token_for("admin", Uuid::new_v4());
    let request = json_request(
        "POST",
        "/api/v1/courses",
        Some(&token),
        json!({
            "courseId": "CS-101",
            "courseName": "Intro to Rust",
            "duration": "12 weeks",
            "noOfStudentsEnrolled": "10",
            "certifiedStudents": 12,
            "totalLectures": 24,
            "instructorEmail": "teacher@learnhub.dev",
            "description": "Ownership, borrowing and traits"
        }),
    );

    let response = send(offline_app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(
        body["message"],
        "Certified students cannot exceed enrolled students"
    );
}

#[tokio::test]
async fn test_course_lecture_count_is_capped() {
    let token = token_for("admin", Uuid::new_v4());
    let request = json_request(
        "POST",
        "/api/v1/courses",
        Some(&token),
        json!({
            "courseId": "CS-101",
            "courseName": "Intro to Rust",
            "duration": "12 weeks",
            "totalLectures": "9000000000000000000",
            "instructorEmail": "teacher@learnhub.dev",
            "description": "Ownership, borrowing and traits"
        }),
    );

    let response = send(offline_app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Total lectures cannot exceed 1000");
}

#[tokio::test]
async fn test_course_create_validation() {
    let token = token_for("admin", Uuid::new_v4());
    let request = json_request(
        "POST",
        "/api/v1/courses",
        Some(&token),
        json!({ "courseName": "Intro to Rust" }),
    );

    let response = send(offline_app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Please provide course ID"));
    assert!(message.contains("Instructor email is required"));
}

#[tokio::test]
async fn test_bulk_update_requires_visitor_ids() {
    let token = token_for("admin", Uuid::new_v4());
    let request = json_request(
        "PATCH",
        "/api/v1/visitors/bulk-update",
        Some(&token),
        json!({ "visitorIds": [], "status": "Contacted" }),
    );

    let response = send(offline_app(), request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Please provide valid visitor IDs");
}

#[tokio::test]
async fn test_unknown_route_returns_json_404() {
    let response = send(offline_app(), get_request("/api/v1/nowhere", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route does not exist");
}

#[tokio::test]
async fn test_security_headers_are_set() {
    let response = send(offline_app(), get_request("/api/v1/nowhere", None)).await;
    let headers = response.headers();

    assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
}

#[tokio::test]
async fn test_rate_limit_rejects_after_burst() {
    let mut config = test_config();
    config.rate_limit = RateLimitConfig {
        enabled: true,
        max_requests: 2,
        window_secs: 60,
    };
    let app = offline_app_with(config);

    let limited = |uri: &str| {
        let mut request = get_request(uri, None);
        request
            .headers_mut()
            .insert("x-forwarded-for", "203.0.113.7".parse().unwrap());
        request
    };

    for _ in 0..2 {
        let response = send(app.clone(), limited("/api/v1/auth/profile")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = send(app, limited("/api/v1/auth/profile")).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
}
