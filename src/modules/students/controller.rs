use crate::middleware::auth::AuthUser;
use crate::middleware::permission::{
    RequireStudentsAdd, RequireStudentsEdit, RequireStudentsReview, check_authority,
};
use crate::middleware::role::{check_any_role, is_owner};
use crate::modules::auth::controller::{ErrorResponse, MessageResponse};
use crate::modules::students::model::{
    CreateStudentDto, PaginatedStudentsResponse, StudentFilterParams, StudentResponse,
    StudentsByCourseResponse, UpdateStudentDto,
};
use crate::modules::students::service::StudentService;
use crate::state::AppState;
use crate::utils::form::FormPayload;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use learnhub_core::AppError;
use learnhub_models::{Action, Module, Role};
use tracing::instrument;
use uuid::Uuid;

/// Enroll a student
///
/// Accepts multipart form data. `courses` may be a JSON list of enrollments
/// or a single enrollment object.
#[utoipa::path(
    post,
    path = "/api/v1/students",
    request_body(content = CreateStudentDto, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Student created", body = StudentResponse),
        (status = 400, description = "Validation error, duplicate email/student ID or unknown course", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state, _gate, payload))]
pub async fn create_student(
    State(state): State<AppState>,
    _gate: RequireStudentsAdd,
    payload: FormPayload<CreateStudentDto>,
) -> Result<(StatusCode, Json<StudentResponse>), AppError> {
    let student = StudentService::create_student(
        &state.db,
        state.storage.as_ref(),
        payload.data,
        &payload.files,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(StudentResponse {
            success: true,
            message: Some("Student created successfully".to_string()),
            student,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/students",
    params(StudentFilterParams),
    responses(
        (status = 200, description = "Paginated students", body = PaginatedStudentsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state, _gate))]
pub async fn get_students(
    State(state): State<AppState>,
    _gate: RequireStudentsReview,
    Query(filters): Query<StudentFilterParams>,
) -> Result<Json<PaginatedStudentsResponse>, AppError> {
    let response = StudentService::get_students(&state.db, filters).await?;
    Ok(Json(response))
}

/// Students enrolled in a course, looked up by public course code
#[utoipa::path(
    get,
    path = "/api/v1/students/course/{course_id}",
    params(
        ("course_id" = String, Path, description = "Public course code")
    ),
    responses(
        (status = 200, description = "Enrolled students", body = StudentsByCourseResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state, _gate))]
pub async fn get_students_by_course(
    State(state): State<AppState>,
    _gate: RequireStudentsReview,
    Path(course_id): Path<String>,
) -> Result<Json<StudentsByCourseResponse>, AppError> {
    let students = StudentService::get_students_by_course(&state.db, &course_id).await?;
    Ok(Json(StudentsByCourseResponse {
        success: true,
        count: students.len(),
        students,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/students/{id}",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student found", body = StudentResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn get_student(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StudentResponse>, AppError> {
    if !is_owner(&auth_user, id) {
        check_authority(&state.db, &auth_user, Module::Students, Action::Review).await?;
    }

    let student = StudentService::get_student(&state.db, id).await?;
    Ok(Json(StudentResponse {
        success: true,
        message: None,
        student,
    }))
}

/// Update a student
///
/// Served on both PUT and PATCH; either way the payload is a partial
/// update. Enrollment entries are merged by `selectedCourse`.
#[utoipa::path(
    patch,
    path = "/api/v1/students/{id}",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    request_body(content = UpdateStudentDto, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Student updated", body = StudentResponse),
        (status = 400, description = "Validation error or unknown course", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state, _gate, payload))]
pub async fn update_student(
    State(state): State<AppState>,
    _gate: RequireStudentsEdit,
    Path(id): Path<Uuid>,
    payload: FormPayload<UpdateStudentDto>,
) -> Result<Json<StudentResponse>, AppError> {
    let student = StudentService::update_student(
        &state.db,
        state.storage.as_ref(),
        id,
        payload.data,
        &payload.files,
    )
    .await?;

    Ok(Json(StudentResponse {
        success: true,
        message: Some("Student updated successfully".to_string()),
        student,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/students/{id}",
    params(
        ("id" = Uuid, Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Students"
)]
#[instrument(skip(state))]
pub async fn delete_student(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    check_any_role(&auth_user, &[Role::Admin])?;

    StudentService::delete_student(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Student deleted successfully")))
}
