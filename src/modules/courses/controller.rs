use crate::middleware::auth::AuthUser;
use crate::middleware::permission::{RequireCoursesAdd, RequireCoursesEdit, check_authority};
use crate::middleware::role::check_any_role;
use crate::modules::auth::controller::{ErrorResponse, MessageResponse};
use crate::modules::courses::model::{
    AttendanceSheet, CourseFilterParams, CourseResponse, CourseStatsResponse, CreateCourseDto,
    MyCoursesResponse, MyCoursesSummary, PaginatedCoursesResponse, UpdateCourseDto,
};
use crate::modules::courses::service::CourseService;
use crate::state::AppState;
use crate::utils::form::FormPayload;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use learnhub_core::AppError;
use learnhub_models::{Action, Module, Role};
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

/// Teachers only ever see their own courses. Everyone else needs
/// `courses.review`.
async fn read_scope(db: &PgPool, auth_user: &AuthUser) -> Result<Option<Uuid>, AppError> {
    if auth_user.role()? == Role::Teacher {
        return Ok(Some(auth_user.subject_id()?));
    }
    check_authority(db, auth_user, Module::Courses, Action::Review).await?;
    Ok(None)
}

/// Create a course and assign it to an active instructor
#[utoipa::path(
    post,
    path = "/api/v1/courses",
    request_body(content = CreateCourseDto, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Course created", body = CourseResponse),
        (status = 400, description = "Validation error, counter violation, duplicate course ID or inactive instructor", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Instructor not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Courses"
)]
#[instrument(skip(state, gate, payload))]
pub async fn create_course(
    State(state): State<AppState>,
    gate: RequireCoursesAdd,
    payload: FormPayload<CreateCourseDto>,
) -> Result<(StatusCode, Json<CourseResponse>), AppError> {
    let RequireCoursesAdd(auth_user, _) = gate;

    let course = CourseService::create_course(
        &state.db,
        state.storage.as_ref(),
        payload.data,
        &payload.files,
        auth_user.subject_id()?,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CourseResponse {
            success: true,
            message: Some("Course created successfully and assigned to instructor".to_string()),
            course,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses",
    params(CourseFilterParams),
    responses(
        (status = 200, description = "Paginated courses; teachers only see their own", body = PaginatedCoursesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_courses(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<CourseFilterParams>,
) -> Result<Json<PaginatedCoursesResponse>, AppError> {
    let scope = read_scope(&state.db, &auth_user).await?;
    let response = CourseService::get_courses(&state.db, filters, scope).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/stats",
    responses(
        (status = 200, description = "Course statistics", body = CourseStatsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_course_stats(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<CourseStatsResponse>, AppError> {
    check_any_role(&auth_user, &[Role::Admin])?;

    let statistics = CourseService::get_stats(&state.db).await?;
    Ok(Json(CourseStatsResponse {
        success: true,
        statistics,
    }))
}

/// Courses taught by the calling teacher, with totals
#[utoipa::path(
    get,
    path = "/api/v1/courses/my-courses",
    responses(
        (status = 200, description = "The teacher's courses", body = MyCoursesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - teachers only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_my_courses(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<MyCoursesResponse>, AppError> {
    check_any_role(&auth_user, &[Role::Teacher])?;

    let courses = CourseService::get_my_courses(&state.db, auth_user.subject_id()?).await?;
    Ok(Json(MyCoursesResponse {
        success: true,
        message: "Your assigned courses".to_string(),
        count: courses.len(),
        statistics: MyCoursesSummary::from_courses(&courses),
        courses,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course found", body = CourseResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseResponse>, AppError> {
    let scope = read_scope(&state.db, &auth_user).await?;
    let course = CourseService::get_course(&state.db, id, scope).await?;
    Ok(Json(CourseResponse {
        success: true,
        message: None,
        course,
    }))
}

/// Update a course
///
/// Counter fields are merged over the stored values and re-checked as a
/// whole. Supplying `instructorEmail` reassigns the course.
#[utoipa::path(
    patch,
    path = "/api/v1/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    request_body(content = UpdateCourseDto, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Course updated", body = CourseResponse),
        (status = 400, description = "Validation error or counter violation", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Course or instructor not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Courses"
)]
#[instrument(skip(state, _gate, payload))]
pub async fn update_course(
    State(state): State<AppState>,
    _gate: RequireCoursesEdit,
    Path(id): Path<Uuid>,
    payload: FormPayload<UpdateCourseDto>,
) -> Result<Json<CourseResponse>, AppError> {
    let course = CourseService::update_course(
        &state.db,
        state.storage.as_ref(),
        id,
        payload.data,
        &payload.files,
    )
    .await?;

    Ok(Json(CourseResponse {
        success: true,
        message: Some("Course updated successfully".to_string()),
        course,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/courses/{id}",
    params(
        ("id" = Uuid, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn delete_course(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    check_any_role(&auth_user, &[Role::Admin])?;

    CourseService::delete_course(&state.db, id).await?;
    Ok(Json(MessageResponse::new(
        "Course deleted successfully",
    )))
}

/// Attendance sheet for a course
///
/// The path segment is the course's public code (e.g. `WEB-101`), not its
/// row id.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{id}/students-attendance",
    params(
        ("id" = String, Path, description = "Public course code")
    ),
    responses(
        (status = 200, description = "Lectures and per-student attendance", body = AttendanceSheet),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Course not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Courses"
)]
#[instrument(skip(state))]
pub async fn get_students_attendance(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(course_code): Path<String>,
) -> Result<Json<AttendanceSheet>, AppError> {
    let scope = read_scope(&state.db, &auth_user).await?;
    let sheet = CourseService::get_attendance(&state.db, &course_code, scope).await?;
    Ok(Json(sheet))
}
