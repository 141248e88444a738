use crate::middleware::auth::AuthUser;
use crate::middleware::permission::{RequireInstructorPaymentReview, check_authority};
use crate::middleware::role::{check_any_role, check_ownership_or_admin, is_owner};
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::teachers::model::{
    CreateTeacherDto, InstructorsListResponse, PaginatedTeachersResponse, TeacherFilterParams,
    TeacherResponse, TeacherStatsResponse, UpdateTeacherDto,
};
use crate::modules::teachers::service::TeacherService;
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

/// Create a teacher and its login account
#[utoipa::path(
    post,
    path = "/api/v1/teachers",
    request_body(content = CreateTeacherDto, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Teacher created", body = TeacherResponse),
        (status = 400, description = "Validation error or duplicate email, teacher ID or CNIC", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Teachers"
)]
#[instrument(skip(state, payload))]
pub async fn create_teacher(
    State(state): State<AppState>,
    auth_user: AuthUser,
    payload: FormPayload<CreateTeacherDto>,
) -> Result<(StatusCode, Json<TeacherResponse>), AppError> {
    check_any_role(&auth_user, &[Role::Admin])?;

    let teacher = TeacherService::create_teacher(
        &state.db,
        state.storage.as_ref(),
        payload.data,
        &payload.files,
        auth_user.subject_id()?,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(TeacherResponse {
            success: true,
            message: Some("Teacher created successfully".to_string()),
            teacher,
        }),
    ))
}

/// List teachers
#[utoipa::path(
    get,
    path = "/api/v1/teachers",
    params(TeacherFilterParams),
    responses(
        (status = 200, description = "Paginated teachers", body = PaginatedTeachersResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Teachers"
)]
#[instrument(skip(state, _gate))]
pub async fn get_teachers(
    State(state): State<AppState>,
    _gate: RequireInstructorPaymentReview,
    Query(filters): Query<TeacherFilterParams>,
) -> Result<Json<PaginatedTeachersResponse>, AppError> {
    let response = TeacherService::get_teachers(&state.db, filters).await?;
    Ok(Json(response))
}

/// Teacher statistics
#[utoipa::path(
    get,
    path = "/api/v1/teachers/stats",
    responses(
        (status = 200, description = "Status, course and qualification breakdown", body = TeacherStatsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Teachers"
)]
#[instrument(skip(state, _gate))]
pub async fn get_teacher_stats(
    State(state): State<AppState>,
    _gate: RequireInstructorPaymentReview,
) -> Result<Json<TeacherStatsResponse>, AppError> {
    let stats = TeacherService::get_stats(&state.db).await?;
    Ok(Json(TeacherStatsResponse {
        success: true,
        stats,
    }))
}

/// Active instructors for dropdowns
#[utoipa::path(
    get,
    path = "/api/v1/teachers/instructors-list",
    responses(
        (status = 200, description = "Active instructors", body = InstructorsListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Teachers"
)]
#[instrument(skip(state))]
pub async fn get_instructors_list(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<InstructorsListResponse>, AppError> {
    check_any_role(&auth_user, &[Role::Admin])?;

    let instructors = TeacherService::get_instructors(&state.db).await?;
    Ok(Json(InstructorsListResponse {
        success: true,
        count: instructors.len(),
        instructors,
    }))
}

/// Get a teacher by ID
#[utoipa::path(
    get,
    path = "/api/v1/teachers/{id}",
    params(
        ("id" = Uuid, Path, description = "Teacher ID")
    ),
    responses(
        (status = 200, description = "Teacher found", body = TeacherResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Teacher not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Teachers"
)]
#[instrument(skip(state))]
pub async fn get_teacher(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TeacherResponse>, AppError> {
    if !is_owner(&auth_user, id) {
        check_authority(&state.db, &auth_user, Module::InstructorPayment, Action::Review).await?;
    }

    let teacher = TeacherService::get_teacher(&state.db, id).await?;
    Ok(Json(TeacherResponse {
        success: true,
        message: None,
        teacher,
    }))
}

/// Update a teacher
///
/// Admins may change every field. A teacher editing their own profile may
/// only change `phone`, `address` and `emergencyContact`; anything else in
/// the payload is ignored.
#[utoipa::path(
    patch,
    path = "/api/v1/teachers/{id}",
    params(
        ("id" = Uuid, Path, description = "Teacher ID")
    ),
    request_body(content = UpdateTeacherDto, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Teacher updated", body = TeacherResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Teacher not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Teachers"
)]
#[instrument(skip(state, payload))]
pub async fn update_teacher(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    payload: FormPayload<UpdateTeacherDto>,
) -> Result<Json<TeacherResponse>, AppError> {
    check_ownership_or_admin(&auth_user, id)?;

    let FormPayload { data, files } = payload;
    let (dto, files) = if auth_user.is_admin() {
        (data, files)
    } else {
        (data.self_service(), Vec::new())
    };

    let teacher =
        TeacherService::update_teacher(&state.db, state.storage.as_ref(), id, dto, &files).await?;

    Ok(Json(TeacherResponse {
        success: true,
        message: Some("Teacher updated successfully".to_string()),
        teacher,
    }))
}

/// Delete a teacher and its login account
#[utoipa::path(
    delete,
    path = "/api/v1/teachers/{id}",
    params(
        ("id" = Uuid, Path, description = "Teacher ID")
    ),
    responses(
        (status = 200, description = "Teacher deleted", body = TeacherResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Teacher not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Teachers"
)]
#[instrument(skip(state))]
pub async fn delete_teacher(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TeacherResponse>, AppError> {
    check_any_role(&auth_user, &[Role::Admin])?;

    let teacher = TeacherService::delete_teacher(&state.db, id).await?;
    Ok(Json(TeacherResponse {
        success: true,
        message: Some("Teacher deleted successfully".to_string()),
        teacher,
    }))
}
