use crate::middleware::auth::AuthUser;
use crate::middleware::role::{check_any_role, check_ownership_or_admin};
use crate::modules::auth::controller::ErrorResponse;
use crate::modules::staff::model::{
    CreateStaffDto, PaginatedStaffResponse, StaffFilterParams, StaffResponse, StaffStatsResponse,
    UpdateStaffDto,
};
use crate::modules::staff::service::StaffService;
use crate::state::AppState;
use crate::utils::form::FormPayload;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use learnhub_core::AppError;
use learnhub_models::Role;
use tracing::instrument;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/v1/staff",
    request_body(content = CreateStaffDto, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Staff member created", body = StaffResponse),
        (status = 400, description = "Validation error or duplicate email/CNIC", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Staff"
)]
#[instrument(skip(state, payload))]
pub async fn create_staff(
    State(state): State<AppState>,
    auth_user: AuthUser,
    payload: FormPayload<CreateStaffDto>,
) -> Result<(StatusCode, Json<StaffResponse>), AppError> {
    check_any_role(&auth_user, &[Role::Admin])?;

    let staff = StaffService::create_staff(
        &state.db,
        state.storage.as_ref(),
        payload.data,
        &payload.files,
        auth_user.subject_id()?,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(StaffResponse {
            success: true,
            message: Some("Staff member created successfully".to_string()),
            staff,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/staff",
    params(StaffFilterParams),
    responses(
        (status = 200, description = "Paginated staff members", body = PaginatedStaffResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Staff"
)]
#[instrument(skip(state))]
pub async fn get_staff_list(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(filters): Query<StaffFilterParams>,
) -> Result<Json<PaginatedStaffResponse>, AppError> {
    check_any_role(&auth_user, &[Role::Admin])?;

    let response = StaffService::get_staff_list(&state.db, filters).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/staff/stats",
    responses(
        (status = 200, description = "Status, designation and education breakdown", body = StaffStatsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Staff"
)]
#[instrument(skip(state))]
pub async fn get_staff_stats(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<StaffStatsResponse>, AppError> {
    check_any_role(&auth_user, &[Role::Admin])?;

    let stats = StaffService::get_stats(&state.db).await?;
    Ok(Json(StaffStatsResponse {
        success: true,
        stats,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/staff/{id}",
    params(
        ("id" = Uuid, Path, description = "Staff member ID")
    ),
    responses(
        (status = 200, description = "Staff member found", body = StaffResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Staff member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Staff"
)]
#[instrument(skip(state))]
pub async fn get_staff(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StaffResponse>, AppError> {
    check_ownership_or_admin(&auth_user, id)?;

    let staff = StaffService::get_staff(&state.db, id).await?;
    Ok(Json(StaffResponse {
        success: true,
        message: None,
        staff,
    }))
}

/// Update a staff member
///
/// Staff editing their own record are limited to `phone`, `address` and
/// `emergencyContact`.
#[utoipa::path(
    patch,
    path = "/api/v1/staff/{id}",
    params(
        ("id" = Uuid, Path, description = "Staff member ID")
    ),
    request_body(content = UpdateStaffDto, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Staff member updated", body = StaffResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Staff member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Staff"
)]
#[instrument(skip(state, payload))]
pub async fn update_staff(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    payload: FormPayload<UpdateStaffDto>,
) -> Result<Json<StaffResponse>, AppError> {
    check_ownership_or_admin(&auth_user, id)?;

    let FormPayload { data, files } = payload;
    let (dto, files) = if auth_user.is_admin() {
        (data, files)
    } else {
        (data.self_service(), Vec::new())
    };

    let staff = StaffService::update_staff(&state.db, state.storage.as_ref(), id, dto, &files).await?;

    Ok(Json(StaffResponse {
        success: true,
        message: Some("Staff member updated successfully".to_string()),
        staff,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/staff/{id}",
    params(
        ("id" = Uuid, Path, description = "Staff member ID")
    ),
    responses(
        (status = 200, description = "Staff member deleted", body = StaffResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Staff member not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Staff"
)]
#[instrument(skip(state))]
pub async fn delete_staff(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<StaffResponse>, AppError> {
    check_any_role(&auth_user, &[Role::Admin])?;

    let staff = StaffService::delete_staff(&state.db, id).await?;
    Ok(Json(StaffResponse {
        success: true,
        message: Some("Staff member deleted successfully".to_string()),
        staff,
    }))
}
