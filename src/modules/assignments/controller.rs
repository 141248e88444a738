use crate::middleware::auth::AuthUser;
use crate::middleware::role::check_any_role;
use crate::modules::auth::controller::{ErrorResponse, MessageResponse};
use crate::modules::assignments::model::{
    AssignmentFilterParams, AssignmentResponse, CreateAssignmentDto, PaginatedAssignmentsResponse,
    UpdateAssignmentDto,
};
use crate::modules::assignments::service::AssignmentService;
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

const AUTHORS: &[Role] = &[Role::Admin, Role::Teacher];

#[utoipa::path(
    post,
    path = "/api/v1/assignments",
    request_body(content = CreateAssignmentDto, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Assignment created", body = AssignmentResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin or teacher only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Assignments"
)]
#[instrument(skip(state, payload))]
pub async fn create_assignment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    payload: FormPayload<CreateAssignmentDto>,
) -> Result<(StatusCode, Json<AssignmentResponse>), AppError> {
    check_any_role(&auth_user, AUTHORS)?;

    let assignment = AssignmentService::create_assignment(
        &state.db,
        state.storage.as_ref(),
        payload.data,
        &payload.files,
        auth_user.subject_id()?,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(AssignmentResponse {
            success: true,
            message: Some("Assignment created successfully".to_string()),
            assignment,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/assignments",
    params(AssignmentFilterParams),
    responses(
        (status = 200, description = "Paginated assignments", body = PaginatedAssignmentsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Assignments"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_assignments(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<AssignmentFilterParams>,
) -> Result<Json<PaginatedAssignmentsResponse>, AppError> {
    let response = AssignmentService::get_assignments(&state.db, filters).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/assignments/{id}",
    params(
        ("id" = Uuid, Path, description = "Assignment ID")
    ),
    responses(
        (status = 200, description = "Assignment found", body = AssignmentResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Assignments"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_assignment(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AssignmentResponse>, AppError> {
    let assignment = AssignmentService::get_assignment(&state.db, id).await?;
    Ok(Json(AssignmentResponse {
        success: true,
        message: None,
        assignment,
    }))
}

/// Update an assignment (PUT and PATCH)
#[utoipa::path(
    patch,
    path = "/api/v1/assignments/{id}",
    params(
        ("id" = Uuid, Path, description = "Assignment ID")
    ),
    request_body(content = UpdateAssignmentDto, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Assignment updated", body = AssignmentResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin or teacher only", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Assignments"
)]
#[instrument(skip(state, payload))]
pub async fn update_assignment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    payload: FormPayload<UpdateAssignmentDto>,
) -> Result<Json<AssignmentResponse>, AppError> {
    check_any_role(&auth_user, AUTHORS)?;

    let assignment = AssignmentService::update_assignment(
        &state.db,
        state.storage.as_ref(),
        id,
        payload.data,
        &payload.files,
    )
    .await?;

    Ok(Json(AssignmentResponse {
        success: true,
        message: Some("Assignment updated successfully".to_string()),
        assignment,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/assignments/{id}",
    params(
        ("id" = Uuid, Path, description = "Assignment ID")
    ),
    responses(
        (status = 200, description = "Assignment deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin or teacher only", body = ErrorResponse),
        (status = 404, description = "Assignment not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Assignments"
)]
#[instrument(skip(state))]
pub async fn delete_assignment(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    check_any_role(&auth_user, AUTHORS)?;

    AssignmentService::delete_assignment(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Assignment deleted successfully")))
}
