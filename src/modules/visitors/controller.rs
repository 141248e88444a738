use crate::middleware::auth::AuthUser;
use crate::middleware::permission::{RequireVisitorsAdd, RequireVisitorsEdit, RequireVisitorsReview};
use crate::middleware::role::check_any_role;
use crate::modules::auth::controller::{ErrorResponse, MessageResponse};
use crate::modules::visitors::model::{
    BulkUpdateResponse, BulkUpdateVisitorsDto, CreateVisitorDto, PaginatedVisitorsResponse,
    UpdateVisitorDto, VisitorFilterParams, VisitorResponse, VisitorStatsResponse,
};
use crate::modules::visitors::service::VisitorService;
use crate::state::AppState;
use crate::validator::{ValidatedJson, json_rejection};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use learnhub_core::AppError;
use learnhub_models::Role;
use tracing::instrument;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/v1/visitors",
    request_body = CreateVisitorDto,
    responses(
        (status = 201, description = "Visitor lead created", body = VisitorResponse),
        (status = 400, description = "Validation error or duplicate email", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Visitors"
)]
#[instrument(skip(state, _gate, dto))]
pub async fn create_visitor(
    State(state): State<AppState>,
    _gate: RequireVisitorsAdd,
    ValidatedJson(dto): ValidatedJson<CreateVisitorDto>,
) -> Result<(StatusCode, Json<VisitorResponse>), AppError> {
    let visitor = VisitorService::create_visitor(&state.db, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(VisitorResponse {
            success: true,
            message: Some("Visitor lead created successfully".to_string()),
            visitor,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/visitors",
    params(VisitorFilterParams),
    responses(
        (status = 200, description = "Paginated visitor leads", body = PaginatedVisitorsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Visitors"
)]
#[instrument(skip(state, _gate))]
pub async fn get_visitors(
    State(state): State<AppState>,
    _gate: RequireVisitorsReview,
    Query(filters): Query<VisitorFilterParams>,
) -> Result<Json<PaginatedVisitorsResponse>, AppError> {
    let response = VisitorService::get_visitors(&state.db, filters).await?;
    Ok(Json(response))
}

/// Lead funnel statistics
///
/// Status counts, leads from the last 30 days, a monthly breakdown of the
/// twelve most recent months and the conversion rate.
#[utoipa::path(
    get,
    path = "/api/v1/visitors/stats",
    responses(
        (status = 200, description = "Visitor statistics", body = VisitorStatsResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Visitors"
)]
#[instrument(skip(state, _gate))]
pub async fn get_visitor_stats(
    State(state): State<AppState>,
    _gate: RequireVisitorsReview,
) -> Result<Json<VisitorStatsResponse>, AppError> {
    let statistics = VisitorService::get_stats(&state.db).await?;
    Ok(Json(VisitorStatsResponse {
        success: true,
        statistics,
    }))
}

#[utoipa::path(
    patch,
    path = "/api/v1/visitors/bulk-update",
    request_body = BulkUpdateVisitorsDto,
    responses(
        (status = 200, description = "Statuses updated", body = BulkUpdateResponse),
        (status = 400, description = "Missing visitor IDs or status", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Visitors"
)]
#[instrument(skip(state, _gate, payload))]
pub async fn bulk_update_visitors(
    State(state): State<AppState>,
    _gate: RequireVisitorsEdit,
    payload: Result<Json<BulkUpdateVisitorsDto>, JsonRejection>,
) -> Result<Json<BulkUpdateResponse>, AppError> {
    let Json(dto) = payload.map_err(json_rejection)?;

    let modified_count = VisitorService::bulk_update(&state.db, dto).await?;
    Ok(Json(BulkUpdateResponse {
        success: true,
        message: format!("Updated {} visitor leads", modified_count),
        modified_count,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/visitors/{id}",
    params(
        ("id" = Uuid, Path, description = "Visitor ID")
    ),
    responses(
        (status = 200, description = "Visitor lead found", body = VisitorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Visitor not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Visitors"
)]
#[instrument(skip(state, _gate))]
pub async fn get_visitor(
    State(state): State<AppState>,
    _gate: RequireVisitorsReview,
    Path(id): Path<Uuid>,
) -> Result<Json<VisitorResponse>, AppError> {
    let visitor = VisitorService::get_visitor(&state.db, id).await?;
    Ok(Json(VisitorResponse {
        success: true,
        message: None,
        visitor,
    }))
}

#[utoipa::path(
    patch,
    path = "/api/v1/visitors/{id}",
    params(
        ("id" = Uuid, Path, description = "Visitor ID")
    ),
    request_body = UpdateVisitorDto,
    responses(
        (status = 200, description = "Visitor lead updated", body = VisitorResponse),
        (status = 400, description = "Validation error or email taken", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Visitor not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Visitors"
)]
#[instrument(skip(state, _gate, dto))]
pub async fn update_visitor(
    State(state): State<AppState>,
    _gate: RequireVisitorsEdit,
    Path(id): Path<Uuid>,
    ValidatedJson(dto): ValidatedJson<UpdateVisitorDto>,
) -> Result<Json<VisitorResponse>, AppError> {
    let visitor = VisitorService::update_visitor(&state.db, id, dto).await?;
    Ok(Json(VisitorResponse {
        success: true,
        message: Some("Visitor lead updated successfully".to_string()),
        visitor,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/visitors/{id}",
    params(
        ("id" = Uuid, Path, description = "Visitor ID")
    ),
    responses(
        (status = 200, description = "Visitor lead deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin only", body = ErrorResponse),
        (status = 404, description = "Visitor not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Visitors"
)]
#[instrument(skip(state))]
pub async fn delete_visitor(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    check_any_role(&auth_user, &[Role::Admin])?;

    VisitorService::delete_visitor(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Visitor lead deleted successfully")))
}
