use crate::middleware::auth::AuthUser;
use crate::middleware::role::check_any_role;
use crate::modules::auth::controller::{ErrorResponse, MessageResponse};
use crate::modules::quizzes::model::{
    CreateQuizDto, PaginatedQuizzesResponse, QuizFilterParams, QuizResponse, UpdateQuizDto,
};
use crate::modules::quizzes::service::QuizService;
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

/// Create a quiz
///
/// `questions` is a JSON list; every entry needs `type`, `question` and
/// `answer`. MCQ entries list their `choices`.
#[utoipa::path(
    post,
    path = "/api/v1/quizzes",
    request_body(content = CreateQuizDto, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Quiz created", body = QuizResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin or teacher only", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Quizzes"
)]
#[instrument(skip(state, payload))]
pub async fn create_quiz(
    State(state): State<AppState>,
    auth_user: AuthUser,
    payload: FormPayload<CreateQuizDto>,
) -> Result<(StatusCode, Json<QuizResponse>), AppError> {
    check_any_role(&auth_user, &[Role::Admin, Role::Teacher])?;

    let quiz = QuizService::create_quiz(
        &state.db,
        state.storage.as_ref(),
        payload.data,
        &payload.files,
        auth_user.subject_id()?,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(QuizResponse {
            success: true,
            message: Some("Quiz created successfully".to_string()),
            quiz,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes",
    params(QuizFilterParams),
    responses(
        (status = 200, description = "Paginated quizzes", body = PaginatedQuizzesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Quizzes"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_quizzes(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Query(filters): Query<QuizFilterParams>,
) -> Result<Json<PaginatedQuizzesResponse>, AppError> {
    let response = QuizService::get_quizzes(&state.db, filters).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/v1/quizzes/{id}",
    params(
        ("id" = Uuid, Path, description = "Quiz ID")
    ),
    responses(
        (status = 200, description = "Quiz found", body = QuizResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Quizzes"
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_quiz(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<QuizResponse>, AppError> {
    let quiz = QuizService::get_quiz(&state.db, id).await?;
    Ok(Json(QuizResponse {
        success: true,
        message: None,
        quiz,
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/quizzes/{id}",
    params(
        ("id" = Uuid, Path, description = "Quiz ID")
    ),
    request_body(content = UpdateQuizDto, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Quiz updated", body = QuizResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin or teacher only", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Quizzes"
)]
#[instrument(skip(state, payload))]
pub async fn update_quiz(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
    payload: FormPayload<UpdateQuizDto>,
) -> Result<Json<QuizResponse>, AppError> {
    check_any_role(&auth_user, &[Role::Admin, Role::Teacher])?;

    let quiz =
        QuizService::update_quiz(&state.db, state.storage.as_ref(), id, payload.data, &payload.files)
            .await?;

    Ok(Json(QuizResponse {
        success: true,
        message: Some("Quiz updated successfully".to_string()),
        quiz,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/quizzes/{id}",
    params(
        ("id" = Uuid, Path, description = "Quiz ID")
    ),
    responses(
        (status = 200, description = "Quiz deleted", body = MessageResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden - admin or teacher only", body = ErrorResponse),
        (status = 404, description = "Quiz not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Quizzes"
)]
#[instrument(skip(state))]
pub async fn delete_quiz(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    check_any_role(&auth_user, &[Role::Admin, Role::Teacher])?;

    QuizService::delete_quiz(&state.db, id).await?;
    Ok(Json(MessageResponse::new("Quiz deleted successfully")))
}
