use anyhow::{Context, anyhow};
use learnhub_core::{AppError, FileStorage};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    CreateQuizDto, PaginatedQuizzesResponse, QUIZ_UPLOADS, Quiz, QuizFilterParams, UpdateQuizDto,
};
use crate::metrics::{track_record_created, track_record_deleted};
use crate::utils::form::{UploadedFile, discard_uploads, store_uploads};

const QUIZ_COLUMNS: &str = "id, title, description, valid_till, total_marks, allow_multiple, \
     file, questions, created_by, created_at, updated_at";

const SORTABLE: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("validTill", "valid_till"),
    ("title", "title"),
    ("totalMarks", "total_marks"),
];

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(anyhow!("No quiz found with id: {}", id))
}

pub struct QuizService;

impl QuizService {
    #[instrument(skip(db, storage, dto, files))]
    pub async fn create_quiz(
        db: &PgPool,
        storage: &dyn FileStorage,
        dto: CreateQuizDto,
        files: &[UploadedFile],
        created_by: Uuid,
    ) -> Result<Quiz, AppError> {
        let stored = store_uploads(storage, &QUIZ_UPLOADS, files).await?;
        let file = stored.first().map(|f| f.url.clone());

        let result = sqlx::query_as::<_, Quiz>(&format!(
            "INSERT INTO quizzes (title, description, valid_till, total_marks, allow_multiple,
                 file, questions, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {QUIZ_COLUMNS}"
        ))
        .bind(dto.title.as_deref().map(str::trim))
        .bind(&dto.description)
        .bind(dto.valid_till)
        .bind(dto.total_marks)
        .bind(dto.allow_multiple.unwrap_or(false))
        .bind(&file)
        .bind(Json(&dto.questions))
        .bind(created_by)
        .fetch_one(db)
        .await
        .context("Failed to create quiz")
        .map_err(AppError::database);

        match result {
            Ok(quiz) => {
                tracing::info!(quiz_id = %quiz.id, questions = quiz.questions.len(), "Quiz created");
                track_record_created("quiz");
                Ok(quiz)
            }
            Err(e) => {
                discard_uploads(storage, &stored).await;
                Err(e)
            }
        }
    }

    #[instrument(skip(db))]
    pub async fn get_quizzes(
        db: &PgPool,
        filters: QuizFilterParams,
    ) -> Result<PaginatedQuizzesResponse, AppError> {
        let pagination = &filters.pagination;
        let mut where_clause = String::new();
        let search = pagination.search_pattern();
        if search.is_some() {
            where_clause.push_str(" WHERE title ILIKE $1 OR description ILIKE $1");
        }

        let count_query = format!("SELECT COUNT(*) FROM quizzes{}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(pattern) = &search {
            count_sql = count_sql.bind(pattern);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT {QUIZ_COLUMNS} FROM quizzes{} {} LIMIT {} OFFSET {}",
            where_clause,
            pagination.order_by(SORTABLE),
            pagination.limit(),
            pagination.offset()
        );
        let mut data_sql = sqlx::query_as::<_, Quiz>(&data_query);
        if let Some(pattern) = search {
            data_sql = data_sql.bind(pattern);
        }
        let quizzes = data_sql.fetch_all(db).await?;

        Ok(PaginatedQuizzesResponse {
            success: true,
            meta: pagination.meta(quizzes.len(), total),
            quizzes,
        })
    }

    #[instrument(skip(db))]
    pub async fn get_quiz(db: &PgPool, id: Uuid) -> Result<Quiz, AppError> {
        sqlx::query_as::<_, Quiz>(&format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch quiz")
            .map_err(AppError::database)?
            .ok_or_else(|| not_found(id))
    }

    #[instrument(skip(db, storage, dto, files))]
    pub async fn update_quiz(
        db: &PgPool,
        storage: &dyn FileStorage,
        id: Uuid,
        dto: UpdateQuizDto,
        files: &[UploadedFile],
    ) -> Result<Quiz, AppError> {
        let existing = Self::get_quiz(db, id).await?;
        let mut merged = dto.merge_into(existing);

        let stored = store_uploads(storage, &QUIZ_UPLOADS, files).await?;
        if let Some(upload) = stored.first() {
            merged.file = Some(upload.url.clone());
        }

        let result = sqlx::query_as::<_, Quiz>(&format!(
            "UPDATE quizzes
             SET title = $1, description = $2, valid_till = $3, total_marks = $4,
                 allow_multiple = $5, file = $6, questions = $7
             WHERE id = $8
             RETURNING {QUIZ_COLUMNS}"
        ))
        .bind(&merged.title)
        .bind(&merged.description)
        .bind(merged.valid_till)
        .bind(merged.total_marks)
        .bind(merged.allow_multiple)
        .bind(&merged.file)
        .bind(&merged.questions)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to update quiz")
        .map_err(AppError::database)
        .and_then(|quiz| quiz.ok_or_else(|| not_found(id)));

        if result.is_err() {
            discard_uploads(storage, &stored).await;
        }
        result
    }

    #[instrument(skip(db))]
    pub async fn delete_quiz(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let deleted = sqlx::query_scalar::<_, Uuid>("DELETE FROM quizzes WHERE id = $1 RETURNING id")
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to delete quiz")
            .map_err(AppError::database)?;

        deleted.ok_or_else(|| not_found(id))?;
        track_record_deleted("quiz");
        Ok(())
    }
}
