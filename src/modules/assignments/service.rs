use anyhow::{Context, anyhow};
use learnhub_core::{AppError, FileStorage};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    ASSIGNMENT_UPLOADS, Assignment, AssignmentFilterParams, CreateAssignmentDto,
    PaginatedAssignmentsResponse, UpdateAssignmentDto,
};
use crate::metrics::{track_record_created, track_record_deleted};
use crate::utils::form::{UploadedFile, discard_uploads, store_uploads};

const ASSIGNMENT_COLUMNS: &str =
    "id, title, description, due_date, file, questions, created_by, created_at, updated_at";

const SORTABLE: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("dueDate", "due_date"),
    ("title", "title"),
];

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(anyhow!("No assignment found with id: {}", id))
}

pub struct AssignmentService;

impl AssignmentService {
    #[instrument(skip(db, storage, dto, files))]
    pub async fn create_assignment(
        db: &PgPool,
        storage: &dyn FileStorage,
        dto: CreateAssignmentDto,
        files: &[UploadedFile],
        created_by: Uuid,
    ) -> Result<Assignment, AppError> {
        let stored = store_uploads(storage, &ASSIGNMENT_UPLOADS, files).await?;
        let file = stored.first().map(|f| f.url.clone());

        let result = sqlx::query_as::<_, Assignment>(&format!(
            "INSERT INTO assignments (title, description, due_date, file, questions, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {ASSIGNMENT_COLUMNS}"
        ))
        .bind(dto.title.as_deref().map(str::trim))
        .bind(&dto.description)
        .bind(dto.due_date)
        .bind(&file)
        .bind(Json(&dto.questions))
        .bind(created_by)
        .fetch_one(db)
        .await
        .context("Failed to create assignment")
        .map_err(AppError::database);

        match result {
            Ok(assignment) => {
                tracing::info!(assignment_id = %assignment.id, "Assignment created");
                track_record_created("assignment");
                Ok(assignment)
            }
            Err(e) => {
                discard_uploads(storage, &stored).await;
                Err(e)
            }
        }
    }

    #[instrument(skip(db))]
    pub async fn get_assignments(
        db: &PgPool,
        filters: AssignmentFilterParams,
    ) -> Result<PaginatedAssignmentsResponse, AppError> {
        let pagination = &filters.pagination;
        let search = pagination.search_pattern();
        let where_clause = if search.is_some() {
            " WHERE title ILIKE $1 OR description ILIKE $1"
        } else {
            ""
        };

        let count_query = format!("SELECT COUNT(*) FROM assignments{}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(pattern) = &search {
            count_sql = count_sql.bind(pattern);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments{} {} LIMIT {} OFFSET {}",
            where_clause,
            pagination.order_by(SORTABLE),
            pagination.limit(),
            pagination.offset()
        );
        let mut data_sql = sqlx::query_as::<_, Assignment>(&data_query);
        if let Some(pattern) = search {
            data_sql = data_sql.bind(pattern);
        }
        let assignments = data_sql.fetch_all(db).await?;

        Ok(PaginatedAssignmentsResponse {
            success: true,
            meta: pagination.meta(assignments.len(), total),
            assignments,
        })
    }

    #[instrument(skip(db))]
    pub async fn get_assignment(db: &PgPool, id: Uuid) -> Result<Assignment, AppError> {
        sqlx::query_as::<_, Assignment>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch assignment")
        .map_err(AppError::database)?
        .ok_or_else(|| not_found(id))
    }

    /// A new `file` upload replaces the stored one; `questions`, when sent,
    /// replaces the whole list.
    #[instrument(skip(db, storage, dto, files))]
    pub async fn update_assignment(
        db: &PgPool,
        storage: &dyn FileStorage,
        id: Uuid,
        dto: UpdateAssignmentDto,
        files: &[UploadedFile],
    ) -> Result<Assignment, AppError> {
        let existing = Self::get_assignment(db, id).await?;
        let mut merged = dto.merge_into(existing);

        let stored = store_uploads(storage, &ASSIGNMENT_UPLOADS, files).await?;
        if let Some(upload) = stored.first() {
            merged.file = Some(upload.url.clone());
        }

        let result = sqlx::query_as::<_, Assignment>(&format!(
            "UPDATE assignments
             SET title = $1, description = $2, due_date = $3, file = $4, questions = $5
             WHERE id = $6
             RETURNING {ASSIGNMENT_COLUMNS}"
        ))
        .bind(&merged.title)
        .bind(&merged.description)
        .bind(merged.due_date)
        .bind(&merged.file)
        .bind(&merged.questions)
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to update assignment")
        .map_err(AppError::database)
        .and_then(|assignment| assignment.ok_or_else(|| not_found(id)));

        if result.is_err() {
            discard_uploads(storage, &stored).await;
        }
        result
    }

    #[instrument(skip(db))]
    pub async fn delete_assignment(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM assignments WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete assignment")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        track_record_deleted("assignment");
        Ok(())
    }
}
