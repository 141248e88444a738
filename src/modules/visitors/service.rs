use anyhow::{Context, anyhow};
use learnhub_core::AppError;
use learnhub_models::courses::percentage;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    BulkUpdateVisitorsDto, CreateVisitorDto, LeadStatus, MonthlyCount, PaginatedVisitorsResponse,
    UpdateVisitorDto, Visitor, VisitorFilterParams, VisitorStats,
};
use crate::metrics::{track_record_created, track_record_deleted};

const VISITOR_COLUMNS: &str = "id, user_name, email, status, created_at, updated_at";

const SORTABLE: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("userName", "user_name"),
    ("status", "status"),
];

fn duplicate_email(e: sqlx::Error, message: &'static str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        return AppError::bad_request(anyhow!(message));
    }
    AppError::database(e)
}

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(anyhow!("No visitor found with id: {}", id))
}

/// Checks the bulk payload before touching the database.
fn bulk_target(dto: &BulkUpdateVisitorsDto) -> Result<LeadStatus, AppError> {
    if dto.visitor_ids.is_empty() {
        return Err(AppError::bad_request(anyhow!("Please provide valid visitor IDs")));
    }
    dto.status
        .ok_or_else(|| AppError::bad_request(anyhow!("Please provide status")))
}

pub struct VisitorService;

impl VisitorService {
    #[instrument(skip(db, dto))]
    pub async fn create_visitor(db: &PgPool, dto: CreateVisitorDto) -> Result<Visitor, AppError> {
        let email = dto.email.unwrap_or_default().trim().to_lowercase();

        let visitor = sqlx::query_as::<_, Visitor>(&format!(
            "INSERT INTO visitors (user_name, email, status)
             VALUES ($1, $2, $3)
             RETURNING {VISITOR_COLUMNS}"
        ))
        .bind(dto.user_name.as_deref().map(str::trim))
        .bind(&email)
        .bind(dto.status.unwrap_or_default().as_str())
        .fetch_one(db)
        .await
        .map_err(|e| duplicate_email(e, "Visitor with this email already exists"))?;

        tracing::info!(visitor_id = %visitor.id, "Visitor lead created");
        track_record_created("visitor");
        Ok(visitor)
    }

    #[instrument(skip(db))]
    pub async fn get_visitors(
        db: &PgPool,
        filters: VisitorFilterParams,
    ) -> Result<PaginatedVisitorsResponse, AppError> {
        let pagination = &filters.pagination;
        let mut where_clause = String::from(" WHERE 1 = 1");
        let mut params: Vec<String> = Vec::new();

        if let Some(status) = filters.status.as_deref().filter(|s| !s.is_empty()) {
            params.push(status.to_string());
            where_clause.push_str(&format!(" AND status = ${}", params.len()));
        }

        if let Some(pattern) = pagination.search_pattern() {
            params.push(pattern);
            let n = params.len();
            where_clause.push_str(&format!(" AND (user_name ILIKE ${n} OR email ILIKE ${n})"));
        }

        let count_query = format!("SELECT COUNT(*) FROM visitors{}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT {VISITOR_COLUMNS} FROM visitors{} {} LIMIT {} OFFSET {}",
            where_clause,
            pagination.order_by(SORTABLE),
            pagination.limit(),
            pagination.offset()
        );
        let mut data_sql = sqlx::query_as::<_, Visitor>(&data_query);
        for param in params {
            data_sql = data_sql.bind(param);
        }
        let visitors = data_sql.fetch_all(db).await?;

        Ok(PaginatedVisitorsResponse {
            success: true,
            meta: pagination.meta(visitors.len(), total),
            visitors,
        })
    }

    #[instrument(skip(db))]
    pub async fn get_visitor(db: &PgPool, id: Uuid) -> Result<Visitor, AppError> {
        sqlx::query_as::<_, Visitor>(&format!("SELECT {VISITOR_COLUMNS} FROM visitors WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch visitor")
            .map_err(AppError::database)?
            .ok_or_else(|| not_found(id))
    }

    #[instrument(skip(db, dto))]
    pub async fn update_visitor(
        db: &PgPool,
        id: Uuid,
        dto: UpdateVisitorDto,
    ) -> Result<Visitor, AppError> {
        let email = dto.email.map(|e| e.trim().to_lowercase());

        sqlx::query_as::<_, Visitor>(&format!(
            "UPDATE visitors
             SET user_name = COALESCE($1, user_name),
                 email = COALESCE($2, email),
                 status = COALESCE($3, status)
             WHERE id = $4
             RETURNING {VISITOR_COLUMNS}"
        ))
        .bind(dto.user_name.as_deref().map(str::trim))
        .bind(&email)
        .bind(dto.status.map(|s| s.as_str()))
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(|e| duplicate_email(e, "Another visitor with this email already exists"))?
        .ok_or_else(|| not_found(id))
    }

    #[instrument(skip(db))]
    pub async fn delete_visitor(db: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM visitors WHERE id = $1")
            .bind(id)
            .execute(db)
            .await
            .context("Failed to delete visitor")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }

        track_record_deleted("visitor");
        Ok(())
    }

    /// Sets one status on many leads. Rows already at that status are left
    /// alone and not counted.
    #[instrument(skip(db, dto))]
    pub async fn bulk_update(db: &PgPool, dto: BulkUpdateVisitorsDto) -> Result<u64, AppError> {
        let status = bulk_target(&dto)?;

        let result = sqlx::query(
            "UPDATE visitors SET status = $1 WHERE id = ANY($2) AND status <> $1",
        )
        .bind(status.as_str())
        .bind(&dto.visitor_ids)
        .execute(db)
        .await
        .context("Failed to bulk update visitors")
        .map_err(AppError::database)?;

        let modified = result.rows_affected();
        tracing::info!(requested = dto.visitor_ids.len(), modified, status = %status, "Bulk visitor update");
        Ok(modified)
    }

    #[instrument(skip(db))]
    pub async fn get_stats(db: &PgPool) -> Result<VisitorStats, AppError> {
        let (total, new, contacted, interested, not_interested, converted, recent_visitors) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64, i64, i64)>(
                "SELECT COUNT(*),
                        COUNT(*) FILTER (WHERE status = 'New'),
                        COUNT(*) FILTER (WHERE status = 'Contacted'),
                        COUNT(*) FILTER (WHERE status = 'Interested'),
                        COUNT(*) FILTER (WHERE status = 'Not Interested'),
                        COUNT(*) FILTER (WHERE status = 'Converted'),
                        COUNT(*) FILTER (WHERE created_at >= NOW() - INTERVAL '30 days')
                 FROM visitors",
            )
            .fetch_one(db)
            .await?;

        let monthly_breakdown = sqlx::query_as::<_, MonthlyCount>(
            "SELECT EXTRACT(YEAR FROM created_at)::INT AS year,
                    EXTRACT(MONTH FROM created_at)::INT AS month,
                    COUNT(*) AS count
             FROM visitors
             GROUP BY 1, 2
             ORDER BY year DESC, month DESC
             LIMIT 12",
        )
        .fetch_all(db)
        .await?;

        Ok(VisitorStats {
            total,
            new,
            contacted,
            interested,
            not_interested,
            converted,
            recent_visitors,
            monthly_breakdown,
            conversion_rate: percentage(converted, total),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_bulk_target_requires_ids_then_status() {
        let empty = BulkUpdateVisitorsDto {
            visitor_ids: Vec::new(),
            status: Some(LeadStatus::Contacted),
        };
        let err = bulk_target(&empty).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.error.to_string(), "Please provide valid visitor IDs");

        let no_status = BulkUpdateVisitorsDto {
            visitor_ids: vec![Uuid::new_v4()],
            status: None,
        };
        assert_eq!(
            bulk_target(&no_status).unwrap_err().error.to_string(),
            "Please provide status"
        );

        let ok = BulkUpdateVisitorsDto {
            visitor_ids: vec![Uuid::new_v4()],
            status: Some(LeadStatus::Converted),
        };
        assert_eq!(bulk_target(&ok).unwrap(), LeadStatus::Converted);
    }
}
