use anyhow::{Context, anyhow};
use learnhub_core::{AppError, FileStorage, hash_password};
use learnhub_models::Authorities;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    CreateStaffDto, GroupCount, PaginatedStaffResponse, STAFF_UPLOADS, Staff, StaffDocuments,
    StaffFilterParams, StaffStats, UpdateStaffDto,
};
use crate::metrics::{track_record_created, track_record_deleted};
use crate::modules::auth::service::ensure_email_available;
use crate::utils::form::{StoredFile, UploadedFile, discard_uploads, store_uploads};

pub const STAFF_COLUMNS: &str = "id, email, password, first_name, last_name, full_name, \
     date_of_birth, gender, phone, cnic, address, qualification, emergency_contact, \
     authorities, related_documents, status, created_by, created_at, updated_at";

const SORTABLE: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("status", "status"),
];

fn write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        let message = match db_err.constraint() {
            Some("staff_cnic_key") => "A staff member with this CNIC already exists",
            _ => "A user with this email already exists",
        };
        return AppError::bad_request(anyhow!(message));
    }
    AppError::database(e)
}

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(anyhow!("No staff member found with id: {}", id))
}

fn apply_uploads(documents: &mut StaffDocuments, stored: &[StoredFile]) {
    for file in stored {
        documents.set(file.slot, file.url.clone());
    }
}

pub struct StaffService;

impl StaffService {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Staff>, AppError> {
        let staff = sqlx::query_as::<_, Staff>(&format!("SELECT {STAFF_COLUMNS} FROM staff WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch staff member by ID")
            .map_err(AppError::database)?;
        Ok(staff)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<Staff>, AppError> {
        let staff =
            sqlx::query_as::<_, Staff>(&format!("SELECT {STAFF_COLUMNS} FROM staff WHERE email = $1"))
                .bind(email)
                .fetch_optional(db)
                .await
                .context("Failed to fetch staff member by email")
                .map_err(AppError::database)?;
        Ok(staff)
    }

    #[instrument(skip(db))]
    pub async fn get_staff(db: &PgPool, id: Uuid) -> Result<Staff, AppError> {
        Self::find_by_id(db, id).await?.ok_or_else(|| not_found(id))
    }

    #[instrument(skip(db, storage, dto, files))]
    pub async fn create_staff(
        db: &PgPool,
        storage: &dyn FileStorage,
        dto: CreateStaffDto,
        files: &[UploadedFile],
        created_by: Uuid,
    ) -> Result<Staff, AppError> {
        let CreateStaffDto {
            email,
            password,
            first_name,
            last_name,
            date_of_birth,
            gender,
            phone,
            cnic,
            address,
            qualification,
            emergency_contact,
            authorities,
            status,
        } = dto;

        let email = email.unwrap_or_default().trim().to_lowercase();
        ensure_email_available(db, &email, None).await?;

        let hashed_password = hash_password(&password.unwrap_or_default())?;
        let authorities = authorities.merge_into(Authorities::default());

        let stored = store_uploads(storage, &STAFF_UPLOADS, files).await?;
        let mut documents = StaffDocuments::default();
        apply_uploads(&mut documents, &stored);

        let result = async {
            let mut tx = db.begin().await?;

            let staff = sqlx::query_as::<_, Staff>(&format!(
                "INSERT INTO staff (email, password, first_name, last_name, date_of_birth, gender,
                     phone, cnic, address, qualification, emergency_contact, authorities,
                     related_documents, status, created_by)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                 RETURNING {STAFF_COLUMNS}"
            ))
            .bind(&email)
            .bind(&hashed_password)
            .bind(&first_name)
            .bind(&last_name)
            .bind(date_of_birth)
            .bind(gender.map(|g| g.as_str()))
            .bind(&phone)
            .bind(&cnic)
            .bind(&address)
            .bind(Json(&qualification))
            .bind(Json(&emergency_contact))
            .bind(Json(&authorities))
            .bind(Json(&documents))
            .bind(status.unwrap_or_default().as_str())
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await
            .map_err(write_error)?;

            sqlx::query(
                "INSERT INTO accounts (name, email, password, role, profile_id)
                 VALUES ($1, $2, $3, 'staff', $4)",
            )
            .bind(&staff.full_name)
            .bind(&staff.email)
            .bind(&hashed_password)
            .bind(staff.id)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;

            tx.commit().await?;
            Ok::<_, AppError>(staff)
        }
        .await;

        match result {
            Ok(staff) => {
                tracing::info!(staff_id = %staff.id, "Staff member created");
                track_record_created("staff");
                Ok(staff)
            }
            Err(e) => {
                discard_uploads(storage, &stored).await;
                Err(e)
            }
        }
    }

    #[instrument(skip(db))]
    pub async fn get_staff_list(
        db: &PgPool,
        filters: StaffFilterParams,
    ) -> Result<PaginatedStaffResponse, AppError> {
        let pagination = &filters.pagination;
        let mut where_clause = String::from(" WHERE 1 = 1");
        let mut params: Vec<String> = Vec::new();

        if let Some(status) = filters.status.as_deref().filter(|s| !s.is_empty()) {
            params.push(status.to_string());
            where_clause.push_str(&format!(" AND status = ${}", params.len()));
        }

        if let Some(designation) = filters.designation.as_deref().filter(|s| !s.is_empty()) {
            params.push(designation.to_string());
            where_clause.push_str(&format!(
                " AND qualification->>'designation' = ${}",
                params.len()
            ));
        }

        if let Some(pattern) = pagination.search_pattern() {
            params.push(pattern);
            let n = params.len();
            where_clause.push_str(&format!(
                " AND (first_name ILIKE ${n} OR last_name ILIKE ${n} OR email ILIKE ${n} OR cnic ILIKE ${n})"
            ));
        }

        let count_query = format!("SELECT COUNT(*) FROM staff{}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT {STAFF_COLUMNS} FROM staff{} {} LIMIT {} OFFSET {}",
            where_clause,
            pagination.order_by(SORTABLE),
            pagination.limit(),
            pagination.offset()
        );
        let mut data_sql = sqlx::query_as::<_, Staff>(&data_query);
        for param in params {
            data_sql = data_sql.bind(param);
        }
        let staff = data_sql.fetch_all(db).await?;

        Ok(PaginatedStaffResponse {
            success: true,
            meta: pagination.meta(staff.len(), total),
            staff,
        })
    }

    #[instrument(skip(db, storage, dto, files))]
    pub async fn update_staff(
        db: &PgPool,
        storage: &dyn FileStorage,
        id: Uuid,
        dto: UpdateStaffDto,
        files: &[UploadedFile],
    ) -> Result<Staff, AppError> {
        let existing = Self::get_staff(db, id).await?;

        let new_password = match dto.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let mut merged = dto.merge_into(existing.clone());
        if merged.email != existing.email {
            ensure_email_available(db, &merged.email, Some(id)).await?;
        }

        let stored = store_uploads(storage, &STAFF_UPLOADS, files).await?;
        apply_uploads(&mut merged.related_documents.0, &stored);

        let result = async {
            let mut tx = db.begin().await?;

            let staff = sqlx::query_as::<_, Staff>(&format!(
                "UPDATE staff
                 SET email = $1, password = COALESCE($2, password), first_name = $3,
                     last_name = $4, date_of_birth = $5, gender = $6, phone = $7, cnic = $8,
                     address = $9, qualification = $10, emergency_contact = $11,
                     authorities = $12, related_documents = $13, status = $14
                 WHERE id = $15
                 RETURNING {STAFF_COLUMNS}"
            ))
            .bind(&merged.email)
            .bind(&new_password)
            .bind(&merged.first_name)
            .bind(&merged.last_name)
            .bind(merged.date_of_birth)
            .bind(merged.gender.as_str())
            .bind(&merged.phone)
            .bind(&merged.cnic)
            .bind(&merged.address)
            .bind(&merged.qualification)
            .bind(&merged.emergency_contact)
            .bind(&merged.authorities)
            .bind(&merged.related_documents)
            .bind(merged.status.as_str())
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(write_error)?
            .ok_or_else(|| not_found(id))?;

            sqlx::query(
                "UPDATE accounts
                 SET name = $1, email = $2, password = COALESCE($3, password)
                 WHERE profile_id = $4",
            )
            .bind(&staff.full_name)
            .bind(&staff.email)
            .bind(&new_password)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;

            tx.commit().await?;
            Ok::<_, AppError>(staff)
        }
        .await;

        if result.is_err() {
            discard_uploads(storage, &stored).await;
        }
        result
    }

    #[instrument(skip(db))]
    pub async fn delete_staff(db: &PgPool, id: Uuid) -> Result<Staff, AppError> {
        let mut tx = db.begin().await?;

        let staff = sqlx::query_as::<_, Staff>(&format!(
            "DELETE FROM staff WHERE id = $1 RETURNING {STAFF_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to delete staff member")
        .map_err(AppError::database)?
        .ok_or_else(|| not_found(id))?;

        sqlx::query("DELETE FROM accounts WHERE profile_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete staff account")
            .map_err(AppError::database)?;

        tx.commit().await?;

        tracing::info!(staff_id = %id, "Staff member deleted");
        track_record_deleted("staff");
        Ok(staff)
    }

    #[instrument(skip(db))]
    pub async fn get_stats(db: &PgPool) -> Result<StaffStats, AppError> {
        let (total, active, inactive, on_leave, terminated) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
                "SELECT COUNT(*),
                        COUNT(*) FILTER (WHERE status = 'Active'),
                        COUNT(*) FILTER (WHERE status = 'Inactive'),
                        COUNT(*) FILTER (WHERE status = 'On Leave'),
                        COUNT(*) FILTER (WHERE status = 'Terminated')
                 FROM staff",
            )
            .fetch_one(db)
            .await?;

        let designation_wise = sqlx::query_as::<_, GroupCount>(
            "SELECT qualification->>'designation' AS key, COUNT(*) AS count
             FROM staff GROUP BY 1 ORDER BY count DESC",
        )
        .fetch_all(db)
        .await?;

        let education_wise = sqlx::query_as::<_, GroupCount>(
            "SELECT qualification->>'education' AS key, COUNT(*) AS count
             FROM staff GROUP BY 1 ORDER BY count DESC",
        )
        .fetch_all(db)
        .await?;

        Ok(StaffStats {
            total,
            active,
            inactive,
            on_leave,
            terminated,
            designation_wise,
            education_wise,
        })
    }
}
