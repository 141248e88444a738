use anyhow::{Context, anyhow};
use learnhub_core::{AppError, FileStorage, hash_password};
use learnhub_models::EmploymentStatus;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    CourseWiseCount, CreateTeacherDto, InstructorOption, PaginatedTeachersResponse,
    QualificationWiseCount, Teacher, TeacherDocuments, TeacherFilterParams, TeacherStats,
    UpdateTeacherDto, TEACHER_UPLOADS,
};
use crate::metrics::{track_record_created, track_record_deleted};
use crate::modules::auth::service::ensure_email_available;
use crate::utils::form::{StoredFile, UploadedFile, discard_uploads, store_uploads};

pub const TEACHER_COLUMNS: &str = "id, teacher_id, email, password, first_name, last_name, \
     full_name, date_of_birth, gender, phone, cnic, address, photo, qualification, \
     unassigned_courses, emergency_contact, related_documents, status, created_by, \
     created_at, updated_at";

const SORTABLE: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("teacherId", "teacher_id"),
    ("status", "status"),
];

fn write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        let message = match db_err.constraint() {
            Some("teachers_teacher_id_key") => "Teacher ID already exists",
            Some("teachers_cnic_key") => "A teacher with this CNIC already exists",
            _ => "A user with this email already exists",
        };
        return AppError::bad_request(anyhow!(message));
    }
    AppError::database(e)
}

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(anyhow!("No teacher found with id: {}", id))
}

/// Places stored files into the photo column or the matching document slot.
fn apply_uploads(photo: &mut Option<String>, documents: &mut TeacherDocuments, stored: &[StoredFile]) {
    for file in stored {
        if file.slot == "photo" {
            *photo = Some(file.url.clone());
        } else {
            documents.set(file.slot, file.url.clone());
        }
    }
}

pub struct TeacherService;

impl TeacherService {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Teacher>, AppError> {
        let teacher =
            sqlx::query_as::<_, Teacher>(&format!("SELECT {TEACHER_COLUMNS} FROM teachers WHERE id = $1"))
                .bind(id)
                .fetch_optional(db)
                .await
                .context("Failed to fetch teacher by ID")
                .map_err(AppError::database)?;
        Ok(teacher)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<Teacher>, AppError> {
        let teacher = sqlx::query_as::<_, Teacher>(&format!(
            "SELECT {TEACHER_COLUMNS} FROM teachers WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
        .context("Failed to fetch teacher by email")
        .map_err(AppError::database)?;
        Ok(teacher)
    }

    #[instrument(skip(db))]
    pub async fn get_teacher(db: &PgPool, id: Uuid) -> Result<Teacher, AppError> {
        Self::find_by_id(db, id).await?.ok_or_else(|| not_found(id))
    }

    /// Inserts the teacher and its sign-in account in one transaction.
    #[instrument(skip(db, storage, dto, files))]
    pub async fn create_teacher(
        db: &PgPool,
        storage: &dyn FileStorage,
        dto: CreateTeacherDto,
        files: &[UploadedFile],
        created_by: Uuid,
    ) -> Result<Teacher, AppError> {
        let CreateTeacherDto {
            teacher_id,
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
            unassigned_courses,
            emergency_contact,
            status,
        } = dto;

        let email = email.unwrap_or_default().trim().to_lowercase();
        ensure_email_available(db, &email, None).await?;

        let hashed_password = hash_password(&password.unwrap_or_default())?;

        let stored = store_uploads(storage, &TEACHER_UPLOADS, files).await?;
        let mut photo = None;
        let mut documents = TeacherDocuments::default();
        apply_uploads(&mut photo, &mut documents, &stored);

        let result = async {
            let mut tx = db.begin().await?;

            let teacher = sqlx::query_as::<_, Teacher>(&format!(
                "INSERT INTO teachers (teacher_id, email, password, first_name, last_name,
                     date_of_birth, gender, phone, cnic, address, photo, qualification,
                     unassigned_courses, emergency_contact, related_documents, status, created_by)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
                 RETURNING {TEACHER_COLUMNS}"
            ))
            .bind(teacher_id.as_deref().map(str::trim))
            .bind(&email)
            .bind(&hashed_password)
            .bind(&first_name)
            .bind(&last_name)
            .bind(date_of_birth)
            .bind(gender.map(|g| g.as_str()))
            .bind(&phone)
            .bind(&cnic)
            .bind(&address)
            .bind(&photo)
            .bind(Json(&qualification))
            .bind(Json(&unassigned_courses))
            .bind(Json(&emergency_contact))
            .bind(Json(&documents))
            .bind(status.unwrap_or_default().as_str())
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await
            .map_err(write_error)?;

            Self::insert_account(&mut tx, &teacher, &hashed_password).await?;
            tx.commit().await?;
            Ok::<_, AppError>(teacher)
        }
        .await;

        match result {
            Ok(teacher) => {
                tracing::info!(teacher_id = %teacher.id, "Teacher created");
                track_record_created("teacher");
                Ok(teacher)
            }
            Err(e) => {
                discard_uploads(storage, &stored).await;
                Err(e)
            }
        }
    }

    async fn insert_account(
        tx: &mut Transaction<'_, Postgres>,
        teacher: &Teacher,
        hashed_password: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO accounts (name, email, password, role, profile_id)
             VALUES ($1, $2, $3, 'teacher', $4)",
        )
        .bind(&teacher.full_name)
        .bind(&teacher.email)
        .bind(hashed_password)
        .bind(teacher.id)
        .execute(&mut **tx)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn get_teachers(
        db: &PgPool,
        filters: TeacherFilterParams,
    ) -> Result<PaginatedTeachersResponse, AppError> {
        let pagination = &filters.pagination;
        let mut where_clause = String::from(" WHERE 1 = 1");
        let mut params: Vec<String> = Vec::new();

        if let Some(status) = filters.status.as_deref().filter(|s| !s.is_empty()) {
            params.push(status.to_string());
            where_clause.push_str(&format!(" AND status = ${}", params.len()));
        }

        if let Some(course) = filters.course.as_deref().filter(|s| !s.is_empty()) {
            params.push(course.to_string());
            where_clause.push_str(&format!(
                " AND unassigned_courses->>'selectedCourse' = ${}",
                params.len()
            ));
        }

        if let Some(pattern) = pagination.search_pattern() {
            params.push(pattern);
            let n = params.len();
            where_clause.push_str(&format!(
                " AND (first_name ILIKE ${n} OR last_name ILIKE ${n} OR teacher_id ILIKE ${n} OR email ILIKE ${n})"
            ));
        }

        let count_query = format!("SELECT COUNT(*) FROM teachers{}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT {TEACHER_COLUMNS} FROM teachers{} {} LIMIT {} OFFSET {}",
            where_clause,
            pagination.order_by(SORTABLE),
            pagination.limit(),
            pagination.offset()
        );
        let mut data_sql = sqlx::query_as::<_, Teacher>(&data_query);
        for param in params {
            data_sql = data_sql.bind(param);
        }
        let teachers = data_sql.fetch_all(db).await?;

        Ok(PaginatedTeachersResponse {
            success: true,
            meta: pagination.meta(teachers.len(), total),
            teachers,
        })
    }

    /// Merges `dto` over the stored teacher. A new email or password is
    /// written to the paired account in the same transaction.
    #[instrument(skip(db, storage, dto, files))]
    pub async fn update_teacher(
        db: &PgPool,
        storage: &dyn FileStorage,
        id: Uuid,
        dto: UpdateTeacherDto,
        files: &[UploadedFile],
    ) -> Result<Teacher, AppError> {
        let existing = Self::get_teacher(db, id).await?;

        let new_password = match dto.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let mut merged = dto.merge_into(existing.clone());
        if merged.email != existing.email {
            ensure_email_available(db, &merged.email, Some(id)).await?;
        }

        let stored = store_uploads(storage, &TEACHER_UPLOADS, files).await?;
        apply_uploads(&mut merged.photo, &mut merged.related_documents.0, &stored);

        let result = async {
            let mut tx = db.begin().await?;

            let teacher = sqlx::query_as::<_, Teacher>(&format!(
                "UPDATE teachers
                 SET teacher_id = $1, email = $2, password = COALESCE($3, password),
                     first_name = $4, last_name = $5, date_of_birth = $6, gender = $7,
                     phone = $8, cnic = $9, address = $10, photo = $11, qualification = $12,
                     unassigned_courses = $13, emergency_contact = $14,
                     related_documents = $15, status = $16
                 WHERE id = $17
                 RETURNING {TEACHER_COLUMNS}"
            ))
            .bind(&merged.teacher_id)
            .bind(&merged.email)
            .bind(&new_password)
            .bind(&merged.first_name)
            .bind(&merged.last_name)
            .bind(merged.date_of_birth)
            .bind(merged.gender.as_str())
            .bind(&merged.phone)
            .bind(&merged.cnic)
            .bind(&merged.address)
            .bind(&merged.photo)
            .bind(&merged.qualification)
            .bind(&merged.unassigned_courses)
            .bind(&merged.emergency_contact)
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
            .bind(&teacher.full_name)
            .bind(&teacher.email)
            .bind(&new_password)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;

            tx.commit().await?;
            Ok::<_, AppError>(teacher)
        }
        .await;

        if result.is_err() {
            discard_uploads(storage, &stored).await;
        }
        result
    }

    /// Removes the teacher and its account. Courses it instructed keep their
    /// instructor name and email but lose the link.
    #[instrument(skip(db))]
    pub async fn delete_teacher(db: &PgPool, id: Uuid) -> Result<Teacher, AppError> {
        let mut tx = db.begin().await?;

        let teacher = sqlx::query_as::<_, Teacher>(&format!(
            "DELETE FROM teachers WHERE id = $1 RETURNING {TEACHER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to delete teacher")
        .map_err(AppError::database)?
        .ok_or_else(|| not_found(id))?;

        sqlx::query("DELETE FROM accounts WHERE profile_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete teacher account")
            .map_err(AppError::database)?;

        tx.commit().await?;

        tracing::info!(teacher_id = %id, "Teacher deleted");
        track_record_deleted("teacher");
        Ok(teacher)
    }

    #[instrument(skip(db))]
    pub async fn get_stats(db: &PgPool) -> Result<TeacherStats, AppError> {
        let (total, active, inactive, on_leave, terminated) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
                "SELECT COUNT(*),
                        COUNT(*) FILTER (WHERE status = 'Active'),
                        COUNT(*) FILTER (WHERE status = 'Inactive'),
                        COUNT(*) FILTER (WHERE status = 'On Leave'),
                        COUNT(*) FILTER (WHERE status = 'Terminated')
                 FROM teachers",
            )
            .fetch_one(db)
            .await?;

        let course_wise = sqlx::query_as::<_, CourseWiseCount>(
            "SELECT unassigned_courses->>'selectedCourse' AS selected_course,
                    COUNT(*) AS count,
                    ARRAY_REMOVE(ARRAY_AGG(DISTINCT unassigned_courses->>'designation'), NULL)
                        AS designations
             FROM teachers
             GROUP BY 1
             ORDER BY count DESC",
        )
        .fetch_all(db)
        .await?;

        let qualification_wise = sqlx::query_as::<_, QualificationWiseCount>(
            "SELECT qualification->>'degree' AS degree,
                    COUNT(*) AS count,
                    AVG((qualification->>'obtainedCGPA')::float8) AS avg_cgpa
             FROM teachers
             GROUP BY 1
             ORDER BY count DESC",
        )
        .fetch_all(db)
        .await?;

        Ok(TeacherStats {
            total,
            active,
            inactive,
            on_leave,
            terminated,
            course_wise,
            qualification_wise,
        })
    }

    /// Active teachers for instructor dropdowns, ordered by first name.
    #[instrument(skip(db))]
    pub async fn get_instructors(db: &PgPool) -> Result<Vec<InstructorOption>, AppError> {
        let instructors = sqlx::query_as::<_, InstructorOption>(
            "SELECT id, teacher_id, full_name AS name, email,
                    full_name || ' (' || email || ')' AS full_display
             FROM teachers
             WHERE status = $1
             ORDER BY first_name ASC",
        )
        .bind(EmploymentStatus::Active.as_str())
        .fetch_all(db)
        .await?;
        Ok(instructors)
    }
}
