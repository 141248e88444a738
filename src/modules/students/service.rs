use anyhow::{Context, anyhow};
use chrono::Utc;
use learnhub_core::{AppError, FileStorage, hash_password};
use sqlx::PgPool;
use sqlx::types::Json;
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    CreateStudentDto, Enrollment, PaginatedStudentsResponse, STUDENT_UPLOADS, Student,
    StudentBrief, StudentFilterParams, UpdateStudentDto,
};
use crate::metrics::{track_record_created, track_record_deleted};
use crate::modules::auth::service::ensure_email_available;
use crate::utils::form::{StoredFile, UploadedFile, discard_uploads, store_uploads};

pub const STUDENT_COLUMNS: &str = "id, student_id, full_name, date_of_birth, gender, phone, \
     email, password, cnic_b_form, address, csr, parent_guardian, courses, emergency_contact, \
     photo, student_cnic_b_form, parent_cnic, medical_records, additional_documents, \
     created_at, updated_at";

const SORTABLE: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("fullName", "full_name"),
    ("studentId", "student_id"),
];

fn write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e
        && db_err.is_unique_violation()
    {
        let message = match db_err.constraint() {
            Some("students_student_id_key") => "Student ID already exists",
            _ => "A user with this email already exists",
        };
        return AppError::bad_request(anyhow!(message));
    }
    AppError::database(e)
}

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(anyhow!("No student found with id: {}", id))
}

fn apply_uploads(student: &mut Student, stored: &[StoredFile]) {
    for file in stored {
        student.set_document(file.slot, file.url.clone());
    }
}

/// JSONB containment filter matching students enrolled in `course_code`.
fn enrollment_filter(course_code: &str) -> Json<serde_json::Value> {
    Json(json!([{ "selectedCourse": course_code }]))
}

pub struct StudentService;

impl StudentService {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to fetch student by ID")
        .map_err(AppError::database)?;
        Ok(student)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
        .context("Failed to fetch student by email")
        .map_err(AppError::database)?;
        Ok(student)
    }

    /// Students holding an enrollment for the course with public code
    /// `course_code`, in enrollment order.
    pub async fn find_by_course_code(db: &PgPool, course_code: &str) -> Result<Vec<Student>, AppError> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE courses @> $1 ORDER BY created_at"
        ))
        .bind(enrollment_filter(course_code))
        .fetch_all(db)
        .await
        .context("Failed to fetch students by course")
        .map_err(AppError::database)?;
        Ok(students)
    }

    /// Every enrollment must point at an existing course code.
    async fn ensure_courses_exist(db: &PgPool, enrollments: &[Enrollment]) -> Result<(), AppError> {
        let codes: Vec<&str> = enrollments
            .iter()
            .filter_map(|e| e.selected_course.as_deref())
            .collect();
        if codes.is_empty() {
            return Ok(());
        }

        let found = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT course_id) FROM courses WHERE course_id = ANY($1)",
        )
        .bind(&codes)
        .fetch_one(db)
        .await?;

        let mut distinct = codes.clone();
        distinct.sort_unstable();
        distinct.dedup();

        if found < distinct.len() as i64 {
            return Err(AppError::bad_request(anyhow!("Selected course not found")));
        }
        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn get_student(db: &PgPool, id: Uuid) -> Result<Student, AppError> {
        Self::find_by_id(db, id).await?.ok_or_else(|| not_found(id))
    }

    #[instrument(skip(db, storage, dto, files))]
    pub async fn create_student(
        db: &PgPool,
        storage: &dyn FileStorage,
        dto: CreateStudentDto,
        files: &[UploadedFile],
    ) -> Result<Student, AppError> {
        let CreateStudentDto {
            student_id,
            full_name,
            date_of_birth,
            gender,
            phone,
            email,
            password,
            cnic_b_form,
            address,
            csr,
            parent_guardian,
            courses,
            emergency_contact,
        } = dto;

        let email = email.unwrap_or_default().trim().to_lowercase();
        ensure_email_available(db, &email, None).await?;
        Self::ensure_courses_exist(db, &courses).await?;

        let now = Utc::now();
        let courses: Vec<Enrollment> = courses.into_iter().map(|e| e.with_defaults(now)).collect();
        let hashed_password = hash_password(&password.unwrap_or_default())?;

        let stored = store_uploads(storage, &STUDENT_UPLOADS, files).await?;
        let document = |slot: &str| {
            stored
                .iter()
                .find(|file| file.slot == slot)
                .map(|file| file.url.clone())
        };

        let result = sqlx::query_as::<_, Student>(&format!(
            "INSERT INTO students (student_id, full_name, date_of_birth, gender, phone, email,
                 password, cnic_b_form, address, csr, parent_guardian, courses, emergency_contact,
                 photo, student_cnic_b_form, parent_cnic, medical_records, additional_documents)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
             RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(student_id.as_deref().map(str::trim))
        .bind(full_name.as_deref().map(str::trim))
        .bind(date_of_birth)
        .bind(&gender)
        .bind(&phone)
        .bind(&email)
        .bind(&hashed_password)
        .bind(&cnic_b_form)
        .bind(&address)
        .bind(&csr)
        .bind(Json(parent_guardian.unwrap_or_default()))
        .bind(Json(&courses))
        .bind(Json(emergency_contact.unwrap_or_default()))
        .bind(document("photo"))
        .bind(document("studentCnicBForm"))
        .bind(document("parentCnic"))
        .bind(document("medicalRecords"))
        .bind(document("additionalDocuments"))
        .fetch_one(db)
        .await
        .map_err(write_error);

        match result {
            Ok(student) => {
                tracing::info!(student_id = %student.student_id, "Student created");
                track_record_created("student");
                Ok(student)
            }
            Err(e) => {
                discard_uploads(storage, &stored).await;
                Err(e)
            }
        }
    }

    #[instrument(skip(db))]
    pub async fn get_students(
        db: &PgPool,
        filters: StudentFilterParams,
    ) -> Result<PaginatedStudentsResponse, AppError> {
        let pagination = &filters.pagination;
        let mut where_clause = String::from(" WHERE 1 = 1");
        let mut search: Option<String> = None;
        let course = filters.course.as_deref().filter(|c| !c.is_empty());

        if course.is_some() {
            where_clause.push_str(" AND courses @> $1");
        }

        if let Some(pattern) = pagination.search_pattern() {
            let n = usize::from(course.is_some()) + 1;
            where_clause.push_str(&format!(
                " AND (full_name ILIKE ${n} OR student_id ILIKE ${n} OR email ILIKE ${n} \
                 OR phone ILIKE ${n} OR cnic_b_form ILIKE ${n})"
            ));
            search = Some(pattern);
        }

        let count_query = format!("SELECT COUNT(*) FROM students{}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(code) = course {
            count_sql = count_sql.bind(enrollment_filter(code));
        }
        if let Some(pattern) = &search {
            count_sql = count_sql.bind(pattern);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT {STUDENT_COLUMNS} FROM students{} {} LIMIT {} OFFSET {}",
            where_clause,
            pagination.order_by(SORTABLE),
            pagination.limit(),
            pagination.offset()
        );
        let mut data_sql = sqlx::query_as::<_, Student>(&data_query);
        if let Some(code) = course {
            data_sql = data_sql.bind(enrollment_filter(code));
        }
        if let Some(pattern) = search {
            data_sql = data_sql.bind(pattern);
        }
        let students = data_sql.fetch_all(db).await?;

        Ok(PaginatedStudentsResponse {
            success: true,
            meta: pagination.meta(students.len(), total),
            students,
        })
    }

    /// Contact cards of the students enrolled in `course_code`.
    #[instrument(skip(db))]
    pub async fn get_students_by_course(
        db: &PgPool,
        course_code: &str,
    ) -> Result<Vec<StudentBrief>, AppError> {
        if course_code.trim().is_empty() {
            return Err(AppError::bad_request(anyhow!("Course ID is required")));
        }

        let students = sqlx::query_as::<_, StudentBrief>(
            "SELECT id, student_id, full_name, phone, email
             FROM students WHERE courses @> $1 ORDER BY full_name",
        )
        .bind(enrollment_filter(course_code))
        .fetch_all(db)
        .await
        .context("Failed to fetch students by course")
        .map_err(AppError::database)?;

        Ok(students)
    }

    /// Merges a partial update over the stored student. Enrollment patches
    /// are matched by course code, and any newly named course must exist.
    #[instrument(skip(db, storage, dto, files))]
    pub async fn update_student(
        db: &PgPool,
        storage: &dyn FileStorage,
        id: Uuid,
        dto: UpdateStudentDto,
        files: &[UploadedFile],
    ) -> Result<Student, AppError> {
        let existing = Self::get_student(db, id).await?;

        if let Some(patches) = &dto.courses {
            let added: Vec<Enrollment> = patches
                .iter()
                .filter(|p| {
                    p.selected_course
                        .as_deref()
                        .is_some_and(|code| existing.enrollment_for(code).is_none())
                })
                .cloned()
                .collect();
            Self::ensure_courses_exist(db, &added).await?;
        }

        let new_password = match dto.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let existing_email = existing.email.clone();
        let mut merged = dto.merge_into(existing);
        if merged.email != existing_email {
            ensure_email_available(db, &merged.email, Some(id)).await?;
        }

        let stored = store_uploads(storage, &STUDENT_UPLOADS, files).await?;
        apply_uploads(&mut merged, &stored);

        let result = sqlx::query_as::<_, Student>(&format!(
            "UPDATE students
             SET student_id = $1, full_name = $2, date_of_birth = $3, gender = $4, phone = $5,
                 email = $6, password = COALESCE($7, password), cnic_b_form = $8, address = $9,
                 csr = $10, parent_guardian = $11, courses = $12, emergency_contact = $13,
                 photo = $14, student_cnic_b_form = $15, parent_cnic = $16,
                 medical_records = $17, additional_documents = $18
             WHERE id = $19
             RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(&merged.student_id)
        .bind(&merged.full_name)
        .bind(merged.date_of_birth)
        .bind(&merged.gender)
        .bind(&merged.phone)
        .bind(&merged.email)
        .bind(&new_password)
        .bind(&merged.cnic_b_form)
        .bind(&merged.address)
        .bind(&merged.csr)
        .bind(&merged.parent_guardian)
        .bind(&merged.courses)
        .bind(&merged.emergency_contact)
        .bind(&merged.photo)
        .bind(&merged.student_cnic_b_form)
        .bind(&merged.parent_cnic)
        .bind(&merged.medical_records)
        .bind(&merged.additional_documents)
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(write_error)
        .and_then(|student| student.ok_or_else(|| not_found(id)));

        if result.is_err() {
            discard_uploads(storage, &stored).await;
        }
        result
    }

    #[instrument(skip(db))]
    pub async fn delete_student(db: &PgPool, id: Uuid) -> Result<Student, AppError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "DELETE FROM students WHERE id = $1 RETURNING {STUDENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to delete student")
        .map_err(AppError::database)?
        .ok_or_else(|| not_found(id))?;

        tracing::info!(student_id = %student.student_id, "Student deleted");
        track_record_deleted("student");
        Ok(student)
    }
}
