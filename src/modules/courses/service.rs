use std::collections::HashMap;

use anyhow::{Context, anyhow};
use learnhub_core::{AppError, FileStorage};
use learnhub_models::EmploymentStatus;
use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::model::{
    AttendanceSheet, COURSE_UPLOADS, Course, CourseCounters, CourseFilterParams, CourseStats,
    CourseView, CoursesByStatus, CreateCourseDto, InstructorCourseCount, InstructorSummary,
    LectureTotals, PaginatedCoursesResponse, StudentTotals, UpdateCourseDto,
};
use crate::metrics::{track_record_created, track_record_deleted};
use crate::modules::students::service::StudentService;
use crate::modules::teachers::model::Teacher;
use crate::modules::teachers::service::TeacherService;
use crate::utils::form::{UploadedFile, discard_uploads, store_uploads};

pub const COURSE_COLUMNS: &str = "id, course_id, course_name, duration, course_image, \
     no_of_students_enrolled, certified_students, freezed_students, total_lectures, \
     lectures_delivered, instructor_id, instructor_name, instructor_email, phone_number, \
     description, status, created_by, created_at, updated_at";

const SORTABLE: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("courseName", "course_name"),
    ("courseId", "course_id"),
    ("status", "status"),
    ("noOfStudentsEnrolled", "no_of_students_enrolled"),
    ("totalLectures", "total_lectures"),
];

const DUPLICATE_COURSE_ID: &str = "Course ID already exists";

fn check_counters(counters: &CourseCounters) -> Result<(), AppError> {
    counters
        .check()
        .map_err(|message| AppError::bad_request(anyhow!(message)))
}

fn write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::bad_request(anyhow!(DUPLICATE_COURSE_ID));
        }
        if db_err.is_check_violation() {
            return AppError::bad_request(anyhow!("Course counters are inconsistent"));
        }
    }
    AppError::database(e)
}

fn not_found(id: Uuid) -> AppError {
    AppError::not_found(anyhow!("No course found with id: {}", id))
}

/// Rejects access when `scope` names a teacher other than the instructor.
fn check_scope(course: &Course, scope: Option<Uuid>) -> Result<(), AppError> {
    match scope {
        Some(teacher_id) if course.instructor_id != Some(teacher_id) => Err(AppError::forbidden(
            "You can only view your own courses",
        )),
        _ => Ok(()),
    }
}

/// Instructor assignment resolved from an email address.
struct ResolvedInstructor {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
}

impl From<Teacher> for ResolvedInstructor {
    fn from(teacher: Teacher) -> Self {
        Self {
            id: teacher.id,
            name: format!("{} {}", teacher.first_name, teacher.last_name),
            email: teacher.email,
            phone: teacher.phone,
        }
    }
}

pub struct CourseService;

impl CourseService {
    async fn resolve_instructor(db: &PgPool, email: &str) -> Result<ResolvedInstructor, AppError> {
        let email = email.trim().to_lowercase();
        let teacher = TeacherService::find_by_email(db, &email)
            .await?
            .ok_or_else(|| {
                AppError::not_found(anyhow!("No instructor found with email: {}", email))
            })?;

        if teacher.status != EmploymentStatus::Active {
            return Err(AppError::bad_request(anyhow!(
                "Cannot assign course to an inactive instructor"
            )));
        }

        Ok(teacher.into())
    }

    async fn course_id_taken(db: &PgPool, course_id: &str, except: Option<Uuid>) -> Result<bool, AppError> {
        let taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM courses WHERE course_id = $1 AND id IS DISTINCT FROM $2)",
        )
        .bind(course_id)
        .bind(except)
        .fetch_one(db)
        .await?;
        Ok(taken)
    }

    async fn load_instructors(
        db: &PgPool,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, InstructorSummary>, AppError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let instructors = sqlx::query_as::<_, InstructorSummary>(
            "SELECT id, teacher_id, first_name, last_name, email, phone, status
             FROM teachers WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(db)
        .await
        .context("Failed to load course instructors")
        .map_err(AppError::database)?;

        Ok(instructors.into_iter().map(|i| (i.id, i)).collect())
    }

    /// Attaches the instructor summary and derived rates to each course.
    async fn into_views(db: &PgPool, courses: Vec<Course>) -> Result<Vec<CourseView>, AppError> {
        let mut ids: Vec<Uuid> = courses.iter().filter_map(|c| c.instructor_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let instructors = Self::load_instructors(db, &ids).await?;
        Ok(courses
            .into_iter()
            .map(|course| {
                let instructor = course
                    .instructor_id
                    .and_then(|id| instructors.get(&id).cloned());
                CourseView::new(course, instructor)
            })
            .collect())
    }

    async fn into_view(db: &PgPool, course: Course) -> Result<CourseView, AppError> {
        let mut views = Self::into_views(db, vec![course]).await?;
        views
            .pop()
            .ok_or_else(|| AppError::internal_error("Course view could not be built"))
    }

    async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(&format!("SELECT {COURSE_COLUMNS} FROM courses WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch course by ID")
            .map_err(AppError::database)?
            .ok_or_else(|| not_found(id))
    }

    /// Course invariants are checked before anything is read or written.
    #[instrument(skip(db, storage, dto, files))]
    pub async fn create_course(
        db: &PgPool,
        storage: &dyn FileStorage,
        dto: CreateCourseDto,
        files: &[UploadedFile],
        created_by: Uuid,
    ) -> Result<CourseView, AppError> {
        let counters = dto.counters();
        check_counters(&counters)?;

        let instructor =
            Self::resolve_instructor(db, dto.instructor_email.as_deref().unwrap_or_default()).await?;

        let course_id = dto.course_id.unwrap_or_default().trim().to_string();
        if Self::course_id_taken(db, &course_id, None).await? {
            return Err(AppError::bad_request(anyhow!(DUPLICATE_COURSE_ID)));
        }

        let stored = store_uploads(storage, &COURSE_UPLOADS, files).await?;
        let course_image = stored.first().map(|file| file.url.clone());

        let result = sqlx::query_as::<_, Course>(&format!(
            "INSERT INTO courses (course_id, course_name, duration, course_image,
                 no_of_students_enrolled, certified_students, freezed_students, total_lectures,
                 lectures_delivered, instructor_id, instructor_name, instructor_email,
                 phone_number, description, status, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(&course_id)
        .bind(dto.course_name.as_deref().map(str::trim))
        .bind(&dto.duration)
        .bind(&course_image)
        .bind(counters.enrolled)
        .bind(counters.certified)
        .bind(counters.freezed)
        .bind(counters.total_lectures)
        .bind(counters.delivered)
        .bind(instructor.id)
        .bind(&instructor.name)
        .bind(&instructor.email)
        .bind(dto.phone_number.as_deref().unwrap_or(&instructor.phone))
        .bind(&dto.description)
        .bind(dto.status.unwrap_or_default().as_str())
        .bind(created_by)
        .fetch_one(db)
        .await
        .map_err(write_error);

        let course = match result {
            Ok(course) => course,
            Err(e) => {
                discard_uploads(storage, &stored).await;
                return Err(e);
            }
        };

        tracing::info!(course_id = %course.course_id, instructor = ?course.instructor_id, "Course created");
        track_record_created("course");
        Self::into_view(db, course).await
    }

    /// Lists courses. `scope` restricts the result to one instructor.
    #[instrument(skip(db))]
    pub async fn get_courses(
        db: &PgPool,
        filters: CourseFilterParams,
        scope: Option<Uuid>,
    ) -> Result<PaginatedCoursesResponse, AppError> {
        let pagination = &filters.pagination;
        let mut where_clause = String::from(" WHERE 1 = 1");
        let mut params: Vec<String> = Vec::new();
        let mut instructor_param = None;

        if let Some(instructor) = scope.or(filters.instructor) {
            instructor_param = Some(instructor);
            where_clause.push_str(" AND instructor_id = $1");
        }
        let offset = usize::from(instructor_param.is_some());

        if let Some(status) = filters.status.as_deref().filter(|s| !s.is_empty()) {
            params.push(status.to_string());
            where_clause.push_str(&format!(" AND status = ${}", params.len() + offset));
        }

        if let Some(pattern) = pagination.search_pattern() {
            params.push(pattern);
            let n = params.len() + offset;
            where_clause.push_str(&format!(
                " AND (course_name ILIKE ${n} OR course_id ILIKE ${n} \
                 OR instructor_name ILIKE ${n} OR instructor_email ILIKE ${n})"
            ));
        }

        let count_query = format!("SELECT COUNT(*) FROM courses{}", where_clause);
        let mut count_sql = sqlx::query_scalar::<_, i64>(&count_query);
        if let Some(instructor) = instructor_param {
            count_sql = count_sql.bind(instructor);
        }
        for param in &params {
            count_sql = count_sql.bind(param);
        }
        let total = count_sql.fetch_one(db).await?;

        let data_query = format!(
            "SELECT {COURSE_COLUMNS} FROM courses{} {} LIMIT {} OFFSET {}",
            where_clause,
            pagination.order_by(SORTABLE),
            pagination.limit(),
            pagination.offset()
        );
        let mut data_sql = sqlx::query_as::<_, Course>(&data_query);
        if let Some(instructor) = instructor_param {
            data_sql = data_sql.bind(instructor);
        }
        for param in params {
            data_sql = data_sql.bind(param);
        }
        let courses = data_sql.fetch_all(db).await?;
        let courses = Self::into_views(db, courses).await?;

        Ok(PaginatedCoursesResponse {
            success: true,
            meta: pagination.meta(courses.len(), total),
            courses,
        })
    }

    #[instrument(skip(db))]
    pub async fn get_course(db: &PgPool, id: Uuid, scope: Option<Uuid>) -> Result<CourseView, AppError> {
        let course = Self::find_by_id(db, id).await?;
        check_scope(&course, scope)?;
        Self::into_view(db, course).await
    }

    /// Applies a partial update. The merged counters must hold before the
    /// row is touched.
    #[instrument(skip(db, storage, dto, files))]
    pub async fn update_course(
        db: &PgPool,
        storage: &dyn FileStorage,
        id: Uuid,
        dto: UpdateCourseDto,
        files: &[UploadedFile],
    ) -> Result<CourseView, AppError> {
        let existing = Self::find_by_id(db, id).await?;

        let counters = dto.counters_over(&existing.counters());
        check_counters(&counters)?;

        let course_id = match dto.course_id.as_deref().map(str::trim) {
            Some(code) if code != existing.course_id => {
                if Self::course_id_taken(db, code, Some(id)).await? {
                    return Err(AppError::bad_request(anyhow!(DUPLICATE_COURSE_ID)));
                }
                code.to_string()
            }
            _ => existing.course_id.clone(),
        };

        let (instructor_id, instructor_name, instructor_email, instructor_phone) =
            match dto.instructor_email.as_deref() {
                Some(email) => {
                    let instructor = Self::resolve_instructor(db, email).await?;
                    (
                        Some(instructor.id),
                        instructor.name,
                        instructor.email,
                        Some(instructor.phone),
                    )
                }
                None => (
                    existing.instructor_id,
                    existing.instructor_name.clone(),
                    existing.instructor_email.clone(),
                    None,
                ),
            };

        let phone_number = dto
            .phone_number
            .or(instructor_phone)
            .unwrap_or_else(|| existing.phone_number.clone());

        let stored = store_uploads(storage, &COURSE_UPLOADS, files).await?;
        let course_image = stored
            .first()
            .map(|file| file.url.clone())
            .or_else(|| existing.course_image.clone());

        let result = sqlx::query_as::<_, Course>(&format!(
            "UPDATE courses
             SET course_id = $1, course_name = $2, duration = $3, course_image = $4,
                 no_of_students_enrolled = $5, certified_students = $6, freezed_students = $7,
                 total_lectures = $8, lectures_delivered = $9, instructor_id = $10,
                 instructor_name = $11, instructor_email = $12, phone_number = $13,
                 description = $14, status = $15
             WHERE id = $16
             RETURNING {COURSE_COLUMNS}"
        ))
        .bind(&course_id)
        .bind(dto.course_name.unwrap_or(existing.course_name))
        .bind(dto.duration.unwrap_or(existing.duration))
        .bind(&course_image)
        .bind(counters.enrolled)
        .bind(counters.certified)
        .bind(counters.freezed)
        .bind(counters.total_lectures)
        .bind(counters.delivered)
        .bind(instructor_id)
        .bind(&instructor_name)
        .bind(&instructor_email)
        .bind(&phone_number)
        .bind(dto.description.unwrap_or(existing.description))
        .bind(dto.status.unwrap_or(existing.status).as_str())
        .bind(id)
        .fetch_optional(db)
        .await
        .map_err(write_error)
        .and_then(|course| course.ok_or_else(|| not_found(id)));

        match result {
            Ok(course) => Self::into_view(db, course).await,
            Err(e) => {
                discard_uploads(storage, &stored).await;
                Err(e)
            }
        }
    }

    #[instrument(skip(db))]
    pub async fn delete_course(db: &PgPool, id: Uuid) -> Result<Course, AppError> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "DELETE FROM courses WHERE id = $1 RETURNING {COURSE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("Failed to delete course")
        .map_err(AppError::database)?
        .ok_or_else(|| not_found(id))?;

        tracing::info!(course_id = %course.course_id, "Course deleted");
        track_record_deleted("course");
        Ok(course)
    }

    #[instrument(skip(db))]
    pub async fn get_stats(db: &PgPool) -> Result<CourseStats, AppError> {
        let (total_courses, active, completed, upcoming, inactive) =
            sqlx::query_as::<_, (i64, i64, i64, i64, i64)>(
                "SELECT COUNT(*),
                        COUNT(*) FILTER (WHERE status = 'Active'),
                        COUNT(*) FILTER (WHERE status = 'Completed'),
                        COUNT(*) FILTER (WHERE status = 'Upcoming'),
                        COUNT(*) FILTER (WHERE status = 'Inactive')
                 FROM courses",
            )
            .fetch_one(db)
            .await?;

        let students = sqlx::query_as::<_, StudentTotals>(
            "SELECT COALESCE(SUM(no_of_students_enrolled), 0)::BIGINT AS total_enrolled,
                    COALESCE(SUM(certified_students), 0)::BIGINT AS total_certified,
                    COALESCE(SUM(freezed_students), 0)::BIGINT AS total_freezed
             FROM courses",
        )
        .fetch_one(db)
        .await?;

        let lectures = sqlx::query_as::<_, LectureTotals>(
            "SELECT COALESCE(SUM(total_lectures), 0)::BIGINT AS total_lectures,
                    COALESCE(SUM(lectures_delivered), 0)::BIGINT AS total_delivered,
                    COALESCE(AVG(CASE WHEN total_lectures = 0 THEN 0
                                      ELSE lectures_delivered::float8 / total_lectures * 100
                                 END), 0)::float8 AS avg_progress
             FROM courses",
        )
        .fetch_one(db)
        .await?;

        let instructors = sqlx::query_as::<_, InstructorCourseCount>(
            "SELECT instructor_id,
                    COUNT(*) AS course_count,
                    COALESCE(SUM(no_of_students_enrolled), 0)::BIGINT AS total_students,
                    MIN(instructor_name) AS instructor_name,
                    MIN(instructor_email) AS instructor_email
             FROM courses
             WHERE instructor_id IS NOT NULL
             GROUP BY instructor_id
             ORDER BY course_count DESC",
        )
        .fetch_all(db)
        .await?;

        Ok(CourseStats {
            total_courses,
            courses_by_status: CoursesByStatus {
                active,
                completed,
                upcoming,
                inactive,
            },
            students,
            lectures,
            instructors,
        })
    }

    /// Every course taught by `teacher_id`, newest first.
    #[instrument(skip(db))]
    pub async fn get_my_courses(db: &PgPool, teacher_id: Uuid) -> Result<Vec<CourseView>, AppError> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE instructor_id = $1 ORDER BY created_at DESC"
        ))
        .bind(teacher_id)
        .fetch_all(db)
        .await?;

        Self::into_views(db, courses).await
    }

    /// Lecture labels and per-student attendance for the course with public
    /// code `course_code`.
    #[instrument(skip(db))]
    pub async fn get_attendance(
        db: &PgPool,
        course_code: &str,
        scope: Option<Uuid>,
    ) -> Result<AttendanceSheet, AppError> {
        let course = sqlx::query_as::<_, Course>(&format!(
            "SELECT {COURSE_COLUMNS} FROM courses WHERE course_id = $1"
        ))
        .bind(course_code)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::not_found(anyhow!("Course not found")))?;

        check_scope(&course, scope)?;

        let students = StudentService::find_by_course_code(db, course_code).await?;
        Ok(AttendanceSheet::build(
            course_code,
            course.total_lectures,
            &students,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;
    use learnhub_models::courses::CourseStatus;

    fn course(instructor_id: Uuid) -> Course {
        let now = Utc::now();
        Course {
            id: Uuid::new_v4(),
            course_id: "WEB-101".into(),
            course_name: "Web Development".into(),
            duration: "3 months".into(),
            course_image: None,
            no_of_students_enrolled: 10,
            certified_students: 8,
            freezed_students: 0,
            total_lectures: 20,
            lectures_delivered: 5,
            instructor_id: Some(instructor_id),
            instructor_name: "Sara Khan".into(),
            instructor_email: "sara@learnhub.dev".into(),
            phone_number: "03001234567".into(),
            description: "Intro".into(),
            status: CourseStatus::Active,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_check_scope() {
        let instructor = Uuid::new_v4();
        let c = course(instructor);

        assert!(check_scope(&c, None).is_ok());
        assert!(check_scope(&c, Some(instructor)).is_ok());

        let err = check_scope(&c, Some(Uuid::new_v4())).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
        assert_eq!(err.error.to_string(), "You can only view your own courses");

        let mut orphaned = course(instructor);
        orphaned.instructor_id = None;
        assert!(check_scope(&orphaned, None).is_ok());
        assert!(check_scope(&orphaned, Some(instructor)).is_err());
    }

    #[test]
    fn test_check_counters_is_bad_request() {
        let counters = CourseCounters {
            enrolled: 10,
            certified: 15,
            ..Default::default()
        };
        let err = check_counters(&counters).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            err.error.to_string(),
            "Certified students cannot exceed enrolled students"
        );
    }
}
