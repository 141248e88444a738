//! Courses, their counter invariants and derived percentages.

use chrono::{DateTime, Utc};
use learnhub_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::text_enum;
use crate::validators::teacher_phone;

text_enum! {
    CourseStatus {
        Active => "Active",
        Inactive => "Inactive",
        Completed => "Completed",
        Upcoming => "Upcoming",
    }
}

impl Default for CourseStatus {
    fn default() -> Self {
        CourseStatus::Active
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub course_id: String,
    pub course_name: String,
    pub duration: String,
    pub course_image: Option<String>,
    pub no_of_students_enrolled: i64,
    pub certified_students: i64,
    pub freezed_students: i64,
    pub total_lectures: i64,
    pub lectures_delivered: i64,
    /// `None` once the instructing teacher has been deleted.
    pub instructor_id: Option<Uuid>,
    pub instructor_name: String,
    pub instructor_email: String,
    pub phone_number: String,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub status: CourseStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn counters(&self) -> CourseCounters {
        CourseCounters {
            enrolled: self.no_of_students_enrolled,
            certified: self.certified_students,
            freezed: self.freezed_students,
            total_lectures: self.total_lectures,
            delivered: self.lectures_delivered,
        }
    }
}

/// Upper bound on `totalLectures`; the attendance sheet holds one column per
/// lecture.
pub const MAX_TOTAL_LECTURES: i64 = 1000;

/// Percentage with two decimals, `"0"` when the denominator is zero.
pub fn percentage(part: i64, whole: i64) -> String {
    if whole == 0 {
        "0".to_string()
    } else {
        format!("{:.2}", part as f64 / whole as f64 * 100.0)
    }
}

/// Numeric fields of a course, checked together after every merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourseCounters {
    pub enrolled: i64,
    pub certified: i64,
    pub freezed: i64,
    pub total_lectures: i64,
    pub delivered: i64,
}

impl CourseCounters {
    pub fn check(&self) -> Result<(), &'static str> {
        if [
            self.enrolled,
            self.certified,
            self.freezed,
            self.total_lectures,
            self.delivered,
        ]
        .iter()
        .any(|v| *v < 0)
        {
            return Err("Course counters cannot be negative");
        }
        if self.total_lectures > MAX_TOTAL_LECTURES {
            return Err("Total lectures cannot exceed 1000");
        }
        if self.certified > self.enrolled {
            return Err("Certified students cannot exceed enrolled students");
        }
        if self.freezed > self.enrolled {
            return Err("Freezed students cannot exceed enrolled students");
        }
        if self.delivered > self.total_lectures {
            return Err("Lectures delivered cannot exceed total lectures");
        }
        Ok(())
    }

    pub fn certification_rate(&self) -> String {
        percentage(self.certified, self.enrolled)
    }

    pub fn lecture_progress(&self) -> String {
        percentage(self.delivered, self.total_lectures)
    }
}

/// Instructor fields embedded in course responses.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstructorSummary {
    pub id: Uuid,
    pub teacher_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub status: String,
}

/// A course as returned by the API: the stored row, its instructor and the
/// derived percentages.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    #[serde(flatten)]
    pub course: Course,
    pub instructor: Option<InstructorSummary>,
    pub certification_rate: String,
    pub lecture_progress: String,
}

impl CourseView {
    pub fn new(course: Course, instructor: Option<InstructorSummary>) -> Self {
        let counters = course.counters();
        Self {
            course,
            instructor,
            certification_rate: counters.certification_rate(),
            lecture_progress: counters.lecture_progress(),
        }
    }
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    teacher_phone(value)
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseDto {
    #[validate(required(message = "Please provide course ID"))]
    pub course_id: Option<String>,
    #[validate(
        required(message = "Please provide course name"),
        length(min = 3, max = 150, message = "Course name must be between 3 and 150 characters")
    )]
    pub course_name: Option<String>,
    #[validate(required(message = "Please provide course duration"))]
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_i64")]
    pub no_of_students_enrolled: Option<i64>,
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_i64")]
    pub certified_students: Option<i64>,
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_i64")]
    pub freezed_students: Option<i64>,
    #[validate(
        required(message = "Please provide total number of lectures"),
        range(max = 1000, message = "Total lectures cannot exceed 1000")
    )]
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_i64")]
    pub total_lectures: Option<i64>,
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_i64")]
    pub lectures_delivered: Option<i64>,
    #[validate(
        required(message = "Instructor email is required"),
        email(message = "Please provide a valid email")
    )]
    pub instructor_email: Option<String>,
    /// Defaults to the instructor's phone.
    #[validate(custom(function = "validate_phone"))]
    pub phone_number: Option<String>,
    #[validate(
        required(message = "Please provide course description"),
        length(max = 1000, message = "Description cannot exceed 1000 characters")
    )]
    pub description: Option<String>,
    pub status: Option<CourseStatus>,
}

impl CreateCourseDto {
    pub fn counters(&self) -> CourseCounters {
        CourseCounters {
            enrolled: self.no_of_students_enrolled.unwrap_or(0),
            certified: self.certified_students.unwrap_or(0),
            freezed: self.freezed_students.unwrap_or(0),
            total_lectures: self.total_lectures.unwrap_or(0),
            delivered: self.lectures_delivered.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseDto {
    pub course_id: Option<String>,
    #[validate(length(min = 3, max = 150, message = "Course name must be between 3 and 150 characters"))]
    pub course_name: Option<String>,
    pub duration: Option<String>,
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_i64")]
    pub no_of_students_enrolled: Option<i64>,
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_i64")]
    pub certified_students: Option<i64>,
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_i64")]
    pub freezed_students: Option<i64>,
    #[validate(range(max = 1000, message = "Total lectures cannot exceed 1000"))]
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_i64")]
    pub total_lectures: Option<i64>,
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_i64")]
    pub lectures_delivered: Option<i64>,
    /// Reassigns the course to the active teacher with this email.
    #[validate(email(message = "Please provide a valid email"))]
    pub instructor_email: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone_number: Option<String>,
    #[validate(length(max = 1000, message = "Description cannot exceed 1000 characters"))]
    pub description: Option<String>,
    pub status: Option<CourseStatus>,
}

impl UpdateCourseDto {
    /// Counters after applying this patch over `existing`.
    pub fn counters_over(&self, existing: &CourseCounters) -> CourseCounters {
        CourseCounters {
            enrolled: self.no_of_students_enrolled.unwrap_or(existing.enrolled),
            certified: self.certified_students.unwrap_or(existing.certified),
            freezed: self.freezed_students.unwrap_or(existing.freezed),
            total_lectures: self.total_lectures.unwrap_or(existing.total_lectures),
            delivered: self.lectures_delivered.unwrap_or(existing.delivered),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseFilterParams {
    pub status: Option<String>,
    /// Filter by instructor id
    #[serde(default, deserialize_with = "learnhub_core::serde::deserialize_optional_uuid")]
    pub instructor: Option<Uuid>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub course: CourseView,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedCoursesResponse {
    pub success: bool,
    #[serde(flatten)]
    pub meta: PaginationMeta,
    pub courses: Vec<CourseView>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct CoursesByStatus {
    pub active: i64,
    pub completed: i64,
    pub upcoming: i64,
    pub inactive: i64,
}

#[derive(Debug, Clone, Default, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentTotals {
    pub total_enrolled: i64,
    pub total_certified: i64,
    pub total_freezed: i64,
}

#[derive(Debug, Clone, Default, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LectureTotals {
    pub total_lectures: i64,
    pub total_delivered: i64,
    pub avg_progress: f64,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstructorCourseCount {
    pub instructor_id: Uuid,
    pub course_count: i64,
    pub total_students: i64,
    pub instructor_name: String,
    pub instructor_email: String,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseStats {
    pub total_courses: i64,
    pub courses_by_status: CoursesByStatus,
    pub students: StudentTotals,
    pub lectures: LectureTotals,
    pub instructors: Vec<InstructorCourseCount>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CourseStatsResponse {
    pub success: bool,
    pub statistics: CourseStats,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MyCoursesSummary {
    pub total_courses: usize,
    pub active_courses: usize,
    pub total_students: i64,
    pub total_certified: i64,
    pub total_lectures: i64,
    pub lectures_delivered: i64,
}

impl MyCoursesSummary {
    pub fn from_courses(courses: &[CourseView]) -> Self {
        courses.iter().fold(
            MyCoursesSummary {
                total_courses: courses.len(),
                ..Default::default()
            },
            |mut acc, view| {
                let c = &view.course;
                if c.status == CourseStatus::Active {
                    acc.active_courses += 1;
                }
                acc.total_students += c.no_of_students_enrolled;
                acc.total_certified += c.certified_students;
                acc.total_lectures += c.total_lectures;
                acc.lectures_delivered += c.lectures_delivered;
                acc
            },
        )
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MyCoursesResponse {
    pub success: bool,
    pub message: String,
    pub count: usize,
    pub statistics: MyCoursesSummary,
    pub courses: Vec<CourseView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn course(enrolled: i64, certified: i64, total: i64, delivered: i64) -> Course {
        let now = Utc::now();
        Course {
            id: Uuid::new_v4(),
            course_id: "WEB-101".into(),
            course_name: "Web Development".into(),
            duration: "3 months".into(),
            course_image: None,
            no_of_students_enrolled: enrolled,
            certified_students: certified,
            freezed_students: 0,
            total_lectures: total,
            lectures_delivered: delivered,
            instructor_id: Some(Uuid::new_v4()),
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
    fn test_counter_invariants() {
        let ok = CourseCounters {
            enrolled: 10,
            certified: 8,
            freezed: 2,
            total_lectures: 30,
            delivered: 12,
        };
        assert!(ok.check().is_ok());

        let too_many_certified = CourseCounters {
            certified: 15,
            ..ok
        };
        assert_eq!(
            too_many_certified.check(),
            Err("Certified students cannot exceed enrolled students")
        );

        let too_many_freezed = CourseCounters { freezed: 11, ..ok };
        assert!(too_many_freezed.check().is_err());

        let over_delivered = CourseCounters {
            delivered: 31,
            ..ok
        };
        assert_eq!(
            over_delivered.check(),
            Err("Lectures delivered cannot exceed total lectures")
        );

        let negative = CourseCounters { enrolled: -1, certified: -2, ..ok };
        assert!(negative.check().is_err());

        let at_cap = CourseCounters {
            total_lectures: MAX_TOTAL_LECTURES,
            ..ok
        };
        assert!(at_cap.check().is_ok());

        let over_cap = CourseCounters {
            total_lectures: 9_000_000_000_000_000_000,
            ..ok
        };
        assert_eq!(over_cap.check(), Err("Total lectures cannot exceed 1000"));
    }

    #[test]
    fn test_total_lectures_cap_on_payloads() {
        let dto: CreateCourseDto = serde_json::from_value(json!({
            "courseId": "WEB-101",
            "courseName": "Web Development",
            "duration": "3 months",
            "totalLectures": "9000000000000000000",
            "instructorEmail": "sara@learnhub.dev",
            "description": "Intro"
        }))
        .unwrap();
        let message =
            learnhub_core::errors::format_validation_errors(&dto.validate().unwrap_err());
        assert_eq!(message, "Total lectures cannot exceed 1000");

        let dto: UpdateCourseDto =
            serde_json::from_value(json!({ "totalLectures": 1001 })).unwrap();
        assert!(dto.validate().is_err());

        let dto: UpdateCourseDto =
            serde_json::from_value(json!({ "totalLectures": 1000 })).unwrap();
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_percentages() {
        assert_eq!(percentage(8, 10), "80.00");
        assert_eq!(percentage(1, 3), "33.33");
        assert_eq!(percentage(5, 0), "0");
    }

    #[test]
    fn test_update_counters_merge_with_existing() {
        let stored = course(10, 5, 20, 10).counters();
        let dto: UpdateCourseDto =
            serde_json::from_value(json!({ "certifiedStudents": "12" })).unwrap();
        let merged = dto.counters_over(&stored);
        assert_eq!(merged.enrolled, 10);
        assert_eq!(merged.certified, 12);
        assert!(merged.check().is_err());

        let dto: UpdateCourseDto = serde_json::from_value(
            json!({ "noOfStudentsEnrolled": 20, "certifiedStudents": 12 }),
        )
        .unwrap();
        assert!(dto.counters_over(&stored).check().is_ok());
    }

    #[test]
    fn test_create_counters_default_to_zero() {
        let dto: CreateCourseDto = serde_json::from_value(json!({
            "courseId": "WEB-101",
            "courseName": "Web Development",
            "duration": "3 months",
            "totalLectures": "24",
            "instructorEmail": "sara@learnhub.dev",
            "description": "Intro"
        }))
        .unwrap();
        assert!(dto.validate().is_ok());
        let counters = dto.counters();
        assert_eq!(counters.total_lectures, 24);
        assert_eq!(counters.enrolled, 0);
        assert!(counters.check().is_ok());
    }

    #[test]
    fn test_view_serializes_derived_fields() {
        let view = CourseView::new(course(10, 8, 0, 0), None);
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["certificationRate"], "80.00");
        assert_eq!(value["lectureProgress"], "0");
        assert_eq!(value["courseId"], "WEB-101");
        assert_eq!(value["status"], "Active");
    }

    #[test]
    fn test_my_courses_summary() {
        let mut inactive = course(4, 1, 10, 3);
        inactive.status = CourseStatus::Inactive;
        let views = vec![
            CourseView::new(course(10, 8, 20, 5), None),
            CourseView::new(inactive, None),
        ];
        let summary = MyCoursesSummary::from_courses(&views);
        assert_eq!(summary.total_courses, 2);
        assert_eq!(summary.active_courses, 1);
        assert_eq!(summary.total_students, 14);
        assert_eq!(summary.lectures_delivered, 8);
    }
}
