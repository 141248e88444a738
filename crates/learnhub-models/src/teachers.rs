//! Teacher profiles.
//!
//! A teacher owns its qualification, course assignment, emergency contact
//! and document slots as JSONB sub-records. Creating one also creates a
//! paired [`Account`](crate::auth::Account) with role `teacher`.

use chrono::{DateTime, NaiveDate, Utc};
use learnhub_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::{
    ContactRules, EmergencyContact, EmploymentStatus, Gender, collapse, invalid, merge_opt,
};
use crate::validators::{teacher_cnic, teacher_phone, validate_passing_year};

pub const CONTACT_RULES: ContactRules = ContactRules {
    name_max: 100,
    relationship_max: 50,
    phone: teacher_phone,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Qualification {
    #[validate(length(max = 100, message = "Degree cannot exceed 100 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[validate(length(max = 150, message = "Institute name cannot exceed 150 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institute: Option<String>,
    #[validate(custom(function = "validate_passing_year"))]
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "learnhub_core::serde::flexible_i64"
    )]
    pub passing_year: Option<i64>,
    #[validate(range(min = 0.0, max = 4.0, message = "CGPA must be between 0 and 4"))]
    #[serde(
        rename = "obtainedCGPA",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "learnhub_core::serde::flexible_f64"
    )]
    pub obtained_cgpa: Option<f64>,
}

impl Qualification {
    pub fn merge(self, patch: Qualification) -> Qualification {
        Qualification {
            degree: patch.degree.or(self.degree),
            institute: patch.institute.or(self.institute),
            passing_year: patch.passing_year.or(self.passing_year),
            obtained_cgpa: patch.obtained_cgpa.or(self.obtained_cgpa),
        }
    }
}

/// Course and designation a teacher is hired for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct CourseAssignment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_course: Option<String>,
    #[validate(length(max = 100, message = "Designation cannot exceed 100 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "learnhub_core::serde::flexible_date"
    )]
    pub date_of_joining: Option<NaiveDate>,
}

impl CourseAssignment {
    pub fn merge(self, patch: CourseAssignment) -> CourseAssignment {
        CourseAssignment {
            selected_course: patch.selected_course.or(self.selected_course),
            designation: patch.designation.or(self.designation),
            date_of_joining: patch.date_of_joining.or(self.date_of_joining),
        }
    }
}

/// Stored public paths of uploaded teacher documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct TeacherDocuments {
    pub cnic_document: Option<String>,
    pub degree_document: Option<String>,
    pub cv_document: Option<String>,
    pub medical_records: Option<String>,
    pub additional_documents: Option<String>,
}

impl TeacherDocuments {
    pub fn merge(self, patch: TeacherDocuments) -> TeacherDocuments {
        TeacherDocuments {
            cnic_document: patch.cnic_document.or(self.cnic_document),
            degree_document: patch.degree_document.or(self.degree_document),
            cv_document: patch.cv_document.or(self.cv_document),
            medical_records: patch.medical_records.or(self.medical_records),
            additional_documents: patch.additional_documents.or(self.additional_documents),
        }
    }

    /// Sets the slot named by its multipart field name.
    pub fn set(&mut self, slot: &str, path: String) -> bool {
        let target = match slot {
            "cnicDocument" => &mut self.cnic_document,
            "degreeDocument" => &mut self.degree_document,
            "cvDocument" => &mut self.cv_document,
            "medicalRecords" => &mut self.medical_records,
            "additionalDocuments" => &mut self.additional_documents,
            _ => return false,
        };
        *target = Some(path);
        true
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: Uuid,
    pub teacher_id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// Generated column: `first_name || ' ' || last_name`.
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    #[sqlx(try_from = "String")]
    pub gender: Gender,
    pub phone: String,
    pub cnic: String,
    pub address: String,
    pub photo: Option<String>,
    #[schema(value_type = Qualification)]
    pub qualification: Json<Qualification>,
    #[serde(rename = "unassignedCourses")]
    #[schema(value_type = CourseAssignment)]
    pub unassigned_courses: Json<CourseAssignment>,
    #[schema(value_type = EmergencyContact)]
    pub emergency_contact: Json<EmergencyContact>,
    #[schema(value_type = TeacherDocuments)]
    pub related_documents: Json<TeacherDocuments>,
    #[sqlx(try_from = "String")]
    pub status: EmploymentStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn complete_qualification(q: &Qualification) -> Result<(), ValidationError> {
    if q.degree.is_none() {
        return Err(invalid("Please provide degree"));
    }
    if q.institute.is_none() {
        return Err(invalid("Please provide institute name"));
    }
    if q.passing_year.is_none() {
        return Err(invalid("Please provide passing year"));
    }
    if q.obtained_cgpa.is_none() {
        return Err(invalid("Please provide obtained CGPA"));
    }
    q.validate().map_err(collapse)
}

fn complete_assignment(a: &CourseAssignment) -> Result<(), ValidationError> {
    if a.selected_course.is_none() {
        return Err(invalid("Please select a course"));
    }
    if a.designation.is_none() {
        return Err(invalid("Please provide designation"));
    }
    if a.date_of_joining.is_none() {
        return Err(invalid("Please provide date of joining"));
    }
    a.validate().map_err(collapse)
}

fn complete_contact(c: &EmergencyContact) -> Result<(), ValidationError> {
    c.check_complete(CONTACT_RULES)
}

fn valid_contact(c: &EmergencyContact) -> Result<(), ValidationError> {
    c.check(CONTACT_RULES)
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    teacher_phone(value)
}

fn validate_cnic(value: &str) -> Result<(), ValidationError> {
    teacher_cnic(value)
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeacherDto {
    #[validate(required(message = "Please provide teacher ID"))]
    pub teacher_id: Option<String>,
    #[validate(
        required(message = "Please provide email"),
        email(message = "Please provide a valid email")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "Please provide password"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: Option<String>,
    #[validate(
        required(message = "Please provide first name"),
        length(min = 2, max = 50, message = "First name must be between 2 and 50 characters")
    )]
    pub first_name: Option<String>,
    #[validate(
        required(message = "Please provide last name"),
        length(min = 2, max = 50, message = "Last name must be between 2 and 50 characters")
    )]
    pub last_name: Option<String>,
    #[validate(required(message = "Please provide date of birth"))]
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_date")]
    pub date_of_birth: Option<NaiveDate>,
    #[validate(required(message = "Please provide gender"))]
    pub gender: Option<Gender>,
    #[validate(
        required(message = "Please provide phone number"),
        custom(function = "validate_phone")
    )]
    pub phone: Option<String>,
    #[validate(
        required(message = "Please provide CNIC number"),
        custom(function = "validate_cnic")
    )]
    pub cnic: Option<String>,
    #[validate(
        required(message = "Please provide address"),
        length(max = 200, message = "Address cannot exceed 200 characters")
    )]
    pub address: Option<String>,
    #[validate(
        required(message = "Please provide qualification"),
        custom(function = "complete_qualification")
    )]
    pub qualification: Option<Qualification>,
    #[validate(
        required(message = "Please provide course assignment"),
        custom(function = "complete_assignment")
    )]
    pub unassigned_courses: Option<CourseAssignment>,
    #[validate(
        required(message = "Please provide emergency contact"),
        custom(function = "complete_contact")
    )]
    pub emergency_contact: Option<EmergencyContact>,
    pub status: Option<EmploymentStatus>,
}

/// Partial teacher update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeacherDto {
    pub teacher_id: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    #[validate(length(min = 2, max = 50, message = "First name must be between 2 and 50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 2, max = 50, message = "Last name must be between 2 and 50 characters"))]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_date")]
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    #[validate(custom(function = "validate_cnic"))]
    pub cnic: Option<String>,
    #[validate(length(max = 200, message = "Address cannot exceed 200 characters"))]
    pub address: Option<String>,
    #[validate(nested)]
    pub qualification: Option<Qualification>,
    #[validate(nested)]
    pub unassigned_courses: Option<CourseAssignment>,
    #[validate(custom(function = "valid_contact"))]
    pub emergency_contact: Option<EmergencyContact>,
    pub status: Option<EmploymentStatus>,
}

impl UpdateTeacherDto {
    /// Keeps only the fields a teacher may change on their own profile.
    pub fn self_service(self) -> UpdateTeacherDto {
        UpdateTeacherDto {
            phone: self.phone,
            address: self.address,
            emergency_contact: self.emergency_contact,
            ..Default::default()
        }
    }

    /// Applies the patch over `existing`, returning the merged record.
    pub fn merge_into(self, existing: Teacher) -> Teacher {
        Teacher {
            teacher_id: self.teacher_id.unwrap_or(existing.teacher_id),
            email: self
                .email
                .map(|e| e.trim().to_lowercase())
                .unwrap_or(existing.email),
            first_name: self.first_name.unwrap_or(existing.first_name),
            last_name: self.last_name.unwrap_or(existing.last_name),
            date_of_birth: self.date_of_birth.unwrap_or(existing.date_of_birth),
            gender: self.gender.unwrap_or(existing.gender),
            phone: self.phone.unwrap_or(existing.phone),
            cnic: self.cnic.unwrap_or(existing.cnic),
            address: self.address.unwrap_or(existing.address),
            qualification: Json(match self.qualification {
                Some(patch) => existing.qualification.0.merge(patch),
                None => existing.qualification.0,
            }),
            unassigned_courses: Json(match self.unassigned_courses {
                Some(patch) => existing.unassigned_courses.0.merge(patch),
                None => existing.unassigned_courses.0,
            }),
            emergency_contact: Json(
                merge_opt(
                    Some(existing.emergency_contact.0),
                    self.emergency_contact,
                    EmergencyContact::merge,
                )
                .unwrap_or_default(),
            ),
            status: self.status.unwrap_or(existing.status),
            ..existing
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TeacherFilterParams {
    /// Filter by employment status (e.g. `Active`, `On Leave`)
    pub status: Option<String>,
    /// Filter by assigned course
    pub course: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeacherResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub teacher: Teacher,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedTeachersResponse {
    pub success: bool,
    #[serde(flatten)]
    pub meta: PaginationMeta,
    pub teachers: Vec<Teacher>,
}

/// Dropdown entry for picking a course instructor.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstructorOption {
    pub id: Uuid,
    pub teacher_id: String,
    pub name: String,
    pub email: String,
    pub full_display: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InstructorsListResponse {
    pub success: bool,
    pub count: usize,
    pub instructors: Vec<InstructorOption>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseWiseCount {
    pub selected_course: Option<String>,
    pub count: i64,
    pub designations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QualificationWiseCount {
    pub degree: Option<String>,
    pub count: i64,
    #[serde(rename = "avgCGPA")]
    pub avg_cgpa: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub on_leave: i64,
    pub terminated: i64,
    pub course_wise: Vec<CourseWiseCount>,
    pub qualification_wise: Vec<QualificationWiseCount>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TeacherStatsResponse {
    pub success: bool,
    #[serde(rename = "statistics")]
    pub stats: TeacherStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_payload() -> serde_json::Value {
        json!({
            "teacherId": "T-001",
            "email": "Sara@LearnHub.dev",
            "password": "secret1",
            "firstName": "Sara",
            "lastName": "Khan",
            "dateOfBirth": "1990-05-01",
            "gender": "Female",
            "phone": "03001234567",
            "cnic": "3520212345671",
            "address": "12 Mall Road",
            "qualification": {
                "degree": "MSc",
                "institute": "PU",
                "passingYear": "2015",
                "obtainedCGPA": "3.4"
            },
            "unassignedCourses": {
                "selectedCourse": "Web Development",
                "designation": "Lecturer",
                "dateOfJoining": "2024-01-10"
            },
            "emergencyContact": {
                "name": "Ali",
                "relationship": "Brother",
                "phoneNumber": "03007654321"
            }
        })
    }

    fn sample_teacher() -> Teacher {
        let now = Utc::now();
        Teacher {
            id: Uuid::new_v4(),
            teacher_id: "T-001".into(),
            email: "sara@learnhub.dev".into(),
            password: "hash".into(),
            first_name: "Sara".into(),
            last_name: "Khan".into(),
            full_name: "Sara Khan".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
            gender: Gender::Female,
            phone: "03001234567".into(),
            cnic: "3520212345671".into(),
            address: "12 Mall Road".into(),
            photo: None,
            qualification: Json(Qualification {
                degree: Some("MSc".into()),
                institute: Some("PU".into()),
                passing_year: Some(2015),
                obtained_cgpa: Some(3.4),
            }),
            unassigned_courses: Json(CourseAssignment::default()),
            emergency_contact: Json(EmergencyContact {
                name: Some("Ali".into()),
                relationship: Some("Brother".into()),
                phone_number: Some("03007654321".into()),
            }),
            related_documents: Json(TeacherDocuments::default()),
            status: EmploymentStatus::Active,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_create_accepts_form_style_scalars() {
        let dto: CreateTeacherDto = serde_json::from_value(valid_payload()).unwrap();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.qualification.unwrap().passing_year, Some(2015));
    }

    #[test]
    fn test_create_reports_missing_nested_fields() {
        let mut payload = valid_payload();
        payload["qualification"]
            .as_object_mut()
            .unwrap()
            .remove("degree");
        let dto: CreateTeacherDto = serde_json::from_value(payload).unwrap();
        let errors = dto.validate().unwrap_err();
        let message = learnhub_core::errors::format_validation_errors(&errors);
        assert_eq!(message, "Please provide degree");
    }

    #[test]
    fn test_create_rejects_bad_cnic_and_cgpa() {
        let mut payload = valid_payload();
        payload["cnic"] = json!("35202-1234567-1");
        payload["qualification"]["obtainedCGPA"] = json!(4.5);
        let dto: CreateTeacherDto = serde_json::from_value(payload).unwrap();
        let message = learnhub_core::errors::format_validation_errors(&dto.validate().unwrap_err());
        assert!(message.contains("CNIC"));
        assert!(message.contains("CGPA must be between 0 and 4"));
    }

    #[test]
    fn test_create_rejects_passing_year_before_1950() {
        let mut payload = valid_payload();
        payload["qualification"]["passingYear"] = json!("1949");
        let dto: CreateTeacherDto = serde_json::from_value(payload).unwrap();
        let message = learnhub_core::errors::format_validation_errors(&dto.validate().unwrap_err());
        assert_eq!(
            message,
            "Passing year must be between 1950 and the current year"
        );
    }

    #[test]
    fn test_self_service_drops_privileged_fields() {
        let dto: UpdateTeacherDto = serde_json::from_value(json!({
            "phone": "03110000000",
            "status": "Terminated",
            "email": "other@learnhub.dev"
        }))
        .unwrap();
        let dto = dto.self_service();
        assert_eq!(dto.phone.as_deref(), Some("03110000000"));
        assert!(dto.status.is_none());
        assert!(dto.email.is_none());
    }

    #[test]
    fn test_merge_keeps_absent_fields() {
        let dto: UpdateTeacherDto = serde_json::from_value(json!({
            "qualification": { "degree": "PhD" },
            "emergencyContact": { "phoneNumber": "03111111111" }
        }))
        .unwrap();
        let merged = dto.merge_into(sample_teacher());

        assert_eq!(merged.first_name, "Sara");
        assert_eq!(merged.qualification.degree.as_deref(), Some("PhD"));
        assert_eq!(merged.qualification.passing_year, Some(2015));
        assert_eq!(merged.emergency_contact.name.as_deref(), Some("Ali"));
        assert_eq!(
            merged.emergency_contact.phone_number.as_deref(),
            Some("03111111111")
        );
    }

    #[test]
    fn test_documents_slot_setter() {
        let mut docs = TeacherDocuments::default();
        assert!(docs.set("cvDocument", "/uploads/teachers/cv.pdf".into()));
        assert!(!docs.set("photo", "/uploads/teachers/p.png".into()));
        assert_eq!(docs.cv_document.as_deref(), Some("/uploads/teachers/cv.pdf"));
    }
}
