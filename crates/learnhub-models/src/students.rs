//! Student profiles and course enrollments.
//!
//! Enrollments live in a JSONB list on the student row. Each one names its
//! course by public code (`selectedCourse`) and carries the fee plan and the
//! per-lecture attendance map.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use learnhub_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::{ContactRules, EmergencyContact, collapse, invalid, merge_opt};
use crate::validators::staff_phone;

pub const CONTACT_RULES: ContactRules = ContactRules {
    name_max: 100,
    relationship_max: 50,
    phone: staff_phone,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ParentGuardian {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ParentGuardian {
    pub fn merge(self, patch: ParentGuardian) -> ParentGuardian {
        ParentGuardian {
            name: patch.name.or(self.name),
            phone: patch.phone.or(self.phone),
        }
    }
}

/// One attendance entry: a present/absent flag or a free-form status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum AttendanceMark {
    Present(bool),
    Status(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Enrollment {
    /// Public course code (`courses.course_id`)
    pub selected_course: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    #[validate(range(min = 0.0, message = "Fees cannot be negative"))]
    #[serde(deserialize_with = "learnhub_core::serde::flexible_f64")]
    pub total_fees: Option<f64>,
    #[validate(range(min = 0.0, message = "Fees cannot be negative"))]
    #[serde(deserialize_with = "learnhub_core::serde::flexible_f64")]
    pub down_payment: Option<f64>,
    #[validate(range(min = 1, message = "Number of installments must be at least 1"))]
    #[serde(deserialize_with = "learnhub_core::serde::flexible_i64")]
    pub number_of_installments: Option<i64>,
    #[validate(range(min = 0.0, message = "Fees cannot be negative"))]
    #[serde(deserialize_with = "learnhub_core::serde::flexible_f64")]
    pub fee_per_installment: Option<f64>,
    #[validate(range(min = 0.0, message = "Fees cannot be negative"))]
    #[serde(deserialize_with = "learnhub_core::serde::flexible_f64")]
    pub amount_paid: Option<f64>,
    #[serde(deserialize_with = "learnhub_core::serde::flexible_datetime")]
    pub enrolled_date: Option<DateTime<Utc>>,
    /// Payment method
    #[serde(rename = "SubmitFee", alias = "submitFee")]
    pub submit_fee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_payment_method: Option<String>,
    pub attendance: BTreeMap<String, AttendanceMark>,
}

impl Enrollment {
    /// Fills the defaults applied to new enrollments.
    pub fn with_defaults(self, now: DateTime<Utc>) -> Enrollment {
        Enrollment {
            down_payment: self.down_payment.or(Some(0.0)),
            number_of_installments: self.number_of_installments.or(Some(1)),
            fee_per_installment: self.fee_per_installment.or(Some(0.0)),
            amount_paid: self.amount_paid.or(Some(0.0)),
            enrolled_date: self.enrolled_date.or(Some(now)),
            ..self
        }
    }

    pub fn merge(self, patch: Enrollment) -> Enrollment {
        let mut attendance = self.attendance;
        attendance.extend(patch.attendance);
        Enrollment {
            selected_course: patch.selected_course.or(self.selected_course),
            batch: patch.batch.or(self.batch),
            total_fees: patch.total_fees.or(self.total_fees),
            down_payment: patch.down_payment.or(self.down_payment),
            number_of_installments: patch.number_of_installments.or(self.number_of_installments),
            fee_per_installment: patch.fee_per_installment.or(self.fee_per_installment),
            amount_paid: patch.amount_paid.or(self.amount_paid),
            enrolled_date: patch.enrolled_date.or(self.enrolled_date),
            submit_fee: patch.submit_fee.or(self.submit_fee),
            custom_payment_method: patch.custom_payment_method.or(self.custom_payment_method),
            attendance,
        }
    }
}

/// Merges enrollment patches into the stored list. A patch naming a course
/// the student already has updates that entry; one without a course updates
/// the entry at the same position; anything else is appended.
pub fn merge_enrollments(existing: Vec<Enrollment>, patches: Vec<Enrollment>) -> Vec<Enrollment> {
    let mut merged = existing;
    for (position, patch) in patches.into_iter().enumerate() {
        let target = match &patch.selected_course {
            Some(code) => merged
                .iter()
                .position(|e| e.selected_course.as_deref() == Some(code.as_str())),
            None if position < merged.len() => Some(position),
            None => None,
        };
        match target {
            Some(index) => {
                let current = std::mem::take(&mut merged[index]);
                merged[index] = current.merge(patch);
            }
            None => merged.push(patch),
        }
    }
    merged
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub student_id: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub cnic_b_form: String,
    pub address: String,
    pub csr: Option<String>,
    #[schema(value_type = ParentGuardian)]
    pub parent_guardian: Json<ParentGuardian>,
    #[schema(value_type = Vec<Enrollment>)]
    pub courses: Json<Vec<Enrollment>>,
    #[schema(value_type = EmergencyContact)]
    pub emergency_contact: Json<EmergencyContact>,
    pub photo: Option<String>,
    pub student_cnic_b_form: Option<String>,
    pub parent_cnic: Option<String>,
    pub medical_records: Option<String>,
    pub additional_documents: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// Stores an uploaded file path in the slot named by its form field.
    pub fn set_document(&mut self, slot: &str, path: String) -> bool {
        let target = match slot {
            "photo" => &mut self.photo,
            "studentCnicBForm" => &mut self.student_cnic_b_form,
            "parentCnic" => &mut self.parent_cnic,
            "medicalRecords" => &mut self.medical_records,
            "additionalDocuments" => &mut self.additional_documents,
            _ => return false,
        };
        *target = Some(path);
        true
    }

    pub fn enrollment_for(&self, course_code: &str) -> Option<&Enrollment> {
        self.courses
            .iter()
            .find(|e| e.selected_course.as_deref() == Some(course_code))
    }
}

fn complete_guardian(g: &ParentGuardian) -> Result<(), ValidationError> {
    if g.name.is_none() {
        return Err(invalid("Please provide parent/guardian name"));
    }
    if g.phone.is_none() {
        return Err(invalid("Please provide parent/guardian phone"));
    }
    Ok(())
}

fn enrollments(list: &[Enrollment]) -> Result<(), ValidationError> {
    for enrollment in list {
        if enrollment.selected_course.is_none() {
            return Err(invalid("Please select a course"));
        }
        if enrollment.total_fees.is_none() {
            return Err(invalid("Please provide total fees"));
        }
        if enrollment.submit_fee.is_none() {
            return Err(invalid("Please provide payment method"));
        }
        enrollment.validate().map_err(collapse)?;
    }
    Ok(())
}

fn complete_contact(c: &EmergencyContact) -> Result<(), ValidationError> {
    c.check_complete(CONTACT_RULES)
}

fn valid_contact(c: &EmergencyContact) -> Result<(), ValidationError> {
    c.check(CONTACT_RULES)
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentDto {
    #[validate(required(message = "Please provide student ID"))]
    pub student_id: Option<String>,
    #[validate(
        required(message = "Please provide full name"),
        length(min = 2, max = 100, message = "Full name must be between 2 and 100 characters")
    )]
    pub full_name: Option<String>,
    #[validate(required(message = "Please provide date of birth"))]
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_date")]
    pub date_of_birth: Option<NaiveDate>,
    #[validate(required(message = "Please provide gender"))]
    pub gender: Option<String>,
    #[validate(required(message = "Please provide phone number"))]
    pub phone: Option<String>,
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
    #[validate(required(message = "Please provide CNIC/B-Form number"))]
    pub cnic_b_form: Option<String>,
    #[validate(required(message = "Please provide address"))]
    pub address: Option<String>,
    pub csr: Option<String>,
    #[validate(custom(function = "complete_guardian"))]
    pub parent_guardian: Option<ParentGuardian>,
    #[validate(custom(function = "enrollments"))]
    #[serde(default)]
    pub courses: Vec<Enrollment>,
    #[validate(custom(function = "complete_contact"))]
    pub emergency_contact: Option<EmergencyContact>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentDto {
    pub student_id: Option<String>,
    #[validate(length(min = 2, max = 100, message = "Full name must be between 2 and 100 characters"))]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_date")]
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    pub cnic_b_form: Option<String>,
    pub address: Option<String>,
    pub csr: Option<String>,
    pub parent_guardian: Option<ParentGuardian>,
    #[validate(nested)]
    pub courses: Option<Vec<Enrollment>>,
    #[validate(custom(function = "valid_contact"))]
    pub emergency_contact: Option<EmergencyContact>,
}

impl UpdateStudentDto {
    /// Applies the patch over `existing`. The password is handled by the
    /// caller since it must be hashed first.
    pub fn merge_into(self, existing: Student) -> Student {
        let courses = match self.courses {
            Some(patches) => merge_enrollments(existing.courses.0, patches),
            None => existing.courses.0,
        };

        Student {
            student_id: self.student_id.unwrap_or(existing.student_id),
            full_name: self.full_name.unwrap_or(existing.full_name),
            date_of_birth: self.date_of_birth.unwrap_or(existing.date_of_birth),
            gender: self.gender.unwrap_or(existing.gender),
            phone: self.phone.unwrap_or(existing.phone),
            email: self
                .email
                .map(|e| e.trim().to_lowercase())
                .unwrap_or(existing.email),
            cnic_b_form: self.cnic_b_form.unwrap_or(existing.cnic_b_form),
            address: self.address.unwrap_or(existing.address),
            csr: self.csr.or(existing.csr),
            parent_guardian: Json(
                merge_opt(
                    Some(existing.parent_guardian.0),
                    self.parent_guardian,
                    ParentGuardian::merge,
                )
                .unwrap_or_default(),
            ),
            courses: Json(courses),
            emergency_contact: Json(
                merge_opt(
                    Some(existing.emergency_contact.0),
                    self.emergency_contact,
                    EmergencyContact::merge,
                )
                .unwrap_or_default(),
            ),
            ..existing
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StudentFilterParams {
    /// Filter by enrolled course code
    pub course: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub student: Student,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedStudentsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub meta: PaginationMeta,
    pub students: Vec<Student>,
}

/// Contact card returned when listing a course's students.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentBrief {
    pub id: Uuid,
    pub student_id: String,
    pub full_name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StudentsByCourseResponse {
    pub success: bool,
    pub count: usize,
    pub students: Vec<StudentBrief>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn enrollment(code: &str, paid: f64) -> Enrollment {
        Enrollment {
            selected_course: Some(code.to_string()),
            total_fees: Some(50_000.0),
            amount_paid: Some(paid),
            submit_fee: Some("Cash".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_enrollment_accepts_both_fee_method_spellings() {
        let a: Enrollment =
            serde_json::from_value(json!({ "SubmitFee": "Jazz Cash" })).unwrap();
        let b: Enrollment = serde_json::from_value(json!({ "submitFee": "Cash" })).unwrap();
        assert_eq!(a.submit_fee.as_deref(), Some("Jazz Cash"));
        assert_eq!(b.submit_fee.as_deref(), Some("Cash"));

        let value = serde_json::to_value(&a).unwrap();
        assert_eq!(value["SubmitFee"], "Jazz Cash");
    }

    #[test]
    fn test_attendance_marks() {
        let e: Enrollment = serde_json::from_value(json!({
            "attendance": { "Lecture 1": true, "Lecture 2": "Late" }
        }))
        .unwrap();
        assert_eq!(e.attendance["Lecture 1"], AttendanceMark::Present(true));
        assert_eq!(
            e.attendance["Lecture 2"],
            AttendanceMark::Status("Late".into())
        );
    }

    #[test]
    fn test_defaults_for_new_enrollments() {
        let now = Utc::now();
        let e = Enrollment::default().with_defaults(now);
        assert_eq!(e.down_payment, Some(0.0));
        assert_eq!(e.number_of_installments, Some(1));
        assert_eq!(e.enrolled_date, Some(now));
    }

    #[test]
    fn test_merge_enrollments_by_code_position_and_append() {
        let existing = vec![enrollment("WEB-101", 1000.0), enrollment("DS-200", 0.0)];
        let patches = vec![
            Enrollment {
                selected_course: Some("DS-200".into()),
                amount_paid: Some(2500.0),
                ..Default::default()
            },
            Enrollment {
                batch: Some("B-7".into()),
                ..Default::default()
            },
            enrollment("AI-300", 0.0),
        ];

        let merged = merge_enrollments(existing, patches);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[1].amount_paid, Some(2500.0));
        assert_eq!(merged[1].total_fees, Some(50_000.0));
        assert_eq!(merged[1].batch.as_deref(), Some("B-7"));
        assert_eq!(merged[0].amount_paid, Some(1000.0));
        assert_eq!(merged[2].selected_course.as_deref(), Some("AI-300"));
    }

    #[test]
    fn test_create_requires_enrollment_fields() {
        let dto: CreateStudentDto = serde_json::from_value(json!({
            "studentId": "S-1",
            "fullName": "Bilal Ahmed",
            "dateOfBirth": "2004-03-02",
            "gender": "Male",
            "phone": "03001234567",
            "email": "bilal@learnhub.dev",
            "password": "secret1",
            "cnicBForm": "3520212345671",
            "address": "Lahore",
            "courses": [{ "selectedCourse": "WEB-101", "SubmitFee": "Cash" }]
        }))
        .unwrap();
        let message =
            learnhub_core::errors::format_validation_errors(&dto.validate().unwrap_err());
        assert_eq!(message, "Please provide total fees");
    }
}
