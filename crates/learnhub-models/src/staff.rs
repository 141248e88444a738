//! Staff profiles and their authorities matrix.

use chrono::{DateTime, NaiveDate, Utc};
use learnhub_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::authorities::{Authorities, AuthoritiesPatch};
use crate::common::{
    ContactRules, EmergencyContact, EmploymentStatus, Gender, collapse, invalid, merge_opt,
};
use crate::validators::{staff_cnic, staff_phone, validate_passing_year};

pub const CONTACT_RULES: ContactRules = ContactRules {
    name_max: 50,
    relationship_max: 30,
    phone: staff_phone,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct StaffQualification {
    #[validate(length(max = 100, message = "Education cannot exceed 100 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[validate(length(max = 100, message = "Institute name cannot exceed 100 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub institute: Option<String>,
    #[validate(custom(function = "validate_passing_year"))]
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "learnhub_core::serde::flexible_i64"
    )]
    pub year_of_passing: Option<i64>,
    #[validate(length(max = 50, message = "Designation cannot exceed 50 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
}

impl StaffQualification {
    pub fn merge(self, patch: StaffQualification) -> StaffQualification {
        StaffQualification {
            education: patch.education.or(self.education),
            institute: patch.institute.or(self.institute),
            year_of_passing: patch.year_of_passing.or(self.year_of_passing),
            designation: patch.designation.or(self.designation),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct StaffDocuments {
    pub cnic_document: Option<String>,
    pub medical_records: Option<String>,
    pub additional_documents: Option<String>,
}

impl StaffDocuments {
    pub fn merge(self, patch: StaffDocuments) -> StaffDocuments {
        StaffDocuments {
            cnic_document: patch.cnic_document.or(self.cnic_document),
            medical_records: patch.medical_records.or(self.medical_records),
            additional_documents: patch.additional_documents.or(self.additional_documents),
        }
    }

    pub fn set(&mut self, slot: &str, path: String) -> bool {
        let target = match slot {
            "cnicDocument" => &mut self.cnic_document,
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
pub struct Staff {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    #[sqlx(try_from = "String")]
    pub gender: Gender,
    pub phone: String,
    pub cnic: String,
    pub address: String,
    #[schema(value_type = StaffQualification)]
    pub qualification: Json<StaffQualification>,
    #[schema(value_type = EmergencyContact)]
    pub emergency_contact: Json<EmergencyContact>,
    #[schema(value_type = Authorities)]
    pub authorities: Json<Authorities>,
    #[schema(value_type = StaffDocuments)]
    pub related_documents: Json<StaffDocuments>,
    #[sqlx(try_from = "String")]
    pub status: EmploymentStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn complete_qualification(q: &StaffQualification) -> Result<(), ValidationError> {
    if q.education.is_none() {
        return Err(invalid("Please provide education"));
    }
    if q.institute.is_none() {
        return Err(invalid("Please provide institute name"));
    }
    if q.year_of_passing.is_none() {
        return Err(invalid("Please provide year of passing"));
    }
    if q.designation.is_none() {
        return Err(invalid("Please provide designation"));
    }
    q.validate().map_err(collapse)
}

fn complete_contact(c: &EmergencyContact) -> Result<(), ValidationError> {
    c.check_complete(CONTACT_RULES)
}

fn valid_contact(c: &EmergencyContact) -> Result<(), ValidationError> {
    c.check(CONTACT_RULES)
}

fn validate_phone(value: &str) -> Result<(), ValidationError> {
    staff_phone(value)
}

fn validate_cnic(value: &str) -> Result<(), ValidationError> {
    staff_cnic(value)
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStaffDto {
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
        length(min = 1, max = 50, message = "First name cannot exceed 50 characters")
    )]
    pub first_name: Option<String>,
    #[validate(
        required(message = "Please provide last name"),
        length(min = 1, max = 50, message = "Last name cannot exceed 50 characters")
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
        required(message = "Please provide CNIC"),
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
    pub qualification: Option<StaffQualification>,
    #[validate(
        required(message = "Please provide emergency contact"),
        custom(function = "complete_contact")
    )]
    pub emergency_contact: Option<EmergencyContact>,
    /// Missing modules and flags default to `false`.
    #[serde(default)]
    pub authorities: AuthoritiesPatch,
    pub status: Option<EmploymentStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStaffDto {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    #[validate(length(min = 1, max = 50, message = "First name cannot exceed 50 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Last name cannot exceed 50 characters"))]
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
    pub qualification: Option<StaffQualification>,
    #[validate(custom(function = "valid_contact"))]
    pub emergency_contact: Option<EmergencyContact>,
    pub authorities: Option<AuthoritiesPatch>,
    pub status: Option<EmploymentStatus>,
}

impl UpdateStaffDto {
    /// Keeps only the fields a staff member may change on their own profile.
    pub fn self_service(self) -> UpdateStaffDto {
        UpdateStaffDto {
            phone: self.phone,
            address: self.address,
            emergency_contact: self.emergency_contact,
            ..Default::default()
        }
    }

    pub fn merge_into(self, existing: Staff) -> Staff {
        let authorities = match self.authorities {
            Some(patch) => patch.merge_into(existing.authorities.0.clone()),
            None => existing.authorities.0.clone(),
        };

        Staff {
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
            emergency_contact: Json(
                merge_opt(
                    Some(existing.emergency_contact.0),
                    self.emergency_contact,
                    EmergencyContact::merge,
                )
                .unwrap_or_default(),
            ),
            authorities: Json(authorities),
            status: self.status.unwrap_or(existing.status),
            ..existing
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StaffFilterParams {
    pub status: Option<String>,
    /// Filter by `qualification.designation`
    pub designation: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StaffResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub staff: Staff,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedStaffResponse {
    pub success: bool,
    #[serde(flatten)]
    pub meta: PaginationMeta,
    pub staff: Vec<Staff>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct GroupCount {
    #[serde(rename = "_id")]
    pub key: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub on_leave: i64,
    pub terminated: i64,
    pub designation_wise: Vec<GroupCount>,
    pub education_wise: Vec<GroupCount>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StaffStatsResponse {
    pub success: bool,
    #[serde(rename = "statistics")]
    pub stats: StaffStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorities::{Action, Module};
    use serde_json::json;

    fn payload() -> serde_json::Value {
        json!({
            "email": "ops@learnhub.dev",
            "password": "secret1",
            "firstName": "Omar",
            "lastName": "Raza",
            "dateOfBirth": "1988-02-11",
            "gender": "Male",
            "phone": "+923001234567",
            "cnic": "35202-1234567-1",
            "address": "House 4, Street 9",
            "qualification": {
                "education": "BBA",
                "institute": "LUMS",
                "yearOfPassing": 2010,
                "designation": "Coordinator"
            },
            "emergencyContact": {
                "name": "Hina",
                "relationship": "Wife",
                "phoneNumber": "03001112222"
            },
            "authorities": {
                "courses": { "review": "true" }
            }
        })
    }

    #[test]
    fn test_create_dto_valid() {
        let dto: CreateStaffDto = serde_json::from_value(payload()).unwrap();
        assert!(dto.validate().is_ok());

        let authorities = dto.authorities.merge_into(Authorities::default());
        assert!(authorities.allows(Module::Courses, Action::Review));
        assert!(!authorities.allows(Module::Courses, Action::Edit));
    }

    #[test]
    fn test_create_dto_rejects_teacher_style_cnic() {
        let mut p = payload();
        p["cnic"] = json!("3520212345671");
        let dto: CreateStaffDto = serde_json::from_value(p).unwrap();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("cnic"));
    }

    #[test]
    fn test_create_dto_rejects_future_passing_year() {
        let mut p = payload();
        p["qualification"]["yearOfPassing"] = json!(2999);
        let dto: CreateStaffDto = serde_json::from_value(p).unwrap();
        let message =
            learnhub_core::errors::format_validation_errors(&dto.validate().unwrap_err());
        assert_eq!(
            message,
            "Passing year must be between 1950 and the current year"
        );
    }

    #[test]
    fn test_update_dto_checks_phone() {
        let dto: UpdateStaffDto =
            serde_json::from_value(json!({ "phone": "++923001234567" })).unwrap();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("phone"));
    }

    #[test]
    fn test_create_dto_relationship_limit() {
        let mut p = payload();
        p["emergencyContact"]["relationship"] = json!("a".repeat(31));
        let dto: CreateStaffDto = serde_json::from_value(p).unwrap();
        let message =
            learnhub_core::errors::format_validation_errors(&dto.validate().unwrap_err());
        assert_eq!(message, "Relationship is too long");
    }

    #[test]
    fn test_missing_authorities_default_to_false() {
        let mut p = payload();
        p.as_object_mut().unwrap().remove("authorities");
        let dto: CreateStaffDto = serde_json::from_value(p).unwrap();
        assert_eq!(
            dto.authorities.merge_into(Authorities::default()),
            Authorities::default()
        );
    }
}
