//! Staff authorities matrix.
//!
//! Every staff member carries a grid of `{review, add, edit}` flags for each
//! [`Module`]. All flags default to `false`, so a partially supplied matrix
//! only grants what it names.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Module {
    Students,
    Courses,
    Fees,
    InstructorPayment,
    AdmissionForm,
    VisitorForm,
}

impl Module {
    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Students => "students",
            Module::Courses => "courses",
            Module::Fees => "fees",
            Module::InstructorPayment => "instructorPayment",
            Module::AdmissionForm => "admissionForm",
            Module::VisitorForm => "visitorForm",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Review,
    Add,
    Edit,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Review => "review",
            Action::Add => "add",
            Action::Edit => "edit",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Permissions {
    pub review: bool,
    pub add: bool,
    pub edit: bool,
}

impl Permissions {
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Review => self.review,
            Action::Add => self.add,
            Action::Edit => self.edit,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Authorities {
    pub students: Permissions,
    pub courses: Permissions,
    pub fees: Permissions,
    pub instructor_payment: Permissions,
    pub admission_form: Permissions,
    pub visitor_form: Permissions,
}

impl Authorities {
    pub fn module(&self, module: Module) -> &Permissions {
        match module {
            Module::Students => &self.students,
            Module::Courses => &self.courses,
            Module::Fees => &self.fees,
            Module::InstructorPayment => &self.instructor_payment,
            Module::AdmissionForm => &self.admission_form,
            Module::VisitorForm => &self.visitor_form,
        }
    }

    pub fn allows(&self, module: Module, action: Action) -> bool {
        self.module(module).allows(action)
    }
}

/// Partial matrix used by updates; only supplied flags change.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PermissionsPatch {
    #[serde(deserialize_with = "learnhub_core::serde::flexible_bool")]
    pub review: Option<bool>,
    #[serde(deserialize_with = "learnhub_core::serde::flexible_bool")]
    pub add: Option<bool>,
    #[serde(deserialize_with = "learnhub_core::serde::flexible_bool")]
    pub edit: Option<bool>,
}

impl PermissionsPatch {
    fn apply(&self, target: &mut Permissions) {
        if let Some(v) = self.review {
            target.review = v;
        }
        if let Some(v) = self.add {
            target.add = v;
        }
        if let Some(v) = self.edit {
            target.edit = v;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct AuthoritiesPatch {
    pub students: Option<PermissionsPatch>,
    pub courses: Option<PermissionsPatch>,
    pub fees: Option<PermissionsPatch>,
    pub instructor_payment: Option<PermissionsPatch>,
    pub admission_form: Option<PermissionsPatch>,
    pub visitor_form: Option<PermissionsPatch>,
}

impl AuthoritiesPatch {
    /// Merges supplied flags over `base`.
    pub fn merge_into(&self, mut base: Authorities) -> Authorities {
        let pairs = [
            (&self.students, &mut base.students),
            (&self.courses, &mut base.courses),
            (&self.fees, &mut base.fees),
            (&self.instructor_payment, &mut base.instructor_payment),
            (&self.admission_form, &mut base.admission_form),
            (&self.visitor_form, &mut base.visitor_form),
        ];
        for (patch, target) in pairs {
            if let Some(patch) = patch {
                patch.apply(target);
            }
        }
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_deny_everything() {
        let authorities = Authorities::default();
        for module in [
            Module::Students,
            Module::Courses,
            Module::Fees,
            Module::InstructorPayment,
            Module::AdmissionForm,
            Module::VisitorForm,
        ] {
            for action in [Action::Review, Action::Add, Action::Edit] {
                assert!(!authorities.allows(module, action));
            }
        }
    }

    #[test]
    fn test_partial_matrix_deserializes_with_defaults() {
        let authorities: Authorities = serde_json::from_value(json!({
            "courses": { "review": true },
            "visitorForm": { "add": true, "edit": true }
        }))
        .unwrap();

        assert!(authorities.allows(Module::Courses, Action::Review));
        assert!(!authorities.allows(Module::Courses, Action::Add));
        assert!(authorities.allows(Module::VisitorForm, Action::Edit));
        assert!(!authorities.allows(Module::Students, Action::Review));
    }

    #[test]
    fn test_patch_merges_only_supplied_flags() {
        let base: Authorities = serde_json::from_value(json!({
            "students": { "review": true, "add": true }
        }))
        .unwrap();
        let patch: AuthoritiesPatch = serde_json::from_value(json!({
            "students": { "add": "false" },
            "fees": { "review": "true" }
        }))
        .unwrap();

        let merged = patch.merge_into(base);
        assert!(merged.students.review);
        assert!(!merged.students.add);
        assert!(merged.fees.review);
    }

    #[test]
    fn test_module_wire_names() {
        assert_eq!(
            serde_json::to_value(Module::InstructorPayment).unwrap(),
            "instructorPayment"
        );
        assert_eq!(Module::VisitorForm.to_string(), "visitorForm");
    }

    #[test]
    fn test_patch_serializes_with_wire_names() {
        let patch: AuthoritiesPatch = serde_json::from_value(json!({
            "instructorPayment": { "edit": "1" }
        }))
        .unwrap();
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value["instructorPayment"]["edit"], true);
        assert!(value["students"].is_null());
    }
}
