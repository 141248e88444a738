//! Sub-records and enums shared by several profiles.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use learnhub_core::errors::format_validation_errors;
use validator::{ValidationError, ValidationErrors};

/// Generates `as_str`, `Display` and `TryFrom<String>` for a closed set of
/// stored text values so the enum can be read with `#[sqlx(try_from = "String")]`.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "'{}' is not a valid {}",
                        other,
                        stringify!($name)
                    )),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

pub(crate) use text_enum;

text_enum! {
    Gender {
        Male => "Male",
        Female => "Female",
        Other => "Other",
    }
}

text_enum! {
    /// Employment status shared by teachers and staff.
    EmploymentStatus {
        Active => "Active",
        Inactive => "Inactive",
        OnLeave => "On Leave",
        Terminated => "Terminated",
    }
}

impl Default for EmploymentStatus {
    fn default() -> Self {
        EmploymentStatus::Active
    }
}

text_enum! {
    QuestionType {
        Short => "short",
        Mcq => "mcq",
    }
}

impl Default for QuestionType {
    fn default() -> Self {
        QuestionType::Short
    }
}

/// Length and phone rules for an [`EmergencyContact`], which differ per
/// profile type.
#[derive(Debug, Clone, Copy)]
pub struct ContactRules {
    pub name_max: usize,
    pub relationship_max: usize,
    pub phone: fn(&str) -> Result<(), ValidationError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct EmergencyContact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

impl EmergencyContact {
    /// Overlays supplied fields from `patch`.
    pub fn merge(self, patch: EmergencyContact) -> EmergencyContact {
        EmergencyContact {
            name: patch.name.or(self.name),
            relationship: patch.relationship.or(self.relationship),
            phone_number: patch.phone_number.or(self.phone_number),
        }
    }

    /// Checks the fields that are present against `rules`.
    pub fn check(&self, rules: ContactRules) -> Result<(), ValidationError> {
        if let Some(name) = &self.name
            && name.chars().count() > rules.name_max
        {
            return Err(invalid("Emergency contact name is too long"));
        }
        if let Some(relationship) = &self.relationship
            && relationship.chars().count() > rules.relationship_max
        {
            return Err(invalid("Relationship is too long"));
        }
        if let Some(phone) = &self.phone_number {
            (rules.phone)(phone).map_err(|_| invalid("Please provide a valid emergency phone number"))?;
        }
        Ok(())
    }

    /// Checks presence of every field, then formats.
    pub fn check_complete(&self, rules: ContactRules) -> Result<(), ValidationError> {
        if self.name.is_none() {
            return Err(invalid("Please provide emergency contact name"));
        }
        if self.relationship.is_none() {
            return Err(invalid("Please provide relationship"));
        }
        if self.phone_number.is_none() {
            return Err(invalid("Please provide emergency contact phone"));
        }
        self.check(rules)
    }
}

pub(crate) fn invalid(message: &'static str) -> ValidationError {
    ValidationError::new("invalid").with_message(Cow::Borrowed(message))
}

/// Folds a sub-record's errors into one field-level error.
pub(crate) fn collapse(errors: ValidationErrors) -> ValidationError {
    ValidationError::new("invalid").with_message(Cow::Owned(format_validation_errors(&errors)))
}

/// Merges an optional stored sub-record with an optional patch.
pub(crate) fn merge_opt<T, F>(base: Option<T>, patch: Option<T>, merge: F) -> Option<T>
where
    F: FnOnce(T, T) -> T,
{
    match (base, patch) {
        (Some(base), Some(patch)) => Some(merge(base, patch)),
        (base, patch) => patch.or(base),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::teacher_phone;

    const RULES: ContactRules = ContactRules {
        name_max: 10,
        relationship_max: 5,
        phone: teacher_phone,
    };

    #[test]
    fn test_status_text_round_trip() {
        assert_eq!(EmploymentStatus::OnLeave.as_str(), "On Leave");
        assert_eq!(
            "On Leave".parse::<EmploymentStatus>().unwrap(),
            EmploymentStatus::OnLeave
        );
        assert_eq!(
            serde_json::to_value(EmploymentStatus::OnLeave).unwrap(),
            "On Leave"
        );
        assert!("on leave".parse::<EmploymentStatus>().is_err());
    }

    #[test]
    fn test_contact_merge_keeps_unsupplied_fields() {
        let stored = EmergencyContact {
            name: Some("Ayesha".into()),
            relationship: Some("Sister".into()),
            phone_number: Some("03001234567".into()),
        };
        let patch = EmergencyContact {
            phone_number: Some("03111234567".into()),
            ..Default::default()
        };

        let merged = stored.merge(patch);
        assert_eq!(merged.name.as_deref(), Some("Ayesha"));
        assert_eq!(merged.phone_number.as_deref(), Some("03111234567"));
    }

    #[test]
    fn test_contact_checks() {
        let contact = EmergencyContact {
            name: Some("Ali".into()),
            relationship: None,
            phone_number: Some("03001234567".into()),
        };
        assert!(contact.check(RULES).is_ok());
        assert!(contact.check_complete(RULES).is_err());

        let bad_phone = EmergencyContact {
            phone_number: Some("abc".into()),
            ..contact.clone()
        };
        assert!(bad_phone.check(RULES).is_err());
    }

    #[test]
    fn test_merge_opt() {
        assert_eq!(merge_opt(Some(1), None, |a, b| a + b), Some(1));
        assert_eq!(merge_opt(None, Some(2), |a, b| a + b), Some(2));
        assert_eq!(merge_opt(Some(1), Some(2), |a, b| a + b), Some(3));
    }
}
