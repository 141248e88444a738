//! Authentication models: accounts, register/login DTOs and the profile
//! union returned by `GET /auth/profile`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::roles::Role;
use crate::staff::Staff;
use crate::students::Student;
use crate::teachers::Teacher;

pub use learnhub_auth::Claims;

/// Credential record. Admins only exist here; teachers and staff get a paired
/// account pointing back at their profile through `profile_id`.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub profile_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Subject placed in issued tokens.
    pub fn subject_id(&self) -> Uuid {
        self.profile_id.unwrap_or(self.id)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(
        required(message = "Please provide name"),
        length(min = 2, max = 50, message = "Name must be between 2 and 50 characters")
    )]
    pub name: Option<String>,
    #[validate(
        required(message = "Please provide email"),
        email(message = "Please provide a valid email")
    )]
    #[schema(example = "admin@learnhub.dev")]
    pub email: Option<String>,
    #[validate(
        required(message = "Please provide password"),
        length(min = 6, message = "Password must be at least 6 characters")
    )]
    pub password: Option<String>,
    /// Only `admin` is accepted.
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin@learnhub.dev")]
    pub email: Option<String>,
    #[schema(example = "secret123")]
    pub password: Option<String>,
}

impl LoginRequest {
    /// Trimmed, lower-cased email and the password, when both are present.
    pub fn credentials(&self) -> Option<(String, &str)> {
        let email = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty())?;
        let password = self.password.as_deref().filter(|p| !p.is_empty())?;
        Some((email.to_lowercase(), password))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Profile record for teacher, staff and student logins.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub role_data: Option<Profile>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub user: AuthUser,
    pub token: String,
}

/// Any record a caller can authenticate as.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum Profile {
    Admin(Account),
    Teacher(Box<Teacher>),
    Staff(Box<Staff>),
    Student(Box<Student>),
}

impl Profile {
    pub fn role(&self) -> Role {
        match self {
            Profile::Admin(account) => account.role,
            Profile::Teacher(_) => Role::Teacher,
            Profile::Staff(_) => Role::Staff,
            Profile::Student(_) => Role::Student,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: Profile,
}
