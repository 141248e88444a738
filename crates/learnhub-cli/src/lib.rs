//! # LearnHub CLI
//!
//! Administrative commands that run directly against the database.
//!
//! ```ignore
//! use learnhub_cli::{NewAdmin, create_admin};
//!
//! let id = create_admin(&pool, NewAdmin::new("Ada", "ada@learnhub.dev", "secret123")).await?;
//! ```

use learnhub_core::hash_password;
use learnhub_models::auth::RegisterRequest;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Error)]
pub enum CreateAdminError {
    #[error("{0}")]
    Invalid(String),

    #[error("A user with this email already exists")]
    EmailTaken,

    #[error("Failed to hash password")]
    Hash,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Admin account details as collected from flags or prompts.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl NewAdmin {
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            email: email.into().trim().to_lowercase(),
            password: password.into(),
        }
    }

    /// Applies the same rules as the register endpoint.
    pub fn validate(&self) -> Result<(), CreateAdminError> {
        let request = RegisterRequest {
            name: Some(self.name.clone()),
            email: Some(self.email.clone()),
            password: Some(self.password.clone()),
            role: None,
        };

        request.validate().map_err(|errors| {
            let messages: Vec<String> = errors
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .collect();
            CreateAdminError::Invalid(messages.join(", "))
        })
    }
}

/// Inserts an `admin` account. The email must not belong to any account or
/// profile.
pub async fn create_admin(db: &PgPool, admin: NewAdmin) -> Result<Uuid, CreateAdminError> {
    admin.validate()?;

    let taken = sqlx::query_scalar::<_, bool>(
        r#"SELECT EXISTS (
               SELECT 1 FROM accounts WHERE email = $1
               UNION ALL SELECT 1 FROM students WHERE email = $1
               UNION ALL SELECT 1 FROM teachers WHERE email = $1
               UNION ALL SELECT 1 FROM staff WHERE email = $1
           )"#,
    )
    .bind(&admin.email)
    .fetch_one(db)
    .await?;

    if taken {
        return Err(CreateAdminError::EmailTaken);
    }

    let hashed_password = hash_password(&admin.password).map_err(|_| CreateAdminError::Hash)?;

    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO accounts (name, email, password, role)
         VALUES ($1, $2, $3, 'admin')
         ON CONFLICT (email) DO NOTHING
         RETURNING id",
    )
    .bind(&admin.name)
    .bind(&admin.email)
    .bind(&hashed_password)
    .fetch_optional(db)
    .await?;

    id.ok_or(CreateAdminError::EmailTaken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_admin_normalizes_input() {
        let admin = NewAdmin::new("  Ada Lovelace ", " Ada@LearnHub.dev ", "secret123");
        assert_eq!(admin.name, "Ada Lovelace");
        assert_eq!(admin.email, "ada@learnhub.dev");
        assert!(admin.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_password() {
        let admin = NewAdmin::new("Ada", "ada@learnhub.dev", "123");
        let err = admin.validate().unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters");
    }

    #[test]
    fn test_validate_rejects_bad_email() {
        let admin = NewAdmin::new("Ada", "not-an-email", "secret123");
        let err = admin.validate().unwrap_err();
        assert_eq!(err.to_string(), "Please provide a valid email");
    }
}
