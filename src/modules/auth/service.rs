use anyhow::anyhow;
use learnhub_auth::{TokenSubject, create_access_token};
use learnhub_config::JwtConfig;
use learnhub_core::{AppError, hash_password, verify_password};
use learnhub_models::auth::{Account, AuthResponse, AuthUser, LoginRequest, Profile, RegisterRequest};
use learnhub_models::Role;
use sqlx::{PgExecutor, PgPool};
use tracing::instrument;
use uuid::Uuid;

use crate::metrics::{track_login_failure, track_login_success, track_token_issued};
use crate::modules::staff::service::StaffService;
use crate::modules::students::service::StudentService;
use crate::modules::teachers::service::TeacherService;

pub const ACCOUNT_COLUMNS: &str =
    "id, name, email, password, role, profile_id, created_at, updated_at";

const INVALID_CREDENTIALS: &str = "Invalid Credentials";

/// Fails with 400 when `email` belongs to any account or profile other than
/// `except` (the subject being updated).
pub async fn ensure_email_available<'e, E>(
    executor: E,
    email: &str,
    except: Option<Uuid>,
) -> Result<(), AppError>
where
    E: PgExecutor<'e>,
{
    let taken = sqlx::query_scalar::<_, bool>(
        r#"SELECT EXISTS (
               SELECT 1 FROM accounts
                WHERE email = $1 AND COALESCE(profile_id, id) IS DISTINCT FROM $2::uuid
               UNION ALL
               SELECT 1 FROM students WHERE email = $1 AND id IS DISTINCT FROM $2::uuid
               UNION ALL
               SELECT 1 FROM teachers WHERE email = $1 AND id IS DISTINCT FROM $2::uuid
               UNION ALL
               SELECT 1 FROM staff WHERE email = $1 AND id IS DISTINCT FROM $2::uuid
           )"#,
    )
    .bind(email)
    .bind(except)
    .fetch_one(executor)
    .await?;

    if taken {
        return Err(AppError::bad_request(anyhow!(
            "A user with this email already exists"
        )));
    }
    Ok(())
}

/// Wrong passwords and unreadable hashes are both just a failed login.
fn password_matches(password: &str, hash: &str) -> bool {
    verify_password(password, hash).unwrap_or(false)
}

pub struct AuthService;

impl AuthService {
    fn issue(user: AuthUser, jwt_config: &JwtConfig) -> Result<AuthResponse, AppError> {
        let token = create_access_token(
            &TokenSubject {
                id: user.id,
                name: &user.name,
                role: user.role.as_str(),
                email: &user.email,
            },
            jwt_config,
        )?;
        track_token_issued();

        Ok(AuthResponse {
            success: true,
            user,
            token,
        })
    }

    #[instrument(skip(db, dto, jwt_config))]
    pub async fn register_admin(
        db: &PgPool,
        dto: RegisterRequest,
        jwt_config: &JwtConfig,
    ) -> Result<AuthResponse, AppError> {
        if let Some(role) = dto.role.as_deref()
            && role.parse::<Role>() != Ok(Role::Admin)
        {
            return Err(AppError::bad_request(anyhow!(
                "This endpoint is only for admin registration"
            )));
        }

        let name = dto.name.unwrap_or_default().trim().to_string();
        let email = dto.email.unwrap_or_default().trim().to_lowercase();
        let password = dto.password.unwrap_or_default();

        ensure_email_available(db, &email, None).await?;
        let hashed_password = hash_password(&password)?;

        let account = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts (name, email, password, role)
             VALUES ($1, $2, $3, 'admin')
             RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(&name)
        .bind(&email)
        .bind(&hashed_password)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::bad_request(anyhow!("A user with this email already exists"));
            }
            AppError::database(e)
        })?;

        tracing::info!(account_id = %account.id, "Admin registered");
        crate::metrics::track_record_created("admin");

        Self::issue(
            AuthUser {
                id: account.id,
                name: account.name.clone(),
                email: account.email.clone(),
                role: account.role,
                role_data: None,
            },
            jwt_config,
        )
    }

    /// Probes accounts, then students, teachers and staff. The first record
    /// holding the email decides the outcome.
    #[instrument(skip(db, dto, jwt_config))]
    pub async fn login(
        db: &PgPool,
        dto: LoginRequest,
        jwt_config: &JwtConfig,
    ) -> Result<AuthResponse, AppError> {
        let (email, password) = dto
            .credentials()
            .ok_or_else(|| AppError::bad_request(anyhow!("Please provide email and password")))?;

        let user = match Self::find_account(db, &email).await? {
            Some(account) => {
                if !password_matches(password, &account.password) {
                    return Err(Self::reject("wrong_password"));
                }
                let role_data = match account.role {
                    Role::Teacher | Role::Staff | Role::Student => match account.profile_id {
                        Some(profile_id) => Self::load_profile(db, account.role, profile_id).await?,
                        None => None,
                    },
                    Role::Admin => None,
                };
                AuthUser {
                    id: account.subject_id(),
                    name: account.name,
                    email: account.email,
                    role: account.role,
                    role_data,
                }
            }
            None => Self::probe_profiles(db, &email, password).await?,
        };

        track_login_success(user.role.as_str());
        tracing::info!(subject = %user.id, role = %user.role, "Login succeeded");
        Self::issue(user, jwt_config)
    }

    async fn probe_profiles(db: &PgPool, email: &str, password: &str) -> Result<AuthUser, AppError> {
        if let Some(student) = StudentService::find_by_email(db, email).await? {
            if !password_matches(password, &student.password) {
                return Err(Self::reject("wrong_password"));
            }
            return Ok(AuthUser {
                id: student.id,
                name: student.full_name.clone(),
                email: student.email.clone(),
                role: Role::Student,
                role_data: Some(Profile::Student(Box::new(student))),
            });
        }

        if let Some(teacher) = TeacherService::find_by_email(db, email).await? {
            if !password_matches(password, &teacher.password) {
                return Err(Self::reject("wrong_password"));
            }
            return Ok(AuthUser {
                id: teacher.id,
                name: teacher.full_name.clone(),
                email: teacher.email.clone(),
                role: Role::Teacher,
                role_data: Some(Profile::Teacher(Box::new(teacher))),
            });
        }

        if let Some(staff) = StaffService::find_by_email(db, email).await? {
            if !password_matches(password, &staff.password) {
                return Err(Self::reject("wrong_password"));
            }
            return Ok(AuthUser {
                id: staff.id,
                name: staff.full_name.clone(),
                email: staff.email.clone(),
                role: Role::Staff,
                role_data: Some(Profile::Staff(Box::new(staff))),
            });
        }

        Err(Self::reject("unknown_email"))
    }

    fn reject(reason: &'static str) -> AppError {
        track_login_failure(reason);
        tracing::debug!(reason, "Login rejected");
        AppError::unauthorized(INVALID_CREDENTIALS)
    }

    async fn find_account(db: &PgPool, email: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(account)
    }

    async fn load_profile(db: &PgPool, role: Role, id: Uuid) -> Result<Option<Profile>, AppError> {
        let profile = match role {
            Role::Admin => sqlx::query_as::<_, Account>(&format!(
                "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1 AND role = 'admin'"
            ))
            .bind(id)
            .fetch_optional(db)
            .await?
            .map(Profile::Admin),
            Role::Teacher => TeacherService::find_by_id(db, id)
                .await?
                .map(|t| Profile::Teacher(Box::new(t))),
            Role::Staff => StaffService::find_by_id(db, id)
                .await?
                .map(|s| Profile::Staff(Box::new(s))),
            Role::Student => StudentService::find_by_id(db, id)
                .await?
                .map(|s| Profile::Student(Box::new(s))),
        };
        Ok(profile)
    }

    /// Record behind the caller's token, chosen by role.
    #[instrument(skip(db))]
    pub async fn get_profile(db: &PgPool, role: Role, subject_id: Uuid) -> Result<Profile, AppError> {
        Self::load_profile(db, role, subject_id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_matches_treats_bad_hash_as_mismatch() {
        assert!(!password_matches("secret", "not-a-bcrypt-hash"));

        let hash = hash_password("secret1").unwrap();
        assert!(password_matches("secret1", &hash));
        assert!(!password_matches("secret2", &hash));
    }
}
