//! Permission gate over the staff authorities matrix.
//!
//! Admins always pass. Staff pass when their stored matrix grants the
//! module/action pair; the matrix is read fresh from the database on every
//! check so revoked permissions apply immediately. Every other role fails.

use learnhub_core::AppError;
use learnhub_models::{Action, Authorities, Module, Role};
use sqlx::PgPool;
use sqlx::types::Json;

use crate::middleware::auth::AuthUser;

/// Outcome of a passed permission check.
#[derive(Debug, Clone)]
pub enum Granted {
    Admin,
    /// Staff member together with the matrix that granted access.
    Staff(Authorities),
}

/// Pure decision given the caller's role and (for staff) their matrix.
pub fn evaluate_permission(
    role: Role,
    authorities: Option<&Authorities>,
    module: Module,
    action: Action,
) -> Result<(), AppError> {
    match (role, authorities) {
        (Role::Admin, _) => Ok(()),
        (Role::Staff, Some(matrix)) if matrix.allows(module, action) => Ok(()),
        (Role::Staff, _) => Err(AppError::forbidden(format!(
            "You do not have permission to {} {}",
            action, module
        ))),
        (role, _) => Err(AppError::forbidden(format!(
            "User role {} is not authorized to access this route",
            role
        ))),
    }
}

pub async fn load_authorities(db: &PgPool, auth_user: &AuthUser) -> Result<Authorities, AppError> {
    let staff_id = auth_user.subject_id()?;

    let authorities = sqlx::query_scalar::<_, Json<Authorities>>(
        "SELECT authorities FROM staff WHERE id = $1",
    )
    .bind(staff_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::forbidden("Staff profile not found"))?;

    Ok(authorities.0)
}

/// DB-backed permission gate.
pub async fn check_authority(
    db: &PgPool,
    auth_user: &AuthUser,
    module: Module,
    action: Action,
) -> Result<Granted, AppError> {
    let role = auth_user.role()?;

    match role {
        Role::Admin => Ok(Granted::Admin),
        Role::Staff => {
            let authorities = load_authorities(db, auth_user).await?;
            evaluate_permission(role, Some(&authorities), module, action)?;
            Ok(Granted::Staff(authorities))
        }
        other => evaluate_permission(other, None, module, action).map(|()| Granted::Admin),
    }
}

/// Declares an extractor that runs [`check_authority`] for a fixed
/// module/action before the handler.
#[macro_export]
macro_rules! require_authority {
    ($name:ident, $module:expr, $action:expr) => {
        #[derive(Debug, Clone)]
        pub struct $name(
            pub $crate::middleware::auth::AuthUser,
            pub $crate::middleware::permission::Granted,
        );

        impl axum::extract::FromRequestParts<$crate::state::AppState> for $name {
            type Rejection = learnhub_core::AppError;

            async fn from_request_parts(
                parts: &mut axum::http::request::Parts,
                state: &$crate::state::AppState,
            ) -> Result<Self, Self::Rejection> {
                let auth_user = <$crate::middleware::auth::AuthUser as axum::extract::FromRequestParts<
                    $crate::state::AppState,
                >>::from_request_parts(parts, state)
                .await?;
                let granted = $crate::middleware::permission::check_authority(
                    &state.db, &auth_user, $module, $action,
                )
                .await?;
                Ok($name(auth_user, granted))
            }
        }
    };
}

require_authority!(RequireStudentsReview, Module::Students, Action::Review);
require_authority!(RequireStudentsAdd, Module::Students, Action::Add);
require_authority!(RequireStudentsEdit, Module::Students, Action::Edit);

require_authority!(RequireCoursesAdd, Module::Courses, Action::Add);
require_authority!(RequireCoursesEdit, Module::Courses, Action::Edit);

require_authority!(
    RequireInstructorPaymentReview,
    Module::InstructorPayment,
    Action::Review
);

require_authority!(RequireVisitorsReview, Module::VisitorForm, Action::Review);
require_authority!(RequireVisitorsAdd, Module::VisitorForm, Action::Add);
require_authority!(RequireVisitorsEdit, Module::VisitorForm, Action::Edit);
