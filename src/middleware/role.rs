//! Role gate and ownership checks.
//!
//! Handlers call these after extracting [`AuthUser`]; they never touch the
//! database.

use learnhub_core::AppError;
use learnhub_models::Role;
use uuid::Uuid;

use crate::middleware::auth::AuthUser;

pub fn check_any_role(auth_user: &AuthUser, allowed_roles: &[Role]) -> Result<Role, AppError> {
    let role = auth_user.role()?;

    if !allowed_roles.contains(&role) {
        let allowed = allowed_roles
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        tracing::debug!(role = %role, allowed = %allowed, "Role gate rejected request");
        return Err(AppError::forbidden(format!(
            "User role {} is not authorized to access this route. Allowed roles: {}",
            role, allowed
        )));
    }

    Ok(role)
}

/// Passes for admins and for the caller whose subject is `resource_id`.
pub fn check_ownership_or_admin(auth_user: &AuthUser, resource_id: Uuid) -> Result<(), AppError> {
    if auth_user.is_admin() || is_owner(auth_user, resource_id) {
        return Ok(());
    }

    Err(AppError::forbidden("Not authorized to access this resource"))
}

pub fn is_owner(auth_user: &AuthUser, resource_id: Uuid) -> bool {
    auth_user
        .subject_id()
        .is_ok_and(|subject| subject == resource_id)
}
