use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use learnhub_auth::{Claims, verify_token};
use learnhub_core::AppError;
use learnhub_models::Role;
use uuid::Uuid;

use crate::state::AppState;

/// Extractor that validates the bearer token and exposes its claims.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// Role carried by the token. A token naming an unknown role is treated
    /// as unauthenticated.
    pub fn role(&self) -> Result<Role, AppError> {
        self.0
            .role
            .parse()
            .map_err(|_| AppError::unauthorized("Invalid or expired token"))
    }

    /// Profile id for teachers, staff and students; account id for admins.
    pub fn subject_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.0.sub)
            .map_err(|_| AppError::unauthorized("Invalid user ID in token"))
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role(), Ok(Role::Admin))
    }

    pub fn email(&self) -> &str {
        &self.0.email
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Not authorized to access this route"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthorized("Not authorized to access this route"))?;

        let claims = verify_token(token, &state.jwt_config)?;
        let user = AuthUser(claims);
        user.role()?;

        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: &str, sub: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            name: "Hina Raza".to_string(),
            role: role.to_string(),
            email: "hina@example.com".to_string(),
            exp: 9999999999,
            iat: 1234567890,
        }
    }

    #[test]
    fn test_role_parsing() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(AuthUser(claims("staff", &id)).role().unwrap(), Role::Staff);
        assert!(AuthUser(claims("admin", &id)).is_admin());
        assert!(!AuthUser(claims("teacher", &id)).is_admin());

        let err = AuthUser(claims("superuser", &id)).role().unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_subject_id() {
        let id = Uuid::new_v4();
        let user = AuthUser(claims("student", &id.to_string()));
        assert_eq!(user.subject_id().unwrap(), id);

        let user = AuthUser(claims("student", "not-a-uuid"));
        assert!(user.subject_id().is_err());
    }
}
