//! JWT claim structure for access tokens.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims embedded in every access token.
///
/// - `sub`: id of the caller's profile (teacher/staff/student) or account (admin)
/// - `name`: display name
/// - `role`: `admin`, `teacher`, `staff` or `student`
/// - `email`: login email
/// - `exp` / `iat`: expiry and issue timestamps (Unix seconds)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub role: String,
    pub email: String,
    pub exp: usize,
    pub iat: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_serialize() {
        let claims = Claims {
            sub: "user-id-123".to_string(),
            name: "Ayesha Khan".to_string(),
            role: "staff".to_string(),
            email: "ayesha@example.com".to_string(),
            exp: 1234567890,
            iat: 1234567800,
        };
        let serialized = serde_json::to_string(&claims).unwrap();
        assert!(serialized.contains(r#""sub":"user-id-123""#));
        assert!(serialized.contains(r#""role":"staff""#));
    }

    #[test]
    fn test_claims_deserialize() {
        let json = r#"{"sub":"abc","name":"N","role":"admin","email":"a@b.com","exp":9999999999,"iat":9999999900}"#;
        let claims: Claims = serde_json::from_str(json).unwrap();
        assert_eq!(claims.sub, "abc");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.exp, 9999999999);
    }
}
