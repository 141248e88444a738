//! # LearnHub Auth
//!
//! Access token claims plus issuing and verification helpers.

pub mod claims;
pub mod jwt;

pub use claims::Claims;
pub use jwt::{TokenSubject, create_access_token, verify_token};
