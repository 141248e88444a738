//! Request gates and edge middleware.
//!
//! - [`auth`]: bearer token extractor ([`auth::AuthUser`])
//! - [`role`]: role gate and ownership checks
//! - [`permission`]: staff authorities gate and `Require*` extractors
//! - [`rate_limit`]: per-IP request limiting
//!
//! Gates run after token verification and before the handler body, and never
//! write to the database.
//!
//! ```ignore
//! use crate::middleware::permission::RequireCoursesAdd;
//!
//! async fn create_course(RequireCoursesAdd(auth_user, _): RequireCoursesAdd) -> ... {
//!     // admin, or staff with authorities.courses.add
//! }
//! ```

pub mod auth;
pub mod permission;
pub mod rate_limit;
pub mod role;
