//! # LearnHub Models
//!
//! Domain models and DTOs for the LearnHub API.
//!
//! Stored rows derive `sqlx::FromRow` and serialize in camelCase. Embedded
//! sub-records are JSONB columns read through `sqlx::types::Json`. Create DTOs
//! carry `required` rules; update DTOs are partial and merge over the stored
//! row with `merge_into`.
//!
//! - [`auth`]: Accounts, register/login payloads and the profile union
//! - [`authorities`]: Staff permission matrix
//! - [`roles`]: Caller roles
//! - [`students`], [`teachers`], [`staff`]: Profiles
//! - [`courses`], [`visitors`], [`assignments`], [`quizzes`]: Resources
//! - [`attendance`]: Per-course attendance sheet

pub mod assignments;
pub mod attendance;
pub mod auth;
pub mod authorities;
pub mod common;
pub mod courses;
pub mod quizzes;
pub mod roles;
pub mod staff;
pub mod students;
pub mod teachers;
pub mod validators;
pub mod visitors;

pub use authorities::{Action, Authorities, Module, Permissions};
pub use common::{EmergencyContact, EmploymentStatus, Gender, QuestionType};
pub use roles::Role;
