//! Feature modules. Each one has the same layout:
//!
//! - `model.rs`: models re-exported from `learnhub-models`, plus the form
//!   description (nested fields and upload slots) for multipart payloads
//! - `service.rs`: queries and business rules
//! - `controller.rs`: HTTP handlers and their OpenAPI annotations
//! - `router.rs`: route table

pub mod assignments;
pub mod auth;
pub mod courses;
pub mod quizzes;
pub mod staff;
pub mod students;
pub mod teachers;
pub mod visitors;
