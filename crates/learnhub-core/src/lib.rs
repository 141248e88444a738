//! # LearnHub Core
//!
//! Core types, errors, and utilities for the LearnHub API.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//! - [`file_storage`]: Upload storage abstraction and local implementation
//! - [`normalize`]: Rebuilds nested payloads from flattened form fields
//! - [`pagination`]: Pagination, sorting and search parameters
//! - [`password`]: Password hashing and verification
//! - [`serde`]: Lenient deserializers for form-submitted scalars
//!
//! # Example
//!
//! ```ignore
//! use learnhub_core::errors::AppError;
//! use learnhub_core::password::{hash_password, verify_password};
//!
//! let error = AppError::not_found(anyhow::anyhow!("Course not found"));
//! let hash = hash_password("secure_password")?;
//! ```

pub mod errors;
pub mod file_storage;
pub mod normalize;
pub mod pagination;
pub mod password;
pub mod serde;

// Re-export commonly used types at crate root
pub use errors::AppError;
pub use file_storage::{FileStorage, LocalFileStorage, StorageError};
pub use normalize::{FieldRule, FieldTable, NormalizeError, normalize};
pub use pagination::{PaginationMeta, PaginationParams, SortOrder};
pub use password::{hash_password, verify_password};
