//! Authentication models.
//!
//! Re-exports the account and login types from the `learnhub-models` crate.

pub use learnhub_models::auth::*;
