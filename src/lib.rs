//! # LearnHub API
//!
//! Administration backend for a learning management system, built with Axum
//! and PostgreSQL. Admins, staff and teachers manage students, teachers,
//! staff, courses, visitor leads, assignments and quizzes.
//!
//! ## Architecture
//!
//! ```text
//! crates/
//! ├── learnhub-core/    # AppError, pagination, uploads, form normalizer
//! ├── learnhub-config/  # Environment-driven configuration
//! ├── learnhub-db/      # Pool setup and embedded migrations
//! ├── learnhub-auth/    # JWT issuance and verification
//! ├── learnhub-models/  # Rows, DTOs and response types
//! └── learnhub-cli/     # create-admin and migrate commands
//! src/
//! ├── middleware/       # Bearer extractor, role, authority and ownership gates
//! ├── modules/          # Feature modules
//! └── utils/            # Form payload extractor
//! ```
//!
//! Each feature module follows the same layout: `controller.rs`,
//! `service.rs`, `model.rs` and `router.rs`.
//!
//! ## Roles
//!
//! | Role | Access |
//! |------|--------|
//! | Admin | Everything; the only role allowed to delete |
//! | Staff | Whatever their `authorities` matrix grants |
//! | Teacher | Their own profile and courses, assignments and quizzes |
//! | Student | Their own profile |
//!
//! Admins register through `POST /api/v1/auth/register` or the CLI:
//!
//! ```bash
//! cargo run -p learnhub-cli -- create-admin
//! ```
//!
//! ## API Documentation
//!
//! - Swagger UI: `http://localhost:5000/swagger-ui`
//! - Scalar: `http://localhost:5000/scalar`

pub mod docs;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod utils;
pub mod validator;

pub use learnhub_auth;
pub use learnhub_config;
pub use learnhub_core;
pub use learnhub_db;
pub use learnhub_models;
