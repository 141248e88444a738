//! Shared request helpers.
//!
//! - [`form`]: JSON/multipart payload extractor and upload storage helpers

pub mod form;
