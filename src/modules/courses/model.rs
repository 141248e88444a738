//! Course models re-exported from `learnhub-models`.

pub use learnhub_models::attendance::*;
pub use learnhub_models::courses::*;

use learnhub_core::FieldTable;

use crate::utils::form::{FileSlot, FormSchema, IMAGE_TYPES, UploadPolicy};

/// Courses have no nested wire fields.
pub const COURSE_FIELDS: FieldTable = FieldTable::new(&[]);

pub const COURSE_UPLOADS: UploadPolicy = UploadPolicy {
    dir: "courses",
    slots: &[FileSlot::new("courseImage", IMAGE_TYPES)],
};

impl FormSchema for CreateCourseDto {
    const FIELDS: FieldTable = COURSE_FIELDS;
    const UPLOADS: UploadPolicy = COURSE_UPLOADS;
}

impl FormSchema for UpdateCourseDto {
    const FIELDS: FieldTable = COURSE_FIELDS;
    const UPLOADS: UploadPolicy = COURSE_UPLOADS;
}
