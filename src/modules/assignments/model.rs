pub use learnhub_models::assignments::*;

use learnhub_core::{FieldRule, FieldTable};

use crate::utils::form::{DOCUMENT_TYPES, FileSlot, FormSchema, UploadPolicy};

pub const ASSIGNMENT_FIELDS: FieldTable = FieldTable::new(&[FieldRule::list("questions")]);

pub const ASSIGNMENT_UPLOADS: UploadPolicy = UploadPolicy {
    dir: "assignments",
    slots: &[FileSlot::new("file", DOCUMENT_TYPES)],
};

impl FormSchema for CreateAssignmentDto {
    const FIELDS: FieldTable = ASSIGNMENT_FIELDS;
    const UPLOADS: UploadPolicy = ASSIGNMENT_UPLOADS;
}

impl FormSchema for UpdateAssignmentDto {
    const FIELDS: FieldTable = ASSIGNMENT_FIELDS;
    const UPLOADS: UploadPolicy = ASSIGNMENT_UPLOADS;
}
