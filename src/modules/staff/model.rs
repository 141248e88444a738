//! Staff models, re-exported from `learnhub-models`, and their form
//! description.

pub use learnhub_models::staff::*;

use learnhub_core::{FieldRule, FieldTable};

use crate::utils::form::{DOCUMENT_TYPES, FileSlot, FormSchema, UploadPolicy};

pub const STAFF_FIELDS: FieldTable = FieldTable::new(&[
    FieldRule::object("qualification"),
    FieldRule::object("emergencyContact"),
    FieldRule::object("authorities"),
]);

pub const STAFF_UPLOADS: UploadPolicy = UploadPolicy {
    dir: "staff",
    slots: &[
        FileSlot::new("cnicDocument", DOCUMENT_TYPES),
        FileSlot::new("medicalRecords", DOCUMENT_TYPES),
        FileSlot::new("additionalDocuments", DOCUMENT_TYPES),
    ],
};

impl FormSchema for CreateStaffDto {
    const FIELDS: FieldTable = STAFF_FIELDS;
    const UPLOADS: UploadPolicy = STAFF_UPLOADS;
}

impl FormSchema for UpdateStaffDto {
    const FIELDS: FieldTable = STAFF_FIELDS;
    const UPLOADS: UploadPolicy = STAFF_UPLOADS;
}
