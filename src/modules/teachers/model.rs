//! Teacher models, re-exported from `learnhub-models`, plus the form
//! description used to read create/update payloads.

pub use learnhub_models::teachers::*;

use learnhub_core::{FieldRule, FieldTable};

use crate::utils::form::{DOCUMENT_TYPES, FileSlot, FormSchema, IMAGE_TYPES, UploadPolicy};

pub const TEACHER_FIELDS: FieldTable = FieldTable::new(&[
    FieldRule::object("qualification"),
    FieldRule::object("unassignedCourses"),
    FieldRule::object("emergencyContact"),
]);

pub const TEACHER_UPLOADS: UploadPolicy = UploadPolicy {
    dir: "teachers",
    slots: &[
        FileSlot::new("photo", IMAGE_TYPES),
        FileSlot::new("cnicDocument", DOCUMENT_TYPES),
        FileSlot::new("degreeDocument", DOCUMENT_TYPES),
        FileSlot::new("cvDocument", DOCUMENT_TYPES),
        FileSlot::new("medicalRecords", DOCUMENT_TYPES),
        FileSlot::new("additionalDocuments", DOCUMENT_TYPES),
    ],
};

impl FormSchema for CreateTeacherDto {
    const FIELDS: FieldTable = TEACHER_FIELDS;
    const UPLOADS: UploadPolicy = TEACHER_UPLOADS;
}

impl FormSchema for UpdateTeacherDto {
    const FIELDS: FieldTable = TEACHER_FIELDS;
    const UPLOADS: UploadPolicy = TEACHER_UPLOADS;
}
