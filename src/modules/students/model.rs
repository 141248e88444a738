pub use learnhub_models::students::*;

use learnhub_core::{FieldRule, FieldTable};

use crate::utils::form::{FileSlot, FormSchema, IMAGE_PDF_TYPES, UploadPolicy};

/// `courses` also accepts a single enrollment object, which is wrapped into
/// a one-element list.
pub const STUDENT_FIELDS: FieldTable = FieldTable::new(&[
    FieldRule::object("parentGuardian"),
    FieldRule::object("emergencyContact"),
    FieldRule::list("courses"),
]);

pub const STUDENT_UPLOADS: UploadPolicy = UploadPolicy {
    dir: "students",
    slots: &[
        FileSlot::new("photo", IMAGE_PDF_TYPES),
        FileSlot::new("studentCnicBForm", IMAGE_PDF_TYPES),
        FileSlot::new("parentCnic", IMAGE_PDF_TYPES),
        FileSlot::new("medicalRecords", IMAGE_PDF_TYPES),
        FileSlot::new("additionalDocuments", IMAGE_PDF_TYPES),
    ],
};

impl FormSchema for CreateStudentDto {
    const FIELDS: FieldTable = STUDENT_FIELDS;
    const UPLOADS: UploadPolicy = STUDENT_UPLOADS;
}

impl FormSchema for UpdateStudentDto {
    const FIELDS: FieldTable = STUDENT_FIELDS;
    const UPLOADS: UploadPolicy = STUDENT_UPLOADS;
}
