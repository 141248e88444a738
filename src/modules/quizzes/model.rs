pub use learnhub_models::quizzes::*;

use learnhub_core::{FieldRule, FieldTable};

use crate::utils::form::{DOCUMENT_TYPES, FileSlot, FormSchema, UploadPolicy};

pub const QUIZ_FIELDS: FieldTable = FieldTable::new(&[FieldRule::list("questions")]);

pub const QUIZ_UPLOADS: UploadPolicy = UploadPolicy {
    dir: "quizzes",
    slots: &[FileSlot::new("file", DOCUMENT_TYPES)],
};

impl FormSchema for CreateQuizDto {
    const FIELDS: FieldTable = QUIZ_FIELDS;
    const UPLOADS: UploadPolicy = QUIZ_UPLOADS;
}

impl FormSchema for UpdateQuizDto {
    const FIELDS: FieldTable = QUIZ_FIELDS;
    const UPLOADS: UploadPolicy = QUIZ_UPLOADS;
}
