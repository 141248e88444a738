//! Assignments with embedded questions.

use chrono::{DateTime, Utc};
use learnhub_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::QuestionType;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct AssignmentQuestion {
    #[serde(rename = "type", default)]
    pub kind: QuestionType,
    #[validate(required(message = "Each question needs question text"))]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// MCQ choices
    #[serde(default)]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: DateTime<Utc>,
    pub file: Option<String>,
    #[schema(value_type = Vec<AssignmentQuestion>)]
    pub questions: Json<Vec<AssignmentQuestion>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentDto {
    #[validate(
        required(message = "Please provide title"),
        length(min = 1, message = "Please provide title")
    )]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(required(message = "Please provide due date"))]
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_datetime")]
    pub due_date: Option<DateTime<Utc>>,
    #[validate(nested)]
    #[serde(default)]
    pub questions: Vec<AssignmentQuestion>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssignmentDto {
    #[validate(length(min = 1, message = "Please provide title"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_datetime")]
    pub due_date: Option<DateTime<Utc>>,
    /// Replaces the whole question list when present.
    #[validate(nested)]
    pub questions: Option<Vec<AssignmentQuestion>>,
}

impl UpdateAssignmentDto {
    pub fn merge_into(self, existing: Assignment) -> Assignment {
        Assignment {
            title: self.title.unwrap_or(existing.title),
            description: self.description.or(existing.description),
            due_date: self.due_date.unwrap_or(existing.due_date),
            questions: self.questions.map(Json).unwrap_or(existing.questions),
            ..existing
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AssignmentFilterParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AssignmentResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub assignment: Assignment,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedAssignmentsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub meta: PaginationMeta,
    pub assignments: Vec<Assignment>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_question_type_defaults_to_short() {
        let q: AssignmentQuestion =
            serde_json::from_value(json!({ "question": "Define ownership" })).unwrap();
        assert_eq!(q.kind, QuestionType::Short);
        assert!(q.options.is_empty());
    }

    #[test]
    fn test_create_requires_question_text() {
        let dto: CreateAssignmentDto = serde_json::from_value(json!({
            "title": "Week 1",
            "dueDate": "2025-02-01",
            "questions": [{ "type": "mcq", "options": ["a", "b"] }]
        }))
        .unwrap();
        let message =
            learnhub_core::errors::format_validation_errors(&dto.validate().unwrap_err());
        assert_eq!(message, "Each question needs question text");
    }

    #[test]
    fn test_create_requires_due_date() {
        let dto: CreateAssignmentDto =
            serde_json::from_value(json!({ "title": "Week 1" })).unwrap();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("due_date"));
    }
}
