//! Quizzes with embedded questions.

use chrono::{DateTime, Utc};
use learnhub_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::QuestionType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct QuizQuestion {
    #[serde(rename = "type")]
    pub kind: QuestionType,
    #[validate(required(message = "Each question needs question text"))]
    pub question: Option<String>,
    #[validate(required(message = "Each question needs an answer"))]
    pub answer: Option<String>,
    #[serde(default)]
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub valid_till: DateTime<Utc>,
    pub total_marks: i64,
    pub allow_multiple: bool,
    pub file: Option<String>,
    #[schema(value_type = Vec<QuizQuestion>)]
    pub questions: Json<Vec<QuizQuestion>>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizDto {
    #[validate(
        required(message = "Please provide title"),
        length(min = 1, message = "Please provide title")
    )]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(required(message = "Please provide valid till date"))]
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_datetime")]
    pub valid_till: Option<DateTime<Utc>>,
    #[validate(
        required(message = "Please provide total marks"),
        range(min = 0, message = "Total marks cannot be negative")
    )]
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_i64")]
    pub total_marks: Option<i64>,
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_bool")]
    pub allow_multiple: Option<bool>,
    #[validate(nested)]
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuizDto {
    #[validate(length(min = 1, message = "Please provide title"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_datetime")]
    pub valid_till: Option<DateTime<Utc>>,
    #[validate(range(min = 0, message = "Total marks cannot be negative"))]
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_i64")]
    pub total_marks: Option<i64>,
    #[serde(default, deserialize_with = "learnhub_core::serde::flexible_bool")]
    pub allow_multiple: Option<bool>,
    #[validate(nested)]
    pub questions: Option<Vec<QuizQuestion>>,
}

impl UpdateQuizDto {
    pub fn merge_into(self, existing: Quiz) -> Quiz {
        Quiz {
            title: self.title.unwrap_or(existing.title),
            description: self.description.or(existing.description),
            valid_till: self.valid_till.unwrap_or(existing.valid_till),
            total_marks: self.total_marks.unwrap_or(existing.total_marks),
            allow_multiple: self.allow_multiple.unwrap_or(existing.allow_multiple),
            questions: self.questions.map(Json).unwrap_or(existing.questions),
            ..existing
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuizFilterParams {
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuizResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub quiz: Quiz,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedQuizzesResponse {
    pub success: bool,
    #[serde(flatten)]
    pub meta: PaginationMeta,
    pub quizzes: Vec<Quiz>,
}
