//! Visitor leads.

use chrono::{DateTime, Utc};
use learnhub_core::{PaginationMeta, PaginationParams};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::text_enum;

text_enum! {
    LeadStatus {
        New => "New",
        Contacted => "Contacted",
        Interested => "Interested",
        NotInterested => "Not Interested",
        Converted => "Converted",
    }
}

impl Default for LeadStatus {
    fn default() -> Self {
        LeadStatus::New
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Visitor {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVisitorDto {
    #[validate(
        required(message = "Please provide user name"),
        length(min = 2, max = 100, message = "User name must be between 2 and 100 characters")
    )]
    pub user_name: Option<String>,
    #[validate(
        required(message = "Please provide email"),
        email(message = "Please provide a valid email")
    )]
    pub email: Option<String>,
    pub status: Option<LeadStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVisitorDto {
    #[validate(length(min = 2, max = 100, message = "User name must be between 2 and 100 characters"))]
    pub user_name: Option<String>,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,
    pub status: Option<LeadStatus>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateVisitorsDto {
    #[serde(default)]
    pub visitor_ids: Vec<Uuid>,
    pub status: Option<LeadStatus>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateResponse {
    pub success: bool,
    pub message: String,
    pub modified_count: u64,
}

#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VisitorFilterParams {
    pub status: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VisitorResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub visitor: Visitor,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginatedVisitorsResponse {
    pub success: bool,
    #[serde(flatten)]
    pub meta: PaginationMeta,
    pub visitors: Vec<Visitor>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: i32,
    pub count: i64,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitorStats {
    pub total: i64,
    pub new: i64,
    pub contacted: i64,
    pub interested: i64,
    pub not_interested: i64,
    pub converted: i64,
    /// Leads created in the last 30 days
    pub recent_visitors: i64,
    /// Most recent 12 months with at least one lead, newest first
    pub monthly_breakdown: Vec<MonthlyCount>,
    pub conversion_rate: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VisitorStatsResponse {
    pub success: bool,
    pub statistics: VisitorStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_names() {
        let dto: UpdateVisitorDto =
            serde_json::from_value(json!({ "status": "Not Interested" })).unwrap();
        assert_eq!(dto.status, Some(LeadStatus::NotInterested));
        assert!(serde_json::from_value::<UpdateVisitorDto>(json!({ "status": "Lost" })).is_err());
    }

    #[test]
    fn test_create_validation() {
        let dto: CreateVisitorDto =
            serde_json::from_value(json!({ "userName": "A", "email": "lead@x.io" })).unwrap();
        let errors = dto.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("user_name"));

        let dto: CreateVisitorDto =
            serde_json::from_value(json!({ "userName": "Asad", "email": "lead@x.io" })).unwrap();
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_bulk_update_defaults_to_empty_ids() {
        let dto: BulkUpdateVisitorsDto =
            serde_json::from_value(json!({ "status": "Contacted" })).unwrap();
        assert!(dto.visitor_ids.is_empty());
    }
}
