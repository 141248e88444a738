//! Pagination, sorting and search parameters shared by every list endpoint.
//!
//! List responses are flat: the pagination fields sit next to the items
//! instead of under a nested `meta` object.
//!
//! ```json
//! { "success": true, "count": 10, "total": 42, "page": 1, "totalPages": 5, "courses": [...] }
//! ```
//!
//! Sorting is only ever applied to whitelisted columns; see
//! [`PaginationParams::order_by`].

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Deserializes an optional string into an optional i64.
///
/// Query parameters may arrive as empty strings, which are treated as `None`.
fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s.trim().parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Query parameters accepted by list endpoints.
///
/// `page` is 1-indexed, `limit` is clamped to [1, 100] and defaults to 10.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    /// Items per page (1-100, default: 10)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
    /// Field to sort by (default: createdAt)
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default: desc)
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
    /// Case-insensitive substring search
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub search: Option<String>,
}

impl PaginationParams {
    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Saturates instead of overflowing for absurd `page` values; such a
    /// page simply comes back empty.
    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Search term wrapped for `ILIKE`, with LIKE metacharacters escaped.
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|s| {
            let escaped = s
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{}%", escaped)
        })
    }

    /// Builds an `ORDER BY` clause from a whitelist of `(wire name, column)`
    /// pairs. Unknown `sortBy` values fall back to `created_at`.
    pub fn order_by(&self, sortable: &[(&str, &str)]) -> String {
        let column = self
            .sort_by
            .as_deref()
            .and_then(|requested| {
                sortable
                    .iter()
                    .find(|(name, _)| *name == requested)
                    .map(|(_, column)| *column)
            })
            .unwrap_or("created_at");

        format!(
            "ORDER BY {} {}",
            column,
            self.sort_order.unwrap_or_default().as_sql()
        )
    }

    pub fn meta(&self, count: usize, total: i64) -> PaginationMeta {
        PaginationMeta::new(count, total, self.page(), self.limit())
    }
}

/// Pagination fields flattened into list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Number of items in this page
    pub count: usize,
    /// Total number of matching items
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(count: usize, total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            count,
            total,
            page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<i64>, limit: Option<i64>) -> PaginationParams {
        PaginationParams {
            page,
            limit,
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let p = params(None, None);
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 10);
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_offset_from_page() {
        let p = params(Some(3), Some(25));
        assert_eq!(p.offset(), 50);
    }

    #[test]
    fn test_offset_saturates_for_huge_page() {
        let p = params(Some(i64::MAX), Some(10));
        assert_eq!(p.page(), i64::MAX);
        assert_eq!(p.offset(), i64::MAX);
        assert_eq!(p.meta(0, 3).total_pages, 1);
    }

    #[test]
    fn test_clamping() {
        let p = params(Some(-4), Some(500));
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 100);

        let p = params(Some(0), Some(0));
        assert_eq!(p.limit(), 1);
    }

    #[test]
    fn test_deserialize_from_query_strings() {
        let json = r#"{"page":"2","limit":"5","sortBy":"courseName","sortOrder":"asc","search":"  rust "}"#;
        let p: PaginationParams = serde_json::from_str(json).unwrap();
        assert_eq!(p.page(), 2);
        assert_eq!(p.limit(), 5);
        assert_eq!(p.sort_by.as_deref(), Some("courseName"));
        assert_eq!(p.sort_order, Some(SortOrder::Asc));
        assert_eq!(p.search.as_deref(), Some("rust"));
    }

    #[test]
    fn test_deserialize_empty_strings() {
        let json = r#"{"page":"","limit":"","search":""}"#;
        let p: PaginationParams = serde_json::from_str(json).unwrap();
        assert_eq!(p.page(), 1);
        assert_eq!(p.limit(), 10);
        assert!(p.search.is_none());
    }

    #[test]
    fn test_order_by_whitelist() {
        let sortable = [("courseName", "course_name"), ("createdAt", "created_at")];

        let mut p = params(None, None);
        p.sort_by = Some("courseName".to_string());
        p.sort_order = Some(SortOrder::Asc);
        assert_eq!(p.order_by(&sortable), "ORDER BY course_name ASC");

        p.sort_by = Some("password; DROP TABLE courses".to_string());
        p.sort_order = None;
        assert_eq!(p.order_by(&sortable), "ORDER BY created_at DESC");
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let mut p = params(None, None);
        p.search = Some("50%_off".to_string());
        assert_eq!(p.search_pattern().as_deref(), Some("%50\\%\\_off%"));
    }

    #[test]
    fn test_meta_total_pages() {
        assert_eq!(PaginationMeta::new(10, 42, 1, 10).total_pages, 5);
        assert_eq!(PaginationMeta::new(0, 0, 1, 10).total_pages, 0);
        assert_eq!(PaginationMeta::new(10, 40, 4, 10).total_pages, 4);
    }

    #[test]
    fn test_meta_serializes_camel_case() {
        let meta = PaginationMeta::new(2, 12, 2, 10);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["count"], 2);
    }
}
