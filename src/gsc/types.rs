// src/gsc/types.rs
// =============================================================================
// Request and response shapes for the Search Console "searchAnalytics.query"
// and "sites.list" endpoints, plus our own cleaned-up row type.
//
// The API returns rows like:
//   { "keys": ["https://example.com/"], "clicks": 3, "impressions": 120,
//     "ctr": 0.025, "position": 7.4166 }
//
// keys[i] belongs to dimensions[i] of the request, so we need the request's
// dimension list to know which key is the page.
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AuditError, Result};

pub const PAGE_DIMENSION: &str = "page";

// Search Console refuses anything larger in a single request
pub const MAX_ROW_LIMIT: u32 = 25_000;

// Body of POST sites/{siteUrl}/searchAnalytics/query
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPayload {
    pub start_date: String,
    pub end_date: String,
    pub dimensions: Vec<String>,
    pub row_limit: u32,
    pub start_row: u32,
}

impl QueryPayload {
    // A query grouped by page over `[start, end]`.
    pub fn pages(start: NaiveDate, end: NaiveDate, row_limit: u32, start_row: u32) -> Self {
        Self {
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: end.format("%Y-%m-%d").to_string(),
            dimensions: vec![PAGE_DIMENSION.to_string()],
            row_limit,
            start_row,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    // Absent when the date range has no data
    #[serde(default)]
    pub rows: Vec<ApiRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiRow {
    #[serde(default)]
    pub keys: Vec<String>,
    pub clicks: f64,
    pub impressions: f64,
    pub ctr: f64,
    pub position: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SitesResponse {
    #[serde(default, rename = "siteEntry")]
    pub site_entry: Vec<SiteEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEntry {
    pub site_url: String,
    #[serde(default)]
    pub permission_level: Option<String>,
}

// Numbers Search Console reports for one page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub clicks: u64,
    pub impressions: u64,
    /// Click-through rate as a percentage, two decimals.
    pub ctr: f64,
    /// Average position, two decimals.
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRow {
    pub page: String,
    #[serde(flatten)]
    pub metrics: Metrics,
}

impl SearchRow {
    // Maps an API row back onto the dimensions it was requested with
    pub(crate) fn from_api(row: ApiRow, dimensions: &[String]) -> Result<Self> {
        let page_index = dimensions
            .iter()
            .position(|d| d == PAGE_DIMENSION)
            .ok_or_else(|| AuditError::Query("query has no 'page' dimension".to_string()))?;

        let page = row.keys.get(page_index).cloned().ok_or_else(|| {
            AuditError::Query(format!(
                "row has {} key(s) but {} dimension(s) were requested",
                row.keys.len(),
                dimensions.len()
            ))
        })?;

        Ok(Self {
            page,
            metrics: Metrics {
                clicks: to_count(row.clicks),
                impressions: to_count(row.impressions),
                ctr: round2(row.ctr * 100.0),
                position: round2(row.position),
            },
        })
    }
}

// The API sends counts as JSON numbers that may carry a ".0"
fn to_count(value: f64) -> u64 {
    value.max(0.0).round() as u64
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_row(keys: &[&str]) -> ApiRow {
        ApiRow {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            clicks: 3.0,
            impressions: 120.0,
            ctr: 0.025,
            position: 7.41666,
        }
    }

    #[test]
    fn test_payload_serializes_in_api_shape() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let payload = QueryPayload::pages(start, end, 10_000, 0);

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "startDate": "2023-01-01",
                "endDate": "2024-03-15",
                "dimensions": ["page"],
                "rowLimit": 10000,
                "startRow": 0
            })
        );
    }

    #[test]
    fn test_row_mapping_rounds_metrics() {
        let row = SearchRow::from_api(api_row(&["https://example.com/"]), &["page".to_string()])
            .unwrap();

        assert_eq!(row.page, "https://example.com/");
        assert_eq!(row.metrics.clicks, 3);
        assert_eq!(row.metrics.impressions, 120);
        assert_eq!(row.metrics.ctr, 2.5);
        assert_eq!(row.metrics.position, 7.42);
    }

    #[test]
    fn test_row_mapping_follows_dimension_order() {
        let dimensions = vec!["query".to_string(), "page".to_string()];
        let row = SearchRow::from_api(api_row(&["rust sitemap", "https://example.com/b"]), &dimensions)
            .unwrap();
        assert_eq!(row.page, "https://example.com/b");
    }

    #[test]
    fn test_row_without_page_key_is_rejected() {
        let result = SearchRow::from_api(api_row(&[]), &["page".to_string()]);
        assert!(matches!(result, Err(AuditError::Query(_))));

        let result = SearchRow::from_api(api_row(&["x"]), &["query".to_string()]);
        assert!(matches!(result, Err(AuditError::Query(_))));
    }

    #[test]
    fn test_missing_rows_deserialize_as_empty() {
        let response: QueryResponse =
            serde_json::from_str(r#"{"responseAggregationType": "byPage"}"#).unwrap();
        assert!(response.rows.is_empty());
    }
}
