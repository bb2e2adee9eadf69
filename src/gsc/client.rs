// src/gsc/client.rs
// =============================================================================
// A thin client for the two Search Console endpoints we need:
// - GET  sites                                 (which properties can we read?)
// - POST sites/{siteUrl}/searchAnalytics/query (per-page clicks/impressions)
//
// Authentication is an OAuth bearer token. It either comes straight from the
// user (--access-token) or from auth.rs, which trades a service-account key
// file for one.
//
// Unlike sitemap fetches, every failure here is fatal: without Search
// Console data there is nothing to reconcile against.
//
// Rust concepts:
// - impl Into<String>: new() accepts both &str and String
// - Builder-style methods: with_api_base() takes self and hands it back
// =============================================================================

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::{debug, info};
use url::Url;

use super::types::{QueryPayload, QueryResponse, SearchRow, SiteEntry, SitesResponse};
use crate::error::{AuditError, Result};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/webmasters/v3";

pub struct SearchConsoleClient {
    client: Client,
    api_base: Url,
    access_token: String,
}

impl SearchConsoleClient {
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(AuditError::Auth(
                "no access token (pass --access-token or --credentials)".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(concat!("sitemap-audit/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: parse_base(DEFAULT_API_BASE)?,
            access_token,
        })
    }

    // Points the client at another API root (the hidden --api-base flag,
    // and the wiremock server in tests)
    pub fn with_api_base(mut self, api_base: &str) -> Result<Self> {
        self.api_base = parse_base(api_base)?;
        Ok(self)
    }

    // Lists the properties the token can read
    //
    // Used when the user didn't pass --site-url
    pub async fn list_sites(&self) -> Result<Vec<SiteEntry>> {
        let url = self.endpoint(&["sites"])?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let response = check_status(response, "listing sites").await?;

        let sites: SitesResponse = response.json().await?;
        Ok(sites.site_entry)
    }

    // Runs one bounded search analytics query (no pagination)
    //
    // Parameters:
    //   site_url: the property, e.g. "https://example.com/" or "sc-domain:example.com"
    //   payload: dates, dimensions and row window
    //
    // Returns: one SearchRow per API row, in the order the API sent them
    pub async fn query(&self, site_url: &str, payload: &QueryPayload) -> Result<Vec<SearchRow>> {
        let url = self.endpoint(&["sites", site_url, "searchAnalytics", "query"])?;
        info!(
            site = site_url,
            start = %payload.start_date,
            end = %payload.end_date,
            row_limit = payload.row_limit,
            "Querying Search Console"
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(payload)
            .send()
            .await?;
        let response = check_status(response, "querying search analytics").await?;

        // keys[i] only makes sense next to dimensions[i], so pass both along
        let body: QueryResponse = response.json().await?;
        body.rows
            .into_iter()
            .map(|row| SearchRow::from_api(row, &payload.dimensions))
            .collect()
    }

    // Each segment is percent-encoded, so a site URL like
    // "https://example.com/" stays a single path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| AuditError::InvalidUrl(format!("cannot use {} as API base", self.api_base)))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }
}

fn parse_base(api_base: &str) -> Result<Url> {
    Url::parse(api_base).map_err(|e| AuditError::InvalidUrl(format!("'{}': {}", api_base, e)))
}

// Turns a non-success response into Auth (401/403) or Query (anything else)
async fn check_status(response: Response, action: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    // The error body is JSON with a human-readable message; show it as-is
    let body = response.text().await.unwrap_or_default();
    let detail = format!("{} returned HTTP {}: {}", action, status.as_u16(), body.trim());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuditError::Auth(detail)),
        _ => Err(AuditError::Query(detail)),
    }
}
