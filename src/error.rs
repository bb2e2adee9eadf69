// src/error.rs
// =============================================================================
// Error types shared by the sitemap collector, the Search Console client and
// the report writer.
//
// Two groups of errors exist:
// - Branch errors (Fetch, Http during a crawl, Parse, DepthLimit): one sitemap
//   document is skipped and the crawl carries on
// - Fatal errors (Auth, Query, InvalidUrl, InvalidConfig, Io): the run stops
//
// main.rs wraps these in anyhow for reporting, the same way the rest of the
// binary glue does.
//
// Rust concepts:
// - #[from]: Lets `?` convert reqwest and io errors into AuditError for us
// =============================================================================

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("request to {url} failed with status code {status}")]
    Fetch { url: String, status: StatusCode },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not parse sitemap {url}: {message}")]
    Parse { url: String, message: String },

    #[error("skipped {url}: nested deeper than {depth} sitemap levels")]
    DepthLimit { url: String, depth: usize },

    #[error("Search Console authentication failed: {0}")]
    Auth(String),

    #[error("Search Console query failed: {0}")]
    Query(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AuditError {
    // Short label used in crawl summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            AuditError::Fetch { .. } => "fetch",
            AuditError::Http(_) => "http",
            AuditError::Parse { .. } => "parse",
            AuditError::DepthLimit { .. } => "depth",
            AuditError::Auth(_) => "auth",
            AuditError::Query(_) => "query",
            AuditError::InvalidUrl(_) => "url",
            AuditError::InvalidConfig(_) => "config",
            AuditError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message_includes_status() {
        let err = AuditError::Fetch {
            url: "https://example.com/sitemap.xml".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = err.to_string();
        assert!(message.contains("https://example.com/sitemap.xml"));
        assert!(message.contains("500"));
        assert_eq!(err.kind(), "fetch");
    }
}
