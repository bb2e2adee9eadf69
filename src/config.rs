// src/config.rs
// =============================================================================
// This module turns raw command-line values into a checked AuditConfig.
//
// clap already handles flags and environment variables. What's left here is
// the stuff clap can't know about:
// - Picking how we log in (pasted access token or service-account key file)
// - Parsing YYYY-MM-DD dates and filling in the default date range
// - Making sure start_date <= end_date
// - Keeping row_limit within what Search Console accepts
//
// Rust concepts:
// - Enums with data: GscAuth holds either a token or a file path
// - Option combinators: filter() and ok_or_else() instead of nested ifs
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, Months, NaiveDate};

use crate::error::{AuditError, Result};
use crate::gsc::{QueryPayload, DEFAULT_API_BASE, MAX_ROW_LIMIT};

// Search Console keeps about 16 months of data
const DEFAULT_LOOKBACK_MONTHS: u32 = 16;

// Options for an `audit` run as typed by the user
#[derive(Debug, Clone, Default)]
pub struct AuditArgs {
    pub sitemap_url: String,
    pub site_url: Option<String>,
    pub access_token: Option<String>,
    pub credentials: Option<PathBuf>,
    pub api_base: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub row_limit: u32,
    pub start_row: u32,
    pub output_dir: PathBuf,
    pub max_depth: usize,
    pub timeout_secs: u64,
}

// How we authenticate against Search Console
#[derive(Debug, Clone, PartialEq)]
pub enum GscAuth {
    /// A ready-made OAuth access token (--access-token)
    AccessToken(String),
    /// A service-account key file to log in with (--credentials)
    ServiceAccount(PathBuf),
}

#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub sitemap_url: String,
    pub site_url: Option<String>,
    pub auth: GscAuth,
    pub api_base: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub row_limit: u32,
    pub start_row: u32,
    pub output_dir: PathBuf,
    pub max_depth: usize,
    pub timeout: Duration,
}

impl AuditConfig {
    // Validates `args`, using `today` for the default end date
    //
    // Taking `today` as a parameter keeps the tests independent of the clock
    pub fn from_args(args: AuditArgs, today: NaiveDate) -> Result<Self> {
        let auth = pick_auth(args.access_token, args.credentials)?;

        let end_date = match args.end_date.as_deref() {
            Some(raw) => parse_date("end date", raw)?,
            None => today,
        };
        let start_date = match args.start_date.as_deref() {
            Some(raw) => parse_date("start date", raw)?,
            // checked_sub_months clamps e.g. June 30 -> February 28
            None => end_date
                .checked_sub_months(Months::new(DEFAULT_LOOKBACK_MONTHS))
                .unwrap_or(end_date),
        };

        if start_date > end_date {
            return Err(AuditError::InvalidConfig(format!(
                "start date {} is after end date {}",
                start_date, end_date
            )));
        }

        if args.row_limit == 0 || args.row_limit > MAX_ROW_LIMIT {
            return Err(AuditError::InvalidConfig(format!(
                "row limit must be between 1 and {}, got {}",
                MAX_ROW_LIMIT, args.row_limit
            )));
        }

        Ok(Self {
            sitemap_url: args.sitemap_url,
            site_url: args.site_url.filter(|site| !site.trim().is_empty()),
            auth,
            api_base: args.api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            start_date,
            end_date,
            row_limit: args.row_limit,
            start_row: args.start_row,
            output_dir: args.output_dir,
            max_depth: args.max_depth,
            timeout: Duration::from_secs(args.timeout_secs),
        })
    }

    // Same as from_args() with today's local date
    pub fn from_args_today(args: AuditArgs) -> Result<Self> {
        Self::from_args(args, Local::now().date_naive())
    }

    pub fn query_payload(&self) -> QueryPayload {
        QueryPayload::pages(self.start_date, self.end_date, self.row_limit, self.start_row)
    }
}

// An explicit access token wins over a key file, so a token can be used to
// override GOOGLE_APPLICATION_CREDENTIALS set in the environment
fn pick_auth(access_token: Option<String>, credentials: Option<PathBuf>) -> Result<GscAuth> {
    if let Some(token) = access_token.filter(|token| !token.trim().is_empty()) {
        return Ok(GscAuth::AccessToken(token));
    }

    credentials
        .filter(|path| !path.as_os_str().is_empty())
        .map(GscAuth::ServiceAccount)
        .ok_or_else(|| {
            AuditError::Auth(
                "no credentials (pass --credentials <service-account.json> or --access-token)"
                    .to_string(),
            )
        })
}

fn parse_date(label: &str, raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| {
        AuditError::InvalidConfig(format!("{} '{}' is not YYYY-MM-DD: {}", label, raw, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> AuditArgs {
        AuditArgs {
            sitemap_url: "https://example.com/sitemap_index.xml".to_string(),
            access_token: Some("token".to_string()),
            row_limit: 10_000,
            output_dir: PathBuf::from("."),
            max_depth: 10,
            timeout_secs: 30,
            ..Default::default()
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_date_range() {
        let config = AuditConfig::from_args(args(), day(2024, 6, 30)).unwrap();
        assert_eq!(config.end_date, day(2024, 6, 30));
        assert_eq!(config.start_date, day(2023, 2, 28));
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_explicit_dates() {
        let mut raw = args();
        raw.start_date = Some("2023-01-01".to_string());
        raw.end_date = Some("2023-12-31".to_string());

        let config = AuditConfig::from_args(raw, day(2024, 6, 30)).unwrap();
        let payload = config.query_payload();
        assert_eq!(payload.start_date, "2023-01-01");
        assert_eq!(payload.end_date, "2023-12-31");
        assert_eq!(payload.dimensions, vec!["page"]);
        assert_eq!(payload.row_limit, 10_000);
    }

    #[test]
    fn test_rejects_reversed_dates() {
        let mut raw = args();
        raw.start_date = Some("2024-02-01".to_string());
        raw.end_date = Some("2024-01-01".to_string());
        assert!(matches!(
            AuditConfig::from_args(raw, day(2024, 6, 30)),
            Err(AuditError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_bad_date_format() {
        let mut raw = args();
        raw.start_date = Some("01/02/2024".to_string());
        assert!(AuditConfig::from_args(raw, day(2024, 6, 30)).is_err());
    }

    #[test]
    fn test_row_limit_bounds() {
        let mut raw = args();
        raw.row_limit = 0;
        assert!(AuditConfig::from_args(raw, day(2024, 6, 30)).is_err());

        let mut raw = args();
        raw.row_limit = MAX_ROW_LIMIT + 1;
        assert!(AuditConfig::from_args(raw, day(2024, 6, 30)).is_err());
    }

    #[test]
    fn test_missing_credentials_is_an_auth_error() {
        let mut raw = args();
        raw.access_token = None;
        assert!(matches!(
            AuditConfig::from_args(raw, day(2024, 6, 30)),
            Err(AuditError::Auth(_))
        ));
    }

    #[test]
    fn test_key_file_used_without_token() {
        let mut raw = args();
        raw.access_token = None;
        raw.credentials = Some(PathBuf::from("/keys/service-account.json"));

        let config = AuditConfig::from_args(raw, day(2024, 6, 30)).unwrap();
        assert_eq!(
            config.auth,
            GscAuth::ServiceAccount(PathBuf::from("/keys/service-account.json"))
        );
    }

    #[test]
    fn test_access_token_overrides_key_file() {
        let mut raw = args();
        raw.credentials = Some(PathBuf::from("/keys/service-account.json"));
        raw.api_base = Some("http://127.0.0.1:9000".to_string());

        let config = AuditConfig::from_args(raw, day(2024, 6, 30)).unwrap();
        assert_eq!(config.auth, GscAuth::AccessToken("token".to_string()));
        assert_eq!(config.api_base, "http://127.0.0.1:9000");
    }
}
