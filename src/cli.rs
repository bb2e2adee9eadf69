// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - sitemap: just walk the sitemap and list its pages
// - audit:   walk the sitemap, query Search Console, compare, write CSVs
//
// Secrets and the site URL can come from the environment so they don't end
// up in shell history (GOOGLE_APPLICATION_CREDENTIALS, GSC_ACCESS_TOKEN,
// GSC_SITE_URL).
//
// Rust concepts:
// - #[derive(Args)]: A struct of flags that a subcommand can hold as a whole
// - env = "...": clap reads the variable when the flag isn't given
// =============================================================================

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::AuditArgs;
use crate::sitemap::DEFAULT_MAX_DEPTH;

#[derive(Parser, Debug)]
#[command(
    name = "sitemap-audit",
    version,
    about = "Compare a sitemap with Google Search Console to find unindexed pages and index bloat",
    long_about = "sitemap-audit walks a sitemap index, pulls per-page data from Google Search Console \
                  and reports pages that are in the sitemap but never indexed, and indexed pages \
                  that are missing from the sitemap."
)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG overrides this.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// HTTP timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every page reachable from a sitemap or sitemap index
    ///
    /// Example: sitemap-audit sitemap https://example.com/sitemap_index.xml
    Sitemap {
        /// Sitemap or sitemap index URL
        sitemap_url: String,

        /// How many nested sitemap levels to follow below the root
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Output results in JSON format instead of a list
        #[arg(long)]
        json: bool,
    },

    /// Compare the sitemap with Search Console and write CSV reports
    ///
    /// Example: sitemap-audit audit https://example.com/sitemap_index.xml --site-url https://example.com/
    Audit(AuditCommand),
}

#[derive(Args, Debug)]
pub struct AuditCommand {
    /// Sitemap or sitemap index URL
    pub sitemap_url: String,

    /// Search Console property (e.g. https://example.com/ or sc-domain:example.com).
    /// Defaults to the first property the token can access.
    #[arg(long, env = "GSC_SITE_URL")]
    pub site_url: Option<String>,

    /// Service-account key file (JSON) used to log in to Search Console
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// OAuth access token with the webmasters.readonly scope.
    /// Takes precedence over --credentials.
    #[arg(long, env = "GSC_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Search Console API root (for testing against a local server)
    #[arg(long, hide = true)]
    pub api_base: Option<String>,

    /// First day of the report (YYYY-MM-DD). Defaults to 16 months before --end-date.
    #[arg(long)]
    pub start_date: Option<String>,

    /// Last day of the report (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub end_date: Option<String>,

    /// Maximum number of rows to request
    #[arg(long, default_value_t = 10_000)]
    pub row_limit: u32,

    /// Zero-based index of the first row to request
    #[arg(long, default_value_t = 0)]
    pub start_row: u32,

    /// Directory the CSV reports are written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// How many nested sitemap levels to follow below the root
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Output the reconciliation as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

impl AuditCommand {
    // Copies the parsed flags into the plain struct config.rs validates
    pub fn to_args(&self, timeout_secs: u64) -> AuditArgs {
        AuditArgs {
            sitemap_url: self.sitemap_url.clone(),
            site_url: self.site_url.clone(),
            access_token: self.access_token.clone(),
            credentials: self.credentials.clone(),
            api_base: self.api_base.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            row_limit: self.row_limit,
            start_row: self.start_row,
            output_dir: self.output_dir.clone(),
            max_depth: self.max_depth,
            timeout_secs,
        }
    }
}
