// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap and set up logging
// 2. Dispatch to the appropriate subcommand handler
// 3. Print results and write the CSV reports
// 4. Exit with proper code (0 = clean, 1 = issues found, 2 = error)
//
// The audit runs strictly in order: sitemap walk, then the Search Console
// query, then reconciliation. Only sitemap problems are survivable; an auth
// or query failure ends the run.
//
// Rust concepts:
// - anyhow::Context: Wraps a library error with what we were doing at the time
// - match on enums: GscAuth decides whether we need to log in first
// =============================================================================

mod cli;
mod config;
mod error;
mod gsc;
mod reconcile;
mod report;
mod sitemap;

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{AuditCommand, Cli, Commands};
use config::{AuditConfig, GscAuth};
use gsc::{request_access_token, SearchConsoleClient, ServiceAccountKey};
use reconcile::{MergedRow, Reconciliation};
use report::ReportFiles;
use sitemap::{BranchFailure, SitemapCollector, SitemapCrawl};

// How many zero-click rows the terminal summary shows
const ZERO_CLICK_PREVIEW: usize = 20;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so stdout stays clean for --json
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sitemap_audit={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// Returns:
//   Ok(0) = no unindexed pages and no index bloat
//   Ok(1) = issues found
//   Err   = anything fatal (main turns it into exit code 2)
async fn run(cli: Cli) -> Result<i32> {
    let timeout_secs = cli.timeout;

    match cli.command {
        Commands::Sitemap { sitemap_url, max_depth, json } => {
            handle_sitemap(&sitemap_url, max_depth, json, Duration::from_secs(timeout_secs)).await
        }
        Commands::Audit(audit) => handle_audit(&audit, timeout_secs).await,
    }
}

// Handles the 'sitemap' subcommand: walk and list, nothing else
async fn handle_sitemap(sitemap_url: &str, max_depth: usize, json: bool, timeout: Duration) -> Result<i32> {
    let crawl = SitemapCollector::new(timeout)?
        .with_max_depth(max_depth)
        .collect(sitemap_url)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&crawl)?);
        return Ok(0);
    }

    for page in &crawl.pages {
        println!("{}", page);
    }
    println!();
    println!("📄 Total sitemap links: {}", crawl.pages.len());
    println!("🗺️  Sitemaps read: {}", crawl.sitemaps.len());
    print_failures(&crawl.failures);

    Ok(0)
}

// What --json prints for a full audit
#[derive(Serialize)]
struct AuditOutput<'a> {
    site_url: &'a str,
    start_date: String,
    end_date: String,
    sitemap_failures: &'a [BranchFailure],
    reconciliation: &'a Reconciliation,
}

// Handles the 'audit' subcommand
async fn handle_audit(audit: &AuditCommand, timeout_secs: u64) -> Result<i32> {
    let config = AuditConfig::from_args_today(audit.to_args(timeout_secs))?;
    let json = audit.json;

    if !json {
        println!("🔍 Collecting sitemap links from: {}", config.sitemap_url);
    }
    let crawl = collect_sitemap(&config).await?;
    if !json {
        println!("📄 Total sitemap links: {}", crawl.pages.len());
        print_failures(&crawl.failures);
    }

    let access_token = resolve_access_token(&config).await?;
    let client = SearchConsoleClient::new(access_token, config.timeout)?
        .with_api_base(&config.api_base)?;
    let site_url = match &config.site_url {
        Some(site) => site.clone(),
        None => discover_site(&client).await?,
    };

    if !json {
        println!(
            "🌐 Querying Search Console for {} ({} to {})",
            site_url, config.start_date, config.end_date
        );
    }
    let rows = client
        .query(&site_url, &config.query_payload())
        .await
        .with_context(|| format!("could not load Search Console data for {}", site_url))?;
    info!(rows = rows.len(), "Search Console rows loaded");

    let result = reconcile::reconcile(&crawl.pages, &rows);
    let files = report::write_reports(&config.output_dir, &result)
        .with_context(|| format!("could not write reports to {}", config.output_dir.display()))?;

    if json {
        let output = AuditOutput {
            site_url: &site_url,
            start_date: config.start_date.to_string(),
            end_date: config.end_date.to_string(),
            sitemap_failures: &crawl.failures,
            reconciliation: &result,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("📊 Search Console pages: {}", rows.len());
        print_summary(&result, &files);
    }

    Ok(if result.has_issues() { 1 } else { 0 })
}

// Walks the sitemap. A root that couldn't be read at all would make every
// indexed page look like bloat, so that case stops the audit.
async fn collect_sitemap(config: &AuditConfig) -> Result<SitemapCrawl> {
    let crawl = SitemapCollector::new(config.timeout)?
        .with_max_depth(config.max_depth)
        .collect(&config.sitemap_url)
        .await?;

    if crawl.sitemaps.is_empty() {
        let reason = crawl
            .failures
            .first()
            .map(|f| f.message.clone())
            .unwrap_or_else(|| "no sitemap documents were read".to_string());
        return Err(anyhow!("could not read sitemap {}: {}", config.sitemap_url, reason));
    }

    Ok(crawl)
}

// Turns the configured credentials into a bearer token
//
// A pasted token is used as-is; a key file costs one round trip to the
// token endpoint named inside it
async fn resolve_access_token(config: &AuditConfig) -> Result<String> {
    match &config.auth {
        GscAuth::AccessToken(token) => Ok(token.clone()),
        GscAuth::ServiceAccount(path) => {
            let key = ServiceAccountKey::from_file(path)?;
            info!(account = %key.client_email, "Logging in with service account");
            let token = request_access_token(&key, config.timeout)
                .await
                .with_context(|| format!("could not log in as {}", key.client_email))?;
            Ok(token)
        }
    }
}

// Falls back to the first property the token can see
async fn discover_site(client: &SearchConsoleClient) -> Result<String> {
    let sites = client
        .list_sites()
        .await
        .context("could not list Search Console properties")?;

    let site = sites
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("the access token can't see any Search Console property; pass --site-url"))?;

    info!(site = %site.site_url, "Using first Search Console property");
    Ok(site.site_url)
}

fn print_failures(failures: &[BranchFailure]) {
    if failures.is_empty() {
        return;
    }

    println!("⚠️  {} sitemap(s) skipped:", failures.len());
    for failure in failures {
        println!("   [{}] {}", failure.kind, failure.message);
    }
}

// Prints the counts, the zero-click table and where the CSVs went
fn print_summary(result: &Reconciliation, files: &ReportFiles) {
    let summary = &result.summary;

    println!();
    println!("📊 Summary:");
    println!("   📋 Total links: {}", summary.all_pages);
    println!("   🔗 Shared links: {}", summary.shared_pages);
    println!("   ❌ Not indexed: {}", summary.not_indexed);
    println!("   🎈 Index bloat: {}", summary.index_bloat);
    println!("   😶 Zero-click pages: {}", summary.zero_click_pages);
    println!();

    if !result.zero_click_pages.is_empty() {
        print_zero_click_table(&result.zero_click_pages);
        println!();
    }

    println!("💾 Wrote {}", files.not_indexed.display());
    println!("💾 Wrote {}", files.index_bloat.display());
}

fn print_zero_click_table(rows: &[MergedRow]) {
    println!("{:<70} {:>12} {:>8} {:>9}", "PAGE", "IMPRESSIONS", "CTR", "POSITION");
    println!("{}", "=".repeat(102));

    for row in rows.iter().take(ZERO_CLICK_PREVIEW) {
        // Truncate URL if too long for display
        let page = if row.page.chars().count() > 67 {
            format!("{}...", row.page.chars().take(67).collect::<String>())
        } else {
            row.page.clone()
        };

        match row.metrics {
            Some(m) => println!(
                "{:<70} {:>12} {:>8.2} {:>9.2}",
                page, m.impressions, m.ctr, m.position
            ),
            None => println!("{:<70} {:>12} {:>8} {:>9}", page, "-", "-", "-"),
        }
    }

    if rows.len() > ZERO_CLICK_PREVIEW {
        println!("... and {} more", rows.len() - ZERO_CLICK_PREVIEW);
    }
}
