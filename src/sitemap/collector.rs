// src/sitemap/collector.rs
// =============================================================================
// This module walks a sitemap index and collects every page URL in it.
//
// How it works:
// 1. Fetch the root sitemap
// 2. Pull out every <loc> entry, dropping wp-content noise
// 3. Entries ending in "xml" are sitemaps themselves: walk into them
// 4. Everything else is a page: append it to the shared list
//
// Failure rules:
// - A non-success status, a network error or malformed XML only abandons
//   that one document. Pages already collected from siblings are kept.
// - Each abandoned document is recorded as a BranchFailure so the caller can
//   report it.
//
// The walk is depth-first and one request at a time. A visited set stops
// sitemap loops and max_depth stops runaway nesting.
//
// Rust concepts:
// - &mut borrowing: Every level of the walk writes into the same WalkState
// - BoxFuture: Lets an async function call itself
// - Builder methods: with_max_depth() consumes self and returns it
// =============================================================================

use std::collections::HashSet;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use super::parse::{extract_locs, is_noise, is_sitemap_document};
use crate::error::{AuditError, Result};

// Deep enough for any real sitemap index, shallow enough to stop a generator
// that keeps producing new sitemap URLs
pub const DEFAULT_MAX_DEPTH: usize = 10;

// A sitemap document we had to give up on
#[derive(Debug, Clone, Serialize)]
pub struct BranchFailure {
    /// The sitemap URL that was abandoned
    pub url: String,
    /// Short label: "fetch", "http", "parse" or "depth"
    pub kind: &'static str,
    /// Human-readable reason
    pub message: String,
}

impl BranchFailure {
    fn new(url: String, error: &AuditError) -> Self {
        Self {
            url,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

// Everything one call to collect() found
#[derive(Debug, Default, Clone, Serialize)]
pub struct SitemapCrawl {
    /// Leaf page URLs in the order they were discovered
    pub pages: Vec<String>,
    /// Sitemap documents that were fetched and parsed
    pub sitemaps: Vec<String>,
    /// Sitemap documents that were abandoned
    pub failures: Vec<BranchFailure>,
}

// Mutable state for one traversal
//
// A fresh one is made per collect() call, so two calls on the same
// collector never see each other's pages.
struct WalkState {
    crawl: SitemapCrawl,
    visited: HashSet<String>,
}

impl WalkState {
    // Records a failed document and logs it; the walk carries on
    fn abandon(&mut self, url: String, error: AuditError) {
        warn!("Abandoning sitemap branch {}: {}", url, error);
        self.crawl.failures.push(BranchFailure::new(url, &error));
    }
}

pub struct SitemapCollector {
    client: Client,
    max_depth: usize,
}

impl SitemapCollector {
    // Creates a collector with its own HTTP client
    //
    // Parameters:
    //   timeout: per-request timeout for sitemap fetches
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("sitemap-audit/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self::with_client(client))
    }

    // Creates a collector around an existing client
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    // Maximum number of nested sitemap levels below the root (root is 0)
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    // Resolves root_url into the flat list of pages reachable from it
    //
    // Returns: Err only if root_url isn't a valid URL. A root that fails to
    // fetch or parse gives an empty crawl with one recorded failure.
    pub async fn collect(&self, root_url: &str) -> Result<SitemapCrawl> {
        // Validate up front so a typo isn't reported as a "skipped sitemap"
        Url::parse(root_url)
            .map_err(|e| AuditError::InvalidUrl(format!("'{}': {}", root_url, e)))?;

        info!("Collecting sitemap links from {}", root_url);

        let mut state = WalkState {
            crawl: SitemapCrawl::default(),
            visited: HashSet::new(),
        };
        self.walk(root_url.to_string(), 0, &mut state).await;

        info!(
            pages = state.crawl.pages.len(),
            sitemaps = state.crawl.sitemaps.len(),
            failures = state.crawl.failures.len(),
            "Sitemap collection finished"
        );

        Ok(state.crawl)
    }

    // Visits one sitemap document, then recurses into its child sitemaps
    //
    // Async fns can't call themselves directly (the future would have
    // infinite size), so each level is boxed.
    fn walk<'a>(&'a self, url: String, depth: usize, state: &'a mut WalkState) -> BoxFuture<'a, ()> {
        async move {
            // A document we already read is not a failure, even if this
            // second mention of it sits below the depth limit
            if state.visited.contains(&url) {
                debug!("Already visited {}, skipping", url);
                return;
            }

            // Not marked visited: a shallower mention may still read it
            if depth > self.max_depth {
                let error = AuditError::DepthLimit {
                    url: url.clone(),
                    depth: self.max_depth,
                };
                state.abandon(url, error);
                return;
            }

            state.visited.insert(url.clone());
            debug!("Fetching sitemap [depth {}]: {}", depth, url);

            let body = match self.fetch(&url).await {
                Ok(body) => body,
                Err(e) => {
                    state.abandon(url, e);
                    return;
                }
            };

            // A parse error drops the whole document, not just the tail
            let locs = match extract_locs(&body) {
                Ok(locs) => locs,
                Err(message) => {
                    let error = AuditError::Parse {
                        url: url.clone(),
                        message,
                    };
                    state.abandon(url, error);
                    return;
                }
            };

            state.crawl.sitemaps.push(url);

            for loc in locs.into_iter().filter(|loc| !is_noise(loc)) {
                if is_sitemap_document(&loc) {
                    // Same state, one level deeper
                    self.walk(loc, depth + 1, state).await;
                } else {
                    state.crawl.pages.push(loc);
                }
            }
        }
        .boxed()
    }

    // Fetches a sitemap and returns its body
    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuditError::Fetch {
                url: url.to_string(),
                status,
            });
        }

        Ok(response.text().await?)
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why pass &mut WalkState instead of returning a Vec from each level?
//    - Every level appends to the same list, in discovery order
//    - A failed level simply returns early; what siblings collected stays
//
// 2. What does .boxed() do?
//    - Puts the future on the heap and gives it a fixed size
//    - Needed because walk() awaits another walk() inside itself
//
// 3. Why check visited before the depth limit?
//    - A loop like a.xml -> b.xml -> a.xml mentions a.xml again one level
//      deeper; it was already read, so there's nothing to report
// -----------------------------------------------------------------------------
