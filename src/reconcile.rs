// src/reconcile.rs
// =============================================================================
// This module compares the sitemap against what Search Console reports.
//
// Given:
//   sitemap pages: what the site says exists
//   gsc rows:      what Google says it showed in search results
//
// We work out:
//   merged:            every sitemap page with its metrics (or None)
//   zero_click_pages:  merged pages that got no clicks, most impressions first
//   not_indexed:       in the sitemap, never reported by Search Console
//   index_bloat:       reported by Search Console, missing from the sitemap
//
// Sets are BTreeSets so every listing comes out sorted and repeatable.
// Nothing here does IO; writing CSVs is report.rs's job.
//
// Rust concepts:
// - BTreeSet: A sorted set with union/intersection/difference built in
// - Option<T>: "No data" is None, not a fake zero
// - Stable sort: sort_by leaves ties in input order
// =============================================================================

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::gsc::{Metrics, SearchRow};

// One sitemap page after the join. metrics is None when Search Console never
// reported the page, which is not the same as reporting zero clicks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedRow {
    pub page: String,
    pub metrics: Option<Metrics>,
}

impl MergedRow {
    // None when the page was never reported
    pub fn clicks(&self) -> Option<u64> {
        self.metrics.map(|m| m.clicks)
    }

    // None when the page was never reported
    pub fn impressions(&self) -> Option<u64> {
        self.metrics.map(|m| m.impressions)
    }

    // Unreported pages count as "no clicks" too
    fn has_no_clicks(&self) -> bool {
        self.clicks().map_or(true, |clicks| clicks < 1)
    }
}

// Sizes of each result, for the terminal summary and --json
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconciliationSummary {
    pub sitemap_pages: usize,
    pub gsc_pages: usize,
    pub merged: usize,
    pub all_pages: usize,
    pub shared_pages: usize,
    pub not_indexed: usize,
    pub index_bloat: usize,
    pub zero_click_pages: usize,
}

// The full result of one comparison
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
    /// Every distinct sitemap page, in first-seen order
    pub merged: Vec<MergedRow>,
    /// Merged pages without clicks, most impressions first
    pub zero_click_pages: Vec<MergedRow>,
    /// Sitemap pages plus reported pages
    pub all_pages: BTreeSet<String>,
    /// Pages in both the sitemap and Search Console
    pub shared_pages: BTreeSet<String>,
    /// In the sitemap but never reported
    pub not_indexed: BTreeSet<String>,
    /// Reported but not in the sitemap
    pub index_bloat: BTreeSet<String>,
    pub summary: ReconciliationSummary,
}

impl Reconciliation {
    // True if there is anything to fix (decides exit code 1)
    pub fn has_issues(&self) -> bool {
        !self.not_indexed.is_empty() || !self.index_bloat.is_empty()
    }
}

// Compares sitemap pages with Search Console rows
//
// Parameters:
//   sitemap_pages: pages from the sitemap, duplicates allowed
//   gsc_rows: rows from the search analytics query
//
// Returns: Reconciliation with all derived sets and their counts
pub fn reconcile(sitemap_pages: &[String], gsc_rows: &[SearchRow]) -> Reconciliation {
    // Collecting into a set drops duplicates for us
    let sitemap_set: BTreeSet<String> = sitemap_pages.iter().cloned().collect();
    let gsc_pages: BTreeSet<String> = gsc_rows.iter().map(|row| row.page.clone()).collect();

    // First row wins if the API ever repeats a page
    let mut metrics_by_page: HashMap<&str, Metrics> = HashMap::new();
    for row in gsc_rows {
        metrics_by_page.entry(row.page.as_str()).or_insert(row.metrics);
    }

    // Right join onto the sitemap: each distinct page once, first-seen order
    let mut seen: HashSet<&str> = HashSet::new();
    let mut merged: Vec<MergedRow> = Vec::new();
    for page in sitemap_pages {
        if seen.insert(page.as_str()) {
            merged.push(MergedRow {
                page: page.clone(),
                metrics: metrics_by_page.get(page.as_str()).copied(),
            });
        }
    }

    let mut zero_click_pages: Vec<MergedRow> = merged
        .iter()
        .filter(|row| row.has_no_clicks())
        .cloned()
        .collect();
    // Stable, and None sorts below every Some, so unreported pages go last
    zero_click_pages.sort_by(|a, b| b.impressions().cmp(&a.impressions()));

    // Because all_pages contains every reported page, removing them leaves
    // exactly sitemap \ gsc, and removing the sitemap leaves gsc \ sitemap
    let all_pages: BTreeSet<String> = sitemap_set.union(&gsc_pages).cloned().collect();
    let shared_pages: BTreeSet<String> = sitemap_set.intersection(&gsc_pages).cloned().collect();
    let not_indexed: BTreeSet<String> = all_pages.difference(&gsc_pages).cloned().collect();
    let index_bloat: BTreeSet<String> = all_pages.difference(&sitemap_set).cloned().collect();

    let summary = ReconciliationSummary {
        sitemap_pages: sitemap_set.len(),
        gsc_pages: gsc_pages.len(),
        merged: merged.len(),
        all_pages: all_pages.len(),
        shared_pages: shared_pages.len(),
        not_indexed: not_indexed.len(),
        index_bloat: index_bloat.len(),
        zero_click_pages: zero_click_pages.len(),
    };

    Reconciliation {
        merged,
        zero_click_pages,
        all_pages,
        shared_pages,
        not_indexed,
        index_bloat,
        summary,
    }
}
