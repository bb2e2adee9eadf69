// src/sitemap/mod.rs
// =============================================================================
// This module turns a sitemap (or sitemap index) URL into a flat list of
// page URLs.
//
// Submodules:
// - parse: Extracts <loc> entries and classifies them (page, sitemap, noise)
// - collector: Fetches documents and walks nested sitemap indexes
// =============================================================================

mod collector;
mod parse;

pub use collector::{BranchFailure, SitemapCollector, SitemapCrawl, DEFAULT_MAX_DEPTH};
