// src/gsc/mod.rs
// =============================================================================
// This module talks to the Google Search Console API.
//
// Submodules:
// - auth: Service-account login (key file -> access token)
// - types: Request payload, raw API rows and our cleaned SearchRow
// - client: HTTP calls with bearer-token auth
//
// Rust concepts:
// - pub use: Callers write `gsc::SearchRow` without knowing which file
//   it lives in
// =============================================================================

mod auth;
mod client;
mod types;

pub use auth::{request_access_token, ServiceAccountKey};
pub use client::{SearchConsoleClient, DEFAULT_API_BASE};
pub use types::{Metrics, QueryPayload, SearchRow, MAX_ROW_LIMIT};
