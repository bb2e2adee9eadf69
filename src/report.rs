// src/report.rs
// =============================================================================
// This module writes the reconciliation results to CSV files.
//
// Two files are produced in the output directory:
// - "not indexed.csv": sitemap pages Search Console never reported
// - "index bloat.csv": reported pages the sitemap doesn't list
//
// Each file has a single "page" column, sorted alphabetically.
//
// Rust concepts:
// - BufWriter: Batches small writes so each line isn't its own syscall
// - impl IntoIterator: write_page_csv takes a BTreeSet, a Vec or anything else
// =============================================================================

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::reconcile::Reconciliation;

pub const NOT_INDEXED_FILE: &str = "not indexed.csv";
pub const INDEX_BLOAT_FILE: &str = "index bloat.csv";

// Paths of the files write_reports produced
#[derive(Debug, Clone)]
pub struct ReportFiles {
    pub not_indexed: PathBuf,
    pub index_bloat: PathBuf,
}

// Writes both CSV exports into `dir`, creating it if needed
pub fn write_reports(dir: &Path, result: &Reconciliation) -> Result<ReportFiles> {
    fs::create_dir_all(dir)?;

    let files = ReportFiles {
        not_indexed: dir.join(NOT_INDEXED_FILE),
        index_bloat: dir.join(INDEX_BLOAT_FILE),
    };

    write_page_csv(&files.not_indexed, &result.not_indexed)?;
    write_page_csv(&files.index_bloat, &result.index_bloat)?;

    info!(
        not_indexed = %files.not_indexed.display(),
        index_bloat = %files.index_bloat.display(),
        "Wrote CSV reports"
    );

    Ok(files)
}

// Writes a one-column CSV with a "page" header
pub fn write_page_csv<'a, I>(path: &Path, pages: I) -> Result<()>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "page")?;
    for page in pages {
        writeln!(out, "{}", csv_field(page))?;
    }
    out.flush()?;
    Ok(())
}

// Quotes a field when it contains a separator, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
