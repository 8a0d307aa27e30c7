//! Billing extract discovery and CSV loading.
//!
//! Monthly extracts are named `<stem>_<YYYY>-<MM>.csv` (for example
//! `BillingReport_2025-03.csv`) and live side by side in one reports
//! directory. [`latest_pair`] picks the two most recent ones.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use billing_core::error::{BillingError, Result};
use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, warn};

use crate::loader::Row;

// ── SnapshotFile ──────────────────────────────────────────────────────────────

/// A billing extract on disk together with the month it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    pub path: PathBuf,
    /// First day of the covered month.
    pub period: NaiveDate,
}

impl SnapshotFile {
    /// Parse the covered month out of `path`'s file name.
    ///
    /// Returns `None` when the name does not follow the naming convention or
    /// encodes an impossible month.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let caps = snapshot_name_regex().captures(name)?;
        let year: i32 = caps.name("year")?.as_str().parse().ok()?;
        let month: u32 = caps.name("month")?.as_str().parse().ok()?;
        let period = NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Self {
            path: path.to_path_buf(),
            period,
        })
    }

    /// Month label such as `"March 2025"`.
    pub fn label(&self) -> String {
        self.period.format("%B %Y").to_string()
    }

    /// Compact key such as `"2025-03"`, used in output file names.
    pub fn period_key(&self) -> String {
        self.period.format("%Y-%m").to_string()
    }
}

fn snapshot_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^.+?[_-](?P<year>\d{4})-(?P<month>\d{2})\.csv$")
            .expect("regex is valid")
    })
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// List snapshot files directly inside `dir`, oldest first.
///
/// Files that do not match the naming convention are ignored. Ties on the
/// period are broken by path so the order is deterministic.
pub fn find_snapshot_files(dir: &Path) -> Result<Vec<SnapshotFile>> {
    if !dir.is_dir() {
        return Err(BillingError::ReportsDirNotFound(dir.to_path_buf()));
    }

    let mut files: Vec<SnapshotFile> = walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| SnapshotFile::from_path(entry.path()))
        .collect();

    files.sort_by(|a, b| a.period.cmp(&b.period).then_with(|| a.path.cmp(&b.path)));

    debug!("Found {} snapshot files in {}", files.len(), dir.display());
    Ok(files)
}

/// The two most recent snapshots in `dir` as `(older, newer)`.
pub fn latest_pair(dir: &Path) -> Result<(SnapshotFile, SnapshotFile)> {
    let mut files = find_snapshot_files(dir)?;
    if files.len() < 2 {
        return Err(BillingError::NotEnoughSnapshots {
            dir: dir.to_path_buf(),
            found: files.len(),
        });
    }
    let newer = files.remove(files.len() - 1);
    let older = files.remove(files.len() - 1);
    if older.period == newer.period {
        warn!(
            "Two extracts cover {}: {} and {}",
            newer.label(),
            older.path.display(),
            newer.path.display()
        );
    }
    Ok((older, newer))
}

// ── CSV loading ───────────────────────────────────────────────────────────────

/// Read a CSV extract into rows keyed by (trimmed) header.
///
/// A UTF-8 byte-order mark is stripped. Short rows simply lack their trailing
/// columns; a record the CSV parser rejects is logged and skipped. Only an
/// unreadable file or header row is an error.
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let content = std::fs::read_to_string(path).map_err(|source| BillingError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse_rows(content.trim_start_matches('\u{feff}'), path)
}

fn parse_rows(content: &str, origin: &Path) -> Result<Vec<Row>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(content.as_bytes());

    let headers = rdr.headers()?.clone();
    let mut rows: Vec<Row> = Vec::new();

    for (row_idx, result) in rdr.records().enumerate() {
        let line = row_idx + 2; // header is line 1
        match result {
            Ok(record) => {
                let row: Row = headers
                    .iter()
                    .zip(record.iter())
                    .filter(|(header, _)| !header.is_empty())
                    .map(|(header, value)| (header.to_string(), value.to_string()))
                    .collect();
                rows.push(row);
            }
            Err(e) => {
                warn!("{} line {}: unreadable record: {}", origin.display(), line, e);
            }
        }
    }

    debug!("Read {} rows from {}", rows.len(), origin.display());
    Ok(rows)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
