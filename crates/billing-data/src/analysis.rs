//! End-to-end comparison pipeline.
//!
//! Reads two extracts, loads them into snapshots, compares them and builds
//! the summary, returning a [`ComparisonRun`] ready for the report layer.

use std::path::Path;

use billing_core::catalog::LicenseCatalog;
use billing_core::error::Result;
use billing_core::models::ComparisonResult;
use chrono::Local;
use tracing::info;

use crate::comparator::compare;
use crate::loader::load;
use crate::reader::{read_rows, SnapshotFile};
use crate::summary::ComparisonSummary;

// ── Public types ──────────────────────────────────────────────────────────────

/// Metadata produced alongside a comparison.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunMetadata {
    /// RFC 3339 timestamp when this run was produced.
    pub generated_at: String,
    /// Display label of the older extract, e.g. `"January 2025"`.
    pub older_label: String,
    /// Display label of the newer extract.
    pub newer_label: String,
    /// Data rows read from the older extract.
    pub older_rows: usize,
    /// Data rows read from the newer extract.
    pub newer_rows: usize,
    /// Customers kept from the older extract.
    pub older_customers: usize,
    /// Customers kept from the newer extract.
    pub newer_customers: usize,
    /// Wall-clock seconds spent reading and loading both extracts.
    pub load_time_seconds: f64,
    /// Wall-clock seconds spent comparing.
    pub compare_time_seconds: f64,
}

/// The complete output of [`compare_files`].
#[derive(Debug, Clone)]
pub struct ComparisonRun {
    pub result: ComparisonResult,
    pub summary: ComparisonSummary,
    pub metadata: RunMetadata,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full pipeline over two extract files.
///
/// 1. Read both CSV files into rows.
/// 2. Load rows into snapshots using `catalog`.
/// 3. Compare older against newer.
/// 4. Summarise.
pub fn compare_files(
    older: &Path,
    newer: &Path,
    customer_column: &str,
    catalog: &LicenseCatalog,
) -> Result<ComparisonRun> {
    // ── Step 1 + 2: Read and load ─────────────────────────────────────────────
    let load_start = std::time::Instant::now();
    let older_rows = read_rows(older)?;
    let newer_rows = read_rows(newer)?;
    let older_snapshot = load(&older_rows, customer_column, catalog);
    let newer_snapshot = load(&newer_rows, customer_column, catalog);
    let load_time = load_start.elapsed().as_secs_f64();

    // ── Step 3: Compare ───────────────────────────────────────────────────────
    let compare_start = std::time::Instant::now();
    let result = compare(&older_snapshot, &newer_snapshot, catalog);
    let compare_time = compare_start.elapsed().as_secs_f64();

    // ── Step 4: Summarise ─────────────────────────────────────────────────────
    let summary = ComparisonSummary::from_result(&result);

    let metadata = RunMetadata {
        generated_at: Local::now().to_rfc3339(),
        older_label: snapshot_label(older),
        newer_label: snapshot_label(newer),
        older_rows: older_rows.len(),
        newer_rows: newer_rows.len(),
        older_customers: older_snapshot.len(),
        newer_customers: newer_snapshot.len(),
        load_time_seconds: load_time,
        compare_time_seconds: compare_time,
    };

    info!(
        "Compared {} → {}: {} customers, {} changed",
        metadata.older_label,
        metadata.newer_label,
        summary.customers_total,
        summary.customers_changed
    );

    Ok(ComparisonRun {
        result,
        summary,
        metadata,
    })
}

/// Month label when the file follows the naming convention, otherwise the
/// bare file name.
pub fn snapshot_label(path: &Path) -> String {
    SnapshotFile::from_path(path)
        .map(|f| f.label())
        .or_else(|| {
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| path.display().to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use billing_core::models::{CustomerStatus, Delta, LicenseValue};
    use tempfile::TempDir;

    const OLDER_CSV: &str = "\
Company,Huntress EDR,RMM Workstations,M365 Business Premium,Exchange Online Plan SKU,Account Manager
Acme,10,25,30,BASIC,Dana
Globex,4,,12,,Lee
Initech,2,2,,,Sam
";

    const NEWER_CSV: &str = "\
Company,Huntress EDR,RMM Workstations,M365 Business Premium,Exchange Online Plan SKU,Account Manager
Acme,12,25,30,PREMIUM,Dana
Globex,4,0,12,,Lee
NewCo,5,,,,Dana
,9,9,9,,
";

    fn write_pair(dir: &TempDir) -> (std::path::PathBuf, std::path::PathBuf) {
        let older = dir.path().join("Billing_2025-01.csv");
        let newer = dir.path().join("Billing_2025-02.csv");
        std::fs::write(&older, OLDER_CSV).unwrap();
        std::fs::write(&newer, NEWER_CSV).unwrap();
        (older, newer)
    }

    #[test]
    fn test_compare_files_end_to_end() {
        let dir = TempDir::new().unwrap();
        let (older, newer) = write_pair(&dir);

        let run = compare_files(&older, &newer, "Company", &LicenseCatalog::default()).unwrap();

        let acme = run.result.get("Acme").unwrap();
        assert!(acme.has_changes);
        assert_eq!(acme.licenses["Huntress EDR"].delta, Delta::Count(2));
        assert_eq!(
            acme.licenses["Exchange Online Plan SKU"].newer,
            LicenseValue::Text("PREMIUM".to_string())
        );
        assert!(!acme.licenses["RMM Workstations"].changed);
        assert_eq!(acme.total_delta, 2);

        let globex = run.result.get("Globex").unwrap();
        assert!(!globex.has_changes);
        assert!(!globex.licenses.contains_key("RMM Workstations"));

        assert_eq!(
            run.result.get("Initech").unwrap().status,
            CustomerStatus::Removed
        );
        assert_eq!(
            run.result.get("NewCo").unwrap().status,
            CustomerStatus::Added
        );
    }

    #[test]
    fn test_compare_files_never_surfaces_unknown_columns() {
        let dir = TempDir::new().unwrap();
        let (older, newer) = write_pair(&dir);

        let run = compare_files(&older, &newer, "Company", &LicenseCatalog::default()).unwrap();
        for (_, diff) in run.result.iter() {
            assert!(!diff.licenses.contains_key("Account Manager"));
        }
    }

    #[test]
    fn test_compare_files_metadata() {
        let dir = TempDir::new().unwrap();
        let (older, newer) = write_pair(&dir);

        let run = compare_files(&older, &newer, "Company", &LicenseCatalog::default()).unwrap();
        assert_eq!(run.metadata.older_label, "January 2025");
        assert_eq!(run.metadata.newer_label, "February 2025");
        assert_eq!(run.metadata.older_rows, 3);
        assert_eq!(run.metadata.newer_rows, 4);
        assert_eq!(run.metadata.older_customers, 3);
        assert_eq!(run.metadata.newer_customers, 3);
        assert_eq!(run.summary.customers_total, 4);
        assert_eq!(run.summary.customers_changed, 3);
    }

    #[test]
    fn test_compare_files_missing_input() {
        let dir = TempDir::new().unwrap();
        let (older, _) = write_pair(&dir);
        let missing = dir.path().join("Billing_2025-03.csv");
        assert!(compare_files(&older, &missing, "Company", &LicenseCatalog::default()).is_err());
    }

    #[test]
    fn test_snapshot_label_falls_back_to_file_name() {
        assert_eq!(snapshot_label(Path::new("/x/export.csv")), "export.csv");
        assert_eq!(
            snapshot_label(Path::new("/x/Billing_2024-07.csv")),
            "July 2024"
        );
    }
}
