//! Machine-readable companion to the HTML report.

use std::path::Path;

use billing_core::error::{BillingError, Result};
use billing_core::models::ComparisonResult;
use billing_data::analysis::RunMetadata;
use billing_data::summary::ComparisonSummary;
use serde::Serialize;
use tracing::debug;

/// Top-level JSON document.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub metadata: &'a RunMetadata,
    pub summary: &'a ComparisonSummary,
    pub customers: &'a ComparisonResult,
}

/// Serialise the run as pretty-printed JSON.
pub fn to_json_string(
    metadata: &RunMetadata,
    summary: &ComparisonSummary,
    result: &ComparisonResult,
) -> Result<String> {
    let report = JsonReport {
        metadata,
        summary,
        customers: result,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Write the JSON report to `path`.
pub fn write_json(
    path: &Path,
    metadata: &RunMetadata,
    summary: &ComparisonSummary,
    result: &ComparisonResult,
) -> Result<()> {
    let content = to_json_string(metadata, summary, result)?;
    std::fs::write(path, content).map_err(BillingError::Io)?;
    debug!("Wrote JSON report to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use billing_core::catalog::LicenseCatalog;
    use billing_data::analysis::compare_files;
    use tempfile::TempDir;

    fn run(dir: &TempDir) -> billing_data::analysis::ComparisonRun {
        let older = dir.path().join("Billing_2025-01.csv");
        let newer = dir.path().join("Billing_2025-02.csv");
        std::fs::write(
            &older,
            "Company,Huntress EDR,Exchange Online Plan SKU\nAcme,10,BASIC\nGlobex,3,\n",
        )
        .unwrap();
        std::fs::write(
            &newer,
            "Company,Huntress EDR,Exchange Online Plan SKU\nAcme,12,PREMIUM\nGlobex,3,\n",
        )
        .unwrap();
        compare_files(&older, &newer, "Company", &LicenseCatalog::default()).unwrap()
    }

    #[test]
    fn test_write_json_document_shape() {
        let dir = TempDir::new().unwrap();
        let run = run(&dir);
        let path = dir.path().join("out.json");
        write_json(&path, &run.metadata, &run.summary, &run.result).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["metadata"]["older_label"], "January 2025");
        assert_eq!(value["summary"]["customers_changed"], 1);

        let edr = &value["customers"]["Acme"]["licenses"]["Huntress EDR"];
        assert_eq!(edr["older"], 10);
        assert_eq!(edr["newer"], 12);
        assert_eq!(edr["delta"], 2);
        assert_eq!(edr["category"], "security_agent");

        let sku = &value["customers"]["Acme"]["licenses"]["Exchange Online Plan SKU"];
        assert_eq!(sku["newer"], "PREMIUM");
        assert!(sku["delta"].is_null());
        assert_eq!(value["customers"]["Globex"]["has_changes"], false);
    }

    #[test]
    fn test_write_json_unwritable_path() {
        let dir = TempDir::new().unwrap();
        let run = run(&dir);
        let path = dir.path().join("missing").join("out.json");
        let err = write_json(&path, &run.metadata, &run.summary, &run.result).unwrap_err();
        assert!(matches!(err, BillingError::Io(_)));
    }
}
