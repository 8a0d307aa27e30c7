mod bootstrap;

use std::path::Path;

use anyhow::{Context, Result};
use billing_core::catalog::LicenseCatalog;
use billing_core::settings::Settings;
use billing_data::analysis::compare_files;
use billing_data::reader::{latest_pair, SnapshotFile};
use billing_report::console::render_summary;
use billing_report::json::write_json;
use billing_report::{generate_html_report, ReportMetadata};

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, settings.log_file.as_ref())?;

    tracing::info!("Billing Compare v{} starting", env!("CARGO_PKG_VERSION"));

    let catalog = match &settings.catalog {
        Some(path) => LicenseCatalog::load_from(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => LicenseCatalog::default(),
    };

    let reports_dir = bootstrap::resolve_reports_dir(settings.reports_dir.as_deref());
    let (older, newer) = match settings.explicit_pair() {
        Some((older, newer)) => (older.to_path_buf(), newer.to_path_buf()),
        None => {
            let (older, newer) = latest_pair(&reports_dir)?;
            (older.path, newer.path)
        }
    };
    tracing::info!("Comparing {} with {}", older.display(), newer.display());

    let run = compare_files(&older, &newer, &settings.customer_column, &catalog)?;

    let output_dir = settings
        .output_dir
        .clone()
        .unwrap_or_else(|| reports_dir.clone());
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;
    let stem = output_stem(&older, &newer);

    let metadata = ReportMetadata {
        title: "Billing Comparison".to_string(),
        older_label: run.metadata.older_label.clone(),
        newer_label: run.metadata.newer_label.clone(),
        generated_at: chrono::Local::now(),
        changes_only: settings.changes_only,
    };
    let html = generate_html_report(&metadata, &run.result, &run.summary);
    let html_path = output_dir.join(format!("{}.html", stem));
    std::fs::write(&html_path, html)
        .with_context(|| format!("writing {}", html_path.display()))?;
    tracing::info!("HTML report written to {}", html_path.display());

    if settings.json {
        let json_path = output_dir.join(format!("{}.json", stem));
        write_json(&json_path, &run.metadata, &run.summary, &run.result)?;
        tracing::info!("JSON report written to {}", json_path.display());
    }

    print!(
        "{}",
        render_summary(
            &run.metadata.older_label,
            &run.metadata.newer_label,
            &run.result,
            &run.summary,
            !settings.changes_only,
        )
    );
    println!("\nReport: {}", html_path.display());

    Ok(())
}

/// `billing-diff_<older>_to_<newer>`, using the month key when the file name
/// carries one and the file stem otherwise.
fn output_stem(older: &Path, newer: &Path) -> String {
    format!("billing-diff_{}_to_{}", period_or_stem(older), period_or_stem(newer))
}

fn period_or_stem(path: &Path) -> String {
    SnapshotFile::from_path(path)
        .map(|f| f.period_key())
        .or_else(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "snapshot".to_string())
}
