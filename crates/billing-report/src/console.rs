//! Plain-text summary for the terminal.
//!
//! One row per changed customer plus a totals row, columns padded by display
//! width so customer names with wide characters still line up.

use billing_core::formatting::{format_count, format_delta};
use billing_core::models::{ComparisonResult, CustomerStatus, Delta};
use billing_data::summary::ComparisonSummary;
use unicode_width::UnicodeWidthStr;

/// One line of the console table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRowData {
    pub customer: String,
    /// `"new"`, `"gone"` or empty.
    pub status: &'static str,
    pub older: i64,
    pub newer: i64,
    pub delta: i64,
    /// Number of changed license entries.
    pub changed: usize,
}

/// Build the table rows for `result`, alphabetical by customer.
///
/// Unchanged customers are left out unless `include_unchanged` is set.
pub fn build_rows(result: &ComparisonResult, include_unchanged: bool) -> Vec<TableRowData> {
    let mut rows: Vec<TableRowData> = result
        .iter()
        .filter(|(_, diff)| include_unchanged || diff.has_changes)
        .map(|(customer, diff)| TableRowData {
            customer: customer.to_string(),
            status: match diff.status {
                CustomerStatus::Added => "new",
                CustomerStatus::Removed => "gone",
                CustomerStatus::Retained => "",
            },
            older: diff.total_older,
            newer: diff.total_newer,
            delta: diff.total_delta,
            changed: diff.changed_licenses().count(),
        })
        .collect();
    rows.sort_by(|a, b| a.customer.cmp(&b.customer));
    rows
}

/// Render the summary block and customer table as a string.
pub fn render_summary(
    older_label: &str,
    newer_label: &str,
    result: &ComparisonResult,
    summary: &ComparisonSummary,
    include_unchanged: bool,
) -> String {
    let mut out = String::new();
    out.push_str(&format!("Billing comparison: {} -> {}\n", older_label, newer_label));
    out.push_str(&format!(
        "Customers: {} total, {} changed, {} new, {} gone\n",
        summary.customers_total,
        summary.customers_changed,
        summary.customers_added,
        summary.customers_removed
    ));
    out.push_str(&format!(
        "Licenses:  {} -> {} ({})\n",
        format_count(summary.older),
        format_count(summary.newer),
        format_delta(&Delta::Count(summary.delta))
    ));

    if summary.is_unchanged() {
        out.push_str("\nNo changes between the two extracts.\n");
    }
    let rows = build_rows(result, include_unchanged);
    if rows.is_empty() {
        return out;
    }

    let headers = ["Customer", "Status", "Older", "Newer", "Change", "Entries"];
    let mut cells: Vec<[String; 6]> = rows
        .iter()
        .map(|row| {
            [
                row.customer.clone(),
                row.status.to_string(),
                format_count(row.older),
                format_count(row.newer),
                format_delta(&Delta::Count(row.delta)),
                row.changed.to_string(),
            ]
        })
        .collect();
    cells.push([
        "Total".to_string(),
        String::new(),
        format_count(saturating_sum(rows.iter().map(|r| r.older))),
        format_count(saturating_sum(rows.iter().map(|r| r.newer))),
        format_delta(&Delta::Count(saturating_sum(rows.iter().map(|r| r.delta)))),
        rows.iter().map(|r| r.changed).sum::<usize>().to_string(),
    ]);

    let mut widths = headers.map(UnicodeWidthStr::width);
    for line in &cells {
        for (w, cell) in widths.iter_mut().zip(line.iter()) {
            *w = (*w).max(cell.width());
        }
    }

    out.push('\n');
    out.push_str(&format_line(&headers.map(str::to_string), &widths));
    out.push_str(&format_separator(&widths));
    let (body, totals) = cells.split_at(cells.len() - 1);
    for line in body {
        out.push_str(&format_line(line, &widths));
    }
    out.push_str(&format_separator(&widths));
    out.push_str(&format_line(&totals[0], &widths));
    out
}

fn saturating_sum(values: impl Iterator<Item = i64>) -> i64 {
    values.fold(0, i64::saturating_add)
}

/// First two columns are left aligned, numbers right aligned.
fn format_line(cells: &[String; 6], widths: &[usize; 6]) -> String {
    let parts: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .enumerate()
        .map(|(i, (cell, &width))| {
            let pad = " ".repeat(width.saturating_sub(cell.width()));
            if i < 2 {
                format!("{}{}", cell, pad)
            } else {
                format!("{}{}", pad, cell)
            }
        })
        .collect();
    format!("{}\n", parts.join("  ").trim_end())
}

fn format_separator(widths: &[usize; 6]) -> String {
    let total = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
    format!("{}\n", "-".repeat(total))
}
