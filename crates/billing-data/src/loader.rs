//! Snapshot loader: flat extract rows → [`Snapshot`].
//!
//! Only columns the [`LicenseCatalog`] recognises survive; everything that is
//! unusable (blank customer, unknown column, blank cell) is dropped silently.

use std::collections::HashMap;

use billing_core::catalog::LicenseCatalog;
use billing_core::models::{LicenseRecord, LicenseValue, Snapshot};
use tracing::{debug, warn};

/// One extract row: column header → raw cell text.
pub type Row = HashMap<String, String>;

/// Build a [`Snapshot`] from parsed rows.
///
/// * Rows without a non-blank `customer_column` value are skipped.
/// * Cells are kept only if the catalog classifies the column and the cell is
///   non-blank.
/// * Cells parse to [`LicenseValue::Count`] when the trimmed text is an
///   integer within [`MAX_COUNT`], otherwise they are kept as trimmed
///   [`LicenseValue::Text`].
/// * Explicitly catalogued columns are recorded under the catalog's
///   spelling of the column name.
///
/// When the same customer appears twice, the later row replaces the earlier
/// one. The customer column is matched ignoring ASCII case.
pub fn load(rows: &[Row], customer_column: &str, catalog: &LicenseCatalog) -> Snapshot {
    let mut snapshot = Snapshot::new();
    let mut skipped_rows = 0usize;

    for (index, row) in rows.iter().enumerate() {
        let Some(customer) = customer_name(row, customer_column) else {
            skipped_rows += 1;
            debug!("Row {}: no customer in '{}', skipped", index + 1, customer_column);
            continue;
        };

        let record: LicenseRecord = row
            .iter()
            .filter(|(column, _)| !is_customer_column(column, customer_column))
            .filter_map(|(column, raw)| {
                let (_, name) = catalog.resolve(column)?;
                parse_value(raw).map(|v| (name, v))
            })
            .collect();

        if snapshot.insert(customer, record).is_some() {
            warn!(
                "Customer '{}' appears more than once; keeping the later row",
                customer
            );
        }
    }

    debug!(
        "Loaded {} customers from {} rows ({} skipped)",
        snapshot.len(),
        rows.len(),
        skipped_rows
    );

    snapshot
}

/// Largest magnitude a cell may have and still count as a license count.
/// Anything beyond is kept as text so totals cannot overflow.
pub const MAX_COUNT: i64 = 1_000_000_000_000;

/// Interpret one raw cell. Blank cells yield `None`.
///
/// # Examples
///
/// ```
/// use billing_core::models::LicenseValue;
/// use billing_data::loader::parse_value;
///
/// assert_eq!(parse_value(" 12 "), Some(LicenseValue::Count(12)));
/// assert_eq!(parse_value("BASIC"), Some(LicenseValue::Text("BASIC".into())));
/// assert_eq!(parse_value("   "), None);
/// ```
pub fn parse_value(raw: &str) -> Option<LicenseValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(match trimmed.parse::<i64>() {
        Ok(n) if (-MAX_COUNT..=MAX_COUNT).contains(&n) => LicenseValue::Count(n),
        _ => LicenseValue::Text(trimmed.to_string()),
    })
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn customer_name<'a>(row: &'a Row, customer_column: &str) -> Option<&'a str> {
    row.iter()
        .find(|(column, _)| is_customer_column(column, customer_column))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

fn is_customer_column(column: &str, customer_column: &str) -> bool {
    column.trim().eq_ignore_ascii_case(customer_column.trim())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
