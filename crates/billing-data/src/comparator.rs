//! Snapshot comparison.
//!
//! [`compare`] diffs an older and a newer [`Snapshot`] customer by customer
//! and license by license:
//!
//! * customers and licenses are the union of both sides; a missing value
//!   reads as a zero count;
//! * entries that are zero on both sides are dropped, so the diff never shows
//!   a `0 → 0` row;
//! * two counts produce a numeric delta and feed the customer's rollups,
//!   unless the arithmetic would overflow, in which case they are treated
//!   like text;
//! * anything involving text falls back to equality of the rendered values
//!   and a non-numeric delta, which tolerates type drift between extracts.

use std::collections::{BTreeMap, BTreeSet};

use billing_core::catalog::LicenseCatalog;
use billing_core::models::{
    Category, ComparisonResult, CustomerDiff, CustomerStatus, Delta, LicenseDelta, LicenseRecord,
    LicenseValue, Snapshot,
};
use tracing::{debug, warn};

/// Compare `older` against `newer`.
///
/// Pure and infallible. License keys the catalog does not know (possible
/// only for hand-built snapshots) are filed under [`Category::ThirdParty`].
pub fn compare(older: &Snapshot, newer: &Snapshot, catalog: &LicenseCatalog) -> ComparisonResult {
    let customers: BTreeSet<&str> = older.customers().chain(newer.customers()).collect();
    let empty = LicenseRecord::new();

    let result: ComparisonResult = customers
        .into_iter()
        .map(|customer| {
            let old_record = older.get(customer);
            let new_record = newer.get(customer);
            let status = match (old_record, new_record) {
                (Some(_), Some(_)) => CustomerStatus::Retained,
                (None, Some(_)) => CustomerStatus::Added,
                _ => CustomerStatus::Removed,
            };
            let diff = compare_records(
                old_record.unwrap_or(&empty),
                new_record.unwrap_or(&empty),
                status,
                catalog,
            );
            (customer, diff)
        })
        .collect();

    debug!(
        "Compared {} customers ({} with changes)",
        result.len(),
        result.changed().count()
    );

    result
}

/// Diff one customer's records.
pub fn compare_records(
    older: &LicenseRecord,
    newer: &LicenseRecord,
    status: CustomerStatus,
    catalog: &LicenseCatalog,
) -> CustomerDiff {
    let licenses: BTreeSet<&str> = older.licenses().chain(newer.licenses()).collect();

    let mut entries: BTreeMap<String, LicenseDelta> = BTreeMap::new();
    let mut total_older = 0i64;
    let mut total_newer = 0i64;

    for license in licenses {
        let old_value = older.value_or_zero(license);
        let new_value = newer.value_or_zero(license);
        if old_value.is_empty() && new_value.is_empty() {
            continue;
        }

        let category = catalog.classify(license).unwrap_or(Category::ThirdParty);
        let numeric = match (&old_value, &new_value) {
            (LicenseValue::Count(o), LicenseValue::Count(n)) => {
                checked_rollup(*o, *n, total_older, total_newer)
            }
            _ => None,
        };
        let (delta, changed) = match numeric {
            Some((d, older_sum, newer_sum)) => {
                total_older = older_sum;
                total_newer = newer_sum;
                (Delta::Count(d), d != 0)
            }
            None => {
                if let (Some(o), Some(n)) = (old_value.as_count(), new_value.as_count()) {
                    warn!("License '{}': {} → {} is out of numeric range", license, o, n);
                }
                (
                    Delta::NotNumeric,
                    old_value.to_string() != new_value.to_string(),
                )
            }
        };

        entries.insert(
            license.to_string(),
            LicenseDelta {
                older: old_value,
                newer: new_value,
                delta,
                changed,
                category,
            },
        );
    }

    let has_changes = entries.values().any(|d| d.changed);

    CustomerDiff {
        licenses: entries,
        has_changes,
        status,
        total_older,
        total_newer,
        total_delta: total_newer - total_older,
    }
}

/// Delta and updated running totals for one count pair, or `None` when any
/// of them would leave the `i64` range.
fn checked_rollup(
    older: i64,
    newer: i64,
    total_older: i64,
    total_newer: i64,
) -> Option<(i64, i64, i64)> {
    let delta = newer.checked_sub(older)?;
    let older_sum = total_older.checked_add(older)?;
    let newer_sum = total_newer.checked_add(newer)?;
    newer_sum.checked_sub(older_sum)?;
    Some((delta, older_sum, newer_sum))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
