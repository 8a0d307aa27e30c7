//! Report-wide rollups over a [`ComparisonResult`].

use std::collections::BTreeMap;

use billing_core::models::{Category, ComparisonResult, CustomerStatus, Delta};
use serde::Serialize;

// ── CategoryTotals ────────────────────────────────────────────────────────────

/// Numeric totals for one category across all customers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTotals {
    pub older: i64,
    pub newer: i64,
    pub delta: i64,
    /// Changed license entries in this category, numeric or not.
    pub changed_licenses: u32,
}

// ── ComparisonSummary ─────────────────────────────────────────────────────────

/// Headline numbers for a comparison, as shown at the top of the report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonSummary {
    pub customers_total: usize,
    pub customers_changed: usize,
    pub customers_added: usize,
    pub customers_removed: usize,
    /// Per-category totals, in display order. Categories with no entries are
    /// omitted.
    pub categories: BTreeMap<Category, CategoryTotals>,
    /// Sum of every customer's `total_older`. Sums clamp at the `i64` range.
    pub older: i64,
    /// Sum of every customer's `total_newer`.
    pub newer: i64,
    /// Sum of every customer's `total_delta`.
    pub delta: i64,
}

impl ComparisonSummary {
    /// Aggregate `result` into a summary.
    pub fn from_result(result: &ComparisonResult) -> Self {
        let mut summary = Self {
            customers_total: result.len(),
            ..Self::default()
        };

        for (_, diff) in result.iter() {
            if diff.has_changes {
                summary.customers_changed += 1;
            }
            match diff.status {
                CustomerStatus::Added => summary.customers_added += 1,
                CustomerStatus::Removed => summary.customers_removed += 1,
                CustomerStatus::Retained => {}
            }
            summary.older = summary.older.saturating_add(diff.total_older);
            summary.newer = summary.newer.saturating_add(diff.total_newer);
            summary.delta = summary.delta.saturating_add(diff.total_delta);

            for license in diff.licenses.values() {
                let totals = summary.categories.entry(license.category).or_default();
                if license.changed {
                    totals.changed_licenses += 1;
                }
                if let (Some(o), Some(n), Delta::Count(d)) = (
                    license.older.as_count(),
                    license.newer.as_count(),
                    license.delta,
                ) {
                    totals.older = totals.older.saturating_add(o);
                    totals.newer = totals.newer.saturating_add(n);
                    totals.delta = totals.delta.saturating_add(d);
                }
            }
        }

        summary
    }

    /// `true` when no customer changed at all.
    pub fn is_unchanged(&self) -> bool {
        self.customers_changed == 0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
