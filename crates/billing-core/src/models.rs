use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single cell value from a billing extract.
///
/// Decided once at load time: anything that parses as an integer is a
/// [`LicenseValue::Count`], everything else (SKU names, plan identifiers) is
/// kept verbatim as [`LicenseValue::Text`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LicenseValue {
    /// A license or seat count.
    Count(i64),
    /// An opaque, non-numeric value.
    Text(String),
}

impl LicenseValue {
    /// The implicit value of a license that is absent from a record.
    pub const ZERO: LicenseValue = LicenseValue::Count(0);

    /// `true` for a zero count, which is indistinguishable from "absent".
    pub fn is_empty(&self) -> bool {
        matches!(self, LicenseValue::Count(0))
    }

    /// The numeric count, or `None` for text values.
    pub fn as_count(&self) -> Option<i64> {
        match self {
            LicenseValue::Count(n) => Some(*n),
            LicenseValue::Text(_) => None,
        }
    }
}

impl fmt::Display for LicenseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LicenseValue::Count(n) => write!(f, "{}", n),
            LicenseValue::Text(s) => f.write_str(s),
        }
    }
}

/// One customer's license values within a snapshot.
///
/// A missing key means "zero / not present".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseRecord(BTreeMap<String, LicenseValue>);

impl LicenseRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `license` to `value`, returning the previous value if any.
    pub fn insert(&mut self, license: impl Into<String>, value: LicenseValue) -> Option<LicenseValue> {
        self.0.insert(license.into(), value)
    }

    pub fn get(&self, license: &str) -> Option<&LicenseValue> {
        self.0.get(license)
    }

    /// The value for `license`, defaulting to a zero count when absent.
    pub fn value_or_zero(&self, license: &str) -> LicenseValue {
        self.0.get(license).cloned().unwrap_or(LicenseValue::ZERO)
    }

    pub fn licenses(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LicenseValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, LicenseValue)> for LicenseRecord {
    fn from_iter<I: IntoIterator<Item = (K, LicenseValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// One fully materialised billing extract: customer name → license record.
///
/// Customer names are non-empty and compared case-sensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, LicenseRecord>);

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record` for `customer`, returning the record it replaced.
    pub fn insert(&mut self, customer: impl Into<String>, record: LicenseRecord) -> Option<LicenseRecord> {
        self.0.insert(customer.into(), record)
    }

    pub fn get(&self, customer: &str) -> Option<&LicenseRecord> {
        self.0.get(customer)
    }

    pub fn customers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LicenseRecord)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, LicenseRecord)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (K, LicenseRecord)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Billing grouping used to organise the diff display.
///
/// Variant order is the display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Endpoint security agents (EDR / antivirus seats).
    SecurityAgent,
    /// Remote monitoring and management agents.
    RemoteManagement,
    /// Cloud subscriptions, recognised by column-name prefix.
    CloudSubscription,
    /// Everything else that is billed.
    ThirdParty,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::SecurityAgent,
        Category::RemoteManagement,
        Category::CloudSubscription,
        Category::ThirdParty,
    ];

    /// Human-readable heading.
    pub fn label(&self) -> &'static str {
        match self {
            Category::SecurityAgent => "Security Agents",
            Category::RemoteManagement => "Remote Management",
            Category::CloudSubscription => "Cloud Subscriptions",
            Category::ThirdParty => "Third-Party Services",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Difference between two license values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Delta {
    /// `newer - older`, only when both sides are counts.
    Count(i64),
    /// At least one side is text; serialised as `null`.
    NotNumeric,
}

/// How one license moved between the two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseDelta {
    /// Value in the older snapshot (zero when absent).
    pub older: LicenseValue,
    /// Value in the newer snapshot (zero when absent).
    pub newer: LicenseValue,
    pub delta: Delta,
    pub changed: bool,
    pub category: Category,
}

/// Which snapshots a customer appears in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    /// Only in the newer snapshot.
    Added,
    /// Only in the older snapshot.
    Removed,
    /// In both snapshots.
    Retained,
}

/// Per-customer result of comparing two snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDiff {
    /// License deltas; entries that are zero on both sides are never present.
    pub licenses: BTreeMap<String, LicenseDelta>,
    /// `true` iff any contained delta is `changed`.
    pub has_changes: bool,
    pub status: CustomerStatus,
    /// Sum of older counts over entries where both sides are numeric.
    pub total_older: i64,
    /// Sum of newer counts over entries where both sides are numeric.
    pub total_newer: i64,
    /// Always `total_newer - total_older`.
    pub total_delta: i64,
}

impl CustomerDiff {
    /// Changed license entries only, in license-name order.
    pub fn changed_licenses(&self) -> impl Iterator<Item = (&str, &LicenseDelta)> {
        self.licenses
            .iter()
            .filter(|(_, d)| d.changed)
            .map(|(k, d)| (k.as_str(), d))
    }
}

/// Full comparison of an (older, newer) snapshot pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComparisonResult(BTreeMap<String, CustomerDiff>);

impl ComparisonResult {
    pub fn get(&self, customer: &str) -> Option<&CustomerDiff> {
        self.0.get(customer)
    }

    pub fn customers(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CustomerDiff)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Customers with at least one changed license.
    pub fn changed(&self) -> impl Iterator<Item = (&str, &CustomerDiff)> {
        self.iter().filter(|(_, d)| d.has_changes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, CustomerDiff)> for ComparisonResult {
    fn from_iter<I: IntoIterator<Item = (K, CustomerDiff)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── LicenseValue ───────────────────────────────────────────────────────

    #[test]
    fn test_license_value_is_empty_only_for_zero_count() {
        assert!(LicenseValue::Count(0).is_empty());
        assert!(!LicenseValue::Count(3).is_empty());
        assert!(!LicenseValue::Text("0 seats".to_string()).is_empty());
    }

    #[test]
    fn test_license_value_display() {
        assert_eq!(LicenseValue::Count(-4).to_string(), "-4");
        assert_eq!(LicenseValue::Text("BASIC".to_string()).to_string(), "BASIC");
    }

    #[test]
    fn test_license_value_serializes_untagged() {
        let json = serde_json::to_string(&vec![
            LicenseValue::Count(12),
            LicenseValue::Text("PREMIUM".to_string()),
        ])
        .unwrap();
        assert_eq!(json, r#"[12,"PREMIUM"]"#);

        let back: Vec<LicenseValue> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0], LicenseValue::Count(12));
        assert_eq!(back[1], LicenseValue::Text("PREMIUM".to_string()));
    }

    // ── LicenseRecord / Snapshot ───────────────────────────────────────────

    #[test]
    fn test_record_value_or_zero_defaults_absent_keys() {
        let record: LicenseRecord = [("AgentA", LicenseValue::Count(7))].into_iter().collect();
        assert_eq!(record.value_or_zero("AgentA"), LicenseValue::Count(7));
        assert_eq!(record.value_or_zero("AgentB"), LicenseValue::ZERO);
        assert!(record.get("AgentB").is_none());
    }

    #[test]
    fn test_snapshot_insert_returns_replaced_record() {
        let mut snapshot = Snapshot::new();
        assert!(snapshot.insert("Acme", LicenseRecord::new()).is_none());
        let first: LicenseRecord = [("AgentA", LicenseValue::Count(1))].into_iter().collect();
        snapshot.insert("Acme", first);
        let replaced = snapshot.insert("Acme", LicenseRecord::new()).unwrap();
        assert_eq!(replaced.len(), 1);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_snapshot_customers_are_case_sensitive() {
        let snapshot: Snapshot = [("Acme", LicenseRecord::new()), ("ACME", LicenseRecord::new())]
            .into_iter()
            .collect();
        assert_eq!(snapshot.len(), 2);
    }

    // ── Category ───────────────────────────────────────────────────────────

    #[test]
    fn test_category_display_order() {
        let mut shuffled = vec![
            Category::ThirdParty,
            Category::CloudSubscription,
            Category::SecurityAgent,
            Category::RemoteManagement,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Category::ALL.to_vec());
    }

    #[test]
    fn test_category_serde_names() {
        let json = serde_json::to_string(&Category::CloudSubscription).unwrap();
        assert_eq!(json, r#""cloud_subscription""#);
        let back: Category = serde_json::from_str(r#""security_agent""#).unwrap();
        assert_eq!(back, Category::SecurityAgent);
    }

    // ── Delta ──────────────────────────────────────────────────────────────

    #[test]
    fn test_delta_not_numeric_serializes_as_null() {
        assert_eq!(serde_json::to_string(&Delta::NotNumeric).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Delta::Count(-3)).unwrap(), "-3");
    }
}
