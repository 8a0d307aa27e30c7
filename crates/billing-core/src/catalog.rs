//! License catalog and column classifier.
//!
//! The catalog decides which billing-extract columns are license columns and
//! which [`Category`] each belongs to. It is built once at startup (either the
//! built-in default or a JSON file) and passed by reference to the loader and
//! comparator.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BillingError, Result};
use crate::models::Category;

// ── Built-in catalog ──────────────────────────────────────────────────────────

const DEFAULT_SECURITY_AGENT: &[&str] = &[
    "SentinelOne Control",
    "SentinelOne Complete",
    "Huntress EDR",
    "Huntress ITDR",
    "Huntress SAT",
];

const DEFAULT_REMOTE_MANAGEMENT: &[&str] = &[
    "RMM Workstations",
    "RMM Servers",
    "RMM Network Devices",
    "Remote Access Seats",
    "Patch Management",
];

const DEFAULT_THIRD_PARTY: &[&str] = &[
    "Duo MFA",
    "DNSFilter",
    "Keeper Business",
    "Dropsuite Backup",
    "Proofpoint Essentials",
    "Backup Storage GB",
    "Exchange Online Plan SKU",
];

const DEFAULT_CLOUD_PREFIX: &str = "M365";

// ── On-disk format ────────────────────────────────────────────────────────────

/// JSON shape of a catalog file.
///
/// ```json
/// {
///   "security_agent": ["SentinelOne Complete"],
///   "remote_management": ["RMM Workstations"],
///   "third_party": ["Duo MFA"],
///   "cloud_prefix": "M365"
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub security_agent: Vec<String>,
    #[serde(default)]
    pub remote_management: Vec<String>,
    #[serde(default)]
    pub third_party: Vec<String>,
    pub cloud_prefix: String,
}

// ── LicenseCatalog ────────────────────────────────────────────────────────────

/// Immutable mapping of recognised license columns to categories.
///
/// Column names are matched ignoring ASCII case and surrounding whitespace.
#[derive(Debug, Clone)]
pub struct LicenseCatalog {
    /// Normalised column name → (category, catalog spelling).
    explicit: HashMap<String, (Category, String)>,
    cloud_prefix: String,
}

impl LicenseCatalog {
    /// Build a catalog from its three explicit column sets and the cloud
    /// subscription prefix.
    ///
    /// Fails when a column is listed under two categories or the prefix is
    /// blank.
    pub fn new<S: AsRef<str>>(
        security_agent: &[S],
        remote_management: &[S],
        third_party: &[S],
        cloud_prefix: &str,
    ) -> Result<Self> {
        let cloud_prefix = normalize(cloud_prefix);
        if cloud_prefix.is_empty() {
            return Err(BillingError::Catalog(
                "cloud subscription prefix must not be empty".to_string(),
            ));
        }

        let mut explicit: HashMap<String, (Category, String)> = HashMap::new();
        let sets = [
            (Category::SecurityAgent, security_agent),
            (Category::RemoteManagement, remote_management),
            (Category::ThirdParty, third_party),
        ];
        for (category, columns) in sets {
            for column in columns {
                let key = normalize(column.as_ref());
                if key.is_empty() {
                    continue;
                }
                let name = column.as_ref().trim().to_string();
                if let Some((existing, _)) = explicit.insert(key, (category, name)) {
                    if existing != category {
                        return Err(BillingError::Catalog(format!(
                            "column '{}' is listed under both {} and {}",
                            column.as_ref().trim(),
                            existing,
                            category
                        )));
                    }
                }
            }
        }

        Ok(Self {
            explicit,
            cloud_prefix,
        })
    }

    /// Build a catalog from a parsed [`CatalogFile`].
    pub fn from_file(file: &CatalogFile) -> Result<Self> {
        Self::new(
            file.security_agent.as_slice(),
            file.remote_management.as_slice(),
            file.third_party.as_slice(),
            &file.cloud_prefix,
        )
    }

    /// Read and validate a JSON catalog file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| BillingError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CatalogFile = serde_json::from_str(&content)?;
        let catalog = Self::from_file(&file)?;
        tracing::debug!(
            "Loaded license catalog from {} ({} explicit columns)",
            path.display(),
            catalog.explicit.len()
        );
        Ok(catalog)
    }

    /// Assign `column` to a category, or `None` when the column is not
    /// billing-relevant and should be dropped.
    ///
    /// Explicit sets take precedence over the cloud subscription prefix.
    pub fn classify(&self, column: &str) -> Option<Category> {
        self.resolve(column).map(|(category, _)| category)
    }

    /// Like [`classify`](Self::classify), also returning the name the column
    /// is recorded under.
    ///
    /// Explicitly listed columns take the catalog's spelling, so an extract
    /// header that changes case between months still maps to one license.
    /// Prefix-matched columns keep their trimmed header.
    pub fn resolve<'a>(&'a self, column: &'a str) -> Option<(Category, &'a str)> {
        let key = normalize(column);
        if key.is_empty() {
            return None;
        }
        if let Some((category, name)) = self.explicit.get(&key) {
            return Some((*category, name.as_str()));
        }
        if key.starts_with(&self.cloud_prefix) {
            return Some((Category::CloudSubscription, column.trim()));
        }
        None
    }
}

impl Default for LicenseCatalog {
    fn default() -> Self {
        let explicit = [
            (Category::SecurityAgent, DEFAULT_SECURITY_AGENT),
            (Category::RemoteManagement, DEFAULT_REMOTE_MANAGEMENT),
            (Category::ThirdParty, DEFAULT_THIRD_PARTY),
        ]
        .into_iter()
        .flat_map(|(category, columns)| {
            columns
                .iter()
                .map(move |c| (normalize(c), (category, c.to_string())))
        })
        .collect();

        Self {
            explicit,
            cloud_prefix: normalize(DEFAULT_CLOUD_PREFIX),
        }
    }
}

fn normalize(column: &str) -> String {
    column.trim().to_ascii_lowercase()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
