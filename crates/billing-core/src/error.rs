use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the billing comparison tools.
///
/// The comparison core itself is infallible; these cover the file, catalog
/// and configuration layers around it.
#[derive(Error, Debug)]
pub enum BillingError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be parsed (typically a broken header row).
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The directory holding the monthly billing extracts does not exist.
    #[error("Reports directory not found: {0}")]
    ReportsDirNotFound(PathBuf),

    /// Fewer than two snapshot files were found, so nothing can be compared.
    #[error("Need at least two billing snapshots in {dir}, found {found}")]
    NotEnoughSnapshots { dir: PathBuf, found: usize },

    /// The license catalog is inconsistent.
    #[error("Invalid license catalog: {0}")]
    Catalog(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the billing crates.
pub type Result<T> = std::result::Result<T, BillingError>;
