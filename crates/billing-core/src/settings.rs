use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Compare two monthly billing extracts and report license changes per customer
#[derive(Parser, Debug, Clone)]
#[command(
    name = "billing-compare",
    about = "Compare two monthly billing extracts and report license changes per customer",
    version
)]
pub struct Settings {
    /// Directory holding the monthly `<name>_<YYYY>-<MM>.csv` extracts
    #[arg(long, env = "BILLING_REPORTS_DIR")]
    pub reports_dir: Option<PathBuf>,

    /// Older snapshot CSV (skips discovery; requires --newer)
    #[arg(long, requires = "newer")]
    pub older: Option<PathBuf>,

    /// Newer snapshot CSV (skips discovery; requires --older)
    #[arg(long, requires = "older")]
    pub newer: Option<PathBuf>,

    /// Where to write the HTML report (defaults to the reports directory)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Column that identifies the customer in each row
    #[arg(long, default_value = "Company")]
    pub customer_column: String,

    /// JSON license catalog replacing the built-in column list
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Open the report with only changed customers visible
    #[arg(long)]
    pub changes_only: bool,

    /// Also write the comparison as JSON next to the HTML report
    #[arg(long)]
    pub json: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.billing-compare/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reports_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
}

impl LastUsedParams {
    /// `~/.billing-compare/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".billing-compare").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation; accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::debug!("Could not clear {}: {}", config_path.display(), e);
            }
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI (or env) always wins; clap stores ids under the field name.
        if !is_arg_explicitly_set(&matches, "reports_dir") && settings.reports_dir.is_none() {
            settings.reports_dir = last.reports_dir;
        }
        if !is_arg_explicitly_set(&matches, "output_dir") && settings.output_dir.is_none() {
            settings.output_dir = last.output_dir;
        }
        if !is_arg_explicitly_set(&matches, "customer_column") {
            if let Some(v) = last.customer_column {
                settings.customer_column = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "catalog") && settings.catalog.is_none() {
            settings.catalog = last.catalog;
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!("Could not persist {}: {}", config_path.display(), e);
        }

        settings
    }

    /// The explicit `(older, newer)` pair, when both were given.
    pub fn explicit_pair(&self) -> Option<(&Path, &Path)> {
        match (&self.older, &self.newer) {
            (Some(o), Some(n)) => Some((o.as_path(), n.as_path())),
            _ => None,
        }
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            reports_dir: s.reports_dir.clone(),
            output_dir: s.output_dir.clone(),
            customer_column: Some(s.customer_column.clone()),
            catalog: s.catalog.clone(),
        }
    }
}

/// Returns `true` when `name` was supplied on the command line or through its
/// environment variable (not via default value).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches!(
        matches.value_source(name),
        Some(clap::parser::ValueSource::CommandLine) | Some(clap::parser::ValueSource::EnvVariable)
    )
}

// ── Tests ──────────────────────────────────────────────────────────────────────
