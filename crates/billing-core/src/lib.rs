//! Shared building blocks for the billing comparison tools.
//!
//! Holds the snapshot and diff data model, the license catalog that decides
//! which extract columns are billed and how they are grouped, error types,
//! CLI settings with last-used persistence, and number formatting helpers.

pub mod catalog;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;

pub use catalog::LicenseCatalog;
pub use error::{BillingError, Result};
