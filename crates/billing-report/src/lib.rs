//! Output layer for billing comparisons.
//!
//! Renders a [`billing_core::models::ComparisonResult`] as a self-contained
//! HTML report, an optional JSON document, and a plain-text console summary.

pub mod console;
pub mod html;
pub mod json;

pub use billing_core as core;
pub use html::{generate_html_report, ReportMetadata};
