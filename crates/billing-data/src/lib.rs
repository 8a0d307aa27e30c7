//! Data layer for the billing comparison tools.
//!
//! Responsible for discovering and reading monthly billing extracts, loading
//! them into snapshots, comparing snapshot pairs, aggregating report-wide
//! totals and running the end-to-end comparison pipeline.

pub mod analysis;
pub mod comparator;
pub mod loader;
pub mod reader;
pub mod summary;

pub use billing_core as core;
