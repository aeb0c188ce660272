#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Raw crash-row sources and normalization.
//!
//! The hosted crash database is queried elsewhere; this crate only sees the
//! rows it returns. A [`RowSource`] hands back raw JSON objects (one per
//! entity-month) and [`normalize`] turns them into typed [`Record`]s.
//!
//! [`Record`]: crash_map_analytics_models::Record

pub mod csv_file;
pub mod json_file;
pub mod normalize;
pub mod parsing;

use crash_map_analytics_models::Record;
use crash_map_geography_models::EntityTypeDefinition;

/// Errors that can occur during data source operations.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV parsing failed.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// Data normalization error.
    #[error("Normalization error: {message}")]
    Normalization {
        /// Description of what went wrong.
        message: String,
    },
}

/// A provider of raw crash rows for one entity type.
///
/// Each row is a flat JSON object with a `month` column, the entity key
/// column, and numeric harm counters.
pub trait RowSource {
    /// Returns a short identifier for log messages.
    fn id(&self) -> &str;

    /// Returns every raw row the source holds.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the rows cannot be read or decoded.
    fn fetch_rows(&self) -> Result<Vec<serde_json::Value>, SourceError>;
}

/// Fetches all rows from `source` and normalizes them into records sorted
/// by month.
///
/// # Errors
///
/// Returns [`SourceError`] if fetching fails.
pub fn load_records(
    source: &dyn RowSource,
    definition: &EntityTypeDefinition,
) -> Result<Vec<Record>, SourceError> {
    let rows = source.fetch_rows()?;
    log::info!("[{}] fetched {} raw rows", source.id(), rows.len());
    Ok(normalize::normalize_rows(definition, &rows))
}
