#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Derived crash analytics.
//!
//! Pure transformations from normalized monthly [`Record`]s to the series,
//! trend buckets, and rankings the dashboard displays:
//!
//! * [`filter`] restricts a series to a date window and scores each month
//!   against the active crash-type filter.
//! * [`aggregate`] merges consecutive months into trend buckets.
//! * [`rank`] orders entities by severity over the trailing window.
//! * [`summary`] sums a period and compares two periods.
//!
//! None of these functions mutate their input or keep state between calls.
//!
//! [`Record`]: crash_map_analytics_models::Record

pub mod aggregate;
pub mod filter;
pub mod rank;
pub mod summary;

use thiserror::Error;

/// Errors that can occur during analytics operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyticsError {
    /// The dataset is empty, so there is no window to compute over.
    #[error("No data available")]
    NoData,

    /// Trend buckets must span at least one month.
    #[error("Invalid bucket size {size}: must be at least 1 month")]
    InvalidBucketSize {
        /// The rejected size.
        size: usize,
    },

    /// Window arithmetic left the representable date range.
    #[error("Date window out of range: {message}")]
    WindowOverflow {
        /// Description of what went wrong.
        message: String,
    },
}
