#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard state and the memoized selector graph.
//!
//! [`DashboardState`] is passed explicitly to every selector; nothing is
//! global. [`DashboardSelectors`] wires the analytics pipeline behind
//! single-slot memoized selectors so that re-deriving a view with unchanged
//! inputs returns the previously computed value.

pub mod selectors;
pub mod state;

use crash_map_analytics::AnalyticsError;
use crash_map_geography_models::EntityType;
use thiserror::Error;

pub use selectors::{DashboardSelectors, EntityProps, Period};
pub use state::{DashboardState, TrendSettings};

/// Errors surfaced to dashboard consumers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DashboardError {
    /// No records have been loaded for the requested entity type.
    #[error("No data loaded for entity type '{0}'")]
    UnknownEntityType(EntityType),

    /// The analytics pipeline rejected the request.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),
}
