//! Explicit dashboard state.
//!
//! Every piece of state lives behind an [`Arc`]. Updating one piece builds a
//! new state that shares all other pieces with the old one, so selectors can
//! tell what changed by pointer identity alone.

use std::collections::BTreeMap;
use std::sync::Arc;

use crash_map_analytics_models::{AggregationMode, DateRange, Record};
use crash_map_crash_models::CrashTypeFilter;
use crash_map_geography_models::EntityType;
use serde::{Deserialize, Serialize};

use crate::DashboardError;

/// How trend charts bucket months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrendSettings {
    /// Months per bucket; 1 disables aggregation.
    pub bucket_size_months: usize,
    /// Which fields multi-month buckets carry.
    pub mode: AggregationMode,
}

impl Default for TrendSettings {
    fn default() -> Self {
        Self {
            bucket_size_months: 1,
            mode: AggregationMode::Legacy,
        }
    }
}

/// The full input to every dashboard selector.
#[derive(Debug, Clone)]
pub struct DashboardState {
    records: BTreeMap<EntityType, Arc<Vec<Record>>>,
    empty: Arc<Vec<Record>>,
    filter: Arc<CrashTypeFilter>,
    period_a: Arc<DateRange>,
    period_b: Arc<DateRange>,
    trend: Arc<TrendSettings>,
}

impl DashboardState {
    /// Creates a state with no records loaded.
    #[must_use]
    pub fn new(filter: CrashTypeFilter, period_a: DateRange, period_b: DateRange) -> Self {
        Self {
            records: BTreeMap::new(),
            empty: Arc::new(Vec::new()),
            filter: Arc::new(filter),
            period_a: Arc::new(period_a),
            period_b: Arc::new(period_b),
            trend: Arc::new(TrendSettings::default()),
        }
    }

    /// Returns a state with `records` loaded for `entity_type`, replacing
    /// any previously loaded records for that type.
    #[must_use]
    pub fn with_records(&self, entity_type: EntityType, records: Vec<Record>) -> Self {
        log::debug!("Loaded {} records for {entity_type}", records.len());
        let mut next = self.clone();
        next.records.insert(entity_type, Arc::new(records));
        next
    }

    /// Returns a state with a new crash-type filter.
    #[must_use]
    pub fn with_filter(&self, filter: CrashTypeFilter) -> Self {
        Self {
            filter: Arc::new(filter),
            ..self.clone()
        }
    }

    /// Returns a state with a new period A.
    #[must_use]
    pub fn with_period_a(&self, range: DateRange) -> Self {
        Self {
            period_a: Arc::new(range),
            ..self.clone()
        }
    }

    /// Returns a state with a new period B.
    #[must_use]
    pub fn with_period_b(&self, range: DateRange) -> Self {
        Self {
            period_b: Arc::new(range),
            ..self.clone()
        }
    }

    /// Returns a state with new trend settings.
    #[must_use]
    pub fn with_trend(&self, trend: TrendSettings) -> Self {
        Self {
            trend: Arc::new(trend),
            ..self.clone()
        }
    }

    /// Returns the records loaded for `entity_type`.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::UnknownEntityType`] if nothing has been
    /// loaded for that type.
    pub fn records(&self, entity_type: EntityType) -> Result<&Arc<Vec<Record>>, DashboardError> {
        self.records
            .get(&entity_type)
            .ok_or(DashboardError::UnknownEntityType(entity_type))
    }

    /// Entity types with loaded records.
    pub fn entity_types(&self) -> impl Iterator<Item = EntityType> + '_ {
        self.records.keys().copied()
    }

    /// The active crash-type filter.
    #[must_use]
    pub fn filter(&self) -> &CrashTypeFilter {
        &self.filter
    }

    /// Period A.
    #[must_use]
    pub fn period_a(&self) -> &DateRange {
        &self.period_a
    }

    /// Period B.
    #[must_use]
    pub fn period_b(&self) -> &DateRange {
        &self.period_b
    }

    /// Trend settings.
    #[must_use]
    pub fn trend(&self) -> &TrendSettings {
        &self.trend
    }

    pub(crate) fn records_arc(&self, entity_type: EntityType) -> Arc<Vec<Record>> {
        Arc::clone(self.records.get(&entity_type).unwrap_or(&self.empty))
    }

    pub(crate) fn filter_arc(&self) -> Arc<CrashTypeFilter> {
        Arc::clone(&self.filter)
    }

    pub(crate) fn period_a_arc(&self) -> Arc<DateRange> {
        Arc::clone(&self.period_a)
    }

    pub(crate) fn period_b_arc(&self) -> Arc<DateRange> {
        Arc::clone(&self.period_b)
    }

    pub(crate) fn trend_arc(&self) -> Arc<TrendSettings> {
        Arc::clone(&self.trend)
    }
}
