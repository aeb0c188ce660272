//! The memoized selector graph.
//!
//! ```text
//! records ─┬─ filter ──────────────────────────── ranked
//!          └─ entity key ── entity records ─┬─ period A ─ series A ─┬─ trend A
//!                                           │                       └─ totals A ─┐
//!                                           └─ period B ─ series B ─┬─ trend B   ├─ comparison
//!                                                                   └─ totals B ─┘
//! ```
//!
//! Each node is a single-slot memoized selector. Period A and period B have
//! their own instances so the two call sites never evict each other.

use std::sync::Arc;

use crash_map_analytics::AnalyticsError;
use crash_map_analytics::aggregate::aggregate_with_mode;
use crash_map_analytics::filter::{filter_and_score, records_for_entity};
use crash_map_analytics::rank::rank;
use crash_map_analytics::summary::{compare_periods, summarize};
use crash_map_analytics_models::{
    AggregatedBucket, DateRange, PeriodComparison, PeriodTotals, RankedEntity, Record,
    ScoredRecord,
};
use crash_map_crash_models::CrashTypeFilter;
use crash_map_geography_models::{EntityKey, EntityType};
use crash_map_selector::{
    Select as _, SharedSelector, create_selector1, create_selector2, create_selector3, input,
};

use crate::{DashboardError, DashboardState, TrendSettings};

type RankOutcome = Result<Arc<Vec<RankedEntity>>, AnalyticsError>;
type TrendOutcome = Result<Arc<Vec<AggregatedBucket>>, AnalyticsError>;

/// Identifies the entity an entity-level view is about.
///
/// The key is shared so that repeated calls with the same props hit the
/// cache; build the props once per view and reuse them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityProps {
    /// Which entity type's records to read.
    pub entity_type: EntityType,
    /// Which entity within that type.
    pub entity_key: Arc<EntityKey>,
}

impl EntityProps {
    /// Creates props for one entity.
    #[must_use]
    pub fn new(entity_type: EntityType, entity_key: EntityKey) -> Self {
        Self {
            entity_type,
            entity_key: Arc::new(entity_key),
        }
    }
}

/// One of the two comparison periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    /// The primary period.
    A,
    /// The comparison period.
    B,
}

struct PeriodSelectors {
    series: SharedSelector<DashboardState, EntityProps, Vec<ScoredRecord>>,
    trend: SharedSelector<DashboardState, EntityProps, TrendOutcome>,
    totals: SharedSelector<DashboardState, EntityProps, PeriodTotals>,
}

impl PeriodSelectors {
    fn new(
        entity_records: &SharedSelector<DashboardState, EntityProps, Vec<Record>>,
        period: fn(&DashboardState) -> Arc<DateRange>,
    ) -> Self {
        let series: SharedSelector<DashboardState, EntityProps, Vec<ScoredRecord>> =
            Arc::new(create_selector3(
                Arc::clone(entity_records),
                input(move |state: &DashboardState, _: &EntityProps| period(state)),
                input(|state: &DashboardState, _: &EntityProps| state.filter_arc()),
                |records: &Vec<Record>, range: &DateRange, filter: &CrashTypeFilter| {
                    filter_and_score(records, range, filter)
                },
            ));

        let trend: SharedSelector<DashboardState, EntityProps, TrendOutcome> =
            Arc::new(create_selector2(
                Arc::clone(&series),
                input(|state: &DashboardState, _: &EntityProps| state.trend_arc()),
                |series: &Vec<ScoredRecord>, trend: &TrendSettings| {
                    aggregate_with_mode(series, trend.bucket_size_months, trend.mode).map(Arc::new)
                },
            ));

        let totals: SharedSelector<DashboardState, EntityProps, PeriodTotals> =
            Arc::new(create_selector1(
                Arc::clone(&series),
                |series: &Vec<ScoredRecord>| summarize(series),
            ));

        Self {
            series,
            trend,
            totals,
        }
    }
}

/// Memoized views over a [`DashboardState`].
///
/// Build one instance per consumer. Every view first checks that records
/// are loaded for the requested entity type.
pub struct DashboardSelectors {
    ranked: SharedSelector<DashboardState, EntityType, RankOutcome>,
    period_a: PeriodSelectors,
    period_b: PeriodSelectors,
    comparison: SharedSelector<DashboardState, EntityProps, PeriodComparison>,
}

impl Default for DashboardSelectors {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardSelectors {
    /// Builds the selector graph.
    #[must_use]
    pub fn new() -> Self {
        let ranked: SharedSelector<DashboardState, EntityType, RankOutcome> =
            Arc::new(create_selector2(
                input(|state: &DashboardState, entity_type: &EntityType| {
                    state.records_arc(*entity_type)
                }),
                input(|state: &DashboardState, _: &EntityType| state.filter_arc()),
                |records: &Vec<Record>, filter: &CrashTypeFilter| {
                    rank(records, filter).map(Arc::new)
                },
            ));

        let entity_records: SharedSelector<DashboardState, EntityProps, Vec<Record>> =
            Arc::new(create_selector2(
                input(|state: &DashboardState, props: &EntityProps| {
                    state.records_arc(props.entity_type)
                }),
                input(|_: &DashboardState, props: &EntityProps| Arc::clone(&props.entity_key)),
                |records: &Vec<Record>, key: &EntityKey| records_for_entity(records, key),
            ));

        let period_a = PeriodSelectors::new(&entity_records, DashboardState::period_a_arc);
        let period_b = PeriodSelectors::new(&entity_records, DashboardState::period_b_arc);

        let comparison: SharedSelector<DashboardState, EntityProps, PeriodComparison> =
            Arc::new(create_selector2(
                Arc::clone(&period_a.totals),
                Arc::clone(&period_b.totals),
                |a: &PeriodTotals, b: &PeriodTotals| compare_periods(a, b),
            ));

        Self {
            ranked,
            period_a,
            period_b,
            comparison,
        }
    }

    const fn period(&self, period: Period) -> &PeriodSelectors {
        match period {
            Period::A => &self.period_a,
            Period::B => &self.period_b,
        }
    }

    /// Entities of `entity_type` ranked by severity over the trailing window.
    ///
    /// # Errors
    ///
    /// * [`DashboardError::UnknownEntityType`] if no records are loaded for
    ///   `entity_type`.
    /// * [`DashboardError::Analytics`] if the loaded dataset is empty.
    pub fn ranked(
        &self,
        state: &DashboardState,
        entity_type: EntityType,
    ) -> Result<Arc<Vec<RankedEntity>>, DashboardError> {
        state.records(entity_type)?;
        settle(&self.ranked.select(state, &entity_type))
    }

    /// One entity's scored monthly series within `period`.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::UnknownEntityType`] if no records are loaded
    /// for the entity's type.
    pub fn series(
        &self,
        state: &DashboardState,
        props: &EntityProps,
        period: Period,
    ) -> Result<Arc<Vec<ScoredRecord>>, DashboardError> {
        state.records(props.entity_type)?;
        Ok(self.period(period).series.select(state, props))
    }

    /// One entity's series within `period`, bucketed per the trend settings.
    ///
    /// # Errors
    ///
    /// * [`DashboardError::UnknownEntityType`] if no records are loaded for
    ///   the entity's type.
    /// * [`DashboardError::Analytics`] if the bucket size is invalid.
    pub fn trend(
        &self,
        state: &DashboardState,
        props: &EntityProps,
        period: Period,
    ) -> Result<Arc<Vec<AggregatedBucket>>, DashboardError> {
        state.records(props.entity_type)?;
        settle(&self.period(period).trend.select(state, props))
    }

    /// One entity's summed counters within `period`.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::UnknownEntityType`] if no records are loaded
    /// for the entity's type.
    pub fn totals(
        &self,
        state: &DashboardState,
        props: &EntityProps,
        period: Period,
    ) -> Result<Arc<PeriodTotals>, DashboardError> {
        state.records(props.entity_type)?;
        Ok(self.period(period).totals.select(state, props))
    }

    /// One entity's period A vs. period B comparison.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::UnknownEntityType`] if no records are loaded
    /// for the entity's type.
    pub fn comparison(
        &self,
        state: &DashboardState,
        props: &EntityProps,
    ) -> Result<Arc<PeriodComparison>, DashboardError> {
        state.records(props.entity_type)?;
        Ok(self.comparison.select(state, props))
    }
}

fn settle<T>(outcome: &Result<Arc<T>, AnalyticsError>) -> Result<Arc<T>, DashboardError> {
    match outcome {
        Ok(value) => Ok(Arc::clone(value)),
        Err(e) => Err(DashboardError::Analytics(e.clone())),
    }
}
