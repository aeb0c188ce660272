#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crash record and derived analytics result types.
//!
//! [`Record`] is one normalized `(entity, month)` row. Everything else in
//! this crate is derived from records by the analytics pipeline and handed
//! to chart and list consumers as plain data.

use std::collections::BTreeMap;

use chrono::{Datelike as _, NaiveDate};
use crash_map_crash_models::CounterField;
use crash_map_geography_models::EntityKey;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Normalizes a date to the first day of its month.
#[must_use]
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// An inclusive month window.
///
/// Deserialized bounds are normalized the same way as [`DateRange::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawDateRange")]
pub struct DateRange {
    /// First month in the window.
    pub start_date: NaiveDate,
    /// Last month in the window (inclusive).
    pub end_date: NaiveDate,
}

impl DateRange {
    /// Creates a range, normalizing both bounds to the first of their month.
    ///
    /// A range whose start is after its end is valid and matches nothing.
    #[must_use]
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date: month_start(start_date),
            end_date: month_start(end_date),
        }
    }

    /// Returns whether `month` falls inside the window (both ends inclusive).
    #[must_use]
    pub fn contains(&self, month: NaiveDate) -> bool {
        self.start_date <= month && month <= self.end_date
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDateRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl From<RawDateRange> for DateRange {
    fn from(raw: RawDateRange) -> Self {
        Self::new(raw.start_date, raw.end_date)
    }
}

/// One entity's crash counts for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// The entity this row describes.
    pub entity_key: EntityKey,
    /// First day of the month this row covers.
    pub month: NaiveDate,
    /// Counters present on the row. Absent counters are not the same as
    /// zero: aggregation only carries fields that are present.
    #[serde(flatten)]
    pub counters: BTreeMap<CounterField, u64>,
}

impl Record {
    /// Creates a record with no counters.
    #[must_use]
    pub fn new(entity_key: EntityKey, month: NaiveDate) -> Self {
        Self {
            entity_key,
            month: month_start(month),
            counters: BTreeMap::new(),
        }
    }

    /// Returns a copy of this record with `field` set to `value`.
    #[must_use]
    pub fn with_counter(mut self, field: impl Into<CounterField>, value: u64) -> Self {
        self.counters.insert(field.into(), value);
        self
    }

    /// Returns the value of `field`, if the row carries it.
    #[must_use]
    pub fn get(&self, field: CounterField) -> Option<u64> {
        self.counters.get(&field).copied()
    }

    /// Sums `fields`, treating absent fields as zero.
    #[must_use]
    pub fn sum(&self, fields: &[CounterField]) -> u64 {
        fields.iter().filter_map(|f| self.get(*f)).sum()
    }

    /// Sums every plain injury counter (modal breakdowns excluded).
    #[must_use]
    pub fn injured(&self) -> u64 {
        self.counters
            .iter()
            .filter(|(field, _)| field.is_injury())
            .map(|(_, v)| *v)
            .sum()
    }

    /// Sums every plain fatality counter (modal breakdowns excluded).
    #[must_use]
    pub fn killed(&self) -> u64 {
        self.counters
            .iter()
            .filter(|(field, _)| field.is_fatality())
            .map(|(_, v)| *v)
            .sum()
    }
}

/// A record with the crash-type filter's total attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredRecord {
    /// The original row, unchanged.
    #[serde(flatten)]
    pub record: Record,
    /// Sum of the counters selected by the active filter.
    pub count: u64,
}

/// Several consecutive months merged into one chart point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedBucket {
    /// Entity of the bucket's first record.
    pub entity_key: EntityKey,
    /// First month of the bucket (x-axis position).
    pub month: NaiveDate,
    /// Last month of the bucket. `None` for single-month passthrough buckets.
    pub end_date: Option<NaiveDate>,
    /// Summed counters.
    #[serde(flatten)]
    pub counters: BTreeMap<CounterField, u64>,
    /// Summed filter totals.
    pub count: u64,
}

impl AggregatedBucket {
    /// Returns the value of `field`, if the bucket carries it.
    #[must_use]
    pub fn get(&self, field: CounterField) -> Option<u64> {
        self.counters.get(&field).copied()
    }
}

impl From<ScoredRecord> for AggregatedBucket {
    fn from(scored: ScoredRecord) -> Self {
        Self {
            entity_key: scored.record.entity_key,
            month: scored.record.month,
            end_date: None,
            counters: scored.record.counters,
            count: scored.count,
        }
    }
}

/// Which fields a multi-month bucket sums.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AggregationMode {
    /// Sum only the fields present on the bucket's first record. Fields that
    /// first appear later in the bucket are dropped.
    #[default]
    Legacy,
    /// Sum every field present on any record in the bucket.
    AllFields,
}

/// One point of a ranked entity's sparkline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotal {
    /// Month of the point.
    pub month: NaiveDate,
    /// Filter total for that month.
    pub total: u64,
}

/// An entity's position in the severity ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntity {
    /// The ranked entity.
    pub key: EntityKey,
    /// Injuries summed over the trailing window.
    pub total_injured: u64,
    /// Fatalities summed over the trailing window.
    pub total_killed: u64,
    /// Largest single-month filter total (chart y-scale).
    pub max_total: u64,
    /// 1-based dense rank; equal severities share a rank.
    pub rank: u32,
    /// `total_injured + total_killed / 1000`, used to detect ties.
    pub sort_total: f64,
    /// Monthly filter totals in the window, oldest first.
    pub series: Vec<MonthlyTotal>,
}

/// Counter sums over one period.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodTotals {
    /// Number of monthly records summed.
    pub months: usize,
    /// Each counter summed across the period.
    pub counters: BTreeMap<CounterField, u64>,
    /// All plain injury counters summed.
    pub total_injured: u64,
    /// All plain fatality counters summed.
    pub total_killed: u64,
    /// Filter totals summed.
    pub count: u64,
}

/// Filter totals of two periods side by side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodComparison {
    /// Total in period A.
    pub period_a_count: u64,
    /// Total in period B.
    pub period_b_count: u64,
    /// Percentage change from A to B. `None` when period A is zero.
    pub percent_change: Option<f64>,
}

#[cfg(test)]
mod tests {
    use crash_map_crash_models::{HarmCounter, VehicleMode};

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_normalizes_to_month_start() {
        let range = DateRange::new(date(2020, 1, 15), date(2020, 3, 31));
        assert_eq!(range.start_date, date(2020, 1, 1));
        assert_eq!(range.end_date, date(2020, 3, 1));
        assert!(range.contains(date(2020, 1, 1)));
        assert!(range.contains(date(2020, 3, 1)));
        assert!(!range.contains(date(2020, 4, 1)));
        assert!(!range.contains(date(2019, 12, 1)));
    }

    #[test]
    fn deserialized_range_snaps_to_month_start() {
        let range: DateRange = serde_json::from_value(serde_json::json!({
            "startDate": "2022-01-15",
            "endDate": "2022-03-31",
        }))
        .unwrap();
        assert_eq!(range, DateRange::new(date(2022, 1, 1), date(2022, 3, 1)));
        assert!(range.contains(date(2022, 1, 1)));
        assert!(range.contains(date(2022, 3, 1)));
    }

    #[test]
    fn person_totals_skip_modal_breakdowns() {
        let record = Record::new(EntityKey::Number(1), date(2021, 5, 1))
            .with_counter(HarmCounter::PEDESTRIAN_INJURED, 4)
            .with_counter(HarmCounter::CYCLIST_KILLED, 1)
            .with_counter(
                CounterField::Modal(HarmCounter::PEDESTRIAN_INJURED, VehicleMode::Car),
                3,
            )
            .with_counter(CounterField::NoInjuryFatality, 9);
        assert_eq!(record.injured(), 4);
        assert_eq!(record.killed(), 1);
    }

    #[test]
    fn sum_treats_absent_fields_as_zero() {
        let record = Record::new(EntityKey::Number(1), date(2021, 5, 1))
            .with_counter(HarmCounter::MOTORIST_INJURED, 2);
        let fields = [
            CounterField::Harm(HarmCounter::MOTORIST_INJURED),
            CounterField::Harm(HarmCounter::CYCLIST_INJURED),
        ];
        assert_eq!(record.sum(&fields), 2);
        assert_eq!(record.sum(&[]), 0);
    }

    #[test]
    fn scored_record_serializes_flat() {
        let scored = ScoredRecord {
            record: Record::new(EntityKey::Text("Queens".to_string()), date(2020, 1, 1))
                .with_counter(HarmCounter::CYCLIST_INJURED, 2),
            count: 2,
        };
        assert_eq!(
            serde_json::to_value(&scored).unwrap(),
            serde_json::json!({
                "entityKey": "Queens",
                "month": "2020-01-01",
                "cyclist_injured": 2,
                "count": 2,
            })
        );
    }
}
