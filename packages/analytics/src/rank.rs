//! Entity severity ranking over the trailing window.
//!
//! Entities are ordered by injuries, then fatalities, summed over the 24
//! months that end at the latest month present in the data. Equal
//! severities share a rank and ranks stay dense: `1, 1, 2`, never `1, 1, 3`.

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use crash_map_analytics_models::{MonthlyTotal, RankedEntity, Record, month_start};
use crash_map_crash_models::{CounterField, CrashTypeFilter};
use crash_map_geography_models::EntityKey;

use crate::AnalyticsError;

/// Length of the trailing ranking window. Historically labelled "three
/// years" in the dashboard, but the window has always been 24 months.
pub const RANK_WINDOW_MONTHS: u32 = 24;

/// A half-open month window `[start_date, end_date)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankWindow {
    /// First month included.
    pub start_date: NaiveDate,
    /// First month excluded.
    pub end_date: NaiveDate,
}

impl RankWindow {
    /// Returns whether `month` falls inside the window.
    #[must_use]
    pub fn contains(&self, month: NaiveDate) -> bool {
        self.start_date <= month && month < self.end_date
    }
}

/// Computes the trailing window for `records`.
///
/// The window ends (exclusively) at the first of the month after the latest
/// month in the dataset and starts [`RANK_WINDOW_MONTHS`] months earlier.
///
/// # Errors
///
/// * [`AnalyticsError::NoData`] if `records` is empty.
/// * [`AnalyticsError::WindowOverflow`] if the window leaves chrono's range.
pub fn trailing_window(records: &[Record]) -> Result<RankWindow, AnalyticsError> {
    let latest = records
        .iter()
        .map(|r| r.month)
        .max()
        .ok_or(AnalyticsError::NoData)?;

    let end_date = month_start(latest)
        .checked_add_months(Months::new(1))
        .ok_or_else(|| AnalyticsError::WindowOverflow {
            message: format!("no month follows {latest}"),
        })?;
    let start_date = end_date
        .checked_sub_months(Months::new(RANK_WINDOW_MONTHS))
        .ok_or_else(|| AnalyticsError::WindowOverflow {
            message: format!("{RANK_WINDOW_MONTHS} months before {end_date}"),
        })?;

    Ok(RankWindow {
        start_date,
        end_date,
    })
}

#[derive(Default)]
struct EntityTotals {
    total_injured: u64,
    total_killed: u64,
    max_total: u64,
    series: Vec<MonthlyTotal>,
}

/// Ranks every entity with data in the trailing window.
///
/// For each record in the window, the selected counters are summed into a
/// monthly total, and the selected injury and fatality counters into the
/// entity's injured and killed totals. Vehicle-mode breakdowns never count.
/// Entities are sorted by injuries descending, then fatalities descending;
/// entities tied on both keep their key order.
///
/// # Errors
///
/// Returns [`AnalyticsError::NoData`] if `records` is empty.
pub fn rank(
    records: &[Record],
    filter: &CrashTypeFilter,
) -> Result<Vec<RankedEntity>, AnalyticsError> {
    let window = trailing_window(records)?;
    let fields = filter.selected_fields();
    let injury_fields: Vec<CounterField> =
        fields.iter().copied().filter(|f| f.is_injury()).collect();
    let fatality_fields: Vec<CounterField> =
        fields.iter().copied().filter(|f| f.is_fatality()).collect();

    log::debug!(
        "Ranking {} records in window {}..{}",
        records.len(),
        window.start_date,
        window.end_date
    );

    let mut groups: BTreeMap<&EntityKey, EntityTotals> = BTreeMap::new();

    for record in records.iter().filter(|r| window.contains(r.month)) {
        let total = record.sum(&fields);
        let group = groups.entry(&record.entity_key).or_default();
        group.total_injured += record.sum(&injury_fields);
        group.total_killed += record.sum(&fatality_fields);
        group.max_total = group.max_total.max(total);
        group.series.push(MonthlyTotal {
            month: record.month,
            total,
        });
    }

    let mut ranked: Vec<RankedEntity> = groups
        .into_iter()
        .map(|(key, mut totals)| {
            totals.series.sort_by_key(|point| point.month);
            RankedEntity {
                key: key.clone(),
                total_injured: totals.total_injured,
                total_killed: totals.total_killed,
                max_total: totals.max_total,
                rank: 0,
                sort_total: sort_total(totals.total_injured, totals.total_killed),
                series: totals.series,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.total_injured
            .cmp(&a.total_injured)
            .then_with(|| b.total_killed.cmp(&a.total_killed))
    });

    assign_ranks(&mut ranked);

    Ok(ranked)
}

#[allow(clippy::cast_precision_loss)]
fn sort_total(total_injured: u64, total_killed: u64) -> f64 {
    total_injured as f64 + total_killed as f64 / 1000.0
}

/// Assigns dense ranks to an already sorted list.
#[allow(clippy::float_cmp)]
fn assign_ranks(ranked: &mut [RankedEntity]) {
    let mut previous: Option<(f64, u32)> = None;
    for entity in ranked {
        entity.rank = match previous {
            None => 1,
            Some((sort_total, rank)) if sort_total == entity.sort_total => rank,
            Some((_, rank)) => rank + 1,
        };
        previous = Some((entity.sort_total, entity.rank));
    }
}

#[cfg(test)]
mod tests {
    use crash_map_crash_models::{HarmCounter, VehicleMode};

    use super::*;

    fn month(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn record(key: i64, at: NaiveDate, injured: u64, killed: u64) -> Record {
        Record::new(EntityKey::Number(key), at)
            .with_counter(HarmCounter::PEDESTRIAN_INJURED, injured)
            .with_counter(HarmCounter::PEDESTRIAN_KILLED, killed)
    }

    fn ranks(ranked: &[RankedEntity]) -> Vec<(EntityKey, u32)> {
        ranked.iter().map(|r| (r.key.clone(), r.rank)).collect()
    }

    #[test]
    fn identical_totals_share_rank_and_next_rank_is_dense() {
        let records = vec![
            record(1, month(2021, 6), 10, 1),
            record(2, month(2021, 6), 10, 1),
            record(3, month(2021, 6), 5, 0),
        ];
        let ranked = rank(&records, &CrashTypeFilter::all_harm()).unwrap();
        assert_eq!(
            ranks(&ranked),
            vec![
                (EntityKey::Number(1), 1),
                (EntityKey::Number(2), 1),
                (EntityKey::Number(3), 2),
            ]
        );
    }

    #[test]
    fn fatalities_break_injury_ties() {
        let records = vec![
            record(1, month(2021, 6), 10, 0),
            record(2, month(2021, 6), 10, 3),
            record(3, month(2021, 6), 12, 0),
        ];
        let ranked = rank(&records, &CrashTypeFilter::all_harm()).unwrap();
        assert_eq!(
            ranks(&ranked),
            vec![
                (EntityKey::Number(3), 1),
                (EntityKey::Number(2), 2),
                (EntityKey::Number(1), 3),
            ]
        );
        assert!((ranked[1].sort_total - 10.003).abs() < 1e-9);
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn ordering_and_tie_properties_hold() {
        let mut records = Vec::new();
        for key in 0..30_i64 {
            let key_u = u64::try_from(key).unwrap();
            records.push(record(key, month(2022, 1), key_u % 7, key_u % 3));
            records.push(record(key, month(2022, 2), key_u % 5, 0));
        }
        let ranked = rank(&records, &CrashTypeFilter::all_harm()).unwrap();
        assert_eq!(ranked.len(), 30);
        assert_eq!(ranked[0].rank, 1);
        for pair in ranked.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.total_injured >= b.total_injured);
            if a.total_injured == b.total_injured {
                assert!(a.total_killed >= b.total_killed);
            }
            if a.sort_total == b.sort_total {
                assert_eq!(b.rank, a.rank);
            } else {
                assert_eq!(b.rank, a.rank + 1);
            }
        }
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn equal_sort_totals_share_a_rank_across_orderings() {
        let records = vec![
            record(1, month(2021, 6), 10, 1000),
            record(2, month(2021, 6), 11, 0),
            record(3, month(2021, 6), 9, 0),
        ];
        let ranked = rank(&records, &CrashTypeFilter::all_harm()).unwrap();
        assert_eq!(ranked[0].sort_total, ranked[1].sort_total);
        assert_eq!(
            ranks(&ranked),
            vec![
                (EntityKey::Number(2), 1),
                (EntityKey::Number(1), 1),
                (EntityKey::Number(3), 2),
            ]
        );
    }

    #[test]
    fn window_is_twenty_four_months_ending_after_latest_month() {
        let records = vec![
            record(1, month(2019, 5), 100, 0),
            record(1, month(2019, 6), 1, 0),
            record(2, month(2021, 5), 2, 0),
        ];
        let window = trailing_window(&records).unwrap();
        assert_eq!(window.end_date, month(2021, 6));
        assert_eq!(window.start_date, month(2019, 6));

        let ranked = rank(&records, &CrashTypeFilter::all_harm()).unwrap();
        let entity_one = ranked
            .iter()
            .find(|r| r.key == EntityKey::Number(1))
            .unwrap();
        assert_eq!(entity_one.total_injured, 1, "May 2019 is outside the window");
        assert_eq!(ranked[0].key, EntityKey::Number(2));
    }

    #[test]
    fn entities_outside_window_are_not_ranked() {
        let records = vec![
            record(1, month(2015, 1), 50, 0),
            record(2, month(2021, 5), 2, 0),
        ];
        let ranked = rank(&records, &CrashTypeFilter::all_harm()).unwrap();
        assert_eq!(ranks(&ranked), vec![(EntityKey::Number(2), 1)]);
    }

    #[test]
    fn modal_breakdowns_and_unselected_counters_are_excluded() {
        let records = vec![
            record(1, month(2021, 1), 4, 2)
                .with_counter(HarmCounter::CYCLIST_INJURED, 7)
                .with_counter(
                    CounterField::Modal(HarmCounter::PEDESTRIAN_INJURED, VehicleMode::Car),
                    4,
                ),
        ];
        let filter = CrashTypeFilter::default()
            .with(HarmCounter::PEDESTRIAN_INJURED, true)
            .with(HarmCounter::PEDESTRIAN_KILLED, true);
        let ranked = rank(&records, &filter).unwrap();
        assert_eq!(ranked[0].total_injured, 4);
        assert_eq!(ranked[0].total_killed, 2);
        assert_eq!(ranked[0].max_total, 6);
    }

    #[test]
    fn max_total_and_series_track_monthly_totals() {
        let records = vec![
            record(1, month(2021, 1), 1, 0),
            record(1, month(2021, 2), 5, 1),
            record(1, month(2021, 3), 2, 0),
        ];
        let ranked = rank(&records, &CrashTypeFilter::all_harm()).unwrap();
        assert_eq!(ranked[0].max_total, 6);
        let totals: Vec<u64> = ranked[0].series.iter().map(|p| p.total).collect();
        assert_eq!(totals, vec![1, 6, 2]);
    }

    #[test]
    fn string_and_numeric_keys_group_together() {
        let records = vec![
            Record::new(EntityKey::coerce("7"), month(2021, 1))
                .with_counter(HarmCounter::MOTORIST_INJURED, 1),
            Record::new(EntityKey::Number(7), month(2021, 2))
                .with_counter(HarmCounter::MOTORIST_INJURED, 2),
        ];
        let ranked = rank(&records, &CrashTypeFilter::all_harm()).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].total_injured, 3);
    }

    #[test]
    fn empty_filter_ties_everyone_at_rank_one() {
        let records = vec![
            record(1, month(2021, 1), 9, 0),
            record(2, month(2021, 1), 3, 1),
        ];
        let ranked = rank(&records, &CrashTypeFilter::default()).unwrap();
        assert!(ranked.iter().all(|r| r.rank == 1 && r.max_total == 0));
    }

    #[test]
    fn empty_dataset_reports_no_data() {
        assert!(matches!(
            rank(&[], &CrashTypeFilter::all_harm()),
            Err(AnalyticsError::NoData)
        ));
    }
}
