//! Period totals and period-over-period comparison.

use crash_map_analytics_models::{PeriodComparison, PeriodTotals, ScoredRecord};

/// Sums every counter and filter total across a scored series.
#[must_use]
pub fn summarize(series: &[ScoredRecord]) -> PeriodTotals {
    series.iter().fold(
        PeriodTotals {
            months: series.len(),
            ..PeriodTotals::default()
        },
        |mut totals, scored| {
            for (field, value) in &scored.record.counters {
                *totals.counters.entry(*field).or_insert(0) += value;
            }
            totals.total_injured += scored.record.injured();
            totals.total_killed += scored.record.killed();
            totals.count += scored.count;
            totals
        },
    )
}

/// Compares the filter totals of two periods.
///
/// The percent change is measured from A to B and is `None` when A is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compare_periods(period_a: &PeriodTotals, period_b: &PeriodTotals) -> PeriodComparison {
    let percent_change = (period_a.count > 0).then(|| {
        (period_b.count as f64 - period_a.count as f64) / period_a.count as f64 * 100.0
    });

    PeriodComparison {
        period_a_count: period_a.count,
        period_b_count: period_b.count,
        percent_change,
    }
}
