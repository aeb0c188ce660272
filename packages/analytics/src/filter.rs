//! Date-window and crash-type filtering of a monthly series.

use crash_map_analytics_models::{DateRange, Record, ScoredRecord};
use crash_map_crash_models::{CounterField, CrashTypeFilter};
use crash_map_geography_models::EntityKey;

/// Returns the records whose month lies in `range` (both ends inclusive).
///
/// Input order is preserved; the caller is expected to pass records sorted
/// ascending by month.
#[must_use]
pub fn filter_by_date(records: &[Record], range: &DateRange) -> Vec<Record> {
    records
        .iter()
        .filter(|r| range.contains(r.month))
        .cloned()
        .collect()
}

/// Returns the records belonging to a single entity.
#[must_use]
pub fn records_for_entity(records: &[Record], key: &EntityKey) -> Vec<Record> {
    records
        .iter()
        .filter(|r| &r.entity_key == key)
        .cloned()
        .collect()
}

/// Attaches the filter total to every record.
///
/// `count` is the sum of exactly the counters the filter selects. A filter
/// with nothing selected scores every record as zero.
#[must_use]
pub fn score(records: &[Record], filter: &CrashTypeFilter) -> Vec<ScoredRecord> {
    let fields = filter.selected_fields();
    records.iter().map(|r| score_record(r, &fields)).collect()
}

/// Restricts `records` to `range` and scores each survivor against `filter`.
#[must_use]
pub fn filter_and_score(
    records: &[Record],
    range: &DateRange,
    filter: &CrashTypeFilter,
) -> Vec<ScoredRecord> {
    let fields = filter.selected_fields();
    let scored: Vec<ScoredRecord> = records
        .iter()
        .filter(|r| range.contains(r.month))
        .map(|r| score_record(r, &fields))
        .collect();

    log::debug!(
        "Scored {} of {} records in {}..={} over {} fields",
        scored.len(),
        records.len(),
        range.start_date,
        range.end_date,
        fields.len()
    );

    scored
}

fn score_record(record: &Record, fields: &[CounterField]) -> ScoredRecord {
    ScoredRecord {
        record: record.clone(),
        count: record.sum(fields),
    }
}
