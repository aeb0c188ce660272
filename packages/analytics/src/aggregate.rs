//! Trend aggregation: merging consecutive months into fixed-size buckets.

use std::collections::{BTreeMap, BTreeSet};

use crash_map_analytics_models::{AggregatedBucket, AggregationMode, ScoredRecord};
use crash_map_crash_models::CounterField;

use crate::AnalyticsError;

/// Buckets `series` into chunks of `bucket_size_months` records using
/// [`AggregationMode::Legacy`].
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidBucketSize`] if `bucket_size_months`
/// is zero.
pub fn aggregate(
    series: &[ScoredRecord],
    bucket_size_months: usize,
) -> Result<Vec<AggregatedBucket>, AnalyticsError> {
    aggregate_with_mode(series, bucket_size_months, AggregationMode::Legacy)
}

/// Buckets `series` into consecutive chunks of `bucket_size_months` records.
///
/// A size of 1 passes every record through as its own bucket with no
/// `end_date`. Larger sizes chunk in input order; the final bucket is
/// shorter when the series length is not a multiple of the size. Each
/// bucket takes its `month` from the chunk's first record and its
/// `end_date` from the chunk's last record.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidBucketSize`] if `bucket_size_months`
/// is zero.
pub fn aggregate_with_mode(
    series: &[ScoredRecord],
    bucket_size_months: usize,
    mode: AggregationMode,
) -> Result<Vec<AggregatedBucket>, AnalyticsError> {
    if bucket_size_months == 0 {
        return Err(AnalyticsError::InvalidBucketSize {
            size: bucket_size_months,
        });
    }

    if bucket_size_months == 1 {
        return Ok(series.iter().cloned().map(AggregatedBucket::from).collect());
    }

    let buckets: Vec<AggregatedBucket> = series
        .chunks(bucket_size_months)
        .filter_map(|chunk| merge_chunk(chunk, mode))
        .collect();

    log::debug!(
        "Aggregated {} records into {} buckets of {bucket_size_months} months ({mode})",
        series.len(),
        buckets.len()
    );

    Ok(buckets)
}

fn merge_chunk(chunk: &[ScoredRecord], mode: AggregationMode) -> Option<AggregatedBucket> {
    let first = chunk.first()?;
    let last = chunk.last()?;

    let fields: BTreeSet<CounterField> = match mode {
        AggregationMode::Legacy => first.record.counters.keys().copied().collect(),
        AggregationMode::AllFields => chunk
            .iter()
            .flat_map(|s| s.record.counters.keys().copied())
            .collect(),
    };

    let counters: BTreeMap<CounterField, u64> = fields
        .into_iter()
        .map(|field| {
            let sum = chunk.iter().filter_map(|s| s.record.get(field)).sum();
            (field, sum)
        })
        .collect();

    Some(AggregatedBucket {
        entity_key: first.record.entity_key.clone(),
        month: first.record.month,
        end_date: Some(last.record.month),
        counters,
        count: chunk.iter().map(|s| s.count).sum(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use crash_map_analytics_models::Record;
    use crash_map_crash_models::HarmCounter;
    use crash_map_geography_models::EntityKey;

    use super::*;

    fn month(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn scored(m: u32, count: u64) -> ScoredRecord {
        ScoredRecord {
            record: Record::new(EntityKey::Number(1), month(2020, m))
                .with_counter(HarmCounter::PEDESTRIAN_INJURED, count),
            count,
        }
    }

    fn five_months() -> Vec<ScoredRecord> {
        (1..=5).map(|m| scored(m, u64::from(m))).collect()
    }

    #[test]
    fn two_month_buckets_over_five_records() {
        let buckets = aggregate(&five_months(), 2).unwrap();
        let counts: Vec<u64> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![3, 7, 5]);

        assert_eq!(buckets[0].month, month(2020, 1));
        assert_eq!(buckets[0].end_date, Some(month(2020, 2)));
        assert_eq!(buckets[2].month, month(2020, 5));
        assert_eq!(buckets[2].end_date, Some(month(2020, 5)));
    }

    #[test]
    fn bucket_count_is_ceiling_of_length_over_size() {
        for len in 0..=13_u32 {
            let series: Vec<ScoredRecord> = (0..len).map(|i| scored(i % 12 + 1, 1)).collect();
            for size in 2..=6_usize {
                let buckets = aggregate(&series, size).unwrap();
                assert_eq!(buckets.len(), series.len().div_ceil(size));
                if let Some(last) = buckets.last() {
                    let remainder = series.len() % size;
                    let expected = if remainder == 0 { size } else { remainder };
                    assert_eq!(last.count, expected as u64, "len {len} size {size}");
                }
            }
        }
    }

    #[test]
    fn sums_fields_present_on_first_record() {
        let buckets = aggregate(&five_months(), 3).unwrap();
        assert_eq!(
            buckets[0].get(CounterField::Harm(HarmCounter::PEDESTRIAN_INJURED)),
            Some(6)
        );
        assert_eq!(
            buckets[1].get(CounterField::Harm(HarmCounter::PEDESTRIAN_INJURED)),
            Some(9)
        );
    }

    #[test]
    fn size_one_is_passthrough() {
        let series = five_months();
        let buckets = aggregate(&series, 1).unwrap();
        assert_eq!(buckets.len(), series.len());
        for (bucket, original) in buckets.iter().zip(&series) {
            assert_eq!(bucket.month, original.record.month);
            assert_eq!(bucket.end_date, None);
            assert_eq!(bucket.counters, original.record.counters);
            assert_eq!(bucket.count, original.count);
        }
    }

    #[test]
    fn legacy_mode_drops_fields_missing_from_first_record() {
        let mut series = five_months();
        series[1].record = series[1]
            .record
            .clone()
            .with_counter(HarmCounter::CYCLIST_KILLED, 4);
        let killed = CounterField::Harm(HarmCounter::CYCLIST_KILLED);

        let legacy = aggregate(&series, 2).unwrap();
        assert_eq!(legacy[0].get(killed), None);

        let strict = aggregate_with_mode(&series, 2, AggregationMode::AllFields).unwrap();
        assert_eq!(strict[0].get(killed), Some(4));
        assert_eq!(
            strict[0].get(CounterField::Harm(HarmCounter::PEDESTRIAN_INJURED)),
            Some(3)
        );
    }

    #[test]
    fn rejects_zero_bucket_size() {
        assert!(matches!(
            aggregate(&five_months(), 0),
            Err(AnalyticsError::InvalidBucketSize { size: 0 })
        ));
    }

    #[test]
    fn empty_series_yields_no_buckets() {
        assert!(aggregate(&[], 3).unwrap().is_empty());
        assert!(aggregate(&[], 1).unwrap().is_empty());
    }
}
