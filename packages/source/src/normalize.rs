//! Raw row → [`Record`] normalization.
//!
//! Known counter columns are parsed through [`CounterField`]; every other
//! column (labels, geometry, the key and month columns themselves) is
//! ignored.

use crash_map_analytics_models::Record;
use crash_map_crash_models::CounterField;
use crash_map_geography_models::EntityTypeDefinition;
use serde_json::Value;

use crate::SourceError;
use crate::parsing::{parse_count, parse_entity_key, parse_month};

/// Column holding the row's month.
pub const MONTH_FIELD: &str = "month";

/// Normalizes one raw row.
///
/// # Errors
///
/// Returns [`SourceError::Normalization`] if the row is not an object or
/// lacks a parseable month or entity key.
pub fn normalize_row(
    definition: &EntityTypeDefinition,
    row: &Value,
) -> Result<Record, SourceError> {
    let object = row.as_object().ok_or_else(|| SourceError::Normalization {
        message: format!("expected a JSON object, got {row}"),
    })?;

    let month = object
        .get(MONTH_FIELD)
        .and_then(Value::as_str)
        .and_then(parse_month)
        .ok_or_else(|| SourceError::Normalization {
            message: format!("missing or invalid '{MONTH_FIELD}'"),
        })?;

    let key = object
        .get(&definition.key_field)
        .and_then(parse_entity_key)
        .ok_or_else(|| SourceError::Normalization {
            message: format!("missing or invalid '{}'", definition.key_field),
        })?;

    let record = object
        .iter()
        .filter_map(|(name, value)| {
            let field = name.parse::<CounterField>().ok()?;
            Some((field, parse_count(value)?))
        })
        .fold(Record::new(key, month), |record, (field, count)| {
            record.with_counter(field, count)
        });

    Ok(record)
}

/// Normalizes a batch of raw rows, skipping rows that fail.
///
/// The result is sorted ascending by month (stable, so rows for the same
/// month keep their source order).
#[must_use]
pub fn normalize_rows(definition: &EntityTypeDefinition, rows: &[Value]) -> Vec<Record> {
    let mut skipped = 0_usize;
    let mut records: Vec<Record> = rows
        .iter()
        .filter_map(|row| match normalize_row(definition, row) {
            Ok(record) => Some(record),
            Err(e) => {
                skipped += 1;
                log::warn!("[{}] skipping row: {e}", definition.id);
                None
            }
        })
        .collect();

    records.sort_by_key(|r| r.month);

    if skipped > 0 {
        log::warn!(
            "[{}] skipped {skipped} of {} rows",
            definition.id,
            rows.len()
        );
    }
    log::debug!("[{}] normalized {} records", definition.id, records.len());

    records
}
