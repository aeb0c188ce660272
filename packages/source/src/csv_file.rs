//! CSV file row source.
//!
//! Parses a CSV export and returns every row as a [`serde_json::Value`]
//! object keyed by the column headers in the first row. Cell values stay
//! strings; normalization coerces them.

use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{RowSource, SourceError};

/// Reads raw rows from a CSV file on disk.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
    label: String,
    delimiter: u8,
}

impl CsvFileSource {
    /// Creates a comma-delimited source for the file at `path`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let label = path.display().to_string();
        Self {
            path,
            label,
            delimiter: b',',
        }
    }

    /// Sets the field delimiter (e.g. `b'\t'` for TSV files).
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl RowSource for CsvFileSource {
    fn id(&self) -> &str {
        &self.label
    }

    fn fetch_rows(&self) -> Result<Vec<Value>, SourceError> {
        let file = std::fs::File::open(&self.path)?;
        let rows = read_rows(file, self.delimiter)?;
        log::info!("Parsed {} rows from CSV at {}", rows.len(), self.label);
        Ok(rows)
    }
}

/// Parses CSV from `reader` into JSON row objects.
///
/// # Errors
///
/// Returns [`SourceError::Csv`] on malformed CSV, or
/// [`SourceError::Normalization`] if there is no header row.
pub fn read_rows(reader: impl Read, delimiter: u8) -> Result<Vec<Value>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(SourceError::Normalization {
            message: "CSV file contains no header row".to_owned(),
        });
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let mut map = serde_json::Map::new();
        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).unwrap_or("").trim().to_owned();
            map.insert(header.clone(), Value::String(value));
        }
        rows.push(Value::Object(map));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_keyed_by_header() {
        let csv = "month,borough,cyclist_injured\n2020-01,Queens,3\n2020-02,Queens,\n";
        let rows = read_rows(csv.as_bytes(), b',').unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["borough"], "Queens");
        assert_eq!(rows[0]["cyclist_injured"], "3");
        assert_eq!(rows[1]["cyclist_injured"], "");
    }

    #[test]
    fn honours_delimiter() {
        let tsv = "month\tborough\n2020-01\tBronx\n";
        let rows = read_rows(tsv.as_bytes(), b'\t').unwrap();
        assert_eq!(rows[0]["borough"], "Bronx");
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(
            read_rows("".as_bytes(), b','),
            Err(SourceError::Normalization { .. })
        ));
    }
}
