//! JSON file row source.
//!
//! Accepts either a bare array of row objects or a SQL-API style response
//! object whose rows live under a `"rows"` key.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{RowSource, SourceError};

/// Reads raw rows from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    label: String,
}

impl JsonFileSource {
    /// Creates a source for the file at `path`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let label = path.display().to_string();
        Self { path, label }
    }
}

impl RowSource for JsonFileSource {
    fn id(&self) -> &str {
        &self.label
    }

    fn fetch_rows(&self) -> Result<Vec<Value>, SourceError> {
        let text = std::fs::read_to_string(&self.path)?;
        log::debug!("Read {} bytes from {}", text.len(), self.label);
        parse_rows(&text)
    }
}

/// Extracts row objects from a JSON document.
///
/// # Errors
///
/// Returns [`SourceError::Json`] if the text is not valid JSON, or
/// [`SourceError::Normalization`] if it holds neither an array nor an
/// object with a `"rows"` array.
pub fn parse_rows(text: &str) -> Result<Vec<Value>, SourceError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut body) => match body.remove("rows") {
            Some(Value::Array(rows)) => Ok(rows),
            _ => Err(SourceError::Normalization {
                message: "response object has no 'rows' array".to_string(),
            }),
        },
        other => Err(SourceError::Normalization {
            message: format!("expected an array of rows, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    #[test]
    fn parses_bare_array() {
        let rows = parse_rows(r#"[{"month": "2020-01"}, {"month": "2020-02"}]"#).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn parses_wrapped_rows() {
        let rows = parse_rows(r#"{"rows": [{"month": "2020-01"}], "total_rows": 1}"#).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn rejects_other_shapes() {
        assert!(matches!(
            parse_rows(r#"{"error": ["bad query"]}"#),
            Err(SourceError::Normalization { .. })
        ));
        assert!(matches!(parse_rows("42"), Err(SourceError::Normalization { .. })));
        assert!(matches!(parse_rows("{"), Err(SourceError::Json(_))));
    }

    #[test]
    fn reads_rows_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"month": "2021-07", "borough": "Bronx"}}]"#).unwrap();

        let source = JsonFileSource::new(file.path());
        let rows = source.fetch_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["borough"], "Bronx");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let source = JsonFileSource::new("/nonexistent/crash_rows.json");
        assert!(matches!(source.fetch_rows(), Err(SourceError::Io(_))));
    }
}
