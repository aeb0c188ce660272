//! `crash_map.toml` loading.
//!
//! Every field is optional and every key is camelCase:
//!
//! ```toml
//! [filter.injury]
//! pedestrian = true
//!
//! [periodA]
//! startDate = "2022-01-01"
//! endDate = "2022-12-01"
//!
//! [trend]
//! bucketSizeMonths = 3
//! mode = "all_fields"
//! ```

use std::path::Path;

use chrono::{Months, NaiveDate};
use crash_map_analytics_models::{DateRange, month_start};
use crash_map_crash_models::CrashTypeFilter;
use crash_map_dashboard::TrendSettings;
use serde::Deserialize;
use thiserror::Error;

/// Config file read when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "crash_map.toml";

/// Months covered by each default comparison period.
const DEFAULT_PERIOD_MONTHS: u32 = 12;

/// Errors that can occur while loading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config '{path}': {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid config TOML.
    #[error("Failed to parse config '{path}': {source}")]
    Parse {
        /// Path that was parsed.
        path: String,
        /// Underlying error.
        source: toml::de::Error,
    },

    /// A default period would start before the earliest representable date.
    #[error("Cannot derive default periods ending at {latest}")]
    PeriodOverflow {
        /// Latest month in the data.
        latest: NaiveDate,
    },
}

/// Dashboard settings read from `crash_map.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrashMapConfig {
    /// Crash-type filter. Defaults to every injury and fatality counter.
    pub filter: CrashTypeFilter,
    /// Earlier comparison period. Defaults to the twelve months before
    /// period B.
    pub period_a: Option<DateRange>,
    /// Later comparison period. Defaults to the twelve months ending at the
    /// latest month in the data.
    pub period_b: Option<DateRange>,
    /// Trend bucketing.
    pub trend: TrendSettings,
}

impl Default for CrashMapConfig {
    fn default() -> Self {
        Self {
            filter: CrashTypeFilter::all_harm(),
            period_a: None,
            period_b: None,
            trend: TrendSettings::default(),
        }
    }
}

impl CrashMapConfig {
    /// Resolves both periods, filling in defaults relative to `latest`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PeriodOverflow`] if a default period is needed
    /// but falls outside chrono's date range.
    pub fn periods(&self, latest: NaiveDate) -> Result<(DateRange, DateRange), ConfigError> {
        if let (Some(a), Some(b)) = (self.period_a, self.period_b) {
            return Ok((a, b));
        }
        let (default_a, default_b) = default_periods(latest)?;
        Ok((
            self.period_a.unwrap_or(default_a),
            self.period_b.unwrap_or(default_b),
        ))
    }
}

/// Parses config TOML.
///
/// # Errors
///
/// Returns [`toml::de::Error`] if the text is not valid config TOML.
pub fn parse_config(text: &str) -> Result<CrashMapConfig, toml::de::Error> {
    toml::from_str(text)
}

/// Loads the config file.
///
/// An explicit `path` must exist. Without one, [`DEFAULT_CONFIG_PATH`] is
/// read if present and defaults are used otherwise.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed.
pub fn load(path: Option<&Path>) -> Result<CrashMapConfig, ConfigError> {
    let path = match path {
        Some(path) => path,
        None => {
            let default = Path::new(DEFAULT_CONFIG_PATH);
            if !default.exists() {
                log::debug!("No {DEFAULT_CONFIG_PATH} found, using defaults");
                return Ok(CrashMapConfig::default());
            }
            default
        }
    };

    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;
    let config = parse_config(&text).map_err(|source| ConfigError::Parse {
        path: display.clone(),
        source,
    })?;

    log::info!("Loaded config from {display}");
    Ok(config)
}

/// The two back-to-back twelve-month periods ending at `latest`'s month.
fn default_periods(latest: NaiveDate) -> Result<(DateRange, DateRange), ConfigError> {
    let back = |date: NaiveDate, months: u32| {
        date.checked_sub_months(Months::new(months))
            .ok_or(ConfigError::PeriodOverflow { latest })
    };

    let end_b = month_start(latest);
    let start_b = back(end_b, DEFAULT_PERIOD_MONTHS - 1)?;
    let end_a = back(start_b, 1)?;
    let start_a = back(start_b, DEFAULT_PERIOD_MONTHS)?;
    Ok((
        DateRange::new(start_a, end_a),
        DateRange::new(start_b, end_b),
    ))
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use crash_map_analytics_models::AggregationMode;
    use crash_map_crash_models::HarmCounter;

    use super::*;

    fn month(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, CrashMapConfig::default());
        assert_eq!(config.filter, CrashTypeFilter::all_harm());
        assert_eq!(config.trend.bucket_size_months, 1);
    }

    #[test]
    fn parses_every_section() {
        let config = parse_config(
            r#"
            [filter]
            noInjuryFatality = true

            [filter.injury]
            pedestrian = true

            [periodA]
            startDate = "2022-01-01"
            endDate = "2022-06-15"

            [trend]
            bucketSizeMonths = 3
            mode = "all_fields"
            "#,
        )
        .unwrap();

        assert!(config.filter.is_selected(HarmCounter::PEDESTRIAN_INJURED));
        assert!(!config.filter.is_selected(HarmCounter::CYCLIST_INJURED));
        assert!(!config.filter.is_selected(HarmCounter::PEDESTRIAN_KILLED));
        assert!(config.filter.no_injury_fatality);
        assert_eq!(
            config.period_a,
            Some(DateRange {
                start_date: month(2022, 1),
                end_date: month(2022, 6),
            })
        );
        assert_eq!(config.period_b, None);
        assert_eq!(config.trend.bucket_size_months, 3);
        assert_eq!(config.trend.mode, AggregationMode::AllFields);
    }

    #[test]
    fn mid_month_bounds_keep_their_whole_month() {
        let config = parse_config(
            r#"
            [periodB]
            startDate = "2022-01-15"
            endDate = "2022-03-01"
            "#,
        )
        .unwrap();
        let period = config.period_b.unwrap();
        assert_eq!(period.start_date, month(2022, 1));
        assert!(period.contains(month(2022, 1)));
        assert!(period.contains(month(2022, 3)));
        assert!(!period.contains(month(2022, 4)));
    }

    #[test]
    fn snake_case_period_keys_are_ignored() {
        let config = parse_config("[period_a]\nstartDate = \"2022-01-01\"").unwrap();
        assert_eq!(config.period_a, None);
    }

    #[test]
    fn default_periods_report_overflow() {
        let result = CrashMapConfig::default().periods(NaiveDate::MIN);
        assert!(matches!(result, Err(ConfigError::PeriodOverflow { .. })));
    }

    #[test]
    fn explicit_periods_skip_default_arithmetic() {
        let explicit = DateRange::new(month(2020, 1), month(2020, 2));
        let config = CrashMapConfig {
            period_a: Some(explicit),
            period_b: Some(explicit),
            ..CrashMapConfig::default()
        };
        assert_eq!(config.periods(NaiveDate::MIN).unwrap(), (explicit, explicit));
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(parse_config("[trend]\nmode = \"sideways\"").is_err());
    }

    #[test]
    fn default_periods_are_back_to_back_years() {
        let latest = NaiveDate::from_ymd_opt(2023, 3, 17).unwrap();
        let (a, b) = CrashMapConfig::default().periods(latest).unwrap();
        assert_eq!(a, DateRange::new(month(2021, 4), month(2022, 3)));
        assert_eq!(b, DateRange::new(month(2022, 4), month(2023, 3)));
    }

    #[test]
    fn configured_periods_win() {
        let explicit = DateRange::new(month(2020, 1), month(2020, 2));
        let config = CrashMapConfig {
            period_b: Some(explicit),
            ..CrashMapConfig::default()
        };
        let (a, b) = config.periods(month(2023, 3)).unwrap();
        assert_eq!(b, explicit);
        assert_eq!(a, DateRange::new(month(2021, 4), month(2022, 3)));
    }

    #[test]
    fn loads_an_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[trend]\nbucketSizeMonths = 6").unwrap();
        let config = load(Some(file.path())).unwrap();
        assert_eq!(config.trend.bucket_size_months, 6);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
