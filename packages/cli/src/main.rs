#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Command-line front end for the crash map analytics pipeline.
//!
//! Reads a JSON or CSV export of monthly crash rows for one entity type and
//! prints the derived dashboard views as JSON.

mod config;

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use crash_map_analytics_models::{PeriodComparison, PeriodTotals, RankedEntity};
use crash_map_dashboard::{DashboardSelectors, DashboardState, EntityProps, Period};
use crash_map_geography::registry;
use crash_map_geography_models::{EntityKey, EntityTypeDefinition};
use crash_map_source::RowSource;
use crash_map_source::csv_file::CsvFileSource;
use crash_map_source::json_file::JsonFileSource;
use serde::Serialize;

use crate::config::CrashMapConfig;

#[derive(Parser)]
#[command(name = "crash_map_cli", about = "Crash map analytics")]
struct Cli {
    /// Config file (defaults to ./crash_map.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the known entity types
    EntityTypes,
    /// Rank entities by severity over the trailing 24 months
    Rank {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Print one entity's scored monthly series for a period
    Series {
        #[command(flatten)]
        entity: EntityArgs,
        /// Which comparison period
        #[arg(long, value_enum, default_value_t = PeriodArg::B)]
        period: PeriodArg,
    },
    /// Print one entity's bucketed trend for a period
    Trend {
        #[command(flatten)]
        entity: EntityArgs,
        /// Which comparison period
        #[arg(long, value_enum, default_value_t = PeriodArg::B)]
        period: PeriodArg,
        /// Months per bucket (overrides the config file)
        #[arg(long)]
        bucket_size: Option<usize>,
    },
    /// Compare one entity's totals across period A and period B
    Compare {
        #[command(flatten)]
        entity: EntityArgs,
    },
}

#[derive(Args)]
struct DataArgs {
    /// JSON or CSV file of raw monthly rows
    #[arg(long)]
    input: PathBuf,
    /// Entity type the rows describe (e.g. `city_council`)
    #[arg(long)]
    entity_type: String,
}

#[derive(Args)]
struct EntityArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Entity key (numeric keys are matched as numbers)
    key: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum PeriodArg {
    A,
    B,
}

impl From<PeriodArg> for Period {
    fn from(value: PeriodArg) -> Self {
        match value {
            PeriodArg::A => Self::A,
            PeriodArg::B => Self::B,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LabeledRank<'a> {
    label: String,
    #[serde(flatten)]
    entity: &'a RankedEntity,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Comparison<'a> {
    label: String,
    period_a: &'a PeriodTotals,
    period_b: &'a PeriodTotals,
    #[serde(flatten)]
    comparison: &'a PeriodComparison,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();
    let mut config = config::load(cli.config.as_deref())?;
    let selectors = DashboardSelectors::new();

    match cli.command {
        Commands::EntityTypes => print_json(&registry::all_entity_types()?)?,
        Commands::Rank { data } => {
            let (definition, state) = load_state(&data, &config)?;
            let ranked = selectors.ranked(&state, definition.id)?;
            let labeled: Vec<LabeledRank<'_>> = ranked
                .iter()
                .map(|entity| LabeledRank {
                    label: definition.label(&entity.key),
                    entity,
                })
                .collect();
            print_json(&labeled)?;
        }
        Commands::Series { entity, period } => {
            let (props, state) = load_entity(&entity, &config)?;
            print_json(&*selectors.series(&state, &props, period.into())?)?;
        }
        Commands::Trend {
            entity,
            period,
            bucket_size,
        } => {
            if let Some(size) = bucket_size {
                config.trend.bucket_size_months = size;
            }
            let (props, state) = load_entity(&entity, &config)?;
            print_json(&*selectors.trend(&state, &props, period.into())?)?;
        }
        Commands::Compare { entity } => {
            let (definition, state) = load_state(&entity.data, &config)?;
            let props = EntityProps::new(definition.id, EntityKey::coerce(&entity.key));
            let totals_a = selectors.totals(&state, &props, Period::A)?;
            let totals_b = selectors.totals(&state, &props, Period::B)?;
            let comparison = selectors.comparison(&state, &props)?;
            print_json(&Comparison {
                label: definition.label(&props.entity_key),
                period_a: &totals_a,
                period_b: &totals_b,
                comparison: &comparison,
            })?;
        }
    }

    Ok(())
}

/// Picks a row source by file extension.
fn row_source(path: &Path) -> Box<dyn RowSource> {
    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        Box::new(CsvFileSource::new(path))
    } else {
        Box::new(JsonFileSource::new(path))
    }
}

/// Loads the input file into a fresh dashboard state.
fn load_state(
    data: &DataArgs,
    config: &CrashMapConfig,
) -> Result<(EntityTypeDefinition, DashboardState), Box<dyn std::error::Error>> {
    let definition = registry::definition_by_name(&data.entity_type)?;
    let source = row_source(&data.input);
    let records = crash_map_source::load_records(source.as_ref(), &definition)?;
    log::info!(
        "Loaded {} {} records from {}",
        records.len(),
        definition.display_name,
        data.input.display()
    );

    let latest = records
        .iter()
        .map(|r| r.month)
        .max()
        .ok_or_else(|| format!("No usable rows in {}", data.input.display()))?;
    let (period_a, period_b) = config.periods(latest)?;
    log::debug!(
        "Period A {} to {}, period B {} to {}",
        period_a.start_date,
        period_a.end_date,
        period_b.start_date,
        period_b.end_date
    );

    let state = DashboardState::new(config.filter, period_a, period_b)
        .with_trend(config.trend)
        .with_records(definition.id, records);

    Ok((definition, state))
}

fn load_entity(
    entity: &EntityArgs,
    config: &CrashMapConfig,
) -> Result<(EntityProps, DashboardState), Box<dyn std::error::Error>> {
    let (definition, state) = load_state(&entity.data, config)?;
    let props = EntityProps::new(definition.id, EntityKey::coerce(&entity.key));
    Ok((props, state))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
