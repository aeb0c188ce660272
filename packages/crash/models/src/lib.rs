#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Crash harm taxonomy types and crash-type filter definitions.
//!
//! This crate defines the canonical harm counters used across the crash
//! dashboard. Every monthly crash row carries counts keyed by
//! `(person type, harm type)`, optionally broken down by the vehicle mode
//! involved. Field names are resolved through these enums rather than by
//! building strings at the call site.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// The kind of person harmed in a crash.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PersonType {
    /// People on foot.
    Pedestrian,
    /// People on bicycles.
    Cyclist,
    /// Drivers and passengers of motor vehicles.
    Motorist,
}

impl PersonType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Pedestrian, Self::Cyclist, Self::Motorist]
    }
}

/// The kind of harm suffered.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HarmType {
    /// Non-fatal injury.
    Injured,
    /// Fatality.
    Killed,
}

impl HarmType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Injured, Self::Killed]
    }
}

/// Vehicle mode used by the modal breakdown counters
/// (`<person>_<harm>_by<mode>`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VehicleMode {
    /// Passenger cars.
    Car,
    /// Sport utility vehicles.
    Suv,
    /// Trucks and vans.
    Truck,
    /// Buses.
    Bus,
    /// Motorcycles and mopeds.
    Motorcycle,
    /// Bicycles and e-bikes.
    Bicycle,
    /// Any other vehicle type.
    Other,
}

impl VehicleMode {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Car,
            Self::Suv,
            Self::Truck,
            Self::Bus,
            Self::Motorcycle,
            Self::Bicycle,
            Self::Other,
        ]
    }
}

/// One of the six `(person type, harm type)` counters carried by every
/// crash row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HarmCounter {
    /// Who was harmed.
    pub person: PersonType,
    /// How they were harmed.
    pub harm: HarmType,
}

impl HarmCounter {
    /// Pedestrians injured.
    pub const PEDESTRIAN_INJURED: Self = Self::new(PersonType::Pedestrian, HarmType::Injured);
    /// Pedestrians killed.
    pub const PEDESTRIAN_KILLED: Self = Self::new(PersonType::Pedestrian, HarmType::Killed);
    /// Cyclists injured.
    pub const CYCLIST_INJURED: Self = Self::new(PersonType::Cyclist, HarmType::Injured);
    /// Cyclists killed.
    pub const CYCLIST_KILLED: Self = Self::new(PersonType::Cyclist, HarmType::Killed);
    /// Motorists injured.
    pub const MOTORIST_INJURED: Self = Self::new(PersonType::Motorist, HarmType::Injured);
    /// Motorists killed.
    pub const MOTORIST_KILLED: Self = Self::new(PersonType::Motorist, HarmType::Killed);

    /// Creates a counter from its two components.
    #[must_use]
    pub const fn new(person: PersonType, harm: HarmType) -> Self {
        Self { person, harm }
    }

    /// Returns all six counters, injuries first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::PEDESTRIAN_INJURED,
            Self::CYCLIST_INJURED,
            Self::MOTORIST_INJURED,
            Self::PEDESTRIAN_KILLED,
            Self::CYCLIST_KILLED,
            Self::MOTORIST_KILLED,
        ]
    }

    /// Returns the column name this counter is stored under.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match (self.person, self.harm) {
            (PersonType::Pedestrian, HarmType::Injured) => "pedestrian_injured",
            (PersonType::Pedestrian, HarmType::Killed) => "pedestrian_killed",
            (PersonType::Cyclist, HarmType::Injured) => "cyclist_injured",
            (PersonType::Cyclist, HarmType::Killed) => "cyclist_killed",
            (PersonType::Motorist, HarmType::Injured) => "motorist_injured",
            (PersonType::Motorist, HarmType::Killed) => "motorist_killed",
        }
    }

    /// Looks up a counter by its exact column name.
    #[must_use]
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|counter| counter.field_name() == name)
    }
}

impl std::fmt::Display for HarmCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Column name of the "crashes without injury or fatality" counter.
pub const NO_INJURY_FATALITY_FIELD: &str = "no_injury_fatality";

/// A numeric column on a crash row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CounterField {
    /// One of the six person/harm counters.
    Harm(HarmCounter),
    /// A vehicle-mode breakdown of a person/harm counter. These overlap the
    /// plain [`CounterField::Harm`] counts and never enter person totals.
    Modal(HarmCounter, VehicleMode),
    /// Crashes in which nobody was injured or killed.
    NoInjuryFatality,
}

impl CounterField {
    /// Returns `true` for plain injury counters (modal breakdowns excluded).
    #[must_use]
    pub const fn is_injury(self) -> bool {
        matches!(
            self,
            Self::Harm(HarmCounter {
                harm: HarmType::Injured,
                ..
            })
        )
    }

    /// Returns `true` for plain fatality counters (modal breakdowns excluded).
    #[must_use]
    pub const fn is_fatality(self) -> bool {
        matches!(
            self,
            Self::Harm(HarmCounter {
                harm: HarmType::Killed,
                ..
            })
        )
    }
}

impl From<HarmCounter> for CounterField {
    fn from(counter: HarmCounter) -> Self {
        Self::Harm(counter)
    }
}

impl std::fmt::Display for CounterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Harm(counter) => f.write_str(counter.field_name()),
            Self::Modal(counter, mode) => write!(f, "{}_by{mode}", counter.field_name()),
            Self::NoInjuryFatality => f.write_str(NO_INJURY_FATALITY_FIELD),
        }
    }
}

/// Error returned when a column name does not name a known counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownFieldError {
    /// The column name that was provided.
    pub name: String,
}

impl std::fmt::Display for UnknownFieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown counter field '{}'", self.name)
    }
}

impl std::error::Error for UnknownFieldError {}

impl FromStr for CounterField {
    type Err = UnknownFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == NO_INJURY_FATALITY_FIELD {
            return Ok(Self::NoInjuryFatality);
        }
        if let Some(counter) = HarmCounter::from_field_name(s) {
            return Ok(Self::Harm(counter));
        }
        if let Some((base, mode)) = s.split_once("_by")
            && let Some(counter) = HarmCounter::from_field_name(base)
            && let Ok(mode) = mode.parse::<VehicleMode>()
        {
            return Ok(Self::Modal(counter, mode));
        }
        Err(UnknownFieldError {
            name: s.to_string(),
        })
    }
}

impl Serialize for CounterField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CounterField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Selection flags for each person type under one harm type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonSelection {
    /// Include cyclists.
    pub cyclist: bool,
    /// Include motorists.
    pub motorist: bool,
    /// Include pedestrians.
    pub pedestrian: bool,
}

impl PersonSelection {
    /// Every person type selected.
    pub const ALL: Self = Self {
        cyclist: true,
        motorist: true,
        pedestrian: true,
    };

    /// Returns whether `person` is selected.
    #[must_use]
    pub const fn contains(self, person: PersonType) -> bool {
        match person {
            PersonType::Pedestrian => self.pedestrian,
            PersonType::Cyclist => self.cyclist,
            PersonType::Motorist => self.motorist,
        }
    }

    const fn set(&mut self, person: PersonType, on: bool) {
        match person {
            PersonType::Pedestrian => self.pedestrian = on,
            PersonType::Cyclist => self.cyclist = on,
            PersonType::Motorist => self.motorist = on,
        }
    }
}

/// The active crash-type filter.
///
/// Selects which counters contribute to a derived total. The default
/// selects nothing, which is valid and yields zero totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CrashTypeFilter {
    /// Injury counters to include.
    pub injury: PersonSelection,
    /// Fatality counters to include.
    pub fatality: PersonSelection,
    /// Include crashes with no injury or fatality.
    pub no_injury_fatality: bool,
}

impl CrashTypeFilter {
    /// A filter selecting all six harm counters.
    #[must_use]
    pub const fn all_harm() -> Self {
        Self {
            injury: PersonSelection::ALL,
            fatality: PersonSelection::ALL,
            no_injury_fatality: false,
        }
    }

    /// Returns a copy with `counter` switched on or off.
    #[must_use]
    pub const fn with(mut self, counter: HarmCounter, on: bool) -> Self {
        match counter.harm {
            HarmType::Injured => self.injury.set(counter.person, on),
            HarmType::Killed => self.fatality.set(counter.person, on),
        }
        self
    }

    /// Returns a copy with the no-injury/fatality flag set to `on`.
    #[must_use]
    pub const fn with_no_injury_fatality(mut self, on: bool) -> Self {
        self.no_injury_fatality = on;
        self
    }

    /// Returns whether `counter` contributes to totals.
    #[must_use]
    pub const fn is_selected(&self, counter: HarmCounter) -> bool {
        match counter.harm {
            HarmType::Injured => self.injury.contains(counter.person),
            HarmType::Killed => self.fatality.contains(counter.person),
        }
    }

    /// Returns the counter fields this filter sums, in a fixed order.
    ///
    /// Modal breakdown fields are never part of this list.
    #[must_use]
    pub fn selected_fields(&self) -> Vec<CounterField> {
        let mut fields: Vec<CounterField> = HarmCounter::all()
            .iter()
            .copied()
            .filter(|counter| self.is_selected(*counter))
            .map(CounterField::Harm)
            .collect();
        if self.no_injury_fatality {
            fields.push(CounterField::NoInjuryFatality);
        }
        fields
    }

    /// Returns `true` if nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected_fields().is_empty()
    }
}
