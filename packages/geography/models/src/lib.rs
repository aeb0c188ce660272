#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic entity types and entity key definitions.
//!
//! Crash statistics are published per geographic entity: a borough, a
//! council district, a police precinct, a single intersection, and so on.
//! Each raw row names its entity in a column whose name depends on the
//! entity type.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A kind of geographic entity the dashboard reports on.
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
pub enum EntityType {
    /// One of the five boroughs.
    Borough,
    /// Community board districts.
    CommunityBoard,
    /// City council districts.
    CityCouncil,
    /// State assembly districts.
    Assembly,
    /// State senate districts.
    Senate,
    /// Police precincts.
    NyccPrecinct,
    /// Neighborhood tabulation areas.
    Neighborhood,
    /// Individual intersections.
    Intersection,
    /// A user-drawn polygon.
    Custom,
}

impl EntityType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Borough,
            Self::CommunityBoard,
            Self::CityCouncil,
            Self::Assembly,
            Self::Senate,
            Self::NyccPrecinct,
            Self::Neighborhood,
            Self::Intersection,
            Self::Custom,
        ]
    }
}

/// Identifier of a single entity.
///
/// Numeric-looking identifiers are always stored as numbers so that
/// `"7"` and `7` name the same entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityKey {
    /// A numeric identifier (district numbers, precinct numbers).
    Number(i64),
    /// A textual identifier (borough names, intersection ids).
    Text(String),
}

impl EntityKey {
    /// Builds a key from a string, coercing numeric-looking values.
    #[must_use]
    pub fn coerce(value: &str) -> Self {
        let trimmed = value.trim();
        trimmed
            .parse::<i64>()
            .map_or_else(|_| Self::Text(trimmed.to_string()), Self::Number)
    }
}

impl From<i64> for EntityKey {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for EntityKey {
    fn from(value: &str) -> Self {
        Self::coerce(value)
    }
}

impl std::fmt::Display for EntityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// How rows for one entity type are shaped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTypeDefinition {
    /// Which entity type this describes.
    pub id: EntityType,
    /// Human-readable plural name (e.g. `"City Council Districts"`).
    pub display_name: String,
    /// Column holding the entity identifier.
    pub key_field: String,
    /// Prefix used when labelling a single entity (e.g. `"Council District"`).
    #[serde(default)]
    pub label_prefix: Option<String>,
}

impl EntityTypeDefinition {
    /// Returns a display label for one entity of this type.
    #[must_use]
    pub fn label(&self, key: &EntityKey) -> String {
        self.label_prefix
            .as_deref()
            .map_or_else(|| key.to_string(), |prefix| format!("{prefix} {key}"))
    }
}
