#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Entity-type registry.
//!
//! Every entity type the dashboard understands is described by a small TOML
//! definition (which column holds the entity key, how to label it). The
//! definitions are embedded at compile time; see [`registry`].

pub mod registry;

use thiserror::Error;

/// Errors that can occur while resolving entity-type definitions.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An embedded definition failed to parse.
    #[error("Failed to parse {name}.toml: {message}")]
    Parse {
        /// Name of the definition file.
        name: String,
        /// Parser error message.
        message: String,
    },

    /// No definition exists for the requested entity type.
    #[error("Unknown entity type '{name}'")]
    UnknownEntityType {
        /// The name that was requested.
        name: String,
    },
}
