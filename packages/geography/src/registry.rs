//! Entity-type registry, loaded from embedded TOML configs.
//!
//! Each `.toml` file in `packages/geography/entities/` is baked into the
//! binary at compile time via [`include_str!`]. Supporting a new entity type
//! means adding a variant to [`EntityType`], a TOML file, and a line below.

use crash_map_geography_models::{EntityType, EntityTypeDefinition};

use crate::RegistryError;

/// TOML configs embedded at compile time.
const ENTITY_TOMLS: &[(&str, &str)] = &[
    ("borough", include_str!("../entities/borough.toml")),
    (
        "community_board",
        include_str!("../entities/community_board.toml"),
    ),
    ("city_council", include_str!("../entities/city_council.toml")),
    ("assembly", include_str!("../entities/assembly.toml")),
    ("senate", include_str!("../entities/senate.toml")),
    ("nycc_precinct", include_str!("../entities/nycc_precinct.toml")),
    ("neighborhood", include_str!("../entities/neighborhood.toml")),
    ("intersection", include_str!("../entities/intersection.toml")),
    ("custom", include_str!("../entities/custom.toml")),
];

/// Parses a single entity-type definition from TOML.
///
/// # Errors
///
/// Returns the parser's message if the TOML is malformed or does not match
/// [`EntityTypeDefinition`].
pub fn parse_entity_toml(toml_str: &str) -> Result<EntityTypeDefinition, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}

/// Returns all configured entity-type definitions, parsed from embedded TOML.
///
/// # Errors
///
/// Returns [`RegistryError::Parse`] if any embedded config is malformed.
pub fn all_entity_types() -> Result<Vec<EntityTypeDefinition>, RegistryError> {
    ENTITY_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_entity_toml(toml).map_err(|message| RegistryError::Parse {
                name: (*name).to_string(),
                message,
            })
        })
        .collect()
}

/// Looks up the definition for one entity type.
///
/// # Errors
///
/// Returns [`RegistryError::UnknownEntityType`] if no embedded definition
/// describes `entity_type`, or [`RegistryError::Parse`] if the embedded
/// configs are malformed.
pub fn definition(entity_type: EntityType) -> Result<EntityTypeDefinition, RegistryError> {
    let found = all_entity_types()?
        .into_iter()
        .find(|def| def.id == entity_type);

    found.ok_or_else(|| {
        log::warn!("No entity definition for {entity_type}");
        RegistryError::UnknownEntityType {
            name: entity_type.to_string(),
        }
    })
}

/// Resolves an entity type by name (e.g. `"city_council"`).
///
/// # Errors
///
/// Returns [`RegistryError::UnknownEntityType`] if the name is not a known
/// entity type.
pub fn definition_by_name(name: &str) -> Result<EntityTypeDefinition, RegistryError> {
    let entity_type: EntityType = name
        .parse()
        .map_err(|_| RegistryError::UnknownEntityType {
            name: name.to_string(),
        })?;
    definition(entity_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_all_entity_types() {
        let defs = all_entity_types().unwrap();
        assert_eq!(defs.len(), EntityType::all().len());
    }

    #[test]
    fn every_entity_type_has_a_definition() {
        for entity_type in EntityType::all() {
            let def = definition(*entity_type).unwrap();
            assert_eq!(def.id, *entity_type);
            assert!(!def.key_field.is_empty(), "{entity_type} has no key field");
            assert!(
                !def.display_name.is_empty(),
                "{entity_type} has no display name"
            );
        }
    }

    #[test]
    fn definition_ids_are_unique() {
        let defs = all_entity_types().unwrap();
        let mut ids: Vec<EntityType> = defs.iter().map(|d| d.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), defs.len());
    }

    #[test]
    fn resolves_by_name() {
        let def = definition_by_name("city_council").unwrap();
        assert_eq!(def.key_field, "city_council");
        assert!(matches!(
            definition_by_name("zip_code"),
            Err(RegistryError::UnknownEntityType { .. })
        ));
    }

    #[test]
    fn rejects_malformed_definition() {
        assert!(parse_entity_toml("id = \"borough\"").is_err());
        assert!(parse_entity_toml("id = \"county\"\ndisplay_name = \"x\"\nkey_field = \"x\"").is_err());
    }
}
