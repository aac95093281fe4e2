//! Augment table loading

use super::ConfigError;
use crate::augment::{AugmentDef, OFFER_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Container for augment definitions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AugmentTable {
    pub augments: Vec<AugmentDef>,
}

impl AugmentTable {
    /// Load and validate an augment table from a TOML or JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let table: AugmentTable = super::load_file(path)?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.augments.len() < OFFER_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "augment table needs at least {} entries, found {}",
                OFFER_SIZE,
                self.augments.len()
            )));
        }
        let mut ids = HashSet::new();
        for augment in &self.augments {
            augment.validate()?;
            if !ids.insert(augment.id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate augment id '{}'",
                    augment.id
                )));
            }
        }
        Ok(())
    }
}

/// Parse and validate an augment table from a TOML string
pub fn parse_augment_table(content: &str) -> Result<AugmentTable, ConfigError> {
    let table: AugmentTable = super::parse_toml(content)?;
    table.validate()?;
    Ok(table)
}

/// The augment table shipped with the crate
pub fn default_augments() -> Result<AugmentTable, ConfigError> {
    parse_augment_table(include_str!("../../config/augments.toml"))
}
