//! Encounter catalogs: the shops and scheduled costs a town offers.

use quest_core::{validate_encounter, Encounter, UpcomingEvent, ValidationError, LAST_DAY_INDEX};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

const BUILTIN_TOWN: &str = include_str!("../assets/town.yaml");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid entry {id}: {source}")]
    Invalid {
        id: String,
        #[source]
        source: ValidationError,
    },
    #[error("duplicate id in catalog: {0}")]
    Duplicate(String),
}

/// Encounters available in town plus the costs scheduled for a week.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EncounterCatalog {
    pub encounters: Vec<Encounter>,
    #[serde(default)]
    pub upcoming: Vec<UpcomingEvent>,
}

impl EncounterCatalog {
    /// The town shipped with the game.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_TOWN)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let catalog: EncounterCatalog = serde_yaml::from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_yaml_str(&text)?;
        info!(
            path = %path.as_ref().display(),
            encounters = catalog.encounters.len(),
            "loaded encounter catalog"
        );
        Ok(catalog)
    }

    pub fn get(&self, id: &str) -> Option<&Encounter> {
        self.encounters.iter().find(|e| e.id == id)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut ids = BTreeSet::new();
        for e in &self.encounters {
            validate_encounter(e).map_err(|source| CatalogError::Invalid {
                id: e.id.clone(),
                source,
            })?;
            if !ids.insert(e.id.as_str()) {
                return Err(CatalogError::Duplicate(e.id.clone()));
            }
        }
        let mut event_ids = BTreeSet::new();
        for ev in &self.upcoming {
            let invalid = |source| CatalogError::Invalid {
                id: ev.id.clone(),
                source,
            };
            if ev.day_index > LAST_DAY_INDEX {
                return Err(invalid(ValidationError::DayOutOfRange(ev.day_index)));
            }
            if ev.cost < Decimal::ZERO {
                return Err(invalid(ValidationError::NegativeMoney("upcoming.cost")));
            }
            if !event_ids.insert(ev.id.as_str()) {
                return Err(CatalogError::Duplicate(ev.id.clone()));
            }
        }
        Ok(())
    }
}
