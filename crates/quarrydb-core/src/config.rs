//! Engine configuration.
//!
//! All knobs have defaults; a partial TOML document only overrides the keys
//! it names.

use crate::error::InternalError;
use serde::{Deserialize, Serialize};

///
/// EngineConfig
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub backfill: BackfillConfig,
    pub auto_index: AutoIndexConfig,
}

impl EngineConfig {
    /// Parse and validate a TOML configuration document.
    pub fn from_toml_str(source: &str) -> Result<Self, InternalError> {
        let config: Self = toml::from_str(source)
            .map_err(|err| InternalError::config_invalid(format!("invalid config: {err}")))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), InternalError> {
        if self.backfill.max_documents_per_run == 0 {
            return Err(InternalError::config_invalid(
                "backfill.max_documents_per_run must be greater than zero",
            ));
        }

        let cost = self.auto_index.relative_index_read_cost_per_document;
        if !cost.is_finite() || cost <= 0.0 {
            return Err(InternalError::config_invalid(format!(
                "auto_index.relative_index_read_cost_per_document must be positive, got {cost}"
            )));
        }

        Ok(())
    }
}

///
/// BackfillConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackfillConfig {
    /// Document budget for one backfill invocation across all groups.
    pub max_documents_per_run: usize,
}

impl BackfillConfig {
    pub const DEFAULT_MAX_DOCUMENTS_PER_RUN: usize = 50;
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            max_documents_per_run: Self::DEFAULT_MAX_DOCUMENTS_PER_RUN,
        }
    }
}

///
/// AutoIndexConfig
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoIndexConfig {
    pub enabled: bool,

    /// Collections that scanned fewer documents than this never get an
    /// index created for them.
    pub min_collection_size: usize,

    /// Cost of one index lookup relative to one full-scan document read.
    pub relative_index_read_cost_per_document: f64,
}

impl AutoIndexConfig {
    pub const DEFAULT_MIN_COLLECTION_SIZE: usize = 100;
    pub const DEFAULT_RELATIVE_INDEX_READ_COST_PER_DOCUMENT: f64 = 2.0;
}

impl Default for AutoIndexConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_collection_size: Self::DEFAULT_MIN_COLLECTION_SIZE,
            relative_index_read_cost_per_document:
                Self::DEFAULT_RELATIVE_INDEX_READ_COST_PER_DOCUMENT,
        }
    }
}

///
/// TESTS
///
