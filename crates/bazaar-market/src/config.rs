//! Marketplace configuration.
//!
//! Configuration for a marketplace instance:
//! - Instance name (used in log fields)
//! - The holding account the marketplace acts as (custodian and spender)
//! - The operator that receives recovered tokens

use std::path::Path;

use bazaar_token::Address;
use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// Maximum length of an instance name.
const MAX_NAME_LEN: usize = 64;

/// Main marketplace configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarketConfig {
    /// Human-readable instance name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Holding account of the marketplace.
    ///
    /// Items in escrow are owned by this account, customers approve it as
    /// the spender of their payment tokens, and stray tokens land here.
    pub market_account: Address,
    /// Operator allowed to sweep stray tokens; receives them.
    pub operator: Address,
}

fn default_name() -> String {
    "bazaar".to_string()
}

impl MarketConfig {
    /// Create a configuration with the default name.
    #[must_use]
    pub fn new(market_account: Address, operator: Address) -> Self {
        Self {
            name: default_name(),
            market_account,
            operator,
        }
    }

    /// Set the instance name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MarketError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            MarketError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid.
    pub fn from_json(content: &str) -> Result<Self, MarketError> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| MarketError::Config(format!("invalid JSON: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, MarketError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MarketError::Config(format!("failed to serialize config: {e}")))
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), MarketError> {
        if self.name.is_empty() {
            return Err(MarketError::Config("name cannot be empty".to_string()));
        }

        if self.name.len() > MAX_NAME_LEN {
            return Err(MarketError::Config(format!(
                "name cannot exceed {MAX_NAME_LEN} characters"
            )));
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(MarketError::Config(
                "name must contain only alphanumeric characters, hyphens, and underscores"
                    .to_string(),
            ));
        }

        if self.operator == self.market_account {
            return Err(MarketError::Config(
                "operator must differ from market_account".to_string(),
            ));
        }

        Ok(())
    }
}
