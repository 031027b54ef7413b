//! Serializable copies of marketplace state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::AccountRegistry;
use crate::catalog::ProductCatalog;
use crate::error::MarketError;
use crate::escrow::CustodyEscrow;
use crate::ledger::PurchaseLedger;

/// Everything the marketplace owns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketState {
    /// Vendors and customers.
    pub accounts: AccountRegistry,
    /// Quantity-priced listings.
    pub catalog: ProductCatalog,
    /// Purchase histories.
    pub ledger: PurchaseLedger,
    /// Unique items in custody.
    pub escrow: CustodyEscrow,
}

/// A point-in-time copy of a marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Name of the instance the snapshot was taken from.
    pub market: String,
    /// When the snapshot was taken.
    pub taken_at: DateTime<Utc>,
    /// The copied state.
    pub state: MarketState,
}

impl MarketSnapshot {
    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, MarketError> {
        serde_json::to_string(self)
            .map_err(|e| MarketError::Config(format!("failed to serialize snapshot: {e}")))
    }

    /// Parse from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is not a valid snapshot.
    pub fn from_json(json: &str) -> Result<Self, MarketError> {
        serde_json::from_str(json)
            .map_err(|e| MarketError::Config(format!("invalid snapshot: {e}")))
    }
}
