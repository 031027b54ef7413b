//! Receipts for asset movements recorded by the in-memory ledgers.

use crate::address::Address;
use crate::amount::Amount;
use crate::item::ItemId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique transfer identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferId(String);

impl TransferId {
    /// Create a new random transfer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Get the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What moved in a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Asset {
    /// Fungible payment tokens.
    Tokens(Amount),
    /// A single non-fungible item.
    Item(ItemId),
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tokens(amount) => write!(f, "{amount} tokens"),
            Self::Item(item) => write!(f, "item {item}"),
        }
    }
}

/// A completed asset movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Transfer ID.
    pub id: TransferId,
    /// Account the asset left.
    pub from: Address,
    /// Account the asset arrived at.
    pub to: Address,
    /// Account that initiated the move when it was not `from` (spender or
    /// approved operator).
    pub via: Option<Address>,
    /// The asset moved.
    pub asset: Asset,
    /// When the transfer was applied.
    pub at: DateTime<Utc>,
}

impl Transfer {
    /// Create a token transfer record.
    #[must_use]
    pub fn tokens(from: Address, to: Address, amount: Amount) -> Self {
        Self {
            id: TransferId::new(),
            from,
            to,
            via: None,
            asset: Asset::Tokens(amount),
            at: Utc::now(),
        }
    }

    /// Create an item transfer record.
    #[must_use]
    pub fn item(from: Address, to: Address, item: ItemId) -> Self {
        Self {
            id: TransferId::new(),
            from,
            to,
            via: None,
            asset: Asset::Item(item),
            at: Utc::now(),
        }
    }

    /// Record the third party that initiated this transfer.
    #[must_use]
    pub fn via(mut self, initiator: Address) -> Self {
        if initiator != self.from {
            self.via = Some(initiator);
        }
        self
    }

    /// Token amount moved, or zero for item transfers.
    #[must_use]
    pub const fn amount(&self) -> Amount {
        match self.asset {
            Asset::Tokens(amount) => amount,
            Asset::Item(_) => Amount::ZERO,
        }
    }
}
