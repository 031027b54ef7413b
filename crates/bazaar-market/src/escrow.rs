//! Custody escrow for unique items.
//!
//! While an item is listed the marketplace holding account owns it in the
//! item registry, and this table remembers which vendor deposited it and at
//! what price. An item is either held here (available) or absent (sold,
//! withdrawn, or never listed); there is no supply counter.

use std::collections::BTreeMap;

use bazaar_token::{Address, Amount, ItemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// An item held by the marketplace on a vendor's behalf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowedItem {
    /// The item in custody.
    pub item: ItemId,
    /// Vendor that deposited the item and receives the payment.
    pub vendor: Address,
    /// Sale price.
    pub price: Amount,
    /// When custody began.
    pub deposited_at: DateTime<Utc>,
}

/// Items currently in custody, keyed by item identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustodyEscrow {
    held: BTreeMap<ItemId, EscrowedItem>,
}

impl CustodyEscrow {
    /// Create an empty escrow.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `item` can be accepted at `price` without recording it.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidListing`] for a zero price and
    /// [`MarketError::Custody`] if the item is already held.
    pub fn check_deposit(&self, item: ItemId, price: Amount) -> Result<(), MarketError> {
        if price.is_zero() {
            return Err(MarketError::InvalidListing(
                "price must be greater than 0".to_string(),
            ));
        }
        if self.held.contains_key(&item) {
            return Err(MarketError::Custody(format!("item {item} is already in escrow")));
        }
        Ok(())
    }

    /// Record custody of `item` for `vendor`.
    ///
    /// # Errors
    ///
    /// Same as [`check_deposit`](Self::check_deposit).
    pub fn hold(
        &mut self,
        item: ItemId,
        vendor: &Address,
        price: Amount,
    ) -> Result<(), MarketError> {
        self.check_deposit(item, price)?;
        self.held.insert(
            item,
            EscrowedItem {
                item,
                vendor: vendor.clone(),
                price,
                deposited_at: Utc::now(),
            },
        );
        Ok(())
    }

    /// Look up a held item.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the item is not in custody.
    pub fn get(&self, item: ItemId) -> Result<&EscrowedItem, MarketError> {
        self.held
            .get(&item)
            .ok_or_else(|| MarketError::not_found(format!("item {item} is not in escrow")))
    }

    /// Drop the custody entry for `item` and return it.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the item is not in custody.
    pub fn release(&mut self, item: ItemId) -> Result<EscrowedItem, MarketError> {
        self.held
            .remove(&item)
            .ok_or_else(|| MarketError::not_found(format!("item {item} is not in escrow")))
    }

    /// Whether `item` is in custody.
    #[must_use]
    pub fn contains(&self, item: ItemId) -> bool {
        self.held.contains_key(&item)
    }

    /// Every held item, in item order.
    pub fn items(&self) -> impl Iterator<Item = &EscrowedItem> {
        self.held.values()
    }

    /// Items deposited by `vendor`, in item order.
    pub fn items_of<'a>(&'a self, vendor: &'a Address) -> impl Iterator<Item = &'a EscrowedItem> {
        self.held.values().filter(move |e| e.vendor == *vendor)
    }

    /// Number of items in custody.
    #[must_use]
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// Whether nothing is in custody.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}
