//! Per-customer purchase histories.

use std::collections::BTreeMap;
use std::fmt;

use bazaar_token::{Address, Amount, ItemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// What a purchase bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purchased {
    /// One unit of the vendor's product at this catalog index.
    Product(usize),
    /// A unique item released from escrow.
    Item(ItemId),
}

impl fmt::Display for Purchased {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Product(index) => write!(f, "product {index}"),
            Self::Item(item) => write!(f, "item {item}"),
        }
    }
}

/// One settled purchase. Never modified once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Vendor that was paid.
    pub vendor: Address,
    /// Product index or item bought.
    pub purchased: Purchased,
    /// Amount paid to the vendor.
    pub price: Amount,
    /// When settlement completed.
    pub purchased_at: DateTime<Utc>,
}

impl PurchaseRecord {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn new(vendor: Address, purchased: Purchased, price: Amount) -> Self {
        Self {
            vendor,
            purchased,
            price,
            purchased_at: Utc::now(),
        }
    }
}

/// All customers' purchase records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PurchaseLedger {
    records: BTreeMap<Address, Vec<PurchaseRecord>>,
}

impl PurchaseLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to `customer`'s history and return its index.
    ///
    /// Only settlement calls this, after the payment has gone through.
    pub(crate) fn record(&mut self, customer: &Address, record: PurchaseRecord) -> usize {
        let history = self.records.entry(customer.clone()).or_default();
        history.push(record);
        history.len() - 1
    }

    /// Look up one purchase.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the customer has no such record.
    pub fn purchase(
        &self,
        customer: &Address,
        index: usize,
    ) -> Result<&PurchaseRecord, MarketError> {
        self.records
            .get(customer)
            .and_then(|history| history.get(index))
            .ok_or_else(|| {
                MarketError::not_found(format!("purchase {index} of customer {customer}"))
            })
    }

    /// Number of purchases `customer` has made.
    #[must_use]
    pub fn purchase_count(&self, customer: &Address) -> usize {
        self.records.get(customer).map_or(0, Vec::len)
    }

    /// All purchases of `customer`, oldest first.
    #[must_use]
    pub fn purchases(&self, customer: &Address) -> &[PurchaseRecord] {
        self.records
            .get(customer)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Total amount `customer` has paid across all purchases.
    #[must_use]
    pub fn total_spent(&self, customer: &Address) -> Amount {
        self.purchases(customer).iter().map(|r| r.price).sum()
    }
}
