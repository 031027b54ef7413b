//! Per-vendor catalogs of quantity-priced products.
//!
//! Each vendor owns a dense, append-only list of [`VendorProduct`]s. A
//! listing is never removed: cancelling zeroes its supply and leaves the
//! `sold` counter as a record of past sales.

use std::collections::BTreeMap;

use bazaar_token::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// A quantity-priced listing.
///
/// `price` is fixed at creation, `sold` only grows, and `supply` only
/// shrinks (one unit per sale, or all at once on cancellation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorProduct {
    price: Amount,
    supply: u64,
    sold: u64,
}

impl VendorProduct {
    fn new(price: Amount, supply: u64) -> Self {
        Self {
            price,
            supply,
            sold: 0,
        }
    }

    /// Price of one unit.
    #[must_use]
    pub const fn price(&self) -> Amount {
        self.price
    }

    /// Units still available.
    #[must_use]
    pub const fn supply(&self) -> u64 {
        self.supply
    }

    /// Units sold so far.
    #[must_use]
    pub const fn sold(&self) -> u64 {
        self.sold
    }

    /// Whether at least one unit can be bought.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.supply > 0
    }

    /// Move one unit from supply to sold.
    ///
    /// Callers check [`is_available`](Self::is_available) first; on an
    /// empty listing this is a no-op.
    pub(crate) fn sell_one(&mut self) {
        if self.supply > 0 {
            self.supply -= 1;
            self.sold += 1;
        }
    }

    fn cancel(&mut self) -> u64 {
        std::mem::take(&mut self.supply)
    }
}

/// All vendors' product listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCatalog {
    products: BTreeMap<Address, Vec<VendorProduct>>,
}

impl ProductCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listing for `vendor` and return its index.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidListing`] if price or supply is zero.
    pub fn list(
        &mut self,
        vendor: &Address,
        price: Amount,
        supply: u64,
    ) -> Result<usize, MarketError> {
        if price.is_zero() {
            return Err(MarketError::InvalidListing(
                "price must be greater than 0".to_string(),
            ));
        }
        if supply == 0 {
            return Err(MarketError::InvalidListing(
                "supply must be greater than 0".to_string(),
            ));
        }

        let listings = self.products.entry(vendor.clone()).or_default();
        listings.push(VendorProduct::new(price, supply));
        Ok(listings.len() - 1)
    }

    /// Zero the supply of a listing, returning the supply it had.
    ///
    /// Cancelling an empty listing succeeds and returns 0.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the vendor has no such listing.
    pub fn cancel(&mut self, vendor: &Address, index: usize) -> Result<u64, MarketError> {
        Ok(self.product_mut(vendor, index)?.cancel())
    }

    /// Look up a listing.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the vendor has no such listing.
    pub fn product(&self, vendor: &Address, index: usize) -> Result<&VendorProduct, MarketError> {
        self.products
            .get(vendor)
            .and_then(|listings| listings.get(index))
            .ok_or_else(|| not_found(vendor, index))
    }

    /// Look up a listing that can be bought right now.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] for an unknown listing and
    /// [`MarketError::SoldOut`] when its supply is zero.
    pub fn available_mut(
        &mut self,
        vendor: &Address,
        index: usize,
    ) -> Result<&mut VendorProduct, MarketError> {
        let product = self.product_mut(vendor, index)?;
        if !product.is_available() {
            return Err(MarketError::SoldOut {
                vendor: vendor.clone(),
                index,
            });
        }
        Ok(product)
    }

    /// Number of listings `vendor` has ever created.
    #[must_use]
    pub fn product_count(&self, vendor: &Address) -> usize {
        self.products.get(vendor).map_or(0, Vec::len)
    }

    /// All listings of `vendor`, in index order.
    #[must_use]
    pub fn products(&self, vendor: &Address) -> &[VendorProduct] {
        self.products
            .get(vendor)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn product_mut(
        &mut self,
        vendor: &Address,
        index: usize,
    ) -> Result<&mut VendorProduct, MarketError> {
        self.products
            .get_mut(vendor)
            .and_then(|listings| listings.get_mut(index))
            .ok_or_else(|| not_found(vendor, index))
    }
}

fn not_found(vendor: &Address, index: usize) -> MarketError {
    MarketError::not_found(format!("product {index} of vendor {vendor}"))
}
