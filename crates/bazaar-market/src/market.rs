//! The marketplace: listing, cancellation, custody and queries.
//!
//! All state lives behind one async mutex. Every mutating operation holds
//! it from its first check to its last write, including while it waits on
//! the payment ledger or item registry, so operations are applied one at a
//! time in a single total order and no caller can observe a half-applied
//! operation. Purchases live in [`crate::settlement`], the token sweep in
//! [`crate::recovery`].

use bazaar_token::{Address, Amount, ItemId, ItemRegistry, PaymentLedger};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::accounts::{CustomerId, VendorId};
use crate::catalog::VendorProduct;
use crate::config::MarketConfig;
use crate::error::MarketError;
use crate::escrow::EscrowedItem;
use crate::ledger::PurchaseRecord;
use crate::snapshot::{MarketSnapshot, MarketState};

/// A fixed-price marketplace settling in one payment token.
///
/// `P` is the payment token's ledger and `R` the registry of unique items.
pub struct Marketplace<P, R> {
    pub(crate) config: MarketConfig,
    pub(crate) payments: P,
    pub(crate) items: R,
    pub(crate) state: Mutex<MarketState>,
}

impl<P: PaymentLedger, R: ItemRegistry> Marketplace<P, R> {
    /// Create an empty marketplace.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Config`] if the configuration is invalid.
    pub fn new(config: MarketConfig, payments: P, items: R) -> Result<Self, MarketError> {
        config.validate()?;

        info!(
            market = %config.name,
            account = %config.market_account,
            currency = %payments.token(),
            "marketplace opened"
        );

        Ok(Self {
            config,
            payments,
            items,
            state: Mutex::new(MarketState::default()),
        })
    }

    /// Rebuild a marketplace from a snapshot.
    ///
    /// Every escrowed item must still be owned by the holding account.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::Config`] if the configuration is invalid or
    /// the registry disagrees with the snapshot's escrow.
    pub async fn restore(
        config: MarketConfig,
        payments: P,
        items: R,
        snapshot: MarketSnapshot,
    ) -> Result<Self, MarketError> {
        config.validate()?;

        for held in snapshot.state.escrow.items() {
            let owner = items.owner_of(held.item).await.map_err(|e| {
                MarketError::Config(format!("escrowed item {} unavailable: {e}", held.item))
            })?;
            if owner != config.market_account {
                return Err(MarketError::Config(format!(
                    "escrowed item {} is owned by {owner}, not the market account",
                    held.item
                )));
            }
        }

        info!(
            market = %config.name,
            from = %snapshot.market,
            taken_at = %snapshot.taken_at,
            vendors = snapshot.state.accounts.vendor_count(),
            customers = snapshot.state.accounts.customer_count(),
            "marketplace restored"
        );

        Ok(Self {
            config,
            payments,
            items,
            state: Mutex::new(snapshot.state),
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// The payment ledger.
    #[must_use]
    pub fn payments(&self) -> &P {
        &self.payments
    }

    /// The item registry.
    #[must_use]
    pub fn items(&self) -> &R {
        &self.items
    }

    /// Address of the payment token prices are quoted in.
    #[must_use]
    pub fn currency(&self) -> &Address {
        self.payments.token()
    }

    // =========================================================================
    // Quantity-priced listings
    // =========================================================================

    /// List `supply` units at `price` each and return the listing's index
    /// in the vendor's catalog.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidListing`] if price or supply is zero.
    pub async fn list_product(
        &self,
        vendor: &Address,
        price: Amount,
        supply: u64,
    ) -> Result<usize, MarketError> {
        let mut state = self.state.lock().await;

        let index = state.catalog.list(vendor, price, supply)?;
        let (vendor_id, new) = state.accounts.register_vendor(vendor);

        info!(
            vendor = %vendor,
            %vendor_id,
            new_vendor = new,
            index,
            price = %price,
            supply,
            "product listed"
        );
        Ok(index)
    }

    /// Stop selling a listing by zeroing its supply.
    ///
    /// Cancelling an already empty listing succeeds and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the vendor has no such listing.
    pub async fn cancel(&self, vendor: &Address, index: usize) -> Result<(), MarketError> {
        let mut state = self.state.lock().await;

        let withdrawn = state.catalog.cancel(vendor, index)?;

        info!(vendor = %vendor, index, withdrawn, "product cancelled");
        Ok(())
    }

    // =========================================================================
    // Custody listings
    // =========================================================================

    /// Take custody of `item` from `vendor` and list it at `price`.
    ///
    /// The vendor must have approved the market account as an operator in
    /// the item registry.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidListing`] for a zero price,
    /// [`MarketError::Custody`] if the item is already held, and
    /// [`MarketError::NotAuthorized`] if the registry refuses the move.
    pub async fn deposit(
        &self,
        vendor: &Address,
        item: ItemId,
        price: Amount,
    ) -> Result<(), MarketError> {
        let mut state = self.state.lock().await;
        let market = &self.config.market_account;

        state.escrow.check_deposit(item, price)?;

        self.items
            .transfer_item(market, vendor, market, item)
            .await
            .map_err(|e| {
                warn!(
                    vendor = %vendor,
                    item = %item,
                    error = %e,
                    "deposit refused by item registry"
                );
                MarketError::not_authorized(format!("cannot take custody of item {item}: {e}"))
            })?;

        state.escrow.hold(item, vendor, price)?;
        let (vendor_id, new) = state.accounts.register_vendor(vendor);

        info!(
            vendor = %vendor,
            %vendor_id,
            new_vendor = new,
            item = %item,
            price = %price,
            "item deposited"
        );
        Ok(())
    }

    /// Return an unsold item to the vendor that deposited it.
    ///
    /// If the market account no longer owns the item, the escrow entry is
    /// dropped without a transfer.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the item is not in escrow,
    /// [`MarketError::NotAuthorized`] if `vendor` did not deposit it, and
    /// [`MarketError::Custody`] if the registry refuses the move.
    pub async fn withdraw(&self, vendor: &Address, item: ItemId) -> Result<(), MarketError> {
        let mut state = self.state.lock().await;
        let market = &self.config.market_account;

        let listed = state.escrow.get(item)?;
        if listed.vendor != *vendor {
            warn!(vendor = %vendor, item = %item, "withdraw by non-depositor");
            return Err(MarketError::not_authorized(format!(
                "item {item} was not deposited by {vendor}"
            )));
        }

        let owner = self
            .items
            .owner_of(item)
            .await
            .map_err(|e| MarketError::Custody(format!("item {item}: {e}")))?;
        if owner != *market {
            // nothing left to return; drop the stale entry
            state.escrow.release(item)?;
            warn!(
                vendor = %vendor,
                item = %item,
                owner = %owner,
                "custody lost outside the marketplace, escrow entry dropped"
            );
            return Ok(());
        }

        self.items
            .transfer_item(market, market, vendor, item)
            .await
            .map_err(|e| MarketError::Custody(format!("cannot return item {item}: {e}")))?;

        state.escrow.release(item)?;

        info!(vendor = %vendor, item = %item, "item withdrawn");
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Number of distinct vendors.
    pub async fn vendor_count(&self) -> usize {
        self.state.lock().await.accounts.vendor_count()
    }

    /// Number of distinct customers.
    pub async fn customer_count(&self) -> usize {
        self.state.lock().await.accounts.customer_count()
    }

    /// Address of the vendor with the given ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] for an unassigned ordinal.
    pub async fn vendor_at(&self, id: VendorId) -> Result<Address, MarketError> {
        self.state
            .lock()
            .await
            .accounts
            .vendor(id)
            .cloned()
            .ok_or_else(|| MarketError::not_found(format!("{id}")))
    }

    /// Address of the customer with the given ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] for an unassigned ordinal.
    pub async fn customer_at(&self, id: CustomerId) -> Result<Address, MarketError> {
        self.state
            .lock()
            .await
            .accounts
            .customer(id)
            .cloned()
            .ok_or_else(|| MarketError::not_found(format!("{id}")))
    }

    /// Ordinal of a vendor address, if it has ever listed.
    pub async fn vendor_id(&self, vendor: &Address) -> Option<VendorId> {
        self.state.lock().await.accounts.vendor_id(vendor)
    }

    /// Ordinal of a customer address, if it has ever bought.
    pub async fn customer_id(&self, customer: &Address) -> Option<CustomerId> {
        self.state.lock().await.accounts.customer_id(customer)
    }

    /// Number of listings `vendor` has created.
    pub async fn product_count(&self, vendor: &Address) -> usize {
        self.state.lock().await.catalog.product_count(vendor)
    }

    /// A copy of one listing.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the vendor has no such listing.
    pub async fn product(
        &self,
        vendor: &Address,
        index: usize,
    ) -> Result<VendorProduct, MarketError> {
        self.state.lock().await.catalog.product(vendor, index).copied()
    }

    /// Whether a listing exists and has supply left.
    pub async fn is_available(&self, vendor: &Address, index: usize) -> bool {
        self.state
            .lock()
            .await
            .catalog
            .product(vendor, index)
            .is_ok_and(VendorProduct::is_available)
    }

    /// Number of purchases `customer` has made.
    pub async fn purchase_count(&self, customer: &Address) -> usize {
        self.state.lock().await.ledger.purchase_count(customer)
    }

    /// Total amount `customer` has paid across all purchases.
    pub async fn total_spent(&self, customer: &Address) -> Amount {
        self.state.lock().await.ledger.total_spent(customer)
    }

    /// A copy of one purchase record.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the customer has no such record.
    pub async fn purchase(
        &self,
        customer: &Address,
        index: usize,
    ) -> Result<PurchaseRecord, MarketError> {
        self.state
            .lock()
            .await
            .ledger
            .purchase(customer, index)
            .cloned()
    }

    /// The escrow entry for `item`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NotFound`] if the item is not in escrow.
    pub async fn listing(&self, item: ItemId) -> Result<EscrowedItem, MarketError> {
        let state = self.state.lock().await;
        let listed = state.escrow.get(item).cloned();
        if listed.is_err() {
            debug!(item = %item, "listing lookup missed");
        }
        listed
    }

    /// Items `vendor` currently has in escrow.
    pub async fn escrowed_items(&self, vendor: &Address) -> Vec<EscrowedItem> {
        self.state
            .lock()
            .await
            .escrow
            .items_of(vendor)
            .cloned()
            .collect()
    }

    /// Copy the whole marketplace state.
    pub async fn snapshot(&self) -> MarketSnapshot {
        let state = self.state.lock().await;
        MarketSnapshot {
            market: self.config.name.clone(),
            taken_at: Utc::now(),
            state: state.clone(),
        }
    }
}

impl<P, R> std::fmt::Debug for Marketplace<P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Marketplace")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
