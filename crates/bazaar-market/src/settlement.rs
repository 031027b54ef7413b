//! Atomic purchase settlement.
//!
//! A purchase either completes every step (payment, inventory update,
//! customer registration, purchase record, and for escrowed items the
//! delivery) or leaves the marketplace exactly as it was. Availability is
//! checked before any money moves, and local state is only written after
//! the payment ledger has accepted the transfer. An escrowed item's price
//! waits on the market account until delivery succeeds and is refunded if
//! it does not; the state lock keeps the sweep in [`crate::recovery`] from
//! touching it meanwhile.

use bazaar_token::{
    Address, Amount, ItemId, ItemRegistry, LedgerError, PaymentLedger, TransferId,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::accounts::CustomerId;
use crate::error::MarketError;
use crate::ledger::{PurchaseRecord, Purchased};
use crate::market::Marketplace;

/// Outcome of a settled purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    /// Registry ordinal of the buyer.
    pub customer_id: CustomerId,
    /// Index of the new record in the buyer's history.
    pub record_index: usize,
    /// The record that was written.
    pub record: PurchaseRecord,
    /// Payment transfer on the token ledger.
    pub payment: TransferId,
}

impl<P: PaymentLedger, R: ItemRegistry> Marketplace<P, R> {
    /// Buy one unit of `vendor`'s product at `index`.
    ///
    /// The customer must have granted the market account an allowance of at
    /// least the product's price.
    ///
    /// # Errors
    ///
    /// - [`MarketError::NotFound`] if the listing does not exist
    /// - [`MarketError::SoldOut`] if it has no supply left
    /// - [`MarketError::PaymentFailed`] if the payment ledger rejects the
    ///   transfer
    pub async fn buy(
        &self,
        customer: &Address,
        vendor: &Address,
        index: usize,
    ) -> Result<PurchaseReceipt, MarketError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let product = state.catalog.available_mut(vendor, index)?;
        let price = product.price();

        let payment = self
            .payments
            .transfer_from(&self.config.market_account, customer, vendor, price)
            .await
            .map_err(|e| payment_rejected(customer, price, e))?;

        product.sell_one();
        let remaining = product.supply();

        let (customer_id, _) = state.accounts.register_customer(customer);
        let record = PurchaseRecord::new(vendor.clone(), Purchased::Product(index), price);
        let record_index = state.ledger.record(customer, record.clone());

        info!(
            customer = %customer,
            %customer_id,
            vendor = %vendor,
            index,
            price = %price,
            remaining,
            transfer = %payment.id,
            "product sold"
        );

        Ok(PurchaseReceipt {
            customer_id,
            record_index,
            record,
            payment: payment.id,
        })
    }

    /// Buy the escrowed `item` from `vendor`.
    ///
    /// The price is first collected into the market account, then the item
    /// is delivered, then the vendor is paid. If delivery fails the customer
    /// is refunded and the item stays in escrow.
    ///
    /// # Errors
    ///
    /// - [`MarketError::NotFound`] if the item is not in escrow
    /// - [`MarketError::VendorMismatch`] if `vendor` did not deposit it
    /// - [`MarketError::Custody`] if the item cannot be delivered
    /// - [`MarketError::PaymentFailed`] if the payment ledger rejects the
    ///   collection or the vendor payout
    pub async fn buy_product(
        &self,
        customer: &Address,
        vendor: &Address,
        item: ItemId,
    ) -> Result<PurchaseReceipt, MarketError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let market = &self.config.market_account;

        let listed = state.escrow.get(item)?;
        if listed.vendor != *vendor {
            return Err(MarketError::VendorMismatch {
                item,
                listed: listed.vendor.clone(),
                supplied: vendor.clone(),
            });
        }
        let price = listed.price;

        let owner = self
            .items
            .owner_of(item)
            .await
            .map_err(|e| MarketError::Custody(format!("item {item}: {e}")))?;
        if owner != *market {
            return Err(MarketError::Custody(format!(
                "item {item} is owned by {owner}, not the market account"
            )));
        }

        // held on the market account until the item has reached the customer
        let collected = self
            .payments
            .transfer_from(market, customer, market, price)
            .await
            .map_err(|e| payment_rejected(customer, price, e))?;

        let delivery = match self.items.transfer_item(market, market, customer, item).await {
            Ok(delivery) => delivery,
            Err(e) => return Err(self.refund(customer, item, price, &e.to_string()).await),
        };

        let payout = self
            .payments
            .transfer(market, vendor, price)
            .await
            .map_err(|e| {
                error!(
                    vendor = %vendor,
                    item = %item,
                    price = %price,
                    collected = %collected.id,
                    error = %e,
                    "vendor payout failed after delivery"
                );
                MarketError::PaymentFailed(e)
            })?;

        state.escrow.release(item)?;
        let (customer_id, _) = state.accounts.register_customer(customer);
        let record = PurchaseRecord::new(vendor.clone(), Purchased::Item(item), price);
        let record_index = state.ledger.record(customer, record.clone());

        info!(
            customer = %customer,
            %customer_id,
            vendor = %vendor,
            item = %item,
            price = %price,
            collected = %collected.id,
            transfer = %payout.id,
            delivery = %delivery.id,
            "item sold"
        );

        Ok(PurchaseReceipt {
            customer_id,
            record_index,
            record,
            payment: payout.id,
        })
    }

    /// Return a collected price after a failed delivery.
    async fn refund(
        &self,
        customer: &Address,
        item: ItemId,
        price: Amount,
        cause: &str,
    ) -> MarketError {
        let market = &self.config.market_account;
        match self.payments.transfer(market, customer, price).await {
            Ok(refund) => {
                warn!(
                    customer = %customer,
                    item = %item,
                    price = %price,
                    refund = %refund.id,
                    error = cause,
                    "delivery failed, customer refunded"
                );
                MarketError::Custody(format!("cannot deliver item {item}: {cause}"))
            }
            Err(e) => {
                error!(
                    customer = %customer,
                    item = %item,
                    price = %price,
                    error = %e,
                    "delivery failed and refund was rejected"
                );
                MarketError::Custody(format!(
                    "cannot deliver item {item}: {cause}; refund of {price} failed: {e}"
                ))
            }
        }
    }
}

fn payment_rejected(customer: &Address, price: Amount, e: LedgerError) -> MarketError {
    if e.is_funding_failure() {
        warn!(customer = %customer, price = %price, error = %e, "payment rejected");
    } else {
        error!(
            customer = %customer,
            price = %price,
            error = %e,
            "payment ledger refused transfer"
        );
    }
    MarketError::PaymentFailed(e)
}
