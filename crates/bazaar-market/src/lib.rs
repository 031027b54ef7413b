//! # bazaar-market
//!
//! Fixed-price marketplace settling purchases in a fungible payment token.
//!
//! This crate provides:
//!
//! - Quantity-priced product listings per vendor, with cancellation
//! - Custody escrow for unique items between deposit and sale
//! - Atomic settlement: payment, inventory and purchase record in one step
//! - Vendor and customer registries with stable ordinals
//! - An operator sweep for tokens sent straight to the market account
//! - JSON configuration and state snapshots
//!
//! The payment token and item registry are reached through the
//! [`PaymentLedger`](bazaar_token::PaymentLedger) and
//! [`ItemRegistry`](bazaar_token::ItemRegistry) traits.
//!
//! ## Example
//!
//! ```rust
//! use bazaar_market::{MarketConfig, Marketplace};
//! use bazaar_token::{Address, Amount, InMemoryItemRegistry, InMemoryPaymentLedger, PaymentLedger};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MarketConfig::new(Address::generate(), Address::generate());
//! let payments = InMemoryPaymentLedger::new();
//! let market = Marketplace::new(config, payments, InMemoryItemRegistry::new())?;
//!
//! let vendor = Address::generate();
//! let customer = Address::generate();
//! market.payments().mint(&customer, Amount::new(1_000)).await?;
//! market
//!     .payments()
//!     .approve(&customer, &market.config().market_account, Amount::new(1_000))
//!     .await?;
//!
//! let index = market.list_product(&vendor, Amount::new(400), 2).await?;
//! let receipt = market.buy(&customer, &vendor, index).await?;
//!
//! assert_eq!(receipt.record_index, 0);
//! assert_eq!(market.product(&vendor, index).await?.supply(), 1);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod accounts;
pub mod catalog;
pub mod config;
pub mod error;
pub mod escrow;
pub mod ledger;
pub mod market;
pub mod recovery;
pub mod settlement;
pub mod snapshot;

pub use accounts::{AccountRegistry, CustomerId, VendorId};
pub use catalog::{ProductCatalog, VendorProduct};
pub use config::MarketConfig;
pub use error::MarketError;
pub use escrow::{CustodyEscrow, EscrowedItem};
pub use ledger::{PurchaseLedger, PurchaseRecord, Purchased};
pub use market::Marketplace;
pub use settlement::PurchaseReceipt;
pub use snapshot::{MarketSnapshot, MarketState};
