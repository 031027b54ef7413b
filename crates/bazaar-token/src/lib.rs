//! # bazaar-token
//!
//! Asset primitives and external-ledger capabilities for the bazaar
//! marketplace.
//!
//! This crate provides:
//! - [`Address`], [`Amount`] and [`ItemId`] value types
//! - [`PaymentLedger`]: balances, allowances and transfers of a fungible
//!   payment token
//! - [`ItemRegistry`]: ownership and operator approval for unique items
//! - In-memory implementations of both, with a transfer journal
//!
//! ## Example
//!
//! ```rust
//! use bazaar_token::{Address, Amount, InMemoryPaymentLedger, PaymentLedger};
//!
//! # async fn example() -> bazaar_token::Result<()> {
//! let ledger = InMemoryPaymentLedger::new();
//! let alice = Address::generate();
//! let bob = Address::generate();
//!
//! ledger.mint(&alice, Amount::new(1_000)).await?;
//! ledger.transfer(&alice, &bob, Amount::new(250)).await?;
//!
//! assert_eq!(ledger.balance_of(&bob).await?, Amount::new(250));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod amount;
pub mod error;
pub mod item;
pub mod payment;
pub mod registry;
pub mod transfer;

pub use address::Address;
pub use amount::Amount;
pub use error::{LedgerError, Result};
pub use item::ItemId;
pub use payment::{InMemoryPaymentLedger, PaymentLedger};
pub use registry::{InMemoryItemRegistry, ItemRegistry};
pub use transfer::{Asset, Transfer, TransferId};
