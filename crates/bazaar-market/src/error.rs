//! Error types for bazaar-market.

use bazaar_token::{Address, ItemId, LedgerError};
use thiserror::Error;

/// Errors that can occur in marketplace operations.
///
/// A mutating operation that returns any of these has changed nothing.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Unknown vendor, customer, product, purchase or escrowed item.
    #[error("not found: {0}")]
    NotFound(String),

    /// The listing has no remaining supply (sold out or cancelled).
    #[error("product {index} of vendor {vendor} is sold out")]
    SoldOut {
        /// Vendor that owns the listing.
        vendor: Address,
        /// Index of the listing in the vendor's catalog.
        index: usize,
    },

    /// The vendor named by the buyer is not the vendor holding the item.
    #[error("item {item} is listed by {listed}, not {supplied}")]
    VendorMismatch {
        /// The escrowed item.
        item: ItemId,
        /// Vendor recorded in escrow.
        listed: Address,
        /// Vendor supplied by the caller.
        supplied: Address,
    },

    /// The payment ledger rejected the transfer.
    #[error("payment failed: {0}")]
    PaymentFailed(#[source] LedgerError),

    /// The caller may not perform this operation.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// Listing parameters are out of range.
    #[error("invalid listing: {0}")]
    InvalidListing(String),

    /// The item registry refused a custody move the marketplace is entitled
    /// to make.
    #[error("custody error: {0}")]
    Custody(String),

    /// Invalid configuration or snapshot.
    #[error("configuration error: {0}")]
    Config(String),
}

impl MarketError {
    /// Create a not-found error.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a not-authorized error.
    #[must_use]
    pub fn not_authorized(why: impl Into<String>) -> Self {
        Self::NotAuthorized(why.into())
    }

    /// Short machine-readable name of the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::SoldOut { .. } => "sold_out",
            Self::VendorMismatch { .. } => "mismatch",
            Self::PaymentFailed(_) => "payment_failed",
            Self::NotAuthorized(_) => "not_authorized",
            Self::InvalidListing(_) => "invalid_listing",
            Self::Custody(_) => "custody",
            Self::Config(_) => "config",
        }
    }
}
