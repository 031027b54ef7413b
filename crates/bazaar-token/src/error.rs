//! Error types for payment-ledger and item-registry operations.

use thiserror::Error;

use crate::amount::Amount;
use crate::item::ItemId;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors reported by a payment ledger or an item registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Invalid address format.
    #[error("invalid address: {message}")]
    InvalidAddress {
        /// Description of the address error.
        message: String,
    },

    /// The payer does not hold enough tokens.
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance {
        /// Current balance.
        have: Amount,
        /// Required balance.
        need: Amount,
    },

    /// The spender has not been approved for enough tokens.
    #[error("insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance {
        /// Remaining allowance.
        have: Amount,
        /// Required allowance.
        need: Amount,
    },

    /// The item registry has never minted this item.
    #[error("unknown item: {item}")]
    UnknownItem {
        /// Item identifier.
        item: ItemId,
    },

    /// The `from` side of an item transfer does not own the item.
    #[error("{claimed} does not own item {item}")]
    NotOwner {
        /// Item identifier.
        item: ItemId,
        /// The address that claimed ownership.
        claimed: String,
    },

    /// The operator is neither the owner nor approved by the owner.
    #[error("{operator} is not approved to move items of {owner}")]
    NotApproved {
        /// Owner of the item.
        owner: String,
        /// Operator that attempted the move.
        operator: String,
    },

    /// The item already exists in the registry.
    #[error("item already minted: {item}")]
    AlreadyMinted {
        /// Item identifier.
        item: ItemId,
    },

    /// Invalid amount.
    #[error("invalid amount: {message}")]
    InvalidAmount {
        /// Description of the amount error.
        message: String,
    },
}

impl LedgerError {
    /// Create an invalid address error.
    #[must_use]
    pub fn invalid_address(message: impl Into<String>) -> Self {
        Self::InvalidAddress {
            message: message.into(),
        }
    }

    /// Create an insufficient balance error.
    #[must_use]
    pub const fn insufficient_balance(have: Amount, need: Amount) -> Self {
        Self::InsufficientBalance { have, need }
    }

    /// Create an insufficient allowance error.
    #[must_use]
    pub const fn insufficient_allowance(have: Amount, need: Amount) -> Self {
        Self::InsufficientAllowance { have, need }
    }

    /// Create a not-approved error.
    #[must_use]
    pub fn not_approved(owner: impl ToString, operator: impl ToString) -> Self {
        Self::NotApproved {
            owner: owner.to_string(),
            operator: operator.to_string(),
        }
    }

    /// Returns true if the ledger refused the operation for lack of funds
    /// or allowance, as opposed to a malformed request.
    #[must_use]
    pub const fn is_funding_failure(&self) -> bool {
        matches!(
            self,
            Self::InsufficientBalance { .. } | Self::InsufficientAllowance { .. }
        )
    }
}
