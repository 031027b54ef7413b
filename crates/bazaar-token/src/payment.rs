//! Fungible payment-token ledger.
//!
//! [`PaymentLedger`] is the capability the marketplace needs from a payment
//! token: balances, allowances, and transfers that either apply completely
//! or are rejected. [`InMemoryPaymentLedger`] is a simulated backend used in
//! development and tests.

use crate::address::Address;
use crate::amount::Amount;
use crate::error::{LedgerError, Result};
use crate::transfer::Transfer;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Balance store for a single fungible payment token.
///
/// Implementations must apply a successful transfer completely and leave
/// every balance and allowance untouched when they return an error.
pub trait PaymentLedger: Send + Sync {
    /// Address identifying this token.
    fn token(&self) -> &Address;

    /// Balance held by `owner`.
    fn balance_of(
        &self,
        owner: &Address,
    ) -> impl std::future::Future<Output = Result<Amount>> + Send;

    /// Remaining amount `spender` may move out of `owner`'s balance.
    fn allowance(
        &self,
        owner: &Address,
        spender: &Address,
    ) -> impl std::future::Future<Output = Result<Amount>> + Send;

    /// Set the amount `spender` may move out of `owner`'s balance.
    fn approve(
        &self,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Move `amount` from `from` (the caller) to `to`.
    fn transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> impl std::future::Future<Output = Result<Transfer>> + Send;

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance previously granted by `from`.
    fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> impl std::future::Future<Output = Result<Transfer>> + Send;
}

#[derive(Debug, Default)]
struct LedgerState {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    transfers: Vec<Transfer>,
}

impl LedgerState {
    fn balance(&self, owner: &Address) -> Amount {
        self.balances.get(owner).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Moves tokens after every check has passed.
    fn apply(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        let have = self.balance(from);
        let remaining = have
            .checked_sub(amount)
            .ok_or(LedgerError::insufficient_balance(have, amount))?;
        if from == to {
            return Ok(());
        }
        let credited = self
            .balance(to)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::InvalidAmount {
                message: format!("balance of {to} would overflow"),
            })?;
        self.balances.insert(from.clone(), remaining);
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}

/// Simulated payment-token ledger.
///
/// Clones share the same balances, so a test can keep a handle while the
/// marketplace owns another.
#[derive(Clone)]
pub struct InMemoryPaymentLedger {
    token: Address,
    state: Arc<Mutex<LedgerState>>,
}

impl InMemoryPaymentLedger {
    /// Create an empty ledger for a freshly generated token address.
    #[must_use]
    pub fn new() -> Self {
        Self::with_token(Address::generate())
    }

    /// Create an empty ledger for the given token address.
    #[must_use]
    pub fn with_token(token: Address) -> Self {
        Self {
            token,
            state: Arc::new(Mutex::new(LedgerState::default())),
        }
    }

    /// Credit newly issued tokens to `to`.
    ///
    /// # Errors
    ///
    /// Returns error if the balance would overflow.
    pub async fn mint(&self, to: &Address, amount: Amount) -> Result<()> {
        let mut state = self.state.lock().await;
        let credited =
            state
                .balance(to)
                .checked_add(amount)
                .ok_or_else(|| LedgerError::InvalidAmount {
                    message: format!("balance of {to} would overflow"),
                })?;
        state.balances.insert(to.clone(), credited);

        info!(
            token = %self.token,
            to = %to,
            amount = %amount,
            "tokens minted"
        );
        Ok(())
    }

    /// Every successful transfer, oldest first.
    pub async fn transfers(&self) -> Vec<Transfer> {
        self.state.lock().await.transfers.clone()
    }

    /// Number of successful transfers so far.
    pub async fn transfer_count(&self) -> usize {
        self.state.lock().await.transfers.len()
    }

    /// Sum of every balance in the ledger.
    pub async fn total_supply(&self) -> Amount {
        self.state.lock().await.balances.values().copied().sum()
    }
}

impl Default for InMemoryPaymentLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentLedger for InMemoryPaymentLedger {
    fn token(&self) -> &Address {
        &self.token
    }

    async fn balance_of(&self, owner: &Address) -> Result<Amount> {
        Ok(self.state.lock().await.balance(owner))
    }

    async fn allowance(&self, owner: &Address, spender: &Address) -> Result<Amount> {
        Ok(self.state.lock().await.allowance(owner, spender))
    }

    async fn approve(&self, owner: &Address, spender: &Address, amount: Amount) -> Result<()> {
        let mut state = self.state.lock().await;
        state
            .allowances
            .insert((owner.clone(), spender.clone()), amount);

        debug!(
            owner = %owner,
            spender = %spender,
            amount = %amount,
            "allowance set"
        );
        Ok(())
    }

    async fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<Transfer> {
        let mut state = self.state.lock().await;
        state.apply(from, to, amount)?;

        let tx = Transfer::tokens(from.clone(), to.clone(), amount);
        state.transfers.push(tx.clone());

        debug!(
            from = %from,
            to = %to,
            amount = %amount,
            "transfer completed"
        );
        Ok(tx)
    }

    async fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<Transfer> {
        let mut state = self.state.lock().await;

        let allowed = state.allowance(from, spender);
        if allowed < amount {
            return Err(LedgerError::insufficient_allowance(allowed, amount));
        }
        state.apply(from, to, amount)?;

        // An allowance of Amount::MAX is treated as unlimited.
        if allowed != Amount::MAX {
            state
                .allowances
                .insert((from.clone(), spender.clone()), allowed.saturating_sub(amount));
        }

        let tx = Transfer::tokens(from.clone(), to.clone(), amount).via(spender.clone());
        state.transfers.push(tx.clone());

        debug!(
            spender = %spender,
            from = %from,
            to = %to,
            amount = %amount,
            "delegated transfer completed"
        );
        Ok(tx)
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl std::fmt::Debug for InMemoryPaymentLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryPaymentLedger")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}
