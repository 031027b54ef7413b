//! Non-fungible item registry.
//!
//! [`ItemRegistry`] is the ownership store the marketplace uses to take
//! custody of listed items and hand them to buyers. Moves are authorized the
//! way operator approvals usually work: the owner itself, or an operator the
//! owner approved for all of its items.

use crate::address::Address;
use crate::error::{LedgerError, Result};
use crate::item::ItemId;
use crate::transfer::Transfer;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Ownership store for unique items.
///
/// A rejected move must leave ownership unchanged.
pub trait ItemRegistry: Send + Sync {
    /// Current owner of `item`.
    fn owner_of(&self, item: ItemId)
    -> impl std::future::Future<Output = Result<Address>> + Send;

    /// Whether `operator` may move every item owned by `owner`.
    fn is_approved_for_all(
        &self,
        owner: &Address,
        operator: &Address,
    ) -> impl std::future::Future<Output = bool> + Send;

    /// Grant or revoke `operator`'s approval over all of `owner`'s items.
    fn set_approval_for_all(
        &self,
        owner: &Address,
        operator: &Address,
        approved: bool,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Move `item` from `from` to `to`, initiated by `operator`.
    ///
    /// `from` must own the item, and `operator` must be `from` or approved
    /// by it.
    fn transfer_item(
        &self,
        operator: &Address,
        from: &Address,
        to: &Address,
        item: ItemId,
    ) -> impl std::future::Future<Output = Result<Transfer>> + Send;
}

#[derive(Debug, Default)]
struct RegistryState {
    owners: HashMap<ItemId, Address>,
    operators: HashSet<(Address, Address)>,
    transfers: Vec<Transfer>,
}

/// Simulated item registry.
///
/// Clones share the same ownership table.
#[derive(Clone, Default)]
pub struct InMemoryItemRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl InMemoryItemRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `item` owned by `owner`.
    ///
    /// # Errors
    ///
    /// Returns error if the item already exists.
    pub async fn mint(&self, owner: &Address, item: ItemId) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.owners.contains_key(&item) {
            return Err(LedgerError::AlreadyMinted { item });
        }
        state.owners.insert(item, owner.clone());

        info!(item = %item, owner = %owner, "item minted");
        Ok(())
    }

    /// Items currently owned by `owner`, in ascending order.
    pub async fn items_of(&self, owner: &Address) -> Vec<ItemId> {
        let state = self.state.lock().await;
        let mut items: Vec<ItemId> = state
            .owners
            .iter()
            .filter(|(_, o)| *o == owner)
            .map(|(item, _)| *item)
            .collect();
        items.sort_unstable();
        items
    }

    /// Every successful item move, oldest first.
    pub async fn transfers(&self) -> Vec<Transfer> {
        self.state.lock().await.transfers.clone()
    }
}

impl ItemRegistry for InMemoryItemRegistry {
    async fn owner_of(&self, item: ItemId) -> Result<Address> {
        self.state
            .lock()
            .await
            .owners
            .get(&item)
            .cloned()
            .ok_or(LedgerError::UnknownItem { item })
    }

    async fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> bool {
        self.state
            .lock()
            .await
            .operators
            .contains(&(owner.clone(), operator.clone()))
    }

    async fn set_approval_for_all(
        &self,
        owner: &Address,
        operator: &Address,
        approved: bool,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        let key = (owner.clone(), operator.clone());
        if approved {
            state.operators.insert(key);
        } else {
            state.operators.remove(&key);
        }

        debug!(owner = %owner, operator = %operator, approved, "operator approval set");
        Ok(())
    }

    async fn transfer_item(
        &self,
        operator: &Address,
        from: &Address,
        to: &Address,
        item: ItemId,
    ) -> Result<Transfer> {
        let mut state = self.state.lock().await;

        let owner = state
            .owners
            .get(&item)
            .ok_or(LedgerError::UnknownItem { item })?;
        if owner != from {
            return Err(LedgerError::NotOwner {
                item,
                claimed: from.to_string(),
            });
        }
        if operator != from && !state.operators.contains(&(from.clone(), operator.clone())) {
            return Err(LedgerError::not_approved(from, operator));
        }

        state.owners.insert(item, to.clone());
        let tx = Transfer::item(from.clone(), to.clone(), item).via(operator.clone());
        state.transfers.push(tx.clone());

        debug!(item = %item, from = %from, to = %to, operator = %operator, "item transferred");
        Ok(tx)
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl std::fmt::Debug for InMemoryItemRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryItemRegistry").finish_non_exhaustive()
    }
}
