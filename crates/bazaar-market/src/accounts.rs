//! Registry of vendors and customers.
//!
//! Every address that lists gets a [`VendorId`] and every address that buys
//! gets a [`CustomerId`], in order of first appearance. Ordinals are dense,
//! never reassigned and never reused.

use std::collections::HashMap;
use std::fmt;

use bazaar_token::Address;
use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// Ordinal of a vendor in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VendorId(pub usize);

/// Ordinal of a customer in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CustomerId(pub usize);

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vendor-{}", self.0)
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "customer-{}", self.0)
    }
}

/// Append-only list of addresses with a reverse index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Address>", into = "Vec<Address>")]
struct Roster {
    members: Vec<Address>,
    ordinals: HashMap<Address, usize>,
}

impl Roster {
    /// Returns the ordinal of `address` and whether it was newly assigned.
    fn enroll(&mut self, address: &Address) -> (usize, bool) {
        if let Some(&ordinal) = self.ordinals.get(address) {
            return (ordinal, false);
        }
        let ordinal = self.members.len();
        self.members.push(address.clone());
        self.ordinals.insert(address.clone(), ordinal);
        (ordinal, true)
    }

    fn ordinal(&self, address: &Address) -> Option<usize> {
        self.ordinals.get(address).copied()
    }

    fn get(&self, ordinal: usize) -> Option<&Address> {
        self.members.get(ordinal)
    }

    fn len(&self) -> usize {
        self.members.len()
    }
}

impl TryFrom<Vec<Address>> for Roster {
    type Error = MarketError;

    fn try_from(members: Vec<Address>) -> Result<Self, Self::Error> {
        let mut roster = Self::default();
        for address in &members {
            if !roster.enroll(address).1 {
                return Err(MarketError::Config(format!(
                    "address {address} appears twice in roster"
                )));
            }
        }
        Ok(roster)
    }
}

impl From<Roster> for Vec<Address> {
    fn from(roster: Roster) -> Self {
        roster.members
    }
}

/// Vendors and customers known to the marketplace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountRegistry {
    vendors: Roster,
    customers: Roster,
}

impl AccountRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `address` as a vendor, returning its ordinal and whether it
    /// is new.
    pub fn register_vendor(&mut self, address: &Address) -> (VendorId, bool) {
        let (ordinal, new) = self.vendors.enroll(address);
        (VendorId(ordinal), new)
    }

    /// Register `address` as a customer, returning its ordinal and whether
    /// it is new.
    pub fn register_customer(&mut self, address: &Address) -> (CustomerId, bool) {
        let (ordinal, new) = self.customers.enroll(address);
        (CustomerId(ordinal), new)
    }

    /// Number of distinct vendors.
    #[must_use]
    pub fn vendor_count(&self) -> usize {
        self.vendors.len()
    }

    /// Number of distinct customers.
    #[must_use]
    pub fn customer_count(&self) -> usize {
        self.customers.len()
    }

    /// Ordinal of a vendor address.
    #[must_use]
    pub fn vendor_id(&self, address: &Address) -> Option<VendorId> {
        self.vendors.ordinal(address).map(VendorId)
    }

    /// Ordinal of a customer address.
    #[must_use]
    pub fn customer_id(&self, address: &Address) -> Option<CustomerId> {
        self.customers.ordinal(address).map(CustomerId)
    }

    /// Address of the vendor with the given ordinal.
    #[must_use]
    pub fn vendor(&self, id: VendorId) -> Option<&Address> {
        self.vendors.get(id.0)
    }

    /// Address of the customer with the given ordinal.
    #[must_use]
    pub fn customer(&self, id: CustomerId) -> Option<&Address> {
        self.customers.get(id.0)
    }

    /// All vendors in registration order.
    pub fn vendors(&self) -> impl Iterator<Item = &Address> {
        self.vendors.members.iter()
    }

    /// All customers in registration order.
    pub fn customers(&self) -> impl Iterator<Item = &Address> {
        self.customers.members.iter()
    }
}
