//! In-memory membership registry.
//!
//! [`MembershipTable`] holds the weight table, the accumulated total weight
//! and the current owner of every membership. It is initialized exactly once
//! from a list of `(owner, weight)` pairs; afterwards weights are immutable
//! and only ownership moves.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::constants::MAX_MEMBERSHIPS;
use crate::error::{RegistryError, SetupError, SplitError};
use crate::events::SplitEvent;
use crate::traits::MembershipRegistry;
use crate::types::{Address, MembershipId, TotalWeight, Weight};

/// A single weighted membership.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Membership {
    pub id: MembershipId,
    pub owner: Address,
    pub weight: Weight,
}

/// Weight table and ownership records for one instance.
///
/// Starts uninitialized; [`initialize`](Self::initialize) runs once.
#[derive(Clone, Debug, Default)]
pub struct MembershipTable {
    memberships: Vec<Membership>,
    /// Membership count per owner.
    holdings: HashMap<Address, u32>,
    /// Accumulated while memberships are created, never recomputed.
    total_weight: TotalWeight,
    initialized: bool,
    events: Vec<SplitEvent>,
}

impl MembershipTable {
    /// Create an uninitialized table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and initialize a table in one step.
    pub fn with_members(members: &[(Address, Weight)]) -> Result<Self, SplitError> {
        let mut table = Self::new();
        table.initialize(members)?;
        Ok(table)
    }

    /// Populate the weight table. Runs exactly once.
    ///
    /// # Errors
    ///
    /// - [`SetupError::AlreadyInitialized`] on a second call
    /// - [`SetupError::EmptyMembership`] if `members` is empty
    /// - [`SetupError::TooManyMemberships`] if `members.len() > MAX_MEMBERSHIPS`
    /// - [`SetupError::ZeroTotalWeight`] if every weight is zero
    pub fn initialize(&mut self, members: &[(Address, Weight)]) -> Result<(), SplitError> {
        if self.initialized {
            return Err(SetupError::AlreadyInitialized.into());
        }
        if members.is_empty() {
            return Err(SetupError::EmptyMembership.into());
        }
        if members.len() > MAX_MEMBERSHIPS {
            return Err(SetupError::TooManyMemberships {
                count: members.len(),
                max: MAX_MEMBERSHIPS,
            }
            .into());
        }
        if members.iter().all(|(_, w)| *w == 0) {
            return Err(SetupError::ZeroTotalWeight.into());
        }

        for (index, (owner, weight)) in members.iter().enumerate() {
            // index < MAX_MEMBERSHIPS == u8::MAX, checked above
            let id = MembershipId(index as u8);
            self.memberships.push(Membership {
                id,
                owner: *owner,
                weight: *weight,
            });
            *self.holdings.entry(*owner).or_insert(0) += 1;
            self.total_weight += *weight as TotalWeight;
        }
        self.initialized = true;

        info!(
            members = self.memberships.len(),
            total_weight = self.total_weight,
            "registry: initialized"
        );
        self.events.push(SplitEvent::Initialized {
            members: self.memberships.len(),
            total_weight: self.total_weight,
        });
        Ok(())
    }

    /// Whether [`initialize`](Self::initialize) has completed.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Look up a membership record.
    pub fn get(&self, id: MembershipId) -> Result<&Membership, SplitError> {
        self.ensure_initialized()?;
        self.memberships
            .get(id.index())
            .ok_or_else(|| RegistryError::UnknownMembership(id).into())
    }

    /// All memberships in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Membership> {
        self.memberships.iter()
    }

    /// Weights in id order.
    pub fn weights(&self) -> Vec<Weight> {
        self.memberships.iter().map(|m| m.weight).collect()
    }

    /// Drain registry events (initialization, ownership transfers).
    pub fn drain_events(&mut self) -> Vec<SplitEvent> {
        std::mem::take(&mut self.events)
    }

    fn ensure_initialized(&self) -> Result<(), SetupError> {
        if !self.initialized {
            return Err(SetupError::NotInitialized);
        }
        Ok(())
    }
}

impl MembershipRegistry for MembershipTable {
    fn owner_of(&self, id: MembershipId) -> Result<Address, SplitError> {
        Ok(self.get(id)?.owner)
    }

    fn balance_of(&self, owner: &Address) -> u32 {
        *self.holdings.get(owner).unwrap_or(&0)
    }

    fn weight_of(&self, id: MembershipId) -> Result<Weight, SplitError> {
        Ok(self.get(id)?.weight)
    }

    fn total_weight(&self) -> Result<TotalWeight, SplitError> {
        self.ensure_initialized()?;
        Ok(self.total_weight)
    }

    fn member_count(&self) -> usize {
        self.memberships.len()
    }

    fn transfer_ownership(&mut self, id: MembershipId, from: &Address, to: &Address) -> Result<(), SplitError> {
        self.ensure_initialized()?;
        let membership = self
            .memberships
            .get_mut(id.index())
            .ok_or(RegistryError::UnknownMembership(id))?;
        if membership.owner != *from {
            return Err(RegistryError::NotCurrentOwner { id, from: *from }.into());
        }
        if from == to {
            debug!(%id, owner = %from, "registry: ownership transfer to self");
            return Ok(());
        }

        membership.owner = *to;
        if let Some(count) = self.holdings.get_mut(from) {
            *count -= 1;
            if *count == 0 {
                self.holdings.remove(from);
            }
        }
        *self.holdings.entry(*to).or_insert(0) += 1;

        info!(%id, %from, %to, "registry: ownership transferred");
        self.events.push(SplitEvent::OwnershipTransferred {
            id,
            from: *from,
            to: *to,
        });
        Ok(())
    }

    fn ids_owned_by(&self, owner: &Address) -> Vec<MembershipId> {
        self.memberships
            .iter()
            .filter(|m| m.owner == *owner)
            .map(|m| m.id)
            .collect()
    }
}
