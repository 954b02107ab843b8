//! Thread-safe handle around a distribution instance.
//!
//! Every mutating operation runs under the write lock for its whole
//! duration, so concurrent callers observe operations one at a time.

use std::sync::Arc;

use parking_lot::RwLock;

use splitter_core::error::SplitError;
use splitter_core::events::SplitEvent;
use splitter_core::types::{Address, Amount, MembershipId, Payout};

use crate::strategy::Distribution;

/// Cloneable shared handle. Clones refer to the same instance.
pub struct SharedSplitter<D> {
    inner: Arc<RwLock<D>>,
}

impl<D> Clone for SharedSplitter<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: Distribution> SharedSplitter<D> {
    pub fn new(distribution: D) -> Self {
        Self {
            inner: Arc::new(RwLock::new(distribution)),
        }
    }

    /// Run `f` with shared access.
    pub fn read<T>(&self, f: impl FnOnce(&D) -> T) -> T {
        f(&self.inner.read())
    }

    /// Run `f` with exclusive access.
    pub fn with<T>(&self, f: impl FnOnce(&mut D) -> T) -> T {
        f(&mut self.inner.write())
    }

    pub fn pending(&self, id: MembershipId) -> Result<Amount, SplitError> {
        self.inner.read().pending(id)
    }

    pub fn simulate_split(&self, value: Amount) -> Result<Vec<Payout>, SplitError> {
        self.inner.read().simulate_split(value)
    }

    pub fn settle(&self, caller: &Address) -> Result<Vec<Payout>, SplitError> {
        self.inner.write().settle(caller)
    }

    /// Take the events recorded since the last drain, across all clones.
    ///
    /// The journal is unbounded; long-lived handles should drain it
    /// periodically.
    pub fn drain_events(&self) -> Vec<SplitEvent> {
        self.inner.write().drain_events()
    }
}
