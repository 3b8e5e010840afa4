//! # In-Flight Set
//!
//! Hashes of blocks currently being parsed. The lock is held only to insert
//! or remove a hash, never across an await.

use parking_lot::Mutex;
use shared_types::Hash;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct InFlightSet {
    hashes: Mutex<HashSet<Hash>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `hash`. `None` when another parse holds it.
    pub fn try_claim(&self, hash: Hash) -> Option<InFlightGuard<'_>> {
        if self.hashes.lock().insert(hash) {
            Some(InFlightGuard { set: self, hash })
        } else {
            None
        }
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.hashes.lock().contains(hash)
    }

    pub fn len(&self) -> usize {
        self.hashes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.lock().is_empty()
    }
}

/// Releases the claimed hash when dropped, including on early return.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    set: &'a InFlightSet,
    hash: Hash,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.hashes.lock().remove(&self.hash);
    }
}
