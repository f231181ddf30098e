//! Bookkeeping for packages already expanded during one resolution pass.

use std::collections::HashSet;

use tote_core::PackageKey;

/// Package identities seen so far. Inserting an identity twice reports
/// `false`, which is what stops the resolver from re-expanding a cycle.
#[derive(Debug, Default)]
pub struct ResolvedSet {
    keys: HashSet<PackageKey>,
}

impl ResolvedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` as resolved. Returns `false` if it already was.
    pub fn insert(&mut self, key: PackageKey) -> bool {
        self.keys.insert(key)
    }

    pub fn contains(&self, key: &PackageKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
