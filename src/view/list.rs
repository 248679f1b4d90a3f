//! In-memory expense list
//!
//! A cache of the last snapshot the live query delivered. It is only ever
//! replaced wholesale; nothing filters, sorts or patches it.

use crate::models::{Expense, Snapshot};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseList {
    items: Vec<Expense>,
    is_synced: bool,
    /// Number of snapshots that actually changed the list
    revision: u64,
}

impl ExpenseList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with `snapshot`.
    ///
    /// Returns `false` when the snapshot is identical to what is already
    /// held, so callers can skip re-rendering.
    pub fn replace(&mut self, snapshot: Snapshot) -> bool {
        if self.items == snapshot.items && self.is_synced == snapshot.is_synced {
            return false;
        }

        self.items = snapshot.items;
        self.is_synced = snapshot.is_synced;
        self.revision += 1;
        true
    }

    pub fn items(&self) -> &[Expense] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_synced(&self) -> bool {
        self.is_synced
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Drop everything, e.g. when the session ends
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
