//! Indexed set of loan ids backing the pending queue and the current book

use odra::prelude::*;

/// Loan ids stored slot by slot, with a reverse index so inserts and
/// removals touch a constant number of keys.
///
/// Removing an id moves the last id into the freed slot.
#[odra::module]
pub struct LoanIdSet {
    ids: Mapping<u32, u64>,
    /// Loan id to slot + 1, zero when absent
    slots: Mapping<u64, u32>,
    len: Var<u32>,
}

#[odra::module]
impl LoanIdSet {
    pub fn len(&self) -> u32 {
        self.len.get_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, loan_id: u64) -> bool {
        self.slots.get(&loan_id).unwrap_or_default() != 0
    }

    /// All ids in slot order
    pub fn ids(&self) -> Vec<u64> {
        (0..self.len()).filter_map(|slot| self.ids.get(&slot)).collect()
    }
}

impl LoanIdSet {
    /// Returns false when the id is already present
    pub fn insert(&mut self, loan_id: u64) -> bool {
        if self.contains(loan_id) {
            return false;
        }
        let len = self.len();
        self.ids.set(&len, loan_id);
        self.slots.set(&loan_id, len + 1);
        self.len.set(len + 1);
        true
    }

    /// Returns false when the id was not present
    pub fn remove(&mut self, loan_id: u64) -> bool {
        let slot = self.slots.get(&loan_id).unwrap_or_default();
        if slot == 0 {
            return false;
        }
        let last = self.len() - 1;
        if slot - 1 != last {
            if let Some(moved) = self.ids.get(&last) {
                self.ids.set(&(slot - 1), moved);
                self.slots.set(&moved, slot);
            }
        }
        self.slots.set(&loan_id, 0);
        self.len.set(last);
        true
    }

    /// Empty the set, returning the ids it held
    pub fn take_all(&mut self) -> Vec<u64> {
        let ids = self.ids();
        for loan_id in &ids {
            self.slots.set(loan_id, 0);
        }
        self.len.set(0);
        ids
    }
}
