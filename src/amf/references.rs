//! Per-call reference table
//!
//! Composites enter the table in first-seen order, once each. The decoder
//! resolves `Reference` indices against it; the encoder looks instances up by
//! identity (handle address). Entries hold a clone of the handle, which keeps
//! every address alive, and therefore unique, for the duration of the call.

use std::collections::HashMap;

use super::value::AmfValue;

#[derive(Debug, Default)]
pub(crate) struct ReferenceTable {
    entries: Vec<AmfValue>,
    by_identity: HashMap<usize, usize>,
}

impl ReferenceTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Append a composite, returning its index
    ///
    /// An instance already present keeps its first index. Scalars have no
    /// identity and are not stored.
    pub(crate) fn insert(&mut self, value: &AmfValue) -> Option<usize> {
        let id = value.identity()?;
        if let Some(&index) = self.by_identity.get(&id) {
            return Some(index);
        }
        let index = self.entries.len();
        self.entries.push(value.clone());
        self.by_identity.insert(id, index);
        Some(index)
    }

    /// Shared handle stored at `index`
    pub(crate) fn get(&self, index: u16) -> Option<AmfValue> {
        self.entries.get(index as usize).cloned()
    }

    /// Wire index of an instance already in the table
    ///
    /// Instances registered past `u16::MAX` exist in the table but cannot be
    /// referenced.
    pub(crate) fn position(&self, value: &AmfValue) -> Option<u16> {
        let id = value.identity()?;
        let index = *self.by_identity.get(&id)?;
        u16::try_from(index).ok()
    }
}
