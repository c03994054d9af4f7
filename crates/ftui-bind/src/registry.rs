#![forbid(unsafe_code)]

//! Per-binder store of bindings, grouped by record.
//!
//! # Invariants
//!
//! 1. An entry exists for a record iff the binder is subscribed to that
//!    record's change and render-request notifications. The entry owns
//!    both guards, so removing the entry detaches them.
//! 2. An entry never holds an empty binding list.
//! 3. Within an entry, at most one binding exists per [`BindingKey`];
//!    bindings keep registration order and a replacement moves to the end.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::binding::{Binding, BindingKey};
use crate::reactive::Subscription;
use crate::record::{RecordId, RecordRef};

pub(crate) struct RegistryEntry {
    pub(crate) record: RecordRef,
    pub(crate) bindings: Vec<Rc<Binding>>,
    _on_change: Subscription,
    _on_render: Subscription,
}

impl RegistryEntry {
    pub(crate) fn new(record: RecordRef, on_change: Subscription, on_render: Subscription) -> Self {
        Self {
            record,
            bindings: Vec::new(),
            _on_change: on_change,
            _on_render: on_render,
        }
    }
}

#[derive(Default)]
pub(crate) struct BindingRegistry {
    entries: BTreeMap<RecordId, RegistryEntry>,
}

impl BindingRegistry {
    pub(crate) fn contains(&self, id: RecordId) -> bool {
        self.entries.contains_key(&id)
    }

    pub(crate) fn entry(&self, id: RecordId) -> Option<&RegistryEntry> {
        self.entries.get(&id)
    }

    pub(crate) fn ids(&self) -> Vec<RecordId> {
        self.entries.keys().copied().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Open an entry for a record that has none yet.
    pub(crate) fn open(&mut self, id: RecordId, entry: RegistryEntry) {
        self.entries.insert(id, entry);
    }

    /// Add `binding` to an open entry, returning the binding it replaced.
    pub(crate) fn insert(&mut self, id: RecordId, binding: Rc<Binding>) -> Option<Rc<Binding>> {
        let entry = self.entries.get_mut(&id)?;
        let replaced = entry
            .bindings
            .iter()
            .position(|b| b.key == binding.key)
            .map(|pos| entry.bindings.remove(pos));
        entry.bindings.push(binding);
        replaced
    }

    /// Remove one binding; closes the entry when it was the last one.
    ///
    /// Returns the removed binding and whether the entry was closed.
    pub(crate) fn remove(
        &mut self,
        id: RecordId,
        key: &BindingKey,
    ) -> Option<(Rc<Binding>, Option<RegistryEntry>)> {
        let entry = self.entries.get_mut(&id)?;
        let pos = entry.bindings.iter().position(|b| b.key == *key)?;
        let removed = entry.bindings.remove(pos);
        let closed = if entry.bindings.is_empty() {
            self.entries.remove(&id)
        } else {
            None
        };
        Some((removed, closed))
    }

    /// Close one entry.
    pub(crate) fn close(&mut self, id: RecordId) -> Option<RegistryEntry> {
        self.entries.remove(&id)
    }

    /// Close every entry.
    pub(crate) fn close_all(&mut self) -> Vec<RegistryEntry> {
        std::mem::take(&mut self.entries).into_values().collect()
    }

    /// Snapshot of one record's bindings, in registration order.
    pub(crate) fn bindings_of(&self, id: RecordId) -> Vec<Rc<Binding>> {
        self.entries
            .get(&id)
            .map(|entry| entry.bindings.clone())
            .unwrap_or_default()
    }

    /// Snapshot of every binding, entry by entry.
    pub(crate) fn all_bindings(&self) -> Vec<Rc<Binding>> {
        self.entries
            .values()
            .flat_map(|entry| entry.bindings.iter().cloned())
            .collect()
    }
}
