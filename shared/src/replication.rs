//! Authoritative state cells with change notification.
//!
//! `ReplicatedValue` and `ReplicatedList` are the foundation of session
//! replication: the authority writes through them and every write fires the
//! registered observers, which is where packet fanout hangs off on the server
//! and where local reactions hang off on clients. Mirrors apply inbound
//! packets through the same setters, so both sides observe state changes
//! identically. Authority-only writes are enforced structurally; only the
//! owning side ever holds a mutable reference.

use crate::protocol::ClientId;
use std::collections::HashMap;

/// A single replicated cell. Observers fire on every effective change.
pub struct ReplicatedValue<T> {
    value: T,
    observers: Vec<Box<dyn FnMut(&T) + Send>>,
}

impl<T: Clone + PartialEq> ReplicatedValue<T> {
    pub fn new(initial: T) -> Self {
        Self {
            value: initial,
            observers: Vec::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Writes a new value and notifies observers. Writing the current value
    /// is a no-op and fires nothing.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        for observer in &mut self.observers {
            observer(&self.value);
        }
        true
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&T) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ReplicatedValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicatedValue")
            .field("value", &self.value)
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Change notification emitted by a `ReplicatedList`.
#[derive(Debug, Clone, PartialEq)]
pub enum ListEvent<V> {
    Upserted { id: ClientId, row: V },
    Removed { id: ClientId },
    Cleared,
}

/// A replicated table of per-client rows.
pub struct ReplicatedList<V> {
    rows: HashMap<ClientId, V>,
    observers: Vec<Box<dyn FnMut(&ListEvent<V>) + Send>>,
}

impl<V: Clone> ReplicatedList<V> {
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&ListEvent<V>) + Send + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn emit(&mut self, event: ListEvent<V>) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    /// Inserts or replaces a client's row, notifying observers.
    pub fn upsert(&mut self, id: ClientId, row: V) {
        self.rows.insert(id, row.clone());
        self.emit(ListEvent::Upserted { id, row });
    }

    /// Mutates a row in place without firing an event. Reserved for the
    /// high-rate movement path, whose fanout is batched at tick cadence
    /// instead of per write.
    pub fn replace_quiet(&mut self, id: ClientId, mutate: impl FnOnce(&mut V)) -> bool {
        if let Some(row) = self.rows.get_mut(&id) {
            mutate(row);
            true
        } else {
            false
        }
    }

    pub fn remove(&mut self, id: ClientId) -> Option<V> {
        let removed = self.rows.remove(&id);
        if removed.is_some() {
            self.emit(ListEvent::Removed { id });
        }
        removed
    }

    pub fn clear(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.rows.clear();
        self.emit(ListEvent::Cleared);
    }

    pub fn get(&self, id: ClientId) -> Option<&V> {
        self.rows.get(&id)
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<ClientId> {
        self.rows.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClientId, &V)> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<V: Clone> Default for ReplicatedList<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: std::fmt::Debug> std::fmt::Debug for ReplicatedList<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicatedList")
            .field("rows", &self.rows)
            .field("observers", &self.observers.len())
            .finish()
    }
}
