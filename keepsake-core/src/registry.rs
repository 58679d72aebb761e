//! Component registry: which live components have fields to save.
//!
//! The registry observes components through weak handles and never keeps one
//! alive. Entries are not removed when a component is dropped; every consumer
//! checks [`RegistryEntry::is_alive`] and skips stale entries.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Weak;

use tracing::{debug, warn};

use crate::component::{ComponentHandle, ComponentKey, Field, Persistent, SceneGraph};
use crate::error::{KeepsakeError, Result};
use crate::marker::FieldMarker;
use crate::value::{Value, ValueKind};

// ---------------------------------------------------------------------------
// Tracked components
// ---------------------------------------------------------------------------

/// Type-erased field access to one registered instance.
pub(crate) trait TrackedComponent {
    fn is_alive(&self) -> bool;
    fn field_count(&self) -> usize;
    fn marker(&self, index: usize) -> &FieldMarker;
    fn kind(&self, index: usize) -> &ValueKind;
    fn read(&self, index: usize) -> Result<Value>;
    fn write(&self, index: usize, value: Value) -> Result<()>;
    fn notify_restored(&self) -> Result<()>;
}

pub(crate) struct Tracked<C> {
    handle: Weak<RefCell<C>>,
    fields: Vec<Field<C>>,
}

impl<C: Persistent> Tracked<C> {
    /// Keeps only fields whose marker is eligible.
    pub(crate) fn new(handle: Weak<RefCell<C>>, fields: Vec<Field<C>>) -> Self {
        let fields = fields
            .into_iter()
            .filter(|field| {
                let eligible = field.marker().is_eligible();
                if !eligible {
                    warn!(component = C::TYPE_NAME, "Ignoring field marker with empty key");
                }
                eligible
            })
            .collect();
        Self { handle, fields }
    }

    fn unavailable(reason: &str) -> KeepsakeError {
        KeepsakeError::Unavailable {
            component: C::TYPE_NAME.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl<C: Persistent> TrackedComponent for Tracked<C> {
    fn is_alive(&self) -> bool {
        self.handle.strong_count() > 0
    }

    fn field_count(&self) -> usize {
        self.fields.len()
    }

    fn marker(&self, index: usize) -> &FieldMarker {
        self.fields[index].marker()
    }

    fn kind(&self, index: usize) -> &ValueKind {
        self.fields[index].kind()
    }

    fn read(&self, index: usize) -> Result<Value> {
        let cell = self.handle.upgrade().ok_or_else(|| Self::unavailable("dropped"))?;
        let component = cell.try_borrow().map_err(|_| Self::unavailable("mutably borrowed"))?;
        self.fields[index].read(&component)
    }

    fn write(&self, index: usize, value: Value) -> Result<()> {
        let cell = self.handle.upgrade().ok_or_else(|| Self::unavailable("dropped"))?;
        let mut component = cell.try_borrow_mut().map_err(|_| Self::unavailable("borrowed"))?;
        self.fields[index].write(&mut component, value)
    }

    fn notify_restored(&self) -> Result<()> {
        let cell = self.handle.upgrade().ok_or_else(|| Self::unavailable("dropped"))?;
        let mut component = cell.try_borrow_mut().map_err(|_| Self::unavailable("borrowed"))?;
        component.on_restored();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RegistryEntry
// ---------------------------------------------------------------------------

/// One registered component: its key and its marked fields.
pub struct RegistryEntry {
    key: ComponentKey,
    tracked: Box<dyn TrackedComponent>,
}

impl RegistryEntry {
    /// The component key.
    #[must_use]
    pub fn key(&self) -> &ComponentKey {
        &self.key
    }

    /// Whether the observed instance still exists.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.tracked.is_alive()
    }

    /// Markers and kinds of the eligible fields, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldMarker, &ValueKind)> + '_ {
        (0..self.tracked.field_count()).map(|i| (self.tracked.marker(i), self.tracked.kind(i)))
    }

    /// Index of the first field carrying `key`.
    pub(crate) fn field_index(&self, key: &str) -> Option<usize> {
        (0..self.tracked.field_count()).find(|&i| self.tracked.marker(i).key() == key)
    }

    pub(crate) fn field_count(&self) -> usize {
        self.tracked.field_count()
    }

    pub(crate) fn marker(&self, index: usize) -> &FieldMarker {
        self.tracked.marker(index)
    }

    pub(crate) fn kind(&self, index: usize) -> &ValueKind {
        self.tracked.kind(index)
    }

    pub(crate) fn read(&self, index: usize) -> Result<Value> {
        self.tracked.read(index)
    }

    pub(crate) fn write(&self, index: usize, value: Value) -> Result<()> {
        self.tracked.write(index, value)
    }

    pub(crate) fn notify_restored(&self) -> Result<()> {
        self.tracked.notify_restored()
    }
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("key", &self.key)
            .field("alive", &self.is_alive())
            .field("fields", &self.tracked.field_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ComponentRegistry
// ---------------------------------------------------------------------------

/// Insertion-ordered table of registered components, one entry per key.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    entries: Vec<RegistryEntry>,
    index: HashMap<ComponentKey, usize>,
}

impl ComponentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component if it has marked fields and is not registered yet.
    ///
    /// Returns the key only when an entry was inserted. An entry whose
    /// instance was dropped is replaced in place by the new instance carrying
    /// the same key; an entry whose instance is alive makes this a no-op.
    pub fn register(&mut self, handle: &ComponentHandle) -> Option<ComponentKey> {
        let Some(key) = handle.key() else {
            warn!("Cannot register a component while it is mutably borrowed");
            return None;
        };

        let existing = self.index.get(&key).copied();
        if let Some(pos) = existing {
            if self.entries[pos].is_alive() {
                return None;
            }
        }

        let tracked = handle.track();
        if tracked.field_count() == 0 {
            debug!(component = %key, "No marked fields, not registering");
            return None;
        }

        let entry = RegistryEntry {
            key: key.clone(),
            tracked,
        };
        match existing {
            Some(pos) => {
                debug!(component = %key, "Replacing stale registry entry");
                self.entries[pos] = entry;
            }
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
        debug!(component = %key, total = self.entries.len(), "Registered component");
        Some(key)
    }

    /// Remove the entry for `key`. Returns `false` if there was none.
    pub fn unregister(&mut self, key: &ComponentKey) -> bool {
        let Some(pos) = self.index.remove(key) else {
            return false;
        };
        self.entries.remove(pos);
        self.reindex();
        debug!(component = %key, "Unregistered component");
        true
    }

    /// Register every live component of `graph` that is not registered yet.
    ///
    /// Returns only the keys added by this call.
    pub fn rescan(&mut self, graph: &dyn SceneGraph) -> Vec<ComponentKey> {
        let added: Vec<ComponentKey> = graph
            .live_components()
            .iter()
            .filter_map(|handle| self.register(handle))
            .collect();
        debug!(added = added.len(), total = self.entries.len(), "Rescanned scene graph");
        added
    }

    /// Drop entries whose instance no longer exists.
    pub fn prune_stale(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(RegistryEntry::is_alive);
        self.reindex();
        before - self.entries.len()
    }

    /// Look up an entry.
    #[must_use]
    pub fn get(&self, key: &ComponentKey) -> Option<&RegistryEntry> {
        self.index.get(key).map(|&pos| &self.entries[pos])
    }

    /// Whether `key` has an entry (alive or not).
    #[must_use]
    pub fn contains(&self, key: &ComponentKey) -> bool {
        self.index.contains_key(key)
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &RegistryEntry> {
        self.entries.iter()
    }

    /// Keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<ComponentKey> {
        self.entries.iter().map(|e| e.key.clone()).collect()
    }

    /// Whether `key` is registered and its instance still exists.
    #[must_use]
    pub fn is_alive(&self, key: &ComponentKey) -> bool {
        self.get(key).is_some_and(RegistryEntry::is_alive)
    }

    /// Number of entries, including stale ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (entry.key.clone(), pos))
            .collect();
    }
}
