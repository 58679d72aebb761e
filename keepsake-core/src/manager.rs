//! Save manager: walks the registry to produce and consume the container.
//!
//! Failures are absorbed at the smallest granularity that contains them:
//!
//! | Failure                         | Absorbed at | Effect                         |
//! |---------------------------------|-------------|--------------------------------|
//! | encode/decode error, type drift | field       | field skipped / keeps value    |
//! | dropped or borrowed instance    | component   | component skipped              |
//! | no record for a component       | component   | nothing restored, no hook call |
//! | malformed container blob        | container   | nothing loaded                 |
//!
//! Only store I/O errors are returned to the caller.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::codec;
use crate::component::{ComponentHandle, ComponentKey, SceneGraph};
use crate::config::{KeepsakeConfig, PersistenceConfig};
use crate::container::{SavedComponent, SavedContainer, SavedField};
use crate::error::{KeepsakeError, Result};
use crate::marker::FieldMarker;
use crate::registry::{ComponentRegistry, RegistryEntry};
use crate::store::{open_store, KeyValueStore};

/// Outcome of a save operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    /// Component records written.
    pub components: usize,
    /// Field records written.
    pub fields: usize,
    /// Fields that failed to encode.
    pub skipped_fields: usize,
    /// Registry entries whose instance was gone.
    pub stale: usize,
}

/// Outcome of a load operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Components that had a record and were restored.
    pub components: usize,
    /// Fields assigned.
    pub fields: usize,
    /// Fields that kept their value because decoding failed.
    pub failed_fields: usize,
    /// Targets without a saved record.
    pub missing: usize,
}

/// Registers components and saves/loads their marked fields through a
/// [`KeyValueStore`], all under one container key.
pub struct SaveManager<S> {
    registry: ComponentRegistry,
    store: S,
    container_key: String,
    flush_on_save: bool,
    enabled: bool,
}

impl<S> std::fmt::Debug for SaveManager<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveManager")
            .field("registry", &self.registry)
            .field("container_key", &self.container_key)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl SaveManager<Box<dyn KeyValueStore>> {
    /// Build a manager on the store backend named by the configuration.
    ///
    /// # Errors
    /// Propagates [`open_store`] failures.
    pub fn open(config: &KeepsakeConfig) -> Result<Self> {
        let store = open_store(&config.persistence)?;
        Ok(Self::from_config(store, config))
    }
}

impl<S: KeyValueStore> SaveManager<S> {
    /// Create a manager with default settings.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::from_config(store, &KeepsakeConfig::default())
    }

    /// Create a manager with explicit settings.
    #[must_use]
    pub fn from_config(store: S, config: &KeepsakeConfig) -> Self {
        let PersistenceConfig {
            container_key,
            flush_on_save,
            ..
        } = &config.persistence;
        Self {
            registry: ComponentRegistry::new(),
            store,
            container_key: container_key.clone(),
            flush_on_save: *flush_on_save,
            enabled: config.general.enabled,
        }
    }

    /// The registry.
    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Give up the manager and keep the store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    /// Name the container is stored under.
    #[must_use]
    pub fn container_key(&self) -> &str {
        &self.container_key
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register a component. Returns its key when newly registered.
    pub fn register(&mut self, component: impl Into<ComponentHandle>) -> Option<ComponentKey> {
        self.registry.register(&component.into())
    }

    /// Forget a component. Safe to call for unknown keys.
    pub fn unregister(&mut self, key: &ComponentKey) -> bool {
        self.registry.unregister(key)
    }

    // ------------------------------------------------------------------
    // Full cycle
    // ------------------------------------------------------------------

    /// Write a fresh container holding every live component's
    /// save-on-exit fields.
    ///
    /// # Errors
    /// Store failures only.
    pub fn save_all(&mut self) -> Result<SaveSummary> {
        if !self.enabled {
            return Ok(SaveSummary::default());
        }
        let start = Instant::now();
        let mut container = SavedContainer::default();
        let mut summary = SaveSummary::default();

        for entry in self.registry.entries() {
            if !entry.is_alive() {
                debug!(component = %entry.key(), "Skipping stale registry entry");
                summary.stale += 1;
                continue;
            }
            let (record, skipped) = encode_entry(entry, FieldMarker::saves_on_exit);
            summary.skipped_fields += skipped;
            if record.fields.is_empty() {
                continue;
            }
            summary.components += 1;
            summary.fields += record.fields.len();
            container.components.push(record);
        }

        self.write_container(&container)?;
        info!(
            components = summary.components,
            fields = summary.fields,
            skipped = summary.skipped_fields,
            elapsed_us = start.elapsed().as_micros(),
            "Saved all components"
        );
        Ok(summary)
    }

    /// Restore every registered component's load-on-ready fields.
    ///
    /// # Errors
    /// Store failures only.
    pub fn load_all(&mut self) -> Result<LoadSummary> {
        let targets = self.registry.keys();
        self.load_components(&targets)
    }

    /// Restore the load-on-ready fields of `targets` only.
    ///
    /// # Errors
    /// Store failures only.
    pub fn load_components(&mut self, targets: &[ComponentKey]) -> Result<LoadSummary> {
        if !self.enabled || targets.is_empty() {
            return Ok(LoadSummary::default());
        }
        let start = Instant::now();
        let Some(container) = self.fetch_container()? else {
            return Ok(LoadSummary::default());
        };

        let mut summary = LoadSummary::default();
        for key in targets {
            let Some(entry) = self.registry.get(key) else {
                debug!(component = %key, "Load target is not registered");
                continue;
            };
            if !entry.is_alive() {
                debug!(component = %key, "Skipping stale registry entry");
                continue;
            }
            let Some(record) = container.component(key.as_str()) else {
                summary.missing += 1;
                continue;
            };
            restore_entry(entry, record, FieldMarker::loads_on_ready, &mut summary);
        }

        info!(
            components = summary.components,
            fields = summary.fields,
            failed = summary.failed_fields,
            elapsed_us = start.elapsed().as_micros(),
            "Loaded components"
        );
        Ok(summary)
    }

    // ------------------------------------------------------------------
    // Single component
    // ------------------------------------------------------------------

    /// Save one component's marked fields into the existing container,
    /// leaving every other record untouched.
    ///
    /// Returns `false` when the component has nothing to save.
    ///
    /// # Errors
    /// Store failures only.
    pub fn save_one(&mut self, component: impl Into<ComponentHandle>) -> Result<bool> {
        if !self.enabled {
            return Ok(false);
        }
        let handle = component.into();
        let key = match self.ensure_registered(&handle) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Cannot save component");
                return Ok(false);
            }
        };
        let Some(entry) = self.registry.get(&key) else {
            return Ok(false);
        };

        let (record, skipped) = encode_entry(entry, |_| true);
        if record.fields.is_empty() {
            warn!(component = %key, skipped, "Nothing to save");
            return Ok(false);
        }

        let mut container = self.fetch_container()?.unwrap_or_default();
        container.upsert(record);
        self.write_container(&container)?;
        debug!(component = %key, "Saved component");
        Ok(true)
    }

    /// Restore one component's marked fields.
    ///
    /// Returns `false` when there was no saved record for it.
    ///
    /// # Errors
    /// Store failures only.
    pub fn load_one(&mut self, component: impl Into<ComponentHandle>) -> Result<bool> {
        if !self.enabled {
            return Ok(false);
        }
        let handle = component.into();
        let key = match self.ensure_registered(&handle) {
            Ok(key) => key,
            Err(e) => {
                warn!(error = %e, "Cannot load component");
                return Ok(false);
            }
        };
        let Some(container) = self.fetch_container()? else {
            return Ok(false);
        };
        let Some(record) = container.component(key.as_str()) else {
            debug!(component = %key, "No saved record");
            return Ok(false);
        };
        let Some(entry) = self.registry.get(&key) else {
            return Ok(false);
        };

        let mut summary = LoadSummary::default();
        restore_entry(entry, record, |_| true, &mut summary);
        debug!(
            component = %entry.key(),
            fields = summary.fields,
            failed = summary.failed_fields,
            "Loaded component"
        );
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Host events
    // ------------------------------------------------------------------

    /// React to a world reload: register the components that appeared and
    /// restore only those.
    ///
    /// # Errors
    /// Store failures only.
    pub fn on_world_reloaded(&mut self, graph: &dyn SceneGraph) -> Result<LoadSummary> {
        let added = self.registry.rescan(graph);
        info!(added = added.len(), "World reloaded");
        self.load_components(&added)
    }

    /// The application is exiting: save everything marked save-on-exit.
    ///
    /// # Errors
    /// Store failures only.
    pub fn on_exit(&mut self) -> Result<SaveSummary> {
        self.save_all()
    }

    // ------------------------------------------------------------------
    // Container access
    // ------------------------------------------------------------------

    /// The persisted container as stored.
    ///
    /// # Errors
    /// Store failures, or [`KeepsakeError::Serialization`] for a malformed blob.
    pub fn read_container(&self) -> Result<SavedContainer> {
        let json = self
            .store
            .get_string(&self.container_key, SavedContainer::EMPTY_JSON)?;
        SavedContainer::from_json(&json)
    }

    /// Delete one component's saved record. Returns `true` if it existed.
    ///
    /// # Errors
    /// Store failures only.
    pub fn delete_saved(&mut self, key: &ComponentKey) -> Result<bool> {
        let Some(mut container) = self.fetch_container()? else {
            return Ok(false);
        };
        if !container.remove(key.as_str()) {
            return Ok(false);
        }
        self.write_container(&container)?;
        Ok(true)
    }

    /// Replace the persisted container with an empty one.
    ///
    /// # Errors
    /// Store failures only.
    pub fn clear(&mut self) -> Result<()> {
        self.write_container(&SavedContainer::default())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Register `handle` if needed.
    ///
    /// # Errors
    /// [`KeepsakeError::Unavailable`] while the component is mutably
    /// borrowed, [`KeepsakeError::NotRegistered`] when it has no marked fields.
    fn ensure_registered(&mut self, handle: &ComponentHandle) -> Result<ComponentKey> {
        let key = handle.key().ok_or_else(|| KeepsakeError::Unavailable {
            component: "component".to_string(),
            reason: "mutably borrowed".to_string(),
        })?;
        self.registry.register(handle);
        if self.registry.contains(&key) {
            Ok(key)
        } else {
            Err(KeepsakeError::NotRegistered(key.to_string()))
        }
    }

    /// `None` for a malformed blob; a missing blob is an empty container.
    fn fetch_container(&self) -> Result<Option<SavedContainer>> {
        let json = self
            .store
            .get_string(&self.container_key, SavedContainer::EMPTY_JSON)?;
        match SavedContainer::from_json(&json) {
            Ok(container) => Ok(Some(container)),
            Err(e) => {
                warn!(
                    container = %self.container_key,
                    error = %e,
                    "Saved container is malformed, ignoring it"
                );
                Ok(None)
            }
        }
    }

    fn write_container(&mut self, container: &SavedContainer) -> Result<()> {
        let json = container.to_json()?;
        self.store.set_string(&self.container_key, &json)?;
        if self.flush_on_save {
            self.store.flush()?;
        }
        Ok(())
    }
}

/// Encode the fields of `entry` selected by `include`. Returns the record and
/// the number of fields that failed to encode.
fn encode_entry(entry: &RegistryEntry, include: impl Fn(&FieldMarker) -> bool) -> (SavedComponent, usize) {
    let mut fields: Vec<SavedField> = Vec::new();
    let mut skipped = 0;

    for index in 0..entry.field_count() {
        let marker = entry.marker(index);
        if entry.field_index(marker.key()) != Some(index) {
            debug!(component = %entry.key(), field = %marker, "Duplicate field key, keeping the first");
            continue;
        }
        if !include(marker) {
            continue;
        }
        let kind = entry.kind(index);
        match entry.read(index).and_then(|value| codec::encode(&value, kind)) {
            Ok(value) => fields.push(SavedField {
                key: marker.key().to_string(),
                type_name: kind.type_name(),
                value,
            }),
            Err(e) => {
                warn!(component = %entry.key(), field = %marker, error = %e, "Failed to encode field");
                skipped += 1;
            }
        }
    }

    let record = SavedComponent {
        component_key: entry.key().to_string(),
        fields,
    };
    (record, skipped)
}

/// Decode and assign, in declaration order, every field whose marker passes
/// `include` and that has a saved value in `record`, then run the
/// component's lifecycle hook once.
fn restore_entry(
    entry: &RegistryEntry,
    record: &SavedComponent,
    include: impl Fn(&FieldMarker) -> bool,
    summary: &mut LoadSummary,
) {
    for index in 0..entry.field_count() {
        let marker = entry.marker(index);
        if entry.field_index(marker.key()) != Some(index) || !include(marker) {
            continue;
        }
        let Some(saved) = record.field(marker.key()) else {
            continue;
        };
        let kind = entry.kind(index);
        let declared = kind.type_name();
        let result = if saved.type_name == declared {
            codec::decode(&saved.value, kind).and_then(|value| entry.write(index, value))
        } else {
            Err(KeepsakeError::TypeMismatch {
                expected: declared,
                found: saved.type_name.clone(),
            })
        };
        match result {
            Ok(()) => summary.fields += 1,
            Err(e) => {
                warn!(
                    component = %entry.key(),
                    field = %saved.key,
                    error = %e,
                    "Failed to restore field, keeping current value"
                );
                summary.failed_fields += 1;
            }
        }
    }

    for saved in &record.fields {
        if entry.field_index(&saved.key).is_none() {
            debug!(component = %entry.key(), field = %saved.key, "No field for saved key");
        }
    }

    match panic::catch_unwind(AssertUnwindSafe(|| entry.notify_restored())) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(component = %entry.key(), error = %e, "Lifecycle hook not run"),
        Err(_) => warn!(component = %entry.key(), "Lifecycle hook panicked"),
    }
    summary.components += 1;
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::component::{Field, InstanceId, Persistent};
    use crate::persist_field;
    use crate::store::MemoryStore;

    #[derive(Debug, Default)]
    struct Counter {
        id: u64,
        count: i32,
        label: String,
        session: u32,
        restored: u32,
    }

    impl Persistent for Counter {
        const TYPE_NAME: &'static str = "Counter";

        fn instance_id(&self) -> InstanceId {
            InstanceId(self.id)
        }

        fn persisted_fields() -> Vec<Field<Self>> {
            vec![
                persist_field!("Count" => count),
                persist_field!("Label" => label).auto_load_on_ready(false),
                persist_field!("Session" => session).auto_save_on_exit(false),
            ]
        }

        fn on_restored(&mut self) {
            self.restored += 1;
        }
    }

    fn counter(id: u64, count: i32) -> Rc<RefCell<Counter>> {
        Rc::new(RefCell::new(Counter {
            id,
            count,
            label: format!("c{id}"),
            ..Counter::default()
        }))
    }

    #[test]
    fn save_all_respects_auto_save_flag() {
        let mut manager = SaveManager::new(MemoryStore::new());
        let c = counter(1, 5);
        manager.register(&c);

        let summary = manager.save_all().expect("save");
        assert_eq!(summary.components, 1);
        assert_eq!(summary.fields, 2);

        let container = manager.read_container().expect("container");
        let record = container.component("Counter_1").expect("record");
        assert!(record.field("Session").is_none());
        assert_eq!(record.field("Count").expect("Count").value, "5");
    }

    #[test]
    fn load_all_respects_auto_load_flag() {
        let mut manager = SaveManager::new(MemoryStore::new());
        let c = counter(1, 5);
        manager.register(&c);
        manager.save_all().expect("save");

        {
            let mut c = c.borrow_mut();
            c.count = 0;
            c.label = "changed".to_string();
        }
        manager.load_all().expect("load");

        let c = c.borrow();
        assert_eq!(c.count, 5);
        assert_eq!(c.label, "changed");
        assert_eq!(c.restored, 1);
    }

    #[test]
    fn stale_entries_are_skipped() {
        let mut manager = SaveManager::new(MemoryStore::new());
        let alive = counter(1, 1);
        let dead = counter(2, 2);
        manager.register(&alive);
        manager.register(&dead);
        drop(dead);

        let summary = manager.save_all().expect("save");
        assert_eq!(summary.stale, 1);
        assert_eq!(manager.read_container().expect("container").len(), 1);
        manager.load_all().expect("load");
    }

    #[test]
    fn save_all_flushes_when_configured() {
        let mut manager = SaveManager::new(MemoryStore::new());
        manager.save_all().expect("save");
        assert_eq!(manager.store().flushes(), 1);

        let mut config = KeepsakeConfig::default();
        config.persistence.flush_on_save = false;
        let mut manager = SaveManager::from_config(MemoryStore::new(), &config);
        manager.save_all().expect("save");
        assert_eq!(manager.store().flushes(), 0);
    }

    #[test]
    fn disabled_manager_does_nothing() {
        let mut config = KeepsakeConfig::default();
        config.general.enabled = false;
        let mut manager = SaveManager::from_config(MemoryStore::new(), &config);
        let c = counter(1, 3);
        manager.register(&c);

        assert_eq!(manager.save_all().expect("save"), SaveSummary::default());
        assert!(!manager.save_one(&c).expect("save one"));
        assert!(manager.store().get("SaveData").is_none());
    }

    #[test]
    fn malformed_container_loads_nothing() {
        let mut store = MemoryStore::new();
        store.set_string("SaveData", "{ not json").expect("set");
        let mut manager = SaveManager::new(store);
        let c = counter(1, 7);
        manager.register(&c);

        assert_eq!(manager.load_all().expect("load"), LoadSummary::default());
        assert!(!manager.load_one(&c).expect("load one"));
        assert_eq!(c.borrow().count, 7);
        assert_eq!(c.borrow().restored, 0);
    }

    #[test]
    fn save_one_replaces_corrupt_container() {
        let mut store = MemoryStore::new();
        store.set_string("SaveData", "garbage").expect("set");
        let mut manager = SaveManager::new(store);
        let c = counter(1, 7);

        assert!(manager.save_one(&c).expect("save one"));
        let container = manager.read_container().expect("container");
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn explicit_operations_ignore_auto_flags() {
        let mut manager = SaveManager::new(MemoryStore::new());
        let c = counter(1, 1);
        c.borrow_mut().session = 9;
        manager.save_one(&c).expect("save one");

        {
            let mut c = c.borrow_mut();
            c.session = 0;
            c.label = "changed".to_string();
        }
        assert!(manager.load_one(&c).expect("load one"));
        assert_eq!(c.borrow().session, 9);
        assert_eq!(c.borrow().label, "c1");
    }

    #[test]
    fn delete_and_clear() {
        let mut manager = SaveManager::new(MemoryStore::new());
        let a = counter(1, 1);
        let b = counter(2, 2);
        manager.save_one(&a).expect("save a");
        manager.save_one(&b).expect("save b");

        assert!(manager.delete_saved(&ComponentKey::from("Counter_1")).expect("delete"));
        assert!(!manager.delete_saved(&ComponentKey::from("Counter_1")).expect("delete again"));
        assert_eq!(manager.read_container().expect("container").len(), 1);

        manager.clear().expect("clear");
        assert!(manager.read_container().expect("container").is_empty());
    }

    #[test]
    fn missing_record_skips_hook() {
        let mut manager = SaveManager::new(MemoryStore::new());
        let c = counter(1, 1);
        manager.register(&c);
        let summary = manager.load_all().expect("load");
        assert_eq!(summary.missing, 1);
        assert_eq!(c.borrow().restored, 0);
    }

    struct Twins {
        first: i32,
        second: i32,
    }

    impl Persistent for Twins {
        const TYPE_NAME: &'static str = "Twins";

        fn instance_id(&self) -> InstanceId {
            InstanceId(0)
        }

        fn persisted_fields() -> Vec<Field<Self>> {
            vec![
                persist_field!("Value" => first),
                persist_field!("Value" => second),
            ]
        }
    }

    #[test]
    fn duplicate_key_keeps_first_field() {
        let mut manager = SaveManager::new(MemoryStore::new());
        let t = Rc::new(RefCell::new(Twins { first: 1, second: 2 }));
        manager.register(&t);
        manager.save_all().expect("save");

        let container = manager.read_container().expect("container");
        let record = container.component("Twins_0").expect("record");
        assert_eq!(record.fields.len(), 1);
        assert_eq!(record.fields[0].value, "1");

        {
            let mut t = t.borrow_mut();
            t.first = 0;
            t.second = 0;
        }
        manager.load_all().expect("load");
        assert_eq!(t.borrow().first, 1);
        assert_eq!(t.borrow().second, 0);
    }

    struct QuietTwins {
        first: i32,
        second: i32,
    }

    impl Persistent for QuietTwins {
        const TYPE_NAME: &'static str = "QuietTwins";

        fn instance_id(&self) -> InstanceId {
            InstanceId(0)
        }

        fn persisted_fields() -> Vec<Field<Self>> {
            vec![
                persist_field!("Value" => first).auto_save_on_exit(false),
                persist_field!("Value" => second),
            ]
        }
    }

    #[test]
    fn duplicate_key_never_borrows_a_later_field() {
        let mut manager = SaveManager::new(MemoryStore::new());
        let t = Rc::new(RefCell::new(QuietTwins { first: 1, second: 2 }));
        manager.register(&t);

        let summary = manager.save_all().expect("save");
        assert_eq!(summary.components, 0);
        assert!(manager.read_container().expect("container").is_empty());

        // An explicit save writes the first field under the shared key.
        manager.save_one(&t).expect("save one");
        {
            let mut t = t.borrow_mut();
            t.first = 0;
            t.second = 0;
        }
        manager.load_all().expect("load");
        assert_eq!(t.borrow().first, 1);
        assert_eq!(t.borrow().second, 0);
    }

    #[test]
    fn restore_uses_first_saved_value_per_field() {
        let mut store = MemoryStore::new();
        store
            .set_string(
                "SaveData",
                r#"{"components":[{"componentKey":"Counter_1","fields":[
                    {"key":"Count","typeName":"int","value":"3"},
                    {"key":"Label","typeName":"string","value":"ignored on load"},
                    {"key":"Count","typeName":"int","value":"99"},
                    {"key":"Session","typeName":"int","value":"4"}
                ]}]}"#,
            )
            .expect("set");
        let mut manager = SaveManager::new(store);
        let c = counter(1, 0);
        manager.register(&c);

        let summary = manager.load_all().expect("load");
        assert_eq!(summary.fields, 2);
        assert_eq!(c.borrow().count, 3);
        assert_eq!(c.borrow().session, 4);
        assert_eq!(c.borrow().label, "c1");
    }

    struct Bare {
        id: u64,
    }

    impl Persistent for Bare {
        const TYPE_NAME: &'static str = "Bare";

        fn instance_id(&self) -> InstanceId {
            InstanceId(self.id)
        }

        fn persisted_fields() -> Vec<Field<Self>> {
            Vec::new()
        }
    }

    #[test]
    fn unmarked_component_is_not_registered() {
        let mut manager = SaveManager::new(MemoryStore::new());
        let bare = Rc::new(RefCell::new(Bare { id: 5 }));
        let handle = ComponentHandle::from(&bare);

        let err = manager.ensure_registered(&handle).expect_err("no marked fields");
        assert!(matches!(err, KeepsakeError::NotRegistered(ref key) if key == "Bare_5"));
        assert!(!manager.save_one(&bare).expect("save one"));
        assert!(!manager.load_one(&bare).expect("load one"));

        let c = counter(1, 1);
        let _guard = c.borrow_mut();
        let err = manager.ensure_registered(&ComponentHandle::from(&c)).expect_err("borrowed");
        assert!(matches!(err, KeepsakeError::Unavailable { .. }));
    }

    struct Grumpy {
        mood: i32,
    }

    impl Persistent for Grumpy {
        const TYPE_NAME: &'static str = "Grumpy";

        fn instance_id(&self) -> InstanceId {
            InstanceId(0)
        }

        fn persisted_fields() -> Vec<Field<Self>> {
            vec![persist_field!("Mood" => mood)]
        }

        fn on_restored(&mut self) {
            panic!("refusing to be restored");
        }
    }

    #[test]
    fn panicking_hook_is_contained() {
        let mut manager = SaveManager::new(MemoryStore::new());
        let g = Rc::new(RefCell::new(Grumpy { mood: 3 }));
        let c = counter(1, 4);
        manager.register(&g);
        manager.register(&c);
        manager.save_all().expect("save");

        g.borrow_mut().mood = 0;
        c.borrow_mut().count = 0;
        let summary = manager.load_all().expect("load");

        assert_eq!(summary.components, 2);
        assert_eq!(g.borrow().mood, 3);
        assert_eq!(c.borrow().count, 4);
        assert_eq!(c.borrow().restored, 1);
    }
}
