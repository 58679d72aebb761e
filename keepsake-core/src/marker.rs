//! Field markers: the declarative opt-in attached to each persisted field.

use std::fmt;

/// Declares that a field takes part in save/restore.
///
/// The `key` identifies the field's saved value independently of the Rust
/// field name, so fields can be renamed without losing data. Keys must be
/// unique among the markers of one component type. When they are not, the
/// first field declared with a key is saved and restored and the rest are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldMarker {
    key: String,
    auto_save_on_exit: bool,
    auto_load_on_ready: bool,
}

impl FieldMarker {
    /// Create a marker with both auto flags enabled.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            auto_save_on_exit: true,
            auto_load_on_ready: true,
        }
    }

    /// Include (or exclude) this field from full saves.
    #[must_use]
    pub fn auto_save_on_exit(mut self, enabled: bool) -> Self {
        self.auto_save_on_exit = enabled;
        self
    }

    /// Include (or exclude) this field from full loads.
    #[must_use]
    pub fn auto_load_on_ready(mut self, enabled: bool) -> Self {
        self.auto_load_on_ready = enabled;
        self
    }

    /// The logical key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether `save_all` writes this field.
    #[must_use]
    pub fn saves_on_exit(&self) -> bool {
        self.auto_save_on_exit
    }

    /// Whether `load_all` restores this field.
    #[must_use]
    pub fn loads_on_ready(&self) -> bool {
        self.auto_load_on_ready
    }

    /// A marker with an empty key does not make its field eligible.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        !self.key.trim().is_empty()
    }
}

impl fmt::Display for FieldMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}
