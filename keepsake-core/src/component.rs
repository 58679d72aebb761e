//! The save capability components opt into, and the handles the registry
//! uses to observe them.
//!
//! A component declares its persisted fields once, as a list of [`Field`]
//! descriptors built from plain accessors:
//!
//! ```
//! use keepsake_core::{persist_field, Field, InstanceId, Persistent};
//!
//! struct Scoreboard {
//!     id: InstanceId,
//!     score: i64,
//!     names: Vec<String>,
//! }
//!
//! impl Persistent for Scoreboard {
//!     const TYPE_NAME: &'static str = "Scoreboard";
//!
//!     fn instance_id(&self) -> InstanceId {
//!         self.id
//!     }
//!
//!     fn persisted_fields() -> Vec<Field<Self>> {
//!         vec![
//!             persist_field!("Score" => score),
//!             persist_field!("Names" => names).auto_save_on_exit(false),
//!         ]
//!     }
//! }
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::error::Result;
use crate::marker::FieldMarker;
use crate::registry::{Tracked, TrackedComponent};
use crate::value::{Persist, Value, ValueKind};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Locally-unique instance identifier supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for InstanceId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Stable key of one component instance: `<type name>_<instance id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentKey(String);

impl ComponentKey {
    /// Derive the key for an instance of `type_name`.
    #[must_use]
    pub fn new(type_name: &str, instance_id: InstanceId) -> Self {
        Self(format!("{type_name}_{instance_id}"))
    }

    /// Key of a live component.
    #[must_use]
    pub fn of<C: Persistent>(component: &C) -> Self {
        Self::new(C::TYPE_NAME, component.instance_id())
    }

    /// The key as written into the container.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

// ---------------------------------------------------------------------------
// Persistent
// ---------------------------------------------------------------------------

/// The save capability: a component with marked fields.
pub trait Persistent: 'static {
    /// Declared type name, the first half of the component key.
    const TYPE_NAME: &'static str;

    /// Host-assigned identifier, the second half of the component key.
    fn instance_id(&self) -> InstanceId;

    /// Field descriptors in declaration order.
    fn persisted_fields() -> Vec<Field<Self>>
    where
        Self: Sized;

    /// Lifecycle hook, called once after this component's fields were
    /// restored from a saved record.
    fn on_restored(&mut self) {}
}

type Reader<C> = Box<dyn Fn(&C) -> Result<Value>>;
type Writer<C> = Box<dyn Fn(&mut C, Value) -> Result<()>>;

/// A marked field of component `C`: marker, declared kind, and typed access.
pub struct Field<C> {
    marker: FieldMarker,
    kind: ValueKind,
    read: Reader<C>,
    write: Writer<C>,
}

impl<C: 'static> Field<C> {
    /// Describe a field through its accessors.
    #[must_use]
    pub fn new<T: Persist + 'static>(
        marker: FieldMarker,
        get: fn(&C) -> &T,
        get_mut: fn(&mut C) -> &mut T,
    ) -> Self {
        Self {
            marker,
            kind: T::value_kind(),
            read: Box::new(move |component| get(component).to_value()),
            write: Box::new(move |component, value| {
                let decoded = T::from_value(value)?;
                *get_mut(component) = decoded;
                Ok(())
            }),
        }
    }

    /// See [`FieldMarker::auto_save_on_exit`].
    #[must_use]
    pub fn auto_save_on_exit(mut self, enabled: bool) -> Self {
        self.marker = self.marker.auto_save_on_exit(enabled);
        self
    }

    /// See [`FieldMarker::auto_load_on_ready`].
    #[must_use]
    pub fn auto_load_on_ready(mut self, enabled: bool) -> Self {
        self.marker = self.marker.auto_load_on_ready(enabled);
        self
    }

    /// The field's marker.
    #[must_use]
    pub fn marker(&self) -> &FieldMarker {
        &self.marker
    }

    /// The field's declared kind.
    #[must_use]
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Read the current value.
    ///
    /// # Errors
    /// Propagates [`Persist::to_value`] failures.
    pub fn read(&self, component: &C) -> Result<Value> {
        (self.read)(component)
    }

    /// Assign a decoded value. On error the field is left untouched.
    ///
    /// # Errors
    /// Propagates [`Persist::from_value`] failures.
    pub fn write(&self, component: &mut C, value: Value) -> Result<()> {
        (self.write)(component, value)
    }
}

impl<C> fmt::Debug for Field<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("marker", &self.marker)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Build a [`Field`] for `self.<field>` inside a [`Persistent`] impl.
///
/// `persist_field!("Score" => score)` is shorthand for
/// `Field::new(FieldMarker::new("Score"), |c| &c.score, |c| &mut c.score)`.
#[macro_export]
macro_rules! persist_field {
    ($key:expr => $field:ident) => {
        $crate::Field::<Self>::new(
            $crate::FieldMarker::new($key),
            |c| &c.$field,
            |c| &mut c.$field,
        )
    };
}

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Type-erased view of `RefCell<C>` for some `C: Persistent`.
pub(crate) trait ErasedComponent {
    /// `None` while the component is mutably borrowed elsewhere.
    fn component_key(&self) -> Option<ComponentKey>;

    fn track(self: Rc<Self>) -> Box<dyn TrackedComponent>;
}

impl<C: Persistent> ErasedComponent for RefCell<C> {
    fn component_key(&self) -> Option<ComponentKey> {
        self.try_borrow().ok().map(|c| ComponentKey::of(&*c))
    }

    fn track(self: Rc<Self>) -> Box<dyn TrackedComponent> {
        Box::new(Tracked::new(Rc::downgrade(&self), C::persisted_fields()))
    }
}

/// Shared handle to a live persistent component, independent of its type.
#[derive(Clone)]
pub struct ComponentHandle(Rc<dyn ErasedComponent>);

impl ComponentHandle {
    /// Wrap a shared component.
    #[must_use]
    pub fn new<C: Persistent>(component: &Rc<RefCell<C>>) -> Self {
        Self(Rc::clone(component) as Rc<dyn ErasedComponent>)
    }

    /// The component key, or `None` while the component is mutably borrowed.
    #[must_use]
    pub fn key(&self) -> Option<ComponentKey> {
        self.0.component_key()
    }

    pub(crate) fn track(&self) -> Box<dyn TrackedComponent> {
        Rc::clone(&self.0).track()
    }
}

impl<C: Persistent> From<&Rc<RefCell<C>>> for ComponentHandle {
    fn from(component: &Rc<RefCell<C>>) -> Self {
        Self::new(component)
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentHandle").field(&self.key()).finish()
    }
}

/// Host object graph: every live component carrying the save capability.
pub trait SceneGraph {
    /// Live persistent components, in a stable order.
    fn live_components(&self) -> Vec<ComponentHandle>;
}
