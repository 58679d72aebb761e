//! # Keepsake Core Library
//!
//! Declarative, field-level persistence for game components.
//!
//! A component implements [`Persistent`] and lists its saved fields as
//! [`Field`] descriptors, each carrying a [`FieldMarker`] with a stable
//! logical key. The [`SaveManager`] keeps a [`ComponentRegistry`] of live
//! components and writes all of their marked fields into one JSON
//! [`SavedContainer`] stored under a single name in a [`KeyValueStore`].
//!
//! - **Marker**: logical key plus auto-save / auto-load flags
//! - **Codec**: enum, scalar, string, array, list and object values to text
//! - **Registry**: component key → weak handle + field descriptors
//! - **Manager**: full and single-component save/load, reload handling
//! - **Store**: in-memory and `SQLite` backends
//!
//! Everything runs synchronously on the caller's thread. A bad field, a
//! dropped component or a corrupt blob costs at most the data it covers.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod component;
pub mod config;
pub mod container;
pub mod error;
pub mod manager;
pub mod marker;
pub mod registry;
pub mod store;
pub mod value;

pub use component::{ComponentHandle, ComponentKey, Field, InstanceId, Persistent, SceneGraph};
pub use config::KeepsakeConfig;
pub use container::{SavedComponent, SavedContainer, SavedField};
pub use error::{KeepsakeError, Result};
pub use manager::{LoadSummary, SaveManager, SaveSummary};
pub use marker::FieldMarker;
pub use registry::ComponentRegistry;
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use value::{Persist, Value, ValueKind};

#[doc(hidden)]
pub use serde_json as __serde_json;
