//! # keepsake-world: Host Integration for Keepsake
//!
//! This crate shows how a game hosts the engine-agnostic `keepsake-core`
//! persistence layer: a small object graph that owns components, the events
//! it raises, and a handful of sample components.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │                 Host game                 │
//! │  ┌────────────────────────────────────┐  │
//! │  │          keepsake-world            │  │
//! │  │  ┌─────────┐  ┌─────────────────┐  │  │
//! │  │  │  World  │─▶│ WorldEvent      │  │  │
//! │  │  └────┬────┘  └────────┬────────┘  │  │
//! │  │       │ SceneGraph     │ dispatch  │  │
//! │  │       ▼                ▼           │  │
//! │  │    ┌──────────────────────────┐    │  │
//! │  │    │  keepsake-core           │    │  │
//! │  │    │  SaveManager → Store     │    │  │
//! │  │    └──────────────────────────┘    │  │
//! │  └────────────────────────────────────┘  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `world`: object graph with deterministic instance ids
//! - `events`: reload / exit events routed to the save manager
//! - `components`: sample persisted components
//! - `logging`: tracing subscriber setup

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod components;
pub mod events;
pub mod logging;
pub mod world;

pub use events::{dispatch, EventOutcome, WorldEvent};
pub use logging::init_tracing;
pub use world::World;
