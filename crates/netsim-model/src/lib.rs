//! Netsim Scenario Model
//!
//! Typed in-memory model of a recorded network-simulation scenario.
//!
//! # Contents
//!
//! - **Static entities**: nodes, buildings, decorations, the global
//!   configuration block
//! - **Containers**: XY series, category series, series collections and
//!   log streams, grown by append events
//! - **Events**: time-stamped forward changes and the inverse records
//!   that undo them
//!
//! This crate only holds data. Parsing lives in `netsim-parser`; applying
//! events to live state lives in `netsim-vis`.

mod color;
mod entity;
mod event;
mod ids;
mod series;
mod vec3;

pub use color::Color;
pub use entity::{Building, Configuration, Decoration, Node, DEFAULT_MS_PER_FRAME};
pub use event::{Channel, Event, EventKind, InverseEvent};
pub use ids::{BuildingId, DecorationId, DependentId, NodeId, SeriesId, StreamId};
pub use series::{Category, CategoryValueSeries, Connection, LogStream, Series, SeriesCollection, XySeries};
pub use vec3::{Bounds, Vec3};
