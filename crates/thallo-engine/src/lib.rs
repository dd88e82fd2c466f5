//! # thallo-engine
//!
//! The growth loop. Each step grows edges from the geodesic field,
//! relaxes the surface with the semi-implicit solver, rebalances the
//! triangulation with Delaunay flips, and smooths vertex spacing,
//! emitting structured events along the way.

pub mod engine;
pub mod events;
pub mod relaxation;
pub mod scenarios;
pub mod sinks;
pub mod snapshot;

pub use engine::{EngineConfig, GrowthEngine, StepReport};
pub use events::{GrowthEvent, GrowthEventKind};
pub use scenarios::{disk_scenario, raise_rim, DiskScenario};
pub use sinks::{EventSink, TracingSink, VecSink};
pub use snapshot::EngineSnapshot;
