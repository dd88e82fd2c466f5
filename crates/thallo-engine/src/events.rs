//! Growth-step event types.
//!
//! Structured events emitted by the engine at fixed points in each
//! growth step. Events are lightweight value types that carry just
//! enough data to be useful for monitoring and debugging.

use serde::{Deserialize, Serialize};
use thallo_types::Scalar;

/// An event emitted by the growth engine.
///
/// Events are tagged with the growth step they belong to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthEvent {
    /// Growth step number (0-indexed).
    pub step: u64,
    /// Event payload.
    pub kind: GrowthEventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GrowthEventKind {
    /// Growth step started.
    StepBegin {
        /// Vertex count going in.
        vertices: usize,
        /// Edge count going in.
        edges: usize,
    },

    /// Edge growth finished splitting.
    EdgesSplit {
        /// Edges split this step.
        count: usize,
    },

    /// Integrator iteration completed.
    IntegratorIteration {
        /// Iteration number within the step.
        iteration: u32,
        /// Back end that produced the velocity update.
        solver: String,
        /// Largest per-vertex position change this iteration.
        max_displacement: Scalar,
    },

    /// Delaunay rebalancing finished flipping.
    EdgesFlipped {
        /// Edges flipped this step.
        count: usize,
    },

    /// Growth step completed.
    StepEnd {
        /// Vertex count going out.
        vertices: usize,
        /// Edge count going out.
        edges: usize,
        /// Largest per-vertex position change over the whole step.
        max_displacement: Scalar,
    },
}

impl GrowthEvent {
    /// Creates a new event for the given step.
    pub fn new(step: u64, kind: GrowthEventKind) -> Self {
        Self { step, kind }
    }
}
