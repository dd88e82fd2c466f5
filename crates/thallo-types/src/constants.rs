//! Simulation defaults and numerical thresholds.

use crate::scalar::Scalar;

/// Default integration timestep.
pub const DEFAULT_TIME_STEP: Scalar = 0.01;

/// Default number of integrator iterations per growth step.
pub const DEFAULT_ITERATIONS: u32 = 1;

/// Default bending stiffness for the discrete-shells energy.
pub const DEFAULT_BEND_STIFFNESS: Scalar = 80.0;

/// Default stiffness for pairwise particle repulsion.
pub const DEFAULT_REPULSE_STIFFNESS: Scalar = 1.0;

/// Default stiffness for repulsive obstacle surfaces.
pub const DEFAULT_SURFACE_STIFFNESS: Scalar = 100.0;

/// Default fade exponent parameter for the growth smooth-step.
pub const DEFAULT_GROWTH_FADE: Scalar = 0.5;

/// Default breakpoint of the growth smooth-step.
pub const DEFAULT_GROWTH_ZONE: Scalar = 0.5;

/// Default multiplier applied to grown edge lengths.
pub const DEFAULT_GROWTH_SCALE: Scalar = 2.0;

/// Epsilon for floating-point comparisons.
pub const EPSILON: Scalar = 1.0e-12;

/// Length below which an edge is considered degenerate.
pub const DEGENERATE_LENGTH_THRESHOLD: Scalar = 1.0e-10;

/// Area below which a face is considered degenerate.
pub const DEGENERATE_AREA_THRESHOLD: Scalar = 1.0e-14;

/// Per-vertex bending forces below this magnitude are zeroed to keep
/// the force vector sparse.
pub const DEFAULT_FORCE_CUTOFF: Scalar = 1.0e-9;

/// Default strength of the per-step Laplacian smoothing pass.
pub const DEFAULT_SMOOTHING_SCALE: Scalar = 0.1;
