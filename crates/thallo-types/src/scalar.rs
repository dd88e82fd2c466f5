//! Scalar type alias for the simulation.
//!
//! Double precision throughout: the growth pipeline accumulates small
//! per-step displacements over thousands of steps, and the integrator
//! tests pin hand-computed values to 1e-9.

/// The floating-point type used throughout the simulation.
///
/// Set to `f64` for CPU double-precision mode. A single-precision
/// build would need the tolerances in the test suites loosened.
pub type Scalar = f64;
