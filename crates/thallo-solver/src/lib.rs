//! # thallo-solver
//!
//! Elastic response for growing surfaces, in two parts:
//! 1. **Discrete-shells bending** — hinge forces over interior edges with
//!    an analytic Gauss-Newton Jacobian
//! 2. **Semi-implicit integrator** — couples bending, particle repulsion,
//!    and obstacle forces through one sparse velocity solve per iteration,
//!    with a QR fallback for indefinite systems
//!
//! The integrator owns its assemblers; callers supply rest positions and
//! growth factors per call because both change as edges split.

pub mod bending;
pub mod integrator;

pub use bending::{dihedral_angle, BendingConfig, BendingOutput, DiscreteShells};
pub use integrator::{
    IntegrationReport, Integrator, IntegratorConfig, IntegratorMode, IterationReport, StepContext,
};
