//! # thallo-growth
//!
//! Geodesic-driven edge growth, split into three parts:
//! 1. **Geodesic solvers** — per-vertex distance fields from a source set
//! 2. **Growth field** — normalized, smooth-stepped per-vertex factors
//! 3. **Edge growth** — mark-then-split pass driving mesh refinement
//!
//! Growth factors feed back into the rest of the engine: they modulate
//! repulsion freezing, integrator updates, and smoothing strength.

pub mod geodesic;
pub mod growth;
pub mod sources;

pub use geodesic::{GeodesicSolver, GraphGeodesics};
pub use growth::{smooth_step, EdgeBlend, EdgeGrowth, GrowthConfig, GrowthField};
pub use sources::boundary_sources;
