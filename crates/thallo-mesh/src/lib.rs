//! # thallo-mesh
//!
//! Mutable half-edge mesh for the thallo growth engine.
//!
//! ## Key Types
//!
//! - [`HalfEdgeMesh`] — Connectivity as an index arena (next/prev/twin/
//!   vertex/edge/face stored as ids, never pointers). Boundary half-edges
//!   are explicit, with `face == None`, so navigation is total.
//! - [`Geometry`] — Connectivity plus per-vertex positions, with the
//!   geometric queries (lengths, areas, normals, corner angles) and the
//!   position-aware split/flip mutators.
//! - Procedural generators for test meshes (hex-lattice disks, quad grids).
//!
//! Split and flip are index-rewiring operations: ids are append-only
//! stable and no entity is ever removed.

pub mod generators;
pub mod geometry;
pub mod halfedge;
pub mod mutation;

pub use geometry::Geometry;
pub use halfedge::HalfEdgeMesh;
pub use mutation::EdgeSplit;
