//! # thallo-contact
//!
//! Collision avoidance for growing surfaces, split into three parts:
//! 1. **Spatial hash grid** — uniform-grid binning with 27-cell queries
//! 2. **Particle repulsion** — short-range pairwise force/Jacobian assembly
//! 3. **Repulsive surfaces** — implicit obstacles (plane, point cloud)
//!
//! The grid is transient: assemblers rebuild it from current positions on
//! every pass and drop it when the pass ends.

pub mod repulsion;
pub mod spatial_hash;
pub mod surfaces;

pub use repulsion::{ParticleRepulsion, RepulsionConfig, RepulsionOutput};
pub use spatial_hash::SpatialGrid;
pub use surfaces::{RepulsivePlane, RepulsivePointCloud, RepulsiveSurface};
