//! Particle repulsion force and Jacobian assembly.
//!
//! Short-range pairwise springs keep the growing surface from
//! self-intersecting. Candidate pairs come from a [`SpatialGrid`] rebuilt
//! from current positions on every pass; only pairs closer than the grid
//! resolution interact, and within that cutoff only pairs compressed
//! below their adjacency-dependent rest distance contribute force.

use serde::{Deserialize, Serialize};
use thallo_math::sparse::TripletList;
use thallo_math::{outer, Mat3, Vec3};
use thallo_mesh::Geometry;
use thallo_types::constants::{DEFAULT_REPULSE_STIFFNESS, DEGENERATE_LENGTH_THRESHOLD};
use thallo_types::{Scalar, ThalloError, ThalloResult, VertexId};

use crate::spatial_hash::SpatialGrid;

/// Configuration for the particle-repulsion assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepulsionConfig {
    /// Spring stiffness `k`.
    pub stiffness: Scalar,

    /// Rest distance for 1-ring-adjacent pairs, as a fraction of the
    /// grid resolution. Adjacent vertices are allowed closer.
    pub adjacent_rest_scale: Scalar,

    /// Rest distance for non-adjacent pairs, as a fraction of the grid
    /// resolution. Non-adjacent vertices are kept farther apart.
    pub separation_rest_scale: Scalar,

    /// Pairs where either endpoint's growth factor falls below this
    /// threshold are skipped, freezing ungrown regions. `None` disables
    /// the filter.
    pub freeze_threshold: Option<Scalar>,
}

impl Default for RepulsionConfig {
    fn default() -> Self {
        Self {
            stiffness: DEFAULT_REPULSE_STIFFNESS,
            adjacent_rest_scale: 0.9,
            separation_rest_scale: 1.1,
            freeze_threshold: Some(0.5),
        }
    }
}

/// Force vector and Jacobian produced by one assembly pass.
#[derive(Debug, Clone)]
pub struct RepulsionOutput {
    /// Per-vertex repulsive force.
    pub forces: Vec<Vec3>,
    /// Jacobian of the force with respect to vertex positions, as 3×3
    /// blocks in a `3n × 3n` triplet accumulator.
    pub jacobian: TripletList,
    /// Number of directed interactions (each violating pair is visited
    /// once from each endpoint).
    pub interactions: usize,
}

/// Pairwise short-range repulsion assembler.
#[derive(Debug, Clone, Default)]
pub struct ParticleRepulsion {
    /// Assembly tunables.
    pub config: RepulsionConfig,
}

impl ParticleRepulsion {
    /// Creates an assembler with the given configuration.
    pub fn new(config: RepulsionConfig) -> Self {
        Self { config }
    }

    /// Assembles the repulsive force vector and Jacobian from current
    /// positions.
    ///
    /// `resolution` is the characteristic edge length ℓ: it sets the
    /// grid cell size, the interaction cutoff, and the base for both
    /// rest-distance scales. `growth_factors`, when given with a
    /// configured freeze threshold, exempts frozen pairs.
    ///
    /// The force on a violating pair's vertex `v` is `k·delta·û` with
    /// `delta = lij − l0 < 0` and `û` pointing from `v` toward the
    /// neighbor, so the force pushes the pair apart. The per-pair
    /// Jacobian block `K = k·(1 − l0/lij)·I + k·(l0/lij)·û ûᵀ` enters the
    /// global matrix as `−K` on the diagonal block and `+K` on the
    /// off-diagonal block of each visit.
    pub fn assemble(
        &self,
        geometry: &Geometry,
        resolution: Scalar,
        growth_factors: Option<&[Scalar]>,
    ) -> ThalloResult<RepulsionOutput> {
        if resolution <= 0.0 {
            return Err(ThalloError::InvalidConfig(format!(
                "Repulsion resolution must be positive, got {resolution}"
            )));
        }
        let n = geometry.vertex_count();
        if let Some(factors) = growth_factors {
            if factors.len() != n {
                return Err(ThalloError::InvalidConfig(format!(
                    "Growth factor count ({}) != vertex count ({})",
                    factors.len(),
                    n
                )));
            }
        }

        let frozen = |v: VertexId| match (growth_factors, self.config.freeze_threshold) {
            (Some(factors), Some(threshold)) => factors[v.index()] < threshold,
            _ => false,
        };

        let mut forces = vec![Vec3::ZERO; n];
        let mut jacobian = TripletList::new(3 * n, 3 * n);
        let mut interactions = 0usize;

        let grid = SpatialGrid::from_positions(resolution, geometry.positions());

        for v in geometry.mesh.vertex_ids() {
            if frozen(v) {
                continue;
            }
            let p = geometry.position(v);

            for id in grid.neighbors(p) {
                let w = VertexId(id);
                if w == v || frozen(w) {
                    continue;
                }
                let diff = geometry.position(w) - p;
                let lij = diff.length();
                if lij >= resolution {
                    continue;
                }
                if lij < DEGENERATE_LENGTH_THRESHOLD {
                    return Err(ThalloError::DegenerateGeometry(format!(
                        "Vertices {} and {} are coincident (distance {lij:e})",
                        v.0, w.0
                    )));
                }

                let rest_scale = if geometry.mesh.vertices_adjacent(v, w) {
                    self.config.adjacent_rest_scale
                } else {
                    self.config.separation_rest_scale
                };
                let l0 = resolution * rest_scale;
                let delta = lij - l0;
                if delta >= 0.0 {
                    continue;
                }

                let k = self.config.stiffness;
                let unit = diff / lij;
                forces[v.index()] += unit * (k * delta);

                let ratio = l0 / lij;
                let block = Mat3::IDENTITY * (k * (1.0 - ratio)) + outer(unit, unit) * (k * ratio);
                jacobian.push_block(v.index(), v.index(), &(-block));
                jacobian.push_block(v.index(), w.index(), &block);
                interactions += 1;
            }
        }

        Ok(RepulsionOutput {
            forces,
            jacobian,
            interactions,
        })
    }
}
