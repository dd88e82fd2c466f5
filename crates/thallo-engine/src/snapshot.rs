//! Serializable captures of engine state.

use serde::{Deserialize, Serialize};
use thallo_math::Vec3;
use thallo_mesh::Geometry;
use thallo_types::{Scalar, ThalloError, ThalloResult};

/// A point-in-time capture of the growing surface.
///
/// Positions and triangles are stored as plain arrays so snapshots stay
/// readable by external tools; the half-edge structure is rebuilt on
/// restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Growth steps completed when the capture was taken.
    pub step: u64,
    /// Vertex positions.
    pub positions: Vec<[Scalar; 3]>,
    /// Triangles as vertex-index triples, counter-clockwise.
    pub triangles: Vec<[u32; 3]>,
    /// Per-vertex growth factors (empty before the first field update).
    pub growth_factors: Vec<Scalar>,
}

impl EngineSnapshot {
    /// Captures `geometry` and `factors` after `step` completed steps.
    pub fn capture(step: u64, geometry: &Geometry, factors: &[Scalar]) -> Self {
        Self {
            step,
            positions: geometry
                .positions()
                .iter()
                .map(|p| [p.x, p.y, p.z])
                .collect(),
            triangles: geometry.triangle_list(),
            growth_factors: factors.to_vec(),
        }
    }

    /// Rebuilds a [`Geometry`] from the captured arrays.
    pub fn restore(&self) -> ThalloResult<Geometry> {
        let positions = self
            .positions
            .iter()
            .map(|&[x, y, z]| Vec3::new(x, y, z))
            .collect();
        Geometry::from_faces(positions, &self.triangles)
    }

    /// Encodes the snapshot with bincode.
    pub fn encode(&self) -> ThalloResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| ThalloError::Serialization(e.to_string()))
    }

    /// Decodes a snapshot produced by [`EngineSnapshot::encode`].
    pub fn decode(bytes: &[u8]) -> ThalloResult<Self> {
        bincode::deserialize(bytes).map_err(|e| ThalloError::Serialization(e.to_string()))
    }
}
