//! Ready-made starting configurations for growth runs.

use thallo_growth::boundary_sources;
use thallo_math::Vec3;
use thallo_mesh::generators::hex_disk;
use thallo_mesh::Geometry;
use thallo_types::{Scalar, ThalloResult, VertexId};

/// A starting mesh bundled with its growth sources.
#[derive(Debug)]
pub struct DiskScenario {
    /// Flat hex-lattice disk.
    pub geometry: Geometry,
    /// Growth sources spread around the rim.
    pub sources: Vec<VertexId>,
    /// Lattice edge length, the natural repulsion resolution.
    pub edge_length: Scalar,
}

/// Builds a flat disk of `rings` hexagonal rings with `source_count`
/// growth sources strided evenly around the rim.
///
/// `source_count = 0` seeds every rim vertex.
pub fn disk_scenario(
    rings: usize,
    edge_length: Scalar,
    source_count: usize,
) -> ThalloResult<DiskScenario> {
    let geometry = hex_disk(rings, edge_length)?;
    let sources = boundary_sources(&geometry, source_count)?;
    Ok(DiskScenario {
        geometry,
        sources,
        edge_length,
    })
}

/// Lifts every rim vertex by `height` so the disk leaves its plane and
/// bending has something to relax against.
pub fn raise_rim(geometry: &mut Geometry, height: Scalar) {
    for v in geometry.mesh.boundary_vertices() {
        let p = geometry.position(v);
        geometry.set_position(v, p + Vec3::new(0.0, 0.0, height));
    }
}
