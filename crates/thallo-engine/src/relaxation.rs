//! Post-integration mesh relaxation.
//!
//! Two passes run after the solver each growth step. Rebalancing
//! rotates edges toward the Delaunay criterion so triangles stay well
//! shaped as the surface stretches, and smoothing nudges vertices
//! toward the barycenter of their neighbors to even out spacing.

use std::f64::consts::PI;

use thallo_math::Vec3;
use thallo_mesh::Geometry;
use thallo_types::{Scalar, ThalloError, ThalloResult};

/// One Delaunay sweep over the mesh.
///
/// Visits every edge present when the sweep starts and rotates each
/// edge whose two wing angles sum past π. Edges the mesh refuses to
/// flip (boundary, shared wings, low valence) are skipped. Returns
/// the number of flips performed.
pub fn rebalance(geometry: &mut Geometry) -> usize {
    let edges: Vec<_> = geometry.mesh.edge_ids().collect();
    let mut flips = 0;
    for e in edges {
        if !geometry.is_flippable(e) {
            continue;
        }
        let he = geometry.mesh.edge_halfedge(e);
        let tw = geometry.mesh.twin(he);
        // Angle opposite the edge lives at the origin of each prev.
        let opposite = geometry.corner_angle(geometry.mesh.prev(he))
            + geometry.corner_angle(geometry.mesh.prev(tw));
        if opposite > PI && geometry.flip_edge(e) {
            flips += 1;
        }
    }
    flips
}

/// One Laplacian smoothing pass.
///
/// Each vertex moves toward the barycenter of its neighbors, scaled by
/// `scale` and its growth factor, so mature regions settle while the
/// active rim keeps its shape. Boundary vertices average only their
/// boundary neighbors and move at a tenth of the interior rate, which
/// keeps the rim from caving inward. Updates are applied in place, so
/// later vertices see earlier moves within the same pass.
pub fn smooth(geometry: &mut Geometry, factors: &[Scalar], scale: Scalar) -> ThalloResult<()> {
    let n = geometry.vertex_count();
    if factors.len() != n {
        return Err(ThalloError::InvalidConfig(format!(
            "Growth factor count ({}) != vertex count ({n})",
            factors.len()
        )));
    }

    for v in geometry.mesh.vertex_ids() {
        let on_boundary = geometry.mesh.vertex_on_boundary(v);
        let mut barycenter = Vec3::ZERO;
        let mut counted = 0usize;
        for w in geometry.mesh.adjacent_vertices(v) {
            if on_boundary && !geometry.mesh.vertex_on_boundary(w) {
                continue;
            }
            barycenter += geometry.position(w);
            counted += 1;
        }
        if counted == 0 {
            continue;
        }

        let mut offset = barycenter / counted as Scalar - geometry.position(v);
        if on_boundary {
            offset *= 0.1;
        }
        offset *= scale * factors[v.index()];
        geometry.set_position(v, geometry.position(v) + offset);
    }
    Ok(())
}
