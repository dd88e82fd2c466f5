//! Source selection for disk-like scenarios.

use thallo_mesh::Geometry;
use thallo_types::{ThalloError, ThalloResult, VertexId};

/// Picks `count` evenly strided vertices along the first boundary loop.
///
/// `count == 0` or `count >=` loop length returns the whole loop. The
/// stride remainder is spread across the walk, one extra step at
/// regular intervals, instead of piling up as one long gap at the end.
pub fn boundary_sources(geometry: &Geometry, count: usize) -> ThalloResult<Vec<VertexId>> {
    let ring = geometry.mesh.boundary_vertices();
    if ring.is_empty() {
        return Err(ThalloError::InvalidMesh(
            "Mesh has no boundary loop to seed growth sources from".into(),
        ));
    }
    if count == 0 || count >= ring.len() {
        return Ok(ring);
    }

    let stride = ring.len() / count;
    let mut leftover = ring.len() % count;
    let leftover_stride = if leftover > 0 {
        count.div_ceil(leftover)
    } else {
        0
    };

    let mut sources = Vec::with_capacity(count);
    let mut i = 0;
    while i < ring.len() && sources.len() < count {
        if leftover > 0 && sources.len() % leftover_stride == 0 {
            i += 1;
            leftover -= 1;
        }
        sources.push(ring[i]);
        i += stride;
    }
    Ok(sources)
}
