//! Per-vertex distance fields from a source set.
//!
//! The growth process only consumes distance values, so the solver is a
//! seam: heavier schemes (heat method) can slot in from outside, while
//! [`GraphGeodesics`] keeps the pipeline self-contained.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use thallo_mesh::Geometry;
use thallo_types::{Scalar, ThalloError, ThalloResult, VertexId};

/// Strategy for computing per-vertex distances to a set of source
/// vertices.
pub trait GeodesicSolver: Send {
    /// Distance from every vertex to the nearest source.
    ///
    /// Sources get distance zero; vertices unreachable from any source
    /// keep `Scalar::INFINITY`.
    fn distances(&self, geometry: &Geometry, sources: &[VertexId]) -> ThalloResult<Vec<Scalar>>;

    /// Human-readable solver name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Dijkstra over the edge graph.
///
/// Distances follow mesh edges rather than true surface geodesics,
/// which is enough for the monotone fields growth needs.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphGeodesics;

#[derive(Clone, PartialEq)]
struct QueueNode {
    dist: Scalar,
    vertex: VertexId,
}

impl Eq for QueueNode {}

impl Ord for QueueNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed on distance so the max-heap pops the nearest vertex.
        other
            .dist
            .partial_cmp(&self.dist)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for QueueNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl GeodesicSolver for GraphGeodesics {
    fn distances(&self, geometry: &Geometry, sources: &[VertexId]) -> ThalloResult<Vec<Scalar>> {
        let n = geometry.vertex_count();
        if sources.is_empty() {
            return Err(ThalloError::InvalidConfig(
                "Geodesic source set is empty".into(),
            ));
        }
        for &s in sources {
            if s.index() >= n {
                return Err(ThalloError::InvalidConfig(format!(
                    "Geodesic source {} out of range for {} vertices",
                    s.0, n
                )));
            }
        }

        let mut dist = vec![Scalar::INFINITY; n];
        let mut heap = BinaryHeap::new();
        for &s in sources {
            dist[s.index()] = 0.0;
            heap.push(QueueNode {
                dist: 0.0,
                vertex: s,
            });
        }

        while let Some(node) = heap.pop() {
            // Stale entry: the vertex was settled through a shorter path.
            if node.dist > dist[node.vertex.index()] {
                continue;
            }
            for h in geometry.mesh.outgoing_halfedges(node.vertex) {
                let w = geometry.mesh.head(h);
                let next = node.dist + geometry.halfedge_vector(h).length();
                if next < dist[w.index()] {
                    dist[w.index()] = next;
                    heap.push(QueueNode {
                        dist: next,
                        vertex: w,
                    });
                }
            }
        }

        Ok(dist)
    }

    fn name(&self) -> &'static str {
        "graph_geodesics"
    }
}
