//! Positions layered over the connectivity arena.
//!
//! [`Geometry`] pairs a [`HalfEdgeMesh`] with one `Vec3` per vertex and
//! provides the metric queries the physics stages need: edge vectors and
//! lengths, face normals and areas, corner angles. Mutators that change
//! the vertex count ([`Geometry::split_edge`]) keep the position array in
//! lockstep with the arena.

use serde::{Deserialize, Serialize};
use thallo_math::Vec3;
use thallo_types::{
    EdgeId, FaceId, HalfedgeId, Scalar, ThalloError, ThalloResult, VertexId,
    constants::EPSILON,
};

use crate::halfedge::HalfEdgeMesh;
use crate::mutation::EdgeSplit;

/// A triangle surface: half-edge connectivity plus vertex positions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    /// Connectivity. Read-only for callers; mutate through the
    /// [`Geometry`] methods so positions stay in sync.
    pub mesh: HalfEdgeMesh,
    positions: Vec<Vec3>,
}

impl Geometry {
    /// Pairs an existing mesh with a position array.
    pub fn new(mesh: HalfEdgeMesh, positions: Vec<Vec3>) -> ThalloResult<Self> {
        if positions.len() != mesh.vertex_count() {
            return Err(ThalloError::InvalidMesh(format!(
                "Position count ({}) != vertex count ({})",
                positions.len(),
                mesh.vertex_count()
            )));
        }
        Ok(Self { mesh, positions })
    }

    /// Builds connectivity from a triangle list and pairs it with
    /// `positions`.
    pub fn from_faces(positions: Vec<Vec3>, triangles: &[[u32; 3]]) -> ThalloResult<Self> {
        let mesh = HalfEdgeMesh::build(positions.len(), triangles)?;
        Self::new(mesh, positions)
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    /// Returns the number of edges.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.mesh.edge_count()
    }

    /// Returns the number of faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.mesh.face_count()
    }

    /// Returns the position of vertex `v`.
    #[inline]
    pub fn position(&self, v: VertexId) -> Vec3 {
        self.positions[v.index()]
    }

    /// Sets the position of vertex `v`.
    #[inline]
    pub fn set_position(&mut self, v: VertexId, p: Vec3) {
        self.positions[v.index()] = p;
    }

    /// Returns all positions, indexed by vertex id.
    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Mutable view of all positions. The slice length is fixed, so the
    /// one-position-per-vertex invariant cannot be broken through it.
    #[inline]
    pub fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }

    /// Vector along half-edge `h`, from its origin to its head.
    #[inline]
    pub fn halfedge_vector(&self, h: HalfedgeId) -> Vec3 {
        self.position(self.mesh.head(h)) - self.position(self.mesh.origin(h))
    }

    /// Vector along the representative half-edge of `e`.
    #[inline]
    pub fn edge_vector(&self, e: EdgeId) -> Vec3 {
        self.halfedge_vector(self.mesh.edge_halfedge(e))
    }

    /// Length of edge `e`.
    #[inline]
    pub fn edge_length(&self, e: EdgeId) -> Scalar {
        self.edge_vector(e).length()
    }

    /// Midpoint of edge `e`.
    #[inline]
    pub fn edge_midpoint(&self, e: EdgeId) -> Vec3 {
        let [v0, v1] = self.mesh.edge_vertices(e);
        (self.position(v0) + self.position(v1)) * 0.5
    }

    /// Unit normal and area of face `f` in one cross product.
    ///
    /// The cross product of two face edges has magnitude `2 × area`;
    /// a degenerate face yields a zero normal and zero area.
    pub fn face_normal_area(&self, f: FaceId) -> (Vec3, Scalar) {
        let [h0, h1, _] = self.mesh.face_halfedges(f);
        let cross = self.halfedge_vector(h0).cross(self.halfedge_vector(h1));
        let len = cross.length();
        if len < EPSILON {
            return (Vec3::ZERO, 0.0);
        }
        (cross / len, 0.5 * len)
    }

    /// Unit normal of face `f` (zero for a degenerate face).
    #[inline]
    pub fn face_normal(&self, f: FaceId) -> Vec3 {
        self.face_normal_area(f).0
    }

    /// Area of face `f`.
    #[inline]
    pub fn face_area(&self, f: FaceId) -> Scalar {
        self.face_normal_area(f).1
    }

    /// Interior angle at the origin of `h`, between `h` and the face
    /// edge arriving there. Returns 0 for a degenerate corner.
    pub fn corner_angle(&self, h: HalfedgeId) -> Scalar {
        let u = self.halfedge_vector(h);
        let w = -self.halfedge_vector(self.mesh.prev(h));
        let denom = u.length() * w.length();
        if denom < EPSILON {
            return 0.0;
        }
        (u.dot(w) / denom).clamp(-1.0, 1.0).acos()
    }

    /// Mean length over all edges (0 for an edgeless mesh).
    pub fn mean_edge_length(&self) -> Scalar {
        if self.mesh.edge_count() == 0 {
            return 0.0;
        }
        let total: Scalar = self.mesh.edge_ids().map(|e| self.edge_length(e)).sum();
        total / self.mesh.edge_count() as Scalar
    }

    /// Splits `edge` at its midpoint. The new vertex is placed at the
    /// current midpoint of the edge's endpoints.
    pub fn split_edge(&mut self, edge: EdgeId) -> ThalloResult<EdgeSplit> {
        let midpoint = self.edge_midpoint(edge);
        let split = self.mesh.split_edge_topology(edge)?;
        self.positions.push(midpoint);
        Ok(split)
    }

    /// Rotates `edge` inside its two incident triangles. Positions are
    /// untouched. Returns `false` when the edge is not flippable.
    #[inline]
    pub fn flip_edge(&mut self, edge: EdgeId) -> bool {
        self.mesh.flip_edge_topology(edge)
    }

    /// True if `edge` can be flipped without breaking the mesh.
    #[inline]
    pub fn is_flippable(&self, edge: EdgeId) -> bool {
        self.mesh.is_flippable(edge)
    }

    /// Triangle list in build order, one `[v0, v1, v2]` per face.
    pub fn triangle_list(&self) -> Vec<[u32; 3]> {
        self.mesh
            .face_ids()
            .map(|f| {
                let [a, b, c] = self.mesh.face_vertices(f);
                [a.0, b.0, c.0]
            })
            .collect()
    }

    /// Validates connectivity and the position/vertex pairing.
    pub fn validate(&self) -> ThalloResult<()> {
        self.mesh.validate()?;
        if self.positions.len() != self.mesh.vertex_count() {
            return Err(ThalloError::InvariantViolation(format!(
                "Position count ({}) != vertex count ({})",
                self.positions.len(),
                self.mesh.vertex_count()
            )));
        }
        for (i, p) in self.positions.iter().enumerate() {
            if !p.is_finite() {
                return Err(ThalloError::InvariantViolation(format!(
                    "Vertex {} has a non-finite position",
                    i
                )));
            }
        }
        Ok(())
    }
}
