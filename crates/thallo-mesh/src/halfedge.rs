//! Half-edge connectivity arena.
//!
//! Entities live in flat arrays addressed by the id newtypes from
//! `thallo-types`. Every half-edge has a twin; half-edges bounding a hole
//! carry `face == None` and are chained into boundary loops, which keeps
//! `next`/`prev` navigation total on meshes with boundary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thallo_types::{EdgeId, FaceId, HalfedgeId, ThalloError, ThalloResult, VertexId};

/// One directed side of an edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Halfedge {
    /// Oppositely directed half-edge of the same edge.
    pub twin: HalfedgeId,
    /// Next half-edge around the face (or around the boundary loop).
    pub next: HalfedgeId,
    /// Previous half-edge around the face (or around the boundary loop).
    pub prev: HalfedgeId,
    /// Origin vertex.
    pub vertex: VertexId,
    /// Parent edge.
    pub edge: EdgeId,
    /// Incident face; `None` for boundary half-edges.
    pub face: Option<FaceId>,
}

/// Vertex record: one outgoing half-edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vertex {
    pub halfedge: HalfedgeId,
}

/// Edge record: one representative half-edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Edge {
    pub halfedge: HalfedgeId,
}

/// Face record: one half-edge of its cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Face {
    pub halfedge: HalfedgeId,
}

/// Half-edge mesh connectivity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HalfEdgeMesh {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) halfedges: Vec<Halfedge>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) faces: Vec<Face>,
}

impl HalfEdgeMesh {
    /// Builds connectivity from a triangle soup.
    ///
    /// Fails on out-of-range indices, repeated vertices within a face,
    /// edges with more than two incident faces (or inconsistent winding),
    /// non-manifold boundary vertices, and vertices referenced by no face.
    pub fn build(vertex_count: usize, triangles: &[[u32; 3]]) -> ThalloResult<Self> {
        let sentinel = HalfedgeId(u32::MAX);

        let mut vertices = vec![
            Vertex {
                halfedge: sentinel
            };
            vertex_count
        ];
        let mut halfedges: Vec<Halfedge> = Vec::with_capacity(triangles.len() * 3);
        let mut edges: Vec<Edge> = Vec::new();
        let mut faces: Vec<Face> = Vec::with_capacity(triangles.len());

        // Directed edge -> half-edge, used for twin linking and manifold checks.
        let mut directed: HashMap<(u32, u32), HalfedgeId> = HashMap::new();

        for (f, tri) in triangles.iter().enumerate() {
            let [a, b, c] = *tri;
            for &v in tri {
                if v as usize >= vertex_count {
                    return Err(ThalloError::InvalidMesh(format!(
                        "face {f} references vertex {v} but only {vertex_count} vertices exist"
                    )));
                }
            }
            if a == b || b == c || c == a {
                return Err(ThalloError::InvalidMesh(format!(
                    "face {f} repeats a vertex ({a}, {b}, {c})"
                )));
            }

            let base = halfedges.len() as u32;
            let ids = [HalfedgeId(base), HalfedgeId(base + 1), HalfedgeId(base + 2)];
            let origins = [a, b, c];
            for k in 0..3 {
                let from = origins[k];
                let to = origins[(k + 1) % 3];
                if directed.insert((from, to), ids[k]).is_some() {
                    return Err(ThalloError::InvalidMesh(format!(
                        "directed edge ({from}, {to}) appears twice: non-manifold \
                         edge or inconsistent winding"
                    )));
                }
                halfedges.push(Halfedge {
                    twin: sentinel,
                    next: ids[(k + 1) % 3],
                    prev: ids[(k + 2) % 3],
                    vertex: VertexId(from),
                    edge: EdgeId(u32::MAX),
                    face: Some(FaceId(f as u32)),
                });
                if vertices[from as usize].halfedge == sentinel {
                    vertices[from as usize].halfedge = ids[k];
                }
            }
            faces.push(Face { halfedge: ids[0] });
        }

        for (v, vert) in vertices.iter().enumerate() {
            if vert.halfedge == sentinel {
                return Err(ThalloError::InvalidMesh(format!(
                    "vertex {v} is not referenced by any face"
                )));
            }
        }

        // Twin linking in id order so edge ids are deterministic.
        let interior_count = halfedges.len();
        for h in 0..interior_count {
            if halfedges[h].edge != EdgeId(u32::MAX) {
                continue;
            }
            let from = halfedges[h].vertex.0;
            let to = halfedges[halfedges[h].next.index()].vertex.0;
            let edge_id = EdgeId(edges.len() as u32);
            edges.push(Edge {
                halfedge: HalfedgeId(h as u32),
            });
            halfedges[h].edge = edge_id;
            if let Some(&opp) = directed.get(&(to, from)) {
                halfedges[h].twin = opp;
                halfedges[opp.index()].twin = HalfedgeId(h as u32);
                halfedges[opp.index()].edge = edge_id;
            }
        }

        // Boundary half-edges for unmatched directed edges.
        let mut boundary_at: HashMap<u32, HalfedgeId> = HashMap::new();
        for h in 0..interior_count {
            if halfedges[h].twin != sentinel {
                continue;
            }
            let from = halfedges[h].vertex.0;
            let to = halfedges[halfedges[h].next.index()].vertex.0;
            let b_id = HalfedgeId(halfedges.len() as u32);
            halfedges.push(Halfedge {
                twin: HalfedgeId(h as u32),
                next: sentinel,
                prev: sentinel,
                vertex: VertexId(to),
                edge: halfedges[h].edge,
                face: None,
            });
            halfedges[h].twin = b_id;
            if boundary_at.insert(to, b_id).is_some() {
                return Err(ThalloError::InvalidMesh(format!(
                    "vertex {to} has more than one outgoing boundary half-edge \
                     (non-manifold boundary vertex)"
                )));
            }
        }

        // Chain boundary loops: next of a boundary half-edge is the boundary
        // half-edge leaving its head.
        for h in interior_count..halfedges.len() {
            let head = halfedges[halfedges[h].twin.index()].vertex.0;
            let next = *boundary_at.get(&head).ok_or_else(|| {
                ThalloError::InvalidMesh(format!(
                    "boundary loop broken at vertex {head}"
                ))
            })?;
            halfedges[h].next = next;
            halfedges[next.index()].prev = HalfedgeId(h as u32);
        }

        let mesh = Self {
            vertices,
            halfedges,
            edges,
            faces,
        };
        Ok(mesh)
    }

    // ─── Counts and id iteration ──────────────────────────────────

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn halfedge_count(&self) -> usize {
        self.halfedges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> {
        (0..self.vertices.len() as u32).map(VertexId)
    }

    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> {
        (0..self.edges.len() as u32).map(EdgeId)
    }

    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> {
        (0..self.faces.len() as u32).map(FaceId)
    }

    // ─── Navigation ───────────────────────────────────────────────

    #[inline]
    pub fn halfedge(&self, h: HalfedgeId) -> &Halfedge {
        &self.halfedges[h.index()]
    }

    #[inline]
    pub fn twin(&self, h: HalfedgeId) -> HalfedgeId {
        self.halfedges[h.index()].twin
    }

    #[inline]
    pub fn next(&self, h: HalfedgeId) -> HalfedgeId {
        self.halfedges[h.index()].next
    }

    #[inline]
    pub fn prev(&self, h: HalfedgeId) -> HalfedgeId {
        self.halfedges[h.index()].prev
    }

    /// Origin vertex of a half-edge.
    #[inline]
    pub fn origin(&self, h: HalfedgeId) -> VertexId {
        self.halfedges[h.index()].vertex
    }

    /// Head (destination) vertex of a half-edge.
    #[inline]
    pub fn head(&self, h: HalfedgeId) -> VertexId {
        self.halfedges[self.halfedges[h.index()].twin.index()].vertex
    }

    #[inline]
    pub fn edge_of(&self, h: HalfedgeId) -> EdgeId {
        self.halfedges[h.index()].edge
    }

    #[inline]
    pub fn face_of(&self, h: HalfedgeId) -> Option<FaceId> {
        self.halfedges[h.index()].face
    }

    /// Representative half-edge of an edge.
    #[inline]
    pub fn edge_halfedge(&self, e: EdgeId) -> HalfedgeId {
        self.edges[e.index()].halfedge
    }

    /// The interior half-edge of an edge, if any side has a face.
    pub fn interior_halfedge(&self, e: EdgeId) -> Option<HalfedgeId> {
        let h = self.edges[e.index()].halfedge;
        if self.face_of(h).is_some() {
            Some(h)
        } else if self.face_of(self.twin(h)).is_some() {
            Some(self.twin(h))
        } else {
            None
        }
    }

    /// One half-edge of the face's cycle.
    #[inline]
    pub fn face_halfedge(&self, f: FaceId) -> HalfedgeId {
        self.faces[f.index()].halfedge
    }

    /// The three half-edges of a face, in cycle order.
    pub fn face_halfedges(&self, f: FaceId) -> [HalfedgeId; 3] {
        let h0 = self.faces[f.index()].halfedge;
        let h1 = self.next(h0);
        let h2 = self.next(h1);
        [h0, h1, h2]
    }

    /// The three vertices of a face, in cycle order.
    pub fn face_vertices(&self, f: FaceId) -> [VertexId; 3] {
        self.face_halfedges(f).map(|h| self.origin(h))
    }

    /// The two endpoint vertices of an edge.
    pub fn edge_vertices(&self, e: EdgeId) -> [VertexId; 2] {
        let h = self.edges[e.index()].halfedge;
        [self.origin(h), self.head(h)]
    }

    /// One outgoing half-edge of a vertex.
    #[inline]
    pub fn vertex_halfedge(&self, v: VertexId) -> HalfedgeId {
        self.vertices[v.index()].halfedge
    }

    /// Iterates the outgoing half-edges of `v`, boundary half-edge
    /// included. Advancing by `twin(h).next` stays on outgoing
    /// half-edges and crosses holes through the boundary loop.
    pub fn outgoing_halfedges(&self, v: VertexId) -> OutgoingHalfedges<'_> {
        let start = self.vertices[v.index()].halfedge;
        OutgoingHalfedges {
            mesh: self,
            start,
            current: Some(start),
        }
    }

    /// Vertices sharing an edge with `v`.
    pub fn adjacent_vertices(&self, v: VertexId) -> Vec<VertexId> {
        self.outgoing_halfedges(v).map(|h| self.head(h)).collect()
    }

    /// Edges incident to `v`.
    pub fn adjacent_edges(&self, v: VertexId) -> Vec<EdgeId> {
        self.outgoing_halfedges(v).map(|h| self.edge_of(h)).collect()
    }

    /// Number of edges incident to `v`.
    pub fn degree(&self, v: VertexId) -> usize {
        self.outgoing_halfedges(v).count()
    }

    /// True if `a` and `b` share an edge.
    pub fn vertices_adjacent(&self, a: VertexId, b: VertexId) -> bool {
        self.outgoing_halfedges(a).any(|h| self.head(h) == b)
    }

    // ─── Boundary queries ─────────────────────────────────────────

    /// True if the half-edge bounds a hole.
    #[inline]
    pub fn halfedge_on_boundary(&self, h: HalfedgeId) -> bool {
        self.halfedges[h.index()].face.is_none()
    }

    /// True if either side of the edge bounds a hole.
    pub fn edge_on_boundary(&self, e: EdgeId) -> bool {
        let h = self.edges[e.index()].halfedge;
        self.halfedge_on_boundary(h) || self.halfedge_on_boundary(self.twin(h))
    }

    /// True if any half-edge leaving `v` bounds a hole.
    pub fn vertex_on_boundary(&self, v: VertexId) -> bool {
        self.outgoing_halfedges(v)
            .any(|h| self.halfedge_on_boundary(h))
    }

    /// Groups all boundary half-edges into loops, each in walk order.
    pub fn boundary_loops(&self) -> Vec<Vec<HalfedgeId>> {
        let mut seen = vec![false; self.halfedges.len()];
        let mut loops = Vec::new();
        for h in 0..self.halfedges.len() {
            if self.halfedges[h].face.is_some() || seen[h] {
                continue;
            }
            let start = HalfedgeId(h as u32);
            let mut cycle = Vec::new();
            let mut cur = start;
            loop {
                seen[cur.index()] = true;
                cycle.push(cur);
                cur = self.next(cur);
                if cur == start {
                    break;
                }
            }
            loops.push(cycle);
        }
        loops
    }

    /// Ordered vertices of the first boundary loop (empty for closed
    /// meshes).
    pub fn boundary_vertices(&self) -> Vec<VertexId> {
        self.boundary_loops()
            .first()
            .map(|cycle| cycle.iter().map(|&h| self.origin(h)).collect())
            .unwrap_or_default()
    }

    // ─── Validation ───────────────────────────────────────────────

    /// Audits the full connectivity. Cheap enough to run in tests after
    /// every mutation.
    pub fn validate(&self) -> ThalloResult<()> {
        let fail = |msg: String| Err(ThalloError::InvariantViolation(msg));

        for (i, he) in self.halfedges.iter().enumerate() {
            let h = HalfedgeId(i as u32);
            if he.twin.index() >= self.halfedges.len()
                || he.next.index() >= self.halfedges.len()
                || he.prev.index() >= self.halfedges.len()
                || he.vertex.index() >= self.vertices.len()
                || he.edge.index() >= self.edges.len()
            {
                return fail(format!("half-edge {i} references out-of-range ids"));
            }
            if he.twin == h {
                return fail(format!("half-edge {i} is its own twin"));
            }
            if self.twin(he.twin) != h {
                return fail(format!("twin of twin of half-edge {i} is not itself"));
            }
            if self.edge_of(he.twin) != he.edge {
                return fail(format!("half-edge {i} and its twin disagree on edge"));
            }
            if self.prev(he.next) != h || self.next(he.prev) != h {
                return fail(format!("next/prev of half-edge {i} are not inverse"));
            }
            // Head of h must be the origin of its successor, on faces and
            // boundary loops alike.
            if self.origin(he.next) != self.head(h) {
                return fail(format!(
                    "half-edge {i} head does not match successor origin"
                ));
            }
        }

        for (i, face) in self.faces.iter().enumerate() {
            let f = FaceId(i as u32);
            let h0 = face.halfedge;
            if h0.index() >= self.halfedges.len() {
                return fail(format!("face {i} references out-of-range half-edge"));
            }
            let mut cur = h0;
            for _ in 0..3 {
                if self.face_of(cur) != Some(f) {
                    return fail(format!("face {i} cycle contains a foreign half-edge"));
                }
                cur = self.next(cur);
            }
            if cur != h0 {
                return fail(format!("face {i} cycle does not close after 3 steps"));
            }
            let [a, b, c] = self.face_vertices(f);
            if a == b || b == c || c == a {
                return fail(format!("face {i} repeats a vertex"));
            }
        }

        for (i, edge) in self.edges.iter().enumerate() {
            if edge.halfedge.index() >= self.halfedges.len() {
                return fail(format!("edge {i} references out-of-range half-edge"));
            }
            if self.edge_of(edge.halfedge) != EdgeId(i as u32) {
                return fail(format!("edge {i} representative disagrees on edge id"));
            }
        }

        for (i, vert) in self.vertices.iter().enumerate() {
            if vert.halfedge.index() >= self.halfedges.len() {
                return fail(format!("vertex {i} references out-of-range half-edge"));
            }
            if self.origin(vert.halfedge) != VertexId(i as u32) {
                return fail(format!("vertex {i} half-edge does not originate there"));
            }
        }

        Ok(())
    }
}

/// Iterator over the outgoing half-edges of one vertex.
pub struct OutgoingHalfedges<'a> {
    mesh: &'a HalfEdgeMesh,
    start: HalfedgeId,
    current: Option<HalfedgeId>,
}

impl Iterator for OutgoingHalfedges<'_> {
    type Item = HalfedgeId;

    fn next(&mut self) -> Option<HalfedgeId> {
        let cur = self.current?;
        let step = self.mesh.next(self.mesh.twin(cur));
        self.current = if step == self.start { None } else { Some(step) };
        Some(cur)
    }
}
