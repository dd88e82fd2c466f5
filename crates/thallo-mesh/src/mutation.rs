//! Topology mutators: edge split and edge flip.
//!
//! Both are pure index-rewiring operations on the arena. Ids are
//! append-only stable: a split reuses the original edge id for the
//! `v0`–mid half and reuses the two incident faces, so ids gathered
//! during a marking pass stay valid after the splits are applied.

use thallo_types::{EdgeId, FaceId, HalfedgeId, ThalloError, ThalloResult, VertexId};
use tracing::trace;

use crate::halfedge::{Edge, Face, HalfEdgeMesh, Halfedge, Vertex};

/// Entities created by one edge split.
#[derive(Debug, Clone)]
pub struct EdgeSplit {
    /// The midpoint vertex.
    pub vertex: VertexId,
    /// New faces (two for an interior split, one for a boundary split).
    pub new_faces: Vec<FaceId>,
    /// New edges (three for an interior split, two for a boundary split).
    pub new_edges: Vec<EdgeId>,
}

impl HalfEdgeMesh {
    /// Splits `edge` at a new midpoint vertex, subdividing each incident
    /// face into two.
    ///
    /// For edge (v0, v1) with interior half-edge `v0→v1` in face
    /// (v0, v1, v2): the face becomes (v0, m, v2) and a new face
    /// (m, v1, v2) is added; the original edge id is kept for (v0, m)
    /// and the (m, v1) half gets a new id. The twin side, whether an
    /// interior face or a boundary loop, is subdivided the same way.
    ///
    /// Connectivity only; the caller inserts the midpoint position
    /// (see [`crate::Geometry::split_edge`]).
    pub fn split_edge_topology(&mut self, edge: EdgeId) -> ThalloResult<EdgeSplit> {
        // Primary half-edge: the interior side (boundary edges have
        // exactly one).
        let rep = self.edge_halfedge(edge);
        let he = if self.face_of(rep).is_some() {
            rep
        } else {
            self.twin(rep)
        };

        // ─── Gather (read-only, fail early) ───────────────────────
        let face = self.face_of(he).ok_or_else(|| {
            ThalloError::InvariantViolation(format!("edge {} has no incident face", edge.0))
        })?;
        let tw = self.twin(he); // v1→v0 (or the boundary half-edge)
        let nxt = self.next(he); // v1→v2
        let prv = self.prev(he); // v2→v0
        let twin_face = self.face_of(tw);
        let v2 = self.origin(prv);

        // ─── Pre-compute all new ids before pushing anything ──────
        let mid = VertexId(self.vertices.len() as u32);
        let base_he = self.halfedges.len() as u32;
        let he_m_v2 = HalfedgeId(base_he);
        let he_m_v1 = HalfedgeId(base_he + 1);
        let he_v2_m = HalfedgeId(base_he + 2);
        let face_new = FaceId(self.faces.len() as u32);
        let base_e = self.edges.len() as u32;
        let edge_split = EdgeId(base_e); // (m, v1)
        let edge_cross = EdgeId(base_e + 1); // (m, v2)

        self.vertices.push(Vertex { halfedge: he_m_v1 });
        self.faces.push(Face { halfedge: he_m_v1 });
        self.edges.push(Edge { halfedge: he_m_v1 });
        self.edges.push(Edge { halfedge: he_m_v2 });

        // ─── Primary side: F = (v0, v1, v2) → (v0, m, v2), F' = (m, v1, v2)
        self.push_halfedge(Halfedge {
            twin: he_v2_m,
            next: prv,
            prev: he,
            vertex: mid,
            edge: edge_cross,
            face: Some(face),
        });
        // In both the interior and boundary case the reused `tw`
        // becomes v1→m, the twin of this half-edge.
        self.push_halfedge(Halfedge {
            twin: tw,
            next: nxt,
            prev: he_v2_m,
            vertex: mid,
            edge: edge_split,
            face: Some(face_new),
        });
        self.push_halfedge(Halfedge {
            twin: he_m_v2,
            next: he_m_v1,
            prev: nxt,
            vertex: v2,
            edge: edge_cross,
            face: Some(face_new),
        });

        self.halfedges[he.index()].next = he_m_v2;
        self.halfedges[nxt.index()].next = he_v2_m;
        self.halfedges[nxt.index()].prev = he_m_v1;
        self.halfedges[nxt.index()].face = Some(face_new);
        self.halfedges[prv.index()].prev = he_m_v2;
        self.faces[face.index()].halfedge = he;
        self.edges[edge.index()].halfedge = he;

        let mut new_faces = vec![face_new];
        let mut new_edges = vec![edge_split, edge_cross];

        // ─── Twin side ────────────────────────────────────────────
        if let Some(face_g) = twin_face {
            // Interior: G = (v1, v0, v3) → (v1, m, v3), G' = (m, v0, v3).
            let tw_nxt = self.next(tw); // v0→v3
            let tw_prv = self.prev(tw); // v3→v1
            let v3 = self.origin(tw_prv);

            let he_m_v3 = HalfedgeId(base_he + 3);
            let he_m_v0 = HalfedgeId(base_he + 4);
            let he_v3_m = HalfedgeId(base_he + 5);
            let face_new_g = FaceId(face_new.0 + 1);
            let edge_cross_g = EdgeId(base_e + 2); // (m, v3)

            self.faces.push(Face { halfedge: he_m_v0 });
            self.edges.push(Edge { halfedge: he_m_v3 });

            self.push_halfedge(Halfedge {
                twin: he_v3_m,
                next: tw_prv,
                prev: tw,
                vertex: mid,
                edge: edge_cross_g,
                face: Some(face_g),
            });
            self.push_halfedge(Halfedge {
                twin: he,
                next: tw_nxt,
                prev: he_v3_m,
                vertex: mid,
                edge,
                face: Some(face_new_g),
            });
            self.push_halfedge(Halfedge {
                twin: he_m_v3,
                next: he_m_v0,
                prev: tw_nxt,
                vertex: v3,
                edge: edge_cross_g,
                face: Some(face_new_g),
            });

            self.halfedges[tw.index()].next = he_m_v3;
            self.halfedges[tw.index()].twin = he_m_v1;
            self.halfedges[tw.index()].edge = edge_split;
            self.halfedges[he.index()].twin = he_m_v0;
            self.halfedges[tw_nxt.index()].next = he_v3_m;
            self.halfedges[tw_nxt.index()].prev = he_m_v0;
            self.halfedges[tw_nxt.index()].face = Some(face_new_g);
            self.halfedges[tw_prv.index()].prev = he_m_v3;
            self.faces[face_g.index()].halfedge = tw;

            new_faces.push(face_new_g);
            new_edges.push(edge_cross_g);
        } else {
            // Boundary: the loop gains one half-edge, m→v0, after the
            // reused `tw` (which becomes v1→m).
            let loop_next = self.next(tw); // boundary half-edge leaving v0
            let b2 = HalfedgeId(base_he + 3);
            self.push_halfedge(Halfedge {
                twin: he,
                next: loop_next,
                prev: tw,
                vertex: mid,
                edge,
                face: None,
            });
            self.halfedges[tw.index()].next = b2;
            self.halfedges[tw.index()].twin = he_m_v1;
            self.halfedges[tw.index()].edge = edge_split;
            self.halfedges[he.index()].twin = b2;
            self.halfedges[loop_next.index()].prev = b2;
        }

        self.edges[edge_split.index()].halfedge = tw;

        trace!(
            edge = edge.index(),
            vertex = mid.index(),
            faces = new_faces.len(),
            "split_edge"
        );

        Ok(EdgeSplit {
            vertex: mid,
            new_faces,
            new_edges,
        })
    }

    fn push_halfedge(&mut self, he: Halfedge) -> HalfedgeId {
        let id = HalfedgeId(self.halfedges.len() as u32);
        self.halfedges.push(he);
        id
    }

    /// True if `edge` can be rotated without breaking the mesh:
    /// both sides interior, distinct wing vertices not already joined by
    /// an edge, and no interior endpoint of valence ≤ 3.
    pub fn is_flippable(&self, edge: EdgeId) -> bool {
        let he = self.edge_halfedge(edge);
        let tw = self.twin(he);
        if self.face_of(he).is_none() || self.face_of(tw).is_none() {
            return false;
        }
        let a = self.origin(he);
        let b = self.origin(tw);
        let c = self.origin(self.prev(he));
        let d = self.origin(self.prev(tw));
        if c == d || self.vertices_adjacent(c, d) {
            return false;
        }
        // A flip drops one edge from each endpoint's ring.
        for v in [a, b] {
            if !self.vertex_on_boundary(v) && self.degree(v) <= 3 {
                return false;
            }
        }
        true
    }

    /// Rotates `edge` inside its two incident triangles: edge (a, b)
    /// shared by faces (a, b, c) and (b, a, d) becomes edge (c, d), with
    /// the two faces rewired to (c, d, b) and (d, c, a). The rotated
    /// diagonal keeps its edge id.
    ///
    /// Returns `false` (leaving the mesh untouched) when the edge is not
    /// flippable.
    pub fn flip_edge_topology(&mut self, edge: EdgeId) -> bool {
        if !self.is_flippable(edge) {
            return false;
        }

        // ─── Gather ───────────────────────────────────────────────
        let he_ab = self.edge_halfedge(edge);
        let he_ba = self.twin(he_ab);
        let he_bc = self.next(he_ab);
        let he_ca = self.prev(he_ab);
        let he_ad = self.next(he_ba);
        let he_db = self.prev(he_ba);
        let (face_1, face_2) = match (self.face_of(he_ab), self.face_of(he_ba)) {
            (Some(f1), Some(f2)) => (f1, f2),
            _ => return false,
        };
        let v_a = self.origin(he_ab);
        let v_b = self.origin(he_ba);
        let v_c = self.origin(he_ca);
        let v_d = self.origin(he_db);

        // ─── Rewire: face 1 becomes (c, d, b), face 2 becomes (d, c, a)
        self.halfedges[he_ab.index()].vertex = v_c;
        self.halfedges[he_ab.index()].next = he_db;
        self.halfedges[he_ab.index()].prev = he_bc;

        self.halfedges[he_ba.index()].vertex = v_d;
        self.halfedges[he_ba.index()].next = he_ca;
        self.halfedges[he_ba.index()].prev = he_ad;

        // d→b crosses from face 2 into face 1.
        self.halfedges[he_db.index()].face = Some(face_1);
        self.halfedges[he_db.index()].next = he_bc;
        self.halfedges[he_db.index()].prev = he_ab;

        self.halfedges[he_bc.index()].next = he_ab;
        self.halfedges[he_bc.index()].prev = he_db;

        // c→a crosses from face 1 into face 2.
        self.halfedges[he_ca.index()].face = Some(face_2);
        self.halfedges[he_ca.index()].next = he_ad;
        self.halfedges[he_ca.index()].prev = he_ba;

        self.halfedges[he_ad.index()].next = he_ba;
        self.halfedges[he_ad.index()].prev = he_ca;

        self.faces[face_1.index()].halfedge = he_ab;
        self.faces[face_2.index()].halfedge = he_ba;

        // a and b may have pointed at the rotated half-edges.
        if self.vertices[v_a.index()].halfedge == he_ab {
            self.vertices[v_a.index()].halfedge = he_ad;
        }
        if self.vertices[v_b.index()].halfedge == he_ba {
            self.vertices[v_b.index()].halfedge = he_bc;
        }

        trace!(
            edge = edge.index(),
            from = ?(v_a, v_b),
            to = ?(v_c, v_d),
            "flip_edge"
        );

        true
    }
}
