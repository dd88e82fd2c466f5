//! Discrete-shells bending forces and their Gauss-Newton Jacobian.
//!
//! Every interior edge is a hinge between two triangles. The hinge resists
//! deviation of its dihedral angle from the rest angle with stiffness
//! `kb · 6 · |e0|² / (A0a + A0b)`, where `|e0|` is the rest edge length and
//! `A0a + A0b` the combined rest area of the two faces. Boundary edges have
//! only one face and carry no bend.
//!
//! ```text
//!        wa
//!       /  \
//!      / fa \
//!    v0 ──── v1
//!      \ fb /
//!       \  /
//!        wb
//! ```
//!
//! Forces come from a vertex-centric sweep: each vertex walks its outgoing
//! half-edges and collects two angle-gradient terms per spoke, one for the
//! hinge at the incident edge and one for the hinge at the face edge
//! opposite the vertex. The Jacobian comes from an edge-centric sweep that
//! pairs the four stencil gradients of each hinge, dropping the
//! second-order gradient-of-gradient term. The assembled block matrix is
//! symmetric negative semi-definite, which keeps the integrator's velocity
//! system positive definite.
//!
//! Rest and current state go through the same normal/area/length code, so
//! a mesh evaluated at its rest positions produces exactly zero force.

use serde::{Deserialize, Serialize};

use thallo_math::sparse::TripletList;
use thallo_math::{outer, Vec3};
use thallo_mesh::{Geometry, HalfEdgeMesh};
use thallo_types::constants::{
    DEFAULT_BEND_STIFFNESS, DEFAULT_FORCE_CUTOFF, DEGENERATE_AREA_THRESHOLD,
    DEGENERATE_LENGTH_THRESHOLD,
};
use thallo_types::{EdgeId, FaceId, HalfedgeId, Scalar, ThalloError, ThalloResult};

// ─── Configuration ────────────────────────────────────────────

/// Tunables for the bending assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BendingConfig {
    /// Hinge stiffness `kb`.
    pub stiffness: Scalar,
    /// Per-vertex forces with magnitude at or below this are zeroed.
    pub force_cutoff: Scalar,
}

impl Default for BendingConfig {
    fn default() -> Self {
        Self {
            stiffness: DEFAULT_BEND_STIFFNESS,
            force_cutoff: DEFAULT_FORCE_CUTOFF,
        }
    }
}

// ─── Output ───────────────────────────────────────────────────

/// Forces and Jacobian from one bending pass.
#[derive(Debug, Clone)]
pub struct BendingOutput {
    /// Per-vertex bending force.
    pub forces: Vec<Vec3>,
    /// Gauss-Newton force Jacobian as 3x3 blocks, 16 per hinge.
    pub jacobian: TripletList,
    /// Interior edges assembled.
    pub hinges: usize,
}

// ─── Dihedral angle ───────────────────────────────────────────

/// Signed dihedral angle between two face normals around a shared edge.
///
/// `edge_unit` is the unit vector along the edge's canonical half-edge;
/// the sign follows the right-hand rule around it. Coplanar faces with
/// matching orientation give zero.
pub fn dihedral_angle(n1: Vec3, n2: Vec3, edge_unit: Vec3) -> Scalar {
    n1.cross(n2).dot(edge_unit).atan2(n1.dot(n2))
}

// ─── Per-state geometry caches ────────────────────────────────

fn face_data(mesh: &HalfEdgeMesh, positions: &[Vec3]) -> ThalloResult<(Vec<Vec3>, Vec<Scalar>)> {
    let mut normals = Vec::with_capacity(mesh.face_count());
    let mut areas = Vec::with_capacity(mesh.face_count());
    for f in mesh.face_ids() {
        let [a, b, c] = mesh.face_vertices(f);
        let u = positions[b.index()] - positions[a.index()];
        let v = positions[c.index()] - positions[a.index()];
        let cross = u.cross(v);
        let len = cross.length();
        if len < 2.0 * DEGENERATE_AREA_THRESHOLD {
            return Err(ThalloError::DegenerateGeometry(format!(
                "Face {} has near-zero area ({:e})",
                f.index(),
                0.5 * len
            )));
        }
        normals.push(cross / len);
        areas.push(0.5 * len);
    }
    Ok((normals, areas))
}

fn edge_data(mesh: &HalfEdgeMesh, positions: &[Vec3]) -> ThalloResult<(Vec<Vec3>, Vec<Scalar>)> {
    let mut units = Vec::with_capacity(mesh.edge_count());
    let mut lengths = Vec::with_capacity(mesh.edge_count());
    for e in mesh.edge_ids() {
        let h = mesh.edge_halfedge(e);
        let vector = positions[mesh.head(h).index()] - positions[mesh.origin(h).index()];
        let len = vector.length();
        if len < DEGENERATE_LENGTH_THRESHOLD {
            return Err(ThalloError::DegenerateGeometry(format!(
                "Edge {} has near-zero length ({len:e})",
                e.index()
            )));
        }
        units.push(vector / len);
        lengths.push(len);
    }
    Ok((units, lengths))
}

/// Current-state geometry shared by the force and Jacobian sweeps.
struct HingeScratch<'a> {
    mesh: &'a HalfEdgeMesh,
    normals: &'a [Vec3],
    areas: &'a [Scalar],
    units: &'a [Vec3],
    lengths: &'a [Scalar],
}

impl HingeScratch<'_> {
    /// Unit vector along `h` in its own direction.
    fn oriented_unit(&self, h: HalfedgeId) -> Vec3 {
        let e = self.mesh.edge_of(h);
        if self.mesh.edge_halfedge(e) == h {
            self.units[e.index()]
        } else {
            -self.units[e.index()]
        }
    }

    /// Gradient of the hinge angle at the endpoint `h` points toward.
    ///
    /// `f_far` is the face across the edge from `h`, `f_near` the face `h`
    /// belongs to. Callers resolve boundary cases before calling, so both
    /// faces exist.
    fn endpoint_gradient(&self, h: HalfedgeId, f_far: FaceId, f_near: FaceId) -> Vec3 {
        let toward = self.oriented_unit(h);
        // Legs share the endpoint opposite the one `h` points toward.
        let far_leg = self.mesh.next(self.mesh.twin(h));
        let near_leg = self.mesh.prev(h);
        let cos_far = toward.dot(self.oriented_unit(far_leg));
        let cos_near = toward.dot(-self.oriented_unit(near_leg));
        let alt_far =
            2.0 * self.areas[f_far.index()] / self.lengths[self.mesh.edge_of(far_leg).index()];
        let alt_near =
            2.0 * self.areas[f_near.index()] / self.lengths[self.mesh.edge_of(near_leg).index()];
        self.normals[f_far.index()] * (cos_far / alt_far)
            + self.normals[f_near.index()] * (cos_near / alt_near)
    }

    /// Gradient of the hinge angle at the wing vertex of `f` opposite `e`.
    fn wing_gradient(&self, f: FaceId, e: EdgeId) -> Vec3 {
        let altitude = 2.0 * self.areas[f.index()] / self.lengths[e.index()];
        self.normals[f.index()] * (-1.0 / altitude)
    }
}

// ─── Assembler ────────────────────────────────────────────────

/// Assembles discrete-shells bending forces and Jacobians.
#[derive(Debug, Clone, Default)]
pub struct DiscreteShells {
    pub config: BendingConfig,
}

impl DiscreteShells {
    /// Creates an assembler with the given config.
    pub fn new(config: BendingConfig) -> Self {
        Self { config }
    }

    /// Computes bending forces and the Gauss-Newton Jacobian for the
    /// current positions of `geometry` against `rest_positions`.
    ///
    /// `rest_positions` must pair with the current mesh topology, one
    /// entry per vertex. Degenerate faces or edges in either state fail
    /// the whole pass with [`ThalloError::DegenerateGeometry`].
    pub fn assemble(
        &self,
        geometry: &Geometry,
        rest_positions: &[Vec3],
    ) -> ThalloResult<BendingOutput> {
        let n = geometry.vertex_count();
        if rest_positions.len() != n {
            return Err(ThalloError::InvalidConfig(format!(
                "Rest position count ({}) != vertex count ({n})",
                rest_positions.len()
            )));
        }

        let mesh = &geometry.mesh;
        let kb = self.config.stiffness;

        let (rest_normals, rest_areas) = face_data(mesh, rest_positions)?;
        let (normals, areas) = face_data(mesh, geometry.positions())?;
        let (rest_units, rest_lengths) = edge_data(mesh, rest_positions)?;
        let (units, lengths) = edge_data(mesh, geometry.positions())?;

        // Per-hinge force magnitude along the angle gradient. Boundary
        // edges stay at zero.
        let mut dp = vec![0.0; mesh.edge_count()];
        let mut kappa = vec![0.0; mesh.edge_count()];
        let mut hinges = 0;
        for e in mesh.edge_ids() {
            let h = mesh.edge_halfedge(e);
            let (fa, fb) = match (mesh.face_of(h), mesh.face_of(mesh.twin(h))) {
                (Some(fa), Some(fb)) => (fa, fb),
                _ => continue,
            };
            let theta0 = dihedral_angle(
                rest_normals[fa.index()],
                rest_normals[fb.index()],
                rest_units[e.index()],
            );
            let theta = dihedral_angle(normals[fa.index()], normals[fb.index()], units[e.index()]);
            let l0 = rest_lengths[e.index()];
            let k = kb * 6.0 * l0 * l0 / (rest_areas[fa.index()] + rest_areas[fb.index()]);
            kappa[e.index()] = k;
            dp[e.index()] = -k * (theta - theta0);
            hinges += 1;
        }

        let scratch = HingeScratch {
            mesh,
            normals: &normals,
            areas: &areas,
            units: &units,
            lengths: &lengths,
        };

        // Vertex sweep: two gradient terms per outgoing half-edge.
        let mut forces = vec![Vec3::ZERO; n];
        for v in mesh.vertex_ids() {
            let mut grad = Vec3::ZERO;
            for out in mesh.outgoing_halfedges(v) {
                let toward = mesh.twin(out);
                // Hinge at the incident edge. Boundary edges are missing a
                // face and contribute nothing.
                if let (Some(f_far), Some(f_near)) = (mesh.face_of(out), mesh.face_of(toward)) {
                    let e = mesh.edge_of(toward);
                    grad += scratch.endpoint_gradient(toward, f_far, f_near) * dp[e.index()];
                }
                // Hinge at the face edge opposite `v`, where `v` is the wing.
                if let Some(f) = mesh.face_of(out) {
                    let opposite = mesh.edge_of(mesh.next(out));
                    grad += scratch.wing_gradient(f, opposite) * dp[opposite.index()];
                }
            }
            if grad.length() > self.config.force_cutoff {
                forces[v.index()] = grad;
            }
        }

        // Edge sweep: pair the four stencil gradients of each hinge.
        let mut jacobian = TripletList::new(3 * n, 3 * n);
        for e in mesh.edge_ids() {
            let h = mesh.edge_halfedge(e);
            let (fa, fb) = match (mesh.face_of(h), mesh.face_of(mesh.twin(h))) {
                (Some(fa), Some(fb)) => (fa, fb),
                _ => continue,
            };
            let stencil = [
                (
                    mesh.origin(h),
                    scratch.endpoint_gradient(mesh.twin(h), fa, fb),
                ),
                (mesh.head(h), scratch.endpoint_gradient(h, fb, fa)),
                (mesh.head(mesh.next(h)), scratch.wing_gradient(fa, e)),
                (
                    mesh.head(mesh.next(mesh.twin(h))),
                    scratch.wing_gradient(fb, e),
                ),
            ];
            let k = kappa[e.index()];
            for &(row, g_row) in &stencil {
                for &(col, g_col) in &stencil {
                    jacobian.push_block(row.index(), col.index(), &(outer(g_row, g_col) * -k));
                }
            }
        }

        Ok(BendingOutput {
            forces,
            jacobian,
            hinges,
        })
    }
}
