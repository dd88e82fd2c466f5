//! Procedural surface generators for scenarios and testing.
//!
//! Both generators produce deterministic, resolution-configurable flat
//! surfaces in the XY plane with counter-clockwise winding (normals
//! facing +Z).

use std::f64::consts::FRAC_PI_3;

use thallo_math::Vec3;
use thallo_types::{Scalar, ThalloError, ThalloResult};

use crate::geometry::Geometry;

/// First vertex index of ring `r` of a hex disk (ring 0 is the center).
fn ring_start(r: usize) -> usize {
    if r == 0 {
        0
    } else {
        1 + 3 * r * (r - 1)
    }
}

/// Generates a hexagonal disk cut from a regular triangular lattice.
///
/// The disk is centered at the origin with `rings` concentric hexagonal
/// rings around the center vertex; ring `r` carries `6r` vertices at
/// lattice positions, so every edge of the disk has length exactly
/// `edge_length`. Counts are `1 + 3R(R+1)` vertices, `6R²` faces and
/// `9R² + 3R` edges, with a single boundary loop of `6R` vertices.
///
/// # Example
/// ```
/// use thallo_mesh::generators::hex_disk;
/// let disk = hex_disk(2, 1.0).unwrap();
/// assert_eq!(disk.vertex_count(), 19); // 1 + 3·2·3
/// assert_eq!(disk.face_count(), 24);   // 6·2²
/// assert_eq!(disk.edge_count(), 42);   // 9·2² + 3·2
/// ```
pub fn hex_disk(rings: usize, edge_length: Scalar) -> ThalloResult<Geometry> {
    if rings == 0 {
        return Err(ThalloError::InvalidConfig(
            "hex_disk requires at least one ring".into(),
        ));
    }

    // Vertices: center, then rings inside out. Ring vertices walk the
    // six hexagon sides; interpolating between adjacent corners keeps
    // every lattice spacing at exactly `edge_length`.
    let vertex_count = 1 + 3 * rings * (rings + 1);
    let mut positions = Vec::with_capacity(vertex_count);
    positions.push(Vec3::ZERO);
    for r in 1..=rings {
        for i in 0..6 * r {
            let s = i / r; // hexagon side
            let t = (i % r) as Scalar; // steps along that side
            let a0 = s as Scalar * FRAC_PI_3;
            let a1 = (s + 1) as Scalar * FRAC_PI_3;
            let corner0 = Vec3::new(a0.cos(), a0.sin(), 0.0);
            let corner1 = Vec3::new(a1.cos(), a1.sin(), 0.0);
            positions.push((corner0 * (r as Scalar - t) + corner1 * t) * edge_length);
        }
    }

    // Triangles: between ring r and ring r+1, each sector alternates
    // outward-pointing and inward-pointing triangles.
    let mut triangles = Vec::with_capacity(6 * rings * rings);
    for r in 0..rings {
        let outer = ring_start(r + 1);
        let outer_len = 6 * (r + 1);
        let inner = ring_start(r);
        let inner_len = 6 * r;
        for s in 0..6 {
            for t in 0..=r {
                let o_t = outer + (s * (r + 1) + t) % outer_len;
                let o_t1 = outer + (s * (r + 1) + t + 1) % outer_len;
                let i_t = if r == 0 {
                    0
                } else {
                    inner + (s * r + t) % inner_len
                };
                triangles.push([o_t as u32, o_t1 as u32, i_t as u32]);
                if t < r {
                    let i_t1 = inner + (s * r + t + 1) % inner_len;
                    triangles.push([i_t as u32, o_t1 as u32, i_t1 as u32]);
                }
            }
        }
    }

    Geometry::from_faces(positions, &triangles)
}

/// Generates a flat rectangular quad grid in the XY plane.
///
/// The grid spans `[-width/2, width/2]` in X and `[-height/2, height/2]`
/// in Y, centered at the origin at Z=0. Each quad is split into two
/// triangles along its top-right to bottom-left diagonal.
///
/// # Arguments
/// - `cols` — Number of quads along X (vertex count = cols + 1).
/// - `rows` — Number of quads along Y (vertex count = rows + 1).
/// - `width` — Total width.
/// - `height` — Total height.
///
/// # Example
/// ```
/// use thallo_mesh::generators::quad_grid;
/// let grid = quad_grid(2, 2, 1.0, 1.0).unwrap();
/// assert_eq!(grid.vertex_count(), 9);  // 3×3 vertices
/// assert_eq!(grid.face_count(), 8);    // 2×2 quads × 2 tris each
/// ```
pub fn quad_grid(cols: usize, rows: usize, width: Scalar, height: Scalar) -> ThalloResult<Geometry> {
    if cols == 0 || rows == 0 {
        return Err(ThalloError::InvalidConfig(
            "quad_grid requires at least one quad per axis".into(),
        ));
    }

    let verts_x = cols + 1;
    let verts_y = rows + 1;

    let half_w = width / 2.0;
    let half_h = height / 2.0;

    // Generate vertices
    let mut positions = Vec::with_capacity(verts_x * verts_y);
    for j in 0..verts_y {
        for i in 0..verts_x {
            let u = i as Scalar / cols as Scalar;
            let v = j as Scalar / rows as Scalar;
            positions.push(Vec3::new(-half_w + u * width, half_h - v * height, 0.0));
        }
    }

    // Generate triangles (two per quad)
    let mut triangles = Vec::with_capacity(cols * rows * 2);
    for j in 0..rows {
        for i in 0..cols {
            let top_left = (j * verts_x + i) as u32;
            let top_right = top_left + 1;
            let bot_left = top_left + verts_x as u32;
            let bot_right = bot_left + 1;

            triangles.push([top_left, bot_left, top_right]);
            triangles.push([top_right, bot_left, bot_right]);
        }
    }

    Geometry::from_faces(positions, &triangles)
}
