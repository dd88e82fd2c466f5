//! Integration tests for thallo-contact.

use thallo_contact::{
    ParticleRepulsion, RepulsionConfig, RepulsivePlane, RepulsivePointCloud, RepulsiveSurface,
    SpatialGrid,
};
use thallo_math::Vec3;
use thallo_mesh::Geometry;
use thallo_types::ThalloError;

const STIFF: f64 = 10.0;

fn repulsion() -> ParticleRepulsion {
    ParticleRepulsion::new(RepulsionConfig {
        stiffness: STIFF,
        ..RepulsionConfig::default()
    })
}

/// Two disjoint triangles facing each other across `gap` along x.
///
/// Side length 1.5 keeps every intra-triangle edge above the unit
/// repulsion cutoff, so vertex 0 against vertex 3 is the only pair the
/// assembler can act on.
fn two_triangles(gap: f64) -> Geometry {
    let s = 1.5;
    let h = s * 3.0f64.sqrt() / 2.0;
    Geometry::from_faces(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(s, 0.0, 0.0),
            Vec3::new(s / 2.0, h, 0.0),
            Vec3::new(-gap, 0.0, 0.0),
            Vec3::new(-gap - s, 0.0, 0.0),
            Vec3::new(-gap - s / 2.0, -h, 0.0),
        ],
        &[[0, 1, 2], [3, 4, 5]],
    )
    .unwrap()
}

/// One triangle whose base edge has length `base`; the apex sits far
/// enough away that only the base pair can fall inside the cutoff.
fn lone_edge(base: f64) -> Geometry {
    Geometry::from_faces(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(base, 0.0, 0.0),
            Vec3::new(base / 2.0, 2.0, 0.0),
        ],
        &[[0, 1, 2]],
    )
    .unwrap()
}

fn assert_forces_zero(forces: &[Vec3]) {
    for (i, f) in forces.iter().enumerate() {
        assert!(f.length() < 1e-12, "vertex {i} has force {f:?}");
    }
}

// ─── Spatial Grid Tests ───────────────────────────────────────

#[test]
fn grid_query_spans_cells_straddling_zero() {
    let mut points = Vec::new();
    for sx in [-1.0, 1.0] {
        for sy in [-1.0, 1.0] {
            for sz in [-1.0, 1.0] {
                points.push(Vec3::new(0.1 * sx, 0.1 * sy, 0.1 * sz));
            }
        }
    }
    points.push(Vec3::new(5.0, 5.0, 5.0));

    let grid = SpatialGrid::from_positions(1.0, &points);
    // The octant cluster lands in eight distinct cells around the origin,
    // the far point in its own.
    assert_eq!(grid.cell_count(), 9);

    let mut found = grid.neighbors(Vec3::new(0.1, 0.1, 0.1));
    found.sort_unstable();
    assert_eq!(found, vec![0, 1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn grid_query_is_limited_to_adjacent_cells() {
    let points = vec![Vec3::new(1.5, 0.0, 0.0), Vec3::new(2.5, 0.0, 0.0)];
    let grid = SpatialGrid::from_positions(1.0, &points);

    let found = grid.neighbors(Vec3::ZERO);
    // Cell (1,0,0) is adjacent to the query cell, cell (2,0,0) is not.
    assert!(found.contains(&0));
    assert!(!found.contains(&1));
}

#[test]
fn grid_floors_negative_coordinates() {
    let points = vec![Vec3::new(-0.25, 0.0, 0.0), Vec3::new(0.25, 0.0, 0.0)];
    let grid = SpatialGrid::from_positions(1.0, &points);
    assert_eq!(grid.cell_count(), 2);

    let mut found = grid.neighbors(Vec3::new(0.25, 0.0, 0.0));
    found.sort_unstable();
    assert_eq!(found, vec![0, 1]);
}

#[test]
fn grid_shares_cell_for_nearby_points() {
    let grid = SpatialGrid::from_positions(1.0, &[Vec3::new(0.2, 0.0, 0.0), Vec3::new(0.7, 0.0, 0.0)]);
    assert_eq!(grid.cell_count(), 1);
}

// ─── Repulsion Tests ──────────────────────────────────────────

#[test]
fn pairs_beyond_cutoff_are_ignored() {
    let geometry = two_triangles(1.05);
    let out = repulsion().assemble(&geometry, 1.0, None).unwrap();
    assert_eq!(out.interactions, 0);
    assert!(out.jacobian.is_empty());
    assert_forces_zero(&out.forces);
}

#[test]
fn close_vertices_push_apart() {
    // Gap 0.55, separation rest 1.1: each vertex feels k·(1.1 − 0.55)
    // directed away from the other.
    let geometry = two_triangles(0.55);
    let out = repulsion().assemble(&geometry, 1.0, None).unwrap();

    assert_eq!(out.interactions, 2);
    let f0 = out.forces[0];
    let f3 = out.forces[3];
    assert!((f0.x - 5.5).abs() < 1e-9, "force on vertex 0: {f0:?}");
    assert!(f0.y.abs() < 1e-12 && f0.z.abs() < 1e-12);
    assert!((f3.x + 5.5).abs() < 1e-9, "force on vertex 3: {f3:?}");
    assert!((f0 + f3).length() < 1e-9, "forces must cancel pairwise");
    for i in [1, 2, 4, 5] {
        assert!(out.forces[i].length() < 1e-12, "vertex {i} should be at rest");
    }
}

#[test]
fn repulsion_is_linear_in_stiffness() {
    let geometry = two_triangles(0.55);
    let base = repulsion().assemble(&geometry, 1.0, None).unwrap();
    let doubled = ParticleRepulsion::new(RepulsionConfig {
        stiffness: 2.0 * STIFF,
        ..RepulsionConfig::default()
    })
    .assemble(&geometry, 1.0, None)
    .unwrap();
    assert!((doubled.forces[0].x - 2.0 * base.forces[0].x).abs() < 1e-12);
}

#[test]
fn adjacent_pair_rests_inside_cutoff() {
    // 0.95 is inside the cutoff but above the adjacent rest 0.9, so a
    // mesh edge of that length is left alone.
    let geometry = lone_edge(0.95);
    let out = repulsion().assemble(&geometry, 1.0, None).unwrap();
    assert_eq!(out.interactions, 0);
    assert_forces_zero(&out.forces);
}

#[test]
fn adjacent_pair_repels_below_rest() {
    let geometry = lone_edge(0.85);
    let out = repulsion().assemble(&geometry, 1.0, None).unwrap();
    assert_eq!(out.interactions, 2);
    // k·(0.85 − 0.9) along +x on vertex 0 flips to −x.
    assert!((out.forces[0].x + 0.5).abs() < 1e-9, "force {:?}", out.forces[0]);
    assert!((out.forces[1].x - 0.5).abs() < 1e-9, "force {:?}", out.forces[1]);
}

#[test]
fn non_adjacent_pair_repels_at_the_same_distance() {
    // Same 0.95 separation as `adjacent_pair_rests_inside_cutoff`, but
    // across the gap the rest distance is 1.1 and the pair pushes.
    let geometry = two_triangles(0.95);
    let out = repulsion().assemble(&geometry, 1.0, None).unwrap();
    assert_eq!(out.interactions, 2);
    assert!((out.forces[0].x - 1.5).abs() < 1e-9, "force {:?}", out.forces[0]);
}

#[test]
fn frozen_vertices_are_exempt() {
    let geometry = two_triangles(0.55);
    let mut factors = vec![1.0; 6];
    factors[3] = 0.1;

    let out = repulsion().assemble(&geometry, 1.0, Some(&factors)).unwrap();
    assert_eq!(out.interactions, 0);
    assert_forces_zero(&out.forces);

    // Mature factors behave exactly like no factors at all.
    let mature = repulsion().assemble(&geometry, 1.0, Some(&vec![1.0; 6])).unwrap();
    let plain = repulsion().assemble(&geometry, 1.0, None).unwrap();
    assert!((mature.forces[0] - plain.forces[0]).length() < 1e-12);
}

#[test]
fn freeze_can_be_disabled() {
    let geometry = two_triangles(0.55);
    let mut factors = vec![1.0; 6];
    factors[3] = 0.1;

    let solver = ParticleRepulsion::new(RepulsionConfig {
        stiffness: STIFF,
        freeze_threshold: None,
        ..RepulsionConfig::default()
    });
    let out = solver.assemble(&geometry, 1.0, Some(&factors)).unwrap();
    assert_eq!(out.interactions, 2);
    assert!((out.forces[0].x - 5.5).abs() < 1e-9);
}

#[test]
fn coincident_vertices_are_rejected() {
    let geometry = two_triangles(0.0);
    let err = repulsion().assemble(&geometry, 1.0, None).unwrap_err();
    assert!(matches!(err, ThalloError::DegenerateGeometry(_)), "got {err}");
}

#[test]
fn non_positive_resolution_is_rejected() {
    let geometry = two_triangles(0.55);
    for bad in [0.0, -1.0] {
        let err = repulsion().assemble(&geometry, bad, None).unwrap_err();
        assert!(matches!(err, ThalloError::InvalidConfig(_)), "got {err}");
    }
}

#[test]
fn factor_count_mismatch_is_rejected() {
    let geometry = two_triangles(0.55);
    let err = repulsion()
        .assemble(&geometry, 1.0, Some(&[1.0, 1.0]))
        .unwrap_err();
    assert!(matches!(err, ThalloError::InvalidConfig(_)), "got {err}");
}

// ─── Jacobian Tests ───────────────────────────────────────────

#[test]
fn jacobian_blocks_match_the_force_derivative() {
    // Gap 0.55 makes l0/lij exactly 2, so the pair block is
    // k·diag(1, −1, −1) and every probed entry is exact.
    let geometry = two_triangles(0.55);
    let out = repulsion().assemble(&geometry, 1.0, None).unwrap();
    assert_eq!(out.jacobian.rows, 18);
    let j = out.jacobian.to_csr();

    // Column of vertex 0's x dof.
    let mut x = vec![0.0; 18];
    x[0] = 1.0;
    let y = j.mul_vec(&x);
    assert!((y[0] + STIFF).abs() < 1e-12, "J[0,0] = {}", y[0]);
    assert!((y[9] - STIFF).abs() < 1e-12, "J[9,0] = {}", y[9]);
    for (i, v) in y.iter().enumerate() {
        if i != 0 && i != 9 {
            assert!(v.abs() < 1e-12, "unexpected entry J[{i},0] = {v}");
        }
    }

    // Transverse dof: compression makes the y/z modes destabilizing,
    // which is what forces the QR fallback in the integrator.
    let mut x = vec![0.0; 18];
    x[1] = 1.0;
    let y = j.mul_vec(&x);
    assert!((y[1] - STIFF).abs() < 1e-12, "J[1,1] = {}", y[1]);
    assert!((y[10] + STIFF).abs() < 1e-12, "J[10,1] = {}", y[10]);
}

#[test]
fn jacobian_is_symmetric() {
    let geometry = two_triangles(0.55);
    let j = repulsion()
        .assemble(&geometry, 1.0, None)
        .unwrap()
        .jacobian
        .to_csr();

    let mut e0 = vec![0.0; 18];
    e0[0] = 1.0;
    let mut e9 = vec![0.0; 18];
    e9[9] = 1.0;
    let col0 = j.mul_vec(&e0);
    let col9 = j.mul_vec(&e9);
    assert!((col0[9] - col9[0]).abs() < 1e-12, "J[9,0] != J[0,9]");
}

// ─── Surface Tests ────────────────────────────────────────────

#[test]
fn plane_pushes_out_penetrating_points() {
    // Non-unit input normal is normalized on construction.
    let plane = RepulsivePlane::with_stiffness(Vec3::new(0.0, 0.0, 2.0), 0.0, 100.0).unwrap();
    assert!(plane.is_colliding(Vec3::new(0.0, 0.0, -0.2)));

    let f = plane.repulse(Vec3::new(0.0, 0.0, -0.2));
    assert!((f.z - 20.0).abs() < 1e-9, "plane force {f:?}");
    assert!(f.x.abs() < 1e-12 && f.y.abs() < 1e-12);
}

#[test]
fn plane_ignores_points_outside() {
    let plane = RepulsivePlane::new(Vec3::Z, 0.0).unwrap();
    // A point exactly on the surface counts as outside.
    assert!(!plane.is_colliding(Vec3::ZERO));
    assert_eq!(plane.repulse(Vec3::new(1.0, -2.0, 0.5)), Vec3::ZERO);
}

#[test]
fn plane_offset_shifts_the_surface() {
    let plane = RepulsivePlane::new(Vec3::Z, 1.0).unwrap();
    assert!(plane.is_colliding(Vec3::new(0.0, 0.0, 0.5)));
    let f = plane.repulse(Vec3::new(0.0, 0.0, 0.5));
    assert!((f.z - 50.0).abs() < 1e-9, "plane force {f:?}");
}

#[test]
fn degenerate_plane_normal_is_rejected() {
    let err = RepulsivePlane::new(Vec3::ZERO, 0.0).unwrap_err();
    assert!(matches!(err, ThalloError::InvalidConfig(_)), "got {err}");
}

#[test]
fn point_cloud_repels_within_radius() {
    let cloud = RepulsivePointCloud::with_stiffness(vec![Vec3::ZERO], 0.5, 100.0).unwrap();
    assert_eq!(cloud.len(), 1);
    assert!(!cloud.is_empty());

    assert!(cloud.is_colliding(Vec3::new(0.3, 0.0, 0.0)));
    let f = cloud.repulse(Vec3::new(0.3, 0.0, 0.0));
    assert!((f.x - 20.0).abs() < 1e-9, "cloud force {f:?}");

    assert!(!cloud.is_colliding(Vec3::new(0.6, 0.0, 0.0)));
    assert_eq!(cloud.repulse(Vec3::new(0.6, 0.0, 0.0)), Vec3::ZERO);
    // Far outside the obstacle's grid neighborhood.
    assert_eq!(cloud.repulse(Vec3::new(2.0, 0.0, 0.0)), Vec3::ZERO);
}

#[test]
fn point_on_obstacle_has_no_push_direction() {
    let cloud = RepulsivePointCloud::new(vec![Vec3::ZERO], 0.5).unwrap();
    assert!(cloud.is_colliding(Vec3::ZERO));
    assert_eq!(cloud.repulse(Vec3::ZERO), Vec3::ZERO);
}

#[test]
fn point_cloud_forces_superpose() {
    let cloud = RepulsivePointCloud::with_stiffness(
        vec![Vec3::new(-0.3, 0.0, 0.0), Vec3::new(0.3, 0.0, 0.0)],
        0.5,
        100.0,
    )
    .unwrap();
    // Midway between two obstacles the pushes cancel.
    assert!(cloud.repulse(Vec3::ZERO).length() < 1e-12);
}

#[test]
fn point_cloud_radius_must_be_positive() {
    let err = RepulsivePointCloud::new(vec![Vec3::ZERO], 0.0).unwrap_err();
    assert!(matches!(err, ThalloError::InvalidConfig(_)), "got {err}");
}

// ─── Config Tests ─────────────────────────────────────────────

#[test]
fn repulsion_config_serde_round_trip() {
    let config = RepulsionConfig {
        stiffness: 3.5,
        freeze_threshold: Some(0.25),
        ..RepulsionConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let recovered: RepulsionConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(recovered.stiffness, 3.5);
    assert_eq!(recovered.adjacent_rest_scale, 0.9);
    assert_eq!(recovered.freeze_threshold, Some(0.25));
}
