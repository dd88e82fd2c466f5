//! Integration tests for thallo-solver.

use std::f64::consts::{FRAC_PI_2, PI};

use thallo_contact::{ParticleRepulsion, RepulsionConfig, RepulsivePlane, RepulsiveSurface};
use thallo_math::Vec3;
use thallo_mesh::generators::hex_disk;
use thallo_mesh::Geometry;
use thallo_solver::{
    dihedral_angle, BendingConfig, DiscreteShells, Integrator, IntegratorConfig, IntegratorMode,
    StepContext,
};
use thallo_types::{Scalar, ThalloError};

// ─── Helpers ──────────────────────────────────────────────────

/// Two triangles sharing the hinge edge (0, 1), wings at vertices 2 and 3.
/// Rest state is flat; `wing` replaces vertex 2 in the current state.
fn hinge_quad(wing: Vec3) -> (Geometry, Vec<Vec3>) {
    let rest = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.5, 1.0, 0.0),
        Vec3::new(0.5, -1.0, 0.0),
    ];
    let mut current = rest.clone();
    current[2] = wing;
    let geometry = Geometry::from_faces(current, &[[0, 1, 2], [1, 0, 3]]).unwrap();
    (geometry, rest)
}

/// Two separated unit-gap triangles; only vertices 0 and 3 come within the
/// unit repulsion cutoff. Side 1.5 keeps every other pair outside it.
fn two_triangles(gap: Scalar) -> Geometry {
    let side = 1.5;
    let height = side * 3.0_f64.sqrt() / 2.0;
    let positions = vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(side, 0.0, 0.0),
        Vec3::new(side / 2.0, height, 0.0),
        Vec3::new(-gap, 0.0, 0.0),
        Vec3::new(-gap - side, 0.0, 0.0),
        Vec3::new(-gap - side / 2.0, -height, 0.0),
    ];
    Geometry::from_faces(positions, &[[0, 1, 2], [3, 4, 5]]).unwrap()
}

fn lone_triangle() -> Geometry {
    Geometry::from_faces(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.5, 0.0, 0.0),
            Vec3::new(0.75, 2.0, 0.0),
        ],
        &[[0, 1, 2]],
    )
    .unwrap()
}

fn bending(stiffness: Scalar) -> DiscreteShells {
    DiscreteShells::new(BendingConfig {
        stiffness,
        ..Default::default()
    })
}

fn repulsion(stiffness: Scalar) -> ParticleRepulsion {
    ParticleRepulsion::new(RepulsionConfig {
        stiffness,
        ..Default::default()
    })
}

fn context<'a>(rest: &'a [Vec3]) -> StepContext<'a> {
    StepContext {
        rest_positions: rest,
        resolution: 1.0,
        surfaces: &[],
        growth_factors: None,
    }
}

fn assert_close(actual: Vec3, expected: Vec3, tolerance: f64, label: &str) {
    assert!(
        (actual - expected).length() <= tolerance,
        "{label}: {actual} != {expected}"
    );
}

// ─── Dihedral Angle ───────────────────────────────────────────

#[test]
fn dihedral_of_coplanar_faces_is_zero() {
    assert_eq!(dihedral_angle(Vec3::Z, Vec3::Z, Vec3::X), 0.0);
}

#[test]
fn dihedral_sign_follows_edge_direction() {
    let n1 = Vec3::new(0.0, -1.0, 0.0);
    let n2 = Vec3::Z;
    let folded = dihedral_angle(n1, n2, Vec3::X);
    assert!(
        (folded + FRAC_PI_2).abs() <= 1e-12,
        "fold angle {folded} != -pi/2"
    );
    // Swapping the faces mirrors the sign.
    assert!(
        (dihedral_angle(n2, n1, Vec3::X) - FRAC_PI_2).abs() <= 1e-12,
        "swapped fold should negate the angle"
    );
}

// ─── Bending Forces ───────────────────────────────────────────

#[test]
fn flat_disk_carries_no_bending_force() {
    let disk = hex_disk(2, 1.0).unwrap();
    let rest = disk.positions().to_vec();
    let out = DiscreteShells::default().assemble(&disk, &rest).unwrap();

    assert_eq!(out.hinges, 30, "hex disk with two rings has 30 hinges");
    assert!(!out.jacobian.is_empty());
    for (i, force) in out.forces.iter().enumerate() {
        assert_eq!(*force, Vec3::ZERO, "vertex {i} should be force-free");
    }
}

#[test]
fn translation_leaves_bending_forces_zero() {
    let mut disk = hex_disk(2, 1.0).unwrap();
    let rest = disk.positions().to_vec();
    for p in disk.positions_mut() {
        *p += Vec3::new(2.0, -1.0, 3.0);
    }

    // Angles are translation invariant; the cutoff absorbs round-off.
    let out = DiscreteShells::default().assemble(&disk, &rest).unwrap();
    for (i, force) in out.forces.iter().enumerate() {
        assert_eq!(*force, Vec3::ZERO, "vertex {i} should be force-free");
    }
}

#[test]
fn folded_hinge_forces_match_hand_computation() {
    // Wing 2 lifted to fold the hinge to -pi/2. With kb = 1 the hinge
    // magnitude is 6 * (pi/2) = 3*pi, the wing altitudes are 1, and the
    // endpoint weights are exactly 1/2.
    let (geometry, rest) = hinge_quad(Vec3::new(0.5, 0.0, 1.0));
    let out = bending(1.0).assemble(&geometry, &rest).unwrap();

    assert_eq!(out.hinges, 1);
    let magnitude = 3.0 * PI;
    assert_close(
        out.forces[2],
        Vec3::new(0.0, magnitude, 0.0),
        1e-9,
        "lifted wing",
    );
    assert_close(
        out.forces[3],
        Vec3::new(0.0, 0.0, -magnitude),
        1e-9,
        "flat wing",
    );
    let endpoint = Vec3::new(0.0, -magnitude / 2.0, magnitude / 2.0);
    assert_close(out.forces[0], endpoint, 1e-9, "endpoint 0");
    assert_close(out.forces[1], endpoint, 1e-9, "endpoint 1");

    let total: Vec3 = out.forces.iter().copied().sum();
    assert!(
        total.length() <= 1e-9,
        "hinge forces should cancel, got {total}"
    );
}

#[test]
fn bending_force_scales_linearly_with_stiffness() {
    let (geometry, rest) = hinge_quad(Vec3::new(0.5, 0.3, 0.8));
    let single = bending(1.0).assemble(&geometry, &rest).unwrap();
    let double = bending(2.0).assemble(&geometry, &rest).unwrap();

    for i in 0..4 {
        assert_close(
            double.forces[i],
            single.forces[i] * 2.0,
            1e-9,
            "doubled stiffness",
        );
    }
}

#[test]
fn force_cutoff_zeroes_small_forces() {
    let (geometry, rest) = hinge_quad(Vec3::new(0.5, 1.0, 1e-8));

    let default_out = bending(1.0).assemble(&geometry, &rest).unwrap();
    assert!(
        default_out.forces.iter().any(|f| f.length() > 0.0),
        "a barely folded hinge should still push"
    );

    let blunt = DiscreteShells::new(BendingConfig {
        stiffness: 1.0,
        force_cutoff: 1.0,
    });
    let out = blunt.assemble(&geometry, &rest).unwrap();
    for force in &out.forces {
        assert_eq!(*force, Vec3::ZERO);
    }
}

#[test]
fn lone_triangle_has_no_hinges() {
    let geometry = lone_triangle();
    let rest = geometry.positions().to_vec();
    let out = DiscreteShells::default().assemble(&geometry, &rest).unwrap();

    assert_eq!(out.hinges, 0);
    assert!(out.jacobian.is_empty());
    assert!(out.forces.iter().all(|f| *f == Vec3::ZERO));
}

#[test]
fn degenerate_rest_face_is_rejected() {
    let (geometry, mut rest) = hinge_quad(Vec3::new(0.5, 0.0, 1.0));
    rest[2] = Vec3::new(0.5, 0.0, 0.0); // collinear with the hinge edge
    let err = bending(1.0).assemble(&geometry, &rest).unwrap_err();
    assert!(matches!(err, ThalloError::DegenerateGeometry(_)), "{err}");
}

#[test]
fn rest_position_count_must_match() {
    let (geometry, rest) = hinge_quad(Vec3::new(0.5, 0.0, 1.0));
    let err = bending(1.0).assemble(&geometry, &rest[..3]).unwrap_err();
    assert!(matches!(err, ThalloError::InvalidConfig(_)), "{err}");
}

// ─── Bending Jacobian ─────────────────────────────────────────

#[test]
fn jacobian_annihilates_translations() {
    let (geometry, rest) = hinge_quad(Vec3::new(0.5, 0.0, 1.0));
    let quad = bending(1.0).assemble(&geometry, &rest).unwrap();
    let disk = hex_disk(2, 1.0).unwrap();
    let disk_rest = disk.positions().to_vec();
    let flat = DiscreteShells::default().assemble(&disk, &disk_rest).unwrap();

    for (label, out, n) in [("folded quad", &quad, 4), ("flat disk", &flat, 19)] {
        let matrix = out.jacobian.to_csr();
        for axis in 0..3 {
            let mut translation = vec![0.0; 3 * n];
            for i in 0..n {
                translation[3 * i + axis] = 1.0;
            }
            let image = matrix.mul_vec(&translation);
            let worst = image.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
            assert!(
                worst <= 1e-9,
                "{label}: translation along axis {axis} maps to {worst}"
            );
        }
    }
}

#[test]
fn jacobian_is_symmetric_with_nonpositive_diagonal() {
    let (geometry, rest) = hinge_quad(Vec3::new(0.5, 0.0, 1.0));
    let out = bending(1.0).assemble(&geometry, &rest).unwrap();
    let matrix = out.jacobian.to_csr();

    let mut columns = Vec::new();
    for k in 0..12 {
        let mut probe = vec![0.0; 12];
        probe[k] = 1.0;
        columns.push(matrix.mul_vec(&probe));
    }
    for i in 0..12 {
        assert!(
            columns[i][i] <= 1e-12,
            "diagonal entry {i} is {}",
            columns[i][i]
        );
        for j in 0..12 {
            assert!(
                (columns[i][j] - columns[j][i]).abs() <= 1e-12,
                "asymmetry at ({i}, {j})"
            );
        }
    }
}

#[test]
fn jacobian_predicts_force_change_at_rest() {
    // At the rest state the Gauss-Newton Jacobian is the exact force
    // Jacobian, so J·dx must match the force after a small perturbation.
    let (geometry, rest) = hinge_quad(Vec3::new(0.5, 1.0, 0.0));
    let shells = bending(1.0);
    let flat = shells.assemble(&geometry, &rest).unwrap();
    let matrix = flat.jacobian.to_csr();

    let lift = 1e-6;
    let mut dx = vec![0.0; 12];
    dx[3 * 2 + 2] = lift;
    let predicted = matrix.mul_vec(&dx);

    let (perturbed, _) = hinge_quad(Vec3::new(0.5, 1.0, lift));
    let out = shells.assemble(&perturbed, &rest).unwrap();
    for i in 0..4 {
        let expected = Vec3::new(predicted[3 * i], predicted[3 * i + 1], predicted[3 * i + 2]);
        assert_close(out.forces[i], expected, 1e-9, "predicted force");
    }
}

// ─── Integrator: explicit ─────────────────────────────────────

#[test]
fn explicit_step_matches_hand_computation() {
    // Vertices 0 and 3 sit at half their pair rest length 1.1, so the
    // repulsion force is k * 0.55 and one explicit step moves each by
    // k * 0.55 * h^2.
    let mut geometry = two_triangles(0.55);
    let rest = geometry.positions().to_vec();
    let integrator = Integrator::new(IntegratorConfig::explicit())
        .unwrap()
        .with_repulsion(repulsion(10.0));

    let report = integrator
        .step_once(&mut geometry, &context(&rest), false)
        .unwrap();

    assert_eq!(report.solver, "explicit");
    assert!(!report.used_fallback);
    assert_eq!(report.repulsion_interactions, 2);

    let push = 10.0 * 0.55 * 0.01 * 0.01;
    assert!(
        (geometry.positions()[0].x - push).abs() <= 1e-9,
        "vertex 0 moved {}",
        geometry.positions()[0].x
    );
    assert!(
        (geometry.positions()[3].x - (-0.55 - push)).abs() <= 1e-9,
        "vertex 3 moved {}",
        geometry.positions()[3].x
    );
    assert!((report.max_displacement - push).abs() <= 1e-9);
    // The far vertices never saw a force.
    assert_eq!(geometry.positions()[1], rest[1]);
    assert_eq!(geometry.positions()[4], rest[4]);
}

#[test]
fn gravity_moves_every_vertex() {
    let drop = 9.8 * 0.01 * 0.01;
    for mode in [IntegratorMode::Explicit, IntegratorMode::Implicit] {
        let mut geometry = lone_triangle();
        let rest = geometry.positions().to_vec();
        let config = IntegratorConfig {
            mode,
            gravity: Vec3::new(0.0, 0.0, -9.8),
            ..Default::default()
        };
        let integrator = Integrator::new(config).unwrap();

        integrator
            .step_once(&mut geometry, &context(&rest), false)
            .unwrap();

        for (i, p) in geometry.positions().iter().enumerate() {
            assert!(
                (p.z - (rest[i].z - drop)).abs() <= 1e-12,
                "{mode:?}: vertex {i} at z = {}",
                p.z
            );
            assert_eq!(p.x, rest[i].x);
            assert_eq!(p.y, rest[i].y);
        }
    }
}

#[test]
fn growth_factors_scale_position_updates() {
    let mut geometry = lone_triangle();
    let rest = geometry.positions().to_vec();
    let factors = vec![0.0, 1.0, 0.5];
    let config = IntegratorConfig {
        gravity: Vec3::new(0.0, 0.0, -9.8),
        ..IntegratorConfig::explicit()
    };
    let integrator = Integrator::new(config).unwrap();

    let mut ctx = context(&rest);
    ctx.growth_factors = Some(&factors);
    integrator.step_once(&mut geometry, &ctx, false).unwrap();

    let drop = 9.8 * 0.01 * 0.01;
    assert_eq!(geometry.positions()[0].z, 0.0, "frozen vertex stays put");
    assert!((geometry.positions()[1].z - (-drop)).abs() <= 1e-12);
    assert!((geometry.positions()[2].z - (-0.5 * drop)).abs() <= 1e-12);
}

#[test]
fn growth_scaling_can_be_disabled() {
    let mut geometry = lone_triangle();
    let rest = geometry.positions().to_vec();
    let factors = vec![0.0, 0.0, 0.0];
    let config = IntegratorConfig {
        gravity: Vec3::new(0.0, 0.0, -9.8),
        growth_scaled_updates: false,
        ..IntegratorConfig::explicit()
    };
    let integrator = Integrator::new(config).unwrap();

    let mut ctx = context(&rest);
    ctx.growth_factors = Some(&factors);
    integrator.step_once(&mut geometry, &ctx, false).unwrap();

    let drop = 9.8 * 0.01 * 0.01;
    for (i, p) in geometry.positions().iter().enumerate() {
        assert!(
            (p.z - (rest[i].z - drop)).abs() <= 1e-12,
            "vertex {i} should ignore its zero factor"
        );
    }
}

#[test]
fn iterations_accumulate_displacement() {
    let mut geometry = lone_triangle();
    let rest = geometry.positions().to_vec();
    let config = IntegratorConfig {
        iterations: 3,
        gravity: Vec3::new(0.0, 0.0, -9.8),
        ..IntegratorConfig::explicit()
    };
    let integrator = Integrator::new(config).unwrap();

    let report = integrator.integrate(&mut geometry, &context(&rest)).unwrap();

    assert_eq!(report.iterations, 3);
    let drop = 3.0 * 9.8 * 0.01 * 0.01;
    assert!(
        (geometry.positions()[0].z - (-drop)).abs() <= 1e-9,
        "three iterations should stack"
    );
}

#[test]
fn surfaces_add_explicit_forces() {
    let mut geometry = Geometry::from_faces(
        vec![
            Vec3::new(0.0, 0.0, -0.1),
            Vec3::new(1.5, 0.0, 0.2),
            Vec3::new(0.75, 2.0, 0.2),
        ],
        &[[0, 1, 2]],
    )
    .unwrap();
    let rest = geometry.positions().to_vec();
    let surfaces: Vec<Box<dyn RepulsiveSurface>> = vec![Box::new(
        RepulsivePlane::with_stiffness(Vec3::Z, 0.0, 100.0).unwrap(),
    )];
    let integrator = Integrator::new(IntegratorConfig::explicit()).unwrap();

    let mut ctx = context(&rest);
    ctx.surfaces = &surfaces;
    integrator.step_once(&mut geometry, &ctx, false).unwrap();

    // Only vertex 0 is below the plane; it gets k * depth * h^2.
    let lift = 100.0 * 0.1 * 0.01 * 0.01;
    assert!(
        (geometry.positions()[0].z - (-0.1 + lift)).abs() <= 1e-9,
        "submerged vertex should surface"
    );
    assert_eq!(geometry.positions()[1], rest[1]);
    assert_eq!(geometry.positions()[2], rest[2]);
}

// ─── Integrator: implicit ─────────────────────────────────────

#[test]
fn implicit_step_damps_the_explicit_displacement() {
    let mut geometry = two_triangles(0.55);
    let rest = geometry.positions().to_vec();
    let integrator = Integrator::new(IntegratorConfig::default())
        .unwrap()
        .with_repulsion(repulsion(10.0));

    let report = integrator
        .step_once(&mut geometry, &context(&rest), false)
        .unwrap();

    assert_eq!(report.solver, "cholesky");
    assert!(!report.used_fallback);

    // Along the pair axis A couples the two x dofs symmetrically, so the
    // antisymmetric force mode solves to B / (1 + 2*k*h^2).
    let explicit_push = 10.0 * 0.55 * 0.01 * 0.01;
    let push = explicit_push / (1.0 + 2.0 * 10.0 * 0.01 * 0.01);
    assert!(
        (geometry.positions()[0].x - push).abs() <= 1e-9,
        "vertex 0 moved {}",
        geometry.positions()[0].x
    );
    assert!(
        (geometry.positions()[3].x - (-0.55 - push)).abs() <= 1e-9,
        "vertex 3 moved {}",
        geometry.positions()[3].x
    );
    assert!(push < explicit_push, "implicit update must damp");
    assert!(
        geometry.positions()[0].y.abs() <= 1e-12,
        "no transverse drift"
    );
}

#[test]
fn indefinite_system_falls_back_to_qr() {
    // A long step makes the transverse repulsion modes indefinite, which
    // Cholesky rejects.
    let mut geometry = two_triangles(0.55);
    let rest = geometry.positions().to_vec();
    let config = IntegratorConfig {
        time_step: 0.4,
        ..Default::default()
    };
    let integrator = Integrator::new(config)
        .unwrap()
        .with_repulsion(repulsion(10.0));

    let report = integrator
        .step_once(&mut geometry, &context(&rest), false)
        .unwrap();

    assert_eq!(report.solver, "qr");
    assert!(report.used_fallback);
    let push = 0.4 * 0.4 * 5.5 / (1.0 + 2.0 * 10.0 * 0.4 * 0.4);
    assert!(
        (geometry.positions()[0].x - push).abs() <= 1e-9,
        "vertex 0 moved {}",
        geometry.positions()[0].x
    );
    assert!(geometry.positions().iter().all(|p| p.is_finite()));
}

#[test]
fn fallback_can_be_disabled() {
    let mut geometry = two_triangles(0.55);
    let rest = geometry.positions().to_vec();
    let config = IntegratorConfig {
        time_step: 0.4,
        qr_fallback: false,
        ..Default::default()
    };
    let integrator = Integrator::new(config)
        .unwrap()
        .with_repulsion(repulsion(10.0));

    let err = integrator
        .step_once(&mut geometry, &context(&rest), false)
        .unwrap_err();
    match err {
        ThalloError::SolverFailure { stage, .. } => assert_eq!(stage, "cholesky"),
        other => panic!("expected solver failure, got {other}"),
    }
}

#[test]
fn skip_initial_bend_delays_bending_forces() {
    let (mut geometry, rest) = hinge_quad(Vec3::new(0.5, 0.0, 1.0));
    let integrator = Integrator::new(IntegratorConfig::default())
        .unwrap()
        .with_bending(bending(1.0));

    let skipped = integrator
        .step_once(&mut geometry, &context(&rest), true)
        .unwrap();
    assert_eq!(skipped.bend_hinges, 0);
    assert_eq!(skipped.max_displacement, 0.0);

    let stepped = integrator
        .step_once(&mut geometry, &context(&rest), false)
        .unwrap();
    assert_eq!(stepped.bend_hinges, 1);
    assert!(stepped.max_displacement > 0.0, "the fold should relax");

    // The config flag wires the same skip into integrate().
    let (mut fresh, fresh_rest) = hinge_quad(Vec3::new(0.5, 0.0, 1.0));
    let lazy = Integrator::new(IntegratorConfig {
        skip_initial_bend: true,
        ..Default::default()
    })
    .unwrap()
    .with_bending(bending(1.0));
    let report = lazy.integrate(&mut fresh, &context(&fresh_rest)).unwrap();
    assert_eq!(report.max_displacement, 0.0);
}

#[test]
fn bending_step_reduces_fold_angle() {
    let (mut geometry, rest) = hinge_quad(Vec3::new(0.5, 0.0, 1.0));
    let shells = bending(1.0);
    let before = shells.assemble(&geometry, &rest).unwrap();
    let integrator = Integrator::new(IntegratorConfig::default())
        .unwrap()
        .with_bending(shells.clone());

    integrator
        .step_once(&mut geometry, &context(&rest), false)
        .unwrap();

    let after = shells.assemble(&geometry, &rest).unwrap();
    let residual = |forces: &[Vec3]| forces.iter().map(|f| f.length()).sum::<Scalar>();
    assert!(
        residual(&after.forces) < residual(&before.forces),
        "one implicit step should relax the hinge"
    );
}

// ─── Configuration ────────────────────────────────────────────

#[test]
fn config_rejects_bad_values() {
    let bad_step = IntegratorConfig {
        time_step: 0.0,
        ..Default::default()
    };
    assert!(Integrator::new(bad_step).is_err());

    let bad_iterations = IntegratorConfig {
        iterations: 0,
        ..Default::default()
    };
    assert!(Integrator::new(bad_iterations).is_err());

    let bad_mass = IntegratorConfig {
        mass: -1.0,
        ..Default::default()
    };
    assert!(Integrator::new(bad_mass).is_err());
}

#[test]
fn explicit_preset_skips_the_solve() {
    let config = IntegratorConfig::explicit();
    assert_eq!(config.mode, IntegratorMode::Explicit);
    assert_eq!(config.time_step, 0.01);
}

#[test]
fn integrator_config_round_trips_through_serde() {
    let config = IntegratorConfig {
        time_step: 0.02,
        iterations: 4,
        mode: IntegratorMode::Explicit,
        qr_fallback: false,
        gravity: Vec3::new(0.0, -9.8, 0.0),
        ..Default::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: IntegratorConfig = serde_json::from_str(&json).unwrap();

    assert_eq!(back.time_step, 0.02);
    assert_eq!(back.iterations, 4);
    assert_eq!(back.mode, IntegratorMode::Explicit);
    assert!(!back.qr_fallback);
    assert_eq!(back.gravity, Vec3::new(0.0, -9.8, 0.0));
}

#[test]
fn bending_config_round_trips_through_serde() {
    let config = BendingConfig {
        stiffness: 42.0,
        force_cutoff: 1e-6,
    };
    let json = serde_json::to_string(&config).unwrap();
    let back: BendingConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.stiffness, 42.0);
    assert_eq!(back.force_cutoff, 1e-6);
}
