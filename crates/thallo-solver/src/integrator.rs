//! Semi-implicit time integration for growing surfaces.
//!
//! Each iteration assembles bending and repulsion at the current positions,
//! forms the velocity system
//!
//! ```text
//! A = I - (h²/m) · (J_bend + J_rep)
//! B = (h/m) · (F_bend + F_rep + F_surf) + h·g
//! ```
//!
//! solves `A·dV = B` with sparse Cholesky (falling back to QR when the
//! factorization is rejected), and advances positions by `dV·h`. Explicit
//! mode takes `dV = B` without a solve. Both force assemblers are optional;
//! an integrator with neither moves vertices only under gravity and
//! obstacle forces.

use serde::{Deserialize, Serialize};

use thallo_contact::{ParticleRepulsion, RepulsiveSurface};
use thallo_math::faer_solver::{CholeskySolver, QrSolver};
use thallo_math::sparse::{CsrMatrix, SparseSolver, TripletList};
use thallo_math::Vec3;
use thallo_mesh::Geometry;
use thallo_types::constants::{DEFAULT_ITERATIONS, DEFAULT_TIME_STEP};
use thallo_types::{Scalar, ThalloError, ThalloResult};

use crate::bending::DiscreteShells;

// ─── Configuration ────────────────────────────────────────────

/// How the velocity update is obtained each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegratorMode {
    /// Solve `A·dV = B` with the assembled force Jacobians.
    Implicit,
    /// Take `dV = B` without a solve.
    Explicit,
}

/// Tunables for [`Integrator`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegratorConfig {
    /// Time step `h`.
    pub time_step: Scalar,
    /// Iterations per [`Integrator::integrate`] call.
    pub iterations: u32,
    /// Uniform vertex mass.
    pub mass: Scalar,
    /// Velocity update scheme.
    pub mode: IntegratorMode,
    /// Retry a rejected Cholesky factorization with sparse QR.
    pub qr_fallback: bool,
    /// Leave bending out of the first iteration of every integrate call.
    pub skip_initial_bend: bool,
    /// Scale position updates by per-vertex growth factors when present.
    pub growth_scaled_updates: bool,
    /// Constant external acceleration.
    pub gravity: Vec3,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            time_step: DEFAULT_TIME_STEP,
            iterations: DEFAULT_ITERATIONS,
            mass: 1.0,
            mode: IntegratorMode::Implicit,
            qr_fallback: true,
            skip_initial_bend: false,
            growth_scaled_updates: true,
            gravity: Vec3::ZERO,
        }
    }
}

impl IntegratorConfig {
    /// Creates a config for the explicit scheme (no linear solve).
    pub fn explicit() -> Self {
        Self {
            mode: IntegratorMode::Explicit,
            ..Default::default()
        }
    }

    /// Checks that the config describes a usable integrator.
    pub fn validate(&self) -> ThalloResult<()> {
        if !(self.time_step > 0.0 && self.time_step.is_finite()) {
            return Err(ThalloError::InvalidConfig(format!(
                "Time step must be positive and finite, got {}",
                self.time_step
            )));
        }
        if self.iterations == 0 {
            return Err(ThalloError::InvalidConfig(
                "Integrator needs at least one iteration".into(),
            ));
        }
        if !(self.mass > 0.0 && self.mass.is_finite()) {
            return Err(ThalloError::InvalidConfig(format!(
                "Vertex mass must be positive and finite, got {}",
                self.mass
            )));
        }
        Ok(())
    }
}

// ─── Step inputs and reports ──────────────────────────────────

/// Per-call inputs that change as the surface grows.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    /// Rest positions paired with the current mesh topology.
    pub rest_positions: &'a [Vec3],
    /// Repulsion range, normally the scene edge length.
    pub resolution: Scalar,
    /// Implicit obstacles adding explicit forces.
    pub surfaces: &'a [Box<dyn RepulsiveSurface>],
    /// Per-vertex growth factors for repulsion freezing and update scaling.
    pub growth_factors: Option<&'a [Scalar]>,
}

/// What a single [`Integrator::step_once`] call did.
#[derive(Debug, Clone)]
pub struct IterationReport {
    /// Back end that produced the velocity update.
    pub solver: &'static str,
    /// True when Cholesky was rejected and QR stepped in.
    pub used_fallback: bool,
    /// Largest per-vertex position change.
    pub max_displacement: Scalar,
    /// Interior hinges assembled, zero when bending was skipped.
    pub bend_hinges: usize,
    /// Force-producing repulsion visits.
    pub repulsion_interactions: usize,
}

/// Aggregate over one [`Integrator::integrate`] call.
#[derive(Debug, Clone)]
pub struct IntegrationReport {
    /// Iterations completed.
    pub iterations: u32,
    /// Iterations that went through the QR fallback.
    pub qr_fallbacks: u32,
    /// Largest per-vertex position change over all iterations.
    pub max_displacement: Scalar,
}

// ─── Integrator ───────────────────────────────────────────────

/// Steps a [`Geometry`] through time under bending and repulsion.
#[derive(Debug, Clone)]
pub struct Integrator {
    pub config: IntegratorConfig,
    bending: Option<DiscreteShells>,
    repulsion: Option<ParticleRepulsion>,
}

impl Integrator {
    /// Creates an integrator with no force assemblers.
    pub fn new(config: IntegratorConfig) -> ThalloResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            bending: None,
            repulsion: None,
        })
    }

    /// Attaches a bending assembler.
    pub fn with_bending(mut self, bending: DiscreteShells) -> Self {
        self.bending = Some(bending);
        self
    }

    /// Attaches a particle-repulsion assembler.
    pub fn with_repulsion(mut self, repulsion: ParticleRepulsion) -> Self {
        self.repulsion = Some(repulsion);
        self
    }

    /// The attached bending assembler, if any.
    pub fn bending(&self) -> Option<&DiscreteShells> {
        self.bending.as_ref()
    }

    /// The attached repulsion assembler, if any.
    pub fn repulsion(&self) -> Option<&ParticleRepulsion> {
        self.repulsion.as_ref()
    }

    /// Runs `config.iterations` force/solve/update iterations.
    pub fn integrate(
        &self,
        geometry: &mut Geometry,
        ctx: &StepContext<'_>,
    ) -> ThalloResult<IntegrationReport> {
        let mut report = IntegrationReport {
            iterations: 0,
            qr_fallbacks: 0,
            max_displacement: 0.0,
        };
        for iteration in 0..self.config.iterations {
            let skip_bend = self.config.skip_initial_bend && iteration == 0;
            let step = self.step_once(geometry, ctx, skip_bend)?;
            report.iterations += 1;
            if step.used_fallback {
                report.qr_fallbacks += 1;
            }
            report.max_displacement = report.max_displacement.max(step.max_displacement);
        }
        Ok(report)
    }

    /// Runs one force/solve/update iteration.
    ///
    /// `skip_bend` leaves the bending assembler out of this iteration even
    /// when one is attached. Callers driving iterations themselves pass
    /// `config.skip_initial_bend` for the first one.
    pub fn step_once(
        &self,
        geometry: &mut Geometry,
        ctx: &StepContext<'_>,
        skip_bend: bool,
    ) -> ThalloResult<IterationReport> {
        let n = geometry.vertex_count();
        if let Some(factors) = ctx.growth_factors {
            if factors.len() != n {
                return Err(ThalloError::InvalidConfig(format!(
                    "Growth factor count ({}) != vertex count ({n})",
                    factors.len()
                )));
            }
        }

        let h = self.config.time_step;
        let inv_mass = 1.0 / self.config.mass;

        let bend = match (&self.bending, skip_bend) {
            (Some(shells), false) => Some(shells.assemble(geometry, ctx.rest_positions)?),
            _ => None,
        };
        let repulse = match &self.repulsion {
            Some(repulsion) => {
                Some(repulsion.assemble(geometry, ctx.resolution, ctx.growth_factors)?)
            }
            None => None,
        };

        // B = (h/m)·F + h·g per vertex.
        let mut rhs = vec![0.0; 3 * n];
        for (i, slot) in rhs.chunks_exact_mut(3).enumerate() {
            let mut force = Vec3::ZERO;
            if let Some(out) = &bend {
                force += out.forces[i];
            }
            if let Some(out) = &repulse {
                force += out.forces[i];
            }
            let p = geometry.positions()[i];
            for surface in ctx.surfaces {
                force += surface.repulse(p);
            }
            let b = force * (h * inv_mass) + self.config.gravity * h;
            slot[0] = b.x;
            slot[1] = b.y;
            slot[2] = b.z;
        }

        let mut velocity = vec![0.0; 3 * n];
        let (solver, used_fallback) = match self.config.mode {
            IntegratorMode::Explicit => {
                velocity.copy_from_slice(&rhs);
                ("explicit", false)
            }
            IntegratorMode::Implicit => {
                let mut system = TripletList::new(3 * n, 3 * n);
                system.push_diagonal(1.0);
                let scale = -h * h * inv_mass;
                if let Some(out) = &bend {
                    system.extend_scaled(&out.jacobian, scale);
                }
                if let Some(out) = &repulse {
                    system.extend_scaled(&out.jacobian, scale);
                }
                let matrix = system.to_csr();
                self.solve_velocity(&matrix, &rhs, &mut velocity)?
            }
        };

        let mut max_displacement = 0.0_f64;
        let factors = ctx.growth_factors.filter(|_| self.config.growth_scaled_updates);
        for (i, p) in geometry.positions_mut().iter_mut().enumerate() {
            let dv = Vec3::new(velocity[3 * i], velocity[3 * i + 1], velocity[3 * i + 2]);
            let mut step = dv * h;
            if let Some(factors) = factors {
                step *= factors[i];
            }
            *p += step;
            max_displacement = max_displacement.max(step.length());
        }

        Ok(IterationReport {
            solver,
            used_fallback,
            max_displacement,
            bend_hinges: bend.as_ref().map_or(0, |out| out.hinges),
            repulsion_interactions: repulse.as_ref().map_or(0, |out| out.interactions),
        })
    }

    fn solve_velocity(
        &self,
        matrix: &CsrMatrix,
        rhs: &[Scalar],
        velocity: &mut [Scalar],
    ) -> ThalloResult<(&'static str, bool)> {
        let mut cholesky = CholeskySolver::new();
        let attempt = cholesky
            .factorize(matrix)
            .and_then(|_| cholesky.solve(rhs, velocity));
        match attempt {
            Ok(()) => Ok(("cholesky", false)),
            Err(_) if self.config.qr_fallback => {
                let mut qr = QrSolver::new();
                qr.factorize(matrix)
                    .map_err(|detail| ThalloError::SolverFailure {
                        stage: "qr factorize",
                        detail,
                    })?;
                qr.solve(rhs, velocity)
                    .map_err(|detail| ThalloError::SolverFailure {
                        stage: "qr solve",
                        detail,
                    })?;
                Ok(("qr", true))
            }
            Err(detail) => Err(ThalloError::SolverFailure {
                stage: "cholesky",
                detail,
            }),
        }
    }
}
