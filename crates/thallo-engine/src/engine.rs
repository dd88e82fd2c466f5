//! The growth-step pipeline.
//!
//! One [`GrowthEngine::step`] call runs the full cycle:
//!
//! ```text
//! grow edges -> integrate forces -> rebalance -> smooth
//! ```
//!
//! Growth runs first so the solver relaxes the surface with the new
//! vertices already in place. The positions recorded right after
//! growth serve as the rest state for bending, so each step measures
//! angles against the shape the surface just grew into.

use serde::{Deserialize, Serialize};
use thallo_contact::RepulsiveSurface;
use thallo_growth::EdgeGrowth;
use thallo_mesh::Geometry;
use thallo_solver::{Integrator, StepContext};
use thallo_types::constants::DEFAULT_SMOOTHING_SCALE;
use thallo_types::{Scalar, ThalloError, ThalloResult};

use crate::events::{GrowthEvent, GrowthEventKind};
use crate::relaxation;
use crate::sinks::EventSink;
use crate::snapshot::EngineSnapshot;

// ─── Configuration ────────────────────────────────────────────

/// Engine-level tunables. Force and growth parameters live on the
/// [`Integrator`] and [`EdgeGrowth`] the engine is built with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Strength of the per-step smoothing pass. Zero disables it.
    pub smoothing_scale: Scalar,
    /// Run the Delaunay flip pass after integration.
    pub rebalance: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            smoothing_scale: DEFAULT_SMOOTHING_SCALE,
            rebalance: true,
        }
    }
}

impl EngineConfig {
    /// Checks the configuration, returning the first problem found.
    pub fn validate(&self) -> ThalloResult<()> {
        if !(self.smoothing_scale >= 0.0 && self.smoothing_scale.is_finite()) {
            return Err(ThalloError::InvalidConfig(format!(
                "Smoothing scale must be non-negative and finite, got {}",
                self.smoothing_scale
            )));
        }
        Ok(())
    }
}

// ─── Step report ──────────────────────────────────────────────

/// What one growth step did.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Index of the completed step (0-based).
    pub step: u64,
    /// Edges split by growth.
    pub splits: usize,
    /// Edges flipped by rebalancing.
    pub flips: usize,
    /// Integrator iterations run.
    pub iterations: u32,
    /// Iterations that went through the QR fallback.
    pub qr_fallbacks: u32,
    /// Largest per-vertex position change over all iterations.
    pub max_displacement: Scalar,
    /// Vertex count after the step.
    pub vertices: usize,
    /// Edge count after the step.
    pub edges: usize,
}

// ─── Engine ───────────────────────────────────────────────────

/// Drives a growing surface through repeated grow/relax cycles.
///
/// The engine owns the mesh, the growth model, the integrator, any
/// obstacle surfaces, and the event sinks. The repulsion resolution is
/// fixed at construction from the mean edge length of the starting
/// mesh, so refinement never shrinks the interaction range.
pub struct GrowthEngine {
    config: EngineConfig,
    geometry: Geometry,
    growth: EdgeGrowth,
    integrator: Integrator,
    surfaces: Vec<Box<dyn RepulsiveSurface>>,
    sinks: Vec<Box<dyn EventSink>>,
    resolution: Scalar,
    step: u64,
}

impl GrowthEngine {
    /// Builds an engine around a starting mesh.
    pub fn new(
        geometry: Geometry,
        growth: EdgeGrowth,
        integrator: Integrator,
        config: EngineConfig,
    ) -> ThalloResult<Self> {
        config.validate()?;
        let resolution = geometry.mean_edge_length();
        if resolution <= 0.0 {
            return Err(ThalloError::InvalidMesh(
                "Engine needs a starting mesh with at least one edge".into(),
            ));
        }
        Ok(Self {
            config,
            geometry,
            growth,
            integrator,
            surfaces: Vec::new(),
            sinks: Vec::new(),
            resolution,
            step: 0,
        })
    }

    /// Adds an obstacle surface the growing mesh is pushed away from.
    pub fn with_surface(mut self, surface: Box<dyn RepulsiveSurface>) -> Self {
        self.surfaces.push(surface);
        self
    }

    /// Registers an event sink.
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// The current surface.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// The growth model, including the current factor field.
    pub fn growth(&self) -> &EdgeGrowth {
        &self.growth
    }

    /// The integrator and its force assemblers.
    pub fn integrator(&self) -> &Integrator {
        &self.integrator
    }

    /// Repulsion interaction range, fixed at construction.
    pub fn resolution(&self) -> Scalar {
        self.resolution
    }

    /// Growth steps completed so far.
    pub fn steps_completed(&self) -> u64 {
        self.step
    }

    /// Captures the current state for serialization.
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot::capture(self.step, &self.geometry, self.growth.factors())
    }

    /// Runs one full growth step and reports what it did.
    pub fn step(&mut self) -> ThalloResult<StepReport> {
        let step = self.step;
        self.emit(GrowthEventKind::StepBegin {
            vertices: self.geometry.vertex_count(),
            edges: self.geometry.edge_count(),
        });

        // Grow: split over-threshold edges and refresh the factor field.
        let splits = self.growth.grow_edges(&mut self.geometry, &self.surfaces)?;
        self.emit(GrowthEventKind::EdgesSplit { count: splits });

        // Integrate against the post-growth positions as rest state.
        let rest = self.geometry.positions().to_vec();
        let mut iterations = 0;
        let mut qr_fallbacks = 0;
        let mut max_displacement: Scalar = 0.0;
        for iteration in 0..self.integrator.config.iterations {
            let skip_bend = self.integrator.config.skip_initial_bend && iteration == 0;
            let ctx = StepContext {
                rest_positions: &rest,
                resolution: self.resolution,
                surfaces: &self.surfaces,
                growth_factors: Some(self.growth.factors()),
            };
            let report = self.integrator.step_once(&mut self.geometry, &ctx, skip_bend)?;
            iterations += 1;
            if report.used_fallback {
                qr_fallbacks += 1;
            }
            max_displacement = max_displacement.max(report.max_displacement);
            self.emit(GrowthEventKind::IntegratorIteration {
                iteration,
                solver: report.solver.to_string(),
                max_displacement: report.max_displacement,
            });
        }

        // Relax the triangulation, then the vertex spacing.
        let flips = if self.config.rebalance {
            relaxation::rebalance(&mut self.geometry)
        } else {
            0
        };
        self.emit(GrowthEventKind::EdgesFlipped { count: flips });
        relaxation::smooth(
            &mut self.geometry,
            self.growth.factors(),
            self.config.smoothing_scale,
        )?;

        self.emit(GrowthEventKind::StepEnd {
            vertices: self.geometry.vertex_count(),
            edges: self.geometry.edge_count(),
            max_displacement,
        });
        self.step += 1;

        Ok(StepReport {
            step,
            splits,
            flips,
            iterations,
            qr_fallbacks,
            max_displacement,
            vertices: self.geometry.vertex_count(),
            edges: self.geometry.edge_count(),
        })
    }

    /// Runs `count` growth steps, stopping at the first failure.
    pub fn run(&mut self, count: u64) -> ThalloResult<Vec<StepReport>> {
        let mut reports = Vec::with_capacity(count as usize);
        for _ in 0..count {
            reports.push(self.step()?);
        }
        self.finalize();
        Ok(reports)
    }

    /// Tells every sink the run is over.
    pub fn finalize(&mut self) {
        for sink in &mut self.sinks {
            sink.finalize();
        }
    }

    fn emit(&mut self, kind: GrowthEventKind) {
        if self.sinks.is_empty() {
            return;
        }
        let event = GrowthEvent::new(self.step, kind);
        for sink in &mut self.sinks {
            sink.handle(&event);
        }
    }
}
