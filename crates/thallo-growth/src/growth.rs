//! Growth factors and the edge-growth pass.
//!
//! Distances from the geodesic solver are normalized so sources sit at
//! factor 1 and the farthest vertex at factor 0, then reshaped by an
//! asymmetric smooth-step. The edge-growth pass scales each edge's
//! length by its blended endpoint factor and splits every edge that
//! exceeds the threshold.

use serde::{Deserialize, Serialize};
use thallo_contact::RepulsiveSurface;
use thallo_mesh::Geometry;
use thallo_types::constants::{DEFAULT_GROWTH_FADE, DEFAULT_GROWTH_SCALE, DEFAULT_GROWTH_ZONE};
use thallo_types::{Scalar, ThalloError, ThalloResult, VertexId};

use crate::geodesic::GeodesicSolver;

/// Asymmetric smooth-step with exponent derived from `fade` and
/// breakpoint `zone`.
///
/// Input is clamped to [0, 1]; the curve passes through `(zone, zone)`
/// and sharpens toward a plateau as `fade` approaches 1. Both
/// parameters must lie strictly inside (0, 1).
pub fn smooth_step(x: Scalar, fade: Scalar, zone: Scalar) -> Scalar {
    let x = x.clamp(0.0, 1.0);
    let c = 2.0 / (1.0 - fade) - 1.0;
    if x <= zone {
        (x / zone).powf(c) * zone
    } else {
        1.0 - ((1.0 - x) / (1.0 - zone)).powf(c) * (1.0 - zone)
    }
}

/// How an edge blends its two endpoint growth factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeBlend {
    /// Take the larger endpoint factor. Produces sharper growth fronts.
    Max,
    /// Average the endpoint factors.
    Average,
}

/// Configuration for the growth process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthConfig {
    /// Fade parameter of the smooth-step, in (0, 1). Larger values
    /// concentrate growth near the sources.
    pub fade: Scalar,

    /// Breakpoint of the smooth-step, in (0, 1).
    pub zone: Scalar,

    /// Multiplier applied to grown edge lengths before the threshold
    /// comparison.
    pub scale: Scalar,

    /// Endpoint blend policy for per-edge factors.
    pub blend: EdgeBlend,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            fade: DEFAULT_GROWTH_FADE,
            zone: DEFAULT_GROWTH_ZONE,
            scale: DEFAULT_GROWTH_SCALE,
            blend: EdgeBlend::Max,
        }
    }
}

impl GrowthConfig {
    /// Checks all parameters are in range.
    pub fn validate(&self) -> ThalloResult<()> {
        if !(self.fade > 0.0 && self.fade < 1.0) {
            return Err(ThalloError::InvalidConfig(format!(
                "Growth fade must lie in (0, 1), got {}",
                self.fade
            )));
        }
        if !(self.zone > 0.0 && self.zone < 1.0) {
            return Err(ThalloError::InvalidConfig(format!(
                "Growth zone must lie in (0, 1), got {}",
                self.zone
            )));
        }
        if self.scale <= 0.0 {
            return Err(ThalloError::InvalidConfig(format!(
                "Growth scale must be positive, got {}",
                self.scale
            )));
        }
        Ok(())
    }
}

/// Per-vertex growth factors in [0, 1].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrowthField {
    factors: Vec<Scalar>,
}

impl GrowthField {
    /// Normalizes a distance field into growth factors.
    ///
    /// Sources (distance 0) map to factor 1, the farthest vertex to
    /// factor 0, with the smooth-step applied in between. Non-finite
    /// distances and zero spread are rejected before any division.
    pub fn from_distances(distances: &[Scalar], fade: Scalar, zone: Scalar) -> ThalloResult<Self> {
        if distances.iter().any(|d| !d.is_finite()) {
            return Err(ThalloError::DegenerateGeometry(
                "Geodesic distance field contains non-finite values".into(),
            ));
        }
        let max = distances.iter().copied().fold(0.0, Scalar::max);
        if max <= 0.0 {
            return Err(ThalloError::DegenerateGeometry(format!(
                "Geodesic distance field has zero spread (max = {max})"
            )));
        }
        let factors = distances
            .iter()
            .map(|&d| smooth_step((max - d) / max, fade, zone))
            .collect();
        Ok(Self { factors })
    }

    /// Factor of a single vertex.
    #[inline]
    pub fn factor(&self, v: VertexId) -> Scalar {
        self.factors[v.index()]
    }

    /// All factors, indexed by vertex.
    pub fn factors(&self) -> &[Scalar] {
        &self.factors
    }

    /// Number of vertices covered.
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// True if no factors have been computed yet.
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}

/// Geodesic-driven edge growth.
///
/// Holds the source set, the geodesic solver, and the current growth
/// field. The field is recomputed lazily on first use and after every
/// [`grow_edges`](EdgeGrowth::grow_edges) pass so new vertices always
/// carry factors.
pub struct EdgeGrowth {
    /// Growth tunables.
    pub config: GrowthConfig,
    /// An edge whose grown length exceeds this splits.
    pub edge_threshold: Scalar,
    solver: Box<dyn GeodesicSolver>,
    sources: Vec<VertexId>,
    field: GrowthField,
}

impl std::fmt::Debug for EdgeGrowth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeGrowth")
            .field("config", &self.config)
            .field("edge_threshold", &self.edge_threshold)
            .field("solver", &self.solver.name())
            .field("sources", &self.sources)
            .field("field", &self.field)
            .finish()
    }
}

impl EdgeGrowth {
    /// Creates a growth process over a fixed source set.
    pub fn new(
        solver: Box<dyn GeodesicSolver>,
        edge_threshold: Scalar,
        sources: Vec<VertexId>,
        config: GrowthConfig,
    ) -> ThalloResult<Self> {
        config.validate()?;
        if edge_threshold <= 0.0 {
            return Err(ThalloError::InvalidConfig(format!(
                "Edge threshold must be positive, got {edge_threshold}"
            )));
        }
        if sources.is_empty() {
            return Err(ThalloError::InvalidConfig(
                "Growth needs at least one source vertex".into(),
            ));
        }
        Ok(Self {
            config,
            edge_threshold,
            solver,
            sources,
            field: GrowthField::default(),
        })
    }

    /// Current growth field.
    pub fn field(&self) -> &GrowthField {
        &self.field
    }

    /// Current per-vertex factors (empty before the first update).
    pub fn factors(&self) -> &[Scalar] {
        self.field.factors()
    }

    /// The fixed source vertices.
    pub fn sources(&self) -> &[VertexId] {
        &self.sources
    }

    /// Recomputes the growth field from current positions.
    ///
    /// Sources sitting inside an obstacle are dropped for this update;
    /// vertices inside an obstacle have their distance clamped to the
    /// field maximum so their factor is 0 and growth never pushes into
    /// the surface.
    pub fn update_factors(
        &mut self,
        geometry: &Geometry,
        surfaces: &[Box<dyn RepulsiveSurface>],
    ) -> ThalloResult<()> {
        let colliding =
            |v: VertexId| surfaces.iter().any(|s| s.is_colliding(geometry.position(v)));

        let active: Vec<VertexId> = self
            .sources
            .iter()
            .copied()
            .filter(|&v| !colliding(v))
            .collect();
        if active.is_empty() {
            return Err(ThalloError::DegenerateGeometry(
                "Every growth source is inside an obstacle".into(),
            ));
        }

        let mut distances = self.solver.distances(geometry, &active)?;
        if !surfaces.is_empty() {
            let max = distances.iter().copied().fold(0.0, Scalar::max);
            for v in geometry.mesh.vertex_ids() {
                if colliding(v) {
                    distances[v.index()] = max;
                }
            }
        }

        self.field = GrowthField::from_distances(&distances, self.config.fade, self.config.zone)?;
        Ok(())
    }

    /// One edge-growth pass: mark, split, refresh factors.
    ///
    /// Every edge whose length scaled by `(1 + factor)·scale` exceeds
    /// the threshold is queued during a read-only marking pass; queued
    /// edges are split afterwards so ids read while marking stay valid.
    /// Returns the number of edges split.
    pub fn grow_edges(
        &mut self,
        geometry: &mut Geometry,
        surfaces: &[Box<dyn RepulsiveSurface>],
    ) -> ThalloResult<usize> {
        if self.field.len() != geometry.vertex_count() {
            self.update_factors(geometry, surfaces)?;
        }

        let mut queue = Vec::new();
        for e in geometry.mesh.edge_ids() {
            let [a, b] = geometry.mesh.edge_vertices(e);
            let phi = match self.config.blend {
                EdgeBlend::Max => self.field.factor(a).max(self.field.factor(b)),
                EdgeBlend::Average => 0.5 * (self.field.factor(a) + self.field.factor(b)),
            };
            let grown = geometry.edge_length(e) * (1.0 + phi) * self.config.scale;
            if grown > self.edge_threshold {
                queue.push(e);
            }
        }

        for &e in &queue {
            geometry.split_edge(e)?;
        }

        // New vertices need factors before anything else reads the field.
        self.update_factors(geometry, surfaces)?;
        Ok(queue.len())
    }
}
