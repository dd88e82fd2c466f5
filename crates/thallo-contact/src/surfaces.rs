//! Implicit repulsive obstacles.
//!
//! Surfaces the growing mesh must not cross, modeled as a capability
//! trait with two variants: an infinite plane and a static point cloud.
//! Surfaces contribute to the force vector only (explicit treatment, no
//! Jacobian); the growth process additionally uses `is_colliding` to
//! keep geodesic sources out of obstacles.

use thallo_math::Vec3;
use thallo_types::constants::{DEFAULT_SURFACE_STIFFNESS, EPSILON};
use thallo_types::{Scalar, ThalloError, ThalloResult};

use crate::spatial_hash::SpatialGrid;

/// An implicit obstacle that pushes back on penetrating points.
pub trait RepulsiveSurface: Send {
    /// True if `point` is inside the surface's exclusion region.
    fn is_colliding(&self, point: Vec3) -> bool;

    /// Restoring force on a point (zero outside the exclusion region).
    fn repulse(&self, point: Vec3) -> Vec3;
}

/// Half-space obstacle: points with `n̂·p < offset` are inside.
#[derive(Debug)]
pub struct RepulsivePlane {
    normal: Vec3,
    /// Signed plane offset along the normal.
    pub offset: Scalar,
    /// Spring stiffness of the push-out force.
    pub stiffness: Scalar,
}

impl RepulsivePlane {
    /// Creates a plane with unit normal and the default stiffness.
    pub fn new(normal: Vec3, offset: Scalar) -> ThalloResult<Self> {
        Self::with_stiffness(normal, offset, DEFAULT_SURFACE_STIFFNESS)
    }

    /// Creates a plane with an explicit stiffness.
    pub fn with_stiffness(normal: Vec3, offset: Scalar, stiffness: Scalar) -> ThalloResult<Self> {
        let len = normal.length();
        if len < EPSILON {
            return Err(ThalloError::InvalidConfig(
                "Repulsive plane normal must be non-zero".into(),
            ));
        }
        Ok(Self {
            normal: normal / len,
            offset,
            stiffness,
        })
    }

    /// Unit normal of the plane.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    fn signed_distance(&self, point: Vec3) -> Scalar {
        self.normal.dot(point) - self.offset
    }
}

impl RepulsiveSurface for RepulsivePlane {
    fn is_colliding(&self, point: Vec3) -> bool {
        self.signed_distance(point) < 0.0
    }

    fn repulse(&self, point: Vec3) -> Vec3 {
        let d = self.signed_distance(point);
        if d < 0.0 {
            self.normal * (-self.stiffness * d)
        } else {
            Vec3::ZERO
        }
    }
}

/// Static obstacle points with a spherical exclusion radius each.
///
/// Points are binned into their own grid at `radius` resolution so a
/// repulse query touches only nearby obstacles.
#[derive(Debug)]
pub struct RepulsivePointCloud {
    points: Vec<Vec3>,
    grid: SpatialGrid,
    /// Exclusion radius around each obstacle point.
    pub radius: Scalar,
    /// Spring stiffness of the push-out force.
    pub stiffness: Scalar,
}

impl RepulsivePointCloud {
    /// Creates a point-cloud obstacle with the default stiffness.
    pub fn new(points: Vec<Vec3>, radius: Scalar) -> ThalloResult<Self> {
        Self::with_stiffness(points, radius, DEFAULT_SURFACE_STIFFNESS)
    }

    /// Creates a point-cloud obstacle with an explicit stiffness.
    pub fn with_stiffness(
        points: Vec<Vec3>,
        radius: Scalar,
        stiffness: Scalar,
    ) -> ThalloResult<Self> {
        if radius <= 0.0 {
            return Err(ThalloError::InvalidConfig(format!(
                "Point cloud radius must be positive, got {radius}"
            )));
        }
        let grid = SpatialGrid::from_positions(radius, &points);
        Ok(Self {
            points,
            grid,
            radius,
            stiffness,
        })
    }

    /// Number of obstacle points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the cloud holds no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl RepulsiveSurface for RepulsivePointCloud {
    fn is_colliding(&self, point: Vec3) -> bool {
        self.grid
            .neighbors(point)
            .iter()
            .any(|&id| (self.points[id as usize] - point).length() < self.radius)
    }

    fn repulse(&self, point: Vec3) -> Vec3 {
        let mut force = Vec3::ZERO;
        for id in self.grid.neighbors(point) {
            let diff = point - self.points[id as usize];
            let d = diff.length();
            // A point exactly on an obstacle has no push direction.
            if d >= self.radius || d < EPSILON {
                continue;
            }
            force += diff / d * (self.stiffness * (self.radius - d));
        }
        force
    }
}
