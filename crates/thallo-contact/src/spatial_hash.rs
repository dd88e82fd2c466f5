//! Spatial hash grid for neighbor queries on point sets.
//!
//! Partitions space into a uniform grid and bins vertex ids into cells.
//! Neighbor candidates come from the 3×3×3 block of cells around the
//! query point, which is guaranteed to contain every point within one
//! `resolution` of it.

use std::collections::HashMap;

use thallo_math::Vec3;
use thallo_types::Scalar;

/// Uniform spatial hash over `(i32, i32, i32)` cell keys.
///
/// Cell keys floor toward −∞ on every axis, so binning is consistent on
/// both sides of zero and exactly at zero.
#[derive(Debug)]
pub struct SpatialGrid {
    /// Inverse cell size (cached for the hot insert path).
    inv_resolution: Scalar,
    /// Cell key → vertex ids binned there.
    grid: HashMap<(i32, i32, i32), Vec<u32>>,
}

impl SpatialGrid {
    /// Creates an empty grid with the given cell size.
    pub fn new(resolution: Scalar) -> Self {
        let resolution = resolution.max(1e-6);
        Self {
            inv_resolution: 1.0 / resolution,
            grid: HashMap::new(),
        }
    }

    /// Builds a grid holding ids `0..positions.len()`.
    pub fn from_positions(resolution: Scalar, positions: &[Vec3]) -> Self {
        let mut grid = Self::new(resolution);
        for (i, &p) in positions.iter().enumerate() {
            grid.insert(p, i as u32);
        }
        grid
    }

    fn cell_key(&self, p: Vec3) -> (i32, i32, i32) {
        let cx = (p.x * self.inv_resolution).floor() as i32;
        let cy = (p.y * self.inv_resolution).floor() as i32;
        let cz = (p.z * self.inv_resolution).floor() as i32;
        (cx, cy, cz)
    }

    /// Buckets `id` under the cell containing `position`.
    ///
    /// Callers must not insert the same id twice; `neighbors` would then
    /// report it twice.
    pub fn insert(&mut self, position: Vec3, id: u32) {
        let key = self.cell_key(position);
        self.grid.entry(key).or_default().push(id);
    }

    /// All ids in the 3×3×3 block of cells centered on the query's cell.
    ///
    /// Order is insignificant. Every inserted point within `resolution`
    /// of `position` is included; points farther than `2·resolution`
    /// never are.
    pub fn neighbors(&self, position: Vec3) -> Vec<u32> {
        let (cx, cy, cz) = self.cell_key(position);
        let mut found = Vec::new();
        for dx in -1..=1_i32 {
            for dy in -1..=1_i32 {
                for dz in -1..=1_i32 {
                    if let Some(ids) = self.grid.get(&(cx + dx, cy + dy, cz + dz)) {
                        found.extend_from_slice(ids);
                    }
                }
            }
        }
        found
    }

    /// Number of occupied cells.
    pub fn cell_count(&self) -> usize {
        self.grid.len()
    }
}
