//! # thallo-math
//!
//! Linear algebra primitives for the thallo growth engine.
//!
//! Provides:
//! - Re-exports of `glam` double-precision types (`Vec3`, `Mat3`)
//! - Triplet accumulation and CSR (Compressed Sparse Row) matrices
//! - Sparse Cholesky and QR solver back ends built on `faer`

pub mod faer_solver;
pub mod sparse;

// Re-export glam's f64 types as the canonical math types for thallo.
pub use glam::{DMat3 as Mat3, DVec3 as Vec3};

/// Outer product `a bᵀ` as a 3×3 matrix.
///
/// Column `j` is `a · b[j]`, so element `(i, j)` is `a[i]·b[j]`.
#[inline]
pub fn outer(a: Vec3, b: Vec3) -> Mat3 {
    Mat3::from_cols(a * b.x, a * b.y, a * b.z)
}
