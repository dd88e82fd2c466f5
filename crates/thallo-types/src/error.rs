//! Error types for the thallo engine.
//!
//! All crates return `ThalloResult<T>` from fallible operations.

use thiserror::Error;

/// Unified error type for the thallo engine.
#[derive(Debug, Error)]
pub enum ThalloError {
    /// Mesh data is malformed or inconsistent (construction-time).
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Geometry became degenerate mid-computation (zero-length edge,
    /// zero-area face, zero geodesic spread). The offending call is
    /// rejected instead of propagating NaN.
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The sparse linear solve failed (e.g. Cholesky on a matrix that
    /// is not positive definite).
    #[error("Solver failure in {stage}: {detail}")]
    SolverFailure {
        stage: &'static str,
        detail: String,
    },

    /// A topology invariant was violated (e.g. an edge with more than
    /// two incident faces).
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Convenience alias for `Result<T, ThalloError>`.
pub type ThalloResult<T> = Result<T, ThalloError>;
