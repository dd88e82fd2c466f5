//! # thallo-types
//!
//! Shared types, identifiers, error types, and simulation defaults
//! for the thallo surface-growth engine.
//!
//! This crate has zero domain logic. It defines the vocabulary that
//! all other thallo crates share.

pub mod constants;
pub mod error;
pub mod ids;
pub mod scalar;

pub use error::{ThalloError, ThalloResult};
pub use ids::{EdgeId, FaceId, HalfedgeId, VertexId};
pub use scalar::Scalar;
