//! Errors raised by the ray tracing core.
//!
//! Degenerate geometry (a ray parallel to a plane, a negative discriminant)
//! is not an error; it produces an empty intersection list instead.

use thiserror::Error;

/// Errors that can occur while building or rendering a scene.
#[derive(Error, Debug)]
pub enum RayTracerError {
    /// A general invalid argument, with a description of what went wrong.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A tuple was expected to be a point (`w == 1`).
    #[error("Expected {what} to be a point, found w = {w}")]
    NotAPoint {
        /// What the tuple was used as.
        what: &'static str,
        /// The offending `w` component.
        w: f64,
    },

    /// A tuple was expected to be a vector (`w == 0`).
    #[error("Expected {what} to be a vector, found w = {w}")]
    NotAVector {
        /// What the tuple was used as.
        what: &'static str,
        /// The offending `w` component.
        w: f64,
    },

    /// Matrix data had the wrong number of elements.
    #[error("Matrix dimension mismatch: expected {expected} elements, found {found}")]
    DimensionMismatch {
        /// Number of elements the matrix needs.
        expected: usize,
        /// Number of elements supplied.
        found: usize,
    },

    /// A matrix with a zero determinant was inverted.
    #[error("Matrix is not invertible (determinant is zero)")]
    SingularMatrix,

    /// A child was added to a shape which is not a group.
    #[error("Cannot add a child to a non-group shape")]
    NotAGroup,

    /// A local normal was requested from a group or CSG shape.
    #[error("Shape has no surface of its own; normals come from its children")]
    NoLocalNormal,

    /// An invalid scene description.
    #[error("Scene error: {0}")]
    Scene(String),

    /// A malformed JSON scene description.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The worker pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

pub type Result<T> = std::result::Result<T, RayTracerError>;
