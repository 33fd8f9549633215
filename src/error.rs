//! Error types for stitch.
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// A triangle references a vertex index outside the valid range.
    #[error("triangle {triangle} references vertex index {vertex}, but only {vertex_count} vertices exist")]
    InvalidVertexIndex {
        /// The triangle index.
        triangle: usize,
        /// The out-of-range vertex index.
        vertex: usize,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// A triangle repeats a vertex index (zero-area corner).
    #[error("triangle {triangle} is degenerate (repeated vertex index)")]
    DegenerateTriangle {
        /// The triangle index.
        triangle: usize,
    },

    /// The mesh has no triangles where at least one is required.
    #[error("mesh has no triangles")]
    EmptyMesh,

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }
}
