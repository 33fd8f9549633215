//! Mesh simplification by iterative edge collapse.
//!
//! The collapse order is driven by quadric error metrics (Garland &
//! Heckbert, 1997): each vertex carries a quadric summing the squared
//! distances to its original incident face planes, and the edge whose
//! collapse adds the least error goes first.
//!
//! Boundary edges are discovered through the half-edge topology of the
//! input (an unresolved `opposite` marks the boundary), so the same
//! adjacency structure that downstream traversal uses also drives
//! simplification.
//!
//! # Example
//!
//! ```
//! use nalgebra::Point3;
//! use stitch::algo::decimate::{qem_decimate, DecimateOptions};
//!
//! let vertices = vec![
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(-1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.0, -1.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//!     Point3::new(0.0, 0.0, -1.0),
//! ];
//! let triangles = vec![
//!     [0, 2, 4], [2, 1, 4], [1, 3, 4], [3, 0, 4],
//!     [2, 0, 5], [1, 2, 5], [3, 1, 5], [0, 3, 5],
//! ];
//!
//! let options = DecimateOptions::with_target_ratio(0.5);
//! let (new_vertices, new_triangles) =
//!     qem_decimate(&vertices, &triangles, &options).unwrap();
//!
//! assert!(new_triangles.len() < triangles.len());
//! ```

mod qem;

pub use qem::qem_decimate;

/// Options for mesh decimation.
#[derive(Debug, Clone)]
pub struct DecimateOptions {
    /// Target number of triangles after decimation.
    /// If `None`, `target_ratio` is used instead.
    pub target_triangles: Option<usize>,

    /// Target ratio of triangles to keep (0.0 to 1.0).
    /// Only used if `target_triangles` is `None`.
    pub target_ratio: f64,

    /// Whether to keep boundary edges out of the collapse queue.
    pub preserve_boundary: bool,

    /// Maximum allowed error for a single edge collapse.
    /// Decimation stops once the cheapest remaining collapse exceeds this.
    pub max_error: Option<f64>,
}

impl DecimateOptions {
    /// Create options to reduce to a target number of triangles.
    pub fn with_target_triangles(target: usize) -> Self {
        Self {
            target_triangles: Some(target),
            target_ratio: 0.5,
            preserve_boundary: true,
            max_error: None,
        }
    }

    /// Create options to reduce to a ratio of the original triangle count.
    pub fn with_target_ratio(ratio: f64) -> Self {
        Self {
            target_triangles: None,
            target_ratio: ratio.clamp(0.0, 1.0),
            preserve_boundary: true,
            max_error: None,
        }
    }

    /// Set whether to preserve boundary edges.
    pub fn with_preserve_boundary(mut self, preserve: bool) -> Self {
        self.preserve_boundary = preserve;
        self
    }

    /// Set the maximum error threshold for edge collapses.
    pub fn with_max_error(mut self, max_error: f64) -> Self {
        self.max_error = Some(max_error);
        self
    }

    /// Compute the target triangle count given the original count.
    pub fn compute_target(&self, original: usize) -> usize {
        if let Some(target) = self.target_triangles {
            target.min(original)
        } else {
            ((original as f64) * self.target_ratio).round() as usize
        }
    }
}
