//! # Stitch
//!
//! Half-edge topology construction for indexed triangle meshes, plus the
//! traversal-heavy algorithms that consume it.
//!
//! Stitch converts a flat (vertex, triangle-index) representation into a
//! connectivity graph: one half-edge per triangle corner, with `next` and
//! `opposite` links resolved. The result is the foundation for mesh
//! simplification, deviation measurement, and similar geometry processing.
//!
//! ## Features
//!
//! - **Half-edge construction**: per-vertex incidence matching, plus a
//!   hashed edge-key variant for large meshes
//! - **Flat, index-linked storage**: plain arrays, no reference cycles,
//!   cheap to clone and share across threads
//! - **Boundary-aware**: boundary edges stay explicitly unresolved instead
//!   of being patched over
//! - **Edge-collapse simplification** driven by quadric error metrics
//! - **Geometric deviation** between an original and a simplified mesh
//!
//! ## Quick Start
//!
//! ```
//! use stitch::prelude::*;
//!
//! // a tetrahedron: 4 vertices, 4 triangles
//! let triangles = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//! let topo = build_topology(4, &triangles).unwrap();
//!
//! assert_eq!(topo.num_halfedges(), 12);
//!
//! // closed mesh: every half-edge pairs with its reverse on the neighbor
//! for h in topo.halfedge_ids() {
//!     let opp = topo.opposite(h).unwrap();
//!     assert_eq!(topo.opposite(opp), Some(h));
//! }
//! ```
//!
//! ## Traversal
//!
//! ```
//! use stitch::prelude::*;
//!
//! let topo = build_topology(4, &[[0, 1, 2], [1, 3, 2]]).unwrap();
//!
//! // walk a triangle's corners
//! let t = TriangleId::new(0);
//! let h0 = topo.triangle_halfedge(t);
//! let h1 = topo.next(h0);
//! let h2 = topo.next(h1);
//! assert_eq!(topo.next(h2), h0);
//!
//! // boundary half-edges have no opposite
//! assert_eq!(topo.boundary_halfedges().count(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// ```
/// use stitch::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_topology, build_topology_hashed, HalfEdge, HalfEdgeId, HalfEdgeTopology,
        TriangleId, TriangleRef, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
