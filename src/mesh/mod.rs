//! Core mesh connectivity structures.
//!
//! The primary type is [`HalfEdgeTopology`], a flat, index-linked half-edge
//! array describing the full connectivity of an indexed triangle mesh. It is
//! produced from a triangle soup by [`build_topology`] (per-vertex incidence
//! matching) or [`build_topology_hashed`] (edge-key lookup for large meshes).
//!
//! Mesh elements are identified by type-safe index wrappers: [`VertexId`],
//! [`HalfEdgeId`], and [`TriangleId`]. Adjacency links are indices, never
//! references, so the structure is a plain value type that can be cloned,
//! sent across threads, and stored anywhere.
//!
//! # Construction
//!
//! ```
//! use stitch::mesh::build_topology;
//!
//! let triangles = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//! let topo = build_topology(4, &triangles).unwrap();
//!
//! // a tetrahedron is closed: every half-edge has an opposite
//! assert_eq!(topo.boundary_halfedges().count(), 0);
//! ```

mod builder;
mod halfedge;
mod index;

pub use builder::{build_topology, build_topology_hashed};
pub use halfedge::{HalfEdge, HalfEdgeTopology, TriangleRef};
pub use index::{HalfEdgeId, TriangleId, VertexId};
