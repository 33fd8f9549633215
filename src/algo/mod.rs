//! Mesh processing algorithms.
//!
//! Algorithms in this module consume a triangle soup together with the
//! connectivity produced by [`build_topology`](crate::mesh::build_topology):
//!
//! - **Decimation**: quadric-error edge collapse simplification
//! - **Deviation**: vertex-to-surface distance between an original mesh and
//!   its simplified counterpart

pub mod decimate;
pub mod deviation;
