//! Half-edge connectivity records.
//!
//! A triangle mesh's connectivity is stored as a flat array of half-edges,
//! three per triangle. Half-edge `3i + k` is the directed edge leaving corner
//! `k` of triangle `i`, so a triangle's half-edges always occupy one
//! contiguous block and `next` cycles inside that block with period 3.
//!
//! # Boundary Handling
//!
//! A half-edge whose undirected edge belongs to only one triangle keeps the
//! "none" sentinel in its `opposite` slot. No boundary records are
//! fabricated; consumers must treat an unresolved `opposite` as a valid
//! terminal state.

use std::collections::HashMap;

use super::index::{HalfEdgeId, TriangleId, VertexId};

/// One directed edge of one triangle corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfEdge {
    /// The vertex this half-edge leaves from.
    pub origin: VertexId,

    /// The triangle this half-edge belongs to.
    pub triangle: TriangleId,

    /// The next half-edge around the same triangle (period 3).
    pub next: HalfEdgeId,

    /// The half-edge on the neighboring triangle tracing the same
    /// undirected edge in reverse, or the sentinel for boundary edges.
    pub opposite: HalfEdgeId,
}

impl HalfEdge {
    /// Check if this half-edge lies on the mesh boundary.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.opposite.is_some()
    }
}

/// Per-triangle record: the vertex triple plus the first of the triangle's
/// three half-edges, for O(1) "first half-edge of triangle" lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangleRef {
    /// The triangle's corner vertices, winding order preserved.
    pub vertices: [VertexId; 3],

    /// The half-edge leaving corner 0.
    pub halfedge: HalfEdgeId,
}

/// Full connectivity of a triangle mesh.
///
/// Produced by [`build_topology`](crate::mesh::build_topology); owned by the
/// caller thereafter. The structure is immutable and purely index-based; it
/// holds no vertex positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalfEdgeTopology {
    pub(crate) halfedges: Vec<HalfEdge>,
    pub(crate) triangles: Vec<TriangleRef>,
    pub(crate) vertex_count: usize,
}

impl HalfEdgeTopology {
    // ==================== Accessors ====================

    /// Number of vertices the topology was built over.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertex_count
    }

    /// Number of half-edges (always three per triangle).
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Get a half-edge record by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId) -> &HalfEdge {
        &self.halfedges[id.index()]
    }

    /// Get a triangle record by ID.
    #[inline]
    pub fn triangle(&self, id: TriangleId) -> &TriangleRef {
        &self.triangles[id.index()]
    }

    /// The full half-edge array.
    #[inline]
    pub fn halfedges(&self) -> &[HalfEdge] {
        &self.halfedges
    }

    /// The full triangle-record array.
    #[inline]
    pub fn triangles(&self) -> &[TriangleRef] {
        &self.triangles
    }

    // ==================== Topology Queries ====================

    /// The next half-edge around the same triangle.
    #[inline]
    pub fn next(&self, he: HalfEdgeId) -> HalfEdgeId {
        self.halfedge(he).next
    }

    /// The opposite half-edge, or `None` on a boundary edge.
    #[inline]
    pub fn opposite(&self, he: HalfEdgeId) -> Option<HalfEdgeId> {
        let o = self.halfedge(he).opposite;
        o.is_some().then_some(o)
    }

    /// The vertex a half-edge leaves from.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId) -> VertexId {
        self.halfedge(he).origin
    }

    /// The vertex a half-edge points at.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId) -> VertexId {
        self.origin(self.next(he))
    }

    /// The triangle a half-edge belongs to.
    #[inline]
    pub fn triangle_of(&self, he: HalfEdgeId) -> TriangleId {
        self.halfedge(he).triangle
    }

    /// The first half-edge of a triangle (the one leaving corner 0).
    #[inline]
    pub fn triangle_halfedge(&self, t: TriangleId) -> HalfEdgeId {
        self.triangle(t).halfedge
    }

    /// The three corner vertices of a triangle, winding order preserved.
    #[inline]
    pub fn triangle_vertices(&self, t: TriangleId) -> [VertexId; 3] {
        self.triangle(t).vertices
    }

    /// Check if a half-edge lies on the mesh boundary.
    #[inline]
    pub fn is_boundary(&self, he: HalfEdgeId) -> bool {
        self.halfedge(he).is_boundary()
    }

    // ==================== Iteration ====================

    /// Iterate over all half-edge IDs.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId> + '_ {
        (0..self.halfedges.len()).map(HalfEdgeId::new)
    }

    /// Iterate over all triangle IDs.
    pub fn triangle_ids(&self) -> impl Iterator<Item = TriangleId> + '_ {
        (0..self.triangles.len()).map(TriangleId::new)
    }

    /// Iterate over the IDs of all boundary half-edges.
    pub fn boundary_halfedges(&self) -> impl Iterator<Item = HalfEdgeId> + '_ {
        self.halfedges
            .iter()
            .enumerate()
            .filter(|(_, he)| he.is_boundary())
            .map(|(i, _)| HalfEdgeId::new(i))
    }

    // ==================== Validation ====================

    /// Check that the connectivity honors its structural contract.
    ///
    /// Verifies that every origin vertex is in range, `next` forms a 3-cycle
    /// within each triangle's block, and every resolved `opposite` is mutual,
    /// belongs to a different triangle, and traces the same undirected edge
    /// in reverse. Meshes with unresolved boundary edges are consistent;
    /// ambiguously resolved non-manifold meshes generally are not.
    pub fn is_consistent(&self) -> bool {
        for (i, he) in self.halfedges.iter().enumerate() {
            if he.origin.index() >= self.vertex_count {
                return false;
            }

            let id = HalfEdgeId::new(i);
            if self.next(self.next(self.next(id))) != id {
                return false;
            }
            if self.triangle_of(he.next) != he.triangle {
                return false;
            }

            if let Some(opp) = self.opposite(id) {
                let o = self.halfedge(opp);
                if o.opposite != id || o.triangle == he.triangle {
                    return false;
                }
                // same undirected edge, reversed
                if o.origin != self.dest(id) || self.dest(opp) != he.origin {
                    return false;
                }
            }
        }

        for (i, tri) in self.triangles.iter().enumerate() {
            if self.triangle_of(tri.halfedge).index() != i {
                return false;
            }
        }

        true
    }

    /// Report undirected edges used by more than two triangles.
    ///
    /// The builder resolves such edges by iteration order without complaint;
    /// consumers that need manifoldness call this to find out.
    pub fn non_manifold_edges(&self) -> Vec<(VertexId, VertexId)> {
        let mut count: HashMap<(VertexId, VertexId), usize> = HashMap::new();
        for id in self.halfedge_ids() {
            let (a, b) = (self.origin(id), self.dest(id));
            let key = if a < b { (a, b) } else { (b, a) };
            *count.entry(key).or_insert(0) += 1;
        }

        let mut edges: Vec<_> = count
            .into_iter()
            .filter(|&(_, n)| n > 2)
            .map(|(edge, _)| edge)
            .collect();
        edges.sort();
        edges
    }
}

#[cfg(test)]
mod tests {
    use crate::mesh::build_topology;

    use super::*;

    fn tetrahedron() -> HalfEdgeTopology {
        build_topology(4, &[[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]]).unwrap()
    }

    #[test]
    fn test_counts() {
        let topo = tetrahedron();
        assert_eq!(topo.num_vertices(), 4);
        assert_eq!(topo.num_triangles(), 4);
        assert_eq!(topo.num_halfedges(), 12);
    }

    #[test]
    fn test_triangle_block_layout() {
        let topo = tetrahedron();
        for t in topo.triangle_ids() {
            let first = topo.triangle_halfedge(t);
            assert_eq!(first.index(), 3 * t.index());

            let he = topo.halfedge(first);
            assert_eq!(he.origin, topo.triangle_vertices(t)[0]);
        }
    }

    #[test]
    fn test_dest_follows_winding() {
        let topo = build_topology(3, &[[0, 1, 2]]).unwrap();
        let h0 = HalfEdgeId::new(0);
        assert_eq!(topo.origin(h0).index(), 0);
        assert_eq!(topo.dest(h0).index(), 1);
        assert_eq!(topo.dest(topo.next(h0)).index(), 2);
    }

    #[test]
    fn test_boundary_iteration() {
        let topo = build_topology(3, &[[0, 1, 2]]).unwrap();
        assert_eq!(topo.boundary_halfedges().count(), 3);

        let closed = tetrahedron();
        assert_eq!(closed.boundary_halfedges().count(), 0);
    }

    #[test]
    fn test_consistency() {
        assert!(tetrahedron().is_consistent());
    }

    #[test]
    fn test_no_non_manifold_edges_on_closed_manifold() {
        assert!(tetrahedron().non_manifold_edges().is_empty());
    }

    #[test]
    fn test_non_manifold_fan_reported() {
        // three triangles share edge 0-1
        let topo = build_topology(5, &[[0, 1, 2], [1, 0, 3], [1, 0, 4]]).unwrap();
        let edges = topo.non_manifold_edges();
        assert_eq!(edges, vec![(VertexId::new(0), VertexId::new(1))]);
    }
}
