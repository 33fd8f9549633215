//! Quadric error metric edge collapse.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use nalgebra::{Matrix4, Point3, Vector3, Vector4};
use tracing::{debug, warn};

use super::DecimateOptions;
use crate::error::{MeshError, Result};
use crate::mesh::build_topology;

/// A plane-distance quadric, stored as the 10 unique coefficients of its
/// symmetric 4x4 matrix.
#[derive(Debug, Clone, Copy, Default)]
struct Quadric {
    q: [f64; 10],
}

impl Quadric {
    /// Quadric of a single plane `n . x + d = 0` with `n` unit length.
    fn from_plane(n: &Vector3<f64>, d: f64) -> Self {
        let p = [n.x, n.y, n.z, d];
        let mut q = [0.0; 10];
        let mut w = 0;
        for r in 0..4 {
            for c in r..4 {
                q[w] = p[r] * p[c];
                w += 1;
            }
        }
        Self { q }
    }

    fn accumulate(&mut self, other: &Quadric) {
        for (a, b) in self.q.iter_mut().zip(other.q.iter()) {
            *a += b;
        }
    }

    fn combined(&self, other: &Quadric) -> Quadric {
        let mut out = *self;
        out.accumulate(other);
        out
    }

    /// Evaluate `vᵀ Q v` for `v = [x, y, z, 1]`.
    fn error(&self, p: &Point3<f64>) -> f64 {
        let v = [p.x, p.y, p.z, 1.0];
        let mut sum = 0.0;
        let mut w = 0;
        for r in 0..4 {
            for c in r..4 {
                let scale = if r == c { 1.0 } else { 2.0 };
                sum += scale * self.q[w] * v[r] * v[c];
                w += 1;
            }
        }
        sum
    }

    fn as_matrix(&self) -> Matrix4<f64> {
        let q = &self.q;
        Matrix4::new(
            q[0], q[1], q[2], q[3], //
            q[1], q[4], q[5], q[6], //
            q[2], q[5], q[7], q[8], //
            q[3], q[6], q[8], q[9],
        )
    }

    /// The position minimizing this quadric, if the system is solvable.
    fn minimizer(&self) -> Option<Point3<f64>> {
        // Solve Q' v = [0, 0, 0, 1]ᵀ with the last row pinned to [0,0,0,1].
        let mut m = self.as_matrix();
        m.set_row(3, &nalgebra::RowVector4::new(0.0, 0.0, 0.0, 1.0));

        m.try_inverse().map(|inv| {
            let v = inv * Vector4::new(0.0, 0.0, 0.0, 1.0);
            Point3::new(v.x, v.y, v.z)
        })
    }
}

/// A candidate edge collapse, ordered cheapest-first in the heap.
#[derive(Debug, Clone)]
struct Candidate {
    /// Endpoints, smaller index first.
    v0: usize,
    v1: usize,
    /// Position the surviving vertex moves to.
    target: Point3<f64>,
    cost: f64,
    /// Endpoint versions at creation time; a bump invalidates the entry.
    stamp: (u64, u64),
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // reversed: BinaryHeap is a max-heap, we pop the cheapest collapse
        other.cost.partial_cmp(&self.cost).unwrap_or(Ordering::Equal)
    }
}

#[inline]
fn undirected(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Simplify a triangle mesh by quadric-guided edge collapse.
///
/// Collapses edges cheapest-first until the triangle count reaches the
/// target in `options` (or no valid collapse remains). Returns the new
/// vertex and triangle arrays, compacted.
///
/// If the collapsed mesh fails the final manifoldness check, the input is
/// returned unmodified.
///
/// # Errors
/// Fails on an empty mesh or when `triangles` references out-of-range
/// vertex indices.
pub fn qem_decimate(
    vertices: &[Point3<f64>],
    triangles: &[[usize; 3]],
    options: &DecimateOptions,
) -> Result<(Vec<Point3<f64>>, Vec<[usize; 3]>)> {
    if triangles.is_empty() {
        return Err(MeshError::EmptyMesh);
    }

    // Validates indices and exposes the boundary in one step.
    let topology = build_topology(vertices.len(), triangles)?;

    let target = options.compute_target(triangles.len());
    if target >= triangles.len() {
        return Ok((vertices.to_vec(), triangles.to_vec()));
    }

    let boundary_edges: HashSet<(usize, usize)> = if options.preserve_boundary {
        topology
            .boundary_halfedges()
            .map(|h| {
                undirected(
                    topology.origin(h).index(),
                    topology.dest(h).index(),
                )
            })
            .collect()
    } else {
        HashSet::new()
    };

    let mut state = State::new(vertices, triangles, boundary_edges);
    state.seed_heap();
    state.run(target, options.max_error);

    match state.compact() {
        Some((new_vertices, new_triangles)) => {
            debug!(
                from = triangles.len(),
                to = new_triangles.len(),
                "edge collapse finished"
            );
            Ok((new_vertices, new_triangles))
        }
        None => {
            warn!("collapse produced a non-manifold mesh, keeping the input");
            Ok((vertices.to_vec(), triangles.to_vec()))
        }
    }
}

struct State {
    positions: Vec<Point3<f64>>,
    triangles: Vec<[usize; 3]>,
    alive_vertex: Vec<bool>,
    alive_triangle: Vec<bool>,
    live_triangles: usize,
    quadrics: Vec<Quadric>,
    /// Bumped whenever a vertex moves; stales out old heap entries.
    versions: Vec<u64>,
    /// Vertex -> incident triangle ids. Dead triangles stay in the lists
    /// and are filtered on read.
    vertex_triangles: Vec<Vec<usize>>,
    boundary_edges: HashSet<(usize, usize)>,
    heap: BinaryHeap<Candidate>,
}

impl State {
    fn new(
        vertices: &[Point3<f64>],
        triangles: &[[usize; 3]],
        boundary_edges: HashSet<(usize, usize)>,
    ) -> Self {
        let mut vertex_triangles = vec![Vec::new(); vertices.len()];
        for (ti, tri) in triangles.iter().enumerate() {
            for &v in tri {
                vertex_triangles[v].push(ti);
            }
        }

        let mut quadrics = vec![Quadric::default(); vertices.len()];
        for tri in triangles {
            let p0 = &vertices[tri[0]];
            let e1 = vertices[tri[1]] - p0;
            let e2 = vertices[tri[2]] - p0;
            let cross = e1.cross(&e2);

            let len = cross.norm();
            if len < 1e-12 {
                continue; // zero-area face contributes no plane
            }
            let n = cross / len;
            let d = -n.dot(&p0.coords);

            let q = Quadric::from_plane(&n, d);
            for &v in tri {
                quadrics[v].accumulate(&q);
            }
        }

        Self {
            positions: vertices.to_vec(),
            triangles: triangles.to_vec(),
            alive_vertex: vec![true; vertices.len()],
            alive_triangle: vec![true; triangles.len()],
            live_triangles: triangles.len(),
            quadrics,
            versions: vec![0; vertices.len()],
            vertex_triangles,
            boundary_edges,
            heap: BinaryHeap::new(),
        }
    }

    fn seed_heap(&mut self) {
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for ti in 0..self.triangles.len() {
            let tri = self.triangles[ti];
            for k in 0..3 {
                let edge = undirected(tri[k], tri[(k + 1) % 3]);
                if seen.insert(edge) {
                    self.push_candidate(edge.0, edge.1);
                }
            }
        }
    }

    fn push_candidate(&mut self, v0: usize, v1: usize) {
        let (v0, v1) = undirected(v0, v1);
        if self.boundary_edges.contains(&(v0, v1)) {
            return;
        }

        let q = self.quadrics[v0].combined(&self.quadrics[v1]);
        let p0 = self.positions[v0];
        let p1 = self.positions[v1];
        let midpoint = Point3::from((p0.coords + p1.coords) * 0.5);

        let target = match q.minimizer() {
            // Reject minimizers that wander far from the edge.
            Some(p) if (p - midpoint).norm() < (p1 - p0).norm() * 2.0 => p,
            Some(_) => midpoint,
            None => {
                let e0 = q.error(&p0);
                let e1 = q.error(&p1);
                let em = q.error(&midpoint);
                if e0 <= e1 && e0 <= em {
                    p0
                } else if e1 <= em {
                    p1
                } else {
                    midpoint
                }
            }
        };

        self.heap.push(Candidate {
            v0,
            v1,
            target,
            cost: q.error(&target),
            stamp: (self.versions[v0], self.versions[v1]),
        });
    }

    fn run(&mut self, target: usize, max_error: Option<f64>) {
        while self.live_triangles > target {
            let candidate = match self.heap.pop() {
                Some(c) => c,
                None => break,
            };

            let Candidate { v0, v1, .. } = candidate;
            if !self.alive_vertex[v0]
                || !self.alive_vertex[v1]
                || candidate.stamp != (self.versions[v0], self.versions[v1])
            {
                continue;
            }

            if let Some(cap) = max_error {
                if candidate.cost > cap {
                    break;
                }
            }

            if !self.collapse_is_legal(v0, v1) {
                continue;
            }

            self.apply_collapse(&candidate);
        }
    }

    fn live_neighbors(&self, v: usize) -> HashSet<usize> {
        let mut out = HashSet::new();
        for &ti in &self.vertex_triangles[v] {
            if !self.alive_triangle[ti] {
                continue;
            }
            for &w in &self.triangles[ti] {
                if w != v {
                    out.insert(w);
                }
            }
        }
        out
    }

    fn edge_triangles(&self, v0: usize, v1: usize) -> Vec<usize> {
        self.vertex_triangles[v0]
            .iter()
            .copied()
            .filter(|&ti| self.alive_triangle[ti] && self.triangles[ti].contains(&v1))
            .collect()
    }

    /// The link condition of Dey et al.: the neighborhoods of the endpoints
    /// may only meet in the vertices opposite the collapsing edge.
    fn collapse_is_legal(&self, v0: usize, v1: usize) -> bool {
        let edge_faces = self.edge_triangles(v0, v1).len();
        if edge_faces == 0 || edge_faces > 2 {
            return false;
        }

        let n0 = self.live_neighbors(v0);
        let n1 = self.live_neighbors(v1);
        let common: HashSet<usize> = n0.intersection(&n1).copied().collect();

        if common.len() != edge_faces {
            return false;
        }

        // A shared neighbor outside the common set would fold two edges
        // into one after the collapse.
        n1.iter()
            .all(|&w| w == v0 || !n0.contains(&w) || common.contains(&w))
    }

    fn apply_collapse(&mut self, candidate: &Candidate) {
        let keep = candidate.v0;
        let remove = candidate.v1;

        for ti in self.edge_triangles(keep, remove) {
            self.alive_triangle[ti] = false;
            self.live_triangles -= 1;
        }

        // Re-point the removed vertex's surviving triangles at `keep`.
        let tris: Vec<usize> = self.vertex_triangles[remove].clone();
        for ti in tris {
            if !self.alive_triangle[ti] {
                continue;
            }
            for v in self.triangles[ti].iter_mut() {
                if *v == remove {
                    *v = keep;
                }
            }
            let [a, b, c] = self.triangles[ti];
            if a == b || b == c || a == c {
                self.alive_triangle[ti] = false;
                self.live_triangles -= 1;
            } else {
                self.vertex_triangles[keep].push(ti);
            }
        }

        self.positions[keep] = candidate.target;
        let q = self.quadrics[remove];
        self.quadrics[keep].accumulate(&q);
        self.versions[keep] += 1;
        self.alive_vertex[remove] = false;

        for w in self.live_neighbors(keep) {
            if self.alive_vertex[w] {
                self.push_candidate(keep, w);
            }
        }
    }

    /// Drop dead elements and re-index. Returns `None` if the survivors no
    /// longer form a manifold surface.
    fn compact(&self) -> Option<(Vec<Point3<f64>>, Vec<[usize; 3]>)> {
        let mut remap = vec![usize::MAX; self.positions.len()];
        let mut new_vertices = Vec::new();
        for (v, &alive) in self.alive_vertex.iter().enumerate() {
            if alive {
                remap[v] = new_vertices.len();
                new_vertices.push(self.positions[v]);
            }
        }

        let new_triangles: Vec<[usize; 3]> = self
            .triangles
            .iter()
            .zip(self.alive_triangle.iter())
            .filter(|(_, &alive)| alive)
            .map(|(tri, _)| [remap[tri[0]], remap[tri[1]], remap[tri[2]]])
            .collect();

        match build_topology(new_vertices.len(), &new_triangles) {
            Ok(topology) if topology.non_manifold_edges().is_empty() => {
                Some((new_vertices, new_triangles))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let triangles = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        (vertices, triangles)
    }

    fn octahedron() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        let triangles = vec![
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ];
        (vertices, triangles)
    }

    fn grid(n: usize) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }

        let mut triangles = Vec::with_capacity(n * n * 2);
        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = v00 + 1;
                let v01 = v00 + (n + 1);
                let v11 = v01 + 1;

                triangles.push([v00, v10, v11]);
                triangles.push([v00, v11, v01]);
            }
        }
        (vertices, triangles)
    }

    #[test]
    fn test_plane_quadric_error() {
        // plane z = 0: error is z squared
        let q = Quadric::from_plane(&Vector3::new(0.0, 0.0, 1.0), 0.0);
        assert!(q.error(&Point3::new(0.0, 0.0, 0.0)).abs() < 1e-10);
        assert!((q.error(&Point3::new(0.0, 0.0, 1.0)) - 1.0).abs() < 1e-10);
        assert!((q.error(&Point3::new(5.0, 3.0, 2.0)) - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_quadric_accumulation() {
        let qx = Quadric::from_plane(&Vector3::new(1.0, 0.0, 0.0), 0.0);
        let qy = Quadric::from_plane(&Vector3::new(0.0, 1.0, 0.0), 0.0);
        let q = qx.combined(&qy);

        // x^2 + y^2
        assert!((q.error(&Point3::new(3.0, 4.0, 0.0)) - 25.0).abs() < 1e-10);
    }

    #[test]
    fn test_decimate_reduces_triangles() {
        let (vertices, triangles) = octahedron();
        let options = DecimateOptions::with_target_ratio(0.5);
        let (_, out) = qem_decimate(&vertices, &triangles, &options).unwrap();

        assert!(out.len() < triangles.len());
        let topo = build_topology(6, &triangles).unwrap();
        assert!(topo.is_consistent());
    }

    #[test]
    fn test_decimate_output_is_consistent() {
        let (vertices, triangles) = octahedron();
        let options = DecimateOptions::with_target_ratio(0.5);
        let (new_vertices, new_triangles) =
            qem_decimate(&vertices, &triangles, &options).unwrap();

        let topo = build_topology(new_vertices.len(), &new_triangles).unwrap();
        assert!(topo.is_consistent());
        assert!(topo.non_manifold_edges().is_empty());
    }

    #[test]
    fn test_decimate_no_change_at_full_ratio() {
        let (vertices, triangles) = tetrahedron();
        let options = DecimateOptions::with_target_ratio(1.0);
        let (new_vertices, new_triangles) =
            qem_decimate(&vertices, &triangles, &options).unwrap();

        assert_eq!(new_vertices.len(), vertices.len());
        assert_eq!(new_triangles, triangles);
    }

    #[test]
    fn test_decimate_target_triangles() {
        let (vertices, triangles) = octahedron();
        let options = DecimateOptions::with_target_triangles(4);
        let (_, out) = qem_decimate(&vertices, &triangles, &options).unwrap();

        assert!(out.len() <= triangles.len());
    }

    #[test]
    fn test_decimate_grid_mesh() {
        let (vertices, triangles) = grid(3);
        let options = DecimateOptions::with_target_ratio(0.7);
        let (new_vertices, new_triangles) =
            qem_decimate(&vertices, &triangles, &options).unwrap();

        assert!(new_triangles.len() < triangles.len());
        let topo = build_topology(new_vertices.len(), &new_triangles).unwrap();
        assert!(topo.is_consistent());
    }

    #[test]
    fn test_max_error_stops_collapse() {
        // any octahedron collapse changes the shape, so a tiny cap blocks all
        let (vertices, triangles) = octahedron();
        let options = DecimateOptions::with_target_ratio(0.1).with_max_error(1e-12);
        let (_, out) = qem_decimate(&vertices, &triangles, &options).unwrap();

        assert_eq!(out.len(), triangles.len());
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let result = qem_decimate(&[], &[], &DecimateOptions::with_target_ratio(0.5));
        assert!(matches!(result, Err(MeshError::EmptyMesh)));
    }

    #[test]
    fn test_invalid_index_rejected() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let triangles = vec![[0, 1, 2]];
        let result = qem_decimate(
            &vertices,
            &triangles,
            &DecimateOptions::with_target_ratio(0.5),
        );
        assert!(matches!(
            result,
            Err(MeshError::InvalidVertexIndex { .. })
        ));
    }
}
