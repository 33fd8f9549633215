//! Uniform spatial grid for nearest-surface queries.

use nalgebra::Point3;

use crate::error::{MeshError, Result};

/// A uniform grid over a reference mesh's bounding box.
///
/// Triangles are binned into every cell their bounding box overlaps.
/// Queries expand outward ring by ring from the query point's cell, stopping
/// as soon as no farther ring can hold a closer triangle.
pub struct UniformGrid<'a> {
    vertices: &'a [Point3<f64>],
    triangles: &'a [[usize; 3]],
    origin: Point3<f64>,
    cell_size: f64,
    dims: [usize; 3],
    cells: Vec<Vec<u32>>,
}

impl<'a> UniformGrid<'a> {
    /// Build a grid with the given cell edge length.
    ///
    /// # Errors
    /// Fails if the mesh has no triangles, a triangle references an
    /// out-of-range vertex, or `cell_size` is not a positive finite number.
    pub fn new(
        vertices: &'a [Point3<f64>],
        triangles: &'a [[usize; 3]],
        cell_size: f64,
    ) -> Result<Self> {
        if triangles.is_empty() {
            return Err(MeshError::EmptyMesh);
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(MeshError::invalid_param(
                "cell_size",
                cell_size,
                "must be positive and finite",
            ));
        }
        for (ti, tri) in triangles.iter().enumerate() {
            for &vi in tri {
                if vi >= vertices.len() {
                    return Err(MeshError::InvalidVertexIndex {
                        triangle: ti,
                        vertex: vi,
                        vertex_count: vertices.len(),
                    });
                }
            }
        }

        let mut min = vertices[triangles[0][0]];
        let mut max = min;
        for p in vertices {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }

        let dims = [
            ((max.x - min.x) / cell_size) as usize + 1,
            ((max.y - min.y) / cell_size) as usize + 1,
            ((max.z - min.z) / cell_size) as usize + 1,
        ];

        let mut grid = Self {
            vertices,
            triangles,
            origin: min,
            cell_size,
            dims,
            cells: vec![Vec::new(); dims[0] * dims[1] * dims[2]],
        };

        for (ti, tri) in triangles.iter().enumerate() {
            let (lo, hi) = grid.triangle_cell_range(tri);
            for x in lo[0]..=hi[0] {
                for y in lo[1]..=hi[1] {
                    for z in lo[2]..=hi[2] {
                        let cell = grid.cell_index([x, y, z]);
                        grid.cells[cell].push(ti as u32);
                    }
                }
            }
        }

        Ok(grid)
    }

    #[inline]
    fn cell_index(&self, c: [usize; 3]) -> usize {
        (c[0] * self.dims[1] + c[1]) * self.dims[2] + c[2]
    }

    /// The grid cell containing a point, clamped into the grid.
    fn cell_of(&self, p: &Point3<f64>) -> [usize; 3] {
        let mut c = [0usize; 3];
        for i in 0..3 {
            let t = (p[i] - self.origin[i]) / self.cell_size;
            c[i] = (t.max(0.0) as usize).min(self.dims[i] - 1);
        }
        c
    }

    fn triangle_cell_range(&self, tri: &[usize; 3]) -> ([usize; 3], [usize; 3]) {
        let a = self.cell_of(&self.vertices[tri[0]]);
        let b = self.cell_of(&self.vertices[tri[1]]);
        let c = self.cell_of(&self.vertices[tri[2]]);

        let mut lo = a;
        let mut hi = a;
        for i in 0..3 {
            lo[i] = lo[i].min(b[i]).min(c[i]);
            hi[i] = hi[i].max(b[i]).max(c[i]);
        }
        (lo, hi)
    }

    /// Distance from a point to the nearest point on the mesh surface.
    pub fn nearest_distance(&self, p: &Point3<f64>) -> f64 {
        let center = self.cell_of(p);

        // rings beyond this cover no cells at all
        let ring_cover = (0..3)
            .map(|i| center[i].max(self.dims[i] - 1 - center[i]))
            .max()
            .unwrap_or(0);

        let mut best = f64::INFINITY;
        for ring in 0..=ring_cover {
            self.scan_ring(center, ring, p, &mut best);

            // A cell on ring q holds geometry at least (q - 1) cell widths
            // from p, so once best <= ring * cell_size nothing farther wins.
            if best <= ring as f64 * self.cell_size {
                break;
            }
        }
        best
    }

    /// Visit every cell at exactly the given Chebyshev ring distance.
    fn scan_ring(&self, center: [usize; 3], ring: usize, p: &Point3<f64>, best: &mut f64) {
        let r = ring as isize;
        let c = [center[0] as isize, center[1] as isize, center[2] as isize];

        for dx in -r..=r {
            for dy in -r..=r {
                for dz in -r..=r {
                    if dx.abs() != r && dy.abs() != r && dz.abs() != r {
                        continue;
                    }
                    let x = c[0] + dx;
                    let y = c[1] + dy;
                    let z = c[2] + dz;
                    if x < 0
                        || y < 0
                        || z < 0
                        || x as usize >= self.dims[0]
                        || y as usize >= self.dims[1]
                        || z as usize >= self.dims[2]
                    {
                        continue;
                    }

                    let cell = &self.cells[self.cell_index([x as usize, y as usize, z as usize])];
                    for &ti in cell {
                        let tri = &self.triangles[ti as usize];
                        let q = closest_point_on_triangle(
                            p,
                            &self.vertices[tri[0]],
                            &self.vertices[tri[1]],
                            &self.vertices[tri[2]],
                        );
                        let d = (q - p).norm();
                        if d < *best {
                            *best = d;
                        }
                    }
                }
            }
        }
    }
}

/// Closest point on a triangle, by walking the barycentric regions.
pub(crate) fn closest_point_on_triangle(
    p: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
) -> Point3<f64> {
    let ab = b - a;
    let ac = c - a;

    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let t = d1 / (d1 - d3);
        return a + ab * t;
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let t = d2 / (d2 - d6);
        return a + ac * t;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let t = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * t;
    }

    let denom = 1.0 / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let triangles = vec![
            [0, 2, 1],
            [0, 3, 2], // bottom
            [4, 5, 6],
            [4, 6, 7], // top
            [0, 1, 5],
            [0, 5, 4], // front
            [2, 3, 7],
            [2, 7, 6], // back
            [1, 2, 6],
            [1, 6, 5], // right
            [3, 0, 4],
            [3, 4, 7], // left
        ];
        (vertices, triangles)
    }

    #[test]
    fn test_closest_point_vertex_region() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);

        let q = closest_point_on_triangle(&Point3::new(-1.0, -1.0, 0.0), &a, &b, &c);
        assert!((q - a).norm() < 1e-12);
    }

    #[test]
    fn test_closest_point_edge_region() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);

        let q = closest_point_on_triangle(&Point3::new(0.5, -1.0, 0.0), &a, &b, &c);
        assert!(q.y.abs() < 1e-12);
        assert!((0.0..=1.0).contains(&q.x));
    }

    #[test]
    fn test_closest_point_interior_region() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);

        let q = closest_point_on_triangle(&Point3::new(0.25, 0.25, 2.0), &a, &b, &c);
        assert!(q.z.abs() < 1e-12);
        assert!((q.x - 0.25).abs() < 1e-12);
        assert!((q.y - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_nearest_distance_outside_cube() {
        let (vertices, triangles) = unit_cube();
        let grid = UniformGrid::new(&vertices, &triangles, 0.25).unwrap();

        let d = grid.nearest_distance(&Point3::new(2.0, 0.5, 0.5));
        assert!((d - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_nearest_distance_on_surface() {
        let (vertices, triangles) = unit_cube();
        let grid = UniformGrid::new(&vertices, &triangles, 0.25).unwrap();

        let d = grid.nearest_distance(&Point3::new(1.0, 0.5, 0.5));
        assert!(d.abs() < 1e-10);
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let vertices: Vec<Point3<f64>> = Vec::new();
        assert!(matches!(
            UniformGrid::new(&vertices, &[], 0.1),
            Err(MeshError::EmptyMesh)
        ));
    }

    #[test]
    fn test_bad_cell_size_rejected() {
        let (vertices, triangles) = unit_cube();
        assert!(matches!(
            UniformGrid::new(&vertices, &triangles, 0.0),
            Err(MeshError::InvalidParameter { .. })
        ));
    }
}
