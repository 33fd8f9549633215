//! Geometric deviation between two meshes.
//!
//! Measures how far a set of sample points (typically the vertices of an
//! original mesh) lies from the surface of a reference mesh (typically its
//! simplified counterpart). Distances are exact point-to-surface distances
//! accelerated by a uniform spatial grid over the reference mesh; per-point
//! evaluation runs in parallel.
//!
//! The method follows the MESH/meshdev family of tools: sample one mesh,
//! query nearest-surface distances against the other, and summarize with
//! min / max / mean / variance / RMS statistics.
//!
//! # Example
//!
//! ```
//! use nalgebra::Point3;
//! use stitch::algo::deviation::{measure_deviation, DeviationOptions};
//!
//! let reference = vec![
//!     Point3::new(-10.0, -10.0, 0.0),
//!     Point3::new(10.0, -10.0, 0.0),
//!     Point3::new(0.0, 10.0, 0.0),
//! ];
//! let triangles = vec![[0, 1, 2]];
//!
//! // two samples hovering above the reference plane
//! let samples = vec![Point3::new(0.0, 0.0, 1.0), Point3::new(1.0, 0.0, 2.0)];
//!
//! let report = measure_deviation(
//!     &samples,
//!     &reference,
//!     &triangles,
//!     &DeviationOptions::default(),
//! )
//! .unwrap();
//!
//! assert!((report.max - 2.0).abs() < 1e-10);
//! assert!((report.mean - 1.5).abs() < 1e-10);
//! ```

mod grid;

pub use grid::UniformGrid;

use nalgebra::Point3;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{MeshError, Result};

/// Options for deviation measurement.
#[derive(Debug, Clone)]
pub struct DeviationOptions {
    /// Grid cell edge length as a percentage of the reference mesh's
    /// bounding-box diagonal.
    pub grid_percent: f64,

    /// Whether to evaluate sample points in parallel (default: true).
    pub parallel: bool,
}

impl Default for DeviationOptions {
    fn default() -> Self {
        Self {
            grid_percent: 5.0,
            parallel: true,
        }
    }
}

impl DeviationOptions {
    /// Set the grid cell size as a percentage of the bounding-box diagonal.
    pub fn with_grid_percent(mut self, percent: f64) -> Self {
        self.grid_percent = percent;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Summary of per-sample distances to the reference surface.
#[derive(Debug, Clone)]
pub struct DeviationReport {
    /// Distance from each sample point to the reference surface, in input
    /// order.
    pub per_sample: Vec<f64>,
    /// Smallest deviation.
    pub min: f64,
    /// Largest deviation.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample variance (n - 1 denominator).
    pub variance: f64,
    /// Root mean square deviation.
    pub rms: f64,
}

impl DeviationReport {
    fn from_samples(per_sample: Vec<f64>) -> Self {
        let n = per_sample.len();
        if n == 0 {
            return Self {
                per_sample,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                variance: 0.0,
                rms: 0.0,
            };
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &d in &per_sample {
            min = min.min(d);
            max = max.max(d);
            sum += d;
        }
        let mean = sum / n as f64;

        let mut variance = 0.0;
        let mut rms = 0.0;
        for &d in &per_sample {
            variance += (d - mean) * (d - mean);
            rms += d * d;
        }
        variance = if n > 1 { variance / (n - 1) as f64 } else { 0.0 };
        rms = (rms / n as f64).sqrt();

        Self {
            per_sample,
            min,
            max,
            mean,
            variance,
            rms,
        }
    }

    /// Deviations scaled into `[0, 1]` by the largest value.
    ///
    /// A flat zero-deviation result normalizes to all zeros.
    pub fn normalized(&self) -> Vec<f64> {
        let bound = if self.max > 0.0 { self.max } else { 1.0 };
        self.per_sample.iter().map(|d| d / bound).collect()
    }
}

/// Measure the deviation of sample points from a reference mesh surface.
///
/// # Arguments
/// * `samples` - Points to measure (e.g. the original mesh's vertices)
/// * `ref_vertices` / `ref_triangles` - The reference surface
/// * `options` - Grid resolution and parallelism
///
/// # Errors
/// Fails if the reference mesh has no triangles, references out-of-range
/// vertex indices, or `options.grid_percent` is not positive and finite.
pub fn measure_deviation(
    samples: &[Point3<f64>],
    ref_vertices: &[Point3<f64>],
    ref_triangles: &[[usize; 3]],
    options: &DeviationOptions,
) -> Result<DeviationReport> {
    if ref_triangles.is_empty() {
        return Err(MeshError::EmptyMesh);
    }
    if !(options.grid_percent.is_finite() && options.grid_percent > 0.0) {
        return Err(MeshError::invalid_param(
            "grid_percent",
            options.grid_percent,
            "must be positive and finite",
        ));
    }

    let diagonal = bounding_diagonal(ref_vertices, ref_triangles);
    // Degenerate (single-point) reference meshes still need a usable cell.
    let cell_size = if diagonal > 0.0 {
        diagonal * options.grid_percent * 0.01
    } else {
        1.0
    };

    let grid = UniformGrid::new(ref_vertices, ref_triangles, cell_size)?;

    let per_sample: Vec<f64> = if options.parallel {
        samples.par_iter().map(|p| grid.nearest_distance(p)).collect()
    } else {
        samples.iter().map(|p| grid.nearest_distance(p)).collect()
    };

    let report = DeviationReport::from_samples(per_sample);
    debug!(
        samples = samples.len(),
        max = report.max,
        rms = report.rms,
        "deviation measured"
    );
    Ok(report)
}

fn bounding_diagonal(vertices: &[Point3<f64>], triangles: &[[usize; 3]]) -> f64 {
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for tri in triangles {
        for &vi in tri {
            if let Some(p) = vertices.get(vi) {
                for i in 0..3 {
                    min[i] = min[i].min(p[i]);
                    max[i] = max[i].max(p[i]);
                }
            }
        }
    }
    let mut sq = 0.0;
    for i in 0..3 {
        if max[i] > min[i] {
            sq += (max[i] - min[i]) * (max[i] - min[i]);
        }
    }
    sq.sqrt()
}
