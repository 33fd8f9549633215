//! Benchmarks for half-edge topology construction and traversal.

use criterion::{criterion_group, criterion_main, Criterion};
use stitch::prelude::*;

fn grid_triangles(n: usize) -> (usize, Vec<[usize; 3]>) {
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
    ((n + 1) * (n + 1), triangles)
}

fn bench_construction(c: &mut Criterion) {
    let (nv, triangles) = grid_triangles(50);

    c.bench_function("build_topology_grid_50x50", |b| {
        b.iter(|| build_topology(nv, &triangles).unwrap());
    });

    c.bench_function("build_topology_hashed_grid_50x50", |b| {
        b.iter(|| build_topology_hashed(nv, &triangles).unwrap());
    });
}

fn bench_traversal(c: &mut Criterion) {
    let (nv, triangles) = grid_triangles(50);
    let topo = build_topology(nv, &triangles).unwrap();

    c.bench_function("walk_all_triangles", |b| {
        b.iter(|| {
            let mut count = 0usize;
            for t in topo.triangle_ids() {
                let h0 = topo.triangle_halfedge(t);
                let mut h = h0;
                loop {
                    count += 1;
                    h = topo.next(h);
                    if h == h0 {
                        break;
                    }
                }
            }
            count
        });
    });

    c.bench_function("count_boundary_halfedges", |b| {
        b.iter(|| topo.boundary_halfedges().count());
    });
}

criterion_group!(benches, bench_construction, bench_traversal);
criterion_main!(benches);
