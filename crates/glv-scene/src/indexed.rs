//! Primitives that index into a shared [`VertexPool`].
//!
//! A store remembers which pool it draws from; the owning node passes that
//! pool back in for every query. Indices are validated against the pool
//! when added and never stored out of range.

use std::io::{self, Write};

use glv_math::{BoundingBox, Point3, Transform, Vec3};

use crate::dump::write_bbox;
use crate::pool::VertexPool;
use crate::render::{
    with_proxy_state, IndexedBatch, IndexedPrimitives, RenderMode, RenderParams, Renderer,
};
use crate::simplify::SphereSampler;
use crate::store::PrimitiveStore;

/// Point, line, triangle and quad index buffers over one vertex pool.
#[derive(Debug, Clone)]
pub struct IndexedStore {
    pool: usize,
    lines: Vec<[u32; 2]>,
    points: Vec<[u32; 1]>,
    quads: Vec<[u32; 4]>,
    triangles: Vec<[u32; 3]>,
    scanned: [usize; 4],
    bbox: BoundingBox,
    simplified: PrimitiveStore,
    simplified_dirty: bool,
}

impl IndexedStore {
    /// Create an empty store drawing from the pool at `pool`.
    pub fn new(pool: usize) -> Self {
        Self {
            pool,
            lines: Vec::new(),
            points: Vec::new(),
            quads: Vec::new(),
            triangles: Vec::new(),
            scanned: [0; 4],
            bbox: BoundingBox::empty(),
            simplified: PrimitiveStore::without_proxy(),
            simplified_dirty: false,
        }
    }

    /// Index of the pool this store draws from.
    pub fn pool(&self) -> usize {
        self.pool
    }

    /// Add a point; `false` if the index is out of range.
    pub fn add_point(&mut self, pool: &VertexPool, index: [i64; 1]) -> bool {
        push_checked(&mut self.points, pool, index, &mut self.simplified_dirty)
    }

    /// Add a line; `false` if an index is out of range.
    pub fn add_line(&mut self, pool: &VertexPool, indices: [i64; 2]) -> bool {
        push_checked(&mut self.lines, pool, indices, &mut self.simplified_dirty)
    }

    /// Add a triangle; `false` if an index is out of range.
    pub fn add_triangle(&mut self, pool: &VertexPool, indices: [i64; 3]) -> bool {
        push_checked(&mut self.triangles, pool, indices, &mut self.simplified_dirty)
    }

    /// Add a quad; `false` if an index is out of range.
    pub fn add_quad(&mut self, pool: &VertexPool, indices: [i64; 4]) -> bool {
        push_checked(&mut self.quads, pool, indices, &mut self.simplified_dirty)
    }

    /// Number of indexed primitives.
    pub fn primitive_count(&self) -> usize {
        self.points.len() + self.lines.len() + self.triangles.len() + self.quads.len()
    }

    /// Triangle index tuples.
    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Quad index tuples.
    pub fn quads(&self) -> &[[u32; 4]] {
        &self.quads
    }

    /// Bounding box of the referenced vertices, scanning only new primitives.
    pub fn bounding_box(&mut self, pool: &VertexPool) -> BoundingBox {
        scan_new(&self.lines, &mut self.scanned[0], pool, &mut self.bbox);
        scan_new(&self.points, &mut self.scanned[1], pool, &mut self.bbox);
        scan_new(&self.quads, &mut self.scanned[2], pool, &mut self.bbox);
        scan_new(&self.triangles, &mut self.scanned[3], pool, &mut self.bbox);
        self.bbox
    }

    /// Level-of-detail proxy, rebuilt after any addition.
    pub fn simplified(&mut self, pool: &VertexPool) -> &PrimitiveStore {
        if self.simplified_dirty {
            self.simplified_dirty = false;
            let bbox = self.bounding_box(pool);
            let mut sampler = SphereSampler::new(&bbox);
            offer_all(&mut sampler, &self.lines, pool);
            offer_all(&mut sampler, &self.points, pool);
            offer_all(&mut sampler, &self.quads, pool);
            offer_all(&mut sampler, &self.triangles, pool);

            let mut proxy = PrimitiveStore::without_proxy();
            for p in sampler.into_points() {
                proxy.add_point(p);
            }
            self.simplified = proxy;
        }
        &self.simplified
    }

    /// Hand this store to `renderer`.
    ///
    /// With smoothing on, pool normals are computed first if they do not
    /// cover every vertex.
    pub fn render(&mut self, pool: &mut VertexPool, renderer: &mut dyn Renderer, params: &RenderParams) {
        match params.mode {
            RenderMode::Full => {
                if params.smooth_normals && !pool.has_normals() {
                    pool.compute_normals(&self.quads, &self.triangles);
                }
                let pool: &VertexPool = pool;
                let normals = params.smooth_normals.then(|| pool.normals());
                let size = params.batch_size();
                let runs = [
                    IndexedPrimitives::Lines(&self.lines),
                    IndexedPrimitives::Points(&self.points),
                    IndexedPrimitives::Quads(&self.quads),
                    IndexedPrimitives::Triangles(&self.triangles),
                ];
                for run in runs {
                    for primitives in run.chunks(size) {
                        renderer.draw_indexed(
                            IndexedBatch {
                                pool,
                                normals,
                                primitives,
                            },
                            params,
                        );
                    }
                }
            }
            RenderMode::BoundingBox => {
                let bbox = self.bounding_box(pool);
                renderer.draw_bounding_box(&bbox, params);
            }
            RenderMode::Simplified => {
                let proxy = self.simplified(pool);
                with_proxy_state(renderer, params, |r| {
                    for batch in proxy.batches() {
                        for chunk in batch.chunks(params.batch_size()) {
                            r.draw(chunk, params);
                        }
                    }
                });
            }
        }
    }

    /// Write the store's box and per-kind counts.
    pub fn dump(
        &mut self,
        pool: &VertexPool,
        out: &mut dyn Write,
        indent: &str,
        transform: &Transform,
    ) -> io::Result<()> {
        writeln!(out, "{indent}IndexedStore (pool {})", self.pool)?;
        let inner = format!("{indent}  ");
        let bbox = self.bounding_box(pool);
        write_bbox(out, &inner, &bbox, transform)?;
        writeln!(out, "{inner}Number of point_v        = {}", self.points.len())?;
        writeln!(out, "{inner}Number of line_v         = {}", self.lines.len())?;
        writeln!(out, "{inner}Number of triangle_v     = {}", self.triangles.len())?;
        writeln!(out, "{inner}Number of quad_v         = {}", self.quads.len())
    }
}

fn push_checked<const N: usize>(
    list: &mut Vec<[u32; N]>,
    pool: &VertexPool,
    indices: [i64; N],
    dirty: &mut bool,
) -> bool {
    match pool.checked_indices(indices) {
        Some(checked) => {
            list.push(checked);
            *dirty = true;
            true
        }
        None => false,
    }
}

fn scan_new<const N: usize>(
    list: &[[u32; N]],
    scanned: &mut usize,
    pool: &VertexPool,
    bbox: &mut BoundingBox,
) {
    for tuple in &list[*scanned..] {
        for &i in tuple {
            bbox.include_point(&pool.vertex(i));
        }
    }
    *scanned = list.len();
}

fn offer_all<const N: usize>(sampler: &mut SphereSampler, list: &[[u32; N]], pool: &VertexPool) {
    for tuple in list {
        let sum = tuple
            .iter()
            .fold(Vec3::zeros(), |acc, &i| acc + pool.vertex(i).coords);
        sampler.offer(Point3::from(sum / N as f64));
    }
}
