//! Explicit-coordinate primitive store.
//!
//! A store holds twelve append-only buffers, one per primitive flavor.
//! Its bounding box grows incrementally: each query scans only what was
//! appended since the previous query. The level-of-detail proxy is rebuilt
//! lazily after any addition.

use std::io::{self, Write};

use glv_math::{BoundingBox, Color, Point3, Transform};

use crate::dump::write_bbox;
use crate::primitive::{
    Colored, Line, LineColored, Point, PointColored, Primitive, Quad, QuadColored, QuadNormals,
    QuadNormalsColored, Triangle, TriangleColored, TriangleNormals, TriangleNormalsColored,
};
use crate::render::{with_proxy_state, Batch, RenderMode, RenderParams, Renderer};
use crate::shapes;
use crate::simplify::SphereSampler;

/// Slices and stacks of `glutsolidsphere`.
const SPHERE_RESOLUTION: usize = 20;

#[derive(Debug, Clone)]
struct Buffer<T> {
    items: Vec<T>,
    scanned: usize,
}

impl<T> Default for Buffer<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            scanned: 0,
        }
    }
}

impl<T: Primitive> Buffer<T> {
    fn scan_new(&mut self, bbox: &mut BoundingBox) {
        for p in &self.items[self.scanned..] {
            for pt in p.points() {
                bbox.include_point(pt);
            }
        }
        self.scanned = self.items.len();
    }
}

#[derive(Debug, Clone)]
enum Simplified {
    /// The store is its own proxy.
    Itself,
    Proxy(Box<PrimitiveStore>),
}

/// Per-type buffers of primitives with explicit coordinates.
#[derive(Debug, Clone)]
pub struct PrimitiveStore {
    lines: Buffer<Line>,
    lines_colored: Buffer<LineColored>,
    points: Buffer<Point>,
    points_colored: Buffer<PointColored>,
    quads: Buffer<Quad>,
    quads_colored: Buffer<QuadColored>,
    quads_normals: Buffer<QuadNormals>,
    quads_normals_colored: Buffer<QuadNormalsColored>,
    triangles: Buffer<Triangle>,
    triangles_colored: Buffer<TriangleColored>,
    triangles_normals: Buffer<TriangleNormals>,
    triangles_normals_colored: Buffer<TriangleNormalsColored>,
    bbox: BoundingBox,
    simplified: Simplified,
    simplified_dirty: bool,
}

impl Default for PrimitiveStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PrimitiveStore {
    /// Create an empty store with its own level-of-detail proxy.
    pub fn new() -> Self {
        let mut store = Self::without_proxy();
        store.simplified = Simplified::Proxy(Box::new(Self::without_proxy()));
        store
    }

    /// Create an empty store that acts as its own proxy.
    pub fn without_proxy() -> Self {
        Self {
            lines: Buffer::default(),
            lines_colored: Buffer::default(),
            points: Buffer::default(),
            points_colored: Buffer::default(),
            quads: Buffer::default(),
            quads_colored: Buffer::default(),
            quads_normals: Buffer::default(),
            quads_normals_colored: Buffer::default(),
            triangles: Buffer::default(),
            triangles_colored: Buffer::default(),
            triangles_normals: Buffer::default(),
            triangles_normals_colored: Buffer::default(),
            bbox: BoundingBox::empty(),
            simplified: Simplified::Itself,
            simplified_dirty: false,
        }
    }

    /// Add a point.
    pub fn add_point(&mut self, p: Point3) {
        self.points.items.push(Point { points: [p] });
        self.simplified_dirty = true;
    }

    /// Add a colored point.
    pub fn add_point_colored(&mut self, p: Point3, c: Color) {
        self.points_colored.items.push(PointColored {
            points: [p],
            colors: [c],
        });
        self.simplified_dirty = true;
    }

    /// Add a line segment.
    pub fn add_line(&mut self, points: [Point3; 2]) {
        self.lines.items.push(Line { points });
        self.simplified_dirty = true;
    }

    /// Add a line segment with per-end colors.
    pub fn add_line_colored(&mut self, points: [Point3; 2], colors: [Color; 2]) {
        self.lines_colored.items.push(Colored { points, colors });
        self.simplified_dirty = true;
    }

    /// Add a triangle.
    pub fn add_triangle(&mut self, points: [Point3; 3]) {
        self.triangles.items.push(Triangle { points });
        self.simplified_dirty = true;
    }

    /// Add a triangle with per-corner colors.
    pub fn add_triangle_colored(&mut self, points: [Point3; 3], colors: [Color; 3]) {
        self.triangles_colored.items.push(Colored { points, colors });
        self.simplified_dirty = true;
    }

    /// Add a quad.
    pub fn add_quad(&mut self, points: [Point3; 4]) {
        self.quads.items.push(Quad { points });
        self.simplified_dirty = true;
    }

    /// Add a quad with per-corner colors.
    pub fn add_quad_colored(&mut self, points: [Point3; 4], colors: [Color; 4]) {
        self.quads_colored.items.push(Colored { points, colors });
        self.simplified_dirty = true;
    }

    /// Add an arrow: a line plus a cone tip at `p2`.
    pub fn add_arrow(&mut self, p1: Point3, p2: Point3, tip_proportion: f64, tip_polygons: usize) {
        self.add_line([p1, p2]);
        self.triangles_normals
            .items
            .extend(shapes::arrow_tip(&p1, &p2, tip_proportion, tip_polygons));
    }

    /// Add a colored arrow; the tip takes the color of `p2`.
    pub fn add_arrow_colored(
        &mut self,
        ends: [Point3; 2],
        colors: [Color; 2],
        tip_proportion: f64,
        tip_polygons: usize,
    ) {
        self.add_line_colored(ends, colors);
        let tip = shapes::arrow_tip(&ends[0], &ends[1], tip_proportion, tip_polygons);
        self.triangles_normals_colored
            .items
            .extend(tip.into_iter().map(|t| TriangleNormalsColored {
                points: t.points,
                normals: t.normals,
                colors: [colors[1]; 3],
            }));
    }

    /// Add the 12 edges of a cube of half extent `half_size`.
    pub fn add_wire_cube(&mut self, center: Point3, half_size: f64) {
        self.lines.items.extend(shapes::wire_cube(&center, half_size));
        self.simplified_dirty = true;
    }

    /// Add the 6 faces of a cube of half extent `half_size`.
    pub fn add_solid_cube(&mut self, center: Point3, half_size: f64) {
        self.quads.items.extend(shapes::solid_cube(&center, half_size));
        self.simplified_dirty = true;
    }

    /// Add a shaded sphere.
    pub fn add_solid_sphere(&mut self, center: Point3, radius: f64) {
        self.quads_normals.items.extend(shapes::solid_sphere(
            &center,
            radius,
            SPHERE_RESOLUTION,
            SPHERE_RESOLUTION,
        ));
        self.simplified_dirty = true;
    }

    /// Bounding box of everything added so far.
    ///
    /// Only primitives added since the last call are scanned.
    pub fn bounding_box(&mut self) -> BoundingBox {
        let bbox = &mut self.bbox;
        self.lines.scan_new(bbox);
        self.lines_colored.scan_new(bbox);
        self.points.scan_new(bbox);
        self.points_colored.scan_new(bbox);
        self.quads.scan_new(bbox);
        self.quads_colored.scan_new(bbox);
        self.quads_normals.scan_new(bbox);
        self.quads_normals_colored.scan_new(bbox);
        self.triangles.scan_new(bbox);
        self.triangles_colored.scan_new(bbox);
        self.triangles_normals.scan_new(bbox);
        self.triangles_normals_colored.scan_new(bbox);
        self.bbox
    }

    /// Every buffer as a batch, in drawing order.
    pub fn batches(&self) -> [Batch<'_>; 12] {
        [
            Batch::Lines(&self.lines.items),
            Batch::LinesColored(&self.lines_colored.items),
            Batch::Points(&self.points.items),
            Batch::PointsColored(&self.points_colored.items),
            Batch::Quads(&self.quads.items),
            Batch::QuadsColored(&self.quads_colored.items),
            Batch::QuadsNormals(&self.quads_normals.items),
            Batch::QuadsNormalsColored(&self.quads_normals_colored.items),
            Batch::Triangles(&self.triangles.items),
            Batch::TrianglesColored(&self.triangles_colored.items),
            Batch::TrianglesNormals(&self.triangles_normals.items),
            Batch::TrianglesNormalsColored(&self.triangles_normals_colored.items),
        ]
    }

    /// Total number of primitives of every kind.
    pub fn primitive_count(&self) -> usize {
        self.batches().iter().map(Batch::len).sum()
    }

    /// True if nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.primitive_count() == 0
    }

    /// The level-of-detail proxy, rebuilt if primitives were added since
    /// the last call.
    pub fn simplified(&mut self) -> &PrimitiveStore {
        if self.simplified_dirty {
            self.rebuild_simplified();
        }
        match &self.simplified {
            Simplified::Itself => &*self,
            Simplified::Proxy(proxy) => proxy,
        }
    }

    fn rebuild_simplified(&mut self) {
        self.simplified_dirty = false;
        if matches!(self.simplified, Simplified::Itself) {
            return;
        }

        let bbox = self.bounding_box();
        let mut sampler = SphereSampler::new(&bbox);
        sampler.scan(&self.lines.items);
        sampler.scan(&self.lines_colored.items);
        sampler.scan(&self.points.items);
        sampler.scan(&self.points_colored.items);
        sampler.scan(&self.quads.items);
        sampler.scan(&self.quads_colored.items);
        sampler.scan(&self.quads_normals.items);
        sampler.scan(&self.quads_normals_colored.items);
        sampler.scan(&self.triangles.items);
        sampler.scan(&self.triangles_colored.items);
        sampler.scan(&self.triangles_normals.items);
        sampler.scan(&self.triangles_normals_colored.items);

        let mut proxy = Self::without_proxy();
        for p in sampler.into_points() {
            proxy.add_point(p);
        }
        self.simplified = Simplified::Proxy(Box::new(proxy));
    }

    /// Hand this store to `renderer` at the detail level of `params`.
    pub fn render(&mut self, renderer: &mut dyn Renderer, params: &RenderParams) {
        match params.mode {
            RenderMode::Full => self.render_full(renderer, params),
            RenderMode::BoundingBox => {
                let bbox = self.bounding_box();
                renderer.draw_bounding_box(&bbox, params);
            }
            RenderMode::Simplified => {
                let proxy = self.simplified();
                with_proxy_state(renderer, params, |r| proxy.render_full(r, params));
            }
        }
    }

    fn render_full(&self, renderer: &mut dyn Renderer, params: &RenderParams) {
        let size = params.batch_size();
        if let Some(color) = &params.facet_frame {
            for batch in self.batches().into_iter().filter(Batch::is_facets) {
                for chunk in batch.chunks(size) {
                    renderer.draw_facet_frame(chunk, color);
                }
            }
        }
        for batch in self.batches() {
            for chunk in batch.chunks(size) {
                renderer.draw(chunk, params);
            }
        }
    }

    /// Write the store's box and per-kind counts.
    pub fn dump(&mut self, out: &mut dyn Write, indent: &str, transform: &Transform) -> io::Result<()> {
        writeln!(out, "{indent}PrimitiveStore")?;
        let inner = format!("{indent}  ");
        let bbox = self.bounding_box();
        write_bbox(out, &inner, &bbox, transform)?;

        let counts = [
            ("point", self.points.items.len()),
            ("point_colored", self.points_colored.items.len()),
            ("line", self.lines.items.len()),
            ("line_colored", self.lines_colored.items.len()),
            (
                "triangle",
                self.triangles.items.len() + self.triangles_normals.items.len(),
            ),
            (
                "triangle_colored",
                self.triangles_colored.items.len() + self.triangles_normals_colored.items.len(),
            ),
            (
                "quad",
                self.quads.items.len() + self.quads_normals.items.len(),
            ),
            (
                "quad_colored",
                self.quads_colored.items.len() + self.quads_normals_colored.items.len(),
            ),
        ];
        for (name, n) in counts {
            writeln!(out, "{inner}Number of {name:<16} = {n}")?;
        }
        Ok(())
    }
}
