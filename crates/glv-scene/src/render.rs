//! Render interface between the scene graph and a drawing backend.
//!
//! The scene never talks to a graphics API. It walks its command lists
//! and hands batches, state directives and labels to a [`Renderer`].
//! Backends that can record replayable command lists (display lists,
//! command buffers) opt in through [`Renderer::begin_recording`].

use std::ops::Range;

use glv_math::{BoundingBox, Color, Vec3};
use serde::{Deserialize, Serialize};

use crate::command::StateDirective;
use crate::pool::VertexPool;
use crate::primitive::{
    Line, LineColored, Point, PointColored, Quad, QuadColored, QuadNormals, QuadNormalsColored,
    Triangle, TriangleColored, TriangleNormals, TriangleNormalsColored,
};

/// Point size used when drawing level-of-detail proxies.
pub const SIMPLIFIED_POINT_SIZE: f64 = 3.0;

/// Color used when drawing level-of-detail proxies.
pub const SIMPLIFIED_COLOR: [f64; 3] = [0.7, 0.5, 0.1];

/// How much detail to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Every primitive.
    #[default]
    Full,
    /// One box per primitive store.
    BoundingBox,
    /// Level-of-detail point proxies.
    Simplified,
}

impl RenderMode {
    /// All modes, in cache slot order.
    pub const ALL: [RenderMode; 3] = [Self::Full, Self::BoundingBox, Self::Simplified];

    /// Cache slot of this mode.
    pub fn index(self) -> usize {
        match self {
            Self::Full => 0,
            Self::BoundingBox => 1,
            Self::Simplified => 2,
        }
    }
}

/// Per-pass rendering parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderParams {
    /// Detail level.
    pub mode: RenderMode,
    /// Maximum primitives per batch handed to the renderer.
    pub optimizer_threshold: usize,
    /// Use averaged per-vertex normals for indexed stores.
    pub smooth_normals: bool,
    /// Outline color for facets, when facet frames are on.
    pub facet_frame: Option<Color>,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            mode: RenderMode::Full,
            optimizer_threshold: 100,
            smooth_normals: false,
            facet_frame: None,
        }
    }
}

impl RenderParams {
    /// Track directives that change how later stores are drawn.
    pub fn apply(&mut self, directive: &StateDirective) {
        match directive {
            StateDirective::FacetBoundaryEnable(color) => self.facet_frame = Some(*color),
            StateDirective::FacetBoundaryDisable => self.facet_frame = None,
            _ => {}
        }
    }

    /// Batch size, never zero.
    pub fn batch_size(&self) -> usize {
        self.optimizer_threshold.max(1)
    }
}

/// Draw level-of-detail proxies with their point size and color, inside a
/// saved renderer state.
pub(crate) fn with_proxy_state(
    renderer: &mut dyn Renderer,
    params: &RenderParams,
    draw: impl FnOnce(&mut dyn Renderer),
) {
    let [r, g, b] = SIMPLIFIED_COLOR;
    renderer.push_state();
    renderer.apply(&StateDirective::PointSize(SIMPLIFIED_POINT_SIZE), params);
    renderer.apply(&StateDirective::Color(Color::new(r, g, b)), params);
    draw(renderer);
    renderer.pop_state();
}

/// A run of explicit-coordinate primitives of one kind.
#[derive(Debug, Clone, Copy)]
#[allow(missing_docs)]
pub enum Batch<'a> {
    Points(&'a [Point]),
    PointsColored(&'a [PointColored]),
    Lines(&'a [Line]),
    LinesColored(&'a [LineColored]),
    Triangles(&'a [Triangle]),
    TrianglesColored(&'a [TriangleColored]),
    TrianglesNormals(&'a [TriangleNormals]),
    TrianglesNormalsColored(&'a [TriangleNormalsColored]),
    Quads(&'a [Quad]),
    QuadsColored(&'a [QuadColored]),
    QuadsNormals(&'a [QuadNormals]),
    QuadsNormalsColored(&'a [QuadNormalsColored]),
}

impl<'a> Batch<'a> {
    /// Number of primitives in the batch.
    pub fn len(&self) -> usize {
        match self {
            Self::Points(s) => s.len(),
            Self::PointsColored(s) => s.len(),
            Self::Lines(s) => s.len(),
            Self::LinesColored(s) => s.len(),
            Self::Triangles(s) => s.len(),
            Self::TrianglesColored(s) => s.len(),
            Self::TrianglesNormals(s) => s.len(),
            Self::TrianglesNormalsColored(s) => s.len(),
            Self::Quads(s) => s.len(),
            Self::QuadsColored(s) => s.len(),
            Self::QuadsNormals(s) => s.len(),
            Self::QuadsNormalsColored(s) => s.len(),
        }
    }

    /// True if the batch holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for triangle and quad batches.
    pub fn is_facets(&self) -> bool {
        !matches!(
            self,
            Self::Points(_) | Self::PointsColored(_) | Self::Lines(_) | Self::LinesColored(_)
        )
    }

    /// Sub-batch over `range`.
    pub fn slice(&self, range: Range<usize>) -> Batch<'a> {
        match *self {
            Self::Points(s) => Batch::Points(&s[range]),
            Self::PointsColored(s) => Batch::PointsColored(&s[range]),
            Self::Lines(s) => Batch::Lines(&s[range]),
            Self::LinesColored(s) => Batch::LinesColored(&s[range]),
            Self::Triangles(s) => Batch::Triangles(&s[range]),
            Self::TrianglesColored(s) => Batch::TrianglesColored(&s[range]),
            Self::TrianglesNormals(s) => Batch::TrianglesNormals(&s[range]),
            Self::TrianglesNormalsColored(s) => Batch::TrianglesNormalsColored(&s[range]),
            Self::Quads(s) => Batch::Quads(&s[range]),
            Self::QuadsColored(s) => Batch::QuadsColored(&s[range]),
            Self::QuadsNormals(s) => Batch::QuadsNormals(&s[range]),
            Self::QuadsNormalsColored(s) => Batch::QuadsNormalsColored(&s[range]),
        }
    }

    /// Consecutive sub-batches of at most `size` primitives.
    pub fn chunks(self, size: usize) -> impl Iterator<Item = Batch<'a>> {
        let len = self.len();
        let size = size.max(1);
        (0..len)
            .step_by(size)
            .map(move |start| self.slice(start..len.min(start + size)))
    }
}

impl<'a> IndexedPrimitives<'a> {
    /// Number of primitives.
    pub fn len(&self) -> usize {
        match self {
            Self::Points(s) => s.len(),
            Self::Lines(s) => s.len(),
            Self::Triangles(s) => s.len(),
            Self::Quads(s) => s.len(),
        }
    }

    /// True if there are no primitives.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consecutive runs of at most `size` primitives.
    pub fn chunks(self, size: usize) -> impl Iterator<Item = IndexedPrimitives<'a>> {
        let len = self.len();
        let size = size.max(1);
        (0..len).step_by(size).map(move |start| {
            let range = start..len.min(start + size);
            match self {
                Self::Points(s) => Self::Points(&s[range]),
                Self::Lines(s) => Self::Lines(&s[range]),
                Self::Triangles(s) => Self::Triangles(&s[range]),
                Self::Quads(s) => Self::Quads(&s[range]),
            }
        })
    }
}

/// Index tuples into a vertex pool.
#[derive(Debug, Clone, Copy)]
#[allow(missing_docs)]
pub enum IndexedPrimitives<'a> {
    Points(&'a [[u32; 1]]),
    Lines(&'a [[u32; 2]]),
    Triangles(&'a [[u32; 3]]),
    Quads(&'a [[u32; 4]]),
}

/// A run of indexed primitives with the pool they refer to.
#[derive(Debug, Clone, Copy)]
pub struct IndexedBatch<'a> {
    /// Shared vertices, and colors when the pool has them.
    pub pool: &'a VertexPool,
    /// Per-vertex normals when smoothing is on.
    pub normals: Option<&'a [Vec3]>,
    /// The primitives.
    pub primitives: IndexedPrimitives<'a>,
}

/// Opaque id of a recorded command list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderHandle(pub u64);

/// Drawing backend driven by [`SceneNode::render`](crate::SceneNode::render).
pub trait Renderer {
    /// Draw a batch of explicit-coordinate primitives.
    fn draw(&mut self, batch: Batch<'_>, params: &RenderParams);

    /// Draw a batch of indexed primitives.
    fn draw_indexed(&mut self, batch: IndexedBatch<'_>, params: &RenderParams);

    /// Outline the facets of a triangle or quad batch with `color`.
    ///
    /// Called ahead of the filled batches while facet frames are on.
    fn draw_facet_frame(&mut self, _batch: Batch<'_>, _color: &Color) {}

    /// Draw a store's bounding box in bounding-box mode.
    fn draw_bounding_box(&mut self, bbox: &BoundingBox, params: &RenderParams);

    /// Apply a state directive. Text labels arrive here too.
    fn apply(&mut self, directive: &StateDirective, params: &RenderParams);

    /// Save transform and attributes before a sub-node.
    fn push_state(&mut self) {}

    /// Restore what the matching [`push_state`](Self::push_state) saved.
    fn pop_state(&mut self) {}

    /// Start recording. `None` means recording is unsupported.
    fn begin_recording(&mut self, _mode: RenderMode) -> Option<RenderHandle> {
        None
    }

    /// Stop recording `handle`.
    fn end_recording(&mut self, _handle: RenderHandle) {}

    /// Replay a recording; `false` if the handle is no longer valid.
    fn replay(&mut self, _handle: RenderHandle) -> bool {
        false
    }
}
