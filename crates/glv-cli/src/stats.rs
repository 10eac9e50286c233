//! A renderer that only counts what it is asked to draw.

use glv_math::BoundingBox;
use glv_scene::{Batch, IndexedBatch, RenderParams, Renderer, StateDirective};

/// Draw-call counters for one render pass.
#[derive(Debug, Default)]
pub struct CountingRenderer {
    pub batches: usize,
    pub primitives: usize,
    pub indexed_batches: usize,
    pub indexed_primitives: usize,
    pub boxes: usize,
    pub directives: usize,
    depth: usize,
    pub max_depth: usize,
}

impl Renderer for CountingRenderer {
    fn draw(&mut self, batch: Batch<'_>, _params: &RenderParams) {
        self.batches += 1;
        self.primitives += batch.len();
    }

    fn draw_indexed(&mut self, batch: IndexedBatch<'_>, _params: &RenderParams) {
        self.indexed_batches += 1;
        self.indexed_primitives += batch.primitives.len();
    }

    fn draw_bounding_box(&mut self, _bbox: &BoundingBox, _params: &RenderParams) {
        self.boxes += 1;
    }

    fn apply(&mut self, _directive: &StateDirective, _params: &RenderParams) {
        self.directives += 1;
    }

    fn push_state(&mut self) {
        self.depth += 1;
        self.max_depth = self.max_depth.max(self.depth);
    }

    fn pop_state(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
