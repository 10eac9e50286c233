//! Scene graph nodes.
//!
//! A node owns an ordered command list plus the stores, vertex pools and
//! sub-nodes those commands refer to. Once its defining block ends the
//! node is frozen: its bounding box is computed one last time and cached.

use std::io::{self, Write};

use glv_math::{BoundingBox, Transform};

use crate::command::{Command, StateDirective};
use crate::dump::write_bbox;
use crate::indexed::IndexedStore;
use crate::pool::VertexPool;
use crate::raw::{ArrowTip, RawMode};
use crate::render::{RenderHandle, RenderMode, RenderParams, Renderer};
use crate::store::PrimitiveStore;

/// What the caller must do after a command was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Nothing; the node stays the active one.
    Continue,
    /// `object_begin` created the sub-node at this index; it becomes active.
    Enter(usize),
    /// `object_end` froze this node; its parent becomes active.
    Leave,
    /// The sub-node set changed; ancestors must drop cached render handles.
    Invalidated,
}

/// Aggregate counts over a node and its live descendants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    /// Nodes, including this one.
    pub nodes: usize,
    /// Explicit-coordinate primitives.
    pub primitives: usize,
    /// Indexed primitives.
    pub indexed_primitives: usize,
    /// Vertices across all pools.
    pub vertices: usize,
}

/// Running transform while replaying a command list.
pub(crate) struct TransformStack {
    current: Transform,
    saved: Vec<Transform>,
}

impl TransformStack {
    pub(crate) fn new(base: Transform) -> Self {
        Self {
            current: base,
            saved: Vec::new(),
        }
    }

    pub(crate) fn current(&self) -> &Transform {
        &self.current
    }

    /// Track `gltranslate`, `glscale`, `glpushmatrix` and `glpopmatrix`.
    pub(crate) fn apply(&mut self, directive: &StateDirective) {
        match directive {
            StateDirective::Translate(v) => {
                self.current = self.current.then(&Transform::translation(v.x, v.y, v.z));
            }
            StateDirective::Scale(v) => {
                self.current = self.current.then(&Transform::scale(v.x, v.y, v.z));
            }
            StateDirective::PushMatrix => self.saved.push(self.current),
            StateDirective::PopMatrix => {
                if let Some(t) = self.saved.pop() {
                    self.current = t;
                }
            }
            _ => {}
        }
    }
}

/// A node of the scene tree.
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub(crate) name: String,
    pub(crate) commands: Vec<Command>,
    pub(crate) sub_nodes: Vec<Option<SceneNode>>,
    pub(crate) stores: Vec<PrimitiveStore>,
    pub(crate) indexed_stores: Vec<IndexedStore>,
    pub(crate) pools: Vec<VertexPool>,
    pub(crate) bbox: BoundingBox,
    pub(crate) frozen: bool,
    pub(crate) raw_mode: RawMode,
    pub(crate) arrow_tip: Option<ArrowTip>,
    pub(crate) new_store_needed: bool,
    pub(crate) new_indexed_needed: bool,
    handles: [Option<RenderHandle>; 3],
}

impl Default for SceneNode {
    fn default() -> Self {
        Self::new("")
    }
}

impl SceneNode {
    /// Create an empty, unfrozen node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            sub_nodes: Vec::new(),
            stores: Vec::new(),
            indexed_stores: Vec::new(),
            pools: Vec::new(),
            bbox: BoundingBox::empty(),
            frozen: false,
            raw_mode: RawMode::NotInRaw,
            arrow_tip: None,
            new_store_needed: true,
            new_indexed_needed: true,
            handles: [None; 3],
        }
    }

    /// Name given at `object_begin`; may be empty.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once the node's block has ended.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Current raw section state.
    pub fn raw_mode(&self) -> RawMode {
        self.raw_mode
    }

    /// The recorded command list.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Sub-node slots; deleted sub-nodes are `None`.
    pub fn sub_nodes(&self) -> &[Option<SceneNode>] {
        &self.sub_nodes
    }

    /// Live sub-node at `index`.
    pub fn sub_node(&self, index: usize) -> Option<&SceneNode> {
        self.sub_nodes.get(index).and_then(Option::as_ref)
    }

    /// Mutable live sub-node at `index`.
    pub fn sub_node_mut(&mut self, index: usize) -> Option<&mut SceneNode> {
        self.sub_nodes.get_mut(index).and_then(Option::as_mut)
    }

    /// Follow a path of sub-node indices from this node.
    pub fn descendant_mut(&mut self, path: &[usize]) -> Option<&mut SceneNode> {
        let mut node = self;
        for &i in path {
            node = node.sub_node_mut(i)?;
        }
        Some(node)
    }

    /// Explicit-coordinate stores, in creation order.
    pub fn primitive_stores(&self) -> &[PrimitiveStore] {
        &self.stores
    }

    /// Indexed stores, in creation order.
    pub fn indexed_stores(&self) -> &[IndexedStore] {
        &self.indexed_stores
    }

    /// Vertex pools, one per `raw_vertex` section.
    pub fn pools(&self) -> &[VertexPool] {
        &self.pools
    }

    /// Compute the bounding box one last time and freeze the node.
    pub fn freeze(&mut self) {
        self.bounding_box();
        self.frozen = true;
        log::debug!("object_end: {:?} frozen", self.name);
    }

    /// Bounding box of everything this node draws, in its own frame.
    ///
    /// Frozen nodes return their cached box. Otherwise the command list
    /// is replayed: store and sub-node boxes are transformed by the
    /// running `gltranslate`/`glscale` matrix and unioned, and text
    /// labels contribute their anchor.
    pub fn bounding_box(&mut self) -> BoundingBox {
        if self.frozen {
            return self.bbox;
        }

        let Self {
            commands,
            sub_nodes,
            stores,
            indexed_stores,
            pools,
            ..
        } = self;

        let mut bbox = BoundingBox::empty();
        let mut stack = TransformStack::new(Transform::identity());
        for command in commands.iter() {
            match command {
                Command::ExecutePrimitiveStore(i) => {
                    bbox += stores[*i].bounding_box().transformed(stack.current());
                }
                Command::ExecuteIndexedStore(i) => {
                    let store = &mut indexed_stores[*i];
                    let pool = &pools[store.pool()];
                    bbox += store.bounding_box(pool).transformed(stack.current());
                }
                Command::ExecuteSubNode(i) => {
                    if let Some(child) = &mut sub_nodes[*i] {
                        bbox += child.bounding_box().transformed(stack.current());
                    }
                }
                Command::State(StateDirective::Text { anchor, .. }) => {
                    bbox += stack.current().apply_point(anchor);
                }
                Command::State(directive) => stack.apply(directive),
            }
        }

        self.bbox = bbox;
        bbox
    }

    /// Forget every cached render handle of this node.
    pub fn clear_render_handles(&mut self) {
        self.handles = [None; 3];
    }

    /// Cached handle for `mode`, if one was recorded.
    pub fn render_handle(&self, mode: RenderMode) -> Option<RenderHandle> {
        self.handles[mode.index()]
    }

    /// Render this node and its sub-nodes.
    ///
    /// A frozen node is recorded once per render mode when the renderer
    /// supports recording, and replayed afterwards. Otherwise its
    /// commands are executed one by one.
    pub fn render(&mut self, renderer: &mut dyn Renderer, params: &RenderParams) {
        let slot = params.mode.index();
        if self.frozen && self.handles[slot].is_none() {
            self.record(renderer, params);
        }
        if let Some(handle) = self.handles[slot] {
            if renderer.replay(handle) {
                return;
            }
            self.handles[slot] = None;
        }
        self.execute(renderer, params);
    }

    fn record(&mut self, renderer: &mut dyn Renderer, params: &RenderParams) {
        let slot = params.mode.index();

        // Sub-nodes first so this recording only replays theirs.
        let mut local = params.clone();
        let Self {
            commands,
            sub_nodes,
            ..
        } = self;
        for command in commands.iter() {
            match command {
                Command::ExecuteSubNode(i) => {
                    if let Some(child) = &mut sub_nodes[*i] {
                        if child.frozen && child.handles[slot].is_none() {
                            child.record(renderer, &local);
                        }
                    }
                }
                Command::State(directive) => local.apply(directive),
                _ => {}
            }
        }

        if let Some(handle) = renderer.begin_recording(params.mode) {
            self.execute(renderer, params);
            renderer.end_recording(handle);
            self.handles[slot] = Some(handle);
        }
    }

    fn execute(&mut self, renderer: &mut dyn Renderer, params: &RenderParams) {
        let mut local = params.clone();
        let Self {
            commands,
            sub_nodes,
            stores,
            indexed_stores,
            pools,
            ..
        } = self;
        for command in commands.iter() {
            match command {
                Command::ExecutePrimitiveStore(i) => stores[*i].render(renderer, &local),
                Command::ExecuteIndexedStore(i) => {
                    let store = &mut indexed_stores[*i];
                    let pool = store.pool();
                    store.render(&mut pools[pool], renderer, &local);
                }
                Command::ExecuteSubNode(i) => {
                    if let Some(child) = &mut sub_nodes[*i] {
                        renderer.push_state();
                        child.render(renderer, &local);
                        renderer.pop_state();
                    }
                }
                Command::State(directive) => {
                    local.apply(directive);
                    renderer.apply(directive, &local);
                }
            }
        }
    }

    /// Counts over this node and its live descendants.
    pub fn stats(&self) -> NodeStats {
        let mut stats = NodeStats {
            nodes: 1,
            primitives: self.stores.iter().map(PrimitiveStore::primitive_count).sum(),
            indexed_primitives: self
                .indexed_stores
                .iter()
                .map(IndexedStore::primitive_count)
                .sum(),
            vertices: self.pools.iter().map(VertexPool::len).sum(),
        };
        for child in self.sub_nodes.iter().flatten() {
            let c = child.stats();
            stats.nodes += c.nodes;
            stats.primitives += c.primitives;
            stats.indexed_primitives += c.indexed_primitives;
            stats.vertices += c.vertices;
        }
        stats
    }

    /// Write the node tree as indented text.
    pub fn dump(&mut self, out: &mut dyn Write) -> io::Result<()> {
        self.dump_with(out, "", &Transform::identity())
    }

    fn dump_with(&mut self, out: &mut dyn Write, indent: &str, transform: &Transform) -> io::Result<()> {
        let frozen = if self.frozen { " (frozen)" } else { "" };
        writeln!(out, "{indent}SceneNode \"{}\"{frozen}", self.name)?;
        let inner = format!("{indent}  ");
        let bbox = self.bounding_box();
        write_bbox(out, &inner, &bbox, transform)?;

        let Self {
            commands,
            sub_nodes,
            stores,
            indexed_stores,
            pools,
            ..
        } = self;

        for (i, pool) in pools.iter().enumerate() {
            let colors = if pool.colors().is_some() { ", colored" } else { "" };
            writeln!(out, "{inner}VertexPool {i}: {} vertices{colors}", pool.len())?;
        }

        let mut stack = TransformStack::new(*transform);
        for command in commands.iter() {
            match command {
                Command::ExecutePrimitiveStore(i) => {
                    stores[*i].dump(out, &inner, stack.current())?;
                }
                Command::ExecuteIndexedStore(i) => {
                    let store = &mut indexed_stores[*i];
                    let pool = &pools[store.pool()];
                    store.dump(pool, out, &inner, stack.current())?;
                }
                Command::ExecuteSubNode(i) => match &mut sub_nodes[*i] {
                    Some(child) => child.dump_with(out, &inner, stack.current())?,
                    None => writeln!(out, "{inner}(deleted sub-node {i})")?,
                },
                Command::State(directive) => {
                    writeln!(out, "{inner}{directive}")?;
                    stack.apply(directive);
                }
            }
        }
        Ok(())
    }
}
