//! Protocol command dispatch for [`SceneNode`].
//!
//! Inside a raw section only the section's `_item` command and `raw_end`
//! are accepted. Outside, commands are matched by name and exact arity.

use glv_math::Point3;

use crate::command::{Command, StateDirective};
use crate::error::{Result, SceneError};
use crate::fields::{colored_points, floats, floats_with_tip, ints, points, word_count};
use crate::indexed::IndexedStore;
use crate::node::{Dispatch, SceneNode};
use crate::pool::VertexPool;
use crate::raw::{ArrowTip, RawMode};
use crate::store::PrimitiveStore;

impl SceneNode {
    /// Apply one protocol command to this node.
    ///
    /// `params` is the rest of the line with surrounding blanks removed.
    /// On error the node is unchanged apart from primitives already
    /// accepted earlier.
    pub fn add_command(&mut self, command: &str, params: &str) -> Result<Dispatch> {
        if self.raw_mode != RawMode::NotInRaw {
            self.add_raw_item(command, params)?;
            return Ok(Dispatch::Continue);
        }

        match command {
            "object_begin" => return Ok(self.begin_sub_node(params)),
            "object_end" => {
                if !params.is_empty() {
                    return Err(SceneError::syntax(command, ""));
                }
                self.freeze();
                return Ok(Dispatch::Leave);
            }
            "execute_object" => return self.execute_sub_node(params),
            "delete_object" => return self.delete_sub_node(params),
            "raw_end" => return Err(SceneError::invalid("No raw section opened")),
            _ => {}
        }

        if let Some(mode) = RawMode::from_section(command) {
            self.open_raw(mode, params)?;
            return Ok(Dispatch::Continue);
        }

        if let Some(directive) = StateDirective::parse(command, params) {
            self.commands.push(Command::State(directive?));
            self.new_store_needed = true;
            self.new_indexed_needed = true;
            return Ok(Dispatch::Continue);
        }

        self.add_primitive(command, params)?;
        Ok(Dispatch::Continue)
    }

    fn begin_sub_node(&mut self, name: &str) -> Dispatch {
        let index = self.sub_nodes.len();
        self.sub_nodes.push(Some(SceneNode::new(name)));
        self.commands.push(Command::ExecuteSubNode(index));
        log::debug!("object_begin: {name:?} as sub-node {index}");
        Dispatch::Enter(index)
    }

    fn matching_sub_nodes(&self, name: &str) -> Vec<usize> {
        self.sub_nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.as_ref().is_some_and(|n| n.name == name))
            .map(|(i, _)| i)
            .collect()
    }

    fn execute_sub_node(&mut self, params: &str) -> Result<Dispatch> {
        if word_count(params) != 1 {
            return Err(SceneError::syntax("execute_object", "OBJECTNAME"));
        }
        let found = self.matching_sub_nodes(params);
        if found.is_empty() {
            return Err(SceneError::invalid(
                "execute_object: Can't find the named object in the current object sub-objects",
            ));
        }
        self.commands
            .extend(found.into_iter().map(Command::ExecuteSubNode));
        self.clear_render_handles();
        Ok(Dispatch::Invalidated)
    }

    fn delete_sub_node(&mut self, params: &str) -> Result<Dispatch> {
        if word_count(params) != 1 {
            return Err(SceneError::syntax("delete_object", "OBJECTNAME"));
        }
        let found = self.matching_sub_nodes(params);
        if found.is_empty() {
            return Err(SceneError::invalid(
                "delete_object: Can't find the named object in the current object sub-objects",
            ));
        }
        for i in found {
            self.sub_nodes[i] = None;
            log::debug!("delete_object: sub-node {i} ({params:?}) deleted");
        }
        self.clear_render_handles();
        Ok(Dispatch::Invalidated)
    }

    fn open_raw(&mut self, mode: RawMode, params: &str) -> Result<()> {
        let section = mode.section();
        let mut tip = None;
        if matches!(mode, RawMode::Arrow | RawMode::ArrowColored) {
            let (_, proportion, polygons) = floats_with_tip::<0>(params)
                .ok_or_else(|| SceneError::syntax(section, "tipprop tippoly"))?;
            tip = Some(
                ArrowTip::new(proportion, polygons).ok_or_else(|| SceneError::out_of_range(section))?,
            );
        } else if !params.is_empty() {
            return Err(SceneError::syntax(section, ""));
        }

        if mode.needs_pool() && self.pools.is_empty() {
            return Err(SceneError::invalid(format!(
                "Encountered a {section} before a raw_vertex"
            )));
        }

        match mode {
            RawMode::Vertex => {
                self.pools.push(VertexPool::new());
                self.new_indexed_needed = true;
            }
            RawMode::ColorIndexed => self.current_pool().begin_colors(),
            _ => {}
        }

        self.raw_mode = mode;
        self.arrow_tip = tip;
        Ok(())
    }

    fn close_raw(&mut self, params: &str) -> Result<()> {
        let mode = std::mem::take(&mut self.raw_mode);
        self.arrow_tip = None;

        let colors_ok = match mode {
            RawMode::Vertex => {
                self.current_pool().freeze_vertices();
                true
            }
            RawMode::ColorIndexed => self.current_pool().freeze_colors(),
            _ => true,
        };

        if !params.is_empty() {
            return Err(SceneError::syntax("raw_end", ""));
        }
        if !colors_ok {
            return Err(SceneError::invalid("Incompatible raw_color_v section size"));
        }
        Ok(())
    }

    fn add_raw_item(&mut self, command: &str, params: &str) -> Result<()> {
        if command == "raw_end" {
            return self.close_raw(params);
        }
        if RawMode::from_section(command).is_some() {
            return Err(SceneError::invalid("Nested raw sections are not supported"));
        }

        let mode = self.raw_mode;
        let bad_item = || SceneError::raw_section(mode.section(), mode.item_fields());
        if command != mode.item_command() {
            return Err(bad_item());
        }

        match mode {
            RawMode::Arrow | RawMode::ArrowColored => {
                let tip = self.arrow_tip.ok_or_else(bad_item)?;
                if mode == RawMode::Arrow {
                    let v = floats::<6>(params).ok_or_else(bad_item)?;
                    let [p1, p2] = points::<2>(&v);
                    self.current_store()
                        .add_arrow(p1, p2, tip.proportion, tip.polygons);
                } else {
                    let v = floats::<12>(params).ok_or_else(bad_item)?;
                    let (ends, colors) = colored_points::<2>(&v);
                    self.current_store()
                        .add_arrow_colored(ends, colors, tip.proportion, tip.polygons);
                }
            }
            RawMode::Point => {
                let v = floats::<3>(params).ok_or_else(bad_item)?;
                self.current_store().add_point(Point3::new(v[0], v[1], v[2]));
            }
            RawMode::PointColored => {
                let v = floats::<6>(params).ok_or_else(bad_item)?;
                let ([p], [c]) = colored_points::<1>(&v);
                self.current_store().add_point_colored(p, c);
            }
            RawMode::Line => {
                let v = floats::<6>(params).ok_or_else(bad_item)?;
                self.current_store().add_line(points(&v));
            }
            RawMode::LineColored => {
                let v = floats::<12>(params).ok_or_else(bad_item)?;
                let (p, c) = colored_points(&v);
                self.current_store().add_line_colored(p, c);
            }
            RawMode::Triangle => {
                let v = floats::<9>(params).ok_or_else(bad_item)?;
                self.current_store().add_triangle(points(&v));
            }
            RawMode::TriangleColored => {
                let v = floats::<18>(params).ok_or_else(bad_item)?;
                let (p, c) = colored_points(&v);
                self.current_store().add_triangle_colored(p, c);
            }
            RawMode::Quad => {
                let v = floats::<12>(params).ok_or_else(bad_item)?;
                self.current_store().add_quad(points(&v));
            }
            RawMode::QuadColored => {
                let v = floats::<24>(params).ok_or_else(bad_item)?;
                let (p, c) = colored_points(&v);
                self.current_store().add_quad_colored(p, c);
            }
            RawMode::PointIndexed => {
                let idx = ints::<1>(params).ok_or_else(bad_item)?;
                self.add_indexed(mode.section(), |s, pool| s.add_point(pool, idx))?;
            }
            RawMode::LineIndexed => {
                let idx = ints::<2>(params).ok_or_else(bad_item)?;
                self.add_indexed(mode.section(), |s, pool| s.add_line(pool, idx))?;
            }
            RawMode::TriangleIndexed => {
                let idx = ints::<3>(params).ok_or_else(bad_item)?;
                self.add_indexed(mode.section(), |s, pool| s.add_triangle(pool, idx))?;
            }
            RawMode::QuadIndexed => {
                let idx = ints::<4>(params).ok_or_else(bad_item)?;
                self.add_indexed(mode.section(), |s, pool| s.add_quad(pool, idx))?;
            }
            RawMode::Vertex => {
                let v = floats::<3>(params).ok_or_else(bad_item)?;
                self.current_pool().add_vertex(Point3::new(v[0], v[1], v[2]));
            }
            RawMode::ColorIndexed => {
                let v = floats::<3>(params).ok_or_else(bad_item)?;
                self.current_pool().add_color(glv_math::Color::new(v[0], v[1], v[2]));
            }
            RawMode::NotInRaw => {}
        }
        Ok(())
    }

    fn add_primitive(&mut self, command: &str, params: &str) -> Result<()> {
        let syntax = |expected: &str| SceneError::syntax(command, expected);
        match command {
            "point" => {
                let v = floats::<3>(params).ok_or_else(|| syntax("x y z"))?;
                self.current_store().add_point(Point3::new(v[0], v[1], v[2]));
            }
            "point_colored" => {
                let v = floats::<6>(params).ok_or_else(|| syntax("x y z r g b"))?;
                let ([p], [c]) = colored_points::<1>(&v);
                self.current_store().add_point_colored(p, c);
            }
            "line" => {
                let v = floats::<6>(params).ok_or_else(|| syntax("x1 y1 z1 x2 y2 z2"))?;
                self.current_store().add_line(points(&v));
            }
            "line_colored" => {
                let v = floats::<12>(params)
                    .ok_or_else(|| syntax("x1 y1 z1 r1 g1 b1 x2 y2 z2 r2 g2 b2"))?;
                let (p, c) = colored_points(&v);
                self.current_store().add_line_colored(p, c);
            }
            "triangle" => {
                let v = floats::<9>(params)
                    .ok_or_else(|| syntax("x1 y1 z1 x2 y2 z2 x3 y3 z3"))?;
                self.current_store().add_triangle(points(&v));
            }
            "triangle_colored" => {
                let v = floats::<18>(params).ok_or_else(|| {
                    syntax("x1 y1 z1 r1 g1 b1 x2 y2 z2 r2 g2 b2 x3 y3 z3 r3 g3 b3")
                })?;
                let (p, c) = colored_points(&v);
                self.current_store().add_triangle_colored(p, c);
            }
            "quad" => {
                let v = floats::<12>(params)
                    .ok_or_else(|| syntax("x1 y1 z1 x2 y2 z2 x3 y3 z3 x4 y4 z4"))?;
                self.current_store().add_quad(points(&v));
            }
            "quad_colored" => {
                let v = floats::<24>(params).ok_or_else(|| {
                    syntax(
                        "x1 y1 z1 r1 g1 b1 x2 y2 z2 r2 g2 b2 x3 y3 z3 r3 g3 b3 x4 y4 z4 r4 g4 b4",
                    )
                })?;
                let (p, c) = colored_points(&v);
                self.current_store().add_quad_colored(p, c);
            }
            "arrow" => {
                let (v, proportion, polygons) = floats_with_tip::<6>(params)
                    .ok_or_else(|| syntax("x1 y1 z1 x2 y2 z2 tipprop tippoly"))?;
                let tip = ArrowTip::new(proportion, polygons)
                    .ok_or_else(|| SceneError::out_of_range(command))?;
                let [p1, p2] = points::<2>(&v);
                self.current_store()
                    .add_arrow(p1, p2, tip.proportion, tip.polygons);
            }
            "arrow_colored" => {
                let (v, proportion, polygons) = floats_with_tip::<12>(params).ok_or_else(|| {
                    syntax("x1 y1 z1 r1 g1 b1 x2 y2 z2 r2 g2 b2 tipprop tippoly")
                })?;
                let tip = ArrowTip::new(proportion, polygons)
                    .ok_or_else(|| SceneError::out_of_range(command))?;
                let (ends, colors) = colored_points::<2>(&v);
                self.current_store()
                    .add_arrow_colored(ends, colors, tip.proportion, tip.polygons);
            }
            "point_v" => {
                self.require_pool(command)?;
                let idx = ints::<1>(params).ok_or_else(|| syntax("pt"))?;
                self.add_indexed(command, |s, pool| s.add_point(pool, idx))?;
            }
            "line_v" => {
                self.require_pool(command)?;
                let idx = ints::<2>(params).ok_or_else(|| syntax("pt0 pt1"))?;
                self.add_indexed(command, |s, pool| s.add_line(pool, idx))?;
            }
            "triangle_v" => {
                self.require_pool(command)?;
                let idx = ints::<3>(params).ok_or_else(|| syntax("pt0 pt1 pt2"))?;
                self.add_indexed(command, |s, pool| s.add_triangle(pool, idx))?;
            }
            "quad_v" => {
                self.require_pool(command)?;
                let idx = ints::<4>(params).ok_or_else(|| syntax("pt0 pt1 pt2 pt3"))?;
                self.add_indexed(command, |s, pool| s.add_quad(pool, idx))?;
            }
            "glutwirecube" | "glutsolidcube" | "glutsolidsphere" => {
                let [x, y, z, size] = floats::<4>(params).ok_or_else(|| syntax("x y z size"))?;
                let center = Point3::new(x, y, z);
                let store = self.current_store();
                match command {
                    "glutwirecube" => store.add_wire_cube(center, size),
                    "glutsolidcube" => store.add_solid_cube(center, size),
                    _ => store.add_solid_sphere(center, size),
                }
            }
            _ => return Err(SceneError::UnknownCommand(command.to_string())),
        }
        Ok(())
    }

    fn require_pool(&self, command: &str) -> Result<()> {
        if self.pools.is_empty() {
            Err(SceneError::invalid(format!(
                "Encountered a {command} before a raw_vertex"
            )))
        } else {
            Ok(())
        }
    }

    /// Add to the current indexed store with `add`; out-of-range indices
    /// report "Parameter out of range in `command`".
    fn add_indexed(
        &mut self,
        command: &str,
        add: impl FnOnce(&mut IndexedStore, &VertexPool) -> bool,
    ) -> Result<()> {
        self.require_pool(command)?;
        let pool_index = self.pools.len() - 1;
        let needs_new = self.new_indexed_needed
            || self
                .indexed_stores
                .last()
                .map_or(true, |s| s.pool() != pool_index);
        if needs_new {
            self.indexed_stores.push(IndexedStore::new(pool_index));
            self.commands
                .push(Command::ExecuteIndexedStore(self.indexed_stores.len() - 1));
            self.new_indexed_needed = false;
        }

        let last = self.indexed_stores.len() - 1;
        if add(&mut self.indexed_stores[last], &self.pools[pool_index]) {
            Ok(())
        } else {
            Err(SceneError::out_of_range(command))
        }
    }

    /// The store explicit primitives go to, opening a new one after any
    /// state directive.
    fn current_store(&mut self) -> &mut PrimitiveStore {
        if self.new_store_needed || self.stores.is_empty() {
            self.stores.push(PrimitiveStore::new());
            self.commands
                .push(Command::ExecutePrimitiveStore(self.stores.len() - 1));
            self.new_store_needed = false;
        }
        let last = self.stores.len() - 1;
        &mut self.stores[last]
    }

    /// The most recent vertex pool, created on demand.
    fn current_pool(&mut self) -> &mut VertexPool {
        if self.pools.is_empty() {
            self.pools.push(VertexPool::new());
        }
        let last = self.pools.len() - 1;
        &mut self.pools[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{Batch, IndexedBatch, RenderHandle, RenderMode, RenderParams, Renderer};
    use glv_math::BoundingBox;

    fn feed(node: &mut SceneNode, lines: &[&str]) -> Vec<Result<Dispatch>> {
        lines
            .iter()
            .map(|line| {
                let (cmd, params) = line.split_once(' ').unwrap_or((line, ""));
                node.add_command(cmd, params.trim())
            })
            .collect()
    }

    fn feed_ok(node: &mut SceneNode, lines: &[&str]) {
        for r in feed(node, lines) {
            r.unwrap();
        }
    }

    #[test]
    fn test_primitives_share_a_store_until_a_directive() {
        let mut node = SceneNode::new("root");
        feed_ok(
            &mut node,
            &[
                "point 0 0 0",
                "line 0 0 0 1 1 1",
                "glcolor 1 0 0",
                "triangle 0 0 0 1 0 0 0 1 0",
            ],
        );
        assert_eq!(node.primitive_stores().len(), 2);
        assert_eq!(
            node.commands(),
            &[
                Command::ExecutePrimitiveStore(0),
                Command::State(StateDirective::Color(glv_math::Color::new(1.0, 0.0, 0.0))),
                Command::ExecutePrimitiveStore(1),
            ]
        );
    }

    #[test]
    fn test_syntax_errors_name_the_command() {
        let mut node = SceneNode::new("root");
        let err = node.add_command("triangle", "0 0 0 1 0 0").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Syntax error in \"triangle\"\n  correct syntax: triangle x1 y1 z1 x2 y2 z2 x3 y3 z3"
        );
        let err = node.add_command("frobnicate", "").unwrap_err();
        assert_eq!(err, SceneError::UnknownCommand("frobnicate".into()));
        assert!(node.primitive_stores().is_empty());
    }

    #[test]
    fn test_arrow_range_checked() {
        let mut node = SceneNode::new("root");
        let err = node.add_command("arrow", "0 0 0 1 0 0 1.5 4").unwrap_err();
        assert_eq!(err.to_string(), "Parameter out of range in arrow");
        node.add_command("arrow", "0 0 0 1 0 0 0.2 4").unwrap();
        assert_eq!(node.stats().primitives, 1 + 8);
    }

    #[test]
    fn test_raw_section_lifecycle() {
        let mut node = SceneNode::new("root");
        feed_ok(
            &mut node,
            &[
                "raw_triangle",
                "raw_triangle_item 0 0 0 1 0 0 0 1 0",
                "raw_triangle_item 0 0 1 1 0 1 0 1 1",
                "raw_end",
            ],
        );
        assert_eq!(node.raw_mode(), RawMode::NotInRaw);
        assert_eq!(node.stats().primitives, 2);
    }

    #[test]
    fn test_raw_item_error_mentions_section() {
        let mut node = SceneNode::new("root");
        node.add_command("raw_point", "").unwrap();
        let err = node.add_command("raw_point_item", "1 2").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Syntax error in a \"raw_point\" section\n  correct syntax: x y z"
        );
        let err = node.add_command("point", "1 2 3").unwrap_err();
        assert_eq!(err, SceneError::raw_section("raw_point", "x y z"));
        assert_eq!(node.raw_mode(), RawMode::Point);
    }

    #[test]
    fn test_nested_raw_sections_rejected() {
        let mut node = SceneNode::new("root");
        node.add_command("raw_line", "").unwrap();
        let err = node.add_command("raw_point", "").unwrap_err();
        assert_eq!(err.to_string(), "Nested raw sections are not supported");
        assert_eq!(node.raw_mode(), RawMode::Line);
    }

    #[test]
    fn test_raw_end_outside_section() {
        let mut node = SceneNode::new("root");
        let err = node.add_command("raw_end", "").unwrap_err();
        assert_eq!(err.to_string(), "No raw section opened");
    }

    #[test]
    fn test_raw_arrow_parameters() {
        let mut node = SceneNode::new("root");
        let err = node.add_command("raw_arrow", "0.5").unwrap_err();
        assert_eq!(err, SceneError::syntax("raw_arrow", "tipprop tippoly"));
        let err = node.add_command("raw_arrow", "0 3").unwrap_err();
        assert_eq!(err.to_string(), "Parameter out of range in raw_arrow");
        assert_eq!(node.raw_mode(), RawMode::NotInRaw);

        feed_ok(
            &mut node,
            &["raw_arrow 0.25 3", "raw_arrow_item 0 0 0 0 0 4", "raw_end"],
        );
        assert_eq!(node.stats().primitives, 1 + 6);
    }

    #[test]
    fn test_indexed_before_vertices() {
        let mut node = SceneNode::new("root");
        let err = node.add_command("triangle_v", "0 1 2").unwrap_err();
        assert_eq!(err.to_string(), "Encountered a triangle_v before a raw_vertex");
        let err = node.add_command("raw_quad_v", "").unwrap_err();
        assert_eq!(err.to_string(), "Encountered a raw_quad_v before a raw_vertex");
        let err = node.add_command("raw_color_v", "").unwrap_err();
        assert_eq!(err.to_string(), "Encountered a raw_color_v before a raw_vertex");
    }

    fn with_vertices(node: &mut SceneNode, n: usize) {
        node.add_command("raw_vertex", "").unwrap();
        for i in 0..n {
            node.add_command("raw_vertex_item", &format!("{i} 0 0")).unwrap();
        }
        node.add_command("raw_end", "").unwrap();
    }

    #[test]
    fn test_raw_triangle_v_keeps_earlier_items() {
        let mut node = SceneNode::new("root");
        with_vertices(&mut node, 3);
        node.add_command("raw_triangle_v", "").unwrap();
        node.add_command("raw_triangle_v_item", "0 1 2").unwrap();
        let err = node.add_command("raw_triangle_v_item", "0 1 3").unwrap_err();
        assert_eq!(err.to_string(), "Parameter out of range in raw_triangle_v");
        node.add_command("raw_end", "").unwrap();

        assert_eq!(node.indexed_stores().len(), 1);
        assert_eq!(node.indexed_stores()[0].triangles(), &[[0, 1, 2]]);
    }

    #[test]
    fn test_negative_index_is_range_error() {
        let mut node = SceneNode::new("root");
        with_vertices(&mut node, 2);
        let err = node.add_command("line_v", "0 -1").unwrap_err();
        assert_eq!(err.to_string(), "Parameter out of range in line_v");
        let err = node.add_command("line_v", "0").unwrap_err();
        assert_eq!(err, SceneError::syntax("line_v", "pt0 pt1"));
    }

    #[test]
    fn test_color_count_mismatch_discards_colors() {
        let mut node = SceneNode::new("root");
        with_vertices(&mut node, 3);
        node.add_command("raw_color_v", "").unwrap();
        node.add_command("raw_color_v_item", "1 0 0").unwrap();
        node.add_command("raw_color_v_item", "0 1 0").unwrap();
        let err = node.add_command("raw_end", "").unwrap_err();
        assert_eq!(err.to_string(), "Incompatible raw_color_v section size");
        assert_eq!(node.raw_mode(), RawMode::NotInRaw);
        assert!(node.pools()[0].colors().is_none());
        assert_eq!(node.pools()[0].len(), 3);
    }

    #[test]
    fn test_each_vertex_section_starts_a_pool() {
        let mut node = SceneNode::new("root");
        with_vertices(&mut node, 3);
        node.add_command("triangle_v", "0 1 2").unwrap();
        with_vertices(&mut node, 1);
        let err = node.add_command("point_v", "2").unwrap_err();
        assert_eq!(err.to_string(), "Parameter out of range in point_v");
        node.add_command("point_v", "0").unwrap();
        assert_eq!(node.pools().len(), 2);
        let pools: Vec<usize> = node.indexed_stores().iter().map(|s| s.pool()).collect();
        assert_eq!(pools, vec![0, 1]);
    }

    #[test]
    fn test_sub_node_lifecycle() {
        let mut node = SceneNode::new("root");
        assert_eq!(node.add_command("object_begin", "a"), Ok(Dispatch::Enter(0)));
        {
            let child = node.sub_node_mut(0).unwrap();
            child.add_command("point", "1 2 3").unwrap();
            assert_eq!(child.add_command("object_end", ""), Ok(Dispatch::Leave));
            assert!(child.is_frozen());
        }
        assert_eq!(node.add_command("execute_object", "a"), Ok(Dispatch::Invalidated));
        assert_eq!(
            node.commands(),
            &[Command::ExecuteSubNode(0), Command::ExecuteSubNode(0)]
        );

        let err = node.add_command("execute_object", "b").unwrap_err();
        assert!(err.to_string().starts_with("execute_object: Can't find"));
        let err = node.add_command("execute_object", "a b").unwrap_err();
        assert_eq!(err, SceneError::syntax("execute_object", "OBJECTNAME"));
    }

    #[test]
    fn test_delete_tombstones_and_updates_box() {
        let mut node = SceneNode::new("root");
        feed_ok(&mut node, &["object_begin far", "point 0 0 0"]);
        node.sub_node_mut(0).unwrap().add_command("point", "10 10 10").unwrap();
        node.sub_node_mut(0).unwrap().add_command("object_end", "").unwrap();
        assert_eq!(node.bounding_box().max(), Some(Point3::new(10.0, 10.0, 10.0)));

        assert_eq!(node.add_command("delete_object", "far"), Ok(Dispatch::Invalidated));
        assert!(node.sub_node(0).is_none());
        assert_eq!(node.sub_nodes().len(), 1);
        assert_eq!(node.bounding_box().max(), Some(Point3::origin()));

        let err = node.add_command("delete_object", "far").unwrap_err();
        assert!(err.to_string().starts_with("delete_object: Can't find"));
    }

    #[test]
    fn test_bounding_box_follows_transforms() {
        let mut node = SceneNode::new("root");
        feed_ok(
            &mut node,
            &[
                "point 1 1 1",
                "gltranslate 10 0 0",
                "glscale 2 2 2",
                "point 1 1 1",
                "text 0 0 -1 fixed13 \"label\"",
            ],
        );
        let bbox = node.bounding_box();
        assert_eq!(bbox.min(), Some(Point3::new(1.0, 0.0, -2.0)));
        assert_eq!(bbox.max(), Some(Point3::new(12.0, 2.0, 2.0)));
    }

    #[test]
    fn test_push_pop_scopes_transforms() {
        let mut node = SceneNode::new("root");
        feed_ok(
            &mut node,
            &[
                "glpushmatrix",
                "gltranslate 5 0 0",
                "glpopmatrix",
                "point 1 0 0",
            ],
        );
        assert_eq!(node.bounding_box().max(), Some(Point3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_frozen_box_is_idempotent() {
        let mut node = SceneNode::new("root");
        feed_ok(&mut node, &["quad 0 0 0 1 0 0 1 1 0 0 1 0", "glscale 3 3 3"]);
        node.freeze();
        let first = node.bounding_box();
        let second = node.bounding_box();
        assert_eq!(first, second);
        assert_eq!(first.max(), Some(Point3::new(1.0, 1.0, 0.0)));
    }

    #[test]
    fn test_object_end_with_params_rejected() {
        let mut node = SceneNode::new("root");
        let err = node.add_command("object_end", "x").unwrap_err();
        assert_eq!(err, SceneError::syntax("object_end", ""));
        assert!(!node.is_frozen());
    }

    #[derive(Default)]
    struct Recording {
        next: u64,
        recorded: Vec<RenderHandle>,
        replayed: Vec<RenderHandle>,
        draws: usize,
        pushes: usize,
        directives: Vec<String>,
    }

    impl Renderer for Recording {
        fn draw(&mut self, _batch: Batch<'_>, _params: &RenderParams) {
            self.draws += 1;
        }
        fn draw_indexed(&mut self, _batch: IndexedBatch<'_>, _params: &RenderParams) {
            self.draws += 1;
        }
        fn draw_bounding_box(&mut self, _bbox: &BoundingBox, _params: &RenderParams) {
            self.draws += 1;
        }
        fn apply(&mut self, directive: &StateDirective, _params: &RenderParams) {
            self.directives.push(directive.to_string());
        }
        fn push_state(&mut self) {
            self.pushes += 1;
        }
        fn begin_recording(&mut self, _mode: RenderMode) -> Option<RenderHandle> {
            self.next += 1;
            Some(RenderHandle(self.next))
        }
        fn end_recording(&mut self, handle: RenderHandle) {
            self.recorded.push(handle);
        }
        fn replay(&mut self, handle: RenderHandle) -> bool {
            self.replayed.push(handle);
            true
        }
    }

    #[test]
    fn test_frozen_nodes_are_recorded_once() {
        let mut root = SceneNode::new("root");
        root.add_command("object_begin", "child").unwrap();
        {
            let child = root.sub_node_mut(0).unwrap();
            child.add_command("point", "0 0 0").unwrap();
            child.add_command("object_end", "").unwrap();
        }
        let params = RenderParams::default();
        let mut renderer = Recording::default();

        // Unfrozen root executes; frozen child is recorded then replayed.
        root.render(&mut renderer, &params);
        assert_eq!(renderer.recorded, vec![RenderHandle(1)]);
        assert_eq!(renderer.replayed, vec![RenderHandle(1)]);
        assert_eq!(renderer.pushes, 1);
        assert_eq!(renderer.draws, 1);

        root.render(&mut renderer, &params);
        assert_eq!(renderer.recorded.len(), 1);
        assert_eq!(renderer.replayed.len(), 2);

        let child = root.sub_node(0).unwrap();
        assert_eq!(child.render_handle(RenderMode::Full), Some(RenderHandle(1)));
        assert_eq!(child.render_handle(RenderMode::BoundingBox), None);
    }

    #[test]
    fn test_deletion_only_drops_render_handles() {
        let mut root = SceneNode::new("root");
        root.add_command("object_begin", "a").unwrap();
        {
            let child = root.sub_node_mut(0).unwrap();
            child.add_command("point", "5 5 5").unwrap();
            child.add_command("object_end", "").unwrap();
        }
        root.add_command("point", "0 0 0").unwrap();
        root.freeze();
        let cached = root.bounding_box();

        let mut renderer = Recording::default();
        root.render(&mut renderer, &RenderParams::default());
        assert!(root.render_handle(RenderMode::Full).is_some());

        assert_eq!(root.add_command("delete_object", "a"), Ok(Dispatch::Invalidated));
        assert_eq!(root.render_handle(RenderMode::Full), None);
        assert!(root.is_frozen());
        assert_eq!(root.bounding_box(), cached);
    }

    #[test]
    fn test_unfrozen_node_replays_directives() {
        let mut node = SceneNode::new("root");
        feed_ok(&mut node, &["glpointsize 4", "point 0 0 0"]);
        let mut renderer = Recording::default();
        node.render(&mut renderer, &RenderParams::default());
        assert_eq!(renderer.directives, vec!["glpointsize 4".to_string()]);
        assert_eq!(renderer.draws, 1);
        assert!(renderer.recorded.is_empty());
    }

    #[test]
    fn test_dump_lists_tree() {
        let mut node = SceneNode::new("root");
        feed_ok(&mut node, &["object_begin inner", "glcolor 0 1 0"]);
        node.sub_node_mut(0).unwrap().add_command("point", "1 1 1").unwrap();
        let mut out = Vec::new();
        node.dump(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("SceneNode \"root\"\n"));
        assert!(text.contains("  SceneNode \"inner\"\n"));
        assert!(text.contains("  glcolor 0 1 0\n"));
    }
}
