//! Shared vertex pool for indexed primitives.
//!
//! Vertices are added during a `raw_vertex` section and frozen when it
//! ends. Colors, when given, must match the vertex count exactly; a
//! mismatch discards them. Normals are derived on demand and are either
//! complete or absent.

use glv_math::{Color, Point3, Vec3};

/// Vertex, color and normal arrays shared by indexed stores.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexPool {
    vertices: Vec<Point3>,
    colors: Vec<Color>,
    normals: Vec<Vec3>,
    vertices_frozen: bool,
    colors_frozen: bool,
}

impl VertexPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a vertex. Ignored once vertices are frozen.
    pub fn add_vertex(&mut self, p: Point3) {
        if self.vertices_frozen {
            log::warn!("vertex added to a frozen vertex pool, ignored");
            return;
        }
        self.vertices.push(p);
    }

    /// Start a new color section, dropping any earlier colors.
    pub fn begin_colors(&mut self) {
        self.colors.clear();
        self.colors_frozen = false;
    }

    /// Append a color.
    pub fn add_color(&mut self, c: Color) {
        self.colors.push(c);
    }

    /// No more vertices will be added.
    pub fn freeze_vertices(&mut self) {
        self.vertices_frozen = true;
    }

    /// No more colors will be added.
    ///
    /// Returns `false` and discards every color when the count differs
    /// from the vertex count.
    pub fn freeze_colors(&mut self) -> bool {
        self.colors_frozen = true;
        if self.colors.len() == self.vertices.len() {
            true
        } else {
            self.colors = Vec::new();
            false
        }
    }

    /// True once the vertex section has ended.
    pub fn vertices_frozen(&self) -> bool {
        self.vertices_frozen
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// True if the pool has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex positions.
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Per-vertex colors, only when complete and frozen.
    pub fn colors(&self) -> Option<&[Color]> {
        (self.colors_frozen && !self.colors.is_empty() && self.colors.len() == self.vertices.len())
            .then_some(self.colors.as_slice())
    }

    /// Per-vertex normals; empty until computed.
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// True if normals cover every vertex.
    pub fn has_normals(&self) -> bool {
        !self.vertices.is_empty() && self.normals.len() == self.vertices.len()
    }

    /// Position of vertex `i`.
    pub fn vertex(&self, i: u32) -> Point3 {
        self.vertices[i as usize]
    }

    /// Average the unnormalized facet normals around each vertex.
    ///
    /// Quad corners each use the cross product of their two incident
    /// edges. Vertices touched by no facet get `(1, 0, 0)`.
    pub fn compute_normals(&mut self, quads: &[[u32; 4]], triangles: &[[u32; 3]]) {
        let mut sums = vec![Vec3::zeros(); self.vertices.len()];

        for q in quads {
            let p = q.map(|i| self.vertex(i));
            for k in 0..4 {
                let prev = p[(k + 3) % 4];
                let next = p[(k + 1) % 4];
                let n = (next - p[k]).cross(&(prev - p[k]));
                sums[q[k] as usize] += n;
            }
        }

        for t in triangles {
            let p = t.map(|i| self.vertex(i));
            let n = (p[1] - p[0]).cross(&(p[2] - p[0]));
            for &i in t {
                sums[i as usize] += n;
            }
        }

        self.normals = sums
            .into_iter()
            .map(|n| n.try_normalize(0.0).unwrap_or_else(Vec3::x))
            .collect();
    }

    /// Indices `[i64; N]` as pool indices, if all are in range.
    pub fn checked_indices<const N: usize>(&self, indices: [i64; N]) -> Option<[u32; N]> {
        let len = self.vertices.len() as i64;
        if indices.iter().all(|&i| (0..len).contains(&i)) {
            Some(indices.map(|i| i as u32))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> VertexPool {
        let mut pool = VertexPool::new();
        for (x, y) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            pool.add_vertex(Point3::new(x, y, 0.0));
        }
        pool.freeze_vertices();
        pool
    }

    #[test]
    fn test_colors_must_match_vertex_count() {
        let mut pool = square();
        pool.begin_colors();
        for _ in 0..3 {
            pool.add_color(Color::new(1.0, 0.0, 0.0));
        }
        assert!(!pool.freeze_colors());
        assert!(pool.colors().is_none());
    }

    #[test]
    fn test_matching_colors_kept() {
        let mut pool = square();
        pool.begin_colors();
        for _ in 0..4 {
            pool.add_color(Color::new(0.0, 1.0, 0.0));
        }
        assert!(pool.freeze_colors());
        assert_eq!(pool.colors().map(|c| c.len()), Some(4));
    }

    #[test]
    fn test_frozen_vertices_ignore_additions() {
        let mut pool = square();
        pool.add_vertex(Point3::new(5.0, 5.0, 5.0));
        assert_eq!(pool.len(), 4);
    }

    #[test]
    fn test_quad_normals_point_up() {
        let mut pool = square();
        pool.compute_normals(&[[0, 1, 2, 3]], &[]);
        assert!(pool.has_normals());
        for n in pool.normals() {
            assert_relative_eq!(*n, Vec3::z());
        }
    }

    #[test]
    fn test_unused_vertex_gets_fallback_normal() {
        let mut pool = square();
        pool.compute_normals(&[], &[[0, 1, 2]]);
        assert_relative_eq!(pool.normals()[0], Vec3::z());
        assert_relative_eq!(pool.normals()[3], Vec3::x());
    }

    #[test]
    fn test_checked_indices() {
        let pool = square();
        assert_eq!(pool.checked_indices([0, 3]), Some([0, 3]));
        assert_eq!(pool.checked_indices([0, 4]), None);
        assert_eq!(pool.checked_indices([-1]), None);
    }
}
