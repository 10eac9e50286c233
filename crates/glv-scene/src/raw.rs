//! Raw section states.
//!
//! A raw section is opened by `raw_<kind>`, followed by bare item lines
//! and closed by `raw_end`. The stream parser rewrites each item line to
//! `raw_<kind>_item <fields>` before handing it to the node.

/// Which raw section, if any, a node is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(missing_docs)]
pub enum RawMode {
    #[default]
    NotInRaw,
    Arrow,
    ArrowColored,
    Point,
    PointColored,
    PointIndexed,
    Line,
    LineColored,
    LineIndexed,
    Triangle,
    TriangleColored,
    TriangleIndexed,
    Quad,
    QuadColored,
    QuadIndexed,
    Vertex,
    ColorIndexed,
}

impl RawMode {
    /// Every section kind, excluding [`RawMode::NotInRaw`].
    pub const SECTIONS: [RawMode; 16] = [
        Self::Arrow,
        Self::ArrowColored,
        Self::Point,
        Self::PointColored,
        Self::PointIndexed,
        Self::Line,
        Self::LineColored,
        Self::LineIndexed,
        Self::Triangle,
        Self::TriangleColored,
        Self::TriangleIndexed,
        Self::Quad,
        Self::QuadColored,
        Self::QuadIndexed,
        Self::Vertex,
        Self::ColorIndexed,
    ];

    /// The section for an opening command word, e.g. `raw_triangle_v`.
    pub fn from_section(command: &str) -> Option<Self> {
        Self::SECTIONS.into_iter().find(|m| m.section() == command)
    }

    /// Opening command word; empty for [`RawMode::NotInRaw`].
    pub fn section(self) -> &'static str {
        match self {
            Self::NotInRaw => "",
            Self::Arrow => "raw_arrow",
            Self::ArrowColored => "raw_arrow_colored",
            Self::Point => "raw_point",
            Self::PointColored => "raw_point_colored",
            Self::PointIndexed => "raw_point_v",
            Self::Line => "raw_line",
            Self::LineColored => "raw_line_colored",
            Self::LineIndexed => "raw_line_v",
            Self::Triangle => "raw_triangle",
            Self::TriangleColored => "raw_triangle_colored",
            Self::TriangleIndexed => "raw_triangle_v",
            Self::Quad => "raw_quad",
            Self::QuadColored => "raw_quad_colored",
            Self::QuadIndexed => "raw_quad_v",
            Self::Vertex => "raw_vertex",
            Self::ColorIndexed => "raw_color_v",
        }
    }

    /// Fields of one item line.
    pub fn item_fields(self) -> &'static str {
        match self {
            Self::NotInRaw => "",
            Self::Arrow | Self::Line => "x1 y1 z1 x2 y2 z2",
            Self::ArrowColored | Self::LineColored => "x1 y1 z1 r1 g1 b1 x2 y2 z2 r2 g2 b2",
            Self::Point | Self::Vertex => "x y z",
            Self::PointColored => "x y z r g b",
            Self::PointIndexed => "pt",
            Self::LineIndexed => "pt0 pt1",
            Self::Triangle => "x1 y1 z1 x2 y2 z2 x3 y3 z3",
            Self::TriangleColored => "x1 y1 z1 r1 g1 b1 x2 y2 z2 r2 g2 b2 x3 y3 z3 r3 g3 b3",
            Self::TriangleIndexed => "pt0 pt1 pt2",
            Self::Quad => "x1 y1 z1 x2 y2 z2 x3 y3 z3 x4 y4 z4",
            Self::QuadColored => {
                "x1 y1 z1 r1 g1 b1 x2 y2 z2 r2 g2 b2 x3 y3 z3 r3 g3 b3 x4 y4 z4 r4 g4 b4"
            }
            Self::QuadIndexed => "pt0 pt1 pt2 pt3",
            Self::ColorIndexed => "r g b",
        }
    }

    /// True for sections whose items index into a vertex pool.
    pub fn needs_pool(self) -> bool {
        matches!(
            self,
            Self::PointIndexed
                | Self::LineIndexed
                | Self::TriangleIndexed
                | Self::QuadIndexed
                | Self::ColorIndexed
        )
    }

    /// The command word an item line is rewritten to.
    pub fn item_command(self) -> String {
        format!("{}_item", self.section())
    }
}

/// Tip parameters of an open `raw_arrow`/`raw_arrow_colored` section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowTip {
    /// Fraction of the arrow length taken by the tip, in `(0, 1]`.
    pub proportion: f64,
    /// Number of side triangles, at least 1.
    pub polygons: usize,
}

impl ArrowTip {
    /// Validated tip parameters, `None` when out of range.
    pub fn new(proportion: f64, polygons: i64) -> Option<Self> {
        if proportion > 0.0 && proportion <= 1.0 && polygons >= 1 {
            Some(Self {
                proportion,
                polygons: polygons as usize,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seventeen_states() {
        assert_eq!(RawMode::SECTIONS.len() + 1, 17);
        assert!(!RawMode::SECTIONS.contains(&RawMode::NotInRaw));
    }

    #[test]
    fn test_section_lookup() {
        for mode in RawMode::SECTIONS {
            assert_eq!(RawMode::from_section(mode.section()), Some(mode));
        }
        assert_eq!(RawMode::from_section("raw_end"), None);
        assert_eq!(RawMode::from_section("raw_tetra_v"), None);
    }

    #[test]
    fn test_arrow_tip_range() {
        assert!(ArrowTip::new(1.0, 1).is_some());
        assert!(ArrowTip::new(0.0, 3).is_none());
        assert!(ArrowTip::new(1.5, 3).is_none());
        assert!(ArrowTip::new(0.5, 0).is_none());
    }

    #[test]
    fn test_item_command() {
        assert_eq!(RawMode::TriangleIndexed.item_command(), "raw_triangle_v_item");
    }

    #[test]
    fn test_item_field_counts() {
        let count = |m: RawMode| m.item_fields().split_whitespace().count();
        assert_eq!(count(RawMode::ArrowColored), 12);
        assert_eq!(count(RawMode::TriangleColored), 18);
        assert_eq!(count(RawMode::QuadColored), 24);
        assert_eq!(count(RawMode::QuadIndexed), 4);
    }
}
