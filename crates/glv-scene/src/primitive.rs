//! Geometric primitives stored by [`PrimitiveStore`](crate::PrimitiveStore).
//!
//! Every primitive is a fixed number of corners with optional per-corner
//! colors and normals. The arity is carried in the type so buffers stay
//! flat and allocation-free per element.

use glv_math::{Color, Point3, Vec3};

/// Anything made of a fixed set of corner positions.
pub trait Primitive {
    /// Corner positions.
    fn points(&self) -> &[Point3];

    /// Arithmetic mean of the corners.
    fn barycenter(&self) -> Point3 {
        let points = self.points();
        let sum = points
            .iter()
            .fold(Vec3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / points.len() as f64)
    }
}

/// Primitive without per-corner attributes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plain<const N: usize> {
    /// Corner positions.
    pub points: [Point3; N],
}

/// Primitive with one color per corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Colored<const N: usize> {
    /// Corner positions.
    pub points: [Point3; N],
    /// Corner colors.
    pub colors: [Color; N],
}

/// Primitive with one normal per corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shaded<const N: usize> {
    /// Corner positions.
    pub points: [Point3; N],
    /// Corner normals.
    pub normals: [Vec3; N],
}

/// Primitive with one normal and one color per corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadedColored<const N: usize> {
    /// Corner positions.
    pub points: [Point3; N],
    /// Corner normals.
    pub normals: [Vec3; N],
    /// Corner colors.
    pub colors: [Color; N],
}

impl<const N: usize> Primitive for Plain<N> {
    fn points(&self) -> &[Point3] {
        &self.points
    }
}

impl<const N: usize> Primitive for Colored<N> {
    fn points(&self) -> &[Point3] {
        &self.points
    }
}

impl<const N: usize> Primitive for Shaded<N> {
    fn points(&self) -> &[Point3] {
        &self.points
    }
}

impl<const N: usize> Primitive for ShadedColored<N> {
    fn points(&self) -> &[Point3] {
        &self.points
    }
}

/// A single point.
pub type Point = Plain<1>;
/// A point with a color.
pub type PointColored = Colored<1>;
/// A line segment.
pub type Line = Plain<2>;
/// A line segment with a color at each end.
pub type LineColored = Colored<2>;
/// A triangle.
pub type Triangle = Plain<3>;
/// A triangle with per-corner colors.
pub type TriangleColored = Colored<3>;
/// A triangle with per-corner normals.
pub type TriangleNormals = Shaded<3>;
/// A triangle with per-corner normals and colors.
pub type TriangleNormalsColored = ShadedColored<3>;
/// A quadrilateral.
pub type Quad = Plain<4>;
/// A quadrilateral with per-corner colors.
pub type QuadColored = Colored<4>;
/// A quadrilateral with per-corner normals.
pub type QuadNormals = Shaded<4>;
/// A quadrilateral with per-corner normals and colors.
pub type QuadNormalsColored = ShadedColored<4>;

/// Unit normal of the facet spanned by the first three corners.
///
/// Degenerate facets get `(1, 0, 0)` instead of a zero vector.
pub fn face_normal(points: &[Point3]) -> Vec3 {
    if points.len() < 3 {
        return Vec3::x();
    }
    let n = (points[1] - points[0]).cross(&(points[2] - points[0]));
    n.try_normalize(0.0).unwrap_or_else(Vec3::x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_barycenter_is_mean_of_corners() {
        let quad = Quad {
            points: [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
                Point3::new(0.0, 2.0, 4.0),
            ],
        };
        assert_relative_eq!(quad.barycenter(), Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_point_barycenter_is_itself() {
        let p = PointColored {
            points: [Point3::new(3.0, -1.0, 2.0)],
            colors: [Color::new(1.0, 0.0, 0.0)],
        };
        assert_relative_eq!(p.barycenter(), Point3::new(3.0, -1.0, 2.0));
    }

    #[test]
    fn test_face_normal() {
        let pts = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        assert_relative_eq!(face_normal(&pts), Vec3::z());
    }

    #[test]
    fn test_degenerate_face_normal_falls_back() {
        let p = Point3::new(1.0, 1.0, 1.0);
        assert_relative_eq!(face_normal(&[p, p, p]), Vec3::x());
    }
}
