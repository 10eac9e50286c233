//! Axis-aligned bounding box with union and transform algebra.
//!
//! An uninitialized box is the identity of the union monoid: adding it to
//! anything leaves the other operand unchanged.

use std::ops::{Add, AddAssign};

use crate::{Point3, Transform};

/// Axis-aligned bounding box in 3D.
///
/// When initialized, `min <= max` holds componentwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    initialized: bool,
    min: Point3,
    max: Point3,
}

impl BoundingBox {
    /// Create an empty (uninitialized) box.
    pub fn empty() -> Self {
        Self {
            initialized: false,
            min: Point3::origin(),
            max: Point3::origin(),
        }
    }

    /// Create a degenerate box around a single point.
    pub fn from_point(p: &Point3) -> Self {
        Self {
            initialized: true,
            min: *p,
            max: *p,
        }
    }

    /// Create the box spanned by two opposite corners, in any order.
    pub fn from_corners(a: &Point3, b: &Point3) -> Self {
        let mut bbox = Self::from_point(a);
        bbox.include_point(b);
        bbox
    }

    /// Box enclosing every point of an iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.include_point(p);
        }
        bbox
    }

    /// True if no point has been included yet.
    pub fn is_empty(&self) -> bool {
        !self.initialized
    }

    /// Minimum corner, if initialized.
    pub fn min(&self) -> Option<Point3> {
        self.initialized.then_some(self.min)
    }

    /// Maximum corner, if initialized.
    pub fn max(&self) -> Option<Point3> {
        self.initialized.then_some(self.max)
    }

    /// Expand this box to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        if !self.initialized {
            *self = Self::from_point(p);
            return;
        }
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand this box to include another box.
    pub fn include_box(&mut self, other: &BoundingBox) {
        if other.initialized {
            self.include_point(&other.min);
            self.include_point(&other.max);
        }
    }

    /// Center of the box; the origin when empty.
    pub fn center(&self) -> Point3 {
        if self.initialized {
            nalgebra::center(&self.min, &self.max)
        } else {
            Point3::origin()
        }
    }

    /// Radius of the sphere through all eight corners; zero when empty.
    pub fn circumscribed_radius(&self) -> f64 {
        if self.initialized {
            0.5 * (self.max - self.min).norm()
        } else {
            0.0
        }
    }

    /// The eight corners, or `None` when empty.
    pub fn corners(&self) -> Option<[Point3; 8]> {
        if !self.initialized {
            return None;
        }
        let (lo, hi) = (self.min, self.max);
        Some([
            Point3::new(lo.x, lo.y, lo.z),
            Point3::new(hi.x, lo.y, lo.z),
            Point3::new(hi.x, hi.y, lo.z),
            Point3::new(lo.x, hi.y, lo.z),
            Point3::new(lo.x, lo.y, hi.z),
            Point3::new(hi.x, lo.y, hi.z),
            Point3::new(hi.x, hi.y, hi.z),
            Point3::new(lo.x, hi.y, hi.z),
        ])
    }

    /// Box enclosing the eight transformed corners.
    ///
    /// Conservative rather than tight for rotations.
    pub fn transformed(&self, transform: &Transform) -> Self {
        match self.corners() {
            Some(corners) => {
                let mut out = Self::empty();
                for c in &corners {
                    out.include_point(&transform.apply_point(c));
                }
                out
            }
            None => Self::empty(),
        }
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl Add for BoundingBox {
    type Output = BoundingBox;

    fn add(mut self, rhs: BoundingBox) -> BoundingBox {
        self.include_box(&rhs);
        self
    }
}

impl Add<Point3> for BoundingBox {
    type Output = BoundingBox;

    fn add(mut self, rhs: Point3) -> BoundingBox {
        self.include_point(&rhs);
        self
    }
}

impl AddAssign for BoundingBox {
    fn add_assign(&mut self, rhs: BoundingBox) {
        self.include_box(&rhs);
    }
}

impl AddAssign<Point3> for BoundingBox {
    fn add_assign(&mut self, rhs: Point3) {
        self.include_point(&rhs);
    }
}
