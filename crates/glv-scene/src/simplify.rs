//! Level-of-detail point proxies.
//!
//! A store's proxy is a sparse point cloud: for each fixed direction on
//! the unit sphere, the barycenter of the primitive closest to that
//! direction's point on the store's circumscribed sphere. Directions no
//! primitive was closest to contribute nothing.

use glv_math::{BoundingBox, Point3, Vec3};

use crate::primitive::Primitive;

/// Near-uniform unit-sphere sampling, sorted lexicographically.
pub const SAMPLE_DIRECTIONS: [[f64; 3]; 98] = [
    [-1.0, 0.0, 0.0],
    [-0.894427191, -0.4472135955, 0.0],
    [-0.894427191, 0.0, -0.4472135955],
    [-0.894427191, 0.0, 0.4472135955],
    [-0.894427191, 0.4472135955, 0.0],
    [-0.816496580928, -0.408248290464, -0.408248290464],
    [-0.816496580928, -0.408248290464, 0.408248290464],
    [-0.816496580928, 0.408248290464, -0.408248290464],
    [-0.816496580928, 0.408248290464, 0.408248290464],
    [-0.707106781187, -0.707106781187, 0.0],
    [-0.707106781187, 0.0, -0.707106781187],
    [-0.707106781187, 0.0, 0.707106781187],
    [-0.707106781187, 0.707106781187, 0.0],
    [-0.666666666667, -0.333333333333, -0.666666666667],
    [-0.666666666667, -0.333333333333, 0.666666666667],
    [-0.666666666667, -0.666666666667, -0.333333333333],
    [-0.666666666667, -0.666666666667, 0.333333333333],
    [-0.666666666667, 0.333333333333, -0.666666666667],
    [-0.666666666667, 0.333333333333, 0.666666666667],
    [-0.666666666667, 0.666666666667, -0.333333333333],
    [-0.666666666667, 0.666666666667, 0.333333333333],
    [-0.57735026919, -0.57735026919, -0.57735026919],
    [-0.57735026919, -0.57735026919, 0.57735026919],
    [-0.57735026919, 0.57735026919, -0.57735026919],
    [-0.57735026919, 0.57735026919, 0.57735026919],
    [-0.4472135955, -0.894427191, 0.0],
    [-0.4472135955, 0.0, -0.894427191],
    [-0.4472135955, 0.0, 0.894427191],
    [-0.4472135955, 0.894427191, 0.0],
    [-0.408248290464, -0.408248290464, -0.816496580928],
    [-0.408248290464, -0.408248290464, 0.816496580928],
    [-0.408248290464, -0.816496580928, -0.408248290464],
    [-0.408248290464, -0.816496580928, 0.408248290464],
    [-0.408248290464, 0.408248290464, -0.816496580928],
    [-0.408248290464, 0.408248290464, 0.816496580928],
    [-0.408248290464, 0.816496580928, -0.408248290464],
    [-0.408248290464, 0.816496580928, 0.408248290464],
    [-0.333333333333, -0.666666666667, -0.666666666667],
    [-0.333333333333, -0.666666666667, 0.666666666667],
    [-0.333333333333, 0.666666666667, -0.666666666667],
    [-0.333333333333, 0.666666666667, 0.666666666667],
    [0.0, -0.4472135955, -0.894427191],
    [0.0, -0.4472135955, 0.894427191],
    [0.0, -0.707106781187, -0.707106781187],
    [0.0, -0.707106781187, 0.707106781187],
    [0.0, -0.894427191, -0.4472135955],
    [0.0, -0.894427191, 0.4472135955],
    [0.0, -1.0, 0.0],
    [0.0, 0.0, -1.0],
    [0.0, 0.0, 1.0],
    [0.0, 0.4472135955, -0.894427191],
    [0.0, 0.4472135955, 0.894427191],
    [0.0, 0.707106781187, -0.707106781187],
    [0.0, 0.707106781187, 0.707106781187],
    [0.0, 0.894427191, -0.4472135955],
    [0.0, 0.894427191, 0.4472135955],
    [0.0, 1.0, 0.0],
    [0.333333333333, -0.666666666667, -0.666666666667],
    [0.333333333333, -0.666666666667, 0.666666666667],
    [0.333333333333, 0.666666666667, -0.666666666667],
    [0.333333333333, 0.666666666667, 0.666666666667],
    [0.408248290464, -0.408248290464, -0.816496580928],
    [0.408248290464, -0.408248290464, 0.816496580928],
    [0.408248290464, -0.816496580928, -0.408248290464],
    [0.408248290464, -0.816496580928, 0.408248290464],
    [0.408248290464, 0.408248290464, -0.816496580928],
    [0.408248290464, 0.408248290464, 0.816496580928],
    [0.408248290464, 0.816496580928, -0.408248290464],
    [0.408248290464, 0.816496580928, 0.408248290464],
    [0.4472135955, -0.894427191, 0.0],
    [0.4472135955, 0.0, -0.894427191],
    [0.4472135955, 0.0, 0.894427191],
    [0.4472135955, 0.894427191, 0.0],
    [0.57735026919, -0.57735026919, -0.57735026919],
    [0.57735026919, -0.57735026919, 0.57735026919],
    [0.57735026919, 0.57735026919, -0.57735026919],
    [0.57735026919, 0.57735026919, 0.57735026919],
    [0.666666666667, -0.333333333333, -0.666666666667],
    [0.666666666667, -0.333333333333, 0.666666666667],
    [0.666666666667, -0.666666666667, -0.333333333333],
    [0.666666666667, -0.666666666667, 0.333333333333],
    [0.666666666667, 0.333333333333, -0.666666666667],
    [0.666666666667, 0.333333333333, 0.666666666667],
    [0.666666666667, 0.666666666667, -0.333333333333],
    [0.666666666667, 0.666666666667, 0.333333333333],
    [0.707106781187, -0.707106781187, 0.0],
    [0.707106781187, 0.0, -0.707106781187],
    [0.707106781187, 0.0, 0.707106781187],
    [0.707106781187, 0.707106781187, 0.0],
    [0.816496580928, -0.408248290464, -0.408248290464],
    [0.816496580928, -0.408248290464, 0.408248290464],
    [0.816496580928, 0.408248290464, -0.408248290464],
    [0.816496580928, 0.408248290464, 0.408248290464],
    [0.894427191, -0.4472135955, 0.0],
    [0.894427191, 0.0, -0.4472135955],
    [0.894427191, 0.0, 0.4472135955],
    [0.894427191, 0.4472135955, 0.0],
    [1.0, 0.0, 0.0],
];

struct Sample {
    target: Point3,
    best: Option<(f64, Point3)>,
}

/// Nearest-barycenter search over the sample directions of one bounding box.
pub struct SphereSampler {
    samples: Vec<Sample>,
}

impl SphereSampler {
    /// Project every sample direction onto the circumscribed sphere of `bbox`.
    pub fn new(bbox: &BoundingBox) -> Self {
        let center = bbox.center();
        let radius = bbox.circumscribed_radius();
        let samples = SAMPLE_DIRECTIONS
            .iter()
            .map(|d| Sample {
                target: center + Vec3::new(d[0], d[1], d[2]) * radius,
                best: None,
            })
            .collect();
        Self { samples }
    }

    /// Offer a candidate barycenter to every sample.
    ///
    /// Ties keep the earlier candidate.
    pub fn offer(&mut self, barycenter: Point3) {
        for sample in &mut self.samples {
            let distance = (barycenter - sample.target).norm();
            let closer = match sample.best {
                Some((best, _)) => distance < best,
                None => true,
            };
            if closer {
                sample.best = Some((distance, barycenter));
            }
        }
    }

    /// Offer the barycenter of every primitive in `primitives`, in order.
    pub fn scan<P: Primitive>(&mut self, primitives: &[P]) {
        for p in primitives {
            self.offer(p.barycenter());
        }
    }

    /// The chosen barycenters, one per sample that found a primitive.
    pub fn into_points(self) -> Vec<Point3> {
        self.samples
            .into_iter()
            .filter_map(|s| s.best.map(|(_, p)| p))
            .collect()
    }
}
