//! Generated geometry: arrow tips, cubes and spheres.

use std::f64::consts::PI;

use glv_math::{BoundingBox, Dir3, Point3, Transform, Vec3};

use crate::primitive::{Line, Quad, QuadNormals, TriangleNormals};

/// Tangent of the tip cone half-angle.
const TIP_TAN: f64 = 0.2;

/// Cube edges as corner index pairs into [`BoundingBox::corners`].
#[rustfmt::skip]
const CUBE_EDGES: [[usize; 2]; 12] = [
    [0, 1], [1, 2], [2, 3], [3, 0],
    [4, 5], [5, 6], [6, 7], [7, 4],
    [0, 4], [1, 5], [2, 6], [3, 7],
];

/// Outward-facing cube faces as corner indices into [`BoundingBox::corners`].
const CUBE_FACES: [[usize; 4]; 6] = [
    [0, 3, 2, 1],
    [4, 5, 6, 7],
    [0, 1, 5, 4],
    [2, 3, 7, 6],
    [0, 4, 7, 3],
    [1, 2, 6, 5],
];

/// Cone tip at `p2` of the arrow `p1 -> p2`.
///
/// The tip covers `tip_proportion` of the arrow length and is made of
/// `tip_polygons` side triangles plus as many base-cap triangles. A zero
/// length arrow has no tip.
pub fn arrow_tip(
    p1: &Point3,
    p2: &Point3,
    tip_proportion: f64,
    tip_polygons: usize,
) -> Vec<TriangleNormals> {
    let axis = p2 - p1;
    let length = axis.norm();
    let Some(dir) = Dir3::try_new(axis, 0.0) else {
        return Vec::new();
    };

    let radius = TIP_TAN * tip_proportion * length;
    let base = p1 + axis * (1.0 - tip_proportion);
    let base_normal = -0.1 * dir.into_inner();
    let rotation = Transform::rotation_about_axis(&dir, 2.0 * PI / tip_polygons as f64);

    let mut spoke = perpendicular(&dir);
    let mut out = Vec::with_capacity(2 * tip_polygons);
    for _ in 0..tip_polygons {
        let next = rotation.apply_vec(&spoke);
        let a = base + spoke * radius;
        let b = base + next * radius;
        out.push(TriangleNormals {
            points: [a, b, *p2],
            normals: [spoke, next, dir.into_inner()],
        });
        out.push(TriangleNormals {
            points: [a, b, base],
            normals: [base_normal; 3],
        });
        spoke = next;
    }
    out
}

/// Unit vector perpendicular to `dir`, built from the axis `dir` is
/// least aligned with.
fn perpendicular(dir: &Dir3) -> Vec3 {
    let d = dir.as_ref();
    let seed = if d.x.abs() <= d.y.abs() && d.x.abs() <= d.z.abs() {
        Vec3::x()
    } else if d.y.abs() <= d.z.abs() {
        Vec3::y()
    } else {
        Vec3::z()
    };
    (seed - d * d.dot(&seed)).normalize()
}

fn cube_corners(center: &Point3, half_size: f64) -> [Point3; 8] {
    let h = Vec3::repeat(half_size);
    let bbox = BoundingBox::from_corners(&(center - h), &(center + h));
    bbox.corners().unwrap_or([*center; 8])
}

/// The 12 edges of an axis-aligned cube.
pub fn wire_cube(center: &Point3, half_size: f64) -> Vec<Line> {
    let c = cube_corners(center, half_size);
    CUBE_EDGES
        .iter()
        .map(|&[a, b]| Line { points: [c[a], c[b]] })
        .collect()
}

/// The 6 faces of an axis-aligned cube.
pub fn solid_cube(center: &Point3, half_size: f64) -> Vec<Quad> {
    let c = cube_corners(center, half_size);
    CUBE_FACES
        .iter()
        .map(|f| Quad {
            points: f.map(|i| c[i]),
        })
        .collect()
}

/// Latitude/longitude sphere with per-corner normals.
pub fn solid_sphere(center: &Point3, radius: f64, slices: usize, stacks: usize) -> Vec<QuadNormals> {
    let d_theta = 2.0 * PI / slices as f64;
    let d_phi = PI / stacks as f64;
    let unit = |theta: f64, phi: f64| {
        Vec3::new(theta.cos() * phi.sin(), theta.sin() * phi.sin(), phi.cos())
    };

    let mut out = Vec::with_capacity(slices * stacks);
    for i in 0..slices {
        let theta = i as f64 * d_theta;
        for j in 0..stacks {
            let phi = j as f64 * d_phi;
            let normals = [
                unit(theta + d_theta, phi),
                unit(theta, phi),
                unit(theta, phi + d_phi),
                unit(theta + d_theta, phi + d_phi),
            ];
            out.push(QuadNormals {
                points: normals.map(|n| center + n * radius),
                normals,
            });
        }
    }
    out
}
