//! Plain-text tree dump helpers.

use std::io::{self, Write};

use glv_math::{BoundingBox, Transform};

/// Write a box, transformed, as three `[Min, Max]` lines or `Empty`.
pub(crate) fn write_bbox(
    out: &mut dyn Write,
    indent: &str,
    bbox: &BoundingBox,
    transform: &Transform,
) -> io::Result<()> {
    writeln!(out, "{indent}BoundingBox")?;
    let inner = format!("{indent}  ");
    let moved = bbox.transformed(transform);
    match (moved.min(), moved.max()) {
        (Some(lo), Some(hi)) => {
            writeln!(out, "{inner}[MinX, MaxX] = [{}, {}]", lo.x, hi.x)?;
            writeln!(out, "{inner}[MinY, MaxY] = [{}, {}]", lo.y, hi.y)?;
            writeln!(out, "{inner}[MinZ, MaxZ] = [{}, {}]", lo.z, hi.z)
        }
        _ => writeln!(out, "{inner}Empty"),
    }
}
