//! Viewer directives reported to the caller.
//!
//! These lines do not change the scene. The parser validates them and
//! queues a [`ViewerEvent`] for whoever drives the display.

use std::path::PathBuf;

use glv_math::{Point3, Vec3};
use glv_scene::SceneError;

use crate::error::{ParseError, Result};

/// Largest snapshot, in pixels: one gigabyte of 24-bit RGB.
pub const MAX_SNAPSHOT_PIXELS: u64 = 357_913_941;

const VIEW_SYNTAX: &str = "x y z [dx dy dz [ux uy uz dist zoom]]";
const SNAPSHOT_SYNTAX: &str = "<width>x<height> filename.ext";

/// A camera placement from a `view` line.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    /// Point looked at.
    pub center: Point3,
    /// Viewing direction.
    pub direction: Option<Vec3>,
    /// Up vector.
    pub up: Option<Vec3>,
    /// Eye distance from `center`.
    pub distance: Option<f64>,
    /// Zoom factor.
    pub zoom: Option<f64>,
}

/// A non-geometry directive found in the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    /// `title <text>`; the text may be empty.
    Title(String),
    /// `snapshot WxH file`.
    Snapshot {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Output file.
        path: PathBuf,
    },
    /// `view ...`
    View(View),
}

impl ViewerEvent {
    /// Parse the parameters of a `snapshot` line.
    pub fn snapshot(params: &str) -> Result<Self> {
        let syntax = || ParseError::from(SceneError::syntax("snapshot", SNAPSHOT_SYNTAX));
        let mut words = params.split_whitespace();
        let (Some(geometry), Some(file), None) = (words.next(), words.next(), words.next()) else {
            return Err(syntax());
        };
        let (width, height) = geometry
            .split_once(['x', 'X'])
            .and_then(|(w, h)| Some((w.parse::<i64>().ok()?, h.parse::<i64>().ok()?)))
            .ok_or_else(syntax)?;

        let in_range = width >= 1
            && height >= 1
            && (width as u64).saturating_mul(height as u64) <= MAX_SNAPSHOT_PIXELS;
        if !in_range {
            return Err(ParseError::invalid(
                "Bad geometry argument in snapshot:\n  <width>x<height> out of range (max size is one Gigabyte)",
            ));
        }
        Ok(Self::Snapshot {
            width: width as u32,
            height: height as u32,
            path: PathBuf::from(file),
        })
    }

    /// Parse the parameters of a `view` line: 3, 6 or 11 numbers.
    pub fn view(params: &str) -> Result<Self> {
        let values: Option<Vec<f64>> = params.split_whitespace().map(|w| w.parse().ok()).collect();
        let v = match values {
            Some(v) if matches!(v.len(), 3 | 6 | 11) => v,
            _ => return Err(SceneError::syntax("view", VIEW_SYNTAX).into()),
        };
        let vec_at = |i: usize| Vec3::new(v[i], v[i + 1], v[i + 2]);
        Ok(Self::View(View {
            center: Point3::new(v[0], v[1], v[2]),
            direction: (v.len() >= 6).then(|| vec_at(3)),
            up: (v.len() == 11).then(|| vec_at(6)),
            distance: (v.len() == 11).then(|| v[9]),
            zoom: (v.len() == 11).then(|| v[10]),
        }))
    }
}
