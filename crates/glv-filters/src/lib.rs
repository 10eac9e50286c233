#![warn(missing_docs)]

//! Stream-to-stream filters for the glv line protocol.
//!
//! Each filter reads a protocol stream and writes a protocol stream, so
//! they chain with pipes in front of the viewer:
//!
//! - [`skin`]: volume cells to boundary facets.
//! - [`grep`]: keep or drop lines and whole raw sections by pattern.
//! - [`scalar_to_color`]: scalar fields to per-vertex colors.

pub mod error;
pub mod grep;
pub mod scalar;
pub mod skin;

pub use error::{FilterError, Result};
pub use grep::{grep, GrepOptions};
pub use scalar::{hsv_to_rgb, parse_color, scalar_to_color, ColorMap, ScalarOptions};
pub use skin::{skin, CellKind, Facet, Skin, SkinStats};
