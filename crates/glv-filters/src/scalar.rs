//! Scalar-to-color conversion.
//!
//! `raw_scalar_v` sections become `raw_color_v` sections with one color
//! per value. Runs of single `scalar_v s` lines are gathered into one
//! `raw_color_v` section as well, since colors only attach to a vertex
//! pool section by section.

use std::io::{BufRead, Write};

use glv_math::Color;

use crate::error::{FilterError, Result};

/// How a normalized scalar maps to a color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorMap {
    /// HSV hue `2/3 * t`, full saturation and value.
    Hue,
    /// Straight interpolation from `low` to `high`.
    Linear {
        /// Color at the range minimum.
        low: Color,
        /// Color at the range maximum.
        high: Color,
    },
}

/// Conversion settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarOptions {
    /// Color table.
    pub map: ColorMap,
    /// Value mapped to the start of the table.
    pub min: f64,
    /// Value mapped to the end of the table.
    pub max: f64,
    /// Use each raw section's own min/max instead of `min`/`max`.
    pub auto_range: bool,
}

impl Default for ScalarOptions {
    fn default() -> Self {
        Self {
            map: ColorMap::Hue,
            min: 0.0,
            max: 1.0,
            auto_range: false,
        }
    }
}

impl ScalarOptions {
    /// Color for `value` within `[min, max]`, clamped to the table ends.
    pub fn color(&self, value: f64, min: f64, max: f64) -> Color {
        let span = max - min;
        let t = if span.abs() > f64::EPSILON {
            ((value - min) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        match self.map {
            ColorMap::Hue => hsv_to_rgb(t * 2.0 / 3.0, 1.0, 1.0),
            ColorMap::Linear { low, high } => low + (high - low) * t,
        }
    }
}

/// Parse a color given as `r,g,b` or as a name.
pub fn parse_color(text: &str) -> Result<Color> {
    let named = match text {
        "red" => Some(Color::new(1.0, 0.0, 0.0)),
        "green" => Some(Color::new(0.0, 1.0, 0.0)),
        "blue" => Some(Color::new(0.0, 0.0, 1.0)),
        "white" => Some(Color::new(1.0, 1.0, 1.0)),
        "black" => Some(Color::new(0.0, 0.0, 0.0)),
        _ => None,
    };
    if let Some(color) = named {
        return Ok(color);
    }
    let parts: Option<Vec<f64>> = text.split(',').map(|p| p.trim().parse().ok()).collect();
    match parts.as_deref() {
        Some(&[r, g, b]) => Ok(Color::new(r, g, b)),
        _ => Err(FilterError::InvalidColor(text.to_string())),
    }
}

/// Convert HSV, each in `[0, 1]`, to RGB.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> Color {
    if s == 0.0 {
        return Color::new(v, v, v);
    }
    let h = if h >= 1.0 { 0.0 } else { h } * 6.0;
    let sector = h.floor();
    let f = h - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u8 {
        0 => Color::new(v, t, p),
        1 => Color::new(q, v, p),
        2 => Color::new(p, v, t),
        3 => Color::new(p, q, v),
        4 => Color::new(t, p, v),
        _ => Color::new(v, p, q),
    }
}

fn write_section(out: &mut impl Write, colors: impl Iterator<Item = Color>) -> std::io::Result<()> {
    writeln!(out, "raw_color_v")?;
    for c in colors {
        writeln!(out, "{:.6} {:.6} {:.6}", c.x, c.y, c.z)?;
    }
    writeln!(out, "raw_end")
}

fn parse_value(text: &str, line: usize) -> Result<f64> {
    text.trim()
        .parse()
        .map_err(|_| FilterError::syntax(line, "scalar_v", "value"))
}

/// Rewrite scalar sections of `input` as color sections; returns the
/// number of values converted.
pub fn scalar_to_color(
    input: impl BufRead,
    mut output: impl Write,
    options: &ScalarOptions,
) -> Result<usize> {
    let mut converted = 0;
    let mut run: Vec<f64> = Vec::new();
    let mut lines = input.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let line = line?;
        let trimmed = line.trim();
        if let Some(value) = trimmed.strip_prefix("scalar_v ") {
            run.push(parse_value(value, index + 1)?);
            continue;
        }
        if !run.is_empty() {
            converted += run.len();
            let colors = run.drain(..).map(|v| options.color(v, options.min, options.max));
            write_section(&mut output, colors)?;
        }

        if trimmed != "raw_scalar_v" {
            writeln!(output, "{line}")?;
            continue;
        }

        let mut values = Vec::new();
        let mut closed = false;
        let mut last = index + 1;
        for (index, item) in lines.by_ref() {
            let item = item?;
            last = index + 1;
            if item.trim_start().starts_with("raw_end") {
                closed = true;
                break;
            }
            values.push(parse_value(&item, last)?);
        }
        if !closed {
            return Err(FilterError::UnterminatedRaw {
                section: "raw_scalar_v".into(),
                line: last,
            });
        }

        let (min, max) = if options.auto_range && !values.is_empty() {
            values
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
        } else {
            (options.min, options.max)
        };
        converted += values.len();
        write_section(&mut output, values.iter().map(|&v| options.color(v, min, max)))?;
    }

    if !run.is_empty() {
        converted += run.len();
        write_section(&mut output, run.iter().map(|&v| options.color(v, options.min, options.max)))?;
    }
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn run(text: &str, options: &ScalarOptions) -> String {
        let mut out = Vec::new();
        scalar_to_color(text.as_bytes(), &mut out, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_hue_ramp_ends() {
        let options = ScalarOptions::default();
        assert_relative_eq!(options.color(0.0, 0.0, 1.0), Color::new(1.0, 0.0, 0.0));
        assert_relative_eq!(options.color(1.0, 0.0, 1.0), Color::new(0.0, 0.0, 1.0));
        assert_relative_eq!(options.color(5.0, 0.0, 1.0), Color::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_linear_map() {
        let options = ScalarOptions {
            map: ColorMap::Linear {
                low: parse_color("black").unwrap(),
                high: parse_color("1,0.5,0").unwrap(),
            },
            ..Default::default()
        };
        assert_relative_eq!(options.color(0.5, 0.0, 1.0), Color::new(0.5, 0.25, 0.0));
    }

    #[test]
    fn test_named_colors() {
        assert_eq!(parse_color("white").unwrap(), Color::new(1.0, 1.0, 1.0));
        assert_eq!(parse_color("black").unwrap(), Color::new(0.0, 0.0, 0.0));
        assert!(parse_color("mauve").is_err());
        assert!(parse_color("1,2").is_err());
    }

    #[test]
    fn test_raw_section_with_auto_range() {
        let options = ScalarOptions {
            auto_range: true,
            ..Default::default()
        };
        let out = run("raw_vertex\n0 0 0\nraw_end\nraw_scalar_v\n10\n20\nraw_end\n", &options);
        assert_eq!(
            out,
            "raw_vertex\n0 0 0\nraw_end\nraw_color_v\n1.000000 0.000000 0.000000\n0.000000 0.000000 1.000000\nraw_end\n"
        );
    }

    #[test]
    fn test_scalar_lines_grouped() {
        let out = run("scalar_v 0\nscalar_v 1\npoint_v 0\n", &ScalarOptions::default());
        assert_eq!(
            out,
            "raw_color_v\n1.000000 0.000000 0.000000\n0.000000 0.000000 1.000000\nraw_end\npoint_v 0\n"
        );
    }

    #[test]
    fn test_unterminated_scalar_section() {
        let err = scalar_to_color("raw_scalar_v\n1\n".as_bytes(), Vec::new(), &ScalarOptions::default())
            .unwrap_err();
        assert!(matches!(err, FilterError::UnterminatedRaw { line: 2, .. }));
    }
}
