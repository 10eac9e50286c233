//! Recorded node commands and inline state directives.

use std::fmt;

use glv_math::{Color, Point3, Vec3};

use crate::error::{Result, SceneError};
use crate::fields::floats;

/// One entry of a node's ordered command list.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Render the primitive store at this index.
    ExecutePrimitiveStore(usize),
    /// Render the indexed store at this index.
    ExecuteIndexedStore(usize),
    /// Render the sub-node at this index, if it still exists.
    ExecuteSubNode(usize),
    /// Apply a state change.
    State(StateDirective),
}

/// A render state change stored verbatim in a node's command list.
#[derive(Debug, Clone, PartialEq)]
pub enum StateDirective {
    /// `glcolor r g b`
    Color(Color),
    /// `glpushmatrix`
    PushMatrix,
    /// `glpopmatrix`
    PopMatrix,
    /// `glbegin_triangles`
    BeginTriangles,
    /// `glbegin_lines`
    BeginLines,
    /// `glbegin_points`
    BeginPoints,
    /// `glend`
    End,
    /// `glvertex x y z`
    Vertex(Point3),
    /// `gltranslate x y z`
    Translate(Vec3),
    /// `glscale x y z`
    Scale(Vec3),
    /// `glpointsize size`
    PointSize(f64),
    /// `gllinewidth size`
    LineWidth(f64),
    /// `draw_single_sided`
    SingleSided,
    /// `draw_double_sided`
    DoubleSided,
    /// `glenable_polygonoffset_fill`
    EnablePolygonOffsetFill,
    /// `gldisable_polygonoffset_fill`
    DisablePolygonOffsetFill,
    /// `draw_facetboundary_enable r g b`
    FacetBoundaryEnable(Color),
    /// `draw_facetboundary_disable`
    FacetBoundaryDisable,
    /// `text x y z font "text"`
    Text {
        /// Anchor position.
        anchor: Point3,
        /// Font name, as given.
        font: String,
        /// The string between the first pair of double quotes.
        text: String,
    },
}

const TEXT_SYNTAX: &str = "x y z font \"text to display\"";

impl StateDirective {
    /// Parse `command params` if `command` names a state directive.
    ///
    /// Returns `None` for any other command word.
    pub fn parse(command: &str, params: &str) -> Option<Result<Self>> {
        let directive = match command {
            "glpushmatrix" => no_args(command, params, Self::PushMatrix),
            "glpopmatrix" => no_args(command, params, Self::PopMatrix),
            "glbegin_triangles" => no_args(command, params, Self::BeginTriangles),
            "glbegin_lines" => no_args(command, params, Self::BeginLines),
            "glbegin_points" => no_args(command, params, Self::BeginPoints),
            "glend" => no_args(command, params, Self::End),
            "draw_single_sided" => no_args(command, params, Self::SingleSided),
            "draw_double_sided" => no_args(command, params, Self::DoubleSided),
            "glenable_polygonoffset_fill" => {
                no_args(command, params, Self::EnablePolygonOffsetFill)
            }
            "gldisable_polygonoffset_fill" => {
                no_args(command, params, Self::DisablePolygonOffsetFill)
            }
            "draw_facetboundary_disable" => no_args(command, params, Self::FacetBoundaryDisable),
            "glcolor" => parse_color(params),
            "glvertex" => xyz(command, params).map(|v| Self::Vertex(Point3::from(v))),
            "gltranslate" => xyz(command, params).map(Self::Translate),
            "glscale" => xyz(command, params).map(Self::Scale),
            "draw_facetboundary_enable" => xyz(command, params).map(Self::FacetBoundaryEnable),
            "glpointsize" => size(command, params).map(Self::PointSize),
            "gllinewidth" => size(command, params).map(Self::LineWidth),
            "text" => parse_text(params),
            _ => return None,
        };
        Some(directive)
    }

    /// The protocol word for this directive.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Color(_) => "glcolor",
            Self::PushMatrix => "glpushmatrix",
            Self::PopMatrix => "glpopmatrix",
            Self::BeginTriangles => "glbegin_triangles",
            Self::BeginLines => "glbegin_lines",
            Self::BeginPoints => "glbegin_points",
            Self::End => "glend",
            Self::Vertex(_) => "glvertex",
            Self::Translate(_) => "gltranslate",
            Self::Scale(_) => "glscale",
            Self::PointSize(_) => "glpointsize",
            Self::LineWidth(_) => "gllinewidth",
            Self::SingleSided => "draw_single_sided",
            Self::DoubleSided => "draw_double_sided",
            Self::EnablePolygonOffsetFill => "glenable_polygonoffset_fill",
            Self::DisablePolygonOffsetFill => "gldisable_polygonoffset_fill",
            Self::FacetBoundaryEnable(_) => "draw_facetboundary_enable",
            Self::FacetBoundaryDisable => "draw_facetboundary_disable",
            Self::Text { .. } => "text",
        }
    }
}

impl fmt::Display for StateDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            Self::Color(v) | Self::Translate(v) | Self::Scale(v) | Self::FacetBoundaryEnable(v) => {
                write!(f, "{name} {} {} {}", v.x, v.y, v.z)
            }
            Self::Vertex(p) => write!(f, "{name} {} {} {}", p.x, p.y, p.z),
            Self::PointSize(s) | Self::LineWidth(s) => write!(f, "{name} {s}"),
            Self::Text { anchor, font, text } => write!(
                f,
                "{name} {} {} {} {font} \"{text}\"",
                anchor.x, anchor.y, anchor.z
            ),
            _ => f.write_str(name),
        }
    }
}

fn no_args(command: &str, params: &str, directive: StateDirective) -> Result<StateDirective> {
    if params.is_empty() {
        Ok(directive)
    } else {
        Err(SceneError::syntax(command, ""))
    }
}

fn xyz(command: &str, params: &str) -> Result<Vec3> {
    floats::<3>(params)
        .map(|[x, y, z]| Vec3::new(x, y, z))
        .ok_or_else(|| SceneError::syntax(command, "x y z"))
}

fn size(command: &str, params: &str) -> Result<f64> {
    floats::<1>(params)
        .map(|[s]| s)
        .ok_or_else(|| SceneError::syntax(command, "size"))
}

fn parse_color(params: &str) -> Result<StateDirective> {
    let [r, g, b] = floats::<3>(params).ok_or_else(|| SceneError::syntax("glcolor", "r g b"))?;
    if [r, g, b].iter().any(|c| !(0.0..=1.0).contains(c)) {
        return Err(SceneError::invalid("Colors out of range in glcolor"));
    }
    Ok(StateDirective::Color(Color::new(r, g, b)))
}

/// First word of `s` and the text after it.
fn next_word(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    Some(s.split_once(char::is_whitespace).unwrap_or((s, "")))
}

fn parse_text(params: &str) -> Result<StateDirective> {
    let syntax = || SceneError::syntax("text", TEXT_SYNTAX);
    let mut rest = params;
    let mut coords = [0.0; 3];
    for c in coords.iter_mut() {
        let (word, tail) = next_word(rest).ok_or_else(syntax)?;
        *c = word.parse().map_err(|_| syntax())?;
        rest = tail;
    }
    let (font, tail) = next_word(rest).ok_or_else(syntax)?;

    // Everything after the font is the quoted text.
    let text = tail
        .trim()
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .ok_or_else(syntax)?;

    Ok(StateDirective::Text {
        anchor: Point3::new(coords[0], coords[1], coords[2]),
        font: font.to_string(),
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_directive_is_none() {
        assert!(StateDirective::parse("triangle", "").is_none());
    }

    #[test]
    fn test_glcolor_range() {
        let ok = StateDirective::parse("glcolor", "1 0 0.5").unwrap();
        assert_eq!(ok, Ok(StateDirective::Color(Color::new(1.0, 0.0, 0.5))));

        let err = StateDirective::parse("glcolor", "1.5 0 0").unwrap().unwrap_err();
        assert_eq!(err.to_string(), "Colors out of range in glcolor");

        let err = StateDirective::parse("glcolor", "1 0").unwrap().unwrap_err();
        assert_eq!(err, SceneError::syntax("glcolor", "r g b"));
    }

    #[test]
    fn test_no_arg_directive_rejects_params() {
        let err = StateDirective::parse("glpushmatrix", "1").unwrap().unwrap_err();
        assert_eq!(err, SceneError::syntax("glpushmatrix", ""));
    }

    #[test]
    fn test_text_requires_quotes() {
        let text = StateDirective::parse("text", "1 2 3 fixed13 \"hello world\"")
            .unwrap()
            .unwrap();
        assert_eq!(
            text,
            StateDirective::Text {
                anchor: Point3::new(1.0, 2.0, 3.0),
                font: "fixed13".into(),
                text: "hello world".into(),
            }
        );

        assert!(StateDirective::parse("text", "1 2 3 fixed13 hello")
            .unwrap()
            .is_err());
        assert!(StateDirective::parse("text", "1 2 3 fixed13 \"open")
            .unwrap()
            .is_err());
        assert!(StateDirective::parse("text", "1 2 3 \"label\"")
            .unwrap()
            .is_err());
    }

    #[test]
    fn test_text_font_with_quote() {
        let text = StateDirective::parse("text", "0 0 0 odd\"font  \"say \"hi\"\"")
            .unwrap()
            .unwrap();
        assert_eq!(
            text,
            StateDirective::Text {
                anchor: Point3::origin(),
                font: "odd\"font".into(),
                text: "say \"hi\"".into(),
            }
        );
    }

    #[test]
    fn test_display_round_trips_words() {
        let d = StateDirective::parse("gltranslate", "1 -2 0.5").unwrap().unwrap();
        assert_eq!(d.to_string(), "gltranslate 1 -2 0.5");
    }
}
