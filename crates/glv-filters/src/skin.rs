//! Volume cell skinning.
//!
//! Cells (`tetra_v`, `pyra_v`, `prism_v`, `hexa_v` and their raw
//! sections) are broken into oriented facets. A facet shared by two cells
//! is interior; only facets seen exactly once are written, as
//! `triangle_v`/`quad_v`, when an `object_end` is met and at end of input.
//! Every other line passes through unchanged.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use crate::error::{FilterError, Result};

/// A volume cell kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// 4 vertices, 4 triangles.
    Tetra,
    /// 5 vertices, 1 quad base and 4 triangles.
    Pyra,
    /// 6 vertices, 2 triangles and 3 quads.
    Prism,
    /// 8 vertices, 6 quads.
    Hexa,
}

impl CellKind {
    /// Cell for a simple command word, e.g. `tetra_v`.
    pub fn from_command(command: &str) -> Option<Self> {
        match command {
            "tetra_v" => Some(Self::Tetra),
            "pyra_v" => Some(Self::Pyra),
            "prism_v" => Some(Self::Prism),
            "hexa_v" => Some(Self::Hexa),
            _ => None,
        }
    }

    /// Cell for a raw section opener, e.g. `raw_tetra_v`.
    pub fn from_section(section: &str) -> Option<Self> {
        section.strip_prefix("raw_").and_then(Self::from_command)
    }

    /// Simple command word.
    pub fn command(self) -> &'static str {
        match self {
            Self::Tetra => "tetra_v",
            Self::Pyra => "pyra_v",
            Self::Prism => "prism_v",
            Self::Hexa => "hexa_v",
        }
    }

    /// Number of vertex indices.
    pub fn arity(self) -> usize {
        match self {
            Self::Tetra => 4,
            Self::Pyra => 5,
            Self::Prism => 6,
            Self::Hexa => 8,
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Self::Tetra => "pt0 pt1 pt2 pt3",
            Self::Pyra => "pt0 pt1 pt2 pt3 pt4",
            Self::Prism => "pt0 pt1 pt2 pt3 pt4 pt5",
            Self::Hexa => "pt0 pt1 pt2 pt3 pt4 pt5 pt6 pt7",
        }
    }

    /// Outward facets of a cell with connectivity `c`.
    ///
    /// `c` must hold [`CellKind::arity`] indices.
    pub fn facets(self, c: &[u32]) -> Vec<Facet> {
        let tri = |a: usize, b: usize, d: usize| Facet::Triangle([c[a], c[b], c[d]]);
        let quad = |a: usize, b: usize, d: usize, e: usize| Facet::Quad([c[a], c[b], c[d], c[e]]);
        match self {
            Self::Tetra => vec![tri(0, 2, 1), tri(0, 1, 3), tri(1, 2, 3), tri(2, 0, 3)],
            Self::Pyra => vec![
                quad(0, 3, 2, 1),
                tri(0, 1, 4),
                tri(1, 2, 4),
                tri(2, 3, 4),
                tri(3, 0, 4),
            ],
            Self::Prism => vec![
                tri(0, 2, 1),
                quad(0, 1, 4, 3),
                quad(1, 2, 5, 4),
                quad(2, 0, 3, 5),
                tri(3, 4, 5),
            ],
            Self::Hexa => vec![
                quad(0, 3, 2, 1),
                quad(0, 1, 5, 4),
                quad(1, 2, 6, 5),
                quad(2, 3, 7, 6),
                quad(3, 0, 4, 7),
                quad(4, 5, 6, 7),
            ],
        }
    }
}

/// An oriented cell face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    /// Three vertex indices.
    Triangle([u32; 3]),
    /// Four vertex indices.
    Quad([u32; 4]),
}

/// Orientation-independent identity of a facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FacetKey {
    len: usize,
    sorted: [u32; 4],
}

impl Facet {
    fn key(&self) -> FacetKey {
        let mut sorted = [u32::MAX; 4];
        let len = match self {
            Self::Triangle(v) => {
                sorted[..3].copy_from_slice(v);
                3
            }
            Self::Quad(v) => {
                sorted.copy_from_slice(v);
                4
            }
        };
        sorted[..len].sort_unstable();
        FacetKey { len, sorted }
    }

    fn write_to(&self, out: &mut impl Write) -> std::io::Result<()> {
        match self {
            Self::Triangle([a, b, c]) => writeln!(out, "triangle_v {a} {b} {c}"),
            Self::Quad([a, b, c, d]) => writeln!(out, "quad_v {a} {b} {c} {d}"),
        }
    }
}

/// Accumulates cell facets and emits the boundary ones.
#[derive(Debug, Default)]
pub struct Skin {
    facets: Vec<Facet>,
    counts: HashMap<FacetKey, usize>,
}

impl Skin {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the facets of one cell.
    pub fn add_cell(&mut self, kind: CellKind, connectivity: &[u32]) {
        for facet in kind.facets(connectivity) {
            *self.counts.entry(facet.key()).or_insert(0) += 1;
            self.facets.push(facet);
        }
    }

    /// Facets seen exactly once, in the order they were added.
    pub fn boundary(&self) -> impl Iterator<Item = &Facet> + '_ {
        self.facets
            .iter()
            .filter(|f| self.counts.get(&f.key()) == Some(&1))
    }

    /// Write the boundary facets and start over; returns how many.
    pub fn flush(&mut self, out: &mut impl Write) -> std::io::Result<usize> {
        let mut written = 0;
        for facet in self.boundary() {
            facet.write_to(out)?;
            written += 1;
        }
        self.facets.clear();
        self.counts.clear();
        Ok(written)
    }
}

/// Counts reported by [`skin`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkinStats {
    /// Cells read.
    pub cells: usize,
    /// Boundary facets written.
    pub facets: usize,
}

fn parse_connectivity(kind: CellKind, fields: &str, line: usize) -> Result<Vec<u32>> {
    let conn: Option<Vec<u32>> = fields.split_whitespace().map(|w| w.parse().ok()).collect();
    match conn {
        Some(conn) if conn.len() == kind.arity() => Ok(conn),
        _ => Err(FilterError::syntax(line, kind.command(), kind.expected())),
    }
}

/// Replace volume cells in `input` by their boundary facets.
pub fn skin(input: impl BufRead, mut output: impl Write) -> Result<SkinStats> {
    let mut skin = Skin::new();
    let mut stats = SkinStats::default();
    let mut lines = input.lines().enumerate();

    while let Some((index, line)) = lines.next() {
        let line = line?;
        let trimmed = line.trim();
        let (command, params) = trimmed
            .split_once(char::is_whitespace)
            .map_or((trimmed, ""), |(c, p)| (c, p.trim()));

        if let Some(kind) = CellKind::from_section(command) {
            let mut last = index + 1;
            let mut closed = false;
            for (index, item) in lines.by_ref() {
                let item = item?;
                last = index + 1;
                let item = item.trim();
                if item.starts_with("raw_end") {
                    closed = true;
                    break;
                }
                if item.is_empty() {
                    continue;
                }
                skin.add_cell(kind, &parse_connectivity(kind, item, last)?);
                stats.cells += 1;
            }
            if !closed {
                return Err(FilterError::UnterminatedRaw {
                    section: command.to_string(),
                    line: last,
                });
            }
        } else if let Some(kind) = CellKind::from_command(command) {
            skin.add_cell(kind, &parse_connectivity(kind, params, index + 1)?);
            stats.cells += 1;
        } else {
            if command == "object_end" {
                stats.facets += skin.flush(&mut output)?;
            }
            writeln!(output, "{line}")?;
        }
    }

    stats.facets += skin.flush(&mut output)?;
    log::debug!("skin: {} cells, {} boundary facets", stats.cells, stats.facets);
    Ok(stats)
}
