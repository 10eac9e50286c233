//! Section-aware line filtering.
//!
//! Plain lines are kept when they contain the pattern. A raw section is
//! kept or dropped as a whole, judged on its opening line, so the output
//! stays a well-formed stream.

use std::io::{BufRead, Write};

use crate::error::Result;

/// What [`grep`] keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrepOptions {
    /// Substring to look for.
    pub pattern: String,
    /// Keep non-matching lines instead.
    pub invert: bool,
}

impl GrepOptions {
    /// Keep lines containing `pattern`.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            invert: false,
        }
    }

    /// Keep lines not containing the pattern.
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    fn keeps(&self, line: &str) -> bool {
        line.contains(&self.pattern) != self.invert
    }
}

/// Copy the selected lines and sections of `input` to `output`; returns
/// the number of lines written.
pub fn grep(input: impl BufRead, mut output: impl Write, options: &GrepOptions) -> Result<usize> {
    let mut written = 0;
    let mut lines = input.lines();
    while let Some(line) = lines.next() {
        let line = line?;
        let keep = options.keeps(&line);
        let opens_section = line.starts_with("raw_") && !line.starts_with("raw_end");

        if keep {
            writeln!(output, "{line}")?;
            written += 1;
        }
        if !opens_section {
            continue;
        }
        for item in lines.by_ref() {
            let item = item?;
            if keep {
                writeln!(output, "{item}")?;
                written += 1;
            }
            if item.starts_with("raw_end") {
                break;
            }
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STREAM: &str = "\
object_begin mesh
raw_triangle
0 0 0 1 0 0 0 1 0
raw_end
raw_point
1 2 3
raw_end
point 5 5 5
object_end
";

    fn run(options: &GrepOptions) -> String {
        let mut out = Vec::new();
        grep(STREAM.as_bytes(), &mut out, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_sections_follow_opening_line() {
        let out = run(&GrepOptions::new("triangle"));
        assert_eq!(out, "raw_triangle\n0 0 0 1 0 0 0 1 0\nraw_end\n");
    }

    #[test]
    fn test_items_are_not_matched() {
        let out = run(&GrepOptions::new("1 2 3"));
        assert_eq!(out, "");
    }

    #[test]
    fn test_invert() {
        let out = run(&GrepOptions::new("point").inverted());
        assert_eq!(
            out,
            "object_begin mesh\nraw_triangle\n0 0 0 1 0 0 0 1 0\nraw_end\nobject_end\n"
        );
    }
}
