//! Whitespace-separated field parsing for command parameters.
//!
//! A parameter list matches only when it has exactly the expected number
//! of words and every word parses.

use std::str::FromStr;

use glv_math::{Color, Point3};

/// Number of whitespace-separated words.
pub(crate) fn word_count(params: &str) -> usize {
    params.split_whitespace().count()
}

/// Parse exactly `N` words as `T`.
pub(crate) fn parse_exact<T: FromStr + Copy + Default, const N: usize>(
    params: &str,
) -> Option<[T; N]> {
    let mut out = [T::default(); N];
    let mut words = params.split_whitespace();
    for slot in out.iter_mut() {
        *slot = words.next()?.parse().ok()?;
    }
    match words.next() {
        Some(_) => None,
        None => Some(out),
    }
}

/// Parse exactly `N` floats.
pub(crate) fn floats<const N: usize>(params: &str) -> Option<[f64; N]> {
    parse_exact::<f64, N>(params)
}

/// Parse exactly `N` integers.
///
/// Signed so that negative indices survive parsing and fail range checks
/// instead of syntax checks.
pub(crate) fn ints<const N: usize>(params: &str) -> Option<[i64; N]> {
    parse_exact::<i64, N>(params)
}

/// `N` floats followed by a tip proportion and an integer polygon count.
pub(crate) fn floats_with_tip<const N: usize>(params: &str) -> Option<([f64; N], f64, i64)> {
    let words: Vec<&str> = params.split_whitespace().collect();
    if words.len() != N + 2 {
        return None;
    }
    let values = floats::<N>(&words[..N].join(" "))?;
    let proportion = words[N].parse().ok()?;
    let polygons = words[N + 1].parse().ok()?;
    Some((values, proportion, polygons))
}

/// Point stored at `values[at..at + 3]`.
pub(crate) fn point_at(values: &[f64], at: usize) -> Point3 {
    Point3::new(values[at], values[at + 1], values[at + 2])
}

/// Color stored at `values[at..at + 3]`.
pub(crate) fn color_at(values: &[f64], at: usize) -> Color {
    Color::new(values[at], values[at + 1], values[at + 2])
}

/// `N` points packed as consecutive `x y z` triples.
pub(crate) fn points<const N: usize>(values: &[f64]) -> [Point3; N] {
    std::array::from_fn(|i| point_at(values, 3 * i))
}

/// `N` interleaved `x y z r g b` vertices.
pub(crate) fn colored_points<const N: usize>(values: &[f64]) -> ([Point3; N], [Color; N]) {
    (
        std::array::from_fn(|i| point_at(values, 6 * i)),
        std::array::from_fn(|i| color_at(values, 6 * i + 3)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_arity() {
        assert_eq!(floats::<3>("1 2 3"), Some([1.0, 2.0, 3.0]));
        assert_eq!(floats::<3>("1 2"), None);
        assert_eq!(floats::<3>("1 2 3 4"), None);
        assert_eq!(floats::<3>("1 two 3"), None);
    }

    #[test]
    fn test_tabs_and_runs_of_spaces() {
        assert_eq!(floats::<2>("  1.5\t\t-2e1 "), Some([1.5, -20.0]));
    }

    #[test]
    fn test_negative_ints_parse() {
        assert_eq!(ints::<2>("-1 4"), Some([-1, 4]));
        assert_eq!(ints::<1>("1.5"), None);
    }

    #[test]
    fn test_colored_layout() {
        let values = [1.0, 2.0, 3.0, 0.1, 0.2, 0.3, 4.0, 5.0, 6.0, 0.4, 0.5, 0.6];
        let (pts, colors) = colored_points::<2>(&values);
        assert_eq!(pts[1], Point3::new(4.0, 5.0, 6.0));
        assert_eq!(colors[0], Color::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_tip_fields() {
        assert_eq!(floats_with_tip::<0>("0.25 6"), Some(([], 0.25, 6)));
        assert_eq!(
            floats_with_tip::<2>("1 2 0.5 3"),
            Some(([1.0, 2.0], 0.5, 3))
        );
        assert_eq!(floats_with_tip::<0>("0.25 6.5"), None);
        assert_eq!(floats_with_tip::<0>("0.25"), None);
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count(" a  b\tc "), 3);
    }
}
