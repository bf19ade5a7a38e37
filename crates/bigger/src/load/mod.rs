//! Example surfaces with named mapping classes.
//!
//! Purpose
//! - Ready-made infinite-type triangulations for tests, benches and the CLI.
//!
//! Layout
//! - `flute.rs`: the one-ended flute and the two-ended biflute.
//! - This file: integer edge enumerations and curve-family name parsing
//!   (`a`, `a3`, `a_3`, `a[3]`, `a[1:4]`, `a[2:]`, `a[:5]`, `a[0:9:2]`).

mod flute;

pub use flute::{biflute, flute};

/// All integers `>= minimum`, or every integer (`0, -1, 1, -2, ...`) without one.
pub fn integers(minimum: Option<i64>) -> Box<dyn Iterator<Item = i64>> {
    match minimum {
        Some(m) => Box::new(m..),
        None => Box::new((0_i64..).flat_map(|n| [n, !n])),
    }
}

/// A half-open range of curve indices taken every `step`; missing bounds are
/// unbounded. Members are congruent to `start` (or to `0` when there is no
/// `start`) modulo `step`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexRange {
    pub start: Option<i64>,
    pub stop: Option<i64>,
    pub step: i64,
}

impl IndexRange {
    pub const ALL: IndexRange = IndexRange {
        start: None,
        stop: None,
        step: 1,
    };

    pub fn new(start: Option<i64>, stop: Option<i64>) -> Self {
        Self {
            start,
            stop,
            step: 1,
        }
    }

    pub fn single(n: i64) -> Self {
        Self::new(Some(n), Some(n + 1))
    }

    fn anchor(&self) -> i64 {
        self.start.unwrap_or(0)
    }

    /// Raise the lower bound to the first member `>= minimum`.
    pub fn clamp(self, minimum: i64) -> Self {
        let start = match self.start {
            Some(s) if s >= minimum => s,
            _ => minimum + (self.anchor() - minimum).rem_euclid(self.step),
        };
        Self {
            start: Some(start),
            ..self
        }
    }

    pub fn contains(&self, n: i64) -> bool {
        self.start.map_or(true, |s| s <= n)
            && self.stop.map_or(true, |t| n < t)
            && (n - self.anchor()).rem_euclid(self.step) == 0
    }

    pub fn is_finite(&self) -> bool {
        self.start.is_some() && self.stop.is_some()
    }

    pub fn is_empty(&self) -> bool {
        matches!((self.start, self.stop), (Some(s), Some(t)) if s >= t)
    }

    /// Restartable enumeration of the indices.
    pub fn iter(&self) -> Box<dyn Iterator<Item = i64>> {
        let step = self.step;
        match (self.start, self.stop) {
            (Some(s), Some(t)) => {
                Box::new((0_i64..).map(move |k| s + k * step).take_while(move |&n| n < t))
            }
            (Some(s), None) => Box::new((0_i64..).map(move |k| s + k * step)),
            (None, Some(t)) => {
                let top = t - 1 - (t - 1).rem_euclid(step);
                Box::new((0_i64..).map(move |k| top - k * step))
            }
            (None, None) => Box::new(integers(None).map(move |k| k * step)),
        }
    }
}

/// Parse `name` as a selection from the curve family `family`: `a`, `a3`,
/// `a_3`, `a[3]` or a slice `a[start:stop]`, `a[start:stop:step]` with any
/// bound left out. `step` must be positive.
pub fn parse_curve_name(family: char, name: &str) -> Option<IndexRange> {
    let rest = name.strip_prefix(family)?.trim();
    if rest.is_empty() {
        return Some(IndexRange::ALL);
    }
    if let Some(n) = rest.strip_prefix('_') {
        return n.trim().parse().ok().map(IndexRange::single);
    }
    if let Some(inner) = rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        let parts: Vec<&str> = inner.split(':').collect();
        return match parts.as_slice() {
            [n] => n.trim().parse().ok().map(IndexRange::single),
            [start, stop] => Some(IndexRange::new(parse_bound(start)?, parse_bound(stop)?)),
            [start, stop, step] => {
                let step = parse_bound(step)?.unwrap_or(1);
                if step <= 0 {
                    return None;
                }
                Some(IndexRange {
                    start: parse_bound(start)?,
                    stop: parse_bound(stop)?,
                    step,
                })
            }
            _ => None,
        };
    }
    rest.parse().ok().map(IndexRange::single)
}

/// `Some(None)` for an empty bound, `None` when the bound is malformed.
fn parse_bound(text: &str) -> Option<Option<i64>> {
    let text = text.trim();
    if text.is_empty() {
        return Some(None);
    }
    text.parse().ok().map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_enumerate_both_directions() {
        let first: Vec<i64> = integers(None).take(6).collect();
        assert_eq!(first, vec![0, -1, 1, -2, 2, -3]);
        let first: Vec<i64> = integers(Some(-1)).take(3).collect();
        assert_eq!(first, vec![-1, 0, 1]);
    }

    #[test]
    fn curve_names_parse() {
        assert_eq!(parse_curve_name('a', "a"), Some(IndexRange::ALL));
        assert_eq!(parse_curve_name('a', "a3"), Some(IndexRange::single(3)));
        assert_eq!(parse_curve_name('a', "a_-2"), Some(IndexRange::single(-2)));
        assert_eq!(parse_curve_name('a', "a[ 4 ]"), Some(IndexRange::single(4)));
        assert_eq!(
            parse_curve_name('a', "a[1:4]"),
            Some(IndexRange::new(Some(1), Some(4)))
        );
        assert_eq!(
            parse_curve_name('a', "a[:5]"),
            Some(IndexRange::new(None, Some(5)))
        );
        assert_eq!(parse_curve_name('a', "b3"), None);
        assert_eq!(parse_curve_name('a', "a[x:]"), None);
        assert_eq!(parse_curve_name('a', "ab"), None);
    }

    #[test]
    fn stepped_slices_parse() {
        assert_eq!(
            parse_curve_name('a', "a[1:9:4]"),
            Some(IndexRange {
                start: Some(1),
                stop: Some(9),
                step: 4
            })
        );
        assert_eq!(parse_curve_name('a', "a[::2]").map(|r| r.step), Some(2));
        assert_eq!(parse_curve_name('a', "a[2:5:]"), Some(IndexRange::new(Some(2), Some(5))));
        assert_eq!(parse_curve_name('a', "a[0:4:0]"), None);
        assert_eq!(parse_curve_name('a', "a[0:4:-1]"), None);
        assert_eq!(parse_curve_name('a', "a[0:4:1:1]"), None);
    }

    #[test]
    fn stepped_ranges_keep_their_residue() {
        let odd = parse_curve_name('a', "a[1::2]").unwrap();
        assert_eq!(odd.iter().take(3).collect::<Vec<_>>(), vec![1, 3, 5]);
        assert!(odd.contains(7) && !odd.contains(6) && !odd.contains(-1));

        let r = parse_curve_name('a', "a[1:10:4]").unwrap();
        assert_eq!(r.iter().collect::<Vec<_>>(), vec![1, 5, 9]);

        let below = parse_curve_name('a', "a[:7:3]").unwrap();
        assert_eq!(below.iter().take(3).collect::<Vec<_>>(), vec![6, 3, 0]);
        assert!(below.contains(-3) && !below.contains(-2));

        let all_even = parse_curve_name('a', "a[::2]").unwrap();
        assert_eq!(all_even.iter().take(4).collect::<Vec<_>>(), vec![0, -2, 2, -4]);

        // Clamping keeps members congruent to the original start.
        let r = parse_curve_name('a', "a[-3::2]").unwrap().clamp(0);
        assert_eq!(r.iter().take(3).collect::<Vec<_>>(), vec![1, 3, 5]);
        let r = parse_curve_name('a', "a[::3]").unwrap().clamp(1);
        assert_eq!(r.iter().take(2).collect::<Vec<_>>(), vec![3, 6]);
    }

    #[test]
    fn ranges_enumerate_what_they_contain() {
        let r = IndexRange::new(None, Some(2));
        let first: Vec<i64> = r.iter().take(3).collect();
        assert_eq!(first, vec![1, 0, -1]);
        assert!(r.iter().take(20).all(|n| r.contains(n)));
        assert!(!r.contains(2));
        assert_eq!(r.clamp(0).iter().collect::<Vec<_>>(), vec![0, 1]);
        assert!(IndexRange::single(5).clamp(7).is_empty());
    }
}
