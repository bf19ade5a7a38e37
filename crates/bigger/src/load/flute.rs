//! Flute surfaces: spheres with infinitely many punctures in a row.
//!
//! Both are built from a strip of squares. Square `n` has diagonal `3n + 1`,
//! vertical side `3n` and horizontal side `3n + 2`; the top and bottom copies of
//! `3n + 2` are glued, so the curve `a_n` crossing `3n + 1` and `3n + 2` runs
//! round the strip. The loop `3n` is based at puncture `n` and the curve `b_n`
//! encloses punctures `n` and `n + 1`, so `b_n` meets `b_{n-1}` and `b_{n+1}`.
//!
//! ```text
//!     #----2----#----5----#----8----#---
//!    /|        /|        /|        /|
//! -1  |      /  |      /  |      /  |
//!   #    0    1    3    4    6    7    9 ...
//! -1  |  /      |  /      |  /      |
//!    \|/        |/        |/        |
//!     #----2----#----5----#----8----#---
//! ```

use super::{integers, parse_curve_name, IndexRange};
use crate::lamination::{Lamination, Support};
use crate::mcg::{MappingClassError, MappingClassGroup};
use crate::triangulation::{Edges, Side, Square, Triangulation};

/// Link of the positive side of `e` in the periodic strip.
fn strip_square(e: i64) -> Square<i64> {
    match e.rem_euclid(3) {
        0 => [Side::neg(e - 2), Side::pos(e - 1), Side::pos(e + 1), Side::neg(e + 2)],
        1 => [Side::neg(e + 1), Side::neg(e - 1), Side::pos(e + 1), Side::pos(e + 2)],
        _ => [Side::pos(e + 1), Side::neg(e - 1), Side::neg(e - 2), Side::pos(e - 1)],
    }
}

/// The strip capped off on the left by the self-folded edge `-1`.
fn flute_square(e: i64) -> Square<i64> {
    match e {
        -1 => [Side::pos(0), Side::neg(-1), Side::pos(-1), Side::pos(0)],
        0 => [Side::neg(-1), Side::pos(-1), Side::pos(1), Side::neg(2)],
        _ => strip_square(e),
    }
}

/// The multicurve `Σ a_n` over `range`.
fn a_curves(t: &Triangulation<i64>, range: IndexRange) -> Lamination<i64> {
    if range.is_finite() {
        return t.lamination_from_weights(range.iter().flat_map(|n| [(3 * n + 1, 1), (3 * n + 2, 1)]));
    }
    t.lamination(
        move |e: &i64| i64::from(e.rem_euclid(3) != 0 && range.contains(e.div_euclid(3))),
        Support::unbounded(move || -> Box<dyn Iterator<Item = i64>> {
            Box::new(range.iter().flat_map(|n| [3 * n + 1, 3 * n + 2]))
        }),
    )
}

/// Weights of `b_0`, shifted by `3n` for `b_n`.
const B_CURVE: [(i64, i64); 7] = [(-2, 1), (-1, 1), (0, 2), (1, 2), (3, 2), (4, 1), (5, 1)];

/// The multicurve `Σ b_n` over `range`, dropping edges below `lowest`.
///
/// On the flute `b_0` crosses the self-folded edge `-1` once and there is no edge `-2`.
fn b_curves(
    t: &Triangulation<i64>,
    name: &str,
    range: IndexRange,
    lowest: Option<i64>,
) -> Result<Lamination<i64>, MappingClassError> {
    if range.step == 1 && range.iter().nth(1).is_some() {
        return Err(MappingClassError::IntersectingCurves { name: name.into() });
    }
    let exists = move |e: &i64| lowest.map_or(true, |m| *e >= m);
    let weight = move |e: &i64| -> i64 {
        if !exists(e) {
            return 0;
        }
        B_CURVE
            .iter()
            .filter(|(offset, _)| (e - offset).rem_euclid(3) == 0 && range.contains((e - offset) / 3))
            .map(|(_, w)| w)
            .sum()
    };
    if range.is_finite() {
        let edges: Vec<i64> = range
            .iter()
            .flat_map(|n| B_CURVE.map(|(offset, _)| 3 * n + offset))
            .collect();
        return Ok(t.lamination_from_weights(edges.into_iter().map(|e| (e, weight(&e)))));
    }
    Ok(t.lamination(
        weight,
        Support::unbounded(move || -> Box<dyn Iterator<Item = i64>> {
            Box::new(
                range
                    .iter()
                    .flat_map(|n| B_CURVE.map(|(offset, _)| 3 * n + offset))
                    .filter(exists),
            )
        }),
    ))
}

/// The sphere with punctures accumulating in one direction.
///
/// Generators: `a<n>` (also `a_<n>`, `a[<n>]`) twists about `a_n` for `n >= 0`;
/// `a[start:stop:step]` twists about every `a_n` in the range at once and `a`
/// about all of them. `b<n>` and `b[start:stop:step]` twist about the `b_n`
/// the same way; a `b` range must not hold two consecutive indices.
pub fn flute() -> MappingClassGroup<i64> {
    let t = Triangulation::from_pos(Edges::unbounded(|| integers(Some(-1))), |e: &i64| {
        flute_square(*e)
    });
    let surface = t.clone();
    MappingClassGroup::new(t, move |name| {
        if let Some(range) = parse_curve_name('a', name) {
            return Ok(a_curves(&surface, range.clamp(0)).twist(1)?);
        }
        let range = parse_curve_name('b', name).ok_or_else(|| MappingClassError::unknown(name))?;
        Ok(b_curves(&surface, name, range.clamp(0), Some(-1))?.twist(1)?)
    })
}

/// Edge `e` of the biflute under the half turn fixing `a_0`.
fn rotated(e: i64) -> i64 {
    [3, 2, 4][e.rem_euclid(3) as usize] - e
}

/// The sphere with punctures accumulating in both directions.
///
/// Generators: `a<n>`, `b<n>` and their ranges as for [`flute`] with `n` any
/// integer, `s` (or `shift`) translating the strip by one square and `r` (or
/// `rotate`) turning it over about `a_0`.
pub fn biflute() -> MappingClassGroup<i64> {
    let t = Triangulation::from_pos(Edges::unbounded(|| integers(None)), |e: &i64| strip_square(*e));
    let shift = t.relabel_onto(
        &t,
        |s: &Side<i64>| Side::new(s.edge + 3, s.orientation),
        |s: &Side<i64>| Side::new(s.edge - 3, s.orientation),
    );
    let rotate = t.relabel_onto(
        &t,
        |s: &Side<i64>| Side::new(rotated(s.edge), !s.orientation),
        |s: &Side<i64>| Side::new(rotated(s.edge), !s.orientation),
    );
    let surface = t.clone();
    MappingClassGroup::new(t, move |name| {
        match name {
            "s" | "shift" => return Ok(shift.clone()),
            "r" | "rotate" => return Ok(rotate.clone()),
            _ => {}
        }
        if let Some(range) = parse_curve_name('a', name) {
            return Ok(a_curves(&surface, range).twist(1)?);
        }
        let range = parse_curve_name('b', name).ok_or_else(|| MappingClassError::unknown(name))?;
        Ok(b_curves(&surface, name, range, None)?.twist(1)?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn weights(pairs: &[(i64, i64)]) -> BTreeMap<i64, i64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn flute_links_are_consistent() {
        let mcg = flute();
        mcg.triangulation().check_local(-1..30).unwrap();
        assert!(!mcg.triangulation().is_flippable(&Side::pos(-1)));
        assert!(mcg.triangulation().is_flippable(&Side::pos(2)));
    }

    #[test]
    fn biflute_links_are_consistent() {
        let mcg = biflute();
        mcg.triangulation().check_local(-30..30).unwrap();
    }

    #[test]
    fn a0_moves_the_dual_arc_across() {
        let mcg = flute();
        let arc = mcg.triangulation().lamination_from_weights([(1, -1)]);
        let once = mcg.apply("a0", &arc).unwrap();
        assert_eq!(once.to_map().unwrap(), weights(&[(2, 1)]));
        let twice = mcg.apply("a0.a0", &arc).unwrap();
        assert_eq!(twice.to_map().unwrap(), weights(&[(1, 1), (2, 2)]));
        let back = mcg.apply("A0.a0", &arc).unwrap();
        assert!(back.equals(&arc).unwrap());
    }

    #[test]
    fn name_variants_agree() {
        let mcg = flute();
        let arc = mcg.triangulation().lamination_from_weights([(4, -1)]);
        let expected = weights(&[(5, 1)]);
        for name in ["a1", "a_1", "a[1]", "a[1:2]"] {
            assert_eq!(mcg.apply(name, &arc).unwrap().to_map().unwrap(), expected, "{name}");
        }
    }

    #[test]
    fn a_twists_every_curve_at_once() {
        let mcg = flute();
        let arcs = mcg.triangulation().lamination_from_weights([(1, -1), (7, -1)]);
        let out = mcg.apply("a", &arcs).unwrap();
        assert_eq!(out.to_map().unwrap(), weights(&[(2, 1), (8, 1)]));
        let back = mcg.apply("A", &out).unwrap();
        assert!(back.equals(&arcs).unwrap());
    }

    #[test]
    fn disjoint_arcs_are_fixed() {
        let mcg = flute();
        let arc = mcg.triangulation().lamination_from_weights([(0, -1)]);
        assert!(mcg.apply("a0", &arc).unwrap().equals(&arc).unwrap());
        assert!(mcg.apply("a3", &arc).unwrap().equals(&arc).unwrap());
    }

    #[test]
    fn unknown_names_are_rejected() {
        let mcg = flute();
        assert!(matches!(
            mcg.generator("c0"),
            Err(MappingClassError::UnknownGenerator { .. })
        ));
        assert!(matches!(mcg.word("a0.zz"), Err(MappingClassError::UnknownGenerator { .. })));
        assert!(matches!(mcg.generator("r"), Err(MappingClassError::UnknownGenerator { .. })));
    }

    #[test]
    fn b_curves_cover_two_punctures() {
        let t = flute().triangulation().clone();
        let b0 = b_curves(&t, "b0", IndexRange::single(0), Some(-1)).unwrap();
        assert_eq!(b0.to_map().unwrap(), weights(&[(-1, 1), (0, 2), (1, 2), (3, 2), (4, 1), (5, 1)]));
        let b1 = b_curves(&t, "b1", IndexRange::single(1), Some(-1)).unwrap();
        assert_eq!(
            b1.to_map().unwrap(),
            weights(&[(1, 1), (2, 1), (3, 2), (4, 2), (6, 2), (7, 1), (8, 1)])
        );
        let every_other = b_curves(&t, "b[1::2]", parse_curve_name('b', "b[1::2]").unwrap(), Some(-1)).unwrap();
        assert!(!every_other.is_finitely_supported());
        for e in 1..9 {
            assert_eq!(every_other.weight(&e), b1.weight(&e) + i64::from(e == 7 || e == 8), "edge {e}");
        }
    }

    #[test]
    fn b_twists_are_mapping_classes() {
        let mcg = flute();
        let t = mcg.triangulation();
        let a1 = t.lamination_from_weights([(4, 1), (5, 1)]);
        let twisted = mcg.apply("b1", &a1).unwrap();
        assert_eq!(twisted.intersection(&a1).unwrap(), 4);
        assert_eq!(a1.intersection(&twisted).unwrap(), 4);
        assert!(mcg.apply("B1", &twisted).unwrap().equals(&a1).unwrap());

        let arc = t.lamination_from_weights([(1, -1)]);
        let b0 = mcg.apply("b0", &arc).unwrap();
        assert!(!b0.equals(&arc).unwrap());
        assert!(mcg.apply("B0", &b0).unwrap().equals(&arc).unwrap());
        // b_3 is far from both ends of the arc.
        assert!(mcg.apply("b3", &arc).unwrap().equals(&arc).unwrap());
    }

    #[test]
    fn consecutive_b_curves_are_rejected() {
        for mcg in [flute(), biflute()] {
            for name in ["b", "b[1:3]", "b[:4]", "B[2:]"] {
                assert_eq!(
                    mcg.generator(name).unwrap_err(),
                    MappingClassError::IntersectingCurves { name: name.to_lowercase() },
                    "{name}"
                );
            }
            assert!(mcg.generator("b[1:9:2]").is_ok());
        }
    }

    #[test]
    fn rotation_fixes_a0_and_reverses_the_strip() {
        let mcg = biflute();
        let t = mcg.triangulation();
        let a0 = t.lamination_from_weights([(1, 1), (2, 1)]);
        assert!(mcg.apply("r", &a0).unwrap().equals(&a0).unwrap());
        let arc = t.lamination_from_weights([(4, -1), (9, -1)]);
        let turned = mcg.apply("rotate", &arc).unwrap();
        assert_eq!(turned.to_map().unwrap(), weights(&[(-6, -1), (-2, -1)]));
        assert!(mcg.apply("r.r", &arc).unwrap().equals(&arc).unwrap());
        assert!(mcg.apply("r.s.r", &arc).unwrap().equals(&mcg.apply("S", &arc).unwrap()).unwrap());
        let conjugated = mcg.apply("r.a1.r", &arc).unwrap();
        assert!(conjugated.equals(&mcg.apply("a_-1", &arc).unwrap()).unwrap());
    }

    #[test]
    fn shift_commutes_with_the_full_twist() {
        let mcg = biflute();
        let arc = mcg.triangulation().lamination_from_weights([(1, -1)]);
        let left = mcg.apply("a.s", &arc).unwrap();
        let right = mcg.apply("s.a", &arc).unwrap();
        assert_eq!(left.to_map().unwrap(), weights(&[(5, 1)]));
        assert!(left.equals(&right).unwrap());
    }

    #[test]
    fn biflute_twists_work_left_of_zero() {
        let mcg = biflute();
        let arc = mcg.triangulation().lamination_from_weights([(-5, -1)]);
        let out = mcg.apply("a_-2", &arc).unwrap();
        assert_eq!(out.to_map().unwrap(), weights(&[(-4, 1)]));
        let shifted = mcg.apply("S.S", &arc).unwrap();
        assert_eq!(shifted.to_map().unwrap(), weights(&[(-11, -1)]));
    }

    #[test]
    fn intersection_with_the_dual_arc_is_one() {
        let mcg = flute();
        let t = mcg.triangulation();
        let a0 = t.lamination_from_weights([(1, 1), (2, 1)]);
        let a1 = t.lamination_from_weights([(4, 1), (5, 1)]);
        let arc = t.lamination_from_weights([(1, -1)]);
        assert_eq!(a0.intersection(&arc).unwrap(), 1);
        assert_eq!(a0.intersection(&a1).unwrap(), 0);
    }
}
