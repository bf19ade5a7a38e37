//! Triangulation queries, flips and relabelings on small and flute surfaces.

use super::*;
use std::collections::BTreeSet;
use crate::load::flute;
use proptest::prelude::*;

/// Two triangles glued along all three edges: a thrice-punctured sphere.
fn sphere() -> Triangulation<i64> {
    Triangulation::from_pos(Edges::Finite(vec![0, 1, 2]), |e: &i64| match e {
        0 => [Side::pos(1), Side::pos(2), Side::neg(2), Side::neg(1)],
        1 => [Side::pos(2), Side::pos(0), Side::neg(0), Side::neg(2)],
        _ => [Side::pos(0), Side::pos(1), Side::neg(1), Side::neg(0)],
    })
}

fn flute_t() -> Triangulation<i64> {
    flute().triangulation().clone()
}

/// `side` with the orientation of `edge` reversed.
fn turn(edge: i64, side: Side<i64>) -> Side<i64> {
    if side.edge == edge {
        !side
    } else {
        side
    }
}

#[test]
fn sphere_is_consistent() {
    let t = sphere();
    t.check_local([0, 1, 2]).unwrap();
    assert!(t.is_finite());
    assert_eq!(t.link(&Side::neg(0)), reverse_square(&t.link(&Side::pos(0))));
    assert!(t.same_as(&t.clone()));
    assert!(!t.same_as(&sphere()));
}

#[test]
fn check_local_reports_open_triangles() {
    let t = Triangulation::from_pos(Edges::Finite(vec![0, 1, 2]), |_: &i64| {
        [Side::pos(1), Side::pos(2), Side::neg(2), Side::neg(1)]
    });
    let err = t.check_local([0]).unwrap_err();
    assert!(matches!(err, TriangulationError::Inconsistent { .. }));
    assert!(err.to_string().contains("+0"));
}

#[test]
fn triangles_and_stars() {
    let t = flute_t();
    let tri = t.triangle(&Side::pos(4));
    assert!(tri.contains(&Side::neg(5)));
    assert!(tri.contains(&Side::neg(3)));
    assert_eq!(t.triangle(&Side::neg(5)), tri);
    let star = t.star(&4);
    assert_eq!(star[4], Side::pos(4));
    assert_eq!(&star[..4], &t.link(&Side::pos(4))[..]);
}

#[test]
fn flippability() {
    let t = flute_t();
    assert!(!t.is_flippable(&Side::pos(-1)));
    assert!(!t.is_flippable(&Side::neg(-1)));
    assert!((0..20).all(|e| t.is_flippable(&Side::pos(e))));
}

#[test]
fn flip_rotates_the_square() {
    let t = flute_t();
    let h = t.flip_edge(4);
    let u = h.target();
    let [a, b, c, d] = t.link(&Side::pos(4));
    assert_eq!(u.link(&Side::pos(4)), [d, a, b, c]);
    u.check_local(-1..20).unwrap();
    assert!(!u.same_as(&t));
    assert!(h.source().same_as(&t));
}

#[test]
fn independent_flips_commute_into_one_move() {
    let t = flute_t();
    let sides: BTreeSet<Side<i64>> = [Side::pos(1), Side::pos(7)].into_iter().collect();
    let both = t.flip(FlipSelector::Sides(sides));
    assert_eq!(both.len(), 1);
    let first = t.flip_edge(1);
    let second = first.target().flip_edge(7);
    for e in -1..15 {
        let x = Side::pos(e);
        assert_eq!(both.target().link(&x), second.target().link(&x), "{x}");
    }
}

#[test]
fn predicate_flips_are_lazy() {
    let t = flute_t();
    let h = t.flip(FlipSelector::predicate(|s: &Side<i64>| {
        s.orientation && s.edge > 0 && s.edge % 3 == 1
    }));
    let u = h.target();
    u.check_local(-1..40).unwrap();
    let [a, b, c, d] = t.link(&Side::pos(301));
    assert_eq!(u.link(&Side::pos(301)), [d, a, b, c]);
}

#[test]
#[should_panic(expected = "not flippable")]
fn flipping_a_folded_edge_panics() {
    flute_t().flip_side(&Side::pos(-1));
}

#[test]
#[should_panic(expected = "share a triangle")]
fn flipping_adjacent_edges_panics() {
    let sides: BTreeSet<Side<i64>> = [Side::pos(4), Side::pos(5)].into_iter().collect();
    flute_t().flip(FlipSelector::Sides(sides));
}

#[test]
fn relabel_transports_links_and_weights() {
    let t = sphere();
    let h = t.relabel_map([(Side::pos(0), Side::pos(10))]);
    let u = h.target();
    u.check_local([10, 1, 2]).unwrap();
    assert_eq!(
        u.link(&Side::pos(10)),
        [Side::pos(1), Side::pos(2), Side::neg(2), Side::neg(1)]
    );
    assert_eq!(u.edges().iter().collect::<Vec<_>>(), vec![10, 1, 2]);
    let lam = t.lamination_from_weights([(0, 3), (2, 1)]);
    let moved = h.apply(&lam);
    assert_eq!(moved.to_map().unwrap(), [(10, 3), (2, 1)].into_iter().collect());
    assert!(h.inverse().apply(&moved).equals(&lam).unwrap());
}

#[test]
fn relabel_with_closures_reverses_orientation() {
    let t = sphere();
    let h = t.relabel(|s: &Side<i64>| !s, |s: &Side<i64>| !s);
    h.target().check_local([0, 1, 2]).unwrap();
    assert_eq!(
        h.target().link(&Side::pos(0)),
        t.link(&Side::neg(0)).map(|s| !s)
    );
}

#[test]
fn encode_reads_like_a_product() {
    let t = flute_t();
    let h = t.encode(vec![Term::Edge(4), Term::Edge(4)]);
    assert_eq!(h.len(), 2);
    let arc = t.lamination_from_weights([(4, -1)]);
    let once = t.flip_edge(4).apply(&arc);
    assert_eq!(once.to_map().unwrap(), [(4, 1)].into_iter().collect());
    let twice = h.apply(&arc);
    assert_eq!(twice.to_map().unwrap(), [(4, -1)].into_iter().collect());

    let g = t.encode(vec![
        Term::RelabelMap(vec![(Side::pos(4), Side::pos(100))]),
        Term::Flip(FlipSelector::Edge(4)),
    ]);
    assert_eq!(g.apply(&arc).to_map().unwrap(), [(100, 1)].into_iter().collect());
    assert!(t.identity().is_empty());
    assert!(t.identity().is_mapping_class());
}

#[test]
fn regions_glue_along_edges() {
    let t = flute_t();
    let one = t.triangle_regions(&[4]);
    assert_eq!(one.len(), 1);
    assert_eq!(one[0].len(), 2);
    let two = t.triangle_regions(&[1, 7]);
    assert_eq!(two.len(), 2);
    let glued = t.triangle_regions(&[4, 5]);
    assert_eq!(glued.len(), 1);
    assert_eq!(glued[0].len(), 2);
}

#[test]
fn vertex_orbits_close_up() {
    let t = sphere();
    let (orbit, closed) = t.vertex_orbit(&Side::pos(0), 10);
    assert!(closed);
    assert_eq!(orbit, vec![Side::pos(0), Side::neg(0)]);
    let (orbit, closed) = t.vertex_orbit(&Side::pos(0), 1);
    assert!(!closed);
    assert_eq!(orbit.len(), 1);

    let f = flute_t();
    let (orbit, closed) = f.vertex_orbit(&Side::pos(4), 50);
    assert!(closed);
    assert_eq!(f.corner_walk(&Side::pos(4)).nth(orbit.len()), Some(Side::pos(4)));
}

#[test]
fn corner_prev_undoes_corner_next() {
    let f = flute_t();
    for e in -1..20 {
        for side in [Side::pos(e), Side::neg(e)] {
            assert_eq!(f.corner_prev(&f.corner_next(&side)), side, "{side}");
            assert_eq!(f.corner_next(&f.corner_prev(&side)), side, "{side}");
        }
    }
}

proptest! {
    #[test]
    fn double_flip_is_identity_up_to_orientation(e in 0i64..60) {
        let t = flute_t();
        let back = t.flip_edge(e);
        let back = back.target().flip_edge(e);
        let u = back.target();
        prop_assert_eq!(u.link(&Side::pos(e)), reverse_square(&t.link(&Side::pos(e))));
        for x in (e - 6).max(-1)..e + 6 {
            for side in [Side::pos(x), Side::neg(x)] {
                let expected = t.link(&turn(e, side)).map(|s| turn(e, s));
                prop_assert_eq!(u.link(&side), expected);
            }
        }
    }
}
