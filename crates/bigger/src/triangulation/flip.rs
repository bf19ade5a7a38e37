//! Simultaneous edge flips and the tropical transport of laminations.
//!
//! A flipped side with link `[a, b, c, d]` gets link `[d, a, b, c]`; every other
//! side keeps its square except where a neighbor was itself flipped. Selected
//! sides must be flippable and pairwise share no triangle.

use std::collections::BTreeSet;
use std::rc::Rc;

use super::{EdgeLabel, FlipSelector, Side, SidePredicate, Square, Triangulation};
use crate::encoding::{Encoding, Move, MoveKind};
use crate::lamination::{Lamination, Support, WeightFn};

impl<E: EdgeLabel> Triangulation<E> {
    /// Flip every selected side at once.
    ///
    /// Panics (possibly lazily, for predicate selectors) when the selection is
    /// not an independent set of flippable sides.
    pub fn flip(&self, selector: FlipSelector<E>) -> Encoding<E> {
        if let Some(sides) = selector.finite_sides() {
            self.assert_independent(&sides);
        }
        let selected = selector.into_predicate();
        let target = {
            let source = self.clone();
            let selected = selected.clone();
            Triangulation::from_link_fn(
                self.edges().clone(),
                Rc::new(move |x: &Side<E>| flipped_link(&source, &selected, x)),
            )
        };
        let forward = {
            let (source, target, selected) = (self.clone(), target.clone(), selected.clone());
            Rc::new(move |lam: &Lamination<E>| flip_lamination(&source, &target, &selected, lam))
        };
        let backward = {
            let (source, target) = (self.clone(), target.clone());
            Rc::new(move |lam: &Lamination<E>| flip_lamination(&target, &source, &selected, lam))
        };
        Move::new(self.clone(), target, MoveKind::Flip, forward, backward).encode()
    }

    fn assert_independent(&self, sides: &[Side<E>]) {
        let edges: BTreeSet<&E> = sides.iter().map(|s| &s.edge).collect();
        assert_eq!(
            edges.len(),
            sides.len(),
            "cannot flip both orientations of one edge"
        );
        for side in sides {
            assert!(self.is_flippable(side), "side {side} is not flippable");
            for neighbor in self.link(side) {
                assert!(
                    !edges.contains(&neighbor.edge),
                    "sides {side} and {neighbor} share a triangle and cannot be flipped together"
                );
            }
        }
    }
}

fn is_flipped<E: EdgeLabel>(selected: &SidePredicate<E>, side: &Side<E>) -> bool {
    selected(side) || selected(&!side)
}

/// The two sides following `x` in its triangle after the flip.
fn next_pair<E: EdgeLabel>(
    source: &Triangulation<E>,
    selected: &SidePredicate<E>,
    x: &Side<E>,
) -> (Side<E>, Side<E>) {
    let [a, b, c, d] = source.link(x);
    if is_flipped(selected, x) {
        assert!(
            !(selected(x) && selected(&!x)),
            "cannot flip both orientations of {x}"
        );
        assert!(source.is_flippable(x), "side {x} is not flippable");
        for neighbor in [&a, &b, &c, &d] {
            assert!(
                !is_flipped(selected, neighbor),
                "sides {x} and {neighbor} share a triangle and cannot be flipped together"
            );
        }
        return (d, a);
    }
    if is_flipped(selected, &a) {
        let [_, _, a2, _] = source.link(&a);
        return (a2, !a);
    }
    if is_flipped(selected, &b) {
        let [_, _, _, b3] = source.link(&b);
        return (b, b3);
    }
    (a, b)
}

fn flipped_link<E: EdgeLabel>(
    source: &Triangulation<E>,
    selected: &SidePredicate<E>,
    x: &Side<E>,
) -> Square<E> {
    let (a, b) = next_pair(source, selected, x);
    let (c, d) = next_pair(source, selected, &!x);
    [a, b, c, d]
}

/// Exact halving; an odd argument means the weights are not a lamination.
pub(crate) fn half(n: i64) -> i64 {
    assert!(n % 2 == 0, "cannot halve odd weight {n}");
    n / 2
}

/// New weight of a flipped edge with clamped link weights `a0..d0` and old weight `ei`.
pub(crate) fn tropical_flip(a0: i64, b0: i64, c0: i64, d0: i64, ei: i64) -> i64 {
    if ei >= a0 + b0 && a0 >= d0 && b0 >= c0 {
        a0 + b0 - ei
    } else if ei >= c0 + d0 && d0 >= a0 && c0 >= b0 {
        c0 + d0 - ei
    } else if ei <= 0 && a0 >= b0 && d0 >= c0 {
        a0 + d0 - ei
    } else if ei <= 0 && b0 >= a0 && c0 >= d0 {
        b0 + c0 - ei
    } else if ei >= 0 && a0 >= b0 + ei && d0 >= c0 + ei {
        a0 + d0 - 2 * ei
    } else if ei >= 0 && b0 >= a0 + ei && c0 >= d0 + ei {
        b0 + c0 - 2 * ei
    } else if a0 + b0 >= ei && b0 + ei >= 2 * c0 + a0 && a0 + ei >= 2 * d0 + b0 {
        half(a0 + b0 - ei)
    } else if c0 + d0 >= ei && d0 + ei >= 2 * a0 + c0 && c0 + ei >= 2 * b0 + d0 {
        half(c0 + d0 - ei)
    } else {
        (a0 + c0).max(b0 + d0) - ei
    }
}

/// Push `lam` (on `source`) through the flip of `selected` onto `target`.
fn flip_lamination<E: EdgeLabel>(
    source: &Triangulation<E>,
    target: &Triangulation<E>,
    selected: &SidePredicate<E>,
    lam: &Lamination<E>,
) -> Lamination<E> {
    let weight: WeightFn<E> = {
        let (source, selected, lam) = (source.clone(), selected.clone(), lam.clone());
        Rc::new(move |e: &E| {
            let side = Side::pos(e.clone());
            if !is_flipped(&selected, &side) {
                return lam.weight(e);
            }
            let [a0, b0, c0, d0] = source.link(&side).map(|s| lam.weight(&s.edge).max(0));
            tropical_flip(a0, b0, c0, d0, lam.weight(e))
        })
    };
    let support = match lam.support() {
        Support::Finite(set) => {
            let mut out = BTreeSet::new();
            for arc in set {
                for side in target.star(arc) {
                    if weight(&side.edge) != 0 {
                        out.insert(side.edge);
                    }
                }
            }
            Support::Finite(out)
        }
        Support::Unbounded(producer) => {
            let (producer, target, weight) = (producer.clone(), target.clone(), weight.clone());
            Support::Unbounded(Rc::new(move || -> Box<dyn Iterator<Item = E>> {
                let (target, weight) = (target.clone(), weight.clone());
                Box::new(producer().flat_map(move |arc| {
                    let weight = weight.clone();
                    target
                        .star(&arc)
                        .into_iter()
                        .filter(move |s| weight(&s.edge) != 0)
                        .map(|s| s.edge)
                }))
            }))
        }
    };
    Lamination::from_parts(target.clone(), weight, support)
}
