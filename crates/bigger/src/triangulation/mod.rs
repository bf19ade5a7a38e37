//! Lazy triangulations of (possibly infinite-type) punctured surfaces.
//!
//! Purpose
//! - A triangulation is a pure function from an oriented side to its link (the
//!   four sides of the two triangles meeting along it) plus a restartable
//!   enumeration of edge labels. Nothing is ever materialized, so surfaces with
//!   infinitely many triangles are first-class.
//! - Rewrites (`flip`, `relabel`) never mutate: they return an [`Encoding`] whose
//!   target is a new triangulation defined in terms of the old one.
//!
//! Why this design
//! - Connectivity lives in closures, so there is no cyclic mutable graph to keep
//!   consistent. Each triangulation owns a link cache because derived
//!   triangulations (flips of flips) query their sources constantly.
//! - Triangulations compare by identity (`same_as`); two independently built
//!   triangulations with equal links are still different objects, which is what
//!   composition checks need.
//!
//! Layout
//! - `types.rs`: sides, squares, triangles, edge enumerations, selectors.
//! - `flip.rs`: the diagonal swap and the tropical transport rule.

mod flip;
mod types;

pub use types::{
    reverse_square, EdgeLabel, EdgeProducer, Edges, FlipSelector, LinkFn, Side, SideMap,
    SidePredicate, Square, Term, Triangle,
};

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::encoding::{Encoding, Move, MoveKind};
use crate::lamination::{Lamination, Support};
use crate::memo::Memo;
use crate::structures::UnionFind;

/// Local inconsistency found by [`Triangulation::check_local`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriangulationError {
    Inconsistent { side: String, reason: String },
}

impl TriangulationError {
    fn inconsistent<E: fmt::Debug>(side: &Side<E>, reason: impl Into<String>) -> Self {
        Self::Inconsistent {
            side: side.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TriangulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inconsistent { side, reason } => write!(f, "inconsistent link at {side}: {reason}"),
        }
    }
}

impl std::error::Error for TriangulationError {}

struct Inner<E: EdgeLabel> {
    edges: Edges<E>,
    link: LinkFn<E>,
    links: Memo<Side<E>, Square<E>>,
}

/// A triangulation given by its link function. Cheap to clone (shared handle).
pub struct Triangulation<E: EdgeLabel> {
    inner: Rc<Inner<E>>,
}

impl<E: EdgeLabel> Clone for Triangulation<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: EdgeLabel> fmt::Debug for Triangulation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Triangulation@{:p}({:?})",
            Rc::as_ptr(&self.inner),
            self.inner.edges
        )
    }
}

impl<E: EdgeLabel> Triangulation<E> {
    /// Build from an edge enumeration and a link function on sides.
    pub fn new(edges: Edges<E>, link: impl Fn(&Side<E>) -> Square<E> + 'static) -> Self {
        Self::from_link_fn(edges, Rc::new(link))
    }

    pub(crate) fn from_link_fn(edges: Edges<E>, link: LinkFn<E>) -> Self {
        Self {
            inner: Rc::new(Inner {
                edges,
                link,
                links: Memo::new(),
            }),
        }
    }

    /// Build from the links of positive sides only; `link(~e)` is the rotated square.
    pub fn from_pos(edges: Edges<E>, pos_link: impl Fn(&E) -> Square<E> + 'static) -> Self {
        Self::new(edges, move |side: &Side<E>| {
            let square = pos_link(&side.edge);
            if side.orientation {
                square
            } else {
                reverse_square(&square)
            }
        })
    }

    pub fn edges(&self) -> &Edges<E> {
        &self.inner.edges
    }

    pub fn is_finite(&self) -> bool {
        self.inner.edges.is_finite()
    }

    /// Identity comparison.
    pub fn same_as(&self, other: &Triangulation<E>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn link(&self, side: &Side<E>) -> Square<E> {
        self.inner
            .links
            .get_or_insert_with(side.clone(), || (self.inner.link)(side))
    }

    /// The triangle on the left of `side`.
    pub fn triangle(&self, side: &Side<E>) -> Triangle<E> {
        let [a, b, _, _] = self.link(side);
        Triangle::new(side.clone(), a, b)
    }

    /// The positive side of `edge` followed by its link.
    pub fn star(&self, edge: &E) -> [Side<E>; 5] {
        let side = Side::pos(edge.clone());
        let [a, b, c, d] = self.link(&side);
        [a, b, c, d, side]
    }

    /// A side is flippable unless its reverse sits in one of its own triangles.
    pub fn is_flippable(&self, side: &Side<E>) -> bool {
        self.link(side).iter().all(|s| s.edge != side.edge)
    }

    /// The next corner counter-clockwise around the vertex at the corner opposite `side`.
    pub fn corner_next(&self, side: &Side<E>) -> Side<E> {
        let [_, b, _, _] = self.link(side);
        let [_, next, _, _] = self.link(&!b);
        next
    }

    /// Inverse of [`Triangulation::corner_next`].
    pub fn corner_prev(&self, side: &Side<E>) -> Side<E> {
        let [a, _, _, _] = self.link(side);
        let [prev, _, _, _] = self.link(&!a);
        prev
    }

    /// Walk the corners around one vertex, starting at the corner opposite `start`.
    pub fn corner_walk(&self, start: &Side<E>) -> impl Iterator<Item = Side<E>> + '_ {
        std::iter::successors(Some(start.clone()), move |x| Some(self.corner_next(x)))
    }

    /// The corners around the vertex opposite `start` and whether the walk closed
    /// up within `limit` corners (vertices at infinity never close).
    pub fn vertex_orbit(&self, start: &Side<E>, limit: usize) -> (Vec<Side<E>>, bool) {
        let mut orbit = Vec::new();
        for x in self.corner_walk(start) {
            if !orbit.is_empty() && x == *start {
                return (orbit, true);
            }
            if orbit.len() >= limit {
                return (orbit, false);
            }
            orbit.push(x);
        }
        (orbit, false)
    }

    /// Cluster the triangles bordering `edges` into regions glued along those edges.
    pub fn triangle_regions(&self, edges: &[E]) -> Vec<Vec<Triangle<E>>> {
        let pairs: Vec<(Triangle<E>, Triangle<E>)> = edges
            .iter()
            .map(|e| {
                (
                    self.triangle(&Side::pos(e.clone())),
                    self.triangle(&Side::neg(e.clone())),
                )
            })
            .collect();
        let mut regions = UnionFind::new(
            pairs
                .iter()
                .flat_map(|(x, y)| [x.clone(), y.clone()]),
        );
        for (x, y) in &pairs {
            regions.union2(x, y);
        }
        regions.into_iter().collect()
    }

    /// Check that the links of the given edges fit together.
    pub fn check_local(&self, edges: impl IntoIterator<Item = E>) -> Result<(), TriangulationError> {
        for edge in edges {
            for side in [Side::pos(edge.clone()), Side::neg(edge)] {
                let square = self.link(&side);
                if self.link(&!&side) != reverse_square(&square) {
                    return Err(TriangulationError::inconsistent(
                        &side,
                        "link of the reverse side is not the rotated square",
                    ));
                }
                let [a, b, _, _] = square;
                if a == side || b == side || a == b {
                    return Err(TriangulationError::inconsistent(&side, "degenerate triangle"));
                }
                let [a0, a1, _, _] = self.link(&a);
                if a0 != b || a1 != side {
                    return Err(TriangulationError::inconsistent(
                        &side,
                        format!("triangle does not close up at {a}"),
                    ));
                }
                let [b0, b1, _, _] = self.link(&b);
                if b0 != side || b1 != a {
                    return Err(TriangulationError::inconsistent(
                        &side,
                        format!("triangle does not close up at {b}"),
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn flip_edge(&self, edge: E) -> Encoding<E> {
        self.flip(FlipSelector::Edge(edge))
    }

    pub fn flip_side(&self, side: &Side<E>) -> Encoding<E> {
        self.flip(FlipSelector::Sides([side.clone()].into_iter().collect()))
    }

    /// Relabel onto a fresh triangulation: `link'(x) = isom(link(inv_isom(x)))`.
    pub fn relabel(
        &self,
        isom: impl Fn(&Side<E>) -> Side<E> + 'static,
        inv_isom: impl Fn(&Side<E>) -> Side<E> + 'static,
    ) -> Encoding<E> {
        self.relabel_with(Rc::new(isom), Rc::new(inv_isom))
    }

    fn relabel_with(&self, isom: SideMap<E>, inv_isom: SideMap<E>) -> Encoding<E> {
        let target = {
            let source = self.clone();
            let isom = isom.clone();
            let inv_isom = inv_isom.clone();
            let edges = {
                let isom = isom.clone();
                self.edges().map(move |e| isom(&Side::pos(e.clone())).edge)
            };
            Triangulation::from_link_fn(
                edges,
                Rc::new(move |side: &Side<E>| source.link(&inv_isom(side)).map(|s| isom(&s))),
            )
        };
        self.relabel_onto_with(&target, isom, inv_isom)
    }

    /// Relabel onto an existing triangulation. The caller guarantees `isom` is
    /// an isomorphism from `self` to `target`.
    pub fn relabel_onto(
        &self,
        target: &Triangulation<E>,
        isom: impl Fn(&Side<E>) -> Side<E> + 'static,
        inv_isom: impl Fn(&Side<E>) -> Side<E> + 'static,
    ) -> Encoding<E> {
        self.relabel_onto_with(target, Rc::new(isom), Rc::new(inv_isom))
    }

    fn relabel_onto_with(
        &self,
        target: &Triangulation<E>,
        isom: SideMap<E>,
        inv_isom: SideMap<E>,
    ) -> Encoding<E> {
        let forward = {
            let target = target.clone();
            let (isom, inv_isom) = (isom.clone(), inv_isom.clone());
            Rc::new(move |lam: &Lamination<E>| relabel_lamination(lam, &target, &isom, &inv_isom))
        };
        let backward = {
            let source = self.clone();
            Rc::new(move |lam: &Lamination<E>| relabel_lamination(lam, &source, &inv_isom, &isom))
        };
        Move::new(self.clone(), target.clone(), MoveKind::Relabel, forward, backward).encode()
    }

    /// Relabel by finitely many side pairs; `~k -> ~v` is implied, other sides are fixed.
    pub fn relabel_map(&self, pairs: impl IntoIterator<Item = (Side<E>, Side<E>)>) -> Encoding<E> {
        let (isom, inv_isom) = side_maps(pairs);
        self.relabel_with(isom, inv_isom)
    }

    pub fn relabel_map_onto(
        &self,
        target: &Triangulation<E>,
        pairs: impl IntoIterator<Item = (Side<E>, Side<E>)>,
    ) -> Encoding<E> {
        let (isom, inv_isom) = side_maps(pairs);
        self.relabel_onto_with(target, isom, inv_isom)
    }

    /// The empty encoding on this triangulation.
    pub fn identity(&self) -> Encoding<E> {
        Encoding::identity(self.clone())
    }

    /// Compose a word of terms; the last term is applied first, so a word reads
    /// in the same order as the product of its encodings.
    pub fn encode(&self, terms: Vec<Term<E>>) -> Encoding<E> {
        let mut h = self.identity();
        for term in terms.into_iter().rev() {
            let at = h.target().clone();
            let step = match term {
                Term::Flip(selector) => at.flip(selector),
                Term::Edge(edge) => at.flip_edge(edge),
                Term::Relabel(isom, inv_isom) => at.relabel_with(isom, inv_isom),
                Term::RelabelMap(pairs) => at.relabel_map(pairs),
            };
            h = &step * &h;
        }
        h
    }
}

fn side_maps<E: EdgeLabel>(
    pairs: impl IntoIterator<Item = (Side<E>, Side<E>)>,
) -> (SideMap<E>, SideMap<E>) {
    let mut forward = BTreeMap::new();
    for (k, v) in pairs {
        forward.insert(!&k, !&v);
        forward.insert(k, v);
    }
    let backward: BTreeMap<Side<E>, Side<E>> =
        forward.iter().map(|(k, v)| (v.clone(), k.clone())).collect();
    let isom: SideMap<E> =
        Rc::new(move |s: &Side<E>| forward.get(s).cloned().unwrap_or_else(|| s.clone()));
    let inv_isom: SideMap<E> =
        Rc::new(move |s: &Side<E>| backward.get(s).cloned().unwrap_or_else(|| s.clone()));
    (isom, inv_isom)
}

/// Transport by relabeling: `weight'(e) = weight(inv_isom(+e))`, `support' = isom(support)`.
fn relabel_lamination<E: EdgeLabel>(
    lam: &Lamination<E>,
    onto: &Triangulation<E>,
    isom: &SideMap<E>,
    inv_isom: &SideMap<E>,
) -> Lamination<E> {
    let weight = {
        let lam = lam.clone();
        let inv_isom = inv_isom.clone();
        Rc::new(move |e: &E| lam.weight(&inv_isom(&Side::pos(e.clone())).edge))
    };
    let support = match lam.support() {
        Support::Finite(set) => Support::Finite(
            set.iter()
                .map(|e| isom(&Side::pos(e.clone())).edge)
                .collect(),
        ),
        Support::Unbounded(producer) => {
            let producer = producer.clone();
            let isom = isom.clone();
            Support::Unbounded(Rc::new(move || -> Box<dyn Iterator<Item = E>> {
                let isom = isom.clone();
                Box::new(producer().map(move |e| isom(&Side::pos(e)).edge))
            }))
        }
    };
    Lamination::from_parts(onto.clone(), weight, support)
}

#[cfg(test)]
mod tests;
