//! Edge labels, oriented sides and the closure types a triangulation is built from.
//!
//! Kept small and explicit so `mod.rs` (queries, relabelings) and `flip.rs`
//! (the diagonal swap) read as pure combinatorics.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::Hash;
use std::ops::Not;
use std::rc::Rc;

/// Anything usable as an (unoriented) edge label.
///
/// `Ord` makes every "pick one" choice deterministic: lowest label first.
pub trait EdgeLabel: Clone + Eq + Hash + Ord + fmt::Debug + 'static {}
impl<T: Clone + Eq + Hash + Ord + fmt::Debug + 'static> EdgeLabel for T {}

/// An oriented edge. Orders by edge, then `false < true`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Side<E> {
    pub edge: E,
    pub orientation: bool,
}

impl<E> Side<E> {
    pub fn new(edge: E, orientation: bool) -> Self {
        Self { edge, orientation }
    }

    pub fn pos(edge: E) -> Self {
        Self::new(edge, true)
    }

    pub fn neg(edge: E) -> Self {
        Self::new(edge, false)
    }
}

impl<E> Not for Side<E> {
    type Output = Side<E>;

    fn not(self) -> Side<E> {
        Side {
            edge: self.edge,
            orientation: !self.orientation,
        }
    }
}

impl<E: Clone> Not for &Side<E> {
    type Output = Side<E>;

    fn not(self) -> Side<E> {
        Side {
            edge: self.edge.clone(),
            orientation: !self.orientation,
        }
    }
}

impl<E: fmt::Debug> fmt::Display for Side<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.orientation { '+' } else { '-' };
        write!(f, "{sign}{:?}", self.edge)
    }
}

/// The link of a side `e`: `[a, b, c, d]` where `(e, a, b)` is the
/// counter-clockwise triangle containing `e` and `(~e, c, d)` the one containing `~e`.
pub type Square<E> = [Side<E>; 4];

/// Rotate a link to the link of the reverse side.
pub fn reverse_square<E: Clone>(square: &Square<E>) -> Square<E> {
    let [a, b, c, d] = square.clone();
    [c, d, a, b]
}

/// A triangle as a cyclically ordered triple of sides, rotated so the smallest side comes first.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triangle<E>([Side<E>; 3]);

impl<E: Ord + Clone> Triangle<E> {
    pub fn new(x: Side<E>, y: Side<E>, z: Side<E>) -> Self {
        let sides = [x, y, z];
        let k = (0..3)
            .min_by(|&i, &j| sides[i].cmp(&sides[j]))
            .unwrap_or(0);
        Triangle([
            sides[k].clone(),
            sides[(k + 1) % 3].clone(),
            sides[(k + 2) % 3].clone(),
        ])
    }

    pub fn sides(&self) -> &[Side<E>; 3] {
        &self.0
    }

    pub fn contains(&self, side: &Side<E>) -> bool {
        self.0.contains(side)
    }
}

impl<E: fmt::Debug> fmt::Display for Triangle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z] = &self.0;
        write!(f, "({x}, {y}, {z})")
    }
}

/// Link function: side to its square.
pub type LinkFn<E> = Rc<dyn Fn(&Side<E>) -> Square<E>>;
/// Bijection on sides (relabelings).
pub type SideMap<E> = Rc<dyn Fn(&Side<E>) -> Side<E>>;
/// Side selector for flips.
pub type SidePredicate<E> = Rc<dyn Fn(&Side<E>) -> bool>;
/// Restartable, possibly unbounded, enumeration of edges.
pub type EdgeProducer<E> = Rc<dyn Fn() -> Box<dyn Iterator<Item = E>>>;

/// The edges of a triangulation.
#[derive(Clone)]
pub enum Edges<E> {
    Finite(Vec<E>),
    Unbounded(EdgeProducer<E>),
}

impl<E: EdgeLabel> Edges<E> {
    pub fn unbounded(producer: impl Fn() -> Box<dyn Iterator<Item = E>> + 'static) -> Self {
        Edges::Unbounded(Rc::new(producer))
    }

    /// Restart the enumeration.
    pub fn iter(&self) -> Box<dyn Iterator<Item = E>> {
        match self {
            Edges::Finite(edges) => Box::new(edges.clone().into_iter()),
            Edges::Unbounded(producer) => producer(),
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Edges::Finite(_))
    }

    pub(crate) fn map(&self, f: impl Fn(&E) -> E + 'static) -> Self {
        match self {
            Edges::Finite(edges) => Edges::Finite(edges.iter().map(f).collect()),
            Edges::Unbounded(producer) => {
                let producer = producer.clone();
                let f = Rc::new(f);
                Edges::Unbounded(Rc::new(move || -> Box<dyn Iterator<Item = E>> {
                    let f = f.clone();
                    Box::new(producer().map(move |e| f(&e)))
                }))
            }
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for Edges<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edges::Finite(edges) => write!(f, "Finite({edges:?})"),
            Edges::Unbounded(_) => write!(f, "Unbounded(..)"),
        }
    }
}

/// Which sides a flip acts on. Normalized once into a [`SidePredicate`].
#[derive(Clone)]
pub enum FlipSelector<E> {
    Predicate(SidePredicate<E>),
    Sides(BTreeSet<Side<E>>),
    Edge(E),
}

impl<E: EdgeLabel> FlipSelector<E> {
    pub fn predicate(f: impl Fn(&Side<E>) -> bool + 'static) -> Self {
        FlipSelector::Predicate(Rc::new(f))
    }

    pub(crate) fn into_predicate(self) -> SidePredicate<E> {
        match self {
            FlipSelector::Predicate(p) => p,
            FlipSelector::Sides(sides) => Rc::new(move |s: &Side<E>| sides.contains(s)),
            FlipSelector::Edge(edge) => Rc::new(move |s: &Side<E>| s.orientation && s.edge == edge),
        }
    }

    /// The selected sides when they are known up front.
    pub(crate) fn finite_sides(&self) -> Option<Vec<Side<E>>> {
        match self {
            FlipSelector::Predicate(_) => None,
            FlipSelector::Sides(sides) => Some(sides.iter().cloned().collect()),
            FlipSelector::Edge(edge) => Some(vec![Side::pos(edge.clone())]),
        }
    }
}

/// One term of [`Triangulation::encode`](super::Triangulation::encode).
#[derive(Clone)]
pub enum Term<E> {
    Flip(FlipSelector<E>),
    /// `(isom, inv_isom)`.
    Relabel(SideMap<E>, SideMap<E>),
    /// Finite relabeling; unlisted sides are fixed and `~k -> ~v` is implied.
    RelabelMap(Vec<(Side<E>, Side<E>)>),
    /// Flip the positive side of this edge.
    Edge(E),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_reverse_is_an_involution() {
        let s = Side::pos(4_i64);
        assert_eq!(!s, Side::neg(4));
        assert_eq!(!!s, s);
        assert_eq!(!&s, Side::neg(4));
        assert_eq!(s.to_string(), "+4");
        assert_eq!((!s).to_string(), "-4");
    }

    #[test]
    fn sides_order_by_edge_then_orientation() {
        let mut v = vec![Side::pos(2_i64), Side::neg(2), Side::pos(1), Side::neg(-1)];
        v.sort();
        assert_eq!(
            v,
            vec![Side::neg(-1), Side::pos(1), Side::neg(2), Side::pos(2)]
        );
    }

    #[test]
    fn triangle_is_rotation_invariant() {
        let (x, y, z) = (Side::pos(3_i64), Side::neg(1), Side::pos(2));
        let t1 = Triangle::new(x, y, z);
        let t2 = Triangle::new(y, z, x);
        let t3 = Triangle::new(z, x, y);
        assert_eq!(t1, t2);
        assert_eq!(t2, t3);
        assert_eq!(t1.sides()[0], Side::neg(1));
        assert_ne!(t1, Triangle::new(x, z, y));
    }

    #[test]
    fn selectors_normalize() {
        let p = FlipSelector::Edge(5_i64).into_predicate();
        assert!(p(&Side::pos(5)));
        assert!(!p(&Side::neg(5)));
        let q = FlipSelector::Sides([Side::neg(1_i64)].into_iter().collect()).into_predicate();
        assert!(q(&Side::neg(1)));
        assert!(!q(&Side::pos(1)));
    }

    #[test]
    fn unbounded_edges_restart() {
        let edges = Edges::unbounded(|| Box::new(0_i64..));
        let first: Vec<i64> = edges.iter().take(3).collect();
        let again: Vec<i64> = edges.iter().take(3).collect();
        assert_eq!(first, again);
        let shifted: Vec<i64> = edges.map(|e| e + 10).iter().take(2).collect();
        assert_eq!(shifted, vec![10, 11]);
    }
}
