//! Measured laminations on lazy triangulations.
//!
//! Purpose
//! - A lamination is a weight query `edge -> i64` plus a support descriptor:
//!   either a finite set of edges (exactly the edges with nonzero weight) or a
//!   restartable producer for infinitely supported laminations.
//! - Negative weights encode arcs parallel to an edge; positive weights count
//!   transverse intersections.
//!
//! Why this design
//! - Finite versus unbounded support is a sum type ([`Support`]) so operations
//!   that need a finite support (equality, complexity, shortening) fail with a
//!   typed [`LaminationError`] instead of looping.
//! - Weights, dual weights and the short form are cached per lamination
//!   (`crate::memo`); arithmetic and transport build new laminations lazily on
//!   top of their operands.
//!
//! Layout
//! - `shorten.rs`: peripheral and parallel components, the shortening loop.
//! - `twist.rs`: Dehn twists (finite and localized infinite) and intersection numbers.

mod shorten;
mod twist;

pub use shorten::{Annulus, AnnulusShape, Component, ComponentKind, Short, ShortenCfg};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use std::rc::Rc;

use crate::memo::{Memo, Once};
use crate::triangulation::{EdgeLabel, EdgeProducer, Side, Triangulation};

/// Weight query of a lamination.
pub type WeightFn<E> = Rc<dyn Fn(&E) -> i64>;

/// Where a lamination can be nonzero.
#[derive(Clone)]
pub enum Support<E> {
    Finite(BTreeSet<E>),
    /// May repeat edges and may include edges of weight zero.
    Unbounded(EdgeProducer<E>),
}

impl<E: EdgeLabel> Support<E> {
    pub fn unbounded(producer: impl Fn() -> Box<dyn Iterator<Item = E>> + 'static) -> Self {
        Support::Unbounded(Rc::new(producer))
    }

    /// Restart the enumeration.
    pub fn iter(&self) -> Box<dyn Iterator<Item = E>> {
        match self {
            Support::Finite(set) => Box::new(set.clone().into_iter()),
            Support::Unbounded(producer) => producer(),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for Support<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Support::Finite(set) => write!(f, "Finite({set:?})"),
            Support::Unbounded(_) => write!(f, "Unbounded(..)"),
        }
    }
}

/// Errors surfaced by lamination operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LaminationError {
    /// The operation needs a finitely supported lamination.
    InfinitelySupported { operation: &'static str },
    /// Shortening stopped making progress.
    NotShortenable { reason: String },
    /// The lamination has arc components.
    NotAMulticurve,
}

impl LaminationError {
    pub(crate) fn not_shortenable(reason: impl Into<String>) -> Self {
        Self::NotShortenable {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for LaminationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InfinitelySupported { operation } => {
                write!(f, "{operation} needs a finitely supported lamination")
            }
            Self::NotShortenable { reason } => write!(f, "lamination is not shortenable: {reason}"),
            Self::NotAMulticurve => write!(f, "lamination is not a multicurve"),
        }
    }
}

impl std::error::Error for LaminationError {}

struct Inner<E: EdgeLabel> {
    triangulation: Triangulation<E>,
    weight: WeightFn<E>,
    support: Support<E>,
    weights: Memo<E, i64>,
    duals: Memo<Side<E>, i64>,
    short: Once<Result<Short<E>, LaminationError>>,
}

/// A measured lamination. Cheap to clone (shared handle).
pub struct Lamination<E: EdgeLabel> {
    inner: Rc<Inner<E>>,
}

impl<E: EdgeLabel> Clone for Lamination<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: EdgeLabel> Triangulation<E> {
    /// A lamination from a weight query and a support; a finite support is
    /// trimmed to the edges of nonzero weight.
    pub fn lamination(&self, weight: impl Fn(&E) -> i64 + 'static, support: Support<E>) -> Lamination<E> {
        let support = match support {
            Support::Finite(set) => Support::Finite(set.into_iter().filter(|e| weight(e) != 0).collect()),
            unbounded => unbounded,
        };
        Lamination::from_parts(self.clone(), Rc::new(weight), support)
    }

    /// A finitely supported lamination from explicit weights.
    pub fn lamination_from_weights(&self, weights: impl IntoIterator<Item = (E, i64)>) -> Lamination<E> {
        let map: BTreeMap<E, i64> = weights.into_iter().filter(|(_, w)| *w != 0).collect();
        let support = map.keys().cloned().collect();
        Lamination::from_parts(
            self.clone(),
            Rc::new(move |e: &E| map.get(e).copied().unwrap_or(0)),
            Support::Finite(support),
        )
    }

    pub fn empty_lamination(&self) -> Lamination<E> {
        Lamination::from_parts(self.clone(), Rc::new(|_: &E| 0), Support::Finite(BTreeSet::new()))
    }
}

impl<E: EdgeLabel> Lamination<E> {
    /// Trusted constructor: a finite support must be exactly the nonzero edges.
    pub(crate) fn from_parts(triangulation: Triangulation<E>, weight: WeightFn<E>, support: Support<E>) -> Self {
        Self {
            inner: Rc::new(Inner {
                triangulation,
                weight,
                support,
                weights: Memo::new(),
                duals: Memo::new(),
                short: Memo::new(),
            }),
        }
    }

    /// Same weights and support with empty caches.
    pub(crate) fn fresh(&self) -> Self {
        Self::from_parts(
            self.inner.triangulation.clone(),
            Rc::clone(&self.inner.weight),
            self.inner.support.clone(),
        )
    }

    pub fn triangulation(&self) -> &Triangulation<E> {
        &self.inner.triangulation
    }

    pub fn weight(&self, edge: &E) -> i64 {
        self.inner
            .weights
            .get_or_insert_with(edge.clone(), || (self.inner.weight)(edge))
    }

    pub fn side_weight(&self, side: &Side<E>) -> i64 {
        self.weight(&side.edge)
    }

    /// Number of strands cutting off the corner opposite `side` in its triangle.
    ///
    /// Negative when arcs terminate in that corner; rounded towards −∞ there.
    pub fn dual_weight(&self, side: &Side<E>) -> i64 {
        self.inner.duals.get_or_insert_with(side.clone(), || {
            let [a, b, _, _] = self.triangulation().link(side);
            let x = self.side_weight(side).max(0);
            let y = self.side_weight(&a).max(0);
            let z = self.side_weight(&b).max(0);
            let correction = (x + y - z).min(y + z - x).min(z + x - y).min(0);
            (y + z - x + correction).div_euclid(2)
        })
    }

    pub fn support(&self) -> &Support<E> {
        &self.inner.support
    }

    /// Restartable enumeration of the support.
    pub fn support_iter(&self) -> Box<dyn Iterator<Item = E>> {
        self.inner.support.iter()
    }

    pub fn is_finitely_supported(&self) -> bool {
        matches!(self.inner.support, Support::Finite(_))
    }

    /// Finitely supported with no edges; infinitely supported laminations are never empty.
    pub fn is_empty(&self) -> bool {
        match &self.inner.support {
            Support::Finite(set) => set.is_empty(),
            Support::Unbounded(_) => false,
        }
    }

    pub(crate) fn finite_support(&self, operation: &'static str) -> Result<&BTreeSet<E>, LaminationError> {
        match &self.inner.support {
            Support::Finite(set) => Ok(set),
            Support::Unbounded(_) => Err(LaminationError::InfinitelySupported { operation }),
        }
    }

    /// Supporting edges in increasing order.
    pub fn supporting_edges(&self) -> Result<Vec<E>, LaminationError> {
        Ok(self.finite_support("supporting_edges")?.iter().cloned().collect())
    }

    /// Both sides of every supporting edge, in increasing order.
    pub fn supporting_sides(&self) -> Result<Vec<Side<E>>, LaminationError> {
        Ok(self
            .finite_support("supporting_sides")?
            .iter()
            .flat_map(|e| [Side::neg(e.clone()), Side::pos(e.clone())])
            .collect())
    }

    pub fn to_map(&self) -> Result<BTreeMap<E, i64>, LaminationError> {
        Ok(self
            .finite_support("to_map")?
            .iter()
            .map(|e| (e.clone(), self.weight(e)))
            .collect())
    }

    /// Equal supports and equal weights on them.
    pub fn equals(&self, other: &Lamination<E>) -> Result<bool, LaminationError> {
        let ours = self.finite_support("equality")?;
        let theirs = other.finite_support("equality")?;
        Ok(ours == theirs && ours.iter().all(|e| self.weight(e) == other.weight(e)))
    }

    /// Total clamped weight, i.e. intersections with the triangulation.
    pub fn complexity(&self) -> Result<i64, LaminationError> {
        Ok(self
            .finite_support("complexity")?
            .iter()
            .map(|e| self.weight(e).max(0))
            .sum())
    }

    /// `e: w` pairs for the given edges.
    pub fn show(&self, edges: impl IntoIterator<Item = E>) -> String {
        edges
            .into_iter()
            .map(|e| format!("{e:?}: {}", self.weight(&e)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn scale(&self, k: i64) -> Lamination<E> {
        let lam = self.clone();
        let weight: WeightFn<E> = Rc::new(move |e: &E| k * lam.weight(e));
        let support = match &self.inner.support {
            Support::Finite(_) if k == 0 => Support::Finite(BTreeSet::new()),
            other => other.clone(),
        };
        Lamination::from_parts(self.triangulation().clone(), weight, support)
    }

    fn combine(&self, other: &Lamination<E>, sign: i64) -> Lamination<E> {
        assert!(
            self.triangulation().same_as(other.triangulation()),
            "laminations live on different triangulations"
        );
        let weight: WeightFn<E> = {
            let (a, b) = (self.clone(), other.clone());
            Rc::new(move |e: &E| a.weight(e) + sign * b.weight(e))
        };
        let support = match (&self.inner.support, &other.inner.support) {
            (Support::Finite(x), Support::Finite(y)) => {
                Support::Finite(x.union(y).filter(|e| weight(*e) != 0).cloned().collect())
            }
            _ => {
                let (a, b) = (self.clone(), other.clone());
                Support::unbounded(move || Box::new(a.support_iter().chain(b.support_iter())))
            }
        };
        Lamination::from_parts(self.triangulation().clone(), weight, support)
    }
}

impl<E: EdgeLabel> Add for &Lamination<E> {
    type Output = Lamination<E>;

    fn add(self, other: &Lamination<E>) -> Lamination<E> {
        self.combine(other, 1)
    }
}

impl<E: EdgeLabel> Sub for &Lamination<E> {
    type Output = Lamination<E>;

    fn sub(self, other: &Lamination<E>) -> Lamination<E> {
        self.combine(other, -1)
    }
}

impl<E: EdgeLabel> Neg for &Lamination<E> {
    type Output = Lamination<E>;

    fn neg(self) -> Lamination<E> {
        self.scale(-1)
    }
}

impl<E: EdgeLabel> Mul<&Lamination<E>> for i64 {
    type Output = Lamination<E>;

    fn mul(self, lam: &Lamination<E>) -> Lamination<E> {
        lam.scale(self)
    }
}

impl<E: EdgeLabel> fmt::Display for Lamination<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.support {
            Support::Finite(set) => write!(f, "{{{}}}", self.show(set.iter().cloned())),
            Support::Unbounded(_) => {
                let mut seen = BTreeSet::new();
                let head: Vec<E> = self
                    .support_iter()
                    .filter(|e| seen.insert(e.clone()))
                    .take(10)
                    .collect();
                write!(f, "{{{}, ...}}", self.show(head))
            }
        }
    }
}

impl<E: EdgeLabel> fmt::Debug for Lamination<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lamination{self}")
    }
}
