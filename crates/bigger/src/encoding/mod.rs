//! Moves and encodings: composable, invertible rewrites of triangulations.
//!
//! Purpose
//! - A [`Move`] is one elementary rewrite (a flip, a relabeling, or a localized
//!   twist) between two triangulations, together with how it transports
//!   laminations in both directions.
//! - An [`Encoding`] is a product of moves. As with function composition,
//!   `moves[0]` is applied last, so `source` is the source of the last move and
//!   `target` the target of the first.
//!
//! Why this design
//! - Source and target are stored explicitly, so the empty product is a genuine
//!   two-sided identity on its triangulation and slicing at any cut point knows
//!   which triangulation it sits on.
//! - Composing encodings whose triangulations do not match is a caller bug and
//!   panics through `*`; `try_compose` reports it as [`EncodingError`] instead.

use std::fmt;
use std::ops::{Mul, Not, Range};
use std::rc::Rc;

use crate::lamination::Lamination;
use crate::triangulation::{EdgeLabel, Triangulation};

/// Lamination transport of a move.
pub type ActionFn<E> = Rc<dyn Fn(&Lamination<E>) -> Lamination<E>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveKind {
    Flip,
    Relabel,
    Twist,
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveKind::Flip => write!(f, "flip"),
            MoveKind::Relabel => write!(f, "relabel"),
            MoveKind::Twist => write!(f, "twist"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodingError {
    /// `left.source` is not `right.target`.
    Mismatch { left: String, right: String },
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mismatch { left, right } => write!(
                f,
                "cannot compose: left source {left} is not right target {right}"
            ),
        }
    }
}

impl std::error::Error for EncodingError {}

/// One elementary rewrite.
pub struct Move<E: EdgeLabel> {
    source: Triangulation<E>,
    target: Triangulation<E>,
    kind: MoveKind,
    action: ActionFn<E>,
    inv_action: ActionFn<E>,
}

impl<E: EdgeLabel> Clone for Move<E> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            target: self.target.clone(),
            kind: self.kind,
            action: Rc::clone(&self.action),
            inv_action: Rc::clone(&self.inv_action),
        }
    }
}

impl<E: EdgeLabel> fmt::Debug for Move<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({}: {:?} -> {:?})", self.kind, self.source, self.target)
    }
}

impl<E: EdgeLabel> Move<E> {
    pub fn new(
        source: Triangulation<E>,
        target: Triangulation<E>,
        kind: MoveKind,
        action: ActionFn<E>,
        inv_action: ActionFn<E>,
    ) -> Self {
        Self {
            source,
            target,
            kind,
            action,
            inv_action,
        }
    }

    pub fn source(&self) -> &Triangulation<E> {
        &self.source
    }

    pub fn target(&self) -> &Triangulation<E> {
        &self.target
    }

    pub fn kind(&self) -> MoveKind {
        self.kind
    }

    pub fn inverse(&self) -> Move<E> {
        Move {
            source: self.target.clone(),
            target: self.source.clone(),
            kind: self.kind,
            action: Rc::clone(&self.inv_action),
            inv_action: Rc::clone(&self.action),
        }
    }

    pub fn apply(&self, lam: &Lamination<E>) -> Lamination<E> {
        assert!(
            lam.triangulation().same_as(&self.source),
            "lamination does not live on the source of this {} move",
            self.kind
        );
        (self.action)(lam)
    }

    pub fn encode(self) -> Encoding<E> {
        Encoding {
            source: self.source.clone(),
            target: self.target.clone(),
            moves: vec![self],
        }
    }
}

/// A product of moves; `moves[0]` is applied last.
pub struct Encoding<E: EdgeLabel> {
    source: Triangulation<E>,
    target: Triangulation<E>,
    moves: Vec<Move<E>>,
}

impl<E: EdgeLabel> Clone for Encoding<E> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            target: self.target.clone(),
            moves: self.moves.clone(),
        }
    }
}

impl<E: EdgeLabel> fmt::Debug for Encoding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoding")
            .field("source", &self.source)
            .field("target", &self.target)
            .field("moves", &self.moves.iter().map(|m| m.kind).collect::<Vec<_>>())
            .finish()
    }
}

impl<E: EdgeLabel> fmt::Display for Encoding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<String> = self.moves.iter().map(|m| m.kind.to_string()).collect();
        write!(f, "Encoding[{}]", kinds.join(" * "))
    }
}

impl<E: EdgeLabel> Encoding<E> {
    /// The empty product on `triangulation`.
    pub fn identity(triangulation: Triangulation<E>) -> Self {
        Self {
            source: triangulation.clone(),
            target: triangulation,
            moves: Vec::new(),
        }
    }

    pub fn source(&self) -> &Triangulation<E> {
        &self.source
    }

    pub fn target(&self) -> &Triangulation<E> {
        &self.target
    }

    pub fn moves(&self) -> &[Move<E>] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Source and target are the same triangulation.
    pub fn is_mapping_class(&self) -> bool {
        self.source.same_as(&self.target)
    }

    /// The triangulation between `moves[k - 1]` and `moves[k]`.
    pub fn cut(&self, k: usize) -> Triangulation<E> {
        assert!(k <= self.moves.len(), "cut {k} out of range");
        match self.moves.get(k) {
            Some(m) => m.target.clone(),
            None => self.source.clone(),
        }
    }

    pub fn get(&self, i: usize) -> Option<Encoding<E>> {
        self.moves.get(i).map(|m| m.clone().encode())
    }

    /// The sub-product `moves[range]`; an empty range is the identity at that cut.
    pub fn slice(&self, range: Range<usize>) -> Encoding<E> {
        assert!(
            range.start <= range.end && range.end <= self.moves.len(),
            "slice {range:?} out of range for {} moves",
            self.moves.len()
        );
        if range.is_empty() {
            return Encoding::identity(self.cut(range.start));
        }
        Encoding {
            source: self.cut(range.end),
            target: self.cut(range.start),
            moves: self.moves[range].to_vec(),
        }
    }

    pub fn inverse(&self) -> Encoding<E> {
        Encoding {
            source: self.target.clone(),
            target: self.source.clone(),
            moves: self.moves.iter().rev().map(Move::inverse).collect(),
        }
    }

    /// `self * other`, or an error when `self.source` is not `other.target`.
    pub fn try_compose(&self, other: &Encoding<E>) -> Result<Encoding<E>, EncodingError> {
        if !self.source.same_as(&other.target) {
            return Err(EncodingError::Mismatch {
                left: format!("{:?}", self.source),
                right: format!("{:?}", other.target),
            });
        }
        let mut moves = self.moves.clone();
        moves.extend(other.moves.iter().cloned());
        Ok(Encoding {
            source: other.source.clone(),
            target: self.target.clone(),
            moves,
        })
    }

    /// `n`-fold product; `pow(0)` is the identity on the source and negative
    /// powers invert.
    pub fn pow(&self, n: i64) -> Encoding<E> {
        if n == 0 {
            return Encoding::identity(self.source.clone());
        }
        let base = if n < 0 { self.inverse() } else { self.clone() };
        let mut out = base.clone();
        for _ in 1..n.unsigned_abs() {
            out = &out * &base;
        }
        out
    }

    /// `~other * self * other`.
    pub fn conjugate_by(&self, other: &Encoding<E>) -> Encoding<E> {
        &(&other.inverse() * self) * other
    }

    /// Transport `lam` through every move, last move first.
    pub fn apply(&self, lam: &Lamination<E>) -> Lamination<E> {
        assert!(
            lam.triangulation().same_as(&self.source),
            "lamination does not live on the source of this encoding"
        );
        if lam.is_empty() {
            return self.target.empty_lamination();
        }
        let mut out = lam.clone();
        for m in self.moves.iter().rev() {
            out = m.apply(&out);
        }
        out
    }
}

impl<'b, E: EdgeLabel> Mul<&'b Encoding<E>> for &Encoding<E> {
    type Output = Encoding<E>;

    fn mul(self, other: &'b Encoding<E>) -> Encoding<E> {
        match self.try_compose(other) {
            Ok(out) => out,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<E: EdgeLabel> Mul for Encoding<E> {
    type Output = Encoding<E>;

    fn mul(self, other: Encoding<E>) -> Encoding<E> {
        &self * &other
    }
}

impl<E: EdgeLabel> Not for &Encoding<E> {
    type Output = Encoding<E>;

    fn not(self) -> Encoding<E> {
        self.inverse()
    }
}

impl<E: EdgeLabel> Not for Encoding<E> {
    type Output = Encoding<E>;

    fn not(self) -> Encoding<E> {
        self.inverse()
    }
}
