//! Short forms of finitely supported laminations.
//!
//! A lamination is short when, after removing its peripheral part (curves
//! around single vertices), what remains splits into arcs parallel to edges and
//! curves running around annuli formed by two triangles. Shortening searches
//! for flips that make a lamination short and records them as a conjugator.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::{Lamination, LaminationError};
use crate::encoding::Encoding;
use crate::triangulation::{EdgeLabel, Side, Triangulation};

/// Shortening configuration.
#[derive(Clone, Copy, Debug)]
pub struct ShortenCfg {
    /// Consecutive flips without a drop in complexity before giving up.
    pub stall_limit: usize,
}

impl Default for ShortenCfg {
    fn default() -> Self {
        Self { stall_limit: 3 }
    }
}

/// Which side of the core's triangle closes the annulus up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnnulusShape {
    /// `link(core) = [a, b, ~a, d]`; the curve crosses `core` and `a`.
    Leading,
    /// `link(core) = [a, b, c, ~b]`; the curve crosses `core` and `b`.
    Trailing,
}

/// Two triangles glued into an annulus along `core` and `partner`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Annulus<E> {
    pub core: Side<E>,
    pub partner: Side<E>,
    pub shape: AnnulusShape,
}

impl<E: EdgeLabel> Annulus<E> {
    /// The two edges crossed by the core curve, in increasing order.
    pub fn edges(&self) -> (E, E) {
        let (x, y) = (self.core.edge.clone(), self.partner.edge.clone());
        if x <= y {
            (x, y)
        } else {
            (y, x)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComponentKind<E> {
    /// A curve around a single vertex.
    Peripheral,
    /// An arc parallel to this edge.
    Arc(E),
    /// The core curve of an annulus.
    Curve(Annulus<E>),
}

/// A unit lamination with its multiplicity.
#[derive(Clone, Debug)]
pub struct Component<E: EdgeLabel> {
    pub lamination: Lamination<E>,
    pub multiplicity: i64,
    pub kind: ComponentKind<E>,
}

impl<E: EdgeLabel> Component<E> {
    pub fn measured(&self) -> Lamination<E> {
        self.lamination.scale(self.multiplicity)
    }

    fn same_place(&self, other: &Component<E>) -> bool {
        match (&self.kind, &other.kind) {
            (ComponentKind::Arc(x), ComponentKind::Arc(y)) => x == y,
            (ComponentKind::Curve(x), ComponentKind::Curve(y)) => x.edges() == y.edges(),
            _ => false,
        }
    }
}

/// Result of shortening: `conjugator` maps the original lamination to `lamination`,
/// which is the sum of `components`.
#[derive(Clone, Debug)]
pub struct Short<E: EdgeLabel> {
    pub lamination: Lamination<E>,
    pub conjugator: Encoding<E>,
    pub components: Vec<Component<E>>,
}

/// `Σ multiplicity · component` on `triangulation`.
pub fn assemble<E: EdgeLabel>(triangulation: &Triangulation<E>, components: &[Component<E>]) -> Lamination<E> {
    components
        .iter()
        .fold(triangulation.empty_lamination(), |acc, c| &acc + &c.measured())
}

impl<E: EdgeLabel> Lamination<E> {
    /// Curves around single vertices, one per vertex whose corners all carry strands.
    pub fn peripheral_components(&self) -> Result<Vec<Component<E>>, LaminationError> {
        let t = self.triangulation();
        let sides = self
            .finite_support("peripheral")
            .map(|set| set.iter().flat_map(|e| [Side::neg(e.clone()), Side::pos(e.clone())]))?;
        let mut corners = BTreeSet::new();
        for side in sides {
            let [a, b, _, _] = t.link(&side);
            corners.extend([side, a, b]);
        }
        let limit = corners.len() + 1;
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for start in &corners {
            if seen.contains(start) || self.dual_weight(start) <= 0 {
                continue;
            }
            let (orbit, closed) = t.vertex_orbit(start, limit);
            seen.extend(orbit.iter().cloned());
            if !closed {
                continue;
            }
            let multiplicity = orbit.iter().map(|x| self.dual_weight(x)).min().unwrap_or(0);
            if multiplicity <= 0 {
                continue;
            }
            let mut weights = BTreeMap::new();
            for x in &orbit {
                let [_, b, _, _] = t.link(x);
                *weights.entry(b.edge).or_insert(0) += 1;
            }
            out.push(Component {
                lamination: t.lamination_from_weights(weights),
                multiplicity,
                kind: ComponentKind::Peripheral,
            });
        }
        Ok(out)
    }

    /// The maximal peripheral sublamination.
    pub fn peripheral(&self) -> Result<Lamination<E>, LaminationError> {
        Ok(assemble(self.triangulation(), &self.peripheral_components()?))
    }

    /// The annulus component with core `side`, if `side` borders an annulus
    /// whose two edges carry equal weight and some strands run round it.
    pub(crate) fn annulus_at(&self, side: &Side<E>) -> Option<Component<E>> {
        let t = self.triangulation();
        let weight = self.side_weight(side);
        if weight <= 0 || !t.is_flippable(side) {
            return None;
        }
        let [a, b, c, d] = t.link(side);
        if a.edge == b.edge {
            return None;
        }
        let (partner, shape, strands) = if c == !&a && self.side_weight(&a) == weight {
            (a, AnnulusShape::Leading, self.dual_weight(&b) - self.dual_weight(&!side))
        } else if d == !&b && self.side_weight(&b) == weight {
            (b, AnnulusShape::Trailing, self.dual_weight(&a) - self.dual_weight(&!side))
        } else {
            return None;
        };
        let multiplicity = strands.min(weight);
        if multiplicity <= 0 {
            return None;
        }
        Some(Component {
            lamination: t.lamination_from_weights([(side.edge.clone(), 1), (partner.edge.clone(), 1)]),
            multiplicity,
            kind: ComponentKind::Curve(Annulus {
                core: side.clone(),
                partner,
                shape,
            }),
        })
    }

    /// Arcs parallel to edges (negative weights) and annulus core curves.
    pub fn parallel_components(&self) -> Result<Vec<Component<E>>, LaminationError> {
        let t = self.triangulation();
        let mut out = Vec::new();
        for edge in self.finite_support("parallel_components")? {
            let w = self.weight(edge);
            if w < 0 {
                out.push(Component {
                    lamination: t.lamination_from_weights([(edge.clone(), -1)]),
                    multiplicity: -w,
                    kind: ComponentKind::Arc(edge.clone()),
                });
            }
        }
        let mut seen = BTreeSet::new();
        for side in self.supporting_sides()? {
            if let Some(component) = self.annulus_at(&side) {
                if let ComponentKind::Curve(annulus) = &component.kind {
                    if seen.insert(annulus.edges()) {
                        out.push(component);
                    }
                }
            }
        }
        Ok(out)
    }

    /// Peripheral and parallel components, extracted one at a time, and what is left over.
    pub(crate) fn split_short(&self) -> Result<(Vec<Component<E>>, Lamination<E>), LaminationError> {
        let mut components = self.peripheral_components()?;
        let mut rest = self - &assemble(self.triangulation(), &components);
        loop {
            let Some(found) = rest.parallel_components()?.into_iter().next() else {
                break;
            };
            rest = &rest - &found.measured();
            match components.iter_mut().find(|c| c.same_place(&found)) {
                Some(existing) => existing.multiplicity += found.multiplicity,
                None => components.push(found),
            }
        }
        Ok((components, rest))
    }

    pub fn is_short(&self) -> Result<bool, LaminationError> {
        Ok(self.split_short()?.1.is_empty())
    }

    /// Whether flipping `side` simplifies the lamination locally: the corner
    /// opposite it holds terminating arcs, or is empty while both other corners
    /// of its triangle carry strands.
    pub fn is_improving(&self, side: &Side<E>) -> bool {
        let t = self.triangulation();
        if !t.is_flippable(side) {
            return false;
        }
        let [a, b, _, _] = t.link(side);
        let ed = self.dual_weight(side);
        ed < 0 || (ed == 0 && self.dual_weight(&a) > 0 && self.dual_weight(&b) > 0)
    }

    /// First improving side among `priority`, then among the supporting sides in increasing order.
    pub fn improving_side(&self, priority: &[Side<E>]) -> Result<Option<Side<E>>, LaminationError> {
        let sides = self.supporting_sides()?;
        Ok(priority
            .iter()
            .chain(sides.iter())
            .find(|s| self.is_improving(s))
            .cloned())
    }

    /// Shorten with the default configuration; the result is cached.
    pub fn shorten(&self) -> Result<Short<E>, LaminationError> {
        self.inner
            .short
            .get_or_insert_with((), || self.shorten_with(&ShortenCfg::default()))
    }

    /// Greedy improving flips first, then [`Lamination::untangle`] for whatever they leave.
    pub fn shorten_with(&self, cfg: &ShortenCfg) -> Result<Short<E>, LaminationError> {
        self.finite_support("shorten")?;
        let mut lam = self.fresh();
        let mut conjugator = lam.triangulation().identity();
        let mut complexity = lam.complexity()?;
        let mut priority: Vec<Side<E>> = Vec::new();
        let mut stalled = 0;
        loop {
            let (components, rest) = lam.split_short()?;
            if rest.is_empty() {
                debug!(
                    flips = conjugator.len(),
                    components = components.len(),
                    complexity,
                    "lamination is short"
                );
                return Ok(Short {
                    lamination: lam,
                    conjugator,
                    components,
                });
            }
            let Some(side) = rest.improving_side(&priority)? else {
                break;
            };
            let step = lam.triangulation().flip_side(&side);
            lam = step.apply(&lam);
            conjugator = &step * &conjugator;
            priority = step.target().link(&side).to_vec();
            let next = lam.complexity()?;
            stalled = if next < complexity { 0 } else { stalled + 1 };
            debug!(side = %side, complexity = next, stalled, "improving flip");
            complexity = next;
            if stalled > cfg.stall_limit {
                break;
            }
        }

        let untangle = lam.untangle(cfg)?;
        lam = untangle.apply(&lam);
        conjugator = &untangle * &conjugator;
        let (components, rest) = lam.split_short()?;
        if !rest.is_empty() {
            return Err(LaminationError::not_shortenable(format!(
                "{rest} is left over after untangling to {lam}"
            )));
        }
        debug!(
            flips = conjugator.len(),
            components = components.len(),
            complexity = lam.complexity()?,
            "lamination is short"
        );
        Ok(Short {
            lamination: lam,
            conjugator,
            components,
        })
    }

    /// Flips after which every component is short.
    ///
    /// Arc components are flipped into edges. A curve with a vertex next to
    /// each of its sides is flipped into an annulus by turning two loops into
    /// edges: each loop leaves that vertex, runs once round the curve and
    /// comes back. Curves are handled in rounds since a curve can only see a
    /// vertex once the curves between them have been pulled tight.
    pub fn untangle(&self, cfg: &ShortenCfg) -> Result<Encoding<E>, LaminationError> {
        let rest = self - &self.peripheral()?;
        let (mut current, mut arcs) = rest.unit_components()?;
        let mut flips = self.triangulation().identity();
        let mut round = 0;
        loop {
            round += 1;
            let mut pending = 0;
            let mut loops: BTreeMap<E, i64> = BTreeMap::new();
            for curve in current.traced_components()? {
                if !curve.closed || current.is_annulus_core(&curve.weights) {
                    continue;
                }
                pending += 1;
                if let Some(pair) = current.side_loops(&curve) {
                    for (edge, w) in pair.into_iter().flatten() {
                        *loops.entry(edge).or_insert(0) += w;
                    }
                }
            }
            if pending == 0 && arcs.complexity()? == 0 {
                debug!(rounds = round, flips = flips.len(), "untangled");
                return Ok(flips);
            }
            if !loops.is_empty() {
                arcs = &arcs + &current.triangulation().lamination_from_weights(loops);
            }
            let (image, step) = arcs.flip_to_edges(cfg)?;
            debug!(round, pending, flips = step.len(), "untangling round");
            if step.is_empty() {
                return Err(LaminationError::not_shortenable(format!(
                    "no vertex is next to both sides of a curve in {current}"
                )));
            }
            current = step.apply(&current);
            arcs = image;
            flips = &step * &flips;
        }
    }

    /// Flip until this multiarc is a union of edges, always taking the flip
    /// that leaves the least complexity.
    pub(crate) fn flip_to_edges(&self, cfg: &ShortenCfg) -> Result<(Lamination<E>, Encoding<E>), LaminationError> {
        let mut arcs = self.clone();
        let mut flips = self.triangulation().identity();
        let mut complexity = arcs.complexity()?;
        let mut stalled = 0;
        while complexity > 0 {
            let t = arcs.triangulation().clone();
            let mut best: Option<(i64, Encoding<E>, Lamination<E>)> = None;
            for edge in arcs.supporting_edges()? {
                let side = Side::pos(edge.clone());
                if arcs.weight(&edge) <= 0 || !t.is_flippable(&side) {
                    continue;
                }
                let step = t.flip_side(&side);
                let image = step.apply(&arcs);
                let next = image.complexity()?;
                if best.as_ref().map_or(true, |(c, _, _)| next < *c) {
                    best = Some((next, step, image));
                }
            }
            let Some((next, step, image)) = best else {
                return Err(LaminationError::not_shortenable(format!("no arc of {arcs} crosses a flippable edge")));
            };
            stalled = if next < complexity { 0 } else { stalled + 1 };
            if stalled > cfg.stall_limit {
                return Err(LaminationError::not_shortenable(format!(
                    "{stalled} flips without progress at {arcs}; not a non-isolating curve"
                )));
            }
            arcs = image;
            flips = &step * &flips;
            complexity = next;
        }
        Ok((arcs, flips))
    }

    /// One copy of every traced component together with the arcs parallel to
    /// edges, and the multiarc made of just the arcs.
    fn unit_components(&self) -> Result<(Lamination<E>, Lamination<E>), LaminationError> {
        let t = self.triangulation();
        let parallel: BTreeMap<E, i64> = self
            .to_map()?
            .into_iter()
            .filter(|(_, w)| *w < 0)
            .map(|(e, _)| (e, -1))
            .collect();
        let (mut unit, mut arcs) = (parallel.clone(), parallel);
        let mut classes = BTreeSet::new();
        for component in self.traced_components()? {
            if !classes.insert((component.closed, component.weights.clone())) {
                continue;
            }
            for (edge, w) in &component.weights {
                *unit.entry(edge.clone()).or_insert(0) += w;
                if !component.closed {
                    *arcs.entry(edge.clone()).or_insert(0) += w;
                }
            }
        }
        Ok((t.lamination_from_weights(unit), t.lamination_from_weights(arcs)))
    }

    fn is_annulus_core(&self, weights: &BTreeMap<E, i64>) -> bool {
        if weights.len() != 2 || weights.values().any(|w| *w != 1) {
            return false;
        }
        let curve = self.triangulation().lamination_from_weights(weights.clone());
        weights
            .keys()
            .flat_map(|e| [Side::pos(e.clone()), Side::neg(e.clone())])
            .any(|side| curve.annulus_at(&side).is_some())
    }

    /// Loops round `curve` from a vertex on each of its sides.
    ///
    /// A vertex sees a side of the curve when the crossing of some edge
    /// nearest that vertex belongs to the curve.
    fn side_loops(&self, curve: &Traced<E>) -> Option<[BTreeMap<E, i64>; 2]> {
        let (mut left, mut right) = (None, None);
        for (side, index) in &curve.entries {
            if left.is_none() && *index == 0 {
                left = self.loop_around(&curve.weights, side);
            }
            if right.is_none() && *index == self.side_weight(side) - 1 {
                right = self.loop_around(&curve.weights, &!side);
            }
            if let (Some(l), Some(r)) = (&left, &right) {
                return Some([l.clone(), r.clone()]);
            }
        }
        None
    }

    /// The arc from the start of `side` once round `curve` and back, where the
    /// crossing of `side` nearest its start belongs to `curve`.
    ///
    /// The loop crosses every edge the curve crosses, except for the run of
    /// edges at that vertex cut off together with `side`.
    fn loop_around(&self, curve: &BTreeMap<E, i64>, side: &Side<E>) -> Option<BTreeMap<E, i64>> {
        let t = self.triangulation();
        let [first, _, _, _] = t.link(side);
        let mut crossed = vec![side.clone()];
        let mut corner = t.corner_next(&first);
        while self.dual_weight(&corner) > 0 {
            if corner == first {
                return None;
            }
            let [_, b, _, _] = t.link(&corner);
            crossed.push(b);
            corner = t.corner_next(&corner);
        }
        let mut corner = first.clone();
        while self.dual_weight(&corner) > 0 {
            let [a, _, _, _] = t.link(&corner);
            crossed.push(a);
            corner = t.corner_prev(&corner);
            if corner == first {
                return None;
            }
        }
        let mut weights = curve.clone();
        for side in crossed {
            *weights.entry(side.edge).or_insert(0) -= 1;
        }
        if weights.values().any(|w| *w < 0) {
            return None;
        }
        weights.retain(|_, w| *w != 0);
        Some(weights)
    }
}

/// A strand entering the triangle on the left of a side, at that side's
/// `index`-th crossing counted from its start.
pub(crate) type Entry<E> = (Side<E>, i64);

/// One component of a lamination, found by following its strands.
#[derive(Clone, Debug)]
pub(crate) struct Traced<E> {
    pub weights: BTreeMap<E, i64>,
    /// Crossings as `(edge, index from the start of the positive side)`.
    pub crossings: BTreeSet<(E, i64)>,
    /// The entries of a closed curve in order; empty for arcs.
    pub entries: Vec<Entry<E>>,
    pub closed: bool,
}

impl<E: EdgeLabel> Lamination<E> {
    /// Where a strand entering at `entry` enters the next triangle, or `None`
    /// when it ends at the vertex opposite the entry side.
    ///
    /// Along `side` (from `u` to `v`, opposite vertex `x`) come first the
    /// strands round `u`, then those ending at `x`, then those round `v`.
    fn strand_exit(&self, (side, index): &Entry<E>) -> Option<Entry<E>> {
        let t = self.triangulation();
        let [a, b, _, _] = t.link(side);
        let round_u = self.dual_weight(&a).max(0);
        let ending = (-self.dual_weight(side)).max(0);
        if *index < round_u {
            return Some((!&b, *index));
        }
        if *index < round_u + ending {
            return None;
        }
        let from_v = self.side_weight(side).max(0) - 1 - index;
        Some((!&a, self.side_weight(&a).max(0) - 1 - from_v))
    }

    fn crossing_of(&self, (side, index): &Entry<E>) -> (E, i64) {
        let index = if side.orientation {
            *index
        } else {
            self.side_weight(side).max(0) - 1 - index
        };
        (side.edge.clone(), index)
    }

    /// Follow a strand from `entry` until it closes up or reaches a vertex.
    fn follow(&self, entry: &Entry<E>, limit: usize) -> Result<(Vec<Entry<E>>, bool), LaminationError> {
        let mut entries = vec![entry.clone()];
        loop {
            let Some(next) = self.strand_exit(entries.last().unwrap_or(entry)) else {
                return Ok((entries, false));
            };
            if next == *entry {
                return Ok((entries, true));
            }
            if entries.len() >= limit {
                return Err(LaminationError::not_shortenable(format!(
                    "the strand through {} does not close up within {limit} crossings",
                    entry.0
                )));
            }
            entries.push(next);
        }
    }

    /// The component through the `index`-th crossing of `edge`.
    pub(crate) fn trace(&self, edge: &E, index: i64, limit: usize) -> Result<Traced<E>, LaminationError> {
        let (mut entries, closed) = self.follow(&(Side::pos(edge.clone()), index), limit)?;
        if !closed {
            let back = self.weight(edge) - 1 - index;
            let (backward, _) = self.follow(&(Side::neg(edge.clone()), back), limit)?;
            entries.extend(backward);
        }
        let crossings: BTreeSet<(E, i64)> = entries.iter().map(|entry| self.crossing_of(entry)).collect();
        let mut weights = BTreeMap::new();
        for (e, _) in &crossings {
            *weights.entry(e.clone()).or_insert(0) += 1;
        }
        if !closed {
            entries.clear();
        }
        Ok(Traced {
            weights,
            crossings,
            entries,
            closed,
        })
    }

    /// Every component crossing an edge, one per strand.
    pub(crate) fn traced_components(&self) -> Result<Vec<Traced<E>>, LaminationError> {
        let limit = 4 * usize::try_from(self.complexity()?).unwrap_or(0) + 4;
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for edge in self.supporting_edges()? {
            for index in 0..self.weight(&edge).max(0) {
                if seen.contains(&(edge.clone(), index)) {
                    continue;
                }
                let component = self.trace(&edge, index, limit)?;
                seen.extend(component.crossings.iter().cloned());
                out.push(component);
            }
        }
        Ok(out)
    }
}
