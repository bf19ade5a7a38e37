//! Dehn twists about multicurves and geometric intersection numbers.
//!
//! A twist about an annulus core is one flip of the core followed by the
//! relabeling that carries the flipped square back onto the original
//! triangulation. Finite multicurves are shortened first and the product of
//! annulus twists is conjugated back. Infinitely supported multicurves give a
//! single move that, for every queried edge, twists only about the whole
//! components crossing that edge's star.

use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use tracing::trace;

use super::shorten::{Annulus, AnnulusShape, Component, ComponentKind};
use super::{Lamination, LaminationError, Support, WeightFn};
use crate::encoding::{ActionFn, Encoding, Move, MoveKind};
use crate::memo::Memo;
use crate::triangulation::{EdgeLabel, Triangulation};

impl<E: EdgeLabel> Annulus<E> {
    /// One right Dehn twist about the core, as a mapping class of `triangulation`.
    pub fn twist(&self, triangulation: &Triangulation<E>) -> Encoding<E> {
        let step = triangulation.flip_side(&self.core);
        let (e, p) = (self.core.clone(), self.partner.clone());
        let pairs = match self.shape {
            AnnulusShape::Leading => vec![(e.clone(), !&p), (p, !&e)],
            AnnulusShape::Trailing => vec![(e.clone(), p.clone()), (p, !&e)],
        };
        &step.target().relabel_map_onto(triangulation, pairs) * &step
    }
}

/// `Π twist(annulus)^(power · multiplicity)` on `triangulation`.
fn annulus_product<E: EdgeLabel>(
    triangulation: &Triangulation<E>,
    annuli: &[(Annulus<E>, i64)],
    power: i64,
) -> Encoding<E> {
    annuli.iter().fold(triangulation.identity(), |acc, (annulus, m)| {
        &acc * &annulus.twist(triangulation).pow(power * m)
    })
}

fn curves_only<E: EdgeLabel>(components: &[Component<E>]) -> Result<Vec<(Annulus<E>, i64)>, LaminationError> {
    let mut annuli = Vec::new();
    for c in components {
        match &c.kind {
            ComponentKind::Peripheral => {}
            ComponentKind::Arc(_) => return Err(LaminationError::NotAMulticurve),
            ComponentKind::Curve(annulus) => annuli.push((annulus.clone(), c.multiplicity)),
        }
    }
    Ok(annuli)
}

impl<E: EdgeLabel> Lamination<E> {
    /// The `power`-th Dehn twist about this multicurve.
    ///
    /// Finitely supported: a mapping class of this lamination's triangulation.
    /// Infinitely supported: a single localized twist move. Every component
    /// must be a closed curve; this is checked lazily as edges are queried.
    pub fn twist(&self, power: i64) -> Result<Encoding<E>, LaminationError> {
        if !self.is_finitely_supported() {
            return Ok(self.localized_twist(power));
        }
        let short = self.shorten()?;
        let annuli = curves_only(&short.components)?;
        let twist = annulus_product(short.lamination.triangulation(), &annuli, power);
        Ok(twist.conjugate_by(&short.conjugator))
    }

    fn localized_twist(&self, power: i64) -> Encoding<E> {
        let t = self.triangulation().clone();
        let forward = localized_action(self.clone(), power);
        let backward = localized_action(self.clone(), -power);
        Move::new(t.clone(), t, MoveKind::Twist, forward, backward).encode()
    }

    /// The components of this multicurve that cross any of `edges`, each
    /// followed round to where it closes up.
    ///
    /// Panics when a strand does not close up within [`LOCAL_TRACE_LIMIT`] crossings.
    fn crossing_components(&self, edges: impl IntoIterator<Item = E>) -> BTreeMap<E, i64> {
        let mut seen = BTreeSet::new();
        let mut restriction = BTreeMap::new();
        for edge in edges {
            let w = self.weight(&edge);
            if w < 0 {
                restriction.insert(edge, w);
                continue;
            }
            for index in 0..w {
                if seen.contains(&(edge.clone(), index)) {
                    continue;
                }
                let component = match self.trace(&edge, index, LOCAL_TRACE_LIMIT) {
                    Ok(component) => component,
                    Err(err) => panic!("cannot localize the twist at {edge:?}: {err}"),
                };
                seen.extend(component.crossings.iter().cloned());
                for (e, k) in component.weights {
                    *restriction.entry(e).or_insert(0) += k;
                }
            }
        }
        restriction
    }

    /// Geometric intersection number of this multicurve with `other`.
    ///
    /// Each annulus component adds half the complexity gained by one more twist
    /// of the shortened `other` once twisting has saturated.
    pub fn intersection(&self, other: &Lamination<E>) -> Result<i64, LaminationError> {
        other.finite_support("intersection")?;
        let short = self.shorten()?;
        let annuli = curves_only(&short.components)?;
        let t = short.lamination.triangulation();
        let image = short.conjugator.apply(other);
        let saturation = image.complexity()? + 2;
        let mut total = 0;
        for (annulus, multiplicity) in &annuli {
            let twist = annulus.twist(t);
            let before = twist.pow(saturation).apply(&image);
            let after = twist.apply(&before);
            total += multiplicity * (after.complexity()? - before.complexity()?) / 2;
        }
        Ok(total)
    }
}

/// Longest component followed when localizing a twist about an infinite multicurve.
const LOCAL_TRACE_LIMIT: usize = 1 << 16;

type TwistCache<E> = Rc<Memo<Vec<(E, i64)>, Encoding<E>>>;

/// The twist about the components of `curves` crossing `edges`.
fn local_twist<E: EdgeLabel>(
    curves: &Lamination<E>,
    cache: &TwistCache<E>,
    edges: impl IntoIterator<Item = E>,
    power: i64,
) -> Encoding<E> {
    let restriction = curves.crossing_components(edges);
    let key: Vec<(E, i64)> = restriction.iter().map(|(e, w)| (e.clone(), *w)).collect();
    cache.get_or_insert_with(key, || {
        let local = curves.triangulation().lamination_from_weights(restriction);
        match local.twist(power) {
            Ok(twist) => twist,
            Err(err) => panic!("cannot twist about {local}: {err}"),
        }
    })
}

fn localized_action<E: EdgeLabel>(curves: Lamination<E>, power: i64) -> ActionFn<E> {
    let cache: TwistCache<E> = Rc::new(Memo::new());
    Rc::new(move |lam: &Lamination<E>| {
        let t = curves.triangulation().clone();
        if lam.is_finitely_supported() {
            let near: BTreeSet<E> = lam
                .support_iter()
                .flat_map(|e| t.star(&e))
                .map(|s| s.edge)
                .collect();
            return local_twist(&curves, &cache, near, power).apply(lam);
        }
        let weight: WeightFn<E> = {
            let (curves, cache, lam) = (curves.clone(), cache.clone(), lam.clone());
            Rc::new(move |e: &E| {
                trace!(edge = ?e, power, "localizing twist");
                let near = curves.triangulation().star(e).map(|s| s.edge);
                local_twist(&curves, &cache, near, power).apply(&lam).weight(e)
            })
        };
        let support = {
            let (curves, lam, weight) = (curves.clone(), lam.clone(), weight.clone());
            Support::unbounded(move || {
                let (curves, weight) = (curves.clone(), weight.clone());
                Box::new(lam.support_iter().flat_map(move |arc| {
                    let weight = weight.clone();
                    let near = curves.triangulation().star(&arc).map(|s| s.edge);
                    let moved = curves.crossing_components(near.clone()).into_keys();
                    near.into_iter().chain(moved).filter(move |e| weight(e) != 0)
                }))
            })
        };
        Lamination::from_parts(t, weight, support)
    })
}
