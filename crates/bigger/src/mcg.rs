//! Mapping class groups presented by named generators.
//!
//! Purpose
//! - Wrap a triangulation together with a pure lookup `name -> Encoding` so
//!   callers can write mapping classes as words such as `"a0.a1.A0"`.
//!
//! Why this design
//! - The lookup is an injected closure: example surfaces (`crate::load`) decide
//!   which names exist, and this type only adds caching, inverse sugar and word
//!   parsing on top.
//! - A name the lookup rejects is retried with its case swapped; success there
//!   means "the inverse of that generator" (`A0 = ~a0`).

use std::fmt;
use std::rc::Rc;

use crate::encoding::Encoding;
use crate::lamination::{Lamination, LaminationError};
use crate::memo::Memo;
use crate::triangulation::{EdgeLabel, Triangulation};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MappingClassError {
    UnknownGenerator { name: String },
    /// A curve family name selecting curves that cross each other.
    IntersectingCurves { name: String },
    Lamination(LaminationError),
}

impl MappingClassError {
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownGenerator { name: name.into() }
    }
}

impl fmt::Display for MappingClassError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownGenerator { name } => write!(f, "unknown mapping class {name:?}"),
            Self::IntersectingCurves { name } => {
                write!(f, "{name:?} selects curves that intersect, so they cannot be twisted together")
            }
            Self::Lamination(err) => write!(f, "cannot build mapping class: {err}"),
        }
    }
}

impl std::error::Error for MappingClassError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Lamination(err) => Some(err),
            Self::UnknownGenerator { .. } | Self::IntersectingCurves { .. } => None,
        }
    }
}

impl From<LaminationError> for MappingClassError {
    fn from(err: LaminationError) -> Self {
        Self::Lamination(err)
    }
}

/// Generator lookup of a mapping class group.
pub type GeneratorFn<E> = Rc<dyn Fn(&str) -> Result<Encoding<E>, MappingClassError>>;

/// A triangulation plus named generators.
pub struct MappingClassGroup<E: EdgeLabel> {
    triangulation: Triangulation<E>,
    generator: GeneratorFn<E>,
    cache: Memo<String, Result<Encoding<E>, MappingClassError>>,
}

impl<E: EdgeLabel> fmt::Debug for MappingClassGroup<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MappingClassGroup({:?})", self.triangulation)
    }
}

impl<E: EdgeLabel> MappingClassGroup<E> {
    pub fn new(
        triangulation: Triangulation<E>,
        generator: impl Fn(&str) -> Result<Encoding<E>, MappingClassError> + 'static,
    ) -> Self {
        Self {
            triangulation,
            generator: Rc::new(generator),
            cache: Memo::new(),
        }
    }

    pub fn triangulation(&self) -> &Triangulation<E> {
        &self.triangulation
    }

    /// The encoding named `name`, or the inverse of the case-swapped name.
    pub fn generator(&self, name: &str) -> Result<Encoding<E>, MappingClassError> {
        self.cache.get_or_insert_with(name.to_string(), || {
            match (self.generator)(name) {
                Err(MappingClassError::UnknownGenerator { .. }) => {}
                found => return found,
            }
            let swapped = swap_case(name);
            if swapped == name {
                return Err(MappingClassError::unknown(name));
            }
            match (self.generator)(&swapped) {
                Ok(h) => Ok(h.inverse()),
                Err(MappingClassError::UnknownGenerator { .. }) => Err(MappingClassError::unknown(name)),
                Err(err) => Err(err),
            }
        })
    }

    /// The product of a `.`-separated word, read like a product: the rightmost
    /// name acts first. The empty word is the identity.
    pub fn word(&self, word: &str) -> Result<Encoding<E>, MappingClassError> {
        let mut h = self.triangulation.identity();
        for name in word.split('.').map(str::trim).filter(|s| !s.is_empty()) {
            h = &h * &self.generator(name)?;
        }
        Ok(h)
    }

    /// Apply `word` to a lamination on this group's triangulation.
    pub fn apply(&self, word: &str, lam: &Lamination<E>) -> Result<Lamination<E>, MappingClassError> {
        Ok(self.word(word)?.apply(lam))
    }
}

fn swap_case(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_uppercase() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                c.to_uppercase().next().unwrap_or(c)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangulation::{Edges, Side};

    fn swap_group() -> MappingClassGroup<i64> {
        // Two triangles glued into a sphere with three punctures.
        let t = Triangulation::from_pos(Edges::Finite(vec![0, 1, 2]), |e: &i64| match e {
            0 => [Side::pos(1), Side::pos(2), Side::neg(2), Side::neg(1)],
            1 => [Side::pos(2), Side::pos(0), Side::neg(0), Side::neg(2)],
            _ => [Side::pos(0), Side::pos(1), Side::neg(1), Side::neg(0)],
        });
        let target = t.clone();
        MappingClassGroup::new(t, move |name| match name {
            "r" => Ok(target.relabel_map_onto(
                &target,
                [
                    (Side::pos(0), Side::pos(1)),
                    (Side::pos(1), Side::pos(2)),
                    (Side::pos(2), Side::pos(0)),
                ],
            )),
            _ => Err(MappingClassError::unknown(name)),
        })
    }

    #[test]
    fn swap_case_inverts_generators() {
        let mcg = swap_group();
        let lam = mcg.triangulation().lamination_from_weights([(0, 2), (1, 1)]);
        let out = mcg.apply("R.r", &lam).unwrap();
        assert!(out.equals(&lam).unwrap());
        let out = mcg.apply("r", &lam).unwrap();
        assert_eq!(out.to_map().unwrap(), [(1, 2), (2, 1)].into_iter().collect());
    }

    #[test]
    fn word_reads_right_to_left() {
        let mcg = swap_group();
        let lam = mcg.triangulation().lamination_from_weights([(0, 1)]);
        let out = mcg.apply("r.r", &lam).unwrap();
        assert_eq!(out.to_map().unwrap(), [(2, 1)].into_iter().collect());
        assert_eq!(mcg.word("").unwrap().len(), 0);
    }

    #[test]
    fn unknown_names_are_reported_verbatim() {
        let mcg = swap_group();
        assert_eq!(
            mcg.word("r.x").unwrap_err(),
            MappingClassError::UnknownGenerator { name: "x".into() }
        );
    }
}
