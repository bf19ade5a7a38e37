//! Curated internal API (UNSTABLE).
//!
//! Important
//! - This is not a public API. It is a convenience surface for the CLI, benches
//!   and experiments. Breaking changes are allowed and expected.

// Triangulations and rewrites
pub use crate::triangulation::{
    EdgeLabel, Edges, FlipSelector, Side, Square, Term, Triangle, Triangulation, TriangulationError,
};
// Encodings
pub use crate::encoding::{Encoding, EncodingError, Move, MoveKind};
// Laminations, shortening and twists
pub use crate::lamination::{
    Annulus, AnnulusShape, Component, ComponentKind, Lamination, LaminationError, Short, ShortenCfg,
    Support,
};
// Example surfaces
pub use crate::load::{biflute, flute, integers, parse_curve_name, IndexRange};
pub use crate::mcg::{MappingClassError, MappingClassGroup};
// Random words
pub use crate::sample::{random_word, ReplayToken, WordCfg};
// Utilities
pub use crate::memo::Memo;
pub use crate::structures::UnionFind;
