//! Mapping classes of infinite-type surfaces through lazy triangulations.
//!
//! Triangulations, laminations and encodings are closures over each other, so
//! surfaces with infinitely many triangles (flutes, ladders) can be queried
//! edge by edge. Everything is single-threaded and shares state through `Rc`.
//!
//! API Policy
//! - This crate is project-internal. There is no stable public API; prefer
//!   `crate::api` for a curated surface.

pub mod api;
pub mod encoding;
pub mod lamination;
pub mod load;
pub mod mcg;
pub mod memo;
pub mod sample;
pub mod structures;
pub mod triangulation;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use encoding::{Encoding, Move};
pub use lamination::Lamination;
pub use mcg::MappingClassGroup;
pub use triangulation::{Side, Triangulation};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::encoding::{Encoding, EncodingError, Move, MoveKind};
    pub use crate::lamination::{Lamination, LaminationError, Short, ShortenCfg, Support};
    pub use crate::load::{biflute, flute};
    pub use crate::mcg::{MappingClassError, MappingClassGroup};
    pub use crate::triangulation::{Edges, FlipSelector, Side, Term, Triangulation};
}
