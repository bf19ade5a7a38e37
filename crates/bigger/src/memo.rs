//! Per-object result caches.
//!
//! Purpose
//! - Triangulations and laminations are lazy: every link lookup, weight and
//!   dual weight is a pure function of its argument, and recursive algorithms
//!   (flips of flips, twists of twists) ask for the same values again and again.
//!   Each object owns a `Memo` per operation and fills it through
//!   `get_or_insert_with`.
//!
//! Semantics
//! - Append-only: a key is computed at most once (modulo re-entrant races where
//!   the computation asks for its own key, in which case the first finished
//!   value wins).
//! - Failures are cached by storing `Result` values; a panic unwinds through
//!   `get_or_insert_with` without inserting anything, so panics are never cached.
//! - Single-threaded (`RefCell`); no borrow is held while the value is computed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Hash-map backed cache keyed by normalized arguments.
pub struct Memo<K, V> {
    map: RefCell<HashMap<K, V>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            map: RefCell::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V: Clone> Memo<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, computing and storing it on first use.
    pub fn get_or_insert_with(&self, key: K, compute: impl FnOnce() -> V) -> V {
        if let Some(value) = self.map.borrow().get(&key) {
            return value.clone();
        }
        let value = compute();
        self.map.borrow_mut().entry(key).or_insert(value).clone()
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.map.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }
}

impl<K, V> fmt::Debug for Memo<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Memo({} entries)", self.map.borrow().len())
    }
}

/// Single-slot cache for nullary operations (`shorten`, `peripheral`, ...).
pub type Once<V> = Memo<(), V>;
