//! Disjoint-set forest over an arbitrary hashable universe.
//!
//! Created once with the full item universe, then mutated by `union` calls
//! during one analysis pass (e.g. clustering triangles into regions).

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Union–find with path compression and union by rank.
///
/// Invariants:
/// - `parent` and `rank` have exactly the keys of `items`.
/// - Iteration yields a partition of `items` (singletons included), groups in
///   order of their first member, members in universe order.
#[derive(Clone, Debug)]
pub struct UnionFind<T> {
    items: Vec<T>,
    parent: HashMap<T, T>,
    rank: HashMap<T, u32>,
}

impl<T: Clone + Eq + Hash> UnionFind<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        let mut uniq = Vec::new();
        let mut parent = HashMap::new();
        let mut rank = HashMap::new();
        for item in items {
            if parent.contains_key(&item) {
                continue;
            }
            parent.insert(item.clone(), item.clone());
            rank.insert(item.clone(), 0);
            uniq.push(item);
        }
        Self {
            items: uniq,
            parent,
            rank,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn contains(&self, x: &T) -> bool {
        self.parent.contains_key(x)
    }

    /// Root of the group containing `x`.
    ///
    /// Panics if `x` is not in the universe.
    pub fn find(&mut self, x: &T) -> T {
        let mut root = x.clone();
        loop {
            let up = self.parent_of(&root);
            if up == root {
                break;
            }
            root = up;
        }
        let mut node = x.clone();
        while node != root {
            let up = self.parent_of(&node);
            self.parent.insert(node, root.clone());
            node = up;
        }
        root
    }

    fn parent_of(&self, x: &T) -> T {
        match self.parent.get(x) {
            Some(p) => p.clone(),
            None => panic!("item is not part of this union-find universe"),
        }
    }

    /// Merge the groups of `x` and `y` (no-op if already merged).
    pub fn union2(&mut self, x: &T, y: &T) {
        let rx = self.find(x);
        let ry = self.find(y);
        if rx == ry {
            return;
        }
        let kx = self.rank[&rx];
        let ky = self.rank[&ry];
        if kx > ky {
            self.parent.insert(ry, rx);
        } else if kx < ky {
            self.parent.insert(rx, ry);
        } else {
            self.parent.insert(ry, rx.clone());
            self.rank.insert(rx, kx + 1);
        }
    }

    /// Merge the groups of all given items (first with each of the others).
    pub fn union(&mut self, items: &[T]) {
        if let Some((first, rest)) = items.split_first() {
            for item in rest {
                self.union2(first, item);
            }
        }
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.parent.iter().filter(|(k, v)| k == v).count()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The groups as a partition of the universe.
    pub fn groups(&mut self) -> Vec<Vec<T>> {
        let mut slot: HashMap<T, usize> = HashMap::new();
        let mut out: Vec<Vec<T>> = Vec::new();
        for item in self.items.clone() {
            let root = self.find(&item);
            let idx = *slot.entry(root).or_insert_with(|| {
                out.push(Vec::new());
                out.len() - 1
            });
            out[idx].push(item);
        }
        out
    }
}

impl<T: Clone + Eq + Hash> IntoIterator for UnionFind<T> {
    type Item = Vec<T>;
    type IntoIter = std::vec::IntoIter<Vec<T>>;

    fn into_iter(mut self) -> Self::IntoIter {
        self.groups().into_iter()
    }
}

impl<T: Clone + Eq + Hash + fmt::Display> fmt::Display for UnionFind<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups = self.clone().groups();
        let parts: Vec<String> = groups
            .iter()
            .map(|g| {
                let inner: Vec<String> = g.iter().map(|x| x.to_string()).collect();
                format!("{{{}}}", inner.join(", "))
            })
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn singletons_until_merged() {
        let mut uf = UnionFind::new(0..5);
        assert_eq!(uf.len(), 5);
        uf.union(&[0, 2, 4]);
        assert_eq!(uf.len(), 3);
        assert_eq!(uf.find(&0), uf.find(&4));
        assert_ne!(uf.find(&0), uf.find(&1));
        assert_eq!(uf.groups(), vec![vec![0, 2, 4], vec![1], vec![3]]);
        assert_eq!(uf.to_string(), "{0, 2, 4}, {1}, {3}");
    }

    #[test]
    fn union_is_noop_within_group() {
        let mut uf = UnionFind::new(["a", "b", "c"]);
        uf.union2(&"a", &"b");
        let before = uf.len();
        uf.union2(&"b", &"a");
        assert_eq!(uf.len(), before);
        uf.union(&[]);
        uf.union(&["c"]);
        assert_eq!(uf.len(), 2);
    }

    proptest! {
        #[test]
        fn groups_partition_the_universe(
            n in 1usize..40,
            pairs in proptest::collection::vec((0usize..40, 0usize..40), 0..60),
        ) {
            let mut uf = UnionFind::new(0..n);
            for (a, b) in pairs {
                let (a, b) = (a % n, b % n);
                let groups_before = uf.len();
                uf.union2(&a, &b);
                prop_assert_eq!(uf.find(&a), uf.find(&b));
                prop_assert!(uf.len() == groups_before || uf.len() + 1 == groups_before);
            }
            for x in 0..n {
                let r = uf.find(&x);
                prop_assert_eq!(uf.find(&r), r);
            }
            let groups = uf.groups();
            prop_assert_eq!(groups.len(), uf.len());
            let flat: Vec<usize> = groups.into_iter().flatten().collect();
            prop_assert_eq!(flat.len(), n);
            let uniq: HashSet<usize> = flat.into_iter().collect();
            prop_assert_eq!(uniq, (0..n).collect::<HashSet<_>>());
        }
    }
}
