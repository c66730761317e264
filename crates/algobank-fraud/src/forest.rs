//! Union-find forest.
//!
//! Elements are interned into a dense index space on first insertion; the
//! parent and rank arrays are indexed by that position. Every element
//! starts as the root of its own singleton set.
//!
//! # Invariants
//!
//! - `parent.len() == rank.len() == members.len() == index.len()`.
//! - Following `parent` from any index terminates at a root
//!   (`parent[r] == r`).
//! - A root's rank bounds the height of its tree.

use std::collections::HashMap;
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Disjoint-set forest over arbitrary hashable elements.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisjointSet<T: Eq + Hash> {
    /// Element -> dense position.
    index: HashMap<T, usize>,
    /// Position -> element, in insertion order.
    members: Vec<T>,
    parent: Vec<usize>,
    rank: Vec<u8>,
    /// Number of disjoint sets.
    sets: usize,
}

impl<T: Eq + Hash> Default for DisjointSet<T> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            members: Vec::new(),
            parent: Vec::new(),
            rank: Vec::new(),
            sets: 0,
        }
    }
}

impl<T: Eq + Hash + Clone> DisjointSet<T> {
    /// Create an empty forest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements ever added.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if no element has been added.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of disjoint clusters.
    pub fn set_count(&self) -> usize {
        self.sets
    }

    /// Returns `true` if `x` has been added.
    pub fn contains(&self, x: &T) -> bool {
        self.index.contains_key(x)
    }

    // ---------------------------------------------------------------
    // Mutation
    // ---------------------------------------------------------------

    /// Add `x` as its own singleton set.
    ///
    /// Idempotent: returns `false` and leaves the structure untouched if `x`
    /// is already present.
    pub fn add(&mut self, x: T) -> bool {
        if self.index.contains_key(&x) {
            return false;
        }
        self.intern(x);
        true
    }

    /// Merge the sets containing `a` and `b`.
    ///
    /// Elements that were never added are added first. Returns `false` if
    /// both were already in the same set, `true` if two sets were merged.
    pub fn union(&mut self, a: T, b: T) -> bool {
        let ia = self.position_or_insert(a);
        let ib = self.position_or_insert(b);

        let mut ra = self.find_root(ia);
        let mut rb = self.find_root(ib);
        if ra == rb {
            return false;
        }

        if self.rank[ra] < self.rank[rb] {
            std::mem::swap(&mut ra, &mut rb);
        }
        self.parent[rb] = ra;
        if self.rank[ra] == self.rank[rb] {
            self.rank[ra] = self.rank[ra].saturating_add(1);
        }
        self.sets -= 1;

        debug!(root = ra, merged = rb, sets = self.sets, "merged fraud clusters");
        true
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Returns `true` if `a` and `b` are in the same set.
    ///
    /// Returns `false` if either element was never added. Compresses the
    /// paths of both elements as a side effect.
    pub fn connected(&mut self, a: &T, b: &T) -> bool {
        let (Some(&ia), Some(&ib)) = (self.index.get(a), self.index.get(b)) else {
            return false;
        };
        self.find_root(ia) == self.find_root(ib)
    }

    /// The representative element of `x`'s set, or `None` if `x` is absent.
    pub fn find(&mut self, x: &T) -> Option<&T> {
        let i = *self.index.get(x)?;
        let root = self.find_root(i);
        self.members.get(root)
    }

    /// All members of `x`'s cluster in insertion order, `x` included.
    ///
    /// Returns an empty vec if `x` was never added.
    pub fn cluster_of(&mut self, x: &T) -> Vec<T> {
        let Some(&i) = self.index.get(x) else {
            return Vec::new();
        };
        let root = self.find_root(i);
        let mut cluster = Vec::new();
        for j in 0..self.members.len() {
            if self.find_root(j) == root {
                cluster.push(self.members[j].clone());
            }
        }
        cluster
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    fn intern(&mut self, x: T) -> usize {
        let pos = self.members.len();
        self.index.insert(x.clone(), pos);
        self.members.push(x);
        self.parent.push(pos);
        self.rank.push(0);
        self.sets += 1;
        pos
    }

    fn position_or_insert(&mut self, x: T) -> usize {
        match self.index.get(&x) {
            Some(&pos) => pos,
            None => self.intern(x),
        }
    }

    /// Iterative find with full path compression.
    fn find_root(&mut self, mut i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        while self.parent[i] != root {
            let next = self.parent[i];
            self.parent[i] = root;
            i = next;
        }
        root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn union_links_directly_related_accounts() {
        let mut dsu = DisjointSet::new();
        dsu.add("A");
        dsu.add("B");
        dsu.add("C");
        dsu.union("A", "B");
        assert!(dsu.connected(&"A", &"B"));
        assert!(!dsu.connected(&"A", &"C"));
    }

    #[test]
    fn union_is_transitive() {
        let mut dsu = DisjointSet::new();
        for x in ["acc1", "ghost1", "ghost2", "acc2"] {
            dsu.add(x);
        }
        dsu.union("acc1", "ghost1");
        dsu.union("ghost1", "ghost2");
        assert!(dsu.connected(&"acc1", &"ghost2"));
        assert!(!dsu.connected(&"acc1", &"acc2"));
        assert_eq!(dsu.set_count(), 2);
    }

    #[test]
    fn union_twice_returns_true_then_false() {
        let mut dsu = DisjointSet::new();
        dsu.add(1);
        dsu.add(2);
        assert!(dsu.union(1, 2));
        assert!(!dsu.union(1, 2));
        assert!(!dsu.union(2, 1));
    }

    #[test]
    fn add_is_idempotent() {
        let mut dsu = DisjointSet::new();
        assert!(dsu.add("x"));
        dsu.add("y");
        dsu.union("x", "y");
        let before = (dsu.len(), dsu.set_count(), dsu.find(&"x").copied());

        assert!(!dsu.add("x"));
        let after = (dsu.len(), dsu.set_count(), dsu.find(&"x").copied());
        assert_eq!(before, after);
        assert!(dsu.connected(&"x", &"y"));
    }

    #[test]
    fn connected_is_false_for_unknown_elements() {
        let mut dsu = DisjointSet::new();
        dsu.add("A");
        assert!(!dsu.connected(&"A", &"missing"));
        assert!(!dsu.connected(&"missing", &"missing"));
    }

    #[test]
    fn union_adds_missing_elements() {
        let mut dsu = DisjointSet::new();
        assert!(dsu.union("p", "q"));
        assert!(dsu.contains(&"p"));
        assert!(dsu.contains(&"q"));
        assert!(dsu.connected(&"p", &"q"));
    }

    #[test]
    fn cluster_of_lists_members_in_insertion_order() {
        let mut dsu = DisjointSet::new();
        for x in ["a", "b", "c", "d"] {
            dsu.add(x);
        }
        dsu.union("d", "a");
        dsu.union("b", "d");
        assert_eq!(dsu.cluster_of(&"a"), vec!["a", "b", "d"]);
        assert_eq!(dsu.cluster_of(&"c"), vec!["c"]);
        assert!(dsu.cluster_of(&"z").is_empty());
    }

    #[test]
    fn find_compresses_paths() {
        let mut dsu = DisjointSet::new();
        for i in 0..64 {
            dsu.add(i);
        }
        for i in 1..64 {
            dsu.union(i - 1, i);
        }
        let root = *dsu.find(&0).unwrap();
        for i in 0..64 {
            dsu.find(&i);
        }
        let root_pos = dsu.index[&root];
        assert!(dsu.parent.iter().all(|&p| p == root_pos));
    }

    #[test]
    fn long_chain_does_not_overflow_stack() {
        let mut dsu = DisjointSet::new();
        for i in 0..100_000u32 {
            dsu.add(i);
        }
        for i in 1..100_000u32 {
            dsu.union(i, i - 1);
        }
        assert!(dsu.connected(&0, &99_999));
        assert_eq!(dsu.set_count(), 1);
    }

    proptest! {
        #[test]
        fn matches_naive_connectivity(edges in prop::collection::vec((0u8..20, 0u8..20), 0..40)) {
            let mut dsu = DisjointSet::new();
            let mut labels: Vec<u8> = (0..20).collect();
            for x in 0u8..20 {
                dsu.add(x);
            }
            for (a, b) in edges {
                dsu.union(a, b);
                let (la, lb) = (labels[a as usize], labels[b as usize]);
                for l in labels.iter_mut() {
                    if *l == lb {
                        *l = la;
                    }
                }
            }
            for a in 0u8..20 {
                for b in 0u8..20 {
                    prop_assert_eq!(
                        dsu.connected(&a, &b),
                        labels[a as usize] == labels[b as usize]
                    );
                }
            }
        }
    }
}
