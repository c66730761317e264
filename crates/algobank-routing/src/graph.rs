//! Weighted bank graph and Dijkstra search.
//!
//! Node names are interned into dense indices on first use; adjacency lists
//! are indexed by that position. Every edge is stored in both directions.
//!
//! # Invariants
//!
//! - `names.len() == adjacency.len() == index.len()`.
//! - Every stored weight is `>= 0` (never NaN).

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RoutingError, RoutingResult};
use crate::route::Route;

/// Undirected weighted graph of banks with least-cost route search.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GraphRouter {
    index: HashMap<String, usize>,
    names: Vec<String>,
    /// Position -> list of (neighbor position, weight).
    adjacency: Vec<Vec<(usize, f64)>>,
    edges: usize,
}

impl GraphRouter {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct banks.
    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    /// Number of undirected edges added.
    pub fn edge_count(&self) -> usize {
        self.edges
    }

    /// Returns `true` if `node` appears on any edge.
    pub fn contains(&self, node: &str) -> bool {
        self.index.contains_key(node)
    }

    /// All node names in first-seen order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Direct neighbors of `node` with edge weights, in insertion order.
    pub fn neighbors(&self, node: &str) -> Vec<(&str, f64)> {
        self.index
            .get(node)
            .map(|&i| {
                self.adjacency[i]
                    .iter()
                    .map(|&(j, w)| (self.names[j].as_str(), w))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Add an undirected edge `u - v` with cost `weight`.
    ///
    /// Parallel edges are allowed; the search simply uses the cheaper one.
    pub fn add_edge(
        &mut self,
        u: impl Into<String>,
        v: impl Into<String>,
        weight: f64,
    ) -> RoutingResult<()> {
        let (u, v) = (u.into(), v.into());
        if !weight.is_finite() || weight < 0.0 {
            return Err(RoutingError::InvalidWeight {
                from: u,
                to: v,
                weight,
            });
        }

        let iu = self.intern(u);
        let iv = self.intern(v);
        self.adjacency[iu].push((iv, weight));
        self.adjacency[iv].push((iu, weight));
        self.edges += 1;

        debug!(from = %self.names[iu], to = %self.names[iv], weight, "added route edge");
        Ok(())
    }

    /// Least-cost route from `start` to `end`.
    ///
    /// Returns [`Route::unreachable`] if either endpoint is unknown or no
    /// path exists. Among equal-cost candidates, the one pushed onto the
    /// queue first wins.
    pub fn shortest_path(&self, start: &str, end: &str) -> Route {
        let (Some(&source), Some(&target)) = (self.index.get(start), self.index.get(end)) else {
            return Route::unreachable();
        };

        let mut finalized = vec![false; self.names.len()];
        let mut via: Vec<Option<usize>> = vec![None; self.names.len()];
        let mut queue = BinaryHeap::new();
        let mut pushed = 0u64;

        queue.push(Candidate {
            cost: 0.0,
            order: pushed,
            node: source,
            from: None,
        });

        while let Some(Candidate {
            cost, node, from, ..
        }) = queue.pop()
        {
            if finalized[node] {
                continue;
            }
            finalized[node] = true;
            via[node] = from;

            if node == target {
                let route = Route {
                    cost,
                    path: self.unwind(&via, target),
                };
                debug!(start, end, cost, hops = route.hops(), "route found");
                return route;
            }

            for &(next, weight) in &self.adjacency[node] {
                let next_cost = cost + weight;
                // A cost that overflows to infinity counts as no route.
                if !finalized[next] && next_cost.is_finite() {
                    pushed += 1;
                    queue.push(Candidate {
                        cost: next_cost,
                        order: pushed,
                        node: next,
                        from: Some(node),
                    });
                }
            }
        }

        debug!(start, end, "no route");
        Route::unreachable()
    }

    fn intern(&mut self, name: String) -> usize {
        if let Some(&i) = self.index.get(&name) {
            return i;
        }
        let i = self.names.len();
        self.index.insert(name.clone(), i);
        self.names.push(name);
        self.adjacency.push(Vec::new());
        i
    }

    fn unwind(&self, via: &[Option<usize>], target: usize) -> Vec<String> {
        let mut path = vec![self.names[target].clone()];
        let mut current = target;
        while let Some(prev) = via[current] {
            path.push(self.names[prev].clone());
            current = prev;
        }
        path.reverse();
        path
    }
}

/// Priority queue entry. `BinaryHeap` is a max-heap, so the ordering is
/// reversed: lower cost first, then earlier push first.
#[derive(Debug)]
struct Candidate {
    cost: f64,
    order: u64,
    node: usize,
    from: Option<usize>,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}
