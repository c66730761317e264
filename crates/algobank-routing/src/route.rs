use serde::{Deserialize, Serialize};

/// Result of a least-cost route query.
///
/// An unreachable destination is not an error: it is reported as infinite
/// cost with an empty path.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Total accumulated edge weight.
    pub cost: f64,
    /// Node names from start to end, both inclusive.
    pub path: Vec<String>,
}

impl Route {
    /// The "no route" sentinel: `(+inf, [])`.
    pub fn unreachable() -> Self {
        Self {
            cost: f64::INFINITY,
            path: Vec::new(),
        }
    }

    /// Returns `true` if a path was found.
    pub fn is_reachable(&self) -> bool {
        !self.path.is_empty()
    }

    /// Number of edges traversed.
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}
