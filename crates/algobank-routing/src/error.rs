//! Error types for the router.

/// Errors that can occur while building the routing graph.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoutingError {
    /// An edge weight was negative or NaN.
    #[error("invalid weight {weight} on edge {from} - {to}: weights must be finite and non-negative")]
    InvalidWeight {
        /// One endpoint of the rejected edge.
        from: String,
        /// The other endpoint.
        to: String,
        /// The rejected weight.
        weight: f64,
    },
}

/// Convenience alias for routing results.
pub type RoutingResult<T> = Result<T, RoutingError>;
