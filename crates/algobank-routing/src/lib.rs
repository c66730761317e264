//! Interbank routing for AlgoBank.
//!
//! Banks are nodes of an undirected graph whose edge weights are the
//! non-negative cost of moving money between two institutions.
//! [`GraphRouter::shortest_path`] finds the cheapest route with Dijkstra's
//! algorithm.

pub mod error;
pub mod graph;
pub mod route;

pub use error::{RoutingError, RoutingResult};
pub use graph::GraphRouter;
pub use route::Route;
