//! Fraud-link detection for AlgoBank.
//!
//! Accounts that are observed together (shared device, shared payee, a
//! manual investigator link) are merged into clusters. Two accounts are
//! *linked* when they are related directly or through any chain of links.
//!
//! [`DisjointSet`] is a union-find forest with union-by-rank and path
//! compression, so `union` and `connected` run in near-constant amortized
//! time.

pub mod forest;

pub use forest::DisjointSet;
