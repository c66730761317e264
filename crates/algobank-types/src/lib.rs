//! Foundation types for AlgoBank.
//!
//! Every other AlgoBank crate depends on `algobank-types`.
//!
//! # Key Types
//!
//! - [`AccountId`]: Opaque, time-ordered account identifier (UUID v7)
//! - [`EntryId`]: Journal entry identifier (UUID v7)
//! - [`Digest`]: 32-byte content digest (BLAKE3)
//! - [`Currency`]: ISO-4217 style currency code

pub mod account;
pub mod currency;
pub mod digest;
pub mod entry;
pub mod error;

pub use account::AccountId;
pub use currency::Currency;
pub use digest::Digest;
pub use entry::EntryId;
pub use error::TypeError;
