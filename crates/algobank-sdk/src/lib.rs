//! High-level SDK for AlgoBank.
//!
//! [`Bank`] owns one long-lived instance of every component (ledger, fraud
//! linker, router, interest counter, ATM cassette) and exposes the banking
//! operations built on them. This is the main entry point for applications
//! embedding AlgoBank.

pub mod bank;
pub mod config;
pub mod error;

pub use bank::{Bank, Withdrawal};
pub use config::{AtmConfig, BankConfig, RouteConfig};
pub use error::{BankError, BankResult};

// Re-export key types
pub use algobank_atm::NoteBundle;
pub use algobank_ledger::{
    Direction, JournalEntry, LedgerError, Posting, Statement, StatementLine, ValidationReport,
};
pub use algobank_routing::Route;
pub use algobank_types::{AccountId, Currency, Digest, EntryId};
pub use rust_decimal::Decimal;
