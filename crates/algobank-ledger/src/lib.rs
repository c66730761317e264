//! Double-entry ledger for AlgoBank.
//!
//! This crate is the heart of AlgoBank. It provides:
//! - Posting and journal entry types with hash-linked integrity
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - `InMemoryLedger`, which applies balanced postings atomically
//! - Deterministic replay of balances from the journal
//! - Account statements (running balance per posting)
//! - Journal validation (sequence, hash chain, zero-sum, currency)

pub mod config;
pub mod error;
pub mod memory;
pub mod projection;
pub mod records;
pub mod replay;
pub mod traits;
pub mod validation;

pub use config::LedgerConfig;
pub use error::{EntryRejection, LedgerError, LedgerResult};
pub use memory::InMemoryLedger;
pub use projection::{Direction, ProjectionBuilder, Statement, StatementLine};
pub use records::{JournalEntry, Metadata, Posting, DEFAULT_DESCRIPTION};
pub use replay::{ReplayEngine, ReplayResult};
pub use traits::{LedgerReader, LedgerWriter};
pub use validation::{check_postings, JournalValidator, ValidationReport, Violation, ViolationKind};
