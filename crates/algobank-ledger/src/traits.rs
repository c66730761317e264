use std::collections::BTreeMap;

use algobank_types::{AccountId, Currency, EntryId};
use rust_decimal::Decimal;

use crate::error::LedgerResult;
use crate::records::{JournalEntry, Metadata, Posting};

/// Write boundary: the only way balances change.
pub trait LedgerWriter: Send + Sync {
    /// Register a new account with a zero balance.
    fn create_account(&self) -> LedgerResult<AccountId>;

    /// Apply a balanced set of postings as one journal entry.
    ///
    /// Either every posting is applied or none is.
    fn post(&self, postings: Vec<Posting>, metadata: Metadata) -> LedgerResult<JournalEntry>;
}

/// Read boundary for balances, journal queries and replay.
pub trait LedgerReader: Send + Sync {
    fn currency(&self) -> Currency;

    fn balance(&self, account: &AccountId) -> LedgerResult<Decimal>;

    /// Point-in-time copy of every balance.
    fn all_balances(&self) -> LedgerResult<BTreeMap<AccountId, Decimal>>;

    /// Account ids in creation order.
    fn accounts(&self) -> LedgerResult<Vec<AccountId>>;

    fn journal(&self) -> LedgerResult<Vec<JournalEntry>>;

    fn entry_count(&self) -> LedgerResult<u64>;

    fn get_entry(&self, id: &EntryId) -> LedgerResult<Option<JournalEntry>>;

    /// Entries with `from_seq <= seq <= to_seq` (1-based).
    fn read_range(&self, from_seq: u64, to_seq: u64) -> LedgerResult<Vec<JournalEntry>>;

    /// Entries touching `account`, in journal order.
    fn entries_for(&self, account: &AccountId) -> LedgerResult<Vec<JournalEntry>>;
}
