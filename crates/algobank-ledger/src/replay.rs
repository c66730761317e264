use std::collections::BTreeMap;

use algobank_types::AccountId;
use rust_decimal::Decimal;

use crate::error::LedgerResult;
use crate::records::JournalEntry;
use crate::traits::LedgerReader;

/// Balances rebuilt from the journal alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayResult {
    pub applied_entries: u64,
    pub applied_postings: u64,
    pub balances: BTreeMap<AccountId, Decimal>,
}

/// Deterministic replay of journal entries into balances.
pub struct ReplayEngine;

impl ReplayEngine {
    /// Replay the journal held by `reader`, starting every registered
    /// account at zero.
    pub fn replay<R: LedgerReader>(reader: &R) -> LedgerResult<ReplayResult> {
        let accounts = reader.accounts()?;
        let entries = reader.journal()?;
        Ok(Self::replay_entries(&accounts, &entries))
    }

    /// Pure replay over an explicit account list and entry sequence.
    pub fn replay_entries(accounts: &[AccountId], entries: &[JournalEntry]) -> ReplayResult {
        let mut balances: BTreeMap<AccountId, Decimal> =
            accounts.iter().map(|id| (*id, Decimal::ZERO)).collect();
        let mut applied_postings = 0u64;

        for entry in entries {
            for posting in &entry.postings {
                // Saturates instead of panicking on a foreign journal; a
                // saturated balance fails convergence.
                let balance = balances.entry(posting.account).or_default();
                *balance = balance.saturating_add(posting.amount);
                applied_postings += 1;
            }
        }

        ReplayResult {
            applied_entries: entries.len() as u64,
            applied_postings,
            balances,
        }
    }

    /// Returns `true` if replayed balances equal the ledger's live balances.
    ///
    /// The two reads are not taken under one lock; call it while no writer
    /// is active.
    pub fn verify_convergence<R: LedgerReader>(reader: &R) -> LedgerResult<bool> {
        let replayed = Self::replay(reader)?;
        let live = reader.all_balances()?;
        Ok(replayed.balances == live)
    }
}
