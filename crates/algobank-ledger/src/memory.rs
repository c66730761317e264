use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use algobank_crypto::HashChainVerifier;
use algobank_types::{AccountId, Currency, Digest, EntryId};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, LedgerResult};
use crate::records::{JournalEntry, Metadata, Posting};
use crate::traits::{LedgerReader, LedgerWriter};
use crate::validation::{check_postings, JournalValidator};

/// In-memory ledger for embedding, tests and demos.
///
/// All state sits behind one lock: validation and application of an entry
/// happen under the same write guard, so readers never observe a partially
/// applied entry.
pub struct InMemoryLedger {
    config: LedgerConfig,
    inner: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<AccountId, Decimal>,
    /// Creation order.
    accounts: Vec<AccountId>,
    journal: Vec<JournalEntry>,
    /// Entry id -> journal index.
    by_id: HashMap<EntryId, usize>,
}

impl InMemoryLedger {
    pub fn new(config: LedgerConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(LedgerState::default()),
        }
    }

    pub fn with_currency(currency: Currency) -> Self {
        Self::new(LedgerConfig { currency })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Re-check sequence numbers, hash links, entry hashes and the zero-sum
    /// law over the whole journal. Fails on the first violation.
    pub fn verify_journal(&self) -> LedgerResult<()> {
        let entries = self.journal()?;
        let report = JournalValidator::validate_entries(&entries, self.config.currency);
        match report.violations.into_iter().next() {
            Some(violation) => Err(LedgerError::IntegrityViolation {
                seq: violation.seq,
                reason: violation.description,
            }),
            None => Ok(()),
        }
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.inner
            .read()
            .map_err(|_| LedgerError::Internal("ledger read lock poisoned".into()))
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.inner
            .write()
            .map_err(|_| LedgerError::Internal("ledger write lock poisoned".into()))
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl LedgerWriter for InMemoryLedger {
    fn create_account(&self) -> LedgerResult<AccountId> {
        let mut state = self.write()?;
        let id = AccountId::new();
        state.balances.insert(id, Decimal::ZERO);
        state.accounts.push(id);
        debug!(account = %id.short_id(), "account created");
        Ok(id)
    }

    fn post(&self, postings: Vec<Posting>, metadata: Metadata) -> LedgerResult<JournalEntry> {
        if let Err(rejection) = check_postings(&postings, self.config.currency) {
            warn!(%rejection, postings = postings.len(), "entry rejected");
            return Err(rejection.into());
        }

        let mut guard = self.write()?;
        let state = &mut *guard;

        // New balances are staged so an unknown account or an overflow
        // leaves every balance untouched.
        let mut staged: HashMap<AccountId, Decimal> = HashMap::with_capacity(postings.len());
        for p in &postings {
            let current = match staged.get(&p.account) {
                Some(balance) => *balance,
                None => match state.balances.get(&p.account) {
                    Some(balance) => *balance,
                    None => {
                        warn!(account = %p.account.short_id(), "entry rejected: unknown account");
                        return Err(LedgerError::UnknownAccount(p.account));
                    }
                },
            };
            let Some(next) = current.checked_add(p.amount) else {
                warn!(account = %p.account.short_id(), "entry rejected: balance overflow");
                return Err(LedgerError::BalanceOverflow(p.account));
            };
            staged.insert(p.account, next);
        }

        let seq = state.journal.len() as u64 + 1;
        let prev_hash = state.journal.last().map(|e| e.entry_hash);
        let mut entry = JournalEntry {
            id: EntryId::new(),
            seq,
            posted_at: Utc::now(),
            postings,
            metadata,
            prev_hash,
            entry_hash: Digest::zero(),
        };
        entry.entry_hash = HashChainVerifier::compute_hash(&entry.canonical_bytes(), prev_hash);

        state.balances.extend(staged);
        state.by_id.insert(entry.id, state.journal.len());
        state.journal.push(entry.clone());

        debug!(
            entry = %entry.id.short_id(),
            seq,
            postings = entry.postings.len(),
            hash = %entry.entry_hash.short_hex(),
            "journal entry posted"
        );
        Ok(entry)
    }
}

impl LedgerReader for InMemoryLedger {
    fn currency(&self) -> Currency {
        self.config.currency
    }

    fn balance(&self, account: &AccountId) -> LedgerResult<Decimal> {
        self.read()?
            .balances
            .get(account)
            .copied()
            .ok_or(LedgerError::UnknownAccount(*account))
    }

    fn all_balances(&self) -> LedgerResult<BTreeMap<AccountId, Decimal>> {
        let state = self.read()?;
        Ok(state.balances.iter().map(|(id, b)| (*id, *b)).collect())
    }

    fn accounts(&self) -> LedgerResult<Vec<AccountId>> {
        Ok(self.read()?.accounts.clone())
    }

    fn journal(&self) -> LedgerResult<Vec<JournalEntry>> {
        Ok(self.read()?.journal.clone())
    }

    fn entry_count(&self) -> LedgerResult<u64> {
        Ok(self.read()?.journal.len() as u64)
    }

    fn get_entry(&self, id: &EntryId) -> LedgerResult<Option<JournalEntry>> {
        let state = self.read()?;
        Ok(state
            .by_id
            .get(id)
            .and_then(|&index| state.journal.get(index))
            .cloned())
    }

    fn read_range(&self, from_seq: u64, to_seq: u64) -> LedgerResult<Vec<JournalEntry>> {
        if from_seq == 0 || to_seq == 0 || from_seq > to_seq {
            return Err(LedgerError::InvalidRange {
                from: from_seq,
                to: to_seq,
            });
        }

        let state = self.read()?;
        let start = (from_seq - 1) as usize;
        if start >= state.journal.len() {
            return Ok(vec![]);
        }
        let end_exclusive = to_seq.min(state.journal.len() as u64) as usize;
        Ok(state.journal[start..end_exclusive].to_vec())
    }

    fn entries_for(&self, account: &AccountId) -> LedgerResult<Vec<JournalEntry>> {
        let state = self.read()?;
        if !state.balances.contains_key(account) {
            return Err(LedgerError::UnknownAccount(*account));
        }
        Ok(state
            .journal
            .iter()
            .filter(|e| e.touches(account))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use rust_decimal_macros::dec;

    use super::*;
    use crate::error::EntryRejection;

    fn eur(account: AccountId, amount: Decimal) -> Posting {
        Posting::new(account, amount, Currency::EUR)
    }

    fn transfer(ledger: &InMemoryLedger, from: AccountId, to: AccountId, amount: Decimal) {
        ledger
            .post(vec![eur(from, -amount), eur(to, amount)], Metadata::new())
            .unwrap();
    }

    fn total(ledger: &InMemoryLedger) -> Decimal {
        ledger.all_balances().unwrap().values().copied().sum()
    }

    #[test]
    fn new_account_has_zero_balance() {
        let ledger = InMemoryLedger::default();
        let a = ledger.create_account().unwrap();
        assert_eq!(ledger.balance(&a).unwrap(), Decimal::ZERO);
        assert_eq!(ledger.accounts().unwrap(), vec![a]);
    }

    #[test]
    fn accounts_keep_creation_order() {
        let ledger = InMemoryLedger::default();
        let ids: Vec<_> = (0..5).map(|_| ledger.create_account().unwrap()).collect();
        assert_eq!(ledger.accounts().unwrap(), ids);
    }

    #[test]
    fn post_moves_money_and_conserves_total() {
        let ledger = InMemoryLedger::default();
        let sys = ledger.create_account().unwrap();
        let a = ledger.create_account().unwrap();
        let b = ledger.create_account().unwrap();

        transfer(&ledger, sys, a, dec!(500.00));
        transfer(&ledger, a, b, dec!(120.25));

        assert_eq!(ledger.balance(&sys).unwrap(), dec!(-500));
        assert_eq!(ledger.balance(&a).unwrap(), dec!(379.75));
        assert_eq!(ledger.balance(&b).unwrap(), dec!(120.25));
        assert_eq!(total(&ledger), Decimal::ZERO);
    }

    #[test]
    fn entries_are_sequenced_and_linked() {
        let ledger = InMemoryLedger::default();
        let a = ledger.create_account().unwrap();
        let b = ledger.create_account().unwrap();
        transfer(&ledger, a, b, dec!(1));
        transfer(&ledger, b, a, dec!(1));

        let journal = ledger.journal().unwrap();
        assert_eq!(journal[0].seq, 1);
        assert_eq!(journal[1].seq, 2);
        assert_eq!(journal[0].prev_hash, None);
        assert_eq!(journal[1].prev_hash, Some(journal[0].entry_hash));
        assert_ne!(journal[0].id, journal[1].id);
        ledger.verify_journal().unwrap();
    }

    #[test]
    fn unbalanced_post_changes_nothing() {
        let ledger = InMemoryLedger::default();
        let a = ledger.create_account().unwrap();
        let b = ledger.create_account().unwrap();
        transfer(&ledger, a, b, dec!(10));
        let before = ledger.all_balances().unwrap();

        let err = ledger
            .post(vec![eur(a, dec!(-10)), eur(b, dec!(9))], Metadata::new())
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidEntry(EntryRejection::Unbalanced { sum: dec!(-1) })
        );
        assert_eq!(ledger.all_balances().unwrap(), before);
        assert_eq!(ledger.entry_count().unwrap(), 1);
    }

    #[test]
    fn empty_post_is_rejected() {
        let ledger = InMemoryLedger::default();
        assert_eq!(
            ledger.post(vec![], Metadata::new()).unwrap_err(),
            LedgerError::InvalidEntry(EntryRejection::Empty)
        );
    }

    #[test]
    fn unknown_account_aborts_whole_entry() {
        let ledger = InMemoryLedger::default();
        let a = ledger.create_account().unwrap();
        let b = ledger.create_account().unwrap();
        let ghost = AccountId::new();

        let err = ledger
            .post(
                vec![eur(a, dec!(-30)), eur(b, dec!(20)), eur(ghost, dec!(10))],
                Metadata::new(),
            )
            .unwrap_err();
        assert_eq!(err, LedgerError::UnknownAccount(ghost));
        assert_eq!(ledger.balance(&a).unwrap(), Decimal::ZERO);
        assert_eq!(ledger.balance(&b).unwrap(), Decimal::ZERO);
        assert_eq!(ledger.entry_count().unwrap(), 0);
    }

    #[test]
    fn balance_overflow_aborts_whole_entry() {
        let ledger = InMemoryLedger::default();
        let a = ledger.create_account().unwrap();
        let b = ledger.create_account().unwrap();
        let c = ledger.create_account().unwrap();
        transfer(&ledger, b, a, Decimal::MAX);
        let before = ledger.all_balances().unwrap();

        let err = ledger
            .post(vec![eur(a, Decimal::MAX), eur(b, -Decimal::MAX)], Metadata::new())
            .unwrap_err();
        assert_eq!(err, LedgerError::BalanceOverflow(a));

        // c is staged before a overflows.
        let err = ledger
            .post(
                vec![eur(c, dec!(1)), eur(a, dec!(1)), eur(b, dec!(-2))],
                Metadata::new(),
            )
            .unwrap_err();
        assert_eq!(err, LedgerError::BalanceOverflow(a));

        assert_eq!(ledger.all_balances().unwrap(), before);
        assert_eq!(ledger.entry_count().unwrap(), 1);
        assert!(ledger.verify_journal().is_ok());

        // The lock is not poisoned; the ledger keeps working.
        transfer(&ledger, a, c, dec!(5));
        assert_eq!(ledger.balance(&c).unwrap(), dec!(5));
        assert_eq!(ledger.balance(&a).unwrap(), Decimal::MAX - dec!(5));
    }

    #[test]
    fn foreign_currency_is_rejected() {
        let ledger = InMemoryLedger::with_currency(Currency::USD);
        let a = ledger.create_account().unwrap();
        let b = ledger.create_account().unwrap();
        let err = ledger
            .post(vec![eur(a, dec!(-1)), eur(b, dec!(1))], Metadata::new())
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidEntry(EntryRejection::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn zero_amounts_and_repeated_accounts_accumulate() {
        let ledger = InMemoryLedger::default();
        let a = ledger.create_account().unwrap();
        let b = ledger.create_account().unwrap();
        ledger
            .post(
                vec![
                    eur(a, dec!(-5)),
                    eur(a, dec!(-5)),
                    eur(b, dec!(10)),
                    eur(b, dec!(0)),
                ],
                Metadata::new(),
            )
            .unwrap();
        assert_eq!(ledger.balance(&a).unwrap(), dec!(-10));
        assert_eq!(ledger.balance(&b).unwrap(), dec!(10));
    }

    #[test]
    fn balance_of_unknown_account_fails() {
        let ledger = InMemoryLedger::default();
        let ghost = AccountId::new();
        assert_eq!(
            ledger.balance(&ghost).unwrap_err(),
            LedgerError::UnknownAccount(ghost)
        );
        assert!(ledger.entries_for(&ghost).is_err());
    }

    #[test]
    fn snapshot_is_detached() {
        let ledger = InMemoryLedger::default();
        let a = ledger.create_account().unwrap();
        let b = ledger.create_account().unwrap();
        let snapshot = ledger.all_balances().unwrap();
        transfer(&ledger, a, b, dec!(7));
        assert_eq!(snapshot[&a], Decimal::ZERO);
        assert_eq!(ledger.balance(&a).unwrap(), dec!(-7));
    }

    #[test]
    fn metadata_is_stored() {
        let ledger = InMemoryLedger::default();
        let a = ledger.create_account().unwrap();
        let b = ledger.create_account().unwrap();
        let mut meta = Metadata::new();
        meta.insert("desc".into(), "Rent".into());

        let entry = ledger
            .post(vec![eur(a, dec!(-1)), eur(b, dec!(1))], meta)
            .unwrap();
        let stored = ledger.get_entry(&entry.id).unwrap().unwrap();
        assert_eq!(stored.description(), "Rent");
        assert_eq!(stored, entry);
        assert!(ledger.get_entry(&EntryId::new()).unwrap().is_none());
    }

    #[test]
    fn read_range_is_one_based_and_inclusive() {
        let ledger = InMemoryLedger::default();
        let a = ledger.create_account().unwrap();
        let b = ledger.create_account().unwrap();
        for _ in 0..5 {
            transfer(&ledger, a, b, dec!(1));
        }

        let seqs = |from, to| -> Vec<u64> {
            ledger
                .read_range(from, to)
                .unwrap()
                .iter()
                .map(|e| e.seq)
                .collect()
        };
        assert_eq!(seqs(2, 4), vec![2, 3, 4]);
        assert_eq!(seqs(4, 99), vec![4, 5]);
        assert!(seqs(6, 9).is_empty());

        assert_eq!(
            ledger.read_range(0, 3).unwrap_err(),
            LedgerError::InvalidRange { from: 0, to: 3 }
        );
        assert!(ledger.read_range(3, 2).is_err());
    }

    #[test]
    fn entries_for_filters_by_account() {
        let ledger = InMemoryLedger::default();
        let a = ledger.create_account().unwrap();
        let b = ledger.create_account().unwrap();
        let c = ledger.create_account().unwrap();
        transfer(&ledger, a, b, dec!(1));
        transfer(&ledger, b, c, dec!(1));
        transfer(&ledger, c, a, dec!(1));

        let seqs: Vec<_> = ledger.entries_for(&b).unwrap().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn concurrent_posts_conserve_total() {
        let ledger = Arc::new(InMemoryLedger::default());
        let accounts: Vec<_> = (0..4).map(|_| ledger.create_account().unwrap()).collect();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let ledger = Arc::clone(&ledger);
                let accounts = accounts.clone();
                thread::spawn(move || {
                    for i in 0..50 {
                        let from = accounts[(t + i) % 4];
                        let to = accounts[(t + i + 1) % 4];
                        transfer(&ledger, from, to, dec!(1.5));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.entry_count().unwrap(), 400);
        assert_eq!(total(&ledger), Decimal::ZERO);
        ledger.verify_journal().unwrap();
    }
}
