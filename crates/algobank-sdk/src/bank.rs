use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockWriteGuard};

use algobank_accrual::SegmentTree;
use algobank_atm::{NoteBundle, NoteInventory};
use algobank_crypto::merkle_root;
use algobank_fraud::DisjointSet;
use algobank_ledger::{
    InMemoryLedger, JournalEntry, JournalValidator, LedgerError, LedgerReader, LedgerWriter,
    Metadata, Posting, ProjectionBuilder, ReplayEngine, Statement, ValidationReport,
};
use algobank_routing::{GraphRouter, Route};
use algobank_types::{AccountId, Digest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::BankConfig;
use crate::error::{BankError, BankResult};

/// Description of the entry that funds a newly opened account.
const WELCOME_DESC: &str = "Welcome Bonus - Initial Deposit";

/// A completed cash withdrawal: the ledger entry and the notes handed out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub entry: JournalEntry,
    pub notes: Vec<NoteBundle>,
}

/// High-level AlgoBank API.
///
/// Money only moves through balanced ledger entries. Capital enters and
/// leaves through a single system account created at construction, so the
/// sum of all balances stays zero.
pub struct Bank {
    config: BankConfig,
    ledger: InMemoryLedger,
    system: AccountId,
    linker: RwLock<DisjointSet<AccountId>>,
    router: RwLock<GraphRouter>,
    accrual: RwLock<SegmentTree<Decimal>>,
    atm: RwLock<NoteInventory>,
}

impl Bank {
    pub fn new(config: BankConfig) -> BankResult<Self> {
        config.validate()?;

        let ledger = InMemoryLedger::new(config.ledger());
        let system = ledger.create_account()?;

        let mut router = GraphRouter::new();
        for route in &config.routes {
            router.add_edge(route.from.as_str(), route.to.as_str(), route.cost)?;
        }

        let atm = NoteInventory::new(config.atm.denominations.clone(), config.atm.counts.clone())?;
        let accrual = SegmentTree::new(config.accrual_days);

        info!(
            currency = %config.currency,
            system = %system.short_id(),
            routes = config.routes.len(),
            accrual_days = config.accrual_days,
            "bank initialized"
        );

        Ok(Self {
            config,
            ledger,
            system,
            linker: RwLock::new(DisjointSet::new()),
            router: RwLock::new(router),
            accrual: RwLock::new(accrual),
            atm: RwLock::new(atm),
        })
    }

    pub fn config(&self) -> &BankConfig {
        &self.config
    }

    /// The source and sink of all capital.
    pub fn system_account(&self) -> AccountId {
        self.system
    }

    pub fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    // ---- Accounts and money movement ----

    /// Open an account funded with the configured welcome bonus.
    ///
    /// The account is registered with the ledger and the fraud linker before
    /// the bonus is posted. Accounts are never removed, so if the bonus is
    /// rejected the account remains, unfunded, and the error is returned.
    pub fn open_account(&self) -> BankResult<AccountId> {
        let account = self.ledger.create_account()?;
        self.write_linker()?.add(account);
        self.move_money(
            self.system,
            account,
            self.config.welcome_bonus,
            describe(WELCOME_DESC),
        )?;
        info!(account = %account.short_id(), "account opened");
        Ok(account)
    }

    /// Inject capital from the system account.
    pub fn deposit(
        &self,
        account: &AccountId,
        amount: Decimal,
        desc: &str,
    ) -> BankResult<JournalEntry> {
        check_amount(amount)?;
        self.move_money(self.system, *account, amount, describe(desc))
    }

    pub fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount: Decimal,
    ) -> BankResult<JournalEntry> {
        check_amount(amount)?;
        let mut metadata = describe(&format!("Transfer to Account {}", to.masked()));
        metadata.insert("from".into(), from.to_string());
        metadata.insert("to".into(), to.to_string());
        self.move_money(*from, *to, amount, metadata)
    }

    pub fn pay_bill(
        &self,
        account: &AccountId,
        amount: Decimal,
        biller: &str,
    ) -> BankResult<JournalEntry> {
        check_amount(amount)?;
        let mut metadata = describe(&format!("Bill Payment - {biller}"));
        metadata.insert("biller".into(), biller.to_string());
        self.move_money(*account, self.system, amount, metadata)
    }

    pub fn recharge(
        &self,
        account: &AccountId,
        amount: Decimal,
        phone: &str,
    ) -> BankResult<JournalEntry> {
        check_amount(amount)?;
        let mut metadata = describe(&format!("Mobile Recharge - {phone}"));
        metadata.insert("phone".into(), phone.to_string());
        self.move_money(*account, self.system, amount, metadata)
    }

    /// Debit `amount` from the account and hand out a minimal set of notes.
    ///
    /// Notes are taken from the cassettes before the debit is posted; a
    /// rejected debit puts them back. The cassette lock is held throughout,
    /// so a concurrent withdrawal cannot take the same notes.
    pub fn withdraw_cash(&self, account: &AccountId, amount: u64) -> BankResult<Withdrawal> {
        check_amount(Decimal::from(amount))?;
        let mut atm = self
            .atm
            .write()
            .map_err(|_| BankError::Internal("atm lock poisoned".into()))?;
        let before = atm.clone();
        let notes = atm
            .dispense(amount)?
            .ok_or(BankError::CannotDispense(amount))?;

        let entry = match self.move_money(
            *account,
            self.system,
            Decimal::from(amount),
            describe("ATM Withdrawal"),
        ) {
            Ok(entry) => entry,
            Err(err) => {
                *atm = before;
                return Err(err);
            }
        };
        Ok(Withdrawal { entry, notes })
    }

    // ---- Queries ----

    pub fn balance(&self, account: &AccountId) -> BankResult<Decimal> {
        Ok(self.ledger.balance(account)?)
    }

    pub fn all_balances(&self) -> BankResult<BTreeMap<AccountId, Decimal>> {
        Ok(self.ledger.all_balances()?)
    }

    pub fn statement(&self, account: &AccountId) -> BankResult<Statement> {
        Ok(ProjectionBuilder::statement(&self.ledger, account)?)
    }

    pub fn journal(&self) -> BankResult<Vec<JournalEntry>> {
        Ok(self.ledger.journal()?)
    }

    /// Merkle root over the entry hashes of the whole journal.
    pub fn journal_root(&self) -> BankResult<Digest> {
        let hashes: Vec<[u8; 32]> = self
            .ledger
            .journal()?
            .iter()
            .map(|e| *e.entry_hash.as_bytes())
            .collect();
        Ok(merkle_root(&hashes))
    }

    /// Full journal validation report.
    pub fn validation_report(&self) -> BankResult<ValidationReport> {
        Ok(JournalValidator::validate(&self.ledger)?)
    }

    /// Check journal integrity, then that replaying it reproduces the live
    /// balances.
    pub fn verify(&self) -> BankResult<()> {
        self.ledger.verify_journal()?;
        if !ReplayEngine::verify_convergence(&self.ledger)? {
            return Err(LedgerError::IntegrityViolation {
                seq: self.ledger.entry_count()?,
                reason: "replayed balances diverge from live balances".into(),
            }
            .into());
        }
        Ok(())
    }

    // ---- Fraud links ----

    /// Record that two accounts belong to the same actor.
    ///
    /// Returns `false` if they were already linked.
    pub fn link_accounts(&self, a: &AccountId, b: &AccountId) -> BankResult<bool> {
        let merged = self.write_linker()?.union(*a, *b);
        if merged {
            info!(a = %a.short_id(), b = %b.short_id(), "accounts linked");
        }
        Ok(merged)
    }

    pub fn accounts_linked(&self, a: &AccountId, b: &AccountId) -> BankResult<bool> {
        Ok(self.write_linker()?.connected(a, b))
    }

    /// Every account linked to `account`, itself included.
    pub fn fraud_cluster(&self, account: &AccountId) -> BankResult<Vec<AccountId>> {
        Ok(self.write_linker()?.cluster_of(account))
    }

    // ---- Interbank routing ----

    pub fn add_route(&self, from: &str, to: &str, cost: f64) -> BankResult<()> {
        self.router
            .write()
            .map_err(|_| BankError::Internal("router lock poisoned".into()))?
            .add_edge(from, to, cost)?;
        Ok(())
    }

    pub fn route(&self, from: &str, to: &str) -> BankResult<Route> {
        let router = self
            .router
            .read()
            .map_err(|_| BankError::Internal("router lock poisoned".into()))?;
        let route = router.shortest_path(from, to);
        debug!(from, to, cost = route.cost, hops = route.hops(), "route computed");
        Ok(route)
    }

    // ---- Interest accrual ----

    /// Add `delta` to the accrued interest of every day in `first..=last`.
    pub fn accrue_interest(
        &self,
        first_day: usize,
        last_day: usize,
        delta: Decimal,
    ) -> BankResult<()> {
        self.accrual
            .write()
            .map_err(|_| BankError::Internal("accrual lock poisoned".into()))?
            .range_add(first_day, last_day, delta)?;
        Ok(())
    }

    pub fn interest_on(&self, day: usize) -> BankResult<Decimal> {
        let accrual = self
            .accrual
            .read()
            .map_err(|_| BankError::Internal("accrual lock poisoned".into()))?;
        Ok(accrual.point_query(day)?)
    }

    /// Accrued interest for every tracked day.
    pub fn interest_schedule(&self) -> BankResult<Vec<Decimal>> {
        let accrual = self
            .accrual
            .read()
            .map_err(|_| BankError::Internal("accrual lock poisoned".into()))?;
        Ok(accrual.values())
    }

    // ---- ATM ----

    /// Minimal note breakdown for `amount` from the current cassette,
    /// without dispensing anything.
    pub fn withdrawal_plan(&self, amount: u64) -> BankResult<Option<Vec<NoteBundle>>> {
        let atm = self
            .atm
            .read()
            .map_err(|_| BankError::Internal("atm lock poisoned".into()))?;
        Ok(atm.plan(amount)?)
    }

    /// Cassette contents as bundles.
    pub fn atm_contents(&self) -> BankResult<Vec<NoteBundle>> {
        let atm = self
            .atm
            .read()
            .map_err(|_| BankError::Internal("atm lock poisoned".into()))?;
        Ok(atm.bundles())
    }

    // ---- Internals ----

    fn move_money(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
        metadata: Metadata,
    ) -> BankResult<JournalEntry> {
        let currency = self.config.currency;
        let entry = self.ledger.post(
            vec![
                Posting::debit(from, amount, currency),
                Posting::credit(to, amount, currency),
            ],
            metadata,
        )?;
        Ok(entry)
    }

    fn write_linker(&self) -> BankResult<RwLockWriteGuard<'_, DisjointSet<AccountId>>> {
        self.linker
            .write()
            .map_err(|_| BankError::Internal("fraud linker lock poisoned".into()))
    }
}

fn describe(desc: &str) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("desc".into(), desc.to_string());
    metadata
}

fn check_amount(amount: Decimal) -> BankResult<()> {
    if amount <= Decimal::ZERO {
        return Err(BankError::InvalidAmount(amount));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use algobank_ledger::{Direction, EntryRejection};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::config::{AtmConfig, RouteConfig};

    fn bank() -> Bank {
        Bank::new(BankConfig::default()).unwrap()
    }

    fn total(bank: &Bank) -> Decimal {
        bank.all_balances().unwrap().values().copied().sum()
    }

    #[test]
    fn open_account_pays_welcome_bonus() {
        let bank = bank();
        let a = bank.open_account().unwrap();
        assert_eq!(bank.balance(&a).unwrap(), dec!(50000));
        assert_eq!(bank.balance(&bank.system_account()).unwrap(), dec!(-50000));

        let st = bank.statement(&a).unwrap();
        assert_eq!(st.lines.len(), 1);
        assert_eq!(st.lines[0].description, "Welcome Bonus - Initial Deposit");
        assert_eq!(st.lines[0].counterparties, vec![bank.system_account()]);
        assert_eq!(total(&bank), Decimal::ZERO);
    }

    #[test]
    fn rejected_bonus_leaves_unfunded_linkable_account() {
        let bank = Bank::new(BankConfig {
            welcome_bonus: Decimal::MAX,
            ..BankConfig::default()
        })
        .unwrap();
        let first = bank.open_account().unwrap();

        // The system account cannot go below -MAX.
        let err = bank.open_account().unwrap_err();
        let system = bank.system_account();
        assert!(matches!(
            err,
            BankError::Ledger(LedgerError::BalanceOverflow(id)) if id == system
        ));

        let accounts = bank.ledger().accounts().unwrap();
        assert_eq!(accounts.len(), 3);
        let second = accounts[2];
        assert_eq!(bank.balance(&second).unwrap(), Decimal::ZERO);
        assert_eq!(bank.balance(&first).unwrap(), Decimal::MAX);
        assert_eq!(bank.fraud_cluster(&second).unwrap(), vec![second]);
        assert!(bank.link_accounts(&first, &second).unwrap());
        assert!(bank.verify().is_ok());
    }

    #[test]
    fn zero_welcome_bonus_still_records_entry() {
        let config = BankConfig {
            welcome_bonus: Decimal::ZERO,
            ..BankConfig::default()
        };
        let bank = Bank::new(config).unwrap();
        let a = bank.open_account().unwrap();
        assert_eq!(bank.balance(&a).unwrap(), Decimal::ZERO);
        assert_eq!(bank.journal().unwrap().len(), 1);
    }

    #[test]
    fn transfer_moves_money() {
        let bank = bank();
        let a = bank.open_account().unwrap();
        let b = bank.open_account().unwrap();

        let entry = bank.transfer(&a, &b, dec!(1200.50)).unwrap();
        assert_eq!(bank.balance(&a).unwrap(), dec!(48799.50));
        assert_eq!(bank.balance(&b).unwrap(), dec!(51200.50));
        assert_eq!(entry.metadata["to"], b.to_string());
        assert!(entry.description().starts_with("Transfer to Account ****"));
        assert_eq!(total(&bank), Decimal::ZERO);
    }

    #[test]
    fn transfer_rejects_non_positive_amounts() {
        let bank = bank();
        let a = bank.open_account().unwrap();
        let b = bank.open_account().unwrap();
        for amount in [dec!(0), dec!(-5)] {
            let err = bank.transfer(&a, &b, amount).unwrap_err();
            assert!(matches!(err, BankError::InvalidAmount(x) if x == amount));
        }
        assert_eq!(bank.journal().unwrap().len(), 2);
    }

    #[test]
    fn transfer_to_unknown_account_changes_nothing() {
        let bank = bank();
        let a = bank.open_account().unwrap();
        let ghost = AccountId::new();
        let err = bank.transfer(&a, &ghost, dec!(10)).unwrap_err();
        assert!(matches!(
            err,
            BankError::Ledger(LedgerError::UnknownAccount(id)) if id == ghost
        ));
        assert_eq!(bank.balance(&a).unwrap(), dec!(50000));
    }

    #[test]
    fn bills_and_recharges_return_to_system() {
        let bank = bank();
        let a = bank.open_account().unwrap();
        bank.pay_bill(&a, dec!(120), "Electricity").unwrap();
        bank.recharge(&a, dec!(15), "+49 555 0100").unwrap();
        bank.deposit(&a, dec!(35), "Salary").unwrap();

        assert_eq!(bank.balance(&a).unwrap(), dec!(49900));
        let st = bank.statement(&a).unwrap();
        let descs: Vec<_> = st.lines.iter().map(|l| l.description.as_str()).collect();
        assert_eq!(
            descs,
            vec![
                "Welcome Bonus - Initial Deposit",
                "Bill Payment - Electricity",
                "Mobile Recharge - +49 555 0100",
                "Salary",
            ]
        );
        assert_eq!(st.lines[1].direction, Direction::Debit);
        assert_eq!(total(&bank), Decimal::ZERO);
    }

    #[test]
    fn currency_comes_from_config() {
        let config = BankConfig {
            currency: algobank_types::Currency::USD,
            ..BankConfig::default()
        };
        let bank = Bank::new(config).unwrap();
        let a = bank.open_account().unwrap();
        let entry = &bank.journal().unwrap()[0];
        assert!(entry.postings.iter().all(|p| p.currency.code() == "USD"));
        assert_eq!(bank.balance(&a).unwrap(), dec!(50000));
        // Raw ledger still refuses other currencies.
        let err = bank
            .ledger()
            .post(
                vec![
                    Posting::debit(a, dec!(1), algobank_types::Currency::EUR),
                    Posting::credit(a, dec!(1), algobank_types::Currency::EUR),
                ],
                Metadata::new(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidEntry(EntryRejection::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn verify_and_journal_root() {
        let bank = bank();
        assert_eq!(bank.journal_root().unwrap().to_hex(), algobank_crypto::EMPTY_ROOT_HEX);

        let a = bank.open_account().unwrap();
        let b = bank.open_account().unwrap();
        let root_before = bank.journal_root().unwrap();
        bank.transfer(&a, &b, dec!(1)).unwrap();
        let root_after = bank.journal_root().unwrap();

        assert_ne!(root_before, root_after);
        bank.verify().unwrap();
        assert!(bank.validation_report().unwrap().is_valid());
    }

    #[test]
    fn fraud_links_are_transitive() {
        let bank = bank();
        let acc1 = bank.open_account().unwrap();
        let ghost1 = bank.open_account().unwrap();
        let ghost2 = bank.open_account().unwrap();
        let acc2 = bank.open_account().unwrap();

        assert!(bank.link_accounts(&acc1, &ghost1).unwrap());
        assert!(bank.link_accounts(&ghost1, &ghost2).unwrap());
        assert!(!bank.link_accounts(&acc1, &ghost2).unwrap());

        assert!(bank.accounts_linked(&acc1, &ghost2).unwrap());
        assert!(!bank.accounts_linked(&acc1, &acc2).unwrap());
        assert_eq!(bank.fraud_cluster(&acc1).unwrap(), vec![acc1, ghost1, ghost2]);
        assert_eq!(bank.fraud_cluster(&acc2).unwrap(), vec![acc2]);
    }

    #[test]
    fn default_routes_are_seeded() {
        let bank = bank();
        let route = bank.route("BankA", "BankD").unwrap();
        assert_eq!(route.cost, 6.0);
        assert_eq!(route.path, vec!["BankA", "BankB", "BankC", "BankD"]);

        bank.add_route("BankA", "BankD", 1.0).unwrap();
        assert_eq!(bank.route("BankA", "BankD").unwrap().cost, 1.0);
        assert!(!bank.route("BankA", "Nowhere").unwrap().is_reachable());
        assert!(matches!(
            bank.add_route("BankA", "BankB", -1.0),
            Err(BankError::Routing(_))
        ));
    }

    #[test]
    fn invalid_configured_route_fails_construction() {
        let config = BankConfig {
            routes: vec![RouteConfig::new("A", "B", f64::NAN)],
            ..BankConfig::default()
        };
        assert!(matches!(Bank::new(config), Err(BankError::Routing(_))));
    }

    #[test]
    fn interest_accrues_over_ranges() {
        let bank = bank();
        bank.accrue_interest(0, 99, dec!(0.01)).unwrap();
        bank.accrue_interest(10, 19, dec!(0.02)).unwrap();
        assert_eq!(bank.interest_on(15).unwrap(), dec!(0.03));
        assert_eq!(bank.interest_on(50).unwrap(), dec!(0.01));
        assert_eq!(bank.interest_schedule().unwrap().len(), 100);
        assert!(matches!(bank.interest_on(100), Err(BankError::Accrual(_))));
    }

    #[test]
    fn withdrawal_plan_uses_default_cassette() {
        let bank = bank();
        let plan = bank.withdrawal_plan(700).unwrap().unwrap();
        assert_eq!(plan.iter().map(|b| b.count).sum::<u64>(), 2);
        assert!(bank.withdrawal_plan(50).unwrap().is_none());
    }

    #[test]
    fn withdraw_cash_debits_and_dispenses() {
        let bank = bank();
        let a = bank.open_account().unwrap();
        let w = bank.withdraw_cash(&a, 1000).unwrap();

        assert_eq!(w.notes, vec![NoteBundle { denomination: 500, count: 2 }]);
        assert_eq!(w.entry.description(), "ATM Withdrawal");
        assert_eq!(bank.balance(&a).unwrap(), dec!(49000));
        assert_eq!(bank.atm_contents().unwrap()[0].count, 0);

        // No 500s left.
        let plan = bank.withdrawal_plan(500).unwrap().unwrap();
        assert_eq!(plan.iter().map(|b| b.count).sum::<u64>(), 3);
    }

    #[test]
    fn undispensable_withdrawal_changes_nothing() {
        let bank = bank();
        let a = bank.open_account().unwrap();
        let before = bank.journal().unwrap().len();
        assert!(matches!(
            bank.withdraw_cash(&a, 50),
            Err(BankError::CannotDispense(50))
        ));
        assert!(matches!(bank.withdraw_cash(&a, 0), Err(BankError::InvalidAmount(_))));
        assert_eq!(bank.journal().unwrap().len(), before);
        assert_eq!(bank.atm_contents().unwrap()[0].count, 2);
    }

    #[test]
    fn withdrawal_from_unknown_account_keeps_notes() {
        let bank = bank();
        let before = bank.atm_contents().unwrap();
        let err = bank.withdraw_cash(&AccountId::new(), 700).unwrap_err();
        assert!(matches!(err, BankError::Ledger(LedgerError::UnknownAccount(_))));
        assert_eq!(bank.atm_contents().unwrap(), before);

        // The cassettes stay usable after the rollback.
        let a = bank.open_account().unwrap();
        assert!(bank.withdraw_cash(&a, 700).is_ok());
        assert_eq!(bank.balance(&a).unwrap(), dec!(49300));
    }

    #[test]
    fn duplicate_cassettes_are_refused() {
        let config = BankConfig {
            atm: AtmConfig {
                denominations: vec![100, 100],
                counts: vec![1, 1],
            },
            ..BankConfig::default()
        };
        assert!(matches!(Bank::new(config), Err(BankError::Config(_))));
    }

    #[test]
    fn concurrent_transfers_conserve_money() {
        let bank = Arc::new(bank());
        let accounts: Vec<_> = (0..4).map(|_| bank.open_account().unwrap()).collect();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let bank = Arc::clone(&bank);
                let accounts = accounts.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        let from = &accounts[(t + i) % 4];
                        let to = &accounts[(t + i + 1) % 4];
                        bank.transfer(from, to, dec!(10)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(total(&bank), Decimal::ZERO);
        bank.verify().unwrap();
    }
}
