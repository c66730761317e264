use algobank_types::{AccountId, EntryId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerResult;
use crate::traits::LedgerReader;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
}

impl Direction {
    fn of(amount: Decimal) -> Self {
        if amount.is_sign_negative() && !amount.is_zero() {
            Self::Debit
        } else {
            Self::Credit
        }
    }
}

/// One posting on the statement's account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementLine {
    pub seq: u64,
    pub entry_id: EntryId,
    pub posted_at: DateTime<Utc>,
    pub description: String,
    /// Signed amount as posted.
    pub amount: Decimal,
    pub direction: Direction,
    /// Other accounts in the same entry.
    pub counterparties: Vec<AccountId>,
    /// Running balance after this line.
    pub balance: Decimal,
}

/// Chronological account statement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub account: AccountId,
    pub opening_balance: Decimal,
    pub closing_balance: Decimal,
    pub lines: Vec<StatementLine>,
}

impl Statement {
    /// Sum of debited amounts as a positive figure; `None` on overflow.
    pub fn total_debits(&self) -> Option<Decimal> {
        self.lines
            .iter()
            .filter(|l| l.direction == Direction::Debit)
            .try_fold(Decimal::ZERO, |acc, l| acc.checked_sub(l.amount))
    }

    /// Sum of credited amounts; `None` on overflow.
    pub fn total_credits(&self) -> Option<Decimal> {
        self.lines
            .iter()
            .filter(|l| l.direction == Direction::Credit)
            .try_fold(Decimal::ZERO, |acc, l| acc.checked_add(l.amount))
    }
}

/// Deterministic projection builders.
pub struct ProjectionBuilder;

impl ProjectionBuilder {
    /// Statement for `account` from the start of the journal.
    pub fn statement<R: LedgerReader>(reader: &R, account: &AccountId) -> LedgerResult<Statement> {
        let entries = reader.entries_for(account)?;
        let opening_balance = Decimal::ZERO;
        let mut running = opening_balance;
        let mut lines = Vec::new();

        for entry in &entries {
            let mut counterparties: Vec<AccountId> = Vec::new();
            for p in &entry.postings {
                if &p.account != account && !counterparties.contains(&p.account) {
                    counterparties.push(p.account);
                }
            }

            for posting in entry.postings.iter().filter(|p| &p.account == account) {
                // Running balances replay past live balances, which the
                // ledger keeps in range.
                running = running.saturating_add(posting.amount);
                lines.push(StatementLine {
                    seq: entry.seq,
                    entry_id: entry.id,
                    posted_at: entry.posted_at,
                    description: entry.description().to_string(),
                    amount: posting.amount,
                    direction: Direction::of(posting.amount),
                    counterparties: counterparties.clone(),
                    balance: running,
                });
            }
        }

        Ok(Statement {
            account: *account,
            opening_balance,
            closing_balance: running,
            lines,
        })
    }
}
