use std::collections::BTreeMap;

use algobank_crypto::HasEntryHash;
use algobank_types::{AccountId, Currency, Digest, EntryId};
use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Free-form entry annotations (`desc`, `biller`, ...), ordered by key.
pub type Metadata = BTreeMap<String, String>;

/// Description used when an entry carries no `desc` metadata.
pub const DEFAULT_DESCRIPTION: &str = "Transaction";

/// A signed balance delta on one account.
///
/// Negative amounts debit the account, positive amounts credit it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub account: AccountId,
    pub amount: Decimal,
    pub currency: Currency,
}

impl Posting {
    pub fn new(account: AccountId, amount: Decimal, currency: Currency) -> Self {
        Self {
            account,
            amount,
            currency,
        }
    }

    /// Take `amount` out of `account`.
    pub fn debit(account: AccountId, amount: Decimal, currency: Currency) -> Self {
        Self::new(account, -amount, currency)
    }

    /// Put `amount` into `account`.
    pub fn credit(account: AccountId, amount: Decimal, currency: Currency) -> Self {
        Self::new(account, amount, currency)
    }

    pub fn is_debit(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }
}

/// A committed, immutable group of postings.
///
/// `seq` is the 1-based journal position. `entry_hash` covers every other
/// field and links to the previous entry through `prev_hash`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    pub seq: u64,
    pub posted_at: DateTime<Utc>,
    pub postings: Vec<Posting>,
    pub metadata: Metadata,
    pub prev_hash: Option<Digest>,
    pub entry_hash: Digest,
}

impl JournalEntry {
    /// Sum of all posting amounts, `None` on overflow. Zero for every
    /// committed entry.
    pub fn sum(&self) -> Option<Decimal> {
        self.postings
            .iter()
            .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.amount))
    }

    /// Returns `true` if any posting touches `account`.
    pub fn touches(&self, account: &AccountId) -> bool {
        self.postings.iter().any(|p| &p.account == account)
    }

    /// The `desc` metadata, or [`DEFAULT_DESCRIPTION`].
    pub fn description(&self) -> &str {
        self.metadata
            .get("desc")
            .map(String::as_str)
            .unwrap_or(DEFAULT_DESCRIPTION)
    }

    /// Deterministic byte encoding of everything except the two hashes.
    ///
    /// Variable-length fields are length-prefixed so that no two distinct
    /// entries share an encoding.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(128 + self.postings.len() * 64);
        buf.extend_from_slice(&self.seq.to_le_bytes());
        buf.extend_from_slice(self.id.as_uuid().as_bytes());
        put(
            &mut buf,
            self.posted_at
                .to_rfc3339_opts(SecondsFormat::Nanos, true)
                .as_bytes(),
        );

        buf.extend_from_slice(&(self.postings.len() as u64).to_le_bytes());
        for posting in &self.postings {
            buf.extend_from_slice(posting.account.as_uuid().as_bytes());
            put(&mut buf, posting.amount.to_string().as_bytes());
            put(&mut buf, posting.currency.code().as_bytes());
        }

        buf.extend_from_slice(&(self.metadata.len() as u64).to_le_bytes());
        for (key, value) in &self.metadata {
            put(&mut buf, key.as_bytes());
            put(&mut buf, value.as_bytes());
        }
        buf
    }
}

impl HasEntryHash for JournalEntry {
    fn entry_hash(&self) -> Digest {
        self.entry_hash
    }

    fn prev_hash(&self) -> Option<Digest> {
        self.prev_hash
    }

    fn payload_bytes(&self) -> Vec<u8> {
        self.canonical_bytes()
    }
}

fn put(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    buf.extend_from_slice(bytes);
}
