use algobank_types::{AccountId, Currency};
use rust_decimal::Decimal;

/// Why a proposed set of postings was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntryRejection {
    #[error("entry has no postings")]
    Empty,

    #[error("postings sum to {sum}, expected zero")]
    Unbalanced { sum: Decimal },

    #[error("posting in {found} does not match ledger currency {expected}")]
    CurrencyMismatch { expected: Currency, found: Currency },

    #[error("posting amounts overflow while summing")]
    Overflow,
}

/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("unknown account: {0}")]
    UnknownAccount(AccountId),

    #[error("invalid entry: {0}")]
    InvalidEntry(#[from] EntryRejection),

    #[error("balance of {0} would overflow")]
    BalanceOverflow(AccountId),

    #[error("integrity violation at seq {seq}: {reason}")]
    IntegrityViolation { seq: u64, reason: String },

    #[error("invalid sequence range: from={from}, to={to}")]
    InvalidRange { from: u64, to: u64 },

    #[error("internal ledger error: {0}")]
    Internal(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
