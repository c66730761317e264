use algobank_crypto::HashChainVerifier;
use algobank_types::Currency;
use rust_decimal::Decimal;

use crate::error::{EntryRejection, LedgerResult};
use crate::records::{JournalEntry, Posting};
use crate::traits::LedgerReader;

/// Check the structural rules every entry must satisfy before it is applied:
/// at least one posting, a zero sum and the ledger's currency throughout.
///
/// Account existence is checked by the ledger under its write lock.
pub fn check_postings(postings: &[Posting], currency: Currency) -> Result<(), EntryRejection> {
    if postings.is_empty() {
        return Err(EntryRejection::Empty);
    }

    let sum = postings
        .iter()
        .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.amount))
        .ok_or(EntryRejection::Overflow)?;
    if !sum.is_zero() {
        return Err(EntryRejection::Unbalanced { sum });
    }

    if let Some(p) = postings.iter().find(|p| p.currency != currency) {
        return Err(EntryRejection::CurrencyMismatch {
            expected: currency,
            found: p.currency,
        });
    }

    Ok(())
}

/// Result of journal validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationReport {
    pub entry_count: u64,
    pub hash_chain_valid: bool,
    pub sequence_monotonic: bool,
    pub entries_balanced: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation detected during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub seq: u64,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    SequenceGap,
    HashChainBreak,
    HashMismatch,
    EmptyEntry,
    UnbalancedEntry,
    CurrencyMismatch,
}

/// Journal integrity validator.
pub struct JournalValidator;

impl JournalValidator {
    /// Validate the whole journal held by `reader`.
    pub fn validate<R: LedgerReader>(reader: &R) -> LedgerResult<ValidationReport> {
        let entries = reader.journal()?;
        Ok(Self::validate_entries(&entries, reader.currency()))
    }

    /// Validate a sequence of entries, reporting every violation found.
    pub fn validate_entries(entries: &[JournalEntry], currency: Currency) -> ValidationReport {
        let mut violations = Vec::new();
        let mut sequence_monotonic = true;
        let mut entries_balanced = true;

        for (index, entry) in entries.iter().enumerate() {
            let expected_seq = (index + 1) as u64;
            if entry.seq != expected_seq {
                sequence_monotonic = false;
                violations.push(Violation {
                    seq: entry.seq,
                    kind: ViolationKind::SequenceGap,
                    description: format!("expected seq {expected_seq}, got {}", entry.seq),
                });
            }

            let expected_prev = index.checked_sub(1).map(|i| entries[i].entry_hash);
            if entry.prev_hash != expected_prev {
                violations.push(Violation {
                    seq: entry.seq,
                    kind: ViolationKind::HashChainBreak,
                    description: "previous hash link mismatch".into(),
                });
            }

            let computed =
                HashChainVerifier::compute_hash(&entry.canonical_bytes(), entry.prev_hash);
            if computed != entry.entry_hash {
                violations.push(Violation {
                    seq: entry.seq,
                    kind: ViolationKind::HashMismatch,
                    description: "entry hash does not match computed".into(),
                });
            }

            if let Err(rejection) = check_postings(&entry.postings, currency) {
                let kind = match rejection {
                    EntryRejection::Empty => ViolationKind::EmptyEntry,
                    EntryRejection::Unbalanced { .. } | EntryRejection::Overflow => {
                        ViolationKind::UnbalancedEntry
                    }
                    EntryRejection::CurrencyMismatch { .. } => ViolationKind::CurrencyMismatch,
                };
                if kind != ViolationKind::CurrencyMismatch {
                    entries_balanced = false;
                }
                violations.push(Violation {
                    seq: entry.seq,
                    kind,
                    description: rejection.to_string(),
                });
            }
        }

        ValidationReport {
            entry_count: entries.len() as u64,
            hash_chain_valid: HashChainVerifier::verify_chain(entries).is_ok(),
            sequence_monotonic,
            entries_balanced,
            violations,
        }
    }
}
