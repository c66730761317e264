//! Bounded-knapsack note minimization via binary splitting.
//!
//! A supply of `c` notes of denomination `d` is split into groups of
//! `1, 2, 4, ..., 2^k, rest` notes. Every count `0..=c` is a sum of a subset
//! of those groups, so a 0/1 knapsack over the groups is equivalent to the
//! bounded problem. The DP array `best[s]` (fewest notes paying `s`) is
//! updated in descending `s` per group so each group is used at most once.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{AtmError, AtmResult};
use crate::inventory::NoteBundle;

/// Largest amount the optimizer accepts. The DP allocates `amount + 1`
/// slots (and a bit per slot and group when building a plan).
pub const MAX_AMOUNT: u64 = 1_000_000;

const UNREACHABLE: u64 = u64::MAX;

/// A virtual 0/1 item: `notes` notes of the denomination at `position`.
#[derive(Debug)]
struct Group {
    position: usize,
    notes: u64,
    value: usize,
}

/// Fewest notes that pay `amount` exactly, or `None` if the supply cannot.
///
/// `counts[i]` is the number of available notes of `denominations[i]`.
pub fn min_notes(amount: u64, denominations: &[u64], counts: &[u64]) -> AtmResult<Option<u64>> {
    let target = check_amount(amount)?;
    let groups = split(target, denominations, counts)?;
    let best = relax(target, &groups, |_, _| {});

    let result = Some(best[target]).filter(|&n| n != UNREACHABLE);
    debug!(amount, groups = groups.len(), notes = ?result, "note minimization");
    Ok(result)
}

/// The concrete minimal breakdown of `amount`, or `None` if impossible.
///
/// Bundles are listed in the order of `denominations`; denominations that
/// are not used are omitted.
pub fn dispense_plan(
    amount: u64,
    denominations: &[u64],
    counts: &[u64],
) -> AtmResult<Option<Vec<NoteBundle>>> {
    let Some(used) = notes_per_position(amount, denominations, counts)? else {
        return Ok(None);
    };
    let plan = denominations
        .iter()
        .zip(used)
        .filter(|&(_, count)| count > 0)
        .map(|(&denomination, count)| NoteBundle {
            denomination,
            count,
        })
        .collect();
    Ok(Some(plan))
}

/// Notes taken from each position of a minimal breakdown, zeros included.
pub(crate) fn notes_per_position(
    amount: u64,
    denominations: &[u64],
    counts: &[u64],
) -> AtmResult<Option<Vec<u64>>> {
    let target = check_amount(amount)?;
    let groups = split(target, denominations, counts)?;

    let mut taken = vec![vec![false; target + 1]; groups.len()];
    let best = relax(target, &groups, |group, sum| taken[group][sum] = true);
    if best[target] == UNREACHABLE {
        return Ok(None);
    }

    let mut used = vec![0u64; denominations.len()];
    let mut remaining = target;
    for (k, group) in groups.iter().enumerate().rev() {
        if taken[k][remaining] {
            used[group.position] += group.notes;
            remaining -= group.value;
        }
    }
    Ok(Some(used))
}

/// Parallel lists of equal length, with distinct non-zero denominations.
pub(crate) fn check_supply(denominations: &[u64], counts: &[u64]) -> AtmResult<()> {
    if denominations.len() != counts.len() {
        return Err(AtmError::LengthMismatch {
            denominations: denominations.len(),
            counts: counts.len(),
        });
    }
    if let Some(position) = denominations.iter().position(|&d| d == 0) {
        return Err(AtmError::ZeroDenomination(position));
    }
    let mut seen = HashSet::with_capacity(denominations.len());
    if let Some(&duplicate) = denominations.iter().find(|&&d| !seen.insert(d)) {
        return Err(AtmError::DuplicateDenomination(duplicate));
    }
    Ok(())
}

fn check_amount(amount: u64) -> AtmResult<usize> {
    if amount > MAX_AMOUNT {
        return Err(AtmError::AmountTooLarge {
            amount,
            max: MAX_AMOUNT,
        });
    }
    usize::try_from(amount).map_err(|_| AtmError::AmountTooLarge {
        amount,
        max: MAX_AMOUNT,
    })
}

fn split(target: usize, denominations: &[u64], counts: &[u64]) -> AtmResult<Vec<Group>> {
    check_supply(denominations, counts)?;

    let mut groups = Vec::new();
    for (position, (&denomination, &count)) in denominations.iter().zip(counts).enumerate() {
        let mut remaining = count;
        let mut size = 1u64;
        while remaining > 0 {
            let notes = size.min(remaining);
            // A group worth more than the target can never be part of a
            // solution.
            if let Some(value) = notes
                .checked_mul(denomination)
                .and_then(|v| usize::try_from(v).ok())
                .filter(|&v| v <= target)
            {
                groups.push(Group {
                    position,
                    notes,
                    value,
                });
            }
            remaining -= notes;
            size = size.saturating_mul(2);
        }
    }
    Ok(groups)
}

/// Run the 0/1 minimization. `on_improve(group, sum)` fires whenever a
/// group lowers `best[sum]`.
fn relax(target: usize, groups: &[Group], mut on_improve: impl FnMut(usize, usize)) -> Vec<u64> {
    let mut best = vec![UNREACHABLE; target + 1];
    best[0] = 0;

    for (k, group) in groups.iter().enumerate() {
        for sum in (group.value..=target).rev() {
            let prev = best[sum - group.value];
            if prev != UNREACHABLE && prev + group.notes < best[sum] {
                best[sum] = prev + group.notes;
                on_improve(k, sum);
            }
        }
    }
    best
}
