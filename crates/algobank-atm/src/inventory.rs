use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AtmError, AtmResult};
use crate::optimizer::{check_supply, dispense_plan, min_notes, notes_per_position};

/// A number of notes of one denomination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteBundle {
    pub denomination: u64,
    pub count: u64,
}

impl NoteBundle {
    /// Face value of the whole bundle (saturating).
    pub fn value(&self) -> u64 {
        self.denomination.saturating_mul(self.count)
    }
}

/// The note cassettes loaded in one ATM.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteInventory {
    denominations: Vec<u64>,
    counts: Vec<u64>,
}

impl NoteInventory {
    /// Build an inventory from parallel denomination/count lists.
    ///
    /// Each denomination gets exactly one cassette; duplicates are refused.
    pub fn new(denominations: Vec<u64>, counts: Vec<u64>) -> AtmResult<Self> {
        check_supply(&denominations, &counts)?;
        Ok(Self {
            denominations,
            counts,
        })
    }

    pub fn denominations(&self) -> &[u64] {
        &self.denominations
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Current contents as bundles, in cassette order.
    pub fn bundles(&self) -> Vec<NoteBundle> {
        self.denominations
            .iter()
            .zip(&self.counts)
            .map(|(&denomination, &count)| NoteBundle {
                denomination,
                count,
            })
            .collect()
    }

    /// Total cash held (saturating).
    pub fn total_value(&self) -> u64 {
        self.bundles()
            .iter()
            .fold(0u64, |acc, b| acc.saturating_add(b.value()))
    }

    /// Fewest notes that pay `amount` from the current contents.
    pub fn min_notes(&self, amount: u64) -> AtmResult<Option<u64>> {
        min_notes(amount, &self.denominations, &self.counts)
    }

    /// Minimal breakdown of `amount` without removing anything.
    pub fn plan(&self, amount: u64) -> AtmResult<Option<Vec<NoteBundle>>> {
        dispense_plan(amount, &self.denominations, &self.counts)
    }

    /// Remove a minimal breakdown of `amount` from the cassettes.
    ///
    /// Returns `Ok(None)` and leaves the inventory unchanged if the amount
    /// cannot be paid.
    pub fn dispense(&mut self, amount: u64) -> AtmResult<Option<Vec<NoteBundle>>> {
        let Some(used) = notes_per_position(amount, &self.denominations, &self.counts)? else {
            return Ok(None);
        };
        // The plan never exceeds the supply; stay unchanged if it somehow did.
        let Some(remaining) = self
            .counts
            .iter()
            .zip(&used)
            .map(|(&have, &take)| have.checked_sub(take))
            .collect::<Option<Vec<u64>>>()
        else {
            return Ok(None);
        };
        self.counts = remaining;

        let plan: Vec<NoteBundle> = self
            .denominations
            .iter()
            .zip(used)
            .filter(|&(_, count)| count > 0)
            .map(|(&denomination, count)| NoteBundle {
                denomination,
                count,
            })
            .collect();
        debug!(amount, bundles = plan.len(), "notes dispensed");
        Ok(Some(plan))
    }

    /// Load more notes of an existing or new denomination.
    pub fn restock(&mut self, denomination: u64, count: u64) -> AtmResult<()> {
        if denomination == 0 {
            return Err(AtmError::ZeroDenomination(self.denominations.len()));
        }
        match self.denominations.iter().position(|&d| d == denomination) {
            Some(i) => self.counts[i] = self.counts[i].saturating_add(count),
            None => {
                self.denominations.push(denomination);
                self.counts.push(count);
            }
        }
        Ok(())
    }
}
