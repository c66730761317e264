//! ATM note optimization for AlgoBank.
//!
//! Given a withdrawal amount and a cassette of notes with limited supply per
//! denomination, find the smallest number of notes that pays the amount
//! exactly. This is a bounded knapsack; each supply count is split into
//! power-of-two groups so the DP is O(amount · Σ log(count)).

pub mod error;
pub mod inventory;
pub mod optimizer;

pub use error::{AtmError, AtmResult};
pub use inventory::{NoteBundle, NoteInventory};
pub use optimizer::{dispense_plan, min_notes, MAX_AMOUNT};
