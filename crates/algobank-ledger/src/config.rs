use algobank_types::Currency;
use serde::{Deserialize, Serialize};

/// Ledger-level settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// The single unit every posting must be denominated in.
    pub currency: Currency,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: Currency::EUR,
        }
    }
}
