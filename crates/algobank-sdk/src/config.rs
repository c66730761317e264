use std::collections::HashSet;
use std::path::Path;

use algobank_ledger::LedgerConfig;
use algobank_types::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BankError, BankResult};

/// Settings for a [`Bank`](crate::Bank). Every field has a default, so an
/// empty TOML document is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BankConfig {
    pub currency: Currency,
    /// Credited to every newly opened account from the system account.
    pub welcome_bonus: Decimal,
    /// Number of days tracked by the interest counter.
    pub accrual_days: usize,
    pub routes: Vec<RouteConfig>,
    pub atm: AtmConfig,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            currency: Currency::EUR,
            welcome_bonus: Decimal::from(50_000),
            accrual_days: 100,
            routes: vec![
                RouteConfig::new("BankA", "BankB", 3.0),
                RouteConfig::new("BankB", "BankC", 2.0),
                RouteConfig::new("BankA", "BankC", 10.0),
                RouteConfig::new("BankC", "BankD", 1.0),
            ],
            atm: AtmConfig::default(),
        }
    }
}

impl BankConfig {
    pub fn from_toml_str(content: &str) -> BankResult<Self> {
        let config: BankConfig = toml::from_str(content)
            .map_err(|e| BankError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> BankResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| BankError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// The ledger-level slice of this configuration.
    pub fn ledger(&self) -> LedgerConfig {
        LedgerConfig {
            currency: self.currency,
        }
    }

    pub(crate) fn validate(&self) -> BankResult<()> {
        if self.welcome_bonus.is_sign_negative() && !self.welcome_bonus.is_zero() {
            return Err(BankError::Config(format!(
                "welcome_bonus must not be negative, got {}",
                self.welcome_bonus
            )));
        }
        if self.atm.denominations.len() != self.atm.counts.len() {
            return Err(BankError::Config(format!(
                "atm has {} denominations but {} counts",
                self.atm.denominations.len(),
                self.atm.counts.len()
            )));
        }
        let mut seen = HashSet::with_capacity(self.atm.denominations.len());
        if let Some(d) = self.atm.denominations.iter().find(|&&d| !seen.insert(d)) {
            return Err(BankError::Config(format!(
                "atm denomination {d} is listed more than once"
            )));
        }
        Ok(())
    }
}

/// An undirected interbank edge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub from: String,
    pub to: String,
    pub cost: f64,
}

impl RouteConfig {
    pub fn new(from: impl Into<String>, to: impl Into<String>, cost: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            cost,
        }
    }
}

/// Initial ATM cassette contents.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmConfig {
    pub denominations: Vec<u64>,
    pub counts: Vec<u64>,
}

impl Default for AtmConfig {
    fn default() -> Self {
        Self {
            denominations: vec![500, 200, 100],
            counts: vec![2, 5, 10],
        }
    }
}
