use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BankError {
    #[error("amount must be positive, got {0}")]
    InvalidAmount(Decimal),

    #[error("cannot dispense {0} with the notes loaded")]
    CannotDispense(u64),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("ledger error: {0}")]
    Ledger(#[from] algobank_ledger::LedgerError),

    #[error("routing error: {0}")]
    Routing(#[from] algobank_routing::RoutingError),

    #[error("accrual error: {0}")]
    Accrual(#[from] algobank_accrual::AccrualError),

    #[error("atm error: {0}")]
    Atm(#[from] algobank_atm::AtmError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type BankResult<T> = Result<T, BankError>;
