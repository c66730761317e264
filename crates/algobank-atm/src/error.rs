/// Errors from the note optimizer.
///
/// "No combination pays the amount" is not an error; it is `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AtmError {
    #[error("{denominations} denominations but {counts} supply counts")]
    LengthMismatch { denominations: usize, counts: usize },

    #[error("denomination at position {0} is zero")]
    ZeroDenomination(usize),

    #[error("denomination {0} is listed more than once")]
    DuplicateDenomination(u64),

    #[error("amount {amount} exceeds the optimizer limit of {max}")]
    AmountTooLarge { amount: u64, max: u64 },
}

pub type AtmResult<T> = Result<T, AtmError>;
