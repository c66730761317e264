/// Errors from accrual counter operations.
///
/// No operation mutates the tree when it returns an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccrualError {
    #[error("index {index} out of range for domain of {len} days")]
    OutOfRange { index: usize, len: usize },

    #[error("empty range: first day {first} is after last day {last}")]
    EmptyRange { first: usize, last: usize },
}

pub type AccrualResult<T> = Result<T, AccrualError>;
