use crate::validation::ValidationError;

/// Errors surfaced by the expense repository.
///
/// `Validation` is recoverable and must be shown to the user. `Store` wraps
/// database or I/O failures; callers treat it as fatal.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Expense not found: {0}")]
    NotFound(i64),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ExpenseError {
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ExpenseError::Store(_))
    }

    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            ExpenseError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExpenseError>;
