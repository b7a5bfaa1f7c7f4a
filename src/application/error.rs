use thiserror::Error;

use crate::domain::{Cents, InvalidArgument, ValidationError, WalletId};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Wallet not found: {0}")]
    WalletNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Expense not found: {0}")]
    ExpenseNotFound(String),

    #[error("Income not found: {0}")]
    IncomeNotFound(String),

    #[error("Transfer not found: {0}")]
    TransferNotFound(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Wallet already exists: {0}")]
    WalletAlreadyExists(String),

    #[error("Category already exists: {0}")]
    CategoryAlreadyExists(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Source and destination wallet must differ")]
    SameWalletTransfer,

    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Cents),

    #[error("Insufficient funds in wallet {wallet}: balance would become {balance_after}")]
    InsufficientFunds {
        wallet: WalletId,
        balance_after: Cents,
    },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

/// Coarse classification the API layer maps to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    ValidationFailed,
    InvalidArgument,
    BusinessRuleViolation,
    Storage,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::WalletNotFound(_)
            | AppError::CategoryNotFound(_)
            | AppError::ExpenseNotFound(_)
            | AppError::IncomeNotFound(_)
            | AppError::TransferNotFound(_) => ErrorKind::NotFound,
            AppError::Validation(_)
            | AppError::WalletAlreadyExists(_)
            | AppError::CategoryAlreadyExists(_) => ErrorKind::ValidationFailed,
            AppError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            AppError::SameWalletTransfer
            | AppError::NonPositiveAmount(_)
            | AppError::InsufficientFunds { .. } => ErrorKind::BusinessRuleViolation,
            AppError::Database(_) => ErrorKind::Storage,
        }
    }
}

impl From<InvalidArgument> for AppError {
    fn from(err: InvalidArgument) -> Self {
        AppError::InvalidArgument(err.0)
    }
}

pub type AppResult<T> = Result<T, AppError>;
