//! Domain-specific error types following panic-free policy.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while validating identifiers such as bins and card numbers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Bank bin is not a valid card-number prefix
    #[error("Invalid bank bin: {value} (expected {expected})")]
    InvalidBin { value: String, expected: String },

    /// Card number is not in `NNNN-NNNN-NNNN-NNNN` form
    #[error("Invalid card number: {value}")]
    InvalidCardNumber { value: String },

    /// PIN is not made of exactly four digits
    #[error("Invalid PIN format (expected {expected} digits)")]
    InvalidPin { expected: usize },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Reasons an account rejects a deposit or withdrawal.
///
/// A rejected transaction leaves the account untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// Deposits and withdrawals must be strictly positive.
    #[error("invalid amount: {amount} (must be greater than zero)")]
    InvalidAmount { amount: Decimal },

    /// The resulting balance cannot be represented.
    #[error("amount out of range: {amount}")]
    AmountOutOfRange { amount: Decimal },

    /// The amount plus what was already withdrawn today exceeds the bank's limit.
    #[error("daily withdrawal limit exceeded (limit: {limit}, withdrawn today: {withdrawn_today}, requested: {requested})")]
    LimitExceeded {
        requested: Decimal,
        limit: Decimal,
        withdrawn_today: Decimal,
    },

    /// The amount exceeds the current balance.
    #[error("insufficient funds (balance: {available}, requested: {requested})")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_withdrawal_error_display() {
        let err = TransactionError::InsufficientFunds {
            requested: dec!(80001),
            available: dec!(244.22),
        };
        assert_eq!(
            err.to_string(),
            "insufficient funds (balance: 244.22, requested: 80001)"
        );

        let err = TransactionError::LimitExceeded {
            requested: dec!(8000),
            limit: dec!(8000),
            withdrawn_today: dec!(8000),
        };
        assert!(err.to_string().starts_with("daily withdrawal limit exceeded"));
    }

    #[test]
    fn test_invalid_amount_display() {
        let err = TransactionError::InvalidAmount { amount: dec!(-5) };
        assert_eq!(err.to_string(), "invalid amount: -5 (must be greater than zero)");
    }

    #[test]
    fn test_domain_error_display() {
        let err = DomainError::InvalidPin { expected: 4 };
        assert_eq!(err.to_string(), "Invalid PIN format (expected 4 digits)");
    }
}
