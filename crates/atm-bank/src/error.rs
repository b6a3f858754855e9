//! Errors surfaced to ATM users.
//!
//! Every variant is recoverable: the terminal and the registry stay usable
//! and their state is unchanged after a failed request.

use atm_core::{BankName, CardNumber, TransactionError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors returned by registry and terminal operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AtmError {
    /// No configured bank bin is a prefix of the card.
    #[error("no bank issues card {card}")]
    UnknownBank { card: String },

    /// No bank with this name is configured.
    #[error("no bank named {0}")]
    UnknownBankName(String),

    /// The registry has no account for this card.
    #[error("account does not exist: {}", .0.masked())]
    AccountNotFound(CardNumber),

    /// The PIN does not match the card.
    #[error("invalid PIN")]
    InvalidPin,

    /// The terminal has no active session.
    #[error("not logged in")]
    NotLoggedIn,

    /// Deposit, withdrawal or opening amounts must not be negative, and
    /// deposits and withdrawals must not be zero.
    #[error("invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    /// The amount would push the balance past what can be represented.
    #[error("amount out of range: {amount}")]
    AmountOutOfRange { amount: Decimal },

    /// The amount exceeds the account balance.
    #[error("can't withdraw more than current balance (balance: {available}, requested: {requested})")]
    InsufficientFunds {
        requested: Decimal,
        available: Decimal,
    },

    /// The amount would push today's withdrawals over the bank's limit.
    #[error("can't exceed daily withdrawal total (limit: {limit}, withdrawn today: {withdrawn_today})")]
    LimitExceeded {
        requested: Decimal,
        limit: Decimal,
        withdrawn_today: Decimal,
    },

    /// Every card number under the bank's bin is taken.
    #[error("bank {bank} has no card numbers left")]
    BankFull { bank: BankName },

    /// The supervisor was shut down; no new terminals start.
    #[error("the ATM network has shut down")]
    ShutDown,

    /// No terminal with this name was started.
    #[error("no ATM named {0}; start it first")]
    UnknownTerminal(String),

    /// The actor on the other end has shut down.
    #[error("response channel closed")]
    ChannelClosed,
}

impl From<TransactionError> for AtmError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::InvalidAmount { amount } => Self::InvalidAmount { amount },
            TransactionError::AmountOutOfRange { amount } => Self::AmountOutOfRange { amount },
            TransactionError::LimitExceeded {
                requested,
                limit,
                withdrawn_today,
            } => Self::LimitExceeded {
                requested,
                limit,
                withdrawn_today,
            },
            TransactionError::InsufficientFunds {
                requested,
                available,
            } => Self::InsufficientFunds {
                requested,
                available,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_atm_error_display() {
        let err = AtmError::AccountNotFound(CardNumber::new("4101-7712-3456-7812"));
        assert_eq!(err.to_string(), "account does not exist: ****-****-****-7812");

        assert_eq!(AtmError::InvalidPin.to_string(), "invalid PIN");
        assert_eq!(AtmError::NotLoggedIn.to_string(), "not logged in");
        assert_eq!(AtmError::ChannelClosed.to_string(), "response channel closed");

        let err = AtmError::UnknownBank {
            card: "9999-0000".to_string(),
        };
        assert_eq!(err.to_string(), "no bank issues card 9999-0000");
    }

    #[test]
    fn test_from_transaction_error() {
        let err: AtmError = TransactionError::InsufficientFunds {
            requested: dec!(10),
            available: dec!(5),
        }
        .into();
        assert_eq!(
            err,
            AtmError::InsufficientFunds {
                requested: dec!(10),
                available: dec!(5),
            }
        );

        let err: AtmError = TransactionError::LimitExceeded {
            requested: dec!(10),
            limit: dec!(5),
            withdrawn_today: dec!(0),
        }
        .into();
        assert!(matches!(err, AtmError::LimitExceeded { .. }));

        let err: AtmError = TransactionError::InvalidAmount { amount: dec!(-1) }.into();
        assert_eq!(err, AtmError::InvalidAmount { amount: dec!(-1) });
    }
}
