//! Registry actor commands and events.
//!
//! This module defines the message types for communicating with the `RegistryActor`:
//! - `RegistryCommand`: Commands sent to the actor
//! - `AccountEvent`: Events published by the registry for subscribers
//! - `BankInfo`: Static description of a running registry

use atm_core::{Account, AccountNo, AccountView, BankBin, BankName, CardNumber, Transactions};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::AtmError;

// ============================================================================
// Registry Commands
// ============================================================================

/// Commands sent to the registry actor.
///
/// Each command carries a oneshot channel for the response, so callers can
/// await the result of a request without sharing any account state.
///
/// # Usage
///
/// ```ignore
/// let (tx, rx) = oneshot::channel();
/// registry_tx.send(RegistryCommand::GetBalance {
///     card_number,
///     respond_to: tx,
/// }).await?;
/// let balance = rx.await??;
/// ```
#[derive(Debug)]
pub enum RegistryCommand {
    /// Open a new account with generated card number, PIN and account number.
    ///
    /// The full record (PIN included) is returned.
    ///
    /// # Errors
    /// - `AtmError::InvalidAmount` if `initial_balance` is negative
    /// - `AtmError::BankFull` if the bin has no unused card numbers left
    CreateAccount {
        initial_balance: Decimal,
        respond_to: oneshot::Sender<Result<Account, AtmError>>,
    },

    /// Check a card and PIN.
    ///
    /// # Errors
    /// - `AtmError::AccountNotFound` if the card is unknown
    /// - `AtmError::InvalidPin` if the PIN does not match
    Login {
        card_number: CardNumber,
        pin: String,
        respond_to: oneshot::Sender<Result<AccountView, AtmError>>,
    },

    /// Credit an account; responds with the new balance.
    ///
    /// # Errors
    /// - `AtmError::AccountNotFound` if the card is unknown
    /// - `AtmError::InvalidAmount` / `AtmError::AmountOutOfRange`
    Deposit {
        card_number: CardNumber,
        amount: Decimal,
        respond_to: oneshot::Sender<Result<Decimal, AtmError>>,
    },

    /// Debit an account; responds with the new balance.
    ///
    /// # Errors
    /// - `AtmError::AccountNotFound` if the card is unknown
    /// - `AtmError::InvalidAmount` if the amount is not positive
    /// - `AtmError::LimitExceeded` if today's withdrawals would pass the bank limit
    /// - `AtmError::InsufficientFunds` if the amount exceeds the balance
    Withdraw {
        card_number: CardNumber,
        amount: Decimal,
        respond_to: oneshot::Sender<Result<Decimal, AtmError>>,
    },

    /// Read the balance.
    GetBalance {
        card_number: CardNumber,
        respond_to: oneshot::Sender<Result<Decimal, AtmError>>,
    },

    /// Read the deposit and withdrawal history.
    GetTransactions {
        card_number: CardNumber,
        respond_to: oneshot::Sender<Result<Transactions, AtmError>>,
    },

    /// Read a full snapshot. Returns `None` if the card is unknown.
    GetAccount {
        card_number: CardNumber,
        respond_to: oneshot::Sender<Option<AccountView>>,
    },

    /// Describe the bank.
    Info {
        respond_to: oneshot::Sender<BankInfo>,
    },
}

// ============================================================================
// Bank Info
// ============================================================================

/// Description of a running registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BankInfo {
    pub name: BankName,
    pub bin: BankBin,
    pub daily_withdrawal_limit: Decimal,
    pub accounts: usize,
}

// ============================================================================
// Account Events
// ============================================================================

/// Events published by a registry after a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountEvent {
    /// A new account was opened.
    Created {
        bank: BankName,
        card_number: CardNumber,
        account_no: AccountNo,
    },

    /// Money was deposited.
    Deposited {
        bank: BankName,
        card_number: CardNumber,
        amount: Decimal,
        balance: Decimal,
    },

    /// Money was withdrawn.
    Withdrawn {
        bank: BankName,
        card_number: CardNumber,
        amount: Decimal,
        balance: Decimal,
    },
}

impl AccountEvent {
    /// Name of the bank that published the event.
    pub fn bank(&self) -> &BankName {
        match self {
            Self::Created { bank, .. }
            | Self::Deposited { bank, .. }
            | Self::Withdrawn { bank, .. } => bank,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_account_event_bank() {
        let event = AccountEvent::Deposited {
            bank: BankName::new("hsbc"),
            card_number: CardNumber::new("4134-0655-0011-2233"),
            amount: dec!(10),
            balance: dec!(20),
        };
        assert_eq!(event.bank().as_str(), "hsbc");
        let _cloned = event.clone();
    }

    #[tokio::test]
    async fn test_command_oneshot_pattern() {
        let (tx, rx) = oneshot::channel::<Result<Decimal, AtmError>>();

        tokio::spawn(async move {
            tx.send(Ok(dec!(42))).ok();
        });

        assert_eq!(rx.await.unwrap(), Ok(dec!(42)));
    }

    #[tokio::test]
    async fn test_command_channel_closed_error() {
        let (tx, rx) = oneshot::channel::<Result<Decimal, AtmError>>();
        drop(tx);
        assert!(rx.await.is_err());
    }
}
