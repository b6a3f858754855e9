//! ATM Core - Shared domain types for the ATM simulator
//!
//! This crate provides the value types shared between the bank registries
//! (atm-bank) and the interactive shell (atm-cli): card numbers, PINs,
//! bank bins, and the account record with its deposit and withdrawal history.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod account;
pub mod bank;
pub mod card;
pub mod error;

// Re-exports for convenience
pub use account::{Account, AccountView, Transactions, Withdrawal};
pub use bank::{BankBin, BankName};
pub use card::{AccountNo, CardNumber, Pin, CARD_DIGITS, PIN_DIGITS};
pub use error::{DomainError, DomainResult, TransactionError};
pub use rust_decimal::Decimal;
