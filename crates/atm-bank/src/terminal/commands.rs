//! Terminal actor commands and session state.

use atm_core::{AccountView, BankName, CardNumber, Transactions};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::oneshot;

use crate::error::AtmError;
use crate::registry::RegistryHandle;

/// Commands sent to a terminal actor.
///
/// Every request except `Login`, `Logout` and `Status` fails with
/// `AtmError::NotLoggedIn` while no session is active.
#[derive(Debug)]
pub enum AtmCommand {
    /// Authenticate against the bank whose bin matches `card_digits`.
    ///
    /// # Errors
    /// - `AtmError::UnknownBank` if no bin matches
    /// - `AtmError::AccountNotFound` / `AtmError::InvalidPin` from the registry
    Login {
        card_digits: String,
        pin: String,
        respond_to: oneshot::Sender<Result<AccountView, AtmError>>,
    },

    Deposit {
        amount: Decimal,
        respond_to: oneshot::Sender<Result<Decimal, AtmError>>,
    },

    Withdraw {
        amount: Decimal,
        respond_to: oneshot::Sender<Result<Decimal, AtmError>>,
    },

    GetBalance {
        respond_to: oneshot::Sender<Result<Decimal, AtmError>>,
    },

    GetTransactions {
        respond_to: oneshot::Sender<Result<Transactions, AtmError>>,
    },

    /// End the session. Responds `true` if a session was active.
    Logout { respond_to: oneshot::Sender<bool> },

    /// Describe the active session, if any.
    Status {
        respond_to: oneshot::Sender<Option<SessionInfo>>,
    },
}

/// Authentication state of a terminal.
#[derive(Debug, Clone, Default)]
pub enum Session {
    #[default]
    LoggedOut,

    /// The card that logged in and the registry that accepted it.
    LoggedIn {
        card_number: CardNumber,
        registry: RegistryHandle,
    },
}

impl Session {
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn { .. })
    }

    pub fn info(&self) -> Option<SessionInfo> {
        match self {
            Self::LoggedOut => None,
            Self::LoggedIn {
                card_number,
                registry,
            } => Some(SessionInfo {
                card_number: card_number.clone(),
                bank: registry.name().clone(),
            }),
        }
    }
}

/// Public view of an active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub card_number: CardNumber,
    pub bank: BankName,
}
