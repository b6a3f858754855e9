//! Client interface for a terminal actor.

use atm_core::{AccountView, Transactions};
use rust_decimal::Decimal;
use tokio::sync::{mpsc, oneshot};

use super::commands::{AtmCommand, SessionInfo};
use crate::error::AtmError;

/// Cheap-to-clone handle to one ATM.
#[derive(Debug, Clone)]
pub struct AtmHandle {
    name: String,
    sender: mpsc::Sender<AtmCommand>,
}

impl AtmHandle {
    pub fn new(name: impl Into<String>, sender: mpsc::Sender<AtmCommand>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> AtmCommand,
    ) -> Result<T, AtmError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(make(tx))
            .await
            .map_err(|_| AtmError::ChannelClosed)?;

        rx.await.map_err(|_| AtmError::ChannelClosed)
    }

    /// Log in with a card and PIN.
    ///
    /// # Errors
    ///
    /// - `AtmError::UnknownBank` if no bank issues the card
    /// - `AtmError::AccountNotFound` if the bank has no such card
    /// - `AtmError::InvalidPin` if the PIN does not match
    /// - `AtmError::ChannelClosed` if the terminal has shut down
    pub async fn login(
        &self,
        card_digits: impl Into<String>,
        pin: impl Into<String>,
    ) -> Result<AccountView, AtmError> {
        let card_digits = card_digits.into();
        let pin = pin.into();
        self.request(|respond_to| AtmCommand::Login {
            card_digits,
            pin,
            respond_to,
        })
        .await?
    }

    /// Deposit into the logged-in account, returning the new balance.
    pub async fn deposit(&self, amount: Decimal) -> Result<Decimal, AtmError> {
        self.request(|respond_to| AtmCommand::Deposit { amount, respond_to })
            .await?
    }

    /// Withdraw from the logged-in account, returning the new balance.
    ///
    /// # Errors
    ///
    /// - `AtmError::NotLoggedIn` without an active session
    /// - `AtmError::LimitExceeded` / `AtmError::InsufficientFunds` from the registry
    pub async fn withdraw(&self, amount: Decimal) -> Result<Decimal, AtmError> {
        self.request(|respond_to| AtmCommand::Withdraw { amount, respond_to })
            .await?
    }

    pub async fn get_balance(&self) -> Result<Decimal, AtmError> {
        self.request(|respond_to| AtmCommand::GetBalance { respond_to })
            .await?
    }

    pub async fn get_transactions(&self) -> Result<Transactions, AtmError> {
        self.request(|respond_to| AtmCommand::GetTransactions { respond_to })
            .await?
    }

    /// End the session. Idempotent; returns whether a session was active.
    pub async fn logout(&self) -> Result<bool, AtmError> {
        self.request(|respond_to| AtmCommand::Logout { respond_to })
            .await
    }

    /// The active session, if any.
    pub async fn status(&self) -> Result<Option<SessionInfo>, AtmError> {
        self.request(|respond_to| AtmCommand::Status { respond_to })
            .await
    }

    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}
