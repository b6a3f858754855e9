//! Terminal actor - one ATM holding at most one logged-in session.
//!
//! The actor processes its commands one at a time, so session transitions
//! are serialized. Requests made while logged in are forwarded to the
//! registry remembered at login, using the remembered card number.

use atm_core::{AccountView, CardNumber, Transactions};
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::commands::{AtmCommand, Session};
use crate::directory::BankDirectory;
use crate::error::AtmError;
use crate::registry::RegistryHandle;

/// The terminal actor - owns one session.
pub struct AtmActor {
    name: String,
    receiver: mpsc::Receiver<AtmCommand>,
    directory: BankDirectory,
    session: Session,
}

impl AtmActor {
    /// Creates a terminal in the `LoggedOut` state.
    pub fn new(
        name: impl Into<String>,
        receiver: mpsc::Receiver<AtmCommand>,
        directory: BankDirectory,
    ) -> Self {
        Self {
            name: name.into(),
            receiver,
            directory,
            session: Session::LoggedOut,
        }
    }

    /// Runs the actor event loop until the channel closes or `cancel` fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(atm = %self.name, "ATM started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
            }
        }

        info!(atm = %self.name, "ATM stopped");
    }

    async fn handle_command(&mut self, cmd: AtmCommand) {
        match cmd {
            AtmCommand::Login {
                card_digits,
                pin,
                respond_to,
            } => {
                let result = self.handle_login(card_digits, pin).await;
                let _ = respond_to.send(result);
            }
            AtmCommand::Deposit { amount, respond_to } => {
                let result = match self.active() {
                    Ok((card, registry)) => registry.deposit(card, amount).await,
                    Err(e) => Err(e),
                };
                let _ = respond_to.send(result);
            }
            AtmCommand::Withdraw { amount, respond_to } => {
                let result = match self.active() {
                    Ok((card, registry)) => registry.withdraw(card, amount).await,
                    Err(e) => Err(e),
                };
                let _ = respond_to.send(result);
            }
            AtmCommand::GetBalance { respond_to } => {
                let result: Result<Decimal, AtmError> = match self.active() {
                    Ok((card, registry)) => registry.get_balance(card).await,
                    Err(e) => Err(e),
                };
                let _ = respond_to.send(result);
            }
            AtmCommand::GetTransactions { respond_to } => {
                let result: Result<Transactions, AtmError> = match self.active() {
                    Ok((card, registry)) => registry.get_transactions(card).await,
                    Err(e) => Err(e),
                };
                let _ = respond_to.send(result);
            }
            AtmCommand::Logout { respond_to } => {
                let _ = respond_to.send(self.handle_logout());
            }
            AtmCommand::Status { respond_to } => {
                let _ = respond_to.send(self.session.info());
            }
        }
    }

    /// Routes by bin and delegates to the registry.
    ///
    /// The session only changes when the registry accepts the login.
    async fn handle_login(
        &mut self,
        card_digits: String,
        pin: String,
    ) -> Result<AccountView, AtmError> {
        let registry = self.directory.route(&card_digits)?.clone();
        let card_number = CardNumber::new(card_digits);

        let view = registry.login(card_number.clone(), pin).await?;

        info!(
            atm = %self.name,
            bank = %registry.name(),
            card = %card_number.masked(),
            "Successful login"
        );
        self.session = Session::LoggedIn {
            card_number,
            registry,
        };
        Ok(view)
    }

    fn handle_logout(&mut self) -> bool {
        let was_logged_in = self.session.is_logged_in();
        self.session = Session::LoggedOut;
        if was_logged_in {
            info!(atm = %self.name, "Successful logout");
        } else {
            debug!(atm = %self.name, "Logout with no active session");
        }
        was_logged_in
    }

    /// The remembered card and registry, or `NotLoggedIn`.
    fn active(&self) -> Result<(CardNumber, RegistryHandle), AtmError> {
        match &self.session {
            Session::LoggedIn {
                card_number,
                registry,
            } => Ok((card_number.clone(), registry.clone())),
            Session::LoggedOut => Err(AtmError::NotLoggedIn),
        }
    }
}
