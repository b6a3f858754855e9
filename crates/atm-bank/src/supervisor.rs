//! Composition root: starts every bank registry and the named terminals.
//!
//! The supervisor owns the `BankDirectory` and the terminal table, and hands
//! the directory to each terminal it starts. Cancelling its token stops every
//! actor it spawned.

use std::collections::HashMap;

use atm_core::{Account, AccountView, Transactions};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{AtmConfig, BankSetup, ConfigError};
use crate::directory::BankDirectory;
use crate::error::AtmError;
use crate::registry::{spawn_registry, BankInfo};
use crate::terminal::{spawn_atm, AtmHandle, SessionInfo};

/// Result of asking for a terminal by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new terminal actor was spawned.
    Started,
    /// A running terminal with this name already existed and is reused.
    AlreadyStarted,
}

/// Owns the running registries and terminals.
pub struct Supervisor {
    directory: BankDirectory,
    terminals: HashMap<String, AtmHandle>,
    cancel: CancellationToken,
}

impl Supervisor {
    /// Validates the config and spawns one registry per bank.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: AtmConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_banks(config.into_banks()?))
    }

    /// Spawns one registry per already-validated bank.
    pub fn from_banks(banks: Vec<BankSetup>) -> Self {
        let cancel = CancellationToken::new();
        let handles = banks
            .into_iter()
            .map(|bank| spawn_registry(bank, cancel.child_token()))
            .collect();
        let directory = BankDirectory::new(handles);

        info!(banks = directory.len(), "Bank registries started");

        Self {
            directory,
            terminals: HashMap::new(),
            cancel,
        }
    }

    pub fn directory(&self) -> &BankDirectory {
        &self.directory
    }

    /// Starts the terminal `name`, or returns the running one.
    ///
    /// A terminal whose actor has stopped is replaced by a fresh, logged-out
    /// one.
    ///
    /// # Errors
    ///
    /// `AtmError::ShutDown` once `shutdown` has been called.
    pub fn start_atm(&mut self, name: &str) -> Result<(AtmHandle, StartOutcome), AtmError> {
        if self.cancel.is_cancelled() {
            return Err(AtmError::ShutDown);
        }
        if let Some(existing) = self.terminals.get(name) {
            if existing.is_connected() {
                return Ok((existing.clone(), StartOutcome::AlreadyStarted));
            }
            warn!(atm = %name, "ATM actor had stopped, restarting");
        }

        let handle = spawn_atm(name, self.directory.clone(), self.cancel.child_token());
        self.terminals.insert(name.to_string(), handle.clone());
        Ok((handle, StartOutcome::Started))
    }

    /// Looks up a started terminal.
    ///
    /// # Errors
    ///
    /// `AtmError::UnknownTerminal` if `start_atm` was never called for `name`.
    pub fn atm(&self, name: &str) -> Result<&AtmHandle, AtmError> {
        self.terminals
            .get(name)
            .ok_or_else(|| AtmError::UnknownTerminal(name.to_string()))
    }

    /// Names of started terminals, sorted.
    pub fn atm_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.terminals.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub async fn login(
        &self,
        atm: &str,
        card_digits: &str,
        pin: &str,
    ) -> Result<AccountView, AtmError> {
        self.atm(atm)?.login(card_digits, pin).await
    }

    pub async fn deposit(&self, atm: &str, amount: Decimal) -> Result<Decimal, AtmError> {
        self.atm(atm)?.deposit(amount).await
    }

    pub async fn withdraw(&self, atm: &str, amount: Decimal) -> Result<Decimal, AtmError> {
        self.atm(atm)?.withdraw(amount).await
    }

    pub async fn get_balance(&self, atm: &str) -> Result<Decimal, AtmError> {
        self.atm(atm)?.get_balance().await
    }

    pub async fn get_transactions(&self, atm: &str) -> Result<Transactions, AtmError> {
        self.atm(atm)?.get_transactions().await
    }

    pub async fn logout(&self, atm: &str) -> Result<bool, AtmError> {
        self.atm(atm)?.logout().await
    }

    pub async fn status(&self, atm: &str) -> Result<Option<SessionInfo>, AtmError> {
        self.atm(atm)?.status().await
    }

    /// Opens an account at the named bank.
    pub async fn create_account(
        &self,
        bank: &str,
        initial_balance: Decimal,
    ) -> Result<Account, AtmError> {
        self.directory
            .by_name(bank)?
            .create_account(initial_balance)
            .await
    }

    /// Describes every running bank, in configuration order.
    pub async fn banks(&self) -> Vec<BankInfo> {
        let mut infos = Vec::with_capacity(self.directory.len());
        for bank in self.directory.iter() {
            match bank.info().await {
                Ok(info) => infos.push(info),
                Err(e) => warn!(bank = %bank.name(), error = %e, "Bank did not answer"),
            }
        }
        infos
    }

    /// Stops every registry and terminal.
    pub fn shutdown(&self) {
        info!("Shutting down registries and ATMs");
        self.cancel.cancel();
    }
}
