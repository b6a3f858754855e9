//! Registry actor - owns one bank's accounts and processes commands.
//!
//! The RegistryActor is the single owner of its bank's account map.
//! It receives commands via an mpsc channel and publishes events via broadcast.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations use `?`, pattern matching, or `ok_or`
//! - Channel send failures are ignored, never panicked on

use std::collections::{HashMap, HashSet};

use atm_core::{
    Account, AccountNo, AccountView, BankBin, BankName, CardNumber, Pin, Transactions,
};
use chrono::Utc;
use rand::rngs::StdRng;
use rust_decimal::Decimal;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::commands::{AccountEvent, BankInfo, RegistryCommand};
use crate::config::BankSetup;
use crate::error::AtmError;

// ============================================================================
// Registry Actor
// ============================================================================

/// The registry actor - owns all accounts of one bank.
///
/// Receives commands via mpsc channel, processes them one at a time, and
/// publishes events to subscribers. Two deposits to the same card are
/// therefore totally ordered by the command queue.
///
/// # Ownership
///
/// The actor owns:
/// - `accounts`: card number → account
/// - `account_nos`: account numbers in use, for uniqueness on creation
pub struct RegistryActor {
    /// Command receiver
    receiver: mpsc::Receiver<RegistryCommand>,

    name: BankName,
    bin: BankBin,
    daily_withdrawal_limit: Decimal,

    accounts: HashMap<CardNumber, Account>,
    account_nos: HashSet<AccountNo>,

    /// Source of card numbers, PINs and account numbers
    rng: StdRng,

    /// Event publisher for account changes
    event_publisher: broadcast::Sender<AccountEvent>,
}

impl RegistryActor {
    /// Creates a registry actor seeded with the bank's configured accounts.
    pub fn new(
        setup: BankSetup,
        receiver: mpsc::Receiver<RegistryCommand>,
        event_publisher: broadcast::Sender<AccountEvent>,
        rng: StdRng,
    ) -> Self {
        let account_nos = setup.accounts.iter().map(|a| a.account_no).collect();
        let accounts = setup
            .accounts
            .into_iter()
            .map(|a| (a.card_number.clone(), a))
            .collect();

        Self {
            receiver,
            name: setup.name,
            bin: setup.bin,
            daily_withdrawal_limit: setup.daily_withdrawal_limit,
            accounts,
            account_nos,
            rng,
            event_publisher,
        }
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until the channel closes (all handles dropped) or
    /// `cancel` fires. Call this in a spawned task.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            bank = %self.name,
            bin = %self.bin,
            accounts = self.accounts.len(),
            "Bank connection established"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(bank = %self.name, "Registry cancelled");
                    break;
                }
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
            }
        }

        info!(
            bank = %self.name,
            accounts = self.accounts.len(),
            "Registry actor stopped"
        );
    }

    /// Dispatches a command to the appropriate handler.
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::CreateAccount {
                initial_balance,
                respond_to,
            } => {
                let result = self.handle_create_account(initial_balance);
                // Ignore send error - caller may have dropped the receiver
                let _ = respond_to.send(result);
            }
            RegistryCommand::Login {
                card_number,
                pin,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_login(&card_number, &pin));
            }
            RegistryCommand::Deposit {
                card_number,
                amount,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_deposit(&card_number, amount));
            }
            RegistryCommand::Withdraw {
                card_number,
                amount,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_withdraw(&card_number, amount));
            }
            RegistryCommand::GetBalance {
                card_number,
                respond_to,
            } => {
                let result = self.account(&card_number).map(Account::balance);
                let _ = respond_to.send(result);
            }
            RegistryCommand::GetTransactions {
                card_number,
                respond_to,
            } => {
                let result: Result<Transactions, AtmError> =
                    self.account(&card_number).map(Account::transactions);
                let _ = respond_to.send(result);
            }
            RegistryCommand::GetAccount {
                card_number,
                respond_to,
            } => {
                let view: Option<AccountView> = self.accounts.get(&card_number).map(Account::view);
                let _ = respond_to.send(view);
            }
            RegistryCommand::Info { respond_to } => {
                let _ = respond_to.send(self.info());
            }
        }
    }

    // ========================================================================
    // Command Handlers
    // ========================================================================

    /// Opens an account under a fresh card number and account number.
    fn handle_create_account(&mut self, initial_balance: Decimal) -> Result<Account, AtmError> {
        if initial_balance.is_sign_negative() {
            return Err(AtmError::InvalidAmount {
                amount: initial_balance,
            });
        }
        // Every account in the map carries this bank's bin.
        let issued = u64::try_from(self.accounts.len()).unwrap_or(u64::MAX);
        if issued >= self.bin.card_capacity() {
            warn!(bank = %self.name, bin = %self.bin, "No card numbers left under bin");
            return Err(AtmError::BankFull {
                bank: self.name.clone(),
            });
        }

        let card_number = loop {
            let candidate = CardNumber::generate(&self.bin, &mut self.rng);
            if !self.accounts.contains_key(&candidate) {
                break candidate;
            }
        };
        let account_no = loop {
            let candidate = AccountNo::generate(&mut self.rng);
            if self.account_nos.insert(candidate) {
                break candidate;
            }
        };
        let pin = Pin::generate(&mut self.rng);

        let account = Account::open(account_no, card_number.clone(), pin, initial_balance);
        self.accounts.insert(card_number.clone(), account.clone());

        info!(
            bank = %self.name,
            card = %card_number.masked(),
            %account_no,
            %initial_balance,
            total_accounts = self.accounts.len(),
            "Account created"
        );

        let _ = self.event_publisher.send(AccountEvent::Created {
            bank: self.name.clone(),
            card_number,
            account_no,
        });

        Ok(account)
    }

    fn handle_login(&self, card_number: &CardNumber, pin: &str) -> Result<AccountView, AtmError> {
        let account = self.account(card_number)?;
        if !account.verify_pin(pin) {
            warn!(bank = %self.name, card = %card_number.masked(), "Invalid PIN");
            return Err(AtmError::InvalidPin);
        }
        debug!(bank = %self.name, card = %card_number.masked(), "Login accepted");
        Ok(account.view())
    }

    fn handle_deposit(
        &mut self,
        card_number: &CardNumber,
        amount: Decimal,
    ) -> Result<Decimal, AtmError> {
        let account = self.account_mut(card_number)?;
        let balance = account.deposit(amount)?;

        debug!(bank = %self.name, card = %card_number.masked(), %amount, %balance, "Deposit");
        let _ = self.event_publisher.send(AccountEvent::Deposited {
            bank: self.name.clone(),
            card_number: card_number.clone(),
            amount,
            balance,
        });
        Ok(balance)
    }

    fn handle_withdraw(
        &mut self,
        card_number: &CardNumber,
        amount: Decimal,
    ) -> Result<Decimal, AtmError> {
        let limit = self.daily_withdrawal_limit;
        let account = self.account_mut(card_number)?;
        let balance = account.withdraw(amount, limit, Utc::now())?;

        debug!(bank = %self.name, card = %card_number.masked(), %amount, %balance, "Withdrawal");
        let _ = self.event_publisher.send(AccountEvent::Withdrawn {
            bank: self.name.clone(),
            card_number: card_number.clone(),
            amount,
            balance,
        });
        Ok(balance)
    }

    fn info(&self) -> BankInfo {
        BankInfo {
            name: self.name.clone(),
            bin: self.bin.clone(),
            daily_withdrawal_limit: self.daily_withdrawal_limit,
            accounts: self.accounts.len(),
        }
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    fn account(&self, card_number: &CardNumber) -> Result<&Account, AtmError> {
        self.accounts
            .get(card_number)
            .ok_or_else(|| AtmError::AccountNotFound(card_number.clone()))
    }

    fn account_mut(&mut self, card_number: &CardNumber) -> Result<&mut Account, AtmError> {
        self.accounts
            .get_mut(card_number)
            .ok_or_else(|| AtmError::AccountNotFound(card_number.clone()))
    }
}
