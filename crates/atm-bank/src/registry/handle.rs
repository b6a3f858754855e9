//! Client interface for interacting with a RegistryActor.
//!
//! The `RegistryHandle` provides a cheap-to-clone interface for sending
//! commands to one bank's registry and subscribing to its account events.
//! It also carries the bank's name and bin so routing needs no round trip.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Channel errors are mapped to `AtmError::ChannelClosed`

use atm_core::{Account, AccountView, BankBin, BankName, CardNumber, Transactions};
use rust_decimal::Decimal;
use tokio::sync::{broadcast, mpsc, oneshot};

use super::commands::{AccountEvent, BankInfo, RegistryCommand};
use crate::error::AtmError;

// ============================================================================
// Registry Handle
// ============================================================================

/// Handle for interacting with a registry actor.
///
/// This is a cheap-to-clone handle that can be shared across tasks.
/// All request methods are async and communicate with the actor via channels.
///
/// # Usage
///
/// ```ignore
/// let account = bancomer.create_account(dec!(5000.12)).await?;
/// bancomer.deposit(account.card_number.clone(), dec!(100)).await?;
///
/// let mut rx = bancomer.subscribe();
/// while let Ok(event) = rx.recv().await {
///     // Handle event
/// }
/// ```
#[derive(Clone)]
pub struct RegistryHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<RegistryCommand>,

    /// Event broadcaster for subscribing to updates
    event_sender: broadcast::Sender<AccountEvent>,

    name: BankName,
    bin: BankBin,
}

impl RegistryHandle {
    /// Create a new registry handle.
    pub fn new(
        sender: mpsc::Sender<RegistryCommand>,
        event_sender: broadcast::Sender<AccountEvent>,
        name: BankName,
        bin: BankBin,
    ) -> Self {
        Self {
            sender,
            event_sender,
            name,
            bin,
        }
    }

    pub fn name(&self) -> &BankName {
        &self.name
    }

    pub fn bin(&self) -> &BankBin {
        &self.bin
    }

    /// Sends a command and waits for its reply.
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RegistryCommand,
    ) -> Result<T, AtmError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(make(tx))
            .await
            .map_err(|_| AtmError::ChannelClosed)?;

        rx.await.map_err(|_| AtmError::ChannelClosed)
    }

    /// Open a new account and return its full record, PIN included.
    ///
    /// # Errors
    ///
    /// - `AtmError::ChannelClosed` if the actor has shut down
    pub async fn create_account(&self, initial_balance: Decimal) -> Result<Account, AtmError> {
        self.request(|respond_to| RegistryCommand::CreateAccount {
            initial_balance,
            respond_to,
        })
        .await?
    }

    /// Check a card and PIN against this bank.
    ///
    /// # Errors
    ///
    /// - `AtmError::AccountNotFound` if the card is unknown
    /// - `AtmError::InvalidPin` if the PIN does not match
    /// - `AtmError::ChannelClosed` if the actor has shut down
    pub async fn login(
        &self,
        card_number: CardNumber,
        pin: impl Into<String>,
    ) -> Result<AccountView, AtmError> {
        let pin = pin.into();
        self.request(|respond_to| RegistryCommand::Login {
            card_number,
            pin,
            respond_to,
        })
        .await?
    }

    /// Credit an account, returning the new balance.
    ///
    /// # Errors
    ///
    /// - `AtmError::AccountNotFound` if the card is unknown
    /// - `AtmError::InvalidAmount` if the amount is not positive
    /// - `AtmError::AmountOutOfRange` if the balance would overflow
    /// - `AtmError::ChannelClosed` if the actor has shut down
    pub async fn deposit(
        &self,
        card_number: CardNumber,
        amount: Decimal,
    ) -> Result<Decimal, AtmError> {
        self.request(|respond_to| RegistryCommand::Deposit {
            card_number,
            amount,
            respond_to,
        })
        .await?
    }

    /// Debit an account, returning the new balance.
    ///
    /// # Errors
    ///
    /// - `AtmError::AccountNotFound` if the card is unknown
    /// - `AtmError::LimitExceeded` if today's withdrawals would pass the limit
    /// - `AtmError::InsufficientFunds` if the amount exceeds the balance
    /// - `AtmError::ChannelClosed` if the actor has shut down
    pub async fn withdraw(
        &self,
        card_number: CardNumber,
        amount: Decimal,
    ) -> Result<Decimal, AtmError> {
        self.request(|respond_to| RegistryCommand::Withdraw {
            card_number,
            amount,
            respond_to,
        })
        .await?
    }

    /// Read the balance of an account.
    pub async fn get_balance(&self, card_number: CardNumber) -> Result<Decimal, AtmError> {
        self.request(|respond_to| RegistryCommand::GetBalance {
            card_number,
            respond_to,
        })
        .await?
    }

    /// Read the deposit and withdrawal history of an account.
    pub async fn get_transactions(
        &self,
        card_number: CardNumber,
    ) -> Result<Transactions, AtmError> {
        self.request(|respond_to| RegistryCommand::GetTransactions {
            card_number,
            respond_to,
        })
        .await?
    }

    /// Get a full account snapshot.
    ///
    /// Returns `None` if the card is unknown or if communication with the
    /// actor fails.
    pub async fn get_account(&self, card_number: CardNumber) -> Option<AccountView> {
        self.request(|respond_to| RegistryCommand::GetAccount {
            card_number,
            respond_to,
        })
        .await
        .ok()?
    }

    /// Describe the bank.
    pub async fn info(&self) -> Result<BankInfo, AtmError> {
        self.request(|respond_to| RegistryCommand::Info { respond_to })
            .await
    }

    /// Subscribe to account events.
    ///
    /// This is a synchronous operation - it doesn't communicate with the actor.
    pub fn subscribe(&self) -> broadcast::Receiver<AccountEvent> {
        self.event_sender.subscribe()
    }

    /// Check if the actor is still running.
    ///
    /// Returns `true` if the command channel is still open.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

impl std::fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryHandle")
            .field("name", &self.name)
            .field("bin", &self.bin)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn create_test_handle() -> (RegistryHandle, mpsc::Receiver<RegistryCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, _event_rx) = broadcast::channel(16);
        let handle = RegistryHandle::new(
            cmd_tx,
            event_tx,
            BankName::new("bancomer"),
            BankBin::new("4101-77").unwrap(),
        );
        (handle, cmd_rx)
    }

    #[tokio::test]
    async fn test_handle_is_clone() {
        let (handle, _rx) = create_test_handle();
        let cloned = handle.clone();
        assert_eq!(cloned.name().as_str(), "bancomer");
        assert_eq!(cloned.bin().as_str(), "4101-77");
    }

    #[tokio::test]
    async fn test_withdraw_sends_command() {
        let (handle, mut rx) = create_test_handle();

        let cmd_handler = tokio::spawn(async move {
            if let Some(RegistryCommand::Withdraw {
                card_number,
                amount,
                respond_to,
            }) = rx.recv().await
            {
                assert_eq!(card_number.as_str(), "4101-7712-3456-7890");
                assert_eq!(amount, dec!(8000));
                let _ = respond_to.send(Ok(dec!(244.22)));
                return true;
            }
            false
        });

        let result = handle
            .withdraw(CardNumber::new("4101-7712-3456-7890"), dec!(8000))
            .await;
        assert_eq!(result, Ok(dec!(244.22)));
        assert!(cmd_handler.await.unwrap());
    }

    #[tokio::test]
    async fn test_login_passes_through_registry_error() {
        let (handle, mut rx) = create_test_handle();

        tokio::spawn(async move {
            if let Some(RegistryCommand::Login {
                pin, respond_to, ..
            }) = rx.recv().await
            {
                assert_eq!(pin, "1235");
                let _ = respond_to.send(Err(AtmError::InvalidPin));
            }
        });

        let result = handle
            .login(CardNumber::new("4101-7712-3456-7890"), "1235")
            .await;
        assert_eq!(result, Err(AtmError::InvalidPin));
    }

    #[tokio::test]
    async fn test_deposit_channel_closed_error() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        let result = handle.deposit(CardNumber::new("4101-7712-3456-7890"), dec!(1)).await;
        assert_eq!(result, Err(AtmError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_dropped_reply_is_channel_closed() {
        let (handle, mut rx) = create_test_handle();

        tokio::spawn(async move {
            // Receive and drop without replying
            let _ = rx.recv().await;
        });

        let result = handle.get_balance(CardNumber::new("4101-7712-3456-7890")).await;
        assert_eq!(result, Err(AtmError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_get_account_returns_none_on_channel_close() {
        let (handle, rx) = create_test_handle();
        drop(rx);

        let result = handle.get_account(CardNumber::new("4101-7712-3456-7890")).await;
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_is_connected() {
        let (handle, rx) = create_test_handle();
        assert!(handle.is_connected());

        drop(rx);
        assert!(!handle.is_connected());
    }
}
