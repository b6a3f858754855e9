//! Executes shell commands against the supervisor and renders replies.
//!
//! Replies are either human-readable lines or, with `--json`, one JSON
//! object per command: `{"ok": true, ...}` or `{"ok": false, "error": ...}`.

use atm_bank::registry::AccountEvent;
use atm_bank::{AtmError, StartOutcome, Supervisor};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::input::{parse_line, Command, HELP};

/// Output style for replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// What the shell loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Print this and keep reading.
    Output(String),
    /// Leave the shell.
    Quit,
}

/// The interactive shell state: the supervisor and output format.
pub struct Shell {
    supervisor: Supervisor,
    format: OutputFormat,
}

impl Shell {
    pub fn new(supervisor: Supervisor, format: OutputFormat) -> Self {
        Self { supervisor, format }
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    /// Parses and executes one line. Returns `None` for blank lines.
    pub async fn execute_line(&mut self, line: &str) -> Option<Reply> {
        match parse_line(line) {
            Ok(Some(command)) => Some(self.execute(command).await),
            Ok(None) => None,
            Err(e) => Some(Reply::Output(self.failure("input", e.to_string()))),
        }
    }

    /// Executes a parsed command.
    pub async fn execute(&mut self, command: Command) -> Reply {
        debug!(?command, "Executing shell command");
        let sup = &mut self.supervisor;

        let outcome: Result<(String, Value), AtmError> = match command {
            Command::Quit => return Reply::Quit,
            Command::Help => Ok((HELP.to_string(), json!({ "help": HELP }))),
            Command::Start { atm } => sup.start_atm(&atm).map(|(_, outcome)| {
                let already_started = outcome == StartOutcome::AlreadyStarted;
                let text = if already_started {
                    format!("ATM {atm} already started")
                } else {
                    format!("ATM {atm} started")
                };
                (text, json!({ "atm": atm, "already_started": already_started }))
            }),
            Command::Login {
                atm,
                card_digits,
                pin,
            } => sup.login(&atm, &card_digits, &pin).await.map(|view| {
                (
                    "✓ ✓ ✓ Successful login ✓ ✓ ✓".to_string(),
                    json!({ "atm": atm, "account": view }),
                )
            }),
            Command::Deposit { atm, amount } => {
                sup.deposit(&atm, amount).await.map(|balance| {
                    (
                        format!("◉ ◉ ◉ Deposited ${amount} successfully ◉ ◉ ◉"),
                        json!({ "atm": atm, "deposited": amount, "balance": balance }),
                    )
                })
            }
            Command::Withdraw { atm, amount } => {
                sup.withdraw(&atm, amount).await.map(|balance| {
                    (
                        format!(
                            "◉ ◉ ◉ Please take ${amount} from the drawer. Balance ${balance} ◉ ◉ ◉"
                        ),
                        json!({ "atm": atm, "withdrawn": amount, "balance": balance }),
                    )
                })
            }
            Command::Balance { atm } => sup.get_balance(&atm).await.map(|balance| {
                (
                    format!("◉ ◉ ◉ Your account balance is {balance} ◉ ◉ ◉"),
                    json!({ "atm": atm, "balance": balance }),
                )
            }),
            Command::Transactions { atm } => sup.get_transactions(&atm).await.map(|tx| {
                (
                    format!(
                        "◉ ◉ ◉ Deposits {} ◉ ◉ ◉\n◉ ◉ ◉ Withdrawals {} ◉ ◉ ◉",
                        list(&tx.deposits),
                        list(&tx.withdrawals)
                    ),
                    json!({ "atm": atm, "transactions": tx }),
                )
            }),
            Command::Logout { atm } => sup.logout(&atm).await.map(|was_logged_in| {
                let text = if was_logged_in {
                    "✌ ✌ ✌ Successful logout ✌ ✌ ✌".to_string()
                } else {
                    "No active session".to_string()
                };
                (text, json!({ "atm": atm, "logged_out": was_logged_in }))
            }),
            Command::Status { atm } => sup.status(&atm).await.map(|session| {
                let text = match &session {
                    Some(s) => format!("{atm}: {} at {}", s.card_number.masked(), s.bank),
                    None => format!("{atm}: logged out"),
                };
                (text, json!({ "atm": atm, "session": session }))
            }),
            Command::CreateAccount {
                bank,
                initial_balance,
            } => sup
                .create_account(&bank, initial_balance)
                .await
                .map(|account| {
                    (
                        format!(
                            "VISA Debit account created: {} (PIN {}, account no. {}, balance {})",
                            account.card_number,
                            account.pin.as_str(),
                            account.account_no,
                            account.balance()
                        ),
                        json!({ "bank": bank, "account": account }),
                    )
                }),
            Command::Banks => {
                let banks = sup.banks().await;
                let text = banks
                    .iter()
                    .map(|b| {
                        format!(
                            "{:<12} bin {:<8} daily limit {:>10}  accounts {}",
                            b.name.as_str(),
                            b.bin.as_str(),
                            b.daily_withdrawal_limit.to_string(),
                            b.accounts
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok((text, json!({ "banks": banks })))
            }
        };

        let rendered = match outcome {
            Ok((text, value)) => self.success(text, value),
            Err(e) => self.failure(error_kind(&e), describe(&e)),
        };
        Reply::Output(rendered)
    }

    fn success(&self, text: String, mut value: Value) -> String {
        match self.format {
            OutputFormat::Text => text,
            OutputFormat::Json => {
                if let Some(obj) = value.as_object_mut() {
                    obj.insert("ok".to_string(), Value::Bool(true));
                }
                value.to_string()
            }
        }
    }

    fn failure(&self, kind: &str, message: String) -> String {
        match self.format {
            OutputFormat::Text => format!("✕ ✕ ✕ {message} ✕ ✕ ✕"),
            OutputFormat::Json => {
                json!({ "ok": false, "error": kind, "message": message }).to_string()
            }
        }
    }

    /// Stops every actor behind the shell.
    pub fn shutdown(&self) {
        self.supervisor.shutdown();
    }
}

/// Renders an amount list as `[1250.54, 8000]`.
fn list(amounts: &[rust_decimal::Decimal]) -> String {
    let items: Vec<String> = amounts.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(", "))
}

/// Stable machine-readable name for an error.
pub fn error_kind(err: &AtmError) -> &'static str {
    match err {
        AtmError::UnknownBank { .. } => "unknown_bank",
        AtmError::UnknownBankName(_) => "unknown_bank_name",
        AtmError::AccountNotFound(_) => "account_not_found",
        AtmError::InvalidPin => "invalid_pin",
        AtmError::NotLoggedIn => "not_logged_in",
        AtmError::InsufficientFunds { .. } => "insufficient_funds",
        AtmError::LimitExceeded { .. } => "limit_exceeded",
        AtmError::InvalidAmount { .. } => "invalid_amount",
        AtmError::AmountOutOfRange { .. } => "amount_out_of_range",
        AtmError::BankFull { .. } => "bank_full",
        AtmError::ShutDown => "shut_down",
        AtmError::UnknownTerminal(_) => "unknown_atm",
        AtmError::ChannelClosed => "unavailable",
    }
}

/// User-facing wording for an error.
pub fn describe(err: &AtmError) -> String {
    match err {
        AtmError::UnknownBank { .. } => "No bank recognizes this card".to_string(),
        AtmError::AccountNotFound(_) => "Account does not exist".to_string(),
        AtmError::InvalidPin => "Invalid PIN".to_string(),
        AtmError::NotLoggedIn => "Proceed to login first".to_string(),
        AtmError::InsufficientFunds { .. } => {
            "Can't withdraw more than current balance".to_string()
        }
        AtmError::LimitExceeded { .. } => {
            "Can't exceed daily withdrawal total. Try with a smaller withdraw amount".to_string()
        }
        other => {
            let mut text = other.to_string();
            if let Some(first) = text.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            text
        }
    }
}

/// Logs every account event from every bank until `cancel` fires.
pub fn spawn_event_log(supervisor: &Supervisor, cancel: CancellationToken) {
    for bank in supervisor.directory().iter() {
        let mut events = bank.subscribe();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = events.recv() => match event {
                        Ok(event) => log_event(&event),
                        Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "Event log lagging");
                        }
                        Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });
    }
}

fn log_event(event: &AccountEvent) {
    let bank = event.bank();
    match event {
        AccountEvent::Created {
            card_number,
            account_no,
            ..
        } => {
            debug!(%bank, card = %card_number.masked(), %account_no, "account created");
        }
        AccountEvent::Deposited {
            card_number,
            amount,
            balance,
            ..
        } => {
            debug!(%bank, card = %card_number.masked(), %amount, %balance, "deposit");
        }
        AccountEvent::Withdrawn {
            card_number,
            amount,
            balance,
            ..
        } => {
            debug!(%bank, card = %card_number.masked(), %amount, %balance, "withdrawal");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atm_bank::config::AtmConfig;

    fn shell(format: OutputFormat) -> Shell {
        let supervisor = Supervisor::start(AtmConfig::builtin().unwrap()).unwrap();
        Shell::new(supervisor, format)
    }

    async fn run(shell: &mut Shell, line: &str) -> String {
        match shell.execute_line(line).await {
            Some(Reply::Output(text)) => text,
            other => panic!("unexpected reply for {line}: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_text_walkthrough() {
        let mut sh = shell(OutputFormat::Text);

        assert_eq!(run(&mut sh, "start atm1").await, "ATM atm1 started");
        assert_eq!(run(&mut sh, "start atm1").await, "ATM atm1 already started");
        assert_eq!(
            run(&mut sh, "withdraw atm1 10").await,
            "✕ ✕ ✕ Proceed to login first ✕ ✕ ✕"
        );
        assert_eq!(
            run(&mut sh, "login atm1 4101-7712-3456-7812 0021").await,
            "✕ ✕ ✕ Account does not exist ✕ ✕ ✕"
        );
        assert_eq!(
            run(&mut sh, "login atm1 4101-7712-3456-7890 1235").await,
            "✕ ✕ ✕ Invalid PIN ✕ ✕ ✕"
        );
        assert_eq!(
            run(&mut sh, "login atm1 4101-7712-3456-7890 0021").await,
            "✓ ✓ ✓ Successful login ✓ ✓ ✓"
        );
        assert_eq!(
            run(&mut sh, "deposit atm1 1250.54").await,
            "◉ ◉ ◉ Deposited $1250.54 successfully ◉ ◉ ◉"
        );
        assert_eq!(
            run(&mut sh, "balance atm1").await,
            "◉ ◉ ◉ Your account balance is 8244.22 ◉ ◉ ◉"
        );
        assert_eq!(
            run(&mut sh, "transactions atm1").await,
            "◉ ◉ ◉ Deposits [1250.54] ◉ ◉ ◉\n◉ ◉ ◉ Withdrawals [] ◉ ◉ ◉"
        );
        assert_eq!(
            run(&mut sh, "withdraw atm1 8000").await,
            "◉ ◉ ◉ Please take $8000 from the drawer. Balance $244.22 ◉ ◉ ◉"
        );
        assert_eq!(
            run(&mut sh, "withdraw atm1 8000").await,
            "✕ ✕ ✕ Can't exceed daily withdrawal total. Try with a smaller withdraw amount ✕ ✕ ✕"
        );
        assert_eq!(
            run(&mut sh, "logout atm1").await,
            "✌ ✌ ✌ Successful logout ✌ ✌ ✌"
        );
    }

    #[tokio::test]
    async fn test_unknown_atm_and_bank() {
        let mut sh = shell(OutputFormat::Text);

        assert_eq!(
            run(&mut sh, "balance atm9").await,
            "✕ ✕ ✕ No ATM named atm9; start it first ✕ ✕ ✕"
        );
        run(&mut sh, "start atm1").await;
        assert_eq!(
            run(&mut sh, "login atm1 9999-0000-0000-0000 0000").await,
            "✕ ✕ ✕ No bank recognizes this card ✕ ✕ ✕"
        );
        assert_eq!(
            run(&mut sh, "create-account banamex 10").await,
            "✕ ✕ ✕ No bank named banamex ✕ ✕ ✕"
        );
    }

    #[tokio::test]
    async fn test_json_replies() {
        let mut sh = shell(OutputFormat::Json);

        run(&mut sh, "start atm1").await;
        let out: Value =
            serde_json::from_str(&run(&mut sh, "login atm1 4134-0655-0011-2233 4321").await)
                .unwrap();
        assert_eq!(out["ok"], true);
        assert_eq!(out["account"]["card_number"], "4134-0655-0011-2233");

        let out: Value =
            serde_json::from_str(&run(&mut sh, "withdraw atm1 9000").await).unwrap();
        assert_eq!(out["ok"], false);
        assert_eq!(out["error"], "limit_exceeded");

        let out: Value = serde_json::from_str(&run(&mut sh, "deposit atm1 x").await).unwrap();
        assert_eq!(out["ok"], false);
        assert_eq!(out["error"], "input");
    }

    #[tokio::test]
    async fn test_create_account_and_banks() {
        let mut sh = shell(OutputFormat::Json);

        let out: Value =
            serde_json::from_str(&run(&mut sh, "create-account hsbc 5000.12").await).unwrap();
        assert_eq!(out["ok"], true);
        let card = out["account"]["card_number"].as_str().unwrap().to_string();
        let pin = out["account"]["pin"].as_str().unwrap().to_string();
        assert!(card.starts_with("4134-06"));

        run(&mut sh, "start atm2").await;
        let out: Value =
            serde_json::from_str(&run(&mut sh, &format!("login atm2 {card} {pin}")).await)
                .unwrap();
        assert_eq!(out["ok"], true);

        let out: Value = serde_json::from_str(&run(&mut sh, "banks").await).unwrap();
        assert_eq!(out["banks"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_oversized_deposit_keeps_bank_running() {
        let mut sh = shell(OutputFormat::Text);

        run(&mut sh, "start atm1").await;
        run(&mut sh, "login atm1 4101-7712-3456-7890 0021").await;
        assert_eq!(
            run(&mut sh, "deposit atm1 79228162514264337593543950335").await,
            "✕ ✕ ✕ Amount out of range: 79228162514264337593543950335 ✕ ✕ ✕"
        );
        assert_eq!(
            run(&mut sh, "balance atm1").await,
            "◉ ◉ ◉ Your account balance is 6993.68 ◉ ◉ ◉"
        );
    }

    #[tokio::test]
    async fn test_start_after_shutdown_is_refused() {
        let mut sh = shell(OutputFormat::Json);
        sh.shutdown();

        let out: Value = serde_json::from_str(&run(&mut sh, "start atm1").await).unwrap();
        assert_eq!(out["ok"], false);
        assert_eq!(out["error"], "shut_down");
    }

    #[tokio::test]
    async fn test_quit_and_blank() {
        let mut sh = shell(OutputFormat::Text);
        assert_eq!(sh.execute_line("   ").await, None);
        assert_eq!(sh.execute_line("quit").await, Some(Reply::Quit));
    }

    #[test]
    fn test_describe_capitalizes_fallback() {
        assert_eq!(
            describe(&AtmError::ChannelClosed),
            "Response channel closed"
        );
        assert_eq!(error_kind(&AtmError::InvalidPin), "invalid_pin");
        assert_eq!(
            describe(&AtmError::InvalidAmount {
                amount: rust_decimal::Decimal::NEGATIVE_ONE
            }),
            "Invalid amount: -1"
        );
    }
}
