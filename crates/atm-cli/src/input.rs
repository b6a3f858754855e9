//! Line parsing for the interactive shell.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

// ============================================================================
// Commands
// ============================================================================

/// A parsed shell command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start (or reuse) a named ATM.
    Start { atm: String },

    Login {
        atm: String,
        card_digits: String,
        pin: String,
    },

    Deposit { atm: String, amount: Decimal },

    Withdraw { atm: String, amount: Decimal },

    Balance { atm: String },

    Transactions { atm: String },

    Logout { atm: String },

    /// Show who is logged in at an ATM.
    Status { atm: String },

    /// Open an account at a bank.
    CreateAccount {
        bank: String,
        initial_balance: Decimal,
    },

    /// List configured banks.
    Banks,

    Help,

    Quit,
}

/// Usage text printed by `help`.
pub const HELP: &str = "\
Commands:
  start <atm>                           start an ATM
  login <atm> <card-digits> <pin>       log in with a card
  deposit <atm> <amount>                deposit into the logged-in account
  withdraw <atm> <amount>               withdraw from the logged-in account
  balance <atm>                         show the balance
  transactions <atm>                    show deposits and withdrawals
  logout <atm>                          end the session
  status <atm>                          show the active session
  create-account <bank> [balance]       open an account
  banks                                 list banks
  help                                  show this text
  quit                                  leave the shell";

// ============================================================================
// Errors
// ============================================================================

/// Reasons a line cannot be turned into a `Command`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown command: {0} (try 'help')")]
    UnknownCommand(String),

    #[error("{command}: missing <{argument}>")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("{command}: unexpected argument '{extra}'")]
    UnexpectedArgument { command: &'static str, extra: String },

    #[error("invalid amount '{0}' (expected a positive number such as 1250.54)")]
    InvalidAmount(String),
}

// ============================================================================
// Parser
// ============================================================================

/// Parses one input line.
///
/// Returns `Ok(None)` for blank lines and `#` comments.
pub fn parse_line(line: &str) -> Result<Option<Command>, InputError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let mut args = Args {
        command: "",
        words,
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "start" | "start_link" => {
            args.command = "start";
            Command::Start { atm: args.next("atm")? }
        }
        "login" => {
            args.command = "login";
            Command::Login {
                atm: args.next("atm")?,
                card_digits: args.next("card-digits")?,
                pin: args.next("pin")?,
            }
        }
        "deposit" => {
            args.command = "deposit";
            Command::Deposit {
                atm: args.next("atm")?,
                amount: parse_amount(&args.next("amount")?)?,
            }
        }
        "withdraw" => {
            args.command = "withdraw";
            Command::Withdraw {
                atm: args.next("atm")?,
                amount: parse_amount(&args.next("amount")?)?,
            }
        }
        "balance" | "get_balance" => {
            args.command = "balance";
            Command::Balance { atm: args.next("atm")? }
        }
        "transactions" | "get_transactions" => {
            args.command = "transactions";
            Command::Transactions { atm: args.next("atm")? }
        }
        "logout" => {
            args.command = "logout";
            Command::Logout { atm: args.next("atm")? }
        }
        "status" => {
            args.command = "status";
            Command::Status { atm: args.next("atm")? }
        }
        "create-account" | "create_account" => {
            args.command = "create-account";
            let bank = args.next("bank")?;
            let initial_balance = match args.optional() {
                Some(raw) => parse_balance(&raw)?,
                None => Decimal::ZERO,
            };
            Command::CreateAccount {
                bank,
                initial_balance,
            }
        }
        "banks" => {
            args.command = "banks";
            Command::Banks
        }
        "help" | "?" => {
            args.command = "help";
            Command::Help
        }
        "quit" | "exit" => {
            args.command = "quit";
            Command::Quit
        }
        other => return Err(InputError::UnknownCommand(other.to_string())),
    };

    args.finish()?;
    Ok(Some(command))
}

/// Parses a deposit or withdrawal amount; must be strictly positive.
pub fn parse_amount(raw: &str) -> Result<Decimal, InputError> {
    match parse_decimal(raw) {
        Some(amount) if amount > Decimal::ZERO => Ok(amount),
        _ => Err(InputError::InvalidAmount(raw.to_string())),
    }
}

/// Parses an opening balance; zero is allowed.
fn parse_balance(raw: &str) -> Result<Decimal, InputError> {
    match parse_decimal(raw) {
        Some(amount) if !amount.is_sign_negative() => Ok(amount),
        _ => Err(InputError::InvalidAmount(raw.to_string())),
    }
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim_start_matches('$')).ok()
}

/// Positional argument reader for one command.
struct Args<'a> {
    command: &'static str,
    words: std::str::SplitWhitespace<'a>,
}

impl Args<'_> {
    fn next(&mut self, argument: &'static str) -> Result<String, InputError> {
        self.words
            .next()
            .map(str::to_string)
            .ok_or(InputError::MissingArgument {
                command: self.command,
                argument,
            })
    }

    fn optional(&mut self) -> Option<String> {
        self.words.next().map(str::to_string)
    }

    fn finish(mut self) -> Result<(), InputError> {
        match self.words.next() {
            Some(extra) => Err(InputError::UnexpectedArgument {
                command: self.command,
                extra: extra.to_string(),
            }),
            None => Ok(()),
        }
    }
}
