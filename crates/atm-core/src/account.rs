//! Account record and its transaction history.

use crate::card::{AccountNo, CardNumber, Pin};
use crate::error::TransactionError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single withdrawal.
///
/// `at` is `None` for history loaded from seed data, whose date is unknown;
/// such entries never count toward today's limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub amount: Decimal,
    pub at: Option<DateTime<Utc>>,
}

/// A bank account owned by exactly one registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_no: AccountNo,
    pub card_number: CardNumber,
    pub pin: Pin,
    balance: Decimal,
    deposits: Vec<Decimal>,
    withdrawals: Vec<Withdrawal>,
}

impl Account {
    /// Opens a new account. A positive opening balance is recorded as the
    /// first deposit.
    pub fn open(
        account_no: AccountNo,
        card_number: CardNumber,
        pin: Pin,
        initial_balance: Decimal,
    ) -> Self {
        let deposits = if initial_balance > Decimal::ZERO {
            vec![initial_balance]
        } else {
            Vec::new()
        };
        Self {
            account_no,
            card_number,
            pin,
            balance: initial_balance,
            deposits,
            withdrawals: Vec::new(),
        }
    }

    /// Rebuilds an account from seed data, history included.
    pub fn restore(
        account_no: AccountNo,
        card_number: CardNumber,
        pin: Pin,
        balance: Decimal,
        deposits: Vec<Decimal>,
        withdrawals: Vec<Decimal>,
    ) -> Self {
        Self {
            account_no,
            card_number,
            pin,
            balance,
            deposits,
            withdrawals: withdrawals
                .into_iter()
                .map(|amount| Withdrawal { amount, at: None })
                .collect(),
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn deposits(&self) -> &[Decimal] {
        &self.deposits
    }

    pub fn withdrawals(&self) -> &[Withdrawal] {
        &self.withdrawals
    }

    #[must_use]
    pub fn verify_pin(&self, attempt: &str) -> bool {
        self.pin.matches(attempt)
    }

    /// Credits the account and returns the new balance.
    ///
    /// # Errors
    ///
    /// - `TransactionError::InvalidAmount` if `amount` is not positive
    /// - `TransactionError::AmountOutOfRange` if the balance would overflow
    pub fn deposit(&mut self, amount: Decimal) -> Result<Decimal, TransactionError> {
        ensure_positive(amount)?;
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(TransactionError::AmountOutOfRange { amount })?;

        self.balance = balance;
        self.deposits.push(amount);
        Ok(balance)
    }

    /// Debits the account and returns the new balance.
    ///
    /// The daily limit is checked before the balance: a request that breaks
    /// both rules reports `LimitExceeded`.
    ///
    /// # Errors
    ///
    /// - `TransactionError::InvalidAmount` if `amount` is not positive
    /// - `TransactionError::LimitExceeded` if today's total plus `amount` is over `daily_limit`
    /// - `TransactionError::InsufficientFunds` if `amount` is over the balance
    pub fn withdraw(
        &mut self,
        amount: Decimal,
        daily_limit: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Decimal, TransactionError> {
        ensure_positive(amount)?;
        let withdrawn_today = self.withdrawn_on(now.date_naive());
        let over_limit = withdrawn_today
            .checked_add(amount)
            .map_or(true, |total| total > daily_limit);
        if over_limit {
            debug!(
                card = %self.card_number.masked(),
                %amount,
                %withdrawn_today,
                %daily_limit,
                "Withdrawal over daily limit"
            );
            return Err(TransactionError::LimitExceeded {
                requested: amount,
                limit: daily_limit,
                withdrawn_today,
            });
        }

        let balance = self
            .balance
            .checked_sub(amount)
            .filter(|remaining| !remaining.is_sign_negative())
            .ok_or(TransactionError::InsufficientFunds {
                requested: amount,
                available: self.balance,
            })?;

        self.balance = balance;
        self.withdrawals.push(Withdrawal {
            amount,
            at: Some(now),
        });
        Ok(balance)
    }

    /// Total withdrawn on the given UTC calendar day.
    pub fn withdrawn_on(&self, day: NaiveDate) -> Decimal {
        self.withdrawals
            .iter()
            .filter(|w| w.at.is_some_and(|at| at.date_naive() == day))
            .fold(Decimal::ZERO, |total, w| total.saturating_add(w.amount))
    }

    /// Deposit and withdrawal amounts in the order they happened.
    pub fn transactions(&self) -> Transactions {
        Transactions {
            deposits: self.deposits.clone(),
            withdrawals: self.withdrawals.iter().map(|w| w.amount).collect(),
        }
    }

    /// Snapshot without the PIN, safe to hand to a terminal.
    pub fn view(&self) -> AccountView {
        AccountView {
            account_no: self.account_no,
            card_number: self.card_number.clone(),
            balance: self.balance,
            transactions: self.transactions(),
        }
    }
}

fn ensure_positive(amount: Decimal) -> Result<(), TransactionError> {
    if amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(TransactionError::InvalidAmount { amount })
    }
}

/// Read-only snapshot of an account as shown after login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub account_no: AccountNo,
    pub card_number: CardNumber,
    pub balance: Decimal,
    pub transactions: Transactions,
}

/// Ordered deposit and withdrawal amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transactions {
    pub deposits: Vec<Decimal>,
    pub withdrawals: Vec<Decimal>,
}
