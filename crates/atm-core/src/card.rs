//! Card and account identifiers.

use crate::bank::BankBin;
use crate::error::{DomainError, DomainResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Layout of a printed card number; `N` is a digit.
pub const CARD_TEMPLATE: &str = "NNNN-NNNN-NNNN-NNNN";

/// Number of digits on a card.
pub const CARD_DIGITS: usize = 16;

/// Number of digits in a PIN.
pub const PIN_DIGITS: usize = 4;

const GROUP_LEN: usize = 4;

// ============================================================================
// Card Number
// ============================================================================

/// Card number in `NNNN-NNNN-NNNN-NNNN` form.
///
/// Unique within a registry; used as the registry's account key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardNumber(String);

impl CardNumber {
    /// Wraps raw card digits without validation.
    ///
    /// Lookups use this form: an unknown or malformed card simply does not
    /// match any account.
    pub fn new(digits: impl Into<String>) -> Self {
        Self(digits.into())
    }

    /// Parses a card number, requiring the full printed layout.
    pub fn parse(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        let well_formed = value.len() == CARD_TEMPLATE.len()
            && value
                .chars()
                .zip(CARD_TEMPLATE.chars())
                .all(|(c, t)| match t {
                    '-' => c == '-',
                    _ => c.is_ascii_digit(),
                });

        if well_formed {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidCardNumber { value })
        }
    }

    /// Generates a random card number starting with `bin`.
    pub fn generate<R: Rng + ?Sized>(bin: &BankBin, rng: &mut R) -> Self {
        let mut digits = bin.digits();
        while digits.len() < CARD_DIGITS {
            digits.push(char::from(b'0' + rng.gen_range(0..10u8)));
        }

        let mut formatted = String::with_capacity(CARD_TEMPLATE.len());
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && i % GROUP_LEN == 0 {
                formatted.push('-');
            }
            formatted.push(c);
        }
        Self(formatted)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Card number with everything except the last group hidden, for logs.
    #[must_use]
    pub fn masked(&self) -> String {
        let tail = self
            .0
            .get(self.0.len().saturating_sub(GROUP_LEN)..)
            .unwrap_or(&self.0);
        format!("****-****-****-{tail}")
    }
}

impl fmt::Display for CardNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CardNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for CardNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// PIN
// ============================================================================

/// Four-digit personal identification number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pin(String);

impl Pin {
    /// Parses a PIN.
    ///
    /// # Errors
    ///
    /// `DomainError::InvalidPin` unless the value is exactly four ASCII digits.
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        if value.len() == PIN_DIGITS && value.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidPin {
                expected: PIN_DIGITS,
            })
        }
    }

    /// Generates a random PIN, leading zeros included.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(format!("{:04}", rng.gen_range(0..10_000u32)))
    }

    /// Compares against a PIN typed at a terminal.
    #[must_use]
    pub fn matches(&self, attempt: &str) -> bool {
        self.0 == attempt
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Pin {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Pin::new(value)
    }
}

impl From<Pin> for String {
    fn from(pin: Pin) -> Self {
        pin.0
    }
}

// ============================================================================
// Account Number
// ============================================================================

/// Numeric account identifier, unique across a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNo(u64);

impl AccountNo {
    const MIN: u64 = 100_000_000_000_000_000;
    const MAX: u64 = 999_999_999_999_999_999;

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Generates a random 18-digit account number.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.gen_range(Self::MIN..=Self::MAX))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AccountNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
