//! Bank identity: symbolic name and card-number prefix.

use crate::card::{CARD_DIGITS, CARD_TEMPLATE};
use crate::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbolic bank name (e.g. "bancomer").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BankName(String);

impl BankName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BankName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BankName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Bank identification number: the card-number prefix that routes a card
/// to its owning registry.
///
/// Written in card notation, e.g. `"4101-77"`. Dashes must sit where the
/// card template puts them so every generated card starts with the bin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BankBin(String);

impl BankBin {
    /// Parses a bin, checking it is a prefix of the `NNNN-NNNN-NNNN-NNNN` template.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidBin` when the value is empty, longer than a
    /// card number, or has a digit or dash out of place.
    pub fn new(value: impl Into<String>) -> DomainResult<Self> {
        let value = value.into();
        let fits_template = !value.is_empty()
            && value.len() < CARD_TEMPLATE.len()
            && value
                .chars()
                .zip(CARD_TEMPLATE.chars())
                .all(|(c, t)| match t {
                    '-' => c == '-',
                    _ => c.is_ascii_digit(),
                });

        if !fits_template {
            return Err(DomainError::InvalidBin {
                value,
                expected: format!("a prefix of {CARD_TEMPLATE}"),
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The digits of the bin with separators removed.
    pub fn digits(&self) -> String {
        self.0.chars().filter(char::is_ascii_digit).collect()
    }

    /// How many distinct card numbers the bin leaves room for.
    pub fn card_capacity(&self) -> u64 {
        let free = CARD_DIGITS.saturating_sub(self.digits().len());
        u32::try_from(free)
            .ok()
            .and_then(|free| 10u64.checked_pow(free))
            .unwrap_or(u64::MAX)
    }

    /// Whether `card_digits` belongs to this bank.
    #[must_use]
    pub fn matches(&self, card_digits: &str) -> bool {
        card_digits.starts_with(&self.0)
    }

    /// Whether routing between the two bins would be ambiguous.
    #[must_use]
    pub fn overlaps(&self, other: &BankBin) -> bool {
        self.0.starts_with(&other.0) || other.0.starts_with(&self.0)
    }
}

impl fmt::Display for BankBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for BankBin {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BankBin::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bin_accepts_template_prefixes() {
        assert!(BankBin::new("4101-77").is_ok());
        assert!(BankBin::new("4").is_ok());
        assert!(BankBin::new("4134-").is_ok());
        assert!(BankBin::new("4331-2600-11").is_ok());
    }

    #[test]
    fn test_bin_rejects_misplaced_separators() {
        assert!(BankBin::new("").is_err());
        assert!(BankBin::new("410-177").is_err());
        assert!(BankBin::new("41017").is_err());
        assert!(BankBin::new("4101-77x").is_err());
        assert!(BankBin::new("4101-7712-3456-7890").is_err());
    }

    #[test]
    fn test_bin_matches_card_prefix() {
        let bin = BankBin::new("4101-77").unwrap();
        assert!(bin.matches("4101-7712-3456-7890"));
        assert!(!bin.matches("4331-2612-3456-7890"));
        assert_eq!(bin.digits(), "410177");
    }

    #[test]
    fn test_bin_card_capacity() {
        assert_eq!(BankBin::new("4101-77").unwrap().card_capacity(), 10_000_000_000);
        assert_eq!(BankBin::new("4101-7712-3456-789").unwrap().card_capacity(), 10);
        assert_eq!(BankBin::new("4").unwrap().card_capacity(), 1_000_000_000_000_000);
    }

    #[test]
    fn test_bin_overlap() {
        let a = BankBin::new("4101-77").unwrap();
        let b = BankBin::new("4101-7").unwrap();
        let c = BankBin::new("4134-06").unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_bin_deserialize_validates() {
        let bin: BankBin = serde_json::from_str("\"4134-06\"").unwrap();
        assert_eq!(bin.as_str(), "4134-06");
        assert!(serde_json::from_str::<BankBin>("\"41-34\"").is_err());
    }
}
