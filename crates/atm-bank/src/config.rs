//! Bank definitions loaded from TOML.
//!
//! A config file lists every bank the supervisor starts, with its bin,
//! daily withdrawal limit and seed accounts:
//!
//! ```toml
//! [[banks]]
//! name = "bancomer"
//! bin = "4101-77"
//! daily_withdrawal_limit = "8000"
//!
//! [[banks.accounts]]
//! card_number = "4101-7712-3456-7890"
//! pin = "0021"
//! account_no = 137343541081659130
//! balance = "6993.68"
//! ```
//!
//! Amounts may be written as strings or numbers; strings keep the exact
//! decimal value.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use atm_core::{Account, AccountNo, BankBin, BankName, CardNumber, Pin};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Banks shipped with the simulator.
const BUILTIN_CONFIG: &str = include_str!("../banks.toml");

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while loading or validating bank configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config defines no banks")]
    NoBanks,

    #[error("bank {0} is defined more than once")]
    DuplicateBank(String),

    #[error("bins {first} and {second} overlap; card routing would be ambiguous")]
    OverlappingBins { first: BankBin, second: BankBin },

    #[error("bank {bank}: {field} must not be negative")]
    NegativeAmount { bank: String, field: String },

    #[error("bank {bank}: card {card} is malformed")]
    MalformedCard { bank: String, card: String },

    #[error("bank {bank}: card {card} does not start with bin {bin}")]
    CardOutsideBin {
        bank: String,
        card: String,
        bin: BankBin,
    },

    #[error("bank {bank}: card {card} is seeded more than once")]
    DuplicateCard { bank: String, card: String },

    #[error("bank {bank}: account number {account_no} is seeded more than once")]
    DuplicateAccountNo { bank: String, account_no: u64 },
}

// ============================================================================
// Raw Config
// ============================================================================

/// Top-level config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AtmConfig {
    pub banks: Vec<BankConfig>,
}

/// One `[[banks]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct BankConfig {
    pub name: String,
    pub bin: BankBin,
    pub daily_withdrawal_limit: Decimal,
    #[serde(default)]
    pub accounts: Vec<SeedAccount>,
}

/// One `[[banks.accounts]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedAccount {
    pub card_number: String,
    pub pin: Pin,
    pub account_no: u64,
    pub balance: Decimal,
    #[serde(default)]
    pub deposits: Vec<Decimal>,
    #[serde(default)]
    pub withdrawals: Vec<Decimal>,
}

/// A validated bank, ready to hand to a registry actor.
#[derive(Debug, Clone)]
pub struct BankSetup {
    pub name: BankName,
    pub bin: BankBin,
    pub daily_withdrawal_limit: Decimal,
    pub accounts: Vec<Account>,
}

impl AtmConfig {
    /// The built-in banks: bancomer, santander and hsbc.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUILTIN_CONFIG)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Reads and parses a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded bank config");
        Self::from_toml_str(&raw)
    }

    /// Validates the config and converts it into per-bank setups.
    ///
    /// # Errors
    ///
    /// Fails on the first problem found: no banks, duplicate bank names,
    /// overlapping bins, negative amounts, or seed cards that are malformed,
    /// duplicated or outside their bank's bin.
    pub fn into_banks(self) -> Result<Vec<BankSetup>, ConfigError> {
        if self.banks.is_empty() {
            return Err(ConfigError::NoBanks);
        }

        let mut names = HashSet::new();
        for (i, bank) in self.banks.iter().enumerate() {
            if !names.insert(bank.name.as_str()) {
                return Err(ConfigError::DuplicateBank(bank.name.clone()));
            }
            for other in self.banks.iter().skip(i + 1) {
                if bank.bin.overlaps(&other.bin) {
                    return Err(ConfigError::OverlappingBins {
                        first: bank.bin.clone(),
                        second: other.bin.clone(),
                    });
                }
            }
        }

        self.banks.into_iter().map(BankConfig::into_setup).collect()
    }
}

impl BankConfig {
    fn into_setup(self) -> Result<BankSetup, ConfigError> {
        if self.daily_withdrawal_limit.is_sign_negative() {
            return Err(ConfigError::NegativeAmount {
                bank: self.name,
                field: "daily_withdrawal_limit".to_string(),
            });
        }

        let mut cards = HashSet::new();
        let mut account_nos = HashSet::new();
        let mut accounts = Vec::with_capacity(self.accounts.len());

        for seed in self.accounts {
            let card = CardNumber::parse(seed.card_number.as_str()).map_err(|_| {
                ConfigError::MalformedCard {
                    bank: self.name.clone(),
                    card: seed.card_number.clone(),
                }
            })?;
            if !self.bin.matches(card.as_str()) {
                return Err(ConfigError::CardOutsideBin {
                    bank: self.name,
                    card: seed.card_number,
                    bin: self.bin,
                });
            }
            if !cards.insert(card.clone()) {
                return Err(ConfigError::DuplicateCard {
                    bank: self.name,
                    card: seed.card_number,
                });
            }
            if !account_nos.insert(seed.account_no) {
                return Err(ConfigError::DuplicateAccountNo {
                    bank: self.name,
                    account_no: seed.account_no,
                });
            }
            let negative = seed.balance.is_sign_negative()
                || seed.deposits.iter().any(Decimal::is_sign_negative)
                || seed.withdrawals.iter().any(Decimal::is_sign_negative);
            if negative {
                return Err(ConfigError::NegativeAmount {
                    bank: self.name,
                    field: format!("account {}", seed.account_no),
                });
            }

            accounts.push(Account::restore(
                AccountNo::new(seed.account_no),
                card,
                seed.pin,
                seed.balance,
                seed.deposits,
                seed.withdrawals,
            ));
        }

        Ok(BankSetup {
            name: BankName::new(self.name),
            bin: self.bin,
            daily_withdrawal_limit: self.daily_withdrawal_limit,
            accounts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    const TWO_BANKS: &str = r#"
        [[banks]]
        name = "alpha"
        bin = "5000-1"
        daily_withdrawal_limit = 500

        [[banks.accounts]]
        card_number = "5000-1000-0000-0001"
        pin = "1111"
        account_no = 1
        balance = "100.50"
        deposits = ["100.50"]

        [[banks]]
        name = "beta"
        bin = "5000-2"
        daily_withdrawal_limit = "750.25"
    "#;

    #[test]
    fn test_builtin_config_is_valid() {
        let banks = AtmConfig::builtin().unwrap().into_banks().unwrap();
        let names: Vec<_> = banks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["bancomer", "santander", "hsbc"]);

        let bancomer = &banks[0];
        assert_eq!(bancomer.bin.as_str(), "4101-77");
        assert_eq!(bancomer.daily_withdrawal_limit, dec!(8000));
        assert_eq!(bancomer.accounts.len(), 1);
        assert_eq!(bancomer.accounts[0].balance(), dec!(6993.68));
        assert!(bancomer.accounts[0].deposits().is_empty());
    }

    #[test]
    fn test_parse_numbers_and_strings() {
        let banks = AtmConfig::from_toml_str(TWO_BANKS)
            .unwrap()
            .into_banks()
            .unwrap();
        assert_eq!(banks[0].daily_withdrawal_limit, dec!(500));
        assert_eq!(banks[1].daily_withdrawal_limit, dec!(750.25));
        assert_eq!(banks[0].accounts[0].deposits(), &[dec!(100.50)]);
        assert!(banks[1].accounts.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_BANKS.as_bytes()).unwrap();

        let config = AtmConfig::load(file.path()).unwrap();
        assert_eq!(config.banks.len(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AtmConfig::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_invalid_bin_rejected_at_parse() {
        let raw = r#"
            [[banks]]
            name = "bad"
            bin = "50-001"
            daily_withdrawal_limit = 1
        "#;
        assert!(matches!(
            AtmConfig::from_toml_str(raw),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_empty_config_rejected() {
        let config = AtmConfig { banks: Vec::new() };
        assert!(matches!(config.into_banks(), Err(ConfigError::NoBanks)));
    }

    #[test]
    fn test_overlapping_bins_rejected() {
        let raw = r#"
            [[banks]]
            name = "a"
            bin = "4101-77"
            daily_withdrawal_limit = 1

            [[banks]]
            name = "b"
            bin = "4101-7"
            daily_withdrawal_limit = 1
        "#;
        let err = AtmConfig::from_toml_str(raw)
            .unwrap()
            .into_banks()
            .unwrap_err();
        assert!(matches!(err, ConfigError::OverlappingBins { .. }));
    }

    #[test]
    fn test_duplicate_bank_rejected() {
        let raw = r#"
            [[banks]]
            name = "a"
            bin = "4101-77"
            daily_withdrawal_limit = 1

            [[banks]]
            name = "a"
            bin = "4331-26"
            daily_withdrawal_limit = 1
        "#;
        let err = AtmConfig::from_toml_str(raw)
            .unwrap()
            .into_banks()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateBank(name) if name == "a"));
    }

    #[test]
    fn test_seed_card_outside_bin_rejected() {
        let raw = r#"
            [[banks]]
            name = "a"
            bin = "4101-77"
            daily_withdrawal_limit = 1

            [[banks.accounts]]
            card_number = "4331-2600-0000-0001"
            pin = "1111"
            account_no = 1
            balance = 0
        "#;
        let err = AtmConfig::from_toml_str(raw)
            .unwrap()
            .into_banks()
            .unwrap_err();
        assert!(matches!(err, ConfigError::CardOutsideBin { .. }));
    }

    #[test]
    fn test_negative_limit_rejected() {
        let raw = r#"
            [[banks]]
            name = "a"
            bin = "4101-77"
            daily_withdrawal_limit = "-5"
        "#;
        let err = AtmConfig::from_toml_str(raw)
            .unwrap()
            .into_banks()
            .unwrap_err();
        assert!(matches!(err, ConfigError::NegativeAmount { .. }));
    }

    #[test]
    fn test_duplicate_seed_card_rejected() {
        let raw = r#"
            [[banks]]
            name = "a"
            bin = "4101-77"
            daily_withdrawal_limit = 1

            [[banks.accounts]]
            card_number = "4101-7700-0000-0001"
            pin = "1111"
            account_no = 1
            balance = 0

            [[banks.accounts]]
            card_number = "4101-7700-0000-0001"
            pin = "2222"
            account_no = 2
            balance = 0
        "#;
        let err = AtmConfig::from_toml_str(raw)
            .unwrap()
            .into_banks()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCard { .. }));
    }
}
