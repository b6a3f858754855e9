//! Explicit directory of running registries.
//!
//! Terminals receive a `BankDirectory` from the supervisor instead of looking
//! banks up by a global name. The directory is fixed once the supervisor has
//! started every bank, so clones share one immutable list.

use std::sync::Arc;

use crate::error::AtmError;
use crate::registry::RegistryHandle;

/// Name and bin-prefix lookup over the running registries.
#[derive(Debug, Clone)]
pub struct BankDirectory {
    banks: Arc<[RegistryHandle]>,
}

impl BankDirectory {
    pub fn new(banks: Vec<RegistryHandle>) -> Self {
        Self {
            banks: banks.into(),
        }
    }

    /// Finds the registry whose bin is a prefix of `card_digits`.
    ///
    /// Bins are validated not to overlap, so at most one registry matches.
    ///
    /// # Errors
    ///
    /// `AtmError::UnknownBank` if no bin matches.
    pub fn route(&self, card_digits: &str) -> Result<&RegistryHandle, AtmError> {
        self.banks
            .iter()
            .find(|bank| bank.bin().matches(card_digits))
            .ok_or_else(|| AtmError::UnknownBank {
                card: card_digits.to_string(),
            })
    }

    /// Finds a registry by bank name.
    ///
    /// # Errors
    ///
    /// `AtmError::UnknownBankName` if no bank has this name.
    pub fn by_name(&self, name: &str) -> Result<&RegistryHandle, AtmError> {
        self.banks
            .iter()
            .find(|bank| bank.name().as_str() == name)
            .ok_or_else(|| AtmError::UnknownBankName(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegistryHandle> {
        self.banks.iter()
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atm_core::{BankBin, BankName};
    use tokio::sync::{broadcast, mpsc};

    fn handle(name: &str, bin: &str) -> RegistryHandle {
        let (cmd_tx, _cmd_rx) = mpsc::channel(1);
        let (event_tx, _event_rx) = broadcast::channel(1);
        RegistryHandle::new(
            cmd_tx,
            event_tx,
            BankName::new(name),
            BankBin::new(bin).unwrap(),
        )
    }

    fn directory() -> BankDirectory {
        BankDirectory::new(vec![
            handle("bancomer", "4101-77"),
            handle("santander", "4331-26"),
            handle("hsbc", "4134-06"),
        ])
    }

    #[test]
    fn test_route_by_prefix() {
        let dir = directory();
        assert_eq!(
            dir.route("4101-7712-3456-7890").unwrap().name().as_str(),
            "bancomer"
        );
        assert_eq!(
            dir.route("4331-2698-7654-3210").unwrap().name().as_str(),
            "santander"
        );
        assert_eq!(
            dir.route("4134-0655-0011-2233").unwrap().name().as_str(),
            "hsbc"
        );
    }

    #[test]
    fn test_route_unknown_bank() {
        let dir = directory();
        assert_eq!(
            dir.route("9999-0000-0000-0000").unwrap_err(),
            AtmError::UnknownBank {
                card: "9999-0000-0000-0000".to_string()
            }
        );
        // A partial bin is not enough
        assert!(dir.route("4101-7").is_err());
    }

    #[test]
    fn test_by_name() {
        let dir = directory();
        assert_eq!(dir.by_name("hsbc").unwrap().bin().as_str(), "4134-06");
        assert_eq!(
            dir.by_name("banamex").unwrap_err(),
            AtmError::UnknownBankName("banamex".to_string())
        );
        assert_eq!(dir.len(), 3);
        assert!(!dir.is_empty());
    }
}
