//! Bank account registry using the Actor pattern.
//!
//! Each configured bank runs one registry actor, the only owner and mutator
//! of that bank's accounts. Requests arrive over an mpsc channel and are
//! answered on per-request oneshot channels.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │   AtmActor /    │────▶│  RegistryActor  │────▶│ Broadcast Channel│
//! │   Supervisor    │     │  (one per bank) │     │                  │
//! └─────────────────┘     └─────────────────┘     └──────────────────┘
//!         │                       │                       │
//!         │   RegistryCommand     │   AccountEvent        │
//!         │   (mpsc channel)      │   (broadcast)         │
//!         ▼                       ▼                       ▼
//!    Login/Deposit/          HashMap<CardNumber,     Event logger,
//!    Withdraw/...            Account>                tests
//! ```

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

mod actor;
mod commands;
mod handle;

pub use actor::RegistryActor;
pub use commands::{AccountEvent, BankInfo, RegistryCommand};
pub use handle::RegistryHandle;

use crate::config::BankSetup;

/// Channel buffer sizes
const COMMAND_BUFFER: usize = 100;
const EVENT_BUFFER: usize = 100;

/// Spawn a registry actor for one bank and return a handle for interaction.
///
/// The actor runs until every handle is dropped or `cancel` fires.
///
/// # Example
///
/// ```no_run
/// use atm_bank::config::AtmConfig;
/// use atm_bank::registry::spawn_registry;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() {
///     let banks = AtmConfig::builtin().and_then(AtmConfig::into_banks).unwrap_or_default();
///     for bank in banks {
///         let handle = spawn_registry(bank, CancellationToken::new());
///         let _info = handle.info().await;
///     }
/// }
/// ```
pub fn spawn_registry(setup: BankSetup, cancel: CancellationToken) -> RegistryHandle {
    spawn_registry_with_rng(setup, cancel, StdRng::from_entropy())
}

/// Like [`spawn_registry`], with a caller-supplied random source for
/// reproducible card numbers and PINs.
pub fn spawn_registry_with_rng(
    setup: BankSetup,
    cancel: CancellationToken,
    rng: StdRng,
) -> RegistryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

    let name = setup.name.clone();
    let bin = setup.bin.clone();

    let actor = RegistryActor::new(setup, cmd_rx, event_tx.clone(), rng);
    tokio::spawn(actor.run(cancel));

    RegistryHandle::new(cmd_tx, event_tx, name, bin)
}
