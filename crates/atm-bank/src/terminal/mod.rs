//! ATM terminals using the Actor pattern.
//!
//! A terminal is either `LoggedOut` or `LoggedIn` with one card. Login routes
//! the card to a registry by bin prefix; every later request goes to that
//! same registry until logout.
//!
//! ```text
//!            login ok                     logout
//! LoggedOut ──────────▶ LoggedIn(card, bank) ──────▶ LoggedOut
//!     │ deposit/withdraw/...      │ deposit/withdraw/...
//!     ▼                           ▼
//!  NotLoggedIn             forwarded to bank
//! ```

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

mod actor;
mod commands;
mod handle;

pub use actor::AtmActor;
pub use commands::{AtmCommand, Session, SessionInfo};
pub use handle::AtmHandle;

use crate::directory::BankDirectory;

/// Channel buffer size
const COMMAND_BUFFER: usize = 32;

/// Spawn a terminal actor and return its handle.
pub fn spawn_atm(
    name: impl Into<String>,
    directory: BankDirectory,
    cancel: CancellationToken,
) -> AtmHandle {
    let name = name.into();
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);

    let actor = AtmActor::new(name.clone(), cmd_rx, directory);
    tokio::spawn(actor.run(cancel));

    AtmHandle::new(name, cmd_tx)
}
