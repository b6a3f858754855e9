//! ATM Bank - account registries and terminal sessions as actors
//!
//! This crate provides the runtime of the simulator:
//! - `registry` - one actor per bank, sole owner of that bank's accounts
//! - `terminal` - one actor per ATM, holding at most one logged-in session
//! - `directory` - bin-prefix routing from card numbers to registries
//! - `supervisor` - composition root that starts banks and terminals
//! - `config` - bank definitions loaded from TOML
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   AtmCommand    ┌──────────────┐  RegistryCommand  ┌──────────────────┐
//! │    Shell     │────────────────▶│   AtmActor   │──────────────────▶│  RegistryActor   │
//! │ (atm-cli)    │   (mpsc+oneshot)│ (session)    │  (mpsc+oneshot)   │ (one per bank)   │
//! └──────┬───────┘                 └──────┬───────┘                   └────────┬─────────┘
//!        │ by name                        │ route by bin                       │ AccountEvent
//!        ▼                                ▼                                    ▼
//! ┌──────────────┐                 ┌──────────────┐                   ┌──────────────────┐
//! │  Supervisor  │────────────────▶│ BankDirectory│                   │ broadcast::Sender│
//! └──────────────┘                 └──────────────┘                   └──────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Channel operations handle closure gracefully

pub mod config;
pub mod directory;
pub mod error;
pub mod registry;
pub mod supervisor;
pub mod terminal;

pub use config::{AtmConfig, BankConfig, BankSetup, ConfigError, SeedAccount};
pub use directory::BankDirectory;
pub use error::AtmError;
pub use supervisor::{StartOutcome, Supervisor};
