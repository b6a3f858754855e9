//! ATM simulator shell.
//!
//! ```text
//! atm                       # built-in banks
//! atm --config banks.toml   # banks from a file
//! atm --json                # machine-readable replies
//! ```

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    atm_cli::run().await
}
