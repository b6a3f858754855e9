//! Interactive shell for the ATM simulator.
//!
//! Reads commands from stdin, one per line, and drives a [`Supervisor`]
//! that owns the bank registries and ATM terminals.
//!
//! # Usage
//!
//! ```bash
//! # Built-in banks
//! atm
//!
//! # Custom bank file, JSON replies
//! atm --config banks.toml --json
//!
//! # Enable debug logging (account events)
//! RUST_LOG=atm_bank=debug,atm_cli=debug atm
//! ```

pub mod input;
pub mod shell;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use atm_bank::{AtmConfig, Supervisor};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

pub use shell::{OutputFormat, Reply, Shell};

/// ATM simulator shell
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "atm", version, about)]
pub struct Args {
    /// Bank configuration file (TOML)
    #[arg(short, long, env = "ATM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print one JSON object per reply
    #[arg(long)]
    pub json: bool,

    /// Start an ATM with this name before reading commands
    #[arg(long)]
    pub atm: Option<String>,
}

/// Parses arguments from the process and runs the shell.
pub async fn run() -> Result<()> {
    run_with(Args::parse()).await
}

/// Runs the shell with explicit arguments.
pub async fn run_with(args: Args) -> Result<()> {
    init_tracing()?;

    let config_path = resolve_config_path(args.config.as_deref(), default_config_path());
    let config = load_config(config_path.as_deref())?;

    let mut supervisor = Supervisor::start(config).context("Invalid bank configuration")?;
    info!(banks = supervisor.directory().len(), "Banks started");

    if let Some(name) = &args.atm {
        supervisor
            .start_atm(name)
            .with_context(|| format!("Failed to start ATM {name}"))?;
    }

    let cancel = CancellationToken::new();
    shell::spawn_event_log(&supervisor, cancel.clone());

    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let mut shell = Shell::new(supervisor, format);

    let result = repl(&mut shell, format).await;

    cancel.cancel();
    shell.shutdown();
    info!("Shell exited");
    result
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("atm_bank=info".parse()?)
                .add_directive("atm_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// `~/.config/atm/banks.toml`
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("atm").join("banks.toml"))
}

/// Picks the explicit path, else the default path when it exists.
fn resolve_config_path(explicit: Option<&Path>, default: Option<PathBuf>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default.filter(|path| path.is_file()),
    }
}

fn load_config(path: Option<&Path>) -> Result<AtmConfig> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "Loading bank configuration");
            AtmConfig::load(path).with_context(|| {
                format!("Failed to load bank configuration from {}", path.display())
            })
        }
        None => {
            info!("Using built-in banks");
            AtmConfig::builtin().context("Built-in bank configuration is invalid")
        }
    }
}

async fn repl(shell: &mut Shell, format: OutputFormat) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    if format == OutputFormat::Text {
        stdout
            .write_all(b"ATM simulator. Type 'help' for commands.\n")
            .await?;
    }

    loop {
        if format == OutputFormat::Text {
            stdout.write_all(b"atm> ").await?;
            stdout.flush().await?;
        }

        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read from stdin")?,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!(error = %e, "Error waiting for shutdown signal");
                }
                info!("Interrupted");
                break;
            }
        };

        // EOF
        let Some(line) = line else {
            break;
        };

        match shell.execute_line(&line).await {
            Some(Reply::Output(text)) => {
                stdout.write_all(text.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
            }
            Some(Reply::Quit) => break,
            None => {}
        }
    }

    stdout.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_config_path_wins() {
        let explicit = PathBuf::from("/tmp/custom-banks.toml");
        assert_eq!(
            resolve_config_path(Some(&explicit), Some(PathBuf::from("/nonexistent/banks.toml"))),
            Some(explicit)
        );
    }

    #[test]
    fn test_missing_default_path_falls_back_to_builtin() {
        assert_eq!(
            resolve_config_path(None, Some(PathBuf::from("/nonexistent/atm/banks.toml"))),
            None
        );
        assert_eq!(resolve_config_path(None, None), None);
        assert!(load_config(None).is_ok());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/atm/banks.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to load bank configuration"));
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["atm", "--json", "--atm", "atm1"]).unwrap();
        assert!(args.json);
        assert_eq!(args.atm.as_deref(), Some("atm1"));
    }
}
