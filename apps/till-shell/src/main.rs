//! # Till POS
//!
//! ```text
//! till [--config <path>]
//! ```
//!
//! Reads commands from stdin; logs go to stderr (`RUST_LOG`, default
//! `info,till=debug`).

use std::path::PathBuf;
use std::process::ExitCode;

use till_shell::{ConsoleHost, ShellConfig, ShellError, ShellResult};
use tokio::io::{stdin, stdout, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, config = e.is_config_error(), "Till POS failed");
            eprintln!("till: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> ShellResult<()> {
    let config_path = config_arg(std::env::args().skip(1))?;
    let config = ShellConfig::load(config_path)?;
    info!(
        api = %config.api.base_url,
        storage = %config.storage.backend,
        fallback = %config.app.fallback_path,
        "Configuration loaded"
    );

    let host = ConsoleHost::from_config(&config)?;
    host.run(BufReader::new(stdin()), stdout()).await
}

/// `--config <path>` / `--config=<path>`.
fn config_arg(mut args: impl Iterator<Item = String>) -> ShellResult<Option<PathBuf>> {
    let mut path = None;
    while let Some(arg) = args.next() {
        if let Some(value) = arg.strip_prefix("--config=") {
            path = Some(PathBuf::from(value));
        } else if arg == "--config" {
            let value = args
                .next()
                .ok_or_else(|| ShellError::InvalidConfig("--config needs a path".into()))?;
            path = Some(PathBuf::from(value));
        } else {
            return Err(ShellError::InvalidConfig(format!("unknown argument: {arg}")));
        }
    }
    Ok(path)
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=till_router=trace` - Trace a single crate
/// - Default: `info,till=debug`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,till=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_config_arg() {
        assert_eq!(config_arg(args(&[])).unwrap(), None);
        assert_eq!(config_arg(args(&["--config", "a.toml"])).unwrap(), Some(PathBuf::from("a.toml")));
        assert_eq!(config_arg(args(&["--config=b.toml"])).unwrap(), Some(PathBuf::from("b.toml")));
        assert!(config_arg(args(&["--config"])).is_err());
        assert!(config_arg(args(&["--verbose"])).is_err());
    }
}
