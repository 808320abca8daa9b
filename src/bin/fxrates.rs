//! One-shot EUR/USD rate lookup.
//!
//! Usage: fxrates [DAYS]
//!
//! Prints the rates for today and up to DAYS previous days as JSON.

use std::process::ExitCode;
use std::sync::Arc;

use fxchat::chat::parse_lookback;
use fxchat::exchange::MAX_LOOKBACK_DAYS;
use fxchat::{Config, PrivatBankProvider, RateFetcher, RateSeries};

#[tokio::main]
async fn main() -> ExitCode {
    let arg = std::env::args().nth(1);

    if matches!(arg.as_deref(), Some("-h") | Some("--help")) {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let days = match arg.as_deref() {
        None => 0,
        Some(arg) if !arg.is_empty() && arg.bytes().all(|b| b.is_ascii_digit()) => {
            parse_lookback(arg)
        }
        Some(arg) => {
            eprintln!("Ignoring non-numeric DAYS value: {arg}");
            print_usage();
            0
        }
    };

    let config = Config::load_with_env("config.toml").unwrap_or_else(|_| {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    });
    fxchat::logging::init_console_only(&config.logging.level);

    match lookup(&config, days).await {
        Ok(series) => {
            println!("{}", series.to_json());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn lookup(config: &Config, days: u32) -> fxchat::Result<RateSeries> {
    let provider = PrivatBankProvider::new(&config.exchange)?;
    let series = RateFetcher::new(Arc::new(provider)).fetch(days).await?;
    Ok(series)
}

fn print_usage() {
    eprintln!("Usage: fxrates [DAYS]");
    eprintln!("  DAYS  previous days to include (0-{MAX_LOOKBACK_DAYS}, default 0)");
}
