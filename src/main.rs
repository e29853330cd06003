#![forbid(unsafe_code)]

mod backends;
mod cli;
mod codec;
mod config;
mod constants;
mod error;
mod menu;
mod output;
mod process;
mod registry;
mod types;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::{debug, error, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use backends::{AppContext, XinputProbe};
use cli::{Cli, Invocation};
use config::{AppConfig, FsStore};
use constants::exit;
use menu::Menu;
use output::{render, OutputStyle};
use process::SystemProcesses;
use registry::Registry;

fn parse_level(name: &str) -> Option<TraceLevel> {
    match name.to_lowercase().as_str() {
        "trace" => Some(TraceLevel::TRACE),
        "debug" => Some(TraceLevel::DEBUG),
        "info" => Some(TraceLevel::INFO),
        "warn" => Some(TraceLevel::WARN),
        "error" => Some(TraceLevel::ERROR),
        _ => None,
    }
}

/// LOG_LEVEL wins over the settings file; `-v` wins over both
fn init_logging(config_level: &str, verbose: bool) -> Result<()> {
    let log_level = if verbose {
        TraceLevel::DEBUG
    } else {
        std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|v| parse_level(&v))
            .or_else(|| parse_level(config_level))
            .unwrap_or(TraceLevel::WARN)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("Failed to install log subscriber")
}

fn run(cli: Cli) -> Result<i32> {
    let loaded = AppConfig::load();
    let config_level = loaded
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_default();
    init_logging(&config_level, cli.verbose)?;
    let config = loaded?;

    let invocation = cli.invocation();
    debug!(?invocation, "Parsed command line");

    let store = FsStore;
    let processes = SystemProcesses::new();
    let devices = XinputProbe;
    let ctx = AppContext::new(&config, &store, &processes, &devices, dirs::config_dir());
    let registry = Registry::new(&ctx);
    let style = OutputStyle::detect(cli.no_color, cli.json);

    let outcome = match invocation {
        Invocation::Usage => {
            print!("{}", Cli::usage());
            return Ok(exit::SUCCESS);
        }
        Invocation::Menu => {
            let stdin = io::stdin();
            Menu::new(&registry, style).run(&mut stdin.lock(), &mut io::stdout().lock())?;
            return Ok(exit::SUCCESS);
        }
        Invocation::StatusAll => registry.status_all(),
        Invocation::Dispatch {
            category,
            action,
            setting,
            value,
        } => registry.dispatch(&category, &action, setting.as_deref(), value.as_deref()),
    };

    // Errors go to stderr unless the caller wants a machine-readable report
    if outcome.is_success() || style.json {
        let mut stdout = io::stdout().lock();
        render(&mut stdout, style, &outcome)?;
        stdout.flush()?;
    } else {
        render(&mut io::stderr().lock(), style, &outcome)?;
    }
    Ok(outcome.exit_code)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            error!("{e:#}");
            eprintln!("[ERROR] {e:#}");
            ExitCode::from(exit::FAILURE as u8)
        }
    }
}
