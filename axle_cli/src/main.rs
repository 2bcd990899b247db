//! `axle`: replay, decode, run and check the axle counter from the command line.

mod cli;
mod commands;
mod error_fmt;
mod report;

use std::path::Path;

use clap::Parser;
use eyre::Result;
use tracing_subscriber::layer::{Layer, Layered};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

type Filtered = Layered<EnvFilter, Registry>;
type BoxedLayer = Box<dyn Layer<Filtered> + Send + Sync + 'static>;

/// Console logs go to stderr so stdout stays parseable; the optional file
/// gets JSON lines.
fn init_tracing(json: bool, level: Option<&str>, logging: &axle_config::Logging) -> Result<()> {
    // RUST_LOG, then --log-level, then logging.level
    let level = level.or(logging.level.as_deref()).unwrap_or("warn");
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let console: BoxedLayer = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .boxed()
    };

    let file: Option<BoxedLayer> = match logging.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("logging.file has no file name: {}", path.display()))?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => tracing_appender::rolling::daily(dir, name),
                Some("hourly") => tracing_appender::rolling::hourly(dir, name),
                _ => tracing_appender::rolling::never(dir, name),
            };
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .boxed(),
            )
        }
        None => None,
    };

    let mut layers = vec![console];
    layers.extend(file);
    tracing_subscriber::registry()
        .with(filter)
        .with(layers)
        .try_init()?;
    Ok(())
}

fn real_main(cli: Cli) -> Result<()> {
    let cfg = commands::load_config(cli.config.as_deref())?;
    init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(?cfg, "configuration loaded");

    match cli.cmd {
        Commands::Replay { trace, wire } => {
            commands::replay_trace(&cfg, &trace, wire.as_deref(), cli.json)
        }
        Commands::Decode { input, hex } => commands::decode_capture(&input, hex, cli.json),
        Commands::Run { ticks, sim_axles } => commands::run_live(&cfg, ticks, sim_axles, cli.json),
        Commands::SelfCheck => commands::self_check(&cfg, cli.json),
    }
}

fn main() {
    let cli = Cli::parse();
    let json = cli.json;
    let _ = JSON_MODE.set(json);
    if let Err(e) = color_eyre::install() {
        eprintln!("failed to install error hooks: {e}");
    }

    if let Err(err) = real_main(cli) {
        tracing::error!(error = %format!("{err:#}"), "command failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}
