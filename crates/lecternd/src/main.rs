//! Command line driver for the `lectern` multi-panel reader state.
//!
//! The binary exercises the reader without a front end: it opens refs, parses
//! shareable URLs, replays scripted reading sessions and reports the history
//! entries and panel widths the reader produces along the way.
//!
//! # Usage
//!
//! ```bash
//! # Open a ref alongside its Rashi commentary
//! lectern open "Genesis 1:1" --connections --filter Rashi
//!
//! # Show the panels encoded in a URL
//! lectern parse "/Genesis.1.1?p2=Exodus.20"
//!
//! # Replay a scripted session
//! lectern replay session.toml
//!
//! # Compute panel widths for a 1440px window
//! lectern layout --width 1440 text connections text
//!
//! # Fetch the text of a ref from the content API
//! lectern load "Psalms 23"
//!
//! # Write a default configuration file
//! lectern config init
//! ```
//!
//! Use `-v` (repeatable) for more logging, and `--log-dir` to send logs to a
//! file instead of stderr.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use clap::{builder::ArgAction, Args, Parser, Subcommand, ValueEnum};
use console::style;
use lectern::{
  config::{Config, MemorySettingsStore},
  content::{Content, HttpContent},
  controller::{ReaderApp, ReaderAppBuilder},
  history::{HistoryCommand, HistoryEntry},
  layout::{LayoutCalculator, PanelKind, PanelLayout, MIN_PANEL_WIDTH},
  panel::{LoadStatus, PanelState, PanelView, VersionSelection},
  prelude::*,
  settings::{SettingChange, VersionLanguage},
};
use serde::Deserialize;
use tracing::{debug, trace};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod error;
pub mod interaction;

use crate::{commands::*, error::*, interaction::*};

/// Command line interface configuration and argument parsing
#[derive(Parser)]
#[command(author, version, about = "Drive the lectern reader state from the command line")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Path to the configuration file. If not specified, uses the default
  /// platform-specific config directory.
  #[arg(long, short, global = true)]
  config: Option<PathBuf>,

  /// Write logs to `lectern.log` in this directory instead of stderr
  #[arg(long, global = true)]
  log_dir: Option<PathBuf>,

  /// The subcommand to execute
  #[command(subcommand)]
  command: Commands,

  /// Skip all prompts and accept defaults (mostly for testing)
  #[arg(long, hide = true, global = true)]
  accept_defaults: bool,
}

/// Configures the logging system based on the verbosity level
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
///
/// `RUST_LOG` overrides the level. The returned guard flushes the log file and
/// must be held until exit.
fn setup_logging(verbosity: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true);

  match log_dir {
    Some(log_dir) => {
      std::fs::create_dir_all(log_dir)?;
      let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, "lectern.log"));
      builder.with_ansi(false).with_writer(writer).init();
      Ok(Some(guard))
    },
    None => {
      builder.with_writer(std::io::stderr).init();
      Ok(None)
    },
  }
}

/// Entry point for the lectern CLI application
///
/// # Errors
///
/// Returns [`LecternCliError`] when the configuration or a script cannot be
/// read, when a reader operation is given a bad panel index, or when the
/// content API cannot be reached.
#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let _guard = setup_logging(cli.verbose, cli.log_dir.as_deref())?;

  let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
  trace!("Using configuration at: {}", config_path.display());

  let interaction = Terminal::new(cli.accept_defaults);
  match cli.command {
    Commands::Open(args) => open(&interaction, &config_path, args),
    Commands::Parse(args) => parse(&interaction, &config_path, args),
    Commands::Replay(args) => replay(&interaction, &config_path, args),
    Commands::Layout(args) => layout(&interaction, args),
    Commands::Load(args) => load(&interaction, &config_path, args).await,
    Commands::Config { cmd } => config(&interaction, &config_path, cmd),
  }
}
