use super::*;

pub mod config;
pub mod layout;
pub mod load;
pub mod open;
pub mod parse;
pub mod replay;

pub use config::{config, ConfigCommands};
pub use layout::{layout, LayoutArgs};
pub use load::{load, LoadArgs};
pub use open::{open, OpenArgs};
pub use parse::{parse, ParseArgs};
pub use replay::{replay, ReplayArgs};

/// Available commands for the CLI
#[derive(Subcommand, Clone)]
pub enum Commands {
  /// Open a ref in a fresh reader and show the resulting panels and URL
  Open(OpenArgs),

  /// Restore the panels encoded in a shareable URL
  Parse(ParseArgs),

  /// Replay a scripted reading session, printing each history entry
  Replay(ReplayArgs),

  /// Compute panel widths for a window
  Layout(LayoutArgs),

  /// Open a ref and fetch its content from the content API
  Load(LoadArgs),

  /// Manage the configuration file
  Config {
    /// The configuration action
    #[command(subcommand)]
    cmd: ConfigCommands,
  },
}

/// A reader builder set up from the configuration at `config_path`.
///
/// Settings changes made by commands are kept in memory so running a command
/// never rewrites the configuration file.
pub fn reader_builder(config_path: &Path, single_panel: bool) -> Result<(Config, ReaderAppBuilder)> {
  let config = Config::load_or_default(config_path)?;
  config.validate()?;
  let mut builder =
    ReaderApp::builder().with_config(config.clone()).with_settings_store(Box::new(MemorySettingsStore::new()));
  if single_panel {
    builder = builder.multi_panel(false);
  }
  Ok((config, builder))
}

/// Prints the reader's current history entry, if there is one.
pub fn reply_current<I: UserInteraction>(interaction: &I, app: &ReaderApp) -> Result<()> {
  match app.history().current() {
    Some(entry) => interaction.reply(ResponseContent::Entry(entry)),
    None => interaction.reply(ResponseContent::Info("Nothing recorded in history")),
  }
}
