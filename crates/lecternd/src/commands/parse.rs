//! Module for the "parse" command.

use super::*;

/// Arguments for [`Commands::Parse`]
#[derive(Args, Clone)]
pub struct ParseArgs {
  /// URL path and query, e.g. "/Genesis.1.1?with=Rashi"
  pub url: String,

  /// Show one panel at a time
  #[arg(long)]
  pub single_panel: bool,
}

/// Function for the [`Commands::Parse`] in the CLI.
pub fn parse<I: UserInteraction>(interaction: &I, config_path: &Path, args: ParseArgs) -> Result<()> {
  let (_, builder) = reader_builder(config_path, args.single_panel)?;
  let mut app = builder.build();
  app.open_url(&args.url)?;

  interaction.reply(ResponseContent::Panels(app.panels()))?;
  if let Some(menu) = app.header().and_then(|h| h.menu.as_ref()) {
    interaction.reply(ResponseContent::Info(&format!("Header menu: {menu:?}")))?;
  }
  let entry = app.current_entry();
  if entry.url != args.url {
    interaction.reply(ResponseContent::Warning(&format!("Canonical form differs from {}", args.url)))?;
  }
  interaction.reply(ResponseContent::Entry(&entry))
}
