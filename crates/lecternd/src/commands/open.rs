//! Module for the "open" command.

use super::*;

/// Arguments for [`Commands::Open`]
#[derive(Args, Clone)]
pub struct OpenArgs {
  /// Ref to open, e.g. "Genesis 1:1", or a book title for its contents
  pub reference: String,

  /// Title of a version to pin
  #[arg(long)]
  pub version: Option<String>,

  /// Language of the pinned version (en, he)
  #[arg(long, default_value = "en")]
  pub lang: VersionLanguage,

  /// Also open the connections of the ref
  #[arg(long)]
  pub connections: bool,

  /// Narrow the connections to one commentary or category
  #[arg(long, requires = "connections")]
  pub filter: Option<String>,

  /// Show one panel at a time
  #[arg(long)]
  pub single_panel: bool,
}

/// Function for the [`Commands::Open`] in the CLI.
pub fn open<I: UserInteraction>(interaction: &I, config_path: &Path, args: OpenArgs) -> Result<()> {
  let OpenArgs { reference, version, lang, connections, filter, single_panel } = args;
  let (_, builder) = reader_builder(config_path, single_panel)?;
  let mut app = builder.build();

  let version = version.map(|title| VersionSelection::new(title, lang));
  app.open_panel(&reference, version)?;
  if connections {
    app.open_connections_at(1, vec![reference.clone()])?;
    if let Some(filter) = filter.as_deref() {
      app.set_connections_filter(1, Some(filter), true)?;
    }
  }

  interaction.reply(ResponseContent::Panels(app.panels()))?;
  interaction.reply(ResponseContent::Layout(app.layout()))?;
  reply_current(interaction, &app)
}
