//! Module for fetching content for a ref.

use super::*;

/// Arguments for [`Commands::Load`]
#[derive(Args, Clone)]
pub struct LoadArgs {
  /// Ref to open
  pub reference: String,

  /// Root of the content API, overriding the configuration
  #[arg(long)]
  pub api: Option<String>,

  /// Also load the connections of the ref
  #[arg(long)]
  pub connections: bool,

  /// Number of segments to print
  #[arg(long, default_value_t = 5)]
  pub lines: usize,
}

/// Function for the [`Commands::Load`] in the CLI.
pub async fn load<I: UserInteraction>(interaction: &I, config_path: &Path, args: LoadArgs) -> Result<()> {
  let LoadArgs { reference, api, connections, lines } = args;
  let (config, builder) = reader_builder(config_path, false)?;
  let base = api.unwrap_or(config.api_base_url);
  let content = Arc::new(HttpContent::new(&base)?);
  let mut app = builder.with_content(content).build();

  app.open_panel(&reference, None)?;
  if connections {
    app.open_connections_at(1, vec![reference.clone()])?;
  }
  interaction.reply(ResponseContent::Info(&format!("Fetching {reference} from {base}")))?;
  app.load_all().await?;
  interaction.reply(ResponseContent::Panels(app.panels()))?;

  for (index, panel) in app.panels().iter().enumerate() {
    if let LoadStatus::Failed(message) = &panel.status {
      interaction.reply(ResponseContent::Warning(&format!("Panel {index} failed to load: {message}")))?;
    }
  }

  match app.cached_content(0) {
    Some(Content::Text(text)) => {
      for (segment, line) in text.text.iter().take(lines).enumerate() {
        println!("{CONTINUE_PREFIX}{:>3}  {line}", segment + 1);
      }
    },
    Some(Content::Index(index)) =>
      interaction.reply(ResponseContent::Info(&format!("{} ({})", index.title, index.categories.join(" > "))))?,
    _ => {},
  }
  if let Some(Content::Related(related)) = app.cached_content(1) {
    for (category, count) in related.counts() {
      interaction.reply(ResponseContent::Info(&format!("{category}: {count}")))?;
    }
  }
  reply_current(interaction, &app)
}
