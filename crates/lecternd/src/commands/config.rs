//! Module for managing the configuration file.

use super::*;

/// Actions on the configuration file
#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
  /// Write a default configuration file
  Init {
    /// Show one panel at a time by default
    #[arg(long)]
    single_panel: bool,

    /// Root of the content API
    #[arg(long)]
    api: Option<String>,
  },

  /// Print the configuration in effect
  Show,
}

/// Function for the [`Commands::Config`] in the CLI.
pub fn config<I: UserInteraction>(interaction: &I, config_path: &Path, cmd: ConfigCommands) -> Result<()> {
  match cmd {
    ConfigCommands::Init { single_panel, api } => {
      if config_path.exists()
        && !interaction.confirm(&format!(
          "A configuration already exists at {}. Overwrite it?",
          config_path.display()
        ))?
      {
        interaction.reply(ResponseContent::Info("Keeping the existing configuration"))?;
        return Ok(());
      }

      let mut config = Config::default().with_multi_panel(!single_panel);
      if let Some(api) = api {
        config = config.with_api_base_url(api);
      }
      config.validate()?;
      config.save(config_path)?;
      interaction.reply(ResponseContent::Success(&format!(
        "Configuration written to {}",
        config_path.display()
      )))
    },
    ConfigCommands::Show => {
      if !config_path.exists() {
        interaction.reply(ResponseContent::Info("No configuration file, showing defaults"))?;
      }
      let config = Config::load_or_default(config_path)?;
      println!("{}", toml::to_string_pretty(&config)?);
      Ok(())
    },
  }
}
