//! Module for replaying scripted reading sessions.
//!
//! A script is a TOML file with optional reader overrides and a list of steps:
//!
//! ```toml
//! multi_panel = true
//! window_width = 1440.0
//!
//! [[steps]]
//! action = "open"
//! ref = "Genesis 1:1"
//!
//! [[steps]]
//! action = "connections"
//! panel = 1
//! refs = ["Genesis 1:1"]
//!
//! [[steps]]
//! action = "filter"
//! panel = 1
//! name = "Rashi"
//! ```

use super::*;

/// A scripted session.
#[derive(Debug, Clone, Deserialize)]
pub struct Script {
  /// Overrides the configured panel mode
  #[serde(default)]
  pub multi_panel:  Option<bool>,
  /// Overrides the configured window width
  #[serde(default)]
  pub window_width: Option<f64>,
  /// Steps in order
  #[serde(default)]
  pub steps:        Vec<Step>,
}

/// One reader operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
  /// Replace all panels with one ref
  Open {
    /// Ref to open
    #[serde(rename = "ref")]
    reference: String,
    /// Version to pin
    #[serde(default)]
    version:   Option<VersionSelection>,
  },
  /// Open a ref after a panel
  OpenAt {
    /// Panel to open after
    panel:     usize,
    /// Ref to open
    #[serde(rename = "ref")]
    reference: String,
  },
  /// Show connections at a position
  Connections {
    /// Position of the connections panel
    panel: usize,
    /// Refs whose connections to show
    refs:  Vec<String>,
  },
  /// Highlight refs in a text
  Highlight {
    /// Text panel
    panel: usize,
    /// Refs to highlight
    refs:  Vec<String>,
  },
  /// Filter a connections panel, or clear the filter when `name` is absent
  Filter {
    /// Connections panel
    panel:         usize,
    /// Commentary or category
    #[serde(default)]
    name:          Option<String>,
    /// Whether to remember the filter as recently used
    #[serde(default = "yes")]
    update_recent: bool,
  },
  /// Close a panel
  Close {
    /// Panel to close
    panel: usize,
  },
  /// Show another ref in a panel
  Replace {
    /// Panel to replace
    panel:     usize,
    /// New ref
    #[serde(rename = "ref")]
    reference: String,
  },
  /// Pin a version, or unpin when absent
  Version {
    /// Panel to change
    panel:   usize,
    /// Version to pin
    #[serde(default)]
    version: Option<VersionSelection>,
  },
  /// Load different sections into a panel, as scrolling does
  Scroll {
    /// Panel to change
    panel: usize,
    /// Sections now loaded
    refs:  Vec<String>,
  },
  /// Change a display setting
  Setting {
    /// Panel to change
    panel:  usize,
    /// The change
    change: SettingChange,
  },
  /// Open the library
  Library {
    /// Category path
    #[serde(default)]
    categories: Vec<String>,
  },
  /// Open search
  Search {
    /// Query text
    query: String,
  },
  /// Open source sheets
  Sheets {
    /// Tag to show
    #[serde(default)]
    tag: Option<String>,
  },
  /// Close the open menu
  CloseMenu,
  /// Go back one history entry
  Back,
  /// Go forward one history entry
  Forward,
  /// Resize the window
  Resize {
    /// New width in pixels
    width: f64,
  },
}

/// Default for `update_recent`.
fn yes() -> bool { true }

/// Arguments for [`Commands::Replay`]
#[derive(Args, Clone)]
pub struct ReplayArgs {
  /// Path to the script
  pub script: PathBuf,

  /// Print the final history entry as JSON
  #[arg(long)]
  pub json: bool,

  /// Report failing steps and continue
  #[arg(long)]
  pub keep_going: bool,
}

/// Function for the [`Commands::Replay`] in the CLI.
pub fn replay<I: UserInteraction>(interaction: &I, config_path: &Path, args: ReplayArgs) -> Result<()> {
  let script: Script = toml::from_str(&std::fs::read_to_string(&args.script)?)?;
  debug!(steps = script.steps.len(), "replaying {}", args.script.display());

  let mut config = Config::load_or_default(config_path)?;
  if let Some(multi_panel) = script.multi_panel {
    config = config.with_multi_panel(multi_panel);
  }
  if let Some(window_width) = script.window_width {
    config = config.with_window_width(window_width);
  }
  config.validate()?;
  let mut app =
    ReaderApp::builder().with_config(config).with_settings_store(Box::new(MemorySettingsStore::new())).build();

  for (index, step) in script.steps.into_iter().enumerate() {
    let number = index + 1;
    trace!(number, ?step, "applying step");
    match apply(&mut app, number, step) {
      Ok(command) =>
        if let Some(entry) = app.history().current() {
          interaction.reply(ResponseContent::Step { number, entry, command })?;
        },
      Err(e) if args.keep_going => interaction.reply(ResponseContent::Error(e))?,
      Err(e) => return Err(e),
    }
  }

  if args.json {
    println!("{}", serde_json::to_string_pretty(&app.current_entry())?);
    return Ok(());
  }
  interaction.reply(ResponseContent::Panels(app.panels()))?;
  interaction.reply(ResponseContent::Layout(app.layout()))
}

/// Applies `step` and reports how it was recorded in history.
fn apply(app: &mut ReaderApp, number: usize, step: Step) -> Result<Option<HistoryCommand>> {
  let script_error = |message: &str| LecternCliError::Script { step: number, message: message.to_string() };

  match step {
    Step::Open { reference, version } => app.open_panel(&reference, version)?,
    Step::OpenAt { panel, reference } => app.open_panel_at(panel, &reference, None)?,
    Step::Connections { panel, refs } => app.open_connections_at(panel, refs)?,
    Step::Highlight { panel, refs } => app.set_text_list_highlight(panel, refs)?,
    Step::Filter { panel, name, update_recent } =>
      app.set_connections_filter(panel, name.as_deref(), update_recent)?,
    Step::Close { panel } => app.close_panel(panel)?,
    Step::Replace { panel, reference } => app.replace_panel(panel, &reference, None)?,
    Step::Version { panel, version } => app.select_version(panel, version)?,
    Step::Scroll { panel, refs } => app.update_refs(panel, refs)?,
    Step::Setting { panel, change } => app.set_option(panel, change)?,
    Step::Library { categories } => app.show_library(categories)?,
    Step::Search { query } => app.show_search(&query)?,
    Step::Sheets { tag } => app.show_sheets(tag)?,
    Step::CloseMenu => app.close_menu()?,
    Step::Back => {
      let state = app.history_mut().back().ok_or_else(|| script_error("no earlier history entry"))?;
      app.pop_state(state);
    },
    Step::Forward => {
      let state = app.history_mut().forward().ok_or_else(|| script_error("no later history entry"))?;
      app.pop_state(state);
    },
    Step::Resize { width } => {
      app.set_window_width(width);
      return Ok(None);
    },
  }
  Ok(app.last_command())
}
