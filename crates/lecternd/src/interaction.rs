//! Terminal output and prompts.

use dialoguer::Confirm;

use super::*;

/// Prefix for information messages
pub static INFO_PREFIX: &str = "ℹ ";
/// Prefix for success messages
pub static SUCCESS_PREFIX: &str = "✓ ";
/// Prefix for error messages
pub static ERROR_PREFIX: &str = "✗ ";
/// Prefix for warning messages
pub static WARNING_PREFIX: &str = "! ";
/// Prefix for user prompts
pub static PROMPT_PREFIX: &str = "❯ ";
/// Prefix for history entries
pub static LINK_PREFIX: &str = "→ ";
/// Prefix for list items
pub static ITEM_PREFIX: &str = "├─";
/// Prefix for the last list item
pub static LAST_ITEM_PREFIX: &str = "└─";
/// Continuation line for tree structure
pub static CONTINUE_PREFIX: &str = "│  ";

/// Something to show the user.
#[derive(Debug)]
pub enum ResponseContent<'a> {
  /// A recorded history entry
  Entry(&'a HistoryEntry),
  /// The outcome of one replayed step
  Step {
    /// 1-based step number
    number:  usize,
    /// The current history entry after the step
    entry:   &'a HistoryEntry,
    /// How the step was recorded
    command: Option<HistoryCommand>,
  },
  /// The reader's panels
  Panels(&'a [PanelState]),
  /// Computed panel widths
  Layout(&'a PanelLayout),
  /// A finished action
  Success(&'a str),
  /// Neutral information
  Info(&'a str),
  /// Something the user should look at
  Warning(&'a str),
  /// A failure that did not stop the command
  Error(LecternCliError),
}

/// How commands talk to the user.
pub trait UserInteraction {
  /// Asks a yes/no question.
  fn confirm(&self, message: &str) -> Result<bool>;
  /// Shows `content`.
  fn reply(&self, content: ResponseContent) -> Result<()>;
}

/// Interaction on the controlling terminal.
#[derive(Debug, Clone, Copy)]
pub struct Terminal {
  /// Answer every prompt with yes
  accept_defaults: bool,
}

impl Terminal {
  /// A terminal that prompts unless `accept_defaults` is set.
  pub fn new(accept_defaults: bool) -> Self { Self { accept_defaults } }
}

impl UserInteraction for Terminal {
  fn confirm(&self, message: &str) -> Result<bool> {
    if self.accept_defaults {
      debug!("accepting default for prompt: {message}");
      return Ok(true);
    }
    Ok(
      Confirm::new()
        .with_prompt(format!("{}{}", style(PROMPT_PREFIX).cyan(), message))
        .default(false)
        .wait_for_newline(true)
        .interact()?,
    )
  }

  fn reply(&self, content: ResponseContent) -> Result<()> {
    match content {
      ResponseContent::Entry(entry) => {
        println!("{}{}", style(LINK_PREFIX).cyan(), style(&entry.url).yellow());
        println!("{}{}", CONTINUE_PREFIX, style(&entry.title).white());
      },
      ResponseContent::Step { number, entry, command } => {
        let recorded = match command {
          Some(HistoryCommand::Push) => style("push").green(),
          Some(HistoryCommand::Replace) => style("replace").yellow(),
          None => style("unchanged").dim(),
        };
        println!(
          "{}{:>3} {:<9} {}  {}",
          style(INFO_PREFIX).blue(),
          number,
          recorded,
          style(&entry.url).yellow(),
          style(&entry.title).white()
        );
      },
      ResponseContent::Panels(panels) if panels.is_empty() => {
        println!("{}No panels open", style(INFO_PREFIX).blue());
      },
      ResponseContent::Panels(panels) => {
        println!("{}{} panel(s):", style(INFO_PREFIX).blue(), panels.len());
        for (index, panel) in panels.iter().enumerate() {
          let prefix = if index + 1 == panels.len() { LAST_ITEM_PREFIX } else { ITEM_PREFIX };
          println!("{} {} {}", prefix, style(index).bold(), describe(panel));
        }
      },
      ResponseContent::Layout(layout) => {
        let widths: Vec<String> = layout.widths.iter().map(|w| format!("{w}{}", layout.unit)).collect();
        let scroll = if layout.scrollable { " (scrolls)" } else { "" };
        println!("{}Widths: {}{}", style(INFO_PREFIX).blue(), widths.join(" "), scroll);
      },
      ResponseContent::Success(message) => println!("{}{}", style(SUCCESS_PREFIX).green(), message),
      ResponseContent::Info(message) => println!("{}{}", style(INFO_PREFIX).blue(), message),
      ResponseContent::Warning(message) => println!("{}{}", style(WARNING_PREFIX).yellow(), message),
      ResponseContent::Error(error) => eprintln!("{}{}", style(ERROR_PREFIX).red(), error),
    }
    Ok(())
  }
}

/// One-line summary of a panel.
fn describe(panel: &PanelState) -> String {
  let refs = panel.current_ref().unwrap_or_default();
  let mut line = match panel.view() {
    PanelView::Menu(menu) => format!("menu {}", style(format!("{menu:?}")).cyan()),
    PanelView::Text => format!("text {}", style(&refs).yellow()),
    PanelView::TextAndConnections => format!("text+connections {}", style(&refs).yellow()),
    PanelView::Connections => match panel.filter.first() {
      Some(filter) => format!("connections {} with {}", style(&refs).yellow(), style(filter).cyan()),
      None => format!("connections {}", style(&refs).yellow()),
    },
    PanelView::Header => "header".to_string(),
  };
  line.push_str(&format!(" [{}", panel.settings.language));
  if let Some(version) = &panel.version {
    line.push_str(&format!(", {} {}", version.language, version.title));
  }
  line.push(']');
  match &panel.status {
    LoadStatus::Idle => {},
    LoadStatus::Loading => line.push_str(" loading"),
    LoadStatus::Loaded => line.push_str(" loaded"),
    LoadStatus::Failed(message) => line.push_str(&format!(" failed: {message}")),
  }
  line
}
