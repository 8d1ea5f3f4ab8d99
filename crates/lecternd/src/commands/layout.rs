//! Module for the "layout" command.

use super::*;

/// Panel kinds accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum KindArg {
  /// A text
  Text,
  /// A connections sidebar
  Connections,
  /// The compare picker
  Compare,
  /// Search results
  Search,
  /// Any other menu
  Menu,
}

impl From<KindArg> for PanelKind {
  fn from(kind: KindArg) -> Self {
    match kind {
      KindArg::Text => PanelKind::Text,
      KindArg::Connections => PanelKind::Connections,
      KindArg::Compare => PanelKind::Compare,
      KindArg::Search => PanelKind::Search,
      KindArg::Menu => PanelKind::Menu,
    }
  }
}

/// Arguments for [`Commands::Layout`]
#[derive(Args, Clone)]
pub struct LayoutArgs {
  /// Window width in pixels
  #[arg(long, default_value_t = 1440.0)]
  pub width: f64,

  /// Narrowest width a panel may take
  #[arg(long, default_value_t = MIN_PANEL_WIDTH)]
  pub min_panel_width: f64,

  /// Panels from left to right
  #[arg(value_enum, required = true)]
  pub panels: Vec<KindArg>,
}

/// Function for the [`Commands::Layout`] in the CLI.
pub fn layout<I: UserInteraction>(interaction: &I, args: LayoutArgs) -> Result<()> {
  let kinds: Vec<PanelKind> = args.panels.into_iter().map(PanelKind::from).collect();
  let cap = LayoutCalculator::panel_cap_with(args.width, args.min_panel_width);
  let layout = LayoutCalculator::widths(&kinds, cap, args.width);
  interaction.reply(ResponseContent::Info(&format!("{cap} panel(s) fit in {}px", args.width)))?;
  interaction.reply(ResponseContent::Layout(&layout))
}
