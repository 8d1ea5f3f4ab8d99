//! Relative widths of the visible panels.
//!
//! While the panels fit in the window they share it in percentages: evenly in
//! general, with fixed splits for the common text/connections arrangements.
//! Once there are more panels than fit (`panel_cap`), every panel gets the same
//! pixel width and the row scrolls horizontally.
//!
//! # Examples
//!
//! ```
//! use lectern::layout::{LayoutCalculator, PanelKind, WidthUnit};
//!
//! let layout = LayoutCalculator::widths(&[PanelKind::Text, PanelKind::Connections], 4, 1600.0);
//! assert_eq!(layout.unit, WidthUnit::Percent);
//! assert_eq!(layout.widths, vec![68.0, 32.0]);
//!
//! assert_eq!(LayoutCalculator::panel_cap(1100.0), 3);
//! ```

use super::*;

/// Narrowest a panel may be before panels start to overflow the window.
pub const MIN_PANEL_WIDTH: f64 = 360.0;

/// The role of a panel as far as layout is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
  /// A text (or a text with inline connections)
  Text,
  /// A connections sidebar
  Connections,
  /// The compare-text picker
  Compare,
  /// Search results
  Search,
  /// Any other menu
  Menu,
}

impl From<&PanelState> for PanelKind {
  fn from(panel: &PanelState) -> Self {
    match panel.view() {
      PanelView::Text | PanelView::TextAndConnections | PanelView::Header => PanelKind::Text,
      PanelView::Connections => PanelKind::Connections,
      PanelView::Menu(Menu::Compare) => PanelKind::Compare,
      PanelView::Menu(Menu::Search { .. }) => PanelKind::Search,
      PanelView::Menu(_) => PanelKind::Menu,
    }
  }
}

impl PanelKind {
  /// Whether a panel of this kind is a narrow companion to a text.
  fn is_sidebar(self) -> bool {
    matches!(self, PanelKind::Connections | PanelKind::Compare | PanelKind::Search)
  }
}

/// Unit of the computed widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WidthUnit {
  /// Percentages of the container; they sum to 100
  #[serde(rename = "%")]
  Percent,
  /// Absolute pixels
  #[serde(rename = "px")]
  Pixels,
}

impl Display for WidthUnit {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      WidthUnit::Percent => write!(f, "%"),
      WidthUnit::Pixels => write!(f, "px"),
    }
  }
}

/// Computed widths for a row of panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelLayout {
  /// Unit shared by all widths
  pub unit:       WidthUnit,
  /// One width per panel, in panel order
  pub widths:     Vec<f64>,
  /// Whether the row is wider than the container
  pub scrollable: bool,
}

/// Width calculation for panel rows.
pub struct LayoutCalculator;

impl LayoutCalculator {
  /// How many panels fit side by side in a window `window_width` pixels wide.
  ///
  /// Always at least one.
  pub fn panel_cap(window_width: f64) -> usize { Self::panel_cap_with(window_width, MIN_PANEL_WIDTH) }

  /// [`LayoutCalculator::panel_cap`] with a custom minimum panel width.
  pub fn panel_cap_with(window_width: f64, min_panel_width: f64) -> usize {
    if !(window_width.is_finite() && min_panel_width > 0.0) {
      return 1;
    }
    ((window_width / min_panel_width).floor() as usize).max(1)
  }

  /// Widths for `panels`, given that `panel_cap` of them fit in a container
  /// `container_width` pixels wide.
  pub fn widths(panels: &[PanelKind], panel_cap: usize, container_width: f64) -> PanelLayout {
    let count = panels.len();
    let panel_cap = panel_cap.max(1);

    if count > panel_cap {
      let width = (container_width / panel_cap as f64).floor();
      trace!(count, panel_cap, width, "panels overflow the window");
      return PanelLayout { unit: WidthUnit::Pixels, widths: vec![width; count], scrollable: true };
    }

    let widths = match panels {
      [] => Vec::new(),
      [PanelKind::Text, second] if second.is_sidebar() => vec![68.0, 32.0],
      [PanelKind::Text, PanelKind::Connections, PanelKind::Text] => vec![37.0, 26.0, 37.0],
      [PanelKind::Text, PanelKind::Text, PanelKind::Connections] => vec![37.0, 37.0, 26.0],
      _ => Self::even(count),
    };
    PanelLayout { unit: WidthUnit::Percent, widths, scrollable: false }
  }

  /// Widths for the given panel states.
  pub fn for_panels(panels: &[PanelState], panel_cap: usize, container_width: f64) -> PanelLayout {
    let kinds: Vec<PanelKind> = panels.iter().map(PanelKind::from).collect();
    Self::widths(&kinds, panel_cap, container_width)
  }

  /// `count` equal percentages; the last absorbs rounding so the sum is 100.
  fn even(count: usize) -> Vec<f64> {
    let share = 100.0 / count as f64;
    let mut widths = vec![share; count];
    let rest: f64 = widths[..count - 1].iter().sum();
    widths[count - 1] = 100.0 - rest;
    widths
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sum(layout: &PanelLayout) -> f64 { layout.widths.iter().sum() }

  #[test]
  fn test_panel_cap() {
    assert_eq!(LayoutCalculator::panel_cap(1440.0), 4);
    assert_eq!(LayoutCalculator::panel_cap(1439.0), 3);
    assert_eq!(LayoutCalculator::panel_cap(200.0), 1);
    assert_eq!(LayoutCalculator::panel_cap(f64::NAN), 1);
  }

  #[test]
  fn test_even_distribution_sums_to_100() {
    for count in 1..=7 {
      let kinds = vec![PanelKind::Text; count];
      let layout = LayoutCalculator::widths(&kinds, 7, 3000.0);
      assert_eq!(layout.unit, WidthUnit::Percent);
      assert!(!layout.scrollable);
      assert!((sum(&layout) - 100.0).abs() < 1e-9, "count {count} summed to {}", sum(&layout));
    }
  }

  #[test]
  fn test_special_layouts() {
    use PanelKind::*;
    assert_eq!(LayoutCalculator::widths(&[Text, Search], 2, 800.0).widths, vec![68.0, 32.0]);
    assert_eq!(LayoutCalculator::widths(&[Text, Compare], 2, 800.0).widths, vec![68.0, 32.0]);
    assert_eq!(LayoutCalculator::widths(&[Text, Connections, Text], 3, 1200.0).widths, vec![
      37.0, 26.0, 37.0
    ]);
    assert_eq!(LayoutCalculator::widths(&[Text, Text, Connections], 3, 1200.0).widths, vec![
      37.0, 37.0, 26.0
    ]);
    assert_eq!(LayoutCalculator::widths(&[Text, Text], 3, 1200.0).widths, vec![50.0, 50.0]);
  }

  #[test]
  fn test_overflow_uses_pixels() {
    let layout =
      LayoutCalculator::widths(&[PanelKind::Text, PanelKind::Connections, PanelKind::Text], 2, 1000.0);
    assert_eq!(layout.unit, WidthUnit::Pixels);
    assert!(layout.scrollable);
    assert_eq!(layout.widths, vec![500.0, 500.0, 500.0]);
  }

  #[test]
  fn test_menu_panels_classify() {
    let mut panel = PanelState::new(Settings::default());
    assert_eq!(PanelKind::from(&panel), PanelKind::Text);
    panel.menu = Some(Menu::Compare);
    assert_eq!(PanelKind::from(&panel), PanelKind::Compare);
    panel.menu = Some(Menu::Account);
    assert_eq!(PanelKind::from(&panel), PanelKind::Menu);
  }
}
