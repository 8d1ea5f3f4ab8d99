//! Display preferences carried by every panel.
//!
//! Each panel owns a full copy of its [`Settings`]. New panels start from the
//! controller's current defaults, which are themselves persisted between
//! sessions through a [`SettingsStore`](crate::config::SettingsStore).

use super::*;

/// Which language(s) of a text are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
  /// English only
  #[default]
  English,
  /// Hebrew only
  Hebrew,
  /// Both languages side by side or stacked
  Bilingual,
}

impl Language {
  /// The language a connections panel shows when its text panel shows `self`.
  ///
  /// Connections never render bilingually: Hebrew stays Hebrew and every
  /// other choice falls back to English.
  pub fn for_connections(self) -> Self {
    match self {
      Language::Hebrew => Language::Hebrew,
      Language::English | Language::Bilingual => Language::English,
    }
  }

  /// The version language whose text this language setting displays, if it
  /// names exactly one.
  pub fn version_language(self) -> Option<VersionLanguage> {
    match self {
      Language::English => Some(VersionLanguage::En),
      Language::Hebrew => Some(VersionLanguage::He),
      Language::Bilingual => None,
    }
  }
}

impl Display for Language {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Language::English => write!(f, "english"),
      Language::Hebrew => write!(f, "hebrew"),
      Language::Bilingual => write!(f, "bilingual"),
    }
  }
}

impl FromStr for Language {
  type Err = LecternError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_lowercase().as_str() {
      "english" | "en" => Ok(Language::English),
      "hebrew" | "he" => Ok(Language::Hebrew),
      "bilingual" | "bi" => Ok(Language::Bilingual),
      other => Err(LecternError::Config(format!("Unknown language setting: {other}"))),
    }
  }
}

/// Language of a textual witness (a "version" of a text).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionLanguage {
  /// An English translation
  En,
  /// A Hebrew edition
  He,
}

impl Display for VersionLanguage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      VersionLanguage::En => write!(f, "en"),
      VersionLanguage::He => write!(f, "he"),
    }
  }
}

impl FromStr for VersionLanguage {
  type Err = LecternError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "en" => Ok(VersionLanguage::En),
      "he" => Ok(VersionLanguage::He),
      other => Err(LecternError::Config(format!("Unknown version language: {other}"))),
    }
  }
}

/// How segments of a text flow on the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
  /// One segment per line
  #[default]
  Segmented,
  /// Segments run together as prose
  Continuous,
}

/// Arrangement of the two languages in bilingual mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiLayout {
  /// Hebrew above English
  #[default]
  Stacked,
  /// Hebrew left, English right
  Heeng,
  /// English left, Hebrew right
  Enghe,
}

/// Color theme of a panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
  /// Light background
  #[default]
  Light,
  /// Warm paper-like background
  Sepia,
  /// Dark background
  Dark,
}

/// Smallest font size a panel accepts.
pub const MIN_FONT_SIZE: f32 = 40.0;
/// Largest font size a panel accepts.
pub const MAX_FONT_SIZE: f32 = 95.0;
/// Step used by [`SettingChange::FontSizeStep`].
pub const FONT_SIZE_STEP: f32 = 5.0;

/// Display preferences of one panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
  /// Language(s) shown
  pub language:       Language,
  /// Layout for texts without a specialized layout
  pub layout_default: Layout,
  /// Layout for Tanakh texts
  pub layout_tanakh:  Layout,
  /// Layout for Talmud texts
  pub layout_talmud:  Layout,
  /// Bilingual arrangement
  pub bi_layout:      BiLayout,
  /// Color theme
  pub color:          Color,
  /// Font size as a percentage of the base size
  pub font_size:      f32,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      language:       Language::Bilingual,
      layout_default: Layout::Segmented,
      layout_tanakh:  Layout::Segmented,
      layout_talmud:  Layout::Continuous,
      bi_layout:      BiLayout::Stacked,
      color:          Color::Light,
      font_size:      62.5,
    }
  }
}

/// A single change to a panel's settings, as issued from a settings menu.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "option", content = "value", rename_all = "camelCase")]
pub enum SettingChange {
  /// Switch the displayed language(s)
  Language(Language),
  /// Switch the default layout
  LayoutDefault(Layout),
  /// Switch the Tanakh layout
  LayoutTanakh(Layout),
  /// Switch the Talmud layout
  LayoutTalmud(Layout),
  /// Switch the bilingual arrangement
  BiLayout(BiLayout),
  /// Switch the color theme
  Color(Color),
  /// Grow (`true`) or shrink (`false`) the font by one step
  FontSizeStep(bool),
}

impl Settings {
  /// Applies `change`, clamping font sizes to the supported range.
  pub fn apply(&mut self, change: SettingChange) {
    match change {
      SettingChange::Language(language) => self.language = language,
      SettingChange::LayoutDefault(layout) => self.layout_default = layout,
      SettingChange::LayoutTanakh(layout) => self.layout_tanakh = layout,
      SettingChange::LayoutTalmud(layout) => self.layout_talmud = layout,
      SettingChange::BiLayout(bi_layout) => self.bi_layout = bi_layout,
      SettingChange::Color(color) => self.color = color,
      SettingChange::FontSizeStep(grow) => {
        let step = if grow { FONT_SIZE_STEP } else { -FONT_SIZE_STEP };
        self.font_size = (self.font_size + step).clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
      },
    }
  }

  /// Copy of these settings suitable for a connections panel.
  pub fn for_connections(&self) -> Self {
    Self { language: self.language.for_connections(), ..self.clone() }
  }
}
