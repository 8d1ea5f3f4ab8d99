//! On-disk configuration and persistence of display settings.
//!
//! The configuration lives in a single TOML file, by default at
//! `<config dir>/lectern/config.toml`:
//!
//! ```toml
//! multi_panel = true
//! min_panel_width = 360.0
//! window_width = 1440.0
//! recently_viewed_limit = 20
//! api_base_url = "https://www.sefaria.org"
//!
//! [settings]
//! language = "bilingual"
//! layoutDefault = "segmented"
//! color = "light"
//! fontSize = 62.5
//! ```
//!
//! The `[settings]` table doubles as the reader's persisted default display
//! settings: [`FileSettingsStore`] rewrites just that table whenever the reader
//! changes a setting.

use super::*;

/// Reader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Whether panels are shown side by side under a header
  pub multi_panel:           bool,
  /// Narrowest a panel may be before panels overflow
  pub min_panel_width:       f64,
  /// Window width assumed until the front end reports one
  pub window_width:          f64,
  /// Number of entries kept in the recently viewed list
  pub recently_viewed_limit: usize,
  /// Root of the content API
  pub api_base_url:          String,
  /// Default display settings for new panels
  pub settings:              Settings,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      multi_panel:           true,
      min_panel_width:       layout::MIN_PANEL_WIDTH,
      window_width:          1440.0,
      recently_viewed_limit: 20,
      api_base_url:          "https://www.sefaria.org".to_string(),
      settings:              Settings::default(),
    }
  }
}

impl Config {
  /// Returns the default path for the configuration file.
  ///
  /// - On Unix: `~/.config/lectern/config.toml`
  /// - On macOS: `~/Library/Application Support/lectern/config.toml`
  /// - On Windows: `%APPDATA%\lectern\config.toml`
  /// - Fallback: `./lectern/config.toml`
  pub fn default_path() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join("lectern").join("config.toml")
  }

  /// Reads the configuration at `path`.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let config = toml::from_str(&content)?;
    debug!(path = %path.as_ref().display(), "loaded configuration");
    Ok(config)
  }

  /// Reads the configuration at `path`, or the defaults if there is no file.
  pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
    if path.as_ref().exists() {
      Self::load(path)
    } else {
      debug!(path = %path.as_ref().display(), "no configuration file, using defaults");
      Ok(Self::default())
    }
  }

  /// Writes the configuration to `path`, creating parent directories.
  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(self)?)?;
    debug!(path = %path.display(), "saved configuration");
    Ok(())
  }

  /// Sets the default display settings.
  pub fn with_settings(mut self, settings: Settings) -> Self {
    self.settings = settings;
    self
  }

  /// Sets whether panels are shown side by side.
  pub fn with_multi_panel(mut self, multi_panel: bool) -> Self {
    self.multi_panel = multi_panel;
    self
  }

  /// Sets the content API root.
  pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
    self.api_base_url = api_base_url.into();
    self
  }

  /// Sets the assumed window width.
  pub fn with_window_width(mut self, window_width: f64) -> Self {
    self.window_width = window_width;
    self
  }

  /// Checks values the reader cannot work with.
  pub fn validate(&self) -> Result<()> {
    if !(self.min_panel_width.is_finite() && self.min_panel_width > 0.0) {
      return Err(LecternError::Config(format!(
        "min_panel_width must be a positive number, got {}",
        self.min_panel_width
      )));
    }
    if self.recently_viewed_limit == 0 {
      return Err(LecternError::Config("recently_viewed_limit must be at least 1".into()));
    }
    url::Url::parse(&self.api_base_url)?;
    Ok(())
  }
}

/// Persistence for the reader's default display settings.
pub trait SettingsStore: std::fmt::Debug + Send {
  /// The persisted settings, if any were saved.
  fn load(&self) -> Result<Option<Settings>>;

  /// Persists `settings` as the new defaults.
  fn save(&mut self, settings: &Settings) -> Result<()>;
}

/// Keeps settings in memory only.
#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
  /// Last saved settings
  saved: Option<Settings>,
  /// Number of saves so far
  saves: usize,
}

impl MemorySettingsStore {
  /// Creates an empty store.
  pub fn new() -> Self { Self::default() }

  /// Number of times settings were saved.
  pub fn saves(&self) -> usize { self.saves }
}

impl SettingsStore for MemorySettingsStore {
  fn load(&self) -> Result<Option<Settings>> { Ok(self.saved.clone()) }

  fn save(&mut self, settings: &Settings) -> Result<()> {
    self.saved = Some(settings.clone());
    self.saves += 1;
    Ok(())
  }
}

/// Stores settings in the `[settings]` table of a configuration file.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
  /// Path of the configuration file
  path: PathBuf,
}

impl FileSettingsStore {
  /// A store writing to the configuration file at `path`.
  pub fn new(path: impl AsRef<Path>) -> Self { Self { path: path.as_ref().to_path_buf() } }
}

impl SettingsStore for FileSettingsStore {
  fn load(&self) -> Result<Option<Settings>> {
    if !self.path.exists() {
      return Ok(None);
    }
    Ok(Some(Config::load(&self.path)?.settings))
  }

  fn save(&mut self, settings: &Settings) -> Result<()> {
    let config = Config::load_or_default(&self.path)?.with_settings(settings.clone());
    config.save(&self.path)
  }
}

#[cfg(test)]
mod tests {
  use tempfile::tempdir;

  use super::*;

  #[traced_test]
  #[test]
  fn test_config_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let config = Config::default()
      .with_multi_panel(false)
      .with_api_base_url("http://localhost:8000")
      .with_settings(Settings { color: Color::Sepia, ..Settings::default() });
    config.save(&path).unwrap();

    assert_eq!(Config::load(&path).unwrap(), config);
  }

  #[test]
  fn test_partial_config_uses_defaults() {
    let config: Config = toml::from_str("multi_panel = false\n[settings]\nlanguage = \"hebrew\"").unwrap();
    assert!(!config.multi_panel);
    assert_eq!(config.settings.language, Language::Hebrew);
    assert_eq!(config.settings.font_size, Settings::default().font_size);
    assert_eq!(config.min_panel_width, layout::MIN_PANEL_WIDTH);
  }

  #[test]
  fn test_validate() {
    assert!(Config::default().validate().is_ok());
    let config = Config { min_panel_width: 0.0, ..Config::default() };
    assert!(matches!(config.validate(), Err(LecternError::Config(_))));
    let config = Config::default().with_api_base_url("not a url");
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_file_settings_store_keeps_other_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    Config::default().with_window_width(900.0).save(&path).unwrap();

    let mut store = FileSettingsStore::new(&path);
    let settings = Settings { language: Language::Hebrew, ..Settings::default() };
    store.save(&settings).unwrap();

    assert_eq!(store.load().unwrap(), Some(settings));
    assert_eq!(Config::load(&path).unwrap().window_width, 900.0);
  }

  #[test]
  fn test_missing_file_loads_nothing() {
    let dir = tempdir().unwrap();
    let store = FileSettingsStore::new(dir.path().join("absent.toml"));
    assert!(store.load().unwrap().is_none());
    assert_eq!(Config::load_or_default(dir.path().join("absent.toml")).unwrap(), Config::default());
  }
}
