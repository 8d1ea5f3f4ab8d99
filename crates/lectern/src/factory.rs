//! Default filling of partial panels.
//!
//! [`PanelStateFactory::normalize`] is the only way the controller creates
//! panels. It never fails: any field missing from the partial input takes a
//! documented default, and the structural invariants of [`PanelState`] are
//! re-established on the way out:
//!
//! - connections panels never display bilingually
//! - highlighted refs stay inside the sections of the loaded refs
//! - a panel with refs but no pinned version picks up the reader's cached
//!   default version for that book and language
//!
//! # Examples
//!
//! ```
//! use lectern::{
//!   factory::PanelStateFactory,
//!   panel::{ConnectionsMode, Mode, PartialPanel},
//!   settings::Settings,
//! };
//!
//! let factory = PanelStateFactory::default();
//! let panel = factory.normalize(PartialPanel::text("Genesis 1:1"), &Settings::default());
//!
//! assert_eq!(panel.mode, Mode::Text);
//! assert_eq!(panel.connections_mode, ConnectionsMode::Resources);
//! assert_eq!(panel.settings, Settings::default());
//! ```

use super::*;

/// Reader-chosen default versions, keyed by book title and version language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionCache {
  /// Chosen version title per (book, language)
  defaults: BTreeMap<(String, VersionLanguage), String>,
}

impl VersionCache {
  /// Creates an empty cache.
  pub fn new() -> Self { Self::default() }

  /// Remembers `version` as the default for its language in `book`.
  pub fn set(&mut self, book: &str, version: &VersionSelection) {
    trace!(book, version = %version.title, language = %version.language, "caching default version");
    self.defaults.insert((book.to_string(), version.language), version.title.clone());
  }

  /// Forgets the default for `language` in `book`.
  pub fn clear(&mut self, book: &str, language: VersionLanguage) {
    self.defaults.remove(&(book.to_string(), language));
  }

  /// The default version for `book` in `language`, if one was chosen.
  pub fn get(&self, book: &str, language: VersionLanguage) -> Option<VersionSelection> {
    self
      .defaults
      .get(&(book.to_string(), language))
      .map(|title| VersionSelection::new(title.clone(), language))
  }

  /// Number of cached defaults.
  pub fn len(&self) -> usize { self.defaults.len() }

  /// Whether no defaults are cached.
  pub fn is_empty(&self) -> bool { self.defaults.is_empty() }
}

/// Builds fully-populated [`PanelState`]s from [`PartialPanel`]s.
#[derive(Debug, Clone, Default)]
pub struct PanelStateFactory {
  /// Default versions consulted for panels without a pinned version
  versions: VersionCache,
}

impl PanelStateFactory {
  /// Creates a factory backed by `versions`.
  pub fn new(versions: VersionCache) -> Self { Self { versions } }

  /// The version defaults this factory applies.
  pub fn versions(&self) -> &VersionCache { &self.versions }

  /// Mutable access to the version defaults.
  pub fn versions_mut(&mut self) -> &mut VersionCache { &mut self.versions }

  /// Turns `partial` into a complete panel.
  ///
  /// Absent fields default as follows: `mode` to [`Mode::Text`], `menu` and
  /// `version` to none, ref and filter lists to empty, `connections_mode` to
  /// [`ConnectionsMode::Resources`], and `settings` to a clone of `defaults`.
  pub fn normalize(&self, partial: PartialPanel, defaults: &Settings) -> PanelState {
    let mut panel = PanelState::new(defaults.clone());
    panel.extend(partial);
    self.enforce(&mut panel);
    panel
  }

  /// Re-establishes panel invariants after an in-place change.
  pub fn enforce(&self, panel: &mut PanelState) {
    if panel.mode == Mode::Connections {
      panel.settings.language = panel.settings.language.for_connections();
    }

    if panel.refs.is_empty() {
      panel.highlighted_refs.clear();
    } else {
      let sections: Vec<String> = panel.refs.iter().map(|r| section_of(r)).collect();
      let before = panel.highlighted_refs.len();
      panel.highlighted_refs.retain(|r| sections.contains(&section_of(r)));
      if panel.highlighted_refs.len() != before {
        debug!(dropped = before - panel.highlighted_refs.len(), "dropped highlights outside loaded sections");
      }
    }

    if panel.version.is_none() {
      panel.version = self.default_version(panel);
    }
  }

  /// The cached default version that applies to `panel`, if any.
  fn default_version(&self, panel: &PanelState) -> Option<VersionSelection> {
    let book = panel.book()?;
    let languages: &[VersionLanguage] = match panel.settings.language {
      Language::English => &[VersionLanguage::En],
      Language::Hebrew => &[VersionLanguage::He],
      Language::Bilingual => &[VersionLanguage::En, VersionLanguage::He],
    };
    languages.iter().find_map(|language| self.versions.get(&book, *language))
  }
}
