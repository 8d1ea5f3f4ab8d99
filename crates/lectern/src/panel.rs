//! The state of one reading pane.
//!
//! A [`PanelState`] either displays content (a text, its connections, or both)
//! or a named [`Menu`] overlay. The two are mutually exclusive: whenever
//! `menu` is set, `mode` is ignored for rendering. [`PanelState::view`] is the
//! single place that decides what a panel shows.
//!
//! Panels are usually built from a [`PartialPanel`], the loosely-filled shape
//! delivered by clicks and API responses, by
//! [`PanelStateFactory::normalize`](crate::factory::PanelStateFactory::normalize).

use super::*;

/// What a content panel displays when no menu is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
  /// A text
  #[default]
  Text,
  /// The connections (commentary and cross references) of some refs
  Connections,
  /// A text with its connections in the same pane (single-panel mode)
  TextAndConnections,
  /// The header surface above all panels in multi-panel mode
  Header,
}

/// Which tool of a connections panel is showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionsMode {
  /// The overview of available resources
  #[default]
  Resources,
  /// Connection categories with counts
  ConnectionsList,
  /// The filtered list of connected texts
  TextList,
  /// Available versions of the text
  Versions,
  /// One version opened for comparison
  VersionOpen,
  /// Information about the text
  About,
  /// The reader's notes
  Notes,
  /// Source sheets citing the refs
  Sheets,
  /// Adding the refs to a source sheet
  AddToSheet,
  /// Sharing the refs
  Share,
}

/// Sort order of search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSort {
  /// Best match first
  #[default]
  Relevance,
  /// Oldest text first
  Chronological,
}

impl Display for SearchSort {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SearchSort::Relevance => write!(f, "relevance"),
      SearchSort::Chronological => write!(f, "chronological"),
    }
  }
}

/// Search field used unless the reader asks for exact matches.
pub const DEFAULT_SEARCH_FIELD: &str = "naive_lemmatizer";

/// A named overlay that supersedes text display in a panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Menu {
  /// The library navigation, opened at a category path
  #[serde(rename_all = "camelCase")]
  Navigation {
    /// Category path, outermost first; empty for the library root
    #[serde(default)]
    categories: Vec<String>,
  },
  /// Full-text search
  #[serde(rename_all = "camelCase")]
  Search {
    /// The query as typed
    #[serde(default)]
    query:           String,
    /// Category/book filters applied to results
    #[serde(default)]
    applied_filters: Vec<String>,
    /// Index field searched
    #[serde(default = "default_search_field")]
    field:           String,
    /// Result ordering
    #[serde(default)]
    sort_type:       SearchSort,
  },
  /// Source sheets, optionally narrowed to one tag
  Sheets {
    /// Tag to list sheets for
    #[serde(default)]
    tag: Option<String>,
  },
  /// The table of contents of one book
  BookToc {
    /// Title of the book
    title: String,
  },
  /// The reader's account page
  Account,
  /// The reader's notifications
  Notifications,
  /// Picker for a text to compare against
  Compare,
}

/// Serde default for [`Menu::Search`] fields.
fn default_search_field() -> String { DEFAULT_SEARCH_FIELD.to_string() }

impl Menu {
  /// A search menu for `query` with default field, filters and sort.
  pub fn search(query: impl Into<String>) -> Self {
    Menu::Search {
      query:           query.into(),
      applied_filters: Vec::new(),
      field:           default_search_field(),
      sort_type:       SearchSort::default(),
    }
  }

  /// The library navigation root.
  pub fn library() -> Self { Menu::Navigation { categories: Vec::new() } }
}

/// A specific textual witness pinned to a panel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionSelection {
  /// Title of the version, e.g. "The Koren Jerusalem Bible"
  pub title:    String,
  /// Language of the version
  pub language: VersionLanguage,
}

impl VersionSelection {
  /// Creates a selection of `title` in `language`.
  pub fn new(title: impl Into<String>, language: VersionLanguage) -> Self {
    Self { title: title.into(), language }
  }
}

/// Progress of the most recent content fetch for a panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadStatus {
  /// Nothing requested yet
  #[default]
  Idle,
  /// A fetch is in flight
  Loading,
  /// Content for the current refs is in the content cache
  Loaded,
  /// The content source reported an error; the message is shown in the panel
  Failed(String),
}

/// Everything needed to render one reading pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelState {
  /// Content shown when no menu is open
  pub mode:             Mode,
  /// Open overlay menu, if any
  #[serde(default)]
  pub menu:             Option<Menu>,
  /// Refs currently loaded, in reading order
  #[serde(default)]
  pub refs:             Vec<String>,
  /// Refs visually emphasized, always within the sections of `refs`
  #[serde(default)]
  pub highlighted_refs: Vec<String>,
  /// Active connection filters
  #[serde(default)]
  pub filter:           Vec<String>,
  /// Recently used connection filters, most recent first
  #[serde(default)]
  pub recent_filters:   Vec<String>,
  /// Pinned version, if any
  #[serde(default)]
  pub version:          Option<VersionSelection>,
  /// Display preferences
  pub settings:         Settings,
  /// Tool shown by a connections panel
  #[serde(default)]
  pub connections_mode: ConnectionsMode,
  /// Status of the content fetch for `refs`
  #[serde(skip)]
  pub status:           LoadStatus,
  /// Incremented whenever a new fetch is requested; older responses are stale
  #[serde(skip)]
  pub fetch_generation: u64,
}

/// What a panel actually shows, after resolving menu precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelView<'a> {
  /// A named menu
  Menu(&'a Menu),
  /// A text
  Text,
  /// Connections of some refs
  Connections,
  /// A text with its connections
  TextAndConnections,
  /// The empty header surface
  Header,
}

impl PanelState {
  /// An empty text panel using `settings`.
  pub fn new(settings: Settings) -> Self {
    Self {
      mode: Mode::Text,
      menu: None,
      refs: Vec::new(),
      highlighted_refs: Vec::new(),
      filter: Vec::new(),
      recent_filters: Vec::new(),
      version: None,
      settings,
      connections_mode: ConnectionsMode::default(),
      status: LoadStatus::Idle,
      fetch_generation: 0,
    }
  }

  /// What this panel renders.
  pub fn view(&self) -> PanelView<'_> {
    match (&self.menu, self.mode) {
      (Some(menu), _) => PanelView::Menu(menu),
      (None, Mode::Text) => PanelView::Text,
      (None, Mode::Connections) => PanelView::Connections,
      (None, Mode::TextAndConnections) => PanelView::TextAndConnections,
      (None, Mode::Header) => PanelView::Header,
    }
  }

  /// Whether this panel is showing a text (not a menu).
  pub fn is_text(&self) -> bool { matches!(self.view(), PanelView::Text) }

  /// Whether this panel is showing connections (not a menu).
  pub fn is_connections(&self) -> bool { matches!(self.view(), PanelView::Connections) }

  /// The ref this panel is "at": the highlighted span if any, else the last
  /// loaded ref.
  pub fn current_ref(&self) -> Option<String> {
    span_refs(&self.highlighted_refs).or_else(|| self.refs.last().cloned())
  }

  /// Book of the current ref.
  pub fn book(&self) -> Option<String> { self.refs.last().map(|r| book_title(r)) }

  /// Merges every field present in `partial` into this panel.
  pub fn extend(&mut self, partial: PartialPanel) {
    let PartialPanel {
      mode,
      menu,
      refs,
      highlighted_refs,
      filter,
      recent_filters,
      version,
      settings,
      connections_mode,
    } = partial;

    if let Some(mode) = mode {
      self.mode = mode;
    }
    if let Some(menu) = menu {
      self.menu = Some(menu);
    }
    if let Some(refs) = refs {
      self.refs = refs;
    }
    if let Some(highlighted_refs) = highlighted_refs {
      self.highlighted_refs = highlighted_refs;
    }
    if let Some(filter) = filter {
      self.filter = filter;
    }
    if let Some(recent_filters) = recent_filters {
      self.recent_filters = recent_filters;
    }
    if let Some(version) = version {
      self.version = Some(version);
    }
    if let Some(settings) = settings {
      self.settings = settings;
    }
    if let Some(connections_mode) = connections_mode {
      self.connections_mode = connections_mode;
    }
  }
}

/// A loosely-specified panel: every absent field takes its default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialPanel {
  /// See [`PanelState::mode`]
  pub mode:             Option<Mode>,
  /// See [`PanelState::menu`]
  pub menu:             Option<Menu>,
  /// See [`PanelState::refs`]
  pub refs:             Option<Vec<String>>,
  /// See [`PanelState::highlighted_refs`]
  pub highlighted_refs: Option<Vec<String>>,
  /// See [`PanelState::filter`]
  pub filter:           Option<Vec<String>>,
  /// See [`PanelState::recent_filters`]
  pub recent_filters:   Option<Vec<String>>,
  /// See [`PanelState::version`]
  pub version:          Option<VersionSelection>,
  /// See [`PanelState::settings`]
  pub settings:         Option<Settings>,
  /// See [`PanelState::connections_mode`]
  pub connections_mode: Option<ConnectionsMode>,
}

impl PartialPanel {
  /// A text panel at `reference`.
  pub fn text(reference: impl Into<String>) -> Self {
    Self { mode: Some(Mode::Text), refs: Some(vec![reference.into()]), ..Self::default() }
  }

  /// A connections panel for `refs`.
  pub fn connections(refs: Vec<String>) -> Self {
    Self {
      mode: Some(Mode::Connections),
      highlighted_refs: Some(refs.clone()),
      refs: Some(refs),
      ..Self::default()
    }
  }

  /// A panel showing `menu`.
  pub fn menu(menu: Menu) -> Self { Self { menu: Some(menu), ..Self::default() } }

  /// Sets the pinned version.
  pub fn with_version(mut self, version: Option<VersionSelection>) -> Self {
    self.version = version;
    self
  }

  /// Sets the settings.
  pub fn with_settings(mut self, settings: Settings) -> Self {
    self.settings = Some(settings);
    self
  }
}

impl From<PanelState> for PartialPanel {
  fn from(panel: PanelState) -> Self {
    Self {
      mode:             Some(panel.mode),
      menu:             panel.menu,
      refs:             Some(panel.refs),
      highlighted_refs: Some(panel.highlighted_refs),
      filter:           Some(panel.filter),
      recent_filters:   Some(panel.recent_filters),
      version:          panel.version,
      settings:         Some(panel.settings),
      connections_mode: Some(panel.connections_mode),
    }
  }
}
