//! The multi-panel reader state machine.
//!
//! [`ReaderApp`] owns the ordered list of panels and, in multi-panel mode, the
//! header panel above them. Every public operation follows the same shape:
//!
//! 1. validate the panel index (refs are never validated)
//! 2. build or update panels through the [`PanelStateFactory`]
//! 3. record a history entry, pushing for navigation and replacing for
//!    cosmetic changes, rehydration and in-place updates
//! 4. recompute the panel layout
//!
//! Content is fetched through the injected [`ContentSource`]. Each fetch is
//! tagged with a generation number; a response that arrives after its panel
//! was closed, replaced or re-requested is discarded.
//!
//! # Examples
//!
//! ```
//! use lectern::{controller::ReaderApp, panel::Menu};
//!
//! # fn example() -> Result<(), lectern::error::LecternError> {
//! let mut app = ReaderApp::builder().multi_panel(true).build();
//! app.open_panel("Genesis 1:1", None)?;
//! app.open_connections_at(1, vec!["Genesis 1:1".into()])?;
//! assert_eq!(app.panels().len(), 2);
//!
//! // Closing the text also closes its connections and shows the library.
//! app.close_panel(0)?;
//! assert!(app.panels().is_empty());
//! assert_eq!(app.header().unwrap().menu, Some(Menu::library()));
//! # Ok(())
//! # }
//! ```

use futures::future::join_all;

use super::*;
use crate::{
  config::{Config, MemorySettingsStore, SettingsStore},
  content::{Content, ContentKey, ContentSource, MemoryContent},
  factory::{PanelStateFactory, VersionCache},
  history::{parse_url, BrowserHistory, HistoryCommand, HistoryEntry, HistorySerializer, HistoryState, MemoryHistory},
  layout::{LayoutCalculator, PanelLayout},
};

/// An entry in the reader's recently viewed list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentlyViewed {
  /// The ref that was opened
  pub reference: String,
  /// Book of the ref; the list keeps one entry per book
  pub book:      String,
  /// Version pinned when the ref was opened
  pub version:   Option<VersionSelection>,
  /// When the ref was opened
  pub viewed_at: DateTime<Utc>,
}

/// Handle for one in-flight content fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
  /// Index of the panel the fetch was requested for
  pub index:      usize,
  /// Generation the panel had when the fetch was requested
  pub generation: u64,
  /// What is being fetched
  pub key:        ContentKey,
}

/// The multi-panel reader.
#[derive(Debug)]
pub struct ReaderApp<H: BrowserHistory = MemoryHistory> {
  /// Reading panels, left to right
  panels:                Vec<PanelState>,
  /// Header surface in multi-panel mode
  header:                PanelState,
  /// Whether panels are shown side by side under a header
  multi_panel:           bool,
  /// Settings given to new panels
  default_settings:      Settings,
  /// Builds and normalizes panels
  factory:               PanelStateFactory,
  /// Recently opened refs, most recent first
  recently_viewed:       Vec<RecentlyViewed>,
  /// Capacity of `recently_viewed`
  recently_viewed_limit: usize,
  /// Where history entries are recorded
  history:               H,
  /// How the last sync touched the history
  last_command:          Option<HistoryCommand>,
  /// Source of text, link and index data
  content:               Arc<dyn ContentSource>,
  /// Persistence for `default_settings`
  settings_store:        Box<dyn SettingsStore>,
  /// Current window width in pixels
  window_width:          f64,
  /// Narrowest width a panel may take
  min_panel_width:       f64,
  /// Widths for the current panels
  layout:                PanelLayout,
  /// The next sync follows a popped history entry
  just_popped:           bool,
  /// The next sync replaces rather than pushes
  replace_next:          bool,
  /// Last fetch generation handed out
  generation:            u64,
}

/// Builder for [`ReaderApp`].
#[derive(Debug)]
pub struct ReaderAppBuilder<H: BrowserHistory = MemoryHistory> {
  /// Starting configuration
  config:         Config,
  /// History backend
  history:        H,
  /// Content source, defaulting to an empty [`MemoryContent`]
  content:        Option<Arc<dyn ContentSource>>,
  /// Settings persistence, defaulting to a [`MemorySettingsStore`]
  settings_store: Option<Box<dyn SettingsStore>>,
  /// Cached default versions
  versions:       VersionCache,
}

impl ReaderApp<MemoryHistory> {
  /// Starts building a reader with an in-memory history.
  pub fn builder() -> ReaderAppBuilder<MemoryHistory> {
    ReaderAppBuilder {
      config:         Config::default(),
      history:        MemoryHistory::new(),
      content:        None,
      settings_store: None,
      versions:       VersionCache::new(),
    }
  }
}

impl<H: BrowserHistory> ReaderAppBuilder<H> {
  /// Uses `config` for panel mode, window and panel widths, and default settings.
  pub fn with_config(mut self, config: Config) -> Self {
    self.config = config;
    self
  }

  /// Shows panels side by side under a header (`true`) or one at a time.
  pub fn multi_panel(mut self, multi_panel: bool) -> Self {
    self.config.multi_panel = multi_panel;
    self
  }

  /// Records history in `history` instead.
  pub fn with_history<H2: BrowserHistory>(self, history: H2) -> ReaderAppBuilder<H2> {
    ReaderAppBuilder {
      config: self.config,
      history,
      content: self.content,
      settings_store: self.settings_store,
      versions: self.versions,
    }
  }

  /// Fetches content from `content`.
  pub fn with_content(mut self, content: Arc<dyn ContentSource>) -> Self {
    self.content = Some(content);
    self
  }

  /// Persists default settings through `store`.
  pub fn with_settings_store(mut self, store: Box<dyn SettingsStore>) -> Self {
    self.settings_store = Some(store);
    self
  }

  /// Starts from previously chosen default versions.
  pub fn with_versions(mut self, versions: VersionCache) -> Self {
    self.versions = versions;
    self
  }

  /// Builds the reader. Settings persisted in the store win over the
  /// configuration's defaults.
  pub fn build(self) -> ReaderApp<H> {
    let settings_store = self.settings_store.unwrap_or_else(|| Box::new(MemorySettingsStore::new()));
    let default_settings = match settings_store.load() {
      Ok(Some(settings)) => settings,
      Ok(None) => self.config.settings.clone(),
      Err(e) => {
        warn!("could not load persisted settings, using configured defaults: {e}");
        self.config.settings.clone()
      },
    };

    let factory = PanelStateFactory::new(self.versions);
    let header = factory.normalize(
      PartialPanel { mode: Some(Mode::Header), ..PartialPanel::default() },
      &default_settings,
    );
    let cap = LayoutCalculator::panel_cap_with(self.config.window_width, self.config.min_panel_width);

    ReaderApp {
      panels: Vec::new(),
      header,
      multi_panel: self.config.multi_panel,
      default_settings,
      factory,
      recently_viewed: Vec::new(),
      recently_viewed_limit: self.config.recently_viewed_limit.max(1),
      history: self.history,
      last_command: None,
      content: self.content.unwrap_or_else(|| Arc::new(MemoryContent::new())),
      settings_store,
      window_width: self.config.window_width,
      min_panel_width: self.config.min_panel_width,
      layout: LayoutCalculator::widths(&[], cap, self.config.window_width),
      just_popped: false,
      replace_next: false,
      generation: 0,
    }
  }
}

impl<H: BrowserHistory> ReaderApp<H> {
  /// The reading panels, left to right.
  pub fn panels(&self) -> &[PanelState] { &self.panels }

  /// Panel `n`, if it exists.
  pub fn panel(&self, n: usize) -> Option<&PanelState> { self.panels.get(n) }

  /// The header panel, in multi-panel mode.
  pub fn header(&self) -> Option<&PanelState> { self.multi_panel.then_some(&self.header) }

  /// Whether panels are shown side by side under a header.
  pub fn is_multi_panel(&self) -> bool { self.multi_panel }

  /// The history backend.
  pub fn history(&self) -> &H { &self.history }

  /// Mutable access to the history backend, e.g. to step back.
  pub fn history_mut(&mut self) -> &mut H { &mut self.history }

  /// How the most recent change was recorded, if it was.
  pub fn last_command(&self) -> Option<HistoryCommand> { self.last_command }

  /// The entry describing the current state, without recording it.
  pub fn current_entry(&self) -> HistoryEntry { HistorySerializer::serialize(&self.panels, self.header()) }

  /// Widths for the current panels.
  pub fn layout(&self) -> &PanelLayout { &self.layout }

  /// How many panels fit side by side in the current window.
  pub fn panel_cap(&self) -> usize { LayoutCalculator::panel_cap_with(self.window_width, self.min_panel_width) }

  /// Recently opened refs, most recent first.
  pub fn recently_viewed(&self) -> &[RecentlyViewed] { &self.recently_viewed }

  /// Settings given to new panels.
  pub fn default_settings(&self) -> &Settings { &self.default_settings }

  /// Default versions chosen so far.
  pub fn versions(&self) -> &VersionCache { self.factory.versions() }

  /// Replaces all panels with a single panel at `reference`.
  ///
  /// A bare book title opens that book's table of contents instead of a text.
  pub fn open_panel(&mut self, reference: &str, version: Option<VersionSelection>) -> Result<()> {
    debug!(reference, "opening panel");
    let panel = self.factory.normalize(Self::partial_for(reference, version), &self.default_settings);
    self.record_recent(&panel);
    self.panels = vec![panel];
    self.header.menu = None;
    self.sync();
    Ok(())
  }

  /// Opens a panel at `reference` immediately after panel `n`.
  pub fn open_panel_at(
    &mut self,
    n: usize,
    reference: &str,
    version: Option<VersionSelection>,
  ) -> Result<()> {
    self.check_index(n)?;
    debug!(n, reference, "opening panel after");
    let panel = self.factory.normalize(Self::partial_for(reference, version), &self.default_settings);
    self.record_recent(&panel);
    self.panels.insert(n + 1, panel);
    self.sync();
    Ok(())
  }

  /// Shows the connections of `refs` at position `n`.
  ///
  /// An existing connections panel at `n` is updated in place. Otherwise a new
  /// one is inserted at `n`, taking its filters from the text panel before it
  /// and its version too when the version's language is the one the
  /// connections panel displays.
  pub fn open_connections_at(&mut self, n: usize, refs: Vec<String>) -> Result<()> {
    if n > self.panels.len() {
      return Err(self.index_error(n));
    }
    debug!(n, ?refs, "opening connections");

    match self.panels.get_mut(n).filter(|p| p.is_connections()) {
      Some(panel) => {
        panel.refs = refs.clone();
        panel.highlighted_refs = refs.clone();
        self.factory.enforce(panel);
        self.replace_next = true;
      },
      None => {
        let parent = n.checked_sub(1).and_then(|i| self.panels.get(i)).filter(|p| p.is_text());
        let settings = parent.map_or_else(|| self.default_settings.for_connections(), |p| p.settings.for_connections());
        let mut partial = PartialPanel::connections(refs.clone()).with_settings(settings.clone());

        if let Some(parent) = parent {
          partial.filter = Some(parent.filter.clone());
          partial.recent_filters = Some(parent.recent_filters.clone());
          partial.connections_mode = Some(if parent.filter.is_empty() {
            ConnectionsMode::Resources
          } else {
            ConnectionsMode::TextList
          });
          partial.version = parent
            .version
            .clone()
            .filter(|v| Some(v.language) == settings.language.version_language());
        }

        let panel = self.factory.normalize(partial, &self.default_settings);
        self.panels.insert(n, panel);
      },
    }

    if let Some(text) = n.checked_sub(1).and_then(|i| self.panels.get_mut(i)).filter(|p| p.is_text()) {
      text.highlighted_refs = refs;
      self.factory.enforce(text);
    }

    self.sync();
    Ok(())
  }

  /// Highlights `refs` in panel `n` and points a following connections panel
  /// at them.
  pub fn set_text_list_highlight(&mut self, n: usize, refs: Vec<String>) -> Result<()> {
    self.check_index(n)?;
    debug!(n, ?refs, "highlighting");

    let panel = &mut self.panels[n];
    panel.highlighted_refs = refs.clone();
    self.factory.enforce(panel);

    if let Some(next) = self.panels.get_mut(n + 1).filter(|p| p.is_connections()) {
      next.refs = refs.clone();
      next.highlighted_refs = refs;
      self.factory.enforce(next);
    }

    self.sync();
    Ok(())
  }

  /// Narrows connections panel `n` to `filter`, or shows all connections for
  /// `None`. The text panel before it gets the same filter. Fails with
  /// [`LecternError::NotConnections`] when panel `n` shows anything else.
  pub fn set_connections_filter(
    &mut self,
    n: usize,
    filter: Option<&str>,
    update_recent: bool,
  ) -> Result<()> {
    self.check_index(n)?;
    if !self.panels[n].is_connections() {
      warn!(index = n, "filter requested for a panel without connections");
      return Err(LecternError::NotConnections(n));
    }
    debug!(n, ?filter, update_recent, "setting connections filter");

    let panel = &mut self.panels[n];
    match filter {
      Some(filter) => {
        if update_recent {
          panel.recent_filters.retain(|f| f != filter);
          panel.recent_filters.insert(0, filter.to_string());
        }
        panel.filter = vec![filter.to_string()];
        panel.connections_mode = ConnectionsMode::TextList;
      },
      None => {
        panel.filter.clear();
        panel.connections_mode = ConnectionsMode::Resources;
      },
    }
    self.factory.enforce(panel);
    let (filter, recent_filters) = (panel.filter.clone(), panel.recent_filters.clone());

    if let Some(text) = n.checked_sub(1).and_then(|i| self.panels.get_mut(i)).filter(|p| p.is_text()) {
      text.filter = filter;
      text.recent_filters = recent_filters;
    }

    self.sync();
    Ok(())
  }

  /// Closes panel `n`.
  ///
  /// A text panel takes its connections panel with it. Closing a connections
  /// panel clears the highlight and filter of the text before it. When no
  /// panels remain the library is shown.
  pub fn close_panel(&mut self, n: usize) -> Result<()> {
    self.check_index(n)?;
    let closed = self.panels.remove(n);
    debug!(n, view = ?closed.view(), "closing panel");

    if closed.is_text() {
      if self.panels.get(n).is_some_and(|p| p.is_connections()) {
        self.panels.remove(n);
      }
    } else if closed.is_connections() {
      if let Some(text) = n.checked_sub(1).and_then(|i| self.panels.get_mut(i)).filter(|p| p.is_text()) {
        text.highlighted_refs.clear();
        text.filter.clear();
      }
    }

    if self.panels.is_empty() {
      self.show_menu(Menu::library());
    }

    self.sync();
    Ok(())
  }

  /// Shows `reference` in panel `n`, keeping its position and settings.
  pub fn replace_panel(
    &mut self,
    n: usize,
    reference: &str,
    version: Option<VersionSelection>,
  ) -> Result<()> {
    self.check_index(n)?;
    debug!(n, reference, "replacing panel");
    let settings = self.panels[n].settings.clone();
    let panel = self
      .factory
      .normalize(Self::partial_for(reference, version).with_settings(settings), &self.default_settings);
    self.record_recent(&panel);
    self.panels[n] = panel;
    self.sync();
    Ok(())
  }

  /// Pins `version` on panel `n`, or unpins with `None`.
  ///
  /// The choice becomes the default for the panel's book in that language and
  /// is passed on to a following connections panel.
  pub fn select_version(&mut self, n: usize, version: Option<VersionSelection>) -> Result<()> {
    self.check_index(n)?;
    debug!(n, ?version, "selecting version");

    let panel = &mut self.panels[n];
    let book = panel.book();
    match (&version, book) {
      (Some(version), Some(book)) => self.factory.versions_mut().set(&book, version),
      (None, Some(book)) =>
        if let Some(previous) = &panel.version {
          self.factory.versions_mut().clear(&book, previous.language);
        },
      (_, None) => {},
    }
    panel.version = version.clone();

    if let Some(next) = self.panels.get_mut(n + 1).filter(|p| p.is_connections()) {
      next.version = version;
    }

    self.sync();
    Ok(())
  }

  /// Opens the library navigation at `categories`.
  pub fn show_library(&mut self, categories: Vec<String>) -> Result<()> {
    self.show_menu(Menu::Navigation { categories });
    self.sync();
    Ok(())
  }

  /// Opens search for `query`.
  pub fn show_search(&mut self, query: &str) -> Result<()> {
    self.show_menu(Menu::search(query));
    self.sync();
    Ok(())
  }

  /// Opens the source sheets, optionally for one tag.
  pub fn show_sheets(&mut self, tag: Option<String>) -> Result<()> {
    self.show_menu(Menu::Sheets { tag });
    self.sync();
    Ok(())
  }

  /// Closes the open menu: the header's in multi-panel mode, else the first
  /// panel's.
  pub fn close_menu(&mut self) -> Result<()> {
    if self.multi_panel {
      self.header.menu = None;
    } else if let Some(panel) = self.panels.first_mut() {
      panel.menu = None;
    }
    self.sync();
    Ok(())
  }

  /// Merges `partial` into panel `n`.
  pub fn set_panel_state(&mut self, n: usize, partial: PartialPanel) -> Result<()> {
    self.check_index(n)?;
    let panel = &mut self.panels[n];
    panel.extend(partial);
    self.factory.enforce(panel);
    self.sync();
    Ok(())
  }

  /// Replaces the loaded sections of panel `n`, as infinite scrolling does.
  ///
  /// Recorded by replacing the current history entry.
  pub fn update_refs(&mut self, n: usize, refs: Vec<String>) -> Result<()> {
    self.check_index(n)?;
    trace!(n, ?refs, "updating loaded refs");
    let panel = &mut self.panels[n];
    panel.refs = refs;
    self.factory.enforce(panel);
    self.replace_next = true;
    self.sync();
    Ok(())
  }

  /// Changes one display setting of panel `n` and makes it the default for
  /// new panels.
  pub fn set_option(&mut self, n: usize, change: SettingChange) -> Result<()> {
    self.check_index(n)?;
    debug!(n, ?change, "changing setting");
    let panel = &mut self.panels[n];
    panel.settings.apply(change);
    self.factory.enforce(panel);
    self.default_settings.apply(change);
    self.sync();
    self.settings_store.save(&self.default_settings)
  }

  /// Restores the panels and header stored with a popped history entry.
  pub fn pop_state(&mut self, state: HistoryState) {
    let (panels, header) = HistorySerializer::deserialize(&state);
    debug!(panels = panels.len(), "restoring popped state");
    self.panels = panels;
    if let Some(header) = header {
      self.header = header;
    }
    self.just_popped = true;
    self.sync();
  }

  /// Restores the panels encoded in a shareable `url`.
  ///
  /// In multi-panel mode a URL naming a single overlay menu opens it in the
  /// header instead of a panel.
  pub fn open_url(&mut self, url: &str) -> Result<()> {
    let partials = parse_url(url, &self.default_settings)?;
    let mut panels: Vec<PanelState> =
      partials.into_iter().map(|p| self.factory.normalize(p, &self.default_settings)).collect();

    self.header.menu = None;
    if self.multi_panel {
      if let [only] = panels.as_slice() {
        if matches!(only.menu, Some(ref menu) if !matches!(menu, Menu::BookToc { .. })) {
          self.header.menu = only.menu.clone();
          panels.clear();
        }
      }
    }

    self.panels = panels;
    if self.panels.is_empty() && self.header.menu.is_none() {
      self.show_menu(Menu::library());
    }
    self.replace_next = true;
    self.sync();
    Ok(())
  }

  /// Records a new window width and recomputes the layout.
  pub fn set_window_width(&mut self, window_width: f64) {
    self.window_width = window_width;
    self.layout = LayoutCalculator::for_panels(&self.panels, self.panel_cap(), window_width);
    trace!(window_width, cap = self.panel_cap(), "window resized");
  }

  /// What panel `n` needs fetched, if anything.
  pub fn content_key(&self, n: usize) -> Option<ContentKey> {
    let panel = self.panels.get(n)?;
    match panel.view() {
      PanelView::Text | PanelView::TextAndConnections => Some(ContentKey::Text {
        reference: panel.refs.last()?.clone(),
        version:   panel.version.clone(),
      }),
      PanelView::Connections => Some(ContentKey::Related(section_of(panel.refs.first()?))),
      PanelView::Menu(Menu::BookToc { title }) => Some(ContentKey::Index(title.clone())),
      PanelView::Menu(_) | PanelView::Header => None,
    }
  }

  /// Content for panel `n` that is available without fetching.
  pub fn cached_content(&self, n: usize) -> Option<Content> {
    self.content.get_if_cached(&self.content_key(n)?)
  }

  /// Starts a fetch for panel `n`.
  ///
  /// Returns `None` when the panel needs nothing, or when its content is
  /// already cached, in which case the panel is marked loaded immediately.
  pub fn request_content(&mut self, n: usize) -> Result<Option<FetchTicket>> {
    self.check_index(n)?;
    let Some(key) = self.content_key(n) else {
      return Ok(None);
    };

    self.generation += 1;
    let cached = self.content.get_if_cached(&key).is_some();
    let panel = &mut self.panels[n];
    panel.fetch_generation = self.generation;
    if cached {
      panel.status = LoadStatus::Loaded;
      return Ok(None);
    }
    panel.status = LoadStatus::Loading;
    trace!(n, generation = self.generation, %key, "requesting content");
    Ok(Some(FetchTicket { index: n, generation: self.generation, key }))
  }

  /// Applies the outcome of a fetch. Returns `false` if the ticket was stale
  /// and the result was discarded.
  ///
  /// Failures are stored on the panel and never returned.
  pub fn receive_content(&mut self, ticket: FetchTicket, result: Result<Content>) -> bool {
    let current = self.content_key(ticket.index);
    let Some(panel) = self
      .panels
      .get_mut(ticket.index)
      .filter(|p| p.fetch_generation == ticket.generation && current.as_ref() == Some(&ticket.key))
    else {
      warn!(index = ticket.index, generation = ticket.generation, key = %ticket.key, "discarding stale content");
      return false;
    };

    panel.status = match result {
      Ok(_) => LoadStatus::Loaded,
      Err(e) => {
        debug!(index = ticket.index, "content fetch failed: {e}");
        LoadStatus::Failed(e.to_string())
      },
    };
    true
  }

  /// Fetches content for panel `n` and returns the panel's resulting status.
  pub async fn load(&mut self, n: usize) -> Result<LoadStatus> {
    if let Some(ticket) = self.request_content(n)? {
      let content = Arc::clone(&self.content);
      let result = content.fetch(&ticket.key).await;
      self.receive_content(ticket, result);
    }
    Ok(self.panels.get(n).map(|p| p.status.clone()).unwrap_or_default())
  }

  /// Fetches content for every panel concurrently.
  pub async fn load_all(&mut self) -> Result<()> {
    let mut tickets = Vec::new();
    for n in 0..self.panels.len() {
      if let Some(ticket) = self.request_content(n)? {
        tickets.push(ticket);
      }
    }

    let content = Arc::clone(&self.content);
    let results = join_all(tickets.iter().map(|ticket| content.fetch(&ticket.key))).await;
    for (ticket, result) in tickets.into_iter().zip(results) {
      self.receive_content(ticket, result);
    }
    Ok(())
  }

  /// Opens `menu` in the header (multi-panel) or the first panel.
  fn show_menu(&mut self, menu: Menu) {
    debug!(?menu, "showing menu");
    if self.multi_panel {
      self.header.menu = Some(menu);
    } else if let Some(panel) = self.panels.first_mut() {
      panel.menu = Some(menu);
    } else {
      let panel = self.factory.normalize(PartialPanel::menu(menu), &self.default_settings);
      self.panels.push(panel);
    }
  }

  /// Partial panel for opening `reference`.
  fn partial_for(reference: &str, version: Option<VersionSelection>) -> PartialPanel {
    match reference.parse::<Ref>() {
      Ok(parsed) if parsed.is_book() => PartialPanel::menu(Menu::BookToc { title: parsed.book().to_string() }),
      _ => PartialPanel::text(reference).with_version(version),
    }
  }

  /// Adds a text panel to the recently viewed list.
  fn record_recent(&mut self, panel: &PanelState) {
    if !panel.is_text() {
      return;
    }
    let (Some(reference), Some(book)) = (panel.refs.last(), panel.book()) else {
      return;
    };
    self.recently_viewed.retain(|r| r.book != book);
    self.recently_viewed.insert(0, RecentlyViewed {
      reference: reference.clone(),
      book,
      version: panel.version.clone(),
      viewed_at: Utc::now(),
    });
    self.recently_viewed.truncate(self.recently_viewed_limit);
  }

  /// Fails unless panel `n` exists.
  fn check_index(&self, n: usize) -> Result<()> {
    if n < self.panels.len() {
      Ok(())
    } else {
      Err(self.index_error(n))
    }
  }

  /// The error for a bad index `n`.
  fn index_error(&self, n: usize) -> LecternError {
    warn!(index = n, len = self.panels.len(), "panel index out of range");
    LecternError::PanelIndex { index: n, len: self.panels.len() }
  }

  /// Records the current state in history and recomputes the layout.
  fn sync(&mut self) {
    let header = self.multi_panel.then_some(&self.header);
    let entry = HistorySerializer::serialize(&self.panels, header);

    let command = if std::mem::take(&mut self.just_popped) || std::mem::take(&mut self.replace_next) {
      Some(HistoryCommand::Replace)
    } else {
      match self.history.current() {
        None => Some(HistoryCommand::Push),
        Some(current) if HistorySerializer::should_update(&current.state, &self.panels, header) =>
          Some(HistoryCommand::Push),
        Some(current) if *current != entry => Some(HistoryCommand::Replace),
        Some(_) => None,
      }
    };

    match command {
      Some(HistoryCommand::Push) => {
        debug!(url = %entry.url, "pushing history");
        self.history.push_state(entry);
      },
      Some(HistoryCommand::Replace) => {
        trace!(url = %entry.url, "replacing history");
        self.history.replace_state(entry);
      },
      None => {},
    }
    self.last_command = command;
    self.layout = LayoutCalculator::for_panels(&self.panels, self.panel_cap(), self.window_width);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn app() -> ReaderApp { ReaderApp::builder().multi_panel(true).build() }

  fn url(app: &ReaderApp) -> String { app.history().current().unwrap().url.clone() }

  #[traced_test]
  #[test]
  fn test_open_panel_replaces_everything() {
    let mut app = app();
    app.open_panel("Genesis 1:1", None).unwrap();
    app.open_panel_at(0, "Exodus 1", None).unwrap();
    assert_eq!(app.panels().len(), 2);

    app.show_search("light").unwrap();
    app.open_panel("Leviticus 1", None).unwrap();
    assert_eq!(app.panels().len(), 1);
    assert!(app.header().unwrap().menu.is_none());
    assert_eq!(url(&app), "/Leviticus.1");
  }

  #[test]
  fn test_open_book_opens_toc() {
    let mut app = app();
    app.open_panel("Genesis", None).unwrap();
    assert_eq!(app.panels()[0].menu, Some(Menu::BookToc { title: "Genesis".into() }));
    assert!(app.recently_viewed().is_empty());
    assert_eq!(url(&app), "/Genesis");
  }

  #[test]
  fn test_open_panel_at_inserts_after() {
    let mut app = app();
    app.open_panel("Genesis 1", None).unwrap();
    app.open_panel_at(0, "Exodus 1", None).unwrap();
    app.open_panel_at(0, "Numbers 1", None).unwrap();
    let refs: Vec<_> = app.panels().iter().map(|p| p.refs[0].as_str()).collect();
    assert_eq!(refs, ["Genesis 1", "Numbers 1", "Exodus 1"]);
    assert!(matches!(app.open_panel_at(3, "Ruth 1", None), Err(LecternError::PanelIndex { index: 3, len: 3 })));
  }

  #[test]
  fn test_open_connections_updates_in_place() {
    let mut app = app();
    app.open_panel("Genesis 1:1", None).unwrap();
    app.open_connections_at(1, vec!["Genesis 1:1".into()]).unwrap();
    app.open_connections_at(1, vec!["Genesis 1:2".into()]).unwrap();

    assert_eq!(app.panels().len(), 2);
    assert_eq!(app.panels()[1].refs, vec!["Genesis 1:2".to_string()]);
    assert_eq!(app.panels()[0].highlighted_refs, vec!["Genesis 1:2".to_string()]);
    assert_eq!(app.last_command(), Some(HistoryCommand::Replace));
  }

  #[test]
  fn test_open_connections_inherits_context() {
    let mut app = app();
    app.open_panel("Genesis 1:1", None).unwrap();
    app.set_option(0, SettingChange::Language(Language::English)).unwrap();
    app.select_version(0, Some(VersionSelection::new("JPS 1917", VersionLanguage::En))).unwrap();
    app.set_panel_state(0, PartialPanel { filter: Some(vec!["Rashi".into()]), ..Default::default() }).unwrap();

    app.open_connections_at(1, vec!["Genesis 1:1".into()]).unwrap();
    let connections = &app.panels()[1];
    assert_eq!(connections.filter, vec!["Rashi".to_string()]);
    assert_eq!(connections.connections_mode, ConnectionsMode::TextList);
    assert_eq!(connections.version, Some(VersionSelection::new("JPS 1917", VersionLanguage::En)));
  }

  #[test]
  fn test_hebrew_connections_skip_english_version() {
    let mut app = app();
    app.open_panel("Genesis 1:1", None).unwrap();
    app.set_option(0, SettingChange::Language(Language::Hebrew)).unwrap();
    app.select_version(0, Some(VersionSelection::new("JPS 1917", VersionLanguage::En))).unwrap();

    app.open_connections_at(1, vec!["Genesis 1:1".into()]).unwrap();
    let connections = &app.panels()[1];
    assert_eq!(connections.settings.language, Language::Hebrew);
    assert_eq!(connections.version, None);
  }

  #[test]
  fn test_highlight_cascades_to_connections() {
    let mut app = app();
    app.open_panel("Genesis 1:1", None).unwrap();
    app.open_connections_at(1, vec!["Genesis 1:1".into()]).unwrap();
    app.set_text_list_highlight(0, vec!["Genesis 1:1".into()]).unwrap();
    assert_eq!(app.panels()[1].refs, vec!["Genesis 1:1".to_string()]);

    app.update_refs(0, vec!["Genesis 1".into(), "Genesis 2".into()]).unwrap();
    app.set_text_list_highlight(0, vec!["Genesis 2:4".into(), "Genesis 2:5".into()]).unwrap();
    assert_eq!(app.panels()[1].refs, vec!["Genesis 2:4".to_string(), "Genesis 2:5".to_string()]);
    assert_eq!(url(&app), "/Genesis.2.4-5?with=all");
  }

  #[test]
  fn test_clearing_filter() {
    let mut app = app();
    app.open_panel("Genesis 1:1", None).unwrap();
    app.open_connections_at(1, vec!["Genesis 1:1".into()]).unwrap();
    app.set_connections_filter(1, Some("Rashi"), true).unwrap();
    app.set_connections_filter(1, Some("Ramban"), true).unwrap();
    app.set_connections_filter(1, Some("Rashi"), true).unwrap();
    assert_eq!(app.panels()[1].recent_filters, vec!["Rashi".to_string(), "Ramban".to_string()]);

    app.set_connections_filter(1, None, false).unwrap();
    assert!(app.panels()[1].filter.is_empty());
    assert!(app.panels()[0].filter.is_empty());
    assert_eq!(app.panels()[1].connections_mode, ConnectionsMode::Resources);
    assert_eq!(url(&app), "/Genesis.1.1?with=all");
  }

  #[traced_test]
  #[test]
  fn test_filter_rejected_on_text_panel() {
    let mut app = app();
    app.open_panel("Genesis 1:1", None).unwrap();
    let (before, mode) = (url(&app), app.panels()[0].connections_mode);
    assert!(matches!(app.set_connections_filter(0, Some("Rashi"), true), Err(LecternError::NotConnections(0))));
    assert!(app.panels()[0].filter.is_empty());
    assert!(app.panels()[0].recent_filters.is_empty());
    assert_eq!(app.panels()[0].connections_mode, mode);
    assert_eq!(url(&app), before);
    assert!(logs_contain("filter requested for a panel without connections"));
  }

  #[test]
  fn test_close_connections_clears_highlight() {
    let mut app = app();
    app.open_panel("Genesis 1:1", None).unwrap();
    app.open_connections_at(1, vec!["Genesis 1:1".into()]).unwrap();
    app.set_connections_filter(1, Some("Rashi"), true).unwrap();
    app.close_panel(1).unwrap();

    assert_eq!(app.panels().len(), 1);
    assert!(app.panels()[0].highlighted_refs.is_empty());
    assert!(app.panels()[0].filter.is_empty());
    assert_eq!(url(&app), "/Genesis.1.1");
  }

  #[test]
  fn test_single_panel_close_falls_back_to_navigation_panel() {
    let mut app = ReaderApp::builder().multi_panel(false).build();
    app.open_panel("Genesis 1:1", None).unwrap();
    app.close_panel(0).unwrap();
    assert_eq!(app.panels().len(), 1);
    assert_eq!(app.panels()[0].menu, Some(Menu::library()));
    assert!(app.header().is_none());
    assert_eq!(url(&app), "/texts");
  }

  #[test]
  fn test_replace_panel_keeps_position_and_settings() {
    let mut app = app();
    app.open_panel("Genesis 1", None).unwrap();
    app.open_panel_at(0, "Exodus 1", None).unwrap();
    app.set_option(1, SettingChange::Color(Color::Dark)).unwrap();
    app.replace_panel(1, "Deuteronomy 6", None).unwrap();

    assert_eq!(app.panels()[1].refs, vec!["Deuteronomy 6".to_string()]);
    assert_eq!(app.panels()[1].settings.color, Color::Dark);
    assert_eq!(app.recently_viewed()[0].book, "Deuteronomy");
  }

  #[test]
  fn test_select_version_caches_default() {
    let mut app = app();
    app.open_panel("Psalms 23", None).unwrap();
    app.set_option(0, SettingChange::Language(Language::English)).unwrap();
    let version = VersionSelection::new("JPS 1917", VersionLanguage::En);
    app.select_version(0, Some(version.clone())).unwrap();
    assert_eq!(url(&app), "/Psalms.23/en/JPS_1917");

    app.open_panel("Psalms 24", None).unwrap();
    assert_eq!(app.panels()[0].version, Some(version));

    app.select_version(0, None).unwrap();
    assert!(app.versions().is_empty());
    app.open_panel("Psalms 25", None).unwrap();
    assert_eq!(app.panels()[0].version, None);
  }

  #[test]
  fn test_set_option_persists_defaults() {
    let mut app = app();
    app.open_panel("Genesis 1", None).unwrap();
    app.set_option(0, SettingChange::FontSizeStep(true)).unwrap();
    assert_eq!(app.default_settings().font_size, Settings::default().font_size + 5.0);
    assert_eq!(app.last_command(), Some(HistoryCommand::Replace));
  }

  #[test]
  fn test_pop_state_replaces() {
    let mut app = app();
    app.open_panel("Genesis 1", None).unwrap();
    app.open_panel("Exodus 1", None).unwrap();
    assert_eq!(app.history().len(), 2);

    let state = app.history_mut().back().unwrap();
    app.pop_state(state);
    assert_eq!(app.panels()[0].refs, vec!["Genesis 1".to_string()]);
    assert_eq!(app.last_command(), Some(HistoryCommand::Replace));
    assert_eq!(app.history().len(), 2);
  }

  #[test]
  fn test_recently_viewed_is_deduplicated_and_capped() {
    let config = Config { recently_viewed_limit: 2, ..Config::default() };
    let mut app = ReaderApp::builder().with_config(config).build();
    app.open_panel("Genesis 1", None).unwrap();
    app.open_panel("Exodus 1", None).unwrap();
    app.open_panel("Genesis 2", None).unwrap();
    app.open_panel("Numbers 3", None).unwrap();

    let books: Vec<_> = app.recently_viewed().iter().map(|r| r.book.as_str()).collect();
    assert_eq!(books, ["Numbers", "Genesis"]);
    assert_eq!(app.recently_viewed()[1].reference, "Genesis 2");
  }

  #[test]
  fn test_layout_tracks_panels_and_width() {
    let mut app = app();
    app.set_window_width(1440.0);
    app.open_panel("Genesis 1:1", None).unwrap();
    app.open_connections_at(1, vec!["Genesis 1:1".into()]).unwrap();
    assert_eq!(app.layout().widths, vec![68.0, 32.0]);

    app.set_window_width(500.0);
    assert_eq!(app.panel_cap(), 1);
    assert!(app.layout().scrollable);
  }

  #[test]
  fn test_open_url_puts_menus_in_header() {
    let mut app = app();
    app.open_url("/texts/Talmud").unwrap();
    assert!(app.panels().is_empty());
    assert_eq!(app.header().unwrap().menu, Some(Menu::Navigation { categories: vec!["Talmud".into()] }));
    assert_eq!(url(&app), "/texts/Talmud");

    app.open_url("/Genesis.1.1?with=Rashi").unwrap();
    assert_eq!(app.panels().len(), 2);
    assert!(app.header().unwrap().menu.is_none());
    assert_eq!(url(&app), "/Genesis.1.1?with=Rashi");
  }

  #[test]
  fn test_stale_fetch_is_discarded() {
    let mut app = app();
    app.open_panel("Genesis 1", None).unwrap();
    let stale = app.request_content(0).unwrap().unwrap();
    app.replace_panel(0, "Exodus 1", None).unwrap();
    let fresh = app.request_content(0).unwrap().unwrap();

    let data = Content::Text(crate::content::TextData::new("Genesis 1", Vec::new()));
    assert!(!app.receive_content(stale, Ok(data.clone())));
    assert_eq!(app.panels()[0].status, LoadStatus::Loading);

    assert!(app.receive_content(fresh, Err(LecternError::NotFound("Exodus 1".into()))));
    assert!(matches!(app.panels()[0].status, LoadStatus::Failed(_)));
  }
}
