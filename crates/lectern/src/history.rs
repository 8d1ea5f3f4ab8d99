//! History entries for the reader: URL, title and restorable state.
//!
//! Every qualifying change to the panels produces a [`HistoryEntry`]. The URL
//! is shareable: [`parse_url`] turns it back into panels. The state stored
//! alongside is what back/forward navigation restores, so popping an entry
//! never re-parses the URL.
//!
//! # URL surface
//!
//! | Panels                                 | URL                                        |
//! |----------------------------------------|--------------------------------------------|
//! | Text                                   | `/Genesis.1.1`                             |
//! | Text, pinned version                   | `/Genesis.1.1/en/JPS_1917`                 |
//! | Text + Connections                     | `/Genesis.1.1?with=Rashi`                  |
//! | Navigation menu                        | `/texts/Tanakh/Torah`                      |
//! | Search menu                            | `/search?q=light`                          |
//! | Extra panels (position n >= 2)         | `&p{n}=..&w{n}=..&l{n}=..&v{n}=..&lang{n}=..` |
//!
//! # Examples
//!
//! ```
//! use lectern::{
//!   factory::PanelStateFactory,
//!   history::HistorySerializer,
//!   panel::PartialPanel,
//!   settings::Settings,
//! };
//!
//! let factory = PanelStateFactory::default();
//! let panels = vec![
//!   factory.normalize(PartialPanel::text("Genesis 1:1"), &Settings::default()),
//!   factory.normalize(PartialPanel::text("Exodus 20"), &Settings::default()),
//! ];
//! let entry = HistorySerializer::serialize(&panels, None);
//! assert_eq!(entry.url, "/Genesis.1.1?p2=Exodus.20");
//! assert_eq!(entry.title, "Genesis 1:1 | Exodus 20");
//! ```

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use url::form_urlencoded;

use super::*;

/// Panels and header as stored with a history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryState {
  /// The ordered panel list
  pub panels: Vec<PanelState>,
  /// The header panel, in multi-panel mode
  #[serde(default)]
  pub header: Option<PanelState>,
}

/// One browser history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
  /// Shareable URL, rooted at `/`
  pub url:   String,
  /// Document title
  pub title: String,
  /// State restored when this entry is popped
  pub state: HistoryState,
}

/// How an entry was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryCommand {
  /// A new entry was pushed
  Push,
  /// The current entry was replaced
  Replace,
}

/// Ordered query parameters, rendered once.
///
/// Values are form-url-encoded; the first parameter is introduced by `?` and
/// the rest by `&`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
  /// Creates an empty parameter list.
  pub fn new() -> Self { Self::default() }

  /// Appends `key=value`.
  pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
    self.0.push((key.into(), value.into()));
  }

  /// Appends every parameter of `other`.
  pub fn extend(&mut self, other: QueryParams) { self.0.extend(other.0); }

  /// Whether no parameters were added.
  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  /// The query string including its leading `?`, or an empty string.
  pub fn render(&self) -> String {
    self
      .0
      .iter()
      .enumerate()
      .map(|(i, (key, value))| {
        let value: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
        format!("{}{key}={value}", if i == 0 { '?' } else { '&' })
      })
      .collect()
  }
}

/// Path, parameters and title contributed by one panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Segment {
  /// URL path, starting with `/`
  path:   String,
  /// Query parameters
  params: QueryParams,
  /// Title fragment
  title:  String,
}

/// Converts panel lists to history entries and back.
pub struct HistorySerializer;

impl HistorySerializer {
  /// The history entry for `panels` and an optional `header`.
  ///
  /// When the header has a menu open, or there are no panels and the header is
  /// in [`Mode::Header`], only the header contributes to the URL and title.
  pub fn serialize(panels: &[PanelState], header: Option<&PanelState>) -> HistoryEntry {
    let state = HistoryState { panels: panels.to_vec(), header: header.cloned() };

    let header_only = header
      .filter(|h| h.menu.is_some() || (panels.is_empty() && h.mode == Mode::Header))
      .map(Self::segment);

    let Segment { path, params, title } = match header_only {
      Some(segment) => segment,
      None => Self::panels_segment(panels),
    };

    let url = format!("{path}{}", params.render());
    trace!(%url, %title, "serialized history entry");
    HistoryEntry { url, title, state }
  }

  /// Restores panels and header from a popped entry's state.
  pub fn deserialize(state: &HistoryState) -> (Vec<PanelState>, Option<PanelState>) {
    (state.panels.clone(), state.header.clone())
  }

  /// Whether moving from `prev` to `next_panels`/`next_header` is a change the
  /// reader navigated to, as opposed to a cosmetic one.
  pub fn should_update(
    prev: &HistoryState,
    next_panels: &[PanelState],
    next_header: Option<&PanelState>,
  ) -> bool {
    if prev.panels.len() != next_panels.len() {
      return true;
    }
    let header_menu = |h: Option<&PanelState>| h.and_then(|h| h.menu.clone());
    if header_menu(prev.header.as_ref()) != header_menu(next_header) {
      return true;
    }
    prev.panels.iter().zip(next_panels).any(|(a, b)| Self::panel_differs(a, b))
  }

  /// Field-by-field comparison backing [`HistorySerializer::should_update`].
  fn panel_differs(prev: &PanelState, next: &PanelState) -> bool {
    prev.mode != next.mode
      || prev.menu != next.menu
      || prev.refs.last() != next.refs.last()
      || prev.highlighted_refs.last() != next.highlighted_refs.last()
      || prev.filter != next.filter
      || prev.connections_mode != next.connections_mode
      || prev.version != next.version
      || prev.settings.language != next.settings.language
  }

  /// URL contribution of the whole panel list.
  fn panels_segment(panels: &[PanelState]) -> Segment {
    let Some(first) = panels.first() else {
      return Self::menu_segment(&Menu::library());
    };

    let (mut segment, consumed) = match panels {
      [text, connections, ..] if text.is_text() && connections.is_connections() =>
        (Self::pair_segment(text, connections), 2),
      _ => (Self::segment(first), 1),
    };

    let mut titles = vec![segment.title.clone()];
    for (index, panel) in panels.iter().enumerate().skip(consumed) {
      let (params, title) = Self::extra_params(index + 1, panel, first);
      segment.params.extend(params);
      titles.push(title);
    }
    segment.title = titles.join(" | ");
    segment
  }

  /// URL contribution of a single panel in first position.
  fn segment(panel: &PanelState) -> Segment {
    match panel.view() {
      PanelView::Menu(menu) => Self::menu_segment(menu),
      PanelView::Header => Self::menu_segment(&Menu::library()),
      PanelView::Text => {
        let reference = panel.current_ref().unwrap_or_default();
        Segment {
          path:   format!("/{}{}", path_segment(&normalize_ref(&reference)), version_path(panel.version.as_ref())),
          params: QueryParams::new(),
          title:  reference,
        }
      },
      PanelView::Connections | PanelView::TextAndConnections => {
        let reference = if panel.mode == Mode::Connections {
          span_refs(&panel.refs).unwrap_or_default()
        } else {
          panel.current_ref().unwrap_or_default()
        };
        let version = if panel.mode == Mode::Connections { None } else { panel.version.as_ref() };
        let mut params = QueryParams::new();
        params.push("with", with_value(&panel.filter));
        Segment {
          path: format!("/{}{}", path_segment(&normalize_ref(&reference)), version_path(version)),
          params,
          title: connections_title(&reference, &panel.filter),
        }
      },
    }
  }

  /// Short form for a text panel followed by its connections panel.
  fn pair_segment(text: &PanelState, connections: &PanelState) -> Segment {
    let reference = span_refs(&connections.refs)
      .or_else(|| text.current_ref())
      .unwrap_or_default();
    let mut params = QueryParams::new();
    params.push("with", with_value(&connections.filter));
    Segment {
      path: format!("/{}{}", path_segment(&normalize_ref(&reference)), version_path(text.version.as_ref())),
      params,
      title: connections_title(&reference, &connections.filter),
    }
  }

  /// URL contribution of a menu.
  fn menu_segment(menu: &Menu) -> Segment {
    let simple = |path: &str, title: &str| Segment {
      path:   path.to_string(),
      params: QueryParams::new(),
      title:  title.to_string(),
    };

    match menu {
      Menu::Navigation { categories } if categories.is_empty() => simple("/texts", "Texts"),
      Menu::Navigation { categories } => Segment {
        path:   format!("/texts/{}", categories.iter().map(|c| path_segment(c)).collect::<Vec<_>>().join("/")),
        params: QueryParams::new(),
        title:  categories.join(" | "),
      },
      Menu::Search { query, applied_filters, field, sort_type } => {
        let mut params = QueryParams::new();
        params.push("q", query.clone());
        if field != DEFAULT_SEARCH_FIELD {
          params.push("field", field.clone());
        }
        if *sort_type != SearchSort::default() {
          params.push("sort", sort_type.to_string());
        }
        if !applied_filters.is_empty() {
          params.push("filters", applied_filters.join("|"));
        }
        Segment { path: "/search".into(), params, title: format!("\"{query}\" | Search") }
      },
      Menu::Sheets { tag: None } => simple("/sheets", "Source Sheets"),
      Menu::Sheets { tag: Some(tag) } => Segment {
        path:   format!("/sheets/tags/{}", path_segment(tag)),
        params: QueryParams::new(),
        title:  format!("{tag} | Source Sheets"),
      },
      Menu::BookToc { title } => Segment {
        path:   format!("/{}", path_segment(title)),
        params: QueryParams::new(),
        title:  title.clone(),
      },
      Menu::Account => simple("/account", "Account"),
      Menu::Notifications => simple("/notifications", "Notifications"),
      Menu::Compare => simple("/compare", "Compare"),
    }
  }

  /// Parameters for a panel at 1-based `position >= 2`, plus its title.
  fn extra_params(position: usize, panel: &PanelState, first: &PanelState) -> (QueryParams, String) {
    let mut params = QueryParams::new();
    let title;

    match panel.view() {
      PanelView::Menu(menu) => {
        let (token, menu_title) = menu_token(menu);
        params.push(format!("p{position}"), token);
        match menu {
          Menu::Search { query, .. } => params.push(format!("q{position}"), query.clone()),
          Menu::Sheets { tag: Some(tag), .. } => params.push(format!("t{position}"), tag.replace(' ', "_")),
          _ => {},
        }
        title = menu_title;
      },
      PanelView::Connections => {
        let reference = span_refs(&panel.refs).unwrap_or_default();
        params.push(format!("p{position}"), normalize_ref(&reference));
        params.push(format!("w{position}"), with_value(&panel.filter));
        title = connections_title(&reference, &panel.filter);
      },
      PanelView::Text | PanelView::TextAndConnections | PanelView::Header => {
        let reference = panel.current_ref().unwrap_or_default();
        params.push(format!("p{position}"), normalize_ref(&reference));
        if panel.mode == Mode::TextAndConnections {
          params.push(format!("w{position}"), with_value(&panel.filter));
        }
        if let Some(version) = &panel.version {
          params.push(format!("l{position}"), version.language.to_string());
          params.push(format!("v{position}"), version.title.replace(' ', "_"));
        }
        title = reference;
      },
    }

    let baseline = if panel.is_connections() {
      first.settings.language.for_connections()
    } else {
      first.settings.language
    };
    if panel.settings.language != baseline {
      params.push(format!("lang{position}"), language_code(panel.settings.language));
    }
    (params, title)
  }
}

/// `/<lang>/<Version_Title>` for a pinned version, else empty.
fn version_path(version: Option<&VersionSelection>) -> String {
  version
    .map(|v| format!("/{}/{}", v.language, path_segment(&v.title)))
    .unwrap_or_default()
}

/// Bytes escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
  .add(b' ')
  .add(b'"')
  .add(b'#')
  .add(b'%')
  .add(b'&')
  .add(b'+')
  .add(b'/')
  .add(b'<')
  .add(b'>')
  .add(b'?')
  .add(b'`')
  .add(b'{')
  .add(b'}');

/// `value` as one path segment, spaces written as underscores.
fn path_segment(value: &str) -> String { utf8_percent_encode(&value.replace(' ', "_"), SEGMENT).to_string() }

/// Value of a `with`/`w{n}` parameter.
fn with_value(filter: &[String]) -> String {
  filter.first().map(|f| f.replace(' ', "_")).unwrap_or_else(|| "all".to_string())
}

/// Title of a connections view.
fn connections_title(reference: &str, filter: &[String]) -> String {
  match filter.first() {
    Some(filter) => format!("{reference} with {filter}"),
    None => format!("{reference} with Connections"),
  }
}

/// Path-ready copies of `values`.
fn underscored(values: &[String]) -> Vec<String> { values.iter().map(|v| v.replace(' ', "_")).collect() }

/// `p{n}` token and title of a menu in an extra panel.
fn menu_token(menu: &Menu) -> (String, String) {
  match menu {
    Menu::Navigation { categories } if categories.is_empty() => ("texts".into(), "Texts".into()),
    Menu::Navigation { categories } =>
      (format!("texts/{}", underscored(categories).join("/")), categories.join(" | ")),
    Menu::Search { query, .. } => ("search".into(), format!("\"{query}\" | Search")),
    Menu::Sheets { .. } => ("sheets".into(), "Source Sheets".into()),
    Menu::BookToc { title } => (title.replace(' ', "_"), title.clone()),
    Menu::Account => ("account".into(), "Account".into()),
    Menu::Notifications => ("notifications".into(), "Notifications".into()),
    Menu::Compare => ("compare".into(), "Compare".into()),
  }
}

/// Short code of a language setting used in `lang{n}`.
fn language_code(language: Language) -> &'static str {
  match language {
    Language::English => "en",
    Language::Hebrew => "he",
    Language::Bilingual => "bi",
  }
}

/// Recovers panels from a URL produced by [`HistorySerializer::serialize`].
///
/// Panels that override the first panel's language through `lang{n}` get a
/// copy of `defaults` with that language. The returned partials still need
/// normalizing.
pub fn parse_url(input: &str, defaults: &Settings) -> Result<Vec<PartialPanel>> {
  let base = url::Url::parse("http://reader.invalid/")?;
  let url = base.join(input).map_err(|e| LecternError::InvalidUrl(format!("{input}: {e}")))?;
  let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
  let segments: Vec<String> = url
    .path_segments()
    .map(|s| s.filter(|s| !s.is_empty()).map(decode_segment).collect())
    .unwrap_or_default();

  let mut panels = match segments.first().map(String::as_str) {
    None => Vec::new(),
    Some("texts") => vec![PartialPanel::menu(Menu::Navigation { categories: spaced(&segments[1..]) })],
    Some("search") => vec![PartialPanel::menu(Menu::Search {
      query:           params.get("q").cloned().unwrap_or_default(),
      applied_filters: params
        .get("filters")
        .map(|f| f.split('|').map(str::to_string).collect())
        .unwrap_or_default(),
      field:           params.get("field").cloned().unwrap_or_else(|| DEFAULT_SEARCH_FIELD.to_string()),
      sort_type:       match params.get("sort").map(String::as_str) {
        Some("chronological") => SearchSort::Chronological,
        _ => SearchSort::Relevance,
      },
    })],
    Some("sheets") => {
      let tag = match segments.get(1).map(String::as_str) {
        Some("tags") => segments.get(2).map(|t| t.replace('_', " ")),
        _ => None,
      };
      vec![PartialPanel::menu(Menu::Sheets { tag })]
    },
    Some("account") => vec![PartialPanel::menu(Menu::Account)],
    Some("notifications") => vec![PartialPanel::menu(Menu::Notifications)],
    Some("compare") => vec![PartialPanel::menu(Menu::Compare)],
    Some(reference) => {
      let version = match (segments.get(1), segments.get(2)) {
        (Some(language), Some(title)) => Some(VersionSelection::new(title.replace('_', " "), language.parse()?)),
        _ => None,
      };
      primary_panels(&humanize_ref(reference), version, params.get("with"))?
    },
  };

  let mut positions: Vec<(usize, &str, &String)> = params
    .iter()
    .filter_map(|(key, token)| {
      let suffix = key.strip_prefix('p')?;
      suffix.parse::<usize>().ok().filter(|n| *n >= 2).map(|n| (n, suffix, token))
    })
    .collect();
  positions.sort_unstable();

  for (_, suffix, token) in positions {
    let mut panel = extra_panel(suffix, token, &params)?;
    if let Some(code) = params.get(&format!("lang{suffix}")) {
      let settings = Settings { language: code.parse()?, ..defaults.clone() };
      panel.settings = Some(settings);
    }
    panels.push(panel);
  }

  debug!(url = input, panels = panels.len(), "parsed reader URL");
  Ok(panels)
}

/// Percent-decodes a path segment.
fn decode_segment(segment: &str) -> String { percent_decode_str(segment).decode_utf8_lossy().into_owned() }

/// `values` with underscores turned back into spaces.
fn spaced(values: &[String]) -> Vec<String> { values.iter().map(|v| v.replace('_', " ")).collect() }

/// Panels encoded by the path of a text URL.
fn primary_panels(
  reference: &str,
  version: Option<VersionSelection>,
  with: Option<&String>,
) -> Result<Vec<PartialPanel>> {
  let parsed: Ref = reference.parse()?;
  if parsed.is_book() && with.is_none() {
    return Ok(vec![PartialPanel::menu(Menu::BookToc { title: parsed.book().to_string() })]);
  }

  let mut text = PartialPanel::text(reference).with_version(version);
  let Some(with) = with else {
    return Ok(vec![text]);
  };

  let filter = filter_from(with);
  text.highlighted_refs = Some(vec![reference.to_string()]);
  text.filter = Some(filter.clone());
  let mut connections = PartialPanel::connections(vec![reference.to_string()]);
  connections.connections_mode =
    Some(if filter.is_empty() { ConnectionsMode::Resources } else { ConnectionsMode::TextList });
  connections.filter = Some(filter);
  Ok(vec![text, connections])
}

/// Filter list encoded by a `with` value.
fn filter_from(with: &str) -> Vec<String> {
  match with {
    "all" | "" => Vec::new(),
    other => vec![other.replace('_', " ")],
  }
}

/// The panel encoded by `p{suffix}` and its companion parameters.
fn extra_panel(suffix: &str, token: &str, params: &HashMap<String, String>) -> Result<PartialPanel> {
  let get = |key: &str| params.get(&format!("{key}{suffix}"));

  let panel = match token {
    "search" => PartialPanel::menu(Menu::search(get("q").cloned().unwrap_or_default())),
    "sheets" => PartialPanel::menu(Menu::Sheets { tag: get("t").map(|t| t.replace('_', " ")) }),
    "account" => PartialPanel::menu(Menu::Account),
    "notifications" => PartialPanel::menu(Menu::Notifications),
    "compare" => PartialPanel::menu(Menu::Compare),
    "texts" => PartialPanel::menu(Menu::library()),
    nav if nav.starts_with("texts/") => {
      let categories: Vec<String> = nav["texts/".len()..].split('/').map(str::to_string).collect();
      PartialPanel::menu(Menu::Navigation { categories: spaced(&categories) })
    },
    reference => {
      let reference = humanize_ref(reference);
      let parsed: Ref = reference.parse()?;
      let version = match (get("l"), get("v")) {
        (Some(language), Some(title)) => Some(VersionSelection::new(title.replace('_', " "), language.parse()?)),
        _ => None,
      };
      match get("w") {
        Some(with) => {
          let filter = filter_from(with);
          let mut panel = PartialPanel::connections(vec![reference]);
          panel.connections_mode =
            Some(if filter.is_empty() { ConnectionsMode::Resources } else { ConnectionsMode::TextList });
          panel.filter = Some(filter);
          panel
        },
        None if parsed.is_book() => PartialPanel::menu(Menu::BookToc { title: parsed.book().to_string() }),
        None => PartialPanel::text(reference).with_version(version),
      }
    },
  };
  Ok(panel)
}

/// A place to record history entries.
pub trait BrowserHistory: std::fmt::Debug {
  /// Records `entry` as a new entry after the current one.
  fn push_state(&mut self, entry: HistoryEntry);

  /// Overwrites the current entry with `entry`.
  fn replace_state(&mut self, entry: HistoryEntry);

  /// The current entry, if any was recorded.
  fn current(&self) -> Option<&HistoryEntry>;
}

/// An in-memory history stack with back/forward navigation.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
  /// Recorded entries, oldest first
  entries:  Vec<HistoryEntry>,
  /// Index of the current entry
  position: usize,
}

impl MemoryHistory {
  /// Creates an empty history.
  pub fn new() -> Self { Self::default() }

  /// All recorded entries, oldest first.
  pub fn entries(&self) -> &[HistoryEntry] { &self.entries }

  /// Number of recorded entries.
  pub fn len(&self) -> usize { self.entries.len() }

  /// Whether nothing was recorded yet.
  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Steps back one entry, returning the state to pop.
  pub fn back(&mut self) -> Option<HistoryState> {
    if self.position == 0 || self.entries.is_empty() {
      return None;
    }
    self.position -= 1;
    Some(self.entries[self.position].state.clone())
  }

  /// Steps forward one entry, returning the state to pop.
  pub fn forward(&mut self) -> Option<HistoryState> {
    if self.position + 1 >= self.entries.len() {
      return None;
    }
    self.position += 1;
    Some(self.entries[self.position].state.clone())
  }
}

impl BrowserHistory for MemoryHistory {
  fn push_state(&mut self, entry: HistoryEntry) {
    if !self.entries.is_empty() {
      self.entries.truncate(self.position + 1);
    }
    self.entries.push(entry);
    self.position = self.entries.len() - 1;
  }

  fn replace_state(&mut self, entry: HistoryEntry) {
    match self.entries.get_mut(self.position) {
      Some(current) => *current = entry,
      None => self.push_state(entry),
    }
  }

  fn current(&self) -> Option<&HistoryEntry> { self.entries.get(self.position) }
}
