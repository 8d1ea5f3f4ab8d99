//! Access to text, link and index data.
//!
//! The reader never talks to the content API directly. Instead a
//! [`ContentSource`] is injected into the controller, offering a synchronous
//! cache probe ([`ContentSource::get_if_cached`]) and an asynchronous fetch
//! ([`ContentSource::fetch`]). Two implementations ship with the crate:
//!
//! - [`MemoryContent`]: a plain in-memory store, useful for tests and for
//!   preloaded content
//! - [`HttpContent`]: a JSON API client built on `reqwest`, caching every
//!   successful response in a [`MemoryContent`]
//!
//! # Examples
//!
//! ```
//! use lectern::content::{Content, ContentKey, ContentSource, MemoryContent, TextData};
//!
//! # async fn example() -> Result<(), lectern::error::LecternError> {
//! let content = MemoryContent::new();
//! let key = ContentKey::text("Genesis 1:1");
//! content.insert(key.clone(), Content::Text(TextData::new("Genesis 1:1", vec!["In the beginning".into()])));
//!
//! assert!(content.get_if_cached(&key).is_some());
//! let fetched = content.fetch(&key).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::RwLock;

use serde_json::Value;

use super::*;

/// Identifies one piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContentKey {
  /// The text of a ref, optionally in a pinned version
  Text {
    /// Human-form ref
    reference: String,
    /// Version to fetch instead of the default
    version:   Option<VersionSelection>,
  },
  /// Links, sheets and notes attached to a section
  Related(String),
  /// Catalog details of a book
  Index(String),
}

impl ContentKey {
  /// Key for the default version of `reference`.
  pub fn text(reference: impl Into<String>) -> Self {
    ContentKey::Text { reference: reference.into(), version: None }
  }
}

impl Display for ContentKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ContentKey::Text { reference, version: Some(version) } =>
        write!(f, "text {reference} ({}: {})", version.language, version.title),
      ContentKey::Text { reference, version: None } => write!(f, "text {reference}"),
      ContentKey::Related(reference) => write!(f, "related {reference}"),
      ContentKey::Index(title) => write!(f, "index {title}"),
    }
  }
}

/// A piece of content, matching the variant of its [`ContentKey`].
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
  /// Text of a ref
  Text(TextData),
  /// Connections of a section
  Related(LinkSummary),
  /// Catalog details of a book
  Index(IndexDetails),
}

/// Text of a ref as delivered by the texts API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextData {
  /// The ref this text covers
  #[serde(rename = "ref")]
  pub reference:        String,
  /// Title of the book
  #[serde(default)]
  pub book:             String,
  /// Category path of the book
  #[serde(default)]
  pub categories:       Vec<String>,
  /// English segments
  #[serde(default, deserialize_with = "flatten_segments")]
  pub text:             Vec<String>,
  /// Hebrew segments
  #[serde(default, deserialize_with = "flatten_segments")]
  pub he:               Vec<String>,
  /// Title of the English version
  #[serde(default)]
  pub version_title:    Option<String>,
  /// Title of the Hebrew version
  #[serde(default)]
  pub he_version_title: Option<String>,
  /// Ref of the following section
  #[serde(default)]
  pub next:             Option<String>,
  /// Ref of the preceding section
  #[serde(default)]
  pub prev:             Option<String>,
}

impl TextData {
  /// English-only text data for `reference`.
  pub fn new(reference: impl Into<String>, text: Vec<String>) -> Self {
    let reference = reference.into();
    Self { book: book_title(&reference), reference, text, ..Self::default() }
  }
}

/// Accepts a string, or arbitrarily nested arrays of strings, as a flat list
/// of segments. Nulls and non-string leaves are skipped.
fn flatten_segments<'de, D>(deserializer: D) -> core::result::Result<Vec<String>, D::Error>
where D: serde::Deserializer<'de> {
  fn walk(value: Value, out: &mut Vec<String>) {
    match value {
      Value::String(s) => out.push(s),
      Value::Array(items) => items.into_iter().for_each(|item| walk(item, out)),
      _ => {},
    }
  }

  let value = Value::deserialize(deserializer)?;
  let mut out = Vec::new();
  walk(value, &mut out);
  Ok(out)
}

/// One connection between a ref and another text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
  /// The connected ref
  #[serde(rename = "ref")]
  pub reference:   String,
  /// The ref in the anchor text the link attaches to
  #[serde(default)]
  pub anchor_ref:  String,
  /// Category of the connected text, e.g. "Commentary"
  #[serde(default)]
  pub category:    String,
  /// Book title of the connected text, used as a filter name
  #[serde(default, alias = "index_title")]
  pub index_title: String,
}

/// Everything connected to a section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSummary {
  /// Links to other texts
  #[serde(default)]
  pub links: Vec<Link>,
}

impl LinkSummary {
  /// Number of links per filter name (category or book title).
  pub fn counts(&self) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for link in &self.links {
      *counts.entry(link.category.clone()).or_insert(0) += 1;
      if link.index_title != link.category {
        *counts.entry(link.index_title.clone()).or_insert(0) += 1;
      }
    }
    counts
  }

  /// Links matching `filter` (by category or book title) anchored at any of `refs`.
  ///
  /// An empty filter matches every link.
  pub fn filtered<'a>(&'a self, filter: &'a [String], refs: &'a [String]) -> impl Iterator<Item = &'a Link> {
    self.links.iter().filter(move |link| {
      (filter.is_empty() || filter.iter().any(|f| *f == link.category || *f == link.index_title))
        && (refs.is_empty() || refs.iter().any(|r| *r == link.anchor_ref))
    })
  }
}

/// Catalog details of a book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDetails {
  /// English title
  pub title:      String,
  /// Hebrew title
  #[serde(default)]
  pub he_title:   String,
  /// Category path
  #[serde(default)]
  pub categories: Vec<String>,
}

/// Capability to look up content by key.
#[async_trait]
pub trait ContentSource: Send + Sync + std::fmt::Debug {
  /// Content for `key` if it is already available without waiting.
  fn get_if_cached(&self, key: &ContentKey) -> Option<Content>;

  /// Content for `key`, fetching it if necessary.
  async fn fetch(&self, key: &ContentKey) -> Result<Content>;
}

/// In-memory content store.
#[derive(Debug, Default)]
pub struct MemoryContent {
  /// Stored content
  entries: RwLock<HashMap<ContentKey, Content>>,
}

impl MemoryContent {
  /// Creates an empty store.
  pub fn new() -> Self { Self::default() }

  /// Stores `content` under `key`, replacing any previous entry.
  pub fn insert(&self, key: ContentKey, content: Content) {
    match self.entries.write() {
      Ok(mut entries) => {
        entries.insert(key, content);
      },
      Err(poisoned) => {
        poisoned.into_inner().insert(key, content);
      },
    }
  }

  /// Number of stored entries.
  pub fn len(&self) -> usize { self.entries.read().map(|e| e.len()).unwrap_or_default() }

  /// Whether nothing is stored.
  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[async_trait]
impl ContentSource for MemoryContent {
  fn get_if_cached(&self, key: &ContentKey) -> Option<Content> {
    self.entries.read().ok().and_then(|entries| entries.get(key).cloned())
  }

  async fn fetch(&self, key: &ContentKey) -> Result<Content> {
    self.get_if_cached(key).ok_or_else(|| LecternError::NotFound(key.to_string()))
  }
}

/// Client for the library's JSON content API.
///
/// Endpoints, relative to the configured base URL:
/// - `api/texts/{ref}?context=0[&ven=..|&vhe=..]`
/// - `api/related/{ref}`
/// - `api/v2/index/{title}`
#[derive(Debug)]
pub struct HttpContent {
  /// HTTP client reused across requests
  client: reqwest::Client,
  /// API root, always ending in `/`
  base:   url::Url,
  /// Successful responses
  cache:  MemoryContent,
}

impl HttpContent {
  /// Creates a client for the API rooted at `base_url`.
  pub fn new(base_url: &str) -> Result<Self> {
    let mut base = url::Url::parse(base_url)?;
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }
    Ok(Self { client: reqwest::Client::new(), base, cache: MemoryContent::new() })
  }

  /// The request URL for `key`.
  pub fn endpoint(&self, key: &ContentKey) -> Result<url::Url> {
    let url = match key {
      ContentKey::Text { reference, version } => {
        let mut url = self.base.join(&format!("api/texts/{}", normalize_ref(reference)))?;
        {
          let mut query = url.query_pairs_mut();
          query.append_pair("context", "0");
          if let Some(version) = version {
            let param = match version.language {
              VersionLanguage::En => "ven",
              VersionLanguage::He => "vhe",
            };
            query.append_pair(param, &version.title.replace(' ', "_"));
          }
        }
        url
      },
      ContentKey::Related(reference) =>
        self.base.join(&format!("api/related/{}", normalize_ref(reference)))?,
      ContentKey::Index(title) => self.base.join(&format!("api/v2/index/{}", title.replace(' ', "_")))?,
    };
    Ok(url)
  }

  /// Performs the request for `key` and decodes the response.
  async fn request(&self, key: &ContentKey) -> Result<Content> {
    let url = self.endpoint(key)?;
    debug!(%url, "fetching content");

    let response = self.client.get(url).send().await?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
      return Err(LecternError::NotFound(key.to_string()));
    }
    let body: Value = response.error_for_status()?.json().await?;
    if let Some(message) = body.get("error").and_then(Value::as_str) {
      return Err(LecternError::ApiError(message.to_string()));
    }

    Ok(match key {
      ContentKey::Text { .. } => Content::Text(serde_json::from_value(body)?),
      ContentKey::Related(_) => Content::Related(serde_json::from_value(body)?),
      ContentKey::Index(_) => Content::Index(serde_json::from_value(body)?),
    })
  }
}

#[async_trait]
impl ContentSource for HttpContent {
  fn get_if_cached(&self, key: &ContentKey) -> Option<Content> { self.cache.get_if_cached(key) }

  async fn fetch(&self, key: &ContentKey) -> Result<Content> {
    if let Some(content) = self.cache.get_if_cached(key) {
      trace!(%key, "content cache hit");
      return Ok(content);
    }
    let content = self.request(key).await?;
    self.cache.insert(key.clone(), content.clone());
    Ok(content)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_text_data_flattens_nested_segments() {
    let data: TextData = serde_json::from_str(
      r#"{
        "ref": "Genesis 1:1-2",
        "book": "Genesis",
        "text": [["In the beginning", null], "The earth was"],
        "he": "בראשית",
        "versionTitle": "JPS 1917",
        "next": "Genesis 2"
      }"#,
    )
    .unwrap();
    assert_eq!(data.reference, "Genesis 1:1-2");
    assert_eq!(data.text, vec!["In the beginning".to_string(), "The earth was".to_string()]);
    assert_eq!(data.he.len(), 1);
    assert_eq!(data.version_title.as_deref(), Some("JPS 1917"));
    assert_eq!(data.next.as_deref(), Some("Genesis 2"));
    assert!(data.prev.is_none());
  }

  #[test]
  fn test_link_summary_filtering() {
    let link = |reference: &str, anchor: &str, category: &str, title: &str| Link {
      reference:   reference.into(),
      anchor_ref:  anchor.into(),
      category:    category.into(),
      index_title: title.into(),
    };
    let summary = LinkSummary {
      links: vec![
        link("Rashi on Genesis 1:1:1", "Genesis 1:1", "Commentary", "Rashi on Genesis"),
        link("Ramban on Genesis 1:1:1", "Genesis 1:1", "Commentary", "Ramban on Genesis"),
        link("Berakhot 2a", "Genesis 1:2", "Talmud", "Berakhot"),
      ],
    };

    assert_eq!(summary.counts()["Commentary"], 2);
    assert_eq!(summary.counts()["Berakhot"], 1);

    let filter = vec!["Commentary".to_string()];
    let refs = vec!["Genesis 1:1".to_string()];
    assert_eq!(summary.filtered(&filter, &refs).count(), 2);
    assert_eq!(summary.filtered(&[], &[]).count(), 3);
  }

  #[test]
  fn test_http_endpoints() {
    let http = HttpContent::new("https://library.example.org").unwrap();
    let url = http
      .endpoint(&ContentKey::Text {
        reference: "Genesis 1:1".into(),
        version:   Some(VersionSelection::new("JPS 1917", VersionLanguage::En)),
      })
      .unwrap();
    assert_eq!(url.as_str(), "https://library.example.org/api/texts/Genesis.1.1?context=0&ven=JPS_1917");

    let url = http.endpoint(&ContentKey::Related("Rashi on Genesis 1:1".into())).unwrap();
    assert_eq!(url.as_str(), "https://library.example.org/api/related/Rashi_on_Genesis.1.1");

    let url = http.endpoint(&ContentKey::Index("Song of Songs".into())).unwrap();
    assert_eq!(url.as_str(), "https://library.example.org/api/v2/index/Song_of_Songs");
  }

  #[tokio::test]
  async fn test_memory_content_missing_key() {
    let content = MemoryContent::new();
    let result = content.fetch(&ContentKey::Index("Genesis".into())).await;
    assert!(matches!(result, Err(LecternError::NotFound(_))));
  }
}
