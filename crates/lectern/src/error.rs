//! Error types for the lectern library.
//!
//! Most reader transitions cannot fail: refs are never validated up front, and
//! a bad ref only shows up later as a failed fetch stored on the panel. The
//! errors below cover what remains:
//! - Panel indices outside the current panel list, or naming the wrong kind of panel
//! - Malformed refs and URLs handed to the parsers
//! - Network and API failures from the content source
//! - Reading and writing configuration
//!
//! # Examples
//!
//! ```
//! use lectern::{controller::ReaderApp, error::LecternError};
//!
//! let mut app = ReaderApp::builder().build();
//! match app.close_panel(3) {
//!   Err(LecternError::PanelIndex { index, len }) => println!("no panel {index} of {len}"),
//!   Err(e) => println!("Other error: {e}"),
//!   Ok(()) => println!("closed"),
//! }
//! ```

use thiserror::Error;

/// Error type alias used for the [`lectern`](crate) crate.
pub type Result<T> = core::result::Result<T, LecternError>;

/// Errors that can occur when working with the lectern library.
#[derive(Error, Debug)]
pub enum LecternError {
  /// An operation addressed a panel that does not exist.
  #[error("Panel index {index} is out of range for {len} panel(s)")]
  PanelIndex {
    /// The requested index
    index: usize,
    /// The number of panels at the time of the call
    len:   usize,
  },

  /// A connections-only operation addressed a panel showing something else.
  #[error("Panel {0} is not showing connections")]
  NotConnections(usize),

  /// The provided text reference could not be parsed.
  ///
  /// The string parameter contains the rejected input.
  #[error("Invalid text reference: \"{0}\"")]
  InvalidRef(String),

  /// A reader URL could not be turned back into panels.
  #[error("Invalid reader URL: {0}")]
  InvalidUrl(String),

  /// A network request failed.
  ///
  /// This can occur when:
  /// - The network is unavailable
  /// - The server is unreachable
  /// - The request times out
  #[error(transparent)]
  Network(#[from] reqwest::Error),

  /// The content API had no data for the requested key.
  #[error("Content not found: {0}")]
  NotFound(String),

  /// The content API returned an error payload.
  ///
  /// The string parameter contains the message reported by the API.
  #[error("API error: {0}")]
  ApiError(String),

  /// A URL could not be assembled from the configured base.
  #[error(transparent)]
  UrlParse(#[from] url::ParseError),

  /// JSON (de)serialization failed.
  #[error(transparent)]
  Json(#[from] serde_json::Error),

  /// A TOML configuration file could not be parsed.
  #[error(transparent)]
  TomlDe(#[from] toml::de::Error),

  /// A configuration could not be written as TOML.
  #[error(transparent)]
  TomlSer(#[from] toml::ser::Error),

  /// A file system operation failed.
  #[error(transparent)]
  Path(#[from] std::io::Error),

  /// A configuration value was missing or inconsistent.
  #[error("{0}")]
  Config(String),
}
