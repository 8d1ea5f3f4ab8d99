//! Multi-panel reader state for a digital library of texts.
//!
//! `lectern` models everything a reading client needs to know about what is on
//! screen, without rendering any of it:
//!
//! - Reading panels showing a text, its connections (commentary, cross
//!   references), or a named menu such as the library navigation or search
//! - A header panel that owns navigation/search overlays in multi-panel mode
//! - Browser-style history entries (URL, title, restorable state) for every
//!   qualifying change
//! - Relative panel widths for the current window size
//! - An injected content source for text, link and index data
//!
//! # Getting Started
//!
//! ```
//! use lectern::{controller::ReaderApp, history::{BrowserHistory, MemoryHistory}};
//!
//! # fn example() -> Result<(), lectern::error::LecternError> {
//! let mut app = ReaderApp::builder().multi_panel(true).build();
//!
//! app.open_panel("Genesis 1:1", None)?;
//! assert_eq!(app.history().current().unwrap().url, "/Genesis.1.1");
//!
//! app.open_connections_at(1, vec!["Genesis 1:1".to_string()])?;
//! app.set_connections_filter(1, Some("Rashi"), true)?;
//! assert_eq!(app.history().current().unwrap().url, "/Genesis.1.1?with=Rashi");
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`reference`]: Parsing and URL normalization of text references
//! - [`settings`]: Display preferences carried by every panel
//! - [`panel`]: The [`panel::PanelState`] record and its partial form
//! - [`factory`]: Default filling of partial panels
//! - [`history`]: History entries, URL building and parsing
//! - [`layout`]: Panel width calculation
//! - [`content`]: Content source trait with in-memory and HTTP implementations
//! - [`controller`]: The [`controller::ReaderApp`] state machine
//! - [`config`]: On-disk configuration and settings persistence

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{
  collections::{BTreeMap, HashMap},
  fmt::Display,
  path::{Path, PathBuf},
  str::FromStr,
  sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
#[cfg(test)] use tracing_test::traced_test;

pub mod config;
pub mod content;
pub mod controller;
pub mod error;
pub mod factory;
pub mod history;
pub mod layout;
pub mod panel;
pub mod reference;
pub mod settings;

use crate::{error::*, panel::*, reference::*, settings::*};

/// Common traits and types for ergonomic imports.
///
/// ```
/// use lectern::prelude::*;
///
/// fn example() -> Result<(), LecternError> {
///   let mut app = ReaderApp::builder().build();
///   app.open_panel("Exodus 20", None)?;
///   Ok(())
/// }
/// ```
pub mod prelude {
  pub use crate::{
    config::SettingsStore,
    content::ContentSource,
    controller::ReaderApp,
    error::LecternError,
    history::BrowserHistory,
    panel::{Menu, Mode, PanelState},
  };
}
