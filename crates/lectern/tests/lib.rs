use std::{error::Error, sync::Arc};

use lectern::{
  config::{Config, MemorySettingsStore},
  content::{Content, ContentKey, MemoryContent, TextData},
  controller::ReaderApp,
  history::{HistoryCommand, HistorySerializer},
  layout::WidthUnit,
  panel::{ConnectionsMode, LoadStatus, Menu, Mode, PartialPanel, VersionSelection},
  prelude::*,
  settings::{Language, SettingChange, Settings, VersionLanguage},
};
use tracing_test::traced_test;

mod loading;
mod navigation;

pub type TestResult<T> = Result<T, Box<dyn Error>>;

pub fn multi_panel_app() -> ReaderApp { ReaderApp::builder().multi_panel(true).build() }

pub fn current_url(app: &ReaderApp) -> String {
  app.history().current().map(|entry| entry.url.clone()).unwrap_or_default()
}
