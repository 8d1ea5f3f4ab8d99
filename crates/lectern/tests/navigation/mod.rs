use super::*;

mod history;

#[traced_test]
#[test]
fn test_open_text_on_empty_reader() -> TestResult<()> {
  let mut app = multi_panel_app();
  app.open_panel("Genesis 1:1", None)?;

  let panel = &app.panels()[0];
  assert_eq!(panel.mode, Mode::Text);
  assert_eq!(panel.refs, vec!["Genesis 1:1".to_string()]);
  assert!(app.header().unwrap().menu.is_none());

  let entry = app.history().current().unwrap();
  assert_eq!(entry.url, "/Genesis.1.1");
  assert_eq!(entry.title, "Genesis 1:1");
  assert_eq!(app.last_command(), Some(HistoryCommand::Push));
  Ok(())
}

#[traced_test]
#[test]
fn test_open_connections_next_to_text() -> TestResult<()> {
  let mut app = multi_panel_app();
  app.open_panel("Genesis 1:1", None)?;
  app.open_connections_at(1, vec!["Genesis 1:1".into()])?;

  assert_eq!(app.panels().len(), 2);
  let (text, connections) = (&app.panels()[0], &app.panels()[1]);
  assert_eq!(text.highlighted_refs, vec!["Genesis 1:1".to_string()]);
  assert_eq!(connections.mode, Mode::Connections);
  assert_eq!(connections.settings.language, Language::English);
  assert_eq!(connections.connections_mode, ConnectionsMode::Resources);
  assert_eq!(current_url(&app), "/Genesis.1.1?with=all");
  assert_eq!(app.history().len(), 2);
  Ok(())
}

#[traced_test]
#[test]
fn test_filter_connections() -> TestResult<()> {
  let mut app = multi_panel_app();
  app.open_panel("Genesis 1:1", None)?;
  app.open_connections_at(1, vec!["Genesis 1:1".into()])?;
  app.set_connections_filter(1, Some("Rashi"), true)?;

  assert_eq!(app.panels()[1].filter, vec!["Rashi".to_string()]);
  assert_eq!(app.panels()[1].recent_filters, vec!["Rashi".to_string()]);
  assert_eq!(app.panels()[1].connections_mode, ConnectionsMode::TextList);
  assert_eq!(app.panels()[0].filter, vec!["Rashi".to_string()]);
  assert_eq!(current_url(&app), "/Genesis.1.1?with=Rashi");
  assert_eq!(app.history().current().unwrap().title, "Genesis 1:1 with Rashi");
  Ok(())
}

#[traced_test]
#[test]
fn test_closing_last_text_shows_library() -> TestResult<()> {
  let mut app = multi_panel_app();
  app.open_panel("Genesis 1:1", None)?;
  app.open_connections_at(1, vec!["Genesis 1:1".into()])?;
  app.close_panel(0)?;

  assert!(app.panels().is_empty());
  assert_eq!(app.header().unwrap().menu, Some(Menu::library()));
  assert_eq!(current_url(&app), "/texts");
  Ok(())
}

#[test]
fn test_bad_index_leaves_state_alone() -> TestResult<()> {
  let mut app = multi_panel_app();
  app.open_panel("Genesis 1:1", None)?;
  let before = app.panels().to_vec();
  let history = app.history().len();

  assert!(matches!(app.close_panel(5), Err(LecternError::PanelIndex { index: 5, len: 1 })));
  assert!(app.set_connections_filter(1, Some("Rashi"), true).is_err());
  assert!(app.open_connections_at(3, vec!["Genesis 1:1".into()]).is_err());

  assert_eq!(app.panels(), before.as_slice());
  assert_eq!(app.history().len(), history);
  Ok(())
}

#[test]
fn test_connections_are_never_bilingual() -> TestResult<()> {
  let mut app = multi_panel_app();
  app.open_panel("Genesis 1:1", None)?;
  app.open_connections_at(1, vec!["Genesis 1:1".into()])?;
  app.set_option(1, SettingChange::Language(Language::Bilingual))?;
  app.set_panel_state(1, PartialPanel { settings: Some(Settings::default()), ..PartialPanel::default() })?;

  assert_eq!(app.panels()[1].settings.language, Language::English);
  assert_eq!(app.default_settings().language, Language::Bilingual);
  Ok(())
}

#[test]
fn test_highlights_stay_inside_loaded_sections() -> TestResult<()> {
  let mut app = multi_panel_app();
  app.open_panel("Genesis 1:1", None)?;
  app.set_text_list_highlight(0, vec!["Exodus 3:1".into(), "Genesis 1:1".into()])?;
  assert_eq!(app.panels()[0].highlighted_refs, vec!["Genesis 1:1".to_string()]);
  Ok(())
}

#[test]
fn test_three_panel_layout() -> TestResult<()> {
  let mut app = ReaderApp::builder().with_config(Config::default().with_window_width(1440.0)).build();
  app.open_panel("Genesis 1", None)?;
  app.open_panel_at(0, "Exodus 1", None)?;
  app.open_connections_at(1, vec!["Genesis 1:1".into()])?;

  let layout = app.layout();
  assert_eq!(layout.unit, WidthUnit::Percent);
  assert_eq!(layout.widths, vec![37.0, 26.0, 37.0]);
  assert_eq!(layout.widths.iter().sum::<f64>(), 100.0);
  Ok(())
}

#[test]
fn test_menus_in_single_panel_mode() -> TestResult<()> {
  let mut app = ReaderApp::builder().multi_panel(false).build();
  app.show_search("light")?;
  assert_eq!(app.panels().len(), 1);
  assert_eq!(current_url(&app), "/search?q=light");

  app.close_menu()?;
  assert!(app.panels()[0].menu.is_none());

  app.show_sheets(Some("Shabbat".into()))?;
  assert_eq!(current_url(&app), "/sheets/tags/Shabbat");
  Ok(())
}

#[test]
fn test_settings_are_persisted_through_store() -> TestResult<()> {
  let store = MemorySettingsStore::new();
  let mut app = ReaderApp::builder().with_settings_store(Box::new(store)).build();
  app.open_panel("Genesis 1", None)?;
  app.set_option(0, SettingChange::Language(Language::Hebrew))?;

  app.open_panel("Exodus 1", None)?;
  assert_eq!(app.panels()[0].settings.language, Language::Hebrew);
  Ok(())
}

#[test]
fn test_version_propagates_to_connections() -> TestResult<()> {
  let mut app = multi_panel_app();
  app.open_panel("Genesis 1:1", None)?;
  app.open_connections_at(1, vec!["Genesis 1:1".into()])?;
  let version = VersionSelection::new("JPS 1917", VersionLanguage::En);
  app.select_version(0, Some(version.clone()))?;

  assert_eq!(app.panels()[1].version, Some(version));
  assert_eq!(current_url(&app), "/Genesis.1.1/en/JPS_1917?with=all");
  Ok(())
}
