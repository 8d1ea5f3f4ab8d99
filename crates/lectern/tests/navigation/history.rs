use lectern::factory::{PanelStateFactory, VersionCache};

use super::*;

#[traced_test]
#[test]
fn test_urls_round_trip_through_the_reader() -> TestResult<()> {
  for url in [
    "/Genesis.1.1",
    "/Genesis.1.1?with=all",
    "/Genesis.1.1?with=Rashi",
    "/Genesis.1.1?p2=Exodus.20",
    "/Psalms.23/en/JPS_1917",
    "/texts/Tanakh",
    "/search?q=light",
  ] {
    let mut app = multi_panel_app();
    app.open_url(url)?;
    assert_eq!(current_url(&app), url, "round trip of {url}");
    assert_eq!(app.last_command(), Some(HistoryCommand::Replace));
  }
  Ok(())
}

#[test]
fn test_serialized_state_restores_panels() -> TestResult<()> {
  let mut app = multi_panel_app();
  app.open_panel("Genesis 1:1", None)?;
  app.open_connections_at(1, vec!["Genesis 1:1".into()])?;
  app.set_connections_filter(1, Some("Rashi"), true)?;

  let entry = HistorySerializer::serialize(app.panels(), app.header());
  let (panels, header) = HistorySerializer::deserialize(&entry.state);
  assert_eq!(panels, app.panels());
  assert_eq!(header.as_ref(), app.header());
  Ok(())
}

#[test]
fn test_normalize_is_idempotent_on_live_panels() -> TestResult<()> {
  let mut app = multi_panel_app();
  app.open_panel("Genesis 1:1", None)?;
  app.open_connections_at(1, vec!["Genesis 1:1".into()])?;
  app.set_connections_filter(1, Some("Rashi"), true)?;

  let factory = PanelStateFactory::new(VersionCache::new());
  for panel in app.panels() {
    let again = factory.normalize(PartialPanel::from(panel.clone()), app.default_settings());
    assert_eq!(&again, panel);
  }
  Ok(())
}

#[test]
fn test_cosmetic_changes_replace_history() -> TestResult<()> {
  let mut app = multi_panel_app();
  app.open_panel("Genesis 1", None)?;
  app.set_option(0, SettingChange::FontSizeStep(false))?;
  assert_eq!(app.last_command(), Some(HistoryCommand::Replace));

  app.update_refs(0, vec!["Genesis 1".into(), "Genesis 2".into()])?;
  assert_eq!(app.last_command(), Some(HistoryCommand::Replace));
  assert_eq!(app.history().len(), 1);
  assert_eq!(current_url(&app), "/Genesis.2");
  Ok(())
}

#[traced_test]
#[test]
fn test_back_and_forward() -> TestResult<()> {
  let mut app = multi_panel_app();
  app.open_panel("Genesis 1", None)?;
  app.open_panel("Exodus 1", None)?;
  app.show_search("covenant")?;
  assert_eq!(app.history().len(), 3);

  let state = app.history_mut().back().ok_or("no previous entry")?;
  app.pop_state(state);
  assert!(app.header().unwrap().menu.is_none());
  assert_eq!(app.panels()[0].refs, vec!["Exodus 1".to_string()]);

  let state = app.history_mut().back().ok_or("no previous entry")?;
  app.pop_state(state);
  assert_eq!(current_url(&app), "/Genesis.1");

  let state = app.history_mut().forward().ok_or("no next entry")?;
  app.pop_state(state);
  assert_eq!(current_url(&app), "/Exodus.1");
  assert_eq!(app.history().len(), 3);
  Ok(())
}
