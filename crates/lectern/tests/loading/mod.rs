use lectern::content::LinkSummary;

use super::*;

fn source() -> Arc<MemoryContent> {
  let content = MemoryContent::new();
  content.insert(
    ContentKey::text("Genesis 1"),
    Content::Text(TextData::new("Genesis 1", vec!["In the beginning".into()])),
  );
  content.insert(ContentKey::Related("Genesis 1".into()), Content::Related(LinkSummary::default()));
  Arc::new(content)
}

fn app_with(content: Arc<MemoryContent>) -> ReaderApp { ReaderApp::builder().with_content(content).build() }

#[traced_test]
#[tokio::test]
async fn test_load_text() -> TestResult<()> {
  let mut app = app_with(source());
  app.open_panel("Genesis 1", None)?;
  assert_eq!(app.load(0).await?, LoadStatus::Loaded);
  Ok(())
}

#[tokio::test]
async fn test_missing_text_fails_in_panel() -> TestResult<()> {
  let mut app = app_with(source());
  app.open_panel("Leviticus 27", None)?;
  assert!(matches!(app.load(0).await?, LoadStatus::Failed(_)));
  Ok(())
}

#[tokio::test]
async fn test_load_all_panels() -> TestResult<()> {
  let mut app = app_with(source());
  app.open_panel("Genesis 1", None)?;
  app.open_connections_at(1, vec!["Genesis 1:1".into()])?;
  app.load_all().await?;

  assert!(app.panels().iter().all(|p| p.status == LoadStatus::Loaded));
  assert!(matches!(app.cached_content(1), Some(Content::Related(_))));
  Ok(())
}

#[test]
fn test_cached_content_needs_no_fetch() -> TestResult<()> {
  let mut app = app_with(source());
  app.open_panel("Genesis 1", None)?;
  assert!(app.request_content(0)?.is_none());
  assert_eq!(app.panels()[0].status, LoadStatus::Loaded);
  Ok(())
}

#[test]
fn test_book_toc_requests_index() -> TestResult<()> {
  let mut app = app_with(source());
  app.open_panel("Song of Songs", None)?;
  let ticket = app.request_content(0)?.ok_or("nothing requested")?;
  assert_eq!(ticket.key, ContentKey::Index("Song of Songs".into()));
  Ok(())
}

#[test]
fn test_response_for_closed_panel_is_dropped() -> TestResult<()> {
  let mut app = app_with(Arc::new(MemoryContent::new()));
  app.open_panel("Genesis 1", None)?;
  app.open_panel_at(0, "Exodus 1", None)?;
  let ticket = app.request_content(1)?.ok_or("nothing requested")?;
  app.close_panel(1)?;

  let text = Content::Text(TextData::new("Exodus 1", Vec::new()));
  assert!(!app.receive_content(ticket, Ok(text)));
  assert_eq!(app.panels()[0].status, LoadStatus::Idle);
  Ok(())
}

#[test]
fn test_config_file_drives_the_reader() -> TestResult<()> {
  let dir = tempfile::tempdir()?;
  let path = dir.path().join("config.toml");
  let config = Config::default()
    .with_multi_panel(false)
    .with_settings(Settings { language: Language::Hebrew, ..Settings::default() });
  config.save(&path)?;

  let config = Config::load(&path)?;
  config.validate()?;
  let mut app = ReaderApp::builder().with_config(config).build();
  app.open_panel("Genesis 1", None)?;
  assert!(app.header().is_none());
  assert_eq!(app.panels()[0].settings.language, Language::Hebrew);
  Ok(())
}
