use form_saver::{
    page::page_id::PageIdentifier,
    trace::{logger::TraceLogger, trace::TraceEvent},
};
use serde_json::Value;

fn journal_path(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("form_saver_trace_test");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = std::fs::remove_file(&path);
    path
}

// =========================================================================
// Journal writer
// =========================================================================

#[tokio::test]
async fn journal_lines_are_written_in_order() {
    let path = journal_path("ordered.jsonl");
    let page = PageIdentifier::from_url("https://example.com/a").unwrap();

    let logger = TraceLogger::new(&path);
    assert!(logger.is_enabled());
    assert_eq!(logger.path(), Some(path.as_path()));

    logger.log(&TraceEvent::now(&page, "save").with_fields(3));
    logger.log(&TraceEvent::now(&page, "restore").with_fields(2).with_detail("manual"));
    logger.log(&TraceEvent::now(&page, "restore_gave_up").with_attempt(11));
    logger.flush().await;

    let lines: Vec<Value> = std::fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["action"], "save");
    assert_eq!(lines[0]["fields"], 3);
    assert_eq!(lines[1]["detail"], "manual");
    assert_eq!(lines[2]["attempt"], 11);
    assert_eq!(lines[2]["page_id"], "https://example.com/a");
}

#[tokio::test]
async fn journal_appends_across_loggers() {
    let path = journal_path("append.jsonl");
    let page = PageIdentifier::from_url("https://example.com/a").unwrap();

    for action in ["save", "save"] {
        let logger = TraceLogger::new(&path);
        logger.log(&TraceEvent::now(&page, action));
        logger.flush().await;
    }

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 2);
}

#[tokio::test]
async fn disabled_journal_is_silent() {
    let page = PageIdentifier::from_url("https://example.com/a").unwrap();
    let logger = TraceLogger::disabled();
    assert!(!logger.is_enabled());
    assert_eq!(logger.path(), None);

    logger.log(&TraceEvent::now(&page, "save"));
    logger.flush().await;
}

#[test]
fn journal_needs_a_runtime() {
    let path = journal_path("no_runtime.jsonl");
    let logger = TraceLogger::new(&path);
    assert!(!logger.is_enabled());
    assert!(!path.exists());
}

#[tokio::test]
async fn unopenable_journal_is_disabled() {
    let dir = journal_path("a_directory");
    std::fs::create_dir_all(&dir).unwrap();
    let logger = TraceLogger::new(&dir);
    assert!(!logger.is_enabled());
}
