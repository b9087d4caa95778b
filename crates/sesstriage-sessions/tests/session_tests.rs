use std::fs;

use sesstriage_sessions::{parse_session, SessionStore};
use tempfile::TempDir;

/// Helper: create a temp directory with session record files.
fn create_test_sessions_dir() -> TempDir {
    let dir = TempDir::new().unwrap();

    // Session 1: a browser visitor with two page views
    let session1 = r#"{"useragent":"Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0","visits":2,"last":1700000600,
        "history":[{"timestamp":1700000000,"host":"www.example.com","address":"198.51.100.4"},
                   {"timestamp":1700000600,"host":"www.example.com","address":"198.51.100.4"}],
        "user":{"name":"alice"}}"#;
    fs::write(dir.path().join("sess_aaa111"), session1).unwrap();

    // Session 2: a crawler, history stored with keyed positions
    let session2 = r#"{"useragent":"Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)","visits":1,"last":1700001000,
        "history":{"0":{"timestamp":1700001000,"host":"crawl-66-249-66-1.googlebot.com","address":"66.249.66.1"}}}"#;
    fs::write(dir.path().join("sess_bbb222"), session2).unwrap();

    // Session 3: no user agent at all
    let session3 = r#"{"useragent":null,"visits":1,"last":1700002000,
        "history":[{"timestamp":1700002000,"address":"203.0.113.5"}]}"#;
    fs::write(dir.path().join("sess_ccc333"), session3).unwrap();

    // Not a session record, must be ignored
    fs::write(dir.path().join("README"), "not a session").unwrap();

    dir
}

// ============================================================
// Parser tests
// ============================================================

#[test]
fn test_parse_session_complete() {
    let dir = create_test_sessions_dir();
    let path = dir.path().join("sess_aaa111");

    let session = parse_session(&path, "sess_").unwrap();

    assert_eq!(session.id, "aaa111");
    assert!(session.useragent.as_deref().unwrap().contains("Firefox/115.0"));
    assert_eq!(session.visits, 2);
    assert_eq!(session.last, 1700000600);
    assert_eq!(session.history.len(), 2);
    assert_eq!(session.history[1].seq, 1);
    assert_eq!(session.history[1].timestamp, 1700000600);
    assert_eq!(
        session.user.as_ref().and_then(|u| u.get("name")).and_then(|n| n.as_str()),
        Some("alice")
    );
}

#[test]
fn test_parse_session_missing_host() {
    let dir = create_test_sessions_dir();
    let session = parse_session(&dir.path().join("sess_ccc333"), "sess_").unwrap();

    assert_eq!(session.useragent, None);
    assert_eq!(session.history[0].host, None);
    assert_eq!(session.last_request().unwrap().host_or_address(), Some("203.0.113.5"));
}

#[test]
fn test_parse_session_missing_file() {
    let dir = TempDir::new().unwrap();
    assert!(parse_session(&dir.path().join("sess_nope"), "sess_").is_err());
}

// ============================================================
// Store tests
// ============================================================

#[test]
fn test_store_lists_only_prefixed_files() {
    let dir = create_test_sessions_dir();
    let store = SessionStore::with_dir(dir.path().to_path_buf());

    let paths = store.paths().unwrap();

    assert_eq!(paths.len(), 3);
    assert!(paths.iter().all(|p| p
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("sess_")));
}

#[test]
fn test_store_get_by_id() {
    let dir = create_test_sessions_dir();
    let store = SessionStore::with_dir(dir.path().to_path_buf());

    let session = store.get("bbb222").unwrap();

    assert_eq!(session.id, "bbb222");
    assert_eq!(session.history.len(), 1);
    assert_eq!(
        session.history[0].host.as_deref(),
        Some("crawl-66-249-66-1.googlebot.com")
    );
}

#[test]
fn test_store_load_all_skips_corrupt_records() {
    let dir = create_test_sessions_dir();
    fs::write(dir.path().join("sess_broken"), "{not json").unwrap();
    fs::write(dir.path().join("sess_novisits"), r#"{"last":1}"#).unwrap();
    let store = SessionStore::with_dir(dir.path().to_path_buf());

    let loaded = store.load_all().unwrap();

    assert_eq!(loaded.sessions.len(), 3);
    assert_eq!(loaded.skipped.len(), 2);
    assert!(loaded
        .skipped
        .iter()
        .any(|s| s.path.ends_with("sess_novisits") && s.error.contains("visits")));
}

#[test]
fn test_store_custom_prefix() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("visit-1"),
        r#"{"useragent":"curl/7.68.0","visits":1,"last":5,"history":[{"timestamp":5,"host":"a.b.c"}]}"#,
    )
    .unwrap();
    let store = SessionStore::with_dir(dir.path().to_path_buf()).with_prefix("visit-");

    let loaded = store.load_all().unwrap();

    assert_eq!(loaded.sessions.len(), 1);
    assert_eq!(loaded.sessions[0].id, "1");
}

#[test]
fn test_store_reads_php_session_files() {
    let dir = TempDir::new().unwrap();
    // As written by PHP's default `php` serialize handler
    let php = concat!(
        r#"useragent|s:72:"Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";"#,
        r#"visits|i:1;last|i:1700003000;"#,
        r#"history|a:1:{i:0;a:3:{s:9:"timestamp";i:1700003000;s:4:"host";s:31:"crawl-66-249-66-1.googlebot.com";s:7:"address";s:11:"66.249.66.1";}}"#,
    );
    fs::write(dir.path().join("sess_php001"), php).unwrap();
    // As written by the `php_serialize` handler
    fs::write(
        dir.path().join("sess_php002"),
        r#"a:3:{s:6:"visits";i:1;s:4:"last";i:5;s:7:"history";a:0:{}}"#,
    )
    .unwrap();
    let store = SessionStore::with_dir(dir.path().to_path_buf());

    let loaded = store.load_all().unwrap();

    assert!(loaded.skipped.is_empty());
    assert_eq!(loaded.sessions.len(), 2);
    let crawler = &loaded.sessions[0];
    assert_eq!(crawler.id, "php001");
    assert!(crawler.useragent.as_deref().unwrap().contains("Googlebot/2.1"));
    assert_eq!(crawler.history[0].address.as_deref(), Some("66.249.66.1"));
    let bare = &loaded.sessions[1];
    assert_eq!(bare.useragent, None);
    assert_eq!(bare.last, 5);
    assert!(bare.history.is_empty());
}

#[test]
fn test_store_missing_dir_is_an_error() {
    let dir = TempDir::new().unwrap();
    let store = SessionStore::with_dir(dir.path().join("does-not-exist"));

    assert!(store.load_all().is_err());
}
