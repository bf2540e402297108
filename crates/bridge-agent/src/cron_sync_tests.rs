use tempfile::tempdir;

use super::*;

fn pusher(dir: &std::path::Path) -> CronSyncPusher {
    CronSyncPusher::new(
        "m1".to_string(),
        "http://127.0.0.1:1".to_string(),
        dir.to_path_buf(),
        dir.join("cron-sync-state.json"),
    )
}

#[tokio::test]
async fn read_jobs_returns_empty_when_missing() {
    let dir = tempdir().expect("tempdir");
    let pusher = pusher(dir.path());
    assert!(pusher.read_jobs().await.is_empty());
}

#[tokio::test]
async fn read_jobs_parses_array_file() {
    let dir = tempdir().expect("tempdir");
    tokio::fs::write(dir.path().join("jobs.json"), br#"[{"id":"j1"}]"#).await.expect("write jobs");
    let pusher = pusher(dir.path());
    let jobs = pusher.read_jobs().await;
    assert_eq!(jobs.len(), 1);
}

#[tokio::test]
async fn run_log_offset_advances_and_skips_already_seen_lines() {
    let dir = tempdir().expect("tempdir");
    let runs_dir = dir.path().join("runs");
    tokio::fs::create_dir_all(&runs_dir).await.expect("mkdir runs");
    tokio::fs::write(runs_dir.join("a.jsonl"), b"{\"runId\":\"r1\"}\n{\"runId\":\"r2\"}\n").await.expect("write run log");

    let pusher = pusher(dir.path());
    let mut watermark = Watermark::default();

    let first = pusher.read_new_run_lines(&mut watermark).await;
    assert_eq!(first.len(), 2);
    assert!(watermark.run_log_offsets.get("a.jsonl").copied().unwrap_or(0) > 0);

    let second = pusher.read_new_run_lines(&mut watermark).await;
    assert!(second.is_empty(), "already-consumed lines must not be resent");
}

#[tokio::test]
async fn incomplete_trailing_line_is_retried_next_tick() {
    let dir = tempdir().expect("tempdir");
    let runs_dir = dir.path().join("runs");
    tokio::fs::create_dir_all(&runs_dir).await.expect("mkdir runs");
    let path = runs_dir.join("a.jsonl");
    tokio::fs::write(&path, b"{\"runId\":\"r1\"}\n{\"runId\":\"r2").await.expect("write partial log");

    let pusher = pusher(dir.path());
    let mut watermark = Watermark::default();
    let first = pusher.read_new_run_lines(&mut watermark).await;
    assert_eq!(first.len(), 1);

    tokio::fs::write(&path, b"{\"runId\":\"r1\"}\n{\"runId\":\"r2\"}\n").await.expect("complete the log");
    let second = pusher.read_new_run_lines(&mut watermark).await;
    assert_eq!(second.len(), 1);
}

#[test]
fn hex_sha256_is_deterministic() {
    assert_eq!(hex_sha256(b"hello"), hex_sha256(b"hello"));
    assert_ne!(hex_sha256(b"hello"), hex_sha256(b"world"));
}
