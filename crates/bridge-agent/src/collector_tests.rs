use std::collections::HashMap;

use super::*;

fn run(id: &str, state: LifecycleState) -> ActiveRun {
    ActiveRun {
        run_id: id.to_string(),
        session_id: "s1".to_string(),
        agent_id: "a1".to_string(),
        state,
        updated_at: Utc::now(),
    }
}

#[test]
fn new_run_is_a_delta() {
    let previous = HashMap::new();
    let current = vec![run("r1", LifecycleState::Running)];
    let deltas = diff_runs(&previous, &current);
    assert_eq!(deltas.len(), 1);
}

#[test]
fn unchanged_state_is_not_a_delta() {
    let mut previous = HashMap::new();
    previous.insert("r1".to_string(), run("r1", LifecycleState::Running));
    let current = vec![run("r1", LifecycleState::Running)];
    assert!(diff_runs(&previous, &current).is_empty());
}

#[test]
fn changed_state_is_a_delta() {
    let mut previous = HashMap::new();
    previous.insert("r1".to_string(), run("r1", LifecycleState::Running));
    let current = vec![run("r1", LifecycleState::Completed)];
    let deltas = diff_runs(&previous, &current);
    assert_eq!(deltas.len(), 1);
    assert_eq!(deltas[0].state, LifecycleState::Completed);
}

#[tokio::test]
async fn file_collector_returns_empty_for_missing_dir() {
    let collector = FileCollector { dir: PathBuf::from("/nonexistent/patze-test-dir") };
    let runs = collector.collect().await.unwrap();
    assert!(runs.is_empty());
}

#[tokio::test]
async fn file_collector_reads_run_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("runs")).unwrap();
    std::fs::write(
        dir.path().join("runs/r1.json"),
        serde_json::to_vec(&run("r1", LifecycleState::Running)).unwrap(),
    )
    .unwrap();
    let collector = FileCollector { dir: dir.path().to_path_buf() };
    let runs = collector.collect().await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].run_id, "r1");
}
