use std::collections::HashMap;

use super::*;

fn poller() -> CommandPoller {
    CommandPoller::new("m1".to_string(), "http://127.0.0.1:1".to_string(), 30_000)
}

#[tokio::test]
async fn run_command_captures_stdout_and_exit_code() {
    let result = poller().run_shell_line("echo hello", None).await;
    assert_eq!(result.status, patze_core::ResultStatus::Succeeded);
    assert_eq!(result.exit_code, Some(0));
    assert!(result.stdout.contains("hello"));
    assert!(!result.truncated);
}

#[tokio::test]
async fn run_command_reports_non_zero_exit_as_failed() {
    let result = poller().run_shell_line("exit 3", None).await;
    assert_eq!(result.status, patze_core::ResultStatus::Failed);
    assert_eq!(result.exit_code, Some(3));
}

#[tokio::test]
async fn non_run_command_intent_acks_as_succeeded_with_no_output() {
    let intent = CommandIntentDto::AgentSetEnabled { agent_id: "a1".to_string(), enabled: true };
    let result = poller().execute(&intent).await;
    assert_eq!(result.status, patze_core::ResultStatus::Succeeded);
    assert!(result.stdout.is_empty());
}

#[test]
fn truncate_utf8_flags_oversized_output() {
    let small = vec![b'a'; 10];
    let (text, truncated) = truncate_utf8(&small);
    assert_eq!(text, "a".repeat(10));
    assert!(!truncated);

    let large = vec![b'a'; MAX_OUTPUT_BYTES + 10];
    let (text, truncated) = truncate_utf8(&large);
    assert_eq!(text.len(), MAX_OUTPUT_BYTES);
    assert!(truncated);
}

#[test]
fn trigger_job_intent_serializes_with_job_name_camel_case() {
    let intent = CommandIntentDto::TriggerJob { job_name: "nightly".to_string(), args: HashMap::new() };
    let value = serde_json::to_value(&intent).expect("serialize");
    assert_eq!(value["jobName"], "nightly");
}
