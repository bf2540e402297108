use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::time::Duration;

use async_trait::async_trait;

use super::*;
use crate::collector::{ActiveRun, CollectorError};

struct FakeSource {
    calls: AtomicUsize,
    fail_after: Option<usize>,
}

#[async_trait]
impl RunSource for FakeSource {
    async fn collect(&self) -> Result<Vec<ActiveRun>, CollectorError> {
        let n = self.calls.fetch_add(1, AtomicOrdering::Relaxed);
        if self.fail_after == Some(n) {
            return Err(CollectorError::NonZeroExit("boom".to_string()));
        }
        Ok(vec![ActiveRun {
            run_id: "r1".to_string(),
            session_id: "s1".to_string(),
            agent_id: "a1".to_string(),
            state: patze_core::session::LifecycleState::Running,
            updated_at: Utc::now(),
        }])
    }
}

fn fake_sink() -> Arc<HttpSink> {
    let (sink, _handle) =
        HttpSink::spawn("http://127.0.0.1:1".to_string(), None, 100, 10, Duration::from_secs(3600), 1);
    sink
}

#[tokio::test]
async fn tick_emits_heartbeat_and_run_delta() {
    let sink = fake_sink();
    let source = Box::new(FakeSource { calls: AtomicUsize::new(0), fail_after: None });
    let runtime = BridgeRuntime::new("m1".to_string(), sink.clone(), source);
    runtime.tick().await;
    // heartbeat + one run delta were enqueued, then flush() drained the queue
    // against an unreachable URL, so they were requeued; either way nothing panicked.
    assert_eq!(runtime.consecutive_tick_failures(), 0);
}

#[tokio::test]
async fn collector_failure_increments_degradation_counter() {
    let sink = fake_sink();
    let source = Box::new(FakeSource { calls: AtomicUsize::new(0), fail_after: Some(0) });
    let runtime = BridgeRuntime::new("m1".to_string(), sink, source);
    runtime.tick().await;
    assert_eq!(runtime.consecutive_tick_failures(), 1);
    assert!(!runtime.is_degraded());
    runtime.tick().await;
    runtime.tick().await;
    assert!(runtime.is_degraded());
}
