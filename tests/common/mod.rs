// ABOUTME: Shared helpers for integration tests
// ABOUTME: Provides canned task handlers and timing instrumentation

// Each test binary compiles this module separately and uses a subset of it.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use taskwave::TaskDefinition;

/// Opt into log output for a test run via RUST_LOG.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A task that immediately succeeds with a small payload.
pub fn ok_task(id: &str) -> TaskDefinition {
    let payload = json!({ "task": id });
    TaskDefinition::new(id, move || {
        let payload = payload.clone();
        async move { anyhow::Ok(payload) }
    })
}

/// A task that always fails with the given message.
pub fn failing_task(id: &str, message: &'static str) -> TaskDefinition {
    TaskDefinition::new(id, move || async move {
        Err::<Value, _>(anyhow::anyhow!(message))
    })
}

/// A task that fails `failures` times before succeeding, counting every
/// handler invocation.
pub fn flaky_task(id: &str, failures: u32) -> (TaskDefinition, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let seen = Arc::clone(&calls);
    let task = TaskDefinition::new(id, move || {
        let seen = Arc::clone(&seen);
        async move {
            let attempt = seen.fetch_add(1, Ordering::SeqCst);
            if attempt < failures {
                anyhow::bail!("temporary failure on attempt {}", attempt + 1);
            }
            anyhow::Ok(json!(attempt + 1))
        }
    });
    (task, calls)
}

/// Records the instant each task's handler first runs, for ordering and
/// concurrency assertions.
#[derive(Clone, Default)]
pub struct StartClock {
    stamps: Arc<Mutex<HashMap<String, Instant>>>,
    epoch: Arc<Mutex<Option<Instant>>>,
}

impl StartClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A task that stamps its start, holds for `work`, then succeeds.
    pub fn task(&self, id: &str, work: Duration) -> TaskDefinition {
        let stamps = Arc::clone(&self.stamps);
        let epoch = Arc::clone(&self.epoch);
        let task_id = id.to_string();
        TaskDefinition::new(id, move || {
            let stamps = Arc::clone(&stamps);
            let epoch = Arc::clone(&epoch);
            let task_id = task_id.clone();
            async move {
                let now = Instant::now();
                epoch.lock().unwrap().get_or_insert(now);
                stamps.lock().unwrap().insert(task_id.clone(), now);
                tokio::time::sleep(work).await;
                anyhow::Ok(json!({ "task": task_id }))
            }
        })
    }

    /// Start offset of a task relative to the first handler observed.
    pub fn started_at(&self, id: &str) -> Duration {
        let stamps = self.stamps.lock().unwrap();
        let epoch = self.epoch.lock().unwrap().expect("no task ever started");
        stamps
            .get(id)
            .unwrap_or_else(|| panic!("task '{id}' never started"))
            .duration_since(epoch)
    }

    pub fn gap_between(&self, first: &str, second: &str) -> Duration {
        let a = self.started_at(first);
        let b = self.started_at(second);
        if a > b {
            a - b
        } else {
            b - a
        }
    }
}
