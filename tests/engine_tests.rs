// ABOUTME: Integration tests for the workflow execution engine
// ABOUTME: Covers scheduling order, concurrency, retries, timeouts, and events

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use taskwave::engine::ChannelSink;
use taskwave::{TaskDefinition, WorkflowBuilder, WorkflowEngine, WorkflowEvent};

mod common;
use common::{failing_task, flaky_task, ok_task, StartClock};

#[tokio::test]
async fn test_run_terminates_with_result_per_task() {
    let tasks = WorkflowBuilder::new()
        .task(ok_task("extract"))
        .task(ok_task("transform").depends_on(["extract"]))
        .task(ok_task("load").depends_on(["transform"]))
        .build();

    let result = WorkflowEngine::new().run(tasks).await;

    assert!(result.success);
    assert_eq!(result.results.len(), 3);
    assert!(result.errors.is_empty());
    assert!(result.duration.is_some());
    for id in ["extract", "transform", "load"] {
        assert!(result.task_result(id).unwrap().is_successful());
    }
}

#[tokio::test]
async fn test_independent_tasks_start_concurrently() {
    let clock = StartClock::new();
    let tasks = vec![
        clock.task("left", Duration::from_millis(100)),
        clock.task("right", Duration::from_millis(100)),
    ];

    let started = Instant::now();
    let result = WorkflowEngine::new().run(tasks).await;
    let elapsed = started.elapsed();

    assert!(result.success);
    // Both dependency-free tasks are dispatched in the same wave.
    assert!(clock.gap_between("left", "right") < Duration::from_millis(50));
    // Concurrent, not sequential: well under the 200ms a serial run needs.
    assert!(elapsed < Duration::from_millis(190));
}

#[tokio::test]
async fn test_dependent_waits_for_dependency_terminal_state() {
    let clock = StartClock::new();
    let tasks = vec![
        clock.task("base", Duration::from_millis(80)),
        clock.task("dependent", Duration::from_millis(10)).depends_on(["base"]),
    ];

    let result = WorkflowEngine::new().run(tasks).await;

    assert!(result.success);
    // The dependent's start must come after the dependency's full duration.
    assert!(clock.started_at("dependent") >= clock.started_at("base") + Duration::from_millis(80));

    let base_end = result.task_result("base").unwrap().end_time;
    let dependent_start = result.task_result("dependent").unwrap().start_time;
    assert!(dependent_start >= base_end);
}

#[tokio::test]
async fn test_diamond_executes_in_waves() {
    let clock = StartClock::new();
    let hold = Duration::from_millis(40);
    let tasks = vec![
        clock.task("root", hold),
        clock.task("left", hold).depends_on(["root"]),
        clock.task("right", hold).depends_on(["root"]),
        clock.task("join", hold).depends_on(["left", "right"]),
    ];

    let result = WorkflowEngine::new().run(tasks).await;

    assert!(result.success);
    assert_eq!(result.results.len(), 4);
    assert!(clock.gap_between("left", "right") < Duration::from_millis(50));
    assert!(clock.started_at("left") >= clock.started_at("root") + hold);
    assert!(clock.started_at("join") >= clock.started_at("left") + hold);
    assert!(clock.started_at("join") >= clock.started_at("right") + hold);
}

#[tokio::test]
async fn test_failed_dependency_still_unblocks_dependent() {
    let clock = StartClock::new();
    let tasks = vec![
        failing_task("broken", "unrecoverable input"),
        clock.task("after", Duration::from_millis(10)).depends_on(["broken"]),
    ];

    let result = WorkflowEngine::new().run(tasks).await;

    // Failure is recorded but does not block the dependent from running.
    assert!(!result.success);
    assert_eq!(result.results.len(), 2);
    assert!(!result.task_result("broken").unwrap().is_successful());
    assert!(result.task_result("after").unwrap().is_successful());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("broken"));
}

#[tokio::test]
async fn test_retry_count_accounting_on_eventual_success() {
    let (task, calls) = flaky_task("flaky", 2);
    let result = WorkflowEngine::new().run(vec![task.with_retries(2)]).await;

    assert!(result.success);
    let task_result = result.task_result("flaky").unwrap();
    assert_eq!(task_result.retry_count, 2);
    assert_eq!(task_result.attempts.len(), 3);
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_retry_exhaustion_reports_single_error() {
    let tasks = vec![failing_task("doomed", "connection reset by peer").with_retries(1)];
    let result = WorkflowEngine::new().run(tasks).await;

    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);

    let task_result = result.task_result("doomed").unwrap();
    assert_eq!(task_result.retry_count, 1);
    assert_eq!(task_result.attempts.len(), 2);
    assert!(task_result.error.as_ref().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn test_custom_retryable_patterns_extend_builtin_set() {
    let task = TaskDefinition::new("quota", || async {
        Err::<Value, _>(anyhow::anyhow!("quota exceeded for project"))
    })
    .with_retries(1)
    .with_retryable_errors(["quota"]);

    let result = WorkflowEngine::new().run(vec![task]).await;
    let task_result = result.task_result("quota").unwrap();

    // "quota" is not in the built-in set; the custom pattern makes it retry.
    assert_eq!(task_result.retry_count, 1);
    assert_eq!(task_result.attempts.len(), 2);
}

#[tokio::test]
async fn test_timeout_fails_task_without_stalling_run() {
    let tasks = vec![TaskDefinition::new("hung", || async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        anyhow::Ok(json!(null))
    })
    .with_timeout(Duration::from_millis(100))];

    let started = Instant::now();
    let result = WorkflowEngine::new().run(tasks).await;
    let elapsed = started.elapsed();

    assert!(!result.success);
    let task_result = result.task_result("hung").unwrap();
    assert!(task_result.error.as_ref().unwrap().contains("timed out"));
    // The run does not wait out the abandoned 30s handler.
    assert!(elapsed < Duration::from_secs(2));
}

#[tokio::test]
async fn test_duplicate_ids_rejected_before_execution() {
    let tasks = vec![ok_task("same"), ok_task("same")];
    let result = WorkflowEngine::new().run(tasks).await;

    assert!(!result.success);
    assert!(result.results.is_empty());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("Duplicate task IDs"));
}

#[tokio::test]
async fn test_missing_dependency_rejected_before_execution() {
    let tasks = vec![ok_task("orphan").depends_on(["missing"])];
    let result = WorkflowEngine::new().run(tasks).await;

    assert!(!result.success);
    assert!(result.results.is_empty());
    assert!(result.errors[0].contains("depends on non-existent task"));
}

#[tokio::test]
async fn test_cycle_rejected_before_execution() {
    let tasks = vec![
        ok_task("a").depends_on(["b"]),
        ok_task("b").depends_on(["a"]),
    ];
    let result = WorkflowEngine::new().run(tasks).await;

    assert!(!result.success);
    assert!(result.results.is_empty());
    assert!(result.errors[0].contains("Circular dependency"));
}

#[tokio::test]
async fn test_lifecycle_events_for_successful_run() {
    let (sink, mut receiver) = ChannelSink::new();
    let engine = WorkflowEngine::new().with_event_sink(Arc::new(sink));

    let tasks = vec![ok_task("a"), ok_task("b").depends_on(["a"])];
    let result = engine.run(tasks).await;
    assert!(result.success);

    let mut names = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        names.push(event.name());
    }

    assert_eq!(
        names,
        vec![
            "WORKFLOW_STARTED",
            "TASK_STARTED",
            "TASK_COMPLETED",
            "TASK_STARTED",
            "TASK_COMPLETED",
            "WORKFLOW_COMPLETED",
        ]
    );
}

#[tokio::test]
async fn test_lifecycle_events_for_retry_and_failure() {
    let (sink, mut receiver) = ChannelSink::new();
    let engine = WorkflowEngine::new().with_event_sink(Arc::new(sink));

    let tasks = vec![failing_task("doomed", "network unreachable").with_retries(1)];
    let result = engine.run(tasks).await;
    assert!(!result.success);

    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    let names: Vec<&str> = events.iter().map(|e| e.name()).collect();

    assert_eq!(
        names,
        vec![
            "WORKFLOW_STARTED",
            "TASK_STARTED",
            "TASK_RETRY",
            "TASK_FAILED",
            "WORKFLOW_FAILED",
        ]
    );

    match &events[2] {
        WorkflowEvent::TaskRetry {
            task_id,
            retry_count,
            error,
            ..
        } => {
            assert_eq!(task_id, "doomed");
            assert_eq!(*retry_count, 1);
            assert!(error.contains("network"));
        }
        other => panic!("expected TASK_RETRY, got {}", other.name()),
    }

    match &events[3] {
        WorkflowEvent::TaskFailed {
            task_id,
            workflow_id,
            retry_count,
            ..
        } => {
            assert_eq!(task_id, "doomed");
            assert_eq!(workflow_id, &result.workflow_id);
            assert_eq!(*retry_count, 1);
        }
        other => panic!("expected TASK_FAILED, got {}", other.name()),
    }
}

#[tokio::test]
async fn test_task_data_flows_into_result() {
    let tasks = vec![TaskDefinition::new("compute", || async {
        anyhow::Ok(json!({ "rows": 42 }))
    })];

    let result = WorkflowEngine::new().run(tasks).await;
    let task_result = result.task_result("compute").unwrap();

    assert_eq!(task_result.data, Some(json!({ "rows": 42 })));
}
