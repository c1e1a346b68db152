// Job manager tests: registration, phase ordering, failure handling, scheduling

use appserver::jobs::{EVENT_LOG_CAPACITY, JobManager, JobPhase};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_successful_run_emits_phases_in_order() {
    let mut manager = JobManager::new();
    manager
        .register("tick", "Demo tick", "*/1 * * * *", |logger| async move {
            logger.progress("step one");
            logger.statistics(&[("items", "3".into())]);
            Ok("processed 3 items".to_string())
        })
        .unwrap();

    manager.run_now("tick").await.unwrap();

    let phases: Vec<JobPhase> = manager.events().iter().map(|e| e.phase).collect();
    assert_eq!(
        phases,
        vec![
            JobPhase::Started,
            JobPhase::Progress,
            JobPhase::Statistics,
            JobPhase::Success,
            JobPhase::Complete,
        ]
    );
    let events = manager.events();
    assert_eq!(events.last().unwrap().message, "processed 3 items");
}

#[tokio::test]
async fn test_failed_run_emits_fail_then_complete() {
    let mut manager = JobManager::new();
    manager
        .register("flaky", "Always fails", "*/1 * * * *", |_logger| async move {
            Err(anyhow::anyhow!("db offline"))
        })
        .unwrap();

    manager.run_now("flaky").await.unwrap();

    let phases: Vec<JobPhase> = manager.events().iter().map(|e| e.phase).collect();
    assert_eq!(
        phases,
        vec![JobPhase::Started, JobPhase::Fail, JobPhase::Complete]
    );
    let fail = &manager.events()[1];
    assert!(fail.message.contains("db offline"));
    // Complete is emitted even on failure.
    assert_eq!(manager.events().last().unwrap().phase, JobPhase::Complete);
}

#[tokio::test]
async fn test_exactly_one_terminal_phase_per_run() {
    let mut manager = JobManager::new();
    manager
        .register("ok", "Succeeds", "*/1 * * * *", |_| async { Ok("done".into()) })
        .unwrap();
    manager.run_now("ok").await.unwrap();
    manager.run_now("ok").await.unwrap();

    let terminal = manager
        .events()
        .iter()
        .filter(|e| matches!(e.phase, JobPhase::Success | JobPhase::Fail))
        .count();
    assert_eq!(terminal, 2);
}

#[tokio::test]
async fn test_invalid_cron_expression_rejected_at_registration() {
    let mut manager = JobManager::new();
    let result = manager.register("bad", "Bad schedule", "not a cron", |_| async {
        Ok(String::new())
    });
    assert!(result.is_err());
    assert!(manager.job_names().is_empty());
}

#[tokio::test]
async fn test_run_now_unknown_job_is_an_error() {
    let manager = JobManager::new();
    assert!(manager.run_now("ghost").await.is_err());
}

#[tokio::test]
async fn test_five_and_six_field_expressions_accepted() {
    let mut manager = JobManager::new();
    manager
        .register("five", "Five fields", "*/1 * * * *", |_| async {
            Ok(String::new())
        })
        .unwrap();
    manager
        .register("six", "Six fields", "*/30 * * * * *", |_| async {
            Ok(String::new())
        })
        .unwrap();
    assert_eq!(manager.job_names(), vec!["five", "six"]);
}

#[tokio::test]
async fn test_event_log_stays_bounded_across_repeated_runs() {
    let mut manager = JobManager::new();
    manager
        .register("chatty", "Emits several events", "*/1 * * * *", |logger| async move {
            logger.progress("working");
            Ok("done".to_string())
        })
        .unwrap();

    // 200 runs x 4 events each, well past the cap.
    for _ in 0..200 {
        manager.run_now("chatty").await.unwrap();
    }

    let events = manager.events();
    assert_eq!(events.len(), EVENT_LOG_CAPACITY);
    // Oldest entries were dropped, newest survive.
    assert_eq!(events.last().unwrap().phase, JobPhase::Complete);
    assert_eq!(events.last().unwrap().message, "done");
}

#[tokio::test]
async fn test_scheduled_tick_runs_job_and_shutdown_stops_it() {
    let mut manager = JobManager::new();
    manager
        .register("every-second", "Per-second tick", "* * * * * *", |_| async {
            Ok("tick".to_string())
        })
        .unwrap();
    let manager = Arc::new(manager);

    let shutdown = CancellationToken::new();
    let handles = manager.spawn(shutdown.clone());

    tokio::time::sleep(std::time::Duration::from_millis(2200)).await;
    shutdown.cancel();
    for handle in handles {
        handle.await.unwrap();
    }

    let started = manager
        .events()
        .iter()
        .filter(|e| e.phase == JobPhase::Started)
        .count();
    assert!(started >= 1, "expected at least one scheduled run");
}
