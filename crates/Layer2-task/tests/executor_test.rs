//! Executor integration tests against the scripted mock provider
//!
//! `cargo test -p inkdraft-task --test executor_test`

use inkdraft_provider::MockProvider;
use inkdraft_task::{
    TaskExecutor, TaskOutput, TaskParams, TaskStatus, TaskStore,
};
use std::sync::Arc;
use std::time::Duration;

fn novel_params(chapter_count: u32) -> TaskParams {
    TaskParams::GenerateAll {
        genre: "fantasy".to_string(),
        theme: "redemption".to_string(),
        protagonist: "Mira".to_string(),
        chapter_count,
        world_settings: None,
    }
}

fn executor_with(provider: MockProvider) -> (TaskStore, TaskExecutor, Arc<MockProvider>) {
    let store = TaskStore::new();
    let provider = Arc::new(provider);
    let executor = TaskExecutor::new(store.clone(), provider.clone());
    (store, executor, provider)
}

/// Poll until the task reaches the wanted status or the deadline passes
async fn wait_for_status(
    store: &TaskStore,
    id: inkdraft_task::TaskId,
    status: TaskStatus,
    timeout: Duration,
) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if let Some(task) = store.get(id).await {
            if task.status == status {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

/// Poll until at least `cursor` phases are checkpointed
async fn wait_for_cursor(
    store: &TaskStore,
    id: inkdraft_task::TaskId,
    cursor: u32,
    timeout: Duration,
) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if let Some(task) = store.get(id).await {
            if task.progress.cursor >= cursor {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    false
}

#[tokio::test]
async fn test_create_returns_pending_with_zero_progress() {
    let (store, _executor, _) = executor_with(MockProvider::new());

    let task = store.create("test", novel_params(3), 0).await.unwrap();
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.progress.percentage, 0);
    assert_eq!(task.progress.cursor, 0);
}

#[tokio::test]
async fn test_generate_all_runs_to_completion() {
    let provider = MockProvider::new()
        .reply("1. Beginning\n2. Middle\n3. End")
        .reply("Mira: determined. Rival: cruel.")
        .reply("The First Step\n\nMira woke early.")
        .reply("The Long Road\n\nThe road was long.")
        .reply("Homecoming\n\nShe returned.");
    let (store, executor, provider) = executor_with(provider);

    let task = store.create("novel", novel_params(3), 0).await.unwrap();
    executor.spawn(task.id);

    assert!(wait_for_status(&store, task.id, TaskStatus::Completed, Duration::from_secs(5)).await);

    let done = store.get(task.id).await.unwrap();
    assert_eq!(done.progress.percentage, 100);
    assert_eq!(done.progress.cursor, 5);
    assert_eq!(provider.call_count(), 5);

    match done.result.unwrap() {
        TaskOutput::Novel {
            outline,
            characters,
            chapters,
        } => {
            assert!(outline.unwrap().contains("Beginning"));
            assert!(characters.unwrap().contains("Mira"));
            assert_eq!(chapters.len(), 3);
            assert_eq!(chapters[0].title, "The First Step");
            assert_eq!(chapters[2].number, 3);
        }
        other => panic!("unexpected output: {:?}", other),
    }
}

#[tokio::test]
async fn test_progress_is_monotone_during_run() {
    let provider = MockProvider::new().with_latency(Duration::from_millis(20));
    let (store, executor, _) = executor_with(provider);

    let task = store.create("novel", novel_params(4), 0).await.unwrap();
    executor.spawn(task.id);

    let mut samples = Vec::new();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let current = store.get(task.id).await.unwrap();
        samples.push(current.progress.percentage);
        if current.status == TaskStatus::Completed || tokio::time::Instant::now() > deadline {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(*samples.last().unwrap(), 100);
    assert!(
        samples.windows(2).all(|w| w[0] <= w[1]),
        "progress went backwards: {:?}",
        samples
    );
    // Mid-run samples must exist between the endpoints
    assert!(samples.iter().any(|&p| p > 0 && p < 100));
}

#[tokio::test]
async fn test_pause_stops_within_one_phase_and_resume_finishes_the_rest() {
    let provider = MockProvider::new().with_latency(Duration::from_millis(20));
    let (store, executor, provider) = executor_with(provider);

    let task = store.create("novel", novel_params(3), 0).await.unwrap();
    executor.spawn(task.id);

    // Let the outline phase land, then pause mid-run
    assert!(wait_for_cursor(&store, task.id, 1, Duration::from_secs(5)).await);
    store.pause(task.id).await.unwrap();

    assert!(wait_for_status(&store, task.id, TaskStatus::Paused, Duration::from_secs(5)).await);

    // Let the phase that was in flight when pause landed drain; its output
    // is kept (pause granularity is one phase, not mid-phase abort)
    tokio::time::sleep(Duration::from_millis(100)).await;
    let calls_at_pause = provider.call_count();
    let cursor_at_pause = store.get(task.id).await.unwrap().progress.cursor;
    assert!(cursor_at_pause >= 1 && cursor_at_pause < 5);

    // No further work happens while paused
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(provider.call_count(), calls_at_pause);
    assert_eq!(
        store.get(task.id).await.unwrap().progress.cursor,
        cursor_at_pause
    );

    // Resume re-enters at the cursor: only the remaining phases run
    executor.resume(task.id).await.unwrap();
    assert!(wait_for_status(&store, task.id, TaskStatus::Completed, Duration::from_secs(5)).await);

    let done = store.get(task.id).await.unwrap();
    assert_eq!(done.progress.cursor, 5);
    assert_eq!(provider.call_count(), 5, "phases were redone after resume");

    match done.result.unwrap() {
        TaskOutput::Novel { chapters, .. } => {
            assert_eq!(chapters.len(), 3, "duplicate or missing chapters");
            let numbers: Vec<u32> = chapters.iter().map(|c| c.number).collect();
            assert_eq!(numbers, vec![1, 2, 3]);
        }
        other => panic!("unexpected output: {:?}", other),
    }
}

#[tokio::test]
async fn test_quick_resume_mid_phase_keeps_one_writer() {
    let provider = MockProvider::new().with_latency(Duration::from_millis(120));
    let (store, executor, _) = executor_with(provider);

    let task = store.create("novel", novel_params(3), 0).await.unwrap();
    executor.spawn(task.id);

    // Pause and resume back-to-back while the first run's LLM call is still
    // in flight; the resumed run must supersede it, not race it
    assert!(wait_for_status(&store, task.id, TaskStatus::Processing, Duration::from_secs(5)).await);
    tokio::time::sleep(Duration::from_millis(30)).await;
    store.pause(task.id).await.unwrap();
    executor.resume(task.id).await.unwrap();

    assert!(wait_for_status(&store, task.id, TaskStatus::Completed, Duration::from_secs(10)).await);

    // Every phase landed exactly once: no double-advanced cursor, no
    // duplicated or missing chapters
    let done = store.get(task.id).await.unwrap();
    assert_eq!(done.progress.cursor, 5);
    match done.result.unwrap() {
        TaskOutput::Novel {
            outline,
            characters,
            chapters,
        } => {
            assert!(outline.is_some());
            assert!(characters.is_some());
            let numbers: Vec<u32> = chapters.iter().map(|c| c.number).collect();
            assert_eq!(numbers, vec![1, 2, 3]);
        }
        other => panic!("unexpected output: {:?}", other),
    }
}

#[tokio::test]
async fn test_failure_marks_failed_and_keeps_partial_result() {
    let provider = MockProvider::new()
        .reply("outline text")
        .fail("model unavailable");
    let (store, executor, _) = executor_with(provider);

    let task = store.create("novel", novel_params(1), 0).await.unwrap();
    executor.spawn(task.id);

    assert!(wait_for_status(&store, task.id, TaskStatus::Failed, Duration::from_secs(5)).await);

    let failed = store.get(task.id).await.unwrap();
    assert!(failed.error.unwrap().contains("model unavailable"));

    // Phase 1 output survives; the failed phase left nothing behind
    match failed.result.unwrap() {
        TaskOutput::Novel {
            outline,
            characters,
            chapters,
        } => {
            assert_eq!(outline.as_deref(), Some("outline text"));
            assert!(characters.is_none());
            assert!(chapters.is_empty());
        }
        other => panic!("unexpected output: {:?}", other),
    }
}

#[tokio::test]
async fn test_failure_in_one_task_does_not_affect_another() {
    let store = TaskStore::new();

    let failing = TaskExecutor::new(
        store.clone(),
        Arc::new(MockProvider::new().fail("boom").with_latency(Duration::from_millis(5))),
    );
    let healthy = TaskExecutor::new(
        store.clone(),
        Arc::new(MockProvider::new().with_latency(Duration::from_millis(5))),
    );

    let task_a = store.create("doomed", novel_params(2), 0).await.unwrap();
    let task_b = store.create("fine", novel_params(2), 0).await.unwrap();

    failing.spawn(task_a.id);
    healthy.spawn(task_b.id);

    assert!(wait_for_status(&store, task_a.id, TaskStatus::Failed, Duration::from_secs(5)).await);
    assert!(
        wait_for_status(&store, task_b.id, TaskStatus::Completed, Duration::from_secs(5)).await
    );

    assert_eq!(store.get(task_b.id).await.unwrap().error, None);
}

#[tokio::test]
async fn test_delete_while_processing_is_rejected() {
    let provider = MockProvider::new().with_latency(Duration::from_millis(30));
    let (store, executor, _) = executor_with(provider);

    let task = store.create("novel", novel_params(3), 0).await.unwrap();
    executor.spawn(task.id);

    assert!(wait_for_status(&store, task.id, TaskStatus::Processing, Duration::from_secs(5)).await);

    let result = store.delete(task.id).await;
    assert!(result.is_err());
    assert!(
        result.unwrap_err().to_string().contains("processing"),
        "error should name the reason"
    );

    // Record unchanged and still retrievable
    let still_there = store.get(task.id).await.unwrap();
    assert_eq!(still_there.status, TaskStatus::Processing);
}

#[tokio::test]
async fn test_spawn_on_processing_task_is_a_noop() {
    let provider = MockProvider::new().with_latency(Duration::from_millis(30));
    let (store, executor, provider) = executor_with(provider);

    let task = store.create("novel", novel_params(2), 0).await.unwrap();
    executor.spawn(task.id);
    assert!(wait_for_status(&store, task.id, TaskStatus::Processing, Duration::from_secs(5)).await);

    // Second spawn loses the claim race and does nothing
    let handle = executor.spawn(task.id);
    let _ = handle.await;

    assert!(wait_for_status(&store, task.id, TaskStatus::Completed, Duration::from_secs(5)).await);
    // 4 phases for 2 chapters: outline, characters, 2 chapters - run once each
    assert_eq!(provider.call_count(), 4);
}

#[tokio::test]
async fn test_custom_workflow_single_phase() {
    let provider = MockProvider::new().reply("a limerick");
    let (store, executor, _) = executor_with(provider);

    let task = store
        .create(
            "one-off",
            TaskParams::Custom {
                prompt: "write a limerick".to_string(),
            },
            0,
        )
        .await
        .unwrap();
    executor.spawn(task.id);

    assert!(wait_for_status(&store, task.id, TaskStatus::Completed, Duration::from_secs(5)).await);

    match store.get(task.id).await.unwrap().result.unwrap() {
        TaskOutput::Text { text } => assert_eq!(text, "a limerick"),
        other => panic!("unexpected output: {:?}", other),
    }
}

#[tokio::test]
async fn test_batch_chapters_number_from_start_chapter() {
    let provider = MockProvider::new()
        .reply("Five\n\nbody five")
        .reply("Six\n\nbody six");
    let (store, executor, _) = executor_with(provider);

    let task = store
        .create(
            "batch",
            TaskParams::BatchGenerateChapters {
                outline: "the outline".to_string(),
                characters: "the cast".to_string(),
                start_chapter: 5,
                count: 2,
            },
            0,
        )
        .await
        .unwrap();
    executor.spawn(task.id);

    assert!(wait_for_status(&store, task.id, TaskStatus::Completed, Duration::from_secs(5)).await);

    match store.get(task.id).await.unwrap().result.unwrap() {
        TaskOutput::Chapters { chapters } => {
            let numbers: Vec<u32> = chapters.iter().map(|c| c.number).collect();
            assert_eq!(numbers, vec![5, 6]);
            assert_eq!(chapters[0].title, "Five");
        }
        other => panic!("unexpected output: {:?}", other),
    }
}
