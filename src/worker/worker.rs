use std::future::Future;
use std::sync::Arc;
use tokio::time::Duration;
use crate::engine::AutomationEngine;
use crate::errors::{AutomationError, AutomationResult};
use crate::models::{Task, TaskResult, TaskType};

const UNKNOWN_ERROR: &str = "Unknown error";

/// Drive one task from `pending` to `completed` or `failed`.
///
/// Failures of any backend or persistence call end up on the task record;
/// nothing is returned to whoever dispatched the task.
pub async fn run_task(engine: AutomationEngine, task: Arc<Task>) {
    let task_id = task.id;
    let task_type = task.task_type;

    engine.update(task_id, Task::begin);
    tracing::debug!("Task {} ({}) in progress for image {}", task_id, task_type, task.image_id);

    // Run the pipeline in its own task so a panicking backend fails the task
    // instead of leaving it in progress
    let pipeline_engine = engine.clone();
    let outcome = match tokio::spawn(async move { execute(&pipeline_engine, &task).await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Task {} panicked: {}", task_id, e);
            Err(AutomationError::TaskPanic(e.to_string()))
        }
    };

    match outcome {
        Ok(result) => {
            tracing::info!("Task {} ({}) completed successfully", task_id, task_type);
            engine.update(task_id, |task| task.complete(result));
        }
        Err(e) => {
            tracing::error!("Task {} ({}) failed: {}", task_id, task_type, e);
            let message = failure_message(&e);
            engine.update(task_id, |task| task.fail(message));
        }
    }
}

// Inputs always come from the creation-time snapshot, never the live image
async fn execute(engine: &AutomationEngine, task: &Task) -> AutomationResult<TaskResult> {
    let backend = engine.backend();
    let store = engine.store();
    let limit = engine.call_timeout();
    let image = &task.image_for_retry;
    let checkpoint = |progress: u8| engine.update(task.id, |task| task.checkpoint(progress));

    match task.task_type {
        TaskType::Title => {
            checkpoint(30);
            let description = task.description_for_retry.as_deref().unwrap_or(&image.name);
            let title = with_timeout(limit, backend.generate_title(image, description)).await?;

            checkpoint(70);
            with_timeout(limit, store.persist_title(&task.image_id, &title)).await?;
            Ok(TaskResult::Title(title))
        }
        TaskType::Tags => {
            checkpoint(20);
            let raw_tags = with_timeout(limit, backend.extract_tags(image)).await?;

            checkpoint(50);
            let tags = with_timeout(limit, backend.clean_tags(raw_tags)).await?;

            checkpoint(70);
            with_timeout(limit, store.persist_tags(&task.image_id, &tags)).await?;
            Ok(TaskResult::Tags(tags))
        }
        TaskType::Palette => {
            checkpoint(30);
            let colors = with_timeout(limit, backend.extract_palette(image)).await?;

            checkpoint(70);
            with_timeout(limit, store.persist_palette(&task.image_id, &colors)).await?;
            Ok(TaskResult::Palette(colors))
        }
    }
}

async fn with_timeout<T>(
    limit: Option<Duration>,
    call: impl Future<Output = AutomationResult<T>>,
) -> AutomationResult<T> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| AutomationError::Timeout(limit))?,
        None => call.await,
    }
}

fn failure_message(err: &AutomationError) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        message
    }
}
