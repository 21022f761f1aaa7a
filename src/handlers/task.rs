use std::convert::Infallible;
use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
    http::StatusCode,
};
use futures::stream::{self, Stream, StreamExt};
use serde_json::{json, Value};
use uuid::Uuid;
use crate::engine::TaskList;
use crate::errors::{AppError, AppResult};
use crate::models::{Image, StartTasksForm, Task};
use super::AppState;

fn task_views(tasks: &TaskList) -> Vec<&Task> {
    tasks.iter().map(|task| task.as_ref()).collect()
}

pub async fn start_tasks(
    State(state): State<AppState>,
    Json(form): Json<StartTasksForm>,
) -> AppResult<(StatusCode, Json<Value>)> {
    if form.image_ids.is_empty() {
        return Err(AppError::Validation("No images selected".into()));
    }
    if form.task_types.is_empty() {
        return Err(AppError::Validation("No automation types selected".into()));
    }

    // Resolve every image first so a bad id starts nothing
    let mut images: Vec<Image> = Vec::with_capacity(form.image_ids.len());
    for image_id in &form.image_ids {
        let image = state
            .store
            .get_image(image_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Image not found: {}", image_id);
                AppError::NotFound(format!("Image {} not found", image_id))
            })?;
        images.push(image);
    }

    let task_ids = state.engine.start_batch(&images, &form.task_types, form.description);
    tracing::debug!("Started {} tasks for {} images", task_ids.len(), images.len());

    Ok((StatusCode::ACCEPTED, Json(json!({ "taskIds": task_ids }))))
}

pub async fn list_tasks(State(state): State<AppState>) -> Json<Value> {
    let tasks = state.engine.tasks();
    Json(json!(task_views(&tasks)))
}

pub async fn get_task(
    Path(task_id): Path<Uuid>,
    State(state): State<AppState>,
) -> AppResult<Json<Task>> {
    let task = state.engine.task(task_id).ok_or_else(|| {
        tracing::warn!("Task not found: {}", task_id);
        AppError::NotFound(format!("Task {} not found", task_id))
    })?;
    Ok(Json(Task::clone(&task)))
}

pub async fn retry_task(
    Path(task_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Json<Value> {
    let retried = state.engine.retry_task(task_id);
    Json(json!({ "retried": retried }))
}

pub async fn clear_completed_tasks(State(state): State<AppState>) -> Json<Value> {
    let removed = state.engine.clear_completed_tasks();
    Json(json!({ "removed": removed }))
}

pub async fn get_overall_progress(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "progress": state.engine.overall_progress() }))
}

// Streams the full task list once on connect and again after every change
pub async fn task_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.engine.subscribe();
    let initial = state.engine.tasks();

    let updates = stream::unfold(rx, |mut rx| async move {
        rx.changed().await.ok()?;
        let tasks = rx.borrow_and_update().clone();
        Some((tasks, rx))
    });

    let events = stream::once(async move { initial })
        .chain(updates)
        .filter_map(|tasks| async move {
            match Event::default().event("tasks").json_data(task_views(&tasks)) {
                Ok(event) => Some(Ok(event)),
                Err(e) => {
                    tracing::error!("Failed to encode task event: {}", e);
                    None
                }
            }
        });

    Sse::new(events).keep_alive(KeepAlive::default())
}
