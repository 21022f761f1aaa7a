use axum::{
    extract::{Path, State},
    response::Json,
};
use crate::errors::{AppError, AppResult};
use serde_json::{json, Value};
use crate::models::{Image, ImageForm, Task};
use super::AppState;

pub async fn put_image(
    Path(image_id): Path<String>,
    State(state): State<AppState>,
    Json(form): Json<ImageForm>,
) -> AppResult<Json<Image>> {
    if form.name.trim().is_empty() {
        return Err(AppError::Validation("Image name must not be empty".into()));
    }

    let image = Image {
        id: image_id,
        name: form.name,
        url: form.url,
        size: form.size,
        mime_type: form.mime_type,
        metadata: form.metadata,
    };
    state.store.save_image(&image).await?;

    tracing::info!("Registered image {} ({})", image.id, image.name);
    Ok(Json(image))
}

pub async fn get_image(
    Path(image_id): Path<String>,
    State(state): State<AppState>,
) -> AppResult<Json<Image>> {
    let image = state
        .store
        .get_image(&image_id)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Image not found: {}", image_id);
            AppError::NotFound(format!("Image {} not found", image_id))
        })?;
    Ok(Json(image))
}

pub async fn list_images(State(state): State<AppState>) -> AppResult<Json<Vec<Image>>> {
    Ok(Json(state.store.list_images().await?))
}

// Every automation task recorded for one image, oldest first
pub async fn list_image_tasks(
    Path(image_id): Path<String>,
    State(state): State<AppState>,
) -> Json<Value> {
    let tasks = state.engine.tasks_for_image(&image_id);
    let views: Vec<&Task> = tasks.iter().map(|task| task.as_ref()).collect();
    Json(json!(views))
}
