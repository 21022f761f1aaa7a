mod image;
mod task;

use std::sync::Arc;
use axum::{
    routing::{delete, get, post, put},
    Router,
    extract::DefaultBodyLimit,
};
use tower_http::limit::RequestBodyLimitLayer;
use crate::engine::AutomationEngine;
use crate::services::MetadataStore;

pub use image::{get_image, list_image_tasks, list_images, put_image};
pub use task::{
    clear_completed_tasks, get_overall_progress, get_task, list_tasks, retry_task, start_tasks,
    task_events,
};

// Application state shared between handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: AutomationEngine,
    pub store: Arc<dyn MetadataStore>,
}

pub fn router(state: AppState, max_body_size: usize) -> Router {
    Router::new()
        // Image routes
        .route("/images", get(list_images))
        .route("/images/:image_id", put(put_image).get(get_image))
        .route("/images/:image_id/tasks", get(list_image_tasks))

        // Task routes
        .route("/tasks", post(start_tasks).get(list_tasks))
        .route("/tasks/completed", delete(clear_completed_tasks))
        .route("/tasks/progress", get(get_overall_progress))
        .route("/tasks/events", get(task_events))
        .route("/tasks/:task_id", get(get_task))
        .route("/tasks/:task_id/retry", post(retry_task))

        // Request body limits from config
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_size))

        .with_state(state)
}
