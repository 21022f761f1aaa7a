//! Task store and dispatcher for image automation jobs.
//!
//! The engine owns the task list. Every mutation replaces the affected
//! `Arc<Task>` with a fresh record, so snapshots handed out earlier never
//! change underneath their holders. Changes are published on a
//! [`tokio::sync::watch`] channel.

mod progress;
#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::sync::watch;
use uuid::Uuid;
use crate::models::{AutomationType, Image, Task, TaskStatus, TaskType};
use crate::services::{AutomationBackend, MetadataStore};
use crate::worker;

pub use progress::overall_progress;

/// Ordered by creation.
pub type TaskList = Vec<Arc<Task>>;

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Upper bound for each backend or persistence call. `None` waits forever.
    pub call_timeout: Option<Duration>,
}

#[derive(Clone)]
pub struct AutomationEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    backend: Arc<dyn AutomationBackend>,
    store: Arc<dyn MetadataStore>,
    tasks: watch::Sender<TaskList>,
    config: EngineConfig,
}

impl AutomationEngine {
    pub fn new(
        backend: Arc<dyn AutomationBackend>,
        store: Arc<dyn MetadataStore>,
        config: EngineConfig,
    ) -> Self {
        let (tasks, _) = watch::channel(TaskList::new());
        Self {
            inner: Arc::new(EngineInner { backend, store, tasks, config }),
        }
    }

    /// Create the task(s) for `image` and dispatch them.
    ///
    /// `AutomationType::All` creates a title, a tags and a palette task, in
    /// that order; only the title task keeps `description`. All new tasks are
    /// in the list as `pending` before any of them is spawned.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_task(
        &self,
        image: &Image,
        automation_type: AutomationType,
        description: Option<String>,
    ) -> Vec<Uuid> {
        let new_tasks: Vec<Arc<Task>> = automation_type
            .expand()
            .into_iter()
            .map(|task_type| {
                let description = match automation_type {
                    AutomationType::All if task_type != TaskType::Title => None,
                    _ => description.clone(),
                };
                Arc::new(Task::new(image, task_type, description))
            })
            .collect();

        self.inner.tasks.send_modify(|tasks| tasks.extend(new_tasks.iter().cloned()));

        for task in &new_tasks {
            tracing::info!("Created {} task {} for image {}", task.task_type, task.id, task.image_id);
            self.dispatch(task.clone());
        }

        new_tasks.iter().map(|task| task.id).collect()
    }

    /// One [`start_task`](Self::start_task) per (image, automation type) pair, image-major.
    pub fn start_batch(
        &self,
        images: &[Image],
        automation_types: &[AutomationType],
        description: Option<String>,
    ) -> Vec<Uuid> {
        images
            .iter()
            .flat_map(|image| {
                automation_types
                    .iter()
                    .flat_map(|automation_type| {
                        self.start_task(image, *automation_type, description.clone())
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Re-run a failed task from its creation-time snapshot.
    ///
    /// Returns `false` without touching anything when the id is unknown or the
    /// task is not `failed`, which also absorbs a second retry of a task that
    /// is already pending again.
    pub fn retry_task(&self, task_id: Uuid) -> bool {
        let mut retried = None;
        self.inner.tasks.send_if_modified(|tasks| {
            match tasks.iter_mut().find(|task| task.id == task_id) {
                Some(slot) if slot.status == TaskStatus::Failed => {
                    let mut task = Task::clone(slot);
                    task.reset_for_retry();
                    task.updated_at = Utc::now();
                    *slot = Arc::new(task);
                    retried = Some(slot.clone());
                    true
                }
                _ => false,
            }
        });

        match retried {
            Some(task) => {
                tracing::info!("Retrying {} task {}", task.task_type, task.id);
                self.dispatch(task);
                true
            }
            None => {
                tracing::debug!("Ignoring retry for task {}: not failed", task_id);
                false
            }
        }
    }

    /// Drop every `completed` task. Returns how many were removed.
    pub fn clear_completed_tasks(&self) -> usize {
        let mut removed = 0;
        self.inner.tasks.send_if_modified(|tasks| {
            let before = tasks.len();
            tasks.retain(|task| task.status != TaskStatus::Completed);
            removed = before - tasks.len();
            removed > 0
        });
        if removed > 0 {
            tracing::info!("Cleared {} completed tasks", removed);
        }
        removed
    }

    pub fn tasks(&self) -> TaskList {
        self.inner.tasks.borrow().clone()
    }

    pub fn task(&self, task_id: Uuid) -> Option<Arc<Task>> {
        self.inner.tasks.borrow().iter().find(|task| task.id == task_id).cloned()
    }

    pub fn tasks_for_image(&self, image_id: &str) -> TaskList {
        self.inner
            .tasks
            .borrow()
            .iter()
            .filter(|task| task.image_id == image_id)
            .cloned()
            .collect()
    }

    /// Observe every change to the task list.
    pub fn subscribe(&self) -> watch::Receiver<TaskList> {
        self.inner.tasks.subscribe()
    }

    pub fn overall_progress(&self) -> f64 {
        overall_progress(&self.inner.tasks.borrow())
    }

    pub(crate) fn backend(&self) -> &dyn AutomationBackend {
        self.inner.backend.as_ref()
    }

    pub(crate) fn store(&self) -> &dyn MetadataStore {
        self.inner.store.as_ref()
    }

    pub(crate) fn call_timeout(&self) -> Option<Duration> {
        self.inner.config.call_timeout
    }

    /// Replace the task record with an updated copy. Only the task's own
    /// execution routine calls this, so updates to one task never race.
    pub(crate) fn update(&self, task_id: Uuid, apply: impl FnOnce(&mut Task)) {
        let updated = self.inner.tasks.send_if_modified(|tasks| {
            match tasks.iter_mut().find(|task| task.id == task_id) {
                Some(slot) => {
                    let mut task = Task::clone(slot);
                    apply(&mut task);
                    task.updated_at = Utc::now();
                    *slot = Arc::new(task);
                    true
                }
                None => false,
            }
        });

        if !updated {
            tracing::warn!("Task {} is no longer in the store", task_id);
        }
    }

    fn dispatch(&self, task: Arc<Task>) {
        tokio::spawn(worker::run_task(self.clone(), task));
    }
}
