use std::sync::Arc;
use crate::models::Task;

/// Mean progress of the tasks still in flight.
///
/// Finished tasks are ignored so completed or cleared work cannot skew the
/// number. An empty list is 0; a list with nothing active is 100.
pub fn overall_progress(tasks: &[Arc<Task>]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }

    let (total, active) = tasks
        .iter()
        .filter(|task| task.status.is_active())
        .fold((0u32, 0u32), |(total, active), task| {
            (total + u32::from(task.progress), active + 1)
        });

    if active == 0 {
        return 100.0;
    }
    f64::from(total) / f64::from(active)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Image, ImageMetadata, TaskStatus, TaskType};

    fn task(status: TaskStatus, progress: u8) -> Arc<Task> {
        let image = Image {
            id: "img1".into(),
            name: "sunset.png".into(),
            url: "https://cdn.example.com/sunset.png".into(),
            size: None,
            mime_type: None,
            metadata: ImageMetadata::default(),
        };
        let mut task = Task::new(&image, TaskType::Title, None);
        task.status = status;
        task.progress = progress;
        Arc::new(task)
    }

    #[test]
    fn empty_list_is_zero() {
        assert_eq!(overall_progress(&[]), 0.0);
    }

    #[test]
    fn nothing_active_is_done() {
        let tasks = [task(TaskStatus::Completed, 100), task(TaskStatus::Failed, 40)];
        assert_eq!(overall_progress(&tasks), 100.0);
    }

    #[test]
    fn averages_only_active_tasks() {
        let tasks = [task(TaskStatus::InProgress, 50), task(TaskStatus::Pending, 0)];
        assert_eq!(overall_progress(&tasks), 25.0);

        let mixed = [
            task(TaskStatus::Completed, 100),
            task(TaskStatus::Failed, 30),
            task(TaskStatus::InProgress, 70),
        ];
        assert_eq!(overall_progress(&mixed), 70.0);
    }
}
