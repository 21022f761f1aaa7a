mod image;
mod forms;
mod task;

pub use image::{Image, ImageMetadata, ImageSnapshot};
pub use forms::{StartTasksForm, ImageForm};
pub use task::{AutomationType, Task, TaskResult, TaskStatus, TaskType};
