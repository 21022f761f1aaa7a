use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;
use super::image::{Image, ImageSnapshot};

/// A capability that can run as a task of its own.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Title,
    Tags,
    Palette,
}

impl TaskType {
    /// Expansion order of [`AutomationType::All`].
    pub const ALL: [TaskType; 3] = [TaskType::Title, TaskType::Tags, TaskType::Palette];
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Title => write!(f, "title"),
            Self::Tags => write!(f, "tags"),
            Self::Palette => write!(f, "palette"),
        }
    }
}

/// What a caller asks for: one capability, or every capability at once.
///
/// `All` only exists at the request boundary. The dispatcher expands it into
/// one [`Task`] per [`TaskType`], so a stored task is always concrete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AutomationTypeRepr", into = "AutomationTypeRepr")]
pub enum AutomationType {
    Concrete(TaskType),
    All,
}

impl AutomationType {
    pub fn expand(self) -> Vec<TaskType> {
        match self {
            Self::Concrete(task_type) => vec![task_type],
            Self::All => TaskType::ALL.to_vec(),
        }
    }
}

impl From<TaskType> for AutomationType {
    fn from(task_type: TaskType) -> Self {
        Self::Concrete(task_type)
    }
}

// Flat wire form: "title" | "tags" | "palette" | "all"
#[derive(Serialize, Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum AutomationTypeRepr {
    Title,
    Tags,
    Palette,
    All,
}

impl From<AutomationTypeRepr> for AutomationType {
    fn from(repr: AutomationTypeRepr) -> Self {
        match repr {
            AutomationTypeRepr::Title => Self::Concrete(TaskType::Title),
            AutomationTypeRepr::Tags => Self::Concrete(TaskType::Tags),
            AutomationTypeRepr::Palette => Self::Concrete(TaskType::Palette),
            AutomationTypeRepr::All => Self::All,
        }
    }
}

impl From<AutomationType> for AutomationTypeRepr {
    fn from(automation_type: AutomationType) -> Self {
        match automation_type {
            AutomationType::Concrete(TaskType::Title) => Self::Title,
            AutomationType::Concrete(TaskType::Tags) => Self::Tags,
            AutomationType::Concrete(TaskType::Palette) => Self::Palette,
            AutomationType::All => Self::All,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Pending and in-progress tasks still have work in flight.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum TaskResult {
    Title(String),
    Tags(Vec<String>),
    Palette(Vec<String>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub image_id: String,
    pub image_name: String,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub progress: u8,  // 0-100
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub image_for_retry: ImageSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_for_retry: Option<String>,
}

impl Task {
    pub fn new(image: &Image, task_type: TaskType, description: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            image_id: image.id.clone(),
            image_name: image.name.clone(),
            task_type,
            status: TaskStatus::Pending,
            progress: 0,
            error: None,
            result: None,
            created_at: now,
            updated_at: now,
            image_for_retry: ImageSnapshot::from(image),
            description_for_retry: description,
        }
    }

    pub(crate) fn begin(&mut self) {
        self.status = TaskStatus::InProgress;
        self.progress = 10;
    }

    // Progress never moves backwards within a run
    pub(crate) fn checkpoint(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(100));
    }

    pub(crate) fn complete(&mut self, result: TaskResult) {
        self.status = TaskStatus::Completed;
        self.progress = 100;
        self.error = None;
        self.result = Some(result);
    }

    // Progress stays at the last checkpoint reached
    pub(crate) fn fail(&mut self, error: String) {
        self.status = TaskStatus::Failed;
        self.error = Some(error);
        self.result = None;
    }

    pub(crate) fn reset_for_retry(&mut self) {
        self.status = TaskStatus::Pending;
        self.progress = 0;
        self.error = None;
        self.result = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageMetadata;

    fn image() -> Image {
        Image {
            id: "img1".into(),
            name: "sunset.png".into(),
            url: "https://cdn.example.com/sunset.png".into(),
            size: None,
            mime_type: None,
            metadata: ImageMetadata::default(),
        }
    }

    #[test]
    fn automation_type_uses_flat_wire_names() {
        let parsed: Vec<AutomationType> =
            serde_json::from_str(r#"["title","tags","palette","all"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                AutomationType::Concrete(TaskType::Title),
                AutomationType::Concrete(TaskType::Tags),
                AutomationType::Concrete(TaskType::Palette),
                AutomationType::All,
            ]
        );
        assert_eq!(serde_json::to_string(&AutomationType::All).unwrap(), r#""all""#);
        assert!(serde_json::from_str::<AutomationType>(r#""everything""#).is_err());
    }

    #[test]
    fn all_expands_in_fixed_order() {
        assert_eq!(
            AutomationType::All.expand(),
            vec![TaskType::Title, TaskType::Tags, TaskType::Palette]
        );
        assert_eq!(AutomationType::from(TaskType::Tags).expand(), vec![TaskType::Tags]);
    }

    #[test]
    fn new_task_is_pending_with_snapshot() {
        let task = Task::new(&image(), TaskType::Title, Some("a sunset".into()));
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0);
        assert_eq!(task.error, None);
        assert_eq!(task.image_for_retry.id, "img1");
        assert_eq!(task.description_for_retry.as_deref(), Some("a sunset"));
    }

    #[test]
    fn status_serializes_kebab_case() {
        assert_eq!(serde_json::to_string(&TaskStatus::InProgress).unwrap(), r#""in-progress""#);
    }

    #[test]
    fn checkpoint_is_monotonic_and_fail_keeps_progress() {
        let mut task = Task::new(&image(), TaskType::Tags, None);
        task.begin();
        task.checkpoint(50);
        task.checkpoint(20);
        assert_eq!(task.progress, 50);

        task.fail("boom".into());
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.progress, 50);

        task.reset_for_retry();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.progress, 0);
        assert_eq!(task.error, None);
    }
}
