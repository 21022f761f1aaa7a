use async_trait::async_trait;
use crate::errors::AutomationResult;
use crate::models::ImageSnapshot;

/// The AI-style capabilities the engine fans work out to.
///
/// Every call may fail; the engine records the failure on the task.
#[async_trait]
pub trait AutomationBackend: Send + Sync {
    async fn generate_title(&self, image: &ImageSnapshot, description: &str) -> AutomationResult<String>;

    async fn extract_tags(&self, image: &ImageSnapshot) -> AutomationResult<Vec<String>>;

    /// Dedupe and normalize raw tags.
    async fn clean_tags(&self, tags: Vec<String>) -> AutomationResult<Vec<String>>;

    /// Hex color codes, e.g. `#FF5733`.
    async fn extract_palette(&self, image: &ImageSnapshot) -> AutomationResult<Vec<String>>;
}
