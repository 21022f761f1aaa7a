use std::collections::HashSet;
use async_trait::async_trait;
use rand::Rng;
use tokio::time::{sleep, Duration};
use crate::errors::AutomationResult;
use crate::models::ImageSnapshot;
use super::backend::AutomationBackend;

const BASE_PALETTE: [&str; 4] = ["#FF5733", "#33FF57", "#3357FF", "#F1C40F"];

/// Simulated AI backend. Answers are derived from the image name and
/// description after a configurable delay.
#[derive(Debug, Clone)]
pub struct MockAutomation {
    latency: Duration,
}

impl MockAutomation {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    async fn simulate_call(&self) {
        if !self.latency.is_zero() {
            sleep(self.latency).await;
        }
    }
}

/// Lowercase, trim and dedupe tags, keeping first occurrence order.
/// A non-empty result is marked with `gpt-refined`.
pub fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut cleaned: Vec<String> = tags
        .into_iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
        .collect();

    if !cleaned.is_empty() {
        cleaned.push("gpt-refined".to_string());
    }
    cleaned
}

#[async_trait]
impl AutomationBackend for MockAutomation {
    async fn generate_title(&self, image: &ImageSnapshot, description: &str) -> AutomationResult<String> {
        tracing::debug!("generate_title for image {} with description {:?}", image.id, description);
        self.simulate_call().await;

        let description = description.to_lowercase();
        let title = if description.contains("sunset") {
            "Majestic Sunset Over the Hills"
        } else if description.contains("city") {
            "Vibrant Cityscape at Night"
        } else {
            "A Beautiful Scene"
        };
        Ok(title.to_string())
    }

    async fn extract_tags(&self, image: &ImageSnapshot) -> AutomationResult<Vec<String>> {
        tracing::debug!("extract_tags for image {}", image.id);
        self.simulate_call().await;

        let name = image.name.to_lowercase();
        let extra: &[&str] = if name.contains("nature") {
            &["nature", "outdoors", "scenic"]
        } else if name.contains("animal") {
            &["animal", "wildlife"]
        } else {
            &["general", "photo"]
        };

        Ok(["mock", "sample"]
            .iter()
            .chain(extra)
            .map(|tag| tag.to_string())
            .collect())
    }

    async fn clean_tags(&self, tags: Vec<String>) -> AutomationResult<Vec<String>> {
        tracing::debug!("clean_tags with {} tags", tags.len());
        self.simulate_call().await;
        Ok(clean_tags(tags))
    }

    async fn extract_palette(&self, image: &ImageSnapshot) -> AutomationResult<Vec<String>> {
        tracing::debug!("extract_palette for image {}", image.id);
        self.simulate_call().await;

        let random: u32 = rand::thread_rng().gen_range(0..=0xFFFFFF);
        let mut palette: Vec<String> = BASE_PALETTE.iter().map(|c| c.to_string()).collect();
        palette.push(format!("#{:06X}", random));
        Ok(palette)
    }
}
