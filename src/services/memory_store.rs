use std::collections::HashMap;
use async_trait::async_trait;
use tokio::sync::RwLock;
use crate::errors::{AutomationError, AutomationResult};
use crate::models::Image;
use super::metadata_store::{MetadataField, MetadataStore};

/// Process-local metadata store, for development and tests.
#[derive(Default)]
pub struct MemoryMetadataStore {
    images: RwLock<HashMap<String, Image>>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update_field(&self, image_id: &str, field: MetadataField<'_>) -> AutomationResult<()> {
        let mut images = self.images.write().await;
        let image = images
            .get_mut(image_id)
            .ok_or_else(|| AutomationError::ImageNotFound(image_id.to_string()))?;
        field.apply(image);
        tracing::debug!("Updated metadata for image {}", image_id);
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn get_image(&self, image_id: &str) -> AutomationResult<Option<Image>> {
        Ok(self.images.read().await.get(image_id).cloned())
    }

    async fn save_image(&self, image: &Image) -> AutomationResult<()> {
        self.images.write().await.insert(image.id.clone(), image.clone());
        tracing::debug!("Saved image {}", image.id);
        Ok(())
    }

    async fn list_images(&self) -> AutomationResult<Vec<Image>> {
        let mut images: Vec<Image> = self.images.read().await.values().cloned().collect();
        images.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(images)
    }

    async fn persist_title(&self, image_id: &str, title: &str) -> AutomationResult<()> {
        self.update_field(image_id, MetadataField::Title(title)).await
    }

    async fn persist_tags(&self, image_id: &str, tags: &[String]) -> AutomationResult<()> {
        self.update_field(image_id, MetadataField::Tags(tags)).await
    }

    async fn persist_palette(&self, image_id: &str, colors: &[String]) -> AutomationResult<()> {
        self.update_field(image_id, MetadataField::Palette(colors)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImageMetadata;

    fn image(id: &str) -> Image {
        Image {
            id: id.into(),
            name: format!("{}.png", id),
            url: format!("https://cdn.example.com/{}.png", id),
            size: Some(2048),
            mime_type: Some("image/png".into()),
            metadata: ImageMetadata::default(),
        }
    }

    #[tokio::test]
    async fn persist_updates_field_and_timestamp() {
        let store = MemoryMetadataStore::new();
        store.save_image(&image("img1")).await.unwrap();

        store.persist_title("img1", "Majestic Sunset").await.unwrap();
        store.persist_tags("img1", &["sky".to_string()]).await.unwrap();
        store.persist_palette("img1", &["#FF5733".to_string()]).await.unwrap();

        let stored = store.get_image("img1").await.unwrap().unwrap();
        assert_eq!(stored.metadata.title.as_deref(), Some("Majestic Sunset"));
        assert_eq!(stored.metadata.tags, vec!["sky"]);
        assert_eq!(stored.metadata.colors, vec!["#FF5733"]);
        assert!(stored.metadata.updated_at.is_some());
    }

    #[tokio::test]
    async fn concurrent_persists_keep_every_field() {
        let store = MemoryMetadataStore::new();
        store.save_image(&image("img1")).await.unwrap();
        let tags = vec!["sky".to_string()];
        let colors = vec!["#FF5733".to_string()];

        let (title, tags_result, palette) = tokio::join!(
            store.persist_title("img1", "Majestic Sunset"),
            store.persist_tags("img1", &tags),
            store.persist_palette("img1", &colors),
        );
        title.unwrap();
        tags_result.unwrap();
        palette.unwrap();

        let stored = store.get_image("img1").await.unwrap().unwrap();
        assert_eq!(stored.metadata.title.as_deref(), Some("Majestic Sunset"));
        assert_eq!(stored.metadata.tags, tags);
        assert_eq!(stored.metadata.colors, colors);
    }

    #[tokio::test]
    async fn persist_to_unknown_image_fails() {
        let store = MemoryMetadataStore::new();
        let err = store.persist_title("missing", "x").await.unwrap_err();
        assert!(matches!(err, AutomationError::ImageNotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn lists_images_by_id() {
        let store = MemoryMetadataStore::new();
        store.save_image(&image("b")).await.unwrap();
        store.save_image(&image("a")).await.unwrap();

        let ids: Vec<String> = store.list_images().await.unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
