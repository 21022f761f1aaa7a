use async_trait::async_trait;
use chrono::Utc;
use crate::errors::AutomationResult;
use crate::models::Image;

/// Key-value image records keyed by image id.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get_image(&self, image_id: &str) -> AutomationResult<Option<Image>>;

    async fn save_image(&self, image: &Image) -> AutomationResult<()>;

    async fn list_images(&self) -> AutomationResult<Vec<Image>>;

    async fn persist_title(&self, image_id: &str, title: &str) -> AutomationResult<()>;

    async fn persist_tags(&self, image_id: &str, tags: &[String]) -> AutomationResult<()>;

    async fn persist_palette(&self, image_id: &str, colors: &[String]) -> AutomationResult<()>;
}

// Shared by the store implementations: which metadata field a persist call writes
pub(crate) enum MetadataField<'a> {
    Title(&'a str),
    Tags(&'a [String]),
    Palette(&'a [String]),
}

impl MetadataField<'_> {
    pub(crate) fn apply(&self, image: &mut Image) {
        match self {
            MetadataField::Title(title) => image.metadata.title = Some(title.to_string()),
            MetadataField::Tags(tags) => image.metadata.tags = tags.to_vec(),
            MetadataField::Palette(colors) => image.metadata.colors = colors.to_vec(),
        }
        image.metadata.updated_at = Some(Utc::now());
    }
}
