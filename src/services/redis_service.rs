use redis::{Client, AsyncCommands};
use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::errors::{AutomationError, AutomationResult};
use crate::models::Image;
use super::metadata_store::{MetadataField, MetadataStore};

const IMAGE_INDEX_KEY: &str = "images";

// Each image is a hash. `record` holds the image as last saved; the automation
// fields live beside it so concurrent persists of different fields never
// overwrite each other.
const RECORD_FIELD: &str = "record";
const TITLE_FIELD: &str = "title";
const TAGS_FIELD: &str = "tags";
const COLORS_FIELD: &str = "colors";
const UPDATED_AT_FIELD: &str = "updatedAt";

fn image_key(image_id: &str) -> String {
    format!("image:{}", image_id)
}

// Hash entries written by one persist call: its own field plus the timestamp
fn field_entries(field: &MetadataField<'_>, now: DateTime<Utc>) -> AutomationResult<Vec<(&'static str, String)>> {
    let entry = match field {
        MetadataField::Title(title) => (TITLE_FIELD, serde_json::to_string(title)?),
        MetadataField::Tags(tags) => (TAGS_FIELD, serde_json::to_string(tags)?),
        MetadataField::Palette(colors) => (COLORS_FIELD, serde_json::to_string(colors)?),
    };
    Ok(vec![entry, (UPDATED_AT_FIELD, serde_json::to_string(&now)?)])
}

// Rebuild an image from its hash; `None` when the record entry is missing
fn decode_image(mut fields: HashMap<String, String>) -> AutomationResult<Option<Image>> {
    let Some(record) = fields.remove(RECORD_FIELD) else {
        return Ok(None);
    };
    let mut image: Image = serde_json::from_str(&record)?;

    if let Some(title) = fields.get(TITLE_FIELD) {
        image.metadata.title = Some(serde_json::from_str(title)?);
    }
    if let Some(tags) = fields.get(TAGS_FIELD) {
        image.metadata.tags = serde_json::from_str(tags)?;
    }
    if let Some(colors) = fields.get(COLORS_FIELD) {
        image.metadata.colors = serde_json::from_str(colors)?;
    }
    if let Some(updated_at) = fields.get(UPDATED_AT_FIELD) {
        image.metadata.updated_at = Some(serde_json::from_str(updated_at)?);
    }
    Ok(Some(image))
}

pub struct RedisMetadataStore {
    client: Arc<Client>,
}

impl RedisMetadataStore {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    async fn update_field(&self, image_id: &str, field: MetadataField<'_>) -> AutomationResult<()> {
        let key = image_key(image_id);
        let mut conn = self.client.get_async_connection().await?;

        let exists: bool = conn.hexists(&key, RECORD_FIELD).await?;
        if !exists {
            return Err(AutomationError::ImageNotFound(image_id.to_string()));
        }

        // HSET only touches the named fields of the hash
        let entries = field_entries(&field, Utc::now())?;
        let _: () = conn.hset_multiple(&key, &entries).await?;
        tracing::debug!("Updated metadata for image {}", image_id);
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for RedisMetadataStore {
    async fn get_image(&self, image_id: &str) -> AutomationResult<Option<Image>> {
        let mut conn = self.client.get_async_connection().await?;
        let fields: HashMap<String, String> = conn.hgetall(image_key(image_id)).await?;
        decode_image(fields)
    }

    async fn save_image(&self, image: &Image) -> AutomationResult<()> {
        let key = image_key(&image.id);
        let record = serde_json::to_string(image)?;
        let mut conn = self.client.get_async_connection().await?;

        // Replacing the record also drops field updates made to the old one
        let _: () = redis::pipe()
            .atomic()
            .del(&key)
            .ignore()
            .hset(&key, RECORD_FIELD, record)
            .ignore()
            .sadd(IMAGE_INDEX_KEY, &image.id)
            .ignore()
            .query_async(&mut conn)
            .await?;
        tracing::debug!("Saved image {}", image.id);
        Ok(())
    }

    async fn list_images(&self) -> AutomationResult<Vec<Image>> {
        let mut conn = self.client.get_async_connection().await?;
        let mut ids: Vec<String> = conn.smembers(IMAGE_INDEX_KEY).await?;
        ids.sort();

        let mut images = Vec::with_capacity(ids.len());
        for id in ids {
            let fields: HashMap<String, String> = conn.hgetall(image_key(&id)).await?;
            match decode_image(fields)? {
                Some(image) => images.push(image),
                None => tracing::warn!("Image {} is indexed but has no record", id),
            }
        }
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

impl Clone for RedisMetadataStore {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone()
        }
    }
}
