use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use crate::errors::{AutomationError, AutomationResult};
use crate::models::{Image, ImageMetadata, ImageSnapshot};
use crate::services::{clean_tags, AutomationBackend, MemoryMetadataStore, MetadataStore};
use super::{AutomationEngine, EngineConfig};

pub(crate) const GENERATE_TITLE: &str = "generate_title";
pub(crate) const EXTRACT_TAGS: &str = "extract_tags";
pub(crate) const CLEAN_TAGS: &str = "clean_tags";
pub(crate) const EXTRACT_PALETTE: &str = "extract_palette";

#[derive(Debug, Clone)]
pub(crate) struct BackendCall {
    pub op: &'static str,
    pub image: Option<ImageSnapshot>,
    pub description: Option<String>,
}

#[derive(Clone, Copy)]
enum Behavior {
    Fail,
    Panic,
    Hang,
}

/// Backend double with canned answers, per-operation failure injection and
/// a call log.
#[derive(Default)]
pub(crate) struct ScriptedBackend {
    behaviors: Mutex<HashMap<&'static str, (Behavior, String)>>,
    calls: Mutex<Vec<BackendCall>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(&self, op: &'static str, message: &str) {
        self.set(op, Behavior::Fail, message);
    }

    pub fn panic_on(&self, op: &'static str) {
        self.set(op, Behavior::Panic, "scripted panic");
    }

    pub fn hang(&self, op: &'static str) {
        self.set(op, Behavior::Hang, "");
    }

    pub fn heal(&self, op: &'static str) {
        self.behaviors.lock().unwrap().remove(op);
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn ops(&self) -> HashSet<&'static str> {
        self.calls().iter().map(|call| call.op).collect()
    }

    fn set(&self, op: &'static str, behavior: Behavior, message: &str) {
        self.behaviors.lock().unwrap().insert(op, (behavior, message.to_string()));
    }

    async fn call(
        &self,
        op: &'static str,
        image: Option<&ImageSnapshot>,
        description: Option<&str>,
    ) -> AutomationResult<()> {
        // Give other tasks and observers a chance to run, like a real network call
        tokio::task::yield_now().await;

        self.calls.lock().unwrap().push(BackendCall {
            op,
            image: image.cloned(),
            description: description.map(str::to_string),
        });

        let behavior = self.behaviors.lock().unwrap().get(op).cloned();
        match behavior {
            None => Ok(()),
            Some((Behavior::Fail, message)) => Err(AutomationError::backend(message)),
            Some((Behavior::Panic, message)) => panic!("{}", message),
            Some((Behavior::Hang, _)) => std::future::pending().await,
        }
    }
}

#[async_trait]
impl AutomationBackend for ScriptedBackend {
    async fn generate_title(&self, image: &ImageSnapshot, description: &str) -> AutomationResult<String> {
        self.call(GENERATE_TITLE, Some(image), Some(description)).await?;
        Ok("Majestic Sunset".to_string())
    }

    async fn extract_tags(&self, image: &ImageSnapshot) -> AutomationResult<Vec<String>> {
        self.call(EXTRACT_TAGS, Some(image), None).await?;
        Ok(vec!["Sky".to_string(), "sky".to_string(), " Sunset ".to_string()])
    }

    async fn clean_tags(&self, tags: Vec<String>) -> AutomationResult<Vec<String>> {
        self.call(CLEAN_TAGS, None, None).await?;
        Ok(clean_tags(tags))
    }

    async fn extract_palette(&self, image: &ImageSnapshot) -> AutomationResult<Vec<String>> {
        self.call(EXTRACT_PALETTE, Some(image), None).await?;
        Ok(vec!["#FF5733".to_string(), "#3357FF".to_string()])
    }
}

pub(crate) fn image(id: &str, name: &str) -> Image {
    Image {
        id: id.to_string(),
        name: name.to_string(),
        url: format!("https://cdn.example.com/{}", name),
        size: Some(4096),
        mime_type: Some("image/png".to_string()),
        metadata: ImageMetadata {
            description: Some("original description".to_string()),
            ..ImageMetadata::default()
        },
    }
}

pub(crate) struct Harness {
    pub engine: AutomationEngine,
    pub backend: Arc<ScriptedBackend>,
    pub store: Arc<MemoryMetadataStore>,
}

/// Engine over a scripted backend and an in-memory store that already
/// holds `images`.
pub(crate) async fn harness(images: &[Image], config: EngineConfig) -> Harness {
    let backend = ScriptedBackend::new();
    let store = Arc::new(MemoryMetadataStore::new());
    for image in images {
        store.save_image(image).await.unwrap();
    }
    let engine = AutomationEngine::new(backend.clone(), store.clone(), config);
    Harness { engine, backend, store }
}

/// Wait until no task is pending or in progress.
pub(crate) async fn wait_until_idle(engine: &AutomationEngine) {
    let mut rx = engine.subscribe();
    rx.wait_for(|tasks| tasks.iter().all(|task| !task.status.is_active()))
        .await
        .unwrap();
}
