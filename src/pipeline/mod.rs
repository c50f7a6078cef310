//! Run orchestration
//!
//! A run moves through a fixed sequence of stages:
//!
//! 1. **Content**: one call to the [`ContentGenerator`]. Any failure ends
//!    the run as `failed` with nothing written.
//! 2. **Archive**: the article is written locally; failures are logged only.
//! 3. **Images**: one call to the [`ImageGenerator`]. A failure leaves the
//!    run with no images and never aborts it.
//! 4. **Upload**: each asset is uploaded on its own; a failed asset is
//!    dropped from the record. When enabled, `org`/`card`/`cover` PNG
//!    renditions are uploaded beside it on a best-effort basis.
//! 5. **Persist**: the record is written, retried with backoff on transient
//!    errors. Exhaustion ends the run as `failed`.
//!
//! Only the persist stage is retried. The stage currently executing is
//! published on a [`watch`] channel so a signal handler can report it.

mod record;

pub use record::{Persona, PersonaPicker, assemble_record};

use crate::archive::LocalArchive;
use crate::config::{Config, RetryConfig};
use crate::content::ContentGenerator;
use crate::error::{Error, Result};
use crate::images::{ImageFormat, ImageGenerator, image_prompt, render_all};
use crate::records::RecordStore;
use crate::retry::with_retry;
use crate::storage::{ObjectStore, object_key, rendition_key};
use crate::types::{
    Article, GenerationRequest, ImageAsset, RecordStatus, Rendition, RunResult, RunState,
    RunStatus, Stage, UploadedImage,
};
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::Instrument;

/// Orchestrator for one or more sequential runs
///
/// Collaborators are held behind their capability traits so any backend (or
/// a test double) can be plugged in.
pub struct Pipeline {
    content: Arc<dyn ContentGenerator>,
    images: Arc<dyn ImageGenerator>,
    objects: Arc<dyn ObjectStore>,
    records: Arc<dyn RecordStore>,
    archive: LocalArchive,
    persona: PersonaPicker,
    persist_retry: RetryConfig,
    key_prefix: String,
    renditions: bool,
    stage_tx: watch::Sender<Stage>,
}

impl Pipeline {
    /// Create a pipeline from its collaborators and the run configuration
    pub fn new(
        content: Arc<dyn ContentGenerator>,
        images: Arc<dyn ImageGenerator>,
        objects: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
        config: &Config,
    ) -> Self {
        let (stage_tx, _) = watch::channel(Stage::Idle);
        Self {
            content,
            images,
            objects,
            records,
            archive: LocalArchive::new(&config.archive),
            persona: PersonaPicker::random(config.persona.clone()),
            persist_retry: config.persist_retry.clone(),
            key_prefix: config.object_store.key_prefix().to_string(),
            renditions: config.images.renditions,
            stage_tx,
        }
    }

    /// Replace the persona picker
    pub fn with_persona_picker(mut self, picker: PersonaPicker) -> Self {
        self.persona = picker;
        self
    }

    /// Watch the stage currently executing
    pub fn subscribe(&self) -> watch::Receiver<Stage> {
        self.stage_tx.subscribe()
    }

    /// Stage currently executing
    pub fn current_stage(&self) -> Stage {
        *self.stage_tx.borrow()
    }

    fn enter(&self, stage: Stage) {
        self.stage_tx.send_replace(stage);
        if stage != Stage::Done {
            tracing::debug!(stage = %stage, "entering stage");
        }
    }

    /// Execute one run
    ///
    /// Never returns an error: every outcome, including a failed run, is
    /// described by the [`RunResult`].
    pub async fn run(&self, request: &GenerationRequest) -> RunResult {
        let span = tracing::info_span!("run", run_id = %request.run_id);
        self.execute(request).instrument(span).await
    }

    async fn execute(&self, request: &GenerationRequest) -> RunResult {
        tracing::info!(
            topic = request.topic.as_deref().unwrap_or("<service choice>"),
            images = request.image_count,
            content = self.content.name(),
            images_backend = self.images.name(),
            object_store = self.objects.name(),
            record_store = self.records.name(),
            "run started"
        );

        let mut result = RunResult {
            run_id: request.run_id.clone(),
            status: RunStatus::Failed,
            state: RunState::Start,
            record_id: None,
            images_requested: request.image_count,
            images_generated: 0,
            images_uploaded: 0,
            failed_stage: None,
            error: None,
        };

        // Content
        self.enter(Stage::Content);
        let article = match self.content.generate(request.topic.as_deref()).await {
            Ok(article) => article,
            Err(e) => {
                tracing::error!(
                    stage = %Stage::Content,
                    error = %e,
                    code = e.error_code(),
                    "content generation failed, aborting run"
                );
                return self.finish(result, Some((Stage::Content, e)));
            }
        };
        result.state = RunState::ContentGenerated;
        tracing::info!(title = %article.title, chars = article.body.chars().count(), "article generated");

        // Archive
        self.enter(Stage::Archive);
        if let Err(e) = self.archive.write(&article, request.requested_at).await {
            tracing::warn!(stage = %Stage::Archive, error = %e, "local archive write failed");
        }

        // Images
        self.enter(Stage::Images);
        let mut assets = self.generate_images(&article, request.image_count).await;
        assets.sort_by_key(|a| a.index);
        result.images_generated = assets.len() as u32;
        result.state = if assets.is_empty() {
            RunState::ImagesSkipped
        } else {
            RunState::ImagesGenerated
        };

        // Upload
        self.enter(Stage::Upload);
        let mut uploaded = Vec::with_capacity(assets.len());
        for asset in &assets {
            match self.upload(request, asset).await {
                Ok(image) => {
                    tracing::info!(index = image.index, key = %image.key, url = %image.url, "image uploaded");
                    uploaded.push(image);
                }
                Err(e) => {
                    tracing::warn!(
                        stage = %Stage::Upload,
                        index = asset.index,
                        error = %e,
                        "image upload failed, dropping image"
                    );
                }
            }
        }
        result.images_uploaded = uploaded.len() as u32;

        // Persist
        self.enter(Stage::Persist);
        let record = assemble_record(request, &article, &uploaded, self.persona.pick(), Utc::now());
        match with_retry(&self.persist_retry, || self.records.write(&record)).await {
            Ok(id) => {
                result.state = RunState::Persisted;
                result.record_id = Some(id);
                result.status = match record.status {
                    RecordStatus::Complete => RunStatus::Success,
                    RecordStatus::Partial => RunStatus::Partial,
                };
                self.finish(result, None)
            }
            Err(e) => {
                result.state = RunState::PersistFailed;
                tracing::error!(
                    stage = %Stage::Persist,
                    error = %e,
                    code = e.error_code(),
                    record_id = %record.id,
                    title = %record.title,
                    image_urls = ?record.image_urls,
                    "record write failed; local archive is the only durable copy"
                );
                self.finish(result, Some((Stage::Persist, e)))
            }
        }
    }

    async fn generate_images(&self, article: &Article, count: u32) -> Vec<ImageAsset> {
        let prompt = image_prompt(article);
        tracing::debug!(prompt = %prompt, count, "requesting images");

        match self.images.generate(&prompt, count).await {
            Ok(assets) => {
                if (assets.len() as u32) < count {
                    tracing::warn!(
                        requested = count,
                        received = assets.len(),
                        "image service returned fewer images than requested"
                    );
                }
                assets
            }
            Err(e) => {
                tracing::warn!(
                    stage = %Stage::Images,
                    error = %e,
                    code = e.error_code(),
                    "image generation failed, continuing without images"
                );
                Vec::new()
            }
        }
    }

    /// Fetch an asset and store it; a fetch error is returned unchanged
    async fn upload(&self, request: &GenerationRequest, asset: &ImageAsset) -> Result<UploadedImage> {
        let bytes = self.images.fetch(asset).await?;

        let format = ImageFormat::sniff(&bytes);
        let key = object_key(&self.key_prefix, &request.run_id, asset.index, format);
        let url = self.objects.put(&key, &bytes, format.content_type()).await?;

        let renditions = if self.renditions {
            self.upload_renditions(request, asset.index, bytes).await
        } else {
            BTreeMap::new()
        };

        Ok(UploadedImage {
            index: asset.index,
            key,
            url,
            renditions,
        })
    }

    /// Render and store the renditions of one image
    ///
    /// Failures only cost the affected renditions; the source image stays.
    async fn upload_renditions(
        &self,
        request: &GenerationRequest,
        index: u32,
        bytes: Vec<u8>,
    ) -> BTreeMap<Rendition, String> {
        let rendered = tokio::task::spawn_blocking(move || render_all(&bytes))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))
            .and_then(|rendered| rendered);

        let rendered = match rendered {
            Ok(rendered) => rendered,
            Err(e) => {
                tracing::warn!(
                    stage = %Stage::Upload,
                    index,
                    error = %e,
                    "could not render image, keeping source only"
                );
                return BTreeMap::new();
            }
        };

        let mut urls = BTreeMap::new();
        for (rendition, png) in rendered {
            let key = rendition_key(&self.key_prefix, &request.run_id, index, rendition);
            match self.objects.put(&key, &png, ImageFormat::Png.content_type()).await {
                Ok(url) => {
                    tracing::debug!(index, rendition = %rendition, url = %url, "rendition uploaded");
                    urls.insert(rendition, url);
                }
                Err(e) => {
                    tracing::warn!(
                        stage = %Stage::Upload,
                        index,
                        rendition = %rendition,
                        key = %key,
                        error = %e,
                        "rendition upload failed"
                    );
                }
            }
        }
        urls
    }

    fn finish(&self, mut result: RunResult, failure: Option<(Stage, Error)>) -> RunResult {
        if let Some((stage, error)) = failure {
            result.status = RunStatus::Failed;
            result.failed_stage = Some(stage);
            result.error = Some(error.to_string());
        }
        self.enter(Stage::Done);

        tracing::info!(
            status = %result.status,
            state = ?result.state,
            record_id = result.record_id.as_deref().unwrap_or("-"),
            images_requested = result.images_requested,
            images_generated = result.images_generated,
            images_uploaded = result.images_uploaded,
            "run finished"
        );
        result
    }
}

#[cfg(test)]
mod tests;
