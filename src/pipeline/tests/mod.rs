// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use crate::config::{ArchiveConfig, FsStoreConfig, ObjectStoreBackend, PersonaConfig};
use crate::storage::FsObjectStore;
use crate::types::{BlogRecord, ImageSource, RunId};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;


/// PNG signature only; not decodable, so no renditions are produced
const PNG: &[u8] = b"\x89PNG\r\n\x1a\n-fake-image";

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

struct FakeContent {
    article: Option<Article>,
    calls: AtomicU32,
}

impl FakeContent {
    fn returning(title: &str, body: &str) -> Arc<Self> {
        Arc::new(Self {
            article: Some(Article {
                title: title.into(),
                body: body.into(),
                tags: Default::default(),
                description: None,
                keywords: vec!["sleep".into()],
            }),
            calls: AtomicU32::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            article: None,
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl ContentGenerator for FakeContent {
    async fn generate(&self, _topic: Option<&str>) -> Result<Article> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.article.clone().ok_or(Error::Upstream {
            service: "content-api",
            status: 500,
            body: "workflow crashed".into(),
        })
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct FakeImages {
    assets: Option<Vec<ImageAsset>>,
    unfetchable: HashSet<u32>,
    calls: AtomicU32,
}

impl FakeImages {
    fn with_indices(indices: &[u32]) -> Arc<Self> {
        Self::build(indices, &[])
    }

    fn build(indices: &[u32], unfetchable: &[u32]) -> Arc<Self> {
        Self::serving(indices, unfetchable, PNG.to_vec())
    }

    /// Assets that decode as real 64×48 images
    fn decodable(indices: &[u32]) -> Arc<Self> {
        let img = image::RgbImage::from_pixel(64, 48, image::Rgb([90, 160, 220]));
        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        Self::serving(indices, &[], png.into_inner())
    }

    fn serving(indices: &[u32], unfetchable: &[u32], bytes: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            assets: Some(
                indices
                    .iter()
                    .map(|&index| ImageAsset {
                        index,
                        source: ImageSource::Bytes(bytes.clone()),
                    })
                    .collect(),
            ),
            unfetchable: unfetchable.iter().copied().collect(),
            calls: AtomicU32::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            assets: None,
            unfetchable: HashSet::new(),
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate(&self, _prompt: &str, _count: u32) -> Result<Vec<ImageAsset>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.assets.clone().ok_or(Error::Timeout {
            service: "image-api",
            after: Duration::from_secs(300),
        })
    }

    async fn fetch(&self, asset: &ImageAsset) -> Result<Vec<u8>> {
        if self.unfetchable.contains(&asset.index) {
            return Err(Error::Upstream {
                service: "image-download",
                status: 404,
                body: "gone".into(),
            });
        }
        match &asset.source {
            ImageSource::Bytes(b) => Ok(b.clone()),
            ImageSource::Url(_) => unreachable!("fake only produces inline assets"),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Default)]
struct FakeObjects {
    failing_indices: HashSet<u32>,
    puts: Mutex<Vec<String>>,
}

impl FakeObjects {
    fn failing_on(indices: &[u32]) -> Arc<Self> {
        Arc::new(Self {
            failing_indices: indices.iter().copied().collect(),
            puts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ObjectStore for FakeObjects {
    async fn put(&self, key: &str, _bytes: &[u8], content_type: &str) -> Result<String> {
        assert_eq!(content_type, "image/png");
        self.puts.lock().unwrap().push(key.to_string());
        let failing = self
            .failing_indices
            .iter()
            .any(|i| key.ends_with(&format!("/{i}.png")));
        if failing {
            return Err(Error::Upload {
                key: key.to_string(),
                reason: "access denied".into(),
            });
        }
        Ok(self.public_url(key))
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://cdn.test/{key}")
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Fails the first `transient_failures` writes, or every write if `permanent`
#[derive(Default)]
struct FakeRecords {
    transient_failures: u32,
    permanent: bool,
    calls: AtomicU32,
    written: Mutex<Vec<BlogRecord>>,
}

impl FakeRecords {
    fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn flaky(transient_failures: u32) -> Arc<Self> {
        Arc::new(Self {
            transient_failures,
            ..Self::default()
        })
    }

    fn rejecting() -> Arc<Self> {
        Arc::new(Self {
            permanent: true,
            ..Self::default()
        })
    }

    fn written(&self) -> Vec<BlogRecord> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for FakeRecords {
    async fn write(&self, record: &BlogRecord) -> Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.permanent {
            return Err(Error::Write {
                id: record.id.clone(),
                reason: "validation failed".into(),
                transient: false,
            });
        }
        if call < self.transient_failures {
            return Err(Error::Write {
                id: record.id.clone(),
                reason: "throughput exceeded".into(),
                transient: true,
            });
        }
        self.written.lock().unwrap().push(record.clone());
        Ok(record.id.clone())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_config(archive_dir: &Path) -> Config {
    let mut config = Config::default();
    config.archive = ArchiveConfig {
        enabled: true,
        dir: archive_dir.to_path_buf(),
    };
    config.persona = PersonaConfig {
        authors: vec!["Emma".into()],
        colors: vec!["#DAFFF6".into()],
        avatar_url_template: "/avatars/{author}.webp".into(),
    };
    config.persist_retry = RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        backoff_multiplier: 2.0,
        jitter: false,
    };
    config
}

fn request(image_count: u32) -> GenerationRequest {
    GenerationRequest::new(Some("sleep".into()), image_count)
}

fn archived_files(dir: &Path) -> usize {
    walk(dir)
        .into_iter()
        .filter(|p| p.extension().is_some_and(|e| e == "md"))
        .count()
}

fn walk(dir: &Path) -> Vec<std::path::PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(|e| e.ok())
        .flat_map(|e| {
            let path = e.path();
            if path.is_dir() { walk(&path) } else { vec![path] }
        })
        .collect()
}

fn url_for(req: &GenerationRequest, index: u32) -> String {
    format!("https://cdn.test/images/blogs/{}/{index}.png", req.run_id)
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn two_images_both_uploaded_gives_complete_record() {
    let dir = tempfile::tempdir().unwrap();
    let records = FakeRecords::ok();
    let pipeline = Pipeline::new(
        FakeContent::returning("X", "Y"),
        FakeImages::with_indices(&[0, 1]),
        Arc::new(FakeObjects::default()),
        records.clone(),
        &test_config(dir.path()),
    );
    let req = request(2);

    let result = pipeline.run(&req).await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(result.state, RunState::Persisted);
    assert_eq!(result.record_id.as_deref(), Some(req.run_id.as_str()));
    assert_eq!(result.error, None);

    let written = records.written();
    assert_eq!(written.len(), 1);
    let record = &written[0];
    assert_eq!(record.title, "X");
    assert_eq!(record.body, "Y");
    assert_eq!(record.image_urls, vec![url_for(&req, 0), url_for(&req, 1)]);
    assert_eq!(record.status, RecordStatus::Complete);
    assert_eq!(record.author, "Emma");
    assert_eq!(record.avatar, "/avatars/Emma.webp");

    assert_eq!(archived_files(dir.path()), 1);
}

#[tokio::test]
async fn content_failure_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let images = FakeImages::with_indices(&[0]);
    let objects = Arc::new(FakeObjects::default());
    let records = FakeRecords::ok();
    let pipeline = Pipeline::new(
        FakeContent::failing(),
        images.clone(),
        objects.clone(),
        records.clone(),
        &test_config(dir.path()),
    );

    let result = pipeline.run(&request(1)).await;

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.state, RunState::Start);
    assert_eq!(result.failed_stage, Some(Stage::Content));
    assert!(result.error.as_deref().unwrap().contains("workflow crashed"));
    assert_eq!(result.record_id, None);

    assert_eq!(images.calls.load(Ordering::SeqCst), 0);
    assert!(objects.puts.lock().unwrap().is_empty());
    assert_eq!(records.calls.load(Ordering::SeqCst), 0);
    assert_eq!(archived_files(dir.path()), 0);
}

#[tokio::test]
async fn some_uploads_failing_gives_partial_with_remaining_urls() {
    let dir = tempfile::tempdir().unwrap();
    let records = FakeRecords::ok();
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::with_indices(&[0, 1, 2]),
        FakeObjects::failing_on(&[1]),
        records.clone(),
        &test_config(dir.path()),
    );
    let req = request(3);

    let result = pipeline.run(&req).await;

    assert_eq!(result.status, RunStatus::Partial);
    assert_eq!(result.images_generated, 3);
    assert_eq!(result.images_uploaded, 2);

    let record = &records.written()[0];
    assert_eq!(record.image_urls, vec![url_for(&req, 0), url_for(&req, 2)]);
    assert_eq!(record.status, RecordStatus::Partial);
}

#[tokio::test]
async fn all_uploads_failing_still_writes_record() {
    let dir = tempfile::tempdir().unwrap();
    let records = FakeRecords::ok();
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::with_indices(&[0, 1]),
        FakeObjects::failing_on(&[0, 1]),
        records.clone(),
        &test_config(dir.path()),
    );

    let result = pipeline.run(&request(2)).await;

    assert_eq!(result.status, RunStatus::Partial);
    assert_eq!(result.state, RunState::Persisted);
    assert_eq!(result.images_uploaded, 0);

    let written = records.written();
    assert_eq!(written.len(), 1);
    assert!(written[0].image_urls.is_empty());
    assert_eq!(written[0].status, RecordStatus::Partial);
}

#[tokio::test]
async fn image_stage_failure_degrades_to_partial() {
    let dir = tempfile::tempdir().unwrap();
    let images = FakeImages::failing();
    let records = FakeRecords::ok();
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        images.clone(),
        Arc::new(FakeObjects::default()),
        records.clone(),
        &test_config(dir.path()),
    );

    let result = pipeline.run(&request(1)).await;

    assert_eq!(result.status, RunStatus::Partial);
    assert_eq!(result.state, RunState::Persisted);
    assert_eq!(result.images_generated, 0);
    assert_eq!(images.calls.load(Ordering::SeqCst), 1, "image stage is not retried");
    assert!(records.written()[0].image_urls.is_empty());
}

#[tokio::test]
async fn fewer_assets_than_requested_is_partial() {
    let dir = tempfile::tempdir().unwrap();
    let records = FakeRecords::ok();
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::with_indices(&[0, 1]),
        Arc::new(FakeObjects::default()),
        records.clone(),
        &test_config(dir.path()),
    );

    let result = pipeline.run(&request(3)).await;

    assert_eq!(result.status, RunStatus::Partial);
    assert_eq!(records.written()[0].image_urls.len(), 2);
}

#[tokio::test]
async fn unfetchable_asset_counts_as_failed_upload() {
    let dir = tempfile::tempdir().unwrap();
    let objects = Arc::new(FakeObjects::default());
    let records = FakeRecords::ok();
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::build(&[0, 1], &[0]),
        objects.clone(),
        records.clone(),
        &test_config(dir.path()),
    );
    let req = request(2);

    let result = pipeline.run(&req).await;

    assert_eq!(result.status, RunStatus::Partial);
    assert_eq!(objects.puts.lock().unwrap().len(), 1);
    assert_eq!(records.written()[0].image_urls, vec![url_for(&req, 1)]);
}

#[tokio::test]
async fn urls_follow_asset_order_and_are_a_subset() {
    let dir = tempfile::tempdir().unwrap();
    let records = FakeRecords::ok();
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::with_indices(&[3, 0, 2]),
        FakeObjects::failing_on(&[2]),
        records.clone(),
        &test_config(dir.path()),
    );
    let req = request(3);

    let _ = pipeline.run(&req).await;

    let urls = records.written()[0].image_urls.clone();
    assert_eq!(urls, vec![url_for(&req, 0), url_for(&req, 3)]);
    let asset_urls: Vec<String> = [0, 2, 3].iter().map(|&i| url_for(&req, i)).collect();
    assert!(urls.iter().all(|u| asset_urls.contains(u)));
}

// ---------------------------------------------------------------------------
// Persistence retry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn record_write_failing_twice_then_succeeding_is_success() {
    let dir = tempfile::tempdir().unwrap();
    let records = FakeRecords::flaky(2);
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::with_indices(&[0]),
        Arc::new(FakeObjects::default()),
        records.clone(),
        &test_config(dir.path()),
    );

    let result = pipeline.run(&request(1)).await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(records.calls.load(Ordering::SeqCst), 3);
    assert_eq!(records.written().len(), 1);
}

#[tokio::test]
async fn record_write_exhaustion_fails_after_configured_retries() {
    let dir = tempfile::tempdir().unwrap();
    let records = FakeRecords::flaky(u32::MAX);
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::with_indices(&[0]),
        Arc::new(FakeObjects::default()),
        records.clone(),
        &test_config(dir.path()),
    );

    let result = pipeline.run(&request(1)).await;

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(result.state, RunState::PersistFailed);
    assert_eq!(result.failed_stage, Some(Stage::Persist));
    assert_eq!(
        records.calls.load(Ordering::SeqCst),
        4,
        "first attempt plus 3 retries"
    );
    assert!(records.written().is_empty());
    assert_eq!(archived_files(dir.path()), 1, "archive is the durable copy");
}

#[tokio::test]
async fn permanent_write_error_is_not_retried() {
    let dir = tempfile::tempdir().unwrap();
    let records = FakeRecords::rejecting();
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::with_indices(&[0]),
        Arc::new(FakeObjects::default()),
        records.clone(),
        &test_config(dir.path()),
    );

    let result = pipeline.run(&request(1)).await;

    assert_eq!(result.status, RunStatus::Failed);
    assert_eq!(records.calls.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Side effects
// ---------------------------------------------------------------------------

#[tokio::test]
async fn archive_failure_does_not_change_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file-not-dir");
    std::fs::write(&blocker, b"x").unwrap();

    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::with_indices(&[0]),
        Arc::new(FakeObjects::default()),
        FakeRecords::ok(),
        &test_config(&blocker),
    );

    let result = pipeline.run(&request(1)).await;
    assert_eq!(result.status, RunStatus::Success);
}

#[tokio::test]
async fn rerunning_upload_with_same_key_gives_same_urls() {
    let dir = tempfile::tempdir().unwrap();
    let store_dir = tempfile::tempdir().unwrap();
    let objects = Arc::new(FsObjectStore::new(&FsStoreConfig {
        dir: store_dir.path().to_path_buf(),
        public_base_url: "https://media.test".into(),
    }));
    let records = FakeRecords::ok();
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::with_indices(&[0, 1]),
        objects,
        records.clone(),
        &test_config(dir.path()),
    );

    let mut req = request(2);
    req.run_id = RunId::from("20261019000000-deadbeef");

    let first = pipeline.run(&req).await;
    let second = pipeline.run(&req).await;
    assert_eq!(first.status, RunStatus::Success);
    assert_eq!(second.status, RunStatus::Success);

    let written = records.written();
    assert_eq!(written[0].image_urls, written[1].image_urls);
    assert_eq!(
        written[0].image_urls[0],
        "https://media.test/images/blogs/20261019000000-deadbeef/0.png"
    );
}

#[tokio::test]
async fn stage_watch_ends_at_done() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::with_indices(&[0]),
        Arc::new(FakeObjects::default()),
        FakeRecords::ok(),
        &test_config(dir.path()),
    );
    let stage = pipeline.subscribe();
    assert_eq!(*stage.borrow(), Stage::Idle);

    let _ = pipeline.run(&request(1)).await;

    assert_eq!(*stage.borrow(), Stage::Done);
    assert_eq!(pipeline.current_stage(), Stage::Done);
}

#[tokio::test]
async fn persona_picker_can_be_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let records = FakeRecords::ok();
    let picker = PersonaPicker::with_chooser(
        PersonaConfig {
            authors: vec!["A".into(), "B".into()],
            colors: vec!["#000000".into(), "#FFFFFF".into()],
            avatar_url_template: "{author}.png".into(),
        },
        |_| 1,
    );
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::with_indices(&[0]),
        Arc::new(FakeObjects::default()),
        records.clone(),
        &test_config(dir.path()),
    )
    .with_persona_picker(picker);

    let _ = pipeline.run(&request(1)).await;

    let record = &records.written()[0];
    assert_eq!(record.author, "B");
    assert_eq!(record.color, "#FFFFFF");
    assert_eq!(record.avatar, "B.png");
}

#[tokio::test]
async fn fs_backend_keys_ignore_the_s3_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let objects = Arc::new(FakeObjects::default());
    let mut config = test_config(dir.path());
    config.object_store.backend = ObjectStoreBackend::Fs;
    config.object_store.s3.prefix = "site".into();
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::with_indices(&[0]),
        objects.clone(),
        FakeRecords::ok(),
        &config,
    );
    let req = request(1);

    let _ = pipeline.run(&req).await;

    assert_eq!(
        *objects.puts.lock().unwrap(),
        vec![format!("images/blogs/{}/0.png", req.run_id)]
    );
}

// ---------------------------------------------------------------------------
// Upload details
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_failure_is_returned_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let objects = Arc::new(FakeObjects::default());
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::build(&[0], &[0]),
        objects.clone(),
        FakeRecords::ok(),
        &test_config(dir.path()),
    );
    let asset = ImageAsset {
        index: 0,
        source: ImageSource::Bytes(PNG.to_vec()),
    };

    let result = pipeline.upload(&request(1), &asset).await;

    match result {
        Err(Error::Upstream {
            service, status, ..
        }) => {
            assert_eq!(service, "image-download");
            assert_eq!(status, 404);
        }
        other => panic!("expected the fetch error, got {other:?}"),
    }
    assert!(objects.puts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn renditions_are_uploaded_and_linked_on_the_record() {
    let dir = tempfile::tempdir().unwrap();
    let objects = Arc::new(FakeObjects::default());
    let records = FakeRecords::ok();
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::decodable(&[0, 1]),
        objects.clone(),
        records.clone(),
        &test_config(dir.path()),
    );
    let req = request(2);

    let result = pipeline.run(&req).await;
    assert_eq!(result.status, RunStatus::Success);

    let base = format!("images/blogs/{}", req.run_id);
    let puts = objects.puts.lock().unwrap().clone();
    assert_eq!(puts.len(), 8, "{puts:?}");
    for index in [0, 1] {
        for name in ["org", "card", "cover"] {
            assert!(puts.contains(&format!("{base}/{index}-{name}.png")), "{puts:?}");
        }
    }

    let record = &records.written()[0];
    assert_eq!(record.image_urls, vec![url_for(&req, 0), url_for(&req, 1)]);
    assert_eq!(record.org, format!("https://cdn.test/{base}/0-org.png"));
    assert_eq!(record.card, format!("https://cdn.test/{base}/0-card.png"));
    assert_eq!(record.cover, format!("https://cdn.test/{base}/0-cover.png"));
}

#[tokio::test]
async fn disabled_renditions_upload_sources_only() {
    let dir = tempfile::tempdir().unwrap();
    let objects = Arc::new(FakeObjects::default());
    let records = FakeRecords::ok();
    let mut config = test_config(dir.path());
    config.images.renditions = false;
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::decodable(&[0]),
        objects.clone(),
        records.clone(),
        &config,
    );

    let result = pipeline.run(&request(1)).await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(objects.puts.lock().unwrap().len(), 1);
    let record = &records.written()[0];
    assert!(record.org.is_empty() && record.card.is_empty() && record.cover.is_empty());
}

#[tokio::test]
async fn undecodable_image_keeps_source_without_renditions() {
    let dir = tempfile::tempdir().unwrap();
    let objects = Arc::new(FakeObjects::default());
    let records = FakeRecords::ok();
    let pipeline = Pipeline::new(
        FakeContent::returning("Title", "Body"),
        FakeImages::with_indices(&[0]),
        objects.clone(),
        records.clone(),
        &test_config(dir.path()),
    );
    let req = request(1);

    let result = pipeline.run(&req).await;

    assert_eq!(result.status, RunStatus::Success);
    assert_eq!(objects.puts.lock().unwrap().len(), 1);
    assert_eq!(records.written()[0].image_urls, vec![url_for(&req, 0)]);
    assert!(records.written()[0].card.is_empty());
}
