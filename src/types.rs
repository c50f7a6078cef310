//! Core types for blog-pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Unique identifier for a run
///
/// Formatted as `<UTC %Y%m%d%H%M%S>-<8 hex chars>`, so ids sort by start time
/// and are safe to use as path segments and object key segments.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Generate a new run id for a run started at `at`
    pub fn generate(at: DateTime<Utc>) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", at.format("%Y%m%d%H%M%S"), &suffix[..8]))
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RunId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input for a single run, owned by the pipeline for the run's duration
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    /// Unique id of this run
    pub run_id: RunId,
    /// Topic seed; `None` lets the content service choose
    pub topic: Option<String>,
    /// When the run started
    pub requested_at: DateTime<Utc>,
    /// Number of images to request (at least 1)
    pub image_count: u32,
}

impl GenerationRequest {
    /// Create a request for a run starting now
    ///
    /// Empty or whitespace-only topics are normalised to `None`.
    pub fn new(topic: Option<String>, image_count: u32) -> Self {
        let requested_at = Utc::now();
        Self {
            run_id: RunId::generate(requested_at),
            topic: topic
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            requested_at,
            image_count,
        }
    }
}

/// Article produced by the content service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Article title
    pub title: String,
    /// Markdown body
    pub body: String,
    /// Tags attached by the service
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Short summary for listings
    #[serde(default)]
    pub description: Option<String>,
    /// SEO keywords, most important first
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// Where an image's bytes come from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Raw image bytes returned inline
    Bytes(Vec<u8>),
    /// A URL the bytes must be downloaded from
    Url(String),
}

/// Image produced by the image service, transient until uploaded
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageAsset {
    /// Position of the image relative to the article (0-based)
    pub index: u32,
    /// Image payload
    pub source: ImageSource,
}

/// Fixed-size PNG rendition of a generated image
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rendition {
    /// Article header, 1600×896
    Org,
    /// Listing card, 776×435
    Card,
    /// Banner strip, 1600×300
    Cover,
}

impl Rendition {
    /// Every rendition, in upload order
    pub const ALL: [Rendition; 3] = [Rendition::Org, Rendition::Card, Rendition::Cover];

    /// Name used in object keys and record fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Rendition::Org => "org",
            Rendition::Card => "card",
            Rendition::Cover => "cover",
        }
    }

    /// Output width and height in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Rendition::Org => (1600, 896),
            Rendition::Card => (776, 435),
            Rendition::Cover => (1600, 300),
        }
    }
}

impl std::fmt::Display for Rendition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image stored in the object store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    /// Index of the originating [`ImageAsset`]
    pub index: u32,
    /// Object key the image was written under
    pub key: String,
    /// Public URL of the stored image
    pub url: String,
    /// Public URLs of the renditions that were uploaded
    #[serde(default)]
    pub renditions: BTreeMap<Rendition, String>,
}

/// Completeness of a persisted record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    /// Every requested image was uploaded
    Complete,
    /// Fewer images than requested made it into the record
    Partial,
}

impl RecordStatus {
    /// Lowercase name used in storage backends
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Complete => "complete",
            RecordStatus::Partial => "partial",
        }
    }
}

/// Persisted blog entry; written once per run and never mutated
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogRecord {
    /// Unique id (the run id)
    pub id: String,
    /// URL slug derived from the title
    pub slug: String,
    /// Article title
    pub title: String,
    /// Markdown body
    pub body: String,
    /// Short summary
    pub description: String,
    /// All keywords, most important first
    pub keywords: Vec<String>,
    /// Primary keyword (first of `keywords`, empty if none)
    pub keyword: String,
    /// Tags
    pub tags: Vec<String>,
    /// Public image URLs, ordered by asset index
    pub image_urls: Vec<String>,
    /// Display author
    pub author: String,
    /// Author avatar URL
    pub avatar: String,
    /// Accent colour (CSS hex)
    pub color: String,
    /// URL of the header rendition of the first image (empty if none)
    #[serde(default)]
    pub org: String,
    /// URL of the card rendition of the first image (empty if none)
    #[serde(default)]
    pub card: String,
    /// URL of the cover rendition of the first image (empty if none)
    #[serde(default)]
    pub cover: String,
    /// Completeness of the record
    pub status: RecordStatus,
    /// Whether the post is visible
    pub published: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time (equal to `created_at` for append-only records)
    pub updated_at: DateTime<Utc>,
}

/// Overall outcome of a run, ordered by severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Record persisted with every requested image
    Success,
    /// Record persisted with fewer images than requested
    Partial,
    /// No record persisted
    Failed,
}

impl RunStatus {
    /// Combine two statuses, keeping the worse one
    pub fn worst(self, other: RunStatus) -> RunStatus {
        self.max(other)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Success => "success",
            RunStatus::Partial => "partial",
            RunStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Progress of a run through its linear state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Nothing has succeeded yet
    Start,
    /// The article was generated
    ContentGenerated,
    /// At least one image asset was generated
    ImagesGenerated,
    /// The image stage produced nothing
    ImagesSkipped,
    /// The record was written
    Persisted,
    /// The record write was exhausted
    PersistFailed,
}

/// Pipeline stage currently executing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Not yet started
    Idle,
    /// Calling the content service
    Content,
    /// Writing the local archival copy
    Archive,
    /// Calling the image service
    Images,
    /// Uploading images to the object store
    Upload,
    /// Writing the record
    Persist,
    /// Run finished
    Done,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Idle => "idle",
            Stage::Content => "content",
            Stage::Archive => "archive",
            Stage::Images => "images",
            Stage::Upload => "upload",
            Stage::Persist => "persist",
            Stage::Done => "done",
        };
        f.write_str(s)
    }
}

/// Result of one run
#[must_use]
#[derive(Clone, Debug, Serialize)]
pub struct RunResult {
    /// Id of the run
    pub run_id: RunId,
    /// Worst status observed
    pub status: RunStatus,
    /// Final state reached
    pub state: RunState,
    /// Id of the written record, if any
    pub record_id: Option<String>,
    /// Images requested from the image service
    pub images_requested: u32,
    /// Image assets the service returned
    pub images_generated: u32,
    /// Images uploaded and referenced by the record
    pub images_uploaded: u32,
    /// Stage whose failure decided a `failed` status
    pub failed_stage: Option<Stage>,
    /// Error message of the fatal failure
    pub error: Option<String>,
}

impl RunResult {
    /// Whether the run produced a persisted record
    pub fn is_persisted(&self) -> bool {
        self.state == RunState::Persisted
    }
}
