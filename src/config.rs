//! Configuration types for blog-pipeline
//!
//! Configuration is built once at startup and threaded through every client.
//! It can come from a JSON file, and the environment always overrides it.
//! See [`Config::load`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for a pipeline run
///
/// Fields are grouped by collaborator:
/// - [`content`](ContentConfig): LLM workflow service
/// - [`images`](ImageConfig): text-to-image task service
/// - [`object_store`](ObjectStoreConfig): where images are uploaded
/// - [`record_store`](RecordStoreConfig): where blog records are written
/// - [`archive`](ArchiveConfig): local markdown copies
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Content service settings
    #[serde(default)]
    pub content: ContentConfig,

    /// Image service settings
    #[serde(default)]
    pub images: ImageConfig,

    /// Object store settings
    #[serde(default)]
    pub object_store: ObjectStoreConfig,

    /// Record store settings
    #[serde(default)]
    pub record_store: RecordStoreConfig,

    /// Local archival settings
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Author/colour assignment for records
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Single-instance run lock
    #[serde(default)]
    pub lock: LockConfig,

    /// Pacing between runs of a batch
    #[serde(default)]
    pub batch: BatchConfig,

    /// Retry policy for the record-store write
    #[serde(default)]
    pub persist_retry: RetryConfig,
}

/// LLM workflow service configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Workflow run endpoint (e.g., "https://api.dify.ai/v1/workflows/run")
    #[serde(default)]
    pub endpoint: String,

    /// Bearer token for the workflow service
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request deadline (default: 120 seconds)
    #[serde(default = "default_content_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// Workflow input name that receives the topic seed (default: "topic")
    #[serde(default = "default_topic_input")]
    pub topic_input: String,

    /// End-user identifier sent with each workflow run (default: "blog-pipeline")
    #[serde(default = "default_user")]
    pub user: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            timeout: default_content_timeout(),
            topic_input: default_topic_input(),
            user: default_user(),
        }
    }
}

/// Text-to-image task service configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Service base URL (default: "https://dashscope.aliyuncs.com")
    #[serde(default = "default_image_endpoint")]
    pub endpoint: String,

    /// Bearer token for the image service
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model name (default: "wanx2.1-t2i-turbo")
    #[serde(default = "default_image_model")]
    pub model: String,

    /// Output size as "W*H" (default: "1024*1024")
    #[serde(default = "default_image_size")]
    pub size: String,

    /// Images requested per run, 1 to 4 (default: 1)
    #[serde(default = "default_image_count")]
    pub count: u32,

    /// Content the model should avoid
    #[serde(default)]
    pub negative_prompt: Option<String>,

    /// Deadline for each create/query request (default: 30 seconds)
    #[serde(default = "default_image_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Interval between task status queries (default: 3 seconds)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub poll_interval: Duration,

    /// Total time to wait for a task to finish (default: 300 seconds)
    #[serde(default = "default_max_wait", with = "duration_serde")]
    pub max_wait: Duration,

    /// Deadline for downloading a generated image (default: 15 seconds)
    #[serde(default = "default_download_timeout", with = "duration_serde")]
    pub download_timeout: Duration,

    /// Also upload `org`/`card`/`cover` PNG renditions of each image (default: true)
    #[serde(default = "default_true")]
    pub renditions: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_image_endpoint(),
            api_key: None,
            model: default_image_model(),
            size: default_image_size(),
            count: default_image_count(),
            negative_prompt: None,
            request_timeout: default_image_request_timeout(),
            poll_interval: default_poll_interval(),
            max_wait: default_max_wait(),
            download_timeout: default_download_timeout(),
            renditions: true,
        }
    }
}

/// Object store backend selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectStoreBackend {
    /// Amazon S3 (default)
    #[default]
    S3,
    /// Local directory served by a static file server
    Fs,
}

/// Object store configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    /// Which backend to use
    #[serde(default)]
    pub backend: ObjectStoreBackend,

    /// S3 backend settings
    #[serde(default)]
    pub s3: S3Config,

    /// Filesystem backend settings
    #[serde(default)]
    pub fs: FsStoreConfig,
}

impl ObjectStoreConfig {
    /// Key prefix of the selected backend
    ///
    /// Only S3 keys are prefixed; the filesystem backend roots keys at its
    /// own directory.
    pub fn key_prefix(&self) -> &str {
        match self.backend {
            ObjectStoreBackend::S3 => &self.s3.prefix,
            ObjectStoreBackend::Fs => "",
        }
    }
}

/// S3 object store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct S3Config {
    /// Bucket name (required for the S3 backend)
    #[serde(default)]
    pub bucket: Option<String>,

    /// Key prefix placed before `images/blogs/...` (default: "")
    #[serde(default)]
    pub prefix: String,

    /// Bucket region (default: "ap-southeast-1")
    #[serde(default = "default_region")]
    pub region: String,

    /// Public URL base for objects; defaults to the virtual-hosted bucket URL
    #[serde(default)]
    pub public_base_url: Option<String>,

    /// Canned ACL applied to uploads (default: "public-read")
    #[serde(default = "default_acl")]
    pub acl: Option<String>,

    /// Cache-Control header for uploads (default: "max-age=31536000")
    #[serde(default = "default_cache_control")]
    pub cache_control: String,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: None,
            prefix: String::new(),
            region: default_region(),
            public_base_url: None,
            acl: default_acl(),
            cache_control: default_cache_control(),
        }
    }
}

/// Filesystem object store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FsStoreConfig {
    /// Root directory objects are written under (default: "./images")
    #[serde(default = "default_fs_store_dir")]
    pub dir: PathBuf,

    /// URL the root directory is served at (default: "http://localhost:8000/images")
    #[serde(default = "default_fs_public_base_url")]
    pub public_base_url: String,
}

impl Default for FsStoreConfig {
    fn default() -> Self {
        Self {
            dir: default_fs_store_dir(),
            public_base_url: default_fs_public_base_url(),
        }
    }
}

/// Record store backend selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStoreBackend {
    /// Amazon DynamoDB (default)
    #[default]
    Dynamodb,
    /// Local SQLite database
    Sqlite,
}

/// Record store configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RecordStoreConfig {
    /// Which backend to use
    #[serde(default)]
    pub backend: RecordStoreBackend,

    /// DynamoDB backend settings
    #[serde(default)]
    pub dynamodb: DynamoConfig,

    /// SQLite backend settings
    #[serde(default)]
    pub sqlite: SqliteConfig,
}

/// DynamoDB record store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DynamoConfig {
    /// Table name (default: "blog_records")
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Table region (default: "ap-southeast-1")
    #[serde(default = "default_region")]
    pub region: String,

    /// Endpoint override, e.g. a local DynamoDB
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl Default for DynamoConfig {
    fn default() -> Self {
        Self {
            table_name: default_table_name(),
            region: default_region(),
            endpoint_url: None,
        }
    }
}

/// SQLite record store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Database path (default: "./blog-pipeline.db")
    #[serde(default = "default_sqlite_path")]
    pub path: PathBuf,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: default_sqlite_path(),
        }
    }
}

/// Local archival configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Write local markdown copies (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Archive root directory (default: "./blogs")
    #[serde(default = "default_archive_dir")]
    pub dir: PathBuf,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_archive_dir(),
        }
    }
}

/// Author and accent colour assignment for new records
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Display authors to pick from
    #[serde(default = "default_authors")]
    pub authors: Vec<String>,

    /// Accent colours (CSS hex) to pick from
    #[serde(default = "default_colors")]
    pub colors: Vec<String>,

    /// Avatar URL with an `{author}` placeholder
    #[serde(default = "default_avatar_url_template")]
    pub avatar_url_template: String,
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            authors: default_authors(),
            colors: default_colors(),
            avatar_url_template: default_avatar_url_template(),
        }
    }
}

/// Run lock configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LockConfig {
    /// Lock file path (default: "./blog-pipeline.lock")
    #[serde(default = "default_lock_path")]
    pub path: PathBuf,

    /// Age after which an existing lock is considered abandoned (default: 6 hours)
    #[serde(default = "default_stale_after", with = "duration_serde")]
    pub stale_after: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            path: default_lock_path(),
            stale_after: default_stale_after(),
        }
    }
}

/// Pause between consecutive runs of a batch
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Shortest pause (default: 1 second)
    #[serde(default = "default_batch_min_delay", with = "duration_serde")]
    pub min_delay: Duration,

    /// Longest pause (default: 3 seconds)
    #[serde(default = "default_batch_max_delay", with = "duration_serde")]
    pub max_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            min_delay: default_batch_min_delay(),
            max_delay: default_batch_max_delay(),
        }
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl Config {
    /// Build the configuration from an optional JSON file plus the environment
    ///
    /// `env` looks up a variable by name; the binary passes `std::env::var`,
    /// tests pass a map. Environment values override file values.
    pub fn load<F>(path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
                    message: format!("cannot read config file {}: {e}", path.display()),
                    key: None,
                })?;
                serde_json::from_str(&raw).map_err(|e| Error::Config {
                    message: format!("invalid config file {}: {e}", path.display()),
                    key: None,
                })?
            }
            None => Config::default(),
        };

        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Build the configuration from the process environment only
    pub fn from_env() -> Result<Self> {
        Self::load(None, |key| std::env::var(key).ok())
    }

    /// Apply environment overrides
    pub fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&'static str]| -> Option<(&'static str, String)> {
            keys.iter().find_map(|k| {
                env(k)
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .map(|v| (*k, v))
            })
        };

        // Content service
        if let Some((_, v)) = get(&["CONTENT_API_URL", "DIFY_WORKFLOW_API_URL"]) {
            self.content.endpoint = v;
        }
        if let Some((_, v)) = get(&["CONTENT_API_KEY", "DIFY_API_KEY"]) {
            self.content.api_key = Some(v);
        }
        if let Some((k, v)) = get(&["CONTENT_API_TIMEOUT_SECS"]) {
            self.content.timeout = parse_secs(k, &v)?;
        }
        if let Some((_, v)) = get(&["CONTENT_TOPIC_INPUT"]) {
            self.content.topic_input = v;
        }

        // Image service
        if let Some((_, v)) = get(&["IMAGE_API_URL"]) {
            self.images.endpoint = v;
        }
        if let Some((_, v)) = get(&["IMAGE_API_KEY", "DASHSCOPE_API_KEY"]) {
            self.images.api_key = Some(v);
        }
        if let Some((_, v)) = get(&["IMAGE_MODEL"]) {
            self.images.model = v;
        }
        if let Some((_, v)) = get(&["IMAGE_SIZE"]) {
            self.images.size = v;
        }
        if let Some((k, v)) = get(&["IMAGE_COUNT"]) {
            self.images.count = parse_num(k, &v)?;
        }
        if let Some((_, v)) = get(&["IMAGE_NEGATIVE_PROMPT"]) {
            self.images.negative_prompt = Some(v);
        }
        if let Some((k, v)) = get(&["IMAGE_TASK_MAX_WAIT_SECS"]) {
            self.images.max_wait = parse_secs(k, &v)?;
        }
        if let Some((k, v)) = get(&["IMAGE_TASK_POLL_SECS"]) {
            self.images.poll_interval = parse_secs(k, &v)?;
        }
        if let Some((k, v)) = get(&["IMAGE_RENDITIONS"]) {
            self.images.renditions = parse_bool(k, &v)?;
        }

        // Object store
        if let Some((k, v)) = get(&["OBJECT_STORE_BACKEND"]) {
            self.object_store.backend = match v.to_ascii_lowercase().as_str() {
                "s3" => ObjectStoreBackend::S3,
                "fs" | "local" => ObjectStoreBackend::Fs,
                other => {
                    return Err(Error::config(
                        format!("unknown object store backend '{other}' (expected s3 or fs)"),
                        k,
                    ));
                }
            };
        }
        if let Some((_, v)) = get(&["S3_BUCKET"]) {
            self.object_store.s3.bucket = Some(v);
        }
        if let Some((_, v)) = get(&["S3_PREFIX"]) {
            self.object_store.s3.prefix = v;
        }
        if let Some((_, v)) = get(&["S3_REGION"]) {
            self.object_store.s3.region = v;
        }
        if let Some((_, v)) = get(&["S3_PUBLIC_BASE_URL"]) {
            self.object_store.s3.public_base_url = Some(v);
        }
        if let Some((_, v)) = get(&["FS_STORE_DIR"]) {
            self.object_store.fs.dir = PathBuf::from(v);
        }
        if let Some((_, v)) = get(&["FS_PUBLIC_BASE_URL"]) {
            self.object_store.fs.public_base_url = v;
        }

        // Record store
        if let Some((k, v)) = get(&["RECORD_STORE_BACKEND"]) {
            self.record_store.backend = match v.to_ascii_lowercase().as_str() {
                "dynamodb" | "dynamo" => RecordStoreBackend::Dynamodb,
                "sqlite" => RecordStoreBackend::Sqlite,
                other => {
                    return Err(Error::config(
                        format!(
                            "unknown record store backend '{other}' (expected dynamodb or sqlite)"
                        ),
                        k,
                    ));
                }
            };
        }
        if let Some((_, v)) = get(&["DYNAMODB_TABLE_NAME"]) {
            self.record_store.dynamodb.table_name = v;
        }
        if let Some((_, v)) = get(&["DYNAMODB_REGION", "AWS_REGION"]) {
            self.record_store.dynamodb.region = v;
        }
        if let Some((_, v)) = get(&["DYNAMODB_ENDPOINT_URL"]) {
            self.record_store.dynamodb.endpoint_url = Some(v);
        }
        if let Some((_, v)) = get(&["SQLITE_PATH"]) {
            self.record_store.sqlite.path = PathBuf::from(v);
        }

        // Local side effects
        if let Some((_, v)) = get(&["BLOG_STORAGE_PATH"]) {
            self.archive.dir = PathBuf::from(v);
        }
        if let Some((_, v)) = get(&["RUN_LOCK_PATH"]) {
            self.lock.path = PathBuf::from(v);
        }

        // Persistence retry
        if let Some((k, v)) = get(&["PERSIST_MAX_RETRIES"]) {
            self.persist_retry.max_attempts = parse_num(k, &v)?;
        }
        if let Some((k, v)) = get(&["PERSIST_INITIAL_DELAY_SECS"]) {
            self.persist_retry.initial_delay = parse_secs(k, &v)?;
        }

        Ok(())
    }

    /// Check that the configuration can drive a run
    pub fn validate(&self) -> Result<()> {
        if self.content.endpoint.is_empty() {
            return Err(Error::config(
                "content workflow endpoint must be set",
                "CONTENT_API_URL",
            ));
        }
        check_url(&self.content.endpoint, "CONTENT_API_URL")?;
        if self.content.api_key.is_none() {
            return Err(Error::config(
                "content workflow API key must be set",
                "CONTENT_API_KEY",
            ));
        }

        check_url(&self.images.endpoint, "IMAGE_API_URL")?;
        if self.images.api_key.is_none() {
            return Err(Error::config(
                "image service API key must be set",
                "IMAGE_API_KEY",
            ));
        }
        if !(1..=4).contains(&self.images.count) {
            return Err(Error::config(
                format!("image count must be between 1 and 4, got {}", self.images.count),
                "IMAGE_COUNT",
            ));
        }
        if self.images.poll_interval.is_zero() {
            return Err(Error::config(
                "image task poll interval must be positive",
                "IMAGE_TASK_POLL_SECS",
            ));
        }

        match self.object_store.backend {
            ObjectStoreBackend::S3 => {
                if self.object_store.s3.bucket.is_none() {
                    return Err(Error::config(
                        "S3 bucket must be set for the s3 object store",
                        "S3_BUCKET",
                    ));
                }
                if let Some(base) = &self.object_store.s3.public_base_url {
                    check_url(base, "S3_PUBLIC_BASE_URL")?;
                }
            }
            ObjectStoreBackend::Fs => {
                check_url(&self.object_store.fs.public_base_url, "FS_PUBLIC_BASE_URL")?;
            }
        }

        if self.record_store.backend == RecordStoreBackend::Dynamodb
            && self.record_store.dynamodb.table_name.is_empty()
        {
            return Err(Error::config(
                "DynamoDB table name must be set",
                "DYNAMODB_TABLE_NAME",
            ));
        }

        if self.persona.authors.is_empty() || self.persona.colors.is_empty() {
            return Err(Error::Config {
                message: "persona authors and colors must not be empty".into(),
                key: Some("persona".into()),
            });
        }

        if self.batch.min_delay > self.batch.max_delay {
            return Err(Error::Config {
                message: "batch min_delay must not exceed max_delay".into(),
                key: Some("batch".into()),
            });
        }

        if self.persist_retry.backoff_multiplier < 1.0 {
            return Err(Error::Config {
                message: "persist retry backoff_multiplier must be at least 1.0".into(),
                key: Some("persist_retry".into()),
            });
        }

        Ok(())
    }
}

fn check_url(value: &str, key: &'static str) -> Result<()> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| Error::config(format!("'{value}' is not a valid URL: {e}"), key))
}

fn parse_num<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::config(format!("'{value}' is not a valid number"), key))
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config(
            format!("'{value}' is not a valid boolean"),
            key,
        )),
    }
}

fn parse_secs(key: &'static str, value: &str) -> Result<Duration> {
    parse_num::<u64>(key, value).map(Duration::from_secs)
}

fn default_true() -> bool {
    true
}

fn default_content_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_topic_input() -> String {
    "topic".into()
}

fn default_user() -> String {
    "blog-pipeline".into()
}

fn default_image_endpoint() -> String {
    "https://dashscope.aliyuncs.com".into()
}

fn default_image_model() -> String {
    "wanx2.1-t2i-turbo".into()
}

fn default_image_size() -> String {
    "1024*1024".into()
}

fn default_image_count() -> u32 {
    1
}

fn default_image_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(3)
}

fn default_max_wait() -> Duration {
    Duration::from_secs(300)
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_region() -> String {
    "ap-southeast-1".into()
}

fn default_acl() -> Option<String> {
    Some("public-read".into())
}

fn default_cache_control() -> String {
    "max-age=31536000".into()
}

fn default_fs_store_dir() -> PathBuf {
    PathBuf::from("./images")
}

fn default_fs_public_base_url() -> String {
    "http://localhost:8000/images".into()
}

fn default_table_name() -> String {
    "blog_records".into()
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./blog-pipeline.db")
}

fn default_archive_dir() -> PathBuf {
    PathBuf::from("./blogs")
}

fn default_authors() -> Vec<String> {
    [
        "Whit", "LunaGaze", "Daisy", "Lily", "Emma", "Joy", "Mia", "AvaStar", "Maya", "Emily",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_colors() -> Vec<String> {
    ["#A8A0F9", "#D7A0F9", "#FFE2EB", "#FFE4C1", "#DAFFF6", "#FFFD92"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_avatar_url_template() -> String {
    "/images/blog-authors/{author}.webp".into()
}

fn default_lock_path() -> PathBuf {
    PathBuf::from("./blog-pipeline.lock")
}

fn default_stale_after() -> Duration {
    Duration::from_secs(6 * 60 * 60)
}

fn default_batch_min_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_batch_max_delay() -> Duration {
    Duration::from_secs(3)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
