//! Amazon S3 object store

use super::{ObjectStore, join_url, sha256_hex};
use crate::config::S3Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;

/// Object store backed by an S3 bucket
///
/// Uploads carry `Content-Type`, a long-lived `Cache-Control`, the configured
/// canned ACL and `generated-by`/`sha256` metadata. Credentials come from the
/// standard AWS provider chain.
#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: String,
    public_base_url: Option<String>,
    acl: Option<String>,
    cache_control: String,
}

impl S3ObjectStore {
    /// Create a store from configuration, loading AWS settings from the environment
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no bucket is configured.
    pub async fn new(config: &S3Config) -> Result<Self> {
        let bucket = config
            .bucket
            .clone()
            .ok_or_else(|| Error::config("S3 bucket is required", "S3_BUCKET"))?;

        let aws_config = aws_config::from_env()
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        Ok(Self::with_client(Client::new(&aws_config), bucket, config))
    }

    /// Create a store around an existing client
    pub fn with_client(client: Client, bucket: String, config: &S3Config) -> Self {
        Self {
            client,
            bucket,
            region: config.region.clone(),
            public_base_url: config.public_base_url.clone(),
            acl: config.acl.clone(),
            cache_control: config.cache_control.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        let digest = sha256_hex(bytes);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type(content_type)
            .cache_control(&self.cache_control)
            .metadata("generated-by", "blog-pipeline")
            .metadata("sha256", &digest)
            .set_acl(self.acl.as_deref().map(ObjectCannedAcl::from))
            .send()
            .await
            .map_err(|e| Error::Upload {
                key: key.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        tracing::debug!(bucket = %self.bucket, key, sha256 = %digest, size = bytes.len(), "uploaded object");
        Ok(self.public_url(key))
    }

    fn public_url(&self, key: &str) -> String {
        match &self.public_base_url {
            Some(base) => join_url(base, key),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            ),
        }
    }

    fn name(&self) -> &'static str {
        "s3"
    }
}
