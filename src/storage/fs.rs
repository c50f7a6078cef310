//! Local directory object store

use super::{ObjectStore, join_url, sha256_hex};
use crate::config::FsStoreConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Object store that writes into a directory served by a static file server
///
/// Writes go to a temporary sibling file that is renamed into place. An
/// existing file with identical content is left untouched.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsObjectStore {
    /// Create a store rooted at the configured directory
    pub fn new(config: &FsStoreConfig) -> Self {
        Self {
            root: config.dir.clone(),
            public_base_url: config.public_base_url.clone(),
        }
    }

    /// Filesystem path for `key`
    ///
    /// Keys may not escape the root directory.
    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(Error::Upload {
                key: key.to_string(),
                reason: "key must be a relative path without '..'".into(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<String> {
        let path = self.path_for(key)?;
        let upload_err = |e: std::io::Error| Error::Upload {
            key: key.to_string(),
            reason: format!("{}: {e}", path.display()),
        };

        if let Ok(existing) = tokio::fs::read(&path).await
            && sha256_hex(&existing) == sha256_hex(bytes)
        {
            tracing::debug!(key, "identical object already stored");
            return Ok(self.public_url(key));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(upload_err)?;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4().simple()));

        tokio::fs::write(&tmp, bytes).await.map_err(upload_err)?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(upload_err(e));
        }

        tracing::debug!(key, path = %path.display(), size = bytes.len(), "stored object");
        Ok(self.public_url(key))
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }

    fn name(&self) -> &'static str {
        "fs"
    }
}
