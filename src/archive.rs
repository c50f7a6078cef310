//! Local markdown archive of generated articles
//!
//! Every article that comes back from the content service is written to
//! `<dir>/<YYYY-MM-DD>/blog_<YYYYmmdd_HHMMSS>.md` before any remote stage
//! runs, so the text survives even if persistence fails. Archive failures are
//! the caller's to log; they never change a run's outcome.

use crate::config::ArchiveConfig;
use crate::error::Result;
use crate::types::Article;
use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Maximum number of suffixed names tried when a file name is taken
const MAX_RENAME_ATTEMPTS: u32 = 99;

/// Writer for local archival copies
#[derive(Clone, Debug)]
pub struct LocalArchive {
    dir: PathBuf,
    enabled: bool,
}

impl LocalArchive {
    /// Create an archive writer from configuration
    pub fn new(config: &ArchiveConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            enabled: config.enabled,
        }
    }

    /// Whether archival is turned on
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Write `article` for a run started at `at`
    ///
    /// Returns the path written, or `None` when archival is disabled. An
    /// existing file is never overwritten: a `_<n>` suffix is added instead.
    pub async fn write(&self, article: &Article, at: DateTime<Utc>) -> Result<Option<PathBuf>> {
        if !self.enabled {
            return Ok(None);
        }

        let day_dir = self.dir.join(at.format("%Y-%m-%d").to_string());
        tokio::fs::create_dir_all(&day_dir).await?;

        let stem = format!("blog_{}", at.format("%Y%m%d_%H%M%S"));
        let contents = render(article);

        let path = tokio::task::spawn_blocking(move || write_unique(&day_dir, &stem, &contents))
            .await
            .map_err(std::io::Error::other)??;

        tracing::info!(path = %path.display(), "article archived");
        Ok(Some(path))
    }
}

/// Markdown document for an article
fn render(article: &Article) -> String {
    let mut out = format!("# {}\n\n{}", article.title, article.body.trim_end());
    out.push('\n');
    out
}

/// Create `<dir>/<stem>.md`, or the first free `<stem>_<n>.md`
fn write_unique(dir: &Path, stem: &str, contents: &str) -> std::io::Result<PathBuf> {
    for attempt in 0..=MAX_RENAME_ATTEMPTS {
        let name = if attempt == 0 {
            format!("{stem}.md")
        } else {
            format!("{stem}_{attempt}.md")
        };
        let path = dir.join(name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(mut file) => {
                file.write_all(contents.as_bytes())?;
                file.sync_all()?;
                return Ok(path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AlreadyExists,
        format!("no free archive name for {stem} in {}", dir.display()),
    ))
}
