//! Image generation
//!
//! [`ImageGenerator`] is the seam between the pipeline and the image service.
//! [`TaskImageClient`] implements it for an asynchronous text-to-image task
//! API (create a task, then poll until it finishes). [`render_all`] turns a
//! generated image into its fixed-size renditions.

mod format;
mod rendition;
mod task;

pub use format::ImageFormat;
pub use rendition::{render, render_all};
pub use task::TaskImageClient;

use crate::error::{Error, Result};
use crate::types::{Article, ImageAsset, ImageSource};
use async_trait::async_trait;

/// Service name used in errors and logs
pub const SERVICE: &str = "image-api";

/// Longest prompt sent to the image service, in characters
pub const MAX_PROMPT_CHARS: usize = 500;

/// Trait for producing images from a text prompt
///
/// Returned assets keep the index the service assigned them, so a caller can
/// tell which slots are missing. Fewer assets than requested is not an error.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Request `count` images for `prompt`
    ///
    /// # Errors
    ///
    /// [`Error::Upstream`] when the service rejects or fails the job and
    /// [`Error::Timeout`] when it does not finish in time.
    async fn generate(&self, prompt: &str, count: u32) -> Result<Vec<ImageAsset>>;

    /// Resolve an asset to its bytes
    ///
    /// Inline assets are returned as-is; URL assets are downloaded.
    async fn fetch(&self, asset: &ImageAsset) -> Result<Vec<u8>> {
        match &asset.source {
            ImageSource::Bytes(bytes) => Ok(bytes.clone()),
            ImageSource::Url(url) => {
                let response = reqwest::get(url).await?;
                download_body(response).await
            }
        }
    }

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Read a download response, turning non-2xx answers into [`Error::Upstream`]
pub(crate) async fn download_body(response: reqwest::Response) -> Result<Vec<u8>> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Upstream {
            service: "image-download",
            status: status.as_u16(),
            body: format!("GET {} failed", response.url()),
        });
    }
    Ok(response.bytes().await?.to_vec())
}

/// Build the image prompt for an article
///
/// The prompt is the title followed by the first paragraph of the body that
/// is not a markdown heading, capped at [`MAX_PROMPT_CHARS`] characters.
pub fn image_prompt(article: &Article) -> String {
    let paragraph = article
        .body
        .split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty() && !p.starts_with('#'))
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" "));

    let prompt = match paragraph {
        Some(p) => format!("{}. {}", article.title.trim_end_matches('.'), p),
        None => article.title.clone(),
    };

    prompt.chars().take(MAX_PROMPT_CHARS).collect()
}
