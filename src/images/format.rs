//! Image format detection from magic bytes

/// Image formats recognised for object keys and content types
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageFormat {
    /// Portable Network Graphics
    Png,
    /// JPEG/JFIF
    Jpeg,
    /// WebP (RIFF container)
    Webp,
    /// GIF87a/GIF89a
    Gif,
    /// Anything else; stored as opaque bytes
    Unknown,
}

impl ImageFormat {
    /// Detect the format from the leading bytes of an image
    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            ImageFormat::Png
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            ImageFormat::Jpeg
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            ImageFormat::Webp
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            ImageFormat::Gif
        } else {
            ImageFormat::Unknown
        }
    }

    /// File extension used in object keys
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
            ImageFormat::Gif => "gif",
            ImageFormat::Unknown => "bin",
        }
    }

    /// MIME type sent as `Content-Type`
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Unknown => "application/octet-stream",
        }
    }
}
