//! Fixed-size PNG renditions of generated images
//!
//! Each [`Rendition`] is produced by centre-cropping the source to the
//! target aspect ratio, resizing with a Lanczos3 filter and encoding as PNG.

use crate::error::Result;
use crate::types::Rendition;
use image::DynamicImage;
use image::imageops::FilterType;
use std::io::Cursor;

/// Decode `bytes` once and render every [`Rendition`] as PNG
///
/// # Errors
///
/// [`Error::Image`](crate::Error::Image) if the bytes are not a supported
/// image or encoding fails.
pub fn render_all(bytes: &[u8]) -> Result<Vec<(Rendition, Vec<u8>)>> {
    let source = DynamicImage::ImageRgb8(image::load_from_memory(bytes)?.to_rgb8());
    Rendition::ALL
        .iter()
        .map(|&rendition| Ok((rendition, encode_png(&render(&source, rendition))?)))
        .collect()
}

/// Centre-crop `source` to the aspect ratio of `rendition` and resize it
pub fn render(source: &DynamicImage, rendition: Rendition) -> DynamicImage {
    let (target_w, target_h) = rendition.dimensions();
    let (x, y, w, h) = centre_crop(source.width(), source.height(), target_w, target_h);
    source
        .crop_imm(x, y, w, h)
        .resize_exact(target_w, target_h, FilterType::Lanczos3)
}

/// Largest centred box `(x, y, width, height)` with the target aspect ratio
fn centre_crop(src_w: u32, src_h: u32, target_w: u32, target_h: u32) -> (u32, u32, u32, u32) {
    let (sw, sh) = (u64::from(src_w), u64::from(src_h));
    let (tw, th) = (u64::from(target_w), u64::from(target_h));

    if sw * th > tw * sh {
        // Wider than the target: trim both sides
        let new_w = ((sh * tw) / th).max(1) as u32;
        ((src_w - new_w) / 2, 0, new_w, src_h)
    } else {
        // Taller than the target: trim top and bottom
        let new_h = ((sw * th) / tw).max(1) as u32;
        (0, (src_h - new_h) / 2, src_w, new_h)
    }
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageFormat::Png)?;
    Ok(out.into_inner())
}
