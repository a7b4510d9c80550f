//! Image decoding ahead of recognition

use anyhow::{Context, Result};
use glyphrun_engine::BgraImage;
use image::ImageReader;
use std::path::Path;
use tracing::info;

/// Decode an image file, sniffing its format from the content, and convert
/// it to the BGRA layout the engine reads.
pub fn load_image(path: &Path) -> Result<BgraImage> {
    let image = ImageReader::open(path)
        .with_context(|| format!("failed to open image {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("failed to read image {}", path.display()))?
        .decode()
        .with_context(|| format!("can't decode image {}", path.display()))?;

    info!("loaded image {}x{} ({:?})", image.width(), image.height(), image.color());

    BgraImage::from_dynamic(&image)
        .with_context(|| format!("unsupported image type {}", path.display()))
}
