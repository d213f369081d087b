use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;

/// Uniform downscale so the width never exceeds `max_width`. Never upscales.
pub fn scaled_size(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }
    let scaled_height = (height as u64 * max_width as u64 / width as u64) as u32;
    (max_width, scaled_height)
}

/// Maps a 0–1 quality factor onto the encoder's 1–100 scale.
pub fn quality_percent(quality: f32) -> u8 {
    let quality = if quality.is_finite() { quality } else { 1.0 };
    (quality.clamp(0.0, 1.0) * 100.0).round().max(1.0) as u8
}

pub fn downscale(frame: RgbImage, max_width: u32) -> RgbImage {
    let (width, height) = frame.dimensions();
    let (target_width, target_height) = scaled_size(width, height, max_width);
    if (target_width, target_height) == (width, height) {
        return frame;
    }
    imageops::resize(&frame, target_width, target_height, FilterType::Triangle)
}

pub fn encode_jpeg(image: &RgbImage, quality: f32) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality_percent(quality));
        encoder.encode_image(image).with_context(|| {
            format!("jpeg encode of {}x{} frame failed", image.width(), image.height())
        })?;
    }
    Ok(bytes)
}
