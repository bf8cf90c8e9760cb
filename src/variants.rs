//! Variant naming for uploaded product images.
//!
//! The image is downloaded once, its visible pixels averaged, and the average
//! mapped to the closest palette name. Any failure yields `Variant N`.

use std::time::Duration;

use image::RgbaImage;
use thiserror::Error;
use tracing::{debug, warn};

use crate::colors;

/// Pixels at or below this alpha are treated as background.
const MIN_ALPHA: u8 = 127;
const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum VariantError {
    #[error("Failed to fetch image: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("Image too large: {0} bytes")]
    TooLarge(u64),
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Image has no visible pixels")]
    Transparent,
    #[error("Decoder task failed: {0}")]
    Task(String),
}

#[derive(Clone)]
pub struct VariantNamer {
    http: reqwest::Client,
}

impl VariantNamer {
    pub fn new(timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http }
    }

    /// Color label for the variant at `index` (zero-based). Single attempt.
    pub async fn name_for(&self, image_url: &str, index: usize) -> String {
        match self.detect(image_url).await {
            Ok(name) => {
                debug!(image_url, color = name, "Detected variant color");
                name.to_string()
            }
            Err(e) => {
                warn!(image_url, error = %e, "Color detection failed, using numbered label");
                fallback_label(index)
            }
        }
    }

    async fn detect(&self, image_url: &str) -> Result<&'static str, VariantError> {
        let mut response = self.http.get(image_url).send().await?.error_for_status()?;
        if let Some(len) = response.content_length().filter(|len| *len > MAX_IMAGE_BYTES) {
            return Err(VariantError::TooLarge(len));
        }
        // Content-Length is optional; the cap also holds for bytes read
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            bytes.extend_from_slice(&chunk);
            if bytes.len() as u64 > MAX_IMAGE_BYTES {
                return Err(VariantError::TooLarge(bytes.len() as u64));
            }
        }
        let rgb = tokio::task::spawn_blocking(move || decode_average(&bytes))
            .await
            .map_err(|e| VariantError::Task(e.to_string()))??;
        Ok(colors::nearest_name(rgb))
    }
}

impl Default for VariantNamer {
    fn default() -> Self { Self::new(Duration::from_secs(10)) }
}

pub fn fallback_label(index: usize) -> String { format!("Variant {}", index + 1) }

fn decode_average(bytes: &[u8]) -> Result<[u8; 3], VariantError> {
    let img = image::load_from_memory(bytes)?.to_rgba8();
    average_color(&img).ok_or(VariantError::Transparent)
}

/// Mean RGB over pixels that are not (mostly) transparent.
pub fn average_color(img: &RgbaImage) -> Option<[u8; 3]> {
    let (mut sum, mut count) = ([0u64; 3], 0u64);
    for pixel in img.pixels().filter(|p| p.0[3] > MIN_ALPHA) {
        for (acc, channel) in sum.iter_mut().zip(pixel.0) {
            *acc += u64::from(channel);
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(sum.map(|s| u8::try_from(s / count).unwrap_or(u8::MAX)))
}
