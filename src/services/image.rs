use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Downsizing and re-encoding applied to every image before upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePolicy {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality, 1..=100
    pub quality: u8,
}

impl Default for ImagePolicy {
    fn default() -> Self {
        ImagePolicy {
            max_width: 400,
            max_height: 400,
            quality: 30,
        }
    }
}

impl ImagePolicy {
    pub fn from_config(config: &Config) -> Self {
        ImagePolicy {
            max_width: config.image_max_width.max(1),
            max_height: config.image_max_height.max(1),
            quality: config.image_quality.clamp(1, 100),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageProcessor {
    policy: ImagePolicy,
}

impl ImageProcessor {
    pub fn new(policy: ImagePolicy) -> Self {
        ImageProcessor { policy }
    }

    pub fn policy(&self) -> ImagePolicy {
        self.policy
    }

    /// Decodes, shrinks to fit the policy box (never enlarges, keeps aspect
    /// ratio) and encodes as JPEG on the blocking pool.
    pub async fn compress(&self, raw: Bytes) -> AppResult<Vec<u8>> {
        let policy = self.policy;
        tokio::task::spawn_blocking(move || compress_jpeg(&raw, policy)).await?
    }
}

fn compress_jpeg(raw: &[u8], policy: ImagePolicy) -> AppResult<Vec<u8>> {
    if raw.is_empty() {
        return Err(AppError::ImageCompression("empty image data".to_string()));
    }

    let image = image::load_from_memory(raw)?;
    let (width, height) = (image.width(), image.height());

    let image = if width > policy.max_width || height > policy.max_height {
        image.resize(policy.max_width, policy.max_height, FilterType::Triangle)
    } else {
        image
    };

    let rgb = image.to_rgb8();
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, policy.quality).encode_image(&rgb)?;

    debug!(
        "Compressed {}x{} image ({} bytes) to {}x{} ({} bytes)",
        width,
        height,
        raw.len(),
        rgb.width(),
        rgb.height(),
        encoded.len()
    );
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Bytes {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            image::Rgb([200, 120, 40]),
        ));
        let mut out = Cursor::new(Vec::new());
        image.write_to(&mut out, ImageFormat::Png).unwrap();
        Bytes::from(out.into_inner())
    }

    #[tokio::test]
    async fn test_large_image_is_bounded_and_keeps_aspect() {
        let processor = ImageProcessor::new(ImagePolicy::default());
        let jpeg = processor.compress(png_bytes(800, 600)).await.unwrap();

        let decoded = image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (400, 300));
    }

    #[tokio::test]
    async fn test_small_image_is_not_enlarged() {
        let processor = ImageProcessor::new(ImagePolicy::default());
        let jpeg = processor.compress(png_bytes(120, 80)).await.unwrap();

        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (120, 80));
    }

    #[tokio::test]
    async fn test_garbage_is_a_compression_error() {
        let processor = ImageProcessor::new(ImagePolicy::default());

        let err = processor
            .compress(Bytes::from_static(b"definitely not an image"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ImageCompression(_)));

        let err = processor.compress(Bytes::new()).await.unwrap_err();
        assert!(matches!(err, AppError::ImageCompression(_)));
    }
}
