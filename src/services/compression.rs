//! Image compression ahead of upload.
//!
//! Inputs that already fit the byte and dimension budget are stored as-is.
//! Larger ones are downscaled so the longer side fits `max_dimension`,
//! re-encoded in their own format when that format is lossless, and fall
//! back to JPEG with decreasing quality until the byte budget is met.

use async_trait::async_trait;
use bytes::Bytes;
use image::{
    DynamicImage, GenericImageView, ImageFormat, codecs::jpeg::JpegEncoder,
    imageops::FilterType,
};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("unsupported image format")]
    UnsupportedFormat,
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("compression task failed: {0}")]
    Task(String),
}

/// Result of compressing one image.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub data: Bytes,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait ImageCompressor: Send + Sync {
    async fn compress(&self, filename: &str, data: Bytes) -> Result<CompressedImage, CompressionError>;
}

/// Size and dimension budget for stored photos.
#[derive(Debug, Clone, Copy)]
pub struct CompressionLimits {
    pub max_bytes: usize,
    pub max_dimension: u32,
}

impl Default for CompressionLimits {
    fn default() -> Self {
        Self {
            max_bytes: 2 * 1024 * 1024,
            max_dimension: 1920,
        }
    }
}

const JPEG_QUALITY_STEPS: [u8; 6] = [90, 80, 70, 60, 50, 40];

/// `image`-crate backed compressor; work runs on the blocking pool.
#[derive(Debug, Clone, Default)]
pub struct BudgetCompressor {
    pub limits: CompressionLimits,
}

impl BudgetCompressor {
    pub fn new(limits: CompressionLimits) -> Self {
        Self { limits }
    }

    fn compress_blocking(
        limits: CompressionLimits,
        data: &[u8],
    ) -> Result<CompressedImage, CompressionError> {
        let format = image::guess_format(data).map_err(|_| CompressionError::UnsupportedFormat)?;
        let img = image::load_from_memory_with_format(data, format)?;
        let (width, height) = img.dimensions();
        let content_type = format.to_mime_type();

        if data.len() <= limits.max_bytes && width.max(height) <= limits.max_dimension {
            return Ok(CompressedImage {
                data: Bytes::copy_from_slice(data),
                content_type,
                width,
                height,
            });
        }

        let img = if width.max(height) > limits.max_dimension {
            img.resize(limits.max_dimension, limits.max_dimension, FilterType::Lanczos3)
        } else {
            img
        };
        let (width, height) = img.dimensions();

        if matches!(format, ImageFormat::Png) {
            let encoded = encode(&img, ImageFormat::Png)?;
            if encoded.len() <= limits.max_bytes {
                return Ok(CompressedImage {
                    data: encoded,
                    content_type,
                    width,
                    height,
                });
            }
        }

        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let mut best = Bytes::new();
        for quality in JPEG_QUALITY_STEPS {
            best = encode_jpeg(&rgb, quality)?;
            tracing::debug!(quality, size_bytes = best.len(), "jpeg attempt");
            if best.len() <= limits.max_bytes {
                break;
            }
        }

        Ok(CompressedImage {
            data: best,
            content_type: ImageFormat::Jpeg.to_mime_type(),
            width,
            height,
        })
    }
}

#[async_trait]
impl ImageCompressor for BudgetCompressor {
    async fn compress(&self, filename: &str, data: Bytes) -> Result<CompressedImage, CompressionError> {
        let limits = self.limits;
        let original_len = data.len();
        let compressed = tokio::task::spawn_blocking(move || Self::compress_blocking(limits, &data))
            .await
            .map_err(|err| CompressionError::Task(err.to_string()))??;

        tracing::debug!(
            file = %filename,
            original_bytes = original_len,
            size_bytes = compressed.data.len(),
            width = compressed.width,
            height = compressed.height,
            "compressed image"
        );
        Ok(compressed)
    }
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Bytes, CompressionError> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format)?;
    Ok(Bytes::from(buffer))
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes, CompressionError> {
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    img.write_with_encoder(encoder)?;
    Ok(Bytes::from(buffer))
}
