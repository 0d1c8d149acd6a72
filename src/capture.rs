use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::GenericImageView as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use thiserror::Error;

use crate::{
    AppError, ErrorKind, MAX_IMAGE_ALLOC, MAX_IMAGE_BYTES, MAX_IMAGE_DIMENSION,
    MAX_PROCESSED_DIMENSION,
};

/// Formats accepted from the file picker and the camera shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
}

impl ImageFormat {
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }

    const fn decoder_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::WebP => image::ImageFormat::WebP,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptureError {
    #[error("image data is empty")]
    Empty,

    #[error("image size {size} bytes exceeds maximum of {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("unsupported image format; use JPEG, PNG or WebP")]
    UnsupportedFormat,

    #[error("failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("failed to encode image: {0}")]
    EncodeFailed(String),
}

impl From<CaptureError> for AppError {
    fn from(e: CaptureError) -> Self {
        let message = match &e {
            CaptureError::Empty | CaptureError::DecodeFailed(_) => {
                "Unable to read that image. Please try a different photo.".to_string()
            }
            CaptureError::TooLarge { max, .. } => format!(
                "The image is too large. Please use an image smaller than {} MB.",
                max / 1_000_000
            ),
            CaptureError::UnsupportedFormat => {
                "This image format is not supported. Please use JPEG, PNG, or WebP.".to_string()
            }
            CaptureError::EncodeFailed(_) => {
                "Unable to process the image. Please try a different photo.".to_string()
            }
        };
        AppError::new(ErrorKind::Validation, message)
    }
}

/// The in-memory image staged for submission: a normalized JPEG payload
/// plus a display-ready preview. At most one is live per session; the
/// generation tag ties in-flight submissions to the image they were made
/// for, so a stale response can be recognized and discarded.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedImage {
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub preview_uri: String,
    pub file_name: String,
    pub generation: u64,
}

// Redact payload bytes from debug output.
impl fmt::Debug for StagedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagedImage")
            .field("bytes", &self.data.len())
            .field("mime_type", &self.mime_type)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("file_name", &self.file_name)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Validates and normalizes an incoming image payload into a [`StagedImage`].
///
/// Oversized payloads are rejected before decoding; decoding runs under
/// dimension and allocation limits; anything larger than
/// `MAX_PROCESSED_DIMENSION` on either side is downscaled. The output is
/// always RGB JPEG, which is what the classifier expects.
pub fn stage_image(
    file_name: &str,
    data: &[u8],
    generation: u64,
) -> Result<StagedImage, CaptureError> {
    if data.is_empty() {
        return Err(CaptureError::Empty);
    }

    if data.len() > MAX_IMAGE_BYTES {
        return Err(CaptureError::TooLarge {
            size: data.len(),
            max: MAX_IMAGE_BYTES,
        });
    }

    let format = ImageFormat::from_magic_bytes(data).ok_or(CaptureError::UnsupportedFormat)?;

    let mut limits = image::Limits::default();
    limits.max_image_width = Some(MAX_IMAGE_DIMENSION);
    limits.max_image_height = Some(MAX_IMAGE_DIMENSION);
    limits.max_alloc = Some(MAX_IMAGE_ALLOC);

    let mut reader = image::ImageReader::with_format(Cursor::new(data), format.decoder_format());
    reader.limits(limits);

    let decoded = reader
        .decode()
        .map_err(|e| CaptureError::DecodeFailed(e.to_string()))?;

    let image = if decoded.width() > MAX_PROCESSED_DIMENSION
        || decoded.height() > MAX_PROCESSED_DIMENSION
    {
        decoded.resize(
            MAX_PROCESSED_DIMENSION,
            MAX_PROCESSED_DIMENSION,
            image::imageops::FilterType::Lanczos3,
        )
    } else {
        decoded
    };

    let (width, height) = (image.width(), image.height());

    let mut jpeg = Vec::new();
    image
        .to_rgb8()
        .write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
        .map_err(|e| CaptureError::EncodeFailed(e.to_string()))?;

    let preview_uri = format!("data:image/jpeg;base64,{}", BASE64.encode(&jpeg));

    Ok(StagedImage {
        data: jpeg,
        mime_type: ImageFormat::Jpeg.mime_type().to_string(),
        width,
        height,
        preview_uri,
        file_name: file_name.to_string(),
        generation,
    })
}

/// Live-camera sub-machine. `Opening` covers the window between asking the
/// shell for the device stream and its acknowledgment; the stream itself
/// exists only from a successful open until the single release that every
/// exit path must issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraPhase {
    #[default]
    Closed,
    Opening,
    Streaming,
}

impl CameraPhase {
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }

    #[must_use]
    pub const fn is_streaming(self) -> bool {
        matches!(self, Self::Streaming)
    }

    /// True while the shell may still hand us a stream we must release.
    #[must_use]
    pub const fn holds_or_awaits_stream(self) -> bool {
        matches!(self, Self::Opening | Self::Streaming)
    }
}
