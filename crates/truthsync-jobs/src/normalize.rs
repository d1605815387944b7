//! Image normalization: orientation correction, portrait policy, bounded
//! downscale, and JPEG re-encode.
//!
//! Pure transform over the uploaded bytes; no side effects, safe to retry.

use std::io::Cursor;

use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage};
use tracing::{debug, warn};

use truthsync_core::{defaults, Error, Result};

/// An oriented, size-capped, re-encoded image ready for generation and
/// persistence.
#[derive(Debug, Clone)]
pub struct NormalizedImage {
    /// JPEG-encoded bytes.
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Whether the landscape-to-portrait rotation was applied.
    pub rotated_to_portrait: bool,
}

/// Normalize raw upload bytes.
///
/// - Rejects payloads over [`defaults::MAX_UPLOAD_BYTES`] before decoding.
/// - Rejects bytes that do not decode as an image.
/// - Applies the EXIF orientation tag so the image displays upright.
/// - Rotates landscape images a further 90° so every normalized image is
///   portrait-oriented (fixed product policy).
/// - Downscales (never upscales) to fit within 1920×1080, Lanczos3.
/// - Re-encodes as JPEG quality 85.
pub fn normalize(raw: &[u8]) -> Result<NormalizedImage> {
    if raw.len() > defaults::MAX_UPLOAD_BYTES {
        return Err(Error::ImageTooLarge(raw.len()));
    }

    let mut img =
        image::load_from_memory(raw).map_err(|e| Error::ImageUndecodable(e.to_string()))?;

    match exif_orientation(raw) {
        Some(3) => img = img.rotate180(),
        Some(6) => img = img.rotate90(),
        Some(8) => img = img.rotate270(),
        _ => {}
    }

    let rotated_to_portrait = img.width() > img.height();
    if rotated_to_portrait {
        img = img.rotate270();
        debug!(
            subsystem = "jobs",
            component = "normalizer",
            op = "normalize",
            width = img.width(),
            height = img.height(),
            "Rotated landscape capture to portrait"
        );
    }

    if img.width() > defaults::MAX_IMAGE_WIDTH || img.height() > defaults::MAX_IMAGE_HEIGHT {
        img = img.resize(
            defaults::MAX_IMAGE_WIDTH,
            defaults::MAX_IMAGE_HEIGHT,
            FilterType::Lanczos3,
        );
    }

    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let (width, height) = (rgb.width(), rgb.height());

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut bytes), defaults::JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| Error::Internal(format!("JPEG encode failed: {}", e)))?;

    Ok(NormalizedImage {
        bytes,
        width,
        height,
        rotated_to_portrait,
    })
}

/// Read the EXIF orientation tag (274). Best-effort: any read failure is
/// treated as "no orientation metadata".
fn exif_orientation(raw: &[u8]) -> Option<u32> {
    let mut cursor = Cursor::new(raw);
    let reader = exif::Reader::new();
    let parsed = match reader.read_from_container(&mut cursor) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(
                subsystem = "jobs",
                component = "normalizer",
                op = "exif",
                error = %e,
                "EXIF metadata unreadable, skipping orientation correction"
            );
            return None;
        }
    };
    parsed
        .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
}
