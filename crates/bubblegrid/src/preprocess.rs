//! Input decoding and intensity normalization.
//!
//! Accepts raw encoded image bytes or text carrying base64 (optionally behind
//! a `data:image/<type>;base64,` prefix), produces a single-channel image and
//! stretches its intensities to the full 0..=255 range.

use base64::Engine;
use image::GrayImage;

use crate::error::DecodeError;

/// Preprocessing controls.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreprocessConfig {
    /// Linearly stretch intensities so the darkest pixel maps to 0 and the
    /// brightest to 255.
    pub stretch_contrast: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            stretch_contrast: true,
        }
    }
}

/// Image payload handed to the decoder.
#[derive(Debug, Clone, Copy)]
pub enum ImageInput<'a> {
    /// Encoded image file contents (PNG, JPEG, ...).
    Bytes(&'a [u8]),
    /// Base64 text, optionally prefixed with `data:image/<type>;base64,`.
    Text(&'a str),
}

impl<'a> From<&'a [u8]> for ImageInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for ImageInput<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::Bytes(bytes.as_slice())
    }
}

impl<'a> From<&'a str> for ImageInput<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for ImageInput<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text.as_str())
    }
}

/// Remove a leading `data:image/<word>;base64,` prefix if present.
pub(crate) fn strip_data_uri(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("data:image/") else {
        return trimmed;
    };
    let Some(idx) = rest.find(";base64,") else {
        return trimmed;
    };
    let kind = &rest[..idx];
    if kind.is_empty() || !kind.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return trimmed;
    }
    &rest[idx + ";base64,".len()..]
}

/// Decode an [`ImageInput`] to an 8-bit grayscale image.
pub fn load_gray(input: ImageInput<'_>) -> Result<GrayImage, DecodeError> {
    match input {
        ImageInput::Bytes(bytes) => decode_bytes(bytes),
        ImageInput::Text(text) => {
            let payload = strip_data_uri(text);
            if payload.is_empty() {
                return Err(DecodeError::EmptyInput);
            }
            let bytes = base64::engine::general_purpose::STANDARD.decode(payload)?;
            decode_bytes(&bytes)
        }
    }
}

fn decode_bytes(bytes: &[u8]) -> Result<GrayImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::EmptyInput);
    }
    let img = image::load_from_memory(bytes)?;
    Ok(img.to_luma8())
}

/// Stretch intensities linearly onto 0..=255.
///
/// A flat image (min == max) is returned unchanged, so blank frames stay
/// blank instead of being pushed to black.
pub fn stretch_contrast(gray: &GrayImage) -> GrayImage {
    let raw = gray.as_raw();
    let (lo, hi) = raw
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if raw.is_empty() || hi <= lo || (lo == 0 && hi == u8::MAX) {
        return gray.clone();
    }

    let span = (hi - lo) as f32;
    let mut lut = [0u8; 256];
    for (v, out) in lut.iter_mut().enumerate() {
        let shifted = (v as f32 - lo as f32).max(0.0);
        *out = (shifted * 255.0 / span).round().min(255.0) as u8;
    }

    let mut out = gray.clone();
    for px in out.iter_mut() {
        *px = lut[*px as usize];
    }
    out
}

/// Apply the configured preprocessing to an already decoded frame.
pub(crate) fn normalize(gray: &GrayImage, config: &PreprocessConfig) -> GrayImage {
    if config.stretch_contrast {
        stretch_contrast(gray)
    } else {
        gray.clone()
    }
}
