//! Error taxonomy for sheet decoding.
//!
//! Two families matter to callers:
//! - [`DecodeError`]: the input bytes are not a usable image. Always fatal.
//! - [`ScanError::NoContentDetected`] / [`ScanError::InvalidSheet`]: the image
//!   decoded fine but does not look like an answer sheet. A live-scanning
//!   caller should silently grab a new frame and try again.

use thiserror::Error;

use crate::sheet::ValidationMetrics;

/// Phrase carried by every "no sheet in view" message.
///
/// Remote callers that only see the rendered message can match on it to tell
/// "reposition the sheet" apart from a genuine failure.
pub const SHEET_NOT_FOUND_MARKER: &str = "Unidentified object detected";

/// The input could not be interpreted as an image.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No bytes (or an empty text payload) were supplied.
    #[error("image data is empty")]
    EmptyInput,
    /// Text input was not valid base64 after stripping the data-URI prefix.
    #[error("image data is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Bytes were not a supported image format.
    #[error("failed to decode image: {0}")]
    Image(#[from] image::ImageError),
}

/// Which sheet validation check failed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheetRejection {
    /// Ink coverage inside the content box is outside the accepted range.
    InkCoverage,
    /// Content box is too elongated.
    AspectRatio,
    /// Content box covers too little of the frame.
    ContentArea,
    /// Content box is too narrow or too short relative to the frame.
    MinDimension,
}

impl std::fmt::Display for SheetRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let what = match self {
            Self::InkCoverage => "ink coverage out of range",
            Self::AspectRatio => "content aspect ratio out of range",
            Self::ContentArea => "content area too small",
            Self::MinDimension => "content box too narrow or too short",
        };
        f.write_str(what)
    }
}

/// Errors returned by the decode pipeline.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Input was not a decodable image.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// No ink was found along the bounding-box sampling lines.
    #[error("Unidentified object detected - position the answer sheet in view (no content found)")]
    NoContentDetected,
    /// A content box was found but failed sheet validation.
    #[error("Unidentified object detected - position the answer sheet in view ({rejection})")]
    InvalidSheet {
        /// First failed check.
        rejection: SheetRejection,
        /// All measurements taken during validation.
        metrics: ValidationMetrics,
    },
    /// `total_questions` was zero.
    #[error("total question count must be at least 1")]
    InvalidQuestionCount,
    /// The decoder configuration failed [`crate::DecodeConfig::validate`].
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The caller abandoned the decode before it finished.
    #[error("decode cancelled")]
    Cancelled,
}

impl ScanError {
    /// `true` when the frame simply did not contain a recognizable sheet.
    ///
    /// Continuous-scanning callers retry with a new frame in this case.
    pub fn is_sheet_not_found(&self) -> bool {
        matches!(self, Self::NoContentDetected | Self::InvalidSheet { .. })
    }
}

/// Errors loading or validating a [`crate::DecodeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors from the diagnostic overlay side channel.
#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("overlay I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("overlay encoding failed: {0}")]
    Image(#[from] image::ImageError),
}
