//! High-level decoding API.
//!
//! [`SheetDecoder`] is the primary entry point. It wraps a [`DecodeConfig`]
//! and an optional overlay sink and provides convenience methods for the
//! common input shapes (encoded bytes, base64 text, decoded frames, batches).

use std::path::Path;
use std::sync::atomic::AtomicBool;

use image::GrayImage;
use rayon::prelude::*;

use crate::config::DecodeConfig;
use crate::error::{ConfigError, ScanError};
use crate::overlay::{render_overlay, OverlaySink, OverlayStyle};
use crate::pipeline::{self, SheetScan};
use crate::preprocess::{load_gray, ImageInput};
use crate::QuestionAnswer;

/// Primary decoding interface.
///
/// Create once, decode many frames. Decoding takes `&self` and keeps no
/// state between calls, so one decoder can be shared across threads.
///
/// # Examples
///
/// ```no_run
/// use bubblegrid::{SheetDecoder, DEFAULT_TOTAL_QUESTIONS};
///
/// let bytes = std::fs::read("sheet.jpg").unwrap();
/// let decoder = SheetDecoder::new();
/// match decoder.decode(&bytes, DEFAULT_TOTAL_QUESTIONS) {
///     Ok(answers) => println!("{} answers", answers.len()),
///     Err(e) if e.is_sheet_not_found() => println!("reposition the sheet"),
///     Err(e) => eprintln!("decode failed: {e}"),
/// }
/// ```
pub struct SheetDecoder {
    config: DecodeConfig,
    overlay: Option<Box<dyn OverlaySink>>,
    overlay_style: OverlayStyle,
}

impl Default for SheetDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SheetDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetDecoder")
            .field("config", &self.config)
            .field("overlay", &self.overlay.is_some())
            .finish()
    }
}

impl SheetDecoder {
    /// Create a decoder with the default configuration.
    pub fn new() -> Self {
        Self::with_config(DecodeConfig::default())
    }

    /// Create with full config control.
    pub fn with_config(config: DecodeConfig) -> Self {
        Self {
            config,
            overlay: None,
            overlay_style: OverlayStyle::default(),
        }
    }

    /// Load a (partial) JSON config and create a decoder in one step.
    pub fn from_config_json_file(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::with_config(DecodeConfig::from_json_file(path)?))
    }

    /// Attach a sink receiving an annotated overlay after every successful decode.
    pub fn with_overlay_sink(mut self, sink: impl OverlaySink + 'static) -> Self {
        self.overlay = Some(Box::new(sink));
        self
    }

    /// Replace the overlay colors and marker size.
    pub fn with_overlay_style(mut self, style: OverlayStyle) -> Self {
        self.overlay_style = style;
        self
    }

    /// Access the current configuration.
    pub fn config(&self) -> &DecodeConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    ///
    /// Changes are checked with [`DecodeConfig::validate`] on the next decode,
    /// which fails with [`ScanError::Config`] if they are rejected.
    pub fn config_mut(&mut self) -> &mut DecodeConfig {
        &mut self.config
    }

    /// Decode one sheet into exactly `total_questions` answers.
    pub fn decode<'a>(
        &self,
        input: impl Into<ImageInput<'a>>,
        total_questions: u32,
    ) -> Result<Vec<QuestionAnswer>, ScanError> {
        Ok(self.decode_detailed(input, total_questions)?.answers())
    }

    /// Decode one sheet and keep every intermediate measurement.
    pub fn decode_detailed<'a>(
        &self,
        input: impl Into<ImageInput<'a>>,
        total_questions: u32,
    ) -> Result<SheetScan, ScanError> {
        let gray = load_gray(input.into())?;
        self.run(&gray, total_questions, None)
    }

    /// Decode a frame the caller already holds in grayscale.
    pub fn decode_gray(&self, gray: &GrayImage, total_questions: u32) -> Result<SheetScan, ScanError> {
        self.run(gray, total_questions, None)
    }

    /// Decode with cooperative cancellation.
    ///
    /// `cancel` is checked between questions. Setting it makes the call
    /// return [`ScanError::Cancelled`]; partial answers are discarded.
    pub fn decode_cancellable<'a>(
        &self,
        input: impl Into<ImageInput<'a>>,
        total_questions: u32,
        cancel: &AtomicBool,
    ) -> Result<Vec<QuestionAnswer>, ScanError> {
        let gray = load_gray(input.into())?;
        Ok(self.run(&gray, total_questions, Some(cancel))?.answers())
    }

    /// Decode independent images in parallel. Results keep input order.
    ///
    /// No overlay is emitted: a sink receives one image per decode and has no
    /// way to tell batch members apart. Decode images one at a time to get
    /// overlays.
    pub fn decode_batch(
        &self,
        inputs: &[ImageInput<'_>],
        total_questions: u32,
    ) -> Vec<Result<Vec<QuestionAnswer>, ScanError>> {
        inputs
            .par_iter()
            .map(|&input| -> Result<Vec<QuestionAnswer>, ScanError> {
                let gray = load_gray(input)?;
                let scan = pipeline::scan_gray(&gray, total_questions, &self.config, None)?;
                Ok(scan.answers())
            })
            .collect()
    }

    fn run(
        &self,
        gray: &GrayImage,
        total_questions: u32,
        cancel: Option<&AtomicBool>,
    ) -> Result<SheetScan, ScanError> {
        let scan = pipeline::scan_gray(gray, total_questions, &self.config, cancel)?;
        if let Some(sink) = &self.overlay {
            let overlay = render_overlay(gray, &scan, &self.overlay_style);
            if let Err(e) = sink.write_overlay(&overlay) {
                tracing::warn!("overlay not written: {}", e);
            }
        }
        Ok(scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, OverlayError};
    use crate::test_utils::{encode_png, standard_sheet};
    use base64::Engine;
    use image::{Luma, RgbImage};
    use std::sync::{Arc, Mutex};

    struct FailingSink;

    impl OverlaySink for FailingSink {
        fn write_overlay(&self, _overlay: &RgbImage) -> Result<(), OverlayError> {
            Err(OverlayError::Io(std::io::Error::other("disk full")))
        }
    }

    #[derive(Clone, Default)]
    struct RecordingSink(Arc<Mutex<Vec<(u32, u32)>>>);

    impl OverlaySink for RecordingSink {
        fn write_overlay(&self, overlay: &RgbImage) -> Result<(), OverlayError> {
            self.0.lock().unwrap().push(overlay.dimensions());
            Ok(())
        }
    }

    #[test]
    fn decodes_png_bytes_and_data_uri() {
        let sheet = standard_sheet();
        let png = encode_png(&sheet.image);
        let decoder = SheetDecoder::new();

        let from_bytes = decoder.decode(&png, 100).expect("png decode");
        let got: Vec<_> = from_bytes.iter().map(|a| a.selected_answer).collect();
        assert_eq!(got, sheet.answers);

        let uri = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );
        let from_text = decoder.decode(&uri, 100).expect("data uri decode");
        assert_eq!(from_text, from_bytes);
    }

    #[test]
    fn malformed_input_is_a_decode_error() {
        let decoder = SheetDecoder::new();
        let err = decoder.decode(&b"not an image"[..], 100).unwrap_err();
        assert!(matches!(err, ScanError::Decode(DecodeError::Image(_))));
        assert!(!err.is_sheet_not_found());

        let err = decoder.decode("data:image/png;base64,@@@", 100).unwrap_err();
        assert!(matches!(err, ScanError::Decode(DecodeError::Base64(_))));
        let err = decoder.decode("", 100).unwrap_err();
        assert!(matches!(err, ScanError::Decode(DecodeError::EmptyInput)));
    }

    #[test]
    fn overlay_failure_does_not_affect_result() {
        let sheet = standard_sheet();
        let plain = SheetDecoder::new().decode_gray(&sheet.image, 100).unwrap();
        let with_failing = SheetDecoder::new()
            .with_overlay_sink(FailingSink)
            .decode_gray(&sheet.image, 100)
            .expect("overlay errors are swallowed");
        assert_eq!(with_failing.answers(), plain.answers());
    }

    #[test]
    fn overlay_is_delivered_once_per_successful_decode() {
        let sheet = standard_sheet();
        let sink = RecordingSink::default();
        let decoder = SheetDecoder::new().with_overlay_sink(sink.clone());
        decoder.decode_gray(&sheet.image, 100).unwrap();
        let blank = GrayImage::from_pixel(100, 100, Luma([255]));
        assert!(decoder.decode_gray(&blank, 100).is_err());
        assert_eq!(*sink.0.lock().unwrap(), vec![(1000, 1400)]);
    }

    #[test]
    fn batch_keeps_input_order() {
        let sheet = standard_sheet();
        let png = encode_png(&sheet.image);
        let white = encode_png(&GrayImage::from_pixel(200, 200, Luma([255])));
        let inputs = [
            ImageInput::from(&png),
            ImageInput::from(&white),
            ImageInput::from(&png),
        ];
        let results = SheetDecoder::new().decode_batch(&inputs, 100);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ScanError::NoContentDetected)));
        assert_eq!(results[2].as_ref().unwrap(), results[0].as_ref().unwrap());
    }

    #[test]
    fn batch_does_not_emit_overlays() {
        let png = encode_png(&standard_sheet().image);
        let sink = RecordingSink::default();
        let decoder = SheetDecoder::new().with_overlay_sink(sink.clone());
        let inputs = [ImageInput::from(&png), ImageInput::from(&png)];
        let results = decoder.decode_batch(&inputs, 100);
        assert!(results.iter().all(|r| r.is_ok()));
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[test]
    fn rejected_tuning_fails_the_decode() {
        let sheet = standard_sheet();
        let mut decoder = SheetDecoder::new();
        decoder.config_mut().layout.option_width_divisor = 0.0;
        let err = decoder.decode_gray(&sheet.image, 100).unwrap_err();
        assert!(matches!(err, ScanError::Config(ConfigError::Invalid(_))));

        let mut config = DecodeConfig::default();
        config.locate.radius_frac = 1e12;
        let err = SheetDecoder::with_config(config)
            .decode_gray(&sheet.image, 100)
            .unwrap_err();
        assert!(matches!(err, ScanError::Config(_)));
        assert!(!err.is_sheet_not_found());
    }

    #[test]
    fn cancellable_decode_respects_flag() {
        let png = encode_png(&standard_sheet().image);
        let decoder = SheetDecoder::new();
        let flag = AtomicBool::new(true);
        assert!(matches!(
            decoder.decode_cancellable(&png, 100, &flag),
            Err(ScanError::Cancelled)
        ));
        flag.store(false, std::sync::atomic::Ordering::Relaxed);
        assert_eq!(decoder.decode_cancellable(&png, 100, &flag).unwrap().len(), 100);
    }

    #[test]
    fn config_mut_changes_behavior() {
        let sheet = standard_sheet();
        let mut decoder = SheetDecoder::new();
        decoder.config_mut().validation.ink_coverage_range = [0.5, 0.6];
        assert!(!decoder.config().validation.ink_coverage_range.contains(&0.05));
        let err = decoder.decode_gray(&sheet.image, 100).unwrap_err();
        assert!(err.is_sheet_not_found());
    }
}
