use std::sync::atomic::{AtomicBool, Ordering};

use image::GrayImage;

use super::SheetScan;
use crate::bubble::{read_question, BubbleRadii};
use crate::config::DecodeConfig;
use crate::error::ScanError;
use crate::grid::GridConfig;
use crate::preprocess;
use crate::sheet::{detect_content_box, validate_sheet};

/// Run the full pipeline over an already decoded frame.
///
/// `cancel` is polled before every question; once set, the scan stops with
/// [`ScanError::Cancelled`] and no partial answers are returned.
pub(crate) fn scan_gray(
    gray: &GrayImage,
    total_questions: u32,
    config: &DecodeConfig,
    cancel: Option<&AtomicBool>,
) -> Result<SheetScan, ScanError> {
    scan_until(gray, total_questions, config, |_| {
        cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
    })
}

/// Pipeline body. `cancelled(index)` is asked before reading each question.
fn scan_until(
    gray: &GrayImage,
    total_questions: u32,
    config: &DecodeConfig,
    mut cancelled: impl FnMut(u32) -> bool,
) -> Result<SheetScan, ScanError> {
    if total_questions == 0 {
        return Err(ScanError::InvalidQuestionCount);
    }
    config.validate()?;
    let (w, h) = gray.dimensions();
    tracing::debug!("scanning {}x{} frame for {} questions", w, h, total_questions);

    let normalized = preprocess::normalize(gray, &config.preprocess);

    let Some(content_box) = detect_content_box(&normalized, config.ink_threshold, &config.content_box)
    else {
        tracing::debug!("no ink along the sampling lines");
        return Err(ScanError::NoContentDetected);
    };
    tracing::debug!(
        "content box x={}..{} y={}..{}",
        content_box.min_x(),
        content_box.max_x(),
        content_box.min_y(),
        content_box.max_y()
    );

    let (metrics, verdict) = validate_sheet(
        &normalized,
        &content_box,
        config.ink_threshold,
        &config.validation,
    );
    if let Err(rejection) = verdict {
        tracing::debug!(
            "sheet rejected ({}): coverage={:.3} aspect={:.3} area={:.3} min_dim={:.3}",
            rejection,
            metrics.ink_coverage,
            metrics.aspect_ratio,
            metrics.content_area_fraction,
            metrics.min_dimension_ratio
        );
        return Err(ScanError::InvalidSheet { rejection, metrics });
    }

    let grid = GridConfig::new(&content_box, total_questions, &config.layout);
    let radii = BubbleRadii::new(&grid, &config.locate, &config.classify);
    tracing::debug!(
        "grid {}x{} row_height={:.2} option_width={:.2} search={:.2}px window={}px",
        grid.questions_per_row,
        grid.rows,
        grid.row_height,
        grid.option_width,
        radii.search_px,
        radii.sample_half_px
    );

    let mut questions = Vec::with_capacity(total_questions as usize);
    for index in 0..total_questions {
        if cancelled(index) {
            tracing::debug!("scan cancelled at question {}", index + 1);
            return Err(ScanError::Cancelled);
        }
        let reading = read_question(
            &normalized,
            &grid,
            index,
            radii,
            &config.locate,
            &config.classify,
        );
        tracing::trace!(
            "q{} brightness={:?} -> {:?} ({:?})",
            reading.question_number,
            reading.samples.map(|s| s.brightness),
            reading.decision.selected,
            reading.decision.rule
        );
        questions.push(reading);
    }

    let scan = SheetScan {
        image_size: [w, h],
        content_box,
        metrics,
        grid,
        questions,
    };
    tracing::info!(
        "{} of {} questions answered",
        scan.answered_count(),
        total_questions
    );
    Ok(scan)
}
