//! Relative-darkness fill classification.
//!
//! A global brightness threshold breaks under varying exposure, so each option
//! is judged against the other options of the same question. The cascade
//! starts with a strict relative test and falls back to looser mixed
//! absolute/relative tests to pick up faint pencil marks. A question where
//! none of them fires is reported as unanswered.

use image::GrayImage;

use crate::OPTIONS_PER_QUESTION;

/// Measurement window and cascade constants.
///
/// The defaults were tuned empirically on typical sheets; accuracy on a new
/// template depends on recalibrating them.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FillClassifierConfig {
    /// Window half-width as a fraction of `min(option_width, row_height)`.
    pub sample_radius_frac: f64,
    /// Rule 1: darkest < mean(others) * ratio.
    pub others_ratio: f64,
    /// Rule 2: darkest below this ...
    pub absolute_dark_max: f64,
    /// ... while mean(others) is above this.
    pub absolute_others_min: f64,
    /// Rule 3: second - darkest above this ...
    pub second_gap_min: f64,
    /// ... with darkest below this.
    pub second_gap_dark_max: f64,
    /// Rule 4: darkest < mean(all) * ratio.
    pub all_ratio: f64,
    /// Rule 5: mean(others) - darkest above this ...
    pub others_gap_min: f64,
    /// ... with darkest below this.
    pub others_gap_dark_max: f64,
    /// Rule 6: second - darkest above this ...
    pub weak_second_gap_min: f64,
    /// ... with darkest below this.
    pub weak_second_gap_dark_max: f64,
}

impl Default for FillClassifierConfig {
    fn default() -> Self {
        Self {
            sample_radius_frac: 0.15,
            others_ratio: 0.92,
            absolute_dark_max: 150.0,
            absolute_others_min: 165.0,
            second_gap_min: 12.0,
            second_gap_dark_max: 180.0,
            all_ratio: 0.88,
            others_gap_min: 10.0,
            others_gap_dark_max: 190.0,
            weak_second_gap_min: 8.0,
            weak_second_gap_dark_max: 200.0,
        }
    }
}

/// Cascade rule that selected an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillRule {
    OthersRatio,
    AbsoluteContrast,
    SecondGap,
    AllRatio,
    OthersGap,
    WeakSecondGap,
}

/// Outcome of classifying one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FillDecision {
    /// One-based selected option, `None` for blank or ambiguous rows.
    pub selected: Option<u8>,
    /// Rule that fired, if any.
    pub rule: Option<FillRule>,
}

impl FillDecision {
    const NONE: Self = Self {
        selected: None,
        rule: None,
    };
}

/// Mean intensity over the square window of half-width `half` around
/// `center`, clamped to the image.
pub fn measure_brightness(gray: &GrayImage, center: [u32; 2], half: u32) -> f64 {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return 0.0;
    }
    let x0 = center[0].saturating_sub(half);
    let y0 = center[1].saturating_sub(half);
    let x1 = center[0].saturating_add(half).min(w - 1);
    let y1 = center[1].saturating_add(half).min(h - 1);

    let mut sum = 0u64;
    let mut n = 0u64;
    for y in y0..=y1 {
        for x in x0..=x1 {
            sum += gray.get_pixel(x, y)[0] as u64;
            n += 1;
        }
    }
    if n == 0 {
        return 0.0;
    }
    sum as f64 / n as f64
}

/// Pick the filled option from one question's brightness samples.
///
/// `brightness[i]` belongs to option `i + 1`. Equal values keep option order,
/// so a tie for darkest resolves to the lower option number.
pub fn classify_fill(
    brightness: &[f64; OPTIONS_PER_QUESTION],
    config: &FillClassifierConfig,
) -> FillDecision {
    let mut order: [usize; OPTIONS_PER_QUESTION] = std::array::from_fn(|i| i);
    order.sort_by(|&a, &b| brightness[a].total_cmp(&brightness[b]));

    let darkest = brightness[order[0]];
    let second = brightness[order[1]];
    let avg_others =
        order[1..].iter().map(|&i| brightness[i]).sum::<f64>() / (OPTIONS_PER_QUESTION - 1) as f64;
    let avg_all = brightness.iter().sum::<f64>() / OPTIONS_PER_QUESTION as f64;

    let rule = if darkest < avg_others * config.others_ratio {
        Some(FillRule::OthersRatio)
    } else if darkest < config.absolute_dark_max && avg_others > config.absolute_others_min {
        Some(FillRule::AbsoluteContrast)
    } else if second - darkest > config.second_gap_min && darkest < config.second_gap_dark_max {
        Some(FillRule::SecondGap)
    } else if darkest < avg_all * config.all_ratio {
        Some(FillRule::AllRatio)
    } else if avg_others - darkest > config.others_gap_min
        && darkest < config.others_gap_dark_max
    {
        Some(FillRule::OthersGap)
    } else if second - darkest > config.weak_second_gap_min
        && darkest < config.weak_second_gap_dark_max
    {
        Some(FillRule::WeakSecondGap)
    } else {
        None
    };

    match rule {
        Some(rule) => FillDecision {
            selected: Some(order[0] as u8 + 1),
            rule: Some(rule),
        },
        None => FillDecision::NONE,
    }
}
