//! Per-question bubble reading: locate each option, measure it, classify.

mod classify;
mod locate;

pub use classify::{classify_fill, measure_brightness, FillClassifierConfig, FillDecision, FillRule};
pub use locate::{locate_bubble, BubbleSearchConfig};

use image::GrayImage;

use crate::grid::GridConfig;
use crate::OPTIONS_PER_QUESTION;

/// One option's measurement.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OptionSample {
    /// One-based option number.
    pub option: u8,
    /// Grid-predicted center.
    pub nominal: [f64; 2],
    /// Center after the darkest-pixel search.
    pub center: [u32; 2],
    /// Mean intensity of the measurement window around `center`.
    pub brightness: f64,
}

/// Everything measured for one question.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct QuestionReading {
    /// One-based question number.
    pub question_number: u32,
    pub samples: [OptionSample; OPTIONS_PER_QUESTION],
    pub decision: FillDecision,
}

impl QuestionReading {
    pub fn selected_answer(&self) -> Option<u8> {
        self.decision.selected
    }
}

/// Pixel radii derived once per sheet from the grid geometry.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BubbleRadii {
    pub search_px: f64,
    pub sample_half_px: u32,
}

impl BubbleRadii {
    pub fn new(grid: &GridConfig, search: &BubbleSearchConfig, fill: &FillClassifierConfig) -> Self {
        Self {
            search_px: grid.option_width * search.radius_frac,
            sample_half_px: (grid.option_width.min(grid.row_height) * fill.sample_radius_frac)
                .round()
                .max(0.0) as u32,
        }
    }
}

/// Locate, measure and classify all options of a zero-based question index.
pub(crate) fn read_question(
    gray: &GrayImage,
    grid: &GridConfig,
    index: u32,
    radii: BubbleRadii,
    search: &BubbleSearchConfig,
    fill: &FillClassifierConfig,
) -> QuestionReading {
    let samples: [OptionSample; OPTIONS_PER_QUESTION] = std::array::from_fn(|i| {
        let option = i as u8 + 1;
        let nominal = grid.option_center(index, option);
        let center = locate_bubble(gray, nominal, radii.search_px, search.step_px);
        OptionSample {
            option,
            nominal,
            center,
            brightness: measure_brightness(gray, center, radii.sample_half_px),
        }
    });
    let brightness = samples.map(|s| s.brightness);
    let decision = classify_fill(&brightness, fill);

    QuestionReading {
        question_number: index + 1,
        samples,
        decision,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridLayoutConfig;
    use crate::sheet::ContentBox;
    use crate::test_utils::fill_rect;
    use image::Luma;

    #[test]
    fn reads_marked_option_from_offset_bubble() {
        let b = ContentBox::new(0, 0, 420, 100).unwrap();
        let layout = GridLayoutConfig {
            questions_per_row: 1,
            ..Default::default()
        };
        let grid = GridConfig::new(&b, 1, &layout);
        let search = BubbleSearchConfig::default();
        let fill = FillClassifierConfig::default();
        let radii = BubbleRadii::new(&grid, &search, &fill);
        // option_width ~ 100 px, so the measurement half-width is 15 px.
        assert_eq!(radii.sample_half_px, 15);

        let mut img = GrayImage::from_pixel(420, 100, Luma([235]));
        // Option 2 is predicted at (223, 55); the filled bubble is printed
        // down and to the right of it.
        fill_rect(&mut img, 225, 50, 265, 90, 70);

        let reading = read_question(&img, &grid, 0, radii, &search, &fill);
        assert_eq!(reading.question_number, 1);
        assert_eq!(reading.selected_answer(), Some(2));
        let s = reading.samples[1];
        assert_eq!(s.option, 2);
        assert_ne!(s.center, [223, 55]);
        assert!((225..=265).contains(&s.center[0]) && (50..=90).contains(&s.center[1]));
        assert!(s.brightness < 235.0);
        assert_eq!(reading.samples[0].brightness, 235.0);
    }
}
