//! Aggregate decoder configuration.
//!
//! Every tuned constant of the pipeline lives here, grouped by stage. JSON
//! overrides may be partial: missing fields keep their defaults, unknown
//! fields are rejected.

use std::path::Path;

use crate::bubble::{BubbleSearchConfig, FillClassifierConfig};
use crate::error::ConfigError;
use crate::grid::GridLayoutConfig;
use crate::preprocess::PreprocessConfig;
use crate::sheet::{ContentBoxConfig, MissingContentPolicy, SheetValidationConfig};

/// Default intensity below which a pixel counts as ink.
pub const DEFAULT_INK_THRESHOLD: u8 = 200;

/// Full pipeline configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeConfig {
    /// Ink threshold shared by content-box detection and sheet validation.
    pub ink_threshold: u8,
    pub preprocess: PreprocessConfig,
    pub content_box: ContentBoxConfig,
    pub validation: SheetValidationConfig,
    pub layout: GridLayoutConfig,
    pub locate: BubbleSearchConfig,
    pub classify: FillClassifierConfig,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            ink_threshold: DEFAULT_INK_THRESHOLD,
            preprocess: PreprocessConfig::default(),
            content_box: ContentBoxConfig::default(),
            validation: SheetValidationConfig::default(),
            layout: GridLayoutConfig::default(),
            locate: BubbleSearchConfig::default(),
            classify: FillClassifierConfig::default(),
        }
    }
}

fn check_fraction(name: &str, v: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&v) {
        return Err(ConfigError::Invalid(format!(
            "{name} must lie in [0, 1], got {v}"
        )));
    }
    Ok(())
}

fn check_range(name: &str, [lo, hi]: [f64; 2]) -> Result<(), ConfigError> {
    if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
        return Err(ConfigError::Invalid(format!(
            "{name} must be a finite [min, max] pair, got [{lo}, {hi}]"
        )));
    }
    Ok(())
}

impl DecodeConfig {
    /// Load a (possibly partial) configuration from a JSON file and validate it.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    /// Parse a (possibly partial) JSON configuration and validate it.
    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the pipeline meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cb = &self.content_box;
        check_fraction("content_box.horizontal_scan_frac", cb.horizontal_scan_frac)?;
        for frac in cb.vertical_scan_fracs {
            check_fraction("content_box.vertical_scan_fracs", frac)?;
        }
        check_fraction("content_box.expand_frac", cb.expand_frac)?;
        if let MissingContentPolicy::FixedMargin { margin_frac } = cb.on_missing {
            if !(0.0..0.5).contains(&margin_frac) {
                return Err(ConfigError::Invalid(format!(
                    "content_box.on_missing.margin_frac must lie in [0, 0.5), got {margin_frac}"
                )));
            }
        }

        let v = &self.validation;
        if v.sample_stride == 0 {
            return Err(ConfigError::Invalid(
                "validation.sample_stride must be at least 1".into(),
            ));
        }
        check_range("validation.ink_coverage_range", v.ink_coverage_range)?;
        check_range("validation.aspect_ratio_range", v.aspect_ratio_range)?;
        check_fraction("validation.min_area_fraction", v.min_area_fraction)?;
        check_fraction("validation.min_dimension_fraction", v.min_dimension_fraction)?;

        let l = &self.layout;
        if l.questions_per_row == 0 {
            return Err(ConfigError::Invalid(
                "layout.questions_per_row must be at least 1".into(),
            ));
        }
        if !(l.option_width_divisor.is_finite() && l.option_width_divisor > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "layout.option_width_divisor must be positive, got {}",
                l.option_width_divisor
            )));
        }

        if self.locate.step_px == 0 {
            return Err(ConfigError::Invalid("locate.step_px must be at least 1".into()));
        }
        check_fraction("locate.radius_frac", self.locate.radius_frac)?;
        check_fraction("classify.sample_radius_frac", self.classify.sample_radius_frac)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        DecodeConfig::default().validate().expect("valid defaults");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = DecodeConfig::from_json_str(
            r#"{ "ink_threshold": 180, "layout": { "questions_per_row": 5 } }"#,
        )
        .expect("parse");
        assert_eq!(cfg.ink_threshold, 180);
        assert_eq!(cfg.layout.questions_per_row, 5);
        assert_eq!(cfg.layout.option_width_divisor, 4.2);
        assert_eq!(cfg.classify.others_ratio, 0.92);
        assert_eq!(cfg.content_box.on_missing, MissingContentPolicy::Reject);
    }

    #[test]
    fn fixed_margin_policy_parses() {
        let cfg = DecodeConfig::from_json_str(
            r#"{ "content_box": { "on_missing": { "mode": "fixed_margin", "margin_frac": 0.05 } } }"#,
        )
        .expect("parse");
        assert_eq!(
            cfg.content_box.on_missing,
            MissingContentPolicy::FixedMargin { margin_frac: 0.05 }
        );
    }

    #[test]
    fn unknown_fields_and_bad_values_are_rejected() {
        assert!(matches!(
            DecodeConfig::from_json_str(r#"{ "ink_treshold": 10 }"#),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            DecodeConfig::from_json_str(r#"{ "locate": { "step_px": 0 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            DecodeConfig::from_json_str(r#"{ "validation": { "aspect_ratio_range": [3.0, 0.3] } }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn search_and_window_radii_are_bounded() {
        let mut cfg = DecodeConfig::default();
        cfg.locate.radius_frac = 1e12;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let mut cfg = DecodeConfig::default();
        cfg.classify.sample_radius_frac = f64::NAN;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));

        let mut cfg = DecodeConfig::default();
        cfg.layout.option_width_divisor = 0.0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn round_trips_through_json() {
        let json = serde_json::to_string(&DecodeConfig::default()).expect("serialize");
        let back = DecodeConfig::from_json_str(&json).expect("parse");
        assert_eq!(back.validation.ink_coverage_range, [0.05, 0.6]);
        assert_eq!(back.content_box.vertical_scan_fracs, [0.25, 0.75]);
    }
}
