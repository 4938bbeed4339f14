//! Transformer configuration.

use std::path::{Path, PathBuf};

use pixaug_core::{AugmentError, Result};
use serde::{Deserialize, Serialize};

use crate::gate::Candidate;

/// Largest accepted `max_rotation_angle`, in degrees.
pub const MAX_ROTATION_ANGLE: u32 = 360;

/// Largest accepted brightness or colour shift for 8-bit samples.
pub const MAX_PIXEL_SHIFT: u32 = 255;

/// How encoded samples are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Keep the decoded channel count.
    Native,
    /// Force three channels.
    Color,
    /// Force one channel.
    Gray,
}

/// Parameters of one transformer instance.
///
/// Fields missing from a JSON document take the defaults below. The
/// record is immutable once a transformer is built from it.
///
/// # Example
///
/// ```rust
/// use pixaug_transforms::TransformConfig;
///
/// let config = TransformConfig::from_json_str(
///     r#"{ "crop_size": 224, "mirror": true, "mean_value": [104.0, 117.0, 123.0] }"#,
/// ).unwrap();
/// assert_eq!(config.crop_size, 224);
/// assert_eq!(config.scale, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Multiplier applied after mean subtraction.
    pub scale: f32,
    /// Randomly mirror during training.
    pub mirror: bool,
    /// Side of the square crop; 0 keeps the full frame.
    pub crop_size: usize,
    /// Dense mean map file (JSON). Exclusive with `mean_value`.
    pub mean_file: Option<PathBuf>,
    /// Per-channel means, 1 or C values. Exclusive with `mean_file`.
    pub mean_value: Vec<f32>,
    /// Decode encoded samples as three channels.
    pub force_color: bool,
    /// Decode encoded samples as one channel.
    pub force_gray: bool,

    /// Probability that an enabled augmentation fires on a given call.
    pub apply_probability: f32,
    /// Enable smoothing.
    pub smooth_filtering: bool,
    /// Upper bound for the smoothing kernel size.
    pub max_smooth: u32,
    /// Maximum rotation in degrees; shared by rotation and affine warp.
    pub max_rotation_angle: u32,
    /// Enable contrast/brightness adjustment.
    pub contrast_brightness_adjustment: bool,
    /// Lower bound of the contrast multiplier.
    pub min_contrast: f32,
    /// Upper bound of the contrast multiplier.
    pub max_contrast: f32,
    /// Maximum absolute brightness offset.
    pub max_brightness_shift: u32,
    /// Maximum per-channel colour shift.
    pub max_color_shift: u32,
    /// Side of the random min-side crop. Exclusive with the range below.
    pub min_side: usize,
    /// Lower bound of the min-side-range crop.
    pub min_side_min: usize,
    /// Resize target and upper bound of the min-side-range crop.
    pub min_side_max: usize,
    /// Lower bound of the affine scale factors.
    pub affine_min_scale: f32,
    /// Upper bound of the affine scale factors.
    pub affine_max_scale: f32,
    /// Lower bound of the erased area fraction.
    pub random_erasing_low: f32,
    /// Upper bound of the erased area fraction.
    pub random_erasing_high: f32,
    /// Aspect ratio bound; aspect is drawn from `[ratio, 1/ratio)`.
    pub random_erasing_ratio: f32,
    /// Log the sampled augmentation parameters of every training call.
    pub debug_params: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            mirror: false,
            crop_size: 0,
            mean_file: None,
            mean_value: Vec::new(),
            force_color: false,
            force_gray: false,
            apply_probability: 0.5,
            smooth_filtering: false,
            max_smooth: 6,
            max_rotation_angle: 0,
            contrast_brightness_adjustment: false,
            min_contrast: 0.8,
            max_contrast: 1.2,
            max_brightness_shift: 5,
            max_color_shift: 0,
            min_side: 0,
            min_side_min: 0,
            min_side_max: 0,
            affine_min_scale: 0.0,
            affine_max_scale: 0.0,
            random_erasing_low: 0.0,
            random_erasing_high: 0.0,
            random_erasing_ratio: 0.0,
            debug_params: false,
        }
    }
}

impl TransformConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| AugmentError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Check mutually exclusive and out-of-range parameters.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::ConfigurationConflict`] naming the offending
    /// parameters.
    pub fn validate(&self) -> Result<()> {
        if self.mean_file.is_some() && !self.mean_value.is_empty() {
            return Err(AugmentError::conflict(
                "cannot specify mean_file and mean_value at the same time",
            ));
        }
        if self.min_side > 0 && (self.min_side_min > 0 || self.min_side_max > 0) {
            return Err(AugmentError::conflict(
                "cannot specify min_side and min_side_min & min_side_max at the same time",
            ));
        }
        if (self.min_side_min > 0 || self.min_side_max > 0) && self.min_side_max < self.min_side_min
        {
            return Err(AugmentError::conflict(format!(
                "min_side_max ({}) must be greater than or equal to min_side_min ({})",
                self.min_side_max, self.min_side_min
            )));
        }
        if self.force_color && self.force_gray {
            return Err(AugmentError::conflict(
                "cannot set both force_color and force_gray",
            ));
        }
        if !(0.0..=1.0).contains(&self.apply_probability) {
            return Err(AugmentError::conflict(format!(
                "apply_probability must be in [0, 1], got {}",
                self.apply_probability
            )));
        }
        if self.max_rotation_angle > MAX_ROTATION_ANGLE {
            return Err(AugmentError::conflict(format!(
                "max_rotation_angle must be at most {MAX_ROTATION_ANGLE}, got {}",
                self.max_rotation_angle
            )));
        }
        if self.max_brightness_shift > MAX_PIXEL_SHIFT {
            return Err(AugmentError::conflict(format!(
                "max_brightness_shift must be at most {MAX_PIXEL_SHIFT}, got {}",
                self.max_brightness_shift
            )));
        }
        if self.max_color_shift > MAX_PIXEL_SHIFT {
            return Err(AugmentError::conflict(format!(
                "max_color_shift must be at most {MAX_PIXEL_SHIFT}, got {}",
                self.max_color_shift
            )));
        }
        if !self.scale.is_finite() {
            return Err(AugmentError::conflict(format!(
                "scale must be finite, got {}",
                self.scale
            )));
        }
        Ok(())
    }

    /// Decoding mode derived from `force_color` / `force_gray`.
    #[must_use]
    pub fn color_mode(&self) -> ColorMode {
        if self.force_color {
            ColorMode::Color
        } else if self.force_gray {
            ColorMode::Gray
        } else {
            ColorMode::Native
        }
    }

    /// Whether any optional augmentation has parameters that enable it.
    #[must_use]
    pub fn has_augmentation(&self) -> bool {
        Candidate::ORDER.iter().any(|c| c.enabled(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransformConfig::default();
        assert_eq!(config.scale, 1.0);
        assert_eq!(config.apply_probability, 0.5);
        assert!(!config.has_augmentation());
        config.validate().unwrap();
    }

    #[test]
    fn test_mean_sources_conflict() {
        let config = TransformConfig {
            mean_file: Some(PathBuf::from("mean.json")),
            mean_value: vec![128.0],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AugmentError::ConfigurationConflict(_))
        ));
    }

    #[test]
    fn test_min_side_conflicts() {
        let both = TransformConfig {
            min_side: 64,
            min_side_max: 96,
            ..Default::default()
        };
        assert!(matches!(
            both.validate(),
            Err(AugmentError::ConfigurationConflict(_))
        ));

        let inverted = TransformConfig {
            min_side_min: 96,
            min_side_max: 64,
            ..Default::default()
        };
        assert!(matches!(
            inverted.validate(),
            Err(AugmentError::ConfigurationConflict(_))
        ));

        let range = TransformConfig {
            min_side_min: 64,
            min_side_max: 96,
            ..Default::default()
        };
        range.validate().unwrap();
        assert!(range.has_augmentation());
    }

    #[test]
    fn test_magnitude_bounds() {
        let at_limit = TransformConfig {
            max_rotation_angle: 360,
            max_brightness_shift: 255,
            max_color_shift: 255,
            ..Default::default()
        };
        at_limit.validate().unwrap();

        for config in [
            TransformConfig {
                max_rotation_angle: 361,
                ..Default::default()
            },
            TransformConfig {
                max_rotation_angle: u32::MAX,
                ..Default::default()
            },
            TransformConfig {
                max_brightness_shift: 256,
                ..Default::default()
            },
            TransformConfig {
                max_color_shift: 1000,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                config.validate(),
                Err(AugmentError::ConfigurationConflict(_))
            ));
        }
    }

    #[test]
    fn test_force_flags_conflict() {
        let config = TransformConfig {
            force_color: true,
            force_gray: true,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        assert_eq!(
            TransformConfig {
                force_gray: true,
                ..Default::default()
            }
            .color_mode(),
            ColorMode::Gray
        );
    }

    #[test]
    fn test_probability_range() {
        let config = TransformConfig {
            apply_probability: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_json_partial() {
        let config = TransformConfig::from_json_str(
            r#"{ "max_rotation_angle": 15, "apply_probability": 1.0 }"#,
        )
        .unwrap();
        assert_eq!(config.max_rotation_angle, 15);
        assert_eq!(config.max_contrast, 1.2);
        assert!(config.has_augmentation());

        let err = TransformConfig::from_json_str(r#"{ "min_side": 10, "min_side_min": 5 }"#)
            .unwrap_err();
        assert!(matches!(err, AugmentError::ConfigurationConflict(_)));

        assert!(matches!(
            TransformConfig::from_json_str("{ not json"),
            Err(AugmentError::Serialization(_))
        ));
    }
}
