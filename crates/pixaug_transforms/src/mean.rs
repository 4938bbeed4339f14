//! Mean models subtracted during packing.

use std::path::Path;

use pixaug_core::{AugmentError, Result};
use serde::{Deserialize, Serialize};

/// A dense per-pixel mean, laid out `(C, H, W)`.
///
/// Must match the source image's channels, height and width exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanMap {
    channels: usize,
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl MeanMap {
    /// Create a mean map from channel-major values.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::ShapeMismatch`] when `data` does not hold
    /// exactly `channels * height * width` values.
    pub fn new(channels: usize, height: usize, width: usize, data: Vec<f32>) -> Result<Self> {
        let expected = channels * height * width;
        if data.len() != expected {
            return Err(AugmentError::shape(format!(
                "mean map {channels}x{height}x{width} needs {expected} values, got {}",
                data.len()
            )));
        }
        Ok(Self {
            channels,
            height,
            width,
            data,
        })
    }

    /// Load a mean map stored as JSON (`{channels, height, width, data}`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let raw: MeanMap = serde_json::from_str(&text)
            .map_err(|e| AugmentError::Serialization(e.to_string()))?;
        Self::new(raw.channels, raw.height, raw.width, raw.data)
    }

    /// Write the mean map as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let text =
            serde_json::to_string(self).map_err(|e| AugmentError::Serialization(e.to_string()))?;
        std::fs::write(path.as_ref(), text)?;
        Ok(())
    }

    /// `(channels, height, width)`.
    #[must_use]
    pub const fn dims(&self) -> (usize, usize, usize) {
        (self.channels, self.height, self.width)
    }

    /// Mean at channel `c`, row `h`, column `w`.
    #[must_use]
    pub fn value(&self, c: usize, h: usize, w: usize) -> f32 {
        self.data[(c * self.height + h) * self.width + w]
    }
}

/// Per-channel scalar means.
///
/// Holds either one value used for every channel or one value per channel.
/// The list is resolved at construction and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanValues(Vec<f32>);

impl MeanValues {
    /// Build from a non-empty list.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::ConfigurationConflict`] for an empty list.
    pub fn new(values: Vec<f32>) -> Result<Self> {
        if values.is_empty() {
            return Err(AugmentError::conflict("mean_value list is empty"));
        }
        Ok(Self(values))
    }

    /// Number of configured values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; an empty list is rejected by [`MeanValues::new`].
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Mean for channel `c`.
    #[must_use]
    pub fn value(&self, c: usize) -> f32 {
        if self.0.len() == 1 {
            self.0[0]
        } else {
            self.0[c]
        }
    }
}

/// Mean subtracted from every packed pixel.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MeanModel {
    /// No mean; pixels are only scaled.
    #[default]
    None,
    /// Dense per-pixel mean.
    Dense(MeanMap),
    /// One mean per channel.
    Values(MeanValues),
}

impl MeanModel {
    /// Check that this mean can be applied to a `(channels, height, width)`
    /// source.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::ShapeMismatch`] for a dense map of different
    /// dimensions, or a value list that is neither 1 nor `channels` long.
    pub fn check(&self, channels: usize, height: usize, width: usize) -> Result<()> {
        match self {
            MeanModel::None => Ok(()),
            MeanModel::Dense(map) => {
                if map.dims() != (channels, height, width) {
                    return Err(AugmentError::shape(format!(
                        "mean map is {:?} (CxHxW) but the source is {:?}",
                        map.dims(),
                        (channels, height, width)
                    )));
                }
                Ok(())
            }
            MeanModel::Values(values) => {
                if values.len() != 1 && values.len() != channels {
                    return Err(AugmentError::shape(format!(
                        "specify either 1 mean_value or as many as channels ({channels}), got {}",
                        values.len()
                    )));
                }
                Ok(())
            }
        }
    }

    /// Mean at channel `c` and pre-crop coordinate `(h, w)`.
    #[must_use]
    pub fn value(&self, c: usize, h: usize, w: usize) -> f32 {
        match self {
            MeanModel::None => 0.0,
            MeanModel::Dense(map) => map.value(c, h, w),
            MeanModel::Values(values) => values.value(c),
        }
    }

    /// Short description for logs.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            MeanModel::None => "none".to_string(),
            MeanModel::Dense(map) => format!("dense map {:?}", map.dims()),
            MeanModel::Values(values) => format!("{} channel value(s)", values.len()),
        }
    }
}
