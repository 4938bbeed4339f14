//! Per-call gate decisions.
//!
//! Every call to a training transform first decides which optional
//! augmentations fire. The decision consumes the random source in a fixed
//! order:
//!
//! 1. the mirror coin, only when mirroring is enabled and the phase is train
//! 2. one uniform draw per [`Candidate`], in [`Candidate::ORDER`]
//!
//! The candidate draws are taken even for candidates whose parameters
//! disable them, so that a given seed always lines up the same draws with
//! the same decisions. When the phase is test, or no candidate is enabled,
//! the candidate list is skipped and no draw is taken.

use pixaug_core::{Phase, RandomSource, Result};
use serde::{Deserialize, Serialize};

use crate::config::TransformConfig;

/// An optional augmentation that is gated by one uniform draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Candidate {
    /// Blur with one of four kernels.
    Smooth,
    /// Rotation into the expanded bounding box.
    Rotation,
    /// Contrast and brightness adjustment.
    Brightness,
    /// Per-channel constant shift.
    ColorShift,
    /// Min-side crop, or min-side-range resize and crop.
    MinSide,
    /// Rotation plus scale warp.
    Affine,
    /// Mean-colour rectangle.
    RandomErasing,
}

impl Candidate {
    /// Draw order of the candidate list.
    pub const ORDER: [Candidate; 7] = [
        Candidate::Smooth,
        Candidate::Rotation,
        Candidate::Brightness,
        Candidate::ColorShift,
        Candidate::MinSide,
        Candidate::Affine,
        Candidate::RandomErasing,
    ];

    /// Whether the configuration's parameters enable this candidate.
    #[must_use]
    pub fn enabled(self, config: &TransformConfig) -> bool {
        match self {
            Candidate::Smooth => config.smooth_filtering && config.max_smooth > 1,
            Candidate::Rotation => config.max_rotation_angle > 0,
            Candidate::Brightness => {
                config.contrast_brightness_adjustment
                    && config.min_contrast > 0.0
                    && config.max_contrast >= config.min_contrast
            }
            Candidate::ColorShift => config.max_color_shift > 0,
            Candidate::MinSide => min_side_enabled(config) || min_side_range_enabled(config),
            Candidate::Affine => {
                config.affine_min_scale > 0.0 && config.affine_max_scale > config.affine_min_scale
            }
            Candidate::RandomErasing => {
                config.random_erasing_ratio > 0.0
                    && config.random_erasing_low > 0.0
                    && config.random_erasing_high > config.random_erasing_low
            }
        }
    }

    /// Short name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Candidate::Smooth => "smooth",
            Candidate::Rotation => "rotation",
            Candidate::Brightness => "brightness",
            Candidate::ColorShift => "color_shift",
            Candidate::MinSide => "min_side",
            Candidate::Affine => "affine",
            Candidate::RandomErasing => "random_erasing",
        }
    }
}

fn min_side_enabled(config: &TransformConfig) -> bool {
    config.min_side > 0
}

fn min_side_range_enabled(config: &TransformConfig) -> bool {
    config.min_side_min > 0 && config.min_side_max > config.min_side_min
}

/// Which optional transforms fire on one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecisions {
    /// Reverse columns when packing.
    pub mirror: bool,
    /// Smooth.
    pub smooth: bool,
    /// Plain rotation. Ignored when `affine` also fires.
    pub rotation: bool,
    /// Contrast and brightness.
    pub brightness: bool,
    /// Colour shift.
    pub color_shift: bool,
    /// Random crop of side `min_side`.
    pub min_side: bool,
    /// Resize to `min_side_max`, then random crop.
    pub min_side_range: bool,
    /// Affine warp.
    pub affine: bool,
    /// Random erasing.
    pub random_erasing: bool,
}

impl GateDecisions {
    /// Whether the gate of `candidate` is open.
    #[must_use]
    pub fn is_open(&self, candidate: Candidate) -> bool {
        match candidate {
            Candidate::Smooth => self.smooth,
            Candidate::Rotation => self.rotation,
            Candidate::Brightness => self.brightness,
            Candidate::ColorShift => self.color_shift,
            Candidate::MinSide => self.min_side || self.min_side_range,
            Candidate::Affine => self.affine,
            Candidate::RandomErasing => self.random_erasing,
        }
    }

    /// Whether any candidate gate is open.
    #[must_use]
    pub fn any_augmentation(&self) -> bool {
        Candidate::ORDER.iter().any(|&c| self.is_open(c))
    }
}

/// Draws gate decisions for one transformer configuration and phase.
#[derive(Debug, Clone, Copy)]
pub struct GateEvaluator<'a> {
    config: &'a TransformConfig,
    phase: Phase,
}

impl<'a> GateEvaluator<'a> {
    /// Bind a configuration and phase.
    #[must_use]
    pub const fn new(config: &'a TransformConfig, phase: Phase) -> Self {
        Self { config, phase }
    }

    /// Whether [`GateEvaluator::evaluate`] takes draws at all.
    #[must_use]
    pub fn draws_candidates(&self) -> bool {
        self.phase.is_train() && self.config.has_augmentation()
    }

    /// The mirror decision: `mirror && train && coin()`.
    ///
    /// No draw is taken unless mirroring is enabled and the phase is train.
    pub fn mirror(&self, rng: &mut RandomSource) -> Result<bool> {
        if !self.config.mirror || self.phase.is_test() {
            return Ok(false);
        }
        rng.coin()
    }

    /// Draw one uniform value per candidate and open the gates whose draw
    /// exceeds `1 - apply_probability`.
    pub fn evaluate(&self, rng: &mut RandomSource) -> Result<GateDecisions> {
        let mut gates = GateDecisions::default();
        if !self.draws_candidates() {
            return Ok(gates);
        }

        let threshold = 1.0 - self.config.apply_probability;
        for candidate in Candidate::ORDER {
            let draw = rng.uniform(0.0, 1.0)?;
            if !(candidate.enabled(self.config) && draw > threshold) {
                continue;
            }
            match candidate {
                Candidate::Smooth => gates.smooth = true,
                Candidate::Rotation => gates.rotation = true,
                Candidate::Brightness => gates.brightness = true,
                Candidate::ColorShift => gates.color_shift = true,
                Candidate::MinSide => {
                    gates.min_side = min_side_enabled(self.config);
                    gates.min_side_range = min_side_range_enabled(self.config);
                }
                Candidate::Affine => gates.affine = true,
                Candidate::RandomErasing => gates.random_erasing = true,
            }
        }
        Ok(gates)
    }
}
