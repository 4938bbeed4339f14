//! Colour shift and contrast/brightness.

use image::{ImageBuffer, Pixel};
use pixaug_core::{AugmentError, RandomSource, Result};
use serde::{Deserialize, Serialize};

use crate::frame::{map_frame, Frame};

/// A sampled colour shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorShift {
    /// Per-channel magnitudes; gray frames use the first.
    pub shifts: [u8; 3],
    /// Subtract instead of add.
    pub subtract: bool,
}

impl ColorShift {
    /// Draw three magnitudes in `[0, max_shift]`, then the sign.
    pub fn sample(max_shift: u32, rng: &mut RandomSource) -> Result<Self> {
        let n = max_shift as usize + 1;
        let mut shifts = [0u8; 3];
        for s in &mut shifts {
            *s = rng.index(n)?.min(255) as u8;
        }
        let subtract = rng.coin()?;
        Ok(Self { shifts, subtract })
    }
}

/// A sampled contrast multiplier and brightness offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContrastBrightness {
    /// Contrast multiplier.
    pub alpha: f32,
    /// Brightness offset.
    pub beta: i32,
}

impl ContrastBrightness {
    /// Draw `alpha` in `[min_contrast, max_contrast)`, then an integer `beta`
    /// in `[-max_shift, max_shift]`.
    pub fn sample(
        min_contrast: f32,
        max_contrast: f32,
        max_shift: u32,
        rng: &mut RandomSource,
    ) -> Result<Self> {
        let alpha = rng.uniform(min_contrast, max_contrast)?;
        let beta = rng.symmetric(max_shift)?;
        let beta = i32::try_from(beta)
            .map_err(|_| AugmentError::conflict(format!("brightness shift {beta} out of range")))?;
        Ok(Self { alpha, beta })
    }
}

/// Add or subtract a constant per channel, saturating at `[0, 255]`.
#[must_use]
pub fn color_shift(frame: Frame, shift: ColorShift) -> Frame {
    map_frame!(frame, img => shift_channels(img, shift))
}

fn shift_channels<P>(mut img: ImageBuffer<P, Vec<u8>>, shift: ColorShift) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
{
    for px in img.pixels_mut() {
        for (v, &s) in px.channels_mut().iter_mut().zip(shift.shifts.iter()) {
            *v = if shift.subtract {
                v.saturating_sub(s)
            } else {
                v.saturating_add(s)
            };
        }
    }
    img
}

/// `p' = saturate(round(alpha * p + beta))` on every subpixel.
#[must_use]
pub fn contrast_brightness(frame: Frame, params: ContrastBrightness) -> Frame {
    let ContrastBrightness { alpha, beta } = params;
    map_frame!(frame, img => {
        let mut img = img;
        for v in img.iter_mut() {
            *v = (alpha * f32::from(*v) + beta as f32).round().clamp(0.0, 255.0) as u8;
        }
        img
    })
}
