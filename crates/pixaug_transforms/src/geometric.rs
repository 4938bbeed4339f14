//! Geometric transforms: crops, min-side resizing, affine warp and rotation.
//!
//! Angles are in degrees, positive counter-clockwise on screen. Warps
//! sample bilinearly and fill uncovered pixels with black.

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Pixel};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use pixaug_core::{AugmentError, RandomSource, Result};
use serde::{Deserialize, Serialize};

use crate::frame::{map_frame, Frame};

/// Top-left corner of a crop in rows and columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropOffset {
    /// First row.
    pub h_off: usize,
    /// First column.
    pub w_off: usize,
}

/// Fail unless a `height x width` source can hold a `side x side` crop.
pub fn ensure_fits(side: usize, height: usize, width: usize) -> Result<()> {
    if side > height || side > width {
        return Err(AugmentError::InsufficientSourceDimensions {
            required: side,
            height,
            width,
        });
    }
    Ok(())
}

/// Copy out the `width x height` region whose top-left is `(x, y)`.
#[must_use]
pub fn crop(frame: &Frame, x: u32, y: u32, width: u32, height: u32) -> Frame {
    map_frame!(frame, img => imageops::crop_imm(img, x, y, width, height).to_image())
}

/// Crop a `side x side` square at an offset drawn as `h` then `w`.
pub fn random_crop(frame: &Frame, side: usize, rng: &mut RandomSource) -> Result<(Frame, CropOffset)> {
    let (width, height) = frame.dimensions();
    let (height, width) = (height as usize, width as usize);
    ensure_fits(side, height, width)?;
    let offset = CropOffset {
        h_off: rng.index(height - side + 1)?,
        w_off: rng.index(width - side + 1)?,
    };
    let side = side as u32;
    let cropped = crop(frame, offset.w_off as u32, offset.h_off as u32, side, side);
    Ok((cropped, offset))
}

/// Dimensions `(width, height)` after scaling the short side to `side`.
///
/// The long side keeps the aspect ratio and is rounded up.
#[must_use]
pub fn min_side_dimensions(width: u32, height: u32, side: u32) -> (u32, u32) {
    if height <= width {
        let k = f64::from(height) / f64::from(side);
        ((f64::from(width) / k).ceil() as u32, side)
    } else {
        let k = f64::from(width) / f64::from(side);
        (side, (f64::from(height) / k).ceil() as u32)
    }
}

/// Resize so the short side equals `side`.
#[must_use]
pub fn resize_min_side(frame: &Frame, side: u32) -> Frame {
    let (width, height) = frame.dimensions();
    let (w, h) = min_side_dimensions(width, height, side);
    resize_to(frame, w, h)
}

/// Resize to exactly `width x height` with bilinear filtering.
///
/// A frame already of that size is returned as a copy.
#[must_use]
pub fn resize_to(frame: &Frame, width: u32, height: u32) -> Frame {
    if frame.dimensions() == (width, height) {
        return frame.clone();
    }
    map_frame!(frame, img => imageops::resize(img, width, height, FilterType::Triangle))
}

/// Parameters of the min-side-range step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinSideRange {
    /// Smallest crop side.
    pub min: usize,
    /// Resize target and largest crop side.
    pub max: usize,
}

/// Resize the short side to `range.max`, then crop a random square.
///
/// Draws the crop side in `[range.min, range.max]` first, then the crop
/// offset. Returns the frame and the drawn side.
pub fn min_side_range_crop(
    frame: &Frame,
    range: MinSideRange,
    rng: &mut RandomSource,
) -> Result<(Frame, usize, CropOffset)> {
    let side = range.min + rng.index(range.max - range.min + 1)?;
    let resized = resize_min_side(frame, range.max as u32);
    let (cropped, offset) = random_crop(&resized, side, rng)?;
    Ok((cropped, side, offset))
}

/// A sampled affine warp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineParams {
    /// Rotation in degrees.
    pub angle: f32,
    /// Isotropic scale of the warp matrix.
    pub scale: f32,
    /// Output width as a multiple of the input width.
    pub scale_x: f32,
    /// Output height as a multiple of the input height.
    pub scale_y: f32,
}

impl AffineParams {
    /// Draw the angle, the matrix scale, then the width and height factors.
    pub fn sample(
        max_angle: u32,
        min_scale: f32,
        max_scale: f32,
        rng: &mut RandomSource,
    ) -> Result<Self> {
        let angle = sample_angle(max_angle, rng)? as f32;
        let scale = rng.uniform(min_scale, max_scale)?;
        let scale_x = rng.uniform(min_scale, max_scale)?;
        let scale_y = rng.uniform(min_scale, max_scale)?;
        Ok(Self {
            angle,
            scale,
            scale_x,
            scale_y,
        })
    }

    /// Output `(width, height)` for a `width x height` input, at least 1x1.
    #[must_use]
    pub fn output_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        let w = (width as f32 * self.scale_x) as u32;
        let h = (height as f32 * self.scale_y) as u32;
        (w.max(1), h.max(1))
    }
}

/// Integer angle in `[-max_angle, max_angle]`.
pub fn sample_angle(max_angle: u32, rng: &mut RandomSource) -> Result<i32> {
    let angle = rng.symmetric(max_angle)?;
    i32::try_from(angle)
        .map_err(|_| AugmentError::conflict(format!("rotation angle {angle} out of range")))
}

/// Rotate and scale about the frame centre into a canvas of
/// [`AffineParams::output_dimensions`].
///
/// The centre keeps its coordinates, so a canvas larger than the input
/// shows black right and below, and a smaller one clips.
#[must_use]
pub fn affine_warp(frame: &Frame, params: AffineParams) -> Frame {
    let (width, height) = frame.dimensions();
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let projection = Projection::translate(-cx, -cy)
        .and_then(Projection::rotate(-params.angle.to_radians()))
        .and_then(Projection::scale(params.scale, params.scale))
        .and_then(Projection::translate(cx, cy));
    let (out_w, out_h) = params.output_dimensions(width, height);
    map_frame!(frame, img => warp_onto(img, &projection, out_w, out_h))
}

/// Bounding box `(width, height)` of a `width x height` rectangle rotated by
/// `angle` degrees about its centre, in whole pixels.
#[must_use]
pub fn rotated_bounds(width: u32, height: u32, angle: f32) -> (u32, u32) {
    let theta = f64::from(angle).to_radians();
    // Snap so that right angles give exact extents.
    let snap = |v: f64| (v * 1e12).round() / 1e12;
    let (sin, cos) = (snap(theta.sin().abs()), snap(theta.cos().abs()));
    let (hw, hh) = (f64::from(width) / 2.0, f64::from(height) / 2.0);
    let (cx, cy) = (hw, hh);
    let ex = hw * cos + hh * sin;
    let ey = hw * sin + hh * cos;
    let bw = (cx + ex).ceil() - (cx - ex).floor() + 1.0;
    let bh = (cy + ey).ceil() - (cy - ey).floor() + 1.0;
    (bw as u32, bh as u32)
}

/// Rotate about the centre into the rotated bounding box, keeping every
/// corner. An angle of zero returns a copy.
#[must_use]
pub fn rotate_expand(frame: &Frame, angle: i32) -> Frame {
    if angle == 0 {
        return frame.clone();
    }
    let (width, height) = frame.dimensions();
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let (bw, bh) = rotated_bounds(width, height, angle as f32);
    let projection = Projection::translate(-cx, -cy)
        .and_then(Projection::rotate(-(angle as f32).to_radians()))
        .and_then(Projection::translate(bw as f32 / 2.0, bh as f32 / 2.0));
    map_frame!(frame, img => warp_onto(img, &projection, bw, bh))
}

fn warp_onto<P>(
    img: &ImageBuffer<P, Vec<u8>>,
    projection: &Projection,
    width: u32,
    height: u32,
) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8> + Send + Sync,
{
    let mut out = ImageBuffer::new(width, height);
    let black = *P::from_slice(&[0u8; 4][..usize::from(P::CHANNEL_COUNT)]);
    warp_into(img, projection, Interpolation::Bilinear, black, &mut out);
    out
}
