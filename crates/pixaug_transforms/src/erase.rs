//! Random erasing.

use image::{ImageBuffer, Pixel};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use pixaug_core::{RandomSource, Result};
use serde::{Deserialize, Serialize};

use crate::frame::{with_frame, Frame};

/// Area and aspect bounds of the erased rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EraseParams {
    /// Lower bound of the erased fraction of the frame area.
    pub low: f32,
    /// Upper bound of the erased fraction of the frame area.
    pub high: f32,
    /// Aspect ratio is drawn from `[ratio, 1 / ratio)`.
    pub ratio: f32,
}

/// An erased rectangle in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraseRect {
    /// Left column.
    pub x: u32,
    /// Top row.
    pub y: u32,
    /// Width in columns.
    pub width: u32,
    /// Height in rows.
    pub height: u32,
}

impl EraseRect {
    /// Whether `(x, y)` lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Overwrite a random rectangle with the frame's rounded mean colour.
///
/// Draws the area fraction and aspect ratio; when the derived rectangle fits
/// inside the frame, draws its left and top offsets and fills it. A
/// rectangle that does not fit leaves the frame untouched and returns
/// `None`.
pub fn random_erase(
    mut frame: Frame,
    params: EraseParams,
    rng: &mut RandomSource,
) -> Result<(Frame, Option<EraseRect>)> {
    let (width, height) = frame.dimensions();
    let area = (width as f32) * (height as f32);

    let target_area = rng.uniform(params.low, params.high)? * area;
    let aspect = rng.uniform(params.ratio, 1.0 / params.ratio)?;
    let erase_h = (target_area * aspect).sqrt().round() as u32;
    let erase_w = (target_area / aspect).sqrt().round() as u32;
    if erase_w > width || erase_h > height {
        return Ok((frame, None));
    }

    let x = rng.uniform(0.0, (width - erase_w) as f32)? as u32;
    let y = rng.uniform(0.0, (height - erase_h) as f32)? as u32;
    let rect = EraseRect {
        x: x.min(width - erase_w),
        y: y.min(height - erase_h),
        width: erase_w,
        height: erase_h,
    };

    let fill: Vec<u8> = frame
        .channel_means()
        .into_iter()
        .map(|m| m.round().clamp(0.0, 255.0) as u8)
        .collect();
    with_frame!(&mut frame, img => fill_rect(img, &rect, &fill));
    Ok((frame, Some(rect)))
}

fn fill_rect<P>(img: &mut ImageBuffer<P, Vec<u8>>, rect: &EraseRect, color: &[u8])
where
    P: Pixel<Subpixel = u8>,
{
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let px = *P::from_slice(&color[..usize::from(P::CHANNEL_COUNT)]);
    let region = Rect::at(rect.x as i32, rect.y as i32).of_size(rect.width, rect.height);
    draw_filled_rect_mut(img, region, px);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use pixaug_core::Seed;

    fn gradient() -> Frame {
        Frame::Rgb(RgbImage::from_fn(40, 30, |x, y| {
            Rgb([(x * 6) as u8, (y * 8) as u8, 128])
        }))
    }

    #[test]
    fn test_erased_rect_within_bounds() {
        let params = EraseParams {
            low: 0.02,
            high: 0.4,
            ratio: 0.3,
        };
        let mut rng = RandomSource::seeded(Seed::new(5));
        for _ in 0..200 {
            let source = gradient();
            let means = source.channel_means();
            let (out, rect) = random_erase(source.clone(), params, &mut rng).unwrap();
            match rect {
                Some(r) => {
                    assert!(r.x + r.width <= 40);
                    assert!(r.y + r.height <= 30);
                    if r.width > 0 && r.height > 0 {
                        assert_eq!(out.sample(r.x, r.y, 0), means[0].round() as u8);
                        assert_eq!(out.sample(r.x, r.y, 1), means[1].round() as u8);
                    }
                    for y in 0..30 {
                        for x in 0..40 {
                            if !r.contains(x, y) {
                                assert_eq!(out.sample(x, y, 0), source.sample(x, y, 0));
                            }
                        }
                    }
                }
                None => assert_eq!(out, source),
            }
        }
    }

    #[test]
    fn test_oversized_rect_is_noop() {
        // Twice the frame area at aspect 1 never fits.
        let params = EraseParams {
            low: 2.0,
            high: 3.0,
            ratio: 1.0,
        };
        let frame = Frame::Gray(GrayImage::from_pixel(10, 10, Luma([3])));
        let mut rng = RandomSource::seeded(Seed::new(0));
        let (out, rect) = random_erase(frame.clone(), params, &mut rng).unwrap();
        assert!(rect.is_none());
        assert_eq!(out, frame);
        assert_eq!(rng.draws(), 2);
    }
}
