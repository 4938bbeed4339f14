//! Smoothing filters.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::filter::{box_filter, gaussian_blur_f32, median_filter};
use pixaug_core::{RandomSource, Result};
use serde::{Deserialize, Serialize};

use crate::frame::{map_frame, Frame};

/// Kernel family of one smoothing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmoothKind {
    /// Gaussian, sigma derived from the kernel size.
    Gaussian,
    /// `k x k` normalized box.
    Mean,
    /// Median over a `k x k` window.
    Median,
    /// Normalized box over a doubled window.
    Box,
}

impl SmoothKind {
    const ALL: [SmoothKind; 4] = [
        SmoothKind::Gaussian,
        SmoothKind::Mean,
        SmoothKind::Median,
        SmoothKind::Box,
    ];

    /// Kind for a drawn index in `0..4`.
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }
}

/// A sampled smoothing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmoothParams {
    /// Kernel family.
    pub kind: SmoothKind,
    /// Odd kernel size.
    pub size: u32,
}

impl SmoothParams {
    /// Draw the kind, then the size `1 + 2 * index(max_smooth / 2)`.
    pub fn sample(max_smooth: u32, rng: &mut RandomSource) -> Result<Self> {
        let kind = SmoothKind::from_index(rng.index(4)?);
        let half = (max_smooth / 2).max(1) as usize;
        let size = 1 + 2 * rng.index(half)? as u32;
        Ok(Self { kind, size })
    }
}

/// Default sigma for a Gaussian kernel of size `k`: `0.3 * ((k - 1) / 2 - 1) + 0.8`.
#[must_use]
pub fn gaussian_sigma(k: u32) -> f32 {
    0.3 * ((k as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Apply one smoothing step.
///
/// A size of 1 leaves the frame unchanged for every kind but [`SmoothKind::Box`],
/// whose window is twice the size.
#[must_use]
pub fn smooth(frame: Frame, params: SmoothParams) -> Frame {
    let k = params.size;
    match params.kind {
        SmoothKind::Gaussian if k > 1 => {
            let sigma = gaussian_sigma(k);
            map_frame!(frame, img => gaussian_blur_f32(&img, sigma))
        }
        SmoothKind::Mean if k > 1 => box_per_channel(&frame, k / 2),
        SmoothKind::Median if k > 1 => map_frame!(frame, img => median_filter(&img, k / 2, k / 2)),
        SmoothKind::Box => box_per_channel(&frame, k),
        _ => frame,
    }
}

fn box_per_channel(frame: &Frame, radius: u32) -> Frame {
    match frame {
        Frame::Gray(img) => Frame::Gray(box_filter(img, radius, radius)),
        Frame::Rgb(img) => {
            let (w, h) = img.dimensions();
            let planes: Vec<GrayImage> = (0..3)
                .map(|c| {
                    let plane = GrayImage::from_fn(w, h, |x, y| Luma([img.get_pixel(x, y)[c]]));
                    box_filter(&plane, radius, radius)
                })
                .collect();
            Frame::Rgb(RgbImage::from_fn(w, h, |x, y| {
                Rgb([
                    planes[0].get_pixel(x, y)[0],
                    planes[1].get_pixel(x, y)[0],
                    planes[2].get_pixel(x, y)[0],
                ])
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixaug_core::Seed;

    fn checker() -> Frame {
        Frame::Rgb(RgbImage::from_fn(12, 12, |x, y| {
            if (x + y) % 2 == 0 {
                Rgb([255, 0, 60])
            } else {
                Rgb([0, 255, 60])
            }
        }))
    }

    #[test]
    fn test_gaussian_sigma_rule() {
        assert!((gaussian_sigma(3) - 0.8).abs() < 1e-6);
        assert!((gaussian_sigma(5) - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_size_one_is_identity() {
        for kind in [SmoothKind::Gaussian, SmoothKind::Mean, SmoothKind::Median] {
            let out = smooth(checker(), SmoothParams { kind, size: 1 });
            assert_eq!(out, checker());
        }
    }

    #[test]
    fn test_filters_flatten_checkerboard() {
        for kind in [SmoothKind::Gaussian, SmoothKind::Mean, SmoothKind::Box] {
            let out = smooth(checker(), SmoothParams { kind, size: 3 });
            assert_eq!(out.dimensions(), (12, 12));
            let v = out.sample(6, 6, 0);
            assert!(v > 0 && v < 255, "{kind:?} left {v}");
            // Constant channel is preserved.
            assert!((i32::from(out.sample(6, 6, 2)) - 60).abs() <= 1);
        }
    }

    #[test]
    fn test_median_removes_speck() {
        let mut img = GrayImage::new(9, 9);
        img.put_pixel(4, 4, Luma([255]));
        let out = smooth(
            Frame::Gray(img),
            SmoothParams {
                kind: SmoothKind::Median,
                size: 3,
            },
        );
        assert!(out.as_raw().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_sample_ranges() {
        let mut rng = RandomSource::seeded(Seed::new(2));
        for _ in 0..100 {
            let p = SmoothParams::sample(6, &mut rng).unwrap();
            assert!(matches!(p.size, 1 | 3 | 5));
        }
        assert_eq!(rng.draws(), 200);
    }
}
