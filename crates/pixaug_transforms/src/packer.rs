//! Channel-major packing with mean subtraction and scaling.

use ndarray::{ArrayView3, ArrayViewMut3};
use pixaug_core::{AugmentError, Result};
use serde::{Deserialize, Serialize};

use crate::datum::Datum;
use crate::frame::Frame;
use crate::mean::MeanModel;

/// Anything the packer can read channel-major pixel values from.
pub trait PixelSource {
    /// Number of channels.
    fn channels(&self) -> usize;
    /// Rows.
    fn height(&self) -> usize;
    /// Columns.
    fn width(&self) -> usize;
    /// Value at channel `c`, row `h`, column `w`.
    fn value(&self, c: usize, h: usize, w: usize) -> f32;
    /// Check the source is readable before any value is requested.
    fn check(&self) -> Result<()> {
        Ok(())
    }
}

impl PixelSource for Frame {
    fn channels(&self) -> usize {
        Frame::channels(self)
    }

    fn height(&self) -> usize {
        Frame::height(self) as usize
    }

    fn width(&self) -> usize {
        Frame::width(self) as usize
    }

    fn value(&self, c: usize, h: usize, w: usize) -> f32 {
        f32::from(self.sample(w as u32, h as u32, c))
    }
}

impl PixelSource for Datum {
    fn channels(&self) -> usize {
        self.channels
    }

    fn height(&self) -> usize {
        self.height
    }

    fn width(&self) -> usize {
        self.width
    }

    fn value(&self, c: usize, h: usize, w: usize) -> f32 {
        Datum::value(self, c, h, w)
    }

    fn check(&self) -> Result<()> {
        self.check_raw()
    }
}

impl PixelSource for ArrayView3<'_, f32> {
    fn channels(&self) -> usize {
        self.dim().0
    }

    fn height(&self) -> usize {
        self.dim().1
    }

    fn width(&self) -> usize {
        self.dim().2
    }

    fn value(&self, c: usize, h: usize, w: usize) -> f32 {
        self[[c, h, w]]
    }
}

/// Region of the source copied into the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropWindow {
    /// First source row.
    pub h_off: usize,
    /// First source column.
    pub w_off: usize,
    /// Rows copied.
    pub height: usize,
    /// Columns copied.
    pub width: usize,
}

impl CropWindow {
    /// The whole `height x width` source.
    #[must_use]
    pub const fn full(height: usize, width: usize) -> Self {
        Self {
            h_off: 0,
            w_off: 0,
            height,
            width,
        }
    }

    /// A centred `side x side` window.
    #[must_use]
    pub const fn centered(side: usize, height: usize, width: usize) -> Self {
        Self {
            h_off: (height - side) / 2,
            w_off: (width - side) / 2,
            height: side,
            width: side,
        }
    }
}

/// Writes `(value - mean) * scale` into a `(C, H, W)` destination.
#[derive(Debug, Clone, Copy)]
pub struct Packer<'a> {
    mean: &'a MeanModel,
    scale: f32,
}

impl<'a> Packer<'a> {
    /// Packer subtracting `mean` and multiplying by `scale`.
    #[must_use]
    pub const fn new(mean: &'a MeanModel, scale: f32) -> Self {
        Self { mean, scale }
    }

    /// Validate a source, window and destination dimensions without writing.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::ShapeMismatch`] when the channels differ, the
    /// window leaves the source, the window differs from the destination,
    /// or the mean does not fit the source.
    pub fn check<S: PixelSource + ?Sized>(
        &self,
        source: &S,
        window: &CropWindow,
        dst: (usize, usize, usize),
    ) -> Result<()> {
        source.check()?;
        let (channels, height, width) = (source.channels(), source.height(), source.width());
        if dst.0 != channels {
            return Err(AugmentError::shape(format!(
                "destination has {} channels but the source has {channels}",
                dst.0
            )));
        }
        if window.h_off + window.height > height || window.w_off + window.width > width {
            return Err(AugmentError::shape(format!(
                "crop window {window:?} exceeds the {height}x{width} source"
            )));
        }
        if (window.height, window.width) != (dst.1, dst.2) {
            return Err(AugmentError::shape(format!(
                "destination is {}x{} but the crop is {}x{}",
                dst.1, dst.2, window.height, window.width
            )));
        }
        self.mean.check(channels, height, width)
    }

    /// Pack `window` of `source` into `dst`, reversing columns when
    /// `mirror` is set.
    ///
    /// All checks run before the first write.
    pub fn pack<S: PixelSource + ?Sized>(
        &self,
        source: &S,
        window: &CropWindow,
        mirror: bool,
        dst: &mut ArrayViewMut3<'_, f32>,
    ) -> Result<()> {
        self.check(source, window, dst.dim())?;
        let (height, width) = (window.height, window.width);
        for c in 0..source.channels() {
            for h in 0..height {
                let src_h = window.h_off + h;
                for w in 0..width {
                    let src_w = window.w_off + w;
                    let top_w = if mirror { width - 1 - w } else { w };
                    let mean = self.mean.value(c, src_h, src_w);
                    dst[[c, h, top_w]] = (source.value(c, src_h, src_w) - mean) * self.scale;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mean::{MeanMap, MeanValues};
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use ndarray::{Array3, Array4};

    fn rgb_frame() -> Frame {
        Frame::Rgb(RgbImage::from_fn(4, 3, |x, y| {
            Rgb([(10 * y + x) as u8, 100 + x as u8, 200])
        }))
    }

    #[test]
    fn test_identity_pack() {
        let frame = rgb_frame();
        let mean = MeanModel::None;
        let mut dst = Array3::<f32>::zeros((3, 3, 4));
        Packer::new(&mean, 1.0)
            .pack(&frame, &CropWindow::full(3, 4), false, &mut dst.view_mut())
            .unwrap();
        assert_eq!(dst[[0, 2, 1]], 21.0);
        assert_eq!(dst[[1, 0, 3]], 103.0);
        assert_eq!(dst[[2, 1, 1]], 200.0);
    }

    #[test]
    fn test_mirror_reverses_columns() {
        let frame = rgb_frame();
        let mean = MeanModel::None;
        let window = CropWindow::full(3, 4);
        let packer = Packer::new(&mean, 1.0);
        let mut plain = Array3::<f32>::zeros((3, 3, 4));
        let mut mirrored = Array3::<f32>::zeros((3, 3, 4));
        packer.pack(&frame, &window, false, &mut plain.view_mut()).unwrap();
        packer.pack(&frame, &window, true, &mut mirrored.view_mut()).unwrap();
        for c in 0..3 {
            for h in 0..3 {
                for w in 0..4 {
                    assert_eq!(mirrored[[c, h, w]], plain[[c, h, 3 - w]]);
                }
            }
        }
    }

    #[test]
    fn test_dense_mean_uses_precrop_coordinates() {
        let frame = Frame::Gray(GrayImage::from_pixel(4, 4, Luma([50])));
        let data: Vec<f32> = (0..16).map(|v| v as f32).collect();
        let mean = MeanModel::Dense(MeanMap::new(1, 4, 4, data).unwrap());
        let window = CropWindow::centered(2, 4, 4);
        let mut dst = Array3::<f32>::zeros((1, 2, 2));
        Packer::new(&mean, 0.5)
            .pack(&frame, &window, false, &mut dst.view_mut())
            .unwrap();
        // Window starts at (1, 1): mean values 5, 6, 9, 10.
        assert_eq!(dst[[0, 0, 0]], (50.0 - 5.0) * 0.5);
        assert_eq!(dst[[0, 1, 1]], (50.0 - 10.0) * 0.5);
    }

    #[test]
    fn test_mean_values_per_channel() {
        let frame = rgb_frame();
        let mean = MeanModel::Values(MeanValues::new(vec![1.0, 100.0, 200.0]).unwrap());
        let mut dst = Array3::<f32>::zeros((3, 3, 4));
        Packer::new(&mean, 2.0)
            .pack(&frame, &CropWindow::full(3, 4), false, &mut dst.view_mut())
            .unwrap();
        assert_eq!(dst[[0, 0, 0]], -2.0);
        assert_eq!(dst[[1, 0, 2]], 4.0);
        assert_eq!(dst[[2, 2, 3]], 0.0);
    }

    #[test]
    fn test_mismatch_writes_nothing() {
        let frame = rgb_frame();
        let mean = MeanModel::Dense(MeanMap::new(3, 2, 2, vec![0.0; 12]).unwrap());
        let mut dst = Array3::<f32>::from_elem((3, 3, 4), -1.0);
        let err = Packer::new(&mean, 1.0)
            .pack(&frame, &CropWindow::full(3, 4), false, &mut dst.view_mut())
            .unwrap_err();
        assert!(matches!(err, AugmentError::ShapeMismatch(_)));
        assert!(dst.iter().all(|&v| v == -1.0));

        let none = MeanModel::None;
        let mut small = Array3::<f32>::zeros((3, 2, 2));
        assert!(Packer::new(&none, 1.0)
            .pack(&frame, &CropWindow::full(3, 4), false, &mut small.view_mut())
            .is_err());
    }

    #[test]
    fn test_pack_from_tensor_view() {
        let mut input = Array4::<f32>::zeros((1, 2, 3, 3));
        input[[0, 1, 2, 0]] = 7.5;
        let mean = MeanModel::None;
        let mut dst = Array3::<f32>::zeros((2, 2, 2));
        let window = CropWindow {
            h_off: 1,
            w_off: 0,
            height: 2,
            width: 2,
        };
        Packer::new(&mean, 1.0)
            .pack(&input.index_axis(ndarray::Axis(0), 0), &window, false, &mut dst.view_mut())
            .unwrap();
        assert_eq!(dst[[1, 1, 0]], 7.5);
    }
}
