//! 8-bit image buffers flowing through the pipeline.

use image::{DynamicImage, GrayImage, RgbImage};
use pixaug_core::{AugmentError, Result};

/// An 8-bit, 1- or 3-channel image owned by one pipeline call.
///
/// Pixels are stored row-major and interleaved (`HWC`). Every transform takes
/// a frame by value or by reference and returns a new one, so the input
/// and the working image never alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Single-channel luma.
    Gray(GrayImage),
    /// Three-channel colour, channel order as decoded.
    Rgb(RgbImage),
}

/// Applies a pixel-generic expression to whichever buffer a frame holds and
/// rewraps the result in the same variant.
macro_rules! map_frame {
    ($frame:expr, $img:ident => $body:expr) => {
        match $frame {
            $crate::frame::Frame::Gray($img) => $crate::frame::Frame::Gray($body),
            $crate::frame::Frame::Rgb($img) => $crate::frame::Frame::Rgb($body),
        }
    };
}

/// Like [`map_frame!`] but returns the expression's value unchanged.
macro_rules! with_frame {
    ($frame:expr, $img:ident => $body:expr) => {
        match $frame {
            $crate::frame::Frame::Gray($img) => $body,
            $crate::frame::Frame::Rgb($img) => $body,
        }
    };
}

pub(crate) use map_frame;
pub(crate) use with_frame;

impl Frame {
    /// Accept a decoded image.
    ///
    /// 8-bit luma and RGB pass through; 8-bit luma-alpha and RGBA drop their
    /// alpha channel.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::InvalidPixelDepth`] for 16-bit or float images.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        match image {
            DynamicImage::ImageLuma8(img) => Ok(Frame::Gray(img)),
            DynamicImage::ImageRgb8(img) => Ok(Frame::Rgb(img)),
            DynamicImage::ImageLumaA8(_) => Ok(Frame::Gray(image.to_luma8())),
            DynamicImage::ImageRgba8(_) => Ok(Frame::Rgb(image.to_rgb8())),
            other => Err(AugmentError::InvalidPixelDepth(format!(
                "image data type must be unsigned byte, got {:?}",
                other.color()
            ))),
        }
    }

    /// Convert back into a [`DynamicImage`].
    #[must_use]
    pub fn into_dynamic(self) -> DynamicImage {
        match self {
            Frame::Gray(img) => DynamicImage::ImageLuma8(img),
            Frame::Rgb(img) => DynamicImage::ImageRgb8(img),
        }
    }

    /// Number of interleaved channels (1 or 3).
    #[must_use]
    pub fn channels(&self) -> usize {
        match self {
            Frame::Gray(_) => 1,
            Frame::Rgb(_) => 3,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        with_frame!(self, img => img.width())
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        with_frame!(self, img => img.height())
    }

    /// `(width, height)` in pixels.
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    /// Interleaved pixel bytes.
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        with_frame!(self, img => img.as_raw().as_slice())
    }

    /// Byte at column `x`, row `y`, channel `c`.
    #[must_use]
    pub fn sample(&self, x: u32, y: u32, c: usize) -> u8 {
        let idx = (y as usize * self.width() as usize + x as usize) * self.channels() + c;
        self.as_raw()[idx]
    }

    /// Mean of every channel over the whole frame.
    #[must_use]
    pub fn channel_means(&self) -> Vec<f64> {
        let channels = self.channels();
        let mut sums = vec![0u64; channels];
        for px in self.as_raw().chunks_exact(channels) {
            for (sum, &v) in sums.iter_mut().zip(px) {
                *sum += u64::from(v);
            }
        }
        let count = (self.width() as u64 * self.height() as u64).max(1);
        sums.into_iter().map(|s| s as f64 / count as f64).collect()
    }
}

impl From<GrayImage> for Frame {
    fn from(img: GrayImage) -> Self {
        Frame::Gray(img)
    }
}

impl From<RgbImage> for Frame {
    fn from(img: RgbImage) -> Self {
        Frame::Rgb(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma, Rgb, Rgba};

    #[test]
    fn test_from_dynamic_accepts_8bit() {
        let rgb = RgbImage::from_pixel(4, 2, Rgb([1, 2, 3]));
        let frame = Frame::from_dynamic(DynamicImage::ImageRgb8(rgb)).unwrap();
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.dimensions(), (4, 2));

        let rgba = ImageBuffer::from_pixel(3, 3, Rgba([9u8, 8, 7, 255]));
        let frame = Frame::from_dynamic(DynamicImage::ImageRgba8(rgba)).unwrap();
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.sample(1, 1, 2), 7);
    }

    #[test]
    fn test_from_dynamic_rejects_16bit() {
        let img = ImageBuffer::from_pixel(2, 2, Luma([1000u16]));
        let err = Frame::from_dynamic(DynamicImage::ImageLuma16(img)).unwrap_err();
        assert!(matches!(err, AugmentError::InvalidPixelDepth(_)));
    }

    #[test]
    fn test_channel_means() {
        let mut img = RgbImage::new(2, 1);
        img.put_pixel(0, 0, Rgb([10, 0, 255]));
        img.put_pixel(1, 0, Rgb([20, 100, 255]));
        let means = Frame::Rgb(img).channel_means();
        assert_eq!(means, vec![15.0, 50.0, 255.0]);
    }

    #[test]
    fn test_map_frame_keeps_variant() {
        let frame = Frame::Gray(GrayImage::from_pixel(3, 2, Luma([5])));
        let flipped = map_frame!(frame, img => image::imageops::flip_horizontal(&img));
        assert!(matches!(flipped, Frame::Gray(_)));
        assert_eq!(flipped.dimensions(), (3, 2));
    }
}
