//! Destination shape inference.

use image::{ColorType, DynamicImage, GenericImageView};
use pixaug_core::{AugmentError, BlobShape, Result};

use crate::config::ColorMode;
use crate::datum::Datum;
use crate::frame::Frame;
use crate::geometric::ensure_fits;

/// Computes `[count, C, H, W]` for inputs under a crop size.
///
/// `H` and `W` are `crop_size` when it is non-zero, else the input's own
/// dimensions. No randomness is involved.
#[derive(Debug, Clone, Copy)]
pub struct ShapeInferencer {
    crop_size: usize,
    color_mode: ColorMode,
}

impl ShapeInferencer {
    /// Inferencer for a crop size and decoding mode.
    #[must_use]
    pub const fn new(crop_size: usize, color_mode: ColorMode) -> Self {
        Self {
            crop_size,
            color_mode,
        }
    }

    /// Shape of one `channels x height x width` input.
    ///
    /// # Errors
    ///
    /// - [`AugmentError::ShapeMismatch`] when `channels` is zero
    /// - [`AugmentError::InsufficientSourceDimensions`] when the crop does not fit
    pub fn for_dims(&self, channels: usize, height: usize, width: usize) -> Result<BlobShape> {
        if channels == 0 {
            return Err(AugmentError::shape("input has no channels"));
        }
        ensure_fits(self.crop_size, height, width)?;
        Ok(if self.crop_size > 0 {
            BlobShape::new(1, channels, self.crop_size, self.crop_size)
        } else {
            BlobShape::new(1, channels, height, width)
        })
    }

    /// Shape of one frame.
    pub fn frame(&self, frame: &Frame) -> Result<BlobShape> {
        let (width, height) = frame.dimensions();
        self.for_dims(frame.channels(), height as usize, width as usize)
    }

    /// Shape of one decoded image, as it will be packed.
    ///
    /// Alpha channels are not counted; they are dropped on conversion.
    pub fn image(&self, image: &DynamicImage) -> Result<BlobShape> {
        let channels = match image.color() {
            ColorType::L8 | ColorType::La8 => 1,
            ColorType::Rgb8 | ColorType::Rgba8 => 3,
            other => {
                return Err(AugmentError::InvalidPixelDepth(format!(
                    "image data type must be unsigned byte, got {other:?}"
                )))
            }
        };
        let (width, height) = GenericImageView::dimensions(image);
        self.for_dims(channels, height as usize, width as usize)
    }

    /// Shape of a batch of images, from the first item.
    pub fn images(&self, images: &[DynamicImage]) -> Result<BlobShape> {
        let first = images
            .first()
            .ok_or_else(|| AugmentError::shape("there is no image in the batch"))?;
        Ok(self.image(first)?.with_num(images.len()))
    }

    /// Shape of one datum; encoded datums are decoded first.
    pub fn datum(&self, datum: &Datum) -> Result<BlobShape> {
        if datum.encoded {
            let frame = datum.decode(self.color_mode)?;
            return self.frame(&frame);
        }
        self.for_dims(datum.channels, datum.height, datum.width)
    }

    /// Shape of a batch of frames, from the first item.
    pub fn frames(&self, frames: &[Frame]) -> Result<BlobShape> {
        let first = frames
            .first()
            .ok_or_else(|| AugmentError::shape("there is no image in the batch"))?;
        Ok(self.frame(first)?.with_num(frames.len()))
    }

    /// Shape of a batch of datums, from the first item.
    pub fn datums(&self, datums: &[Datum]) -> Result<BlobShape> {
        let first = datums
            .first()
            .ok_or_else(|| AugmentError::shape("there is no datum in the batch"))?;
        Ok(self.datum(first)?.with_num(datums.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, RgbImage};

    #[test]
    fn test_crop_size_wins() {
        let inferencer = ShapeInferencer::new(100, ColorMode::Native);
        let frame = Frame::Rgb(RgbImage::new(150, 120));
        assert_eq!(
            inferencer.frame(&frame).unwrap(),
            BlobShape::new(1, 3, 100, 100)
        );
    }

    #[test]
    fn test_native_dims_without_crop() {
        let inferencer = ShapeInferencer::new(0, ColorMode::Native);
        let frame = Frame::Gray(GrayImage::new(7, 5));
        assert_eq!(inferencer.frame(&frame).unwrap(), BlobShape::new(1, 1, 5, 7));
    }

    #[test]
    fn test_batches_use_first_item() {
        let inferencer = ShapeInferencer::new(0, ColorMode::Native);
        let datums = vec![
            Datum::from_bytes(3, 4, 6, vec![0; 72]).unwrap(),
            Datum::from_bytes(3, 4, 6, vec![0; 72]).unwrap(),
        ];
        assert_eq!(
            inferencer.datums(&datums).unwrap(),
            BlobShape::new(2, 3, 4, 6)
        );
        assert!(matches!(
            inferencer.datums(&[]),
            Err(AugmentError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_image_drops_alpha() {
        let inferencer = ShapeInferencer::new(0, ColorMode::Native);
        let rgba = DynamicImage::new_rgba8(6, 4);
        assert_eq!(inferencer.image(&rgba).unwrap(), BlobShape::new(1, 3, 4, 6));
        let deep = DynamicImage::new_rgb16(6, 4);
        assert!(matches!(
            inferencer.image(&deep),
            Err(AugmentError::InvalidPixelDepth(_))
        ));
    }

    #[test]
    fn test_crop_larger_than_input() {
        let inferencer = ShapeInferencer::new(10, ColorMode::Native);
        assert!(matches!(
            inferencer.for_dims(1, 8, 12),
            Err(AugmentError::InsufficientSourceDimensions { .. })
        ));
    }
}
