//! Raw and encoded sample records.

use image::{GrayImage, RgbImage};
use pixaug_core::{AugmentError, Result};

use crate::config::ColorMode;
use crate::frame::Frame;

/// A stored training sample.
///
/// A raw datum keeps its pixels channel-major (`CHW`) either as bytes in
/// `data` or as floats in `float_data`; bytes win when both are set. An
/// encoded datum holds a compressed image payload in `data` and its
/// dimensions are only known after decoding.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Datum {
    /// Number of channels.
    pub channels: usize,
    /// Rows.
    pub height: usize,
    /// Columns.
    pub width: usize,
    /// CHW bytes, or the compressed payload when `encoded`.
    pub data: Vec<u8>,
    /// CHW floats, used when `data` is empty.
    pub float_data: Vec<f32>,
    /// Whether `data` is a compressed image.
    pub encoded: bool,
    /// Class label carried along untouched.
    pub label: i32,
}

impl Datum {
    /// A raw 8-bit datum.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::ShapeMismatch`] when `data` does not hold
    /// `channels * height * width` bytes.
    pub fn from_bytes(channels: usize, height: usize, width: usize, data: Vec<u8>) -> Result<Self> {
        let datum = Self {
            channels,
            height,
            width,
            data,
            ..Default::default()
        };
        datum.check_raw()?;
        Ok(datum)
    }

    /// A raw float datum.
    pub fn from_floats(
        channels: usize,
        height: usize,
        width: usize,
        float_data: Vec<f32>,
    ) -> Result<Self> {
        let datum = Self {
            channels,
            height,
            width,
            float_data,
            ..Default::default()
        };
        datum.check_raw()?;
        Ok(datum)
    }

    /// An encoded datum wrapping a compressed payload (PNG, JPEG).
    #[must_use]
    pub fn encoded(payload: Vec<u8>) -> Self {
        Self {
            data: payload,
            encoded: true,
            ..Default::default()
        }
    }

    /// Attach a label.
    #[must_use]
    pub fn with_label(mut self, label: i32) -> Self {
        self.label = label;
        self
    }

    /// Whether the pixels are stored as bytes rather than floats.
    #[must_use]
    pub fn has_bytes(&self) -> bool {
        !self.data.is_empty()
    }

    /// Number of values a raw datum must hold.
    #[must_use]
    pub fn item_len(&self) -> usize {
        self.channels * self.height * self.width
    }

    /// Check that a raw datum's payload matches its dimensions.
    pub fn check_raw(&self) -> Result<()> {
        if self.encoded {
            return Err(AugmentError::shape(
                "encoded datum must be decoded before its pixels are read",
            ));
        }
        if self.channels == 0 {
            return Err(AugmentError::shape("datum has no channels"));
        }
        let stored = if self.has_bytes() {
            self.data.len()
        } else {
            self.float_data.len()
        };
        if stored != self.item_len() {
            return Err(AugmentError::shape(format!(
                "datum {}x{}x{} needs {} values, got {stored}",
                self.channels,
                self.height,
                self.width,
                self.item_len()
            )));
        }
        Ok(())
    }

    /// Value at channel `c`, row `h`, column `w` of a raw datum.
    #[must_use]
    pub fn value(&self, c: usize, h: usize, w: usize) -> f32 {
        let idx = (c * self.height + h) * self.width + w;
        if self.has_bytes() {
            f32::from(self.data[idx])
        } else {
            self.float_data[idx]
        }
    }

    /// Decode an encoded datum into a frame.
    ///
    /// # Errors
    ///
    /// - [`AugmentError::Decode`] when the payload is not a readable image
    /// - [`AugmentError::InvalidPixelDepth`] for a non-8-bit payload decoded natively
    /// - [`AugmentError::UnsupportedEncodedInput`] when built without the
    ///   `decode` feature
    #[cfg(feature = "decode")]
    pub fn decode(&self, mode: ColorMode) -> Result<Frame> {
        let image = image::load_from_memory(&self.data)
            .map_err(|e| AugmentError::Decode(e.to_string()))?;
        match mode {
            ColorMode::Color => Ok(Frame::Rgb(image.to_rgb8())),
            ColorMode::Gray => Ok(Frame::Gray(image.to_luma8())),
            ColorMode::Native => Frame::from_dynamic(image),
        }
    }

    /// Decoding is unavailable without the `decode` feature.
    #[cfg(not(feature = "decode"))]
    pub fn decode(&self, _mode: ColorMode) -> Result<Frame> {
        Err(AugmentError::UnsupportedEncodedInput)
    }

    /// Build an 8-bit frame from this datum.
    ///
    /// Encoded datums are decoded natively. Raw datums must carry 1 or 3
    /// channels of bytes.
    pub fn to_frame(&self) -> Result<Frame> {
        if self.encoded {
            return self.decode(ColorMode::Native);
        }
        self.check_raw()?;
        if !self.has_bytes() {
            return Err(AugmentError::InvalidPixelDepth(
                "float datum cannot be viewed as an 8-bit image".to_string(),
            ));
        }
        let (h, w) = (self.height, self.width);
        let plane = h * w;
        let width = u32::try_from(w).map_err(|_| AugmentError::shape("datum too wide"))?;
        let height = u32::try_from(h).map_err(|_| AugmentError::shape("datum too tall"))?;
        match self.channels {
            1 => GrayImage::from_raw(width, height, self.data.clone())
                .map(Frame::Gray)
                .ok_or_else(|| AugmentError::shape("datum buffer too small")),
            3 => {
                let mut hwc = Vec::with_capacity(self.data.len());
                for i in 0..plane {
                    for c in 0..3 {
                        hwc.push(self.data[c * plane + i]);
                    }
                }
                RgbImage::from_raw(width, height, hwc)
                    .map(Frame::Rgb)
                    .ok_or_else(|| AugmentError::shape("datum buffer too small"))
            }
            n => Err(AugmentError::shape(format!(
                "an image datum needs 1 or 3 channels, got {n}"
            ))),
        }
    }

    /// Store a frame as a raw, channel-major byte datum.
    #[must_use]
    pub fn from_frame(frame: &Frame) -> Self {
        let channels = frame.channels();
        let (width, height) = frame.dimensions();
        let (w, h) = (width as usize, height as usize);
        let plane = w * h;
        let mut data = vec![0u8; plane * channels];
        for (i, px) in frame.as_raw().chunks_exact(channels).enumerate() {
            for (c, &v) in px.iter().enumerate() {
                data[c * plane + i] = v;
            }
        }
        Self {
            channels,
            height: h,
            width: w,
            data,
            ..Default::default()
        }
    }
}
