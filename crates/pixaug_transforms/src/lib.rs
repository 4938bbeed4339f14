//! # pixaug_transforms
//!
//! Seeded image augmentation and channel-major packing.
//!
//! This crate provides:
//! - [`TransformConfig`]: the serde-backed parameter record
//! - [`GateEvaluator`]: per-call decisions drawn in a fixed order
//! - Geometric and photometric transforms over 8-bit [`Frame`]s
//! - [`Packer`]: `(pixel - mean) * scale` into a `(C, H, W)` destination
//! - [`ShapeInferencer`]: destination shapes from inputs
//! - [`DataTransformer`]: the pipeline tying it together
//!
//! ## Pipeline
//!
//! On a training call the transformer draws, in order:
//!
//! 1. the mirror coin (mirror enabled and phase train)
//! 2. one gate draw per candidate: smooth, rotation, brightness, colour
//!    shift, min side, affine, random erasing
//! 3. the magnitudes of the fired transforms, applied as random erasing,
//!    colour shift, contrast/brightness, smoothing, min-side crop, affine
//!    warp or rotation
//! 4. the final crop offset, rows then columns
//!
//! Frames whose size changed are resized back before the final crop, and
//! mirroring is applied while packing.
//!
//! ## Example
//!
//! ```rust
//! use image::{DynamicImage, RgbImage};
//! use ndarray::Array4;
//! use pixaug_core::{Phase, Seed};
//! use pixaug_transforms::{DataTransformer, TransformConfig};
//!
//! let config = TransformConfig::from_json_str(
//!     r#"{ "crop_size": 24, "mirror": true, "max_rotation_angle": 10 }"#,
//! ).unwrap();
//! let mut transformer = DataTransformer::new(config, Phase::Train)
//!     .unwrap()
//!     .with_seed(Seed::new(42));
//!
//! let images = vec![DynamicImage::ImageRgb8(RgbImage::new(32, 32)); 2];
//! let shape = transformer.infer_shape_images(&images).unwrap();
//! let mut batch = Array4::<f32>::zeros((shape.num(), shape.channels(), shape.height(), shape.width()));
//! let records = transformer.transform_images(&images, &mut batch).unwrap();
//! assert_eq!(records.len(), 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod datum;
pub mod erase;
pub mod frame;
pub mod gate;
pub mod geometric;
pub mod mean;
pub mod packer;
pub mod photometric;
pub mod shape;
pub mod smooth;
pub mod transformer;

pub use config::{ColorMode, TransformConfig};
pub use datum::Datum;
pub use erase::{EraseParams, EraseRect};
pub use frame::Frame;
pub use gate::{Candidate, GateDecisions, GateEvaluator};
pub use geometric::{AffineParams, CropOffset, MinSideRange};
pub use mean::{MeanMap, MeanModel, MeanValues};
pub use packer::{CropWindow, Packer, PixelSource};
pub use photometric::{ColorShift, ContrastBrightness};
pub use shape::ShapeInferencer;
pub use smooth::{SmoothKind, SmoothParams};
pub use transformer::{AugmentationRecord, DataTransformer, MinSideCrop, SampledParams};
