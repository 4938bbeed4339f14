//! Destination tensor helpers.
//!
//! The packer writes into an [`ndarray::Array4<f32>`] laid out `(N, C, H, W)`.
//! [`ImageTensor`] hands the packed batch to a Burn backend.

use burn::prelude::*;
use burn::tensor::{ElementConversion, TensorData};
use ndarray::Array4;

use crate::error::{AugmentError, Result};
use crate::shape::BlobShape;

/// Allocate a zeroed destination tensor of the given shape.
#[must_use]
pub fn alloc_blob(shape: BlobShape) -> Array4<f32> {
    Array4::zeros((shape.num(), shape.channels(), shape.height(), shape.width()))
}

/// Shape of an allocated destination tensor.
#[must_use]
pub fn blob_shape(blob: &Array4<f32>) -> BlobShape {
    let dims = blob.dim();
    BlobShape::new(dims.0, dims.1, dims.2, dims.3)
}

/// Min, max and mean of one channel across a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    /// Smallest value.
    pub min: f32,
    /// Largest value.
    pub max: f32,
    /// Mean value.
    pub mean: f32,
}

/// A packed image batch on a Burn backend.
///
/// # Type Parameters
///
/// * `B` - The Burn backend type
#[derive(Debug, Clone)]
pub struct ImageTensor<B: Backend> {
    inner: Tensor<B, 4>,
    shape: BlobShape,
}

impl<B: Backend> ImageTensor<B> {
    /// Wrap an existing 4-D Burn tensor.
    pub fn new(tensor: Tensor<B, 4>) -> Self {
        let shape = BlobShape::from(tensor.dims());
        Self {
            inner: tensor,
            shape,
        }
    }

    /// Copy a packed `(N, C, H, W)` array onto `device`.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::ShapeMismatch`] for an empty array.
    pub fn from_array(blob: &Array4<f32>, device: &B::Device) -> Result<Self> {
        let shape = blob_shape(blob);
        if shape.is_empty() {
            return Err(AugmentError::shape(format!(
                "cannot upload an empty blob {shape}"
            )));
        }
        let values: Vec<f32> = blob.iter().copied().collect();
        let data = TensorData::new(values, shape.as_array());
        Ok(Self {
            inner: Tensor::from_data(data, device),
            shape,
        })
    }

    /// Get the shape metadata.
    #[must_use]
    pub const fn shape(&self) -> BlobShape {
        self.shape
    }

    /// Get a reference to the underlying Burn tensor.
    #[must_use]
    pub const fn inner(&self) -> &Tensor<B, 4> {
        &self.inner
    }

    /// Consume self and return the underlying Burn tensor.
    #[must_use]
    pub fn into_inner(self) -> Tensor<B, 4> {
        self.inner
    }

    /// Get the device the tensor is on.
    pub fn device(&self) -> B::Device {
        self.inner.device()
    }

    /// Per-channel statistics over every sample and pixel.
    pub fn channel_stats(&self) -> Vec<ChannelStats> {
        let [n, c, h, w] = self.shape.as_array();
        (0..c)
            .map(|ch| {
                let plane = self.inner.clone().slice([0..n, ch..ch + 1, 0..h, 0..w]);
                ChannelStats {
                    min: plane.clone().min().into_scalar().elem::<f32>(),
                    max: plane.clone().max().into_scalar().elem::<f32>(),
                    mean: plane.mean().into_scalar().elem::<f32>(),
                }
            })
            .collect()
    }
}
