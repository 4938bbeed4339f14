//! # pixaug_core
//!
//! Core types shared by the pixaug augmentation pipeline.
//!
//! This crate provides:
//! - [`Seed`] and [`RandomSource`] for reproducible random decisions
//! - [`Phase`] to separate training from evaluation behaviour
//! - [`BlobShape`] for `(N, C, H, W)` destination tensors
//! - [`ImageTensor`] to hand packed batches to a Burn backend
//! - Error types and common utilities
//!
//! ## Layout Convention
//!
//! Packed tensors are channel-major, `(N, C, H, W)`:
//! - `N`: samples
//! - `C`: channels
//! - `H`: rows
//! - `W`: columns
//!
//! ## Example
//!
//! ```rust
//! use pixaug_core::{BlobShape, RandomSource, Seed};
//!
//! let mut source = RandomSource::seeded(Seed::new(42));
//! let offset = source.index(51).unwrap();
//! assert!(offset < 51);
//!
//! let shape = BlobShape::new(1, 3, 100, 100);
//! assert_eq!(shape.item_len(), 30_000);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod phase;
mod random;
mod seed;
mod shape;
mod tensor;

pub use error::{AugmentError, Result};
pub use phase::Phase;
pub use random::RandomSource;
pub use seed::Seed;
pub use shape::BlobShape;
pub use tensor::{alloc_blob, blob_shape, ChannelStats, ImageTensor};

/// Backend type aliases for convenience
pub mod backend {
    #[cfg(feature = "backend-ndarray")]
    pub use burn_ndarray::NdArray;
}
