//! Destination tensor shape metadata.

use serde::{Deserialize, Serialize};

use crate::error::{AugmentError, Result};

/// Shape of a packed image tensor.
///
/// Follows the convention `(N, C, H, W)`:
/// - `N`: number of samples
/// - `C`: channels
/// - `H`: rows
/// - `W`: columns
///
/// ```rust
/// use pixaug_core::BlobShape;
///
/// let shape = BlobShape::new(8, 3, 224, 224);
/// assert_eq!(shape.item_len(), 3 * 224 * 224);
/// assert_eq!(shape.numel(), 8 * 3 * 224 * 224);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobShape {
    num: usize,
    channels: usize,
    height: usize,
    width: usize,
}

impl BlobShape {
    /// Create a new shape.
    #[must_use]
    pub const fn new(num: usize, channels: usize, height: usize, width: usize) -> Self {
        Self {
            num,
            channels,
            height,
            width,
        }
    }

    /// Create a shape from exactly four dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::ShapeMismatch`] for any other rank.
    pub fn from_dims(dims: &[usize]) -> Result<Self> {
        match dims {
            [n, c, h, w] => Ok(Self::new(*n, *c, *h, *w)),
            _ => Err(AugmentError::shape(format!(
                "expected 4 dimensions (N, C, H, W), got {}",
                dims.len()
            ))),
        }
    }

    /// Number of samples.
    #[must_use]
    pub const fn num(&self) -> usize {
        self.num
    }

    /// Number of channels.
    #[must_use]
    pub const fn channels(&self) -> usize {
        self.channels
    }

    /// Rows per sample.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Columns per sample.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Elements in one sample.
    #[must_use]
    pub const fn item_len(&self) -> usize {
        self.channels * self.height * self.width
    }

    /// Total number of elements.
    #[must_use]
    pub const fn numel(&self) -> usize {
        self.num * self.item_len()
    }

    /// Check if any dimension is zero.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.numel() == 0
    }

    /// Convert to an array.
    #[must_use]
    pub const fn as_array(&self) -> [usize; 4] {
        [self.num, self.channels, self.height, self.width]
    }

    /// Same shape with a different sample count.
    #[must_use]
    pub const fn with_num(&self, num: usize) -> Self {
        Self { num, ..*self }
    }

    /// Whether both shapes describe the same per-sample layout.
    #[must_use]
    pub const fn same_item(&self, other: &Self) -> bool {
        self.channels == other.channels
            && self.height == other.height
            && self.width == other.width
    }
}

impl std::fmt::Display for BlobShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}, {}, {}]",
            self.num, self.channels, self.height, self.width
        )
    }
}

impl From<[usize; 4]> for BlobShape {
    fn from([num, channels, height, width]: [usize; 4]) -> Self {
        Self::new(num, channels, height, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_from_dims() {
        let shape = BlobShape::from_dims(&[2, 3, 4, 5]).unwrap();
        assert_eq!(shape.as_array(), [2, 3, 4, 5]);

        assert!(BlobShape::from_dims(&[3, 4, 5]).is_err());
        assert!(BlobShape::from_dims(&[1, 2, 3, 4, 5]).is_err());
    }

    #[test]
    fn test_shape_counts() {
        let shape = BlobShape::new(2, 3, 4, 5);
        assert_eq!(shape.item_len(), 60);
        assert_eq!(shape.numel(), 120);
        assert!(!shape.is_empty());
        assert!(BlobShape::new(0, 3, 4, 5).is_empty());
    }

    #[test]
    fn test_shape_same_item() {
        let a = BlobShape::new(1, 3, 32, 32);
        assert!(a.same_item(&a.with_num(16)));
        assert!(!a.same_item(&BlobShape::new(1, 1, 32, 32)));
        assert_eq!(a.to_string(), "[1, 3, 32, 32]");
    }
}
