//! Per-transformer random source.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::error::{AugmentError, Result};
use crate::seed::Seed;

/// Seeded generator owned by one transformer instance.
///
/// A source is either seeded or disabled. Transformers that never randomize
/// carry a disabled source, and any draw from it fails with
/// [`AugmentError::RandomSourceUnavailable`].
///
/// The source is not synchronized. Parallel callers must use one transformer
/// (and therefore one source) per worker, otherwise draw sequences interleave
/// and runs stop being reproducible.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: Option<ChaCha8Rng>,
    draws: u64,
}

impl RandomSource {
    /// A source seeded from `seed`.
    #[must_use]
    pub fn seeded(seed: Seed) -> Self {
        Self {
            rng: Some(seed.to_rng()),
            draws: 0,
        }
    }

    /// A source that refuses every draw.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            rng: None,
            draws: 0,
        }
    }

    /// Whether draws are possible.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.rng.is_some()
    }

    /// Number of draws taken so far.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }

    fn rng(&mut self) -> Result<&mut ChaCha8Rng> {
        let rng = self
            .rng
            .as_mut()
            .ok_or(AugmentError::RandomSourceUnavailable)?;
        self.draws += 1;
        Ok(rng)
    }

    /// Uniform integer in `[0, n)`. `n` must be positive.
    pub fn index(&mut self, n: usize) -> Result<usize> {
        debug_assert!(n > 0, "index() needs a non-empty range");
        let rng = self.rng()?;
        Ok(rng.gen_range(0..n.max(1)))
    }

    /// Uniform float in `[lo, hi)`; returns `lo` when the range is empty.
    pub fn uniform(&mut self, lo: f32, hi: f32) -> Result<f32> {
        let rng = self.rng()?;
        let unit: f32 = rng.gen();
        Ok(lo + (hi - lo) * unit)
    }

    /// Uniform integer in `[-max, max]`: one `index(2 * max + 1)` draw,
    /// shifted down by `max`.
    pub fn symmetric(&mut self, max: u32) -> Result<i64> {
        let span = u64::from(max) * 2 + 1;
        let n = usize::try_from(span).map_err(|_| {
            AugmentError::conflict(format!("symmetric range +/-{max} exceeds usize"))
        })?;
        Ok(self.index(n)? as i64 - i64::from(max))
    }

    /// Fair coin: one `index(2)` draw, true on 1.
    pub fn coin(&mut self) -> Result<bool> {
        Ok(self.index(2)? == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_source_errors() {
        let mut source = RandomSource::disabled();
        assert!(!source.is_available());
        assert!(matches!(
            source.index(4),
            Err(AugmentError::RandomSourceUnavailable)
        ));
        assert!(matches!(
            source.uniform(0.0, 1.0),
            Err(AugmentError::RandomSourceUnavailable)
        ));
        assert_eq!(source.draws(), 0);
    }

    #[test]
    fn test_refused_draws_are_not_counted() {
        let mut source = RandomSource::disabled();
        for _ in 0..3 {
            assert!(source.coin().is_err());
        }
        assert_eq!(source.draws(), 0);
    }

    #[test]
    fn test_seeded_source_matches_chacha8() {
        let mut source = RandomSource::seeded(Seed::new(42));
        let mut rng = Seed::new(42).to_rng();

        for n in 1..50usize {
            assert_eq!(source.index(n).unwrap(), rng.gen_range(0..n));
        }
        let unit: f32 = rng.gen();
        assert_eq!(source.uniform(2.0, 4.0).unwrap(), 2.0 + 2.0 * unit);
        assert_eq!(source.draws(), 50);
    }

    #[test]
    fn test_symmetric_matches_shifted_index() {
        let mut source = RandomSource::seeded(Seed::new(9));
        let mut rng = Seed::new(9).to_rng();
        for max in [0u32, 1, 5, 180, 255] {
            let expected = rng.gen_range(0..max as usize * 2 + 1) as i64 - i64::from(max);
            let v = source.symmetric(max).unwrap();
            assert_eq!(v, expected);
            assert!((-i64::from(max)..=i64::from(max)).contains(&v));
        }
        assert_eq!(source.draws(), 5);
    }

    #[test]
    fn test_ranges() {
        let mut source = RandomSource::seeded(Seed::new(3));
        for _ in 0..1000 {
            let i = source.index(7).unwrap();
            assert!(i < 7);
            let f = source.uniform(-1.5, 2.5).unwrap();
            assert!((-1.5..2.5).contains(&f));
        }
        assert_eq!(source.uniform(3.0, 3.0).unwrap(), 3.0);
    }
}
