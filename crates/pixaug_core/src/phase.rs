//! Pipeline phase.

use serde::{Deserialize, Serialize};

/// Whether a transformer serves training or evaluation.
///
/// Randomized transforms and random cropping are only eligible during
/// [`Phase::Train`]. [`Phase::Test`] crops from the centre and never draws.
///
/// ```rust
/// use pixaug_core::Phase;
///
/// assert!(Phase::Train.is_train());
/// assert_eq!("test".parse::<Phase>().unwrap(), Phase::Test);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Training: augmentations may fire.
    #[default]
    Train,
    /// Evaluation: deterministic centre crop only.
    Test,
}

impl Phase {
    /// Check if this is the training phase.
    #[must_use]
    pub const fn is_train(&self) -> bool {
        matches!(self, Phase::Train)
    }

    /// Check if this is the test phase.
    #[must_use]
    pub const fn is_test(&self) -> bool {
        matches!(self, Phase::Test)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Train => write!(f, "train"),
            Phase::Test => write!(f, "test"),
        }
    }
}

impl std::str::FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "train" => Ok(Phase::Train),
            "test" => Ok(Phase::Test),
            other => Err(format!("unknown phase '{other}', expected 'train' or 'test'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_checks() {
        assert!(Phase::Train.is_train());
        assert!(!Phase::Train.is_test());
        assert!(Phase::Test.is_test());
        assert!(!Phase::Test.is_train());
    }

    #[test]
    fn test_phase_parse_and_display() {
        assert_eq!("TRAIN".parse::<Phase>().unwrap(), Phase::Train);
        assert!("valid".parse::<Phase>().is_err());
        assert_eq!(format!("{}", Phase::Test), "test");
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&Phase::Test).unwrap();
        assert_eq!(json, "\"test\"");
        let restored: Phase = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, Phase::Test);
    }
}
