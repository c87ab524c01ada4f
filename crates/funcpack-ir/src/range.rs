//! Score values and ranges.
//!
//! The target's named integer registers hold 32-bit signed values, and its
//! range guards use the `min..max` form with either bound optional.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::StructureError;

/// Validate that a numeric literal fits the target's score width.
pub fn checked_score(value: i64) -> Result<i32, StructureError> {
    i32::try_from(value).map_err(|_| StructureError::ScoreOutOfRange(value))
}

/// An inclusive range constraint over a score.
///
/// Renders as `5`, `0..9`, `3..` or `..7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    min: Option<i32>,
    max: Option<i32>,
}

impl ScoreRange {
    /// Create a range. At least one bound is required, and `min` must not
    /// exceed `max`; malformed constraints are structural errors raised
    /// here, not deferred to compile.
    pub fn new(min: Option<i32>, max: Option<i32>) -> Result<Self, StructureError> {
        match (min, max) {
            (None, None) => Err(StructureError::UnboundedRange),
            (Some(a), Some(b)) if a > b => Err(StructureError::EmptyRange { min: a, max: b }),
            _ => Ok(Self { min, max }),
        }
    }

    /// A range matching exactly one value.
    pub fn exact(value: i32) -> Self {
        Self {
            min: Some(value),
            max: Some(value),
        }
    }

    /// An inclusive `min..max` range.
    pub fn bounded(min: i32, max: i32) -> Result<Self, StructureError> {
        Self::new(Some(min), Some(max))
    }

    /// A `min..` range.
    pub fn at_least(min: i32) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// A `..max` range.
    pub fn at_most(max: i32) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn min(&self) -> Option<i32> {
        self.min
    }

    pub fn max(&self) -> Option<i32> {
        self.max
    }
}

impl fmt::Display for ScoreRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(a), Some(b)) if a == b => write!(f, "{a}"),
            (Some(a), Some(b)) => write!(f, "{a}..{b}"),
            (Some(a), None) => write!(f, "{a}.."),
            (None, Some(b)) => write!(f, "..{b}"),
            // Unreachable by construction; render the widest form.
            (None, None) => write!(f, ".."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_score_accepts_i32() {
        assert_eq!(checked_score(0), Ok(0));
        assert_eq!(checked_score(i32::MAX as i64), Ok(i32::MAX));
        assert_eq!(checked_score(i32::MIN as i64), Ok(i32::MIN));
    }

    #[test]
    fn test_checked_score_rejects_overflow() {
        assert_eq!(
            checked_score(i32::MAX as i64 + 1),
            Err(StructureError::ScoreOutOfRange(i32::MAX as i64 + 1))
        );
    }

    #[test]
    fn test_range_display() {
        assert_eq!(format!("{}", ScoreRange::exact(5)), "5");
        assert_eq!(format!("{}", ScoreRange::bounded(0, 9).unwrap()), "0..9");
        assert_eq!(format!("{}", ScoreRange::at_least(3)), "3..");
        assert_eq!(format!("{}", ScoreRange::at_most(7)), "..7");
    }

    #[test]
    fn test_empty_range_is_structural_error() {
        assert_eq!(
            ScoreRange::bounded(4, 2),
            Err(StructureError::EmptyRange { min: 4, max: 2 })
        );
    }

    #[test]
    fn test_unbounded_range_is_structural_error() {
        assert_eq!(
            ScoreRange::new(None, None),
            Err(StructureError::UnboundedRange)
        );
    }
}
