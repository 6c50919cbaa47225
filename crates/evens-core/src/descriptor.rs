//! Immutable description of the generated sequence.

use crate::error::EvensError;

/// Rule mapping a record position to its element.
pub type GenerateFn = fn(u64) -> u64;

/// The default rule: the element at `position` is `position * 2`.
#[must_use]
pub fn even(position: u64) -> u64 {
    position.saturating_mul(2)
}

/// Bound and generation rule of a sequence.
///
/// Fixed once built; sessions only ever read from it.
///
/// # Example
/// ```
/// use evens_core::SequenceDescriptor;
/// let desc = SequenceDescriptor::new(10).unwrap();
/// assert_eq!(desc.limit(), 10);
/// assert_eq!(desc.generate(4), 8);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SequenceDescriptor {
    limit: u64,
    rule: GenerateFn,
}

impl SequenceDescriptor {
    /// Build a descriptor for the even-number sequence.
    ///
    /// Fails with [`EvensError::InvalidConfiguration`] when `limit` is negative.
    pub fn new(limit: i64) -> Result<Self, EvensError> {
        Self::with_rule(limit, even)
    }

    /// Build a descriptor with a custom generation rule.
    pub fn with_rule(limit: i64, rule: GenerateFn) -> Result<Self, EvensError> {
        let limit = u64::try_from(limit).map_err(|_| EvensError::InvalidConfiguration(limit))?;
        Ok(Self { limit, rule })
    }

    /// Exclusive upper bound on positions.
    #[inline]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Element at `position`.
    #[inline]
    pub fn generate(&self, position: u64) -> u64 {
        (self.rule)(position)
    }

    /// Whether `position` lies inside the sequence.
    #[inline]
    pub fn contains(&self, position: u64) -> bool {
        position < self.limit
    }
}
