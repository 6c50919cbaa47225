//! Error type shared by the evens crates.

/// Error type for sequence configuration and cursor allocation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvensError {
    /// The configured limit was negative.
    #[error("invalid configuration: limit must be >= 0, got {0}")]
    InvalidConfiguration(i64),

    /// Cursor storage could not be reserved.
    #[error("cursor allocation failed: requested {requested} bytes, {available} available")]
    AllocationFailure {
        /// Bytes asked for.
        requested: usize,
        /// Bytes left in the allocator's budget.
        available: usize,
    },

    /// A virtual file with this name is already registered.
    #[error("virtual file already registered: {0}")]
    AlreadyRegistered(String),

    /// No virtual file with this name is registered.
    #[error("virtual file not found: {0}")]
    NotFound(String),
}

impl EvensError {
    /// Whether this error stems from bad configuration rather than runtime state.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfiguration(_) | Self::AlreadyRegistered(_) | Self::NotFound(_)
        )
    }
}
