//! Array configuration parameters.

use std::error::Error;
use std::fmt;

/// Ordering of the capacity check and the index check in
/// [`add_at`](crate::DynamicArray::add_at).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InsertOrder {
    /// Grow a full buffer first, then validate the index. A rejected
    /// insert into a full array still doubles its capacity.
    #[default]
    GrowThenValidate,
    /// Validate the index first. A rejected insert never allocates.
    ValidateThenGrow,
}

/// Configuration for a [`DynamicArray`](crate::DynamicArray).
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayConfig {
    /// Initial capacity, and the floor capacity never shrinks below.
    ///
    /// Must be at least 1. Default: 4.
    pub min_capacity: usize,

    /// Whether `add_at` grows before or after checking its index.
    ///
    /// Default: [`InsertOrder::GrowThenValidate`].
    pub insert_order: InsertOrder,
}

impl ArrayConfig {
    /// Default minimum capacity.
    pub const DEFAULT_MIN_CAPACITY: usize = 4;

    /// Create a config with the given minimum capacity and default ordering.
    pub fn new(min_capacity: usize) -> Self {
        Self {
            min_capacity,
            insert_order: InsertOrder::default(),
        }
    }

    /// Replace the insert ordering.
    pub fn with_insert_order(mut self, insert_order: InsertOrder) -> Self {
        self.insert_order = insert_order;
        self
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_capacity == 0 {
            return Err(ConfigError::ZeroMinCapacity);
        }
        Ok(())
    }
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MIN_CAPACITY)
    }
}

/// Errors detected by [`ArrayConfig::validate()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `min_capacity` was zero.
    ZeroMinCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroMinCapacity => write!(f, "min_capacity must be at least 1"),
        }
    }
}

impl Error for ConfigError {}
