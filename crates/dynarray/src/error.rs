//! Sticky fault state and per-call error types.

use std::error::Error;
use std::fmt;

/// The sticky fault flag carried by every [`DynamicArray`](crate::DynamicArray).
///
/// Starts at `Ok`. The first failing operation moves it to one of the
/// fault states, after which every mutating operation is a no-op until
/// [`clear_fault`](crate::DynamicArray::clear_fault) is called.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ErrorState {
    /// No fault observed.
    #[default]
    Ok,
    /// An allocation during init, growth, or shrink failed.
    OutOfMemory,
    /// An index violated its range check, or a removal hit an empty array.
    OutOfBounds,
}

impl ErrorState {
    /// Returns `true` when no fault has been recorded.
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl fmt::Display for ErrorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::OutOfBounds => write!(f, "out of bounds"),
        }
    }
}

/// Error returned by the `try_` operations of
/// [`DynamicArray`](crate::DynamicArray).
///
/// Every variant except [`Jammed`](Self::Jammed) is raised by the call
/// that caused the fault and is mirrored into the array's [`ErrorState`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArrayError {
    /// Allocation of the backing buffer failed.
    OutOfMemory {
        /// Capacity (in elements) the failed allocation asked for.
        requested: usize,
    },
    /// An index fell outside the valid range for the operation.
    OutOfBounds {
        /// The offending index, or `None` if it was negative or did not
        /// fit in `usize`.
        index: Option<usize>,
        /// Number of elements at the time of the call.
        len: usize,
    },
    /// Tail removal from an empty array.
    Empty,
    /// The call was refused because an earlier fault is still recorded.
    Jammed {
        /// The recorded fault.
        state: ErrorState,
    },
}

impl ArrayError {
    /// The sticky state this error leaves the array in.
    pub fn state(&self) -> ErrorState {
        match self {
            Self::OutOfMemory { .. } => ErrorState::OutOfMemory,
            Self::OutOfBounds { .. } | Self::Empty => ErrorState::OutOfBounds,
            Self::Jammed { state } => *state,
        }
    }
}

impl fmt::Display for ArrayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory: failed to allocate {requested} elements")
            }
            Self::OutOfBounds {
                index: Some(index),
                len,
            } => {
                write!(f, "index {index} out of bounds for length {len}")
            }
            Self::OutOfBounds { index: None, len } => {
                write!(f, "negative or oversized index for length {len}")
            }
            Self::Empty => write!(f, "remove from empty array"),
            Self::Jammed { state } => {
                write!(f, "array is jammed by an earlier fault: {state}")
            }
        }
    }
}

impl Error for ArrayError {}
