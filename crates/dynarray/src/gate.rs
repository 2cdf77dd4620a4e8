//! Admission control for buffer allocations.
//!
//! Every allocation a [`DynamicArray`](crate::DynamicArray) makes is first
//! described as an [`AllocRequest`] and offered to its [`AllocGate`]. A
//! refused request fails exactly like a null return from the global
//! allocator: the array records `OutOfMemory` and keeps its old buffer.
//! Memory itself always comes from the global allocator.

use std::fmt;

/// Why the array wants memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AllocKind {
    /// First allocation of `min_capacity` zeroed slots.
    Init,
    /// Capacity doubling on a full buffer.
    Grow,
    /// Capacity halving at the shrink watermark.
    Shrink,
}

impl fmt::Display for AllocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Grow => write!(f, "grow"),
            Self::Shrink => write!(f, "shrink"),
        }
    }
}

/// A single allocation about to be attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocRequest {
    /// What triggered the allocation.
    pub kind: AllocKind,
    /// Capacity before the request, in elements (0 for `Init`).
    pub from: usize,
    /// Capacity after the request, in elements.
    pub to: usize,
    /// Size of the requested buffer in bytes (saturating).
    pub bytes: usize,
}

impl AllocRequest {
    /// Describe a request for `to` slots of `T`.
    pub fn new<T>(kind: AllocKind, from: usize, to: usize) -> Self {
        Self {
            kind,
            from,
            to,
            bytes: to.saturating_mul(std::mem::size_of::<T>()),
        }
    }
}

/// Decides whether an allocation may proceed.
///
/// Implemented by test fixtures to inject out-of-memory faults at chosen
/// points. Gates see requests in the order the array issues them.
pub trait AllocGate {
    /// Return `false` to make `request` fail as out-of-memory.
    fn admit(&self, request: &AllocRequest) -> bool;
}

/// The default gate: admits every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct AlwaysAdmit;

impl AllocGate for AlwaysAdmit {
    fn admit(&self, _request: &AllocRequest) -> bool {
        true
    }
}

impl<G: AllocGate + ?Sized> AllocGate for &G {
    fn admit(&self, request: &AllocRequest) -> bool {
        (**self).admit(request)
    }
}
