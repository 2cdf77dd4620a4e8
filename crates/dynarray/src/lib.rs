//! A growable array with explicit capacity control and sticky faults.
//!
//! [`DynamicArray`] owns one contiguous buffer. Appends double the
//! capacity when full; removals halve it when exactly half is in use,
//! never going below the minimum capacity chosen at construction.
//! Errors never panic: the first fault (out of memory, or an index out of
//! bounds) is recorded in an [`ErrorState`] and every later mutating call
//! becomes a no-op until the fault is cleared.
//!
//! ```
//! use dynarray::{DynamicArray, ErrorState};
//!
//! let mut array = DynamicArray::<u32>::new(4).unwrap();
//! for v in 0..5 {
//!     array.add(v);
//! }
//! array.add_at(1, 99);
//! assert_eq!(array.as_slice(), &[0, 99, 1, 2, 3, 4]);
//! assert_eq!(array.capacity(), 8);
//!
//! array.get(10); // out of bounds: the array is now jammed
//! array.add(7); // ignored
//! assert_eq!(array.error_state(), ErrorState::OutOfBounds);
//! assert_eq!(array.size(), 6);
//! ```
//!
//! # Architecture
//!
//! ```text
//! DynamicArray<T, G> (policy: gating, growth, shrink watermark, bounds)
//! ├── RawBuffer<T>   (mechanism: allocation, shifting, all `unsafe`)
//! └── G: AllocGate   (admits or refuses each allocation request)
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod array;
pub mod config;
pub mod error;
pub mod gate;
mod raw;

// Public re-exports for the primary API surface.
pub use array::DynamicArray;
pub use config::{ArrayConfig, ConfigError, InsertOrder};
pub use error::{ArrayError, ErrorState};
pub use gate::{AllocGate, AllocKind, AllocRequest, AlwaysAdmit};
