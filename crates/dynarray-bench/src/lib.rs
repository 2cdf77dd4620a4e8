//! Benchmark profiles and utilities for the dynarray container.
//!
//! - [`filled`]: an array pre-loaded with `0..len`
//! - [`scatter_indices`]: deterministic pseudo-random index sequence

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use dynarray::DynamicArray;

/// Build an array with the given floor holding `0..len`.
///
/// # Panics
///
/// Panics if `min_capacity` is zero or the array faults while filling.
pub fn filled(min_capacity: usize, len: u32) -> DynamicArray<u32> {
    let mut array = DynamicArray::new(min_capacity).expect("min_capacity must be non-zero");
    for v in 0..len {
        array.add(v);
    }
    assert!(array.error_state().is_ok(), "fill faulted: {:?}", array.error_state());
    array
}

/// Generate `n` indices, each valid for an array whose length starts at
/// `start_len` and grows by one per insert.
///
/// Uses a fixed LCG so runs are comparable across machines.
pub fn scatter_indices(start_len: usize, n: usize, seed: u64) -> Vec<usize> {
    let mut state = seed;
    (0..n)
        .map(|i| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) % (start_len + i + 1) as u64) as usize
        })
        .collect()
}
