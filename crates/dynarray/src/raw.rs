//! Owned contiguous storage with explicit resize.
//!
//! [`RawBuffer`] is the only place in the crate that touches the global
//! allocator or raw pointers. It tracks the initialized prefix `[0, len)`
//! and exposes safe, bounds-asserted primitives (push, insert with right
//! shift, remove with left shift, pop, resize) for the policy layer in
//! `array.rs`.
//!
//! Elements are `Copy`, so nothing is ever dropped in place: shrinking or
//! releasing the buffer only returns memory.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};
use std::slice;

use crate::error::ArrayError;

pub(crate) struct RawBuffer<T: Copy> {
    ptr: NonNull<T>,
    /// Allocated slots. Zero only for a buffer whose init failed.
    cap: usize,
    /// Initialized prefix.
    len: usize,
    _owns: PhantomData<T>,
}

// SAFETY: the buffer is uniquely owned, like `Vec<T>`.
unsafe impl<T: Copy + Send> Send for RawBuffer<T> {}
// SAFETY: `&RawBuffer` only hands out `&[T]`.
unsafe impl<T: Copy + Sync> Sync for RawBuffer<T> {}

impl<T: Copy> RawBuffer<T> {
    /// A buffer with no storage, used when the first allocation fails.
    pub(crate) fn unallocated() -> Self {
        Self {
            ptr: NonNull::dangling(),
            cap: 0,
            len: 0,
            _owns: PhantomData,
        }
    }

    /// Allocate `cap` zero-filled slots.
    pub(crate) fn zeroed(cap: usize) -> Result<Self, ArrayError> {
        let layout = Self::layout(cap)?;
        let ptr = if layout.size() == 0 {
            NonNull::dangling()
        } else {
            // SAFETY: `layout` has non-zero size.
            let raw = unsafe { alloc::alloc_zeroed(layout) };
            NonNull::new(raw.cast::<T>()).ok_or(ArrayError::OutOfMemory { requested: cap })?
        };
        Ok(Self {
            ptr,
            cap,
            len: 0,
            _owns: PhantomData,
        })
    }

    /// Move the contents into a buffer of `new_cap` slots.
    ///
    /// On failure the existing allocation, contents, and capacity are left
    /// untouched.
    ///
    /// # Panics
    ///
    /// Panics if `new_cap` is smaller than the initialized prefix or the
    /// buffer was never allocated.
    pub(crate) fn resize(&mut self, new_cap: usize) -> Result<(), ArrayError> {
        assert!(new_cap >= self.len, "resize would truncate live elements");
        assert!(self.cap > 0, "resize of an unallocated buffer");
        let new_layout = Self::layout(new_cap)?;
        if new_layout.size() != 0 {
            let old_layout = Self::layout(self.cap)?;
            // SAFETY: `ptr` was allocated by the global allocator with
            // `old_layout` (non-zero size since `T` is not zero-sized and
            // `cap > 0`), and `new_layout.size()` is non-zero and was
            // validated by `Layout::array`.
            let raw = unsafe {
                alloc::realloc(self.ptr.as_ptr().cast::<u8>(), old_layout, new_layout.size())
            };
            self.ptr = NonNull::new(raw.cast::<T>())
                .ok_or(ArrayError::OutOfMemory { requested: new_cap })?;
        }
        self.cap = new_cap;
        Ok(())
    }

    /// Append at `len`.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is full.
    pub(crate) fn push(&mut self, value: T) {
        assert!(self.len < self.cap, "push into a full buffer");
        // SAFETY: `len < cap`, so the slot is inside the allocation.
        unsafe { self.ptr.as_ptr().add(self.len).write(value) };
        self.len += 1;
    }

    /// Insert at `index`, shifting `[index, len)` one slot right.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is full or `index > len`.
    pub(crate) fn insert(&mut self, index: usize, value: T) {
        assert!(self.len < self.cap, "insert into a full buffer");
        assert!(index <= self.len, "insert index past the end");
        // SAFETY: source `[index, len)` and destination `[index + 1, len + 1)`
        // both lie inside the allocation because `len < cap`. `ptr::copy`
        // handles the overlap.
        unsafe {
            let base = self.ptr.as_ptr();
            ptr::copy(base.add(index), base.add(index + 1), self.len - index);
            base.add(index).write(value);
        }
        self.len += 1;
    }

    /// Remove the element at `index`, shifting `[index + 1, len)` one slot left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`.
    pub(crate) fn remove(&mut self, index: usize) {
        assert!(index < self.len, "remove index past the end");
        // SAFETY: source `[index + 1, len)` and destination `[index, len - 1)`
        // are initialized slots inside the allocation.
        unsafe {
            let base = self.ptr.as_ptr();
            ptr::copy(base.add(index + 1), base.add(index), self.len - index - 1);
        }
        self.len -= 1;
    }

    /// Drop the last element from the initialized prefix.
    ///
    /// # Panics
    ///
    /// Panics if the buffer is empty.
    pub(crate) fn pop(&mut self) {
        assert!(self.len > 0, "pop from an empty buffer");
        self.len -= 1;
    }

    pub(crate) fn as_slice(&self) -> &[T] {
        // SAFETY: `[0, len)` is initialized and `ptr` is non-null and aligned
        // (dangling is valid for zero-length and zero-sized slices).
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as for `as_slice`, and `&mut self` guarantees uniqueness.
        unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn capacity(&self) -> usize {
        self.cap
    }

    fn layout(cap: usize) -> Result<Layout, ArrayError> {
        Layout::array::<T>(cap).map_err(|_| ArrayError::OutOfMemory { requested: cap })
    }
}

impl<T: Copy> Drop for RawBuffer<T> {
    fn drop(&mut self) {
        if self.cap == 0 || mem::size_of::<T>() == 0 {
            return;
        }
        if let Ok(layout) = Self::layout(self.cap) {
            // SAFETY: `ptr` was allocated with this exact layout.
            unsafe { alloc::dealloc(self.ptr.as_ptr().cast::<u8>(), layout) };
        }
    }
}
