//! The growable array and its sticky fault gate.
//!
//! Capacity starts at `min_capacity`, doubles when an insert finds the
//! buffer full, and halves when a removal leaves exactly half of it in use
//! (never below `min_capacity`). Capacity is therefore always
//! `min_capacity * 2^k`.
//!
//! Every mutating operation first checks the [`ErrorState`]. Once a fault
//! has been recorded the array refuses all further work until
//! [`DynamicArray::clear_fault`] is called, so a batch of calls can be
//! checked once at the end.

use std::fmt;

use crate::config::{ArrayConfig, ConfigError, InsertOrder};
use crate::error::{ArrayError, ErrorState};
use crate::gate::{AllocGate, AllocKind, AllocRequest, AlwaysAdmit};
use crate::raw::RawBuffer;

/// A growable sequence of `Copy` elements with sticky fault reporting.
///
/// Each mutating operation comes in two spellings sharing one code path:
/// the plain form (`add`, `remove_at`, ...) reports only through
/// [`error_state()`](Self::error_state), the `try_` form also returns the
/// [`ArrayError`] that caused (or blocked) the call.
///
/// Indices are taken as any integer type convertible to `usize`; negative
/// values are rejected as out of bounds rather than wrapped.
pub struct DynamicArray<T: Copy, G: AllocGate = AlwaysAdmit> {
    buf: RawBuffer<T>,
    min_capacity: usize,
    insert_order: InsertOrder,
    state: ErrorState,
    gate: G,
}

impl<T: Copy> DynamicArray<T> {
    /// Create an array with `min_capacity` zeroed slots.
    ///
    /// Allocation failure does not return an error: the array comes back
    /// with [`ErrorState::OutOfMemory`] and is unusable.
    pub fn new(min_capacity: usize) -> Result<Self, ConfigError> {
        Self::with_config(ArrayConfig::new(min_capacity))
    }

    /// Create an array from a full configuration.
    pub fn with_config(config: ArrayConfig) -> Result<Self, ConfigError> {
        Self::with_config_in(config, AlwaysAdmit)
    }
}

impl<T: Copy, G: AllocGate> DynamicArray<T, G> {
    /// Create an array whose allocations are admitted by `gate`.
    pub fn with_config_in(config: ArrayConfig, gate: G) -> Result<Self, ConfigError> {
        config.validate()?;
        let min_capacity = config.min_capacity;
        let request = AllocRequest::new::<T>(AllocKind::Init, 0, min_capacity);
        let allocated = if gate.admit(&request) {
            RawBuffer::zeroed(min_capacity)
        } else {
            Err(ArrayError::OutOfMemory {
                requested: min_capacity,
            })
        };
        let (buf, state) = match allocated {
            Ok(buf) => (buf, ErrorState::Ok),
            Err(err) => {
                log::warn!("dynarray init failed: {err}");
                (RawBuffer::unallocated(), err.state())
            }
        };
        Ok(Self {
            buf,
            min_capacity,
            insert_order: config.insert_order,
            state,
            gate,
        })
    }

    // ── Sticky operations ──────────────────────────────────────────

    /// Append `value` at the tail, doubling capacity if full.
    pub fn add(&mut self, value: T) {
        let _ = self.try_add(value);
    }

    /// Insert `value` at `index`, shifting later elements right.
    ///
    /// `index == size()` appends.
    pub fn add_at<I: TryInto<usize>>(&mut self, index: I, value: T) {
        let _ = self.try_add_at(index, value);
    }

    /// Overwrite the element at `index`.
    pub fn set<I: TryInto<usize>>(&mut self, index: I, value: T) {
        let _ = self.try_set(index, value);
    }

    /// Copy out the element at `index`.
    ///
    /// Returns `None` on a bad index (which records `OutOfBounds`) and on a
    /// jammed array (which records nothing).
    pub fn get<I: TryInto<usize>>(&mut self, index: I) -> Option<T> {
        self.try_get(index).ok()
    }

    /// Remove the tail element, halving capacity at the shrink watermark.
    pub fn remove(&mut self) {
        let _ = self.try_remove();
    }

    /// Remove the element at `index`, shifting later elements left.
    pub fn remove_at<I: TryInto<usize>>(&mut self, index: I) {
        let _ = self.try_remove_at(index);
    }

    // ── Result-returning operations ────────────────────────────────

    /// [`add`](Self::add), returning the fault.
    pub fn try_add(&mut self, value: T) -> Result<(), ArrayError> {
        self.gated("add", |array| {
            array.grow_if_full()?;
            array.buf.push(value);
            Ok(())
        })
    }

    /// [`add_at`](Self::add_at), returning the fault.
    ///
    /// Whether a full buffer grows before or after the index is checked is
    /// set by [`ArrayConfig::insert_order`].
    pub fn try_add_at<I: TryInto<usize>>(&mut self, index: I, value: T) -> Result<(), ArrayError> {
        let index = index.try_into().ok();
        self.gated("add_at", |array| {
            let index = match array.insert_order {
                InsertOrder::GrowThenValidate => {
                    array.grow_if_full()?;
                    array.insert_position(index)?
                }
                InsertOrder::ValidateThenGrow => {
                    let index = array.insert_position(index)?;
                    array.grow_if_full()?;
                    index
                }
            };
            array.buf.insert(index, value);
            Ok(())
        })
    }

    /// [`set`](Self::set), returning the fault.
    pub fn try_set<I: TryInto<usize>>(&mut self, index: I, value: T) -> Result<(), ArrayError> {
        let index = index.try_into().ok();
        self.gated("set", |array| {
            let index = array.element_position(index)?;
            array.buf.as_mut_slice()[index] = value;
            Ok(())
        })
    }

    /// [`get`](Self::get), returning the fault.
    pub fn try_get<I: TryInto<usize>>(&mut self, index: I) -> Result<T, ArrayError> {
        let index = index.try_into().ok();
        self.gated("get", |array| {
            let index = array.element_position(index)?;
            Ok(array.buf.as_slice()[index])
        })
    }

    /// [`remove`](Self::remove), returning the fault.
    ///
    /// If the shrink after the removal fails, the element stays removed and
    /// the capacity stays at its pre-shrink value.
    pub fn try_remove(&mut self) -> Result<(), ArrayError> {
        self.gated("remove", |array| {
            if array.buf.len() == 0 {
                return Err(ArrayError::Empty);
            }
            array.buf.pop();
            array.shrink_at_watermark()
        })
    }

    /// [`remove_at`](Self::remove_at), returning the fault.
    pub fn try_remove_at<I: TryInto<usize>>(&mut self, index: I) -> Result<(), ArrayError> {
        let index = index.try_into().ok();
        self.gated("remove_at", |array| {
            let index = array.element_position(index)?;
            array.buf.remove(index);
            array.shrink_at_watermark()
        })
    }

    // ── Lifecycle and fault state ──────────────────────────────────

    /// Release the buffer. Dropping the array has the same effect.
    pub fn free(self) {
        log::debug!(
            "dynarray free: releasing {} bytes",
            self.memory_bytes()
        );
        drop(self);
    }

    /// The sticky fault flag.
    pub fn error_state(&self) -> ErrorState {
        self.state
    }

    /// `Err` if a fault is recorded.
    pub fn check(&self) -> Result<(), ArrayError> {
        match self.state {
            ErrorState::Ok => Ok(()),
            state => Err(ArrayError::Jammed { state }),
        }
    }

    /// Reset the fault flag to `Ok` and return what it was.
    ///
    /// Nothing else in the API clears a fault. An array whose initial
    /// allocation failed has no buffer and stays in `OutOfMemory`.
    pub fn clear_fault(&mut self) -> ErrorState {
        let previous = self.state;
        if self.buf.capacity() == 0 {
            return previous;
        }
        if !previous.is_ok() {
            log::debug!("dynarray fault cleared: {previous}");
        }
        self.state = ErrorState::Ok;
        previous
    }

    // ── Inspection ─────────────────────────────────────────────────

    /// Number of elements.
    pub fn size(&self) -> usize {
        self.buf.len()
    }

    /// Returns `true` if the array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.buf.len() == 0
    }

    /// Allocated slots.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// The capacity floor fixed at construction.
    pub fn min_capacity(&self) -> usize {
        self.min_capacity
    }

    /// The configured grow/validate ordering for `add_at`.
    pub fn insert_order(&self) -> InsertOrder {
        self.insert_order
    }

    /// The live elements, in order.
    pub fn as_slice(&self) -> &[T] {
        self.buf.as_slice()
    }

    /// Iterate over the live elements.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Memory held by the backing buffer in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.buf.capacity() * std::mem::size_of::<T>()
    }

    // ── Internals ──────────────────────────────────────────────────

    /// Run `op` unless a fault is recorded; record any fault it returns.
    fn gated<R>(
        &mut self,
        name: &str,
        op: impl FnOnce(&mut Self) -> Result<R, ArrayError>,
    ) -> Result<R, ArrayError> {
        if !self.state.is_ok() {
            log::trace!("dynarray {name} ignored: jammed by {}", self.state);
            return Err(ArrayError::Jammed { state: self.state });
        }
        let result = op(self);
        if let Err(err) = &result {
            self.state = err.state();
            log::warn!("dynarray {name} faulted: {err}");
        }
        result
    }

    /// Valid `add_at` position: `index <= size`.
    fn insert_position(&self, index: Option<usize>) -> Result<usize, ArrayError> {
        let len = self.buf.len();
        match index {
            Some(index) if index <= len => Ok(index),
            _ => Err(ArrayError::OutOfBounds { index, len }),
        }
    }

    /// Valid element position: `index < size`.
    fn element_position(&self, index: Option<usize>) -> Result<usize, ArrayError> {
        let len = self.buf.len();
        match index {
            Some(index) if index < len => Ok(index),
            _ => Err(ArrayError::OutOfBounds { index, len }),
        }
    }

    fn grow_if_full(&mut self) -> Result<(), ArrayError> {
        let cap = self.buf.capacity();
        if self.buf.len() < cap {
            return Ok(());
        }
        let doubled = cap
            .checked_mul(2)
            .ok_or(ArrayError::OutOfMemory { requested: usize::MAX })?;
        self.reallocate(AllocKind::Grow, doubled)
    }

    fn shrink_at_watermark(&mut self) -> Result<(), ArrayError> {
        let cap = self.buf.capacity();
        if self.buf.len() != cap / 2 || cap == self.min_capacity {
            return Ok(());
        }
        self.reallocate(AllocKind::Shrink, cap / 2)
    }

    fn reallocate(&mut self, kind: AllocKind, new_cap: usize) -> Result<(), ArrayError> {
        let old_cap = self.buf.capacity();
        let request = AllocRequest::new::<T>(kind, old_cap, new_cap);
        if !self.gate.admit(&request) {
            return Err(ArrayError::OutOfMemory { requested: new_cap });
        }
        self.buf.resize(new_cap)?;
        log::debug!("dynarray {kind}: capacity {old_cap} -> {new_cap}");
        Ok(())
    }
}

impl<T: Copy + fmt::Debug, G: AllocGate> fmt::Debug for DynamicArray<T, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicArray")
            .field("elements", &self.as_slice())
            .field("size", &self.size())
            .field("capacity", &self.capacity())
            .field("min_capacity", &self.min_capacity)
            .field("state", &self.state)
            .finish()
    }
}

impl<'a, T: Copy, G: AllocGate> IntoIterator for &'a DynamicArray<T, G> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn filled(min_capacity: usize, values: &[u32]) -> DynamicArray<u32> {
        let mut array = DynamicArray::new(min_capacity).unwrap();
        for &v in values {
            array.add(v);
        }
        assert_eq!(array.error_state(), ErrorState::Ok);
        array
    }

    /// Refuses every request while `fail` is set.
    struct Switch<'a> {
        fail: &'a Cell<bool>,
    }

    impl AllocGate for Switch<'_> {
        fn admit(&self, _request: &AllocRequest) -> bool {
            !self.fail.get()
        }
    }

    #[test]
    fn new_array_is_empty_at_min_capacity() {
        let array = DynamicArray::<u32>::new(4).unwrap();
        assert_eq!(array.size(), 0);
        assert_eq!(array.capacity(), 4);
        assert_eq!(array.min_capacity(), 4);
        assert_eq!(array.error_state(), ErrorState::Ok);
        assert!(array.is_empty());
        assert_eq!(array.memory_bytes(), 16);
    }

    #[test]
    fn zero_min_capacity_is_a_config_error() {
        let result = DynamicArray::<u32>::new(0);
        assert!(matches!(result, Err(ConfigError::ZeroMinCapacity)));
    }

    #[test]
    fn growth_doubles_capacity() {
        let array = filled(4, &[10, 11, 12, 13, 14]);
        assert_eq!(array.capacity(), 8);
        assert_eq!(array.size(), 5);
        assert_eq!(array.as_slice(), &[10, 11, 12, 13, 14]);
    }

    #[test]
    fn get_returns_appended_values() {
        let mut array = filled(4, &[10, 11, 12, 13, 14]);
        for i in 0..5 {
            assert_eq!(array.get(i), Some(10 + i as u32));
        }
        assert_eq!(array.error_state(), ErrorState::Ok);
    }

    #[test]
    fn shrink_happens_at_half_and_stops_at_floor() {
        let mut array = filled(4, &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(array.capacity(), 8);
        for expected_size in (0..8).rev() {
            array.remove();
            assert_eq!(array.size(), expected_size);
            let expected_cap = if expected_size > 4 { 8 } else { 4 };
            assert_eq!(array.capacity(), expected_cap, "size {expected_size}");
        }
        assert_eq!(array.error_state(), ErrorState::Ok);
    }

    #[test]
    fn remove_on_empty_jams_the_array() {
        let mut array = DynamicArray::<u32>::new(4).unwrap();
        assert_eq!(array.try_remove(), Err(ArrayError::Empty));
        assert_eq!(array.error_state(), ErrorState::OutOfBounds);

        array.add(9);
        assert_eq!(array.size(), 0);
        assert_eq!(array.capacity(), 4);
        assert_eq!(array.error_state(), ErrorState::OutOfBounds);
        assert_eq!(
            array.try_add(9),
            Err(ArrayError::Jammed {
                state: ErrorState::OutOfBounds
            })
        );
    }

    #[test]
    fn jammed_get_returns_none_without_changing_state() {
        let mut array = filled(4, &[1, 2]);
        array.set(5, 0);
        assert_eq!(array.error_state(), ErrorState::OutOfBounds);
        assert_eq!(array.get(0), None);
        assert_eq!(array.as_slice(), &[1, 2]);
    }

    #[test]
    fn add_at_then_remove_at_is_identity() {
        let mut array = filled(4, &[1, 2, 3]);
        array.add_at(1, 99);
        assert_eq!(array.as_slice(), &[1, 99, 2, 3]);
        array.remove_at(1);
        assert_eq!(array.as_slice(), &[1, 2, 3]);
        assert_eq!(array.error_state(), ErrorState::Ok);
    }

    #[test]
    fn add_at_front_and_end() {
        let mut array = filled(2, &[5]);
        array.add_at(0, 4);
        array.add_at(2, 6);
        assert_eq!(array.as_slice(), &[4, 5, 6]);
        assert_eq!(array.capacity(), 4);
    }

    #[test]
    fn get_and_set_at_size_fault() {
        let mut array = filled(4, &[1, 2]);
        assert_eq!(
            array.try_get(2),
            Err(ArrayError::OutOfBounds {
                index: Some(2),
                len: 2
            })
        );
        array.clear_fault();
        assert_eq!(
            array.try_set(2, 0),
            Err(ArrayError::OutOfBounds {
                index: Some(2),
                len: 2
            })
        );
    }

    #[test]
    fn set_overwrites_in_place() {
        let mut array = filled(4, &[1, 2, 3]);
        array.set(1, 20);
        assert_eq!(array.as_slice(), &[1, 20, 3]);
        assert_eq!(array.capacity(), 4);
    }

    #[test]
    fn negative_index_is_out_of_bounds() {
        let mut array = filled(4, &[1, 2, 3]);
        assert_eq!(
            array.try_get(-1i64),
            Err(ArrayError::OutOfBounds {
                index: None,
                len: 3
            })
        );
        assert_eq!(array.error_state(), ErrorState::OutOfBounds);
        assert_eq!(array.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn remove_at_on_empty_is_out_of_bounds() {
        let mut array = DynamicArray::<u8>::new(1).unwrap();
        array.remove_at(0);
        assert_eq!(array.error_state(), ErrorState::OutOfBounds);
    }

    #[test]
    fn remove_at_shrinks_at_watermark() {
        let mut array = filled(2, &[0, 1, 2, 3, 4]);
        assert_eq!(array.capacity(), 8);
        array.remove_at(0);
        assert_eq!(array.capacity(), 4);
        assert_eq!(array.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn grow_then_validate_doubles_on_rejected_insert() {
        let mut array = filled(2, &[1, 2]);
        array.add_at(5, 0);
        assert_eq!(array.error_state(), ErrorState::OutOfBounds);
        assert_eq!(array.capacity(), 4);
        assert_eq!(array.as_slice(), &[1, 2]);
    }

    #[test]
    fn validate_then_grow_keeps_capacity_on_rejected_insert() {
        let config = ArrayConfig::new(2).with_insert_order(InsertOrder::ValidateThenGrow);
        let mut array = DynamicArray::<u32>::with_config(config).unwrap();
        array.add(1);
        array.add(2);
        array.add_at(5, 0);
        assert_eq!(array.error_state(), ErrorState::OutOfBounds);
        assert_eq!(array.capacity(), 2);
        assert_eq!(array.as_slice(), &[1, 2]);
    }

    #[test]
    fn clear_fault_reopens_the_array() {
        let mut array = filled(4, &[1]);
        array.get(3);
        assert_eq!(array.check().unwrap_err().state(), ErrorState::OutOfBounds);
        assert_eq!(array.clear_fault(), ErrorState::OutOfBounds);
        assert!(array.check().is_ok());
        array.add(2);
        assert_eq!(array.as_slice(), &[1, 2]);
    }

    #[test]
    fn grow_failure_keeps_old_buffer() {
        let fail = Cell::new(false);
        let mut array =
            DynamicArray::<u32, _>::with_config_in(ArrayConfig::new(2), Switch { fail: &fail })
                .unwrap();
        array.add(1);
        array.add(2);
        fail.set(true);
        assert_eq!(
            array.try_add(3),
            Err(ArrayError::OutOfMemory { requested: 4 })
        );
        assert_eq!(array.error_state(), ErrorState::OutOfMemory);
        assert_eq!(array.capacity(), 2);
        assert_eq!(array.as_slice(), &[1, 2]);
    }

    #[test]
    fn shrink_failure_keeps_the_removal() {
        let fail = Cell::new(false);
        let mut array =
            DynamicArray::<u32, _>::with_config_in(ArrayConfig::new(2), Switch { fail: &fail })
                .unwrap();
        for v in 0..3 {
            array.add(v);
        }
        assert_eq!(array.capacity(), 4);
        fail.set(true);
        array.remove();
        assert_eq!(array.error_state(), ErrorState::OutOfMemory);
        assert_eq!(array.size(), 2);
        assert_eq!(array.capacity(), 4);
        assert_eq!(array.as_slice(), &[0, 1]);
    }

    #[test]
    fn init_failure_is_sticky_and_not_clearable() {
        let fail = Cell::new(true);
        let mut array =
            DynamicArray::<u32, _>::with_config_in(ArrayConfig::new(4), Switch { fail: &fail })
                .unwrap();
        assert_eq!(array.error_state(), ErrorState::OutOfMemory);
        assert_eq!(array.capacity(), 0);
        fail.set(false);
        assert_eq!(array.clear_fault(), ErrorState::OutOfMemory);
        assert_eq!(array.error_state(), ErrorState::OutOfMemory);
        array.add(1);
        assert_eq!(array.size(), 0);
    }

    #[test]
    fn zero_sized_elements() {
        let mut array = DynamicArray::<()>::new(1).unwrap();
        for _ in 0..5 {
            array.add(());
        }
        assert_eq!(array.size(), 5);
        assert_eq!(array.capacity(), 8);
        assert_eq!(array.memory_bytes(), 0);
        array.remove_at(2);
        assert_eq!(array.size(), 4);
        assert_eq!(array.capacity(), 4);
    }

    #[test]
    fn debug_lists_elements_and_state() {
        let array = filled(2, &[7, 8]);
        let text = format!("{array:?}");
        assert!(text.contains("elements: [7, 8]"));
        assert!(text.contains("state: Ok"));
    }

    #[test]
    fn iterates_in_order() {
        let array = filled(2, &[3, 1, 2]);
        let collected: Vec<u32> = array.iter().copied().collect();
        assert_eq!(collected, vec![3, 1, 2]);
        let sum: u32 = (&array).into_iter().sum();
        assert_eq!(sum, 6);
    }

    #[test]
    fn free_consumes_the_array() {
        let array = filled(4, &[1, 2, 3]);
        array.free();
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Add(u16),
            AddAt(usize, u16),
            Remove,
            RemoveAt(usize),
        }

        fn arb_op() -> impl Strategy<Value = Op> {
            prop_oneof![
                3 => any::<u16>().prop_map(Op::Add),
                2 => (0usize..64, any::<u16>()).prop_map(|(i, v)| Op::AddAt(i, v)),
                2 => Just(Op::Remove),
                1 => (0usize..64).prop_map(Op::RemoveAt),
            ]
        }

        proptest! {
            #[test]
            fn capacity_is_min_times_power_of_two(
                min_capacity in 1usize..9,
                ops in proptest::collection::vec(arb_op(), 0..200),
            ) {
                let mut array = DynamicArray::<u16>::new(min_capacity).unwrap();
                for op in ops {
                    // Keep the array usable so every op is exercised.
                    array.clear_fault();
                    match op {
                        Op::Add(v) => array.add(v),
                        Op::AddAt(i, v) => array.add_at(i, v),
                        Op::Remove => array.remove(),
                        Op::RemoveAt(i) => array.remove_at(i),
                    }
                    let cap = array.capacity();
                    prop_assert!(array.size() <= cap);
                    prop_assert!(cap >= min_capacity);
                    prop_assert_eq!(cap % min_capacity, 0);
                    prop_assert!((cap / min_capacity).is_power_of_two());
                }
            }

            #[test]
            fn jammed_array_ignores_everything(
                values in proptest::collection::vec(any::<u16>(), 0..20),
                ops in proptest::collection::vec(arb_op(), 1..50),
            ) {
                let mut array = DynamicArray::<u16>::new(2).unwrap();
                for &v in &values {
                    array.add(v);
                }
                array.set(values.len(), 0);
                prop_assert_eq!(array.error_state(), ErrorState::OutOfBounds);
                let before = array.as_slice().to_vec();
                let cap = array.capacity();
                for op in ops {
                    match op {
                        Op::Add(v) => array.add(v),
                        Op::AddAt(i, v) => array.add_at(i, v),
                        Op::Remove => array.remove(),
                        Op::RemoveAt(i) => array.remove_at(i),
                    }
                }
                prop_assert_eq!(array.as_slice(), &before[..]);
                prop_assert_eq!(array.capacity(), cap);
                prop_assert_eq!(array.error_state(), ErrorState::OutOfBounds);
            }
        }
    }
}
