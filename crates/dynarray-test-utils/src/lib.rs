//! Allocation fault-injection gates for dynarray tests.
//!
//! Each gate implements [`AllocGate`] and is cheap to clone. Clones share
//! state, so a test keeps one handle while the array owns another:
//!
//! - [`FaultSwitch`] — refuses every request while switched on.
//! - [`FailAfter`] — admits the first N requests, then refuses.
//! - [`DenyKind`] — refuses one [`AllocKind`], admits the rest.
//! - [`RecordingGate`] — admits everything and records each request.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dynarray::{AllocGate, AllocKind, AllocRequest};

/// Shared on/off toggle for allocation failure.
#[derive(Clone, Debug, Default)]
pub struct FaultSwitch {
    failing: Rc<Cell<bool>>,
}

impl FaultSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start refusing requests.
    pub fn fail(&self) {
        self.failing.set(true);
    }

    /// Resume admitting requests.
    pub fn recover(&self) {
        self.failing.set(false);
    }

    pub fn is_failing(&self) -> bool {
        self.failing.get()
    }
}

impl AllocGate for FaultSwitch {
    fn admit(&self, _request: &AllocRequest) -> bool {
        !self.failing.get()
    }
}

/// Admits a fixed number of requests, then refuses all later ones.
#[derive(Clone, Debug)]
pub struct FailAfter {
    remaining: Rc<Cell<usize>>,
}

impl FailAfter {
    pub fn new(admitted: usize) -> Self {
        Self {
            remaining: Rc::new(Cell::new(admitted)),
        }
    }

    /// Requests still to be admitted.
    pub fn remaining(&self) -> usize {
        self.remaining.get()
    }
}

impl AllocGate for FailAfter {
    fn admit(&self, _request: &AllocRequest) -> bool {
        match self.remaining.get() {
            0 => false,
            n => {
                self.remaining.set(n - 1);
                true
            }
        }
    }
}

/// Refuses every request of one kind.
#[derive(Clone, Copy, Debug)]
pub struct DenyKind(pub AllocKind);

impl AllocGate for DenyKind {
    fn admit(&self, request: &AllocRequest) -> bool {
        request.kind != self.0
    }
}

/// Admits everything and keeps a log of requests for assertions.
#[derive(Clone, Debug, Default)]
pub struct RecordingGate {
    requests: Rc<RefCell<Vec<AllocRequest>>>,
}

impl RecordingGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// All requests seen so far, in order.
    pub fn requests(&self) -> Vec<AllocRequest> {
        self.requests.borrow().clone()
    }

    /// Requests of one kind, in order.
    pub fn requests_of(&self, kind: AllocKind) -> Vec<AllocRequest> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.kind == kind)
            .copied()
            .collect()
    }
}

impl AllocGate for RecordingGate {
    fn admit(&self, request: &AllocRequest) -> bool {
        self.requests.borrow_mut().push(*request);
        true
    }
}
