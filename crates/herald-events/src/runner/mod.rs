//! Places to run deferred calls.
//!
//! [`TokioRunner`] owns a worker task and real timers. [`ManualRunner`] is
//! driven by the host's own update loop through `tick`.

mod manual;
mod tokio_runner;

pub use manual::ManualRunner;
pub use tokio_runner::{RunnerOptions, TokioRunner};

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::scheduler::DeferredCall;

struct Pending<I> {
    due: I,
    seq: u64,
    call: DeferredCall,
}

impl<I: Ord> PartialEq for Pending<I> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<I: Ord> Eq for Pending<I> {}

impl<I: Ord> PartialOrd for Pending<I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I: Ord> Ord for Pending<I> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due
            .cmp(&other.due)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Min-heap of calls keyed by `(due, submission order)`, so calls due at the
/// same instant come out in the order they went in.
pub(crate) struct TimerQueue<I> {
    heap: BinaryHeap<Reverse<Pending<I>>>,
    next_seq: u64,
}

impl<I: Ord + Copy> TimerQueue<I> {
    pub(crate) fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub(crate) fn push(&mut self, due: I, call: DeferredCall) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Pending { due, seq, call }));
    }

    pub(crate) fn next_due(&self) -> Option<I> {
        self.heap.peek().map(|Reverse(pending)| pending.due)
    }

    /// Pops the earliest call if it is due at or before `now`.
    pub(crate) fn pop_due(&mut self, now: I) -> Option<DeferredCall> {
        if self.next_due()? > now {
            return None;
        }
        self.heap.pop().map(|Reverse(pending)| pending.call)
    }

    pub(crate) fn len(&self) -> usize {
        self.heap.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
