use std::time::Duration;

use parking_lot::Mutex;

use super::TimerQueue;
use crate::scheduler::{DeferredCall, Scheduler};

struct ManualState {
    now: Duration,
    queue: TimerQueue<Duration>,
}

/// A runner with a virtual clock, advanced by the host's update loop.
///
/// Nothing runs until [`tick`](Self::tick) is called. Each tick runs the
/// calls that were due when it started; anything scheduled by those calls
/// waits for a later tick, even with a zero delay.
pub struct ManualRunner {
    state: Mutex<ManualState>,
}

impl ManualRunner {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: Duration::ZERO,
                queue: TimerQueue::new(),
            }),
        }
    }

    /// Time elapsed on the virtual clock.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Advances the clock by `elapsed` and runs every call now due.
    /// Returns how many calls ran.
    pub fn tick(&self, elapsed: Duration) -> usize {
        let due = {
            let mut state = self.state.lock();
            state.now = state.now.saturating_add(elapsed);
            let now = state.now;
            let mut due = Vec::new();
            while let Some(call) = state.queue.pop_due(now) {
                due.push(call);
            }
            due
        };

        let ran = due.len();
        for call in due {
            call();
        }
        ran
    }

    /// Ticks straight to each next due time until nothing is pending.
    ///
    /// Does not return while listeners keep scheduling new work.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let step = {
                let state = self.state.lock();
                state
                    .queue
                    .next_due()
                    .map(|due| due.saturating_sub(state.now))
            };
            match step {
                Some(step) => ran += self.tick(step),
                None => return ran,
            }
        }
    }
}

impl Default for ManualRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for ManualRunner {
    fn schedule(&self, call: DeferredCall, delay: Duration) {
        let mut state = self.state.lock();
        let due = state.now.saturating_add(delay);
        state.queue.push(due, call);
        tracing::trace!(?due, "deferred call queued");
    }
}
