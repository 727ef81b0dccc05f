use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::TimerQueue;
use crate::error::RunnerError;
use crate::scheduler::{DeferredCall, Scheduler};

const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

// Roughly 30 years; stands in for delays too large to add to `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Run calls still waiting on their delay before the worker exits.
    pub drain_on_shutdown: bool,
    pub shutdown_grace: Duration,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            drain_on_shutdown: true,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

struct Scheduled {
    due: Instant,
    call: DeferredCall,
}

/// Runs deferred calls on a dedicated Tokio task.
///
/// Calls travel over an unbounded channel to the worker, which holds them in
/// a timer queue until due. A listener that panics is not caught: it ends
/// the worker, later calls are dropped, and [`shutdown`](Self::shutdown)
/// reports the panic.
pub struct TokioRunner {
    sender: Mutex<Option<mpsc::UnboundedSender<Scheduled>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    options: RunnerOptions,
}

impl TokioRunner {
    /// Spawns the worker on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn spawn(options: RunnerOptions) -> Arc<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run(receiver, options.drain_on_shutdown));

        Arc::new(Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            options,
        })
    }

    pub fn is_running(&self) -> bool {
        self.sender
            .lock()
            .as_ref()
            .is_some_and(|sender| !sender.is_closed())
    }

    /// Stops accepting calls and waits for the worker to finish.
    pub async fn shutdown(&self) -> Result<(), RunnerError> {
        drop(self.sender.lock().take());
        let worker = self.worker.lock().take();
        let Some(mut worker) = worker else {
            return Ok(());
        };

        match tokio::time::timeout(self.options.shutdown_grace, &mut worker).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) if err.is_panic() => {
                Err(RunnerError::ListenerPanicked(panic_message(err.into_panic())))
            }
            Ok(Err(err)) => Err(RunnerError::ListenerPanicked(err.to_string())),
            Err(_) => {
                worker.abort();
                Err(RunnerError::ShutdownTimeout(self.options.shutdown_grace))
            }
        }
    }
}

impl Scheduler for TokioRunner {
    fn schedule(&self, call: DeferredCall, delay: Duration) {
        let scheduled = Scheduled {
            due: due_after(delay),
            call,
        };

        let sent = match self.sender.lock().as_ref() {
            Some(sender) => sender.send(scheduled).is_ok(),
            None => false,
        };
        if sent {
            tracing::trace!(?delay, "deferred call scheduled");
        } else {
            tracing::warn!("runner is stopped, dropping deferred call");
        }
    }
}

async fn run(mut receiver: mpsc::UnboundedReceiver<Scheduled>, drain: bool) {
    let mut queue = TimerQueue::new();

    loop {
        let next_due = queue.next_due();
        tokio::select! {
            received = receiver.recv() => match received {
                Some(scheduled) => queue.push(scheduled.due, scheduled.call),
                None => break,
            },
            _ = sleep_until(next_due) => run_due(&mut queue),
        }
    }

    if drain {
        while let Some(due) = queue.next_due() {
            tokio::time::sleep_until(due).await;
            run_due(&mut queue);
        }
        tracing::debug!("runner drained and stopped");
    } else if !queue.is_empty() {
        tracing::debug!(dropped = queue.len(), "runner stopped with pending calls");
    }
}

fn due_after(delay: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(delay).unwrap_or_else(|| now + FAR_FUTURE)
}

fn run_due(queue: &mut TimerQueue<Instant>) {
    let now = Instant::now();
    while let Some(call) = queue.pop_due(now) {
        call();
    }
}

async fn sleep_until(due: Option<Instant>) {
    match due {
        Some(due) => tokio::time::sleep_until(due).await,
        None => std::future::pending().await,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter_call(counter: &Arc<AtomicUsize>) -> DeferredCall {
        let counter = counter.clone();
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test]
    async fn test_runner_runs_scheduled_call() {
        let runner = TokioRunner::spawn(RunnerOptions::default());
        let counter = Arc::new(AtomicUsize::new(0));

        runner.schedule(counter_call(&counter), Duration::ZERO);
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        runner.shutdown().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_runner_waits_for_delay() {
        let runner = TokioRunner::spawn(RunnerOptions::default());
        let counter = Arc::new(AtomicUsize::new(0));

        runner.schedule(counter_call(&counter), Duration::from_secs(10));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        runner.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_runner_keeps_submission_order() {
        let runner = TokioRunner::spawn(RunnerOptions::default());
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..20 {
            let log = log.clone();
            runner.schedule(Box::new(move || log.lock().push(i)), Duration::ZERO);
        }
        runner.shutdown().await.unwrap();

        assert_eq!(*log.lock(), (0..20).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_without_drain_drops_pending() {
        let runner = TokioRunner::spawn(RunnerOptions {
            drain_on_shutdown: false,
            ..Default::default()
        });
        let counter = Arc::new(AtomicUsize::new(0));

        runner.schedule(counter_call(&counter), Duration::from_secs(60));
        runner.shutdown().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_schedule_after_shutdown_is_dropped() {
        let runner = TokioRunner::spawn(RunnerOptions::default());
        runner.shutdown().await.unwrap();
        assert!(!runner.is_running());

        let counter = Arc::new(AtomicUsize::new(0));
        runner.schedule(counter_call(&counter), Duration::ZERO);
        tokio::task::yield_now().await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert!(runner.shutdown().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_delay_is_clamped_not_a_panic() {
        let runner = TokioRunner::spawn(RunnerOptions {
            drain_on_shutdown: false,
            ..Default::default()
        });
        let counter = Arc::new(AtomicUsize::new(0));

        runner.schedule(counter_call(&counter), Duration::MAX);
        runner.schedule(counter_call(&counter), Duration::ZERO);
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        runner.shutdown().await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_due_after_saturates() {
        let before = Instant::now();
        assert!(due_after(Duration::MAX) >= before + FAR_FUTURE);
        assert!(due_after(Duration::from_millis(5)) >= before + Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_listener_panic_surfaces_on_shutdown() {
        let runner = TokioRunner::spawn(RunnerOptions::default());
        runner.schedule(Box::new(|| panic!("listener exploded")), Duration::ZERO);

        match runner.shutdown().await {
            Err(RunnerError::ListenerPanicked(msg)) => assert_eq!(msg, "listener exploded"),
            other => panic!("unexpected shutdown result: {other:?}"),
        }
    }
}
