use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use herald_config::HeraldConfig;
use herald_events::{event_args, Callback, Dispatcher, EventArgs, RunnerOptions, TokioRunner};

struct Heartbeat {
    seq: usize,
}

struct StatusChanged {
    heartbeat: Heartbeat,
    online: bool,
}

struct Alarm {
    status: StatusChanged,
    severity: u8,
}

event_args!(Heartbeat);
event_args!(StatusChanged => heartbeat);
event_args!(Alarm => status);

/// Listener hits after both rounds of the demo.
#[derive(Debug, Default, Serialize)]
pub struct DemoReport {
    pub scheduled: usize,
    pub heartbeat: usize,
    pub status_changed: usize,
    pub alarm: usize,
}

fn counting<T, F>(hits: &Arc<AtomicUsize>, log: F) -> Callback<T>
where
    T: EventArgs,
    F: Fn(&T) + Send + Sync + 'static,
{
    let hits = hits.clone();
    Callback::new(move |_, event: &T| {
        log(event);
        hits.fetch_add(1, Ordering::SeqCst);
    })
}

/// Dispatches `events` alarms, drops the status listener by id, then
/// dispatches the same number again.
pub async fn run(config: &HeraldConfig, events: usize, delay: Duration) -> Result<DemoReport> {
    let runner = TokioRunner::spawn(RunnerOptions {
        drain_on_shutdown: config.runner.drain_on_shutdown,
        shutdown_grace: config.runner.shutdown_grace(),
    });
    let dispatcher = Dispatcher::builder(runner.clone())
        .default_delay(delay)
        .build();

    let heartbeat = Arc::new(AtomicUsize::new(0));
    let status = Arc::new(AtomicUsize::new(0));
    let alarm = Arc::new(AtomicUsize::new(0));

    dispatcher.add_listener(&counting(&heartbeat, |e: &Heartbeat| {
        tracing::info!(seq = e.seq, "heartbeat");
    }))?;
    let status_id = dispatcher.add_listener(&counting(&status, |e: &StatusChanged| {
        tracing::info!(online = e.online, "status changed");
    }))?;
    dispatcher.add_listener(&counting(&alarm, |e: &Alarm| {
        tracing::info!(severity = e.severity, "alarm");
    }))?;

    let mut report = DemoReport::default();
    let mut seq = 0;
    for round in 0..2 {
        if round == 1 {
            dispatcher.remove_listener_by_id(status_id)?;
        }
        for _ in 0..events {
            seq += 1;
            report.scheduled += dispatcher.dispatch(Alarm {
                status: StatusChanged {
                    heartbeat: Heartbeat { seq },
                    online: seq % 2 == 0,
                },
                severity: (seq % 5) as u8,
            });
        }
    }

    runner.shutdown().await?;

    report.heartbeat = heartbeat.load(Ordering::SeqCst);
    report.status_changed = status.load(Ordering::SeqCst);
    report.alarm = alarm.load(Ordering::SeqCst);
    Ok(report)
}
