//! Background poller publishing temperature, status and error.
//!
//! A tokio task queries the programmer at a fixed interval and publishes the
//! result twice: the latest values on a `watch` channel for displays that
//! only care about "now", and every outcome on a `broadcast` channel for
//! consumers that log or react to each poll.
//!
//! Shutdown is cooperative. [`Monitor::stop`] signals the task and waits for
//! it, so a query already on the wire always finishes first.

use crate::driver::Driver;
use crate::error::MonitorError;
use crate::port::SerialPortAdapter;
use crate::protocol::{DeviceReading, DeviceStatus, ErrorFlags};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Polling parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    /// Capacity of the event channel; slow subscribers lose the oldest events.
    pub event_capacity: usize,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            event_capacity: 64,
        }
    }
}

/// A decoded reading with the time it was taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedReading {
    pub taken_at: DateTime<Utc>,
    pub temperature_celsius: f64,
    pub status: DeviceStatus,
    pub errors: ErrorFlags,
}

impl TimedReading {
    pub fn now(reading: &DeviceReading) -> Self {
        Self {
            taken_at: Utc::now(),
            temperature_celsius: reading.temperature_celsius(),
            status: reading.status(),
            errors: reading.error_flags(),
        }
    }
}

/// Latest published values.
///
/// Values stay at the last good reading while polls fail; the failure count
/// says how stale they are.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonitorSnapshot {
    pub temperature: Option<f64>,
    pub status: Option<DeviceStatus>,
    pub error: Option<ErrorFlags>,
    pub updated_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub running: bool,
}

/// Outcome of one poll, or the end of polling.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    Reading(TimedReading),
    ReadFailed(String),
    Stopped,
}

/// Handle to a running poller.
#[derive(Debug)]
pub struct Monitor {
    snapshot_rx: watch::Receiver<MonitorSnapshot>,
    events_tx: broadcast::Sender<MonitorEvent>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Monitor {
    /// Start polling `driver` on the current tokio runtime.
    ///
    /// Dropping the handle without calling [`stop`](Self::stop) also ends the
    /// task, but nobody waits for it.
    pub fn spawn<P>(driver: Arc<Driver<P>>, settings: MonitorSettings) -> Self
    where
        P: SerialPortAdapter + 'static,
    {
        let (snapshot_tx, snapshot_rx) = watch::channel(MonitorSnapshot {
            running: true,
            ..MonitorSnapshot::default()
        });
        let (events_tx, _) = broadcast::channel(settings.event_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = tokio::spawn(poll_loop(
            driver,
            settings,
            snapshot_tx,
            events_tx.clone(),
            shutdown_rx,
        ));

        Self {
            snapshot_rx,
            events_tx,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    /// Receiver that wakes on every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Receiver for events published after this call.
    pub fn events(&self) -> broadcast::Receiver<MonitorEvent> {
        self.events_tx.subscribe()
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn temperature(&self) -> Option<f64> {
        self.snapshot_rx.borrow().temperature
    }

    pub fn status(&self) -> Option<DeviceStatus> {
        self.snapshot_rx.borrow().status
    }

    pub fn error(&self) -> Option<ErrorFlags> {
        self.snapshot_rx.borrow().error
    }

    pub fn is_running(&self) -> bool {
        self.snapshot_rx.borrow().running
    }

    /// Ask the poller to finish and wait until it has.
    ///
    /// Calling it again after the task has ended is a no-op.
    pub async fn stop(&mut self) -> Result<(), MonitorError> {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await?;
        }
        Ok(())
    }
}

async fn poll_loop<P>(
    driver: Arc<Driver<P>>,
    settings: MonitorSettings,
    snapshot_tx: watch::Sender<MonitorSnapshot>,
    events_tx: broadcast::Sender<MonitorEvent>,
    mut shutdown_rx: oneshot::Receiver<()>,
) where
    P: SerialPortAdapter + 'static,
{
    let port = driver.port_name().to_string();
    let mut ticker = tokio::time::interval(settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        port = %port,
        interval_ms = settings.poll_interval.as_millis() as u64,
        "monitor started"
    );

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown_rx => break,
            _ = ticker.tick() => {
                let poll_driver = Arc::clone(&driver);
                let outcome = tokio::task::spawn_blocking(move || poll_driver.query_reading()).await;

                match outcome {
                    Ok(Ok(reading)) => {
                        let reading = TimedReading::now(&reading);
                        snapshot_tx.send_modify(|snapshot| {
                            snapshot.temperature = Some(reading.temperature_celsius);
                            snapshot.status = Some(reading.status);
                            snapshot.error = Some(reading.errors);
                            snapshot.updated_at = Some(reading.taken_at);
                            snapshot.consecutive_failures = 0;
                        });
                        let _ = events_tx.send(MonitorEvent::Reading(reading));
                    }
                    Ok(Err(e)) => {
                        if e.is_transient() {
                            warn!(port = %port, error = %e, "status poll failed");
                        } else {
                            error!(port = %port, error = %e, "status poll failed");
                        }
                        publish_failure(&snapshot_tx, &events_tx, e.to_string());
                    }
                    Err(e) => {
                        error!(port = %port, error = %e, "status poll task panicked");
                        publish_failure(&snapshot_tx, &events_tx, e.to_string());
                    }
                }
            }
        }
    }

    snapshot_tx.send_modify(|snapshot| snapshot.running = false);
    let _ = events_tx.send(MonitorEvent::Stopped);
    info!(port = %port, "monitor stopped");
}

fn publish_failure(
    snapshot_tx: &watch::Sender<MonitorSnapshot>,
    events_tx: &broadcast::Sender<MonitorEvent>,
    reason: String,
) {
    snapshot_tx.send_modify(|snapshot| {
        snapshot.consecutive_failures = snapshot.consecutive_failures.saturating_add(1);
    });
    let _ = events_tx.send(MonitorEvent::ReadFailed(reason));
}
