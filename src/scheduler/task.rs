// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Recurring task record and its stable handle

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use super::SchedulerError;

/// Work executed by a task. An `Err` is logged by the scheduler and does not
/// affect later runs.
pub type TaskAction = Box<dyn FnMut() -> anyhow::Result<()> + Send + 'static>;

/// Check that `interval` can drive a task.
pub fn validate_interval(interval: Duration) -> Result<Duration, SchedulerError> {
    if interval.is_zero() || interval.as_nanos() > u64::MAX as u128 {
        return Err(SchedulerError::InvalidInterval(format!("{interval:?}")));
    }
    Ok(interval)
}

/// Convert a number of seconds, as found in configuration files, into a task
/// interval. Non-finite and non-positive values are rejected.
pub fn interval_from_secs(secs: f64) -> Result<Duration, SchedulerError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(SchedulerError::InvalidInterval(format!("{secs} s")));
    }
    let interval = Duration::try_from_secs_f64(secs)
        .map_err(|e| SchedulerError::InvalidInterval(format!("{secs} s: {e}")))?;
    validate_interval(interval)
}

/// Interval shared between a task and its handles, in nanoseconds.
#[derive(Debug, Clone)]
pub(crate) struct SharedInterval(Arc<AtomicU64>);

impl SharedInterval {
    pub(crate) fn new(interval: Duration) -> Self {
        Self(Arc::new(AtomicU64::new(interval.as_nanos() as u64)))
    }

    pub(crate) fn get(&self) -> Duration {
        Duration::from_nanos(self.0.load(Ordering::Acquire))
    }

    fn set(&self, interval: Duration) {
        self.0.store(interval.as_nanos() as u64, Ordering::Release);
    }
}

/// Stable handle to a registered task.
///
/// The handle stays valid for the lifetime of the scheduler and may be moved to
/// another thread (or into a task action) to change the task cadence while the
/// control loop is running.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    pub(crate) index: usize,
    pub(crate) interval: SharedInterval,
}

impl TaskHandle {
    /// Position of the task in registration order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn interval(&self) -> Duration {
        self.interval.get()
    }

    /// Change the task interval. The control loop applies it at the next
    /// due-check of the task.
    pub fn set_interval(&self, interval: Duration) -> Result<(), SchedulerError> {
        self.interval.set(validate_interval(interval)?);
        Ok(())
    }
}

/// Read-only view of a task's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub name: String,
    pub interval: Duration,
    pub last_run: Option<Instant>,
    pub next_due: Instant,
    pub runs: u64,
    pub failures: u64,
}

pub(crate) struct Task {
    pub(crate) name: String,
    pub(crate) interval: SharedInterval,
    /// Interval used to compute `next_due`.
    pub(crate) applied_interval: Duration,
    pub(crate) action: TaskAction,
    pub(crate) last_run: Option<Instant>,
    pub(crate) next_due: Instant,
    pub(crate) runs: u64,
    pub(crate) failures: u64,
}

impl Task {
    pub(crate) fn new(name: String, interval: Duration, action: TaskAction, now: Instant) -> Self {
        Self {
            name,
            interval: SharedInterval::new(interval),
            applied_interval: interval,
            action,
            last_run: None,
            next_due: now,
            runs: 0,
            failures: 0,
        }
    }

    /// Whether the task must run at `now`, picking up an interval changed
    /// through a [`TaskHandle`] first.
    pub(crate) fn is_due(&mut self, now: Instant) -> bool {
        let interval = self.interval.get();
        if interval != self.applied_interval {
            self.applied_interval = interval;
            if let Some(last_run) = self.last_run {
                self.next_due = last_run + interval;
            }
        }
        self.next_due <= now
    }

    /// Record a run observed at `now`. The next due time is computed from the
    /// observed time, so a late task runs once and does not catch up.
    pub(crate) fn advance(&mut self, now: Instant) {
        self.last_run = Some(now);
        self.next_due = now + self.applied_interval;
        self.runs += 1;
    }

    pub(crate) fn info(&self) -> TaskInfo {
        TaskInfo {
            name: self.name.clone(),
            interval: self.interval.get(),
            last_run: self.last_run,
            next_due: self.next_due,
            runs: self.runs,
            failures: self.failures,
        }
    }
}
