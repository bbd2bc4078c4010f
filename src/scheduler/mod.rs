// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Cooperative periodic task scheduler
//!
//! A [`Scheduler`] owns an ordered list of recurring tasks and drives them from a
//! single blocking control loop. Each pass of the loop observes the current time,
//! runs every task whose due time has passed (in registration order), and then
//! sleeps for a fixed quantum (100 ms by default). The quantum bounds both the
//! scheduling latency and the CPU usage of the loop.
//!
//! After a run, the next due time is computed from the time observed by the pass
//! that fired the task, not from the previous due time: a task that was delayed
//! runs once and does not try to catch up on missed intervals.
//!
//! A failing task never affects the loop. An `Err` returned by an action, or a
//! panic raised inside it, is logged with the task name and the task is
//! rescheduled as if it had succeeded.
//!
//! ## Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use rust_weather_modbus::scheduler::Scheduler;
//!
//! let mut scheduler = Scheduler::new();
//! scheduler
//!     .add_named_task("heartbeat", Duration::from_secs(5), || {
//!         log::info!("still alive");
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let stop = scheduler.stop_handle();
//! std::thread::spawn(move || {
//!     std::thread::sleep(Duration::from_secs(30));
//!     stop.stop();
//! });
//! scheduler.run();
//! ```

pub mod task;

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info};
use thiserror::Error;

pub use task::{interval_from_secs, validate_interval, TaskAction, TaskHandle, TaskInfo};
use task::Task;

/// Default sleep between two passes of the control loop.
pub const DEFAULT_QUANTUM: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("invalid task interval {0}, the interval must be a positive duration")]
    InvalidInterval(String),

    #[error("invalid scheduler quantum {0:?}, the quantum must be a positive duration")]
    InvalidQuantum(Duration),
}

/// Cloneable handle used to stop a running scheduler from any thread.
#[derive(Debug, Clone)]
pub struct StopHandle {
    stop_requested: Arc<AtomicBool>,
}

impl StopHandle {
    /// Ask the control loop to return. The request is observed at the top of
    /// the next pass; an action already running is not interrupted.
    /// Calling it several times has no further effect.
    pub fn stop(&self) {
        if !self.stop_requested.swap(true, Ordering::SeqCst) {
            info!("Scheduler stop requested");
        }
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }
}

/// Single-threaded cooperative scheduler for recurring tasks.
pub struct Scheduler {
    tasks: Vec<Task>,
    quantum: Duration,
    running: Arc<AtomicBool>,
    stop_requested: Arc<AtomicBool>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// Create a scheduler with the default 100 ms quantum.
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            quantum: DEFAULT_QUANTUM,
            running: Arc::new(AtomicBool::new(false)),
            stop_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create a scheduler with a custom sleep quantum.
    pub fn with_quantum(quantum: Duration) -> Result<Self, SchedulerError> {
        if quantum.is_zero() {
            return Err(SchedulerError::InvalidQuantum(quantum));
        }
        Ok(Self {
            quantum,
            ..Self::new()
        })
    }

    pub fn quantum(&self) -> Duration {
        self.quantum
    }

    /// Register a task named after its position (`task-<index>`).
    /// See [`Scheduler::add_named_task`].
    pub fn add_task<F>(&mut self, interval: Duration, action: F) -> Result<TaskHandle, SchedulerError>
    where
        F: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        let name = format!("task-{}", self.tasks.len());
        self.add_named_task(name, interval, action)
    }

    /// Register a recurring task. The task is due immediately.
    ///
    /// ### Errors
    ///
    /// Returns [`SchedulerError::InvalidInterval`] if `interval` is zero.
    pub fn add_named_task<F>(
        &mut self,
        name: impl Into<String>,
        interval: Duration,
        action: F,
    ) -> Result<TaskHandle, SchedulerError>
    where
        F: FnMut() -> anyhow::Result<()> + Send + 'static,
    {
        let interval = validate_interval(interval)?;
        let name = name.into();
        let task = Task::new(name.clone(), interval, Box::new(action), Instant::now());
        let handle = TaskHandle {
            index: self.tasks.len(),
            interval: task.interval.clone(),
        };
        debug!("Registered task '{}' every {:?}", name, interval);
        self.tasks.push(task);
        Ok(handle)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Bookkeeping of the task behind `handle`.
    pub fn task_info(&self, handle: &TaskHandle) -> Option<TaskInfo> {
        self.tasks.get(handle.index).map(Task::info)
    }

    /// Handle that stops this scheduler, usable from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            stop_requested: Arc::clone(&self.stop_requested),
        }
    }

    /// Stop the control loop. Idempotent.
    pub fn stop(&self) {
        self.stop_handle().stop();
    }

    /// Whether the control loop is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run the control loop on the calling thread until a stop is requested.
    ///
    /// A stop requested before `run` is called makes it return immediately.
    pub fn run(&mut self) {
        self.running.store(true, Ordering::SeqCst);
        info!("Scheduler started with {} task(s)", self.tasks.len());

        while !self.stop_requested.load(Ordering::SeqCst) {
            self.run_pending(Instant::now());
            thread::sleep(self.quantum);
        }

        self.running.store(false, Ordering::SeqCst);
        info!("Scheduler stopped");
    }

    /// Execute one pass of the control loop at the observed time `now`.
    ///
    /// Returns the number of tasks that were run.
    pub fn run_pending(&mut self, now: Instant) -> usize {
        let mut fired = 0;
        for task in self.tasks.iter_mut() {
            if !task.is_due(now) {
                continue;
            }
            debug!("Running task '{}'", task.name);
            match panic::catch_unwind(AssertUnwindSafe(|| (task.action)())) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    task.failures += 1;
                    error!("Error executing task '{}': {:#}", task.name, e);
                }
                Err(payload) => {
                    task.failures += 1;
                    error!(
                        "Task '{}' panicked: {}",
                        task.name,
                        panic_message(payload.as_ref())
                    );
                }
            }
            task.advance(now);
            fired += 1;
        }
        fired
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() -> anyhow::Result<()> + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    #[test]
    fn test_add_task_rejects_zero_interval() {
        let mut scheduler = Scheduler::new();
        let err = scheduler.add_task(Duration::ZERO, || Ok(())).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidInterval(_)));
        assert_eq!(scheduler.task_count(), 0);
        assert!(Scheduler::with_quantum(Duration::ZERO).is_err());
    }

    #[test]
    fn test_default_task_names() {
        let mut scheduler = Scheduler::new();
        let first = scheduler.add_task(Duration::from_secs(1), || Ok(())).unwrap();
        let second = scheduler.add_named_task("weather", Duration::from_secs(1), || Ok(())).unwrap();
        assert_eq!(scheduler.task_info(&first).unwrap().name, "task-0");
        assert_eq!(scheduler.task_info(&second).unwrap().name, "weather");
        assert_eq!(second.index(), 1);
    }

    #[test]
    fn test_due_time_law() {
        let mut scheduler = Scheduler::new();
        let (count, action) = counter();
        let handle = scheduler.add_task(Duration::from_secs(5), action).unwrap();
        let t0 = Instant::now();

        assert_eq!(scheduler.run_pending(t0), 1);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let info = scheduler.task_info(&handle).unwrap();
        assert_eq!(info.last_run, Some(t0));
        assert_eq!(info.next_due, t0 + Duration::from_secs(5));

        assert_eq!(scheduler.run_pending(t0 + Duration::from_millis(4900)), 0);
        assert_eq!(scheduler.run_pending(t0 + Duration::from_millis(5050)), 1);
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(
            scheduler.task_info(&handle).unwrap().next_due,
            t0 + Duration::from_millis(10050)
        );
    }

    #[test]
    fn test_due_tasks_run_in_registration_order() {
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut scheduler = Scheduler::new();
        for name in ["a", "b", "c"] {
            let order = Arc::clone(&order);
            scheduler
                .add_named_task(name, Duration::from_secs(1), move || {
                    order.lock().unwrap().push(name);
                    Ok(())
                })
                .unwrap();
        }
        scheduler.run_pending(Instant::now());
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_fault_isolation() {
        let mut scheduler = Scheduler::new();
        let failing = scheduler
            .add_named_task("failing", Duration::from_secs(1), || anyhow::bail!("boom"))
            .unwrap();
        let panicking = scheduler
            .add_named_task("panicking", Duration::from_secs(1), || panic!("kaboom"))
            .unwrap();
        let (count, action) = counter();
        let healthy = scheduler.add_named_task("healthy", Duration::from_secs(1), action).unwrap();

        let t0 = Instant::now();
        for i in 0..3 {
            assert_eq!(scheduler.run_pending(t0 + Duration::from_secs(i)), 3);
        }

        assert_eq!(count.load(Ordering::SeqCst), 3);
        for handle in [&failing, &panicking] {
            let info = scheduler.task_info(handle).unwrap();
            assert_eq!(info.runs, 3);
            assert_eq!(info.failures, 3);
            assert_eq!(info.last_run, Some(t0 + Duration::from_secs(2)));
            assert_eq!(info.next_due, t0 + Duration::from_secs(3));
        }
        let info = scheduler.task_info(&healthy).unwrap();
        assert_eq!(info.failures, 0);
        assert_eq!(info.next_due, t0 + Duration::from_secs(3));
    }

    #[test]
    fn test_dynamic_interval_applies_on_next_check() {
        let mut scheduler = Scheduler::new();
        let (count, action) = counter();
        let handle = scheduler.add_task(Duration::from_secs(30), action).unwrap();
        let t0 = Instant::now();
        scheduler.run_pending(t0);

        handle.set_interval(Duration::from_secs(2)).unwrap();
        assert_eq!(scheduler.run_pending(t0 + Duration::from_secs(2)), 1);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        let info = scheduler.task_info(&handle).unwrap();
        assert_eq!(info.interval, Duration::from_secs(2));
        assert_eq!(info.next_due, t0 + Duration::from_secs(4));

        assert!(handle.set_interval(Duration::ZERO).is_err());
        assert_eq!(handle.interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_stop_before_run_returns_immediately() {
        let mut scheduler = Scheduler::with_quantum(Duration::from_millis(5)).unwrap();
        let (count, action) = counter();
        scheduler.add_task(Duration::from_secs(1), action).unwrap();

        scheduler.stop();
        scheduler.stop();
        scheduler.run();

        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!scheduler.is_running());
    }
}
