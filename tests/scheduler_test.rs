// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-weather-modbus project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Real-time tests of the scheduler control loop

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use rust_weather_modbus::scheduler::Scheduler;

#[test]
fn test_run_executes_tasks_until_stopped() -> anyhow::Result<()> {
    let mut scheduler = Scheduler::with_quantum(Duration::from_millis(5))?;
    let fast = Arc::new(AtomicUsize::new(0));
    let slow = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&fast);
    scheduler.add_named_task("fast", Duration::from_millis(20), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })?;
    let counter = Arc::clone(&slow);
    scheduler.add_named_task("slow", Duration::from_millis(200), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })?;

    let stop = scheduler.stop_handle();
    let runner = thread::spawn(move || scheduler.run());

    thread::sleep(Duration::from_millis(500));
    stop.stop();
    runner.join().expect("scheduler thread panicked");

    let fast = fast.load(Ordering::SeqCst);
    let slow = slow.load(Ordering::SeqCst);
    assert!(fast >= 5, "fast task ran {} times", fast);
    assert!((1..=3).contains(&slow), "slow task ran {} times", slow);
    assert!(fast > slow);
    Ok(())
}

#[test]
fn test_task_runs_on_first_pass_then_waits_its_interval() -> anyhow::Result<()> {
    let mut scheduler = Scheduler::with_quantum(Duration::from_millis(5))?;
    let ran = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&ran);
    scheduler.add_task(Duration::from_millis(300), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })?;

    let stop = scheduler.stop_handle();
    let runner = thread::spawn(move || scheduler.run());

    thread::sleep(Duration::from_millis(100));
    assert_eq!(ran.load(Ordering::SeqCst), 1);

    stop.stop();
    runner.join().expect("scheduler thread panicked");
    Ok(())
}

#[test]
fn test_failing_task_keeps_loop_alive() -> anyhow::Result<()> {
    let mut scheduler = Scheduler::with_quantum(Duration::from_millis(5))?;
    let healthy = Arc::new(AtomicUsize::new(0));

    scheduler.add_named_task("failing", Duration::from_millis(10), || {
        anyhow::bail!("sensor unavailable")
    })?;
    scheduler.add_named_task("panicking", Duration::from_millis(10), || {
        panic!("unexpected state")
    })?;
    let counter = Arc::clone(&healthy);
    scheduler.add_named_task("healthy", Duration::from_millis(10), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })?;

    let stop = scheduler.stop_handle();
    let runner = thread::spawn(move || scheduler.run());

    thread::sleep(Duration::from_millis(200));
    stop.stop();
    runner.join().expect("scheduler thread panicked");

    assert!(healthy.load(Ordering::SeqCst) >= 3);
    Ok(())
}

#[test]
fn test_stop_returns_within_a_quantum() -> anyhow::Result<()> {
    let mut scheduler = Scheduler::with_quantum(Duration::from_millis(20))?;
    scheduler.add_task(Duration::from_secs(60), || Ok(()))?;

    let stop = scheduler.stop_handle();
    let runner = thread::spawn(move || scheduler.run());
    thread::sleep(Duration::from_millis(50));

    let requested = Instant::now();
    stop.stop();
    runner.join().expect("scheduler thread panicked");
    assert!(requested.elapsed() < Duration::from_millis(500));
    Ok(())
}

#[test]
fn test_interval_change_applies_while_running() -> anyhow::Result<()> {
    let mut scheduler = Scheduler::with_quantum(Duration::from_millis(5))?;
    let ran = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&ran);
    let handle = scheduler.add_task(Duration::from_secs(3600), move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })?;

    let stop = scheduler.stop_handle();
    let runner = thread::spawn(move || scheduler.run());

    thread::sleep(Duration::from_millis(50));
    assert_eq!(ran.load(Ordering::SeqCst), 1);

    handle.set_interval(Duration::from_millis(10))?;
    thread::sleep(Duration::from_millis(200));
    stop.stop();
    runner.join().expect("scheduler thread panicked");

    assert!(ran.load(Ordering::SeqCst) >= 3);
    Ok(())
}

#[test]
fn test_fire_spacing_stays_within_one_quantum_and_stops() -> anyhow::Result<()> {
    let quantum = Duration::from_millis(50);
    let interval = Duration::from_millis(250);
    // Allowance for thread wake-up overshoot on a loaded machine
    let slack = Duration::from_millis(30);

    let mut scheduler = Scheduler::with_quantum(quantum)?;
    let fires = Arc::new(Mutex::new(Vec::<Instant>::new()));

    let recorder = Arc::clone(&fires);
    scheduler.add_named_task("spaced", interval, move || {
        recorder
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Instant::now());
        Ok(())
    })?;

    let stop = scheduler.stop_handle();
    let runner = thread::spawn(move || scheduler.run());

    thread::sleep(Duration::from_millis(900));
    stop.stop();
    runner.join().expect("scheduler thread panicked");

    let fired = fires.lock().unwrap_or_else(|e| e.into_inner()).clone();
    assert!(fired.len() >= 3, "task fired {} times", fired.len());
    for pair in fired.windows(2) {
        let gap = pair[1] - pair[0];
        assert!(gap >= interval - quantum, "gap {:?} too short", gap);
        assert!(gap <= interval + quantum + slack, "gap {:?} too long", gap);
    }

    // No run once the loop has returned
    thread::sleep(Duration::from_millis(600));
    assert_eq!(fires.lock().unwrap_or_else(|e| e.into_inner()).len(), fired.len());
    Ok(())
}

