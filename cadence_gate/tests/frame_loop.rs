// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render loops driven by real threads.
//!
//! Assertions only rely on ordering the gate guarantees, never on how quickly
//! a thread gets scheduled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use cadence_core::time::{Duration, HostTime};
use cadence_core::trace::{PostSwapEvent, PostWaitEvent, StartFrameEvent, TraceSink};
use cadence_gate::clock::{IDLE_CALLBACK_BUDGET, ManualClock, MonotonicClock, SystemClock};
use cadence_gate::display::StaticDisplay;
use cadence_gate::gate::{CompletedGpu, FrameGate, GateOptions, SwapHandlers, TickDriver, TickHandle};
use cadence_gate::vsync::SchedulerKind;

const P500: Duration = Duration(2_000_000);

fn options(driver: TickDriver) -> GateOptions {
    GateOptions {
        driver,
        ..GateOptions::default()
    }
}

/// Host vsync source ticking every 2ms until dropped.
struct Ticker {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Ticker {
    fn start(handle: TickHandle) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let thread = {
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    thread::sleep(P500.into());
                    handle.on_tick(SystemClock.now());
                }
            })
        };
        Self {
            stop,
            thread: Some(thread),
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(t) = self.thread.take() {
            t.join().unwrap();
        }
    }
}

/// Runs `frames` frames, checking that no frame gets ahead of the vsync
/// counter.
fn render(gate: &mut FrameGate, frames: u64) {
    let mut gpu = CompletedGpu(Duration::from_micros(500));
    for i in 1..=frames {
        thread::sleep(std::time::Duration::from_micros(300));
        gate.on_pre_swap(&mut gpu);
        assert!(
            gate.clock().current_frame() >= i,
            "frame {i} submitted at vsync {}",
            gate.clock().current_frame()
        );
        gate.on_post_swap(&mut gpu);
    }
}

#[test]
fn external_ticks_pace_frames() {
    let mut gate = FrameGate::new(StaticDisplay::new(P500), options(TickDriver::External));
    assert_eq!(gate.scheduler_kind(), SchedulerKind::External);
    let _ticker = Ticker::start(gate.tick_handle());
    render(&mut gate, 20);
    assert!(gate.need_presentation_time());
}

#[test]
fn self_scheduled_timer_paces_frames() {
    let mut gate = FrameGate::new(StaticDisplay::new(P500), GateOptions::default());
    assert_eq!(gate.scheduler_kind(), SchedulerKind::SelfScheduled);
    render(&mut gate, 20);
    drop(gate);
}

#[test]
fn immediate_driver_never_blocks() {
    let mut gate = FrameGate::new(StaticDisplay::new(P500), options(TickDriver::Immediate));
    let mut gpu = CompletedGpu::default();
    for _ in 0..100 {
        gate.on_pre_swap(&mut gpu);
        gate.on_post_swap(&mut gpu);
    }
    assert!(!gate.need_presentation_time());
    assert!(gate.clock().current_frame() >= 100);
}

#[test]
fn first_host_tick_stops_timer() {
    let mut gate = FrameGate::new(StaticDisplay::new(P500), GateOptions::default());
    gate.on_choreographer_tick(SystemClock.now());
    let _ticker = Ticker::start(gate.tick_handle());
    render(&mut gate, 5);
    assert_eq!(gate.scheduler_kind(), SchedulerKind::External);
    assert!(gate.clock().is_externally_driven());
}

#[test]
fn timer_idles_without_frames() {
    let mut gate =
        FrameGate::new(StaticDisplay::new(Duration::from_millis(1)), GateOptions::default());
    let mut gpu = CompletedGpu::default();
    gate.on_pre_swap(&mut gpu);
    gate.on_post_swap(&mut gpu);

    thread::sleep(std::time::Duration::from_millis(100));
    let settled = gate.clock().current_frame();
    assert_eq!(settled, u64::from(IDLE_CALLBACK_BUDGET));
    thread::sleep(std::time::Duration::from_millis(50));
    assert_eq!(gate.clock().current_frame(), settled, "ticks after going idle");
}

struct StuckGpu;

impl SwapHandlers for StuckGpu {
    fn last_frame_is_complete(&mut self) -> bool {
        false
    }

    fn prev_frame_gpu_time(&mut self) -> Duration {
        Duration::from_millis(5)
    }
}

#[test]
fn fence_timeout_bounds_gpu_wait() {
    let mut gate = FrameGate::new(StaticDisplay::new(P500), options(TickDriver::External));
    gate.set_fence_timeout(Duration::from_millis(20));
    gate.on_choreographer_tick(SystemClock.now());
    let before = gate.presentation_time();

    let start = Instant::now();
    gate.on_pre_swap(&mut StuckGpu);
    let waited = start.elapsed();
    assert!(waited >= std::time::Duration::from_millis(20), "gave up after {waited:?}");
    assert!(waited < std::time::Duration::from_secs(2), "waited {waited:?}");
    assert!(gate.presentation_time() >= before + P500, "late vsyncs push presentation back");
    assert!(gate.need_presentation_time());
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<&'static str>>>);

impl Recorder {
    fn push(&self, name: &'static str) {
        self.0.lock().unwrap().push(name);
    }
}

impl TraceSink for Recorder {
    fn on_pre_wait(&mut self) {
        self.push("pre_wait");
    }

    fn on_post_wait(&mut self, _: &PostWaitEvent) {
        self.push("post_wait");
    }

    fn on_pre_swap(&mut self) {
        self.push("pre_swap");
    }

    fn on_post_swap(&mut self, _: &PostSwapEvent) {
        self.push("post_swap");
    }

    fn on_start_frame(&mut self, _: &StartFrameEvent) {
        self.push("start_frame");
    }
}

#[test]
fn trace_events_follow_frame_protocol() {
    let time = Arc::new(ManualClock::new(HostTime(0)));
    let mut gate =
        FrameGate::with_clock(StaticDisplay::new(P500), options(TickDriver::External), time);
    let recorder = Recorder::default();
    gate.add_trace_sink(Box::new(recorder.clone()));

    let mut gpu = CompletedGpu::default();
    for i in 1..=2 {
        gate.on_choreographer_tick(HostTime(i));
        gate.on_pre_swap(&mut gpu);
        gate.on_post_swap(&mut gpu);
    }

    let frame = ["pre_wait", "post_wait", "pre_swap", "post_swap", "start_frame"];
    let expected: Vec<_> = frame.iter().chain(frame.iter()).copied().collect();
    assert_eq!(*recorder.0.lock().unwrap(), expected);
}

#[test]
fn settings_published_from_another_thread_apply() {
    let mut gate = FrameGate::new(StaticDisplay::new(P500), options(TickDriver::External));
    let shared = gate.settings();
    thread::spawn(move || shared.set_swap_interval_ns(P500 * 2).unwrap())
        .join()
        .unwrap();
    assert_eq!(gate.swap_interval_ns(), P500, "not before the next frame");

    gate.on_choreographer_tick(SystemClock.now());
    let mut gpu = CompletedGpu::default();
    gate.on_pre_swap(&mut gpu);
    assert_eq!(gate.swap_interval_ns(), P500 * 2);
    gate.on_post_swap(&mut gpu);
}
