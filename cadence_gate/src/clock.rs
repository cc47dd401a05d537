// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame counter, presentation timestamps and time sources.
//!
//! [`PresentationClock`] is the single piece of state shared between the
//! vsync source and the render thread. Everything in it lives under one
//! mutex; [`on_tick`](PresentationClock::on_tick) is the only place the frame
//! counter moves, and every wait on the render thread blocks on a condition
//! variable guarded by that same mutex, so a wake-up and the frame number it
//! announces are always observed together.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::Instant;

use cadence_core::time::{Duration, HostTime};

/// Ticks a scheduler keeps delivering after the last wake request.
pub const IDLE_CALLBACK_BUDGET: u32 = 10;

/// Added to every tick timestamp so presentation targets err late.
pub const PRESENTATION_PAD: Duration = Duration::from_millis(1);

// ---------------------------------------------------------------------------
// Time sources
// ---------------------------------------------------------------------------

/// A monotonic nanosecond time source.
pub trait MonotonicClock: Send + Sync {
    /// Current time.
    fn now(&self) -> HostTime;
}

/// [`MonotonicClock`] over [`std::time::Instant`], counted from the first
/// call in the process.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl MonotonicClock for SystemClock {
    fn now(&self) -> HostTime {
        static EPOCH: OnceLock<Instant> = OnceLock::new();
        let epoch = *EPOCH.get_or_init(Instant::now);
        HostTime(Duration::from(epoch.elapsed()).as_nanos())
    }
}

/// A [`MonotonicClock`] that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    nanos: AtomicU64,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    #[must_use]
    pub fn new(start: HostTime) -> Self {
        Self {
            nanos: AtomicU64::new(start.nanos()),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos(), Ordering::SeqCst);
    }

    /// Sets the clock.
    pub fn set(&self, t: HostTime) {
        self.nanos.store(t.nanos(), Ordering::SeqCst);
    }
}

impl MonotonicClock for ManualClock {
    fn now(&self) -> HostTime {
        HostTime(self.nanos.load(Ordering::SeqCst))
    }
}

// ---------------------------------------------------------------------------
// PresentationClock
// ---------------------------------------------------------------------------

/// Frame counter and timestamp captured together.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStamp {
    /// Number of ticks delivered so far.
    pub frame: u64,
    /// Timestamp of the latest tick, padded by the swap duration.
    pub timestamp: HostTime,
}

#[derive(Debug)]
struct ClockState {
    current_frame: u64,
    timestamp: HostTime,
    swap_duration: Duration,
    callbacks_before_idle: u32,
    armed: bool,
    wait_target: u64,
    stop: bool,
    externally_driven: bool,
    tick_period: Duration,
    tick_phase: Duration,
}

impl ClockState {
    fn timer_should_exit(&self) -> bool {
        self.stop || self.externally_driven
    }
}

/// Shared frame counter the render thread waits on.
#[derive(Debug)]
pub struct PresentationClock {
    state: Mutex<ClockState>,
    frame_advanced: Condvar,
    timer_wake: Condvar,
}

impl Default for PresentationClock {
    fn default() -> Self {
        Self::new(Duration::from_hz(60))
    }
}

impl PresentationClock {
    /// Creates a clock at frame zero whose self-scheduled ticks, if any, come
    /// every `tick_period`.
    #[must_use]
    pub fn new(tick_period: Duration) -> Self {
        Self {
            state: Mutex::new(ClockState {
                current_frame: 0,
                timestamp: HostTime(0),
                swap_duration: Duration::ZERO,
                callbacks_before_idle: 0,
                armed: false,
                wait_target: 0,
                stop: false,
                externally_driven: false,
                tick_period,
                tick_phase: Duration::ZERO,
            }),
            frame_advanced: Condvar::new(),
            timer_wake: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current frame counter and timestamp.
    #[must_use]
    pub fn stamp(&self) -> FrameStamp {
        let s = self.lock();
        FrameStamp {
            frame: s.current_frame,
            timestamp: s.timestamp,
        }
    }

    /// Current frame counter.
    #[must_use]
    pub fn current_frame(&self) -> u64 {
        self.lock().current_frame
    }

    /// Delivers one vsync.
    ///
    /// Advances the frame counter, stamps it with `timestamp` plus the swap
    /// duration and [`PRESENTATION_PAD`], spends one idle callback, keeps the
    /// scheduler armed while any remain or a waiter's target frame is still
    /// ahead, and wakes every waiter.
    pub fn on_tick(&self, timestamp: HostTime) {
        {
            let mut s = self.lock();
            s.current_frame += 1;
            s.timestamp = timestamp
                .saturating_add(s.swap_duration)
                .saturating_add(PRESENTATION_PAD);
            s.callbacks_before_idle = s.callbacks_before_idle.saturating_sub(1);
            s.armed = s.callbacks_before_idle > 0 || s.current_frame < s.wait_target;
        }
        self.frame_advanced.notify_all();
    }

    /// Delivers a tick supplied by the host and marks the clock as
    /// externally driven, which stops any self-scheduled timer.
    pub fn on_external_tick(&self, timestamp: HostTime) {
        let newly_external = {
            let mut s = self.lock();
            let newly = !s.externally_driven;
            s.externally_driven = true;
            newly
        };
        if newly_external {
            self.timer_wake.notify_all();
        }
        self.on_tick(timestamp);
    }

    /// Returns `true` once a host tick has been delivered.
    #[must_use]
    pub fn is_externally_driven(&self) -> bool {
        self.lock().externally_driven
    }

    /// Blocks until the frame counter reaches `target`.
    ///
    /// The self-scheduled timer keeps ticking until the target is reached,
    /// even past its idle budget. Unbounded: a missing tick cannot be told
    /// apart from one that is not due yet.
    pub fn wait_until_frame(&self, target: u64) {
        let mut guard = self.lock();
        guard.wait_target = guard.wait_target.max(target);
        if !guard.armed && guard.current_frame < target {
            guard.armed = true;
            self.timer_wake.notify_all();
        }
        let _guard = self
            .frame_advanced
            .wait_while(guard, |s| s.current_frame < target)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Blocks until the frame counter moves by one, or `timeout` elapses.
    ///
    /// Returns `true` if a tick arrived.
    pub fn wait_one_frame(&self, timeout: Duration) -> bool {
        let guard = self.lock();
        let start = guard.current_frame;
        let (guard, _) = self
            .frame_advanced
            .wait_timeout_while(guard, timeout.into(), |s| s.current_frame == start)
            .unwrap_or_else(PoisonError::into_inner);
        guard.current_frame != start
    }

    /// Sets the smoothed swap duration added to tick timestamps.
    pub fn set_swap_duration(&self, swap_duration: Duration) {
        self.lock().swap_duration = swap_duration;
    }

    /// Sets the period and phase of self-scheduled ticks.
    pub fn set_tick_timing(&self, period: Duration, phase: Duration) {
        {
            let mut s = self.lock();
            s.tick_period = period;
            s.tick_phase = phase;
        }
        self.timer_wake.notify_all();
    }

    // -- scheduler side ----------------------------------------------------

    /// Refills the idle budget and arms the scheduler if it went idle.
    ///
    /// Returns `true` if the scheduler was idle.
    pub(crate) fn post_wake_request(&self) -> bool {
        let was_idle = {
            let mut s = self.lock();
            s.callbacks_before_idle = IDLE_CALLBACK_BUDGET;
            let was_idle = !s.armed;
            s.armed = true;
            was_idle
        };
        if was_idle {
            self.timer_wake.notify_all();
        }
        was_idle
    }

    /// Blocks the timer thread until armed. Returns the tick period and
    /// phase, or `None` when the timer must exit.
    pub(crate) fn wait_armed(&self) -> Option<(Duration, Duration)> {
        let guard = self.lock();
        let s = self
            .timer_wake
            .wait_while(guard, |s| !s.armed && !s.timer_should_exit())
            .unwrap_or_else(PoisonError::into_inner);
        if s.timer_should_exit() {
            return None;
        }
        Some((s.tick_period, s.tick_phase))
    }

    /// Sleeps the timer thread for `span`. Returns `false` if it was told to
    /// exit in the meantime.
    pub(crate) fn sleep_timer(&self, span: Duration) -> bool {
        let guard = self.lock();
        let (s, _) = self
            .timer_wake
            .wait_timeout_while(guard, span.into(), |s| !s.timer_should_exit())
            .unwrap_or_else(PoisonError::into_inner);
        !s.timer_should_exit()
    }

    /// Tells the timer thread to exit and wakes it.
    pub(crate) fn stop_timer(&self) {
        self.lock().stop = true;
        self.timer_wake.notify_all();
    }

    /// Idle callbacks left before the scheduler stops ticking.
    #[must_use]
    pub fn callbacks_before_idle(&self) -> u32 {
        self.lock().callbacks_before_idle
    }
}
