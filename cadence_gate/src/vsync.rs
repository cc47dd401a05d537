// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vsync-aligned wake-up sources.
//!
//! [`VsyncScheduler`] is chosen at construction and exposes the same three
//! operations whichever variant is in use:
//!
//! - [`post_wake_request`](VsyncScheduler::post_wake_request), once per
//!   submitted frame;
//! - [`on_tick`](VsyncScheduler::on_tick), when a vsync arrives;
//! - [`shutdown`](VsyncScheduler::shutdown), also run on drop.
//!
//! The self-scheduled variant owns a timer thread that ticks on vsync
//! boundaries (shifted to the compositor's latch point) while armed, and goes
//! quiet once [`IDLE_CALLBACK_BUDGET`](crate::clock::IDLE_CALLBACK_BUDGET)
//! ticks pass without a new request. The externally driven variant leaves
//! ticking to the host. The immediate variant is the fallback when neither is
//! available: every request ticks at once and the gate stops pacing.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use cadence_core::time::{Duration, HostTime};

use crate::clock::{MonotonicClock, PresentationClock};

/// Which wake-up source a [`VsyncScheduler`] uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchedulerKind {
    /// A timer thread owned by the scheduler.
    SelfScheduled,
    /// Ticks supplied by the host through
    /// [`FrameGate::on_choreographer_tick`](crate::gate::FrameGate::on_choreographer_tick).
    External,
    /// No vsync source; every request ticks immediately.
    Immediate,
}

/// Failure to start a wake-up source.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The timer thread could not be spawned.
    #[error("failed to spawn vsync timer thread: {0}")]
    Spawn(#[source] io::Error),
}

/// A wake-up source feeding a [`PresentationClock`].
pub enum VsyncScheduler {
    /// Timer thread ticking on vsync boundaries.
    SelfScheduled {
        /// Clock being ticked.
        clock: Arc<PresentationClock>,
        /// Timer thread, taken on shutdown.
        thread: Option<JoinHandle<()>>,
    },
    /// Host-driven ticks.
    External {
        /// Clock being ticked.
        clock: Arc<PresentationClock>,
    },
    /// Unpaced fallback.
    Immediate {
        /// Clock being ticked.
        clock: Arc<PresentationClock>,
        /// Time source for tick timestamps.
        time: Arc<dyn MonotonicClock>,
    },
}

impl std::fmt::Debug for VsyncScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VsyncScheduler")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}

impl VsyncScheduler {
    /// Starts a timer thread that ticks `clock` on vsync boundaries measured
    /// by `time`.
    pub fn self_scheduled(
        clock: Arc<PresentationClock>,
        time: Arc<dyn MonotonicClock>,
    ) -> Result<Self, SchedulerError> {
        let thread = {
            let clock = Arc::clone(&clock);
            thread::Builder::new()
                .name("cadence-vsync".into())
                .spawn(move || run_timer(&clock, &*time))
                .map_err(SchedulerError::Spawn)?
        };
        log::info!("vsync scheduler: self-scheduled timer thread");
        Ok(Self::SelfScheduled {
            clock,
            thread: Some(thread),
        })
    }

    /// Leaves ticking to the host.
    #[must_use]
    pub fn external(clock: Arc<PresentationClock>) -> Self {
        log::info!("vsync scheduler: externally driven");
        Self::External { clock }
    }

    /// Ticks `clock` immediately on every request.
    #[must_use]
    pub fn immediate(clock: Arc<PresentationClock>, time: Arc<dyn MonotonicClock>) -> Self {
        log::warn!("vsync scheduler: no vsync source, frames will not be paced");
        Self::Immediate { clock, time }
    }

    /// Which variant this is.
    #[must_use]
    pub fn kind(&self) -> SchedulerKind {
        match self {
            Self::SelfScheduled { .. } => SchedulerKind::SelfScheduled,
            Self::External { .. } => SchedulerKind::External,
            Self::Immediate { .. } => SchedulerKind::Immediate,
        }
    }

    /// Returns `true` if ticks follow the display, so waiting on them paces
    /// frames.
    #[must_use]
    pub fn paces(&self) -> bool {
        !matches!(self, Self::Immediate { .. })
    }

    /// Asks for the next vsync notification.
    pub fn post_wake_request(&self) {
        match self {
            Self::SelfScheduled { clock, .. } => {
                clock.post_wake_request();
            }
            Self::External { .. } => {}
            Self::Immediate { clock, time } => clock.on_tick(time.now()),
        }
    }

    /// Delivers a vsync at `timestamp`.
    pub fn on_tick(&self, timestamp: HostTime) {
        match self {
            Self::SelfScheduled { clock, .. }
            | Self::External { clock }
            | Self::Immediate { clock, .. } => clock.on_tick(timestamp),
        }
    }

    /// Stops and joins the timer thread, if any. Idempotent.
    pub fn shutdown(&mut self) {
        if let Self::SelfScheduled { clock, thread } = self {
            let Some(handle) = thread.take() else {
                return;
            };
            clock.stop_timer();
            if handle.join().is_err() {
                log::warn!("vsync timer thread panicked");
            }
        }
    }
}

impl Drop for VsyncScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// First vsync strictly after `now` for ticks every `period` offset by
/// `phase`.
#[must_use]
pub fn next_vsync(now: HostTime, period: Duration, phase: Duration) -> HostTime {
    if period.is_zero() {
        return now;
    }
    let since_phase = Duration(now.nanos().saturating_sub(phase.as_nanos()));
    let n = since_phase / period + 1;
    HostTime(period.as_nanos().saturating_mul(n).saturating_add(phase.as_nanos()))
}

fn run_timer(clock: &PresentationClock, time: &dyn MonotonicClock) {
    log::debug!("vsync timer thread started");
    while let Some((period, phase)) = clock.wait_armed() {
        let now = time.now();
        let next = next_vsync(now, period, phase);
        if !clock.sleep_timer(next.saturating_duration_since(now)) {
            break;
        }
        clock.on_tick(next);
    }
    log::debug!("vsync timer thread exiting");
}
