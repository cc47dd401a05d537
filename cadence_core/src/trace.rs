// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Observability hooks for the frame protocol.
//!
//! The gate calls a [`TraceSink`] synchronously on the render thread at fixed
//! points of every frame:
//!
//! ```text
//!   on_start_frame ─► [render] ─► on_pre_wait ─► on_post_wait
//!        ▲                                            │
//!        │                                      on_pre_swap
//!        │                                            │
//!        └──── on_swap_interval_changed? ◄──── on_post_swap
//! ```
//!
//! (With pipelining off the wait pair moves after `on_post_swap`.) All
//! methods default to no-ops, so implementing only the events you care about
//! is fine. [`TraceSinks`] fans one event out to several sinks.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::frame::PipelineMode;
use crate::refresh::ModeId;
use crate::time::{Duration, HostTime};

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted after the frame wait, with the sample that was recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PostWaitEvent {
    /// Time from frame start to the wait.
    pub cpu_time: Duration,
    /// GPU time of the previous frame, as reported by the caller.
    pub gpu_time: Duration,
}

/// Emitted after swap submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PostSwapEvent {
    /// Time the submitted frame is meant to become visible.
    pub presentation_time: HostTime,
}

/// Emitted when a new frame starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartFrameEvent {
    /// Vsync counter at frame start.
    pub frame: u64,
    /// Timestamp of that vsync.
    pub timestamp: HostTime,
}

/// Emitted when the controller changes the swap interval or pipeline mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapIntervalChangedEvent {
    /// Interval before the change.
    pub old_interval: u32,
    /// Interval after the change.
    pub new_interval: u32,
    /// Pipeline mode before the change.
    pub old_mode: PipelineMode,
    /// Pipeline mode after the change.
    pub new_mode: PipelineMode,
    /// Frame budget after the change.
    pub swap_interval_ns: Duration,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receiver for frame-protocol events.
pub trait TraceSink {
    /// Called before the frame waits for its vsync.
    fn on_pre_wait(&mut self) {}

    /// Called after the frame wait.
    fn on_post_wait(&mut self, e: &PostWaitEvent) {
        _ = e;
    }

    /// Called just before swap submission.
    fn on_pre_swap(&mut self) {}

    /// Called just after swap submission.
    fn on_post_swap(&mut self, e: &PostSwapEvent) {
        _ = e;
    }

    /// Called when the next frame starts.
    fn on_start_frame(&mut self, e: &StartFrameEvent) {
        _ = e;
    }

    /// Called when the swap interval or pipeline mode changes.
    fn on_swap_interval_changed(&mut self, e: &SwapIntervalChangedEvent) {
        _ = e;
    }

    /// Called when the pacer asks the display for a different mode.
    fn on_refresh_rate_request(&mut self, mode: ModeId) {
        _ = mode;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// TraceSinks fan-out
// ---------------------------------------------------------------------------

/// An ordered list of sinks that all receive every event.
#[derive(Default)]
pub struct TraceSinks {
    sinks: Vec<Box<dyn TraceSink + Send>>,
}

impl core::fmt::Debug for TraceSinks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TraceSinks")
            .field("len", &self.sinks.len())
            .finish()
    }
}

impl TraceSinks {
    /// Creates an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    /// Appends a sink.
    pub fn push(&mut self, sink: Box<dyn TraceSink + Send>) {
        self.sinks.push(sink);
    }

    /// Number of sinks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns `true` if no sinks are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl TraceSink for TraceSinks {
    fn on_pre_wait(&mut self) {
        for s in &mut self.sinks {
            s.on_pre_wait();
        }
    }

    fn on_post_wait(&mut self, e: &PostWaitEvent) {
        for s in &mut self.sinks {
            s.on_post_wait(e);
        }
    }

    fn on_pre_swap(&mut self) {
        for s in &mut self.sinks {
            s.on_pre_swap();
        }
    }

    fn on_post_swap(&mut self, e: &PostSwapEvent) {
        for s in &mut self.sinks {
            s.on_post_swap(e);
        }
    }

    fn on_start_frame(&mut self, e: &StartFrameEvent) {
        for s in &mut self.sinks {
            s.on_start_frame(e);
        }
    }

    fn on_swap_interval_changed(&mut self, e: &SwapIntervalChangedEvent) {
        for s in &mut self.sinks {
            s.on_swap_interval_changed(e);
        }
    }

    fn on_refresh_rate_request(&mut self, mode: ModeId) {
        for s in &mut self.sinks {
            s.on_refresh_rate_request(mode);
        }
    }
}
