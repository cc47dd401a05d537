// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Virtual-time replay of the frame protocol.
//!
//! [`Simulation`] runs the same per-frame sequence as the blocking gate, on a
//! clock that jumps straight to the next interesting instant:
//!
//! ```text
//!   start (vsync) ─► cpu work ─► wait for target vsync ─► wait for GPU ─► swap
//!                                 (late vsyncs, bounded by fence timeout)
//! ```
//!
//! With pipelining on the wait comes before the swap and this frame's GPU work
//! overlaps the next frame's CPU work. With pipelining off the swap comes
//! first and the wait also covers this frame's GPU work. When the controller
//! stops pacing, frames run back to back with no waits at all.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use cadence_core::controller::{PacingController, PacingDecision};
use cadence_core::frame::{FrameDuration, PipelineMode};
use cadence_core::refresh::{DisplayMode, ModeId};
use cadence_core::settings::{Hysteresis, PacingConfig, SettingsError, TimingSettings};
use cadence_core::time::{Duration, HostTime};
use cadence_core::trace::{
    PostSwapEvent, PostWaitEvent, StartFrameEvent, SwapIntervalChangedEvent, TraceSink,
};

use crate::quality::{PacingReport, PacingSample, PacingTracker};
use crate::workload::Workload;

/// Shortest frame an unpaced loop is allowed to take, so that a zero-cost
/// workload still advances the clock.
pub const MIN_UNPACED_FRAME: Duration = Duration::from_micros(100);

/// Number of frames the cadence grade is computed over.
pub const QUALITY_HISTORY: usize = 120;

/// Parameters of a simulated display and pacer.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Vsync period the display starts in.
    pub refresh_period: Duration,
    /// Caller-requested frame time. Defaults to one refresh period.
    pub swap_interval_ns: Option<Duration>,
    /// Pacer configuration.
    pub pacing: PacingConfig,
    /// Hysteresis margins.
    pub hysteresis: Hysteresis,
    /// Virtual time to simulate.
    pub duration: Duration,
    /// Modes the display can switch to. Empty for a fixed-rate display.
    pub modes: Vec<DisplayMode>,
    /// Mode the display starts in.
    pub active_mode: Option<ModeId>,
}

impl SimConfig {
    /// A fixed-rate display refreshing every `refresh_period`, simulated for
    /// `duration` with default pacing.
    #[must_use]
    pub fn new(refresh_period: Duration, duration: Duration) -> Self {
        Self {
            refresh_period,
            swap_interval_ns: None,
            pacing: PacingConfig::default(),
            hysteresis: Hysteresis::default(),
            duration,
            modes: Vec::new(),
            active_mode: None,
        }
    }

    fn timing_settings(&self) -> TimingSettings {
        let settings = TimingSettings::new(self.refresh_period);
        match self.swap_interval_ns {
            Some(requested) => settings.with_swap_interval(requested),
            None => settings,
        }
    }
}

/// What happened to one simulated frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimFrame {
    /// Vsync counter at frame start.
    pub vsync: u64,
    /// Frame start.
    pub start: HostTime,
    /// When the frame was submitted.
    pub swap: HostTime,
    /// When the frame was meant to become visible.
    pub presentation_time: HostTime,
    /// Swap interval the frame ran under.
    pub swap_interval: u32,
    /// Pipeline mode the frame ran under.
    pub pipeline_mode: PipelineMode,
    /// Refresh period the frame ran under.
    pub refresh_period: Duration,
    /// Workload cost of the frame.
    pub cost: FrameDuration,
    /// Vsyncs spent waiting on the GPU past the target.
    pub late: u32,
}

/// Result of [`Simulation::run`].
#[derive(Clone, Debug)]
pub struct SimReport {
    /// Every frame in order.
    pub frames: Vec<SimFrame>,
    /// Every swap-interval or pipeline-mode change, with the time it was made.
    pub changes: Vec<(HostTime, SwapIntervalChangedEvent)>,
    /// Every display mode request, with the time it was made.
    pub mode_requests: Vec<(HostTime, ModeId)>,
    /// Cadence grade over the last [`QUALITY_HISTORY`] frames.
    pub quality: PacingReport,
}

impl SimReport {
    /// Swap interval of the last frame started at or before `t`.
    #[must_use]
    pub fn interval_at(&self, t: Duration) -> Option<u32> {
        let t = HostTime(t.as_nanos());
        self.frames
            .iter()
            .take_while(|f| f.start <= t)
            .last()
            .map(|f| f.swap_interval)
    }

    /// Frames started in `[from, to)`.
    pub fn frames_between(&self, from: Duration, to: Duration) -> impl Iterator<Item = &SimFrame> {
        let (from, to) = (HostTime(from.as_nanos()), HostTime(to.as_nanos()));
        self.frames.iter().filter(move |f| f.start >= from && f.start < to)
    }

    /// Frames submitted per second over `[from, to)`.
    #[must_use]
    pub fn fps_between(&self, from: Duration, to: Duration) -> f64 {
        let span = to.saturating_sub(from);
        if span.is_zero() {
            return 0.0;
        }
        let (from_t, to_t) = (HostTime(from.as_nanos()), HostTime(to.as_nanos()));
        let swaps = self
            .frames
            .iter()
            .filter(|f| f.swap >= from_t && f.swap < to_t)
            .count();
        swaps as f64 * 1000.0 / span.as_millis_f64()
    }

    /// Changes made in `[from, to)`.
    pub fn changes_between(
        &self,
        from: Duration,
        to: Duration,
    ) -> impl Iterator<Item = &SwapIntervalChangedEvent> {
        let (from, to) = (HostTime(from.as_nanos()), HostTime(to.as_nanos()));
        self.changes
            .iter()
            .filter(move |(at, _)| *at >= from && *at < to)
            .map(|(_, e)| e)
    }
}

/// A paced render loop on a virtual clock.
pub struct Simulation {
    config: SimConfig,
    workload: Workload,
    controller: PacingController,
    clock_hook: Option<Box<dyn FnMut(HostTime)>>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("config", &self.config)
            .field("workload", &self.workload)
            .field("controller", &self.controller)
            .field("clock_hook", &self.clock_hook.is_some())
            .finish()
    }
}

impl Simulation {
    /// Creates a simulation. Fails if the display timings are invalid.
    pub fn new(config: SimConfig, workload: Workload) -> Result<Self, SettingsError> {
        let mut controller = PacingController::new(config.timing_settings(), config.pacing)?
            .with_hysteresis(config.hysteresis);
        if !config.modes.is_empty() {
            controller.set_display_modes(config.modes.clone(), config.active_mode);
        }
        Ok(Self {
            config,
            workload,
            controller,
            clock_hook: None,
        })
    }

    /// Calls `hook` with the virtual time right before every trace event, so
    /// that sinks reading their own clock see simulated time.
    #[must_use]
    pub fn with_clock_hook(mut self, hook: impl FnMut(HostTime) + 'static) -> Self {
        self.clock_hook = Some(Box::new(hook));
        self
    }

    /// The controller being driven.
    #[must_use]
    pub fn controller(&self) -> &PacingController {
        &self.controller
    }

    /// Runs the loop until the configured duration has elapsed.
    pub fn run(mut self, sink: &mut dyn TraceSink) -> SimReport {
        let end = HostTime(self.config.duration.as_nanos());
        let mut vsyncs = VsyncGrid::new(self.config.refresh_period);
        let mut tracker = PacingTracker::<QUALITY_HISTORY>::new(self.config.refresh_period.as_millis_f64());
        let mut report = SimReport {
            frames: Vec::new(),
            changes: Vec::new(),
            mode_requests: Vec::new(),
            quality: tracker.report(),
        };

        let mut t = HostTime(0);
        let mut gpu_done = HostTime(0);
        let mut last_gpu = Duration::ZERO;
        let mut last_swap: Option<HostTime> = None;

        while t < end {
            let period = self.controller.settings().refresh_period;
            let interval = self.controller.swap_interval();
            let mode = self.controller.pipeline_mode();
            let paced = self.controller.is_paced();
            let vsync = vsyncs.index_of(t);
            let cost = self.workload.at(Duration(t.nanos()));

            self.tick(t);
            sink.on_start_frame(&StartFrameEvent {
                frame: vsync,
                timestamp: t,
            });
            let target = t + period * interval;
            let ahead = interval.saturating_mul(mode.presentation_depth());
            let mut presentation_time = t.saturating_add(period.saturating_mul(ahead));
            let cpu_done = t + cost.cpu();

            let (swap, wait_end, late) = match mode {
                PipelineMode::On => {
                    let (wait_end, late) =
                        self.wait(sink, &vsyncs, paced, cpu_done, target, gpu_done, cost.cpu(), last_gpu);
                    gpu_done = wait_end.max(gpu_done) + cost.gpu();
                    last_gpu = cost.gpu();
                    self.swap(sink, wait_end, presentation_time + period * late);
                    (wait_end, wait_end, late)
                }
                PipelineMode::Off => {
                    self.swap(sink, cpu_done, presentation_time);
                    gpu_done = cpu_done.max(gpu_done) + cost.gpu();
                    last_gpu = cost.gpu();
                    let decision = self.controller.evaluate();
                    self.apply(sink, cpu_done, decision, &mut vsyncs, &mut report);
                    let (wait_end, late) =
                        self.wait(sink, &vsyncs, paced, cpu_done, target, gpu_done, cost.cpu(), last_gpu);
                    (cpu_done, wait_end, late)
                }
            };
            presentation_time = presentation_time + period * late;
            if mode == PipelineMode::On {
                let decision = self.controller.evaluate();
                self.apply(sink, swap, decision, &mut vsyncs, &mut report);
            }

            if let Some(previous) = last_swap {
                tracker.observe(PacingSample {
                    frame_delta_ms: (swap - previous).as_millis_f64(),
                    budget_ms: (period * interval).as_millis_f64(),
                });
            }
            last_swap = Some(swap);

            report.frames.push(SimFrame {
                vsync,
                start: t,
                swap,
                presentation_time,
                swap_interval: interval,
                pipeline_mode: mode,
                refresh_period: period,
                cost,
                late,
            });

            t = if paced {
                wait_end
            } else {
                wait_end.max(t + MIN_UNPACED_FRAME)
            };
        }

        report.quality = tracker.report();
        report
    }

    fn tick(&mut self, t: HostTime) {
        if let Some(hook) = self.clock_hook.as_mut() {
            hook(t);
        }
    }

    /// Waits for the target vsync and then for the GPU, one vsync at a time,
    /// up to the fence timeout. Records the frame's sample.
    fn wait(
        &mut self,
        sink: &mut dyn TraceSink,
        vsyncs: &VsyncGrid,
        paced: bool,
        now: HostTime,
        target: HostTime,
        gpu_done: HostTime,
        cpu_time: Duration,
        gpu_time: Duration,
    ) -> (HostTime, u32) {
        self.tick(now);
        sink.on_pre_wait();

        let mut wait_end = now;
        let mut late = 0_u32;
        if paced {
            wait_end = vsyncs.at_or_after(now).max(target);
            let deadline = wait_end + self.controller.config().fence_timeout;
            while gpu_done > wait_end && wait_end < deadline {
                wait_end = wait_end + vsyncs.period;
                late += 1;
            }
        }

        self.controller.add_sample(FrameDuration::new(cpu_time, gpu_time));
        self.tick(wait_end);
        sink.on_post_wait(&PostWaitEvent { cpu_time, gpu_time });
        (wait_end, late)
    }

    fn swap(&mut self, sink: &mut dyn TraceSink, at: HostTime, presentation_time: HostTime) {
        self.tick(at);
        sink.on_pre_swap();
        sink.on_post_swap(&PostSwapEvent { presentation_time });
    }

    /// Reports a decision and carries out any mode switch it asks for.
    fn apply(
        &mut self,
        sink: &mut dyn TraceSink,
        at: HostTime,
        decision: PacingDecision,
        vsyncs: &mut VsyncGrid,
        report: &mut SimReport,
    ) {
        self.tick(at);
        if decision.changed() {
            let event = decision.event(self.controller.settings().refresh_period);
            sink.on_swap_interval_changed(&event);
            report.changes.push((at, event));
        }
        let Some(id) = decision.mode_request else {
            return;
        };
        sink.on_refresh_rate_request(id);
        report.mode_requests.push((at, id));

        let Some(mode) = self.config.modes.iter().find(|m| m.id == id).copied() else {
            log::warn!("simulated display has no mode {}", id.0);
            return;
        };
        let settings = TimingSettings {
            refresh_period: mode.period,
            ..*self.controller.settings()
        };
        match self.controller.apply_settings(settings) {
            Ok(_) => {
                self.controller.set_active_mode(Some(id));
                // The new mode's vsyncs line up with the last one of the old.
                *vsyncs = vsyncs.rebased(vsyncs.at_or_after(at), mode.period);
            }
            Err(e) => log::warn!("display mode {} rejected: {e}", id.0),
        }
    }
}

/// Vsync instants of a display, possibly after a rate switch.
#[derive(Clone, Copy, Debug)]
struct VsyncGrid {
    phase: HostTime,
    first_index: u64,
    period: Duration,
}

impl VsyncGrid {
    fn new(period: Duration) -> Self {
        Self {
            phase: HostTime(0),
            first_index: 0,
            period,
        }
    }

    fn rebased(&self, phase: HostTime, period: Duration) -> Self {
        Self {
            phase,
            first_index: self.index_of(phase),
            period,
        }
    }

    /// Counter of the last vsync at or before `t`.
    fn index_of(&self, t: HostTime) -> u64 {
        self.first_index + t.saturating_duration_since(self.phase) / self.period
    }

    /// First vsync at or after `t`.
    fn at_or_after(&self, t: HostTime) -> HostTime {
        let since = t.saturating_duration_since(self.phase);
        let whole = since / self.period;
        let periods = whole + u64::from(!(since % self.period).is_zero());
        self.phase + Duration(periods * self.period.as_nanos())
    }
}
