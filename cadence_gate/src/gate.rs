// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame protocol.
//!
//! A render loop calls [`FrameGate::on_pre_swap`] right before submitting a
//! frame and [`FrameGate::on_post_swap`] right after:
//!
//! ```text
//!   start_frame ──► [render] ──► on_pre_swap ──► swap ──► on_post_swap ─┐
//!        ▲                        (wait if                (evaluate,    │
//!        │                         pipelined)              wait if not) │
//!        └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The wait blocks until the vsync counter reaches the frame's target, then
//! one vsync at a time while the previous frame's GPU work is still running,
//! bounded by the fence timeout. Each such late vsync pushes the presentation
//! time back by one refresh period.

use std::sync::Arc;

use cadence_core::controller::{PacingController, PacingDecision};
use cadence_core::frame::{FrameDuration, PipelineMode};
use cadence_core::settings::{Hysteresis, PacingConfig, SettingsError};
use cadence_core::time::{Duration, HostTime};
use cadence_core::trace::{
    PostSwapEvent, PostWaitEvent, StartFrameEvent, TraceSink, TraceSinks,
};

use crate::clock::{MonotonicClock, PresentationClock, SystemClock};
use crate::display::{DisplayBackend, DisplayError, DisplayTimings};
use crate::shared::SharedSettings;
use crate::vsync::{SchedulerKind, VsyncScheduler};

/// What the gate needs to know about the GPU.
pub trait SwapHandlers {
    /// Returns `true` once the previous frame's GPU work has finished.
    fn last_frame_is_complete(&mut self) -> bool;

    /// GPU time the previous frame took.
    fn prev_frame_gpu_time(&mut self) -> Duration;
}

/// [`SwapHandlers`] for a GPU that is always done, reporting a fixed GPU
/// time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompletedGpu(pub Duration);

impl SwapHandlers for CompletedGpu {
    fn last_frame_is_complete(&mut self) -> bool {
        true
    }

    fn prev_frame_gpu_time(&mut self) -> Duration {
        self.0
    }
}

/// Where vsync ticks come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TickDriver {
    /// The gate runs its own timer thread.
    #[default]
    SelfScheduled,
    /// The host calls [`FrameGate::on_choreographer_tick`] once per vsync.
    External,
    /// No vsync source. Frames are not paced.
    Immediate,
}

/// Construction-time options for a [`FrameGate`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GateOptions {
    /// Controller configuration.
    pub config: PacingConfig,
    /// Controller hysteresis.
    pub hysteresis: Hysteresis,
    /// Tick source.
    pub driver: TickDriver,
    /// Frame time the caller asks for. Defaults to one refresh period.
    pub swap_interval_ns: Option<Duration>,
}

/// Why a gate came up without pacing.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    /// The display could not report its timings.
    #[error(transparent)]
    Display(#[from] DisplayError),
    /// The display reported timings the controller cannot use.
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// A clonable handle for delivering host vsync ticks from another thread.
#[derive(Clone, Debug)]
pub struct TickHandle {
    clock: Arc<PresentationClock>,
}

impl TickHandle {
    /// Delivers a host vsync at `timestamp`. See
    /// [`FrameGate::on_choreographer_tick`].
    pub fn on_tick(&self, timestamp: HostTime) {
        self.clock.on_external_tick(timestamp);
    }
}

/// Vsync-aligned pacing for one render loop.
pub struct FrameGate {
    display: Box<dyn DisplayBackend>,
    init_error: Option<InitError>,
    controller: PacingController,
    shared: Arc<SharedSettings>,
    settings_generation: u64,
    clock: Arc<PresentationClock>,
    scheduler: VsyncScheduler,
    time: Arc<dyn MonotonicClock>,
    target_frame: u64,
    presentation_time: HostTime,
    presentation_time_needed: bool,
    start_frame_time: Option<HostTime>,
    swap_time: HostTime,
    swap_duration: Duration,
    sinks: TraceSinks,
}

impl std::fmt::Debug for FrameGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameGate")
            .field("valid", &self.is_valid())
            .field("swap_interval", &self.controller.swap_interval())
            .field("pipeline_mode", &self.controller.pipeline_mode())
            .field("scheduler", &self.scheduler)
            .field("target_frame", &self.target_frame)
            .field("presentation_time", &self.presentation_time)
            .field("sinks", &self.sinks)
            .finish_non_exhaustive()
    }
}

impl FrameGate {
    /// Creates a gate timed by the system clock.
    pub fn new(display: impl DisplayBackend + 'static, options: GateOptions) -> Self {
        Self::with_clock(display, options, Arc::new(SystemClock))
    }

    /// Creates a gate timed by `time`.
    ///
    /// Never fails. If the display cannot report usable timings the gate
    /// comes up invalid: every call passes straight through and
    /// [`init_error`](Self::init_error) says why.
    pub fn with_clock(
        display: impl DisplayBackend + 'static,
        options: GateOptions,
        time: Arc<dyn MonotonicClock>,
    ) -> Self {
        let mut display: Box<dyn DisplayBackend> = Box::new(display);
        let (controller, init_error) = match build_controller(&mut *display, &options) {
            Ok(controller) => (controller, None),
            Err(e) => {
                log::warn!("{e}; frames will not be paced");
                (PacingController::with_nominal_timing(options.config), Some(e))
            }
        };
        let mut controller = controller.with_hysteresis(options.hysteresis);
        if init_error.is_none() {
            let modes = display.supported_modes();
            let active = display.active_mode();
            controller.set_display_modes(modes, active);
        }

        let settings = *controller.settings();
        let clock = Arc::new(PresentationClock::new(settings.refresh_period));
        clock.set_tick_timing(settings.refresh_period, settings.wake_offset());
        let shared = Arc::new(SharedSettings::new(settings));
        {
            let clock = Arc::clone(&clock);
            shared.subscribe(move |s| clock.set_tick_timing(s.refresh_period, s.wake_offset()));
        }

        let scheduler = if init_error.is_some() {
            VsyncScheduler::immediate(Arc::clone(&clock), Arc::clone(&time))
        } else {
            start_scheduler(options.driver, &clock, &time)
        };

        log::info!(
            "frame gate initialised: period {:?}, app offset {:?}, sf offset {:?}, {:?}",
            settings.refresh_period,
            settings.app_vsync_offset,
            settings.sf_vsync_offset,
            scheduler.kind()
        );

        let mut gate = Self {
            display,
            init_error,
            controller,
            shared,
            settings_generation: 0,
            clock,
            scheduler,
            time,
            target_frame: 0,
            presentation_time: HostTime(0),
            presentation_time_needed: false,
            start_frame_time: None,
            swap_time: HostTime(0),
            swap_duration: Duration::ZERO,
            sinks: TraceSinks::new(),
        };
        gate.start_frame();
        gate
    }

    // -- host ticks --------------------------------------------------------

    /// Delivers a host vsync at `timestamp`.
    ///
    /// The first call on a self-scheduled gate stops its timer thread for
    /// good; from then on the host is the only tick source.
    pub fn on_choreographer_tick(&self, timestamp: HostTime) {
        self.clock.on_external_tick(timestamp);
    }

    /// A handle for calling [`on_choreographer_tick`](Self::on_choreographer_tick)
    /// from another thread.
    #[must_use]
    pub fn tick_handle(&self) -> TickHandle {
        TickHandle {
            clock: Arc::clone(&self.clock),
        }
    }

    // -- frame protocol ----------------------------------------------------

    /// Call right before submitting a frame.
    ///
    /// With pipelining on, blocks until the frame's target vsync.
    pub fn on_pre_swap(&mut self, handlers: &mut impl SwapHandlers) {
        if !self.is_valid() {
            return;
        }
        self.sync_scheduler();
        self.scheduler.post_wake_request();
        self.apply_pending_settings();

        if self.controller.pipeline_mode() == PipelineMode::On {
            self.presentation_time_needed = self.wait_for_next_frame(handlers);
        } else {
            self.presentation_time_needed = self.paces();
        }
        self.swap_time = self.time.now();
        self.sinks.on_pre_swap();
    }

    /// Call right after submitting a frame.
    ///
    /// Runs the controller, waits for the target vsync if pipelining is off,
    /// and starts the next frame.
    pub fn on_post_swap(&mut self, handlers: &mut impl SwapHandlers) {
        if !self.is_valid() {
            return;
        }
        self.sinks.on_post_swap(&PostSwapEvent {
            presentation_time: self.presentation_time,
        });

        let decision = self.controller.evaluate();
        self.handle_decision(decision);

        if self.controller.pipeline_mode() == PipelineMode::Off {
            self.wait_for_next_frame(handlers);
        }

        let swap = self.time.now().saturating_duration_since(self.swap_time);
        self.update_swap_duration(swap);
        self.start_frame();
    }

    /// Returns `true` if the frame just submitted should carry
    /// [`presentation_time`](Self::presentation_time).
    #[must_use]
    pub fn need_presentation_time(&self) -> bool {
        self.presentation_time_needed
    }

    /// When the current frame is meant to become visible.
    #[must_use]
    pub fn presentation_time(&self) -> HostTime {
        self.presentation_time
    }

    fn start_frame(&mut self) {
        let stamp = self.clock.stamp();
        self.sinks.on_start_frame(&StartFrameEvent {
            frame: stamp.frame,
            timestamp: stamp.timestamp,
        });
        let interval = self.controller.swap_interval();
        let depth = self.controller.pipeline_mode().presentation_depth();
        self.target_frame = stamp.frame + u64::from(interval);
        let ahead = self
            .controller
            .settings()
            .refresh_period
            .saturating_mul(interval.saturating_mul(depth));
        self.presentation_time = stamp.timestamp.saturating_add(ahead);
        self.start_frame_time = Some(self.time.now());
    }

    /// Waits for the target vsync and the previous frame's GPU work, then
    /// records the frame's sample. Returns whether the wait paced the frame.
    fn wait_for_next_frame(&mut self, handlers: &mut impl SwapHandlers) -> bool {
        let cpu_time = self
            .start_frame_time
            .map_or(Duration::ZERO, |start| self.time.now().saturating_duration_since(start));
        self.sinks.on_pre_wait();

        let paced = self.paces();
        if paced {
            self.clock.wait_until_frame(self.target_frame);
            let late = self.wait_for_gpu(handlers);
            self.presentation_time = self
                .presentation_time
                .saturating_add(self.controller.settings().refresh_period.saturating_mul(late));
        }

        let gpu_time = handlers.prev_frame_gpu_time();
        self.controller.add_sample(FrameDuration::new(cpu_time, gpu_time));
        self.sinks.on_post_wait(&PostWaitEvent { cpu_time, gpu_time });
        paced
    }

    /// Waits one vsync at a time until the previous frame completes or the
    /// fence timeout runs out. Returns the number of vsyncs waited.
    fn wait_for_gpu(&mut self, handlers: &mut impl SwapHandlers) -> u32 {
        let timeout = self.controller.config().fence_timeout;
        let deadline = self.time.now().saturating_add(timeout);
        let mut late = 0_u32;
        while !handlers.last_frame_is_complete() {
            let now = self.time.now();
            if now >= deadline {
                log::warn!("previous frame still on the GPU after {timeout:?}, not waiting further");
                break;
            }
            late += 1;
            self.clock.wait_one_frame(deadline.saturating_duration_since(now));
        }
        if late > 0 {
            log::trace!("frame {} late by {late} vsyncs", self.target_frame);
        }
        late
    }

    fn update_swap_duration(&mut self, sample: Duration) {
        let cap = self.controller.settings().refresh_period / 2;
        self.swap_duration = (self.swap_duration * 4 / 5 + sample / 5).min(cap);
        self.clock.set_swap_duration(self.swap_duration);
    }

    fn handle_decision(&mut self, decision: PacingDecision) {
        if decision.changed() {
            let event = decision.event(self.controller.settings().refresh_period);
            self.sinks.on_swap_interval_changed(&event);
        }
        let Some(mode) = decision.mode_request else {
            return;
        };
        match self.display.set_preferred_mode(mode) {
            Ok(()) => {
                self.sinks.on_refresh_rate_request(mode);
                self.refresh_display_timings();
            }
            Err(e) => log::warn!("display mode request failed: {e}"),
        }
    }

    fn paces(&self) -> bool {
        self.scheduler.paces() && self.controller.is_paced()
    }

    /// Replaces a self-scheduled timer with host ticks once the host starts
    /// delivering them.
    fn sync_scheduler(&mut self) {
        if self.scheduler.kind() == SchedulerKind::SelfScheduled
            && self.clock.is_externally_driven()
        {
            log::info!("host vsync ticks detected, stopping the timer thread");
            self.scheduler.shutdown();
            self.scheduler = VsyncScheduler::external(Arc::clone(&self.clock));
        }
    }

    fn apply_pending_settings(&mut self) {
        let generation = self.shared.generation();
        if generation == self.settings_generation {
            return;
        }
        self.settings_generation = generation;
        let snapshot = *self.shared.snapshot();
        match self.controller.apply_settings(snapshot) {
            Ok(decision) => self.handle_decision(decision),
            Err(e) => log::warn!("ignoring timing settings: {e}"),
        }
    }

    // -- settings ----------------------------------------------------------

    /// Re-queries the display and publishes its timings.
    ///
    /// The new timings take effect at the start of the next
    /// [`on_pre_swap`](Self::on_pre_swap).
    pub fn refresh_display_timings(&mut self) {
        let timings = match self.display.display_timings() {
            Ok(t) => t,
            Err(e) => {
                log::warn!("{e}; keeping previous timings");
                return;
            }
        };
        let active = self.display.active_mode();
        self.controller.set_active_mode(active);
        let requested = self.shared.snapshot().swap_interval_ns;
        if let Err(e) = self.shared.publish(timings.to_settings(requested)) {
            log::warn!("ignoring display timings: {e}");
        }
    }

    /// Asks for frames no shorter than `swap_interval_ns`.
    pub fn set_swap_interval_ns(&self, swap_interval_ns: Duration) -> Result<(), SettingsError> {
        self.shared.set_swap_interval_ns(swap_interval_ns)
    }

    /// The shared timing snapshot, for publishing from other threads.
    #[must_use]
    pub fn settings(&self) -> Arc<SharedSettings> {
        Arc::clone(&self.shared)
    }

    /// Current frame budget.
    #[must_use]
    pub fn swap_interval_ns(&self) -> Duration {
        self.controller.swap_interval_ns()
    }

    /// Current pipeline mode.
    #[must_use]
    pub fn pipeline_mode(&self) -> PipelineMode {
        self.controller.pipeline_mode()
    }

    /// See [`PacingController::set_auto_swap_interval`].
    pub fn set_auto_swap_interval(&mut self, enabled: bool) {
        self.controller.set_auto_swap_interval(enabled);
    }

    /// See [`PacingController::set_auto_pipeline_mode`].
    pub fn set_auto_pipeline_mode(&mut self, enabled: bool) {
        self.controller.set_auto_pipeline_mode(enabled);
    }

    /// Sets the largest frame budget the controller may slow down to.
    pub fn set_max_auto_swap_interval(&mut self, max: Duration) {
        self.controller.set_max_auto_swap_interval(max);
    }

    /// Sets how long a frame waits for the previous frame's GPU work.
    pub fn set_fence_timeout(&mut self, timeout: Duration) {
        self.controller.set_fence_timeout(timeout);
    }

    /// GPU wait bound in effect.
    #[must_use]
    pub fn fence_timeout(&self) -> Duration {
        self.controller.config().fence_timeout
    }

    // -- introspection -----------------------------------------------------

    /// Returns `false` if the display timings could not be queried at
    /// construction, in which case the gate does nothing.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.init_error.is_none()
    }

    /// Why the gate is not valid, if it is not.
    #[must_use]
    pub fn init_error(&self) -> Option<&InitError> {
        self.init_error.as_ref()
    }

    /// Registers a sink for frame-protocol events.
    pub fn add_trace_sink(&mut self, sink: Box<dyn TraceSink + Send>) {
        self.sinks.push(sink);
    }

    /// Which tick source is in use.
    #[must_use]
    pub fn scheduler_kind(&self) -> SchedulerKind {
        self.scheduler.kind()
    }

    /// The presentation clock.
    #[must_use]
    pub fn clock(&self) -> &Arc<PresentationClock> {
        &self.clock
    }

    /// The controller.
    #[must_use]
    pub fn controller(&self) -> &PacingController {
        &self.controller
    }
}

fn build_controller(
    display: &mut dyn DisplayBackend,
    options: &GateOptions,
) -> Result<PacingController, InitError> {
    let timings: DisplayTimings = display.display_timings()?;
    let requested = options.swap_interval_ns.unwrap_or(timings.refresh_period);
    Ok(PacingController::new(timings.to_settings(requested), options.config)?)
}

fn start_scheduler(
    driver: TickDriver,
    clock: &Arc<PresentationClock>,
    time: &Arc<dyn MonotonicClock>,
) -> VsyncScheduler {
    match driver {
        TickDriver::SelfScheduled => {
            match VsyncScheduler::self_scheduled(Arc::clone(clock), Arc::clone(time)) {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("{e}; falling back to immediate ticks");
                    VsyncScheduler::immediate(Arc::clone(clock), Arc::clone(time))
                }
            }
        }
        TickDriver::External => VsyncScheduler::external(Arc::clone(clock)),
        TickDriver::Immediate => VsyncScheduler::immediate(Arc::clone(clock), Arc::clone(time)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::display::{StaticDisplay, UnavailableDisplay};
    use cadence_core::refresh::{DisplayMode, ModeId};
    use cadence_core::trace::SwapIntervalChangedEvent;

    const P60: Duration = Duration(16_666_667);

    fn external_gate(display: StaticDisplay) -> (FrameGate, Arc<ManualClock>) {
        let time = Arc::new(ManualClock::new(HostTime(1_000_000_000)));
        let options = GateOptions {
            driver: TickDriver::External,
            ..GateOptions::default()
        };
        let gate = FrameGate::with_clock(display, options, time.clone());
        (gate, time)
    }

    #[test]
    fn unavailable_display_passes_through() {
        let mut gate = FrameGate::new(UnavailableDisplay, GateOptions::default());
        assert!(!gate.is_valid());
        assert!(matches!(gate.init_error(), Some(InitError::Display(_))));
        assert_eq!(gate.scheduler_kind(), SchedulerKind::Immediate);
        let mut gpu = CompletedGpu::default();
        gate.on_pre_swap(&mut gpu);
        gate.on_post_swap(&mut gpu);
        assert!(!gate.need_presentation_time());
        assert!(gate.controller().window().is_empty());
    }

    #[test]
    fn presentation_time_accounts_for_pipelining() {
        let (mut gate, time) = external_gate(StaticDisplay::new(P60));
        gate.on_choreographer_tick(HostTime(1_000_000_000));
        let mut gpu = CompletedGpu(Duration::from_millis(2));

        // One tick already delivered: frame 1 is the target.
        gate.on_pre_swap(&mut gpu);
        assert!(gate.need_presentation_time());
        time.advance(Duration::from_millis(1));
        gate.on_post_swap(&mut gpu);

        // Stamp of tick 1 is ts + pad; two periods ahead while pipelined.
        let stamp = gate.clock().stamp();
        assert_eq!(stamp.frame, 1);
        assert_eq!(gate.presentation_time(), stamp.timestamp + P60 * 2);
    }

    #[test]
    fn ceiling_below_budget_stops_pacing() {
        let time = Arc::new(ManualClock::new(HostTime(0)));
        let options = GateOptions {
            driver: TickDriver::External,
            swap_interval_ns: Some(P60 * 4),
            ..GateOptions::default()
        };
        let mut gate = FrameGate::with_clock(StaticDisplay::new(P60), options, time);
        let mut gpu = CompletedGpu::default();
        // No ticks are ever delivered; an unpaced gate must not block.
        for _ in 0..5 {
            gate.on_pre_swap(&mut gpu);
            gate.on_post_swap(&mut gpu);
        }
        assert!(!gate.need_presentation_time());
        assert_eq!(gate.swap_interval_ns(), P60 * 4);
    }

    #[derive(Default)]
    struct ModeRequests(Arc<std::sync::Mutex<Vec<ModeId>>>);

    impl TraceSink for ModeRequests {
        fn on_refresh_rate_request(&mut self, mode: ModeId) {
            self.0.lock().unwrap().push(mode);
        }
    }

    #[test]
    fn idle_workload_requests_faster_mode() {
        const P120: Duration = Duration(8_333_333);
        let display = StaticDisplay::with_modes(
            vec![DisplayMode::new(ModeId(1), P60), DisplayMode::new(ModeId(2), P120)],
            ModeId(1),
        );
        let handle = display.clone();
        let time = Arc::new(ManualClock::new(HostTime(0)));
        let options = GateOptions {
            driver: TickDriver::Immediate,
            swap_interval_ns: Some(P120),
            ..GateOptions::default()
        };
        let mut gate = FrameGate::with_clock(display, options, time);
        let seen = ModeRequests::default();
        gate.add_trace_sink(Box::new(ModeRequests(seen.0.clone())));

        let mut gpu = CompletedGpu::default();
        let frames = gate.controller().window().capacity() + 2;
        for _ in 0..frames {
            gate.on_pre_swap(&mut gpu);
            gate.on_post_swap(&mut gpu);
        }
        assert_eq!(handle.requests(), vec![ModeId(2)]);
        assert_eq!(*seen.0.lock().unwrap(), vec![ModeId(2)]);
        assert_eq!(gate.controller().settings().refresh_period, P120);
        assert_eq!(gate.swap_interval_ns(), P120);
    }

    #[test]
    fn published_swap_interval_applies_next_frame() {
        let (mut gate, _) = external_gate(StaticDisplay::new(P60));
        let mut gpu = CompletedGpu::default();
        gate.set_swap_interval_ns(P60 * 2).unwrap();
        assert_eq!(gate.swap_interval_ns(), P60);
        for i in 0..4 {
            gate.on_choreographer_tick(HostTime(i));
        }
        gate.on_pre_swap(&mut gpu);
        assert_eq!(gate.swap_interval_ns(), P60 * 2);
        gate.on_post_swap(&mut gpu);
    }

    #[derive(Clone, Default)]
    struct FrameLog {
        waits: Arc<std::sync::Mutex<Vec<PostWaitEvent>>>,
        changes: Arc<std::sync::Mutex<Vec<SwapIntervalChangedEvent>>>,
    }

    impl TraceSink for FrameLog {
        fn on_post_wait(&mut self, e: &PostWaitEvent) {
            self.waits.lock().unwrap().push(*e);
        }

        fn on_swap_interval_changed(&mut self, e: &SwapIntervalChangedEvent) {
            self.changes.lock().unwrap().push(*e);
        }
    }

    #[test]
    fn cpu_bound_loop_settles_at_half_rate() {
        let (mut gate, time) = external_gate(StaticDisplay::new(P60));
        let log = FrameLog::default();
        gate.add_trace_sink(Box::new(log.clone()));

        let mut gpu = CompletedGpu(Duration::from_millis(10));
        let frames = gate.controller().window().capacity() * 3;
        for _ in 0..frames {
            while gate.clock().current_frame() < gate.target_frame {
                gate.on_choreographer_tick(time.now());
            }
            time.advance(Duration::from_millis(30));
            gate.on_pre_swap(&mut gpu);
            gate.on_post_swap(&mut gpu);
        }

        assert_eq!(gate.swap_interval_ns(), P60 * 2);
        assert_eq!(gate.pipeline_mode(), PipelineMode::On);

        let waits = log.waits.lock().unwrap();
        let changes = log.changes.lock().unwrap();
        assert_eq!(waits.len(), frames, "one sample per frame");
        assert!(waits.iter().all(|w| w.cpu_time == Duration::from_millis(30)));
        assert!(waits.iter().all(|w| w.gpu_time == Duration::from_millis(10)));
        assert_eq!(changes.len(), 1);
        assert_eq!((changes[0].old_interval, changes[0].new_interval), (1, 2));
        assert_eq!(changes[0].new_mode, PipelineMode::On);
    }

    #[test]
    fn unbounded_ceiling_keeps_gate_pacing() {
        let (mut gate, time) = external_gate(StaticDisplay::new(P60));
        gate.set_max_auto_swap_interval(Duration(u64::MAX));
        let mut gpu = CompletedGpu::default();
        for _ in 0..3 {
            gate.on_choreographer_tick(time.now());
            gate.on_pre_swap(&mut gpu);
            gate.on_post_swap(&mut gpu);
        }
        assert!(gate.need_presentation_time());
    }

    #[test]
    fn huge_swap_interval_request_does_not_overflow() {
        let (mut gate, _) = external_gate(StaticDisplay::new(P60));
        gate.set_swap_interval_ns(Duration(u64::MAX)).unwrap();
        let mut gpu = CompletedGpu::default();
        // Far beyond the default ceiling, so no ticks are needed.
        gate.on_pre_swap(&mut gpu);
        gate.on_post_swap(&mut gpu);
        assert!(!gate.need_presentation_time());
        assert_eq!(gate.controller().swap_interval(), u32::MAX);
        let stamp = gate.clock().stamp();
        assert_eq!(gate.presentation_time(), stamp.timestamp + P60 * u32::MAX);
    }

    #[test]
    fn swap_duration_is_smoothed_and_capped() {
        let (mut gate, _) = external_gate(StaticDisplay::new(P60));
        gate.update_swap_duration(Duration::from_millis(5));
        assert_eq!(gate.swap_duration, Duration::from_millis(1));
        for _ in 0..50 {
            gate.update_swap_duration(Duration::from_millis(100));
        }
        assert_eq!(gate.swap_duration, P60 / 2);
    }
}
