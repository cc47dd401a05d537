// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame swap-interval and pipeline-mode decision.
//!
//! [`PacingController`] owns the [`DurationWindow`] of recent samples and,
//! once per frame, decides whether the current operating point (swap
//! interval × pipeline mode) still fits the measured workload.
//!
//! # Decision
//!
//! With `P` the refresh period, `N` the swap interval and `H` the hysteresis
//! margin, the bounds for the current operating point are
//!
//! ```text
//!   upper = P·N     − H·upper
//!   lower = P·(N−1) − H·lower
//! ```
//!
//! and, in priority order:
//!
//! 1. the frame misses `upper` under the current mode: slow down (turn
//!    pipelining on if that alone is enough, otherwise grow `N`);
//! 2. the pipelined frame fits under `lower` and `N` is above the caller's
//!    floor: speed up;
//! 3. pipelining is on but a serialized frame clears `upper` by the extra
//!    pipelining margin: turn it off;
//! 4. otherwise nothing changes.
//!
//! Independently, when a supported display mode could give the workload a
//! shorter budget, the [`RefreshRateSelector`] is asked for a mode.
//!
//! Every change clears the window, so no two decisions are ever made from
//! the same samples.

use alloc::vec::Vec;

use crate::frame::{FrameDuration, PipelineMode};
use crate::refresh::{DisplayMode, ModeId, RefreshRateSelector};
use crate::settings::{Hysteresis, PacingConfig, SettingsError, TimingSettings};
use crate::time::Duration;
use crate::trace::SwapIntervalChangedEvent;
use crate::window::{DurationWindow, capacity_for};

/// Remainder a frame time may exceed a whole number of refresh periods by
/// before it is rounded up to the next interval.
pub const REFRESH_RATE_MARGIN: Duration = Duration::from_nanos(500);

/// Refresh period assumed when the display cannot report one (60 Hz).
pub const NOMINAL_REFRESH_PERIOD: Duration = Duration::from_hz(60);

/// Number of refresh periods needed to present a frame that takes
/// `frame_time`.
///
/// Frames shorter than one period need one. Otherwise the quotient is
/// floored, then bumped by one if the remainder exceeds
/// [`REFRESH_RATE_MARGIN`].
#[must_use]
pub fn calculate_swap_interval(frame_time: Duration, refresh_period: Duration) -> u32 {
    if refresh_period.is_zero() || frame_time < refresh_period {
        return 1;
    }
    let quotient = frame_time / refresh_period;
    let remainder = frame_time % refresh_period;
    let interval = quotient + u64::from(remainder > REFRESH_RATE_MARGIN);
    u32::try_from(interval).unwrap_or(u32::MAX)
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Which branch of the controller produced a decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Adjustment {
    /// Nothing changed.
    Unchanged,
    /// The frame missed its budget; pipelining was turned on or the interval
    /// grew.
    SwapSlower,
    /// The frame fits a shorter budget; the interval shrank.
    SwapFaster,
    /// A serialized frame fits; pipelining was turned off.
    PipelineOff,
    /// New display timings were applied.
    Reconfigured,
}

/// Outcome of one controller evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PacingDecision {
    /// Branch taken.
    pub adjustment: Adjustment,
    /// Swap interval after the decision.
    pub swap_interval: u32,
    /// Pipeline mode after the decision.
    pub pipeline_mode: PipelineMode,
    /// Swap interval before the decision.
    pub previous_swap_interval: u32,
    /// Pipeline mode before the decision.
    pub previous_pipeline_mode: PipelineMode,
    /// Display mode to ask the platform for, if any.
    pub mode_request: Option<ModeId>,
}

impl PacingDecision {
    const fn unchanged(swap_interval: u32, pipeline_mode: PipelineMode) -> Self {
        Self {
            adjustment: Adjustment::Unchanged,
            swap_interval,
            pipeline_mode,
            previous_swap_interval: swap_interval,
            previous_pipeline_mode: pipeline_mode,
            mode_request: None,
        }
    }

    /// Returns `true` if the interval or the pipeline mode changed.
    #[must_use]
    pub fn changed(&self) -> bool {
        self.swap_interval != self.previous_swap_interval
            || self.pipeline_mode != self.previous_pipeline_mode
    }

    /// Builds the trace event for this decision at `refresh_period`.
    #[must_use]
    pub fn event(&self, refresh_period: Duration) -> SwapIntervalChangedEvent {
        SwapIntervalChangedEvent {
            old_interval: self.previous_swap_interval,
            new_interval: self.swap_interval,
            old_mode: self.previous_pipeline_mode,
            new_mode: self.pipeline_mode,
            swap_interval_ns: refresh_period * self.swap_interval,
        }
    }
}

// ---------------------------------------------------------------------------
// PacingController
// ---------------------------------------------------------------------------

/// Adaptive swap-interval and pipeline-mode controller.
///
/// The controller is single-threaded: samples go in and decisions come out on
/// the render thread, strictly one after another.
#[derive(Clone, Debug)]
pub struct PacingController {
    settings: TimingSettings,
    config: PacingConfig,
    hysteresis: Hysteresis,
    window: DurationWindow,
    swap_interval: u32,
    pipeline_mode: PipelineMode,
    modes: Vec<DisplayMode>,
    active_mode: Option<ModeId>,
    selector: RefreshRateSelector,
}

impl PacingController {
    /// Creates a controller starting at the caller's requested interval with
    /// pipelining on.
    pub fn new(settings: TimingSettings, config: PacingConfig) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self::from_valid(settings, config))
    }

    /// Creates a controller for a nominal display refreshing every
    /// [`NOMINAL_REFRESH_PERIOD`], for when the real timings are unknown.
    #[must_use]
    pub fn with_nominal_timing(config: PacingConfig) -> Self {
        Self::from_valid(TimingSettings::new(NOMINAL_REFRESH_PERIOD), config)
    }

    fn from_valid(settings: TimingSettings, config: PacingConfig) -> Self {
        Self {
            settings,
            config,
            hysteresis: Hysteresis::default(),
            window: DurationWindow::spanning(config.sample_window, settings.refresh_period),
            swap_interval: calculate_swap_interval(
                settings.swap_interval_ns,
                settings.refresh_period,
            ),
            pipeline_mode: PipelineMode::On,
            modes: Vec::new(),
            active_mode: None,
            selector: RefreshRateSelector::new(),
        }
    }

    /// Replaces the hysteresis margins.
    #[must_use]
    pub fn with_hysteresis(mut self, hysteresis: Hysteresis) -> Self {
        self.hysteresis = hysteresis;
        self
    }

    // -- accessors ---------------------------------------------------------

    /// Current swap interval, in refresh periods.
    #[inline]
    #[must_use]
    pub const fn swap_interval(&self) -> u32 {
        self.swap_interval
    }

    /// Current frame budget (`refresh_period × swap_interval`).
    #[inline]
    #[must_use]
    pub fn swap_interval_ns(&self) -> Duration {
        self.settings.refresh_period * self.swap_interval
    }

    /// Current pipeline mode.
    #[inline]
    #[must_use]
    pub const fn pipeline_mode(&self) -> PipelineMode {
        self.pipeline_mode
    }

    /// Timing snapshot in effect.
    #[must_use]
    pub const fn settings(&self) -> &TimingSettings {
        &self.settings
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &PacingConfig {
        &self.config
    }

    /// Hysteresis in effect.
    #[must_use]
    pub const fn hysteresis(&self) -> &Hysteresis {
        &self.hysteresis
    }

    /// Sample window.
    #[must_use]
    pub const fn window(&self) -> &DurationWindow {
        &self.window
    }

    /// Smallest interval the controller may pick: the caller's request.
    #[must_use]
    pub fn min_swap_interval(&self) -> u32 {
        calculate_swap_interval(self.settings.swap_interval_ns, self.settings.refresh_period)
    }

    /// Largest interval whose budget stays within
    /// [`PacingConfig::max_auto_swap_interval`].
    ///
    /// May be zero when the ceiling is shorter than one refresh period.
    #[must_use]
    pub fn max_swap_interval(&self) -> u32 {
        let ceiling = self.config.max_auto_swap_interval.saturating_add(REFRESH_RATE_MARGIN);
        u32::try_from(ceiling / self.settings.refresh_period).unwrap_or(u32::MAX)
    }

    /// Returns `false` when the current budget is above the ceiling, in
    /// which case the gate stops waiting and lets the loop run unpaced.
    #[must_use]
    pub fn is_paced(&self) -> bool {
        self.swap_interval <= self.max_swap_interval()
    }

    // -- configuration -----------------------------------------------------

    /// Sets the display modes the selector may choose from.
    pub fn set_display_modes(&mut self, modes: Vec<DisplayMode>, active: Option<ModeId>) {
        self.modes = modes;
        self.active_mode = active;
    }

    /// Records which mode the display is running in.
    pub fn set_active_mode(&mut self, active: Option<ModeId>) {
        self.active_mode = active;
    }

    /// Enables or disables automatic swap-interval changes.
    ///
    /// Disabling returns the interval to the caller's request and pins
    /// pipelining on.
    pub fn set_auto_swap_interval(&mut self, enabled: bool) {
        self.config.auto_swap_interval = enabled;
        if !enabled {
            self.swap_interval = self.min_swap_interval();
            self.pipeline_mode = PipelineMode::On;
            self.window.clear();
        }
    }

    /// Enables or disables automatic pipeline-mode changes. Disabling pins
    /// pipelining on.
    pub fn set_auto_pipeline_mode(&mut self, enabled: bool) {
        self.config.auto_pipeline_mode = enabled;
        if !enabled {
            self.pipeline_mode = PipelineMode::On;
        }
    }

    /// Sets the budget ceiling.
    pub fn set_max_auto_swap_interval(&mut self, max: Duration) {
        self.config.max_auto_swap_interval = max;
    }

    /// Sets the GPU wait bound.
    pub fn set_fence_timeout(&mut self, timeout: Duration) {
        self.config.fence_timeout = timeout;
    }

    /// Changes how much history the window covers. Drops all samples.
    pub fn set_sample_window(&mut self, span: Duration) {
        self.config.sample_window = span;
        self.window.reset(capacity_for(span, self.settings.refresh_period));
    }

    /// Replaces the hysteresis margins.
    pub fn set_hysteresis(&mut self, hysteresis: Hysteresis) {
        self.hysteresis = hysteresis;
    }

    /// Applies a new timing snapshot.
    ///
    /// When the refresh period or the requested interval changes, the
    /// interval is recomputed from the request and the window is dropped. If
    /// the controller is not choosing modes on its own, the mode best matching
    /// the request is selected right away.
    pub fn apply_settings(
        &mut self,
        settings: TimingSettings,
    ) -> Result<PacingDecision, SettingsError> {
        settings.validate()?;
        let mut decision = PacingDecision::unchanged(self.swap_interval, self.pipeline_mode);
        let swap_interval =
            calculate_swap_interval(settings.swap_interval_ns, settings.refresh_period);
        let reconfigure = settings.refresh_period != self.settings.refresh_period
            || settings.swap_interval_ns != self.settings.swap_interval_ns
            || swap_interval != self.swap_interval;
        self.settings = settings;
        if !reconfigure {
            return Ok(decision);
        }

        log::debug!(
            "display timings changed: period {:?}, requested {:?}, interval {}",
            settings.refresh_period,
            settings.swap_interval_ns,
            swap_interval
        );
        self.swap_interval = swap_interval;
        let capacity = capacity_for(self.config.sample_window, settings.refresh_period);
        self.window.reset(capacity);
        if !self.config.auto_swap_interval || self.selector.requested().is_none() {
            decision.mode_request =
                self.selector.select(&self.modes, settings.swap_interval_ns, self.active_mode);
        }
        decision.adjustment = Adjustment::Reconfigured;
        decision.swap_interval = self.swap_interval;
        Ok(decision)
    }

    // -- per-frame ---------------------------------------------------------

    /// Records one frame's sample.
    pub fn add_sample(&mut self, sample: FrameDuration) {
        log::trace!("sample {sample:?}");
        self.window.add(sample);
    }

    /// Runs one decision over the current window.
    ///
    /// Makes no decision until the window is full, or at all when automatic
    /// swap intervals are disabled.
    pub fn evaluate(&mut self) -> PacingDecision {
        let mut decision = PacingDecision::unchanged(self.swap_interval, self.pipeline_mode);
        if !self.config.auto_swap_interval || !self.window.has_enough_samples() {
            return decision;
        }

        let average = self.window.average();
        let pipelined = average.effective_time(PipelineMode::On);
        let serialized = average.effective_time(PipelineMode::Off);
        let current = average.effective_time(self.pipeline_mode);

        let period = self.settings.refresh_period;
        let upper = self.hysteresis.upper_bound(period * self.swap_interval);
        let lower = self.hysteresis.lower_bound(period * (self.swap_interval - 1));
        let lower_all_modes = self.hysteresis.lower_bound(self.lower_bound_across_modes());
        let candidate = calculate_swap_interval(pipelined + self.hysteresis.margin, period);

        log::trace!(
            "{average:?} mode={} upper={:?} lower={:?} lower_all={:?} candidate={}",
            self.pipeline_mode.as_str(),
            upper,
            lower,
            lower_all_modes,
            candidate
        );

        decision.adjustment = if current > upper {
            self.swap_slower(&average, upper, candidate)
        } else if self.settings.swap_interval_ns <= period * (self.swap_interval - 1)
            && pipelined < lower
        {
            self.swap_faster(&average, candidate)
        } else if self.pipeline_mode == PipelineMode::On
            && self.pipeline_not_needed(serialized, upper)
        {
            log::debug!("frame fits interval {} serialized, pipelining off", self.swap_interval);
            self.pipeline_mode = PipelineMode::Off;
            Adjustment::PipelineOff
        } else {
            Adjustment::Unchanged
        };

        if !self.modes.is_empty() && pipelined < lower_all_modes {
            let target = pipelined.max(self.settings.swap_interval_ns);
            decision.mode_request = self.selector.select(&self.modes, target, self.active_mode);
        }

        decision.swap_interval = self.swap_interval;
        decision.pipeline_mode = self.pipeline_mode;
        if decision.changed() || decision.mode_request.is_some() {
            self.window.clear();
        }
        decision
    }

    /// Most conservative next-faster budget over all supported modes.
    fn lower_bound_across_modes(&self) -> Duration {
        let period = self.settings.refresh_period;
        let budget = period * self.swap_interval;
        if self.modes.is_empty() {
            return period * (self.swap_interval - 1);
        }
        self.modes
            .iter()
            .filter(|m| !m.period.is_zero())
            .map(|m| m.period * (calculate_swap_interval(budget, m.period) - 1))
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// Clamps an interval to `[min_swap_interval, max(max_swap_interval, min)]`.
    fn clamp_interval(&self, interval: u32) -> u32 {
        let min = self.min_swap_interval();
        let max = self.max_swap_interval().max(min);
        interval.clamp(min, max)
    }

    fn pipeline_not_needed(&self, serialized: Duration, upper: Duration) -> bool {
        self.config.auto_pipeline_mode && serialized < self.hysteresis.pipeline_off_bound(upper)
    }

    /// Pipeline mode for the current interval given `average`.
    fn mode_for_interval(&self, average: &FrameDuration) -> PipelineMode {
        let upper = self
            .hysteresis
            .upper_bound(self.settings.refresh_period * self.swap_interval);
        if self.pipeline_not_needed(average.effective_time(PipelineMode::Off), upper) {
            PipelineMode::Off
        } else {
            PipelineMode::On
        }
    }

    fn swap_slower(
        &mut self,
        average: &FrameDuration,
        upper: Duration,
        candidate: u32,
    ) -> Adjustment {
        if self.pipeline_mode == PipelineMode::Off
            && average.effective_time(PipelineMode::On) <= upper
        {
            log::debug!("frame misses interval {} serialized, pipelining on", self.swap_interval);
            self.pipeline_mode = PipelineMode::On;
            return Adjustment::SwapSlower;
        }

        let previous = (self.swap_interval, self.pipeline_mode);
        let next = candidate.max(self.swap_interval.saturating_add(1));
        self.swap_interval = self.clamp_interval(next);
        self.pipeline_mode = self.mode_for_interval(average);
        if (self.swap_interval, self.pipeline_mode) == previous {
            log::trace!("frame misses interval {} at the ceiling", self.swap_interval);
            return Adjustment::Unchanged;
        }
        log::debug!(
            "swap slower: interval {} -> {}, pipelining {}",
            previous.0,
            self.swap_interval,
            self.pipeline_mode.as_str()
        );
        Adjustment::SwapSlower
    }

    fn swap_faster(&mut self, average: &FrameDuration, candidate: u32) -> Adjustment {
        let previous = self.swap_interval;
        self.swap_interval = self.clamp_interval(candidate.min(self.swap_interval - 1));
        self.pipeline_mode = self.mode_for_interval(average);
        log::debug!(
            "swap faster: interval {} -> {}, pipelining {}",
            previous,
            self.swap_interval,
            self.pipeline_mode.as_str()
        );
        Adjustment::SwapFaster
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const P60: Duration = Duration(16_666_667);

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn controller(settings: TimingSettings) -> PacingController {
        let config = PacingConfig {
            sample_window: P60 * 10,
            ..PacingConfig::default()
        };
        PacingController::new(settings, config).unwrap()
    }

    /// Fills the window with `(cpu, gpu)` and evaluates once.
    fn fill(c: &mut PacingController, cpu: u64, gpu: u64) -> PacingDecision {
        let mut decision = None;
        for _ in 0..c.window().capacity() {
            c.add_sample(FrameDuration::new(ms(cpu), ms(gpu)));
            let d = c.evaluate();
            if d.adjustment != Adjustment::Unchanged || d.mode_request.is_some() {
                return d;
            }
            decision = Some(d);
        }
        decision.unwrap()
    }

    // -- calculate_swap_interval -------------------------------------------

    #[test]
    fn swap_interval_rounding() {
        assert_eq!(calculate_swap_interval(ms(10), P60), 1);
        assert_eq!(calculate_swap_interval(P60, P60), 1);
        assert_eq!(calculate_swap_interval(P60 * 2 + Duration(500), P60), 2);
        assert_eq!(calculate_swap_interval(P60 * 2 + Duration(501), P60), 3);
        assert_eq!(calculate_swap_interval(ms(34), P60), 3);
        assert_eq!(calculate_swap_interval(ms(10), Duration::ZERO), 1);
    }

    proptest! {
        #[test]
        fn short_frames_need_one_interval(period in 1_u64..100_000_000, frac in 0.0_f64..1.0) {
            let t = (period as f64 * frac) as u64;
            prop_assert_eq!(calculate_swap_interval(Duration(t), Duration(period)), 1);
        }

        #[test]
        fn budget_covers_frame_within_margin(period in 1_000_u64..100_000_000, t in 0_u64..1_000_000_000) {
            let interval = calculate_swap_interval(Duration(t), Duration(period));
            prop_assert!(interval >= 1);
            prop_assert!(u64::from(interval) * period + REFRESH_RATE_MARGIN.as_nanos() >= t);
        }
    }

    // -- evaluation gates ----------------------------------------------------

    #[test]
    fn no_decision_before_window_is_full() {
        let mut c = controller(TimingSettings::new(P60));
        for _ in 0..c.window().capacity() - 1 {
            c.add_sample(FrameDuration::new(ms(40), ms(40)));
            assert_eq!(c.evaluate().adjustment, Adjustment::Unchanged);
        }
        assert_eq!(c.swap_interval(), 1);
    }

    #[test]
    fn disabled_auto_mode_never_decides() {
        let mut c = controller(TimingSettings::new(P60));
        c.set_auto_swap_interval(false);
        let d = fill(&mut c, 40, 40);
        assert_eq!(d.adjustment, Adjustment::Unchanged);
        assert_eq!(c.swap_interval(), 1);
        assert_eq!(c.pipeline_mode(), PipelineMode::On);
    }

    // -- branches --------------------------------------------------------------

    #[test]
    fn heavy_cpu_swaps_slower_keeping_pipelining() {
        let mut c = controller(TimingSettings::new(P60));
        let d = fill(&mut c, 30, 10);
        assert_eq!(d.adjustment, Adjustment::SwapSlower);
        assert_eq!((d.previous_swap_interval, d.swap_interval), (1, 2));
        assert_eq!(d.pipeline_mode, PipelineMode::On);
        assert!(c.window().is_empty(), "a change clears the window");
        assert_eq!(c.swap_interval_ns(), P60 * 2);

        assert_eq!(fill(&mut c, 30, 10).adjustment, Adjustment::Unchanged);
    }

    #[test]
    fn light_frames_turn_pipelining_off() {
        let mut c = controller(TimingSettings::new(P60));
        let d = fill(&mut c, 5, 5);
        assert_eq!(d.adjustment, Adjustment::PipelineOff);
        assert_eq!(c.pipeline_mode(), PipelineMode::Off);
        assert_eq!(fill(&mut c, 5, 5).adjustment, Adjustment::Unchanged);
    }

    #[test]
    fn missed_serialized_frame_turns_pipelining_back_on() {
        let mut c = controller(TimingSettings::new(P60));
        fill(&mut c, 5, 5);
        assert_eq!(c.pipeline_mode(), PipelineMode::Off);

        let d = fill(&mut c, 12, 6);
        assert_eq!(d.adjustment, Adjustment::SwapSlower);
        assert_eq!(d.swap_interval, 1, "pipelining alone is enough");
        assert_eq!(d.pipeline_mode, PipelineMode::On);
    }

    #[test]
    fn swap_faster_jumps_to_candidate() {
        let mut c = controller(TimingSettings::new(P60));
        fill(&mut c, 40, 40);
        assert_eq!(c.swap_interval(), 3);

        let d = fill(&mut c, 10, 10);
        assert_eq!(d.adjustment, Adjustment::SwapFaster);
        assert_eq!((d.previous_swap_interval, d.swap_interval), (3, 1));
        assert_eq!(d.pipeline_mode, PipelineMode::On);
    }

    #[test]
    fn swap_slower_may_drop_pipelining_under_new_budget() {
        let mut c = controller(TimingSettings::new(P60));
        // 17ms misses one period even pipelined. At two periods the 18ms
        // serialized frame fits with room to spare.
        let d = fill(&mut c, 17, 1);
        assert_eq!(d.adjustment, Adjustment::SwapSlower);
        assert_eq!(d.swap_interval, 2);
        assert_eq!(d.pipeline_mode, PipelineMode::Off);
    }

    #[test]
    fn caller_floor_is_respected() {
        let settings = TimingSettings::new(P60).with_swap_interval(P60 * 2);
        let mut c = controller(settings);
        assert_eq!(c.swap_interval(), 2);
        for _ in 0..3 {
            let d = fill(&mut c, 2, 2);
            assert_ne!(d.adjustment, Adjustment::SwapFaster);
        }
        assert_eq!(c.swap_interval(), 2);
    }

    #[test]
    fn ceiling_stops_growth() {
        let mut c = controller(TimingSettings::new(P60));
        c.set_max_auto_swap_interval(ms(35));
        assert_eq!(c.max_swap_interval(), 2);
        fill(&mut c, 60, 60);
        assert_eq!(c.swap_interval(), 2);
        assert_eq!(fill(&mut c, 60, 60).adjustment, Adjustment::Unchanged);
        assert!(c.is_paced());
    }

    #[test]
    fn floor_above_ceiling_is_unpaced() {
        let settings = TimingSettings::new(P60).with_swap_interval(ms(66));
        let c = controller(settings);
        assert_eq!(c.swap_interval(), 4);
        assert_eq!(c.max_swap_interval(), 3);
        assert!(!c.is_paced());
    }

    #[test]
    fn disabled_auto_pipeline_pins_pipelining_on() {
        let mut c = controller(TimingSettings::new(P60));
        c.set_auto_pipeline_mode(false);
        let d = fill(&mut c, 5, 5);
        assert_eq!(d.adjustment, Adjustment::Unchanged);
        let d = fill(&mut c, 17, 1);
        assert_eq!(d.pipeline_mode, PipelineMode::On);
    }

    #[test]
    fn hysteresis_holds_just_below_upper_bound() {
        let mut c = controller(TimingSettings::new(P60));
        let upper = c.hysteresis().upper_bound(P60);
        let just_below = FrameDuration::new(upper - Duration(1), ms(2));
        for _ in 0..c.window().capacity() * 20 {
            c.add_sample(just_below);
            assert_eq!(c.evaluate().adjustment, Adjustment::Unchanged);
        }
        assert_eq!(c.swap_interval(), 1);
        assert_eq!(c.pipeline_mode(), PipelineMode::On);
    }

    #[test]
    fn wider_hysteresis_delays_pipelining_off() {
        let mut c = controller(TimingSettings::new(P60)).with_hysteresis(Hysteresis {
            pipeline_off: 6,
            ..Hysteresis::default()
        });
        // 10ms serialized clears the default margin but not a 6ms one.
        assert_eq!(fill(&mut c, 5, 5).adjustment, Adjustment::Unchanged);
    }

    // -- refresh rate ----------------------------------------------------------

    #[test]
    fn light_frames_request_faster_mode() {
        let settings = TimingSettings::new(P60).with_swap_interval(ms(8));
        let mut c = controller(settings);
        c.set_display_modes(
            alloc::vec![
                DisplayMode::new(ModeId(1), P60),
                DisplayMode::new(ModeId(2), Duration(8_333_333)),
            ],
            Some(ModeId(1)),
        );
        let d = fill(&mut c, 4, 4);
        assert_eq!(d.mode_request, Some(ModeId(2)));
        assert!(c.window().is_empty());
    }

    #[test]
    fn no_mode_request_without_modes() {
        let settings = TimingSettings::new(P60).with_swap_interval(ms(8));
        let mut c = controller(settings);
        let d = fill(&mut c, 4, 4);
        assert_eq!(d.mode_request, None);
    }

    // -- reconfiguration -------------------------------------------------------

    #[test]
    fn new_request_resets_interval_and_window() {
        let mut c = controller(TimingSettings::new(P60));
        c.add_sample(FrameDuration::new(ms(1), ms(1)));
        let d = c
            .apply_settings(TimingSettings::new(P60).with_swap_interval(P60 * 2))
            .unwrap();
        assert_eq!(d.adjustment, Adjustment::Reconfigured);
        assert_eq!(d.swap_interval, 2);
        assert!(c.window().is_empty());

        let same = c
            .apply_settings(TimingSettings::new(P60).with_swap_interval(P60 * 2))
            .unwrap();
        assert_eq!(same.adjustment, Adjustment::Unchanged);
    }

    #[test]
    fn refresh_change_resizes_window() {
        let mut c = controller(TimingSettings::new(P60));
        let before = c.window().capacity();
        c.apply_settings(TimingSettings::new(Duration(8_333_333))).unwrap();
        assert_eq!(c.window().capacity(), capacity_for(P60 * 10, Duration(8_333_333)));
        assert!(c.window().capacity() > before);
    }

    #[test]
    fn zero_period_is_rejected() {
        assert_eq!(
            PacingController::new(TimingSettings::new(Duration::ZERO), PacingConfig::default())
                .unwrap_err(),
            SettingsError::ZeroRefreshPeriod
        );
        let mut c = controller(TimingSettings::new(P60));
        assert!(c.apply_settings(TimingSettings::new(Duration::ZERO)).is_err());
        assert_eq!(c.settings().refresh_period, P60);
    }

    #[test]
    fn nominal_timing_is_60hz_at_one_interval() {
        let c = PacingController::with_nominal_timing(PacingConfig::default());
        assert_eq!(c.settings().refresh_period, NOMINAL_REFRESH_PERIOD);
        assert_eq!(c.swap_interval(), 1);
        assert!(c.is_paced());
    }

    #[test]
    fn unbounded_ceiling_keeps_pacing() {
        let mut c = controller(TimingSettings::new(P60));
        c.set_max_auto_swap_interval(Duration(u64::MAX));
        assert_eq!(c.max_swap_interval(), u32::MAX);
        assert!(c.is_paced());
        let d = fill(&mut c, 30, 10);
        assert_eq!(d.swap_interval, 2);
    }

    #[test]
    fn huge_request_stays_at_largest_interval() {
        let mut c = controller(TimingSettings::new(P60).with_swap_interval(Duration(u64::MAX)));
        c.set_max_auto_swap_interval(Duration(u64::MAX));
        assert_eq!(c.swap_interval(), u32::MAX);

        let d = fill(&mut c, 100_000_000_000, 1);
        assert_eq!(d.adjustment, Adjustment::Unchanged);
        assert_eq!(c.swap_interval(), u32::MAX);
    }

    #[test]
    fn decision_event_reports_budget() {
        let mut c = controller(TimingSettings::new(P60));
        let d = fill(&mut c, 30, 10);
        let e = d.event(P60);
        assert_eq!((e.old_interval, e.new_interval), (1, 2));
        assert_eq!(e.swap_interval_ns, P60 * 2);
    }
}
