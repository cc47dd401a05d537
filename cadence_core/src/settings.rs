// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display timing snapshots and pacing configuration.
//!
//! [`TimingSettings`] is what the display reports (plus the caller's
//! requested swap interval). It is an immutable value; a reconfiguration
//! produces a whole new snapshot.
//!
//! [`PacingConfig`] and [`Hysteresis`] are the tunables of the decision
//! algorithm. Their defaults are the values the pacer has been tuned with.

use core::fmt;

use crate::time::Duration;

// ---------------------------------------------------------------------------
// TimingSettings
// ---------------------------------------------------------------------------

/// A snapshot of the display's timing and the caller's requested cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimingSettings {
    /// Duration of one vsync period.
    pub refresh_period: Duration,
    /// Frame time the caller asked for. Acts as a floor on every automatic
    /// swap-interval decision.
    pub swap_interval_ns: Duration,
    /// Offset between hardware vsync and the app's vsync callback.
    pub app_vsync_offset: Duration,
    /// Offset between hardware vsync and the compositor's latch point.
    pub sf_vsync_offset: Duration,
}

impl TimingSettings {
    /// Creates settings for a display with the given refresh period, asking
    /// for one frame per refresh and no compositor offsets.
    #[must_use]
    pub const fn new(refresh_period: Duration) -> Self {
        Self {
            refresh_period,
            swap_interval_ns: refresh_period,
            app_vsync_offset: Duration::ZERO,
            sf_vsync_offset: Duration::ZERO,
        }
    }

    /// Returns a copy with a different requested swap interval.
    #[must_use]
    pub const fn with_swap_interval(mut self, swap_interval_ns: Duration) -> Self {
        self.swap_interval_ns = swap_interval_ns;
        self
    }

    /// Returns a copy with the given vsync offsets.
    #[must_use]
    pub const fn with_vsync_offsets(mut self, app: Duration, sf: Duration) -> Self {
        self.app_vsync_offset = app;
        self.sf_vsync_offset = sf;
        self
    }

    /// How long after a vsync the compositor latches, relative to the app's
    /// own callback.
    #[must_use]
    pub const fn wake_offset(&self) -> Duration {
        self.sf_vsync_offset.saturating_sub(self.app_vsync_offset)
    }

    /// Checks that the snapshot can drive the controller.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.refresh_period.is_zero() {
            return Err(SettingsError::ZeroRefreshPeriod);
        }
        Ok(())
    }
}

/// A [`TimingSettings`] snapshot that cannot be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsError {
    /// The display reported a zero refresh period.
    ZeroRefreshPeriod,
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroRefreshPeriod => f.write_str("display reported a zero refresh period"),
        }
    }
}

impl core::error::Error for SettingsError {}

// ---------------------------------------------------------------------------
// PacingConfig
// ---------------------------------------------------------------------------

/// Caller-tunable behavior of the pacer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PacingConfig {
    /// Let the controller change the swap interval. When off, the interval
    /// stays at whatever the caller requested and pipelining is pinned on.
    pub auto_swap_interval: bool,
    /// Let the controller turn pipelining off when a frame fits without it.
    pub auto_pipeline_mode: bool,
    /// Longest the gate waits for the previous frame's GPU work.
    pub fence_timeout: Duration,
    /// Largest frame budget the controller will slow down to. Beyond it the
    /// pacer stops waiting and the render loop runs unpaced.
    pub max_auto_swap_interval: Duration,
    /// How much history the sample window covers.
    pub sample_window: Duration,
}

impl PacingConfig {
    /// Default GPU wait bound.
    pub const DEFAULT_FENCE_TIMEOUT: Duration = Duration::from_millis(50);
    /// Default budget ceiling (20 frames per second).
    pub const DEFAULT_MAX_AUTO_SWAP_INTERVAL: Duration = Duration::from_millis(50);
    /// Default sample window span.
    pub const DEFAULT_SAMPLE_WINDOW: Duration = Duration::from_secs(2);
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            auto_swap_interval: true,
            auto_pipeline_mode: true,
            fence_timeout: Self::DEFAULT_FENCE_TIMEOUT,
            max_auto_swap_interval: Self::DEFAULT_MAX_AUTO_SWAP_INTERVAL,
            sample_window: Self::DEFAULT_SAMPLE_WINDOW,
        }
    }
}

// ---------------------------------------------------------------------------
// Hysteresis
// ---------------------------------------------------------------------------

/// Margins that keep the controller from flapping at a boundary.
///
/// Each bound is pulled in by `margin * multiple`. The defaults make speeding
/// up harder than slowing down, and turning pipelining off harder still.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Hysteresis {
    /// Base margin.
    pub margin: Duration,
    /// Multiple of `margin` subtracted from the current budget.
    pub upper: u32,
    /// Multiple of `margin` subtracted from the next-faster budget.
    pub lower: u32,
    /// Extra multiple of `margin` a serialized frame must clear below the
    /// upper bound before pipelining is turned off.
    pub pipeline_off: u32,
}

impl Hysteresis {
    /// Default base margin.
    pub const DEFAULT_MARGIN: Duration = Duration::from_millis(1);

    /// Upper bound for a budget of `budget`.
    #[inline]
    #[must_use]
    pub const fn upper_bound(&self, budget: Duration) -> Duration {
        budget.saturating_sub(self.margin.saturating_mul(self.upper))
    }

    /// Lower bound for a next-faster budget of `budget`.
    #[inline]
    #[must_use]
    pub const fn lower_bound(&self, budget: Duration) -> Duration {
        budget.saturating_sub(self.margin.saturating_mul(self.lower))
    }

    /// Threshold a serialized frame time must stay under, given an upper
    /// bound, for pipelining to be unnecessary.
    #[inline]
    #[must_use]
    pub const fn pipeline_off_bound(&self, upper_bound: Duration) -> Duration {
        upper_bound.saturating_sub(self.margin.saturating_mul(self.pipeline_off))
    }
}

impl Default for Hysteresis {
    fn default() -> Self {
        Self {
            margin: Self::DEFAULT_MARGIN,
            upper: 1,
            lower: 2,
            pipeline_off: 2,
        }
    }
}
