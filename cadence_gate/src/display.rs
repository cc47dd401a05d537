// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The platform seam: display timings and refresh-rate modes.

use std::sync::{Arc, Mutex, PoisonError};

use cadence_core::refresh::{DisplayMode, ModeId};
use cadence_core::settings::TimingSettings;
use cadence_core::time::Duration;

/// Failure to query or configure the display.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DisplayError {
    /// The platform could not report display timings.
    #[error("display timings unavailable: {0}")]
    Unavailable(String),
    /// The requested mode is not one the display supports.
    #[error("display mode {0:?} is not supported")]
    UnsupportedMode(ModeId),
}

/// Timings the platform reports for the active display mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayTimings {
    /// Duration of one vsync period.
    pub refresh_period: Duration,
    /// Offset between hardware vsync and the app's vsync callback.
    pub app_vsync_offset: Duration,
    /// Offset between hardware vsync and the compositor's latch point.
    pub sf_vsync_offset: Duration,
}

impl DisplayTimings {
    /// Timings for `refresh_period` with no compositor offsets.
    #[must_use]
    pub const fn new(refresh_period: Duration) -> Self {
        Self {
            refresh_period,
            app_vsync_offset: Duration::ZERO,
            sf_vsync_offset: Duration::ZERO,
        }
    }

    /// A settings snapshot for these timings that requests `swap_interval_ns`.
    #[must_use]
    pub const fn to_settings(&self, swap_interval_ns: Duration) -> TimingSettings {
        TimingSettings::new(self.refresh_period)
            .with_swap_interval(swap_interval_ns)
            .with_vsync_offsets(self.app_vsync_offset, self.sf_vsync_offset)
    }
}

/// What the gate needs from the platform's display.
///
/// Only [`display_timings`](Self::display_timings) is required. Displays
/// with a single refresh rate can leave the mode methods at their defaults.
pub trait DisplayBackend: Send {
    /// Queries the active mode's timings.
    fn display_timings(&mut self) -> Result<DisplayTimings, DisplayError>;

    /// Refresh rates the display can switch between.
    fn supported_modes(&mut self) -> Vec<DisplayMode> {
        Vec::new()
    }

    /// The mode currently active, if the platform can tell.
    fn active_mode(&mut self) -> Option<ModeId> {
        None
    }

    /// Asks the platform to switch to `mode`.
    fn set_preferred_mode(&mut self, mode: ModeId) -> Result<(), DisplayError> {
        Err(DisplayError::UnsupportedMode(mode))
    }
}

impl<T: DisplayBackend + ?Sized> DisplayBackend for Box<T> {
    fn display_timings(&mut self) -> Result<DisplayTimings, DisplayError> {
        (**self).display_timings()
    }

    fn supported_modes(&mut self) -> Vec<DisplayMode> {
        (**self).supported_modes()
    }

    fn active_mode(&mut self) -> Option<ModeId> {
        (**self).active_mode()
    }

    fn set_preferred_mode(&mut self, mode: ModeId) -> Result<(), DisplayError> {
        (**self).set_preferred_mode(mode)
    }
}

// ---------------------------------------------------------------------------
// StaticDisplay
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct StaticState {
    modes: Vec<DisplayMode>,
    active: ModeId,
    timings: DisplayTimings,
    requests: Vec<ModeId>,
}

/// An in-process [`DisplayBackend`] with a fixed list of modes.
///
/// Switching mode takes effect immediately. Cloning shares the state, so a
/// test can keep a handle to inspect the requests a gate made.
#[derive(Clone, Debug)]
pub struct StaticDisplay {
    state: Arc<Mutex<StaticState>>,
}

impl StaticDisplay {
    /// A single-mode display with the given refresh period.
    #[must_use]
    pub fn new(refresh_period: Duration) -> Self {
        Self::with_modes(vec![DisplayMode::new(ModeId(0), refresh_period)], ModeId(0))
    }

    /// A display supporting `modes`, currently running `active`.
    ///
    /// If `active` is not among `modes`, the first mode is used.
    #[must_use]
    pub fn with_modes(modes: Vec<DisplayMode>, active: ModeId) -> Self {
        let current = modes
            .iter()
            .find(|m| m.id == active)
            .or_else(|| modes.first())
            .copied()
            .unwrap_or(DisplayMode::new(active, Duration::ZERO));
        Self {
            state: Arc::new(Mutex::new(StaticState {
                modes,
                active: current.id,
                timings: DisplayTimings::new(current.period),
                requests: Vec::new(),
            })),
        }
    }

    /// Sets the vsync offsets reported alongside the refresh period.
    #[must_use]
    pub fn with_vsync_offsets(self, app: Duration, sf: Duration) -> Self {
        {
            let mut s = self.lock();
            s.timings.app_vsync_offset = app;
            s.timings.sf_vsync_offset = sf;
        }
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StaticState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every mode switch requested so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<ModeId> {
        self.lock().requests.clone()
    }
}

impl DisplayBackend for StaticDisplay {
    fn display_timings(&mut self) -> Result<DisplayTimings, DisplayError> {
        let s = self.lock();
        if s.timings.refresh_period.is_zero() {
            return Err(DisplayError::Unavailable("no display mode".into()));
        }
        Ok(s.timings)
    }

    fn supported_modes(&mut self) -> Vec<DisplayMode> {
        self.lock().modes.clone()
    }

    fn active_mode(&mut self) -> Option<ModeId> {
        Some(self.lock().active)
    }

    fn set_preferred_mode(&mut self, mode: ModeId) -> Result<(), DisplayError> {
        let mut s = self.lock();
        let Some(m) = s.modes.iter().find(|m| m.id == mode).copied() else {
            return Err(DisplayError::UnsupportedMode(mode));
        };
        s.requests.push(mode);
        s.active = m.id;
        s.timings.refresh_period = m.period;
        Ok(())
    }
}

/// A [`DisplayBackend`] whose timing query always fails.
#[derive(Clone, Debug, Default)]
pub struct UnavailableDisplay;

impl DisplayBackend for UnavailableDisplay {
    fn display_timings(&mut self) -> Result<DisplayTimings, DisplayError> {
        Err(DisplayError::Unavailable("no display connected".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P60: Duration = Duration(16_666_667);
    const P120: Duration = Duration(8_333_333);

    #[test]
    fn switch_changes_reported_period() {
        let mut d = StaticDisplay::with_modes(
            vec![DisplayMode::new(ModeId(1), P60), DisplayMode::new(ModeId(2), P120)],
            ModeId(1),
        );
        let handle = d.clone();
        assert_eq!(d.display_timings().unwrap().refresh_period, P60);
        d.set_preferred_mode(ModeId(2)).unwrap();
        assert_eq!(d.display_timings().unwrap().refresh_period, P120);
        assert_eq!(d.active_mode(), Some(ModeId(2)));
        assert_eq!(handle.requests(), vec![ModeId(2)]);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let mut d = StaticDisplay::new(P60);
        assert_eq!(
            d.set_preferred_mode(ModeId(9)),
            Err(DisplayError::UnsupportedMode(ModeId(9)))
        );
        assert!(d.requests().is_empty());
    }

    #[test]
    fn offsets_reach_settings() {
        let mut d = StaticDisplay::new(P60)
            .with_vsync_offsets(Duration::from_millis(1), Duration::from_millis(4));
        let s = d.display_timings().unwrap().to_settings(P60 * 2);
        assert_eq!(s.swap_interval_ns, P60 * 2);
        assert_eq!(s.wake_offset(), Duration::from_millis(3));
    }

    #[test]
    fn unavailable_display_reports_error() {
        let err = UnavailableDisplay.display_timings().unwrap_err();
        assert!(err.to_string().contains("unavailable"));
    }
}
