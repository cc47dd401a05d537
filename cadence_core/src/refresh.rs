// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Display mode selection for panels that support several refresh rates.

use crate::controller::calculate_swap_interval;
use crate::time::Duration;

/// Platform identifier of a display mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeId(pub i32);

/// A refresh rate the display can be switched to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayMode {
    /// Platform mode identifier.
    pub id: ModeId,
    /// Vsync period in this mode.
    pub period: Duration,
}

impl DisplayMode {
    /// Creates a mode.
    #[must_use]
    pub const fn new(id: ModeId, period: Duration) -> Self {
        Self { id, period }
    }

    /// Presentation budget this mode gives a frame that takes `frame_time`.
    #[must_use]
    pub fn budget_for(&self, frame_time: Duration) -> Duration {
        self.period * calculate_swap_interval(frame_time, self.period)
    }
}

/// A switch is only worth it if it shortens the budget by more than this.
pub const MODE_SWITCH_MARGIN: Duration = Duration::from_millis(1);

/// Picks the mode whose budget for `target` is smallest.
///
/// Ties go to `active`. Returns `None` when the best mode is `active`, or when
/// it improves on `active` by no more than [`MODE_SWITCH_MARGIN`]. When
/// `active` is unknown, or not among `modes`, the best mode is always
/// returned.
#[must_use]
pub fn pick_best_mode(
    modes: &[DisplayMode],
    target: Duration,
    active: Option<ModeId>,
) -> Option<ModeId> {
    let mut best: Option<(DisplayMode, Duration)> = None;
    for mode in modes.iter().filter(|m| !m.period.is_zero()) {
        let budget = mode.budget_for(target);
        let better = match best {
            None => true,
            Some((best_mode, best_budget)) => {
                budget < best_budget
                    || (budget == best_budget
                        && Some(mode.id) == active
                        && Some(best_mode.id) != active)
            }
        };
        if better {
            best = Some((*mode, budget));
        }
    }
    let (best_mode, best_budget) = best?;

    let Some(active_mode) = active.and_then(|id| modes.iter().find(|m| m.id == id)) else {
        return Some(best_mode.id);
    };
    if best_mode.id == active_mode.id {
        return None;
    }
    let active_budget = active_mode.budget_for(target);
    if active_budget.saturating_sub(best_budget) <= MODE_SWITCH_MARGIN {
        return None;
    }
    Some(best_mode.id)
}

/// Stateful wrapper around [`pick_best_mode`] that never asks for the same
/// mode twice in a row.
#[derive(Clone, Debug, Default)]
pub struct RefreshRateSelector {
    requested: Option<ModeId>,
}

impl RefreshRateSelector {
    /// Creates a selector that has not requested anything yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { requested: None }
    }

    /// Mode most recently requested, if any.
    #[must_use]
    pub const fn requested(&self) -> Option<ModeId> {
        self.requested
    }

    /// Returns a mode to request for `target`, or `None` if nothing should
    /// change.
    ///
    /// `active` is the mode the display currently runs in; when unknown, the
    /// last requested mode stands in for it.
    pub fn select(
        &mut self,
        modes: &[DisplayMode],
        target: Duration,
        active: Option<ModeId>,
    ) -> Option<ModeId> {
        let active = active.or(self.requested);
        let id = pick_best_mode(modes, target, active)?;
        if self.requested == Some(id) {
            return None;
        }
        log::debug!("requesting display mode {} for {:?} frames", id.0, target);
        self.requested = Some(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HZ60: ModeId = ModeId(1);
    const HZ90: ModeId = ModeId(2);
    const HZ120: ModeId = ModeId(3);

    fn modes() -> [DisplayMode; 3] {
        [
            DisplayMode::new(HZ60, Duration(16_666_667)),
            DisplayMode::new(HZ90, Duration(11_111_111)),
            DisplayMode::new(HZ120, Duration(8_333_333)),
        ]
    }

    #[test]
    fn fastest_mode_wins_for_light_frames() {
        let target = Duration::from_millis(5);
        assert_eq!(pick_best_mode(&modes(), target, None), Some(HZ120));
        assert_eq!(pick_best_mode(&modes(), target, Some(HZ60)), Some(HZ120));
        assert_eq!(pick_best_mode(&modes(), target, Some(HZ120)), None);
    }

    #[test]
    fn cadence_matching_mode_wins() {
        // 11ms frames: 60Hz -> 16.7ms, 90Hz -> 11.1ms, 120Hz -> 16.7ms.
        let target = Duration::from_millis(11);
        assert_eq!(pick_best_mode(&modes(), target, Some(HZ60)), Some(HZ90));
    }

    #[test]
    fn ties_prefer_active_mode() {
        // 15ms frames get a 20ms budget in both modes.
        let modes = [
            DisplayMode::new(ModeId(10), Duration::from_millis(10)),
            DisplayMode::new(ModeId(20), Duration::from_millis(20)),
        ];
        let target = Duration::from_millis(15);
        assert_eq!(pick_best_mode(&modes, target, Some(ModeId(10))), None);
        assert_eq!(pick_best_mode(&modes, target, Some(ModeId(20))), None);
        assert_eq!(pick_best_mode(&modes, target, None), Some(ModeId(10)));
    }

    #[test]
    fn near_ties_do_not_switch() {
        // 14ms frames: 60Hz and 120Hz both give ~16.7ms, 90Hz gives 22.2ms.
        let target = Duration::from_millis(14);
        assert_eq!(pick_best_mode(&modes(), target, Some(HZ60)), None);
        assert_eq!(pick_best_mode(&modes(), target, Some(HZ120)), None);
        assert_eq!(pick_best_mode(&modes(), target, Some(HZ90)), Some(HZ120));
    }

    #[test]
    fn small_improvements_are_ignored() {
        let modes = [
            DisplayMode::new(ModeId(10), Duration::from_micros(16_500)),
            DisplayMode::new(ModeId(11), Duration::from_micros(16_000)),
        ];
        let target = Duration::from_millis(15);
        assert_eq!(pick_best_mode(&modes, target, Some(ModeId(10))), None);
    }

    #[test]
    fn empty_modes_yield_nothing() {
        assert_eq!(pick_best_mode(&[], Duration::from_millis(5), None), None);
    }

    #[test]
    fn selector_deduplicates_requests() {
        let mut s = RefreshRateSelector::new();
        let target = Duration::from_millis(5);
        assert_eq!(s.select(&modes(), target, Some(HZ60)), Some(HZ120));
        assert_eq!(s.requested(), Some(HZ120));
        assert_eq!(s.select(&modes(), target, Some(HZ60)), None);
        assert_eq!(s.select(&modes(), target, None), None);
    }
}
