// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scripted per-frame CPU/GPU cost over time.

use alloc::vec::Vec;

use cadence_core::frame::FrameDuration;
use cadence_core::time::Duration;

/// A piecewise-constant frame cost.
///
/// Each step holds from its start time until the next step starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Workload {
    steps: Vec<(Duration, FrameDuration)>,
}

impl Workload {
    /// A workload that costs `cpu` and `gpu` every frame.
    #[must_use]
    pub fn constant(cpu: Duration, gpu: Duration) -> Self {
        Self {
            steps: alloc::vec![(Duration::ZERO, FrameDuration::new(cpu, gpu))],
        }
    }

    /// Switches to `cpu` and `gpu` from `at` onwards.
    ///
    /// Steps must be added in increasing time order; a step at or before the
    /// previous one replaces it.
    #[must_use]
    pub fn then_at(mut self, at: Duration, cpu: Duration, gpu: Duration) -> Self {
        while self.steps.last().is_some_and(|(start, _)| *start >= at) {
            self.steps.pop();
        }
        self.steps.push((at, FrameDuration::new(cpu, gpu)));
        self
    }

    /// Cost of a frame starting at `t`.
    #[must_use]
    pub fn at(&self, t: Duration) -> FrameDuration {
        self.steps
            .iter()
            .rev()
            .find(|(start, _)| *start <= t)
            .or(self.steps.first())
            .map_or_else(FrameDuration::default, |(_, cost)| *cost)
    }

    /// Start times of every step after the first.
    pub fn step_times(&self) -> impl Iterator<Item = Duration> + '_ {
        self.steps.iter().skip(1).map(|(start, _)| *start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn steps_hold_until_next() {
        let w = Workload::constant(ms(10), ms(10))
            .then_at(ms(2_000), ms(40), ms(40))
            .then_at(ms(4_000), ms(10), ms(5));
        assert_eq!(w.at(ms(0)).cpu(), ms(10));
        assert_eq!(w.at(ms(1_999)).gpu(), ms(10));
        assert_eq!(w.at(ms(2_000)).gpu(), ms(40));
        assert_eq!(w.at(ms(9_000)).gpu(), ms(5));
        assert_eq!(w.step_times().collect::<Vec<_>>(), [ms(2_000), ms(4_000)]);
    }

    #[test]
    fn out_of_order_step_replaces_later_ones() {
        let w = Workload::constant(ms(1), ms(1))
            .then_at(ms(50), ms(2), ms(2))
            .then_at(ms(20), ms(3), ms(3));
        assert_eq!(w.at(ms(60)).cpu(), ms(3));
        assert_eq!(w.step_times().count(), 1);
    }
}
