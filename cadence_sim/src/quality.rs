// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cadence metrics and grading for presented frames.

use alloc::string::String;

/// Presentation intervals that differ from the frame budget by more than this
/// many milliseconds count as janky.
pub const JANK_TOLERANCE_MS: f64 = 1.0;

/// Per-frame sample fed into [`PacingTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct PacingSample {
    /// Time since the previous presentation, in ms.
    pub frame_delta_ms: f64,
    /// Budget the pacer had set for this frame, in ms.
    pub budget_ms: f64,
}

/// Letter grade for cadence quality.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacingGrade {
    /// Steady cadence.
    A,
    /// Occasional jank.
    B,
    /// Frequent jank.
    C,
    /// No usable cadence.
    D,
}

impl PacingGrade {
    /// Returns a short label for reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

/// Aggregated report returned by [`PacingTracker::observe`].
#[derive(Clone, Copy, Debug)]
pub struct PacingReport {
    /// Current grade.
    pub grade: PacingGrade,
    /// Janky frames per 1000 observed frames.
    pub jank_per_1000: f64,
    /// Frames per second over the tracker's history.
    pub fps: f64,
    /// Total frames observed.
    pub total_frames: u64,
    /// Total janky frames observed.
    pub janky_frames: u64,
}

/// Rolling cadence tracker with a fixed-size frame-delta history.
#[derive(Debug)]
pub struct PacingTracker<const N: usize> {
    deltas_ms: [f64; N],
    cursor: usize,
    total_frames: u64,
    janky_frames: u64,
}

impl<const N: usize> Default for PacingTracker<N> {
    fn default() -> Self {
        Self::new(16.67)
    }
}

impl<const N: usize> PacingTracker<N> {
    /// Creates a tracker with `seed_delta_ms` prefilled in the ring buffer.
    #[must_use]
    pub const fn new(seed_delta_ms: f64) -> Self {
        Self {
            deltas_ms: [seed_delta_ms; N],
            cursor: 0,
            total_frames: 0,
            janky_frames: 0,
        }
    }

    /// Observes one frame and returns an updated report.
    pub fn observe(&mut self, sample: PacingSample) -> PacingReport {
        self.total_frames = self.total_frames.saturating_add(1);
        self.deltas_ms[self.cursor % N] = sample.frame_delta_ms;
        self.cursor = (self.cursor + 1) % N;

        if (sample.frame_delta_ms - sample.budget_ms).abs() > JANK_TOLERANCE_MS {
            self.janky_frames = self.janky_frames.saturating_add(1);
        }
        self.report()
    }

    /// Report for the frames observed so far.
    #[must_use]
    pub fn report(&self) -> PacingReport {
        let jank_rate = if self.total_frames == 0 {
            0.0
        } else {
            self.janky_frames as f64 * 1000.0 / self.total_frames as f64
        };
        let total_ms: f64 = self.deltas_ms.iter().sum();
        let fps = if total_ms > 0.0 {
            N as f64 * 1000.0 / total_ms
        } else {
            0.0
        };

        PacingReport {
            grade: grade_for(jank_rate),
            jank_per_1000: jank_rate,
            fps,
            total_frames: self.total_frames,
            janky_frames: self.janky_frames,
        }
    }

    /// Returns ring-buffer frame deltas oldest→newest.
    #[must_use]
    pub fn frame_deltas(&self) -> [f64; N] {
        let mut out = [0.0; N];
        let mut i = 0;
        while i < N {
            let idx = (self.cursor + i) % N;
            out[i] = self.deltas_ms[idx];
            i += 1;
        }
        out
    }

    /// Returns an ASCII sparkline over `frame_deltas()`.
    #[must_use]
    pub fn sparkline_ascii(&self, min_ms: f64, max_ms: f64) -> String {
        const LEVELS: &[u8] = b" .:-=+*#%@";
        let mut out = String::with_capacity(N);
        for v in self.frame_deltas() {
            let t = (v.clamp(min_ms, max_ms) - min_ms) / (max_ms - min_ms);
            #[expect(
                clippy::cast_possible_truncation,
                reason = "index is clamped to ASCII level count"
            )]
            let level = (t * (LEVELS.len() as f64 - 1.0) + 0.5) as usize;
            out.push(LEVELS[level] as char);
        }
        out
    }
}

fn grade_for(jank_per_1000: f64) -> PacingGrade {
    if jank_per_1000 < 5.0 {
        PacingGrade::A
    } else if jank_per_1000 < 20.0 {
        PacingGrade::B
    } else if jank_per_1000 < 50.0 {
        PacingGrade::C
    } else {
        PacingGrade::D
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(delta: f64, budget: f64) -> PacingSample {
        PacingSample {
            frame_delta_ms: delta,
            budget_ms: budget,
        }
    }

    #[test]
    fn jank_rate_accumulates() {
        let mut t = PacingTracker::<8>::new(16.67);
        let mut report = t.report();
        for i in 0..10 {
            let delta = if i < 2 { 33.3 } else { 16.7 };
            report = t.observe(sample(delta, 16.67));
        }
        assert!((report.jank_per_1000 - 200.0).abs() < 1e-6);
        assert_eq!(report.janky_frames, 2);
        assert_eq!(report.grade, PacingGrade::D);
    }

    #[test]
    fn steady_cadence_grades_a() {
        let mut t = PacingTracker::<4>::default();
        for _ in 0..100 {
            t.observe(sample(33.33, 33.33));
        }
        let r = t.report();
        assert_eq!(r.grade, PacingGrade::A);
        assert!((r.fps - 30.0).abs() < 0.1, "fps {}", r.fps);
    }

    #[test]
    fn sparkline_spans_levels() {
        let mut t = PacingTracker::<3>::new(0.0);
        for v in [10.0, 20.0, 30.0] {
            t.observe(sample(v, 10.0));
        }
        assert_eq!(t.sparkline_ascii(10.0, 30.0), " +@");
    }
}
