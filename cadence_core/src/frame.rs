// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-frame work samples and the pipelining mode they are judged under.

use core::fmt;

use crate::time::Duration;

/// Whether CPU work for the next frame may overlap GPU work for this one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PipelineMode {
    /// CPU and GPU work for a frame run back to back.
    ///
    /// Lower latency, but the frame must fit `cpu + gpu` into the budget.
    Off,
    /// CPU work for frame N+1 overlaps GPU work for frame N.
    ///
    /// The frame only needs to fit `max(cpu, gpu)` into the budget, at the
    /// cost of one extra refresh period of latency.
    #[default]
    On,
}

impl PipelineMode {
    /// Number of swap intervals between the start of a frame and its
    /// presentation.
    #[inline]
    #[must_use]
    pub const fn presentation_depth(self) -> u32 {
        match self {
            Self::Off => 1,
            Self::On => 2,
        }
    }

    /// Returns a short lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
        }
    }
}

/// Measured CPU and GPU time for one frame.
///
/// Both components are clamped to [`FrameDuration::MAX`] on construction so
/// that a single stall (a debugger pause, a suspended process) cannot drag a
/// window average arbitrarily far.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FrameDuration {
    cpu: Duration,
    gpu: Duration,
}

impl FrameDuration {
    /// Upper bound applied to each component.
    pub const MAX: Duration = Duration::from_millis(100);

    /// Creates a sample, clamping each component to [`Self::MAX`].
    #[inline]
    #[must_use]
    pub fn new(cpu: Duration, gpu: Duration) -> Self {
        Self {
            cpu: cpu.min(Self::MAX),
            gpu: gpu.min(Self::MAX),
        }
    }

    /// CPU time from frame start to swap submission.
    #[inline]
    #[must_use]
    pub const fn cpu(&self) -> Duration {
        self.cpu
    }

    /// GPU time of the frame.
    #[inline]
    #[must_use]
    pub const fn gpu(&self) -> Duration {
        self.gpu
    }

    /// Time the frame occupies on the critical path under `mode`.
    ///
    /// Pipelined frames overlap the two halves, so only the longer one
    /// counts. Serialized frames pay for both.
    #[inline]
    #[must_use]
    pub fn effective_time(&self, mode: PipelineMode) -> Duration {
        match mode {
            PipelineMode::On => self.cpu.max(self.gpu),
            PipelineMode::Off => self.cpu + self.gpu,
        }
    }
}

impl fmt::Debug for FrameDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FrameDuration(cpu={:.3}ms, gpu={:.3}ms)",
            self.cpu.as_millis_f64(),
            self.gpu.as_millis_f64()
        )
    }
}
