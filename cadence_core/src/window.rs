// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-capacity sliding window of frame samples.
//!
//! [`DurationWindow`] keeps the most recent samples in insertion order along
//! with the running CPU and GPU sums, so [`average`](DurationWindow::average)
//! is O(1). The sums are updated incrementally on every
//! [`add`](DurationWindow::add) and are never recomputed from the samples.

use alloc::collections::VecDeque;

use crate::frame::FrameDuration;
use crate::time::Duration;

/// Smallest window the controller will decide from.
pub const MIN_SAMPLES: usize = 2;

/// Sliding window of [`FrameDuration`] samples with a running sum.
#[derive(Clone, Debug)]
pub struct DurationWindow {
    samples: VecDeque<FrameDuration>,
    capacity: usize,
    cpu_sum: Duration,
    gpu_sum: Duration,
}

impl DurationWindow {
    /// Creates an empty window holding at most `capacity` samples.
    ///
    /// A capacity below [`MIN_SAMPLES`] is raised to it.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_SAMPLES);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            cpu_sum: Duration::ZERO,
            gpu_sum: Duration::ZERO,
        }
    }

    /// Creates a window covering `span` worth of frames at `refresh_period`.
    #[must_use]
    pub fn spanning(span: Duration, refresh_period: Duration) -> Self {
        Self::new(capacity_for(span, refresh_period))
    }

    /// Appends a sample, evicting the oldest one first when full.
    pub fn add(&mut self, sample: FrameDuration) {
        if self.samples.len() == self.capacity {
            if let Some(evicted) = self.samples.pop_front() {
                self.cpu_sum -= evicted.cpu();
                self.gpu_sum -= evicted.gpu();
            }
        }
        self.samples.push_back(sample);
        self.cpu_sum += sample.cpu();
        self.gpu_sum += sample.gpu();
    }

    /// Mean of the samples currently held, or zero when empty.
    #[must_use]
    pub fn average(&self) -> FrameDuration {
        let n = self.samples.len() as u64;
        if n == 0 {
            return FrameDuration::default();
        }
        FrameDuration::new(self.cpu_sum / n, self.gpu_sum / n)
    }

    /// Returns `true` once the window is full.
    #[inline]
    #[must_use]
    pub fn has_enough_samples(&self) -> bool {
        self.samples.len() == self.capacity
    }

    /// Drops all samples and resets the sums.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.cpu_sum = Duration::ZERO;
        self.gpu_sum = Duration::ZERO;
    }

    /// Changes the capacity and drops all samples.
    pub fn reset(&mut self, capacity: usize) {
        self.clear();
        self.capacity = capacity.max(MIN_SAMPLES);
    }

    /// Number of samples held.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if no samples are held.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum number of samples.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Running `(cpu, gpu)` sums.
    #[inline]
    #[must_use]
    pub const fn sum(&self) -> (Duration, Duration) {
        (self.cpu_sum, self.gpu_sum)
    }

    /// Iterates samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &FrameDuration> + '_ {
        self.samples.iter()
    }
}

/// Number of samples that covers `span` at one frame per `refresh_period`.
#[must_use]
pub fn capacity_for(span: Duration, refresh_period: Duration) -> usize {
    if refresh_period.is_zero() {
        return MIN_SAMPLES;
    }
    usize::try_from(span / refresh_period)
        .unwrap_or(usize::MAX)
        .max(MIN_SAMPLES)
}
