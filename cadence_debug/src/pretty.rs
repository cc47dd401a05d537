// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Durations are
//! printed in milliseconds, timestamps in microseconds.

use std::io::Write;

use cadence_core::refresh::ModeId;
use cadence_core::time::HostTime;
use cadence_core::trace::{
    PostSwapEvent, PostWaitEvent, StartFrameEvent, SwapIntervalChangedEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write + Send>> {
    writer: W,
    verbose: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    ///
    /// Only frame starts, swap-interval changes and refresh-rate requests are
    /// printed until [`verbose`](Self::verbose) is set.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            verbose: false,
        }
    }

    /// Also prints the wait and swap brackets of every frame.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

fn us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_pre_wait(&mut self) {
        if self.verbose {
            let _ = writeln!(self.writer, "[wait:begin]");
        }
    }

    fn on_post_wait(&mut self, e: &PostWaitEvent) {
        if self.verbose {
            let _ = writeln!(
                self.writer,
                "[wait:end] cpu={:.3}ms gpu={:.3}ms",
                e.cpu_time.as_millis_f64(),
                e.gpu_time.as_millis_f64(),
            );
        }
    }

    fn on_pre_swap(&mut self) {
        if self.verbose {
            let _ = writeln!(self.writer, "[swap:begin]");
        }
    }

    fn on_post_swap(&mut self, e: &PostSwapEvent) {
        if self.verbose {
            let _ = writeln!(
                self.writer,
                "[swap:end] present={:.1}µs",
                us(e.presentation_time),
            );
        }
    }

    fn on_start_frame(&mut self, e: &StartFrameEvent) {
        let _ = writeln!(
            self.writer,
            "[frame] vsync={} at {:.1}µs",
            e.frame,
            us(e.timestamp),
        );
    }

    fn on_swap_interval_changed(&mut self, e: &SwapIntervalChangedEvent) {
        let _ = writeln!(
            self.writer,
            "[interval] {} -> {} pipelining {} -> {} budget={:.3}ms",
            e.old_interval,
            e.new_interval,
            e.old_mode.as_str(),
            e.new_mode.as_str(),
            e.swap_interval_ns.as_millis_f64(),
        );
    }

    fn on_refresh_rate_request(&mut self, mode: ModeId) {
        let _ = writeln!(self.writer, "[refresh] request mode={}", mode.0);
    }
}
