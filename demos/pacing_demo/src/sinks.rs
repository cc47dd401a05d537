// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace sinks the demo hands to the frame loop.

use std::sync::{Arc, Mutex, PoisonError};

use cadence_core::refresh::ModeId;
use cadence_core::trace::{
    PostSwapEvent, PostWaitEvent, StartFrameEvent, SwapIntervalChangedEvent, TraceSink,
};
use cadence_debug::pretty::PrettyPrintSink;
use cadence_debug::recorder::RecorderSink;

/// Sends every event to a recorder and a pretty printer.
#[derive(Debug)]
pub(crate) struct Tee {
    pub(crate) recorder: RecorderSink,
    pub(crate) pretty: PrettyPrintSink,
}

impl TraceSink for Tee {
    fn on_pre_wait(&mut self) {
        self.recorder.on_pre_wait();
        self.pretty.on_pre_wait();
    }

    fn on_post_wait(&mut self, e: &PostWaitEvent) {
        self.recorder.on_post_wait(e);
        self.pretty.on_post_wait(e);
    }

    fn on_pre_swap(&mut self) {
        self.recorder.on_pre_swap();
        self.pretty.on_pre_swap();
    }

    fn on_post_swap(&mut self, e: &PostSwapEvent) {
        self.recorder.on_post_swap(e);
        self.pretty.on_post_swap(e);
    }

    fn on_start_frame(&mut self, e: &StartFrameEvent) {
        self.recorder.on_start_frame(e);
        self.pretty.on_start_frame(e);
    }

    fn on_swap_interval_changed(&mut self, e: &SwapIntervalChangedEvent) {
        self.recorder.on_swap_interval_changed(e);
        self.pretty.on_swap_interval_changed(e);
    }

    fn on_refresh_rate_request(&mut self, mode: ModeId) {
        self.recorder.on_refresh_rate_request(mode);
        self.pretty.on_refresh_rate_request(mode);
    }
}

/// A [`Tee`] the gate can own while the demo keeps a handle to read the
/// recording back.
#[derive(Clone, Debug)]
pub(crate) struct SharedTee(pub(crate) Arc<Mutex<Tee>>);

impl SharedTee {
    fn with(&self, f: impl FnOnce(&mut Tee)) {
        f(&mut self.0.lock().unwrap_or_else(PoisonError::into_inner));
    }

    /// Copies out the recorded bytes.
    pub(crate) fn recording(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        self.with(|tee| bytes = tee.recorder.as_bytes().to_vec());
        bytes
    }
}

impl TraceSink for SharedTee {
    fn on_pre_wait(&mut self) {
        self.with(Tee::on_pre_wait);
    }

    fn on_post_wait(&mut self, e: &PostWaitEvent) {
        self.with(|t| t.on_post_wait(e));
    }

    fn on_pre_swap(&mut self) {
        self.with(Tee::on_pre_swap);
    }

    fn on_post_swap(&mut self, e: &PostSwapEvent) {
        self.with(|t| t.on_post_swap(e));
    }

    fn on_start_frame(&mut self, e: &StartFrameEvent) {
        self.with(|t| t.on_start_frame(e));
    }

    fn on_swap_interval_changed(&mut self, e: &SwapIntervalChangedEvent) {
        self.with(|t| t.on_swap_interval_changed(e));
    }

    fn on_refresh_rate_request(&mut self, mode: ModeId) {
        self.with(|t| t.on_refresh_rate_request(mode));
    }
}
