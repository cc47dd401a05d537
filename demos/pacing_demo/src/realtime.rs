// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wall-clock frame loop through a real [`FrameGate`].

use std::thread;
use std::time::Instant;

use cadence_core::refresh::ModeId;
use cadence_core::time::Duration;
use cadence_gate::display::StaticDisplay;
use cadence_gate::gate::{FrameGate, GateOptions, SwapHandlers, TickDriver};

use crate::config::DemoConfig;
use crate::sinks::SharedTee;

/// A GPU that finishes each frame `gpu` after it was submitted.
#[derive(Debug)]
struct SleepingGpu {
    done_at: Instant,
    last_gpu: Duration,
}

impl SwapHandlers for SleepingGpu {
    fn last_frame_is_complete(&mut self) -> bool {
        Instant::now() >= self.done_at
    }

    fn prev_frame_gpu_time(&mut self) -> Duration {
        self.last_gpu
    }
}

/// Runs the configured workload for the configured duration.
pub(crate) fn run(config: &DemoConfig, sinks: SharedTee) {
    let display = if config.modes.is_empty() {
        StaticDisplay::new(config.refresh_period())
    } else {
        let active = config.active_mode.map_or(ModeId(config.modes[0].id), ModeId);
        StaticDisplay::with_modes(config.display_modes(), active)
    };
    let options = GateOptions {
        config: config.pacing,
        hysteresis: config.hysteresis,
        driver: TickDriver::SelfScheduled,
        swap_interval_ns: config.swap_interval_ns(),
    };
    let mut gate = FrameGate::new(display.clone(), options);
    gate.add_trace_sink(Box::new(sinks));

    let workload = config.workload();
    let mut gpu = SleepingGpu {
        done_at: Instant::now(),
        last_gpu: Duration::ZERO,
    };
    let start = Instant::now();
    let end = std::time::Duration::from(config.duration());
    let mut frames = 0_u64;

    while start.elapsed() < end {
        let cost = workload.at(Duration::from(start.elapsed()));
        thread::sleep(cost.cpu().into());

        gate.on_pre_swap(&mut gpu);
        gpu.done_at = Instant::now() + std::time::Duration::from(cost.gpu());
        gpu.last_gpu = cost.gpu();
        gate.on_post_swap(&mut gpu);
        frames += 1;
    }

    let seconds = start.elapsed().as_secs_f64();
    log::info!(
        "{frames} frames in {seconds:.2}s ({:.1} fps), interval budget {:?}, pipelining {}",
        frames as f64 / seconds,
        gate.swap_interval_ns(),
        gate.pipeline_mode().as_str()
    );
    let requests = display.requests();
    if !requests.is_empty() {
        log::info!("display mode requests: {requests:?}");
    }
}
