// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runs a paced frame loop and exports a Chrome trace.
//!
//! ```text
//! pacing_demo [config.toml]
//! ```
//!
//! Without a config file the demo simulates six seconds at 60 Hz with a
//! workload that steps from 10 ms to 40 ms per frame and back, which shows the
//! swap interval growing to 3 and returning to 1. Events are printed to
//! stderr and recorded; the recording is written as Chrome Trace Event JSON
//! to `trace_path` (open it in `chrome://tracing` or Perfetto).

mod config;
mod logging;
mod realtime;
mod sinks;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Context;

use cadence_core::time::HostTime;
use cadence_debug::pretty::PrettyPrintSink;
use cadence_debug::recorder::RecorderSink;
use cadence_sim::sim::{SimConfig, Simulation};

use config::{DemoConfig, LoopKind};
use logging::init_logging;
use sinks::{SharedTee, Tee};

fn main() -> anyhow::Result<()> {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = DemoConfig::load(path.as_deref())?;
    init_logging(&config.logging);

    let recording = match config.kind {
        LoopKind::Simulated => run_simulated(&config)?,
        LoopKind::Realtime => {
            let tee = SharedTee(Arc::new(Mutex::new(Tee {
                recorder: RecorderSink::new(),
                pretty: PrettyPrintSink::stderr().verbose(config.verbose),
            })));
            realtime::run(&config, tee.clone());
            tee.recording()
        }
    };

    let file = File::create(&config.trace_path)
        .with_context(|| format!("creating {}", config.trace_path.display()))?;
    let mut writer = BufWriter::new(file);
    cadence_debug::chrome::export(&recording, &mut writer)?;
    writer.flush()?;
    log::info!("wrote {}", config.trace_path.display());
    Ok(())
}

/// Runs the loop in virtual time. Trace events are stamped with the
/// simulated clock.
fn run_simulated(config: &DemoConfig) -> anyhow::Result<Vec<u8>> {
    let now = Arc::new(AtomicU64::new(0));
    let recorder_now = Arc::clone(&now);
    let mut tee = Tee {
        recorder: RecorderSink::with_clock(move || HostTime(recorder_now.load(Ordering::Relaxed))),
        pretty: PrettyPrintSink::stderr().verbose(config.verbose),
    };

    let sim_config = SimConfig {
        refresh_period: config.refresh_period(),
        swap_interval_ns: config.swap_interval_ns(),
        pacing: config.pacing,
        hysteresis: config.hysteresis,
        duration: config.duration(),
        modes: config.display_modes(),
        active_mode: config.active_mode.map(cadence_core::refresh::ModeId),
    };
    let report = Simulation::new(sim_config, config.workload())
        .context("invalid display timings")?
        .with_clock_hook(move |t| now.store(t.nanos(), Ordering::Relaxed))
        .run(&mut tee);

    let quality = report.quality;
    log::info!(
        "{} frames, {} interval changes, {} mode requests",
        report.frames.len(),
        report.changes.len(),
        report.mode_requests.len()
    );
    log::info!(
        "cadence grade {} ({:.1} janky frames per 1000, {:.1} fps over the last frames)",
        quality.grade.as_str(),
        quality.jank_per_1000,
        quality.fps
    );
    Ok(tee.recorder.into_bytes())
}
