// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use cadence_core::time::HostTime;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Waits and swaps become duration slices on the render thread, frame starts
/// and refresh-rate requests become instants, and every swap-interval change
/// also updates a `SwapInterval` counter track.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for record in decode(bytes) {
        let ts = us(record.at);
        match record.event {
            RecordedEvent::PreWait => {
                events.push(json!({
                    "ph": "B",
                    "name": "Wait",
                    "cat": "Frame",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                }));
            }
            RecordedEvent::PostWait(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": "Wait",
                    "cat": "Frame",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "cpu_ms": e.cpu_time.as_millis_f64(),
                        "gpu_ms": e.gpu_time.as_millis_f64(),
                    }
                }));
            }
            RecordedEvent::PreSwap => {
                events.push(json!({
                    "ph": "B",
                    "name": "Swap",
                    "cat": "Frame",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                }));
            }
            RecordedEvent::PostSwap(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": "Swap",
                    "cat": "Frame",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "args": {
                        "presentation_us": us(e.presentation_time),
                    }
                }));
            }
            RecordedEvent::StartFrame(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "StartFrame",
                    "cat": "Frame",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "vsync": e.frame,
                        "vsync_us": us(e.timestamp),
                    }
                }));
            }
            RecordedEvent::SwapIntervalChanged(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "SwapIntervalChanged",
                    "cat": "Pacing",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "old_interval": e.old_interval,
                        "new_interval": e.new_interval,
                        "old_pipelining": e.old_mode.as_str(),
                        "new_pipelining": e.new_mode.as_str(),
                        "budget_ms": e.swap_interval_ns.as_millis_f64(),
                    }
                }));
                events.push(json!({
                    "ph": "C",
                    "name": "SwapInterval",
                    "ts": ts,
                    "pid": 0,
                    "args": {
                        "interval": e.new_interval,
                    }
                }));
            }
            RecordedEvent::RefreshRateRequest(mode) => {
                events.push(json!({
                    "ph": "i",
                    "name": "RefreshRateRequest",
                    "cat": "Pacing",
                    "ts": ts,
                    "pid": 0,
                    "tid": 0,
                    "s": "g",
                    "args": {
                        "mode": mode.0,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use cadence_core::frame::PipelineMode;
    use cadence_core::time::Duration;
    use cadence_core::trace::{PostWaitEvent, SwapIntervalChangedEvent, TraceSink};

    #[test]
    fn export_produces_valid_json() {
        let mut t = 0;
        let mut rec = RecorderSink::with_clock(move || {
            t += 500;
            HostTime(t)
        });
        rec.on_pre_wait();
        rec.on_post_wait(&PostWaitEvent {
            cpu_time: Duration::from_millis(2),
            gpu_time: Duration::from_millis(1),
        });
        rec.on_swap_interval_changed(&SwapIntervalChangedEvent {
            old_interval: 1,
            new_interval: 2,
            old_mode: PipelineMode::On,
            new_mode: PipelineMode::On,
            swap_interval_ns: Duration(33_333_334),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        // Should parse as a JSON array; the change adds an instant and a counter.
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 4);

        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "Wait");
        assert_eq!(parsed[0]["ts"], 0.5);

        assert_eq!(parsed[1]["ph"], "E");
        assert_eq!(parsed[1]["args"]["cpu_ms"], 2.0);

        assert_eq!(parsed[2]["name"], "SwapIntervalChanged");
        assert_eq!(parsed[2]["args"]["new_interval"], 2);

        assert_eq!(parsed[3]["ph"], "C");
        assert_eq!(parsed[3]["args"]["interval"], 2);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
