// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each stamped with the time it was
//! received. [`decode`] reads them back as an iterator of [`Record`].
//!
//! Record layout: tag (`u8`), receive time (`u64` nanoseconds), then the
//! event's fields in declaration order.

use std::time::Instant;

use cadence_core::frame::PipelineMode;
use cadence_core::refresh::ModeId;
use cadence_core::time::{Duration, HostTime};
use cadence_core::trace::{
    PostSwapEvent, PostWaitEvent, StartFrameEvent, SwapIntervalChangedEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_PRE_WAIT: u8 = 1;
const TAG_POST_WAIT: u8 = 2;
const TAG_PRE_SWAP: u8 = 3;
const TAG_POST_SWAP: u8 = 4;
const TAG_START_FRAME: u8 = 5;
const TAG_SWAP_INTERVAL_CHANGED: u8 = 6;
const TAG_REFRESH_RATE_REQUEST: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

type Clock = Box<dyn FnMut() -> HostTime + Send>;

/// A [`TraceSink`] that encodes events into a compact binary buffer.
pub struct RecorderSink {
    buf: Vec<u8>,
    clock: Clock,
}

impl std::fmt::Debug for RecorderSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderSink")
            .field("len", &self.buf.len())
            .finish_non_exhaustive()
    }
}

impl Default for RecorderSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderSink {
    /// Creates an empty recorder stamping events with the time since its
    /// creation.
    #[must_use]
    pub fn new() -> Self {
        let epoch = Instant::now();
        Self::with_clock(move || HostTime(Duration::from(epoch.elapsed()).as_nanos()))
    }

    /// Creates an empty recorder stamping events with `clock`.
    #[must_use]
    pub fn with_clock(clock: impl FnMut() -> HostTime + Send + 'static) -> Self {
        Self {
            buf: Vec::new(),
            clock: Box::new(clock),
        }
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn begin(&mut self, tag: u8) {
        let at = (self.clock)();
        self.write_u8(tag);
        self.write_u64(at.nanos());
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_i32(&mut self, v: i32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_mode(&mut self, m: PipelineMode) {
        self.write_u8(match m {
            PipelineMode::Off => 0,
            PipelineMode::On => 1,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_pre_wait(&mut self) {
        self.begin(TAG_PRE_WAIT);
    }

    fn on_post_wait(&mut self, e: &PostWaitEvent) {
        self.begin(TAG_POST_WAIT);
        self.write_u64(e.cpu_time.as_nanos());
        self.write_u64(e.gpu_time.as_nanos());
    }

    fn on_pre_swap(&mut self) {
        self.begin(TAG_PRE_SWAP);
    }

    fn on_post_swap(&mut self, e: &PostSwapEvent) {
        self.begin(TAG_POST_SWAP);
        self.write_u64(e.presentation_time.nanos());
    }

    fn on_start_frame(&mut self, e: &StartFrameEvent) {
        self.begin(TAG_START_FRAME);
        self.write_u64(e.frame);
        self.write_u64(e.timestamp.nanos());
    }

    fn on_swap_interval_changed(&mut self, e: &SwapIntervalChangedEvent) {
        self.begin(TAG_SWAP_INTERVAL_CHANGED);
        self.write_u32(e.old_interval);
        self.write_u32(e.new_interval);
        self.write_mode(e.old_mode);
        self.write_mode(e.new_mode);
        self.write_u64(e.swap_interval_ns.as_nanos());
    }

    fn on_refresh_rate_request(&mut self, mode: ModeId) {
        self.begin(TAG_REFRESH_RATE_REQUEST);
        self.write_i32(mode.0);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// The frame started waiting.
    PreWait,
    /// A [`PostWaitEvent`].
    PostWait(PostWaitEvent),
    /// The frame is about to be submitted.
    PreSwap,
    /// A [`PostSwapEvent`].
    PostSwap(PostSwapEvent),
    /// A [`StartFrameEvent`].
    StartFrame(StartFrameEvent),
    /// A [`SwapIntervalChangedEvent`].
    SwapIntervalChanged(SwapIntervalChangedEvent),
    /// A display mode was requested.
    RefreshRateRequest(ModeId),
}

/// A decoded event with the time the recorder received it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record {
    /// Receive time.
    pub at: HostTime,
    /// The event.
    pub event: RecordedEvent,
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`Record`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_i32(&mut self) -> Option<i32> {
        self.take().map(i32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_duration(&mut self) -> Option<Duration> {
        self.read_u64().map(Duration)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_mode(&mut self) -> Option<PipelineMode> {
        Some(match self.read_u8()? {
            0 => PipelineMode::Off,
            _ => PipelineMode::On,
        })
    }

    fn decode_event(&mut self, tag: u8) -> Option<RecordedEvent> {
        Some(match tag {
            TAG_PRE_WAIT => RecordedEvent::PreWait,
            TAG_POST_WAIT => RecordedEvent::PostWait(PostWaitEvent {
                cpu_time: self.read_duration()?,
                gpu_time: self.read_duration()?,
            }),
            TAG_PRE_SWAP => RecordedEvent::PreSwap,
            TAG_POST_SWAP => RecordedEvent::PostSwap(PostSwapEvent {
                presentation_time: self.read_time()?,
            }),
            TAG_START_FRAME => RecordedEvent::StartFrame(StartFrameEvent {
                frame: self.read_u64()?,
                timestamp: self.read_time()?,
            }),
            TAG_SWAP_INTERVAL_CHANGED => {
                RecordedEvent::SwapIntervalChanged(SwapIntervalChangedEvent {
                    old_interval: self.read_u32()?,
                    new_interval: self.read_u32()?,
                    old_mode: self.read_mode()?,
                    new_mode: self.read_mode()?,
                    swap_interval_ns: self.read_duration()?,
                })
            }
            TAG_REFRESH_RATE_REQUEST => RecordedEvent::RefreshRateRequest(ModeId(self.read_i32()?)),
            _ => return None, // unknown tag → stop iteration
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let at = self.read_time()?;
        let event = self.decode_event(tag)?;
        Some(Record { at, event })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    /// Recorder whose clock advances 1µs per event.
    fn stepping_recorder() -> RecorderSink {
        let mut t = 0;
        RecorderSink::with_clock(move || {
            t += 1_000;
            HostTime(t)
        })
    }

    #[test]
    fn frame_sequence_decodes_in_order() {
        let mut rec = stepping_recorder();
        rec.on_start_frame(&StartFrameEvent {
            frame: 7,
            timestamp: HostTime(16_000_000),
        });
        rec.on_pre_wait();
        rec.on_post_wait(&PostWaitEvent {
            cpu_time: Duration::from_millis(3),
            gpu_time: Duration::from_millis(4),
        });
        rec.on_pre_swap();
        rec.on_post_swap(&PostSwapEvent {
            presentation_time: HostTime(49_000_000),
        });

        let records: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(records.len(), 5);
        let times: Vec<_> = records.iter().map(|r| r.at.nanos()).collect();
        assert_eq!(times, [1_000, 2_000, 3_000, 4_000, 5_000]);
        assert_eq!(
            records[0].event,
            RecordedEvent::StartFrame(StartFrameEvent {
                frame: 7,
                timestamp: HostTime(16_000_000),
            })
        );
        assert_eq!(records[1].event, RecordedEvent::PreWait);
        match records[2].event {
            RecordedEvent::PostWait(e) => {
                assert_eq!(e.cpu_time, Duration::from_millis(3));
                assert_eq!(e.gpu_time, Duration::from_millis(4));
            }
            other => panic!("expected PostWait, got {other:?}"),
        }
        assert_eq!(records[3].event, RecordedEvent::PreSwap);
        assert!(matches!(records[4].event, RecordedEvent::PostSwap(_)));
    }

    #[test]
    fn interval_change_keeps_modes() {
        let mut rec = stepping_recorder();
        let orig = SwapIntervalChangedEvent {
            old_interval: 1,
            new_interval: 3,
            old_mode: PipelineMode::Off,
            new_mode: PipelineMode::On,
            swap_interval_ns: Duration(50_000_001),
        };
        rec.on_swap_interval_changed(&orig);
        rec.on_refresh_rate_request(ModeId(-2));

        let events: Vec<_> = decode(rec.as_bytes()).map(|r| r.event).collect();
        assert_eq!(
            events,
            [
                RecordedEvent::SwapIntervalChanged(orig),
                RecordedEvent::RefreshRateRequest(ModeId(-2)),
            ]
        );
    }

    #[test]
    fn truncated_record_stops_decoding() {
        let mut rec = stepping_recorder();
        rec.on_pre_swap();
        rec.on_post_swap(&PostSwapEvent {
            presentation_time: HostTime(1),
        });
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn default_clock_is_monotonic() {
        let mut rec = RecorderSink::default();
        rec.on_pre_wait();
        rec.on_pre_swap();
        let times: Vec<_> = decode(rec.as_bytes()).map(|r| r.at).collect();
        assert!(times[0] <= times[1]);
    }
}
