// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Swap-interval and pipeline-mode decisions for vsync-paced render loops.
//!
//! `cadence_core` holds the decision engine of the frame pacer. It is `no_std`
//! compatible (with `alloc`) and owns no threads: the blocking half of the
//! pacer lives in `cadence_gate`, which feeds measured frame durations in and
//! applies the decisions that come out.
//!
//! # Architecture
//!
//! ```text
//!   FrameGate::on_pre_swap / on_post_swap
//!       │  (cpu, gpu) sample
//!       ▼
//!   DurationWindow ──► PacingController::evaluate() ──► PacingDecision
//!                              │                          (interval, mode)
//!                              ▼
//!                      RefreshRateSelector ──► ModeId request
//! ```
//!
//! **[`time`]** — Nanosecond [`HostTime`](time::HostTime) and
//! [`Duration`](time::Duration) newtypes.
//!
//! **[`frame`]** — [`FrameDuration`](frame::FrameDuration) samples and
//! [`PipelineMode`](frame::PipelineMode).
//!
//! **[`window`]** — Sliding window of samples with an incrementally
//! maintained sum.
//!
//! **[`settings`]** — Display timing snapshots, pacing configuration and
//! hysteresis margins.
//!
//! **[`controller`]** — The per-frame decision algorithm.
//!
//! **[`refresh`]** — Display mode selection for multi-rate panels.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) hooks called at fixed
//! points of the frame protocol.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `serde` (disabled by default): Derives `Serialize`/`Deserialize` for the
//!   configuration types so they can be loaded from files.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod controller;
pub mod frame;
pub mod refresh;
pub mod settings;
pub mod time;
pub mod trace;
pub mod window;
