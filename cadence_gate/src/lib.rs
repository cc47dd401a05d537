// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The threaded half of cadence: blocking frame waits aligned to vsync.
//!
//! A render loop brackets every buffer swap with
//! [`FrameGate::on_pre_swap`](gate::FrameGate::on_pre_swap) and
//! [`FrameGate::on_post_swap`](gate::FrameGate::on_post_swap). The gate blocks
//! the render thread until the frame's target vsync, measures the frame, feeds
//! the sample to a [`PacingController`](cadence_core::controller::PacingController)
//! and applies the swap interval and pipeline mode it decides on.
//!
//! ```text
//!   vsync source ──► VsyncScheduler ──► PresentationClock::on_tick
//!   (timer thread,                        │  frame counter + timestamp
//!    host ticks, or none)                 ▼  (one mutex, one condvar)
//!                         FrameGate::on_pre_swap / on_post_swap
//! ```
//!
//! **[`clock`]** — [`PresentationClock`](clock::PresentationClock), the
//! frame counter every wait blocks on, plus the [`MonotonicClock`](clock::MonotonicClock)
//! time source seam.
//!
//! **[`vsync`]** — [`VsyncScheduler`](vsync::VsyncScheduler): self-scheduled
//! timer thread, externally driven ticks, or an unpaced fallback.
//!
//! **[`display`]** — The [`DisplayBackend`](display::DisplayBackend) trait the
//! platform implements.
//!
//! **[`shared`]** — [`SharedSettings`](shared::SharedSettings), the
//! atomically swapped timing snapshot with its listener list.
//!
//! **[`gate`]** — [`FrameGate`](gate::FrameGate), the per-frame protocol.

pub mod clock;
pub mod display;
pub mod gate;
pub mod shared;
pub mod vsync;
