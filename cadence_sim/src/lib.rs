// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic virtual-time simulation of a paced render loop.
//!
//! [`Simulation`](sim::Simulation) drives a
//! [`PacingController`](cadence_core::controller::PacingController) with a
//! scripted [`Workload`](workload::Workload) on a virtual clock. No threads
//! and no sleeping are involved, so a multi-second scenario runs in
//! microseconds and always produces the same result.
//!
//! [`PacingTracker`](quality::PacingTracker) grades the cadence of the
//! presented frames.

#![no_std]

extern crate alloc;

pub mod quality;
pub mod sim;
pub mod workload;
