// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Demo configuration.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use cadence_core::refresh::{DisplayMode, ModeId};
use cadence_core::settings::{Hysteresis, PacingConfig};
use cadence_core::time::Duration;
use cadence_sim::workload::Workload;

use crate::logging::LoggingConfig;

/// How the frame loop is driven.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum LoopKind {
    /// Virtual time; finishes instantly.
    #[default]
    Simulated,
    /// Wall-clock time through a real gate and timer thread.
    Realtime,
}

/// One `[[modes]]` entry.
#[derive(Clone, Copy, Debug, Deserialize)]
pub(crate) struct ModeConfig {
    pub(crate) id: i32,
    pub(crate) hz: u32,
}

/// One `[[steps]]` entry: the frame cost from `at_ms` onwards.
#[derive(Clone, Copy, Debug, Deserialize)]
pub(crate) struct StepConfig {
    #[serde(default)]
    pub(crate) at_ms: u64,
    pub(crate) cpu_us: u64,
    pub(crate) gpu_us: u64,
}

/// Top-level demo configuration.
///
/// Durations under `[pacing]` and `[hysteresis]` are integer nanoseconds.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub(crate) struct DemoConfig {
    pub(crate) kind: LoopKind,
    pub(crate) refresh_hz: u32,
    /// Frame rate the caller asks for. Defaults to the refresh rate.
    pub(crate) target_hz: Option<u32>,
    pub(crate) duration_ms: u64,
    pub(crate) trace_path: PathBuf,
    /// Also print the wait and swap brackets of every frame.
    pub(crate) verbose: bool,
    pub(crate) logging: LoggingConfig,
    pub(crate) pacing: PacingConfig,
    pub(crate) hysteresis: Hysteresis,
    pub(crate) modes: Vec<ModeConfig>,
    pub(crate) active_mode: Option<i32>,
    pub(crate) steps: Vec<StepConfig>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            kind: LoopKind::default(),
            refresh_hz: 60,
            target_hz: None,
            duration_ms: 6_000,
            trace_path: PathBuf::from("cadence_trace.json"),
            verbose: false,
            logging: LoggingConfig::default(),
            pacing: PacingConfig::default(),
            hysteresis: Hysteresis::default(),
            modes: Vec::new(),
            active_mode: None,
            steps: vec![
                StepConfig {
                    at_ms: 0,
                    cpu_us: 10_000,
                    gpu_us: 10_000,
                },
                StepConfig {
                    at_ms: 2_000,
                    cpu_us: 40_000,
                    gpu_us: 40_000,
                },
                StepConfig {
                    at_ms: 4_000,
                    cpu_us: 10_000,
                    gpu_us: 10_000,
                },
            ],
        }
    }
}

impl DemoConfig {
    /// Reads a config file, or returns the defaults when `path` is `None`.
    pub(crate) fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.refresh_hz > 0, "refresh_hz must be positive");
        anyhow::ensure!(
            self.target_hz != Some(0),
            "target_hz must be positive when set"
        );
        anyhow::ensure!(
            self.modes.iter().all(|m| m.hz > 0),
            "every mode needs a positive hz"
        );
        Ok(())
    }

    pub(crate) fn refresh_period(&self) -> Duration {
        Duration::from_hz(self.refresh_hz)
    }

    pub(crate) fn swap_interval_ns(&self) -> Option<Duration> {
        self.target_hz.map(Duration::from_hz)
    }

    pub(crate) fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub(crate) fn display_modes(&self) -> Vec<DisplayMode> {
        self.modes
            .iter()
            .map(|m| DisplayMode::new(ModeId(m.id), Duration::from_hz(m.hz)))
            .collect()
    }

    pub(crate) fn workload(&self) -> Workload {
        let mut steps = self.steps.iter();
        let mut workload = match steps.next() {
            Some(first) => Workload::constant(
                Duration::from_micros(first.cpu_us),
                Duration::from_micros(first.gpu_us),
            ),
            None => Workload::constant(Duration::ZERO, Duration::ZERO),
        };
        for step in steps {
            workload = workload.then_at(
                Duration::from_millis(step.at_ms),
                Duration::from_micros(step.cpu_us),
                Duration::from_micros(step.gpu_us),
            );
        }
        workload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: DemoConfig = toml::from_str(
            r#"
            kind = "realtime"
            refresh_hz = 90

            [pacing]
            auto_pipeline_mode = false

            [[steps]]
            cpu_us = 5000
            gpu_us = 2000
            "#,
        )
        .unwrap();
        assert_eq!(config.kind, LoopKind::Realtime);
        assert_eq!(config.refresh_period(), Duration::from_hz(90));
        assert!(!config.pacing.auto_pipeline_mode);
        assert!(config.pacing.auto_swap_interval);
        assert_eq!(config.duration_ms, 6_000);
        assert_eq!(
            config.workload().at(Duration::from_secs(3)).cpu(),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn modes_and_target_rate() {
        let config: DemoConfig = toml::from_str(
            r#"
            target_hz = 120
            active_mode = 1

            [[modes]]
            id = 1
            hz = 60

            [[modes]]
            id = 2
            hz = 120
            "#,
        )
        .unwrap();
        assert_eq!(config.swap_interval_ns(), Some(Duration::from_hz(120)));
        let modes = config.display_modes();
        assert_eq!(modes[1], DisplayMode::new(ModeId(2), Duration::from_hz(120)));
    }

    #[test]
    fn zero_refresh_rate_is_rejected() {
        let config: DemoConfig = toml::from_str("refresh_hz = 0").unwrap();
        assert!(config.check().is_err());
    }

    #[test]
    fn default_workload_steps_up_and_down() {
        let w = DemoConfig::default().workload();
        assert_eq!(w.at(Duration::from_millis(2_500)).gpu(), Duration::from_millis(40));
        assert_eq!(w.at(Duration::from_millis(4_500)).gpu(), Duration::from_millis(10));
    }
}
