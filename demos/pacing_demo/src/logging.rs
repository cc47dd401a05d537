// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Logger setup.

use std::sync::Once;

use serde::Deserialize;

/// Logger configuration, read from the `[logging]` table.
///
/// `filter` follows the `env_logger` filter syntax (e.g. `"info"` or
/// `"cadence_core=trace,cadence_gate=debug"`). When absent, `RUST_LOG` is
/// used, then `info`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct LoggingConfig {
    pub(crate) filter: Option<String>,
    /// Disables ANSI colors.
    pub(crate) plain: bool,
}

static INIT: Once = Once::new();

/// Initializes the global logger. Later calls are ignored.
pub(crate) fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = &config.filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        builder.write_style(if config.plain {
            env_logger::WriteStyle::Never
        } else {
            env_logger::WriteStyle::Auto
        });
        builder.init();

        log::debug!("logging initialized");
    });
}
