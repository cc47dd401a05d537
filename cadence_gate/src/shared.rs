// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timing snapshots shared between threads.
//!
//! [`SharedSettings`] holds the current [`TimingSettings`] as an immutable
//! `Arc` that is swapped whole on every update. Readers either take the
//! snapshot directly or compare [`generation`](SharedSettings::generation)
//! against the last one they applied, which costs one atomic load per frame.
//! Listeners registered with [`subscribe`](SharedSettings::subscribe) run on
//! the publishing thread, in registration order.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use cadence_core::settings::{SettingsError, TimingSettings};
use cadence_core::time::Duration;

type Listener = Box<dyn Fn(&TimingSettings) + Send + Sync>;

/// The current timing snapshot plus the observers of its changes.
pub struct SharedSettings {
    current: RwLock<Arc<TimingSettings>>,
    generation: AtomicU64,
    listeners: Mutex<Vec<Listener>>,
}

impl fmt::Debug for SharedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSettings")
            .field("current", &*self.snapshot())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl SharedSettings {
    /// Starts at `initial`, generation zero.
    #[must_use]
    pub fn new(initial: TimingSettings) -> Self {
        Self {
            current: RwLock::new(Arc::new(initial)),
            generation: AtomicU64::new(0),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// The snapshot in effect.
    #[must_use]
    pub fn snapshot(&self) -> Arc<TimingSettings> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Bumped on every accepted [`publish`](Self::publish).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Replaces the snapshot and notifies listeners.
    ///
    /// Rejects snapshots that cannot drive the controller and leaves the
    /// current one in place.
    pub fn publish(&self, settings: TimingSettings) -> Result<(), SettingsError> {
        settings.validate()?;
        {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            *current = Arc::new(settings);
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        log::debug!(
            "timing settings published: period {:?}, requested {:?}",
            settings.refresh_period,
            settings.swap_interval_ns
        );
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            listener(&settings);
        }
        Ok(())
    }

    /// Publishes a copy of the current snapshot with a new requested swap
    /// interval.
    pub fn set_swap_interval_ns(&self, swap_interval_ns: Duration) -> Result<(), SettingsError> {
        let next = self.snapshot().with_swap_interval(swap_interval_ns);
        self.publish(next)
    }

    /// Registers a listener called with every published snapshot.
    pub fn subscribe(&self, listener: impl Fn(&TimingSettings) + Send + Sync + 'static) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
