//! Step occurrences: the producer contract and the session step counter.
//!
//! # Architecture
//!
//! ```text
//! StepSource (sensor thread)
//!     │  on_step()
//!     ├──────────────▶ StepCounter  ──steps_changed──┐
//!     └──────────────▶ PaceTracker  ──pace_changed───┴──▶ Dispatcher ──▶ SessionCallback
//! ```
//!
//! A [`StepSource`] may call its listeners from any thread, so every
//! [`StepListener`] is `Send + Sync` and guards its own state.

pub mod counter;
pub mod listeners;
pub mod simulated;

pub use counter::StepCounter;
pub use listeners::ListenerSet;
pub use simulated::SimulatedStepSource;

use std::sync::Arc;

use thiserror::Error;

// ---------------------------------------------------------------------------
// StepSourceError
// ---------------------------------------------------------------------------

/// Errors a [`StepSource`] can report when a listener is attached.
#[derive(Debug, Clone, Error)]
pub enum StepSourceError {
    /// The host has no usable motion sensor.
    #[error("step sensor unavailable: {0}")]
    Unavailable(String),

    /// The sensor exists but refused the registration.
    #[error("step listener registration failed: {0}")]
    Registration(String),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Receives one call per detected footfall.
pub trait StepListener: Send + Sync {
    fn on_step(&self);
}

/// Producer of step occurrences.
///
/// Implementations deliver to every registered listener, possibly from a
/// thread other than the one that registered it.
pub trait StepSource: Send + Sync {
    /// Attach `listener`.  The first registration typically starts sampling.
    fn register(&self, listener: Arc<dyn StepListener>) -> Result<(), StepSourceError>;

    /// Detach `listener`; unknown listeners are ignored.
    fn unregister(&self, listener: &Arc<dyn StepListener>);

    /// Apply a new detection sensitivity.
    fn set_sensitivity(&self, sensitivity: i32);
}

// Compile-time assertion: Box<dyn StepSource> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn StepSource>, _: Box<dyn StepListener>) {}
};

// ---------------------------------------------------------------------------
// MockStepSource  (test-only)
// ---------------------------------------------------------------------------

/// Step source driven by the test: call [`fire`](Self::fire) to emit.
#[cfg(test)]
#[derive(Default)]
pub struct MockStepSource {
    listeners: ListenerSet,
    sensitivities: std::sync::Mutex<Vec<i32>>,
    registrations: std::sync::atomic::AtomicUsize,
    failure: Option<StepSourceError>,
    sticky: bool,
}

#[cfg(test)]
impl MockStepSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A source whose every registration fails with `error`.
    pub fn failing(error: StepSourceError) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(error),
            ..Self::default()
        })
    }

    /// A source that keeps delivering to unregistered listeners, standing in
    /// for a sensor thread that was mid-delivery when the session stopped.
    pub fn sticky() -> Arc<Self> {
        Arc::new(Self {
            sticky: true,
            ..Self::default()
        })
    }

    /// Deliver one step occurrence to every registered listener.
    pub fn fire(&self) {
        self.listeners.emit();
    }

    pub fn fire_n(&self, n: usize) {
        for _ in 0..n {
            self.fire();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Total successful registrations over the source's lifetime.
    pub fn registrations(&self) -> usize {
        self.registrations
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn sensitivities(&self) -> Vec<i32> {
        self.sensitivities.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl StepSource for MockStepSource {
    fn register(&self, listener: Arc<dyn StepListener>) -> Result<(), StepSourceError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.registrations
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.listeners.add(listener);
        Ok(())
    }

    fn unregister(&self, listener: &Arc<dyn StepListener>) {
        if !self.sticky {
            self.listeners.remove(listener);
        }
    }

    fn set_sensitivity(&self, sensitivity: i32) {
        self.sensitivities.lock().unwrap().push(sensitivity);
    }
}
