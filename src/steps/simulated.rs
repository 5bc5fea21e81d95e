//! Cadence-driven step source for headless runs.
//!
//! [`SimulatedStepSource`] stands in for a motion sensor: while at least one
//! listener is registered it runs a dedicated OS thread that emits one step
//! occurrence every `60 000 / cadence` milliseconds.  Unregistering the last
//! listener sets a stop flag and unparks the thread, which then exits on its
//! own; the caller never waits for it.

use std::sync::{
    atomic::{AtomicBool, AtomicI32, Ordering},
    Arc, Mutex,
};
use std::thread::JoinHandle;
use std::time::Duration;

use super::{ListenerSet, StepListener, StepSource, StepSourceError};
use crate::config::DEFAULT_SENSITIVITY;

struct Walker {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl Walker {
    fn halt(self) {
        self.stop.store(true, Ordering::Relaxed);
        self.thread.thread().unpark();
    }
}

/// Simulated walker that emits steps at a fixed cadence.
pub struct SimulatedStepSource {
    listeners: Arc<ListenerSet>,
    sensitivity: AtomicI32,
    interval: Duration,
    available: bool,
    walker: Mutex<Option<Walker>>,
}

impl SimulatedStepSource {
    /// A walker stepping at `cadence_spm` steps per minute.
    pub fn new(cadence_spm: u32) -> Self {
        let interval = Duration::from_millis(60_000 / u64::from(cadence_spm.max(1)));
        Self {
            listeners: Arc::new(ListenerSet::new()),
            sensitivity: AtomicI32::new(DEFAULT_SENSITIVITY),
            interval,
            available: true,
            walker: Mutex::new(None),
        }
    }

    /// A source that behaves like a device without a motion sensor.
    pub fn unavailable() -> Self {
        let mut source = Self::new(1);
        source.available = false;
        source
    }

    /// Time between two emitted steps.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Last sensitivity applied through [`StepSource::set_sensitivity`].
    pub fn sensitivity(&self) -> i32 {
        self.sensitivity.load(Ordering::Relaxed)
    }

    /// `true` while the walker thread is running.
    pub fn is_walking(&self) -> bool {
        self.walker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    fn spawn_walker(&self) -> Result<Walker, StepSourceError> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);
        let listeners = Arc::clone(&self.listeners);
        let interval = self.interval;

        let thread = std::thread::Builder::new()
            .name("step-simulator".into())
            .spawn(move || {
                log::debug!("step-simulator: walking every {interval:?}");
                loop {
                    std::thread::park_timeout(interval);
                    if stop_clone.load(Ordering::Relaxed) {
                        break;
                    }
                    listeners.emit();
                }
                log::debug!("step-simulator: stopped");
            })
            .map_err(|e| StepSourceError::Registration(e.to_string()))?;

        Ok(Walker { stop, thread })
    }
}

impl StepSource for SimulatedStepSource {
    fn register(&self, listener: Arc<dyn StepListener>) -> Result<(), StepSourceError> {
        if !self.available {
            return Err(StepSourceError::Unavailable(
                "simulated device has no motion sensor".into(),
            ));
        }

        let mut walker = self.walker.lock().unwrap_or_else(|e| e.into_inner());
        if walker.is_none() {
            *walker = Some(self.spawn_walker()?);
        }
        self.listeners.add(listener);
        Ok(())
    }

    fn unregister(&self, listener: &Arc<dyn StepListener>) {
        let mut walker = self.walker.lock().unwrap_or_else(|e| e.into_inner());
        self.listeners.remove(listener);
        if self.listeners.is_empty() {
            if let Some(w) = walker.take() {
                w.halt();
            }
        }
    }

    fn set_sensitivity(&self, sensitivity: i32) {
        log::debug!("step-simulator: sensitivity = {sensitivity}");
        self.sensitivity.store(sensitivity, Ordering::Relaxed);
    }
}

impl Drop for SimulatedStepSource {
    fn drop(&mut self) {
        if let Some(w) = self
            .walker
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            w.halt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    #[derive(Default)]
    struct Tally(AtomicUsize);

    impl StepListener for Tally {
        fn on_step(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn interval_follows_cadence() {
        assert_eq!(SimulatedStepSource::new(120).interval(), Duration::from_millis(500));
        assert_eq!(SimulatedStepSource::new(0).interval(), Duration::from_millis(60_000));
    }

    #[test]
    fn unavailable_source_refuses_registration() {
        let source = SimulatedStepSource::unavailable();
        let err = source
            .register(Arc::new(Tally::default()))
            .unwrap_err();
        assert!(matches!(err, StepSourceError::Unavailable(_)));
        assert!(!source.is_walking());
    }

    #[test]
    fn walker_runs_only_while_listeners_are_registered() {
        // 6000 spm → one step every 10 ms.
        let source = SimulatedStepSource::new(6_000);
        let tally = Arc::new(Tally::default());
        let listener: Arc<dyn StepListener> = tally.clone();

        source.register(Arc::clone(&listener)).expect("register");
        assert!(source.is_walking());

        let deadline = Instant::now() + Duration::from_secs(5);
        while tally.0.load(Ordering::SeqCst) < 3 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(tally.0.load(Ordering::SeqCst) >= 3);

        source.unregister(&listener);
        assert!(!source.is_walking());
    }

    #[test]
    fn sensitivity_is_stored() {
        let source = SimulatedStepSource::new(100);
        assert_eq!(source.sensitivity(), DEFAULT_SENSITIVITY);
        source.set_sensitivity(12);
        assert_eq!(source.sensitivity(), 12);
    }
}
