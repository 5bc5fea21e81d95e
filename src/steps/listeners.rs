//! Registered-listener bookkeeping shared by step source implementations.

use std::sync::{Arc, Mutex};

use super::StepListener;

/// Thread-safe list of step listeners.
///
/// [`emit`](Self::emit) snapshots the list before calling out, so a listener
/// may be unregistered from another thread while a step is being delivered.
#[derive(Default)]
pub struct ListenerSet {
    listeners: Mutex<Vec<Arc<dyn StepListener>>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `listener`.  Adding the same `Arc` twice is ignored.
    pub fn add(&self, listener: Arc<dyn StepListener>) {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        if !listeners.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            listeners.push(listener);
        }
    }

    /// Remove `listener` by identity.  Returns `true` if it was present.
    pub fn remove(&self, listener: &Arc<dyn StepListener>) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(|e| e.into_inner());
        let before = listeners.len();
        listeners.retain(|l| !Arc::ptr_eq(l, listener));
        listeners.len() != before
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver one step occurrence to every listener.
    pub fn emit(&self) {
        let snapshot: Vec<Arc<dyn StepListener>> = self
            .listeners
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        for listener in snapshot {
            listener.on_step();
        }
    }
}
