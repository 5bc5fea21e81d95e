//! Outbound notification path.
//!
//! [`Dispatcher`] owns the one external [`SessionCallback`] together with the
//! last count and pace it has seen.  Everything that leaves the crate goes
//! through it, under a single mutex, so:
//!
//! * swapping the callback is atomic with respect to delivery,
//! * closing the dispatcher is a barrier: once [`Dispatcher::close`] returns
//!   no further callback invocation can start,
//! * deliveries stamped with an older session generation are dropped.
//!
//! Callbacks run while the mutex is held and must not call back into the
//! coordinator.

use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// SessionCallback
// ---------------------------------------------------------------------------

/// Observer attached by the UI layer.  Both notifications are
/// "last value wins".
///
/// # Re-entrancy
///
/// Notifications are delivered while the step counter, pace tracker or
/// coordinator lock is held.  An implementation must not call back into the
/// [`Coordinator`](super::Coordinator) (not even `step_count()` or
/// `pace()`): that deadlocks.  Keep the values passed in instead; a newly
/// registered callback receives both current values immediately.
pub trait SessionCallback: Send + Sync {
    /// The session step count changed.
    fn steps_changed(&self, count: u32);

    /// The pace estimate (steps per minute) changed.
    fn pace_changed(&self, pace: u32);
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

struct DispatchState {
    callback: Option<Arc<dyn SessionCallback>>,
    generation: u64,
    open: bool,
    steps: u32,
    pace: u32,
}

/// Guarded subscription plus the last values pushed through it.
pub struct Dispatcher {
    state: Mutex<DispatchState>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DispatchState {
                callback: None,
                generation: 0,
                open: false,
                steps: 0,
                pace: 0,
            }),
        }
    }

    /// Replace the subscription.
    ///
    /// A new callback immediately receives the last known count and pace,
    /// inside this call.  `None` detaches; values keep being tracked.
    pub fn subscribe(&self, callback: Option<Arc<dyn SessionCallback>>) {
        let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
        st.callback = callback;
        if let Some(cb) = &st.callback {
            cb.steps_changed(st.steps);
            cb.pace_changed(st.pace);
        }
    }

    /// Start accepting deliveries for `generation`, with values reset to 0.
    /// A subscribed callback is told about the reset.
    pub(crate) fn open(&self, generation: u64) {
        let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
        st.generation = generation;
        st.open = true;
        st.steps = 0;
        st.pace = 0;
        if let Some(cb) = &st.callback {
            cb.steps_changed(0);
            cb.pace_changed(0);
        }
    }

    /// Stop accepting deliveries.  Returns once any in-progress callback has
    /// finished.
    pub(crate) fn close(&self) {
        let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
        st.open = false;
    }

    /// Last `(steps, pace)` accepted.
    pub fn last_values(&self) -> (u32, u32) {
        let st = self.state.lock().unwrap_or_else(|e| e.into_inner());
        (st.steps, st.pace)
    }

    fn deliver(&self, generation: u64, update: impl FnOnce(&mut DispatchState)) {
        let mut st = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if !st.open || st.generation != generation {
            log::debug!("dispatch: dropping update from closed generation {generation}");
            return;
        }
        update(&mut st);
    }
}

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Handle given to a session's listeners; every update it sends is stamped
/// with the session generation it was created for.
#[derive(Clone)]
pub struct Notifier {
    dispatcher: Arc<Dispatcher>,
    generation: u64,
}

impl Notifier {
    pub(crate) fn new(dispatcher: Arc<Dispatcher>, generation: u64) -> Self {
        Self {
            dispatcher,
            generation,
        }
    }

    pub fn steps_changed(&self, count: u32) {
        self.dispatcher.deliver(self.generation, |st| {
            st.steps = count;
            if let Some(cb) = &st.callback {
                cb.steps_changed(count);
            }
        });
    }

    pub fn pace_changed(&self, pace: u32) {
        self.dispatcher.deliver(self.generation, |st| {
            st.pace = pace;
            if let Some(cb) = &st.callback {
                cb.pace_changed(pace);
            }
        });
    }
}

// ---------------------------------------------------------------------------
// RecordingCallback  (test-only)
// ---------------------------------------------------------------------------

/// One observed callback invocation.
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Steps(u32),
    Pace(u32),
}

/// Callback that records every invocation in order.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingCallback {
    seen: Mutex<Vec<Notification>>,
}

#[cfg(test)]
impl RecordingCallback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seen(&self) -> Vec<Notification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn steps(&self) -> Vec<u32> {
        self.seen()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Steps(v) => Some(v),
                Notification::Pace(_) => None,
            })
            .collect()
    }

    pub fn paces(&self) -> Vec<u32> {
        self.seen()
            .into_iter()
            .filter_map(|n| match n {
                Notification::Pace(v) => Some(v),
                Notification::Steps(_) => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.seen.lock().unwrap().clear();
    }
}

#[cfg(test)]
impl SessionCallback for RecordingCallback {
    fn steps_changed(&self, count: u32) {
        self.seen.lock().unwrap().push(Notification::Steps(count));
    }

    fn pace_changed(&self, pace: u32) {
        self.seen.lock().unwrap().push(Notification::Pace(pace));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn open_dispatcher(generation: u64) -> (Arc<Dispatcher>, Notifier) {
        let dispatcher = Arc::new(Dispatcher::new());
        dispatcher.open(generation);
        let notifier = Notifier::new(Arc::clone(&dispatcher), generation);
        (dispatcher, notifier)
    }

    #[test]
    fn subscribe_pushes_last_values_synchronously() {
        let (dispatcher, notifier) = open_dispatcher(1);
        notifier.steps_changed(4);
        notifier.pace_changed(96);

        let cb = RecordingCallback::new();
        dispatcher.subscribe(Some(cb.clone()));

        assert_eq!(
            cb.seen(),
            vec![Notification::Steps(4), Notification::Pace(96)]
        );
    }

    #[test]
    fn reopening_pushes_reset_to_subscribed_callback() {
        let (dispatcher, old) = open_dispatcher(1);
        let cb = RecordingCallback::new();
        dispatcher.subscribe(Some(cb.clone()));
        old.steps_changed(12);
        old.pace_changed(104);
        dispatcher.close();
        cb.clear();

        dispatcher.open(2);

        assert_eq!(cb.seen(), vec![Notification::Steps(0), Notification::Pace(0)]);
        assert_eq!(dispatcher.last_values(), (0, 0));
    }

    #[test]
    fn open_without_callback_is_silent() {
        let dispatcher = Dispatcher::new();
        dispatcher.open(1);
        assert_eq!(dispatcher.last_values(), (0, 0));
    }

    #[test]
    fn replacing_callback_stops_old_one() {
        let (dispatcher, notifier) = open_dispatcher(1);
        let first = RecordingCallback::new();
        let second = RecordingCallback::new();

        dispatcher.subscribe(Some(first.clone()));
        dispatcher.subscribe(Some(second.clone()));
        first.clear();
        second.clear();

        notifier.steps_changed(1);

        assert!(first.seen().is_empty());
        assert_eq!(second.steps(), vec![1]);
    }

    #[test]
    fn detached_dispatcher_still_tracks_values() {
        let (dispatcher, notifier) = open_dispatcher(1);
        let cb = RecordingCallback::new();
        dispatcher.subscribe(Some(cb.clone()));
        dispatcher.subscribe(None);
        cb.clear();

        notifier.steps_changed(7);

        assert!(cb.seen().is_empty());
        assert_eq!(dispatcher.last_values(), (7, 0));
    }

    #[test]
    fn closed_dispatcher_drops_updates() {
        let (dispatcher, notifier) = open_dispatcher(1);
        let cb = RecordingCallback::new();
        dispatcher.subscribe(Some(cb.clone()));
        cb.clear();

        dispatcher.close();
        notifier.steps_changed(3);

        assert!(cb.seen().is_empty());
        assert_eq!(dispatcher.last_values(), (0, 0));
    }

    #[test]
    fn stale_generation_is_ignored_after_reopen() {
        let (dispatcher, old) = open_dispatcher(1);
        dispatcher.close();
        dispatcher.open(2);
        let cb = RecordingCallback::new();
        dispatcher.subscribe(Some(cb.clone()));
        cb.clear();

        old.steps_changed(50);

        assert!(cb.seen().is_empty());
        assert_eq!(dispatcher.last_values(), (0, 0));
    }

    #[test]
    fn dispatcher_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dispatcher>();
        assert_send_sync::<Notifier>();
    }
}
