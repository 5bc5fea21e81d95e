//! Session step counter.

use std::sync::Mutex;

use crate::session::Notifier;

use super::StepListener;

/// Counts step occurrences for one session and pushes every new value out.
///
/// The count lock is held across the notification, so observers always see
/// counts in increasing order even when steps race with each other.
pub struct StepCounter {
    count: Mutex<u32>,
    notifier: Notifier,
}

impl StepCounter {
    pub fn new(notifier: Notifier) -> Self {
        Self {
            count: Mutex::new(0),
            notifier,
        }
    }

    /// Current count, without side effects.
    pub fn current_value(&self) -> u32 {
        *self.count.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StepListener for StepCounter {
    fn on_step(&self) {
        let mut count = self.count.lock().unwrap_or_else(|e| e.into_inner());
        *count = count.saturating_add(1);
        log::trace!("steps: count = {}", *count);
        self.notifier.steps_changed(*count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::dispatch::{Dispatcher, RecordingCallback};
    use std::sync::Arc;

    fn counter() -> (StepCounter, Arc<RecordingCallback>) {
        let dispatcher = Arc::new(Dispatcher::new());
        dispatcher.open(1);
        let cb = RecordingCallback::new();
        dispatcher.subscribe(Some(cb.clone()));
        cb.clear();
        (StepCounter::new(Notifier::new(dispatcher, 1)), cb)
    }

    #[test]
    fn each_step_increments_by_one_and_notifies() {
        let (counter, cb) = counter();
        for _ in 0..5 {
            counter.on_step();
        }
        assert_eq!(counter.current_value(), 5);
        assert_eq!(cb.steps(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn current_value_has_no_side_effects() {
        let (counter, cb) = counter();
        counter.on_step();
        let _ = counter.current_value();
        let _ = counter.current_value();
        assert_eq!(cb.steps(), vec![1]);
    }

    #[test]
    fn concurrent_steps_are_all_counted_in_order() {
        let (counter, cb) = counter();
        let counter = Arc::new(counter);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = Arc::clone(&counter);
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        counter.on_step();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(counter.current_value(), 1_000);
        let steps = cb.steps();
        assert_eq!(steps.len(), 1_000);
        assert!(steps.windows(2).all(|w| w[1] == w[0] + 1));
    }
}
