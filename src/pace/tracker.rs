//! Pace state machine.
//!
//! # Estimate
//!
//! Each step pushes the interval since the previous step into a rolling
//! window of at most `window_size` intervals.  Once `min_intervals` are held
//! the pace is `60 000 / mean interval (ms)`, rounded.  A gap longer than
//! `idle_timeout_ms` restarts the window, and [`PaceTracker::tick`] drops the
//! pace to 0 when no step has arrived for that long.
//!
//! # Notifications
//!
//! A pace-changed notification goes out only when the rounded value differs
//! from the last one sent.  Target changes are never notified.
//!
//! # Speech
//!
//! With a sink attached and a non-zero target, each step-driven estimate is
//! classified into a [`PaceBucket`].  The bucket's phrase is spoken when it
//! differs from the last spoken bucket and at least `min_speech_gap_ms` has
//! passed since the previous utterance.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::PaceConfig;
use crate::session::Notifier;
use crate::speech::SpeechSink;
use crate::steps::StepListener;

use super::{Clock, PaceBucket};

/// Largest accepted `window_size`; a minute of intervals at a brisk walk.
pub const MAX_WINDOW_SIZE: usize = 120;

struct PaceState {
    desired_pace: u32,
    current_pace: u32,
    speech: Option<Arc<dyn SpeechSink>>,
    last_spoken_bucket: Option<PaceBucket>,
    last_spoken_at: Option<Instant>,
    last_step_at: Option<Instant>,
    intervals_ms: VecDeque<u64>,
}

pub struct PaceTracker {
    state: Mutex<PaceState>,
    clock: Arc<dyn Clock>,
    notifier: Notifier,
    window_size: usize,
    min_intervals: usize,
    idle_timeout: Duration,
    min_speech_gap: Duration,
}

impl PaceTracker {
    pub fn new(
        config: &PaceConfig,
        desired_pace: u32,
        clock: Arc<dyn Clock>,
        notifier: Notifier,
    ) -> Self {
        let window_size = if config.window_size > MAX_WINDOW_SIZE {
            log::warn!(
                "pace: window_size {} is too large, using {MAX_WINDOW_SIZE}",
                config.window_size
            );
            MAX_WINDOW_SIZE
        } else {
            config.window_size.max(1)
        };
        Self {
            state: Mutex::new(PaceState {
                desired_pace,
                current_pace: 0,
                speech: None,
                last_spoken_bucket: None,
                last_spoken_at: None,
                last_step_at: None,
                intervals_ms: VecDeque::with_capacity(window_size),
            }),
            clock,
            notifier,
            window_size,
            min_intervals: config.min_intervals.clamp(1, window_size),
            idle_timeout: Duration::from_millis(config.idle_timeout_ms),
            min_speech_gap: Duration::from_millis(config.min_speech_gap_ms),
        }
    }

    /// Current estimate in steps per minute; 0 before the first estimate.
    pub fn current_pace(&self) -> u32 {
        self.lock().current_pace
    }

    pub fn desired_pace(&self) -> u32 {
        self.lock().desired_pace
    }

    /// Change the target.  Emits nothing; the next spoken feedback is judged
    /// against the new target.
    pub fn set_desired_pace(&self, desired_pace: u32) {
        let mut st = self.lock();
        if st.desired_pace != desired_pace {
            log::debug!("pace: desired pace {} -> {desired_pace}", st.desired_pace);
            st.desired_pace = desired_pace;
            st.last_spoken_bucket = None;
        }
    }

    /// Attach or detach the speech sink.
    pub fn set_speech(&self, speech: Option<Arc<dyn SpeechSink>>) {
        let mut st = self.lock();
        st.speech = speech;
        st.last_spoken_bucket = None;
        st.last_spoken_at = None;
    }

    pub fn has_speech(&self) -> bool {
        self.lock().speech.is_some()
    }

    /// Decay the pace to 0 once the walker has been still for longer than the
    /// idle timeout.
    pub fn tick(&self) {
        let now = self.clock.now();
        let mut st = self.lock();
        let Some(last) = st.last_step_at else {
            return;
        };
        if now.saturating_duration_since(last) > self.idle_timeout {
            st.intervals_ms.clear();
            self.publish(&mut st, 0);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PaceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, st: &mut PaceState, pace: u32) {
        if st.current_pace != pace {
            log::debug!("pace: {} -> {pace} spm", st.current_pace);
            st.current_pace = pace;
            self.notifier.pace_changed(pace);
        }
    }

    fn estimate(&self, st: &PaceState) -> Option<u32> {
        if st.intervals_ms.len() < self.min_intervals {
            return None;
        }
        let sum: u64 = st.intervals_ms.iter().sum();
        if sum == 0 {
            return None;
        }
        let count = st.intervals_ms.len() as u64;
        let pace = (60_000 * count + sum / 2) / sum;
        Some(u32::try_from(pace).unwrap_or(u32::MAX))
    }

    fn maybe_speak(&self, st: &mut PaceState, now: Instant) {
        let Some(speech) = st.speech.clone() else {
            return;
        };
        let Some(bucket) = PaceBucket::classify(st.current_pace, st.desired_pace) else {
            return;
        };
        if st.last_spoken_bucket == Some(bucket) {
            return;
        }
        if let Some(at) = st.last_spoken_at {
            if now.saturating_duration_since(at) < self.min_speech_gap {
                return;
            }
        }

        match speech.speak(bucket.phrase()) {
            Ok(()) => {
                st.last_spoken_bucket = Some(bucket);
                st.last_spoken_at = Some(now);
            }
            Err(e) => log::warn!("pace: speech failed ({e}), feedback skipped"),
        }
    }
}

impl StepListener for PaceTracker {
    fn on_step(&self) {
        let now = self.clock.now();
        let mut st = self.lock();

        if let Some(prev) = st.last_step_at {
            let gap = now.saturating_duration_since(prev);
            if gap > self.idle_timeout {
                st.intervals_ms.clear();
            } else {
                st.intervals_ms.push_back(gap.as_millis() as u64);
                while st.intervals_ms.len() > self.window_size {
                    st.intervals_ms.pop_front();
                }
            }
        }
        st.last_step_at = Some(now);

        if let Some(pace) = self.estimate(&st) {
            self.publish(&mut st, pace);
            self.maybe_speak(&mut st, now);
        }
    }
}
