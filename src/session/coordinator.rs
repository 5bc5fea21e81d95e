//! Session coordinator: owns the step/pace session and its host resources.
//!
//! # Lifecycle
//!
//! ```text
//! start()
//!   ├─ show status notice          ┐
//!   ├─ acquire wake lock           │ undone in reverse order
//!   ├─ open dispatcher (gen N)     │ if any later step fails
//!   ├─ register StepCounter        │
//!   ├─ register PaceTracker        ┘
//!   ├─ read preferences            (cannot fail; anomalies use defaults)
//!   └─ apply sensitivity + voice decision
//!
//! stop()
//!   ├─ unregister listeners
//!   ├─ close dispatcher            ← nothing reaches the callback after this
//!   ├─ stop speech (if running)
//!   ├─ release wake lock
//!   └─ clear status notice, acknowledge "stopped"
//! ```
//!
//! All control methods take `&self`; share the coordinator as
//! `Arc<Coordinator>` between the control thread and anything else.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::{ConfigSource, PaceConfig, Preferences, StatusConfig};
use crate::host::{StatusIndicator, StatusNotice, WakeLock};
use crate::pace::{Clock, PaceTracker};
use crate::speech::SpeechSink;
use crate::steps::{StepCounter, StepListener, StepSource};

use super::dispatch::{Dispatcher, Notifier, SessionCallback};
use super::error::SessionError;

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// External collaborators the coordinator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub steps: Arc<dyn StepSource>,
    /// `None` when the host has no speech engine at all.
    pub speech: Option<Arc<dyn SpeechSink>>,
    pub config: Arc<dyn ConfigSource>,
    pub wake_lock: Arc<dyn WakeLock>,
    pub status: Arc<dyn StatusIndicator>,
    pub clock: Arc<dyn Clock>,
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

struct Session {
    counter: Arc<StepCounter>,
    pace: Arc<PaceTracker>,
    counter_listener: Arc<dyn StepListener>,
    pace_listener: Arc<dyn StepListener>,
    /// Last applied voice decision, whether or not the engine came up.
    voice_wanted: bool,
    speech_running: bool,
}

#[derive(Default)]
struct CoordinatorState {
    session: Option<Session>,
    desired_pace: u32,
    generation: u64,
}

// ---------------------------------------------------------------------------
// StartGuard (scoped rollback for a partial start)
// ---------------------------------------------------------------------------

enum Acquired {
    Status,
    WakeLock,
    Dispatch,
    Listener(Arc<dyn StepListener>),
}

struct StartGuard<'a> {
    coordinator: &'a Coordinator,
    acquired: Vec<Acquired>,
}

impl<'a> StartGuard<'a> {
    fn new(coordinator: &'a Coordinator) -> Self {
        Self {
            coordinator,
            acquired: Vec::new(),
        }
    }

    fn push(&mut self, acquired: Acquired) {
        self.acquired.push(acquired);
    }

    /// Keep everything acquired so far.
    fn commit(mut self) {
        self.acquired.clear();
    }
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        let c = self.coordinator;
        while let Some(acquired) = self.acquired.pop() {
            match acquired {
                Acquired::Listener(listener) => c.collaborators.steps.unregister(&listener),
                Acquired::Dispatch => c.dispatcher.close(),
                Acquired::WakeLock => c.collaborators.wake_lock.release(),
                Acquired::Status => c.collaborators.status.clear(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Step-counting session coordinator.
///
/// ```rust
/// use std::sync::Arc;
/// use pedometer_service::config::{MemoryConfigSource, PaceConfig, StatusConfig};
/// use pedometer_service::host::{LogStatusIndicator, ProcessWakeLock};
/// use pedometer_service::pace::SystemClock;
/// use pedometer_service::session::{Collaborators, Coordinator};
/// use pedometer_service::speech::LogSpeech;
/// use pedometer_service::steps::SimulatedStepSource;
///
/// let coordinator = Coordinator::new(
///     Collaborators {
///         steps: Arc::new(SimulatedStepSource::new(110)),
///         speech: Some(Arc::new(LogSpeech::new())),
///         config: Arc::new(MemoryConfigSource::new()),
///         wake_lock: Arc::new(ProcessWakeLock::new()),
///         status: Arc::new(LogStatusIndicator::new()),
///         clock: Arc::new(SystemClock),
///     },
///     PaceConfig::default(),
///     StatusConfig::default(),
/// );
///
/// coordinator.set_desired_pace(100);
/// coordinator.start().expect("step sensor available");
/// assert!(coordinator.is_running());
/// coordinator.stop();
/// ```
pub struct Coordinator {
    collaborators: Collaborators,
    pace_config: PaceConfig,
    status_config: StatusConfig,
    dispatcher: Arc<Dispatcher>,
    state: Mutex<CoordinatorState>,
}

impl Coordinator {
    pub fn new(
        collaborators: Collaborators,
        pace_config: PaceConfig,
        status_config: StatusConfig,
    ) -> Self {
        Self {
            collaborators,
            pace_config,
            status_config,
            dispatcher: Arc::new(Dispatcher::new()),
            state: Mutex::new(CoordinatorState::default()),
        }
    }

    // -----------------------------------------------------------------------
    // Session control
    // -----------------------------------------------------------------------

    /// Start a session.
    ///
    /// Calling `start` on a running session does nothing.  On failure every
    /// resource acquired during the attempt is released before returning.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Host`]: status indicator or wake lock refused.
    /// - [`SessionError::StepSource`]: the step source cannot deliver steps.
    pub fn start(&self) -> Result<(), SessionError> {
        let mut st = self.lock();
        if st.session.is_some() {
            log::debug!("session: start ignored, already running");
            return Ok(());
        }

        st.generation += 1;
        let generation = st.generation;

        match self.try_start(generation, st.desired_pace) {
            Ok(mut session) => {
                let prefs = self.read_preferences();
                self.collaborators.steps.set_sensitivity(prefs.sensitivity);
                self.apply_voice(&mut session, &prefs);
                st.session = Some(session);
                log::info!("session: started (generation {generation})");
                Ok(())
            }
            Err(e) => {
                log::error!("session: start failed: {e}");
                Err(e)
            }
        }
    }

    fn try_start(&self, generation: u64, desired_pace: u32) -> Result<Session, SessionError> {
        let c = &self.collaborators;
        let mut guard = StartGuard::new(self);

        c.status.show(&StatusNotice::from(&self.status_config))?;
        guard.push(Acquired::Status);

        c.wake_lock.acquire()?;
        guard.push(Acquired::WakeLock);

        self.dispatcher.open(generation);
        guard.push(Acquired::Dispatch);

        let notifier = Notifier::new(Arc::clone(&self.dispatcher), generation);
        let counter = Arc::new(StepCounter::new(notifier.clone()));
        let pace = Arc::new(PaceTracker::new(
            &self.pace_config,
            desired_pace,
            Arc::clone(&c.clock),
            notifier,
        ));

        let counter_listener: Arc<dyn StepListener> = counter.clone();
        c.steps.register(Arc::clone(&counter_listener))?;
        guard.push(Acquired::Listener(Arc::clone(&counter_listener)));

        let pace_listener: Arc<dyn StepListener> = pace.clone();
        c.steps.register(Arc::clone(&pace_listener))?;
        guard.push(Acquired::Listener(Arc::clone(&pace_listener)));

        guard.commit();
        Ok(Session {
            counter,
            pace,
            counter_listener,
            pace_listener,
            voice_wanted: false,
            speech_running: false,
        })
    }

    /// End the session.  A no-op when no session is running.
    ///
    /// Once this returns, the registered callback is not invoked again for
    /// this session, even for a step that was already being delivered.
    pub fn stop(&self) {
        let mut st = self.lock();
        let Some(session) = st.session.take() else {
            log::debug!("session: stop ignored, not running");
            return;
        };
        let c = &self.collaborators;

        c.steps.unregister(&session.counter_listener);
        c.steps.unregister(&session.pace_listener);
        self.dispatcher.close();

        if session.speech_running {
            session.pace.set_speech(None);
            if let Some(speech) = &c.speech {
                speech.stop();
            }
        }

        c.wake_lock.release();
        c.status.clear();
        c.status.acknowledge(&self.status_config.stopped_message);

        log::info!(
            "session: stopped after {} steps (generation {})",
            session.counter.current_value(),
            st.generation
        );
    }

    /// Re-read the configuration source and apply it to the running session.
    ///
    /// Before `start` this does nothing; `start` reads the configuration
    /// itself.
    pub fn reload_configuration(&self) {
        let mut st = self.lock();
        let Some(session) = st.session.as_mut() else {
            log::debug!("session: reload ignored, not running");
            return;
        };

        let prefs = self.read_preferences();
        log::debug!("session: reloaded preferences {prefs:?}");
        self.collaborators.steps.set_sensitivity(prefs.sensitivity);
        self.apply_voice(session, &prefs);
    }

    /// Set the target pace in steps per minute.  Stored for later sessions
    /// and forwarded to the running one.
    pub fn set_desired_pace(&self, desired_pace: u32) {
        let mut st = self.lock();
        st.desired_pace = desired_pace;
        if let Some(session) = &st.session {
            session.pace.set_desired_pace(desired_pace);
        }
    }

    /// Replace the observer.  A new callback immediately receives the last
    /// known step count and pace, inside this call.  `None` detaches.
    pub fn register_callback(&self, callback: Option<Arc<dyn SessionCallback>>) {
        self.dispatcher.subscribe(callback);
    }

    pub fn unregister_callback(&self) {
        self.dispatcher.subscribe(None);
    }

    /// Let the pace decay to 0 when the walker has stopped.  Call
    /// periodically (about once a second).
    pub fn tick(&self) {
        let st = self.lock();
        if let Some(session) = &st.session {
            session.pace.tick();
        }
    }

    // -----------------------------------------------------------------------
    // Probes
    // -----------------------------------------------------------------------

    pub fn is_running(&self) -> bool {
        self.lock().session.is_some()
    }

    pub fn desired_pace(&self) -> u32 {
        self.lock().desired_pace
    }

    /// Step count of the running session, or the last count seen.
    pub fn step_count(&self) -> u32 {
        match &self.lock().session {
            Some(session) => session.counter.current_value(),
            None => self.dispatcher.last_values().0,
        }
    }

    /// Pace of the running session, or the last pace seen.
    pub fn pace(&self) -> u32 {
        match &self.lock().session {
            Some(session) => session.pace.current_pace(),
            None => self.dispatcher.last_values().1,
        }
    }

    /// Whether the speech sink is currently started for this session.
    pub fn is_speaking_enabled(&self) -> bool {
        self.lock()
            .session
            .as_ref()
            .is_some_and(|s| s.speech_running)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_preferences(&self) -> Preferences {
        let config = &self.collaborators.config;
        if let Err(e) = config.reload() {
            log::warn!("session: config reload failed ({e}), keeping previous values");
        }
        Preferences::read(config.as_ref())
    }

    /// Start or stop speech when the voice decision (user wants voice and an
    /// engine is available) changes.  An unchanged decision does nothing, so
    /// an engine that failed to start is not retried until the decision goes
    /// off and on again.
    fn apply_voice(&self, session: &mut Session, prefs: &Preferences) {
        let speech = self.collaborators.speech.as_ref();
        let available = speech.is_some_and(|s| s.is_available());
        let wants_voice = prefs.wants_voice() && available;

        if wants_voice == session.voice_wanted {
            return;
        }
        session.voice_wanted = wants_voice;

        match (wants_voice, speech) {
            (true, Some(speech)) => match speech.start() {
                Ok(()) => {
                    session.pace.set_speech(Some(Arc::clone(speech)));
                    session.speech_running = true;
                    log::info!("session: voice feedback on");
                }
                Err(e) => log::warn!("session: speech unavailable ({e}), continuing without voice"),
            },
            (false, _) if session.speech_running => {
                session.pace.set_speech(None);
                if let Some(speech) = speech {
                    speech.stop();
                }
                session.speech_running = false;
                log::info!("session: voice feedback off");
            }
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
