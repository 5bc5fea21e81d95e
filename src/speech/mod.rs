//! Spoken pace feedback sink.
//!
//! [`SpeechSink`] is the boundary to a text-to-speech engine.  The coordinator
//! starts it lazily when the user wants voice feedback and the engine reports
//! itself available, hands it to the pace tracker, and stops it again when
//! voice is turned off or the session ends.  Any failure here only disables
//! voice; it never ends the session.

pub mod log_speech;

pub use log_speech::LogSpeech;

use thiserror::Error;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error)]
pub enum SpeechError {
    /// No speech engine is installed on this host.
    #[error("speech engine unavailable")]
    Unavailable,

    /// The engine failed to initialise.
    #[error("speech engine failed to start: {0}")]
    Init(String),

    /// `speak` was called while the engine is stopped.
    #[error("speech engine is not running")]
    NotRunning,

    /// The engine rejected an utterance.
    #[error("speech failed: {0}")]
    Speak(String),
}

// ---------------------------------------------------------------------------
// SpeechSink trait
// ---------------------------------------------------------------------------

/// Text-to-speech engine with an explicit start/stop lifecycle.
pub trait SpeechSink: Send + Sync {
    /// Whether the engine can be used at all on this host right now.
    fn is_available(&self) -> bool;

    /// Bring the engine up.  Called at most once per running period.
    fn start(&self) -> Result<(), SpeechError>;

    /// Shut the engine down, discarding anything still queued.
    fn stop(&self);

    /// Queue `text` for vocalisation.
    fn speak(&self, text: &str) -> Result<(), SpeechError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechSink>) {}
};

// ---------------------------------------------------------------------------
// RecordingSpeech  (test-only)
// ---------------------------------------------------------------------------

/// Speech double that records lifecycle calls and utterances.
#[cfg(test)]
pub struct RecordingSpeech {
    available: std::sync::atomic::AtomicBool,
    fail_start: bool,
    starts: std::sync::atomic::AtomicUsize,
    stops: std::sync::atomic::AtomicUsize,
    utterances: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingSpeech {
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::with(true, false))
    }

    pub fn unavailable() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::with(false, false))
    }

    pub fn failing_start() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::with(true, true))
    }

    fn with(available: bool, fail_start: bool) -> Self {
        Self {
            available: std::sync::atomic::AtomicBool::new(available),
            fail_start,
            starts: Default::default(),
            stops: Default::default(),
            utterances: Default::default(),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available
            .store(available, std::sync::atomic::Ordering::SeqCst);
    }

    /// Calls to `start`, including failed ones.
    pub fn starts(&self) -> usize {
        self.starts.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn utterances(&self) -> Vec<String> {
        self.utterances.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl SpeechSink for RecordingSpeech {
    fn is_available(&self) -> bool {
        self.available.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn start(&self) -> Result<(), SpeechError> {
        self.starts
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.fail_start {
            return Err(SpeechError::Init("voice data missing".into()));
        }
        Ok(())
    }

    fn stop(&self) {
        self.stops.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }

    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        self.utterances.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
