//! Speech sink that "speaks" through the log.
//!
//! Used by the headless binary, where there is no audio output.  Utterances
//! go to `log::info!` with a `speech:` prefix.

use std::sync::atomic::{AtomicBool, Ordering};

use super::{SpeechError, SpeechSink};

#[derive(Debug)]
pub struct LogSpeech {
    available: AtomicBool,
    running: AtomicBool,
}

impl Default for LogSpeech {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSpeech {
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            running: AtomicBool::new(false),
        }
    }

    /// Simulate the engine being installed or removed at runtime.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl SpeechSink for LogSpeech {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn start(&self) -> Result<(), SpeechError> {
        if !self.is_available() {
            return Err(SpeechError::Unavailable);
        }
        self.running.store(true, Ordering::SeqCst);
        log::debug!("speech: engine started");
        Ok(())
    }

    fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            log::debug!("speech: engine stopped");
        }
    }

    fn speak(&self, text: &str) -> Result<(), SpeechError> {
        if !self.is_running() {
            return Err(SpeechError::NotRunning);
        }
        log::info!("speech: {text}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speak_requires_start() {
        let speech = LogSpeech::new();
        assert!(matches!(
            speech.speak("faster!"),
            Err(SpeechError::NotRunning)
        ));

        speech.start().unwrap();
        assert!(speech.speak("faster!").is_ok());

        speech.stop();
        assert!(!speech.is_running());
    }

    #[test]
    fn unavailable_engine_refuses_start() {
        let speech = LogSpeech::new();
        speech.set_available(false);
        assert!(matches!(speech.start(), Err(SpeechError::Unavailable)));
        assert!(!speech.is_running());
    }

    #[test]
    fn stop_without_start_is_harmless() {
        let speech = LogSpeech::new();
        speech.stop();
        assert!(!speech.is_running());
    }
}
