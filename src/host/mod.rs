//! Host resources held for the duration of a session.
//!
//! * [`WakeLock`] — keeps the host from suspending sampling.
//! * [`StatusIndicator`] — persistent "counting steps" notice, cleared on
//!   stop, plus the one-off acknowledgment shown when the session ends.
//!
//! The in-process implementations ([`ProcessWakeLock`],
//! [`LogStatusIndicator`]) back the headless binary; a platform binding
//! implements the same traits.

pub mod status;
pub mod wake;

pub use status::LogStatusIndicator;
pub use wake::ProcessWakeLock;

use thiserror::Error;

use crate::config::StatusConfig;

// ---------------------------------------------------------------------------
// HostError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Error)]
pub enum HostError {
    #[error("cannot acquire wake lock: {0}")]
    WakeLock(String),

    #[error("cannot show status indicator: {0}")]
    StatusIndicator(String),
}

// ---------------------------------------------------------------------------
// StatusNotice
// ---------------------------------------------------------------------------

/// Content of the persistent status indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNotice {
    pub title: String,
    pub subtitle: String,
}

impl From<&StatusConfig> for StatusNotice {
    fn from(config: &StatusConfig) -> Self {
        Self {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

pub trait WakeLock: Send + Sync {
    fn acquire(&self) -> Result<(), HostError>;
    fn release(&self);
}

pub trait StatusIndicator: Send + Sync {
    /// Show (or update) the persistent notice.
    fn show(&self, notice: &StatusNotice) -> Result<(), HostError>;

    /// Remove the persistent notice.
    fn clear(&self);

    /// Brief user-visible message, e.g. "Pedometer stopped".
    fn acknowledge(&self, message: &str);
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Wake lock that counts acquisitions and can be told to fail.
#[cfg(test)]
#[derive(Default)]
pub struct MockWakeLock {
    fail: bool,
    acquired: std::sync::atomic::AtomicUsize,
    released: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockWakeLock {
    /// A wake lock whose every `acquire` is refused.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn is_held(&self) -> bool {
        self.acquired() > self.released()
    }
}

#[cfg(test)]
impl WakeLock for MockWakeLock {
    fn acquire(&self) -> Result<(), HostError> {
        if self.fail {
            return Err(HostError::WakeLock("denied".into()));
        }
        self.acquired
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }

    fn release(&self) {
        self.released
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

/// One call observed by [`MockStatusIndicator`].
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    Shown(StatusNotice),
    Cleared,
    Acknowledged(String),
}

/// Status indicator that records every call.
#[cfg(test)]
#[derive(Default)]
pub struct MockStatusIndicator {
    fail: bool,
    events: std::sync::Mutex<Vec<StatusEvent>>,
}

#[cfg(test)]
impl MockStatusIndicator {
    /// An indicator whose every `show` is refused.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl StatusIndicator for MockStatusIndicator {
    fn show(&self, notice: &StatusNotice) -> Result<(), HostError> {
        if self.fail {
            return Err(HostError::StatusIndicator("no notification channel".into()));
        }
        self.events
            .lock()
            .unwrap()
            .push(StatusEvent::Shown(notice.clone()));
        Ok(())
    }

    fn clear(&self) {
        self.events.lock().unwrap().push(StatusEvent::Cleared);
    }

    fn acknowledge(&self, message: &str) {
        self.events
            .lock()
            .unwrap()
            .push(StatusEvent::Acknowledged(message.to_string()));
    }
}
