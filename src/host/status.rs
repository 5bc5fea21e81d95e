//! Status indicator that renders to the log.

use std::sync::Mutex;

use super::{HostError, StatusIndicator, StatusNotice};

#[derive(Debug, Default)]
pub struct LogStatusIndicator {
    current: Mutex<Option<StatusNotice>>,
}

impl LogStatusIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The notice currently on display, if any.
    pub fn current(&self) -> Option<StatusNotice> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl StatusIndicator for LogStatusIndicator {
    fn show(&self, notice: &StatusNotice) -> Result<(), HostError> {
        log::info!("status: {} | {}", notice.title, notice.subtitle);
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(notice.clone());
        Ok(())
    }

    fn clear(&self) {
        if self
            .current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .is_some()
        {
            log::debug!("status: cleared");
        }
    }

    fn acknowledge(&self, message: &str) {
        log::info!("status: {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_then_clear() {
        let indicator = LogStatusIndicator::new();
        let notice = StatusNotice {
            title: "Pedometer".into(),
            subtitle: "Counting your steps".into(),
        };

        indicator.show(&notice).unwrap();
        assert_eq!(indicator.current(), Some(notice));

        indicator.clear();
        assert_eq!(indicator.current(), None);
    }
}
