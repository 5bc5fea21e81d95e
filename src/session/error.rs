//! Session start failures.

use thiserror::Error;

use crate::host::HostError;
use crate::steps::StepSourceError;

/// Why [`Coordinator::start`](super::Coordinator::start) refused to start a
/// session.  Every variant is fatal: nothing acquired during the attempt is
/// left held.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// Step counting is impossible without a step source.
    #[error("cannot start step counting: {0}")]
    StepSource(#[from] StepSourceError),

    /// The wake lock or status indicator could not be set up.
    #[error("cannot start step counting: {0}")]
    Host(#[from] HostError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_from_collaborator_errors() {
        let e: SessionError = StepSourceError::Unavailable("no sensor".into()).into();
        assert!(matches!(e, SessionError::StepSource(_)));
        assert!(e.to_string().contains("no sensor"));

        let e: SessionError = HostError::WakeLock("denied".into()).into();
        assert!(matches!(e, SessionError::Host(HostError::WakeLock(_))));
    }
}
