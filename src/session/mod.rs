//! Step-counting session: lifecycle coordination and outbound notifications.
//!
//! * [`Coordinator`] — start/stop, configuration reload, desired pace and the
//!   single observer subscription.
//! * [`Dispatcher`] / [`Notifier`] — the guarded path every step and pace
//!   update takes on its way to the [`SessionCallback`].

pub mod coordinator;
pub mod dispatch;
pub mod error;

pub use coordinator::{Collaborators, Coordinator};
pub use dispatch::{Dispatcher, Notifier, SessionCallback};
pub use error::SessionError;
