//! Pace estimation and spoken pace feedback.
//!
//! * [`PaceTracker`]: rolling-window pace estimator, notifier and speech
//!   driver.  Registered with the step source alongside the step counter.
//! * [`PaceBucket`]: classification of a pace against the target, with the
//!   phrase to speak for each band.
//! * [`Clock`] / [`SystemClock`] / [`ManualClock`]: time source used to
//!   stamp step occurrences.

pub mod clock;
pub mod feedback;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use feedback::PaceBucket;
pub use tracker::PaceTracker;
