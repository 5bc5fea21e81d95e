//! Pedometer service: step counting, pace tracking and spoken pace feedback
//! behind a single session coordinator.

pub mod config;
pub mod host;
pub mod pace;
pub mod session;
pub mod speech;
pub mod steps;
