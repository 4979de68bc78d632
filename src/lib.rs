//! Terminal Pomodoro timer.
//!
//! Alternates work and break intervals drawn as a live progress bar, sends a
//! desktop notification at every interval boundary and keeps interval
//! lengths, session count and bar colors in a small key=value file.

pub mod args;
pub mod config;
pub mod logging;
pub mod notify;
pub mod render;
pub mod terminal;
pub mod timer;
