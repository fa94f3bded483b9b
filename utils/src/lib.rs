//! Shared utilities for the Sonic Vote election engine.

pub mod time;

pub use time::{format_countdown, format_duration};
