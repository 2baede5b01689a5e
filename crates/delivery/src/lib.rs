//! Delivery gating — sending windows and per-account daily caps.

pub mod daily_cap;
pub mod sending_window;

pub use daily_cap::DailyCapTracker;
pub use sending_window::SendingWindow;
