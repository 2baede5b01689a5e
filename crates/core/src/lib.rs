pub mod config;
pub mod error;
pub mod event_bus;
pub mod types;
