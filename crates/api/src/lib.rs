//! HTTP surface — campaign lifecycle, enrollment management, the cron
//! sweep trigger, and engagement webhooks.

pub mod handlers;
pub mod models;
pub mod router;

pub use handlers::ApiState;
pub use router::api_router;
