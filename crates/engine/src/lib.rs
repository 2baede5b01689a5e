//! Campaign execution engine — walks each enrolled contact through a
//! campaign's ordered flow of typed nodes, persisting progress and honoring
//! sending windows, daily caps, and at-least-once re-invocation.

pub mod clock;
pub mod engine;
pub mod outcome;
pub mod processors;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{CampaignEngine, EnrollOutcome};
pub use outcome::{ExecutionContext, ExecutionOutcome};
pub use processors::NodeProcessor;
