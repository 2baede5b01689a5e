//! Outbound channels — email transport, LinkedIn actions, AI content
//! generation, and template rendering.

pub mod ai;
pub mod email;
pub mod linkedin;
pub mod templates;

pub use ai::{AiGenerator, GenerationRequest, ScriptedGenerator};
pub use email::{EmailDispatch, EmailSender, GmailRelayProvider, SendError, SendReceipt};
pub use linkedin::{LinkedInActor, LinkedInAutomationProvider};
