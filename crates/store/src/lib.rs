//! In-memory stores backed by DashMap.
//!
//! Production: replace with PostgreSQL (sqlx) or similar ACID store. These
//! provide the same API surface for development and testing, including the
//! optimistic-concurrency enrollment advance the engine relies on.

pub mod accounts;
pub mod campaigns;
pub mod contacts;
pub mod enrollments;
pub mod ledger;

pub use accounts::AccountStore;
pub use campaigns::CampaignStore;
pub use contacts::ContactStore;
pub use enrollments::EnrollmentStore;
pub use ledger::ExecutionLedger;
