//! Set registration and progress queries.

mod outcome;
mod service;

pub use outcome::{HistoryEntry, Outcome, RegistrationResult};
pub use service::ProgressService;
