#![forbid(unsafe_code)]

pub mod model;
pub mod progression;
pub mod settings;
pub mod time;
pub mod tracker;

pub use progression::ProgressionPolicy;
pub use settings::{ProgressSettings, SettingsError};
pub use time::{Clock, SessionWindow, SessionWindowError};
pub use tracker::{SessionPhase, SessionStatus, session_status};
