#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod progress;
pub mod rate_guard;
pub mod wire;
pub mod workout_service;

pub use lift_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, InputError, ProgressError, WorkoutServiceError};
pub use progress::{HistoryEntry, Outcome, ProgressService, RegistrationResult};
pub use rate_guard::{Admission, RateGuard};
pub use wire::{RegistrationResponse, SetReport};
pub use workout_service::{WorkoutPlan, WorkoutService};
