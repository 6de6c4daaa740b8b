#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod insights_service;
pub mod progress_service;

pub use progress_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, InsightsError, ProgressServiceError};
pub use insights_service::{Dashboard, InsightsService};
pub use progress_service::{ProgressService, RecordedAttempt};
