//! Application use cases. Orchestrate domain logic via ports.

pub mod dashboard_service;
pub mod dataset_loader;

pub use dashboard_service::{DashboardService, DashboardSnapshot};
pub use dataset_loader::{DatasetLoader, LoadOptions, LoaderStatus};
