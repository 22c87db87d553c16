//! Core domain layer. No external I/O dependencies.
//!
//! Entities, the payload trust boundary, filter state and aggregate derivation live here.

pub mod analytics;
pub mod entities;
pub mod errors;
pub mod filters;
pub mod metrics;
pub mod validation;

pub use analytics::{
    CategoryCount, DashboardAggregates, Kpis, ProfileAxis, ProfileMetric, SizeSdgSplit,
    YearCount, compute_kpis, compute_kpis_at,
};
pub use entities::{Branch, Company, RawDataset, SdgCommitment};
pub use errors::{AttemptFailure, DomainError, LoadFailure};
pub use filters::{Dimension, FilterOptions, FilterState, apply_filters};
pub use metrics::StatMetric;
