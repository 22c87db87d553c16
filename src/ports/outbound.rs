//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{AttemptFailure, DashboardAggregates, DomainError, RawDataset, StatMetric};
use std::path::{Path, PathBuf};

/// Source of the bulk datamart payload.
///
/// One call is one attempt. The loader owns timeout, retry and caching; implementations
/// must not retry on their own. Dropping the returned future aborts the request.
#[async_trait::async_trait]
pub trait DatamartSource: Send + Sync {
    /// Fetch and parse the raw payload. Shape is checked by the caller.
    async fn fetch_payload(&self) -> Result<serde_json::Value, AttemptFailure>;

    /// Human-readable origin for logs (URL or file path).
    fn describe(&self) -> String;
}

/// Per-metric statistics API. Each metric comes back pre-aggregated as opaque JSON.
#[async_trait::async_trait]
pub trait StatisticsPort: Send + Sync {
    async fn fetch_metric(&self, metric: &StatMetric) -> Result<serde_json::Value, DomainError>;
}

/// Export of the current filtered view.
#[async_trait::async_trait]
pub trait ExportPort: Send + Sync {
    /// Write the companies and breakdown tables under `dir`. Returns the files written.
    async fn export(
        &self,
        dir: &Path,
        companies: &RawDataset,
        aggregates: &DashboardAggregates,
    ) -> Result<Vec<PathBuf>, DomainError>;
}
