//! Statistics API adapter. Implements StatisticsPort.

pub mod api_client;

pub use api_client::StatsApiClient;
