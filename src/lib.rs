//! datamart-dash: company datamart dashboard with Hexagonal Architecture.
//!
//! Resilient single-flight loading of the bulk datamart plus client-side filtering and
//! KPI derivation over the in-memory dataset.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
