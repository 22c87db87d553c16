//! Infrastructure adapters. Implement outbound and inbound ports.
//!
//! HTTP, filesystem, CSV, terminal UI. Map errors to DomainError / AttemptFailure.

pub mod datamart;
pub mod export;
pub mod stats;
pub mod ui;
