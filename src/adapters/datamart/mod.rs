//! Datamart sources. Implement DatamartSource.
//!
//! HTTP for production, a local JSON file for development, a scripted source for tests.

pub mod file_source;
pub mod http_source;
pub mod scripted_source;

pub use file_source::FileDatamartSource;
pub use http_source::HttpDatamartSource;
pub use scripted_source::{ScriptedDatamartSource, ScriptedResponse};
