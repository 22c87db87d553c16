//! Local JSON file as datamart. Development fallback when no URL is configured.

use crate::domain::AttemptFailure;
use crate::ports::DatamartSource;
use std::path::{Path, PathBuf};
use tokio::fs;

pub struct FileDatamartSource {
    path: PathBuf,
}

impl FileDatamartSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait::async_trait]
impl DatamartSource for FileDatamartSource {
    async fn fetch_payload(&self) -> Result<serde_json::Value, AttemptFailure> {
        let raw = fs::read(&self.path)
            .await
            .map_err(|e| AttemptFailure::Transport(format!("{}: {}", self.path.display(), e)))?;
        serde_json::from_slice(&raw)
            .map_err(|e| AttemptFailure::Validation(format!("file is not JSON: {}", e)))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
