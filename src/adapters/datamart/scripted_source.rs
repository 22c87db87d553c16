//! Scripted datamart source for testing without a backend.
//!
//! Replays queued responses in order, then repeats the fallback. Records when each call started.

use crate::domain::AttemptFailure;
use crate::ports::DatamartSource;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Payload(serde_json::Value),
    Fail(AttemptFailure),
    /// Never resolves; only the loader's timeout ends the attempt.
    Hang,
}

/// In-memory datamart source.
pub struct ScriptedDatamartSource {
    script: Mutex<VecDeque<ScriptedResponse>>,
    fallback: ScriptedResponse,
    /// Simulated network latency before each response.
    latency: Duration,
    calls: Mutex<Vec<Instant>>,
}

impl ScriptedDatamartSource {
    /// Empty script; unscripted calls fail with a transport error.
    pub fn new() -> Self {
        Self::always(ScriptedResponse::Fail(AttemptFailure::Transport(
            "script exhausted".to_string(),
        )))
    }

    /// Every call gets `response`.
    pub fn always(response: ScriptedResponse) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: response,
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue `response` for the next unscripted call.
    pub fn then(self, response: ScriptedResponse) -> Self {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(response);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn call_instants(&self) -> Vec<Instant> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn next_response(&self) -> ScriptedResponse {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Instant::now());
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for ScriptedDatamartSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DatamartSource for ScriptedDatamartSource {
    async fn fetch_payload(&self) -> Result<serde_json::Value, AttemptFailure> {
        let response = self.next_response();
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match response {
            ScriptedResponse::Payload(v) => Ok(v),
            ScriptedResponse::Fail(e) => Err(e),
            ScriptedResponse::Hang => std::future::pending().await,
        }
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}
