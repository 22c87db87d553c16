//! Resilient datamart loader.
//!
//! - Cached dataset short-circuits every `load()` until `invalidate()`
//! - Concurrent callers share one in-flight load (single-flight)
//! - Each attempt is bounded by a fixed request timeout; dropping the fetch aborts it
//! - Failed attempts back off `base_delay * 2^attempt` (no jitter)
//!
//! State transitions happen under a std mutex that is never held across an await.

use crate::domain::{AttemptFailure, LoadFailure, RawDataset, validation};
use crate::ports::DatamartSource;
use crate::shared::config::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_RECOVERY_HINT, DEFAULT_RETRIES, REQUEST_TIMEOUT,
};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Retry policy for one `load()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Extra attempts after the first one.
    pub retries: u32,
    pub base_delay: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES, DEFAULT_BASE_DELAY_MS)
    }
}

impl LoadOptions {
    /// `base_delay_ms` is floored at 1ms.
    pub fn new(retries: u32, base_delay_ms: u64) -> Self {
        Self {
            retries,
            base_delay: Duration::from_millis(base_delay_ms.max(1)),
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Delay after the failed attempt with 0-based index `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

type LoadResult = Result<Arc<RawDataset>, LoadFailure>;
type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

enum Slot {
    Empty,
    Loading(SharedLoad),
    Cached(Arc<RawDataset>),
    Failed(LoadFailure),
}

struct LoaderState {
    slot: Slot,
    /// Bumped by `invalidate()`; loads started under an older generation cannot fill the cache.
    generation: u64,
}

/// Observable lifecycle: empty -> loading -> cached | failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderStatus {
    Empty,
    Loading,
    Cached { companies: usize },
    Failed { attempts: u32 },
}

/// Owns the cache slot and the in-flight slot. Share it behind an `Arc`.
pub struct DatasetLoader {
    source: Arc<dyn DatamartSource>,
    options: LoadOptions,
    request_timeout: Duration,
    recovery_hint: String,
    state: Arc<Mutex<LoaderState>>,
}

impl DatasetLoader {
    pub fn new(source: Arc<dyn DatamartSource>, options: LoadOptions) -> Self {
        Self {
            source,
            options,
            request_timeout: REQUEST_TIMEOUT,
            recovery_hint: DEFAULT_RECOVERY_HINT.to_string(),
            state: Arc::new(Mutex::new(LoaderState {
                slot: Slot::Empty,
                generation: 0,
            })),
        }
    }

    /// View the caller should navigate to when loading fails for good.
    pub fn with_recovery_hint(mut self, hint: impl Into<String>) -> Self {
        self.recovery_hint = hint.into();
        self
    }

    pub fn options(&self) -> LoadOptions {
        self.options
    }

    /// Load with the configured options.
    pub async fn load(&self) -> LoadResult {
        self.load_with(self.options).await
    }

    /// Load with explicit options. Options are ignored when joining an in-flight load.
    pub async fn load_with(&self, options: LoadOptions) -> LoadResult {
        let pending = {
            let mut state = lock(&self.state);
            if let Slot::Cached(dataset) = &state.slot {
                debug!("datamart served from cache");
                return Ok(Arc::clone(dataset));
            }
            if let Slot::Loading(pending) = &state.slot {
                debug!("joining in-flight datamart load");
                pending.clone()
            } else {
                let pending = self.start(state.generation, options);
                state.slot = Slot::Loading(pending.clone());
                pending
            }
        };
        pending.await
    }

    /// Drop the cached dataset and forget any in-flight load. Idempotent.
    ///
    /// A load already running keeps going and resolves for its own waiters, but its
    /// result is not cached; the next caller starts a fresh load.
    pub fn invalidate(&self) {
        let mut state = lock(&self.state);
        state.generation = state.generation.wrapping_add(1);
        state.slot = Slot::Empty;
        info!("datamart cache invalidated");
    }

    /// Invalidate, then load again. Backs the UI's retry action.
    pub async fn reload(&self) -> LoadResult {
        self.invalidate();
        self.load().await
    }

    pub fn status(&self) -> LoaderStatus {
        match &lock(&self.state).slot {
            Slot::Empty => LoaderStatus::Empty,
            Slot::Loading(_) => LoaderStatus::Loading,
            Slot::Cached(ds) => LoaderStatus::Cached {
                companies: ds.len(),
            },
            Slot::Failed(f) => LoaderStatus::Failed {
                attempts: f.attempts,
            },
        }
    }

    pub fn cached(&self) -> Option<Arc<RawDataset>> {
        match &lock(&self.state).slot {
            Slot::Cached(ds) => Some(Arc::clone(ds)),
            _ => None,
        }
    }

    fn start(&self, generation: u64, options: LoadOptions) -> SharedLoad {
        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let timeout = self.request_timeout;
        let hint = self.recovery_hint.clone();

        async move {
            let outcome = fetch_with_retry(source.as_ref(), options, timeout, &hint)
                .await
                .map(Arc::new);
            let mut state = lock(&state);
            if state.generation == generation {
                state.slot = match &outcome {
                    Ok(dataset) => Slot::Cached(Arc::clone(dataset)),
                    Err(failure) => Slot::Failed(failure.clone()),
                };
            } else {
                debug!(generation, "load finished after invalidate; result not cached");
            }
            outcome
        }
        .boxed()
        .shared()
    }
}

fn lock(state: &Mutex<LoaderState>) -> MutexGuard<'_, LoaderState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn fetch_with_retry(
    source: &dyn DatamartSource,
    options: LoadOptions,
    timeout: Duration,
    recovery_hint: &str,
) -> Result<RawDataset, LoadFailure> {
    let total = options.total_attempts();
    let origin = source.describe();
    let mut attempt: u32 = 0;

    loop {
        debug!(attempt = attempt + 1, total, origin = %origin, "datamart attempt");
        match fetch_once(source, timeout).await {
            Ok(dataset) => {
                info!(
                    attempt = attempt + 1,
                    companies = dataset.len(),
                    "datamart loaded"
                );
                return Ok(dataset);
            }
            Err(cause) if attempt < options.retries => {
                let backoff = options.backoff(attempt);
                warn!(
                    attempt = attempt + 1,
                    total,
                    error = %cause,
                    backoff_ms = backoff.as_millis() as u64,
                    "datamart attempt failed; backing off"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(cause) => {
                error!(attempts = total, error = %cause, "datamart load failed after all attempts");
                return Err(LoadFailure::exhausted(total, cause, recovery_hint));
            }
        }
    }
}

/// One attempt: fetch under the timeout, then run the payload through the validator.
async fn fetch_once(
    source: &dyn DatamartSource,
    timeout: Duration,
) -> Result<RawDataset, AttemptFailure> {
    let payload = tokio::time::timeout(timeout, source.fetch_payload())
        .await
        .map_err(|_| AttemptFailure::Timeout(timeout))??;
    validation::validate(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::datamart::{ScriptedDatamartSource, ScriptedResponse};
    use futures_util::future::join_all;
    use serde_json::json;
    use tokio::time::Instant;

    fn valid_payload() -> serde_json::Value {
        json!({"empresas": [{"rubro": "Tech"}, {"rubro": "Food"}]})
    }

    fn transport_error() -> ScriptedResponse {
        ScriptedResponse::Fail(AttemptFailure::Transport("connection refused".into()))
    }

    fn loader(source: &Arc<ScriptedDatamartSource>, retries: u32, base_ms: u64) -> DatasetLoader {
        DatasetLoader::new(
            Arc::clone(source) as Arc<dyn DatamartSource>,
            LoadOptions::new(retries, base_ms),
        )
        .with_recovery_hint("/home")
    }

    fn assert_close(actual: Duration, expected: Duration) {
        assert!(
            actual >= expected && actual < expected + Duration::from_millis(5),
            "expected ~{:?}, got {:?}",
            expected,
            actual
        );
    }

    #[test]
    fn test_backoff_doubles() {
        let opts = LoadOptions::default();
        assert_eq!(opts.total_attempts(), 4);
        assert_eq!(opts.backoff(0), Duration::from_millis(700));
        assert_eq!(opts.backoff(1), Duration::from_millis(1400));
        assert_eq!(opts.backoff(2), Duration::from_millis(2800));
        assert_eq!(LoadOptions::new(0, 0).base_delay, Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_loads_share_one_request() {
        let source = Arc::new(
            ScriptedDatamartSource::always(ScriptedResponse::Payload(valid_payload()))
                .with_latency(Duration::from_millis(100)),
        );
        let loader = loader(&source, 3, 700);

        let results = join_all((0..5).map(|_| loader.load())).await;

        assert_eq!(source.call_count(), 1);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.len(), 2);
        for r in &results {
            assert!(Arc::ptr_eq(first, r.as_ref().unwrap()));
        }
        assert_eq!(loader.status(), LoaderStatus::Cached { companies: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_messy_records_load_on_first_attempt() {
        let source = Arc::new(ScriptedDatamartSource::always(ScriptedResponse::Payload(
            json!({"empresas": [
                {"rubro": "Tech"},
                {"rubro": null, "sedes": null, "empresaFamiliar": null},
                {"tamanoEmpresa": "Grande", "tamanioEmpresa": "Grande"}
            ]}),
        )));
        let loader = loader(&source, 3, 700);
        let started = Instant::now();

        let dataset = loader.load().await.unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(source.call_count(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_loads_share_one_failure() {
        let source = Arc::new(ScriptedDatamartSource::always(transport_error()));
        let loader = loader(&source, 1, 10);

        let results = join_all((0..3).map(|_| loader.load())).await;

        assert_eq!(source.call_count(), 2);
        let first = results[0].as_ref().unwrap_err();
        assert_eq!(first.attempts, 2);
        for r in &results {
            assert_eq!(r.as_ref().unwrap_err(), first);
        }
    }

    #[tokio::test]
    async fn test_cache_short_circuits_until_invalidate() {
        let source = Arc::new(ScriptedDatamartSource::always(ScriptedResponse::Payload(
            valid_payload(),
        )));
        let loader = loader(&source, 3, 700);

        let a = loader.load().await.unwrap();
        let b = loader.load().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(source.call_count(), 1);
        assert!(loader.cached().is_some());

        loader.invalidate();
        loader.invalidate();
        assert_eq!(loader.status(), LoaderStatus::Empty);
        let c = loader.load().await.unwrap();
        assert_eq!(source.call_count(), 2);
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_schedule_and_attempt_count() {
        let source = Arc::new(ScriptedDatamartSource::always(transport_error()));
        let loader = loader(&source, 3, 700);

        let failure = loader.load().await.unwrap_err();

        assert_eq!(failure.attempts, 4);
        assert_eq!(failure.recovery_hint, "/home");
        let calls = source.call_instants();
        assert_eq!(calls.len(), 4);
        assert_close(calls[1] - calls[0], Duration::from_millis(700));
        assert_close(calls[2] - calls[1], Duration::from_millis(1400));
        assert_close(calls[3] - calls[2], Duration::from_millis(2800));
        assert_eq!(loader.status(), LoaderStatus::Failed { attempts: 4 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_fails_without_delay() {
        let source = Arc::new(ScriptedDatamartSource::always(transport_error()));
        let loader = loader(&source, 0, 700);

        let started = Instant::now();
        let failure = loader.load().await.unwrap_err();

        assert_eq!(failure.attempts, 1);
        assert_eq!(source.call_count(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_aborts_attempt_with_specific_message() {
        let source = Arc::new(ScriptedDatamartSource::always(ScriptedResponse::Hang));
        let loader = loader(&source, 0, 700);

        let started = Instant::now();
        let failure = loader.load().await.unwrap_err();

        assert!(failure.cause.is_timeout());
        assert_eq!(
            failure.user_message,
            crate::domain::errors::TIMEOUT_FAILURE_MESSAGE
        );
        assert_close(started.elapsed(), REQUEST_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_payload_is_retried() {
        let source = Arc::new(
            ScriptedDatamartSource::new()
                .then(ScriptedResponse::Payload(json!({"empresas": "x"})))
                .then(ScriptedResponse::Payload(valid_payload())),
        );
        let loader = loader(&source, 3, 700);

        let dataset = loader.load().await.unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_load_allows_fresh_attempt() {
        let source = Arc::new(
            ScriptedDatamartSource::new()
                .then(transport_error())
                .then(ScriptedResponse::Payload(valid_payload())),
        );
        let loader = loader(&source, 0, 700);

        assert!(loader.load().await.is_err());
        assert_eq!(loader.status(), LoaderStatus::Failed { attempts: 1 });
        assert!(loader.load().await.is_ok());
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_during_load_discards_result() {
        let source = Arc::new(
            ScriptedDatamartSource::always(ScriptedResponse::Payload(valid_payload()))
                .with_latency(Duration::from_millis(100)),
        );
        let loader = loader(&source, 3, 700);

        let (first, ()) = tokio::join!(loader.load(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            loader.invalidate();
        });

        assert!(first.is_ok());
        assert_eq!(loader.status(), LoaderStatus::Empty);
        loader.load().await.unwrap();
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_reload_fetches_again() {
        let source = Arc::new(ScriptedDatamartSource::always(ScriptedResponse::Payload(
            valid_payload(),
        )));
        let loader = loader(&source, 0, 700);

        loader.load().await.unwrap();
        loader.reload().await.unwrap();
        assert_eq!(source.call_count(), 2);
    }
}
