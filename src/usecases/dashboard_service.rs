//! Dashboard use case: filter state with undo, filtered view and memoised aggregates.
//!
//! The dataset comes from the injected [`DatasetLoader`]. Filter transitions replace the
//! whole `FilterState` value; the previous value goes onto the undo stack.

use crate::domain::{
    DashboardAggregates, Dimension, FilterOptions, FilterState, LoadFailure, RawDataset,
    apply_filters, compute_kpis,
};
use crate::usecases::DatasetLoader;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Maximum number of filter states kept for undo.
const UNDO_DEPTH: usize = 50;

/// Everything the presentation layer needs for one render.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub filters: FilterState,
    /// Companies in the unfiltered dataset.
    pub total_companies: usize,
    pub filtered: Arc<RawDataset>,
    pub aggregates: Arc<DashboardAggregates>,
    pub options: Arc<FilterOptions>,
}

struct Memo {
    dataset: Arc<RawDataset>,
    snapshot: DashboardSnapshot,
}

#[derive(Default)]
struct ViewState {
    filters: FilterState,
    history: Vec<FilterState>,
    memo: Option<Memo>,
}

pub struct DashboardService {
    loader: Arc<DatasetLoader>,
    view: Mutex<ViewState>,
}

impl DashboardService {
    pub fn new(loader: Arc<DatasetLoader>) -> Self {
        Self {
            loader,
            view: Mutex::new(ViewState::default()),
        }
    }

    pub fn loader(&self) -> &Arc<DatasetLoader> {
        &self.loader
    }

    /// Ensure the dataset is loaded (cache hit after the first success).
    pub async fn load(&self) -> Result<Arc<RawDataset>, LoadFailure> {
        self.loader.load().await
    }

    /// Retry action: drop the cache and load again.
    pub async fn retry(&self) -> Result<Arc<RawDataset>, LoadFailure> {
        self.loader.reload().await
    }

    /// Load (or reuse) the dataset and derive the current view.
    pub async fn snapshot(&self) -> Result<DashboardSnapshot, LoadFailure> {
        let dataset = self.loader.load().await?;
        Ok(self.snapshot_for(&dataset))
    }

    /// Derive the view for `dataset`. Reuses the previous result when neither the dataset
    /// nor the filter state changed.
    pub fn snapshot_for(&self, dataset: &Arc<RawDataset>) -> DashboardSnapshot {
        let mut view = self.lock();
        if let Some(memo) = &view.memo {
            if Arc::ptr_eq(&memo.dataset, dataset) && memo.snapshot.filters == view.filters {
                debug!("aggregates unchanged; reusing snapshot");
                return memo.snapshot.clone();
            }
        }

        let filters = view.filters.clone();
        let filtered = apply_filters(dataset, &filters);
        let aggregates = compute_kpis(&filtered);
        let options = match &view.memo {
            Some(memo) if Arc::ptr_eq(&memo.dataset, dataset) => Arc::clone(&memo.snapshot.options),
            _ => Arc::new(FilterOptions::from_dataset(dataset)),
        };
        debug!(
            active_filters = filters.active_count(),
            matched = filtered.len(),
            total = dataset.len(),
            "recomputed aggregates"
        );

        let snapshot = DashboardSnapshot {
            filters,
            total_companies: dataset.len(),
            filtered: Arc::new(filtered),
            aggregates: Arc::new(aggregates),
            options,
        };
        view.memo = Some(Memo {
            dataset: Arc::clone(dataset),
            snapshot: snapshot.clone(),
        });
        snapshot
    }

    pub fn filters(&self) -> FilterState {
        self.lock().filters.clone()
    }

    pub fn toggle_filter(&self, dim: Dimension, value: &str) -> FilterState {
        self.transition(|f| f.toggle(dim, value))
    }

    pub fn set_filter_values(&self, dim: Dimension, values: Vec<String>) -> FilterState {
        self.transition(|f| f.with_values(dim, values))
    }

    pub fn clear_filters(&self) -> FilterState {
        self.transition(FilterState::cleared)
    }

    /// Restore the previous filter state. Returns false when there is nothing to undo.
    pub fn undo(&self) -> bool {
        let mut view = self.lock();
        match view.history.pop() {
            Some(previous) => {
                view.filters = previous;
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.lock().history.is_empty()
    }

    fn transition(&self, f: impl FnOnce(&FilterState) -> FilterState) -> FilterState {
        let mut view = self.lock();
        let next = f(&view.filters);
        if next != view.filters {
            let previous = std::mem::replace(&mut view.filters, next.clone());
            view.history.push(previous);
            if view.history.len() > UNDO_DEPTH {
                view.history.remove(0);
            }
        }
        next
    }

    fn lock(&self) -> MutexGuard<'_, ViewState> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
