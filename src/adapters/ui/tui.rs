//! Implements InputPort. Inquire-based interactive dashboard.
//!
//! Loads the datamart behind a spinner, then loops over a menu: show the dashboard,
//! edit filters per dimension, undo, export, server statistics, reload. When loading
//! fails the user can retry, go back to the statistics view (which does not need the
//! datamart) or quit.

use crate::adapters::ui::{progress, report};
use crate::domain::{Dimension, DomainError, LoadFailure, StatMetric};
use crate::ports::{ExportPort, InputPort, StatisticsPort};
use crate::usecases::DashboardService;
use async_trait::async_trait;
use chrono::Datelike;
use inquire::{InquireError, MultiSelect, Select};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    ShowDashboard,
    EditFilters,
    ClearFilters,
    Undo,
    ServerStatistics,
    Export,
    Reload,
    Quit,
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuAction::ShowDashboard => "Show dashboard",
            MenuAction::EditFilters => "Edit filters",
            MenuAction::ClearFilters => "Clear all filters",
            MenuAction::Undo => "Undo last filter change",
            MenuAction::ServerStatistics => "Server statistics",
            MenuAction::Export => "Export CSV",
            MenuAction::Reload => "Reload data",
            MenuAction::Quit => "Quit",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureAction {
    Retry,
    GoBack,
    Quit,
}

impl fmt::Display for FailureAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureAction::Retry => "Retry",
            FailureAction::GoBack => "Go back to statistics",
            FailureAction::Quit => "Quit",
        };
        f.write_str(label)
    }
}

/// Actions offered on the statistics view reached from a failed load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecoveryAction {
    ServerStatistics,
    RetryLoad,
    Quit,
}

impl RecoveryAction {
    fn menu(stats_configured: bool) -> Vec<RecoveryAction> {
        let mut actions = Vec::with_capacity(3);
        if stats_configured {
            actions.push(RecoveryAction::ServerStatistics);
        }
        actions.extend([RecoveryAction::RetryLoad, RecoveryAction::Quit]);
        actions
    }
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecoveryAction::ServerStatistics => "Refresh statistics",
            RecoveryAction::RetryLoad => "Retry loading the datamart",
            RecoveryAction::Quit => "Quit",
        };
        f.write_str(label)
    }
}

/// Where the session goes after a load attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadOutcome {
    Loaded,
    /// Show the statistics view named by the recovery hint.
    Recover(String),
    Quit,
}

/// `None` means "retry": invalidate and load again.
fn after_failure(action: FailureAction, failure: &LoadFailure) -> Option<LoadOutcome> {
    match action {
        FailureAction::Retry => None,
        FailureAction::GoBack => Some(LoadOutcome::Recover(failure.recovery_hint.clone())),
        FailureAction::Quit => Some(LoadOutcome::Quit),
    }
}

fn ui_err(e: InquireError) -> DomainError {
    DomainError::Ui(e.to_string())
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    dashboard: Arc<DashboardService>,
    stats: Option<Arc<dyn StatisticsPort>>,
    exporter: Arc<dyn ExportPort>,
    export_dir: PathBuf,
}

impl TuiInputPort {
    pub fn new(
        dashboard: Arc<DashboardService>,
        stats: Option<Arc<dyn StatisticsPort>>,
        exporter: Arc<dyn ExportPort>,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            dashboard,
            stats,
            exporter,
            export_dir,
        }
    }

    /// Load until success or until the user picks another way out.
    async fn ensure_loaded(&self) -> Result<LoadOutcome, DomainError> {
        let loader = self.dashboard.loader();
        if loader.cached().is_some() {
            return Ok(LoadOutcome::Loaded);
        }
        loop {
            let pb = progress::spinner("Loading datamart...");
            let outcome = self.dashboard.load().await;
            pb.finish_and_clear();

            let failure = match outcome {
                Ok(dataset) => {
                    println!("Loaded {} companies.", dataset.len());
                    return Ok(LoadOutcome::Loaded);
                }
                Err(failure) => failure,
            };
            debug!(status = ?loader.status(), "datamart unavailable");

            match after_failure(self.failure_prompt(&failure)?, &failure) {
                None => loader.invalidate(),
                Some(next) => return Ok(next),
            }
        }
    }

    /// Statistics view reached from a failed load. Returns true when the user wants
    /// to retry the datamart.
    async fn recovery_view(&self, hint: &str) -> Result<bool, DomainError> {
        println!("\n== Statistics ({}) ==", hint);
        self.server_statistics().await?;
        loop {
            let actions = RecoveryAction::menu(self.stats.is_some());
            match Select::new("Statistics", actions).prompt() {
                Ok(RecoveryAction::ServerStatistics) => self.server_statistics().await?,
                Ok(RecoveryAction::RetryLoad) => return Ok(true),
                Ok(RecoveryAction::Quit)
                | Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                    return Ok(false);
                }
                Err(e) => return Err(ui_err(e)),
            }
        }
    }

    fn failure_prompt(&self, failure: &LoadFailure) -> Result<FailureAction, DomainError> {
        println!("{}", report::render_failure(failure));
        let options = vec![
            FailureAction::Retry,
            FailureAction::GoBack,
            FailureAction::Quit,
        ];
        match Select::new("What next?", options).prompt() {
            Ok(action) => Ok(action),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                Ok(FailureAction::Quit)
            }
            Err(e) => Err(ui_err(e)),
        }
    }

    async fn show_dashboard(&self) -> Result<(), DomainError> {
        let snap = self.dashboard.snapshot().await?;
        println!("{}", report::render_snapshot(&snap));
        Ok(())
    }

    async fn edit_filters(&self) -> Result<(), DomainError> {
        let snap = self.dashboard.snapshot().await?;
        let labels: Vec<String> = Dimension::ALL
            .iter()
            .map(|d| {
                let n = snap.filters.selected(*d).map_or(0, |s| s.len());
                format!("{} ({} selected)", d.title(), n)
            })
            .collect();

        let picked = match Select::new("Filter dimension", labels).raw_prompt() {
            Ok(choice) => Dimension::ALL[choice.index],
            Err(InquireError::OperationCanceled) => return Ok(()),
            Err(e) => return Err(ui_err(e)),
        };

        let values: Vec<String> = snap.options.values(picked).to_vec();
        if values.is_empty() {
            println!("No values available for {}", picked.title());
            return Ok(());
        }
        let defaults: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| snap.filters.is_selected(picked, v))
            .map(|(i, _)| i)
            .collect();

        let selected = match MultiSelect::new(picked.title(), values)
            .with_default(&defaults)
            .prompt()
        {
            Ok(selected) => selected,
            Err(InquireError::OperationCanceled) => return Ok(()),
            Err(e) => return Err(ui_err(e)),
        };
        self.dashboard.set_filter_values(picked, selected);
        self.show_dashboard().await
    }

    async fn server_statistics(&self) -> Result<(), DomainError> {
        let Some(stats) = &self.stats else {
            println!("Statistics API not configured (set DASH_STATS_API_URL).");
            return Ok(());
        };
        let year = chrono::Local::now().year();
        for metric in StatMetric::all(year) {
            match stats.fetch_metric(&metric).await {
                Ok(value) => println!("{}: {}", metric.label(), value),
                Err(e) => {
                    warn!(metric = %metric.path(), error = %e, "statistic unavailable");
                    println!("{}: unavailable", metric.label());
                }
            }
        }
        Ok(())
    }

    async fn export(&self) -> Result<(), DomainError> {
        let snap = self.dashboard.snapshot().await?;
        let files = self
            .exporter
            .export(&self.export_dir, &snap.filtered, &snap.aggregates)
            .await?;
        for path in files {
            println!("wrote {}", path.display());
        }
        Ok(())
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        'session: loop {
            match self.ensure_loaded().await? {
                LoadOutcome::Loaded => {}
                LoadOutcome::Quit => return Ok(()),
                LoadOutcome::Recover(hint) => {
                    if self.recovery_view(&hint).await? {
                        self.dashboard.loader().invalidate();
                        continue 'session;
                    }
                    return Ok(());
                }
            }
            self.show_dashboard().await?;

            loop {
                let mut actions = vec![
                    MenuAction::ShowDashboard,
                    MenuAction::EditFilters,
                    MenuAction::ClearFilters,
                ];
                if self.dashboard.can_undo() {
                    actions.push(MenuAction::Undo);
                }
                if self.stats.is_some() {
                    actions.push(MenuAction::ServerStatistics);
                }
                actions.extend([MenuAction::Export, MenuAction::Reload, MenuAction::Quit]);

                let action = match Select::new("Dashboard", actions).prompt() {
                    Ok(a) => a,
                    Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                        MenuAction::Quit
                    }
                    Err(e) => return Err(ui_err(e)),
                };

                match action {
                    MenuAction::ShowDashboard => self.show_dashboard().await?,
                    MenuAction::EditFilters => self.edit_filters().await?,
                    MenuAction::ClearFilters => {
                        self.dashboard.clear_filters();
                        self.show_dashboard().await?;
                    }
                    MenuAction::Undo => {
                        self.dashboard.undo();
                        self.show_dashboard().await?;
                    }
                    MenuAction::ServerStatistics => self.server_statistics().await?,
                    MenuAction::Export => {
                        if let Err(e) = self.export().await {
                            println!("Export failed: {}", e);
                        }
                    }
                    MenuAction::Reload => {
                        self.dashboard.loader().invalidate();
                        continue 'session;
                    }
                    MenuAction::Quit => return Ok(()),
                }
            }
        }
    }
}
