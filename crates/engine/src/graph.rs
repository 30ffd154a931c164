//! The derived-state task.
//!
//! The [`FilterState`] lives in a `watch` channel shared by every
//! [`EngineHandle`]: setters mutate it synchronously and the task sees the
//! change as a triggering event, like a new snapshot from storage. Every
//! triggering event reruns join → filter → aggregate and publishes the
//! result as a single [`DerivedView`]. Bursts coalesce in the channels, and
//! a computation overtaken by newer input is discarded instead of published.

use crate::aggregate::{aggregate, Summary};
use crate::filter::{apply, DateFilter, FilterState, SortOrder, TransactionType};
use crate::period::{Clock, DateRange, Period};
use crate::source::SnapshotSource;
use crate::view::{join, DerivedView, TransactionView};
use crate::{EngineConfig, EngineError};
use categories::models::Category;
use chrono::{NaiveDateTime, Weekday};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use transactions::models::Transaction;
use transactions::store::{CategorySnapshot, TransactionSnapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    #[default]
    Idle,
    Computing,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineStatus {
    pub state: EngineState,
    /// Revision of the last published view.
    pub revision: u64,
    pub recomputes: u64,
    /// Computations whose output was dropped because newer input arrived.
    pub superseded: u64,
    pub failures: u64,
    pub last_error: Option<String>,
}

#[derive(Debug)]
enum Command {
    Refresh,
    Shutdown,
}

pub struct DerivedStateGraph {
    transactions: watch::Receiver<TransactionSnapshot>,
    categories: watch::Receiver<CategorySnapshot>,
    transactions_open: bool,
    categories_open: bool,
    filters: watch::Receiver<FilterState>,
    commands: mpsc::UnboundedReceiver<Command>,
    views: watch::Sender<Arc<DerivedView>>,
    status: watch::Sender<EngineStatus>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl DerivedStateGraph {
    /// Starts the graph on the current runtime. The first view is computed immediately.
    pub fn spawn<S>(source: &S, clock: Arc<dyn Clock>, config: EngineConfig) -> EngineHandle
    where
        S: SnapshotSource + ?Sized,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (filters, filter_rx) = watch::channel(FilterState::default());
        let (views, view_rx) = watch::channel(Arc::new(DerivedView::default()));
        let (status, status_rx) = watch::channel(EngineStatus::default());

        let graph = Self {
            transactions: source.subscribe_transactions(),
            categories: source.subscribe_categories(),
            transactions_open: true,
            categories_open: true,
            filters: filter_rx,
            commands: command_rx,
            views,
            status,
            clock,
            config,
        };
        tokio::spawn(graph.run());

        EngineHandle {
            commands: command_tx,
            filters: Arc::new(filters),
            views: view_rx,
            status: status_rx,
        }
    }

    async fn run(mut self) {
        tracing::info!(
            week_start = ?self.config.week_start,
            offload_threshold = self.config.offload_threshold,
            "Derived state graph started"
        );

        let mut stop = self.recompute().await;
        while !stop {
            let dirty = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Refresh) => true,
                    Some(Command::Shutdown) | None => break,
                },
                changed = self.filters.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    true
                }
                changed = self.transactions.changed(), if self.transactions_open => {
                    if changed.is_err() {
                        tracing::warn!("Transaction source closed");
                        self.transactions_open = false;
                    }
                    changed.is_ok()
                }
                changed = self.categories.changed(), if self.categories_open => {
                    if changed.is_err() {
                        tracing::warn!("Category source closed");
                        self.categories_open = false;
                    }
                    changed.is_ok()
                }
            };

            if dirty {
                stop = self.recompute().await;
            }
        }

        tracing::info!("Derived state graph stopped");
    }

    /// Consumes queued commands. Returns whether a refresh and whether a
    /// shutdown was requested.
    fn drain_commands(&mut self) -> (bool, bool) {
        let mut refresh = false;
        while let Ok(command) = self.commands.try_recv() {
            tracing::debug!(?command, "command received");
            match command {
                Command::Refresh => refresh = true,
                Command::Shutdown => return (refresh, true),
            }
        }
        (refresh, false)
    }

    fn inputs_changed(&self) -> bool {
        self.transactions.has_changed().unwrap_or(false)
            || self.categories.has_changed().unwrap_or(false)
            || self.filters.has_changed().unwrap_or(false)
    }

    /// Recomputes until a result survives without being superseded, then
    /// publishes it. Returns `true` if a shutdown arrived meanwhile.
    async fn recompute(&mut self) -> bool {
        self.status.send_modify(|s| s.state = EngineState::Computing);

        loop {
            // Refreshes queued up to here are covered by this computation.
            let (_, shutdown) = self.drain_commands();
            if shutdown {
                return true;
            }

            let transactions = self.transactions.borrow_and_update().clone();
            let categories = self.categories.borrow_and_update().clone();
            let filter = self.filters.borrow_and_update().clone();
            let now = self.clock.now();
            let started = Instant::now();

            let result = if transactions.len() > self.config.offload_threshold {
                let week_start = self.config.week_start;
                let filter = filter.clone();
                tokio::task::spawn_blocking(move || compute(&transactions, &categories, &filter, now, week_start))
                    .await
                    .unwrap_or_else(|e| Err(EngineError::Computation(e.to_string())))
            } else {
                compute(&transactions, &categories, &filter, now, self.config.week_start)
            };

            if self.inputs_changed() {
                tracing::debug!("newer input arrived, discarding computation");
                self.status.send_modify(|s| s.superseded += 1);
                continue;
            }

            match result {
                Ok((transactions, summary)) => {
                    let revision = self.views.borrow().revision + 1;
                    tracing::debug!(
                        revision,
                        rows = transactions.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "publishing derived view"
                    );
                    self.status.send_modify(|s| {
                        s.state = EngineState::Idle;
                        s.revision = revision;
                        s.recomputes += 1;
                        s.last_error = None;
                    });
                    self.views.send_replace(Arc::new(DerivedView {
                        revision,
                        computed_at: Some(now),
                        filter,
                        transactions,
                        summary,
                    }));
                }
                Err(e) => {
                    tracing::error!("Recompute failed, keeping last view: {}", e);
                    self.status.send_modify(|s| {
                        s.state = EngineState::Idle;
                        s.failures += 1;
                        s.last_error = Some(e.to_string());
                    });
                }
            }
            return false;
        }
    }
}

fn compute(
    transactions: &[Transaction],
    categories: &[Category],
    filter: &FilterState,
    now: NaiveDateTime,
    week_start: Weekday,
) -> Result<(Vec<TransactionView>, Summary), EngineError> {
    let joined = join(transactions, categories);
    let filtered = apply(&joined, filter, now, week_start);
    let summary = aggregate(&filtered)?;
    Ok((filtered, summary))
}

/// Client side of a running [`DerivedStateGraph`]. Cheap to clone.
///
/// Setters change the filter before they return; the published view
/// reflects the change once the graph has recomputed. Setting a value equal
/// to the current one triggers nothing.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<Command>,
    filters: Arc<watch::Sender<FilterState>>,
    views: watch::Receiver<Arc<DerivedView>>,
    status: watch::Receiver<EngineStatus>,
}

impl EngineHandle {
    fn send(&self, command: Command) -> Result<(), EngineError> {
        self.commands.send(command).map_err(|_| EngineError::Stopped)
    }

    fn update_filter<F>(&self, mutate: F) -> Result<(), EngineError>
    where
        F: FnOnce(&mut FilterState),
    {
        if self.commands.is_closed() {
            return Err(EngineError::Stopped);
        }
        self.filters.send_if_modified(|current| {
            let mut next = current.clone();
            mutate(&mut next);
            if next == *current {
                return false;
            }
            tracing::debug!(filter = ?next, "filter changed");
            *current = next;
            true
        });
        Ok(())
    }

    pub fn set_type_filter(&self, transaction_type: Option<TransactionType>) -> Result<(), EngineError> {
        self.update_filter(|f| f.transaction_type = transaction_type)
    }

    pub fn set_category_filter(&self, category_id: Option<i64>) -> Result<(), EngineError> {
        self.update_filter(|f| f.category_id = category_id)
    }

    pub fn set_date_range_filter(&self, range: Option<DateRange>) -> Result<(), EngineError> {
        self.update_filter(|f| f.date = range.map(DateFilter::Range))
    }

    /// A period is re-resolved against the clock on every recompute.
    pub fn set_period(&self, period: Option<Period>) -> Result<(), EngineError> {
        self.update_filter(|f| f.date = period.map(DateFilter::Period))
    }

    pub fn set_search_query(&self, query: impl Into<String>) -> Result<(), EngineError> {
        let query = query.into();
        self.update_filter(|f| f.search = query)
    }

    pub fn set_sort_order(&self, sort: SortOrder) -> Result<(), EngineError> {
        self.update_filter(|f| f.sort = sort)
    }

    /// Resets every filter dimension except the sort order.
    pub fn clear_filters(&self) -> Result<(), EngineError> {
        self.update_filter(FilterState::clear)
    }

    /// Forces a recompute with unchanged inputs, e.g. after the clock moved.
    pub fn refresh(&self) -> Result<(), EngineError> {
        self.send(Command::Refresh)
    }

    pub fn shutdown(&self) -> Result<(), EngineError> {
        self.send(Command::Shutdown)
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<DerivedView>> {
        self.views.clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<EngineStatus> {
        self.status.clone()
    }

    pub fn current(&self) -> Arc<DerivedView> {
        self.views.borrow().clone()
    }

    pub fn status(&self) -> EngineStatus {
        self.status.borrow().clone()
    }

    /// The filter as last set, which may be ahead of the published view.
    pub fn filter_state(&self) -> FilterState {
        self.filters.borrow().clone()
    }

    /// Calls `callback` with the filtered list of every published view,
    /// starting with the current one.
    pub fn subscribe_filtered_view<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(&[TransactionView]) + Send + 'static,
    {
        self.watch_views(move |view| callback(&view.transactions))
    }

    pub fn subscribe_summary<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(&Summary) + Send + 'static,
    {
        self.watch_views(move |view| callback(&view.summary))
    }

    fn watch_views<F>(&self, mut callback: F) -> Subscription
    where
        F: FnMut(&DerivedView) + Send + 'static,
    {
        let mut views = self.views.clone();
        let task = tokio::spawn(async move {
            loop {
                let view = views.borrow_and_update().clone();
                if view.revision > 0 {
                    callback(&view);
                }
                if views.changed().await.is_err() {
                    break;
                }
            }
        });
        Subscription { task }
    }
}

/// A live callback registration. Dropping it stops the callback.
pub struct Subscription {
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn cancel(self) {
        self.task.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
