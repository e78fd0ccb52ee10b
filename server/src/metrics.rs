//! Request and domain metrics on a private Prometheus registry.
//!
//! ## Metrics Provided
//!
//! - `http_requests_total{method,route,status}`
//! - `http_request_duration_seconds{method,route}` (histogram)
//! - `todos_created_total`, `todos_updated_total`, `todos_deleted_total`
//! - `todo_storage_errors_total`
//! - `todos_total`, `todos_completed`, `todos_pending`: gauges set from the
//!   store at scrape time

use std::time::Duration;

use prometheus::{
    histogram_opts, opts, Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Registry,
    TextEncoder,
};
use todo_store::TodoStats;

/// Owns its registry, so several apps in one process (tests) never collide.
#[derive(Debug, Clone)]
pub struct Metrics {
    registry: Registry,
    http_requests: IntCounterVec,
    http_duration: HistogramVec,
    todos_created: IntCounter,
    todos_updated: IntCounter,
    todos_deleted: IntCounter,
    storage_errors: IntCounter,
    todos_total: IntGauge,
    todos_completed: IntGauge,
    todos_pending: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests = IntCounterVec::new(
            opts!("http_requests_total", "Total HTTP requests"),
            &["method", "route", "status"],
        )?;
        let http_duration = HistogramVec::new(
            histogram_opts!(
                "http_request_duration_seconds",
                "Time spent handling HTTP requests",
                vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
            ),
            &["method", "route"],
        )?;
        let todos_created = IntCounter::with_opts(opts!("todos_created_total", "Todos created"))?;
        let todos_updated = IntCounter::with_opts(opts!("todos_updated_total", "Todos updated"))?;
        let todos_deleted = IntCounter::with_opts(opts!("todos_deleted_total", "Todos deleted"))?;
        let storage_errors = IntCounter::with_opts(opts!(
            "todo_storage_errors_total",
            "Store operations that failed"
        ))?;
        let todos_total = IntGauge::with_opts(opts!("todos_total", "Todos currently stored"))?;
        let todos_completed = IntGauge::with_opts(opts!("todos_completed", "Completed todos"))?;
        let todos_pending = IntGauge::with_opts(opts!("todos_pending", "Pending todos"))?;

        registry.register(Box::new(http_requests.clone()))?;
        registry.register(Box::new(http_duration.clone()))?;
        registry.register(Box::new(todos_created.clone()))?;
        registry.register(Box::new(todos_updated.clone()))?;
        registry.register(Box::new(todos_deleted.clone()))?;
        registry.register(Box::new(storage_errors.clone()))?;
        registry.register(Box::new(todos_total.clone()))?;
        registry.register(Box::new(todos_completed.clone()))?;
        registry.register(Box::new(todos_pending.clone()))?;

        Ok(Self {
            registry,
            http_requests,
            http_duration,
            todos_created,
            todos_updated,
            todos_deleted,
            storage_errors,
            todos_total,
            todos_completed,
            todos_pending,
        })
    }

    pub fn observe_request(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        self.http_requests
            .with_label_values(&[method, route, &status.to_string()])
            .inc();
        self.http_duration
            .with_label_values(&[method, route])
            .observe(elapsed.as_secs_f64());
    }

    pub fn todo_created(&self) {
        self.todos_created.inc();
    }

    pub fn todo_updated(&self) {
        self.todos_updated.inc();
    }

    pub fn todo_deleted(&self) {
        self.todos_deleted.inc();
    }

    pub fn storage_error(&self) {
        self.storage_errors.inc();
    }

    pub fn storage_errors(&self) -> u64 {
        self.storage_errors.get()
    }

    /// Encode every metric in the text exposition format. `stats` refreshes
    /// the todo gauges; when the store could not be read they keep their
    /// previous values.
    pub fn render(&self, stats: Option<TodoStats>) -> Result<String, prometheus::Error> {
        if let Some(stats) = stats {
            self.todos_total.set(gauge_value(stats.total));
            self.todos_completed.set(gauge_value(stats.completed));
            self.todos_pending.set(gauge_value(stats.pending));
        }
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }

    pub fn content_type(&self) -> String {
        TextEncoder::new().format_type().to_string()
    }
}

fn gauge_value(count: u64) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}
