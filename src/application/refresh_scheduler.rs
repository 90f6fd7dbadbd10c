// Refresh scheduler - one timer per widget, degraded state on failure
use crate::application::series_store::{SeriesStore, PRIMARY_SERIES};
use crate::application::telemetry_source::TelemetrySource;
use crate::domain::widget::{Widget, WidgetConfig};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

/// What a scalar widget currently shows. Fetch failures leave the sentinel
/// in place of a number; the timer itself never stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DisplayValue {
    Value(f64),
    Sentinel(String),
}

impl DisplayValue {
    pub fn error() -> Self {
        DisplayValue::Sentinel("Error".to_string())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DisplayValue::Sentinel(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentReading {
    pub display: DisplayValue,
    pub timestamp: DateTime<Utc>,
    pub unit: Option<String>,
}

/// One row of a datagrid widget; rows degrade independently.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub measurand_id: String,
    pub display: DisplayValue,
    pub timestamp: DateTime<Utc>,
}

/// What one widget's timer refreshes on each tick.
#[derive(Debug, Clone)]
enum RefreshTarget {
    Scalar {
        terminal_id: String,
        measurand_id: String,
    },
    Series {
        terminal_id: String,
        measurand_id: String,
        window: usize,
        /// (series name, measurand id) pairs for comparison overlays.
        comparisons: Vec<String>,
    },
    Table {
        terminal_id: String,
        measurand_ids: Vec<String>,
    },
}

impl RefreshTarget {
    fn for_widget(widget: &Widget) -> Option<Self> {
        match &widget.config {
            WidgetConfig::Number(c) | WidgetConfig::Gauge(c) => Some(RefreshTarget::Scalar {
                terminal_id: c.terminal_id.clone(),
                measurand_id: c.measurand_id.clone(),
            }),
            WidgetConfig::Graph(c) | WidgetConfig::MultiAxisGraph(c) => {
                Some(RefreshTarget::Series {
                    terminal_id: c.terminal_id.clone(),
                    measurand_id: c.measurand_id.clone(),
                    window: c.window,
                    comparisons: c.comparisons.iter().map(|s| s.measurand_id.clone()).collect(),
                })
            }
            WidgetConfig::DataGrid(c) => Some(RefreshTarget::Table {
                terminal_id: c.terminal_id.clone(),
                measurand_ids: c.measurand_ids.clone(),
            }),
            WidgetConfig::Text(_) | WidgetConfig::Image(_) => None,
        }
    }
}

/// Owns every per-widget refresh timer. Start on mount, stop on delete or
/// teardown; stopping aborts the task and releases the widget's buffers so
/// nothing keeps ticking for a widget that no longer exists.
pub struct RefreshScheduler {
    source: Arc<dyn TelemetrySource>,
    store: SeriesStore,
    readings: Arc<RwLock<HashMap<String, CurrentReading>>>,
    tables: Arc<RwLock<HashMap<String, Vec<TableRow>>>>,
    tasks: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl RefreshScheduler {
    pub fn new(source: Arc<dyn TelemetrySource>, store: SeriesStore) -> Self {
        Self {
            source,
            store,
            readings: Arc::new(RwLock::new(HashMap::new())),
            tables: Arc::new(RwLock::new(HashMap::new())),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Start the timer for one widget. Widgets without a data binding
    /// (text, image) are ignored; restarting a running widget replaces its
    /// timer. The interval comes from the widget config, falling back to
    /// `default_interval_ms`.
    pub async fn start_widget(&self, widget: &Widget, default_interval_ms: u64) {
        let interval_ms = widget
            .config
            .reset_interval_ms()
            .unwrap_or(default_interval_ms);
        self.start_widget_at(widget, interval_ms).await;
    }

    /// Start the timer at an explicit interval, e.g. one clamped into a
    /// live-source band by the caller.
    pub async fn start_widget_at(&self, widget: &Widget, interval_ms: u64) {
        let Some(target) = RefreshTarget::for_widget(widget) else {
            return;
        };

        let source = self.source.clone();
        let store = self.store.clone();
        let readings = self.readings.clone();
        let tables = self.tables.clone();
        let widget_id = widget.id.clone();

        let handle = tokio::spawn({
            let widget_id = widget_id.clone();
            async move {
                let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
                loop {
                    ticker.tick().await;
                    run_tick(&*source, &store, &readings, &tables, &widget_id, &target).await;
                }
            }
        });

        let mut tasks = self.tasks.lock().await;
        if let Some(previous) = tasks.insert(widget_id, handle) {
            previous.abort();
        }
    }

    /// Cancel a widget's timer and release everything it owned.
    pub async fn stop(&self, widget_id: &str) {
        if let Some(handle) = self.tasks.lock().await.remove(widget_id) {
            handle.abort();
        }
        self.readings.write().await.remove(widget_id);
        self.tables.write().await.remove(widget_id);
        self.store.remove(widget_id).await;
    }

    /// Teardown: cancel every timer. Buffers and readings are released per
    /// widget, same as `stop`.
    pub async fn stop_all(&self) {
        let ids: Vec<String> = self.tasks.lock().await.keys().cloned().collect();
        for id in ids {
            self.stop(&id).await;
        }
    }

    pub async fn is_running(&self, widget_id: &str) -> bool {
        self.tasks.lock().await.contains_key(widget_id)
    }

    pub async fn reading(&self, widget_id: &str) -> Option<CurrentReading> {
        self.readings.read().await.get(widget_id).cloned()
    }

    pub async fn table(&self, widget_id: &str) -> Option<Vec<TableRow>> {
        self.tables.read().await.get(widget_id).cloned()
    }
}

async fn run_tick(
    source: &dyn TelemetrySource,
    store: &SeriesStore,
    readings: &RwLock<HashMap<String, CurrentReading>>,
    tables: &RwLock<HashMap<String, Vec<TableRow>>>,
    widget_id: &str,
    target: &RefreshTarget,
) {
    match target {
        RefreshTarget::Scalar {
            terminal_id,
            measurand_id,
        } => {
            let reading = fetch_reading(source, widget_id, terminal_id, measurand_id).await;
            readings
                .write()
                .await
                .insert(widget_id.to_string(), reading);
        }
        RefreshTarget::Series {
            terminal_id,
            measurand_id,
            window,
            comparisons,
        } => {
            let reading = fetch_reading(source, widget_id, terminal_id, measurand_id).await;
            if let DisplayValue::Value(value) = reading.display {
                store
                    .append(widget_id, PRIMARY_SERIES, reading.timestamp, value, *window)
                    .await;
            }
            readings
                .write()
                .await
                .insert(widget_id.to_string(), reading);

            for comparison_id in comparisons {
                match source.live_value(terminal_id, comparison_id).await {
                    Ok(r) => {
                        store
                            .append(widget_id, comparison_id, r.timestamp, r.value, *window)
                            .await;
                    }
                    Err(e) => {
                        tracing::warn!(
                            "comparison fetch failed for widget {} measurand {}: {}",
                            widget_id,
                            comparison_id,
                            e
                        );
                    }
                }
            }
        }
        RefreshTarget::Table {
            terminal_id,
            measurand_ids,
        } => {
            let mut rows = Vec::with_capacity(measurand_ids.len());
            for measurand_id in measurand_ids {
                let row = match source.live_value(terminal_id, measurand_id).await {
                    Ok(r) => TableRow {
                        measurand_id: measurand_id.clone(),
                        display: DisplayValue::Value(r.value),
                        timestamp: r.timestamp,
                    },
                    Err(e) => {
                        tracing::warn!(
                            "table fetch failed for widget {} measurand {}: {}",
                            widget_id,
                            measurand_id,
                            e
                        );
                        TableRow {
                            measurand_id: measurand_id.clone(),
                            display: DisplayValue::error(),
                            timestamp: Utc::now(),
                        }
                    }
                };
                rows.push(row);
            }
            tables.write().await.insert(widget_id.to_string(), rows);
        }
    }
}

async fn fetch_reading(
    source: &dyn TelemetrySource,
    widget_id: &str,
    terminal_id: &str,
    measurand_id: &str,
) -> CurrentReading {
    match source.live_value(terminal_id, measurand_id).await {
        Ok(r) => CurrentReading {
            display: DisplayValue::Value(r.value),
            timestamp: r.timestamp,
            unit: r.unit,
        },
        Err(e) => {
            tracing::warn!(
                "refresh tick failed for widget {} ({}, {}): {}",
                widget_id,
                terminal_id,
                measurand_id,
                e
            );
            CurrentReading {
                display: DisplayValue::error(),
                timestamp: Utc::now(),
                unit: None,
            }
        }
    }
}
