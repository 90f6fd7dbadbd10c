// Rolling series store - per-widget named buffers and derived chart views
use crate::domain::chart::{self, ChartPayload, Dataset};
use crate::domain::series::SeriesBuffer;
use crate::domain::widget::{Widget, WidgetConfig};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Buffer name of a graph widget's own measurand; comparison buffers are
/// keyed by their measurand id.
pub const PRIMARY_SERIES: &str = "primary";

#[derive(Default)]
struct WidgetBuffers {
    buffers: HashMap<String, SeriesBuffer>,
}

/// Shared store of rolling buffers, keyed by widget id then series name.
/// Each buffer is exclusively owned by its widget; comparison measurands
/// get their own buffers rather than sharing storage.
#[derive(Clone, Default)]
pub struct SeriesStore {
    inner: Arc<RwLock<HashMap<String, WidgetBuffers>>>,
}

impl SeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one point, creating the buffer with the given window on first
    /// touch. The window only applies at creation; later appends reuse the
    /// existing buffer.
    pub async fn append(
        &self,
        widget_id: &str,
        series: &str,
        time: DateTime<Utc>,
        value: f64,
        window: usize,
    ) {
        let mut inner = self.inner.write().await;
        let entry = inner.entry(widget_id.to_string()).or_default();
        entry
            .buffers
            .entry(series.to_string())
            .or_insert_with(|| SeriesBuffer::new(window))
            .push(time, value);
    }

    /// Release every buffer owned by a widget.
    pub async fn remove(&self, widget_id: &str) {
        self.inner.write().await.remove(widget_id);
    }

    pub async fn point_count(&self, widget_id: &str, series: &str) -> usize {
        self.inner
            .read()
            .await
            .get(widget_id)
            .and_then(|w| w.buffers.get(series))
            .map(|b| b.len())
            .unwrap_or(0)
    }

    /// Derive the renderable payload for a graph-type widget from its
    /// stored buffers. Non-graph widgets have no payload.
    pub async fn chart_payload(&self, widget: &Widget) -> Option<ChartPayload> {
        let (config, multi_axis) = match &widget.config {
            WidgetConfig::Graph(c) => (c, false),
            WidgetConfig::MultiAxisGraph(c) => (c, true),
            _ => return None,
        };

        let inner = self.inner.read().await;
        let empty = SeriesBuffer::new(config.window);
        let buffers = inner.get(&widget.id);
        let primary = buffers
            .and_then(|w| w.buffers.get(PRIMARY_SERIES))
            .unwrap_or(&empty);
        let comparisons: Vec<_> = config
            .comparisons
            .iter()
            .map(|c| {
                let buffer = buffers
                    .and_then(|w| w.buffers.get(&c.measurand_id))
                    .unwrap_or(&empty);
                (c, buffer)
            })
            .collect();

        Some(chart::derive_payload(config, multi_axis, primary, &comparisons))
    }

    /// Threshold overlays over a widget's primary series.
    pub async fn threshold_band(&self, widget_id: &str, pct: f64) -> Vec<Dataset> {
        let inner = self.inner.read().await;
        let values = inner
            .get(widget_id)
            .and_then(|w| w.buffers.get(PRIMARY_SERIES))
            .map(|b| b.values())
            .unwrap_or_default();
        chart::derive_threshold_band(&values, pct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::widget::{ChartType, ComparisonSeries, GraphConfig, Ranges};
    use chrono::TimeZone;

    fn ts(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    fn graph_widget(comparisons: Vec<ComparisonSeries>) -> Widget {
        Widget::create(
            "Voltage trend",
            WidgetConfig::Graph(GraphConfig {
                chart_type: ChartType::Line,
                terminal_id: "t-1".to_string(),
                measurand_id: "m-volt".to_string(),
                color: "#1f77b4".to_string(),
                window: 5,
                threshold_pct: 0.0,
                comparisons,
                ranges: Ranges::default(),
                reset_interval_ms: 5000,
            }),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_append_respects_window() {
        let store = SeriesStore::new();
        for i in 0..8 {
            store.append("w-1", PRIMARY_SERIES, ts(i), i as f64, 5).await;
        }

        assert_eq!(store.point_count("w-1", PRIMARY_SERIES).await, 5);
    }

    #[tokio::test]
    async fn test_payload_includes_comparisons_from_own_buffers() {
        let comparison = ComparisonSeries::new("m-amp", "Current", Some("#ff7f0e".to_string()));
        let widget = graph_widget(vec![comparison]);
        let store = SeriesStore::new();
        store.append(&widget.id, PRIMARY_SERIES, ts(0), 230.0, 5).await;
        store.append(&widget.id, "m-amp", ts(0), 12.0, 5).await;

        let payload = store.chart_payload(&widget).await.unwrap();

        assert_eq!(payload.datasets.len(), 2);
        assert_eq!(payload.datasets[0].data, vec![230.0]);
        assert_eq!(payload.datasets[1].data, vec![12.0]);
    }

    #[tokio::test]
    async fn test_payload_for_widget_without_data_is_empty_not_missing() {
        let widget = graph_widget(Vec::new());
        let store = SeriesStore::new();

        let payload = store.chart_payload(&widget).await.unwrap();

        assert!(payload.labels.is_empty());
        assert_eq!(payload.datasets.len(), 1);
        assert!(payload.datasets[0].data.is_empty());
    }

    #[tokio::test]
    async fn test_remove_releases_buffers() {
        let store = SeriesStore::new();
        store.append("w-1", PRIMARY_SERIES, ts(0), 1.0, 5).await;
        store.remove("w-1").await;

        assert_eq!(store.point_count("w-1", PRIMARY_SERIES).await, 0);
    }

    #[tokio::test]
    async fn test_threshold_band_over_primary_series() {
        let store = SeriesStore::new();
        for (i, v) in [10.0, 20.0, 30.0].iter().enumerate() {
            store.append("w-1", PRIMARY_SERIES, ts(i as i64), *v, 10).await;
        }

        let band = store.threshold_band("w-1", 10.0).await;
        assert_eq!(band[1].data, vec![11.0, 22.0, 33.0]);
        assert_eq!(band[2].data, vec![9.0, 18.0, 27.0]);
    }
}
