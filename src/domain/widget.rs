// Widget registry - variants, per-type configuration, validation
use super::error::EngineError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of comparison measurands a graph widget may carry.
pub const MAX_COMPARISONS: usize = 10;

/// Fallback palette for series whose creator did not pick a color.
const SERIES_PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Pick a color for a new series. Assigned once at creation time and stored
/// in the config, so chart derivation stays a pure function of stored state.
pub fn random_series_color() -> String {
    let mut rng = rand::thread_rng();
    SERIES_PALETTE[rng.gen_range(0..SERIES_PALETTE.len())].to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WidgetKind {
    Text,
    Number,
    Gauge,
    Graph,
    MultiAxisGraph,
    #[serde(rename = "datagrid")]
    DataGrid,
    Image,
}

impl WidgetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Text => "text",
            WidgetKind::Number => "number",
            WidgetKind::Gauge => "gauge",
            WidgetKind::Graph => "graph",
            WidgetKind::MultiAxisGraph => "multiAxisGraph",
            WidgetKind::DataGrid => "datagrid",
            WidgetKind::Image => "image",
        }
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetKind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(WidgetKind::Text),
            "number" => Ok(WidgetKind::Number),
            "gauge" => Ok(WidgetKind::Gauge),
            "graph" => Ok(WidgetKind::Graph),
            "multiAxisGraph" => Ok(WidgetKind::MultiAxisGraph),
            "datagrid" => Ok(WidgetKind::DataGrid),
            "image" => Ok(WidgetKind::Image),
            other => Err(EngineError::InvalidWidgetType(other.to_string())),
        }
    }
}

/// One color-coded value band. Used both for color lookup and for gauge
/// needle normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ranges(pub Vec<ValueRange>);

impl Ranges {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ranges must be ordered by min and non-overlapping, each with
    /// `min < max`.
    pub fn validate(&self) -> Result<(), EngineError> {
        for range in &self.0 {
            if range.min >= range.max {
                return Err(EngineError::Validation(format!(
                    "range [{}, {}] must have min < max",
                    range.min, range.max
                )));
            }
            if range.color.is_empty() {
                return Err(EngineError::Validation(
                    "every range needs a color".to_string(),
                ));
            }
        }
        for pair in self.0.windows(2) {
            if pair[1].min < pair[0].max {
                return Err(EngineError::Validation(format!(
                    "ranges [{}, {}] and [{}, {}] overlap",
                    pair[0].min, pair[0].max, pair[1].min, pair[1].max
                )));
            }
        }
        Ok(())
    }

    /// Color of the first range containing the value. Out-of-range readings
    /// return None and the widget falls back to its default style color;
    /// that fallback is intentional, not an oversight.
    pub fn color_for(&self, value: f64) -> Option<&str> {
        self.0
            .iter()
            .find(|r| value >= r.min && value <= r.max)
            .map(|r| r.color.as_str())
    }

    /// Needle position over the full configured span:
    /// `(value - first.min) / (last.max - first.min)`. Not clamped; the
    /// gauge face clamps visually.
    pub fn normalize(&self, value: f64) -> f64 {
        let (Some(first), Some(last)) = (self.0.first(), self.0.last()) else {
            return 0.0;
        };
        let span = last.max - first.min;
        if span <= 0.0 {
            return 0.0;
        }
        (value - first.min) / span
    }

    /// Overall [min, max] of the configured span, when any ranges exist.
    pub fn span(&self) -> Option<(f64, f64)> {
        match (self.0.first(), self.0.last()) {
            (Some(first), Some(last)) => Some((first.min, last.max)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Area,
    Bar,
}

/// A comparison measurand overlaid on a graph widget. The color is fixed
/// when the comparison is added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSeries {
    pub measurand_id: String,
    pub label: String,
    pub color: String,
}

impl ComparisonSeries {
    pub fn new(measurand_id: impl Into<String>, label: impl Into<String>, color: Option<String>) -> Self {
        Self {
            measurand_id: measurand_id.into(),
            label: label.into(),
            color: color.unwrap_or_else(random_series_color),
        }
    }
}

fn default_precision() -> u32 {
    2
}

fn default_window() -> usize {
    10
}

pub fn default_reset_interval_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
    pub content: String,
}

/// Shared config for number and gauge widgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalarConfig {
    pub terminal_id: String,
    pub measurand_id: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default = "default_precision")]
    pub precision: u32,
    #[serde(default)]
    pub ranges: Ranges,
    #[serde(default = "default_reset_interval_ms")]
    pub reset_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
    pub chart_type: ChartType,
    pub terminal_id: String,
    pub measurand_id: String,
    /// Primary series color, fixed at widget creation.
    #[serde(default = "random_series_color")]
    pub color: String,
    #[serde(default = "default_window")]
    pub window: usize,
    /// Threshold band half-width in percent; 0 disables the band.
    #[serde(default)]
    pub threshold_pct: f64,
    #[serde(default)]
    pub comparisons: Vec<ComparisonSeries>,
    #[serde(default)]
    pub ranges: Ranges,
    #[serde(default = "default_reset_interval_ms")]
    pub reset_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataGridConfig {
    pub plant_id: String,
    pub terminal_id: String,
    pub measurand_ids: Vec<String>,
    #[serde(default)]
    pub profile: Option<String>,
    #[serde(default = "default_reset_interval_ms")]
    pub reset_interval_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageConfig {
    pub url: String,
}

/// Per-kind configuration payload. The tag mirrors the persisted widget
/// `type` string, so unknown kinds are rejected at the serde boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WidgetConfig {
    #[serde(rename = "text")]
    Text(TextConfig),
    #[serde(rename = "number")]
    Number(ScalarConfig),
    #[serde(rename = "gauge")]
    Gauge(ScalarConfig),
    #[serde(rename = "graph")]
    Graph(GraphConfig),
    #[serde(rename = "multiAxisGraph")]
    MultiAxisGraph(GraphConfig),
    #[serde(rename = "datagrid")]
    DataGrid(DataGridConfig),
    #[serde(rename = "image")]
    Image(ImageConfig),
}

impl WidgetConfig {
    pub fn kind(&self) -> WidgetKind {
        match self {
            WidgetConfig::Text(_) => WidgetKind::Text,
            WidgetConfig::Number(_) => WidgetKind::Number,
            WidgetConfig::Gauge(_) => WidgetKind::Gauge,
            WidgetConfig::Graph(_) => WidgetKind::Graph,
            WidgetConfig::MultiAxisGraph(_) => WidgetKind::MultiAxisGraph,
            WidgetConfig::DataGrid(_) => WidgetKind::DataGrid,
            WidgetConfig::Image(_) => WidgetKind::Image,
        }
    }

    pub fn reset_interval_ms(&self) -> Option<u64> {
        match self {
            WidgetConfig::Number(c) | WidgetConfig::Gauge(c) => Some(c.reset_interval_ms),
            WidgetConfig::Graph(c) | WidgetConfig::MultiAxisGraph(c) => Some(c.reset_interval_ms),
            WidgetConfig::DataGrid(c) => Some(c.reset_interval_ms),
            WidgetConfig::Text(_) | WidgetConfig::Image(_) => None,
        }
    }

    fn validate(&self) -> Result<(), EngineError> {
        match self {
            WidgetConfig::Text(_) => Ok(()),
            WidgetConfig::Number(c) => {
                require(&c.terminal_id, "terminal_id")?;
                require(&c.measurand_id, "measurand_id")?;
                c.ranges.validate()
            }
            WidgetConfig::Gauge(c) => {
                require(&c.terminal_id, "terminal_id")?;
                require(&c.measurand_id, "measurand_id")?;
                if c.ranges.is_empty() {
                    return Err(EngineError::Validation(
                        "gauge widgets require at least one range".to_string(),
                    ));
                }
                c.ranges.validate()
            }
            WidgetConfig::Graph(c) | WidgetConfig::MultiAxisGraph(c) => {
                require(&c.terminal_id, "terminal_id")?;
                require(&c.measurand_id, "measurand_id")?;
                if c.comparisons.len() > MAX_COMPARISONS {
                    return Err(EngineError::Validation(format!(
                        "at most {} comparison measurands are supported",
                        MAX_COMPARISONS
                    )));
                }
                if c.window == 0 {
                    return Err(EngineError::Validation(
                        "graph window must be at least 1".to_string(),
                    ));
                }
                c.ranges.validate()
            }
            WidgetConfig::DataGrid(c) => {
                require(&c.plant_id, "plant_id")?;
                require(&c.terminal_id, "terminal_id")?;
                if c.measurand_ids.is_empty() {
                    return Err(EngineError::Validation(
                        "datagrid widgets require at least one measurand".to_string(),
                    ));
                }
                Ok(())
            }
            WidgetConfig::Image(c) => require(&c.url, "url"),
        }
    }
}

fn require(value: &str, field: &str) -> Result<(), EngineError> {
    if value.is_empty() {
        return Err(EngineError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Free-form visual properties shared by all widget kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetStyle {
    pub font_family: String,
    pub font_size: u32,
    pub color: String,
    pub background: String,
    pub border: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Default for WidgetStyle {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_string(),
            font_size: 14,
            color: "#212121".to_string(),
            background: "#ffffff".to_string(),
            border: "none".to_string(),
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub style: WidgetStyle,
    pub config: WidgetConfig,
}

impl Widget {
    /// Create a widget with a fresh id. The config is validated up front;
    /// nothing is stored on failure.
    pub fn create(title: impl Into<String>, config: WidgetConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            style: WidgetStyle::default(),
            config,
        })
    }

    pub fn kind(&self) -> WidgetKind {
        self.config.kind()
    }

    /// Merge a partial config patch into the existing config. The `type`
    /// tag is pinned to the widget's current kind, so a patch can never
    /// switch the variant; the merged result is re-validated before it
    /// replaces the old config.
    pub fn apply_config_patch(&mut self, patch: serde_json::Value) -> Result<(), EngineError> {
        let mut merged = serde_json::to_value(&self.config)
            .map_err(|e| EngineError::Validation(e.to_string()))?;
        merge_json(&mut merged, patch);
        merged["type"] = serde_json::Value::String(self.kind().as_str().to_string());
        let config: WidgetConfig =
            serde_json::from_value(merged).map_err(|e| EngineError::Validation(e.to_string()))?;
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn set_style(&mut self, style: WidgetStyle) {
        self.style = style;
    }
}

fn merge_json(base: &mut serde_json::Value, patch: serde_json::Value) {
    match (base, patch) {
        (serde_json::Value::Object(base), serde_json::Value::Object(patch)) => {
            for (key, value) in patch {
                merge_json(base.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (base, patch) => *base = patch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gauge_ranges() -> Ranges {
        Ranges(vec![
            ValueRange { min: 0.0, max: 50.0, color: "#2ca02c".to_string() },
            ValueRange { min: 50.0, max: 100.0, color: "#d62728".to_string() },
        ])
    }

    fn gauge_config() -> WidgetConfig {
        WidgetConfig::Gauge(ScalarConfig {
            terminal_id: "t-1".to_string(),
            measurand_id: "m-volt".to_string(),
            unit: Some("V".to_string()),
            precision: 1,
            ranges: gauge_ranges(),
            reset_interval_ms: 5000,
        })
    }

    #[test]
    fn test_unknown_kind_string_is_rejected() {
        let err = "sparkline".parse::<WidgetKind>().unwrap_err();
        assert!(matches!(err, EngineError::InvalidWidgetType(_)));
    }

    #[test]
    fn test_gauge_requires_ranges() {
        let config = WidgetConfig::Gauge(ScalarConfig {
            terminal_id: "t-1".to_string(),
            measurand_id: "m-volt".to_string(),
            unit: None,
            precision: 2,
            ranges: Ranges::default(),
            reset_interval_ms: 5000,
        });
        let err = Widget::create("Voltage", config).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_overlapping_ranges_are_rejected() {
        let ranges = Ranges(vec![
            ValueRange { min: 0.0, max: 60.0, color: "#2ca02c".to_string() },
            ValueRange { min: 50.0, max: 100.0, color: "#d62728".to_string() },
        ]);
        assert!(ranges.validate().is_err());
    }

    #[test]
    fn test_range_color_lookup_and_fallback() {
        let ranges = gauge_ranges();
        assert_eq!(ranges.color_for(25.0), Some("#2ca02c"));
        assert_eq!(ranges.color_for(75.0), Some("#d62728"));
        // Out-of-range readings get no band color; callers fall back to the
        // widget's default style color.
        assert_eq!(ranges.color_for(150.0), None);
    }

    #[test]
    fn test_normalize_spans_first_min_to_last_max() {
        let ranges = gauge_ranges();
        assert_eq!(ranges.normalize(0.0), 0.0);
        assert_eq!(ranges.normalize(50.0), 0.5);
        assert_eq!(ranges.normalize(100.0), 1.0);
        // Not clamped.
        assert_eq!(ranges.normalize(150.0), 1.5);
    }

    #[test]
    fn test_graph_missing_chart_type_fails_deserialization() {
        let raw = serde_json::json!({
            "type": "graph",
            "terminalId": "t-1",
            "measurandId": "m-volt"
        });
        assert!(serde_json::from_value::<WidgetConfig>(raw).is_err());
    }

    #[test]
    fn test_comparison_cap_enforced() {
        let comparisons = (0..=MAX_COMPARISONS)
            .map(|i| ComparisonSeries::new(format!("m-{i}"), format!("M{i}"), None))
            .collect();
        let config = WidgetConfig::Graph(GraphConfig {
            chart_type: ChartType::Line,
            terminal_id: "t-1".to_string(),
            measurand_id: "m-volt".to_string(),
            color: "#1f77b4".to_string(),
            window: 10,
            threshold_pct: 0.0,
            comparisons,
            ranges: Ranges::default(),
            reset_interval_ms: 5000,
        });
        assert!(Widget::create("Voltage trend", config).is_err());
    }

    #[test]
    fn test_config_patch_merges_and_keeps_kind() {
        let mut widget = Widget::create("Voltage", gauge_config()).unwrap();
        let id = widget.id.clone();

        widget
            .apply_config_patch(serde_json::json!({ "precision": 0, "type": "graph" }))
            .unwrap();

        assert_eq!(widget.id, id);
        assert_eq!(widget.kind(), WidgetKind::Gauge);
        match &widget.config {
            WidgetConfig::Gauge(c) => {
                assert_eq!(c.precision, 0);
                assert_eq!(c.measurand_id, "m-volt");
            }
            other => panic!("kind changed: {:?}", other.kind()),
        }
    }

    #[test]
    fn test_invalid_patch_leaves_config_unchanged() {
        let mut widget = Widget::create("Voltage", gauge_config()).unwrap();
        let before = widget.config.clone();

        let result = widget.apply_config_patch(serde_json::json!({ "ranges": [] }));

        assert!(result.is_err());
        assert_eq!(widget.config, before);
    }

    #[test]
    fn test_comparison_without_color_gets_one() {
        let comparison = ComparisonSeries::new("m-amp", "Current", None);
        assert!(!comparison.color.is_empty());
    }
}
