// Chart payload derivation - datasets, axis assignment, threshold bands
use super::series::SeriesBuffer;
use super::widget::{ChartType, ComparisonSeries, GraphConfig, MAX_COMPARISONS};
use serde::{Deserialize, Serialize};

const BAND_FILL_COLOR: &str = "rgba(255, 152, 0, 0.15)";
const BAND_LINE_COLOR: &str = "#ff9800";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisPosition {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisSpec {
    pub id: String,
    pub position: AxisPosition,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
    pub color: String,
    #[serde(default)]
    pub axis_id: Option<String>,
    #[serde(default)]
    pub fill: bool,
    #[serde(default)]
    pub dashed: bool,
}

/// Renderable chart state. Area/line/bar is carried through untouched; the
/// renderer decides what to do with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPayload {
    pub chart_type: ChartType,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub axes: Vec<AxisSpec>,
}

/// Build the renderable payload for a graph widget from its buffers: one
/// dataset for the primary measurand plus one per comparison. For the
/// multi-axis variant every dataset gets its own scale, alternating
/// left/right by index parity.
pub fn derive_payload(
    config: &GraphConfig,
    multi_axis: bool,
    primary: &SeriesBuffer,
    comparisons: &[(&ComparisonSeries, &SeriesBuffer)],
) -> ChartPayload {
    let labels: Vec<String> = primary
        .points()
        .map(|p| p.time.format("%H:%M:%S").to_string())
        .collect();

    let (range_min, range_max) = match config.ranges.span() {
        Some((min, max)) => (Some(min), Some(max)),
        None => (None, None),
    };

    let mut datasets = Vec::with_capacity(1 + comparisons.len());
    let mut axes = Vec::new();

    let mut push_dataset = |index: usize, label: &str, color: &str, data: Vec<f64>| {
        let axis_id = multi_axis.then(|| format!("y{index}"));
        if let Some(id) = &axis_id {
            axes.push(AxisSpec {
                id: id.clone(),
                position: if index % 2 == 0 {
                    AxisPosition::Left
                } else {
                    AxisPosition::Right
                },
                min: range_min,
                max: range_max,
            });
        }
        datasets.push(Dataset {
            label: label.to_string(),
            data,
            color: color.to_string(),
            axis_id,
            fill: matches!(config.chart_type, ChartType::Area),
            dashed: false,
        });
    };

    push_dataset(0, &config.measurand_id, &config.color, primary.values());
    for (index, (comparison, buffer)) in comparisons.iter().take(MAX_COMPARISONS).enumerate() {
        push_dataset(index + 1, &comparison.label, &comparison.color, buffer.values());
    }

    let mut payload = ChartPayload {
        chart_type: config.chart_type,
        labels,
        datasets,
        axes,
    };
    payload
        .datasets
        .extend(derive_threshold_band(&primary.values(), config.threshold_pct));
    payload
}

/// Threshold overlays around the primary series: a shaded band plus dashed
/// upper and lower bounds at `value * (1 ± pct/100)`. Empty when the band
/// is disabled (pct == 0) or there is no data.
pub fn derive_threshold_band(values: &[f64], pct: f64) -> Vec<Dataset> {
    if pct <= 0.0 || values.is_empty() {
        return Vec::new();
    }
    let factor = pct / 100.0;
    let upper: Vec<f64> = values.iter().map(|v| v * (1.0 + factor)).collect();
    let lower: Vec<f64> = values.iter().map(|v| v * (1.0 - factor)).collect();

    vec![
        Dataset {
            label: "Threshold band".to_string(),
            data: upper.clone(),
            color: BAND_FILL_COLOR.to_string(),
            axis_id: None,
            fill: true,
            dashed: false,
        },
        Dataset {
            label: "Upper threshold".to_string(),
            data: upper,
            color: BAND_LINE_COLOR.to_string(),
            axis_id: None,
            fill: false,
            dashed: true,
        },
        Dataset {
            label: "Lower threshold".to_string(),
            data: lower,
            color: BAND_LINE_COLOR.to_string(),
            axis_id: None,
            fill: false,
            dashed: true,
        },
    ]
}
