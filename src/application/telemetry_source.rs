// Source trait for the telemetry catalog and point/range values
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    pub id: String,
    pub name: String,
    pub kind: String,
}

/// A monitored electrical or mechanical point within a plant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terminal {
    pub id: String,
    pub name: String,
}

/// A named physical quantity measured at a terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurand {
    pub id: String,
    pub name: String,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurandReading {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
    pub unit: Option<String>,
}

#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// List all plants of a given kind.
    async fn list_plants(&self, kind: &str) -> anyhow::Result<Vec<Plant>>;

    /// List the terminals of one plant.
    async fn list_terminals(&self, plant_id: &str, kind: &str) -> anyhow::Result<Vec<Terminal>>;

    /// List the measurand catalog for one terminal.
    async fn list_measurands(
        &self,
        plant_id: &str,
        terminal_id: &str,
        kind: &str,
    ) -> anyhow::Result<Vec<Measurand>>;

    /// Current value of one (terminal, measurand) pair.
    async fn live_value(
        &self,
        terminal_id: &str,
        measurand_id: &str,
    ) -> anyhow::Result<MeasurandReading>;

    /// Historical values over a closed time range.
    async fn range_values(
        &self,
        terminal_id: &str,
        measurand_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<Vec<(DateTime<Utc>, f64)>>;
}
