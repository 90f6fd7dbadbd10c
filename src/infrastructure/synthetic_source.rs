// Synthetic telemetry source - random-walk demo values
use crate::application::telemetry_source::{Measurand, MeasurandReading, Plant, Terminal, TelemetrySource};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};

/// Demo source with a fixed catalog and a bounded random walk per
/// (terminal, measurand) pair. `fail_mode` makes every value call fail, to
/// exercise degraded widget state.
pub struct SyntheticSource {
    plants: Vec<Plant>,
    terminals: Vec<Terminal>,
    measurands: Vec<Measurand>,
    walks: Mutex<HashMap<(String, String), f64>>,
    fail_mode: RwLock<bool>,
}

impl SyntheticSource {
    pub fn demo() -> Self {
        let plants = vec![
            Plant {
                id: "p-north".to_string(),
                name: "Northside Works".to_string(),
                kind: "production".to_string(),
            },
            Plant {
                id: "p-river".to_string(),
                name: "Riverbend Substation".to_string(),
                kind: "distribution".to_string(),
            },
        ];
        let terminals = vec![
            Terminal {
                id: "t-1".to_string(),
                name: "Busbar A".to_string(),
            },
            Terminal {
                id: "t-2".to_string(),
                name: "Feeder 2".to_string(),
            },
            Terminal {
                id: "t-3".to_string(),
                name: "Transformer 1".to_string(),
            },
        ];
        let measurands = vec![
            Measurand {
                id: "m-volt".to_string(),
                name: "Voltage".to_string(),
                unit: Some("V".to_string()),
            },
            Measurand {
                id: "m-amp".to_string(),
                name: "Current".to_string(),
                unit: Some("A".to_string()),
            },
            Measurand {
                id: "m-watt".to_string(),
                name: "Active power".to_string(),
                unit: Some("kW".to_string()),
            },
            Measurand {
                id: "m-freq".to_string(),
                name: "Frequency".to_string(),
                unit: Some("Hz".to_string()),
            },
        ];
        Self {
            plants,
            terminals,
            measurands,
            walks: Mutex::new(HashMap::new()),
            fail_mode: RwLock::new(false),
        }
    }

    pub async fn set_fail_mode(&self, on: bool) {
        *self.fail_mode.write().await = on;
    }

    fn base_value(measurand_id: &str) -> f64 {
        match measurand_id {
            "m-volt" => 230.0,
            "m-amp" => 12.0,
            "m-watt" => 55.0,
            "m-freq" => 50.0,
            _ => 100.0,
        }
    }

    async fn next_value(&self, terminal_id: &str, measurand_id: &str) -> f64 {
        // Step before locking; thread_rng must not live across an await.
        let step: f64 = rand::thread_rng().gen_range(-1.0..1.0);
        let base = Self::base_value(measurand_id);
        let mut walks = self.walks.lock().await;
        let value = walks
            .entry((terminal_id.to_string(), measurand_id.to_string()))
            .or_insert(base);
        *value += step * base * 0.01;
        // Keep the walk within ±20% of its base so demo gauges stay sane.
        *value = value.clamp(base * 0.8, base * 1.2);
        *value
    }
}

#[async_trait]
impl TelemetrySource for SyntheticSource {
    async fn list_plants(&self, kind: &str) -> anyhow::Result<Vec<Plant>> {
        Ok(self
            .plants
            .iter()
            .filter(|p| kind.is_empty() || p.kind == kind)
            .cloned()
            .collect())
    }

    async fn list_terminals(&self, _plant_id: &str, _kind: &str) -> anyhow::Result<Vec<Terminal>> {
        Ok(self.terminals.clone())
    }

    async fn list_measurands(
        &self,
        _plant_id: &str,
        _terminal_id: &str,
        _kind: &str,
    ) -> anyhow::Result<Vec<Measurand>> {
        Ok(self.measurands.clone())
    }

    async fn live_value(
        &self,
        terminal_id: &str,
        measurand_id: &str,
    ) -> anyhow::Result<MeasurandReading> {
        if *self.fail_mode.read().await {
            anyhow::bail!("synthetic source offline");
        }
        let value = self.next_value(terminal_id, measurand_id).await;
        let unit = self
            .measurands
            .iter()
            .find(|m| m.id == measurand_id)
            .and_then(|m| m.unit.clone());
        Ok(MeasurandReading {
            value,
            timestamp: Utc::now(),
            unit,
        })
    }

    async fn range_values(
        &self,
        terminal_id: &str,
        measurand_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> anyhow::Result<Vec<(DateTime<Utc>, f64)>> {
        if *self.fail_mode.read().await {
            anyhow::bail!("synthetic source offline");
        }
        if to <= from {
            return Ok(Vec::new());
        }
        let step = Duration::minutes(15);
        let mut points = Vec::new();
        let mut cursor = from;
        while cursor <= to && points.len() < 1000 {
            points.push((cursor, self.next_value(terminal_id, measurand_id).await));
            cursor = cursor + step;
        }
        Ok(points)
    }
}
