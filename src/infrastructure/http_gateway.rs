// HTTP persistence gateway - JSON envelope client
use crate::application::dashboard_repository::{
    DashboardRecord, DashboardRepository, DashboardSummary, TemplateRecord,
};
use crate::application::telemetry_source::{
    Measurand, MeasurandReading, Plant, Terminal, TelemetrySource,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Uniform response envelope used by every gateway endpoint.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct Envelope<T> {
    status: String,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdPayload {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RangePoint {
    time: DateTime<Utc>,
    value: f64,
}

/// Client for the dashboard persistence gateway and telemetry catalog.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    /// Issue one request and unwrap the envelope. A 404 and a success
    /// envelope without data both come back as None; an error envelope or
    /// transport failure is an error.
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<serde_json::Value>,
    ) -> Result<Option<T>> {
        let mut request = self.client.request(method, self.url(path_and_query));
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .context("failed to send request to dashboard gateway")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("gateway call failed with status {}: {}", status, body);
        }

        let envelope = response
            .json::<Envelope<T>>()
            .await
            .context("failed to parse gateway response")?;

        if envelope.status != "success" {
            anyhow::bail!(
                "gateway reported error: {}",
                envelope.message.unwrap_or_else(|| "unknown".to_string())
            );
        }
        Ok(envelope.data)
    }

    /// Like `call`, but the operation's data payload is required.
    async fn call_expect<T: DeserializeOwned>(
        &self,
        method: Method,
        path_and_query: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        self.call(method, path_and_query, body)
            .await?
            .context("gateway response missing data")
    }
}

#[async_trait]
impl DashboardRepository for HttpGateway {
    async fn create_dashboard(&self, record: DashboardRecord) -> Result<String> {
        let payload: IdPayload = self
            .call_expect(Method::POST, "/dashboards", Some(serde_json::to_value(record)?))
            .await?;
        Ok(payload.id)
    }

    async fn update_dashboard(&self, id: &str, record: DashboardRecord) -> Result<()> {
        let path = format!("/dashboards/{}", urlencoding::encode(id));
        self.call::<serde_json::Value>(Method::PUT, &path, Some(serde_json::to_value(record)?))
            .await?;
        Ok(())
    }

    async fn get_dashboard(&self, id: &str) -> Result<Option<DashboardRecord>> {
        let path = format!("/dashboards/{}", urlencoding::encode(id));
        self.call(Method::GET, &path, None).await
    }

    async fn list_dashboards(&self) -> Result<Vec<DashboardSummary>> {
        self.call_expect(Method::GET, "/dashboards", None).await
    }

    async fn delete_dashboard(&self, id: &str) -> Result<()> {
        let path = format!("/dashboards/{}", urlencoding::encode(id));
        self.call::<serde_json::Value>(Method::DELETE, &path, None)
            .await?;
        Ok(())
    }

    async fn create_template(&self, record: TemplateRecord) -> Result<String> {
        let payload: IdPayload = self
            .call_expect(
                Method::POST,
                "/widget-templates",
                Some(serde_json::to_value(record)?),
            )
            .await?;
        Ok(payload.id)
    }

    async fn list_templates(&self) -> Result<Vec<TemplateRecord>> {
        self.call_expect(Method::GET, "/widget-templates", None).await
    }

    async fn update_template(&self, id: &str, record: TemplateRecord) -> Result<()> {
        let path = format!("/widget-templates/{}", urlencoding::encode(id));
        self.call::<serde_json::Value>(Method::PUT, &path, Some(serde_json::to_value(record)?))
            .await?;
        Ok(())
    }

    async fn delete_template(&self, id: &str) -> Result<()> {
        let path = format!("/widget-templates/{}", urlencoding::encode(id));
        self.call::<serde_json::Value>(Method::DELETE, &path, None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TelemetrySource for HttpGateway {
    async fn list_plants(&self, kind: &str) -> Result<Vec<Plant>> {
        let path = format!("/plants?type={}", urlencoding::encode(kind));
        self.call_expect(Method::GET, &path, None).await
    }

    async fn list_terminals(&self, plant_id: &str, kind: &str) -> Result<Vec<Terminal>> {
        let path = format!(
            "/terminals?plantId={}&type={}",
            urlencoding::encode(plant_id),
            urlencoding::encode(kind)
        );
        self.call_expect(Method::GET, &path, None).await
    }

    async fn list_measurands(
        &self,
        plant_id: &str,
        terminal_id: &str,
        kind: &str,
    ) -> Result<Vec<Measurand>> {
        let path = format!(
            "/measurands?plantId={}&terminalId={}&type={}",
            urlencoding::encode(plant_id),
            urlencoding::encode(terminal_id),
            urlencoding::encode(kind)
        );
        self.call_expect(Method::GET, &path, None).await
    }

    async fn live_value(&self, terminal_id: &str, measurand_id: &str) -> Result<MeasurandReading> {
        let path = format!(
            "/values/live?terminalId={}&measurandId={}",
            urlencoding::encode(terminal_id),
            urlencoding::encode(measurand_id)
        );
        self.call_expect(Method::GET, &path, None).await
    }

    async fn range_values(
        &self,
        terminal_id: &str,
        measurand_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<(DateTime<Utc>, f64)>> {
        let path = format!(
            "/values/range?terminalId={}&measurandId={}&from={}&to={}",
            urlencoding::encode(terminal_id),
            urlencoding::encode(measurand_id),
            urlencoding::encode(&from.to_rfc3339()),
            urlencoding::encode(&to.to_rfc3339())
        );
        let points: Vec<RangePoint> = self.call_expect(Method::GET, &path, None).await?;
        Ok(points.into_iter().map(|p| (p.time, p.value)).collect())
    }
}
