// HTTP request handlers
use crate::application::dashboard_repository::TemplateRecord;
use crate::application::refresh_scheduler::DisplayValue;
use crate::application::saved_views::SavedView;
use crate::application::style_service::ApplyScope;
use crate::domain::dashboard::Dashboard;
use crate::domain::error::EngineError;
use crate::domain::grid::GridCell;
use crate::domain::widget::{
    ComparisonSeries, Widget, WidgetConfig, WidgetKind, WidgetStyle, MAX_COMPARISONS,
};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match &self {
            EngineError::Validation(_) | EngineError::InvalidWidgetType(_) => {
                StatusCode::BAD_REQUEST
            }
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Network(_) => StatusCode::BAD_GATEWAY,
        };
        let body = Json(json!({ "status": "error", "message": self.to_string() }));
        (status, body).into_response()
    }
}

fn success(data: impl serde::Serialize) -> Json<Value> {
    Json(json!({ "status": "success", "data": data }))
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboards", get(list_dashboards))
        .route("/dashboards/published", get(load_published_view))
        .route(
            "/dashboards/:id",
            get(get_dashboard).delete(delete_dashboard),
        )
        .route("/dashboards/:id/open", post(open_dashboard))
        .route("/dashboards/:id/publish", post(publish_dashboard))
        .route("/session", post(new_dashboard).get(current_dashboard))
        .route("/session/save", post(save_current))
        .route("/session/publish", post(publish_current))
        .route("/session/lock", post(set_layout_lock))
        .route("/session/widgets", post(add_widget))
        .route(
            "/session/widgets/:id",
            put(update_widget).delete(remove_widget),
        )
        .route("/session/widgets/:id/cell", put(move_widget))
        .route("/session/widgets/:id/style", put(set_widget_style))
        .route("/session/widgets/:id/comparisons", post(add_comparison))
        .route("/session/widgets/:id/chart", get(widget_chart))
        .route("/session/widgets/:id/reading", get(widget_reading))
        .route("/templates", get(list_templates).post(create_template))
        .route(
            "/templates/:id",
            put(update_template).delete(delete_template),
        )
        .route("/styles/apply", post(apply_style))
        .route("/plants", get(list_plants))
        .route("/terminals", get(list_terminals))
        .route("/measurands", get(list_measurands))
        .route("/values/live", get(live_value))
        .route("/values/range", get(range_values))
        .route("/views", get(list_views).post(save_view))
        .route("/views/:name", axum::routing::delete(delete_view))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

// ---- dashboards ----

pub async fn list_dashboards(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    let summaries = state.dashboard_service.list().await?;
    Ok(success(summaries))
}

pub async fn get_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    let dashboard = state.dashboard_service.load(&id).await?;
    Ok(success(dashboard))
}

/// Delete a stored dashboard. Deleting the currently loaded one tears the
/// live view down with it.
pub async fn delete_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    state.dashboard_service.delete(&id).await?;

    let mut current = state.current.write().await;
    if current.as_ref().and_then(|d| d.id.as_deref()) == Some(id.as_str()) {
        state.scheduler.stop_all().await;
        *current = None;
    }
    Ok(success(Value::Null))
}

pub async fn publish_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    let mut dashboard = state.dashboard_service.load(&id).await?;
    let id = state.dashboard_service.publish(&mut dashboard).await?;
    Ok(success(json!({ "id": id })))
}

// ---- live view session ----

async fn install(state: &AppState, dashboard: Dashboard) {
    state.scheduler.stop_all().await;
    for widget in &dashboard.widgets {
        start_timer(state, widget).await;
    }
    *state.current.write().await = Some(dashboard);
}

async fn start_timer(state: &AppState, widget: &Widget) {
    let interval = widget
        .config
        .reset_interval_ms()
        .map(|ms| state.refresh.clamp_interval(ms))
        .unwrap_or(state.refresh.default_interval_ms);
    state.scheduler.start_widget_at(widget, interval).await;
}

/// Entry to the default route: hydrate the published dashboard when there
/// is one, otherwise report the empty state.
pub async fn load_published_view(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    match state.dashboard_service.load_published().await? {
        Some(dashboard) => {
            let snapshot = dashboard.clone();
            install(&state, dashboard).await;
            Ok(success(snapshot))
        }
        None => Ok(success(Value::Null)),
    }
}

pub async fn open_dashboard(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    let dashboard = state.dashboard_service.load(&id).await?;
    let snapshot = dashboard.clone();
    install(&state, dashboard).await;
    Ok(success(snapshot))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDashboardRequest {
    pub name: String,
    #[serde(default)]
    pub patron: String,
}

pub async fn new_dashboard(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewDashboardRequest>,
) -> Result<Json<Value>, EngineError> {
    Dashboard::validate_name(&request.name)?;
    let dashboard = Dashboard::new(request.name, request.patron);
    let snapshot = dashboard.clone();
    install(&state, dashboard).await;
    Ok(success(snapshot))
}

pub async fn current_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    let current = state.current.read().await;
    let state_tag = current.as_ref().map(|d| d.state());
    Ok(success(json!({
        "dashboard": current.clone(),
        "state": state_tag,
    })))
}

async fn with_current<T>(
    state: &AppState,
    f: impl FnOnce(&mut Dashboard) -> Result<T, EngineError>,
) -> Result<T, EngineError> {
    let mut current = state.current.write().await;
    let dashboard = current
        .as_mut()
        .ok_or_else(|| EngineError::Validation("no dashboard loaded".to_string()))?;
    f(dashboard)
}

pub async fn save_current(State(state): State<Arc<AppState>>) -> Result<Json<Value>, EngineError> {
    let mut current = state.current.write().await;
    let dashboard = current
        .as_mut()
        .ok_or_else(|| EngineError::Validation("no dashboard loaded".to_string()))?;
    let id = state.dashboard_service.save(dashboard).await?;
    Ok(success(json!({ "id": id })))
}

pub async fn publish_current(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    let mut current = state.current.write().await;
    let dashboard = current
        .as_mut()
        .ok_or_else(|| EngineError::Validation("no dashboard loaded".to_string()))?;
    let id = state.dashboard_service.publish(dashboard).await?;
    Ok(success(json!({ "id": id })))
}

#[derive(Deserialize)]
pub struct LockRequest {
    pub locked: bool,
}

pub async fn set_layout_lock(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LockRequest>,
) -> Result<Json<Value>, EngineError> {
    with_current(&state, |dashboard| {
        if request.locked {
            dashboard.layout.lock();
        } else {
            dashboard.layout.unlock();
        }
        Ok(())
    })
    .await?;
    Ok(success(Value::Null))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWidgetRequest {
    pub title: String,
    pub config: WidgetConfig,
    pub cell: GridCell,
}

pub async fn add_widget(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddWidgetRequest>,
) -> Result<Json<Value>, EngineError> {
    let widget = Widget::create(request.title, request.config)?;
    let snapshot = widget.clone();
    with_current(&state, |dashboard| {
        dashboard.add_widget(widget, request.cell);
        Ok(())
    })
    .await?;
    start_timer(&state, &snapshot).await;
    Ok(success(snapshot))
}

/// Remove a widget: its grid cell goes with it and its refresh timer is
/// cancelled.
pub async fn remove_widget(
    Path(widget_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    with_current(&state, |dashboard| {
        dashboard
            .remove_widget(&widget_id)
            .ok_or_else(|| EngineError::NotFound(format!("widget {widget_id}")))
    })
    .await?;
    state.scheduler.stop(&widget_id).await;
    Ok(success(Value::Null))
}

pub async fn update_widget(
    Path(widget_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(patch): Json<Value>,
) -> Result<Json<Value>, EngineError> {
    let updated = with_current(&state, |dashboard| {
        let widget = dashboard
            .widget_mut(&widget_id)
            .ok_or_else(|| EngineError::NotFound(format!("widget {widget_id}")))?;
        widget.apply_config_patch(patch)?;
        Ok(widget.clone())
    })
    .await?;
    // Interval or binding may have changed; replace the timer.
    start_timer(&state, &updated).await;
    Ok(success(updated))
}

pub async fn set_widget_style(
    Path(widget_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(style): Json<WidgetStyle>,
) -> Result<Json<Value>, EngineError> {
    let updated = with_current(&state, |dashboard| {
        let widget = dashboard
            .widget_mut(&widget_id)
            .ok_or_else(|| EngineError::NotFound(format!("widget {widget_id}")))?;
        widget.set_style(style);
        Ok(widget.clone())
    })
    .await?;
    Ok(success(updated))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddComparisonRequest {
    pub measurand_id: String,
    pub label: String,
    /// Optional; a palette color is assigned here when absent, so chart
    /// derivation never has to invent one.
    #[serde(default)]
    pub color: Option<String>,
}

pub async fn add_comparison(
    Path(widget_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddComparisonRequest>,
) -> Result<Json<Value>, EngineError> {
    let updated = with_current(&state, |dashboard| {
        let widget = dashboard
            .widget_mut(&widget_id)
            .ok_or_else(|| EngineError::NotFound(format!("widget {widget_id}")))?;
        match &mut widget.config {
            WidgetConfig::Graph(c) | WidgetConfig::MultiAxisGraph(c) => {
                if c.comparisons.len() >= MAX_COMPARISONS {
                    return Err(EngineError::Validation(format!(
                        "at most {} comparison measurands are supported",
                        MAX_COMPARISONS
                    )));
                }
                c.comparisons.push(ComparisonSeries::new(
                    request.measurand_id,
                    request.label,
                    request.color,
                ));
            }
            _ => {
                return Err(EngineError::Validation(
                    "only graph widgets support comparison measurands".to_string(),
                ))
            }
        }
        Ok(widget.clone())
    })
    .await?;
    // The timer picks up the new series on its next start.
    start_timer(&state, &updated).await;
    Ok(success(updated))
}

pub async fn move_widget(
    Path(widget_id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(mut cell): Json<GridCell>,
) -> Result<Json<Value>, EngineError> {
    let layout = with_current(&state, |dashboard| {
        cell.id = widget_id.clone();
        dashboard.layout.apply_change(cell);
        Ok(dashboard.layout.clone())
    })
    .await?;
    Ok(success(layout))
}

pub async fn widget_chart(
    Path(widget_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    let widget = {
        let current = state.current.read().await;
        current
            .as_ref()
            .and_then(|d| d.widget(&widget_id))
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("widget {widget_id}")))?
    };
    let payload = state.series_store.chart_payload(&widget).await;
    Ok(success(payload))
}

/// Latest value for a scalar or datagrid widget. Number and gauge readings
/// carry the band color for the current value (out-of-range readings get
/// none and render in the widget's default color); gauges additionally get
/// the needle position normalized over the configured span.
pub async fn widget_reading(
    Path(widget_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    if let Some(rows) = state.scheduler.table(&widget_id).await {
        return Ok(success(rows));
    }

    let widget = {
        let current = state.current.read().await;
        current.as_ref().and_then(|d| d.widget(&widget_id)).cloned()
    };
    let reading = state.scheduler.reading(&widget_id).await;

    let config = match widget.as_ref().map(|w| &w.config) {
        Some(WidgetConfig::Number(c)) => Some((c, false)),
        Some(WidgetConfig::Gauge(c)) => Some((c, true)),
        _ => None,
    };
    let Some((config, is_gauge)) = config else {
        return Ok(success(reading));
    };

    let value = reading.as_ref().and_then(|r| match r.display {
        DisplayValue::Value(v) => Some(v),
        DisplayValue::Sentinel(_) => None,
    });
    let color = value.and_then(|v| config.ranges.color_for(v));
    let normalized = value.filter(|_| is_gauge).map(|v| config.ranges.normalize(v));

    Ok(success(json!({
        "reading": reading,
        "color": color,
        "normalized": normalized,
    })))
}

// ---- style templates ----

pub async fn list_templates(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    Ok(success(state.style_service.list_templates().await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    pub name: String,
    pub style: WidgetStyle,
}

pub async fn create_template(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateTemplateRequest>,
) -> Result<Json<Value>, EngineError> {
    let id = state
        .style_service
        .create_template(&request.name, request.style)
        .await?;
    Ok(success(json!({ "id": id })))
}

pub async fn update_template(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(record): Json<TemplateRecord>,
) -> Result<Json<Value>, EngineError> {
    state.style_service.update_template(&id, record).await?;
    Ok(success(Value::Null))
}

pub async fn delete_template(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    state.style_service.delete_template(&id).await?;
    Ok(success(Value::Null))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyStyleRequest {
    /// "widget", "kind", or "all".
    pub scope: String,
    #[serde(default)]
    pub widget_id: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    pub style: WidgetStyle,
}

pub async fn apply_style(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ApplyStyleRequest>,
) -> Result<Json<Value>, EngineError> {
    let scope = match request.scope.as_str() {
        "widget" => {
            let id = request.widget_id.ok_or_else(|| {
                EngineError::Validation("widgetId is required for widget scope".to_string())
            })?;
            ApplyScope::Widget(id)
        }
        "kind" => {
            let kind = request
                .kind
                .ok_or_else(|| {
                    EngineError::Validation("kind is required for kind scope".to_string())
                })?
                .parse::<WidgetKind>()?;
            ApplyScope::Kind(kind)
        }
        "all" => ApplyScope::All,
        other => {
            return Err(EngineError::Validation(format!(
                "unknown apply scope: {other}"
            )))
        }
    };
    let touched = state.style_service.apply(scope, &request.style).await?;
    Ok(success(json!({ "widgetsUpdated": touched })))
}

// ---- telemetry catalog ----

#[derive(Deserialize)]
pub struct KindQuery {
    #[serde(rename = "type", default)]
    pub kind: String,
}

pub async fn list_plants(
    Query(query): Query<KindQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    let plants = state
        .telemetry
        .list_plants(&query.kind)
        .await
        .map_err(EngineError::network)?;
    Ok(success(plants))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalsQuery {
    pub plant_id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

pub async fn list_terminals(
    Query(query): Query<TerminalsQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    let terminals = state
        .telemetry
        .list_terminals(&query.plant_id, &query.kind)
        .await
        .map_err(EngineError::network)?;
    Ok(success(terminals))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurandsQuery {
    pub plant_id: String,
    pub terminal_id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

pub async fn list_measurands(
    Query(query): Query<MeasurandsQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    let measurands = state
        .telemetry
        .list_measurands(&query.plant_id, &query.terminal_id, &query.kind)
        .await
        .map_err(EngineError::network)?;
    Ok(success(measurands))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveQuery {
    pub terminal_id: String,
    pub measurand_id: String,
}

pub async fn live_value(
    Query(query): Query<LiveQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    let reading = state
        .telemetry
        .live_value(&query.terminal_id, &query.measurand_id)
        .await
        .map_err(EngineError::network)?;
    Ok(success(reading))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub terminal_id: String,
    pub measurand_id: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

pub async fn range_values(
    Query(query): Query<RangeQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    let points = state
        .telemetry
        .range_values(&query.terminal_id, &query.measurand_id, query.from, query.to)
        .await
        .map_err(EngineError::network)?;
    let data: Vec<Value> = points
        .into_iter()
        .map(|(time, value)| json!({ "time": time, "value": value }))
        .collect();
    Ok(success(data))
}

// ---- saved views ----

pub async fn list_views(State(state): State<Arc<AppState>>) -> Result<Json<Value>, EngineError> {
    let views = state
        .saved_views
        .list()
        .await
        .map_err(EngineError::network)?;
    Ok(success(views))
}

pub async fn save_view(
    State(state): State<Arc<AppState>>,
    Json(view): Json<SavedView>,
) -> Result<Json<Value>, EngineError> {
    if view.name.trim().is_empty() {
        return Err(EngineError::Validation("view name is required".to_string()));
    }
    state
        .saved_views
        .save(view)
        .await
        .map_err(EngineError::network)?;
    Ok(success(Value::Null))
}

pub async fn delete_view(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, EngineError> {
    state
        .saved_views
        .delete(&name)
        .await
        .map_err(EngineError::network)?;
    Ok(success(Value::Null))
}
