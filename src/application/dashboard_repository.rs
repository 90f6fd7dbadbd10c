// Repository trait for dashboard and style-template persistence
use crate::domain::dashboard::Dashboard;
use crate::domain::grid::{GridCell, GridLayout};
use crate::domain::widget::{Widget, WidgetStyle};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Persisted dashboard document. Layout is stored as bare cells; the lock
/// flag is session state and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub widgets: Vec<Widget>,
    pub layout: Vec<GridCell>,
    pub is_published: bool,
    #[serde(default)]
    pub patron: String,
}

impl DashboardRecord {
    pub fn from_dashboard(dashboard: &Dashboard) -> Self {
        Self {
            id: dashboard.id.clone(),
            name: dashboard.name.clone(),
            widgets: dashboard.widgets.clone(),
            layout: dashboard.layout.cells.clone(),
            is_published: dashboard.is_published,
            patron: dashboard.patron.clone(),
        }
    }

    pub fn into_dashboard(self) -> Dashboard {
        Dashboard {
            id: self.id,
            name: self.name,
            widgets: self.widgets,
            layout: GridLayout {
                cells: self.layout,
                locked: false,
            },
            is_published: self.is_published,
            patron: self.patron,
        }
    }
}

/// Listing entry; full documents are fetched by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub id: String,
    pub name: String,
    pub is_published: bool,
}

/// Named, reusable bundle of visual properties. Lifecycle is independent
/// from dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub style: WidgetStyle,
}

#[async_trait]
pub trait DashboardRepository: Send + Sync {
    /// Store a new dashboard document and return its assigned id.
    async fn create_dashboard(&self, record: DashboardRecord) -> anyhow::Result<String>;

    /// Replace the document stored under `id`.
    async fn update_dashboard(&self, id: &str, record: DashboardRecord) -> anyhow::Result<()>;

    /// Fetch one dashboard document, or None when the id is unknown.
    async fn get_dashboard(&self, id: &str) -> anyhow::Result<Option<DashboardRecord>>;

    /// List all stored dashboards.
    async fn list_dashboards(&self) -> anyhow::Result<Vec<DashboardSummary>>;

    async fn delete_dashboard(&self, id: &str) -> anyhow::Result<()>;

    /// Store a new style template and return its assigned id.
    async fn create_template(&self, record: TemplateRecord) -> anyhow::Result<String>;

    async fn list_templates(&self) -> anyhow::Result<Vec<TemplateRecord>>;

    async fn update_template(&self, id: &str, record: TemplateRecord) -> anyhow::Result<()>;

    async fn delete_template(&self, id: &str) -> anyhow::Result<()>;
}
