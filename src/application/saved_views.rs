// Saved historical-table views behind an injected repository
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A saved historical-table configuration: which measurands of which
/// terminal to show, under which profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedView {
    pub name: String,
    pub profile: String,
    pub plant_id: String,
    pub terminal_id: String,
    pub measurand_ids: Vec<String>,
}

/// Storage for saved views, injected into whoever needs them. Views are
/// keyed by name; saving an existing name replaces the view.
#[async_trait]
pub trait SavedViewStore: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<SavedView>>;

    async fn save(&self, view: SavedView) -> anyhow::Result<()>;

    async fn delete(&self, name: &str) -> anyhow::Result<()>;
}
