// In-memory document collection - demo mode and test persistence
use crate::application::dashboard_repository::{
    DashboardRecord, DashboardRepository, DashboardSummary, TemplateRecord,
};
use crate::application::saved_views::{SavedView, SavedViewStore};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Document-style store keeping everything in process memory. Ids are
/// assigned on create, like the real gateway's backing collection.
#[derive(Default)]
pub struct MemoryStore {
    dashboards: RwLock<HashMap<String, DashboardRecord>>,
    templates: RwLock<HashMap<String, TemplateRecord>>,
    views: RwLock<HashMap<String, SavedView>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DashboardRepository for MemoryStore {
    async fn create_dashboard(&self, mut record: DashboardRecord) -> anyhow::Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        record.id = Some(id.clone());
        self.dashboards.write().await.insert(id.clone(), record);
        Ok(id)
    }

    async fn update_dashboard(&self, id: &str, mut record: DashboardRecord) -> anyhow::Result<()> {
        let mut dashboards = self.dashboards.write().await;
        if !dashboards.contains_key(id) {
            anyhow::bail!("no dashboard with id {id}");
        }
        record.id = Some(id.to_string());
        dashboards.insert(id.to_string(), record);
        Ok(())
    }

    async fn get_dashboard(&self, id: &str) -> anyhow::Result<Option<DashboardRecord>> {
        Ok(self.dashboards.read().await.get(id).cloned())
    }

    async fn list_dashboards(&self) -> anyhow::Result<Vec<DashboardSummary>> {
        let mut summaries: Vec<DashboardSummary> = self
            .dashboards
            .read()
            .await
            .values()
            .map(|r| DashboardSummary {
                id: r.id.clone().unwrap_or_default(),
                name: r.name.clone(),
                is_published: r.is_published,
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(summaries)
    }

    async fn delete_dashboard(&self, id: &str) -> anyhow::Result<()> {
        if self.dashboards.write().await.remove(id).is_none() {
            anyhow::bail!("no dashboard with id {id}");
        }
        Ok(())
    }

    async fn create_template(&self, mut record: TemplateRecord) -> anyhow::Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        record.id = Some(id.clone());
        self.templates.write().await.insert(id.clone(), record);
        Ok(id)
    }

    async fn list_templates(&self) -> anyhow::Result<Vec<TemplateRecord>> {
        let mut templates: Vec<TemplateRecord> =
            self.templates.read().await.values().cloned().collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(templates)
    }

    async fn update_template(&self, id: &str, mut record: TemplateRecord) -> anyhow::Result<()> {
        let mut templates = self.templates.write().await;
        if !templates.contains_key(id) {
            anyhow::bail!("no template with id {id}");
        }
        record.id = Some(id.to_string());
        templates.insert(id.to_string(), record);
        Ok(())
    }

    async fn delete_template(&self, id: &str) -> anyhow::Result<()> {
        if self.templates.write().await.remove(id).is_none() {
            anyhow::bail!("no template with id {id}");
        }
        Ok(())
    }
}

#[async_trait]
impl SavedViewStore for MemoryStore {
    async fn list(&self) -> anyhow::Result<Vec<SavedView>> {
        let mut views: Vec<SavedView> = self.views.read().await.values().cloned().collect();
        views.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(views)
    }

    async fn save(&self, view: SavedView) -> anyhow::Result<()> {
        self.views.write().await.insert(view.name.clone(), view);
        Ok(())
    }

    async fn delete(&self, name: &str) -> anyhow::Result<()> {
        if self.views.write().await.remove(name).is_none() {
            anyhow::bail!("no saved view named {name}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> DashboardRecord {
        DashboardRecord {
            id: None,
            name: name.to_string(),
            widgets: Vec::new(),
            layout: Vec::new(),
            is_published: false,
            patron: "operator".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_listing_sees_it() {
        let store = MemoryStore::new();
        let id = store.create_dashboard(record("Line 3")).await.unwrap();

        let listed = store.list_dashboards().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
    }

    #[tokio::test]
    async fn test_update_unknown_id_fails() {
        let store = MemoryStore::new();
        assert!(store.update_dashboard("missing", record("x")).await.is_err());
    }

    #[tokio::test]
    async fn test_saved_views_replace_by_name() {
        let store = MemoryStore::new();
        let mut view = SavedView {
            name: "Morning shift".to_string(),
            profile: "15min".to_string(),
            plant_id: "p-1".to_string(),
            terminal_id: "t-1".to_string(),
            measurand_ids: vec!["m-volt".to_string()],
        };
        store.save(view.clone()).await.unwrap();

        view.measurand_ids.push("m-amp".to_string());
        store.save(view).await.unwrap();

        let views = store.list().await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].measurand_ids.len(), 2);
    }
}
