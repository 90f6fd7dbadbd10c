// Style service - templates and bulk style application
use crate::application::dashboard_repository::{DashboardRepository, TemplateRecord};
use crate::domain::error::EngineError;
use crate::domain::widget::{WidgetKind, WidgetStyle};
use std::sync::Arc;

/// Which widgets a style application touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyScope {
    Widget(String),
    Kind(WidgetKind),
    All,
}

impl ApplyScope {
    fn matches(&self, widget_id: &str, kind: WidgetKind) -> bool {
        match self {
            ApplyScope::Widget(id) => id == widget_id,
            ApplyScope::Kind(k) => *k == kind,
            ApplyScope::All => true,
        }
    }
}

#[derive(Clone)]
pub struct StyleService {
    repository: Arc<dyn DashboardRepository>,
}

impl StyleService {
    pub fn new(repository: Arc<dyn DashboardRepository>) -> Self {
        Self { repository }
    }

    pub async fn create_template(
        &self,
        name: &str,
        style: WidgetStyle,
    ) -> Result<String, EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::Validation(
                "template name is required".to_string(),
            ));
        }
        self.repository
            .create_template(TemplateRecord {
                id: None,
                name: name.to_string(),
                style,
            })
            .await
            .map_err(EngineError::network)
    }

    pub async fn list_templates(&self) -> Result<Vec<TemplateRecord>, EngineError> {
        self.repository
            .list_templates()
            .await
            .map_err(EngineError::network)
    }

    pub async fn update_template(
        &self,
        id: &str,
        record: TemplateRecord,
    ) -> Result<(), EngineError> {
        self.repository
            .update_template(id, record)
            .await
            .map_err(EngineError::network)
    }

    pub async fn delete_template(&self, id: &str) -> Result<(), EngineError> {
        self.repository
            .delete_template(id)
            .await
            .map_err(EngineError::network)
    }

    /// Apply a style across the stored dashboard set: to one widget, to all
    /// widgets of a kind, or to every widget. Each touched dashboard is
    /// rewritten; the first failure fails the whole apply from the caller's
    /// point of view. Returns the number of widgets restyled.
    pub async fn apply(&self, scope: ApplyScope, style: &WidgetStyle) -> Result<usize, EngineError> {
        let summaries = self
            .repository
            .list_dashboards()
            .await
            .map_err(EngineError::network)?;

        let mut touched = 0;
        for summary in summaries {
            let Some(mut record) = self
                .repository
                .get_dashboard(&summary.id)
                .await
                .map_err(EngineError::network)?
            else {
                continue;
            };

            let mut changed = 0;
            for widget in &mut record.widgets {
                if scope.matches(&widget.id, widget.kind()) {
                    widget.style = style.clone();
                    changed += 1;
                }
            }
            if changed == 0 {
                continue;
            }

            self.repository
                .update_dashboard(&summary.id, record)
                .await
                .map_err(EngineError::network)?;
            tracing::debug!("restyled {} widgets in dashboard {}", changed, summary.id);
            touched += changed;
        }
        Ok(touched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dashboard_service::DashboardService;
    use crate::domain::dashboard::Dashboard;
    use crate::domain::grid::GridCell;
    use crate::domain::widget::{ScalarConfig, TextConfig, Ranges, ValueRange, Widget, WidgetConfig};
    use crate::infrastructure::memory_store::MemoryStore;

    fn number_widget() -> Widget {
        Widget::create(
            "Busbar voltage",
            WidgetConfig::Number(ScalarConfig {
                terminal_id: "t-1".to_string(),
                measurand_id: "m-volt".to_string(),
                unit: None,
                precision: 2,
                ranges: Ranges(vec![ValueRange {
                    min: 0.0,
                    max: 500.0,
                    color: "#2ca02c".to_string(),
                }]),
                reset_interval_ms: 5000,
            }),
        )
        .unwrap()
    }

    fn text_widget() -> Widget {
        Widget::create(
            "Note",
            WidgetConfig::Text(TextConfig {
                content: "handover".to_string(),
            }),
        )
        .unwrap()
    }

    async fn seed(store: Arc<MemoryStore>) -> (DashboardService, String) {
        let service = DashboardService::new(store);
        let mut dashboard = Dashboard::new("Line 3 Overview", "operator");
        dashboard.add_widget(number_widget(), GridCell::new("", 0, 0, 4, 2));
        dashboard.add_widget(text_widget(), GridCell::new("", 4, 0, 4, 2));
        let id = service.save(&mut dashboard).await.unwrap();
        (service, id)
    }

    fn bold_style() -> WidgetStyle {
        WidgetStyle {
            bold: true,
            color: "#000000".to_string(),
            ..WidgetStyle::default()
        }
    }

    #[tokio::test]
    async fn test_apply_to_kind_only_touches_matching_widgets() {
        let store = Arc::new(MemoryStore::new());
        let (service, id) = seed(store.clone()).await;
        let styles = StyleService::new(store);

        let touched = styles
            .apply(ApplyScope::Kind(WidgetKind::Number), &bold_style())
            .await
            .unwrap();

        assert_eq!(touched, 1);
        let loaded = service.load(&id).await.unwrap();
        for widget in &loaded.widgets {
            let expect_bold = widget.kind() == WidgetKind::Number;
            assert_eq!(widget.style.bold, expect_bold);
        }
    }

    #[tokio::test]
    async fn test_apply_to_all_touches_everything() {
        let store = Arc::new(MemoryStore::new());
        let (service, id) = seed(store.clone()).await;
        let styles = StyleService::new(store);

        let touched = styles.apply(ApplyScope::All, &bold_style()).await.unwrap();

        assert_eq!(touched, 2);
        let loaded = service.load(&id).await.unwrap();
        assert!(loaded.widgets.iter().all(|w| w.style.bold));
    }

    #[tokio::test]
    async fn test_template_crud() {
        let store = Arc::new(MemoryStore::new());
        let styles = StyleService::new(store);

        let id = styles
            .create_template("Alarm red", bold_style())
            .await
            .unwrap();
        assert_eq!(styles.list_templates().await.unwrap().len(), 1);

        styles.delete_template(&id).await.unwrap();
        assert!(styles.list_templates().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_template_name_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let styles = StyleService::new(store);

        assert!(matches!(
            styles.create_template("  ", bold_style()).await,
            Err(EngineError::Validation(_))
        ));
    }
}
