// Dashboard aggregate - widgets plus layout under one name and publish flag
use super::error::EngineError;
use super::grid::{GridCell, GridLayout};
use super::widget::Widget;
use serde::{Deserialize, Serialize};

pub const MAX_NAME_LEN: usize = 50;

/// Lifecycle position of a dashboard. Draft has never been saved; Saved has
/// a gateway-assigned id; Published is additionally the single default
/// shown to viewers. Deletion is terminal and handled by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardState {
    Draft,
    Saved,
    Published,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    /// Assigned by the persistence gateway on first save.
    pub id: Option<String>,
    pub name: String,
    pub widgets: Vec<Widget>,
    pub layout: GridLayout,
    pub is_published: bool,
    pub patron: String,
}

impl Dashboard {
    pub fn new(name: impl Into<String>, patron: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            widgets: Vec::new(),
            layout: GridLayout::new(),
            is_published: false,
            patron: patron.into(),
        }
    }

    pub fn state(&self) -> DashboardState {
        match (&self.id, self.is_published) {
            (None, _) => DashboardState::Draft,
            (Some(_), false) => DashboardState::Saved,
            (Some(_), true) => DashboardState::Published,
        }
    }

    /// Dashboard names are required, at most 50 characters, and restricted
    /// to letters, digits, and spaces. Checked before anything reaches the
    /// gateway.
    pub fn validate_name(name: &str) -> Result<(), EngineError> {
        if name.trim().is_empty() {
            return Err(EngineError::Validation(
                "dashboard name is required".to_string(),
            ));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(EngineError::Validation(format!(
                "dashboard name must not exceed {MAX_NAME_LEN} characters"
            )));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == ' ') {
            return Err(EngineError::Validation(
                "dashboard name may only contain letters, digits, and spaces".to_string(),
            ));
        }
        Ok(())
    }

    /// A widget and its grid cell are created together. The cell's id is
    /// forced to the widget's so the pairing cannot drift.
    pub fn add_widget(&mut self, widget: Widget, mut cell: GridCell) {
        cell.id = widget.id.clone();
        self.layout.place(cell);
        self.widgets.push(widget);
    }

    /// Remove a widget together with its grid cell.
    pub fn remove_widget(&mut self, id: &str) -> Option<Widget> {
        let index = self.widgets.iter().position(|w| w.id == id)?;
        self.layout.remove(id);
        Some(self.widgets.remove(index))
    }

    pub fn widget(&self, id: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn widget_mut(&mut self, id: &str) -> Option<&mut Widget> {
        self.widgets.iter_mut().find(|w| w.id == id)
    }
}
