use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// The bookable slot menu, grouped by day. Read-only input to the
/// availability filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SlotTemplate {
    #[serde(default = "default_alt_text")]
    pub alt_text: String,
    pub groups: Vec<SlotGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotGroup {
    /// Date header, `MM/DD` or a full `YYYY/MM/DD` / `YYYY-MM-DD`.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub buttons: Vec<SlotButton>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotButton {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
}

fn default_alt_text() -> String {
    "請選擇預約時段".to_string()
}

impl SlotTemplate {
    pub fn from_json(s: &str) -> anyhow::Result<Self> {
        let template: SlotTemplate = serde_json::from_str(s)?;
        Ok(template)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read slot template: {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("malformed slot template: {}", path.display()))
    }

    pub fn button_count(&self) -> usize {
        self.groups.iter().map(|g| g.buttons.len()).sum()
    }
}

impl SlotGroup {
    pub fn heading(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.date)
    }
}

impl SlotButton {
    /// The raw slot label this button books; falls back to the visible label.
    pub fn slot_label(&self) -> &str {
        self.slot.as_deref().unwrap_or(&self.label)
    }
}
