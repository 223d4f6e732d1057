//! Column descriptors as seen by the engine.

use serde::{Deserialize, Serialize};

use crate::variant::CellVariant;

/// One column of the grid, in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    /// Stable id; never changes when columns are reordered
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub variant: CellVariant,
    /// Structural columns (row-select checkbox, actions) opt out of keyboard
    /// traversal, selection and clipboard.
    #[serde(default = "default_true")]
    pub navigable: bool,
    #[serde(default)]
    pub read_only: bool,
}

fn default_true() -> bool {
    true
}

impl ColumnDescriptor {
    pub fn new(id: impl Into<String>, variant: CellVariant) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            variant,
            navigable: true,
            read_only: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Mark as structural: skipped by navigation and clipboard.
    pub fn structural(mut self) -> Self {
        self.navigable = false;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Ids of the navigable columns, in display order.
pub fn navigable_ids(columns: &[ColumnDescriptor]) -> Vec<String> {
    columns.iter().filter(|c| c.navigable).map(|c| c.id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigable_ids_skip_structural() {
        let columns = vec![
            ColumnDescriptor::new("select", CellVariant::Checkbox).structural(),
            ColumnDescriptor::new("name", CellVariant::ShortText),
            ColumnDescriptor::new("qty", CellVariant::Number),
            ColumnDescriptor::new("actions", CellVariant::ShortText).structural(),
        ];
        assert_eq!(navigable_ids(&columns), vec!["name".to_string(), "qty".to_string()]);
    }

    #[test]
    fn test_deserialize_column() {
        let col: ColumnDescriptor = serde_json::from_str(
            r#"{"id":"status","label":"Status","variant":"select","options":[{"label":"Done","value":"done"}]}"#,
        )
        .unwrap();
        assert!(col.navigable);
        assert!(!col.read_only);
        assert_eq!(col.variant.options()[0].value, "done");
    }
}
