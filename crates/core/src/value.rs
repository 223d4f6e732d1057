//! Typed cell values.
//!
//! The row data itself belongs to the host; the engine only ever reads
//! `CellValue`s and emits new ones through the update sink.

use serde::{Deserialize, Serialize};

/// Metadata for one attachment in a file cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub id: String,
    pub name: String,
    /// Size in bytes
    pub size: u64,
    #[serde(rename = "type", alias = "mimeType")]
    pub mime_type: String,
    /// Download/preview locator; `None` while an upload is still in flight.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// The value of one cell, typed by the column variant.
///
/// Serializes untagged so the update sink sees plain JSON values
/// (`"text"`, `5`, `null`, `true`, `["a","b"]`, `[{..file..}]`).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Missing value (`null`/`undefined` in row data)
    #[default]
    Empty,
    /// Short text, long text, url and select values
    Text(String),
    Number(Option<f64>),
    Boolean(bool),
    /// Multi-select values
    List(Vec<String>),
    /// ISO `YYYY-MM-DD` date, or `None` when cleared
    Date(Option<String>),
    Files(Vec<FileDescriptor>),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn number(n: f64) -> Self {
        CellValue::Number(Some(n))
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CellValue::List(items.into_iter().map(Into::into).collect())
    }

    /// True for values that render as nothing: missing, empty text,
    /// null number/date, empty list or file set. `false` checkboxes are
    /// *not* blank; they are a real value.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(n) => n.is_none(),
            CellValue::Boolean(_) => false,
            CellValue::List(items) => items.is_empty(),
            CellValue::Date(d) => d.is_none(),
            CellValue::Files(files) => files.is_empty(),
        }
    }

    /// Plain string form: scalars stringify, lists and files become JSON.
    /// Blank values produce an empty string.
    pub fn to_plain_string(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(Some(n)) => format_number(*n),
            CellValue::Number(None) => String::new(),
            CellValue::Boolean(b) => b.to_string(),
            CellValue::List(items) => serde_json::to_string(items).unwrap_or_default(),
            CellValue::Date(Some(d)) => d.clone(),
            CellValue::Date(None) => String::new(),
            CellValue::Files(files) => serde_json::to_string(files).unwrap_or_default(),
        }
    }
}

/// Numbers print without a trailing `.0` for integral values (`5`, not `5.0`).
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
