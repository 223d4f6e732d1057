//! Cell addressing.
//!
//! A `CellPosition` identifies a cell by its *visual* row index (after sort and
//! filter) and a stable column id. `CellKey` is the canonical string form used
//! as a set/map key throughout the engine.

use serde::{Deserialize, Serialize};

/// Separator between row index and column id inside a `CellKey`.
const KEY_SEPARATOR: char = ':';

/// Address of one cell in the visual row model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellPosition {
    /// Visual row index (0-based)
    pub row_index: usize,
    /// Stable column identifier, unaffected by reordering
    pub column_id: String,
}

impl CellPosition {
    #[inline]
    pub fn new(row_index: usize, column_id: impl Into<String>) -> Self {
        Self { row_index, column_id: column_id.into() }
    }

    /// The value malformed keys decode to: row 0, empty column id.
    pub fn sentinel() -> Self {
        Self { row_index: 0, column_id: String::new() }
    }

    pub fn is_sentinel(&self) -> bool {
        self.row_index == 0 && self.column_id.is_empty()
    }

    pub fn key(&self) -> CellKey {
        CellKey::format(self)
    }
}

impl std::fmt::Display for CellPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.row_index, KEY_SEPARATOR, self.column_id)
    }
}

/// Canonical `"<rowIndex>:<columnId>"` form of a `CellPosition`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellKey(String);

impl CellKey {
    pub fn format(position: &CellPosition) -> Self {
        Self(position.to_string())
    }

    /// Build a key straight from its parts.
    pub fn from_parts(row_index: usize, column_id: &str) -> Self {
        Self(format!("{}{}{}", row_index, KEY_SEPARATOR, column_id))
    }

    /// Decode a key. Never fails: garbage decodes to `CellPosition::sentinel()`.
    ///
    /// Splits at the first separator so column ids containing `:` survive.
    pub fn parse(raw: &str) -> CellPosition {
        let Some((row_part, column_part)) = raw.split_once(KEY_SEPARATOR) else {
            return CellPosition::sentinel();
        };
        if row_part.is_empty() || column_part.is_empty() || !row_part.bytes().all(|b| b.is_ascii_digit()) {
            return CellPosition::sentinel();
        }
        match row_part.parse::<usize>() {
            Ok(row_index) => CellPosition::new(row_index, column_part),
            Err(_) => CellPosition::sentinel(),
        }
    }

    pub fn position(&self) -> CellPosition {
        Self::parse(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CellKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&CellPosition> for CellKey {
    fn from(position: &CellPosition) -> Self {
        Self::format(position)
    }
}
