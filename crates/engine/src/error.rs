//! Error types.
//!
//! Only `GridError` ever reaches the host as an `Err`: it signals integration
//! misuse (using an unmounted engine, addressing a column that doesn't
//! exist). Collaborator failures (`HookError`, `ClipboardError`) are caught
//! at the call site and turned into user notices.

use std::fmt;

/// Integration misuse. Runtime data conditions never produce this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// Engine API called after `unmount()`
    Unmounted,
    /// Two columns share an id
    DuplicateColumn(String),
    /// A position named a column the row model doesn't have
    UnknownColumn(String),
    /// A position named a row past the end of the row model
    RowOutOfRange { row: usize, row_count: usize },
    /// Operation requires a specific cell variant
    WrongVariant { column: String, expected: &'static str },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unmounted => write!(f, "grid engine used after unmount"),
            Self::DuplicateColumn(id) => write!(f, "duplicate column id '{id}'"),
            Self::UnknownColumn(id) => write!(f, "unknown column '{id}'"),
            Self::RowOutOfRange { row, row_count } => {
                write!(f, "row {row} out of range (row count {row_count})")
            }
            Self::WrongVariant { column, expected } => {
                write!(f, "column '{column}' is not a {expected} column")
            }
        }
    }
}

impl std::error::Error for GridError {}

/// Failure reported by a row or file collaborator hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookError(pub String);

impl HookError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for HookError {}

/// Failure of the OS clipboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// The user or platform refused clipboard access
    PermissionDenied,
    /// Nothing to read
    Empty,
    /// Any other platform failure
    Unavailable(String),
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "clipboard permission denied"),
            Self::Empty => write!(f, "clipboard is empty"),
            Self::Unavailable(msg) => write!(f, "clipboard unavailable: {msg}"),
        }
    }
}

impl std::error::Error for ClipboardError {}
