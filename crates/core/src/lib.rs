//! Core types for the cell grid: addressing, typed values, the cell-type
//! registry, column descriptors and selection rectangles. Pure data, no I/O.

pub mod column;
pub mod position;
pub mod selection;
pub mod value;
pub mod variant;

pub use column::{navigable_ids, ColumnDescriptor};
pub use position::{CellKey, CellPosition};
pub use selection::{CellRect, SelectionRange, SelectionState};
pub use value::{CellValue, FileDescriptor};
pub use variant::{CellVariant, Coercion, CoercionContext, EditorKind, FileRejection, SelectOption};
