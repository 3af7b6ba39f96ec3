//! Structured cell model.
//!
//! - [`Address`], [`SheetId`] - Cell addressing and A1 notation
//! - [`CellValue`] - Scalar, variant and repetition content
//! - [`Shape`], [`SchemaRegistry`] - Declared shapes bound to columns/regions
//! - [`Rect`], [`span`] - Rectangles and the spans composite values occupy
//! - [`Grid`] - Sparse, schema-checked storage
//! - [`detect_cycle`], [`extract_references`] - Formula reference analysis

mod address;
mod cycle;
mod grid;
mod refs;
mod schema;
mod span;
mod value;

pub use address::{Address, SheetId, col_to_letters, letters_to_col};
pub use cycle::detect_cycle;
pub use grid::{CellChange, Grid, Membership};
pub use refs::{ShiftOperation, extract_references, shift_references};
pub use schema::{BindingTarget, SchemaRegistry, Shape};
pub use span::{Rect, member_index, span, span_of};
pub use value::{CellValue, Orientation, PathStep, ScalarKind};
