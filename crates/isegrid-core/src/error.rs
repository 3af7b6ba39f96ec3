//! Error types for isegrid core.

use isegrid_model::{Address, GridError, Rect, SheetId};
use thiserror::Error;

/// Errors that can occur while editing a workbook.
#[derive(Error, Debug)]
pub enum IseError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("{rect} overlaps an existing selection range")]
    Overlap { rect: Rect },

    #[error("Caret offset {caret} is outside the draft ({len} characters)")]
    InvalidContext { caret: usize, len: usize },

    #[error("Unknown sheet: {0}")]
    UnknownSheet(String),

    #[error("{address} is not on {expected}")]
    SheetMismatch { address: Address, expected: SheetId },

    #[error("No cell is being edited")]
    NotEditing,

    #[error("The value at {address} changed shape while it was being edited")]
    TargetChanged { address: Address },

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("No file path set")]
    NoFilePath,

    #[error("A sheet named '{0}' already exists")]
    DuplicateSheetName(String),

    #[error("Sheet name cannot be blank")]
    BlankSheetName,

    #[error("Cannot remove the last sheet")]
    LastSheet,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, IseError>;
