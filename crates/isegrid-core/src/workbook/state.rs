use isegrid_model::{Address, CellValue, Grid, SchemaRegistry, SheetId};
use std::path::PathBuf;

use crate::config::SchemaBinding;

/// Maximum number of undo entries to keep
pub(crate) const MAX_UNDO_STACK: usize = 100;

/// Represents an undoable change to one anchor
#[derive(Clone, Debug, PartialEq)]
pub struct UndoAction {
    pub address: Address,
    pub old: Option<CellValue>,
    pub new: Option<CellValue>,
}

/// Represents an undo entry
#[derive(Clone, Debug, PartialEq)]
pub enum UndoEntry {
    /// A single cell modification
    Single(UndoAction),
    /// Several modifications applied together
    Batch(Vec<UndoAction>),
    /// An inserted row or column: moved anchors plus the schema bindings
    /// before and after the shift
    Structural {
        actions: Vec<UndoAction>,
        schemas_before: SchemaRegistry,
        schemas_after: SchemaRegistry,
    },
}

/// A named tab. The id is the grid namespace; the name is what users see.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sheet {
    pub id: SheetId,
    pub name: String,
}

/// UI-agnostic workbook state: sheets, cells, history, file binding.
#[derive(Debug)]
pub struct Workbook {
    /// Cell storage for every sheet
    pub grid: Grid,
    /// Document title
    pub title: String,
    pub(crate) sheets: Vec<Sheet>,
    pub(crate) next_sheet_id: u32,
    /// Schema bindings by sheet name, re-resolved whenever sheets change
    pub(crate) schema_bindings: Vec<SchemaBinding>,
    /// Current file path
    pub file_path: Option<PathBuf>,
    /// Whether the workbook has been modified since the last save or load
    pub modified: bool,
    /// Undo stack
    pub undo_stack: Vec<UndoEntry>,
    /// Redo stack
    pub redo_stack: Vec<UndoEntry>,
}

impl Workbook {
    /// Create an untitled workbook with one sheet.
    ///
    /// This constructor is side-effect free: it does not touch the filesystem.
    pub fn new() -> Self {
        Workbook {
            grid: Grid::new(),
            title: "Untitled".to_string(),
            sheets: vec![Sheet {
                id: SheetId(0),
                name: "Sheet1".to_string(),
            }],
            next_sheet_id: 1,
            schema_bindings: Vec::new(),
            file_path: None,
            modified: false,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}
