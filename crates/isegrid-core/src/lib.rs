//! isegrid-core - UI-agnostic workbook, selection, suggestions and editing.

pub mod config;
pub mod error;
pub mod selection;
pub mod session;
pub mod storage;
pub mod suggest;
pub mod workbook;

pub use config::{CommitDirection, EditorConfig, ReactivatePolicy, SchemaBinding, SymbolConfig};
pub use error::{IseError, Result};
pub use selection::{Direction, Selection};
pub use session::{EditSession, EditState, EditTarget, Editor};
pub use storage::ImportReport;
pub use suggest::{
    SuggestContext, Suggestion, SuggestionEngine, SuggestionKind, SuggestionWorker, Symbol,
    SymbolCatalog,
};
pub use workbook::{Sheet, UndoAction, UndoEntry, Workbook};

pub use isegrid_model::{Address, CellValue, Orientation, Rect, SheetId};
