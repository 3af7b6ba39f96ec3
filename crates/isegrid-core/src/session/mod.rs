//! Cell editing: the edit session state machine and the editor driving it.

mod editor;
mod state;

pub use editor::Editor;
pub use state::{EditSession, EditState, EditTarget};
