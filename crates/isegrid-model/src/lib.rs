//! isegrid_model - Structured cell model for the isegrid editor.

pub mod error;
pub mod model;

pub use error::{GridError, Result, SchemaError};
pub use model::*;
