//! Document persistence.
//!
//! A workbook is stored as a JSON document: a header (`format`, `version`,
//! `title`) and one entry per sheet listing its anchored values in row-major
//! order. Values keep their full tree, including variant tags and
//! repetition orientation.

mod parser;
mod writer;

use isegrid_model::{Address, CellValue, GridError, SheetId};
use serde::{Deserialize, Serialize};

pub use parser::{parse_document, parse_document_content};
pub use writer::{write_document, write_document_content};

pub const FORMAT_TAG: &str = "isegrid";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentContent {
    pub format: String,
    pub version: u32,
    #[serde(default)]
    pub title: String,
    pub sheets: Vec<SheetContent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SheetContent {
    pub id: SheetId,
    pub name: String,
    #[serde(default)]
    pub cells: Vec<CellEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellEntry {
    pub row: usize,
    pub col: usize,
    pub value: CellValue,
}

/// Outcome of a bulk import: how many values loaded and which were skipped.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub loaded: usize,
    pub rejected: Vec<(Address, GridError)>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}
