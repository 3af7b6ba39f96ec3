//! Writer for the JSON document format

use super::{CellEntry, DocumentContent, FORMAT_TAG, FORMAT_VERSION, SheetContent};
use crate::error::Result;
use crate::workbook::Workbook;
use std::fs;
use std::path::Path;

/// Write a workbook to a document file
pub fn write_document(path: &Path, workbook: &Workbook) -> Result<()> {
    let content = write_document_content(workbook)?;
    fs::write(path, content)?;
    Ok(())
}

/// Write a workbook to a document string
pub fn write_document_content(workbook: &Workbook) -> Result<String> {
    let document = DocumentContent {
        format: FORMAT_TAG.to_string(),
        version: FORMAT_VERSION,
        title: workbook.title.clone(),
        sheets: workbook
            .sheets()
            .iter()
            .map(|sheet| SheetContent {
                id: sheet.id,
                name: sheet.name.clone(),
                // entries() is already row-major
                cells: workbook
                    .grid
                    .entries(sheet.id)
                    .into_iter()
                    .map(|(address, value)| CellEntry {
                        row: address.row,
                        col: address.col,
                        value,
                    })
                    .collect(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&document)? + "\n")
}
