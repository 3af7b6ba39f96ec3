//! Parser for the JSON document format

use super::{DocumentContent, FORMAT_TAG, FORMAT_VERSION};
use crate::error::{IseError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Parse a document file
pub fn parse_document(path: &Path) -> Result<DocumentContent> {
    let content = fs::read_to_string(path)?;
    parse_document_content(&content)
}

/// Parse document content from a string, checking the header and sheet list.
pub fn parse_document_content(content: &str) -> Result<DocumentContent> {
    let document: DocumentContent =
        serde_json::from_str(content).map_err(|e| IseError::Parse {
            line: e.line(),
            message: e.to_string(),
        })?;

    if document.format != FORMAT_TAG {
        return Err(IseError::Parse {
            line: 1,
            message: format!("Not an isegrid document (format '{}')", document.format),
        });
    }
    if document.version != FORMAT_VERSION {
        return Err(IseError::Parse {
            line: 1,
            message: format!("Unsupported document version {}", document.version),
        });
    }
    if document.sheets.is_empty() {
        return Err(IseError::Parse {
            line: 1,
            message: "Document has no sheets".to_string(),
        });
    }

    let mut ids = HashSet::new();
    let mut names = HashSet::new();
    for sheet in &document.sheets {
        if !ids.insert(sheet.id) || !names.insert(sheet.name.to_ascii_lowercase()) {
            return Err(IseError::Parse {
                line: 1,
                message: format!("Duplicate sheet '{}' ({})", sheet.name, sheet.id),
            });
        }
    }

    Ok(document)
}
