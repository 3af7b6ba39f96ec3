use super::{Sheet, Workbook};
use crate::config::SchemaBinding;
use crate::error::{IseError, Result};
use crate::storage::{DocumentContent, ImportReport, parse_document, write_document};
use isegrid_model::{Address, Grid};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

impl Workbook {
    /// Create a workbook and load `path` if it exists. A path that does not
    /// exist yet becomes the save target of an empty workbook.
    ///
    /// `schemas` are bound before loading so loaded values are validated
    /// against them.
    pub fn with_file(
        path: Option<PathBuf>,
        schemas: Vec<SchemaBinding>,
    ) -> Result<(Self, ImportReport)> {
        let mut workbook = Self::new();
        let mut report = ImportReport::default();
        match path {
            Some(p) if p.exists() => {
                workbook.schema_bindings = schemas;
                report = workbook.load_file(&p)?;
            }
            other => {
                workbook.file_path = other;
                for warning in workbook.set_schema_bindings(schemas) {
                    warn!("{}", warning);
                }
            }
        }
        Ok((workbook, report))
    }

    /// Save to current file path.
    /// Returns the path saved to.
    pub fn save_file(&mut self) -> Result<PathBuf> {
        let Some(path) = self.file_path.clone() else {
            return Err(IseError::NoFilePath);
        };
        write_document(&path, self)?;
        self.modified = false;
        Ok(path)
    }

    /// Save to `path` and make it the current file path.
    pub fn save_as(&mut self, path: &Path) -> Result<PathBuf> {
        write_document(path, self)?;
        self.file_path = Some(path.to_path_buf());
        self.modified = false;
        Ok(path.to_path_buf())
    }

    /// Load from file, replacing the current sheets, cells and history.
    ///
    /// A file that cannot be read or parsed leaves the workbook untouched.
    /// Individual values that violate a schema or collide with another value
    /// are skipped and listed in the report.
    pub fn load_file(&mut self, path: &Path) -> Result<ImportReport> {
        let document = parse_document(path)?;
        let report = self.import_document(document);
        self.file_path = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            loaded = report.loaded,
            rejected = report.rejected.len(),
            "loaded document"
        );
        Ok(report)
    }

    /// Replace the workbook content with a parsed document.
    pub fn import_document(&mut self, document: DocumentContent) -> ImportReport {
        let sheets: Vec<Sheet> = document
            .sheets
            .iter()
            .map(|s| Sheet {
                id: s.id,
                name: s.name.clone(),
            })
            .collect();
        let (schemas, warnings) = self.resolve_schemas(&sheets);
        for warning in warnings {
            warn!("{}", warning);
        }

        let mut grid = Grid::with_schemas(schemas);
        let mut report = ImportReport::default();
        for sheet in &document.sheets {
            for cell in &sheet.cells {
                let address = Address::new(sheet.id, cell.row, cell.col);
                match grid.set(address, cell.value.clone()) {
                    Ok(_) => report.loaded += 1,
                    Err(err) => {
                        warn!(%address, error = %err, "skipped value during import");
                        report.rejected.push((address, err));
                    }
                }
            }
        }

        self.next_sheet_id = sheets.iter().map(|s| s.id.0 + 1).max().unwrap_or(0);
        self.sheets = sheets;
        self.grid = grid;
        self.title = document.title;
        self.modified = false;
        self.undo_stack.clear();
        self.redo_stack.clear();
        report
    }
}
