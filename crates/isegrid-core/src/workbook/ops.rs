use super::state::MAX_UNDO_STACK;
use super::{Sheet, UndoAction, UndoEntry, Workbook};
use crate::config::SchemaBinding;
use crate::error::{IseError, Result};
use isegrid_model::{
    Address, CellChange, CellValue, Orientation, Rect, SchemaRegistry, SheetId, ShiftOperation,
    letters_to_col,
};
use tracing::{debug, warn};

/// Which side of a history entry to restore.
#[derive(Copy, Clone)]
enum Side {
    Old,
    New,
}

impl From<CellChange> for UndoAction {
    fn from(change: CellChange) -> Self {
        UndoAction {
            address: change.address,
            old: change.old,
            new: change.new,
        }
    }
}

impl Workbook {
    /// Push an undo entry, dropping the redo history
    fn push_undo(&mut self, entry: UndoEntry) {
        self.undo_stack.push(entry);
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_UNDO_STACK {
            self.undo_stack.remove(0);
        }
    }

    /// Record a batch of actions applied together
    pub fn push_undo_batch(&mut self, actions: Vec<UndoAction>) {
        if actions.is_empty() {
            return;
        }
        self.push_undo(UndoEntry::Batch(actions));
    }

    pub(crate) fn check_sheet(&self, sheet: SheetId) -> Result<()> {
        if self.sheet(sheet).is_some() {
            Ok(())
        } else {
            Err(IseError::UnknownSheet(sheet.to_string()))
        }
    }

    /// Store `value` at `address` and record it for undo.
    pub fn set_value(&mut self, address: Address, value: CellValue) -> Result<()> {
        self.check_sheet(address.sheet)?;
        let new = (!value.is_empty()).then(|| value.clone());
        let old = self.grid.set(address, value)?;
        if old != new {
            self.push_undo(UndoEntry::Single(UndoAction { address, old, new }));
            self.modified = true;
        }
        Ok(())
    }

    /// Clear the value anchored at `address`
    pub fn clear(&mut self, address: Address) -> Result<()> {
        self.set_value(address, CellValue::Empty)
    }

    /// Resize the repetition anchored at `address` and record it for undo.
    pub fn resize(
        &mut self,
        orientation: Orientation,
        address: Address,
        new_len: usize,
        force: bool,
    ) -> Result<()> {
        self.check_sheet(address.sheet)?;
        let old = self.grid.resize(orientation, address, new_len, force)?;
        let new = self.grid.get(&address);
        if old != new {
            self.push_undo(UndoEntry::Single(UndoAction {
                address,
                old: Some(old),
                new: Some(new),
            }));
            self.modified = true;
        }
        Ok(())
    }

    /// Insert a row before `at` on `sheet`
    pub fn insert_row(&mut self, sheet: SheetId, at: usize) -> Result<()> {
        self.insert_line(sheet, ShiftOperation::InsertRow(at))
    }

    /// Insert a column before `at` on `sheet`
    pub fn insert_column(&mut self, sheet: SheetId, at: usize) -> Result<()> {
        self.insert_line(sheet, ShiftOperation::InsertColumn(at))
    }

    fn insert_line(&mut self, sheet: SheetId, op: ShiftOperation) -> Result<()> {
        self.check_sheet(sheet)?;
        let schemas_before = self.grid.schemas().clone();
        let changes = self.grid.insert_line(sheet, op)?;
        let schemas_after = self.grid.schemas().clone();
        if changes.is_empty() && schemas_before == schemas_after {
            return Ok(());
        }
        self.push_undo(UndoEntry::Structural {
            actions: changes.into_iter().map(UndoAction::from).collect(),
            schemas_before,
            schemas_after,
        });
        self.modified = true;
        Ok(())
    }

    /// Undo the last entry
    pub fn undo(&mut self) -> Result<()> {
        let entry = self.undo_stack.pop().ok_or(IseError::NothingToUndo)?;
        self.apply_history(&entry, Side::Old);
        self.redo_stack.push(entry);
        self.modified = true;
        Ok(())
    }

    /// Redo the last undone entry
    pub fn redo(&mut self) -> Result<()> {
        let entry = self.redo_stack.pop().ok_or(IseError::NothingToRedo)?;
        self.apply_history(&entry, Side::New);
        self.undo_stack.push(entry);
        self.modified = true;
        Ok(())
    }

    fn apply_history(&mut self, entry: &UndoEntry, side: Side) {
        let restore = |grid: &mut isegrid_model::Grid, action: &UndoAction| {
            let state = match side {
                Side::Old => action.old.clone(),
                Side::New => action.new.clone(),
            };
            grid.restore(action.address, state);
        };
        match entry {
            UndoEntry::Single(action) => restore(&mut self.grid, action),
            UndoEntry::Batch(actions) => match side {
                Side::Old => actions.iter().rev().for_each(|a| restore(&mut self.grid, a)),
                Side::New => actions.iter().for_each(|a| restore(&mut self.grid, a)),
            },
            UndoEntry::Structural {
                actions,
                schemas_before,
                schemas_after,
            } => {
                for action in actions {
                    restore(&mut self.grid, action);
                }
                let schemas = match side {
                    Side::Old => schemas_before.clone(),
                    Side::New => schemas_after.clone(),
                };
                self.grid.set_schemas(schemas);
            }
        }
    }

    /// Sheets in tab order
    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, id: SheetId) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.id == id)
    }

    /// Look up a sheet by name, ignoring ASCII case
    pub fn sheet_by_name(&self, name: &str) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    /// The first sheet in tab order. A workbook always has at least one.
    pub fn first_sheet(&self) -> SheetId {
        self.sheets.first().map(|s| s.id).unwrap_or_default()
    }

    /// Append a sheet. A blank name gets the next free "SheetN".
    pub fn add_sheet(&mut self, name: &str) -> Result<SheetId> {
        let name = match name.trim() {
            "" => self.free_sheet_name(),
            trimmed => trimmed.to_string(),
        };
        if self.sheet_by_name(&name).is_some() {
            return Err(IseError::DuplicateSheetName(name));
        }
        let id = SheetId(self.next_sheet_id);
        self.next_sheet_id += 1;
        let sheet = Sheet { id, name };

        let mut registry = self.grid.schemas().clone();
        for warning in self.bind_sheet_schemas(&sheet, &mut registry) {
            warn!("{}", warning);
        }
        self.grid.set_schemas(registry);

        debug!(%id, name = %sheet.name, "added sheet");
        self.sheets.push(sheet);
        self.modified = true;
        Ok(id)
    }

    /// Rename a sheet. Schema bindings follow the new name: bindings for the
    /// old name are dropped and those configured for the new one applied.
    pub fn rename_sheet(&mut self, id: SheetId, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IseError::BlankSheetName);
        }
        if let Some(existing) = self.sheet_by_name(name)
            && existing.id != id
        {
            return Err(IseError::DuplicateSheetName(name.to_string()));
        }
        let sheet = self
            .sheets
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| IseError::UnknownSheet(id.to_string()))?;
        let rebind = !sheet.name.eq_ignore_ascii_case(name);
        sheet.name = name.to_string();
        let renamed = sheet.clone();
        self.modified = true;

        if rebind {
            let mut registry = self.grid.schemas().clone();
            registry.unbind_sheet(id);
            for warning in self.bind_sheet_schemas(&renamed, &mut registry) {
                warn!("{}", warning);
            }
            self.grid.set_schemas(registry);
        }
        debug!(%id, name, rebind, "renamed sheet");
        Ok(())
    }

    /// Remove a sheet and everything on it. Returns how many values were
    /// dropped. History is cleared because it may refer to the sheet.
    pub fn remove_sheet(&mut self, id: SheetId) -> Result<usize> {
        self.check_sheet(id)?;
        if self.sheets.len() == 1 {
            return Err(IseError::LastSheet);
        }
        self.sheets.retain(|s| s.id != id);
        let removed = self.grid.remove_sheet(id);
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.modified = true;
        debug!(%id, removed, "removed sheet");
        Ok(removed)
    }

    fn free_sheet_name(&self) -> String {
        (1..)
            .map(|n| format!("Sheet{}", n))
            .find(|candidate| self.sheet_by_name(candidate).is_none())
            .unwrap_or_default()
    }

    /// Replace the configured schema bindings and bind them to the current
    /// sheets. Returns a warning for every binding that could not be applied.
    pub fn set_schema_bindings(&mut self, bindings: Vec<SchemaBinding>) -> Vec<String> {
        self.schema_bindings = bindings;
        let (registry, warnings) = self.resolve_schemas(&self.sheets);
        self.grid.set_schemas(registry);
        warnings
    }

    pub(crate) fn resolve_schemas(&self, sheets: &[Sheet]) -> (SchemaRegistry, Vec<String>) {
        let mut registry = SchemaRegistry::new();
        let mut warnings = Vec::new();
        for sheet in sheets {
            warnings.extend(self.bind_sheet_schemas(sheet, &mut registry));
        }
        for binding in &self.schema_bindings {
            if !sheets.iter().any(|s| s.name.eq_ignore_ascii_case(&binding.sheet)) {
                warnings.push(format!("Schema for unknown sheet '{}' ignored", binding.sheet));
            }
        }
        (registry, warnings)
    }

    fn bind_sheet_schemas(&self, sheet: &Sheet, registry: &mut SchemaRegistry) -> Vec<String> {
        let mut warnings = Vec::new();
        let bindings = self
            .schema_bindings
            .iter()
            .filter(|b| b.sheet.eq_ignore_ascii_case(&sheet.name));
        for binding in bindings {
            match (&binding.column, &binding.range) {
                (Some(column), None) => match letters_to_col(column.trim()) {
                    Some(col) => registry.bind_column(sheet.id, col, binding.shape.clone()),
                    None => warnings.push(format!("Invalid schema column: {}", column)),
                },
                (None, Some(range)) => match Rect::parse_a1(sheet.id, range) {
                    Some(rect) => registry.bind_region(rect, binding.shape.clone()),
                    None => warnings.push(format!("Invalid schema range: {}", range)),
                },
                _ => warnings.push(format!(
                    "Schema on sheet '{}' needs exactly one of 'column' or 'range'",
                    binding.sheet
                )),
            }
        }
        warnings
    }
}
