use std::time::Duration;

use isegrid_model::{
    Address, CellValue, Orientation, PathStep, Rect, ScalarKind, SheetId,
};
use tracing::{debug, warn};

use super::state::{EditSession, EditState, EditTarget};
use crate::config::{EditorConfig, ReactivatePolicy};
use crate::error::{IseError, Result};
use crate::selection::{Direction, Selection};
use crate::suggest::{SuggestContext, Suggestion, SuggestionEngine, SuggestionWorker, token_at};
use crate::workbook::Workbook;

/// Owns a workbook and drives selection, suggestions and edit sessions.
///
/// All grid mutation made on behalf of the user goes through here, so at
/// most one cell is ever being edited.
pub struct Editor {
    workbook: Workbook,
    selection: Selection,
    engine: SuggestionEngine,
    worker: Option<SuggestionWorker>,
    config: EditorConfig,
    state: EditState,
}

impl Editor {
    /// Configured schema bindings replace the workbook's unless it already
    /// carries them; bindings that do not resolve are logged and skipped.
    pub fn new(mut workbook: Workbook, config: EditorConfig) -> Self {
        if workbook.schema_bindings != config.schemas {
            for warning in workbook.set_schema_bindings(config.schemas.clone()) {
                warn!("{}", warning);
            }
        }
        let engine = SuggestionEngine::new(config.catalog())
            .with_limits(config.max_suggestions, config.min_fuzzy_len);
        let worker = if config.background_suggestions {
            match SuggestionWorker::spawn(engine.clone()) {
                Ok(worker) => Some(worker),
                Err(err) => {
                    warn!(error = %err, "could not start suggestion worker; suggesting inline");
                    None
                }
            }
        } else {
            None
        };
        let selection = Selection::new(Address::new(workbook.first_sheet(), 0, 0));
        Editor {
            workbook,
            selection,
            engine,
            worker,
            config,
            state: EditState::Idle,
        }
    }

    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    /// Mutable access to the workbook. An open edit is settled first so no
    /// session outlives a change to the grid under it.
    pub fn workbook_mut(&mut self) -> Result<&mut Workbook> {
        self.settle()?;
        Ok(&mut self.workbook)
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    /// The open session, if a cell is being edited.
    pub fn session(&self) -> Option<&EditSession> {
        match &self.state {
            EditState::Editing(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.session().is_some()
    }

    /// Suggestions of the open session; empty when idle.
    pub fn suggestions(&self) -> &[Suggestion] {
        self.session().map(EditSession::suggestions).unwrap_or(&[])
    }

    pub fn current_sheet(&self) -> SheetId {
        self.selection.focus().sheet
    }

    fn editing_mut(&mut self) -> Result<&mut EditSession> {
        match &mut self.state {
            EditState::Editing(session) => Ok(session),
            _ => Err(IseError::NotEditing),
        }
    }

    /// Start editing `address`.
    ///
    /// An edit already in progress is first committed or cancelled according
    /// to the reactivation policy. If that commit fails the old session stays
    /// open and the error is returned.
    pub fn activate(&mut self, address: Address) -> Result<()> {
        self.workbook.check_sheet(address.sheet)?;
        self.settle()?;

        let target = self.target_for(address);
        let root = self.workbook.grid.get(&target.anchor);
        let node = root.at_path(&target.path);
        let draft = node.map(CellValue::to_input_string).unwrap_or_default();
        let formula = matches!(
            node,
            Some(CellValue::Scalar {
                kind: ScalarKind::Formula,
                ..
            })
        );
        self.selection.move_to(address);
        debug!(%address, anchor = %target.anchor, formula, "activated cell");
        self.state = EditState::Editing(EditSession::new(target, draft, formula));
        self.refresh_suggestions();
        Ok(())
    }

    /// Close any open session per the reactivation policy.
    fn settle(&mut self) -> Result<()> {
        if !self.is_editing() {
            return Ok(());
        }
        match self.config.reactivate_policy {
            ReactivatePolicy::Commit => self.finish_commit(false).map(|_| ()),
            ReactivatePolicy::Cancel => self.cancel(),
        }
    }

    fn target_for(&self, address: Address) -> EditTarget {
        let grid = &self.workbook.grid;
        let (anchor, mut path) = match grid.membership(&address) {
            Some(m) => (m.anchor, vec![PathStep::Item(m.index)]),
            None => (address, Vec::new()),
        };
        let root = grid.get(&anchor);
        let mut node = root.at_path(&path);
        while let Some(CellValue::Variant { payload, .. }) = node {
            path.push(PathStep::Payload);
            node = Some(&**payload);
        }
        EditTarget {
            address,
            anchor,
            path,
        }
    }

    /// Insert `text` at the caret.
    pub fn type_text(&mut self, text: &str) -> Result<()> {
        let session = self.editing_mut()?;
        let at = session.byte_index(session.caret);
        session.draft.insert_str(at, text);
        session.caret += text.chars().count();
        session.message = None;
        self.refresh_suggestions();
        Ok(())
    }

    pub fn type_char(&mut self, c: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.type_text(c.encode_utf8(&mut buf))
    }

    /// Delete the character before the caret.
    pub fn backspace(&mut self) -> Result<()> {
        let session = self.editing_mut()?;
        if session.caret == 0 {
            return Ok(());
        }
        let at = session.byte_index(session.caret - 1);
        session.draft.remove(at);
        session.caret -= 1;
        self.refresh_suggestions();
        Ok(())
    }

    /// Delete the character after the caret.
    pub fn delete(&mut self) -> Result<()> {
        let session = self.editing_mut()?;
        if session.caret >= session.draft_len() {
            return Ok(());
        }
        let at = session.byte_index(session.caret);
        session.draft.remove(at);
        self.refresh_suggestions();
        Ok(())
    }

    /// Move the caret by `delta` characters, clamped to the draft.
    pub fn move_caret(&mut self, delta: isize) -> Result<()> {
        let session = self.editing_mut()?;
        let len = session.draft_len();
        session.caret = session.caret.saturating_add_signed(delta).min(len);
        self.refresh_suggestions();
        Ok(())
    }

    pub fn set_caret(&mut self, caret: usize) -> Result<()> {
        let session = self.editing_mut()?;
        let len = session.draft_len();
        if caret > len {
            return Err(IseError::InvalidContext { caret, len });
        }
        session.caret = caret;
        self.refresh_suggestions();
        Ok(())
    }

    /// Highlight suggestion `index`. Returns false if there is no such entry.
    pub fn select_suggestion(&mut self, index: usize) -> Result<bool> {
        let session = self.editing_mut()?;
        if index >= session.suggestions.len() {
            return Ok(false);
        }
        session.selected = Some(index);
        Ok(true)
    }

    /// Move the highlight by `delta`, wrapping around the list.
    pub fn cycle_suggestion(&mut self, delta: isize) -> Result<()> {
        let session = self.editing_mut()?;
        let len = session.suggestions.len();
        if len == 0 {
            return Ok(());
        }
        let len = len as isize;
        let next = match session.selected {
            Some(i) => (i as isize + delta).rem_euclid(len),
            // Nothing highlighted: forward starts at the top, backward at the bottom.
            None if delta > 0 => (delta - 1).rem_euclid(len),
            None => delta.rem_euclid(len),
        };
        session.selected = Some(next as usize);
        Ok(())
    }

    /// Accept the highlighted suggestion. Returns false if none is highlighted.
    pub fn accept_selected(&mut self) -> Result<bool> {
        let session = self.editing_mut()?;
        let Some(suggestion) = session
            .selected
            .and_then(|i| session.suggestions.get(i))
            .cloned()
        else {
            return Ok(false);
        };
        self.accept_suggestion(&suggestion)?;
        Ok(true)
    }

    /// Replace the token before the caret with the suggestion's insert text.
    pub fn accept_suggestion(&mut self, suggestion: &Suggestion) -> Result<()> {
        let session = self.editing_mut()?;
        let (_, start) = token_at(&session.draft, session.caret);
        let from = session.byte_index(start);
        let to = session.byte_index(session.caret);
        session.draft.replace_range(from..to, &suggestion.insert_text);
        session.caret = start + suggestion.insert_text.chars().count();
        if suggestion.kind.implies_formula() {
            session.formula_hint = true;
        }
        debug!(label = %suggestion.label, "accepted suggestion");
        self.refresh_suggestions();
        Ok(())
    }

    /// Write the draft and move the focus per the commit direction. Returns
    /// the edited address.
    ///
    /// On failure the session stays open with the draft intact and
    /// [`EditSession::message`] describing the error.
    pub fn commit(&mut self) -> Result<Address> {
        self.finish_commit(true)
    }

    fn finish_commit(&mut self, advance: bool) -> Result<Address> {
        let session = match std::mem::take(&mut self.state) {
            EditState::Editing(session) => session,
            other => {
                self.state = other;
                return Err(IseError::NotEditing);
            }
        };
        self.cancel_pending();
        self.state = EditState::Committing(session);

        let result = match &self.state {
            EditState::Committing(session) => write_draft(&mut self.workbook, session),
            _ => Err(IseError::NotEditing),
        };
        let EditState::Committing(mut session) = std::mem::take(&mut self.state) else {
            return Err(IseError::NotEditing);
        };

        match result {
            Ok(()) => {
                let address = session.target.address;
                if advance {
                    self.selection.move_to(address);
                    if let Some(direction) = self.config.commit_direction.direction() {
                        self.selection
                            .move_focus(&self.workbook.grid, direction, false, false);
                    }
                }
                debug!(%address, "committed edit");
                Ok(address)
            }
            Err(err) => {
                debug!(address = %session.target.address, error = %err, "commit rejected");
                session.message = Some(err.to_string());
                self.state = EditState::Editing(session);
                Err(err)
            }
        }
    }

    /// Discard the draft. The grid and selection are untouched.
    pub fn cancel(&mut self) -> Result<()> {
        if !self.is_editing() {
            return Err(IseError::NotEditing);
        }
        self.cancel_pending();
        self.state = EditState::Idle;
        debug!("cancelled edit");
        Ok(())
    }

    fn cancel_pending(&self) {
        if let Some(worker) = &self.worker {
            worker.cancel();
        }
    }

    fn refresh_suggestions(&mut self) {
        let EditState::Editing(session) = &mut self.state else {
            return;
        };
        let context = SuggestContext::capture(
            session.draft.clone(),
            session.caret,
            session.target.address,
            &self.workbook.grid,
            self.config.reference_radius,
        );
        session.selected = None;
        match &self.worker {
            Some(worker) => {
                session.generation = worker.request(context);
                session.suggestions.clear();
            }
            None => {
                session.suggestions = match self.engine.suggest(&context) {
                    Ok(suggestions) => suggestions.collect(),
                    Err(err) => {
                        debug!(error = %err, "no suggestions");
                        Vec::new()
                    }
                };
            }
        }
    }

    /// Apply a finished background result for the open session. Returns
    /// true if the suggestion list changed.
    pub fn poll_suggestions(&mut self) -> bool {
        let Some(worker) = &self.worker else {
            return false;
        };
        let EditState::Editing(session) = &mut self.state else {
            return false;
        };
        match worker.try_recv() {
            Some(batch) if batch.generation == session.generation => {
                session.suggestions = batch.result.unwrap_or_default();
                true
            }
            _ => false,
        }
    }

    /// Block up to `timeout` for the open session's background result.
    pub fn wait_for_suggestions(&mut self, timeout: Duration) -> bool {
        let Some(worker) = &self.worker else {
            return false;
        };
        let EditState::Editing(session) = &mut self.state else {
            return false;
        };
        match worker.recv_timeout(timeout) {
            Some(batch) if batch.generation == session.generation => {
                session.suggestions = batch.result.unwrap_or_default();
                true
            }
            _ => false,
        }
    }

    pub fn move_focus(&mut self, direction: Direction, extend: bool) {
        self.selection
            .move_focus(&self.workbook.grid, direction, extend, true);
    }

    pub fn select_range(&mut self, a: Address, b: Address) -> Result<()> {
        self.workbook.check_sheet(a.sheet)?;
        self.selection.select_range(a, b)
    }

    pub fn add_disjoint_range(&mut self, rect: Rect) -> Result<()> {
        self.selection.add_disjoint_range(rect)
    }

    /// Switch to the sheet called `name`, creating it if needed. An open
    /// edit is settled first.
    pub fn switch_sheet(&mut self, name: &str) -> Result<SheetId> {
        self.settle()?;
        let id = match self.workbook.sheet_by_name(name) {
            Some(sheet) => sheet.id,
            None => self.workbook.add_sheet(name)?,
        };
        self.selection.move_to(Address::new(id, 0, 0));
        Ok(id)
    }

    /// Store `value` at `address`, settling any open edit first.
    pub fn set_value(&mut self, address: Address, value: CellValue) -> Result<()> {
        self.workbook_mut()?.set_value(address, value)
    }

    pub fn clear(&mut self, address: Address) -> Result<()> {
        self.workbook_mut()?.clear(address)
    }

    /// Resize the repetition anchored at `address` along its own axis.
    pub fn resize(&mut self, address: Address, new_len: usize, force: bool) -> Result<()> {
        self.settle()?;
        let orientation = match self.workbook.grid.get(&address) {
            CellValue::Repetition { orientation, .. } => orientation,
            // Not an anchor; the grid reports what is there instead.
            _ => Orientation::Column,
        };
        self.workbook.resize(orientation, address, new_len, force)
    }

    pub fn insert_row(&mut self, sheet: SheetId, at: usize) -> Result<()> {
        self.workbook_mut()?.insert_row(sheet, at)
    }

    pub fn insert_column(&mut self, sheet: SheetId, at: usize) -> Result<()> {
        self.workbook_mut()?.insert_column(sheet, at)
    }

    pub fn undo(&mut self) -> Result<()> {
        self.settle()?;
        self.workbook.undo()
    }

    pub fn redo(&mut self) -> Result<()> {
        self.settle()?;
        self.workbook.redo()
    }
}

/// Parse the draft and store it at the session's target.
///
/// An unchanged draft writes nothing, so the stored kind of the value and
/// any composite node under the target survive a commit without edits.
fn write_draft(workbook: &mut Workbook, session: &EditSession) -> Result<()> {
    let target = &session.target;
    if !session.is_dirty() {
        return Ok(());
    }
    let node = CellValue::from_input(&session.draft, session.formula_hint);
    let value = if target.path.is_empty() {
        node
    } else {
        workbook
            .grid
            .get(&target.anchor)
            .replaced_at(&target.path, node)
            .ok_or(IseError::TargetChanged {
                address: target.address,
            })?
    };
    workbook.set_value(target.anchor, value)
}
