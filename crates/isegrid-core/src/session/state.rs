use isegrid_model::{Address, PathStep};

use crate::suggest::Suggestion;

/// What a session edits: a node inside the value anchored at `anchor`.
///
/// `address` is the cell that was activated. For a plain cell the anchor is
/// the address itself and the path is empty; for a repetition member the
/// path starts with the member's item index; variants are edited through
/// their payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditTarget {
    pub address: Address,
    pub anchor: Address,
    pub path: Vec<PathStep>,
}

/// The transient draft of one cell edit. Never written to the grid before
/// commit.
#[derive(Clone, Debug, PartialEq)]
pub struct EditSession {
    pub(crate) target: EditTarget,
    pub(crate) draft: String,
    /// Caret offset in characters.
    pub(crate) caret: usize,
    pub(crate) suggestions: Vec<Suggestion>,
    pub(crate) selected: Option<usize>,
    /// Whether the draft commits as a formula. Starts from the edited
    /// scalar's kind and is set by accepting a formula-only suggestion.
    pub(crate) formula_hint: bool,
    /// Draft and hint at activation; committing them unchanged writes nothing.
    pub(crate) initial_draft: String,
    pub(crate) initial_formula: bool,
    pub(crate) message: Option<String>,
    /// Generation of the latest background suggestion request.
    pub(crate) generation: u64,
}

impl EditSession {
    pub(crate) fn new(target: EditTarget, draft: String, formula: bool) -> Self {
        let caret = draft.chars().count();
        EditSession {
            target,
            initial_draft: draft.clone(),
            draft,
            caret,
            suggestions: Vec::new(),
            selected: None,
            formula_hint: formula,
            initial_formula: formula,
            message: None,
            generation: 0,
        }
    }

    pub fn target(&self) -> &EditTarget {
        &self.target
    }

    pub fn address(&self) -> Address {
        self.target.address
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// The error of the last failed commit, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Whether committing now would change the edited value.
    pub fn is_dirty(&self) -> bool {
        self.draft != self.initial_draft || self.formula_hint != self.initial_formula
    }

    pub(crate) fn draft_len(&self) -> usize {
        self.draft.chars().count()
    }

    /// Byte index of a character offset in the draft.
    pub(crate) fn byte_index(&self, offset: usize) -> usize {
        self.draft
            .char_indices()
            .nth(offset)
            .map(|(i, _)| i)
            .unwrap_or(self.draft.len())
    }
}

/// Editor state machine.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum EditState {
    #[default]
    Idle,
    Editing(EditSession),
    /// The draft is being written to the grid.
    Committing(EditSession),
}

impl EditState {
    pub fn name(&self) -> &'static str {
        match self {
            EditState::Idle => "idle",
            EditState::Editing(_) => "editing",
            EditState::Committing(_) => "committing",
        }
    }
}
