//! Editor configuration.
//!
//! Everything here is plain data deserialized by the front end (the binary
//! reads it from TOML). Unknown keys are rejected so typos surface as
//! warnings instead of being silently ignored.

use isegrid_model::Shape;
use serde::Deserialize;

use crate::selection::Direction;
use crate::suggest::{Symbol, SymbolCatalog, SymbolKind};

/// Where the focus goes after a successful commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitDirection {
    #[default]
    Down,
    Right,
    Up,
    Left,
    None,
}

impl CommitDirection {
    pub fn direction(self) -> Option<Direction> {
        match self {
            CommitDirection::Down => Some(Direction::Down),
            CommitDirection::Right => Some(Direction::Right),
            CommitDirection::Up => Some(Direction::Up),
            CommitDirection::Left => Some(Direction::Left),
            CommitDirection::None => None,
        }
    }
}

/// What happens to an open edit when another cell is activated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactivatePolicy {
    #[default]
    Commit,
    Cancel,
}

/// An extra catalog entry.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SymbolConfig {
    pub name: String,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A shape bound to a column or a range of one sheet, by sheet name.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaBinding {
    pub sheet: String,
    /// Column letters, e.g. "B".
    #[serde(default)]
    pub column: Option<String>,
    /// A1 range, e.g. "A1:C10".
    #[serde(default)]
    pub range: Option<String>,
    pub shape: Shape,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    pub commit_direction: CommitDirection,
    pub reactivate_policy: ReactivatePolicy,
    pub max_suggestions: usize,
    /// Shortest token that takes part in fuzzy matching.
    pub min_fuzzy_len: usize,
    /// Rows/columns searched for cell-reference candidates.
    pub reference_radius: usize,
    pub background_suggestions: bool,
    pub functions: Vec<SymbolConfig>,
    pub keywords: Vec<String>,
    pub named_ranges: Vec<SymbolConfig>,
    pub schemas: Vec<SchemaBinding>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            commit_direction: CommitDirection::Down,
            reactivate_policy: ReactivatePolicy::Commit,
            max_suggestions: 50,
            min_fuzzy_len: 1,
            reference_radius: 10,
            background_suggestions: false,
            functions: Vec::new(),
            keywords: Vec::new(),
            named_ranges: Vec::new(),
            schemas: Vec::new(),
        }
    }
}

impl EditorConfig {
    /// The built-in catalog extended with the configured entries.
    pub fn catalog(&self) -> SymbolCatalog {
        let mut catalog = SymbolCatalog::with_defaults();
        for entry in &self.functions {
            catalog.add(symbol_from(entry, SymbolKind::Function));
        }
        for entry in &self.named_ranges {
            catalog.add(symbol_from(entry, SymbolKind::NamedRange));
        }
        for name in &self.keywords {
            catalog.add(Symbol::new(name.clone(), SymbolKind::Keyword));
        }
        catalog
    }
}

fn symbol_from(entry: &SymbolConfig, kind: SymbolKind) -> Symbol {
    let mut symbol = Symbol::new(entry.name.clone(), kind);
    symbol.signature = entry.signature.clone();
    symbol.description = entry.description.clone();
    symbol
}
