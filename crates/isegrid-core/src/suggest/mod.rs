//! Formula-style autocomplete.
//!
//! - [`SymbolCatalog`] - Pluggable function/keyword/named-range names
//! - [`SuggestionEngine`] - Pure, ranked, lazy suggestions for a draft
//! - [`SuggestionWorker`] - Background thread with stale-result discarding

mod catalog;
mod engine;
mod matcher;
mod worker;

pub use catalog::{Symbol, SymbolCatalog, SymbolKind};
pub use engine::{SuggestContext, Suggestion, SuggestionEngine, SuggestionKind, Suggestions};
pub use matcher::token_at;
pub use worker::{SuggestionBatch, SuggestionWorker};
