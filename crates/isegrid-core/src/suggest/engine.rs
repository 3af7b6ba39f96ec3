//! Ranked completion of the token under the caret.
//!
//! Ranking, in order:
//! 1. catalog names starting with the token, alphabetical
//! 2. catalog names containing the token as a subsequence, densest first,
//!    ties alphabetical
//! 3. populated cells near the edited address whose A1 label starts with the
//!    token, nearest first
//!
//! Each tier is only computed once the previous one is exhausted, so callers
//! that take the first few suggestions never pay for the rest.

use std::sync::Arc;

use isegrid_model::{Address, Grid};

use super::catalog::{Symbol, SymbolCatalog, SymbolKind};
use super::matcher::{is_prefix, subsequence_gap, token_at};
use crate::error::{IseError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SuggestionKind {
    Function,
    CellReference,
    NamedRange,
    Keyword,
}

impl SuggestionKind {
    /// Whether accepting this kind turns the draft into a formula.
    pub fn implies_formula(self) -> bool {
        !matches!(self, SuggestionKind::Keyword)
    }
}

impl From<SymbolKind> for SuggestionKind {
    fn from(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Function => SuggestionKind::Function,
            SymbolKind::NamedRange => SuggestionKind::NamedRange,
            SymbolKind::Keyword => SuggestionKind::Keyword,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Suggestion {
    pub label: String,
    pub insert_text: String,
    pub kind: SuggestionKind,
    /// Position in the ranked sequence, starting at 0.
    pub rank: u32,
}

/// Everything a suggestion request looks at. Owns its data so it can be sent
/// to a background worker.
#[derive(Clone, Debug, PartialEq)]
pub struct SuggestContext {
    pub draft: String,
    /// Caret offset in characters.
    pub caret: usize,
    pub address: Address,
    /// Populated addresses near `address`, nearest first.
    pub nearby: Vec<Address>,
}

impl SuggestContext {
    /// Snapshot the reference candidates for `address` from `grid`.
    pub fn capture(
        draft: impl Into<String>,
        caret: usize,
        address: Address,
        grid: &Grid,
        radius: usize,
    ) -> SuggestContext {
        SuggestContext {
            draft: draft.into(),
            caret,
            address,
            nearby: grid.populated_near(&address, radius),
        }
    }
}

/// Stateless suggestion source over a shared catalog.
#[derive(Clone, Debug)]
pub struct SuggestionEngine {
    catalog: Arc<SymbolCatalog>,
    max_suggestions: usize,
    min_fuzzy_len: usize,
}

impl SuggestionEngine {
    pub fn new(catalog: SymbolCatalog) -> Self {
        SuggestionEngine {
            catalog: Arc::new(catalog),
            max_suggestions: 50,
            min_fuzzy_len: 1,
        }
    }

    pub fn with_limits(mut self, max_suggestions: usize, min_fuzzy_len: usize) -> Self {
        self.max_suggestions = max_suggestions;
        self.min_fuzzy_len = min_fuzzy_len;
        self
    }

    pub fn catalog(&self) -> &SymbolCatalog {
        &self.catalog
    }

    /// Start a ranked sequence for `context`. Fails with `InvalidContext` when
    /// the caret lies outside the draft.
    pub fn suggest<'a>(&'a self, context: &'a SuggestContext) -> Result<Suggestions<'a>> {
        let len = context.draft.chars().count();
        if context.caret > len {
            return Err(IseError::InvalidContext {
                caret: context.caret,
                len,
            });
        }
        let (token, _) = token_at(&context.draft, context.caret);
        let stage = if token.is_empty() {
            if context.draft.starts_with('=') {
                Stage::References
            } else {
                Stage::Done
            }
        } else {
            Stage::Prefix
        };
        Ok(Suggestions {
            catalog: &self.catalog,
            context,
            token,
            min_fuzzy_len: self.min_fuzzy_len,
            remaining: self.max_suggestions,
            next_rank: 0,
            stage,
            pending: Vec::new().into_iter(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Prefix,
    Fuzzy,
    References,
    Done,
}

/// Lazy ranked suggestions. Clone before consuming to iterate again.
#[derive(Clone, Debug)]
pub struct Suggestions<'a> {
    catalog: &'a SymbolCatalog,
    context: &'a SuggestContext,
    token: String,
    min_fuzzy_len: usize,
    remaining: usize,
    next_rank: u32,
    stage: Stage,
    pending: std::vec::IntoIter<Suggestion>,
}

impl Suggestions<'_> {
    /// The token being completed.
    pub fn token(&self) -> &str {
        &self.token
    }

    fn fill(&mut self) {
        let batch = match self.stage {
            Stage::Prefix => {
                self.stage = Stage::Fuzzy;
                let mut hits: Vec<&Symbol> = self
                    .catalog
                    .iter()
                    .filter(|s| is_prefix(&self.token, &s.name))
                    .collect();
                hits.sort_by(|a, b| alphabetical(&a.name, &b.name));
                hits.into_iter().map(from_symbol).collect()
            }
            Stage::Fuzzy => {
                self.stage = Stage::References;
                if self.token.chars().count() < self.min_fuzzy_len {
                    Vec::new()
                } else {
                    let mut hits: Vec<(usize, &Symbol)> = self
                        .catalog
                        .iter()
                        .filter(|s| !is_prefix(&self.token, &s.name))
                        .filter_map(|s| subsequence_gap(&self.token, &s.name).map(|gap| (gap, s)))
                        .collect();
                    hits.sort_by(|(ga, a), (gb, b)| ga.cmp(gb).then(alphabetical(&a.name, &b.name)));
                    hits.into_iter().map(|(_, s)| from_symbol(s)).collect()
                }
            }
            Stage::References => {
                self.stage = Stage::Done;
                self.context
                    .nearby
                    .iter()
                    .map(|a| a.a1())
                    .filter(|label| is_prefix(&self.token, label))
                    .map(|label| Suggestion {
                        insert_text: label.clone(),
                        label,
                        kind: SuggestionKind::CellReference,
                        rank: 0,
                    })
                    .collect()
            }
            Stage::Done => Vec::new(),
        };
        self.pending = batch.into_iter();
    }
}

impl Iterator for Suggestions<'_> {
    type Item = Suggestion;

    fn next(&mut self) -> Option<Suggestion> {
        if self.remaining == 0 {
            return None;
        }
        loop {
            if let Some(mut suggestion) = self.pending.next() {
                suggestion.rank = self.next_rank;
                self.next_rank += 1;
                self.remaining -= 1;
                return Some(suggestion);
            }
            if self.stage == Stage::Done {
                return None;
            }
            self.fill();
        }
    }
}

fn from_symbol(symbol: &Symbol) -> Suggestion {
    Suggestion {
        label: symbol.name.clone(),
        insert_text: symbol.insert_text().to_string(),
        kind: symbol.kind.into(),
        rank: 0,
    }
}

fn alphabetical(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_ascii_uppercase()
        .cmp(&b.to_ascii_uppercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use isegrid_model::{CellValue, SheetId};

    fn a(label: &str) -> Address {
        Address::parse_a1(SheetId(0), label).unwrap()
    }

    fn engine() -> SuggestionEngine {
        let mut catalog = SymbolCatalog::new();
        for name in ["SUM", "FOOSUM", "SUMIF", "AVG", "SQRT", "ISUNDEF"] {
            catalog.add(Symbol::new(name, SymbolKind::Function));
        }
        catalog.add(Symbol::new("TRUE", SymbolKind::Keyword));
        SuggestionEngine::new(catalog)
    }

    fn context(draft: &str) -> SuggestContext {
        SuggestContext {
            draft: draft.to_string(),
            caret: draft.chars().count(),
            address: a("C3"),
            nearby: vec![a("C2"), a("B3"), a("S9")],
        }
    }

    fn labels(engine: &SuggestionEngine, ctx: &SuggestContext) -> Vec<String> {
        engine.suggest(ctx).unwrap().map(|s| s.label).collect()
    }

    #[test]
    fn test_prefix_then_fuzzy_then_references() {
        let engine = engine();
        let got = labels(&engine, &context("=s"));
        assert_eq!(
            got,
            vec!["SQRT", "SUM", "SUMIF", "ISUNDEF", "FOOSUM", "S9"]
        );
    }

    #[test]
    fn test_fuzzy_density_orders_matches() {
        let engine = engine();
        let got = labels(&engine, &context("su"));
        assert_eq!(got, vec!["SUM", "SUMIF", "ISUNDEF", "FOOSUM"]);
    }

    #[test]
    fn test_ranks_are_sequential() {
        let engine = engine();
        let ctx = context("su");
        let ranks: Vec<u32> = engine.suggest(&ctx).unwrap().map(|s| s.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_empty_token_offers_references_only_in_formulas() {
        let engine = engine();
        assert_eq!(labels(&engine, &context("=SUM(")), vec!["C2", "B3", "S9"]);
        assert!(labels(&engine, &context("plain ")).is_empty());
    }

    #[test]
    fn test_invalid_caret() {
        let engine = engine();
        let mut ctx = context("=s");
        ctx.caret = 3;
        assert!(matches!(
            engine.suggest(&ctx),
            Err(IseError::InvalidContext { caret: 3, len: 2 })
        ));
    }

    #[test]
    fn test_limit_and_restart() {
        let engine = engine().with_limits(2, 1);
        let ctx = context("s");
        let sequence = engine.suggest(&ctx).unwrap();
        let first: Vec<_> = sequence.clone().collect();
        let again: Vec<_> = sequence.collect();
        assert_eq!(first.len(), 2);
        assert_eq!(first, again);
    }

    #[test]
    fn test_min_fuzzy_len_disables_short_fuzzy() {
        let engine = engine().with_limits(50, 3);
        assert_eq!(labels(&engine, &context("su")), vec!["SUM", "SUMIF"]);
    }

    #[test]
    fn test_capture_reads_grid_neighbours() {
        let mut grid = Grid::new();
        grid.set(a("C1"), CellValue::number("1")).unwrap();
        grid.set(a("A3"), CellValue::number("2")).unwrap();
        grid.set(a("D4"), CellValue::number("3")).unwrap();
        let ctx = SuggestContext::capture("=", 1, a("C3"), &grid, 10);
        assert_eq!(ctx.nearby, vec![a("C1"), a("A3")]);
    }
}
