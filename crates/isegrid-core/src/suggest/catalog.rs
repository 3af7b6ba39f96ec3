//! Symbol catalog: the names the suggestion engine can propose.

/// What a catalog symbol stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Function,
    NamedRange,
    Keyword,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub signature: Option<String>,
    pub description: Option<String>,
    /// Text spliced into the draft on accept; defaults to `name`.
    pub insert_text: Option<String>,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Symbol {
        Symbol {
            name: name.into(),
            kind,
            signature: None,
            description: None,
            insert_text: None,
        }
    }

    pub fn function(name: &str, signature: &str, description: &str) -> Symbol {
        Symbol {
            signature: Some(signature.to_string()),
            description: Some(description.to_string()),
            ..Symbol::new(name, SymbolKind::Function)
        }
    }

    pub fn insert_text(&self) -> &str {
        self.insert_text.as_deref().unwrap_or(&self.name)
    }
}

const BUILTIN_FUNCTIONS: &[(&str, &str, &str)] = &[
    ("ABS", "ABS(x)", "Absolute value"),
    ("AVG", "AVG(range)", "Average of numeric cells"),
    ("CONCAT", "CONCAT(a, b, ...)", "Join values as text"),
    ("COUNT", "COUNT(range)", "Count non-empty cells"),
    ("COUNTIF", "COUNTIF(range, predicate)", "Count cells matching a predicate"),
    ("FIXED", "FIXED(x, digits)", "Format with a fixed number of decimals"),
    ("IF", "IF(cond, then, else)", "Choose between two values"),
    ("LEN", "LEN(text)", "Length of a text value"),
    ("LOOKUP", "LOOKUP(key, keys, values)", "Find a value by key"),
    ("MAX", "MAX(range)", "Largest numeric value"),
    ("MIN", "MIN(range)", "Smallest numeric value"),
    ("MONEY", "MONEY(x)", "Format as currency"),
    ("POW", "POW(base, exp)", "Raise to a power"),
    ("ROUND", "ROUND(x, digits)", "Round to a number of decimals"),
    ("SQRT", "SQRT(x)", "Square root"),
    ("SUM", "SUM(range)", "Sum of numeric cells"),
    ("SUMIF", "SUMIF(range, predicate)", "Sum cells matching a predicate"),
];

const BUILTIN_KEYWORDS: &[&str] = &["FALSE", "TRUE"];

/// Catalog of symbols, looked up case-insensitively.
///
/// Names are unique ignoring case: adding a symbol replaces any entry with
/// the same name.
#[derive(Clone, Debug, Default)]
pub struct SymbolCatalog {
    symbols: Vec<Symbol>,
}

impl SymbolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Common spreadsheet functions plus the boolean keywords.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        for (name, signature, description) in BUILTIN_FUNCTIONS {
            catalog.add(Symbol::function(name, signature, description));
        }
        for name in BUILTIN_KEYWORDS {
            catalog.add(Symbol::new(*name, SymbolKind::Keyword));
        }
        catalog
    }

    pub fn add(&mut self, symbol: Symbol) {
        self.symbols
            .retain(|s| !s.name.eq_ignore_ascii_case(&symbol.name));
        self.symbols.push(symbol);
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_include_functions_and_keywords() {
        let catalog = SymbolCatalog::with_defaults();
        assert_eq!(catalog.get("sum").map(|s| s.kind), Some(SymbolKind::Function));
        assert_eq!(catalog.get("True").map(|s| s.kind), Some(SymbolKind::Keyword));
        assert_eq!(catalog.len(), BUILTIN_FUNCTIONS.len() + BUILTIN_KEYWORDS.len());
    }

    #[test]
    fn test_insert_text_defaults_to_name() {
        let mut symbol = Symbol::new("Total", SymbolKind::NamedRange);
        assert_eq!(symbol.insert_text(), "Total");
        symbol.insert_text = Some("Total!A1:A9".to_string());
        assert_eq!(symbol.insert_text(), "Total!A1:A9");
    }
}
