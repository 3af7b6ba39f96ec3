//! Cell values.
//!
//! A [`CellValue`] is an owned tree: scalars at the leaves, [`CellValue::Variant`]
//! and [`CellValue::Repetition`] as interior nodes. There are no back-pointers,
//! so a value can never contain itself.

use serde::{Deserialize, Serialize};

/// How the text of a scalar is interpreted.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalarKind {
    RawText,
    Number,
    Formula,
}

/// Layout direction of a repetition: `Column` runs down, `Row` runs right.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Row,
    Column,
}

impl Orientation {
    /// Unit step `(d_row, d_col)` along this orientation.
    pub fn step(self) -> (isize, isize) {
        match self {
            Orientation::Row => (0, 1),
            Orientation::Column => (1, 0),
        }
    }
}

/// The content of one grid address.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CellValue {
    #[default]
    Empty,
    Scalar {
        text: String,
        kind: ScalarKind,
    },
    /// Exactly one active alternative, named by `tag`.
    Variant {
        tag: String,
        payload: Box<CellValue>,
    },
    /// Ordered items laid out contiguously along `orientation`.
    Repetition {
        orientation: Orientation,
        items: Vec<CellValue>,
    },
}

/// One step of a path from a cell's root value down to a nested value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathStep {
    Item(usize),
    Payload,
}

impl CellValue {
    pub fn scalar(text: impl Into<String>, kind: ScalarKind) -> CellValue {
        CellValue::Scalar {
            text: text.into(),
            kind,
        }
    }

    pub fn text(text: impl Into<String>) -> CellValue {
        CellValue::scalar(text, ScalarKind::RawText)
    }

    pub fn number(text: impl Into<String>) -> CellValue {
        CellValue::scalar(text, ScalarKind::Number)
    }

    pub fn formula(text: impl Into<String>) -> CellValue {
        CellValue::scalar(text, ScalarKind::Formula)
    }

    pub fn variant(tag: impl Into<String>, payload: CellValue) -> CellValue {
        CellValue::Variant {
            tag: tag.into(),
            payload: Box::new(payload),
        }
    }

    pub fn repetition(orientation: Orientation, items: Vec<CellValue>) -> CellValue {
        CellValue::Repetition { orientation, items }
    }

    /// Parse user input into a scalar.
    /// - Empty string or whitespace -> Empty
    /// - Starts with '=' or `formula_hint` is set -> Formula (text kept verbatim)
    /// - Valid number -> Number
    /// - Otherwise -> RawText
    pub fn from_input(input: &str, formula_hint: bool) -> CellValue {
        if input.trim().is_empty() {
            return CellValue::Empty;
        }
        if input.starts_with('=') || formula_hint {
            return CellValue::formula(input);
        }
        if input.trim().parse::<f64>().is_ok() {
            return CellValue::number(input.trim());
        }
        CellValue::text(input)
    }

    /// Text shown in the editor when this value is activated. Composite
    /// values have no direct text form.
    pub fn to_input_string(&self) -> String {
        match self {
            CellValue::Scalar { text, .. } => text.clone(),
            _ => String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            CellValue::Variant { .. } | CellValue::Repetition { .. }
        )
    }

    /// Short name of the shape, for messages.
    pub fn shape_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::Scalar { .. } => "scalar",
            CellValue::Variant { .. } => "variant",
            CellValue::Repetition { .. } => "repetition",
        }
    }

    /// Number of addresses this value occupies along its axis.
    /// Anything but a repetition occupies exactly its own address; an empty
    /// repetition still owns its anchor.
    pub fn span_len(&self) -> usize {
        match self {
            CellValue::Repetition { items, .. } => items.len().max(1),
            _ => 1,
        }
    }

    /// Nesting depth (a scalar or empty value has depth 0).
    pub fn depth(&self) -> usize {
        match self {
            CellValue::Empty | CellValue::Scalar { .. } => 0,
            CellValue::Variant { payload, .. } => 1 + payload.depth(),
            CellValue::Repetition { items, .. } => {
                1 + items.iter().map(CellValue::depth).max().unwrap_or(0)
            }
        }
    }

    /// All formula texts in this tree, depth-first.
    pub fn formulas(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_formulas(&mut out);
        out
    }

    fn collect_formulas<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            CellValue::Scalar {
                text,
                kind: ScalarKind::Formula,
            } => out.push(text),
            CellValue::Variant { payload, .. } => payload.collect_formulas(out),
            CellValue::Repetition { items, .. } => {
                for item in items {
                    item.collect_formulas(out);
                }
            }
            _ => {}
        }
    }

    /// Copy of this tree with every formula text passed through `f`.
    pub fn map_formulas(&self, f: &impl Fn(&str) -> String) -> CellValue {
        match self {
            CellValue::Scalar {
                text,
                kind: ScalarKind::Formula,
            } => CellValue::formula(f(text)),
            CellValue::Variant { tag, payload } => {
                CellValue::variant(tag.clone(), payload.map_formulas(f))
            }
            CellValue::Repetition { orientation, items } => CellValue::repetition(
                *orientation,
                items.iter().map(|item| item.map_formulas(f)).collect(),
            ),
            other => other.clone(),
        }
    }

    /// Follow `path` down the tree.
    pub fn at_path(&self, path: &[PathStep]) -> Option<&CellValue> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };
        match (self, first) {
            (CellValue::Repetition { items, .. }, PathStep::Item(i)) => items.get(*i)?.at_path(rest),
            (CellValue::Variant { payload, .. }, PathStep::Payload) => payload.at_path(rest),
            _ => None,
        }
    }

    /// Return a copy of this tree with the node at `path` replaced.
    pub fn replaced_at(&self, path: &[PathStep], replacement: CellValue) -> Option<CellValue> {
        let Some((first, rest)) = path.split_first() else {
            return Some(replacement);
        };
        match (self, first) {
            (CellValue::Repetition { orientation, items }, PathStep::Item(i)) => {
                let new_item = items.get(*i)?.replaced_at(rest, replacement)?;
                let mut items = items.clone();
                items[*i] = new_item;
                Some(CellValue::repetition(*orientation, items))
            }
            (CellValue::Variant { tag, payload }, PathStep::Payload) => {
                Some(CellValue::variant(tag.clone(), payload.replaced_at(rest, replacement)?))
            }
            _ => None,
        }
    }

    /// Convert to a plain value tree.
    pub fn to_tree(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// Rebuild from a plain value tree produced by [`CellValue::to_tree`].
    pub fn from_tree(tree: serde_json::Value) -> serde_json::Result<CellValue> {
        serde_json::from_value(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> CellValue {
        CellValue::repetition(
            Orientation::Column,
            vec![
                CellValue::variant("num", CellValue::number("1")),
                CellValue::variant(
                    "list",
                    CellValue::repetition(Orientation::Row, vec![CellValue::formula("=A1")]),
                ),
                CellValue::Empty,
            ],
        )
    }

    #[test]
    fn test_from_input_classifies() {
        assert_eq!(CellValue::from_input("   ", false), CellValue::Empty);
        assert_eq!(CellValue::from_input("=A2", false), CellValue::formula("=A2"));
        assert_eq!(CellValue::from_input("SUM", true), CellValue::formula("SUM"));
        assert_eq!(CellValue::from_input(" 4.5 ", false), CellValue::number("4.5"));
        assert_eq!(CellValue::from_input("hello", false), CellValue::text("hello"));
    }

    #[test]
    fn test_structural_equality_is_deep() {
        assert_eq!(nested(), nested());
        let other = nested().replaced_at(&[PathStep::Item(2)], CellValue::text("x"));
        assert_ne!(Some(nested()), other);
    }

    #[test]
    fn test_tree_round_trip_keeps_tags_and_orientation() {
        let tree = nested().to_tree().unwrap();
        assert_eq!(tree["orientation"], "column");
        assert_eq!(tree["items"][1]["tag"], "list");
        assert_eq!(CellValue::from_tree(tree).unwrap(), nested());
    }

    #[test]
    fn test_path_navigation() {
        let v = nested();
        let leaf = v
            .at_path(&[PathStep::Item(1), PathStep::Payload, PathStep::Item(0)])
            .unwrap();
        assert_eq!(leaf, &CellValue::formula("=A1"));
        assert!(v.at_path(&[PathStep::Payload]).is_none());
        assert!(v.at_path(&[PathStep::Item(9)]).is_none());
    }

    #[test]
    fn test_replaced_at_rebuilds_only_the_path() {
        let v = nested();
        let new = v
            .replaced_at(&[PathStep::Item(0), PathStep::Payload], CellValue::number("2"))
            .unwrap();
        assert_eq!(
            new.at_path(&[PathStep::Item(0)]).unwrap(),
            &CellValue::variant("num", CellValue::number("2"))
        );
        assert_eq!(new.at_path(&[PathStep::Item(1)]), v.at_path(&[PathStep::Item(1)]));
    }

    #[test]
    fn test_formulas_and_depth() {
        assert_eq!(nested().formulas(), vec!["=A1"]);
        assert_eq!(nested().depth(), 3);
        assert_eq!(nested().span_len(), 3);
        assert_eq!(CellValue::repetition(Orientation::Row, vec![]).span_len(), 1);
    }
}
