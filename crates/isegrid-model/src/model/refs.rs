//! Cell references inside formula text.
//!
//! Formula scalars are stored as text; the grid only needs to know which
//! addresses they point at (for cycle detection and reference suggestions)
//! and how to rewrite them when rows or columns are inserted.
//!
//! Handles:
//! - Simple references: `A1`, `b2`
//! - Ranges: `A1:B5` (expanded cell by cell, up to a size limit)
//! - References inside string literals are ignored

use regex::Regex;
use std::sync::OnceLock;

use super::address::{Address, SheetId};
use super::span::Rect;

const MAX_REFERENCE_RANGE_CELLS: usize = 1_000_000;

/// Structural edit that shifts references.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftOperation {
    InsertRow(usize),
    InsertColumn(usize),
}

/// Extract every address a formula refers to, on `sheet`.
pub fn extract_references(sheet: SheetId, formula: &str) -> Vec<Address> {
    let mut refs = Vec::new();
    let stripped = strip_string_literals(formula);

    for caps in range_re().captures_iter(&stripped) {
        let Some(rect) = Rect::parse_a1(sheet, &caps[0]) else {
            continue;
        };
        let Some(cells) = rect.rows().checked_mul(rect.cols()) else {
            continue;
        };
        if cells > MAX_REFERENCE_RANGE_CELLS {
            continue;
        }
        refs.extend(rect.addresses());
    }

    let without_ranges = range_re().replace_all(&stripped, " ");
    for caps in cell_re().captures_iter(&without_ranges) {
        if let Some(address) = Address::parse_a1(sheet, &caps[0]) {
            refs.push(address);
        }
    }

    refs
}

/// Rewrite references for an inserted row or column.
///
/// Rules:
/// - Insert row at R: refs to row >= R become row + 1
/// - Insert column at C: refs to col >= C become col + 1
pub fn shift_references(formula: &str, op: ShiftOperation) -> String {
    map_outside_strings(formula, |segment| {
        cell_re()
            .replace_all(segment, |caps: &regex::Captures| shift_single_ref(&caps[0], op))
            .to_string()
    })
}

fn shift_single_ref(text: &str, op: ShiftOperation) -> String {
    let Some(address) = Address::parse_a1(SheetId::default(), text) else {
        return text.to_string();
    };
    let shifted = match op {
        ShiftOperation::InsertRow(at) if address.row >= at => address.offset(1, 0),
        ShiftOperation::InsertColumn(at) if address.col >= at => address.offset(0, 1),
        _ => Some(address),
    };
    match shifted {
        Some(a) => a.a1(),
        None => text.to_string(),
    }
}

fn cell_re() -> &'static Regex {
    static CELL_RE: OnceLock<Regex> = OnceLock::new();
    CELL_RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z]+[0-9]+\b").expect("cell reference regex must compile")
    })
}

fn range_re() -> &'static Regex {
    static RANGE_RE: OnceLock<Regex> = OnceLock::new();
    RANGE_RE.get_or_init(|| {
        Regex::new(r"\b[A-Za-z]+[0-9]+:[A-Za-z]+[0-9]+\b").expect("range regex must compile")
    })
}

/// Apply `f` to every segment outside double-quoted string literals.
fn map_outside_strings(script: &str, f: impl Fn(&str) -> String) -> String {
    let bytes = script.as_bytes();
    let mut out = String::with_capacity(script.len());
    let mut seg_start = 0;
    let mut in_string = false;
    let mut backslashes = 0usize;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if b == b'\\' {
                backslashes += 1;
                continue;
            }
            if b == b'"' && backslashes % 2 == 0 {
                out.push_str(&script[seg_start..=i]);
                in_string = false;
                seg_start = i + 1;
            }
            backslashes = 0;
            continue;
        }
        if b == b'"' {
            out.push_str(&f(&script[seg_start..i]));
            in_string = true;
            seg_start = i;
            backslashes = 0;
        }
    }

    if seg_start < script.len() {
        if in_string {
            out.push_str(&script[seg_start..]);
        } else {
            out.push_str(&f(&script[seg_start..]));
        }
    }
    out
}

fn strip_string_literals(script: &str) -> String {
    let mut out = String::with_capacity(script.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in script.chars() {
        if in_string {
            if escaped {
                escaped = false;
                out.push(' ');
                continue;
            }
            if ch == '\\' {
                escaped = true;
                out.push(' ');
                continue;
            }
            if ch == '"' {
                in_string = false;
                out.push('"');
            } else {
                out.push(' ');
            }
        } else if ch == '"' {
            in_string = true;
            out.push('"');
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const S: SheetId = SheetId(0);

    fn labels(refs: Vec<Address>) -> Vec<String> {
        refs.into_iter().map(|a| a.a1()).collect()
    }

    #[test]
    fn test_extract_cells_and_ranges() {
        let refs = extract_references(S, "=SUM(A1:A3)+b5");
        assert_eq!(labels(refs), vec!["A1", "A2", "A3", "B5"]);
    }

    #[test]
    fn test_extract_ignores_string_literals_and_function_names() {
        let refs = extract_references(S, r#"=CONCAT("A1 \"B2\"", C3, SUM)"#);
        assert_eq!(labels(refs), vec!["C3"]);
    }

    #[test]
    fn test_extract_skips_over_limit_ranges() {
        let refs = extract_references(S, "=SUM(A1:A1000001)+B2");
        assert_eq!(labels(refs), vec!["B2"]);
    }

    #[test]
    fn test_shift_rows() {
        let shifted = shift_references("=A1+A2+SUM(B2:B4)", ShiftOperation::InsertRow(1));
        assert_eq!(shifted, "=A1+A3+SUM(B3:B5)");
    }

    #[test]
    fn test_shift_columns_leaves_strings_alone() {
        let shifted = shift_references(r#"=B1&"B1""#, ShiftOperation::InsertColumn(0));
        assert_eq!(shifted, r#"=C1&"B1""#);
    }
}
