//! Circular reference detection for formula cells.
//!
//! Before a value is stored, every formula inside it is followed through the
//! grid. If any chain of references leads back into the span the value is
//! about to occupy, the write is rejected. Depth-first search, with a
//! finished set so shared sub-graphs are walked once.

use std::collections::HashSet;

use super::address::Address;
use super::grid::Grid;
use super::refs::extract_references;
use super::span::span_of;
use super::value::CellValue;

/// Detect a cycle that storing `value` at `anchor` would create.
/// Returns the reference path (starting at `anchor`) if one is found.
pub fn detect_cycle(grid: &Grid, anchor: Address, value: &CellValue) -> Option<Vec<Address>> {
    let target = span_of(anchor, value);
    let mut walk = Walk {
        grid,
        anchor,
        visiting: HashSet::new(),
        finished: HashSet::new(),
        path: vec![anchor],
    };

    for formula in value.formulas() {
        for reference in extract_references(anchor.sheet, formula) {
            if target.contains(&reference) {
                walk.path.push(reference);
                return Some(walk.path);
            }
            if walk.visit(reference, &target) {
                return Some(walk.path);
            }
        }
    }
    None
}

struct Walk<'a> {
    grid: &'a Grid,
    anchor: Address,
    visiting: HashSet<Address>,
    finished: HashSet<Address>,
    path: Vec<Address>,
}

impl Walk<'_> {
    fn visit(&mut self, current: Address, target: &super::span::Rect) -> bool {
        if self.finished.contains(&current) || !self.visiting.insert(current) {
            return false;
        }
        self.path.push(current);

        // The value being replaced at `anchor` must not be followed.
        let deps = match self.grid.resolve_ignoring(&current, self.anchor) {
            Some(value) => value
                .formulas()
                .into_iter()
                .flat_map(|f| extract_references(current.sheet, f))
                .collect::<Vec<_>>(),
            None => Vec::new(),
        };

        for dep in deps {
            if target.contains(&dep) {
                self.path.push(dep);
                return true;
            }
            if self.visit(dep, target) {
                return true;
            }
        }

        self.path.pop();
        self.visiting.remove(&current);
        self.finished.insert(current);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Orientation, SheetId};

    fn a(label: &str) -> Address {
        Address::parse_a1(SheetId(0), label).unwrap()
    }

    #[test]
    fn test_direct_self_reference() {
        let grid = Grid::new();
        let path = detect_cycle(&grid, a("A1"), &CellValue::formula("=A1+1")).unwrap();
        assert_eq!(path, vec![a("A1"), a("A1")]);
    }

    #[test]
    fn test_transitive_cycle() {
        let mut grid = Grid::new();
        grid.set(a("B1"), CellValue::formula("=C1")).unwrap();
        grid.set(a("C1"), CellValue::formula("=A1*2")).unwrap();
        let path = detect_cycle(&grid, a("A1"), &CellValue::formula("=B1")).unwrap();
        assert_eq!(path, vec![a("A1"), a("B1"), a("C1"), a("A1")]);
    }

    #[test]
    fn test_reference_into_own_span() {
        let grid = Grid::new();
        let value = CellValue::repetition(
            Orientation::Column,
            vec![CellValue::number("1"), CellValue::formula("=A1*2")],
        );
        assert!(detect_cycle(&grid, a("A1"), &value).is_some());
    }

    #[test]
    fn test_replaced_value_is_not_followed() {
        let mut grid = Grid::new();
        grid.set(a("A1"), CellValue::formula("=B1")).unwrap();
        grid.set(a("B1"), CellValue::number("3")).unwrap();
        // B1 now points at A1; A1 already points at B1, but A1 is being replaced.
        assert!(detect_cycle(&grid, a("A1"), &CellValue::text("plain")).is_none());
        assert!(detect_cycle(&grid, a("B1"), &CellValue::formula("=A1")).is_some());
    }

    #[test]
    fn test_diamond_without_cycle() {
        let mut grid = Grid::new();
        grid.set(a("B1"), CellValue::formula("=D1")).unwrap();
        grid.set(a("C1"), CellValue::formula("=D1")).unwrap();
        grid.set(a("D1"), CellValue::number("1")).unwrap();
        assert!(detect_cycle(&grid, a("A1"), &CellValue::formula("=B1+C1")).is_none());
    }
}
