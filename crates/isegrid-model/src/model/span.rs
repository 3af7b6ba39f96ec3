//! Rectangles and derived spans.
//!
//! A composite value is stored once, at its anchor. The addresses it occupies
//! are always recomputed from `(orientation, anchor, length)`; nothing else
//! records them.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::address::{Address, SheetId};
use super::value::{CellValue, Orientation};

/// An inclusive, well-ordered rectangle of addresses on one sheet.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub sheet: SheetId,
    pub top: usize,
    pub left: usize,
    pub bottom: usize,
    pub right: usize,
}

impl Rect {
    pub fn cell(address: Address) -> Rect {
        Rect {
            sheet: address.sheet,
            top: address.row,
            left: address.col,
            bottom: address.row,
            right: address.col,
        }
    }

    /// Rectangle spanned by two corners in any order. The sheet is taken from `a`.
    pub fn from_corners(a: Address, b: Address) -> Rect {
        Rect {
            sheet: a.sheet,
            top: a.row.min(b.row),
            left: a.col.min(b.col),
            bottom: a.row.max(b.row),
            right: a.col.max(b.col),
        }
    }

    /// Parse "A1:C3" (or a single "B2") on `sheet`.
    pub fn parse_a1(sheet: SheetId, text: &str) -> Option<Rect> {
        match text.split_once(':') {
            Some((start, end)) => Some(Rect::from_corners(
                Address::parse_a1(sheet, start)?,
                Address::parse_a1(sheet, end)?,
            )),
            None => Address::parse_a1(sheet, text).map(Rect::cell),
        }
    }

    pub fn top_left(&self) -> Address {
        Address::new(self.sheet, self.top, self.left)
    }

    pub fn bottom_right(&self) -> Address {
        Address::new(self.sheet, self.bottom, self.right)
    }

    pub fn rows(&self) -> usize {
        self.bottom - self.top + 1
    }

    pub fn cols(&self) -> usize {
        self.right - self.left + 1
    }

    pub fn contains(&self, address: &Address) -> bool {
        address.sheet == self.sheet
            && (self.top..=self.bottom).contains(&address.row)
            && (self.left..=self.right).contains(&address.col)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.sheet == other.sheet
            && self.top <= other.bottom
            && other.top <= self.bottom
            && self.left <= other.right
            && other.left <= self.right
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            sheet: self.sheet,
            top: self.top.min(other.top),
            left: self.left.min(other.left),
            bottom: self.bottom.max(other.bottom),
            right: self.right.max(other.right),
        }
    }

    /// Row-major iterator over every address in the rectangle.
    pub fn addresses(self) -> impl Iterator<Item = Address> {
        (self.top..=self.bottom).flat_map(move |row| {
            (self.left..=self.right).map(move |col| Address::new(self.sheet, row, col))
        })
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.top_left();
        let end = self.bottom_right();
        if start == end {
            write!(f, "{}", start.a1())
        } else {
            write!(f, "{}:{}", start.a1(), end.a1())
        }
    }
}

/// Addresses covered by `len` items laid out from `anchor` along `orientation`.
/// A zero length still covers the anchor.
pub fn span(orientation: Orientation, anchor: Address, len: usize) -> Rect {
    let extra = len.max(1) - 1;
    match orientation {
        Orientation::Column => Rect {
            bottom: anchor.row.saturating_add(extra),
            ..Rect::cell(anchor)
        },
        Orientation::Row => Rect {
            right: anchor.col.saturating_add(extra),
            ..Rect::cell(anchor)
        },
    }
}

/// Addresses covered by `value` when stored at `anchor`.
pub fn span_of(anchor: Address, value: &CellValue) -> Rect {
    match value {
        CellValue::Repetition { orientation, items } => span(*orientation, anchor, items.len()),
        _ => Rect::cell(anchor),
    }
}

/// Index of `address` within the span, if it is a member.
pub fn member_index(
    orientation: Orientation,
    anchor: Address,
    len: usize,
    address: &Address,
) -> Option<usize> {
    if !span(orientation, anchor, len).contains(address) {
        return None;
    }
    Some(match orientation {
        Orientation::Column => address.row - anchor.row,
        Orientation::Row => address.col - anchor.col,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const S: SheetId = SheetId(0);

    fn a(row: usize, col: usize) -> Address {
        Address::new(S, row, col)
    }

    #[test]
    fn test_from_corners_is_order_independent() {
        assert_eq!(Rect::from_corners(a(4, 1), a(0, 3)), Rect::from_corners(a(0, 3), a(4, 1)));
        let r = Rect::from_corners(a(4, 1), a(0, 3));
        assert_eq!((r.top, r.left, r.bottom, r.right), (0, 1, 4, 3));
        assert_eq!((r.rows(), r.cols()), (5, 3));
    }

    #[test]
    fn test_intersects_and_contains() {
        let r = Rect::parse_a1(S, "B2:C4").unwrap();
        assert!(r.contains(&a(1, 1)));
        assert!(!r.contains(&a(0, 1)));
        assert!(r.intersects(&Rect::parse_a1(S, "C4:D9").unwrap()));
        assert!(!r.intersects(&Rect::parse_a1(S, "D1:D9").unwrap()));
        assert!(!r.intersects(&Rect { sheet: SheetId(1), ..r }));
    }

    #[test]
    fn test_span_along_each_axis() {
        assert_eq!(span(Orientation::Column, a(0, 0), 3).to_string(), "A1:A3");
        assert_eq!(span(Orientation::Row, a(1, 1), 2).to_string(), "B2:C2");
        assert_eq!(span(Orientation::Row, a(1, 1), 0).to_string(), "B2");
    }

    #[test]
    fn test_member_index() {
        assert_eq!(member_index(Orientation::Column, a(2, 0), 3, &a(4, 0)), Some(2));
        assert_eq!(member_index(Orientation::Column, a(2, 0), 3, &a(5, 0)), None);
        assert_eq!(member_index(Orientation::Row, a(2, 0), 3, &a(2, 0)), Some(0));
    }

    #[test]
    fn test_addresses_row_major() {
        let r = Rect::parse_a1(S, "A1:B2").unwrap();
        let labels: Vec<_> = r.addresses().map(|x| x.a1()).collect();
        assert_eq!(labels, vec!["A1", "B1", "A2", "B2"]);
    }
}
