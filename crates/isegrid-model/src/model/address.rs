//! Cell addresses and A1 notation.
//!
//! Addresses are stored as zero-indexed `(sheet, row, col)` triples. The
//! spreadsheet-style letter columns ("A", "Z", "AA") only exist at the edges,
//! for display and for parsing references typed by the user.
//!
//! # Examples
//!
//! ```ignore
//! let addr = Address::parse_a1(SheetId(0), "B3").unwrap();
//! assert_eq!(addr.col, 1);
//! assert_eq!(addr.row, 2);
//! assert_eq!(addr.a1(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Identifier of a sheet. Sheets are independent address namespaces.
#[derive(
    Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SheetId(pub u32);

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sheet{}", self.0)
    }
}

/// A cell position within a sheet (0-indexed).
///
/// Ordering is row-major within a sheet, which is also the order used when
/// writing documents.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Address {
    pub sheet: SheetId,
    pub row: usize,
    pub col: usize,
}

impl Address {
    pub fn new(sheet: SheetId, row: usize, col: usize) -> Address {
        Address { sheet, row, col }
    }

    /// Move by a signed delta. Returns `None` when either coordinate would
    /// become negative or overflow.
    pub fn offset(&self, d_row: isize, d_col: isize) -> Option<Address> {
        let row = self.row.checked_add_signed(d_row)?;
        let col = self.col.checked_add_signed(d_col)?;
        Some(Address::new(self.sheet, row, col))
    }

    /// Parse a reference in spreadsheet notation (e.g. "A1", "b2", "AA10").
    /// Returns `None` if the input is invalid.
    pub fn parse_a1(sheet: SheetId, name: &str) -> Option<Address> {
        let caps = a1_re().captures(name.trim())?;
        let col = letters_to_col(&caps["letters"])?;
        let row = caps["numbers"].parse::<usize>().ok()?.checked_sub(1)?;
        Some(Address::new(sheet, row, col))
    }

    /// The sheet-less A1 label of this address.
    pub fn a1(&self) -> String {
        format!("{}{}", col_to_letters(self.col), self.row + 1)
    }

    /// Manhattan distance, used to order nearby reference candidates.
    pub fn distance(&self, other: &Address) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", self.sheet, self.a1())
    }
}

fn a1_re() -> &'static Regex {
    static A1_RE: OnceLock<Regex> = OnceLock::new();
    A1_RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]+)(?<numbers>[0-9]+)$")
            .expect("A1 reference regex must compile")
    })
}

/// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
pub fn col_to_letters(col: usize) -> String {
    let mut result = String::new();
    let mut n = col as u128 + 1;
    while n > 0 {
        n -= 1;
        result.insert(0, (b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    result
}

/// Convert spreadsheet-style letters back to a column index.
/// Returns `None` on empty input, non-letters, or overflow.
pub fn letters_to_col(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    let mut acc = 0usize;
    for c in letters.to_ascii_uppercase().bytes() {
        if !c.is_ascii_uppercase() {
            return None;
        }
        let digit = (c - b'A') as usize + 1;
        acc = acc.checked_mul(26)?.checked_add(digit)?;
    }
    acc.checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    const S: SheetId = SheetId(0);

    #[test]
    fn test_parse_single_letter_columns() {
        let a1 = Address::parse_a1(S, "A1").unwrap();
        assert_eq!((a1.row, a1.col), (0, 0));
        let z1 = Address::parse_a1(S, "Z1").unwrap();
        assert_eq!(z1.col, 25);
    }

    #[test]
    fn test_parse_multi_letter_columns_and_case() {
        assert_eq!(Address::parse_a1(S, "AA1").unwrap().col, 26);
        assert_eq!(Address::parse_a1(S, "ba1").unwrap().col, 52);
        assert_eq!(Address::parse_a1(S, "a10").unwrap().row, 9);
    }

    #[test]
    fn test_parse_invalid_inputs() {
        for bad in ["", "123", "ABC", "A0", "1A", "A 1"] {
            assert!(Address::parse_a1(S, bad).is_none(), "{bad}");
        }
    }

    #[test]
    fn test_parse_overflow_returns_none() {
        let huge = format!("{}1", "Z".repeat(40));
        assert!(Address::parse_a1(S, &huge).is_none());
    }

    #[test]
    fn test_letters_round_trip() {
        for col in [0, 1, 25, 26, 51, 52, 701, 702, 18_277] {
            assert_eq!(letters_to_col(&col_to_letters(col)), Some(col));
        }
        assert!(!col_to_letters(usize::MAX).is_empty());
    }

    #[test]
    fn test_offset_clamps_at_zero() {
        let a = Address::new(S, 0, 3);
        assert_eq!(a.offset(-1, 0), None);
        assert_eq!(a.offset(2, -3), Some(Address::new(S, 2, 0)));
    }

    #[test]
    fn test_display_includes_sheet() {
        assert_eq!(Address::new(SheetId(2), 4, 1).to_string(), "sheet2!B5");
    }
}
