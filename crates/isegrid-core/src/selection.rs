//! Selection and cursor movement.
//!
//! A selection is an anchor and a focus on one sheet (the primary rectangle)
//! plus optional disjoint extra rectangles. The focus is the cell text
//! editing applies to. Selections only hold addresses; content stays in the
//! grid.

use std::fmt;

use isegrid_model::{Address, Grid, Rect};
use tracing::debug;

use crate::error::{IseError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    NextInRepetition,
    PrevInRepetition,
}

impl Direction {
    pub fn parse(name: &str) -> Option<Direction> {
        match name.to_ascii_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            "next" => Some(Direction::NextInRepetition),
            "prev" => Some(Direction::PrevInRepetition),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    anchor: Address,
    focus: Address,
    extras: Vec<Rect>,
}

impl Selection {
    /// Single-cell selection at `address`.
    pub fn new(address: Address) -> Self {
        Selection {
            anchor: address,
            focus: address,
            extras: Vec::new(),
        }
    }

    pub fn anchor(&self) -> Address {
        self.anchor
    }

    pub fn focus(&self) -> Address {
        self.focus
    }

    /// The cell eligible for direct text editing.
    pub fn active_address(&self) -> Address {
        self.focus
    }

    /// Rectangle spanned by anchor and focus.
    pub fn primary(&self) -> Rect {
        Rect::from_corners(self.anchor, self.focus)
    }

    /// The primary rectangle followed by the disjoint extras.
    pub fn rects(&self) -> Vec<Rect> {
        std::iter::once(self.primary())
            .chain(self.extras.iter().copied())
            .collect()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.rects().iter().any(|r| r.contains(address))
    }

    pub fn clear_extras(&mut self) {
        self.extras.clear();
    }

    /// Collapse to a single cell at `address`.
    pub fn move_to(&mut self, address: Address) {
        *self = Selection::new(address);
    }

    /// Move the focus one step.
    ///
    /// With `extend` the anchor stays put and the rectangle follows the
    /// focus; otherwise the selection collapses onto the new focus. Moves
    /// past row or column 0 are no-ops, as is an extension that would make
    /// the primary rectangle overlap an extra one.
    ///
    /// The repetition directions step through the repetition the focus sits
    /// in. At either end they wrap around when `contain` is set and stay put
    /// otherwise. Outside a repetition they behave like `Right`/`Left`.
    pub fn move_focus(&mut self, grid: &Grid, direction: Direction, extend: bool, contain: bool) {
        let target = match direction {
            Direction::Up => self.focus.offset(-1, 0),
            Direction::Down => self.focus.offset(1, 0),
            Direction::Left => self.focus.offset(0, -1),
            Direction::Right => self.focus.offset(0, 1),
            Direction::NextInRepetition | Direction::PrevInRepetition => {
                let forward = direction == Direction::NextInRepetition;
                match grid.membership(&self.focus) {
                    Some(m) => {
                        let len = m.len.max(1);
                        let index = match (forward, m.index + 1 >= len, m.index == 0) {
                            (true, false, _) => Some(m.index + 1),
                            (true, true, _) => contain.then_some(0),
                            (false, _, false) => Some(m.index - 1),
                            (false, _, true) => contain.then_some(len - 1),
                        };
                        index.and_then(|i| {
                            let (dr, dc) = m.orientation.step();
                            m.anchor.offset(dr * i as isize, dc * i as isize)
                        })
                    }
                    None if forward => self.focus.offset(0, 1),
                    None => self.focus.offset(0, -1),
                }
            }
        };

        let Some(target) = target else {
            return;
        };
        if extend {
            let grown = Rect::from_corners(self.anchor, target);
            if self.extras.iter().any(|r| r.intersects(&grown)) {
                debug!(focus = %self.focus, %target, "extension would overlap a selected range");
                return;
            }
        }
        self.focus = target;
        if !extend {
            self.anchor = target;
            self.extras.clear();
        }
        debug!(focus = %self.focus, anchor = %self.anchor, ?direction, "moved focus");
    }

    /// Select the rectangle between `a` and `b`, in either order.
    pub fn select_range(&mut self, a: Address, b: Address) -> Result<()> {
        if a.sheet != b.sheet {
            return Err(IseError::SheetMismatch {
                address: b,
                expected: a.sheet,
            });
        }
        self.anchor = a;
        self.focus = b;
        self.extras.clear();
        Ok(())
    }

    /// Add a rectangle to a multi-selection. Rejected, leaving the selection
    /// unchanged, if it intersects any selected rectangle.
    pub fn add_disjoint_range(&mut self, rect: Rect) -> Result<()> {
        if rect.sheet != self.focus.sheet {
            return Err(IseError::SheetMismatch {
                address: rect.top_left(),
                expected: self.focus.sheet,
            });
        }
        if self.rects().iter().any(|r| r.intersects(&rect)) {
            return Err(IseError::Overlap { rect });
        }
        self.extras.push(rect);
        Ok(())
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<String> = self.rects().iter().map(|r| r.to_string()).collect();
        write!(f, "{}", labels.join(","))
    }
}
