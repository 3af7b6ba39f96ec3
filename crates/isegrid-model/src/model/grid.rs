//! Sparse cell storage.
//!
//! The grid maps anchor addresses to values and never stores `Empty`.
//! Composite values live only at their anchor; the addresses a repetition
//! covers are recomputed from the stored value whenever they are needed, so
//! there is no ownership bookkeeping that could drift from the content.
//!
//! Reads take `&self` and are safe from any thread. Writes take `&mut self`,
//! so two writes can never interleave, and each write replaces at most one
//! entry per anchor, so a reader never observes half of a resize.

use dashmap::DashMap;
use std::collections::BTreeSet;
use tracing::debug;

use super::address::{Address, SheetId};
use super::cycle::detect_cycle;
use super::refs::{ShiftOperation, shift_references};
use super::schema::{SchemaRegistry, Shape};
use super::span::{Rect, member_index, span_of};
use super::value::{CellValue, Orientation};
use crate::error::{GridError, Result};

/// Where an address sits inside a repetition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Membership {
    pub anchor: Address,
    pub index: usize,
    pub orientation: Orientation,
    pub len: usize,
}

/// Before/after state of one anchor, as produced by structural edits.
#[derive(Clone, Debug, PartialEq)]
pub struct CellChange {
    pub address: Address,
    pub old: Option<CellValue>,
    pub new: Option<CellValue>,
}

/// Sparse (sheet, row, col) -> value mapping with schema enforcement.
#[derive(Clone, Debug, Default)]
pub struct Grid {
    cells: DashMap<Address, CellValue>,
    schemas: SchemaRegistry,
    /// Lazily computed per-sheet bounds; cleared for a sheet on every write to it.
    bounds: DashMap<SheetId, Option<Rect>>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schemas(schemas: SchemaRegistry) -> Self {
        Grid {
            schemas,
            ..Self::default()
        }
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    /// Replace the schema bindings. Values already stored are not re-checked.
    pub fn set_schemas(&mut self, schemas: SchemaRegistry) {
        self.schemas = schemas;
    }

    /// Value stored at `address`; `Empty` when nothing is anchored there.
    pub fn get(&self, address: &Address) -> CellValue {
        self.cells
            .get(address)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Whether a value is anchored at `address`.
    pub fn contains(&self, address: &Address) -> bool {
        self.cells.contains_key(address)
    }

    /// Number of anchored values across all sheets.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Sheets that hold at least one value.
    pub fn sheets(&self) -> BTreeSet<SheetId> {
        self.cells.iter().map(|entry| entry.key().sheet).collect()
    }

    /// Anchored values of one sheet in row-major order.
    pub fn entries(&self, sheet: SheetId) -> Vec<(Address, CellValue)> {
        let mut out: Vec<_> = self
            .cells
            .iter()
            .filter(|entry| entry.key().sheet == sheet)
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// The repetition covering `address`, if any (including its own anchor).
    pub fn membership(&self, address: &Address) -> Option<Membership> {
        self.cells.iter().find_map(|entry| {
            let anchor = *entry.key();
            if anchor.sheet != address.sheet || anchor.row > address.row || anchor.col > address.col
            {
                return None;
            }
            match entry.value() {
                CellValue::Repetition { orientation, items } => {
                    member_index(*orientation, anchor, items.len(), address).map(|index| {
                        Membership {
                            anchor,
                            index,
                            orientation: *orientation,
                            len: items.len(),
                        }
                    })
                }
                _ => None,
            }
        })
    }

    /// The value displayed at `address`: the item when it is a repetition
    /// member, otherwise whatever is anchored there.
    pub fn resolve(&self, address: &Address) -> CellValue {
        match self.membership(address) {
            Some(m) => self.item_of(&m).unwrap_or_default(),
            None => self.get(address),
        }
    }

    /// Like [`Grid::resolve`], but treats everything anchored at `ignore` as absent.
    pub(crate) fn resolve_ignoring(&self, address: &Address, ignore: Address) -> Option<CellValue> {
        match self.membership(address) {
            Some(m) if m.anchor == ignore => None,
            Some(m) => self.item_of(&m),
            None if *address == ignore => None,
            None => self.cells.get(address).map(|entry| entry.value().clone()),
        }
    }

    fn item_of(&self, membership: &Membership) -> Option<CellValue> {
        match self.cells.get(&membership.anchor)?.value() {
            CellValue::Repetition { items, .. } => items.get(membership.index).cloned(),
            _ => None,
        }
    }

    /// Store `value` at `address`, returning the previous value.
    ///
    /// Fails without touching the grid when the address is a member of a
    /// repetition anchored elsewhere, when the value's span would cover other
    /// populated cells, when it does not fit the bound schema, or when its
    /// formulas would reference back into its own span.
    pub fn set(&mut self, address: Address, value: CellValue) -> Result<Option<CellValue>> {
        self.check_placement(address, &value)?;

        if value.is_empty() {
            let old = self.cells.remove(&address).map(|(_, v)| v);
            if old.is_some() {
                self.invalidate_bounds(address.sheet);
                debug!(%address, "cleared cell");
            }
            return Ok(old);
        }

        self.schemas
            .validate_at(&address, &value)
            .map_err(|e| GridError::SchemaViolation {
                address,
                reason: e.reason,
            })?;

        if let Some(path) = detect_cycle(self, address, &value) {
            return Err(GridError::CycleDetected { path });
        }

        debug!(%address, shape = value.shape_name(), "set cell");
        let old = self.cells.insert(address, value);
        self.invalidate_bounds(address.sheet);
        Ok(old)
    }

    /// Equivalent to `set(address, Empty)`.
    pub fn clear(&mut self, address: Address) -> Result<Option<CellValue>> {
        self.set(address, CellValue::Empty)
    }

    /// Grow or shrink the repetition anchored at `address` to `new_len` items.
    ///
    /// Shrinking that would drop non-empty items fails with `DataLoss` unless
    /// `force` is set. Growing fills with the schema's item default. Returns
    /// the value before the resize.
    pub fn resize(
        &mut self,
        orientation: Orientation,
        address: Address,
        new_len: usize,
        force: bool,
    ) -> Result<CellValue> {
        let Some(current) = self.cells.get(&address).map(|entry| entry.value().clone()) else {
            return Err(match self.membership(&address) {
                Some(m) => GridError::OccupiedByRepetition {
                    address,
                    anchor: m.anchor,
                },
                None => GridError::NotARepetition { address },
            });
        };
        let CellValue::Repetition {
            orientation: found,
            items,
        } = &current
        else {
            return Err(GridError::NotARepetition { address });
        };
        if *found != orientation {
            return Err(GridError::OrientationMismatch {
                address,
                expected: orientation,
                found: *found,
            });
        }

        let mut items = items.clone();
        if new_len < items.len() {
            let lost = items[new_len..].iter().filter(|i| !i.is_empty()).count();
            if lost > 0 && !force {
                return Err(GridError::DataLoss { address, lost });
            }
            items.truncate(new_len);
        } else {
            let fill = match self.schemas.shape_for(&address) {
                Some(Shape::Repetition { item, .. }) => item.default_value(),
                _ => CellValue::Empty,
            };
            items.resize(new_len, fill);
        }

        let resized = CellValue::repetition(orientation, items);
        self.check_placement(address, &resized)?;
        self.schemas
            .validate_at(&address, &resized)
            .map_err(|e| GridError::SchemaViolation {
                address,
                reason: e.reason,
            })?;

        debug!(%address, new_len, force, "resized repetition");
        self.cells.insert(address, resized);
        self.invalidate_bounds(address.sheet);
        Ok(current)
    }

    /// Smallest rectangle containing every occupied address of `sheet`,
    /// including the full span of composite values. `None` for an empty sheet.
    pub fn bounds_of(&self, sheet: SheetId) -> Option<Rect> {
        if let Some(cached) = self.bounds.get(&sheet) {
            return *cached;
        }
        let computed = self
            .cells
            .iter()
            .filter(|entry| entry.key().sheet == sheet)
            .map(|entry| span_of(*entry.key(), entry.value()))
            .reduce(|a, b| a.union(&b));
        self.bounds.insert(sheet, computed);
        computed
    }

    /// Populated anchors in the same row or column as `address`, within
    /// `radius`, nearest first.
    pub fn populated_near(&self, address: &Address, radius: usize) -> Vec<Address> {
        let mut out: Vec<Address> = self
            .cells
            .iter()
            .map(|entry| *entry.key())
            .filter(|a| {
                a.sheet == address.sheet
                    && a != address
                    && ((a.row == address.row && a.col.abs_diff(address.col) <= radius)
                        || (a.col == address.col && a.row.abs_diff(address.row) <= radius))
            })
            .collect();
        out.sort_by_key(|a| (a.distance(address), a.row, a.col));
        out
    }

    /// Write back a previously observed state without validation.
    /// Used when replaying history, where the state was valid when recorded.
    pub fn restore(&mut self, address: Address, state: Option<CellValue>) -> Option<CellValue> {
        self.invalidate_bounds(address.sheet);
        match state {
            Some(value) if !value.is_empty() => self.cells.insert(address, value),
            _ => self.cells.remove(&address).map(|(_, v)| v),
        }
    }

    /// Drop every value on `sheet` and its schema bindings. Returns how many
    /// values were removed.
    pub fn remove_sheet(&mut self, sheet: SheetId) -> usize {
        let before = self.cells.len();
        self.cells.retain(|address, _| address.sheet != sheet);
        self.schemas.unbind_sheet(sheet);
        self.invalidate_bounds(sheet);
        before - self.cells.len()
    }

    /// Shift anchors, spans, formula references and schema bindings for an
    /// inserted row or column.
    ///
    /// A repetition whose span crosses the insertion line along its own axis
    /// gains a default item there instead of being split. Returns the before
    /// and after state of every touched address; nothing is modified if a
    /// grown repetition no longer fits its schema.
    pub fn insert_line(&mut self, sheet: SheetId, op: ShiftOperation) -> Result<Vec<CellChange>> {
        let schemas = self.schemas.shifted(sheet, op);
        let mut plan: Vec<(Address, Address, CellValue)> = Vec::new();

        for (address, value) in self.entries(sheet) {
            let moved = match op {
                ShiftOperation::InsertRow(at) if address.row >= at => address.offset(1, 0),
                ShiftOperation::InsertColumn(at) if address.col >= at => address.offset(0, 1),
                _ => Some(address),
            }
            .unwrap_or(address);

            let mut shifted = value.map_formulas(&|f| shift_references(f, op));
            if let CellValue::Repetition { orientation, items } = &mut shifted {
                let cut = match (*orientation, op) {
                    (Orientation::Column, ShiftOperation::InsertRow(at)) if address.row < at => {
                        Some(at - address.row)
                    }
                    (Orientation::Row, ShiftOperation::InsertColumn(at)) if address.col < at => {
                        Some(at - address.col)
                    }
                    _ => None,
                };
                if let Some(index) = cut.filter(|i| *i < items.len()) {
                    let fill = match schemas.shape_for(&moved) {
                        Some(Shape::Repetition { item, .. }) => item.default_value(),
                        _ => CellValue::Empty,
                    };
                    items.insert(index, fill);
                    schemas
                        .validate_at(&moved, &shifted)
                        .map_err(|e| GridError::SchemaViolation {
                            address: moved,
                            reason: e.reason,
                        })?;
                }
            }

            if moved != address || shifted != value {
                plan.push((address, moved, shifted));
            }
        }

        let mut touched: BTreeSet<Address> = BTreeSet::new();
        for (from, to, _) in &plan {
            touched.insert(*from);
            touched.insert(*to);
        }
        let before: Vec<(Address, Option<CellValue>)> = touched
            .iter()
            .map(|a| (*a, self.cells.get(a).map(|entry| entry.value().clone())))
            .collect();

        for (from, _, _) in &plan {
            self.cells.remove(from);
        }
        for (_, to, value) in plan {
            self.cells.insert(to, value);
        }
        self.schemas = schemas;
        self.invalidate_bounds(sheet);
        debug!(%sheet, ?op, moved = before.len(), "inserted line");

        Ok(before
            .into_iter()
            .map(|(address, old)| CellChange {
                address,
                new: self.cells.get(&address).map(|entry| entry.value().clone()),
                old,
            })
            .filter(|change| change.old != change.new)
            .collect())
    }

    fn check_placement(&self, address: Address, value: &CellValue) -> Result<()> {
        let new_span = span_of(address, value);
        for entry in self.cells.iter() {
            let anchor = *entry.key();
            if anchor == address || anchor.sheet != address.sheet {
                continue;
            }
            let existing = span_of(anchor, entry.value());
            if existing.contains(&address) {
                return Err(GridError::OccupiedByRepetition { address, anchor });
            }
            if existing.intersects(&new_span) {
                let hit = Address::new(
                    address.sheet,
                    existing.top.max(new_span.top),
                    existing.left.max(new_span.left),
                );
                return Err(GridError::SpanCollision {
                    anchor: address,
                    address: hit,
                });
            }
        }
        Ok(())
    }

    fn invalidate_bounds(&self, sheet: SheetId) {
        self.bounds.remove(&sheet);
    }
}
