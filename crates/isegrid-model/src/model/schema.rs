//! Shape schemas for composite cells.
//!
//! A [`Shape`] declares what a cell may hold: which scalar kinds, which variant
//! tags (and the shape of each alternative's payload), and what a repetition's
//! items look like. Schemas are bound to a sheet column or a rectangular
//! region through a [`SchemaRegistry`]; addresses without a binding accept
//! anything.
//!
//! `Empty` is accepted by every shape: absence of content is never a
//! violation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::address::{Address, SheetId};
use super::refs::ShiftOperation;
use super::span::Rect;
use super::value::{CellValue, Orientation, ScalarKind};
use crate::error::SchemaError;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase", deny_unknown_fields)]
pub enum Shape {
    #[default]
    Any,
    Scalar {
        /// Allowed kinds; empty allows every kind.
        #[serde(default)]
        kinds: Vec<ScalarKind>,
    },
    Variant {
        alternatives: BTreeMap<String, Shape>,
    },
    Repetition {
        #[serde(default)]
        orientation: Option<Orientation>,
        item: Box<Shape>,
        #[serde(default)]
        max_len: Option<usize>,
    },
}

impl Shape {
    /// Check `value` against this shape.
    pub fn validate(&self, value: &CellValue) -> Result<(), SchemaError> {
        if value.is_empty() {
            return Ok(());
        }
        match self {
            Shape::Any => Ok(()),
            Shape::Scalar { kinds } => match value {
                CellValue::Scalar { kind, .. } if kinds.is_empty() || kinds.contains(kind) => {
                    Ok(())
                }
                CellValue::Scalar { kind, .. } => Err(SchemaError::new(format!(
                    "scalar kind {:?} not allowed (expected one of {:?})",
                    kind, kinds
                ))),
                other => Err(mismatch("scalar", other)),
            },
            Shape::Variant { alternatives } => match value {
                CellValue::Variant { tag, payload } => {
                    let Some(alt) = alternatives.get(tag) else {
                        return Err(SchemaError::new(format!(
                            "unknown variant tag '{}' (expected one of {})",
                            tag,
                            alternatives.keys().cloned().collect::<Vec<_>>().join(", ")
                        )));
                    };
                    alt.validate(payload)
                        .map_err(|e| e.within(format_args!("variant '{}'", tag)))
                }
                other => Err(mismatch("variant", other)),
            },
            Shape::Repetition {
                orientation,
                item,
                max_len,
            } => match value {
                CellValue::Repetition {
                    orientation: found,
                    items,
                } => {
                    if let Some(expected) = orientation
                        && expected != found
                    {
                        return Err(SchemaError::new(format!(
                            "repetition must be laid out by {:?}, found {:?}",
                            expected, found
                        )));
                    }
                    if let Some(max) = max_len
                        && items.len() > *max
                    {
                        return Err(SchemaError::new(format!(
                            "repetition has {} items, at most {} allowed",
                            items.len(),
                            max
                        )));
                    }
                    for (idx, it) in items.iter().enumerate() {
                        item.validate(it)
                            .map_err(|e| e.within(format_args!("item {}", idx)))?;
                    }
                    Ok(())
                }
                other => Err(mismatch("repetition", other)),
            },
        }
    }

    /// Value used to fill new items when a repetition of this item shape grows.
    pub fn default_value(&self) -> CellValue {
        match self {
            Shape::Repetition { orientation, .. } => {
                CellValue::repetition(orientation.unwrap_or(Orientation::Column), Vec::new())
            }
            _ => CellValue::Empty,
        }
    }

    /// Build a variant, failing if the tag or payload do not fit this shape.
    pub fn build_variant(
        &self,
        tag: impl Into<String>,
        payload: CellValue,
    ) -> Result<CellValue, SchemaError> {
        let value = CellValue::variant(tag, payload);
        self.validate(&value)?;
        Ok(value)
    }

    /// Build a repetition, failing if the layout or any item does not fit this shape.
    pub fn build_repetition(
        &self,
        orientation: Orientation,
        items: Vec<CellValue>,
    ) -> Result<CellValue, SchemaError> {
        let value = CellValue::repetition(orientation, items);
        self.validate(&value)?;
        Ok(value)
    }
}

fn mismatch(expected: &str, found: &CellValue) -> SchemaError {
    SchemaError::new(format!("expected {}, found {}", expected, found.shape_name()))
}

/// What a schema binding applies to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingTarget {
    Column { sheet: SheetId, col: usize },
    Region(Rect),
}

/// Schemas bound to columns and regions.
///
/// Lookup order: the most recently bound region containing the address, then
/// the column binding.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    bindings: Vec<(BindingTarget, Shape)>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `shape` to a whole column, replacing any previous column binding.
    pub fn bind_column(&mut self, sheet: SheetId, col: usize, shape: Shape) {
        let target = BindingTarget::Column { sheet, col };
        self.bindings.retain(|(t, _)| *t != target);
        self.bindings.push((target, shape));
    }

    pub fn bind_region(&mut self, rect: Rect, shape: Shape) {
        self.bindings.push((BindingTarget::Region(rect), shape));
    }

    /// Drop every binding that refers to `sheet`.
    pub fn unbind_sheet(&mut self, sheet: SheetId) {
        self.bindings.retain(|(t, _)| match t {
            BindingTarget::Column { sheet: s, .. } => *s != sheet,
            BindingTarget::Region(r) => r.sheet != sheet,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn shape_for(&self, address: &Address) -> Option<&Shape> {
        let region = self.bindings.iter().rev().find_map(|(t, shape)| match t {
            BindingTarget::Region(r) if r.contains(address) => Some(shape),
            _ => None,
        });
        region.or_else(|| {
            self.bindings.iter().find_map(|(t, shape)| match t {
                BindingTarget::Column { sheet, col }
                    if *sheet == address.sheet && *col == address.col =>
                {
                    Some(shape)
                }
                _ => None,
            })
        })
    }

    /// Copy with the bindings on `sheet` moved for an inserted row or column.
    /// Regions straddling the insertion line grow by one.
    pub fn shifted(&self, sheet: SheetId, op: ShiftOperation) -> SchemaRegistry {
        let bindings = self
            .bindings
            .iter()
            .map(|(target, shape)| {
                let target = match (target, op) {
                    (BindingTarget::Column { sheet: s, col }, ShiftOperation::InsertColumn(at))
                        if *s == sheet && *col >= at =>
                    {
                        BindingTarget::Column {
                            sheet: *s,
                            col: col + 1,
                        }
                    }
                    (BindingTarget::Region(r), _) if r.sheet == sheet => {
                        BindingTarget::Region(shift_rect(*r, op))
                    }
                    (other, _) => other.clone(),
                };
                (target, shape.clone())
            })
            .collect();
        SchemaRegistry { bindings }
    }

    /// Validate `value` against the shape bound at `address`, if any.
    pub fn validate_at(&self, address: &Address, value: &CellValue) -> Result<(), SchemaError> {
        match self.shape_for(address) {
            Some(shape) => shape.validate(value),
            None => Ok(()),
        }
    }
}

fn shift_rect(mut r: Rect, op: ShiftOperation) -> Rect {
    match op {
        ShiftOperation::InsertRow(at) => {
            if r.top >= at {
                r.top += 1;
            }
            if r.bottom >= at {
                r.bottom += 1;
            }
        }
        ShiftOperation::InsertColumn(at) => {
            if r.left >= at {
                r.left += 1;
            }
            if r.right >= at {
                r.right += 1;
            }
        }
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_shape() -> Shape {
        let mut alternatives = BTreeMap::new();
        alternatives.insert(
            "done".to_string(),
            Shape::Scalar {
                kinds: vec![ScalarKind::RawText],
            },
        );
        alternatives.insert(
            "todo".to_string(),
            Shape::Scalar {
                kinds: vec![ScalarKind::RawText, ScalarKind::Number],
            },
        );
        Shape::Repetition {
            orientation: Some(Orientation::Column),
            item: Box::new(Shape::Variant { alternatives }),
            max_len: Some(3),
        }
    }

    #[test]
    fn test_valid_nested_value() {
        let value = CellValue::repetition(
            Orientation::Column,
            vec![
                CellValue::variant("done", CellValue::text("write docs")),
                CellValue::Empty,
                CellValue::variant("todo", CellValue::number("3")),
            ],
        );
        assert!(task_shape().validate(&value).is_ok());
    }

    #[test]
    fn test_unknown_tag_reports_item_index() {
        let value = CellValue::repetition(
            Orientation::Column,
            vec![CellValue::variant("maybe", CellValue::text("x"))],
        );
        let err = task_shape().validate(&value).unwrap_err();
        assert!(err.reason.starts_with("item 0: unknown variant tag 'maybe'"), "{}", err);
    }

    #[test]
    fn test_orientation_and_length_limits() {
        let wrong_axis = CellValue::repetition(Orientation::Row, vec![]);
        assert!(task_shape().validate(&wrong_axis).is_err());
        let too_long = CellValue::repetition(Orientation::Column, vec![CellValue::Empty; 4]);
        assert!(task_shape().validate(&too_long).is_err());
    }

    #[test]
    fn test_build_variant_rejects_bad_payload() {
        let Shape::Repetition { item, .. } = task_shape() else {
            unreachable!()
        };
        assert!(item.build_variant("done", CellValue::formula("=1")).is_err());
        assert!(item.build_variant("done", CellValue::text("ok")).is_ok());
    }

    #[test]
    fn test_registry_prefers_latest_region_over_column() {
        let sheet = SheetId(0);
        let mut reg = SchemaRegistry::new();
        reg.bind_column(sheet, 1, Shape::Scalar { kinds: vec![] });
        reg.bind_region(Rect::parse_a1(sheet, "A1:C3").unwrap(), task_shape());

        let inside = Address::parse_a1(sheet, "B2").unwrap();
        let below = Address::parse_a1(sheet, "B9").unwrap();
        assert_eq!(reg.shape_for(&inside), Some(&task_shape()));
        assert_eq!(reg.shape_for(&below), Some(&Shape::Scalar { kinds: vec![] }));
        assert_eq!(reg.shape_for(&Address::new(SheetId(1), 1, 1)), None);

        reg.unbind_sheet(sheet);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_shifted_moves_columns_and_grows_regions() {
        let sheet = SheetId(0);
        let mut reg = SchemaRegistry::new();
        reg.bind_column(sheet, 2, Shape::Any);
        reg.bind_region(Rect::parse_a1(sheet, "A2:B4").unwrap(), task_shape());

        let cols = reg.shifted(sheet, ShiftOperation::InsertColumn(1));
        assert!(cols.shape_for(&Address::parse_a1(sheet, "D9").unwrap()).is_some());
        assert!(cols.shape_for(&Address::parse_a1(sheet, "C3").unwrap()).is_some());

        let rows = reg.shifted(sheet, ShiftOperation::InsertRow(0));
        assert!(rows.shape_for(&Address::parse_a1(sheet, "A2").unwrap()).is_none());
        assert_eq!(
            rows.shape_for(&Address::parse_a1(sheet, "A5").unwrap()),
            Some(&task_shape())
        );
    }

    #[test]
    fn test_shape_deserializes_from_tagged_form() {
        let json = r#"{"shape":"repetition","orientation":"row","item":{"shape":"scalar","kinds":["number"]}}"#;
        let shape: Shape = serde_json::from_str(json).unwrap();
        assert!(matches!(shape, Shape::Repetition { orientation: Some(Orientation::Row), .. }));
    }
}
