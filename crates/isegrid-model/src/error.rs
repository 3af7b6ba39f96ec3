//! Error types for the isegrid cell model.

use thiserror::Error;

use crate::model::{Address, Orientation};

/// A value whose shape does not match the declared schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct SchemaError {
    pub reason: String,
}

impl SchemaError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        SchemaError {
            reason: reason.into(),
        }
    }

    /// Prefix the reason with the location it was found at.
    pub(crate) fn within(self, location: impl std::fmt::Display) -> Self {
        SchemaError {
            reason: format!("{}: {}", location, self.reason),
        }
    }
}

/// Errors raised by grid mutations. None of them leave partial state behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Schema violation at {address}: {reason}")]
    SchemaViolation { address: Address, reason: String },

    #[error("{address} belongs to the repetition anchored at {anchor}; edit it through the anchor")]
    OccupiedByRepetition { address: Address, anchor: Address },

    #[error("Resizing {address} would discard {lost} non-empty item(s)")]
    DataLoss { address: Address, lost: usize },

    #[error("Circular reference: {}", format_path(.path))]
    CycleDetected { path: Vec<Address> },

    #[error("Repetition at {anchor} would cover populated cell {address}")]
    SpanCollision { anchor: Address, address: Address },

    #[error("{address} does not hold a repetition")]
    NotARepetition { address: Address },

    #[error("Repetition at {address} is laid out by {found:?}, not {expected:?}")]
    OrientationMismatch {
        address: Address,
        expected: Orientation,
        found: Orientation,
    },
}

fn format_path(path: &[Address]) -> String {
    path.iter()
        .map(|a| a.a1())
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub type Result<T> = std::result::Result<T, GridError>;
