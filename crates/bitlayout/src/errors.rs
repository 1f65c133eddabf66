//! Error types for layout computation and bit-field access.

use std::fmt;

/// Errors produced by [crate::layout::compute_layout] and by the
/// [crate::accessor::BitAccessor] read/write operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Bit-field width is zero (for a non zero-width declaration) or larger
    /// than the capacity of its base type.
    InvalidWidth {
        field: String,
        width: usize,
        capacity: usize,
    },
    /// Base type byte size is not one of 1, 2, 4 or 8, or its alignment is
    /// not a power of two.
    InvalidBaseType { field: String, byte_size: usize },
    /// Two pack directives apply at the same level and disagree, or a
    /// field-level pack tries to loosen the enclosing pack.
    ConflictingPackDirective { outer: usize, inner: usize },
    /// Pack value is not a power of two between 1 and 16.
    InvalidPackValue(usize),
    /// Array element is a bit-field or another array, or the array itself
    /// is unnamed.
    InvalidArrayElement(String),
    /// Array has no dimensions, a zero-sized dimension, or more elements
    /// than `usize` can count.
    InvalidArrayCount(String),
    /// Aggregate would extend past the largest addressable object size.
    AggregateTooLarge(String),
    /// Storage unit extends past the end of the supplied buffer.
    OutOfBounds {
        offset: usize,
        len: usize,
        buffer_len: usize,
    },
    /// Value cannot be represented in the field's width and signedness.
    ValueOutOfRange {
        value: i128,
        width: usize,
        signed: bool,
    },
    /// No field with this path exists in the descriptor.
    UnknownField(String),
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::InvalidWidth {
                field,
                width,
                capacity,
            } => write!(
                f,
                "invalid width {width} for bit-field '{field}' (capacity {capacity} bits)"
            ),
            LayoutError::InvalidBaseType { field, byte_size } => {
                write!(f, "invalid base type of {byte_size} bytes for field '{field}'")
            }
            LayoutError::ConflictingPackDirective { outer, inner } => {
                write!(f, "pack({inner}) conflicts with enclosing pack({outer})")
            }
            LayoutError::InvalidPackValue(value) => write!(f, "invalid pack value {value}"),
            LayoutError::InvalidArrayElement(field) => {
                write!(f, "array '{field}' has an element type that cannot be repeated")
            }
            LayoutError::InvalidArrayCount(field) => {
                write!(f, "array '{field}' has an empty or oversized dimension")
            }
            LayoutError::AggregateTooLarge(record) => {
                write!(f, "aggregate '{record}' exceeds the maximum object size")
            }
            LayoutError::OutOfBounds {
                offset,
                len,
                buffer_len,
            } => write!(
                f,
                "storage unit {offset}..{} is outside a buffer of {buffer_len} bytes",
                offset + len
            ),
            LayoutError::ValueOutOfRange {
                value,
                width,
                signed,
            } => {
                let domain = if *signed { "signed" } else { "unsigned" };
                write!(f, "value {value} does not fit in a {width}-bit {domain} field")
            }
            LayoutError::UnknownField(path) => write!(f, "unknown field '{path}'"),
        }
    }
}

impl std::error::Error for LayoutError {}
