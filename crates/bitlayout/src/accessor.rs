//! Reading and writing fields through raw byte buffers.
//!
//! Every access loads exactly one storage unit, so a write touches only the
//! bytes of that unit and, within it, only the field's own bits. Nothing
//! here synchronizes: concurrent writers to fields sharing a unit must be
//! serialized by the caller.

use std::collections::BTreeMap;

use tracing::trace;

use crate::{
    bits::{self, fits, load_unit, sign_extend, store_unit},
    errors::LayoutError,
    layout::{FieldLayout, LayoutDescriptor},
    primitive::ByteOrder,
    value::Value,
};

/// Reads and writes fields with a fixed byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitAccessor {
    order: ByteOrder,
}

impl BitAccessor {
    pub const fn new(order: ByteOrder) -> Self {
        Self { order }
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    /// Extracts the field's bits, sign-extending signed fields.
    pub fn read(&self, data: &[u8], layout: &FieldLayout) -> Result<Value, LayoutError> {
        check_layout(layout)?;

        let unit = load_unit(
            data,
            layout.storage_unit_offset,
            layout.base_byte_size,
            self.order,
        )?;
        let raw = (unit >> layout.bit_offset) & bits::mask(layout.bit_width);

        trace!(
            offset = layout.storage_unit_offset,
            bit_offset = layout.bit_offset,
            width = layout.bit_width,
            raw,
            "read field"
        );

        if layout.signed {
            Ok(Value::I64(sign_extend(raw, layout.bit_width)))
        } else {
            Ok(Value::U64(raw))
        }
    }

    /// Replaces the field's bits with `value`. The value must fit the field;
    /// mask it first if truncation is wanted. On error the buffer is untouched.
    pub fn write(
        &self,
        data: &mut [u8],
        layout: &FieldLayout,
        value: impl Into<Value>,
    ) -> Result<(), LayoutError> {
        check_layout(layout)?;

        let value = value.into().as_i128();
        if !fits(value, layout.bit_width, layout.signed) {
            return Err(LayoutError::ValueOutOfRange {
                value,
                width: layout.bit_width,
                signed: layout.signed,
            });
        }

        let unit = load_unit(
            data,
            layout.storage_unit_offset,
            layout.base_byte_size,
            self.order,
        )?;

        let field_mask = layout.mask();
        let shifted = ((value as u64) << layout.bit_offset) & field_mask;
        let updated = (unit & !field_mask) | shifted;

        trace!(
            offset = layout.storage_unit_offset,
            bit_offset = layout.bit_offset,
            width = layout.bit_width,
            before = unit,
            after = updated,
            "wrote field"
        );

        store_unit(
            data,
            layout.storage_unit_offset,
            layout.base_byte_size,
            self.order,
            updated,
        )
    }

    pub fn read_path(
        &self,
        data: &[u8],
        descriptor: &LayoutDescriptor,
        path: &str,
    ) -> Result<Value, LayoutError> {
        let layout = lookup(descriptor, path)?;
        self.read(data, layout)
    }

    pub fn write_path(
        &self,
        data: &mut [u8],
        descriptor: &LayoutDescriptor,
        path: &str,
        value: impl Into<Value>,
    ) -> Result<(), LayoutError> {
        let layout = lookup(descriptor, path)?;
        self.write(data, layout, value)
    }

    /// Reads every field of `descriptor`, keyed by path.
    pub fn read_all(
        &self,
        data: &[u8],
        descriptor: &LayoutDescriptor,
    ) -> Result<BTreeMap<String, Value>, LayoutError> {
        let mut map = BTreeMap::new();

        for entry in descriptor.iter() {
            map.insert(entry.path.clone(), self.read(data, &entry.layout)?);
        }

        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::AccessConfigDef> for BitAccessor {
    fn from(value: crate::serde::AccessConfigDef) -> Self {
        BitAccessor::new(value.byte_order.into())
    }
}

/// Reads a field in the machine's native byte order.
pub fn read_field(data: &[u8], layout: &FieldLayout) -> Result<Value, LayoutError> {
    BitAccessor::default().read(data, layout)
}

/// Writes a field in the machine's native byte order.
pub fn write_field(
    data: &mut [u8],
    layout: &FieldLayout,
    value: impl Into<Value>,
) -> Result<(), LayoutError> {
    BitAccessor::default().write(data, layout, value)
}

fn lookup<'d>(descriptor: &'d LayoutDescriptor, path: &str) -> Result<&'d FieldLayout, LayoutError> {
    descriptor
        .field(path)
        .ok_or_else(|| LayoutError::UnknownField(path.to_string()))
}

// Descriptors can be deserialized, so the single-unit invariant is rechecked here.
fn check_layout(layout: &FieldLayout) -> Result<(), LayoutError> {
    let capacity = layout.base_byte_size.saturating_mul(8);
    let end = layout.bit_offset.checked_add(layout.bit_width);

    if layout.bit_width == 0 || end.is_none_or(|end| end > capacity.min(64)) {
        return Err(LayoutError::InvalidWidth {
            field: String::new(),
            width: layout.bit_width,
            capacity,
        });
    }

    Ok(())
}
