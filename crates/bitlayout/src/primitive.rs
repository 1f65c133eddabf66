//! Primitive base types that fields and bit-fields are declared on, and the
//! byte order used to interpret storage units.

use crate::errors::LayoutError;

/// Size, alignment and signedness of a scalar type.
///
/// The byte size doubles as the storage-unit size for bit-fields declared
/// on this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaseType {
    pub byte_size: usize,
    pub alignment: usize,
    pub signed: bool,
}

impl BaseType {
    pub const U8: Self = Self::new(1, false);
    pub const U16: Self = Self::new(2, false);
    pub const U32: Self = Self::new(4, false);
    pub const U64: Self = Self::new(8, false);
    pub const I8: Self = Self::new(1, true);
    pub const I16: Self = Self::new(2, true);
    pub const I32: Self = Self::new(4, true);
    pub const I64: Self = Self::new(8, true);
    pub const BOOL: Self = Self::new(1, false);
    /// Raw bits of an IEEE 754 single.
    pub const F32: Self = Self::new(4, false);
    /// Raw bits of an IEEE 754 double.
    pub const F64: Self = Self::new(8, false);

    /// A naturally aligned type of `byte_size` bytes.
    pub const fn new(byte_size: usize, signed: bool) -> Self {
        BaseType {
            byte_size,
            alignment: byte_size,
            signed,
        }
    }

    /// Same type with a different natural alignment (e.g. `i64` on i386).
    pub const fn with_alignment(self, alignment: usize) -> Self {
        BaseType { alignment, ..self }
    }

    /// Capacity in bits.
    pub const fn bits(&self) -> usize {
        self.byte_size * 8
    }

    pub(crate) fn validate(&self, field: &str) -> Result<(), LayoutError> {
        let size_ok = matches!(self.byte_size, 1 | 2 | 4 | 8);
        let align_ok = self.alignment.is_power_of_two();

        if !size_ok || !align_ok {
            return Err(LayoutError::InvalidBaseType {
                field: field.to_string(),
                byte_size: self.byte_size,
            });
        }

        Ok(())
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::BaseTypeDef> for BaseType {
    fn from(value: crate::serde::BaseTypeDef) -> Self {
        use crate::serde::BaseTypeDef;

        match value {
            BaseTypeDef::U8 => BaseType::U8,
            BaseTypeDef::U16 => BaseType::U16,
            BaseTypeDef::U32 => BaseType::U32,
            BaseTypeDef::U64 => BaseType::U64,
            BaseTypeDef::I8 => BaseType::I8,
            BaseTypeDef::I16 => BaseType::I16,
            BaseTypeDef::I32 => BaseType::I32,
            BaseTypeDef::I64 => BaseType::I64,
            BaseTypeDef::Bool => BaseType::BOOL,
            BaseTypeDef::F32 => BaseType::F32,
            BaseTypeDef::F64 => BaseType::F64,
            BaseTypeDef::Custom {
                byte_size,
                alignment,
                signed,
            } => BaseType::new(byte_size, signed).with_alignment(alignment.unwrap_or(byte_size)),
        }
    }
}

/// Byte order used to turn a storage unit's bytes into an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order of the machine this crate was compiled for.
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::native()
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::ByteOrderDef> for ByteOrder {
    fn from(value: crate::serde::ByteOrderDef) -> Self {
        match value {
            crate::serde::ByteOrderDef::Little => ByteOrder::Little,
            crate::serde::ByteOrderDef::Big => ByteOrder::Big,
            crate::serde::ByteOrderDef::Native => ByteOrder::native(),
        }
    }
}
