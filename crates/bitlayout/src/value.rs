//! Integer values read from and written to bit-fields.

/// A value read from a field: signed fields produce [Value::I64], unsigned
/// fields [Value::U64].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    I64(i64),
    U64(u64),
}

impl Value {
    /// The value as an `i64`, if it fits.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I64(v) => Some(v),
            Value::U64(v) => i64::try_from(v).ok(),
        }
    }

    /// The value as a `u64`, if it is non-negative.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::I64(v) => u64::try_from(v).ok(),
            Value::U64(v) => Some(v),
        }
    }

    /// Lossless widening used for range checks.
    pub fn as_i128(&self) -> i128 {
        match *self {
            Value::I64(v) => v as i128,
            Value::U64(v) => v as i128,
        }
    }
}

macro_rules! impl_value_from {
    ($variant:ident, $wide:ty, $($ty:ty),+) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value as $wide)
                }
            }
        )+
    };
}

impl_value_from!(I64, i64, i8, i16, i32, i64);
impl_value_from!(U64, u64, u8, u16, u32, u64, bool);
