//! Low-level mask, sign and storage-unit utilities over byte slices.
//!
//! Bits are addressed LSB-first within a storage unit: bit 0 is the least
//! significant bit of the unit once it has been loaded as an integer.

use crate::{errors::LayoutError, primitive::ByteOrder};

/// Mask covering the low `width` bits (`width` up to 64).
pub fn mask(width: usize) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Sign-extends the low `bits` of `value` to a full `i64`.
pub fn sign_extend(value: u64, bits: usize) -> i64 {
    if bits == 0 {
        return 0;
    }

    let shift = 64 - bits.min(64);
    ((value << shift) as i64) >> shift
}

/// Whether `value` is representable in `width` bits of the given signedness.
pub fn fits(value: i128, width: usize, signed: bool) -> bool {
    if width == 0 {
        return value == 0;
    }

    if signed {
        let half = 1i128 << (width - 1);
        (-half..half).contains(&value)
    } else {
        (0..(1i128 << width)).contains(&value)
    }
}

/// Rounds `value` up to a multiple of `align` (`align` of 0 or 1 is a no-op).
pub fn align_up(value: usize, align: usize) -> usize {
    if align <= 1 {
        return value;
    }

    value.div_ceil(align) * align
}

/// Rounds `value` down to a multiple of `align`.
pub fn align_down(value: usize, align: usize) -> usize {
    if align <= 1 {
        return value;
    }

    value - value % align
}

fn unit_range(data_len: usize, offset: usize, len: usize) -> Result<(), LayoutError> {
    if len > 8
        || offset
            .checked_add(len)
            .map_or(true, |end| end > data_len)
    {
        return Err(LayoutError::OutOfBounds {
            offset,
            len,
            buffer_len: data_len,
        });
    }

    Ok(())
}

/// Loads `len` bytes at `offset` as an unsigned integer in `order`.
pub fn load_unit(
    data: &[u8],
    offset: usize,
    len: usize,
    order: ByteOrder,
) -> Result<u64, LayoutError> {
    unit_range(data.len(), offset, len)?;

    let bytes = &data[offset..offset + len];
    let value = match order {
        ByteOrder::Little => bytes
            .iter()
            .rev()
            .fold(0u64, |acc, &b| (acc << 8) | b as u64),
        ByteOrder::Big => bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64),
    };

    Ok(value)
}

/// Stores the low `len` bytes of `value` at `offset` in `order`.
pub fn store_unit(
    data: &mut [u8],
    offset: usize,
    len: usize,
    order: ByteOrder,
    value: u64,
) -> Result<(), LayoutError> {
    unit_range(data.len(), offset, len)?;

    let bytes = &mut data[offset..offset + len];
    for (i, byte) in bytes.iter_mut().enumerate() {
        let shift = match order {
            ByteOrder::Little => i * 8,
            ByteOrder::Big => (len - 1 - i) * 8,
        };
        *byte = (value >> shift) as u8;
    }

    Ok(())
}
