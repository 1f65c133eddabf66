//! Record layout builder: walks one aggregate's members in declaration order
//! and assigns each a storage unit.

use std::mem;

use tracing::trace;

use crate::{
    bits::{align_down, align_up},
    errors::LayoutError,
    field::{AggregateDeclaration, ArraySpec, FieldDeclaration, FieldKind},
    layout::{
        BitfieldPolicy, FieldLayout, FieldLayoutKind, LaidOutField, LayoutDescriptor,
        validate_pack,
    },
    primitive::BaseType,
};

/// Largest aggregate size in bytes whose bit positions still fit in an
/// `isize`.
const MAX_RECORD_SIZE: usize = isize::MAX as usize / 8;

/// Storage unit still accepting bit-fields (Msvc policy only).
#[derive(Debug, Clone, Copy)]
struct OpenUnit {
    offset: usize,
    byte_size: usize,
    bits_used: usize,
}

#[derive(Debug)]
pub(crate) struct RecordLayoutBuilder<'a> {
    policy: BitfieldPolicy,
    is_union: bool,
    /// Effective pack for the members of this aggregate.
    pack: Option<usize>,
    friendly_record_name: &'a str,

    // Bits consumed so far. Under Msvc an open unit counts as fully consumed.
    data_bits: usize,
    // End of the furthest byte any member reserved
    size: usize,
    alignment: usize,

    open_unit: Option<OpenUnit>,
    /// Alignment a zero-width bit-field forces on the next member (0 = none).
    pending_alignment: usize,

    fields: Vec<LaidOutField>,
}

impl<'a> RecordLayoutBuilder<'a> {
    pub fn generate(
        policy: BitfieldPolicy,
        record: &'a AggregateDeclaration,
        pack: Option<usize>,
    ) -> Result<LayoutDescriptor, LayoutError> {
        let mut builder = RecordLayoutBuilder::new(policy, record, pack);
        builder.layout_fields(record)?;
        Ok(builder.finish_layout())
    }

    fn new(policy: BitfieldPolicy, record: &'a AggregateDeclaration, pack: Option<usize>) -> Self {
        Self {
            policy,
            is_union: record.is_union(),
            pack,
            friendly_record_name: record.display_name(),
            data_bits: 0,
            size: 0,
            alignment: 1,
            open_unit: None,
            pending_alignment: 0,
            fields: Vec::new(),
        }
    }

    fn layout_fields(&mut self, record: &AggregateDeclaration) -> Result<(), LayoutError> {
        for field in &record.fields {
            self.layout_field(field)?;
        }

        Ok(())
    }

    fn layout_field(&mut self, field: &FieldDeclaration) -> Result<(), LayoutError> {
        match &field.kind {
            FieldKind::Plain(base) => self.layout_plain(field, base),
            FieldKind::Bitfield { base, width } => self.layout_bitfield(field, base, *width),
            FieldKind::ZeroWidthBitfield(base) => self.layout_zero_width(field, base),
            FieldKind::NestedAggregate(aggregate) => self.layout_nested(field, aggregate),
            FieldKind::Array(spec) => self.layout_array(field, spec),
        }
    }

    /// Natural alignment capped by the field's own pack, or the aggregate's.
    fn field_alignment(
        &self,
        field: &FieldDeclaration,
        natural: usize,
    ) -> Result<usize, LayoutError> {
        let cap = match field.pack {
            Some(inner) => {
                validate_pack(inner)?;
                if let Some(outer) = self.pack {
                    if inner > outer {
                        return Err(LayoutError::ConflictingPackDirective { outer, inner });
                    }
                }
                Some(inner)
            }
            None => self.pack,
        };

        Ok(cap.map_or(natural, |cap| natural.min(cap)).max(1))
    }

    /// End of `size` bytes placed at `offset`, provided the record stays
    /// addressable.
    fn checked_end(&self, offset: usize, size: usize) -> Result<usize, LayoutError> {
        offset
            .checked_add(size)
            .filter(|&end| end <= MAX_RECORD_SIZE)
            .ok_or_else(|| LayoutError::AggregateTooLarge(self.friendly_record_name.to_string()))
    }

    /// Reserves `size` whole bytes at the next offset aligned to `align`,
    /// closing any open bit-field unit.
    fn place_block(&mut self, size: usize, align: usize) -> Result<usize, LayoutError> {
        self.open_unit = None;

        let placement = align.max(mem::take(&mut self.pending_alignment));
        let offset = if self.is_union {
            0
        } else {
            align_up(self.data_bits.div_ceil(8), placement)
        };
        let end = self.checked_end(offset, size)?;

        if !self.is_union {
            self.data_bits = end * 8;
        }

        self.size = self.size.max(end);
        self.alignment = self.alignment.max(align);

        Ok(offset)
    }

    fn layout_plain(&mut self, field: &FieldDeclaration, base: &BaseType) -> Result<(), LayoutError> {
        base.validate(&field.name)?;

        let align = self.field_alignment(field, base.alignment)?;
        let offset = self.place_block(base.byte_size, align)?;

        if !field.is_anonymous() {
            self.push(
                field.name.clone(),
                FieldLayoutKind::Plain,
                FieldLayout {
                    storage_unit_offset: offset,
                    bit_offset: 0,
                    bit_width: base.bits(),
                    base_byte_size: base.byte_size,
                    signed: base.signed,
                },
                field,
            );
        }

        Ok(())
    }

    fn layout_bitfield(
        &mut self,
        field: &FieldDeclaration,
        base: &BaseType,
        width: usize,
    ) -> Result<(), LayoutError> {
        base.validate(&field.name)?;

        if width == 0 || width > base.bits() {
            return Err(LayoutError::InvalidWidth {
                field: field.name.clone(),
                width,
                capacity: base.bits(),
            });
        }

        let align = self.field_alignment(field, base.alignment)?;
        let named = !field.is_anonymous();

        let (unit_offset, bit_offset) = if self.is_union {
            self.size = self.size.max(base.byte_size);
            (0, 0)
        } else {
            match self.policy {
                BitfieldPolicy::Msvc => self.place_bitfield_msvc(base, width, align)?,
                BitfieldPolicy::SysV => self.place_bitfield_sysv(base, width, align, named)?,
            }
        };

        // Unnamed bit-fields do not affect alignment under SysV
        if named || self.policy == BitfieldPolicy::Msvc {
            self.alignment = self.alignment.max(align);
        }

        if named {
            self.push(
                field.name.clone(),
                FieldLayoutKind::Bitfield,
                FieldLayout {
                    storage_unit_offset: unit_offset,
                    bit_offset,
                    bit_width: width,
                    base_byte_size: base.byte_size,
                    signed: base.signed,
                },
                field,
            );
        } else {
            trace!(
                record = self.friendly_record_name,
                unit_offset, bit_offset, width, "skipped unnamed bit-field"
            );
        }

        Ok(())
    }

    fn place_bitfield_msvc(
        &mut self,
        base: &BaseType,
        width: usize,
        align: usize,
    ) -> Result<(usize, usize), LayoutError> {
        if self.pending_alignment == 0 {
            if let Some(unit) = self.open_unit.as_mut() {
                if unit.byte_size == base.byte_size && unit.bits_used + width <= base.bits() {
                    let bit_offset = unit.bits_used;
                    unit.bits_used += width;
                    return Ok((unit.offset, bit_offset));
                }
            }
        }

        let placement = align.max(mem::take(&mut self.pending_alignment));
        let offset = align_up(self.data_bits.div_ceil(8), placement);
        let end = self.checked_end(offset, base.byte_size)?;

        self.open_unit = Some(OpenUnit {
            offset,
            byte_size: base.byte_size,
            bits_used: width,
        });
        self.data_bits = end * 8;
        self.size = self.size.max(end);

        Ok((offset, 0))
    }

    fn place_bitfield_sysv(
        &mut self,
        base: &BaseType,
        width: usize,
        align: usize,
        named: bool,
    ) -> Result<(usize, usize), LayoutError> {
        let pending = mem::take(&mut self.pending_alignment);
        let mut pos = align_up(self.data_bits, pending * 8);
        let mut unit_offset = align_down(pos / 8, align);

        if pos + width > (unit_offset + base.byte_size) * 8 {
            pos = align_up(pos, align * 8);
            unit_offset = pos / 8;
        }

        let end = self.checked_end(unit_offset, base.byte_size)?;

        self.data_bits = pos + width;
        self.size = self.size.max(self.data_bits.div_ceil(8));

        // The accessor loads the whole unit, so it must fit in the aggregate
        if named {
            self.size = self.size.max(end);
        }

        Ok((unit_offset, pos - unit_offset * 8))
    }

    fn layout_zero_width(
        &mut self,
        field: &FieldDeclaration,
        base: &BaseType,
    ) -> Result<(), LayoutError> {
        base.validate(&field.name)?;

        if self.is_union {
            return Ok(());
        }

        let align = self.field_alignment(field, base.alignment)?;
        self.open_unit = None;
        self.pending_alignment = self.pending_alignment.max(align);

        trace!(
            record = self.friendly_record_name,
            align, "zero-width bit-field resets the storage unit"
        );

        Ok(())
    }

    fn layout_nested(
        &mut self,
        field: &FieldDeclaration,
        aggregate: &AggregateDeclaration,
    ) -> Result<(), LayoutError> {
        let child = self.child_layout(aggregate)?;

        let align = self.field_alignment(field, child.total_alignment())?;
        let offset = self.place_block(child.total_size(), align)?;

        self.hoist(&field.name, &child, offset);

        Ok(())
    }

    fn layout_array(&mut self, field: &FieldDeclaration, spec: &ArraySpec) -> Result<(), LayoutError> {
        // Element paths are built from the array's name
        if field.is_anonymous() {
            return Err(LayoutError::InvalidArrayElement(field.name.clone()));
        }

        let count = match spec.count() {
            Some(count) if count > 0 && !spec.dims.is_empty() => count,
            _ => return Err(LayoutError::InvalidArrayCount(field.name.clone())),
        };

        let element = match spec.element.as_ref() {
            FieldKind::Plain(base) => {
                base.validate(&field.name)?;

                let leaf = LaidOutField {
                    path: String::new(),
                    kind: FieldLayoutKind::Plain,
                    layout: FieldLayout {
                        storage_unit_offset: 0,
                        bit_offset: 0,
                        bit_width: base.bits(),
                        base_byte_size: base.byte_size,
                        signed: base.signed,
                    },
                    annotations: field.annotations,
                };
                LayoutDescriptor::new(base.byte_size, base.alignment, vec![leaf])
            }
            FieldKind::NestedAggregate(aggregate) => self.child_layout(aggregate)?,
            _ => return Err(LayoutError::InvalidArrayElement(field.name.clone())),
        };

        let stride = element.total_size();
        let size = stride
            .checked_mul(count)
            .ok_or_else(|| LayoutError::AggregateTooLarge(self.friendly_record_name.to_string()))?;
        let align = self.field_alignment(field, element.total_alignment())?;
        let offset = self.place_block(size, align)?;

        trace!(
            record = self.friendly_record_name,
            array = %field.name,
            offset, stride, count, "placed array"
        );

        // Elements without leaves contribute no entries
        let leaves = if element.is_empty() { 0 } else { count };
        for index in 0..leaves {
            let prefix = format!("{}{}", field.name, index_suffix(index, &spec.dims));
            self.hoist(&prefix, &element, offset + index * stride);
        }

        Ok(())
    }

    /// Lays out a nested aggregate on its own, inheriting this aggregate's
    /// pack unless it declares one.
    fn child_layout(&self, aggregate: &AggregateDeclaration) -> Result<LayoutDescriptor, LayoutError> {
        let pack = match aggregate.pack {
            Some(own) => Some(validate_pack(own)?),
            None => self.pack,
        };

        RecordLayoutBuilder::generate(self.policy, aggregate, pack)
    }

    /// Copies a child's fields into this record at `offset`. An empty
    /// `prefix` hoists the names unchanged (anonymous members).
    fn hoist(&mut self, prefix: &str, child: &LayoutDescriptor, offset: usize) {
        for entry in child.iter() {
            let path = match (prefix.is_empty(), entry.path.is_empty()) {
                (true, _) => entry.path.clone(),
                (false, true) => prefix.to_string(),
                (false, false) => format!("{prefix}.{}", entry.path),
            };

            self.fields.push(LaidOutField {
                path,
                kind: entry.kind,
                layout: entry.layout.shifted(offset),
                annotations: entry.annotations,
            });
        }
    }

    fn push(
        &mut self,
        path: String,
        kind: FieldLayoutKind,
        layout: FieldLayout,
        field: &FieldDeclaration,
    ) {
        trace!(
            record = self.friendly_record_name,
            path = %path,
            offset = layout.storage_unit_offset,
            bit_offset = layout.bit_offset,
            width = layout.bit_width,
            "placed field"
        );

        self.fields.push(LaidOutField {
            path,
            kind,
            layout,
            annotations: field.annotations,
        });
    }

    fn finish_layout(self) -> LayoutDescriptor {
        let alignment = self.alignment.max(1);
        let data_size = self.size.max(self.data_bits.div_ceil(8));

        // Round size of record up to its alignment
        let total_size = align_up(data_size, alignment);

        if total_size > data_size {
            trace!(
                record = self.friendly_record_name,
                padding = total_size - data_size,
                "tail padding"
            );
        }

        LayoutDescriptor::new(total_size, alignment, self.fields)
    }
}

/// Row-major `[i][j]..` suffix for the `flat`-th element of an array.
fn index_suffix(mut flat: usize, dims: &[usize]) -> String {
    let mut indices = vec![0; dims.len()];
    for (slot, dim) in indices.iter_mut().zip(dims).rev() {
        *slot = flat % dim;
        flat /= dim;
    }

    indices.iter().map(|i| format!("[{i}]")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutOptions, compute_layout, compute_layout_with};

    fn sysv() -> LayoutOptions {
        LayoutOptions::new(BitfieldPolicy::SysV)
    }

    fn at(layout: &LayoutDescriptor, path: &str) -> (usize, usize) {
        let field = layout.field(path).unwrap();
        (field.storage_unit_offset, field.bit_offset)
    }

    #[test]
    fn test_index_suffix() {
        assert_eq!(index_suffix(0, &[5]), "[0]");
        assert_eq!(index_suffix(23, &[2, 3, 4]), "[1][2][3]");
        assert_eq!(index_suffix(6, &[3, 4]), "[1][2]");
    }

    #[test]
    fn test_type_change_closes_unit() {
        let decl = AggregateDeclaration::structure(vec![
            FieldDeclaration::bitfield("a", BaseType::U8, 3),
            FieldDeclaration::bitfield("b", BaseType::U16, 5),
        ]);
        let layout = compute_layout(&decl, None).unwrap();

        assert_eq!(at(&layout, "a"), (0, 0));
        assert_eq!(at(&layout, "b"), (2, 0));
        assert_eq!(layout.total_size(), 4);
        assert_eq!(layout.total_alignment(), 2);
    }

    #[test]
    fn test_zero_width_resets_unit() {
        let decl = AggregateDeclaration::structure(vec![
            FieldDeclaration::bitfield("a", BaseType::U32, 3),
            FieldDeclaration::zero_width(BaseType::U32),
            FieldDeclaration::bitfield("b", BaseType::U32, 4),
        ]);
        let layout = compute_layout(&decl, None).unwrap();

        assert_eq!(at(&layout, "a"), (0, 0));
        assert_eq!(at(&layout, "b"), (4, 0));
        assert_eq!(layout.total_size(), 8);
        assert_eq!(layout.len(), 2);
    }

    #[test]
    fn test_zero_width_realigns_plain_field() {
        let decl = AggregateDeclaration::structure(vec![
            FieldDeclaration::plain("c", BaseType::U8),
            FieldDeclaration::zero_width(BaseType::U32),
            FieldDeclaration::plain("d", BaseType::U8),
        ]);
        let layout = compute_layout(&decl, None).unwrap();

        assert_eq!(at(&layout, "d"), (4, 0));
        // Zero-width members do not raise the aggregate's alignment
        assert_eq!(layout.total_alignment(), 1);
        assert_eq!(layout.total_size(), 5);
    }

    #[test]
    fn test_full_unit_opens_new_one() {
        let decl = AggregateDeclaration::structure(vec![
            FieldDeclaration::bitfield("a", BaseType::U8, 5),
            FieldDeclaration::bitfield("b", BaseType::U8, 4),
        ]);
        let layout = compute_layout(&decl, None).unwrap();

        assert_eq!(at(&layout, "b"), (1, 0));
        assert_eq!(layout.total_size(), 2);
    }

    #[test]
    fn test_plain_field_closes_unit() {
        let decl = AggregateDeclaration::structure(vec![
            FieldDeclaration::bitfield("bit1", BaseType::U32, 1),
            FieldDeclaration::plain("c", BaseType::U8),
            FieldDeclaration::bitfield("bit3", BaseType::U32, 3),
        ]);
        let layout = compute_layout(&decl, None).unwrap();

        assert_eq!(at(&layout, "c"), (4, 0));
        assert_eq!(at(&layout, "bit3"), (8, 0));
        assert_eq!(layout.total_size(), 12);
    }

    #[test]
    fn test_pack_caps_alignment_not_unit_size() {
        let decl = AggregateDeclaration::structure(vec![
            FieldDeclaration::plain("c", BaseType::U8),
            FieldDeclaration::bitfield("x", BaseType::U32, 3),
        ])
        .packed(1);
        let layout = compute_layout(&decl, None).unwrap();

        let x = layout.field("x").unwrap();
        assert_eq!(x.storage_unit_offset, 1);
        assert_eq!(x.base_byte_size, 4);
        assert_eq!(layout.total_size(), 5);
        assert_eq!(layout.total_alignment(), 1);
    }

    #[test]
    fn test_field_pack() {
        let decl = AggregateDeclaration::structure(vec![
            FieldDeclaration::plain("c", BaseType::U8),
            FieldDeclaration::plain("x", BaseType::U32).with_pack(2),
        ]);
        let layout = compute_layout(&decl, None).unwrap();

        assert_eq!(at(&layout, "x"), (2, 0));
        assert_eq!(layout.total_size(), 6);
        assert_eq!(layout.total_alignment(), 2);
    }

    #[test]
    fn test_field_pack_cannot_loosen_aggregate_pack() {
        let decl = AggregateDeclaration::structure(vec![
            FieldDeclaration::plain("x", BaseType::U32).with_pack(4),
        ])
        .packed(2);

        assert_eq!(
            compute_layout(&decl, None).unwrap_err(),
            LayoutError::ConflictingPackDirective { outer: 2, inner: 4 }
        );
    }

    #[test]
    fn test_nested_inherits_pack() {
        let inner = AggregateDeclaration::structure(vec![
            FieldDeclaration::plain("c", BaseType::U8),
            FieldDeclaration::plain("x", BaseType::U32),
        ]);
        let decl = AggregateDeclaration::structure(vec![
            FieldDeclaration::plain("tag", BaseType::U8),
            FieldDeclaration::nested("inner", inner.clone()),
        ])
        .packed(1);
        let layout = compute_layout(&decl, None).unwrap();

        assert_eq!(at(&layout, "inner.c"), (1, 0));
        assert_eq!(at(&layout, "inner.x"), (2, 0));
        assert_eq!(layout.total_size(), 6);

        let own_pack = AggregateDeclaration::structure(vec![
            FieldDeclaration::plain("tag", BaseType::U8),
            FieldDeclaration::nested("inner", inner.packed(4)),
        ])
        .packed(1);
        let layout = compute_layout(&own_pack, None).unwrap();

        assert_eq!(at(&layout, "inner.x"), (5, 0));
        assert_eq!(layout.total_size(), 9);
    }

    #[test]
    fn test_invalid_width() {
        let too_wide = AggregateDeclaration::structure(vec![FieldDeclaration::bitfield(
            "x",
            BaseType::U8,
            9,
        )]);
        assert_eq!(
            compute_layout(&too_wide, None).unwrap_err(),
            LayoutError::InvalidWidth {
                field: "x".to_string(),
                width: 9,
                capacity: 8
            }
        );

        let zero = AggregateDeclaration::structure(vec![FieldDeclaration::bitfield(
            "x",
            BaseType::U8,
            0,
        )]);
        assert!(matches!(
            compute_layout(&zero, None),
            Err(LayoutError::InvalidWidth { width: 0, .. })
        ));
    }

    #[test]
    fn test_invalid_arrays() {
        let of_bitfields = AggregateDeclaration::structure(vec![FieldDeclaration::array(
            "a",
            FieldKind::Bitfield {
                base: BaseType::U8,
                width: 3,
            },
            &[2],
        )]);
        assert_eq!(
            compute_layout(&of_bitfields, None).unwrap_err(),
            LayoutError::InvalidArrayElement("a".to_string())
        );

        let empty = AggregateDeclaration::structure(vec![FieldDeclaration::array(
            "a",
            FieldKind::Plain(BaseType::U8),
            &[2, 0],
        )]);
        assert_eq!(
            compute_layout(&empty, None).unwrap_err(),
            LayoutError::InvalidArrayCount("a".to_string())
        );
    }

    #[test]
    fn test_array_dimensions_overflow() {
        let decl = AggregateDeclaration::structure(vec![FieldDeclaration::array(
            "big",
            FieldKind::Plain(BaseType::U32),
            &[usize::MAX / 2, 4],
        )]);
        assert_eq!(
            compute_layout(&decl, None).unwrap_err(),
            LayoutError::InvalidArrayCount("big".to_string())
        );
    }

    #[test]
    fn test_array_size_overflow() {
        let decl = AggregateDeclaration::structure(vec![FieldDeclaration::array(
            "big",
            FieldKind::Plain(BaseType::U32),
            &[usize::MAX / 2],
        )])
        .named("huge");
        assert_eq!(
            compute_layout(&decl, None).unwrap_err(),
            LayoutError::AggregateTooLarge("huge".to_string())
        );
    }

    #[test]
    fn test_record_past_max_size() {
        let decl = AggregateDeclaration::structure(vec![
            FieldDeclaration::plain("tag", BaseType::U8),
            FieldDeclaration::array("words", FieldKind::Plain(BaseType::U64), &[MAX_RECORD_SIZE / 8]),
        ])
        .named("huge");
        assert_eq!(
            compute_layout(&decl, None).unwrap_err(),
            LayoutError::AggregateTooLarge("huge".to_string())
        );
    }

    #[test]
    fn test_unnamed_array_rejected() {
        let decl = AggregateDeclaration::structure(vec![FieldDeclaration::array(
            "",
            FieldKind::Plain(BaseType::U8),
            &[2],
        )]);
        assert_eq!(
            compute_layout(&decl, None).unwrap_err(),
            LayoutError::InvalidArrayElement(String::new())
        );
    }

    #[test]
    fn test_plain_array_paths() {
        let decl = AggregateDeclaration::structure(vec![
            FieldDeclaration::plain("n", BaseType::U8),
            FieldDeclaration::array("shorts", FieldKind::Plain(BaseType::U16), &[2, 2]),
        ]);
        let layout = compute_layout(&decl, None).unwrap();

        assert_eq!(at(&layout, "shorts[0][0]"), (2, 0));
        assert_eq!(at(&layout, "shorts[1][1]"), (8, 0));
        assert_eq!(layout.total_size(), 10);
    }

    #[test]
    fn test_union_members_overlap() {
        let decl = AggregateDeclaration::union(vec![
            FieldDeclaration::bitfield("x", BaseType::U32, 8),
            FieldDeclaration::array("bytes", FieldKind::Plain(BaseType::U8), &[4]),
            FieldDeclaration::zero_width(BaseType::U64),
            FieldDeclaration::plain("c", BaseType::U8),
        ]);
        let layout = compute_layout(&decl, None).unwrap();

        assert_eq!(at(&layout, "x"), (0, 0));
        assert_eq!(at(&layout, "bytes[3]"), (3, 0));
        assert_eq!(at(&layout, "c"), (0, 0));
        assert_eq!(layout.total_size(), 4);
        assert_eq!(layout.total_alignment(), 4);
    }

    #[test]
    fn test_union_size_rounds_to_alignment() {
        let decl = AggregateDeclaration::union(vec![
            FieldDeclaration::array("text", FieldKind::Plain(BaseType::U8), &[5]),
            FieldDeclaration::plain("word", BaseType::U32),
        ]);
        let layout = compute_layout(&decl, None).unwrap();

        assert_eq!(layout.total_size(), 8);
    }

    #[test]
    fn test_empty_aggregate() {
        let layout = compute_layout(&AggregateDeclaration::structure(vec![]), None).unwrap();
        assert_eq!(layout.total_size(), 0);
        assert_eq!(layout.total_alignment(), 1);
        assert!(layout.is_empty());
    }

    #[test]
    fn test_sysv_shares_units_across_types() {
        let decl = AggregateDeclaration::structure(vec![
            FieldDeclaration::bitfield("a", BaseType::U8, 3),
            FieldDeclaration::bitfield("b", BaseType::U16, 5),
        ]);
        let layout = compute_layout_with(&decl, &sysv()).unwrap();

        assert_eq!(at(&layout, "a"), (0, 0));
        assert_eq!(at(&layout, "b"), (0, 3));
        assert_eq!(layout.total_size(), 2);
    }

    #[test]
    fn test_sysv_mixed_fields() {
        let decl = AggregateDeclaration::structure(vec![
            FieldDeclaration::plain("normal_int", BaseType::I32),
            FieldDeclaration::bitfield("bit1", BaseType::U32, 1),
            FieldDeclaration::bitfield("bit2", BaseType::U32, 2),
            FieldDeclaration::plain("normal_char", BaseType::I8),
            FieldDeclaration::bitfield("bit3", BaseType::U32, 3),
            FieldDeclaration::plain("normal_float", BaseType::F32),
            FieldDeclaration::bitfield("bit4", BaseType::U32, 4),
        ]);
        let layout = compute_layout_with(&decl, &sysv()).unwrap();

        assert_eq!(at(&layout, "bit2"), (4, 1));
        assert_eq!(at(&layout, "normal_char"), (5, 0));
        assert_eq!(at(&layout, "bit3"), (4, 16));
        assert_eq!(at(&layout, "normal_float"), (8, 0));
        assert_eq!(at(&layout, "bit4"), (12, 0));
        assert_eq!(layout.total_size(), 16);
    }

    #[test]
    fn test_sysv_field_never_crosses_unit() {
        let decl = AggregateDeclaration::structure(vec![
            FieldDeclaration::bitfield("tiny", BaseType::U8, 1),
            FieldDeclaration::bitfield("small", BaseType::U8, 3),
            FieldDeclaration::bitfield("medium", BaseType::U16, 5),
            FieldDeclaration::bitfield("large", BaseType::U16, 11),
            FieldDeclaration::bitfield("huge", BaseType::U32, 17),
            FieldDeclaration::bitfield("massive", BaseType::U32, 15),
        ]);
        let layout = compute_layout_with(&decl, &sysv()).unwrap();

        assert_eq!(at(&layout, "medium"), (0, 4));
        assert_eq!(at(&layout, "large"), (2, 0));
        assert_eq!(at(&layout, "huge"), (4, 0));
        assert_eq!(at(&layout, "massive"), (4, 17));
        assert_eq!(layout.total_size(), 8);
    }

    #[test]
    fn test_sysv_zero_width_and_unnamed() {
        let decl = AggregateDeclaration::structure(vec![
            FieldDeclaration::bitfield("a", BaseType::U32, 3),
            FieldDeclaration::zero_width(BaseType::U32),
            FieldDeclaration::bitfield("b", BaseType::U32, 4),
        ]);
        let layout = compute_layout_with(&decl, &sysv()).unwrap();
        assert_eq!(at(&layout, "b"), (4, 0));
        assert_eq!(layout.total_size(), 8);

        let unnamed = AggregateDeclaration::structure(vec![
            FieldDeclaration::plain("c", BaseType::U8),
            FieldDeclaration::padding(BaseType::U32, 4),
        ]);
        let layout = compute_layout_with(&unnamed, &sysv()).unwrap();
        assert_eq!(layout.total_alignment(), 1);
        assert_eq!(layout.total_size(), 2);
    }

    #[test]
    fn test_sysv_packed_moves_to_next_byte() {
        let decl = AggregateDeclaration::structure(vec![
            FieldDeclaration::bitfield("a", BaseType::U16, 15),
            FieldDeclaration::bitfield("b", BaseType::U16, 9),
        ])
        .packed(1);
        let layout = compute_layout_with(&decl, &sysv()).unwrap();

        assert_eq!(at(&layout, "a"), (0, 0));
        assert_eq!(at(&layout, "b"), (1, 7));
        assert_eq!(layout.total_size(), 3);
    }
}
