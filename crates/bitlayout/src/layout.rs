//! Layout descriptors: the output of the layout calculator, and the entry
//! points that produce and introspect them.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::{
    bits,
    builder::RecordLayoutBuilder,
    errors::LayoutError,
    field::{AggregateDeclaration, Annotations},
};

/// Physical location of one field.
///
/// A field always lives inside a single storage unit of `base_byte_size`
/// bytes starting at `storage_unit_offset`; `bit_offset` counts from the
/// least significant bit of that unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldLayout {
    pub storage_unit_offset: usize,
    pub bit_offset: usize,
    pub bit_width: usize,
    pub base_byte_size: usize,
    pub signed: bool,
}

impl FieldLayout {
    /// Size of the storage unit in bits.
    pub fn unit_bits(&self) -> usize {
        self.base_byte_size.saturating_mul(8)
    }

    /// Mask of the field's bits within the loaded storage unit; empty when
    /// `bit_offset` lies outside a 64-bit unit.
    pub fn mask(&self) -> u64 {
        u32::try_from(self.bit_offset)
            .ok()
            .and_then(|shift| bits::mask(self.bit_width).checked_shl(shift))
            .unwrap_or(0)
    }

    /// Bit offset from the start of the aggregate (`DW_AT_data_bit_offset`),
    /// or `None` if it does not fit in a `usize`.
    pub fn data_bit_offset(&self) -> Option<usize> {
        self.storage_unit_offset
            .checked_mul(8)?
            .checked_add(self.bit_offset)
    }

    /// Offset of the field's most significant bit counted from the most
    /// significant bit of the storage unit (DWARF 2 `DW_AT_bit_offset`).
    pub fn dwarf2_bit_offset(&self) -> usize {
        self.unit_bits()
            .saturating_sub(self.bit_offset.saturating_add(self.bit_width))
    }

    pub(crate) fn shifted(self, delta: usize) -> Self {
        FieldLayout {
            storage_unit_offset: self.storage_unit_offset + delta,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldLayoutKind {
    Plain,
    Bitfield,
}

/// A leaf field of a laid-out aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaidOutField {
    /// Dot-separated path through named nesting, with `[i]` array qualifiers.
    pub path: String,
    pub kind: FieldLayoutKind,
    pub layout: FieldLayout,
    pub annotations: Annotations,
}

/// Complete layout of one aggregate. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutDescriptor {
    total_size: usize,
    total_alignment: usize,
    fields: Vec<LaidOutField>,
    index: BTreeMap<String, usize>,
}

impl LayoutDescriptor {
    pub(crate) fn new(total_size: usize, total_alignment: usize, fields: Vec<LaidOutField>) -> Self {
        let mut index = BTreeMap::new();
        for (i, field) in fields.iter().enumerate() {
            index.entry(field.path.clone()).or_insert(i);
        }

        LayoutDescriptor {
            total_size,
            total_alignment,
            fields,
            index,
        }
    }

    pub fn total_size(&self) -> usize {
        self.total_size
    }

    pub fn total_alignment(&self) -> usize {
        self.total_alignment
    }

    /// Leaf fields in layout order.
    pub fn fields(&self) -> &[LaidOutField] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &LaidOutField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn entry(&self, path: &str) -> Option<&LaidOutField> {
        self.index.get(path).map(|&i| &self.fields[i])
    }

    pub fn field(&self, path: &str) -> Option<&FieldLayout> {
        self.entry(path).map(|entry| &entry.layout)
    }
}

#[cfg(feature = "serde")]
impl From<&LayoutDescriptor> for crate::serde::LayoutDescriptorDef {
    fn from(value: &LayoutDescriptor) -> Self {
        crate::serde::LayoutDescriptorDef {
            total_size: value.total_size,
            total_alignment: value.total_alignment,
            fields: value
                .fields
                .iter()
                .map(|entry| crate::serde::LaidOutFieldDef {
                    path: entry.path.clone(),
                    bitfield: entry.kind == FieldLayoutKind::Bitfield,
                    storage_unit_offset: entry.layout.storage_unit_offset,
                    bit_offset: entry.layout.bit_offset,
                    bit_width: entry.layout.bit_width,
                    base_byte_size: entry.layout.base_byte_size,
                    signed: entry.layout.signed,
                    access: entry.annotations.access.map(Into::into),
                    volatile: entry.annotations.volatile,
                    constant: entry.annotations.constant,
                })
                .collect(),
        }
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::LayoutDescriptorDef> for LayoutDescriptor {
    fn from(value: crate::serde::LayoutDescriptorDef) -> Self {
        let fields = value
            .fields
            .into_iter()
            .map(|def| LaidOutField {
                path: def.path,
                kind: if def.bitfield {
                    FieldLayoutKind::Bitfield
                } else {
                    FieldLayoutKind::Plain
                },
                layout: FieldLayout {
                    storage_unit_offset: def.storage_unit_offset,
                    bit_offset: def.bit_offset,
                    bit_width: def.bit_width,
                    base_byte_size: def.base_byte_size,
                    signed: def.signed,
                },
                annotations: Annotations {
                    access: def.access.map(Into::into),
                    volatile: def.volatile,
                    constant: def.constant,
                },
            })
            .collect();

        LayoutDescriptor::new(value.total_size, value.total_alignment, fields)
    }
}

/// How bit-fields are allocated to storage units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BitfieldPolicy {
    /// A bit-field reuses the open unit only when the base type size matches
    /// and the bits fit; any other member closes the unit.
    #[default]
    Msvc,
    /// Itanium / System V: a bit-field goes at the next free bit unless it
    /// would cross a boundary of its storage-unit alignment.
    SysV,
}

/// Configuration of the layout calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LayoutOptions {
    pub policy: BitfieldPolicy,
    /// Pack override applied to the top-level aggregate.
    pub pack: Option<usize>,
}

impl LayoutOptions {
    pub fn new(policy: BitfieldPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    pub fn set_policy(&mut self, policy: BitfieldPolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    pub fn set_pack(&mut self, pack: usize) -> &mut Self {
        self.pack = Some(pack);
        self
    }
}

/// Computes the layout of `declaration` under the default policy, with an
/// optional pack override.
pub fn compute_layout(
    declaration: &AggregateDeclaration,
    pack_override: Option<usize>,
) -> Result<LayoutDescriptor, LayoutError> {
    let options = LayoutOptions {
        pack: pack_override,
        ..Default::default()
    };

    compute_layout_with(declaration, &options)
}

/// Computes the layout of `declaration` with explicit options.
#[instrument(skip_all, fields(aggregate = declaration.display_name(), policy = ?options.policy))]
pub fn compute_layout_with(
    declaration: &AggregateDeclaration,
    options: &LayoutOptions,
) -> Result<LayoutDescriptor, LayoutError> {
    let pack = resolve_pack(options.pack, declaration.pack)?;
    let descriptor = RecordLayoutBuilder::generate(options.policy, declaration, pack)?;

    debug!(
        size = descriptor.total_size(),
        alignment = descriptor.total_alignment(),
        fields = descriptor.len(),
        "computed layout"
    );

    Ok(descriptor)
}

pub(crate) fn validate_pack(pack: usize) -> Result<usize, LayoutError> {
    if pack.is_power_of_two() && pack <= 16 {
        Ok(pack)
    } else {
        Err(LayoutError::InvalidPackValue(pack))
    }
}

fn resolve_pack(outer: Option<usize>, own: Option<usize>) -> Result<Option<usize>, LayoutError> {
    match (outer, own) {
        (Some(outer), Some(inner)) => {
            validate_pack(outer)?;
            validate_pack(inner)?;
            if outer != inner {
                return Err(LayoutError::ConflictingPackDirective { outer, inner });
            }
            Ok(Some(inner))
        }
        (Some(pack), None) | (None, Some(pack)) => validate_pack(pack).map(Some),
        (None, None) => Ok(None),
    }
}

/// One row of [describe].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescription {
    pub path: String,
    pub offset: usize,
    pub bit_offset: usize,
    pub width: usize,
    pub data_bit_offset: Option<usize>,
    pub dwarf2_bit_offset: usize,
    pub annotations: Annotations,
}

/// Lists every leaf field in layout order.
pub fn describe(descriptor: &LayoutDescriptor) -> Vec<FieldDescription> {
    descriptor
        .iter()
        .map(|entry| FieldDescription {
            path: entry.path.clone(),
            offset: entry.layout.storage_unit_offset,
            bit_offset: entry.layout.bit_offset,
            width: entry.layout.bit_width,
            data_bit_offset: entry.layout.data_bit_offset(),
            dwarf2_bit_offset: entry.layout.dwarf2_bit_offset(),
            annotations: entry.annotations,
        })
        .collect()
}
