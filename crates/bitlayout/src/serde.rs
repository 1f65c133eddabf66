//! Serializable mirrors of declarations and descriptors.
//!
//! Declarations are usually produced by a C/C++ front-end; these shapes let
//! that front-end hand them over as JSON, and let computed descriptors be
//! stored and loaded again without recomputation.

use serde::{Deserialize, Serialize};

use crate::field::Access;

/// Scalar type a field or bit-field is declared on.
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub enum BaseTypeDef {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Bool,
    F32,
    F64,
    /// Any other scalar; alignment defaults to the byte size.
    Custom {
        byte_size: usize,
        #[serde(default)]
        alignment: Option<usize>,
        #[serde(default)]
        signed: bool,
    },
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy)]
pub enum ByteOrderDef {
    Little,
    Big,
    #[default]
    Native,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub enum AccessDef {
    Public,
    Private,
    Protected,
}

impl From<Access> for AccessDef {
    fn from(value: Access) -> Self {
        match value {
            Access::Public => AccessDef::Public,
            Access::Private => AccessDef::Private,
            Access::Protected => AccessDef::Protected,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy)]
pub enum AggregateKindDef {
    #[default]
    Struct,
    Union,
    Class,
}

/// A struct, union or class declaration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AggregateDef {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: AggregateKindDef,
    /// `#pragma pack` value in effect for this aggregate.
    #[serde(default)]
    pub pack: Option<usize>,
    pub fields: Vec<FieldDef>,
}

/// One member of an aggregate.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldDef {
    /// Empty or absent for unnamed bit-fields and anonymous aggregates.
    #[serde(default)]
    pub name: String,
    pub kind: FieldKindDef,
    #[serde(default)]
    pub pack: Option<usize>,
    #[serde(default)]
    pub access: Option<AccessDef>,
    #[serde(default)]
    pub volatile: bool,
    #[serde(default)]
    pub constant: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type")]
pub enum FieldKindDef {
    Plain {
        base: BaseTypeDef,
    },
    Bitfield {
        base: BaseTypeDef,
        width: usize,
    },
    ZeroWidthBitfield {
        base: BaseTypeDef,
    },
    Nested {
        aggregate: AggregateDef,
    },
    Array {
        element: Box<FieldKindDef>,
        /// Dimensions, outermost first.
        dims: Vec<usize>,
    },
}

/// Accessor configuration.
#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy)]
pub struct AccessConfigDef {
    #[serde(default)]
    pub byte_order: ByteOrderDef,
}

/// A computed layout, flattened to leaf fields.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LayoutDescriptorDef {
    pub total_size: usize,
    pub total_alignment: usize,
    pub fields: Vec<LaidOutFieldDef>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LaidOutFieldDef {
    pub path: String,
    /// `false` for plain members, which span their whole storage unit.
    #[serde(default)]
    pub bitfield: bool,
    pub storage_unit_offset: usize,
    pub bit_offset: usize,
    pub bit_width: usize,
    pub base_byte_size: usize,
    #[serde(default)]
    pub signed: bool,
    #[serde(default)]
    pub access: Option<AccessDef>,
    #[serde(default)]
    pub volatile: bool,
    #[serde(default)]
    pub constant: bool,
}
