//! Declarations of aggregate members, as handed over by a front-end.

use crate::primitive::BaseType;

/// One member of an aggregate, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDeclaration {
    /// Member name; empty for anonymous padding and anonymous nested aggregates.
    pub name: String,
    pub kind: FieldKind,
    /// Alignment cap for this member only, overriding the aggregate's pack.
    pub pack: Option<usize>,
    /// Display metadata; never affects layout.
    pub annotations: Annotations,
}

impl FieldDeclaration {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        FieldDeclaration {
            name: name.into(),
            kind,
            pack: None,
            annotations: Annotations::default(),
        }
    }

    pub fn plain(name: impl Into<String>, base: BaseType) -> Self {
        Self::new(name, FieldKind::Plain(base))
    }

    pub fn bitfield(name: impl Into<String>, base: BaseType, width: usize) -> Self {
        Self::new(name, FieldKind::Bitfield { base, width })
    }

    /// Unnamed bit-field of non-zero width (`unsigned : 3;`).
    pub fn padding(base: BaseType, width: usize) -> Self {
        Self::new("", FieldKind::Bitfield { base, width })
    }

    /// Unnamed zero-width bit-field (`unsigned : 0;`).
    pub fn zero_width(base: BaseType) -> Self {
        Self::new("", FieldKind::ZeroWidthBitfield(base))
    }

    pub fn nested(name: impl Into<String>, aggregate: AggregateDeclaration) -> Self {
        Self::new(name, FieldKind::NestedAggregate(aggregate))
    }

    /// Anonymous struct or union whose members are hoisted into the parent.
    pub fn anonymous(aggregate: AggregateDeclaration) -> Self {
        Self::new("", FieldKind::NestedAggregate(aggregate))
    }

    /// Array of `element` with one or more dimensions, outermost first.
    pub fn array(name: impl Into<String>, element: FieldKind, dims: &[usize]) -> Self {
        Self::new(
            name,
            FieldKind::Array(ArraySpec {
                element: Box::new(element),
                dims: dims.to_vec(),
            }),
        )
    }

    pub fn with_pack(mut self, pack: usize) -> Self {
        self.pack = Some(pack);
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.annotations.access = Some(access);
        self
    }

    pub fn volatile(mut self) -> Self {
        self.annotations.volatile = true;
        self
    }

    pub fn constant(mut self) -> Self {
        self.annotations.constant = true;
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::FieldDef> for FieldDeclaration {
    fn from(value: crate::serde::FieldDef) -> Self {
        FieldDeclaration {
            name: value.name,
            kind: value.kind.into(),
            pack: value.pack,
            annotations: Annotations {
                access: value.access.map(Into::into),
                volatile: value.volatile,
                constant: value.constant,
            },
        }
    }
}

/// What a member is; each case carries only the data it needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Ordinary scalar occupying whole bytes.
    Plain(BaseType),
    /// Bit-field of `width` bits packed into storage units of `base`.
    Bitfield { base: BaseType, width: usize },
    /// Width-0 bit-field: closes the current unit and realigns the next member.
    ZeroWidthBitfield(BaseType),
    /// Struct, union or class embedded by value.
    NestedAggregate(AggregateDeclaration),
    /// Fixed-size repetition of a plain or aggregate element.
    Array(ArraySpec),
}

#[cfg(feature = "serde")]
impl From<crate::serde::FieldKindDef> for FieldKind {
    fn from(value: crate::serde::FieldKindDef) -> Self {
        use crate::serde::FieldKindDef;

        match value {
            FieldKindDef::Plain { base } => FieldKind::Plain(base.into()),
            FieldKindDef::Bitfield { base, width } => FieldKind::Bitfield {
                base: base.into(),
                width,
            },
            FieldKindDef::ZeroWidthBitfield { base } => FieldKind::ZeroWidthBitfield(base.into()),
            FieldKindDef::Nested { aggregate } => FieldKind::NestedAggregate(aggregate.into()),
            FieldKindDef::Array { element, dims } => FieldKind::Array(ArraySpec {
                element: Box::new((*element).into()),
                dims,
            }),
        }
    }
}

/// Element type and dimensions of an array member.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArraySpec {
    pub element: Box<FieldKind>,
    /// Dimensions, outermost first (`[2][3][4]` is `vec![2, 3, 4]`).
    pub dims: Vec<usize>,
}

impl ArraySpec {
    /// Total number of elements across all dimensions, or `None` when the
    /// product overflows `usize`.
    pub fn count(&self) -> Option<usize> {
        self.dims
            .iter()
            .try_fold(1usize, |count, &dim| count.checked_mul(dim))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AggregateKind {
    #[default]
    Struct,
    Union,
    /// Laid out exactly like a struct.
    Class,
}

/// A struct, union or class: an ordered list of members plus an optional
/// `#pragma pack` value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AggregateDeclaration {
    /// Used for diagnostics only.
    pub name: Option<String>,
    pub kind: AggregateKind,
    pub pack: Option<usize>,
    pub fields: Vec<FieldDeclaration>,
}

impl AggregateDeclaration {
    pub fn structure(fields: Vec<FieldDeclaration>) -> Self {
        Self::of_kind(AggregateKind::Struct, fields)
    }

    pub fn union(fields: Vec<FieldDeclaration>) -> Self {
        Self::of_kind(AggregateKind::Union, fields)
    }

    pub fn class(fields: Vec<FieldDeclaration>) -> Self {
        Self::of_kind(AggregateKind::Class, fields)
    }

    fn of_kind(kind: AggregateKind, fields: Vec<FieldDeclaration>) -> Self {
        AggregateDeclaration {
            name: None,
            kind,
            pack: None,
            fields,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn packed(mut self, pack: usize) -> Self {
        self.pack = Some(pack);
        self
    }

    pub fn is_union(&self) -> bool {
        self.kind == AggregateKind::Union
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<anonymous>")
    }
}

#[cfg(feature = "serde")]
impl From<crate::serde::AggregateDef> for AggregateDeclaration {
    fn from(value: crate::serde::AggregateDef) -> Self {
        AggregateDeclaration {
            name: value.name,
            kind: match value.kind {
                crate::serde::AggregateKindDef::Struct => AggregateKind::Struct,
                crate::serde::AggregateKindDef::Union => AggregateKind::Union,
                crate::serde::AggregateKindDef::Class => AggregateKind::Class,
            },
            pack: value.pack,
            fields: value.fields.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Public,
    Private,
    Protected,
}

#[cfg(feature = "serde")]
impl From<crate::serde::AccessDef> for Access {
    fn from(value: crate::serde::AccessDef) -> Self {
        match value {
            crate::serde::AccessDef::Public => Access::Public,
            crate::serde::AccessDef::Private => Access::Private,
            crate::serde::AccessDef::Protected => Access::Protected,
        }
    }
}

/// Access control and qualifiers carried along for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Annotations {
    pub access: Option<Access>,
    pub volatile: bool,
    pub constant: bool,
}
