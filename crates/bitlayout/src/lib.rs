//! # bitlayout
//!
//! Storage layout of C/C++ aggregates containing bit-fields, and bit-exact
//! access to those fields inside raw byte buffers.
//!
//! Describe a struct, union or class as a list of field declarations,
//! compute its layout once, then read and write individual fields of any
//! buffer holding an instance of it. Packing, zero-width bit-fields,
//! anonymous members, multi-dimensional arrays and nested aggregates are
//! supported.
//!
//! ## Example
//!
//! ```
//! use bitlayout::field::{AggregateDeclaration, FieldDeclaration};
//! use bitlayout::primitive::{BaseType, ByteOrder};
//! use bitlayout::{BitAccessor, compute_layout};
//! use bitlayout::value::Value;
//!
//! let flags = AggregateDeclaration::structure(vec![
//!     FieldDeclaration::bitfield("flag1", BaseType::U32, 1),
//!     FieldDeclaration::bitfield("flag2", BaseType::U32, 2),
//!     FieldDeclaration::bitfield("value", BaseType::U32, 5),
//! ]);
//! let layout = compute_layout(&flags, None).unwrap();
//! assert_eq!(layout.total_size(), 4);
//!
//! let accessor = BitAccessor::new(ByteOrder::Little);
//! let mut buffer = [0u8; 4];
//! accessor.write_path(&mut buffer, &layout, "value", 21u32).unwrap();
//! assert_eq!(buffer[0], 21 << 3);
//! assert_eq!(accessor.read_path(&buffer, &layout, "value").unwrap(), Value::U64(21));
//! ```

pub mod accessor;
pub mod bits;
mod builder;
pub mod errors;
pub mod field;
pub mod layout;
pub mod primitive;
#[cfg(feature = "serde")]
pub mod serde;
pub mod template;
pub mod value;

pub use accessor::{BitAccessor, read_field, write_field};
pub use errors::LayoutError;
pub use layout::{compute_layout, compute_layout_with, describe};
