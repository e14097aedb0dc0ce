#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Extern Self

// Library code needs `crate` paths while doctests need `fieldlens_access`,
// and `macro_utils::Manifest` can only emit one of them. The `extern self`
// alias makes `fieldlens_access` valid in both positions.
extern crate self as fieldlens_access;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod cursor;
mod object;

pub mod accessor;
pub mod catalog;
pub mod describe;
pub mod dynamic;
pub mod registry;

// -----------------------------------------------------------------------------
// Top-Level exports

#[doc(hidden)]
pub mod __macro_exports;

pub use accessor::{AccessError, Strategy, TypeAccessor, compile_count};
pub use cursor::{Row, RowCursor, RowSchema};
pub use describe::{AccessPolicy, Accessible, BlueprintBuilder, Vis};
pub use dynamic::{DynamicAccessor, DynamicMembers, DynamicRecord, RecordValue, dynamic_accessor};
pub use object::ObjectAccessor;
pub use registry::{
    accessor_by_id, accessor_by_name, accessor_by_path, accessor_for, accessor_of, is_ambiguous,
    register, register_blueprint,
};
pub use fieldlens_access_derive as derive;
