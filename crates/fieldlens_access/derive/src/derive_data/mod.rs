//! Provide some tools for parsing the derive input.

// -----------------------------------------------------------------------------
// Modules

mod access_struct;
mod field_attributes;
mod type_attributes;

// -----------------------------------------------------------------------------
// Internal API

pub(crate) use access_struct::{AccessMember, AccessStruct, DeclVis, StructField};
pub(crate) use field_attributes::FieldAttributes;
pub(crate) use type_attributes::{PropertyDecl, TypeAttributes};
