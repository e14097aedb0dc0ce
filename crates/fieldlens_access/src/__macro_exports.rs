//! Exports used by the derive macro.
//!
//! These exist so generated code can name what it needs through one stable
//! module, without caring what the caller imported. They are not public API;
//! use the exports at the crate root instead.

/// Pieces of `alloc` the generated code uses, kept off the caller's prelude.
pub mod alloc_utils {
    pub use alloc::borrow::Cow;
    pub use alloc::boxed::Box;
}

pub use crate::describe::{
    Accessible, Blueprint, BlueprintCell, Constructor, DispatchTable, GenericBlueprintCell,
    MemberDecl, TableError, Vis,
};

#[cfg(feature = "auto_register")]
pub mod auto_register {
    pub use inventory;

    pub use crate::registry::auto::BlueprintEntry;
}
